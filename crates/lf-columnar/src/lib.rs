#![forbid(unsafe_code)]

use std::cmp::Ordering;

use lf_types::{Scalar, TypeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
}

impl ArithmeticOp {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Pow => "pow",
            Self::Mod => "mod",
        }
    }
}

/// Element-wise comparison operations that produce boolean cells.
///
/// Missing inputs produce a missing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Gt,
    Lt,
    Eq,
    Ne,
    Ge,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    Sum,
    Mean,
    Median,
    Mode,
    Min,
    Max,
    Std,
    Var,
    Count,
}

impl Reduction {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::Min => "min",
            Self::Max => "max",
            Self::Std => "std",
            Self::Var => "var",
            Self::Count => "count",
        }
    }

    /// `count` and `mode` are defined for every dtype; the rest need numbers.
    #[must_use]
    pub fn requires_numeric(self) -> bool {
        !matches!(self, Self::Count | Self::Mode)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColumnError {
    #[error("column length mismatch: left={left}, right={right}")]
    LengthMismatch { left: usize, right: usize },
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Numeric view of a non-missing cell. Booleans count as 0/1 integers.
#[derive(Debug, Clone, Copy)]
enum Numeric {
    Int(i64),
    Float(f64),
}

fn numeric(value: &Scalar) -> Result<Numeric, TypeError> {
    match value {
        Scalar::Int64(v) => Ok(Numeric::Int(*v)),
        Scalar::Bool(v) => Ok(Numeric::Int(i64::from(*v))),
        other => other.to_f64().map(Numeric::Float),
    }
}

fn float_op(lhs: f64, rhs: f64, op: ArithmeticOp) -> f64 {
    match op {
        ArithmeticOp::Add => lhs + rhs,
        ArithmeticOp::Sub => lhs - rhs,
        ArithmeticOp::Mul => lhs * rhs,
        ArithmeticOp::Div => lhs / rhs,
        ArithmeticOp::Pow => lhs.powf(rhs),
        ArithmeticOp::Mod => lhs % rhs,
    }
}

/// Integer fast path. `None` means the result does not fit (or is not
/// integral) and the float path applies instead.
fn int_op(lhs: i64, rhs: i64, op: ArithmeticOp) -> Option<i64> {
    match op {
        ArithmeticOp::Add => lhs.checked_add(rhs),
        ArithmeticOp::Sub => lhs.checked_sub(rhs),
        ArithmeticOp::Mul => lhs.checked_mul(rhs),
        ArithmeticOp::Div => None,
        ArithmeticOp::Pow => u32::try_from(rhs).ok().and_then(|exp| lhs.checked_pow(exp)),
        ArithmeticOp::Mod => lhs.checked_rem(rhs),
    }
}

/// Apply `op` to one pair of cells.
///
/// Missing on either side yields NaN. Modulo by integer zero yields NaN.
/// Text operands fail with a type error.
pub fn binary_scalar(left: &Scalar, right: &Scalar, op: ArithmeticOp) -> Result<Scalar, ColumnError> {
    if let Some(text) = left.as_str().or_else(|| right.as_str()) {
        return Err(TypeError::NonNumericValue {
            value: text.to_owned(),
        }
        .into());
    }
    if left.is_missing() || right.is_missing() {
        return Ok(Scalar::nan());
    }

    let out = match (numeric(left)?, numeric(right)?) {
        (Numeric::Int(_), Numeric::Int(0)) if matches!(op, ArithmeticOp::Mod) => Scalar::nan(),
        (Numeric::Int(l), Numeric::Int(r)) => match int_op(l, r, op) {
            Some(v) => Scalar::Int64(v),
            None => Scalar::Float64(float_op(l as f64, r as f64, op)),
        },
        (Numeric::Int(l), Numeric::Float(r)) => Scalar::Float64(float_op(l as f64, r, op)),
        (Numeric::Float(l), Numeric::Int(r)) => Scalar::Float64(float_op(l, r as f64, op)),
        (Numeric::Float(l), Numeric::Float(r)) => Scalar::Float64(float_op(l, r, op)),
    };
    Ok(out)
}

/// Element-wise `left op right` over equal-length slices.
pub fn binary_values(
    left: &[Scalar],
    right: &[Scalar],
    op: ArithmeticOp,
) -> Result<Vec<Scalar>, ColumnError> {
    if left.len() != right.len() {
        return Err(ColumnError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    left.iter()
        .zip(right)
        .map(|(l, r)| binary_scalar(l, r, op))
        .collect()
}

/// `values op scalar` for every cell.
pub fn binary_with_scalar(
    values: &[Scalar],
    scalar: &Scalar,
    op: ArithmeticOp,
) -> Result<Vec<Scalar>, ColumnError> {
    values
        .iter()
        .map(|value| binary_scalar(value, scalar, op))
        .collect()
}

/// Total order over non-missing cells: numbers by value, then booleans,
/// then text. Used for sorting and comparisons.
#[must_use]
pub fn compare_non_missing(left: &Scalar, right: &Scalar) -> Ordering {
    match (left, right) {
        (Scalar::Utf8(a), Scalar::Utf8(b)) => a.cmp(b),
        (Scalar::Bool(a), Scalar::Bool(b)) => a.cmp(b),
        (Scalar::Utf8(_), _) => Ordering::Greater,
        (_, Scalar::Utf8(_)) => Ordering::Less,
        _ => match (left.to_f64(), right.to_f64()) {
            (Ok(a), Ok(b)) => a.total_cmp(&b),
            _ => Ordering::Equal,
        },
    }
}

/// Compare with missing cells ordered last regardless of direction.
#[must_use]
pub fn compare_with_na_last(left: &Scalar, right: &Scalar, ascending: bool) -> Ordering {
    match (left.is_missing(), right.is_missing()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ord = compare_non_missing(left, right);
            if ascending { ord } else { ord.reverse() }
        }
    }
}

fn compare_scalar(left: &Scalar, right: &Scalar, op: ComparisonOp) -> Result<bool, ColumnError> {
    let mixed_text = left.as_str().is_some() != right.as_str().is_some();
    if mixed_text && !matches!(op, ComparisonOp::Eq | ComparisonOp::Ne) {
        let text = left.as_str().or_else(|| right.as_str()).unwrap_or_default();
        return Err(TypeError::NonNumericValue {
            value: text.to_owned(),
        }
        .into());
    }
    if mixed_text {
        return Ok(matches!(op, ComparisonOp::Ne));
    }

    let ord = compare_non_missing(left, right);
    Ok(match op {
        ComparisonOp::Gt => ord == Ordering::Greater,
        ComparisonOp::Lt => ord == Ordering::Less,
        ComparisonOp::Eq => ord == Ordering::Equal,
        ComparisonOp::Ne => ord != Ordering::Equal,
        ComparisonOp::Ge => ord != Ordering::Less,
        ComparisonOp::Le => ord != Ordering::Greater,
    })
}

/// Compare every cell against `scalar`, producing boolean cells.
pub fn compare_with_scalar(
    values: &[Scalar],
    scalar: &Scalar,
    op: ComparisonOp,
) -> Result<Vec<Scalar>, ColumnError> {
    if scalar.is_missing() {
        return Ok(vec![Scalar::nan(); values.len()]);
    }
    values
        .iter()
        .map(|value| {
            if value.is_missing() {
                Ok(Scalar::nan())
            } else {
                compare_scalar(value, scalar, op).map(Scalar::Bool)
            }
        })
        .collect()
}

/// Reduce a column to one cell, skipping missing values.
///
/// `sum` stays `Int64` while every observed cell is an integer or boolean
/// and the total fits; `min`/`max` return the winning cell unchanged;
/// `mean`, `median`, `std` and `var` are always `Float64`. Text cells are
/// ignored by the numeric reductions.
#[must_use]
pub fn reduce(values: &[Scalar], reduction: Reduction) -> Scalar {
    let observed = values.iter().filter(|value| !value.is_missing());
    match reduction {
        Reduction::Count => Scalar::Int64(i64::try_from(observed.count()).unwrap_or(i64::MAX)),
        Reduction::Mode => mode(observed),
        Reduction::Min => extreme(observed, Ordering::Less),
        Reduction::Max => extreme(observed, Ordering::Greater),
        Reduction::Sum => sum(observed.filter_map(|value| numeric(value).ok())),
        Reduction::Mean => {
            let floats = as_floats(observed);
            if floats.is_empty() {
                return Scalar::nan();
            }
            Scalar::Float64(floats.iter().sum::<f64>() / floats.len() as f64)
        }
        Reduction::Median => median(as_floats(observed)),
        Reduction::Var => variance(&as_floats(observed)).map_or_else(Scalar::nan, Scalar::Float64),
        Reduction::Std => variance(&as_floats(observed))
            .map_or_else(Scalar::nan, |var| Scalar::Float64(var.sqrt())),
    }
}

fn as_floats<'a>(cells: impl Iterator<Item = &'a Scalar>) -> Vec<f64> {
    cells.filter_map(|value| value.to_f64().ok()).collect()
}

fn sum(cells: impl Iterator<Item = Numeric>) -> Scalar {
    let mut total = Numeric::Int(0);
    for cell in cells {
        total = match (total, cell) {
            (Numeric::Int(acc), Numeric::Int(v)) => match acc.checked_add(v) {
                Some(next) => Numeric::Int(next),
                None => Numeric::Float(acc as f64 + v as f64),
            },
            (Numeric::Int(acc), Numeric::Float(v)) => Numeric::Float(acc as f64 + v),
            (Numeric::Float(acc), Numeric::Int(v)) => Numeric::Float(acc + v as f64),
            (Numeric::Float(acc), Numeric::Float(v)) => Numeric::Float(acc + v),
        };
    }
    match total {
        Numeric::Int(v) => Scalar::Int64(v),
        Numeric::Float(v) => Scalar::Float64(v),
    }
}

fn extreme<'a>(cells: impl Iterator<Item = &'a Scalar>, wins: Ordering) -> Scalar {
    cells
        .filter(|value| value.as_str().is_none())
        .fold(None::<&Scalar>, |best, value| match best {
            Some(current) if compare_non_missing(value, current) != wins => Some(current),
            _ => Some(value),
        })
        .map_or_else(Scalar::nan, Scalar::clone)
}

fn median(mut floats: Vec<f64>) -> Scalar {
    if floats.is_empty() {
        return Scalar::nan();
    }
    floats.sort_by(f64::total_cmp);
    let mid = floats.len() / 2;
    if floats.len() % 2 == 0 {
        Scalar::Float64((floats[mid - 1] + floats[mid]) / 2.0)
    } else {
        Scalar::Float64(floats[mid])
    }
}

/// Sample variance (ddof 1); `None` below two observations.
fn variance(floats: &[f64]) -> Option<f64> {
    if floats.len() < 2 {
        return None;
    }
    let n = floats.len() as f64;
    let mean = floats.iter().sum::<f64>() / n;
    let squares: f64 = floats.iter().map(|v| (v - mean).powi(2)).sum();
    Some(squares / (n - 1.0))
}

/// Most frequent cell; ties go to the cell seen first.
fn mode<'a>(cells: impl Iterator<Item = &'a Scalar>) -> Scalar {
    let mut tally: Vec<(&Scalar, usize)> = Vec::new();
    for value in cells {
        match tally.iter_mut().find(|(seen, _)| seen.semantic_eq(value)) {
            Some((_, hits)) => *hits += 1,
            None => tally.push((value, 1)),
        }
    }
    tally
        .into_iter()
        .fold(None::<(&Scalar, usize)>, |best, (value, hits)| match best {
            Some((_, top)) if hits <= top => best,
            _ => Some((value, hits)),
        })
        .map_or_else(Scalar::nan, |(value, _)| value.clone())
}

/// Running accumulation; missing cells stay NaN in place and are skipped
/// by the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cumulative {
    Sum,
    Prod,
    Min,
    Max,
}

pub fn cumulative(values: &[Scalar], kind: Cumulative) -> Result<Vec<Scalar>, ColumnError> {
    let mut acc: Option<Scalar> = None;
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        if value.is_missing() {
            out.push(Scalar::nan());
            continue;
        }
        let next = match acc.take() {
            None => {
                // Validates the first cell the same way later cells are.
                binary_scalar(value, &Scalar::Int64(0), ArithmeticOp::Add)?;
                value.clone()
            }
            Some(prev) => match kind {
                Cumulative::Sum => binary_scalar(&prev, value, ArithmeticOp::Add)?,
                Cumulative::Prod => binary_scalar(&prev, value, ArithmeticOp::Mul)?,
                Cumulative::Min => {
                    if compare_non_missing(value, &prev) == Ordering::Less {
                        value.clone()
                    } else {
                        prev
                    }
                }
                Cumulative::Max => {
                    if compare_non_missing(value, &prev) == Ordering::Greater {
                        value.clone()
                    } else {
                        prev
                    }
                }
            },
        };
        out.push(next.clone());
        acc = Some(next);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use lf_types::{Scalar, TypeError};

    use super::{
        ArithmeticOp, ColumnError, ComparisonOp, Cumulative, Reduction, binary_scalar,
        binary_values, binary_with_scalar, compare_with_na_last, compare_with_scalar, cumulative,
        reduce,
    };

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().copied().map(Scalar::Int64).collect()
    }

    #[test]
    fn int_arithmetic_stays_integral_except_division() {
        let l = Scalar::Int64(7);
        let r = Scalar::Int64(2);
        assert_eq!(binary_scalar(&l, &r, ArithmeticOp::Add), Ok(Scalar::Int64(9)));
        assert_eq!(binary_scalar(&l, &r, ArithmeticOp::Sub), Ok(Scalar::Int64(5)));
        assert_eq!(binary_scalar(&l, &r, ArithmeticOp::Mul), Ok(Scalar::Int64(14)));
        assert_eq!(binary_scalar(&l, &r, ArithmeticOp::Div), Ok(Scalar::Float64(3.5)));
        assert_eq!(binary_scalar(&l, &r, ArithmeticOp::Pow), Ok(Scalar::Int64(49)));
        assert_eq!(binary_scalar(&l, &r, ArithmeticOp::Mod), Ok(Scalar::Int64(1)));
    }

    #[test]
    fn negative_exponent_and_overflow_fall_back_to_float() {
        assert_eq!(
            binary_scalar(&Scalar::Int64(2), &Scalar::Int64(-1), ArithmeticOp::Pow),
            Ok(Scalar::Float64(0.5))
        );
        assert_eq!(
            binary_scalar(&Scalar::Int64(i64::MAX), &Scalar::Int64(1), ArithmeticOp::Add),
            Ok(Scalar::Float64(i64::MAX as f64 + 1.0))
        );
    }

    #[test]
    fn missing_operands_and_zero_modulus_give_nan() {
        let out = binary_scalar(&Scalar::nan(), &Scalar::Int64(1), ArithmeticOp::Add)
            .expect("missing propagates");
        assert!(out.is_nan());
        let out = binary_scalar(&Scalar::Int64(3), &Scalar::Int64(0), ArithmeticOp::Mod)
            .expect("mod by zero");
        assert!(out.is_nan());
    }

    #[test]
    fn text_operands_are_rejected() {
        let err = binary_scalar(&Scalar::from("a"), &Scalar::Int64(1), ArithmeticOp::Add)
            .expect_err("text must fail");
        assert_eq!(
            err,
            ColumnError::Type(TypeError::NonNumericValue {
                value: "a".to_owned()
            })
        );
    }

    #[test]
    fn mixed_int_float_promotes() {
        let out = binary_values(
            &ints(&[1, 2]),
            &[Scalar::Float64(0.5), Scalar::Bool(true)],
            ArithmeticOp::Add,
        )
        .expect("same length");
        assert_eq!(out, vec![Scalar::Float64(1.5), Scalar::Int64(3)]);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let err = binary_values(&ints(&[1, 2]), &ints(&[1]), ArithmeticOp::Sub)
            .expect_err("must fail");
        assert_eq!(err, ColumnError::LengthMismatch { left: 2, right: 1 });
    }

    #[test]
    fn scalar_broadcast_applies_to_every_cell() {
        let out = binary_with_scalar(&ints(&[1, 2, 3]), &Scalar::Int64(10), ArithmeticOp::Mul)
            .expect("numeric");
        assert_eq!(out, ints(&[10, 20, 30]));
    }

    #[test]
    fn comparisons_produce_boolean_cells() {
        let values = vec![Scalar::Int64(1), Scalar::nan(), Scalar::Float64(5.5)];
        let out = compare_with_scalar(&values, &Scalar::Int64(2), ComparisonOp::Gt)
            .expect("numeric compare");
        assert_eq!(out[0], Scalar::Bool(false));
        assert!(out[1].is_missing());
        assert_eq!(out[2], Scalar::Bool(true));

        let names = vec![Scalar::from("a"), Scalar::from("b")];
        let out = compare_with_scalar(&names, &Scalar::from("b"), ComparisonOp::Eq)
            .expect("text equality");
        assert_eq!(out, vec![Scalar::Bool(false), Scalar::Bool(true)]);
    }

    #[test]
    fn na_sorts_last_in_both_directions() {
        use std::cmp::Ordering;
        assert_eq!(
            compare_with_na_last(&Scalar::nan(), &Scalar::Int64(1), true),
            Ordering::Greater
        );
        assert_eq!(
            compare_with_na_last(&Scalar::nan(), &Scalar::Int64(1), false),
            Ordering::Greater
        );
        assert_eq!(
            compare_with_na_last(&Scalar::Int64(1), &Scalar::Int64(2), false),
            Ordering::Greater
        );
    }

    #[test]
    fn integer_sums_stay_integral() {
        let values = vec![Scalar::Int64(1), Scalar::nan(), Scalar::Int64(3), Scalar::Bool(true)];
        assert_eq!(reduce(&values, Reduction::Sum), Scalar::Int64(5));
        assert_eq!(reduce(&[], Reduction::Sum), Scalar::Int64(0));

        let mixed = vec![Scalar::Int64(1), Scalar::Float64(0.5)];
        assert_eq!(reduce(&mixed, Reduction::Sum), Scalar::Float64(1.5));

        let huge = ints(&[i64::MAX, 1]);
        assert_eq!(
            reduce(&huge, Reduction::Sum),
            Scalar::Float64(i64::MAX as f64 + 1.0)
        );
    }

    #[test]
    fn min_and_max_return_the_winning_cell() {
        let values = vec![Scalar::Float64(5.5), Scalar::nan(), Scalar::Int64(2), Scalar::Int64(7)];
        assert_eq!(reduce(&values, Reduction::Min), Scalar::Int64(2));
        assert_eq!(reduce(&values, Reduction::Max), Scalar::Int64(7));
        assert!(reduce(&[Scalar::nan()], Reduction::Max).is_nan());
    }

    #[test]
    fn averages_and_spread_are_float() {
        let values = ints(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(reduce(&values, Reduction::Mean), Scalar::Float64(5.0));
        assert_eq!(reduce(&ints(&[1, 3, 2, 4]), Reduction::Median), Scalar::Float64(2.5));
        let Scalar::Float64(var) = reduce(&values, Reduction::Var) else {
            panic!("variance is a float");
        };
        assert!((var - 32.0 / 7.0).abs() < 1e-12);
        let Scalar::Float64(std) = reduce(&values, Reduction::Std) else {
            panic!("std is a float");
        };
        assert!((std - var.sqrt()).abs() < 1e-12);
        assert!(reduce(&ints(&[5]), Reduction::Var).is_nan());
        assert!(reduce(&[Scalar::nan()], Reduction::Mean).is_nan());
    }

    #[test]
    fn count_and_mode_accept_any_dtype() {
        let words = vec![Scalar::from("b"), Scalar::nan(), Scalar::from("a"), Scalar::from("a")];
        assert_eq!(reduce(&words, Reduction::Count), Scalar::Int64(3));
        assert_eq!(reduce(&words, Reduction::Mode), Scalar::from("a"));
        assert_eq!(reduce(&ints(&[3, 1, 1, 3, 2]), Reduction::Mode), Scalar::Int64(3));
        assert!(!Reduction::Count.requires_numeric());
        assert!(Reduction::Std.requires_numeric());
    }

    #[test]
    fn cumulative_skips_missing_cells() {
        let values = vec![Scalar::Int64(1), Scalar::nan(), Scalar::Int64(3), Scalar::Int64(-2)];
        let sums = cumulative(&values, Cumulative::Sum).expect("numeric");
        assert_eq!(sums[0], Scalar::Int64(1));
        assert!(sums[1].is_nan());
        assert_eq!(sums[2], Scalar::Int64(4));
        assert_eq!(sums[3], Scalar::Int64(2));

        let mins = cumulative(&values, Cumulative::Min).expect("numeric");
        assert_eq!(mins[3], Scalar::Int64(-2));
        let maxs = cumulative(&values, Cumulative::Max).expect("numeric");
        assert_eq!(maxs[3], Scalar::Int64(3));
    }
}
