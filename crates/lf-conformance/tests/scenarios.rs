#![forbid(unsafe_code)]

//! End-to-end scenarios over the public surface: construction, inference,
//! uniqueness, merge, concat, the numeric type guard and storage layouts.

use lf_config::FrameConfig;
use lf_conformance::{
    check_frame_invariants, concat_backfill_fixtures, merge_left_fixture, merge_right_fixture,
    records_fixture,
};
use lf_frame::{
    Axis, ConcatSpec, DataFrame, Frame, FrameError, FrameInput, FrameOptions, LocSelector, Series,
    SetValuesOptions, StorageLayout, concat,
};
use lf_index::IndexLabel;
use lf_join::{JoinType, MergeSpec, merge};
use lf_types::{DType, Scalar, infer_dtype};

fn int(value: i64) -> Scalar {
    Scalar::Int64(value)
}

fn text(value: &str) -> Scalar {
    Scalar::from(value)
}

// ---------------------------------------------------------------------------
// Construction and inference
// ---------------------------------------------------------------------------

#[test]
fn records_round_trip_columns_and_values() {
    let frame = DataFrame::from_json(&records_fixture(), FrameOptions::new()).expect("records");
    assert_eq!(frame.columns(), &["a", "b"]);
    assert_eq!(
        frame.values(),
        &[vec![int(1), int(2)], vec![int(3), int(4)]]
    );
    assert_eq!(frame.dtypes(), &[DType::Int64, DType::Int64]);
    check_frame_invariants(&frame).expect("invariants");
}

#[test]
fn records_with_reordered_keys_align_by_name() {
    let records = serde_json::json!([
        { "name": "Alice", "age": 30, "score": 1.5 },
        { "score": 2.0, "name": "Boy", "age": 12 },
        { "age": 39, "score": 3.25, "name": "Cy" },
    ]);
    let frame = DataFrame::from_json(&records, FrameOptions::new()).expect("records");
    assert_eq!(frame.columns(), &["name", "age", "score"]);
    assert_eq!(frame.dtypes(), &[DType::Utf8, DType::Int64, DType::Float64]);
    assert_eq!(
        frame.column_values("name").expect("name").to_vec(),
        vec![text("Alice"), text("Boy"), text("Cy")]
    );
    assert_eq!(
        frame.column_values("age").expect("age").to_vec(),
        vec![int(30), int(12), int(39)]
    );
    assert_eq!(
        frame.column_values("score").expect("score").to_vec(),
        vec![Scalar::Float64(1.5), Scalar::Float64(2.0), Scalar::Float64(3.25)]
    );
    check_frame_invariants(&frame).expect("invariants");
}

#[test]
fn dtype_priority_widens_to_the_most_general_tag() {
    let lim = 10;
    assert_eq!(
        infer_dtype(&[int(1), Scalar::Float64(2.1), int(3), int(45)], lim),
        DType::Float64
    );
    assert_eq!(infer_dtype(&[int(1), int(2), int(3), int(45)], lim), DType::Int64);
    assert_eq!(
        infer_dtype(&[int(1), int(2), int(3), int(45), Scalar::nan()], lim),
        DType::Float64
    );
    assert_eq!(
        infer_dtype(&[text("Alice"), text("Boy"), text("39")], lim),
        DType::Utf8
    );
}

#[test]
fn duplicate_index_and_columns_are_construction_errors() {
    let rows = vec![vec![int(1)], vec![int(2)], vec![int(3)]];
    let err = DataFrame::new(
        FrameInput::Rows(rows.clone()),
        FrameOptions::new().with_index([0_i64, 0, 1]),
    )
    .expect_err("duplicate index");
    assert_eq!(err, FrameError::DuplicateIndex(IndexLabel::Int64(0)));

    let err = DataFrame::new(
        FrameInput::Rows(vec![vec![int(1), int(2)]]),
        FrameOptions::new().with_columns(["x", "x"]),
    )
    .expect_err("duplicate columns");
    assert_eq!(err, FrameError::DuplicateColumn("x".to_owned()));
}

#[test]
fn series_shape_is_rows_by_one() {
    let series = Series::new(vec![int(1), int(2), int(3)]).expect("series");
    assert_eq!(series.shape(), (3, 1));
    assert_eq!(series.ndim(), 1);
    assert_eq!(series.columns(), &["0"]);
    check_frame_invariants(&series).expect("invariants");
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

#[test]
fn outer_merge_matches_reference_rows() {
    let left = merge_left_fixture().expect("left");
    let right = merge_right_fixture().expect("right");
    let out = merge(&MergeSpec::new(&left, &right, ["Key1", "Key2"], JoinType::Outer))
        .expect("outer merge");

    assert_eq!(out.shape().0, 6);
    let rows = out.values();
    let fan_out = |a: &str, d: &str| {
        vec![
            text("K1"),
            text("K0"),
            text("A2"),
            text("B2"),
            text(a),
            text(d),
        ]
    };
    assert!(rows.contains(&fan_out("C1", "D1")));
    assert!(rows.contains(&fan_out("C2", "D2")));

    let left_only = rows
        .iter()
        .find(|row| row[0] == text("k0") && row[1] == text("K1"))
        .expect("left-only row");
    assert!(left_only[4].is_nan() && left_only[5].is_nan());

    let right_only = rows
        .iter()
        .find(|row| row[0] == text("K2") && row[1] == text("K0"))
        .expect("right-only row");
    assert!(right_only[2].is_nan() && right_only[3].is_nan());
    check_frame_invariants(&out).expect("invariants");
}

#[test]
fn inner_merge_has_no_padding() {
    let left = merge_left_fixture().expect("left");
    let right = merge_right_fixture().expect("right");
    let out = merge(&MergeSpec::new(&left, &right, ["Key1", "Key2"], JoinType::Inner))
        .expect("inner merge");
    assert_eq!(out.shape().0, 3);
    assert!(
        out.values()
            .iter()
            .all(|row| row.iter().all(|cell| !cell.is_missing()))
    );
}

#[test]
fn merge_accepts_join_type_names() {
    let left = merge_left_fixture().expect("left");
    let right = merge_right_fixture().expect("right");
    let how: JoinType = "left".parse().expect("join type");
    let out = merge(&MergeSpec::new(&left, &right, ["Key1", "Key2"], how)).expect("left merge");
    assert_eq!(out.shape().0, 5);
}

// ---------------------------------------------------------------------------
// Concat
// ---------------------------------------------------------------------------

#[test]
fn concat_axis0_backfills_columns_missing_from_a_frame() {
    let [first, second, third] = concat_backfill_fixtures().expect("fixtures");
    let out = concat(ConcatSpec::new(
        vec![&first as &dyn Frame, &second, &third],
        Axis::Index,
    ))
    .expect("concat")
    .into_dataframe()
    .expect("frame");

    assert_eq!(out.shape(), (5, 3));
    let a = out.column_values("a").expect("a");
    assert!(a[2].is_nan());
    assert_eq!(a[3], int(6));
    let c = out.column_values("c").expect("c");
    assert_eq!(c[2], int(5));
    assert!([0, 1, 3, 4].iter().all(|&row| c[row].is_nan()));
    check_frame_invariants(&out).expect("invariants");
}

#[test]
fn concat_axis0_single_column_returns_series() {
    let frames: Vec<DataFrame> = (0..3)
        .map(|i| {
            DataFrame::from_columns(vec![("v".to_owned(), vec![int(i)])]).expect("frame")
        })
        .collect();
    let out = concat(ConcatSpec::new(
        frames.iter().map(|frame| frame as &dyn Frame).collect(),
        Axis::Index,
    ))
    .expect("concat");
    let series = out.as_series().expect("collapsed to series");
    assert_eq!(series.to_vec(), vec![int(0), int(1), int(2)]);
}

// ---------------------------------------------------------------------------
// Numeric type guard
// ---------------------------------------------------------------------------

#[test]
fn numeric_ops_on_text_columns_fail_without_output() {
    let frame = DataFrame::from_columns(vec![
        ("n".to_owned(), vec![int(1), int(2)]),
        ("s".to_owned(), vec![text("x"), text("y")]),
    ])
    .expect("frame");

    assert!(matches!(
        frame.add(int(1), Axis::Columns),
        Err(FrameError::NonNumericColumn { .. })
    ));
    assert!(matches!(
        frame.mean(Axis::Index),
        Err(FrameError::NonNumericColumn { .. })
    ));

    let names = frame.column("s").expect("column");
    assert!(matches!(
        names.sub(int(1)),
        Err(FrameError::NonNumericColumn { .. })
    ));
    assert!(matches!(names.mean(), Err(FrameError::NonNumericColumn { .. })));
    assert_eq!(names.count().expect("count"), int(2));
}

#[test]
fn zero_sample_limit_keeps_the_text_guard() {
    let config = FrameConfig {
        dtype_test_lim: 0,
        ..FrameConfig::default()
    };
    let frame = DataFrame::new(
        FrameInput::Rows(vec![vec![text("x")], vec![text("y")]]),
        FrameOptions::new().with_columns(["s"]).with_config(config),
    )
    .expect("frame");
    assert_eq!(frame.dtypes(), &[DType::Utf8]);
    assert!(matches!(
        frame.add(int(1), Axis::Columns),
        Err(FrameError::NonNumericColumn { .. })
    ));

    let clamped = FrameConfig::default().with_dtype_test_lim(0);
    assert_eq!(clamped.dtype_test_lim, 1);
}

// ---------------------------------------------------------------------------
// Storage layouts and mutation
// ---------------------------------------------------------------------------

#[test]
fn both_layouts_agree_after_column_writes() {
    for low_memory in [false, true] {
        let config = FrameConfig::default().with_low_memory_mode(low_memory);
        let mut frame = DataFrame::new(
            FrameInput::Rows(vec![vec![int(1), text("a")], vec![int(2), text("b")]]),
            FrameOptions::new().with_columns(["n", "s"]).with_config(config),
        )
        .expect("frame");
        let expected = if low_memory {
            StorageLayout::RowMajor
        } else {
            StorageLayout::Dual
        };
        assert_eq!(frame.layout(), expected);

        frame
            .set_column("n", vec![Scalar::Float64(1.5), Scalar::Float64(2.5)])
            .expect("overwrite");
        frame.set_column("extra", vec![int(7), int(8)]).expect("append");
        assert_eq!(frame.dtypes(), &[DType::Float64, DType::Utf8, DType::Int64]);
        check_frame_invariants(&frame).expect("invariants");

        frame
            .set_values(
                vec![vec![int(9), text("z"), int(0)]],
                SetValuesOptions {
                    check_length: false,
                    ..SetValuesOptions::default()
                },
            )
            .expect("replace values");
        assert_eq!(frame.shape(), (1, 3));
        check_frame_invariants(&frame).expect("invariants after set_values");
    }
}

#[test]
fn failed_mutations_leave_the_frame_untouched() {
    let mut frame = DataFrame::from_rows(vec![vec![int(1)], vec![int(2)]]).expect("frame");
    let before = frame.clone();
    assert!(frame.set_index(vec![IndexLabel::Int64(0)]).is_err());
    assert!(frame.set_column("0", vec![int(1)]).is_err());
    assert!(frame.set_dtypes(vec![DType::Int64, DType::Int64]).is_err());
    assert_eq!(frame, before);
}

#[test]
fn loc_reads_by_label_after_reindexing() {
    let frame = DataFrame::from_rows(vec![vec![int(1)], vec![int(2)], vec![int(3)]])
        .expect("frame")
        .with_index(vec!["x".into(), "y".into(), "z".into()])
        .expect("index");
    let picked = frame
        .loc(&LocSelector::Slice("y:z".to_owned()), &lf_frame::ColumnSelector::All)
        .expect("loc");
    assert_eq!(picked.values(), &[vec![int(2)], vec![int(3)]]);
    assert_eq!(
        picked.index().labels(),
        &[IndexLabel::from("y"), IndexLabel::from("z")]
    );
}
