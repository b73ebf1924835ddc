//! Display and behavior settings for frames.
//!
//! Every frame owns a [`FrameConfig`] snapshot. Frames built without an
//! explicit config take a snapshot of the process-wide defaults, which are
//! initialized from environment variables on first access and can be
//! overridden at runtime via the setter functions below.
//!
//! - `LF_TABLE_MAX_ROW`: rows shown when a frame is printed. Default: 10.
//! - `LF_TABLE_MAX_COL_IN_CONSOLE`: columns shown in console output. Default: 10.
//! - `LF_DTYPE_TEST_LIM`: leading values sampled by dtype inference. Default: 10.
//! - `LF_LOW_MEMORY_MODE`: `1`/`true` disables the column-major mirror.

#![forbid(unsafe_code)]

use std::sync::Once;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_TABLE_MAX_ROW: usize = 10;
pub const DEFAULT_TABLE_MAX_COL_IN_CONSOLE: usize = 10;
pub const DEFAULT_DTYPE_TEST_LIM: usize = 10;

// ---------------------------------------------------------------------------
// Atomic globals
// ---------------------------------------------------------------------------

static TABLE_MAX_ROW: AtomicUsize = AtomicUsize::new(DEFAULT_TABLE_MAX_ROW);
static TABLE_MAX_COL_IN_CONSOLE: AtomicUsize = AtomicUsize::new(DEFAULT_TABLE_MAX_COL_IN_CONSOLE);
static DTYPE_TEST_LIM: AtomicUsize = AtomicUsize::new(DEFAULT_DTYPE_TEST_LIM);
static LOW_MEMORY_MODE: AtomicBool = AtomicBool::new(false);

static INIT: Once = Once::new();

/// Apply environment overrides (idempotent). Unparseable values are ignored.
fn ensure_init() {
    INIT.call_once(|| {
        let overrides = [
            ("LF_TABLE_MAX_ROW", &TABLE_MAX_ROW),
            ("LF_TABLE_MAX_COL_IN_CONSOLE", &TABLE_MAX_COL_IN_CONSOLE),
            ("LF_DTYPE_TEST_LIM", &DTYPE_TEST_LIM),
        ];
        for (var, slot) in overrides {
            if let Some(n) = std::env::var(var).ok().and_then(|v| parse_count(&v)) {
                slot.store(n, Ordering::Relaxed);
            }
        }
        if let Some(flag) = std::env::var("LF_LOW_MEMORY_MODE")
            .ok()
            .and_then(|v| parse_flag(&v))
        {
            LOW_MEMORY_MODE.store(flag, Ordering::Relaxed);
        }
    });
}

fn parse_count(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Process-wide defaults
// ---------------------------------------------------------------------------

pub fn get_table_max_row() -> usize {
    ensure_init();
    TABLE_MAX_ROW.load(Ordering::Relaxed)
}

pub fn set_table_max_row(rows: usize) {
    ensure_init();
    TABLE_MAX_ROW.store(rows, Ordering::Relaxed);
}

pub fn get_table_max_col_in_console() -> usize {
    ensure_init();
    TABLE_MAX_COL_IN_CONSOLE.load(Ordering::Relaxed)
}

pub fn set_table_max_col_in_console(columns: usize) {
    ensure_init();
    TABLE_MAX_COL_IN_CONSOLE.store(columns, Ordering::Relaxed);
}

pub fn get_dtype_test_lim() -> usize {
    ensure_init();
    DTYPE_TEST_LIM.load(Ordering::Relaxed)
}

/// Limits below 1 are raised to 1 so inference always sees a value.
pub fn set_dtype_test_lim(limit: usize) {
    ensure_init();
    DTYPE_TEST_LIM.store(limit.max(1), Ordering::Relaxed);
}

pub fn get_low_memory_mode() -> bool {
    ensure_init();
    LOW_MEMORY_MODE.load(Ordering::Relaxed)
}

pub fn set_low_memory_mode(enabled: bool) {
    ensure_init();
    LOW_MEMORY_MODE.store(enabled, Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// Per-frame snapshot
// ---------------------------------------------------------------------------

/// Settings owned by a single frame. Cloned, never shared, so mutating one
/// frame's config cannot affect another frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    pub table_max_row: usize,
    pub table_max_col_in_console: usize,
    pub dtype_test_lim: usize,
    pub low_memory_mode: bool,
}

impl FrameConfig {
    /// Snapshot of the current process-wide defaults.
    #[must_use]
    pub fn global() -> Self {
        Self {
            table_max_row: get_table_max_row(),
            table_max_col_in_console: get_table_max_col_in_console(),
            dtype_test_lim: get_dtype_test_lim(),
            low_memory_mode: get_low_memory_mode(),
        }
    }

    #[must_use]
    pub fn with_table_max_row(mut self, rows: usize) -> Self {
        self.table_max_row = rows;
        self
    }

    #[must_use]
    pub fn with_table_max_col_in_console(mut self, columns: usize) -> Self {
        self.table_max_col_in_console = columns;
        self
    }

    #[must_use]
    pub fn with_dtype_test_lim(mut self, limit: usize) -> Self {
        self.dtype_test_lim = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_low_memory_mode(mut self, enabled: bool) -> Self {
        self.low_memory_mode = enabled;
        self
    }
}

/// Compile-time defaults, ignoring the environment.
impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            table_max_row: DEFAULT_TABLE_MAX_ROW,
            table_max_col_in_console: DEFAULT_TABLE_MAX_COL_IN_CONSOLE,
            dtype_test_lim: DEFAULT_DTYPE_TEST_LIM,
            low_memory_mode: false,
        }
    }
}
