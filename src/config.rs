//! Runtime configuration and debug logging
//!
//! Process-wide settings read at their point of use, never cached:
//! the while-loop governor and the debug message toggle.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use colored::Colorize;

/// Default cap on iterations of a single while block.
pub const DEFAULT_MAX_WHILE_LOOPS: usize = 10_000;

static MAX_WHILE_LOOPS: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_WHILE_LOOPS);
static PRINT_DEBUG_MESSAGES: AtomicBool = AtomicBool::new(false);

/// Current while-loop governor value.
pub fn max_while_loops() -> usize {
    MAX_WHILE_LOOPS.load(Ordering::Relaxed)
}

/// Set the while-loop governor. `-1` disables the limit.
pub fn set_max_while_loops(limit: i64) {
    let cap = if limit < 0 { usize::MAX } else { limit as usize };
    MAX_WHILE_LOOPS.store(cap, Ordering::Relaxed);
}

pub fn debug_enabled() -> bool {
    PRINT_DEBUG_MESSAGES.load(Ordering::Relaxed)
}

pub fn set_debug(enabled: bool) {
    PRINT_DEBUG_MESSAGES.store(enabled, Ordering::Relaxed);
}

/// Print a debug message to stderr if debug output is enabled.
pub fn debug(msg: impl AsRef<str>) {
    if debug_enabled() {
        eprintln!("{}", msg.as_ref().dimmed());
    }
}
