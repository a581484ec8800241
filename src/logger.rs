//! Logging utilities with colored output and progress display.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro, printed only in verbose mode
//! - `ProgressLine` for a single-line progress display with multiple counters
//!
//! Everything is written to stderr; stdout carries rendered output.
//!
//! # Example
//!
//! ```ignore
//! log!("stream"; "feeding {} bytes", len);
//!
//! let progress = ProgressLine::new(&[("bytes", 4096), ("chunks", 64)]);
//! progress.advance("bytes", 64);
//! progress.inc("chunks");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stderr},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Whether a progress line currently occupies the last terminal line
static BAR_ACTIVE: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut out = stderr().lock();

    // Print above the progress line, then let the next refresh redraw it
    if BAR_ACTIVE.load(Ordering::SeqCst) {
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }

    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "parse" => prefix.bright_cyan().bold().to_string(),
        "render" | "patch" => prefix.bright_blue().bold().to_string(),
        "stream" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Progress Line
// ============================================================================

/// Single-line progress display with named counters.
///
/// Overwrites itself in place; `log!` output printed while it is active
/// lands above it.
///
/// # Example
///
/// ```ignore
/// let progress = ProgressLine::new(&[("bytes", 1024), ("chunks", 16)]);
/// progress.advance("bytes", 64);
/// progress.inc("chunks");
/// progress.finish(); // keeps the line, moves cursor down
/// ```
pub struct ProgressLine {
    counters: Vec<Counter>,
    lock: Mutex<()>,
}

struct Counter {
    name: &'static str,
    total: usize,
    current: AtomicUsize,
}

impl ProgressLine {
    /// Create a new progress display.
    ///
    /// Only includes counters with total > 0.
    pub fn new(items: &[(&'static str, usize)]) -> Self {
        let counters: Vec<_> = items
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|(name, total)| Counter {
                name,
                total: *total,
                current: AtomicUsize::new(0),
            })
            .collect();

        BAR_ACTIVE.store(true, Ordering::SeqCst);

        let progress = Self {
            counters,
            lock: Mutex::new(()),
        };
        progress.display(false);
        progress
    }

    /// Increment the counter with the given name by one.
    #[inline]
    pub fn inc(&self, name: &str) {
        self.advance(name, 1);
    }

    /// Add `n` to the counter with the given name.
    pub fn advance(&self, name: &str, n: usize) {
        let Some(counter) = self.counters.iter().find(|c| c.name == name) else {
            return;
        };
        counter.current.fetch_add(n, Ordering::Relaxed);
        if let Some(_guard) = self.lock.try_lock() {
            self.display(false);
        }
    }

    /// Current value of a counter (0 for unknown names).
    pub fn current(&self, name: &str) -> usize {
        self.counters
            .iter()
            .find(|c| c.name == name)
            .map_or(0, |c| c.current.load(Ordering::Relaxed))
    }

    fn line(&self) -> String {
        self.counters
            .iter()
            .map(|c| {
                let current = c.current.load(Ordering::Relaxed).min(c.total);
                format!("{}({}/{})", c.name, current, c.total)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Redraw the progress line; `newline` keeps it on screen for good.
    fn display(&self, newline: bool) {
        let prefix = colorize_prefix("stream", "stream");
        let line = self.line();

        let mut out = stderr().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        if newline {
            writeln!(out, "{prefix} {line}").ok();
        } else {
            write!(out, "{prefix} {line}").ok();
        }
        out.flush().ok();
    }

    /// Finish progress display, preserve line and move to next line.
    pub fn finish(self) {
        BAR_ACTIVE.store(false, Ordering::SeqCst);
        {
            let _guard = self.lock.lock();
            self.display(true);
        }
        std::mem::forget(self); // Prevent Drop from clearing
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        BAR_ACTIVE.store(false, Ordering::SeqCst);

        // Clear the line on drop (if not finished properly)
        let mut out = stderr().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        out.flush().ok();
    }
}

// ============================================================================
// Tests
// ============================================================================
