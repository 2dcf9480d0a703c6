//! Progress bar utilities for CLI output
//!
//! Key features:
//! - [`IndicatifRenderer`] draws the copy and delete passes of an import
//! - Consistent visual styling across all operations
//! - [`DualWriter`] for logging to console and file at once

use crate::core::progress::{ProgressEvent, ProgressPhase, ProgressRenderer};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Bar currently on screen; log output is written while it is suspended
static ACTIVE_BAR: Mutex<Option<ProgressBar>> = Mutex::new(None);

fn set_active_bar(bar: Option<ProgressBar>) {
    if let Ok(mut active) = ACTIVE_BAR.lock() {
        *active = bar;
    }
}

/// Run `f` with the active progress bar (if any) hidden
pub fn with_bar_suspended<R>(f: impl FnOnce() -> R) -> R {
    let bar = ACTIVE_BAR.lock().ok().and_then(|active| active.clone());
    match bar {
        Some(bar) => bar.suspend(f),
        None => f(),
    }
}

// ============================================================================
// Styles - Consistent visual appearance
// ============================================================================

/// Byte-based bar for the copy pass
fn copy_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.green} [{bar:40.cyan/dim}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╾─")
}

/// Count-based bar for the delete pass
fn delete_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {spinner:.yellow} [{bar:40.yellow/dim}] {pos}/{len} ({percent}%) {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━╾─")
}

/// Get the style for completed progress bars
fn completed_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  ✓ [{bar:40.green/dim}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━━")
}

// ============================================================================
// Console output helpers
// ============================================================================

/// Print a header section with a box
pub fn print_header(title: &str) {
    let width = 68;
    let title_padded = format!("{:^width$}", title, width = width - 4);
    println!();
    println!("╔{}╗", "═".repeat(width - 2));
    println!("║{}║", title_padded);
    println!("╚{}╝", "═".repeat(width - 2));
    println!();
}

/// Print a success message with checkmark
pub fn print_success(msg: &str) {
    println!("  ✓ {}", msg);
}

/// Print an info message with bullet
pub fn print_info(msg: &str) {
    println!("  • {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("  ⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    println!("  ✗ {}", msg);
}

/// Print a step in a process
pub fn print_step(step: usize, total: usize, msg: &str) {
    println!("  [{}/{}] {}", step, total, msg);
}

// ============================================================================
// Import progress
// ============================================================================

/// Terminal renderer for the copy and delete passes
pub struct IndicatifRenderer {
    bar: Option<ProgressBar>,
    start_time: Instant,
}

impl IndicatifRenderer {
    pub fn new() -> Self {
        Self {
            bar: None,
            start_time: Instant::now(),
        }
    }

    fn new_bar(phase: ProgressPhase, total_files: usize, total_bytes: u64) -> ProgressBar {
        let bar = match phase {
            ProgressPhase::Copying => {
                let bar = ProgressBar::new(total_bytes);
                bar.set_style(copy_bar_style());
                bar
            }
            ProgressPhase::Deleting => {
                let bar = ProgressBar::new(total_files as u64);
                bar.set_style(delete_bar_style());
                bar
            }
        };
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_message(format!("{}...", phase));
        bar
    }
}

impl Default for IndicatifRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressRenderer for IndicatifRenderer {
    fn start(&mut self, phase: ProgressPhase, total_files: usize, total_bytes: u64) {
        if let Some(old) = self.bar.take() {
            old.finish_and_clear();
        }
        self.start_time = Instant::now();
        let bar = Self::new_bar(phase, total_files, total_bytes);
        set_active_bar(Some(bar.clone()));
        self.bar = Some(bar);
    }

    fn update(&mut self, event: &ProgressEvent) {
        let Some(bar) = &self.bar else {
            return;
        };
        match event.phase {
            ProgressPhase::Copying => bar.set_position(event.bytes_done),
            ProgressPhase::Deleting => bar.set_position(event.current as u64),
        }
        bar.set_message(format!("{}/{} {}", event.current, event.total, event.label));
    }

    fn finish(&mut self, phase: ProgressPhase) {
        if let Some(bar) = self.bar.take() {
            set_active_bar(None);
            bar.set_style(completed_style());
            bar.finish_with_message(format!(
                "{} done in {}",
                phase,
                format_duration(self.start_time.elapsed())
            ));
        }
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    } else if secs >= 60 {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

// ============================================================================
// Dual writer for file + console logging
// ============================================================================

/// A writer that writes to the console and, optionally, a log file
///
/// Console output is written with the active progress bar suspended. Both
/// sinks always receive the buffer; the first error is returned.
pub struct DualWriter<C: Write = std::io::Stderr> {
    pub console: C,
    pub file: Option<std::fs::File>,
}

impl<C: Write> Write for DualWriter<C> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let console = &mut self.console;
        let shown = with_bar_suspended(|| console.write_all(buf));
        let logged = match &mut self.file {
            Some(file) => file.write_all(buf),
            None => Ok(()),
        };
        shown.and(logged).map(|_| buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let shown = self.console.flush();
        let logged = match &mut self.file {
            Some(file) => file.flush(),
            None => Ok(()),
        };
        shown.and(logged)
    }
}
