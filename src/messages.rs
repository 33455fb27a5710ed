//! Console output that shows up immediately, even when piped.

use std::io::{self, Write};

/// Print a line and flush stdout right away.
pub fn msg(text: impl AsRef<str>) {
    let mut out = io::stdout().lock();
    let _ = writeln!(out, "{}", text.as_ref());
    let _ = out.flush();
}

/// `\r[#####     ] 50%` for a progress fraction in `0.0..=1.0`.
pub fn progress_bar(progress: f64) -> String {
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    let filled = (progress * 10.0) as usize;
    format!(
        "\r[{:<10}] {:.0}%",
        "#".repeat(filled),
        progress * 100.0
    )
}

/// Redraw the progress bar in place.
pub fn update_progress(progress: f64) {
    let mut out = io::stdout().lock();
    let _ = out.write_all(progress_bar(progress).as_bytes());
    let _ = out.flush();
}
