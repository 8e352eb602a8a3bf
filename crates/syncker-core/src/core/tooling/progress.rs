use std::io::{self, IsTerminal, Write};

const PREFIX: &str = "syncker \u{25b8}";

/// Decides whether transfer progress is drawn on stderr.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReporter {
    enabled: bool,
}

impl ProgressReporter {
    /// `preference` comes from `SYNCKER_PROGRESS`; without it progress is
    /// shown only when stderr is a terminal.
    #[must_use]
    pub fn new(preference: Option<bool>, quiet: bool) -> Self {
        let enabled = !quiet && preference.unwrap_or_else(|| io::stderr().is_terminal());
        Self { enabled }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn transfer(&self, label: impl Into<String>) -> TransferProgress {
        TransferProgress {
            label: label.into(),
            enabled: self.enabled,
            last: None,
            rendered: false,
        }
    }
}

/// A single progress line, cleared when dropped.
pub struct TransferProgress {
    label: String,
    enabled: bool,
    last: Option<String>,
    rendered: bool,
}

impl TransferProgress {
    pub fn update(&mut self, done: u64, total: Option<u64>) {
        if !self.enabled {
            return;
        }
        let line = format_line(&self.label, done, total);
        if self.last.as_deref() == Some(line.as_str()) {
            return;
        }
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "\r\x1b[2K{line}");
        let _ = stderr.flush();
        self.last = Some(line);
        self.rendered = true;
    }

    pub fn finish(&mut self) {
        if self.rendered {
            let mut stderr = io::stderr().lock();
            let _ = stderr.write_all(b"\r\x1b[2K");
            let _ = stderr.flush();
            self.rendered = false;
        }
    }
}

impl Drop for TransferProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

pub(crate) fn format_line(label: &str, done: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => {
            let percent = done.min(total).saturating_mul(100) / total;
            format!("{PREFIX} {label} {percent}%")
        }
        _ => format!("{PREFIX} {label} {}", format_bytes(done)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for &next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}
