// yt-dlp progress parsing and console rendering

use std::io::Write;

use regex::Regex;

/// One parsed `[download]` line
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}

/// Parse yt-dlp progress line like:
/// [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
pub fn parse_ytdlp_progress(line: &str) -> Option<DownloadProgress> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(
            r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)(?:\s+at\s+(\S+/s|Unknown speed))?(?:\s+ETA\s+(\S+))?"
        ).unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        let size = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
        let speed = caps.get(3).map(|m| m.as_str());
        let eta = caps.get(4).map(|m| m.as_str());

        let status = match (speed, eta) {
            (Some(s), Some(e)) => format!("{:.1}% of {} at {} ETA {}", percent, size, s, e),
            (Some(s), None) => format!("{:.1}% of {} at {}", percent, size, s),
            _ => format!("{:.1}% of {}", percent, size),
        };

        return Some(DownloadProgress { percent, status });
    }

    if ALREADY_RE.is_match(line) {
        return Some(DownloadProgress {
            percent: 100.0,
            status: "already downloaded".to_string(),
        });
    }

    None
}

/// Single-line progress indicator on stderr
pub struct ConsoleProgress {
    label: String,
    width: usize,
    last_percent: Option<f32>,
}

impl ConsoleProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            width: 30,
            last_percent: None,
        }
    }

    pub fn render(&self, progress: &DownloadProgress) -> String {
        let filled = ((progress.percent.clamp(0.0, 100.0) / 100.0) * self.width as f32).round() as usize;
        format!(
            "{} [{}{}] {}",
            self.label,
            "#".repeat(filled),
            "-".repeat(self.width - filled),
            progress.status
        )
    }

    pub fn update(&mut self, progress: &DownloadProgress) {
        if self.last_percent == Some(progress.percent) {
            return;
        }
        self.last_percent = Some(progress.percent);
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{}\x1b[K", self.render(progress));
        let _ = err.flush();
    }

    /// End the progress line so following output starts on a fresh line
    pub fn finish(&mut self) {
        if self.last_percent.take().is_some() {
            let _ = writeln!(std::io::stderr());
        }
    }
}
