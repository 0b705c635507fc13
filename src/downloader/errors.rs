// Error types for the download pipeline

use std::path::PathBuf;

use thiserror::Error;

use super::extractors::BlockingReason;

/// Coarse failure classes a caller can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad quality selection from the user (or no options to select from)
    Input,
    /// Resolving, listing or downloading a URL failed
    NetworkOrExtraction,
    /// The multiplexer could not produce the output file
    Multiplex,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Quality selection was not a number or out of range
    #[error("Invalid selection '{input}': expected a number between 1 and {max}")]
    InvalidSelection { input: String, max: usize },

    /// Nothing to offer the user
    #[error("No qualities available to choose from")]
    NoQualityOptions,

    /// yt-dlp failed to resolve the URL
    #[error("Extraction failed: {message}")]
    Extraction {
        message: String,
        reason: Option<BlockingReason>,
    },

    /// yt-dlp failed while fetching a stream
    #[error("Download of format {format_id} failed: {message}")]
    Download {
        format_id: String,
        message: String,
        reason: Option<BlockingReason>,
    },

    /// The video has no stream of the requested kind
    #[error("No {0} stream available")]
    NoStreams(&'static str),

    /// ffmpeg exited with a non-zero status
    #[error("Merging into {} failed ({status}): {stderr}", .output.display())]
    Mux {
        output: PathBuf,
        status: String,
        stderr: String,
    },

    /// yt-dlp or ffmpeg could not be started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSelection { .. } | Self::NoQualityOptions => ErrorKind::Input,
            Self::Mux { .. } => ErrorKind::Multiplex,
            Self::Extraction { .. }
            | Self::Download { .. }
            | Self::NoStreams(_)
            | Self::ToolNotFound(_)
            | Self::Parse(_)
            | Self::Timeout { .. }
            | Self::Io(_) => ErrorKind::NetworkOrExtraction,
        }
    }

    /// Build an extraction error from yt-dlp stderr, keeping the diagnosis
    pub fn extraction(stderr: &str) -> Self {
        Self::Extraction {
            message: last_meaningful_line(stderr),
            reason: super::extractors::diagnose_error(stderr),
        }
    }

    pub fn download(format_id: &str, stderr: &str) -> Self {
        Self::Download {
            format_id: format_id.to_string(),
            message: last_meaningful_line(stderr),
            reason: super::extractors::diagnose_error(stderr),
        }
    }

    /// Diagnosed cause, when yt-dlp output matched a known pattern
    pub fn blocking_reason(&self) -> Option<BlockingReason> {
        match self {
            Self::Extraction { reason, .. } | Self::Download { reason, .. } => *reason,
            _ => None,
        }
    }
}

/// yt-dlp prints warnings before the actual error; the last line is the one that matters
fn last_meaningful_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("unknown error")
        .to_string()
}
