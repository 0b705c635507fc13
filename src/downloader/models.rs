// Common data models for downloader

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Container every job is fetched and merged in
pub const CONTAINER_EXT: &str = "mp4";

/// What a stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    VideoOnly,
    AudioOnly,
    /// Progressive stream with both tracks
    Combined,
}

impl StreamKind {
    /// Adaptive streams need a separate merge step
    pub fn is_adaptive(&self) -> bool {
        matches!(self, Self::VideoOnly | Self::AudioOnly)
    }
}

/// One encoded variant of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Extractor-specific id used to request this stream (e.g. "137")
    pub format_id: String,
    /// Resolution label such as "1080p"; unset for audio
    pub resolution: Option<String>,
    /// File size in bytes (0 when the extractor does not know it)
    pub filesize: u64,
    /// File extension as reported by the extractor (mp4, m4a, webm)
    pub ext: String,
    pub kind: StreamKind,
}

impl StreamDescriptor {
    /// Container family of the stream; MP4 audio is reported as m4a
    pub fn container(&self) -> &str {
        match self.ext.as_str() {
            "m4a" => "mp4",
            other => other,
        }
    }

    /// Numeric part of the resolution label ("1080p" -> 1080)
    pub fn resolution_value(&self) -> Option<u32> {
        self.resolution.as_deref().and_then(resolution_value)
    }
}

/// Parse "1080p" into 1080
pub fn resolution_value(label: &str) -> Option<u32> {
    label
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .ok()
}

/// Queryable set of streams for one video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSet {
    streams: Vec<StreamDescriptor>,
}

impl StreamSet {
    pub fn new(streams: Vec<StreamDescriptor>) -> Self {
        Self { streams }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter()
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    fn retain(&self, keep: impl Fn(&StreamDescriptor) -> bool) -> Self {
        Self {
            streams: self.streams.iter().filter(|s| keep(s)).cloned().collect(),
        }
    }

    pub fn with_container(&self, container: &str) -> Self {
        self.retain(|s| s.container() == container)
    }

    pub fn adaptive(&self) -> Self {
        self.retain(|s| s.kind.is_adaptive())
    }

    pub fn of_kind(&self, kind: StreamKind) -> Self {
        self.retain(|s| s.kind == kind)
    }

    pub fn with_resolution(&self, label: &str) -> Self {
        self.retain(|s| s.resolution.as_deref() == Some(label))
    }

    pub fn first(&self) -> Option<&StreamDescriptor> {
        self.streams.first()
    }

    /// Highest-resolution video-bearing stream; earliest wins on ties
    pub fn highest_resolution(&self) -> Option<&StreamDescriptor> {
        let mut best: Option<(u32, &StreamDescriptor)> = None;
        for stream in self.streams.iter().filter(|s| s.kind != StreamKind::AudioOnly) {
            if let Some(value) = stream.resolution_value() {
                if best.map_or(true, |(top, _)| value > top) {
                    best = Some((value, stream));
                }
            }
        }
        best.map(|(_, s)| s)
    }
}

/// Video metadata plus its streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoDetails {
    /// Stable id used for temporary file names
    pub id: String,
    pub title: String,
    pub streams: StreamSet,
}

/// Playlist title and member URLs in playlist order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistDetails {
    pub title: String,
    pub video_urls: Vec<String>,
}

/// Deduplicated (resolution, size) pair offered to the user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualityOption {
    pub resolution: String,
    pub size: u64,
}

impl QualityOption {
    pub fn new(resolution: impl Into<String>, size: u64) -> Self {
        Self {
            resolution: resolution.into(),
            size,
        }
    }

    pub fn size_mib(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }
}

/// File layout of one video's work unit
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: String,
    /// Requested resolution; `None` means the provider is asked
    pub resolution: Option<String>,
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub output_path: PathBuf,
}

impl DownloadJob {
    pub fn new(
        url: &str,
        resolution: Option<String>,
        dir: &Path,
        video_id: &str,
        title: &str,
    ) -> Self {
        let stem = super::utils::sanitize_filename(title).unwrap_or_else(|| video_id.to_string());
        Self {
            url: url.to_string(),
            resolution,
            video_path: dir.join(format!("video_{}.{}", video_id, CONTAINER_EXT)),
            audio_path: dir.join(format!("audio_{}.{}", video_id, CONTAINER_EXT)),
            output_path: dir.join(format!("{}.{}", stem, CONTAINER_EXT)),
        }
    }
}

/// Result of a merged video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub title: String,
    pub output_path: PathBuf,
    /// Resolution of the stream that was actually fetched
    pub resolution: String,
    /// Requested label that had no exact match, if a substitute was used
    pub substituted_for: Option<String>,
}

/// Per-member results of a playlist run, in playlist order
#[derive(Debug)]
pub struct PlaylistReport {
    pub title: String,
    pub resolution: Option<String>,
    pub results: Vec<(String, Result<DownloadOutcome, super::DownloadError>)>,
}

impl PlaylistReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}
