// Collaborator traits: where streams come from and how they are merged

use std::path::Path;

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{PlaylistDetails, StreamDescriptor, VideoDetails};

/// Resolves URLs into stream metadata and fetches individual streams
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    /// Metadata and all available streams of one video
    async fn video(&self, url: &str) -> Result<VideoDetails, DownloadError>;

    /// Member video URLs of a playlist, in order
    async fn playlist(&self, url: &str) -> Result<PlaylistDetails, DownloadError>;

    /// Download a single stream of `url` to `dest`
    async fn download(
        &self,
        url: &str,
        stream: &StreamDescriptor,
        dest: &Path,
    ) -> Result<(), DownloadError>;
}

/// Combines a video-only and an audio-only file into one container
#[async_trait]
pub trait Muxer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError>;
}
