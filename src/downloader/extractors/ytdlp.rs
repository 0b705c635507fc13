// yt-dlp backed StreamSource
//
// Metadata comes from `--dump-json`, playlists from `--flat-playlist`, and
// each stream is fetched with `-f <format_id>` so yt-dlp handles signatures,
// throttling and fragmented protocols for us.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;

use super::config::ExtractorConfig;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{
    PlaylistDetails, StreamDescriptor, StreamKind, StreamSet, VideoDetails,
};
use crate::downloader::progress::{parse_ytdlp_progress, ConsoleProgress};
use crate::downloader::traits::StreamSource;
use crate::downloader::utils::{run_output_with_timeout, spawn_error};

#[derive(Debug, Deserialize)]
struct RawVideo {
    id: String,
    title: Option<String>,
    #[serde(default)]
    formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
struct RawFormat {
    format_id: String,
    #[serde(default)]
    ext: String,
    height: Option<u32>,
    vcodec: Option<String>,
    acodec: Option<String>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawPlaylist {
    title: Option<String>,
    #[serde(default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: Option<String>,
    url: Option<String>,
}

fn has_codec(codec: &Option<String>) -> bool {
    codec
        .as_deref()
        .map_or(false, |c| c != "none" && !c.is_empty())
}

impl RawFormat {
    /// `None` for formats without any media track (storyboards)
    fn into_descriptor(self) -> Option<StreamDescriptor> {
        let kind = match (has_codec(&self.vcodec), has_codec(&self.acodec)) {
            (true, true) => StreamKind::Combined,
            (true, false) => StreamKind::VideoOnly,
            (false, true) => StreamKind::AudioOnly,
            (false, false) => return None,
        };

        let resolution = match kind {
            StreamKind::AudioOnly => None,
            _ => self.height.filter(|h| *h > 0).map(|h| format!("{}p", h)),
        };

        Some(StreamDescriptor {
            format_id: self.format_id,
            resolution,
            filesize: self.filesize.or(self.filesize_approx).unwrap_or(0),
            ext: self.ext,
            kind,
        })
    }
}

/// Parse `--dump-json` output. yt-dlp lists formats worst to best; the set is
/// returned best first so that "first match" is the preferred stream.
pub fn parse_video_json(stdout: &[u8]) -> Result<VideoDetails, DownloadError> {
    let raw: RawVideo = serde_json::from_slice(stdout)
        .map_err(|e| DownloadError::Parse(format!("Invalid video JSON: {}", e)))?;

    let mut streams: Vec<StreamDescriptor> = raw
        .formats
        .into_iter()
        .filter_map(RawFormat::into_descriptor)
        .collect();
    streams.reverse();

    Ok(VideoDetails {
        title: raw.title.unwrap_or_else(|| raw.id.clone()),
        id: raw.id,
        streams: StreamSet::new(streams),
    })
}

/// Parse `--flat-playlist --dump-single-json` output
pub fn parse_playlist_json(stdout: &[u8]) -> Result<PlaylistDetails, DownloadError> {
    let raw: RawPlaylist = serde_json::from_slice(stdout)
        .map_err(|e| DownloadError::Parse(format!("Invalid playlist JSON: {}", e)))?;

    let video_urls = raw
        .entries
        .into_iter()
        .filter_map(|entry| match (entry.url, entry.id) {
            (Some(url), _) if url.starts_with("http") => Some(url),
            (_, Some(id)) => Some(format!("https://www.youtube.com/watch?v={}", id)),
            (Some(url), None) => Some(url),
            (None, None) => None,
        })
        .collect();

    Ok(PlaylistDetails {
        title: raw.title.unwrap_or_else(|| "Untitled playlist".to_string()),
        video_urls,
    })
}

/// StreamSource that shells out to the yt-dlp binary
pub struct YtDlpExtractor {
    config: ExtractorConfig,
}

impl YtDlpExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn video_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["--dump-json".to_string(), "--no-playlist".to_string()];
        args.extend(self.config.common_args());
        args.push(url.to_string());
        args
    }

    pub fn playlist_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
        ];
        args.extend(self.config.common_args());
        args.push(url.to_string());
        args
    }

    pub fn download_args(&self, url: &str, format_id: &str, dest: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            format_id.to_string(),
            "-o".to_string(),
            dest.to_string_lossy().to_string(),
            "--newline".to_string(),
            "--no-part".to_string(),
            "--force-overwrites".to_string(),
            "--no-playlist".to_string(),
        ];
        args.extend(self.config.common_args());
        args.push(url.to_string());
        args
    }

    async fn dump(&self, args: Vec<String>) -> Result<Vec<u8>, DownloadError> {
        let output = run_output_with_timeout(
            &self.config.ytdlp_path,
            &args,
            self.config.info_timeout_secs,
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::extraction(&stderr));
        }
        Ok(output.stdout)
    }
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

#[async_trait]
impl StreamSource for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn video(&self, url: &str) -> Result<VideoDetails, DownloadError> {
        let stdout = self.dump(self.video_args(url)).await?;
        let details = parse_video_json(&stdout)?;
        tracing::debug!(
            "[{}] {} ({}): {} streams",
            self.name(),
            details.title,
            details.id,
            details.streams.len()
        );
        Ok(details)
    }

    async fn playlist(&self, url: &str) -> Result<PlaylistDetails, DownloadError> {
        let stdout = self.dump(self.playlist_args(url)).await?;
        parse_playlist_json(&stdout)
    }

    async fn download(
        &self,
        url: &str,
        stream: &StreamDescriptor,
        dest: &Path,
    ) -> Result<(), DownloadError> {
        let args = self.download_args(url, &stream.format_id, dest);
        tracing::debug!("Running: {} {}", self.config.ytdlp_path, args.join(" "));

        let mut child = TokioCommand::new(&self.config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.config.ytdlp_path, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Parse("Failed to capture yt-dlp stdout".to_string()))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::Parse("Failed to capture yt-dlp stderr".to_string()))?;

        let label = match &stream.resolution {
            Some(res) => res.clone(),
            None => "audio".to_string(),
        };
        let mut bar = ConsoleProgress::new(label);

        let read_progress = async {
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(progress) = parse_ytdlp_progress(&line) {
                    bar.update(&progress);
                }
            }
            Ok::<_, std::io::Error>(())
        };
        let read_stderr = async {
            let mut buf = Vec::new();
            stderr_pipe.read_to_end(&mut buf).await?;
            Ok::<_, std::io::Error>(buf)
        };

        let (progress_res, stderr_res, status) =
            tokio::join!(read_progress, read_stderr, child.wait());
        bar.finish();
        progress_res?;
        let stderr = stderr_res?;
        let status = status?;

        if !status.success() {
            return Err(DownloadError::download(
                &stream.format_id,
                &String::from_utf8_lossy(&stderr),
            ));
        }
        Ok(())
    }
}
