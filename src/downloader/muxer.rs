// ffmpeg invocation: copy the video track, transcode audio to AAC

use std::path::Path;

use async_trait::async_trait;

use super::errors::DownloadError;
use super::traits::Muxer;
use super::utils::run_output_with_timeout;

/// Upper bound for a single merge
const MERGE_TIMEOUT_SECS: u64 = 6 * 60 * 60;

/// How many stderr lines to keep in a failure report
const STDERR_TAIL_LINES: usize = 5;

pub struct FfmpegMuxer {
    ffmpeg_path: String,
}

impl FfmpegMuxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Fixed command shape
    pub fn build_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-i".to_string(),
            audio.to_string_lossy().to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-strict".to_string(),
            "experimental".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Muxer for FfmpegMuxer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError> {
        let args = Self::build_args(video, audio, output);
        let out = run_output_with_timeout(&self.ffmpeg_path, &args, MERGE_TIMEOUT_SECS).await?;

        if out.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&out.stderr);
        let tail: Vec<&str> = stderr
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let tail = tail[tail.len().saturating_sub(STDERR_TAIL_LINES)..].join(" | ");

        tracing::error!(
            "[{}] merge into {} exited with {}",
            self.name(),
            output.display(),
            out.status
        );

        Err(DownloadError::Mux {
            output: output.to_path_buf(),
            status: out.status.to_string(),
            stderr: tail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::ErrorKind;

    #[test]
    fn test_command_shape() {
        let args = FfmpegMuxer::build_args(
            Path::new("video_abc.mp4"),
            Path::new("audio_abc.mp4"),
            Path::new("Title.mp4"),
        );
        assert_eq!(
            args,
            vec![
                "-i", "video_abc.mp4", "-i", "audio_abc.mp4", "-c:v", "copy", "-c:a", "aac",
                "-strict", "experimental", "Title.mp4",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_mux_failure() {
        let muxer = FfmpegMuxer::new("false");
        let err = muxer
            .merge(Path::new("v.mp4"), Path::new("a.mp4"), Path::new("out.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Multiplex);
    }

    #[tokio::test]
    async fn test_missing_ffmpeg() {
        let muxer = FfmpegMuxer::new("/nonexistent/ffmpeg");
        let err = muxer
            .merge(Path::new("v.mp4"), Path::new("a.mp4"), Path::new("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::ToolNotFound(_)));
    }

    /// Needs ffmpeg and ffprobe on PATH
    #[tokio::test]
    #[ignore]
    async fn test_real_merge_copies_video_and_encodes_aac() {
        use std::process::Command;

        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("video.mp4");
        let audio = dir.path().join("audio.mp4");
        let output = dir.path().join("merged.mp4");

        let status = Command::new("ffmpeg")
            .args(["-y", "-f", "lavfi", "-i", "testsrc=duration=2:size=320x240:rate=25"])
            .args(["-c:v", "libx264", "-an"])
            .arg(&video)
            .status()
            .unwrap();
        assert!(status.success());
        let status = Command::new("ffmpeg")
            .args(["-y", "-f", "lavfi", "-i", "sine=frequency=440:duration=2"])
            .args(["-c:a", "libopus", "-vn"])
            .arg(&audio)
            .status()
            .unwrap();
        assert!(status.success());

        FfmpegMuxer::default().merge(&video, &audio, &output).await.unwrap();

        let probe = |path: &Path, stream: &str| {
            let out = Command::new("ffprobe")
                .args(["-v", "error", "-select_streams", stream])
                .args(["-show_entries", "stream=codec_name", "-of", "csv=p=0"])
                .arg(path)
                .output()
                .unwrap();
            String::from_utf8_lossy(&out.stdout).trim().to_string()
        };
        assert_eq!(probe(&output, "v:0"), probe(&video, "v:0"));
        assert_eq!(probe(&output, "a:0"), "aac");

        let packets = |path: &Path| {
            let out = Command::new("ffprobe")
                .args(["-v", "error", "-select_streams", "v:0"])
                .args(["-show_entries", "packet=size", "-of", "csv=p=0"])
                .arg(path)
                .output()
                .unwrap();
            String::from_utf8_lossy(&out.stdout).to_string()
        };
        assert_eq!(packets(&output), packets(&video));
    }
}
