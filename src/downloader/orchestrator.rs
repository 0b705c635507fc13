// Orchestrator: resolve, pick quality, download both streams, merge, clean up

use std::path::{Path, PathBuf};

use super::errors::DownloadError;
use super::models::{
    DownloadJob, DownloadOutcome, PlaylistReport, StreamKind, StreamSet, VideoDetails,
    CONTAINER_EXT,
};
use super::quality::{available_qualities, ResolutionProvider};
use super::traits::{Muxer, StreamSource};

/// Marker that routes a URL to playlist handling
pub const PLAYLIST_MARKER: &str = "playlist";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    Video,
    Playlist,
}

impl UrlKind {
    /// Plain substring check, no URL validation
    pub fn detect(url: &str) -> Self {
        if url.contains(PLAYLIST_MARKER) {
            Self::Playlist
        } else {
            Self::Video
        }
    }
}

/// What a dispatched URL produced
#[derive(Debug)]
pub enum RunReport {
    Video(DownloadOutcome),
    Playlist(PlaylistReport),
}

pub struct Downloader {
    source: Box<dyn StreamSource>,
    muxer: Box<dyn Muxer>,
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(source: Box<dyn StreamSource>, muxer: Box<dyn Muxer>) -> Self {
        Self {
            source,
            muxer,
            output_dir: PathBuf::from("."),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Send the URL to single-video or playlist handling
    pub async fn run(
        &self,
        url: &str,
        resolution: Option<String>,
        provider: &mut dyn ResolutionProvider,
    ) -> Result<RunReport, DownloadError> {
        match UrlKind::detect(url) {
            UrlKind::Playlist => self
                .download_playlist(url, resolution, provider)
                .await
                .map(RunReport::Playlist),
            UrlKind::Video => self
                .download_video(url, resolution, provider)
                .await
                .map(RunReport::Video),
        }
    }

    /// Adaptive MP4 streams of a video
    fn candidate_streams(details: &VideoDetails) -> StreamSet {
        details.streams.with_container(CONTAINER_EXT).adaptive()
    }

    fn ask_resolution(
        streams: &StreamSet,
        provider: &mut dyn ResolutionProvider,
    ) -> Result<String, DownloadError> {
        let video_only = streams.of_kind(StreamKind::VideoOnly);
        let options = available_qualities(video_only.iter());
        provider.choose(&options)
    }

    /// Download one video at `resolution` (or one chosen by `provider`) and merge it.
    ///
    /// Temporary files are removed only once the merge succeeded; on any earlier
    /// error they stay where they are.
    pub async fn download_video(
        &self,
        url: &str,
        resolution: Option<String>,
        provider: &mut dyn ResolutionProvider,
    ) -> Result<DownloadOutcome, DownloadError> {
        let details = self.source.video(url).await?;
        let streams = Self::candidate_streams(&details);

        let requested = match resolution {
            Some(res) => res,
            None => Self::ask_resolution(&streams, provider)?,
        };

        let video_streams = streams.of_kind(StreamKind::VideoOnly);
        let exact = video_streams.with_resolution(&requested).first().cloned();
        let (video, substituted_for) = match exact {
            Some(stream) => (stream, None),
            None => {
                let fallback = video_streams
                    .highest_resolution()
                    .cloned()
                    .ok_or(DownloadError::NoStreams("video-only"))?;
                tracing::warn!(
                    "Video with resolution {} not available. Downloading highest resolution available.",
                    requested
                );
                (fallback, Some(requested.clone()))
            }
        };

        let audio = streams
            .of_kind(StreamKind::AudioOnly)
            .first()
            .cloned()
            .ok_or(DownloadError::NoStreams("audio-only"))?;

        let job = DownloadJob::new(
            url,
            Some(requested.clone()),
            &self.output_dir,
            &details.id,
            &details.title,
        );
        let used = video.resolution.clone().unwrap_or_default();

        tracing::info!("Downloading video: {} in {}", details.title, used);
        self.source.download(url, &video, &job.video_path).await?;
        tracing::info!("Video downloaded");

        tracing::info!("Downloading audio");
        self.source.download(url, &audio, &job.audio_path).await?;
        tracing::info!("Audio downloaded");

        tracing::info!("Merging video and audio");
        self.muxer
            .merge(&job.video_path, &job.audio_path, &job.output_path)
            .await?;
        tracing::info!("Downloaded and merged: {}", job.output_path.display());

        tokio::fs::remove_file(&job.video_path).await?;
        tokio::fs::remove_file(&job.audio_path).await?;

        Ok(DownloadOutcome {
            title: details.title,
            output_path: job.output_path,
            resolution: used,
            substituted_for,
        })
    }

    /// Download every member of a playlist, one after another.
    ///
    /// Without a resolution the first member is inspected once and the chosen
    /// label is reused for all members. A failing member is recorded in the
    /// report and the loop moves on.
    pub async fn download_playlist(
        &self,
        url: &str,
        resolution: Option<String>,
        provider: &mut dyn ResolutionProvider,
    ) -> Result<PlaylistReport, DownloadError> {
        let playlist = self.source.playlist(url).await?;
        tracing::info!("Downloading playlist: {}", playlist.title);

        let resolution = match (resolution, playlist.video_urls.first()) {
            (Some(res), _) => Some(res),
            (None, Some(first)) => {
                let details = self.source.video(first).await?;
                Some(Self::ask_resolution(&Self::candidate_streams(&details), provider)?)
            }
            (None, None) => None,
        };

        if playlist.video_urls.is_empty() {
            tracing::warn!("Playlist {} has no videos", playlist.title);
        }

        let mut results = Vec::with_capacity(playlist.video_urls.len());
        for (idx, video_url) in playlist.video_urls.iter().enumerate() {
            tracing::info!(
                "[{}/{}] {}",
                idx + 1,
                playlist.video_urls.len(),
                video_url
            );
            let result = self
                .download_video(video_url, resolution.clone(), provider)
                .await;
            if let Err(e) = &result {
                tracing::error!("Error downloading video: {}", e);
            }
            results.push((video_url.clone(), result));
        }

        Ok(PlaylistReport {
            title: playlist.title,
            resolution,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::ErrorKind;
    use crate::downloader::models::{PlaylistDetails, QualityOption, StreamDescriptor};
    use crate::downloader::quality::FixedResolution;
    use async_trait::async_trait;
    use std::collections::HashMap;

    const MB: u64 = 1024 * 1024;

    fn stream(id: &str, res: Option<&str>, ext: &str, kind: StreamKind) -> StreamDescriptor {
        StreamDescriptor {
            format_id: id.to_string(),
            resolution: res.map(str::to_string),
            filesize: 10 * MB,
            ext: ext.to_string(),
            kind,
        }
    }

    fn standard_streams() -> StreamSet {
        StreamSet::new(vec![
            stream("137", Some("1080p"), "mp4", StreamKind::VideoOnly),
            stream("248", Some("1080p"), "webm", StreamKind::VideoOnly),
            stream("136", Some("720p"), "mp4", StreamKind::VideoOnly),
            stream("18", Some("360p"), "mp4", StreamKind::Combined),
            stream("140", None, "m4a", StreamKind::AudioOnly),
            stream("251", None, "webm", StreamKind::AudioOnly),
        ])
    }

    /// In-memory source; a URL listed in `failing` errors on resolution
    #[derive(Default)]
    struct FakeSource {
        videos: HashMap<String, VideoDetails>,
        playlists: HashMap<String, PlaylistDetails>,
        failing: Vec<String>,
    }

    impl FakeSource {
        fn with_video(mut self, url: &str, id: &str, title: &str, streams: StreamSet) -> Self {
            self.videos.insert(
                url.to_string(),
                VideoDetails {
                    id: id.to_string(),
                    title: title.to_string(),
                    streams,
                },
            );
            self
        }
    }

    #[async_trait]
    impl StreamSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn video(&self, url: &str) -> Result<VideoDetails, DownloadError> {
            if self.failing.iter().any(|f| f == url) {
                return Err(DownloadError::extraction("ERROR: Video unavailable"));
            }
            self.videos
                .get(url)
                .cloned()
                .ok_or_else(|| DownloadError::extraction("ERROR: Unsupported URL"))
        }

        async fn playlist(&self, url: &str) -> Result<PlaylistDetails, DownloadError> {
            self.playlists
                .get(url)
                .cloned()
                .ok_or_else(|| DownloadError::extraction("ERROR: The playlist does not exist"))
        }

        async fn download(
            &self,
            _url: &str,
            stream: &StreamDescriptor,
            dest: &Path,
        ) -> Result<(), DownloadError> {
            tokio::fs::write(dest, stream.format_id.as_bytes()).await?;
            Ok(())
        }
    }

    /// Writes the concatenated inputs, or fails like a non-zero ffmpeg exit
    struct FakeMuxer {
        fail: bool,
    }

    #[async_trait]
    impl Muxer for FakeMuxer {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn merge(&self, video: &Path, audio: &Path, output: &Path) -> Result<(), DownloadError> {
            if self.fail {
                return Err(DownloadError::Mux {
                    output: output.to_path_buf(),
                    status: "exit status: 1".to_string(),
                    stderr: "Invalid data found when processing input".to_string(),
                });
            }
            let mut data = tokio::fs::read(video).await?;
            data.extend(tokio::fs::read(audio).await?);
            tokio::fs::write(output, data).await?;
            Ok(())
        }
    }

    /// Records the options it was shown and answers with a fixed label
    struct RecordingProvider {
        answer: String,
        seen: Vec<Vec<QualityOption>>,
    }

    impl ResolutionProvider for RecordingProvider {
        fn choose(&mut self, options: &[QualityOption]) -> Result<String, DownloadError> {
            self.seen.push(options.to_vec());
            Ok(self.answer.clone())
        }
    }

    /// Must never be consulted
    struct NoPrompt;

    impl ResolutionProvider for NoPrompt {
        fn choose(&mut self, _options: &[QualityOption]) -> Result<String, DownloadError> {
            panic!("provider should not be asked");
        }
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn downloader(source: FakeSource, fail_mux: bool, dir: &Path) -> Downloader {
        Downloader::new(Box::new(source), Box::new(FakeMuxer { fail: fail_mux }))
            .with_output_dir(dir)
    }

    #[test]
    fn test_url_dispatch() {
        assert_eq!(
            UrlKind::detect("https://www.youtube.com/playlist?list=PL123"),
            UrlKind::Playlist
        );
        assert_eq!(
            UrlKind::detect("https://www.youtube.com/watch?v=abc&list=PL123"),
            UrlKind::Video
        );
    }

    #[tokio::test]
    async fn test_single_video_leaves_only_output() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default().with_video("u1", "abc", "My Video", standard_streams());
        let dl = downloader(source, false, dir.path());

        let mut provider = RecordingProvider {
            answer: "720p".to_string(),
            seen: Vec::new(),
        };
        let outcome = dl.download_video("u1", None, &mut provider).await.unwrap();

        assert_eq!(outcome.resolution, "720p");
        assert_eq!(outcome.substituted_for, None);
        assert_eq!(outcome.output_path, dir.path().join("My Video.mp4"));
        assert_eq!(dir_entries(dir.path()), vec!["My Video.mp4"]);
        assert_eq!(std::fs::read(&outcome.output_path).unwrap(), b"136140");

        // Only MP4 video-only streams are offered
        assert_eq!(
            provider.seen,
            vec![vec![
                QualityOption::new("1080p", 10 * MB),
                QualityOption::new("720p", 10 * MB),
            ]]
        );
    }

    #[tokio::test]
    async fn test_missing_resolution_falls_back_to_highest() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default().with_video("u1", "abc", "Fallback", standard_streams());
        let dl = downloader(source, false, dir.path());

        let outcome = dl
            .download_video("u1", Some("480p".to_string()), &mut NoPrompt)
            .await
            .unwrap();

        assert_eq!(outcome.resolution, "1080p");
        assert_eq!(outcome.substituted_for.as_deref(), Some("480p"));
        assert_eq!(std::fs::read(&outcome.output_path).unwrap(), b"137140");
    }

    #[tokio::test]
    async fn test_invalid_selection_downloads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default().with_video("u1", "abc", "Nope", standard_streams());
        let dl = downloader(source, false, dir.path());

        let mut out = Vec::new();
        let mut prompt = crate::downloader::quality::PromptResolution::new("0\n".as_bytes(), &mut out);
        let err = dl.download_video("u1", None, &mut prompt).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Input);
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_mux_failure_keeps_temporaries() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default().with_video("u1", "abc", "Broken", standard_streams());
        let dl = downloader(source, true, dir.path());

        let err = dl
            .download_video("u1", Some("720p".to_string()), &mut NoPrompt)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Multiplex);
        assert_eq!(dir_entries(dir.path()), vec!["audio_abc.mp4", "video_abc.mp4"]);
    }

    #[tokio::test]
    async fn test_no_audio_stream() {
        let dir = tempfile::tempdir().unwrap();
        let streams = StreamSet::new(vec![
            stream("137", Some("1080p"), "mp4", StreamKind::VideoOnly),
            stream("251", None, "webm", StreamKind::AudioOnly),
        ]);
        let source = FakeSource::default().with_video("u1", "abc", "Silent", streams);
        let dl = downloader(source, false, dir.path());

        let err = dl
            .download_video("u1", Some("1080p".to_string()), &mut NoPrompt)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::NoStreams("audio-only")));
    }

    #[tokio::test]
    async fn test_playlist_continues_after_member_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FakeSource::default()
            .with_video("v1", "id1", "First", standard_streams())
            .with_video("v2", "id2", "Second", standard_streams())
            .with_video("v3", "id3", "Third", standard_streams());
        source.failing.push("v2".to_string());
        source.playlists.insert(
            "https://www.youtube.com/playlist?list=PL1".to_string(),
            PlaylistDetails {
                title: "Mix".to_string(),
                video_urls: vec!["v1".to_string(), "v2".to_string(), "v3".to_string()],
            },
        );
        let dl = downloader(source, false, dir.path());

        let mut provider = RecordingProvider {
            answer: "1080p".to_string(),
            seen: Vec::new(),
        };
        let report = dl
            .download_playlist("https://www.youtube.com/playlist?list=PL1", None, &mut provider)
            .await
            .unwrap();

        // Asked exactly once, for the first member
        assert_eq!(provider.seen.len(), 1);
        assert_eq!(report.resolution.as_deref(), Some("1080p"));
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.results[1].1.as_ref().unwrap_err().kind(),
            ErrorKind::NetworkOrExtraction
        );
        assert_eq!(dir_entries(dir.path()), vec!["First.mp4", "Third.mp4"]);
    }

    #[tokio::test]
    async fn test_playlist_resolution_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let dl = downloader(FakeSource::default(), false, dir.path());

        let err = dl
            .run("https://www.youtube.com/playlist?list=missing", None, &mut NoPrompt)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkOrExtraction);
    }

    #[tokio::test]
    async fn test_empty_playlist_does_not_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = FakeSource::default();
        source.playlists.insert(
            "https://www.youtube.com/playlist?list=empty".to_string(),
            PlaylistDetails {
                title: "Empty".to_string(),
                video_urls: Vec::new(),
            },
        );
        let dl = downloader(source, false, dir.path());

        let report = dl
            .download_playlist("https://www.youtube.com/playlist?list=empty", None, &mut NoPrompt)
            .await
            .unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.resolution, None);
    }

    #[tokio::test]
    async fn test_run_dispatches_single_video() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default().with_video(
            "https://www.youtube.com/watch?v=abc",
            "abc",
            "Single",
            standard_streams(),
        );
        let dl = downloader(source, false, dir.path());

        let report = dl
            .run(
                "https://www.youtube.com/watch?v=abc",
                Some("1080p".to_string()),
                &mut FixedResolution("ignored".to_string()),
            )
            .await
            .unwrap();
        assert!(matches!(report, RunReport::Video(ref o) if o.resolution == "1080p"));
    }
}
