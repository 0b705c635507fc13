// Extraction backend: yt-dlp resolves URLs, lists streams and fetches them.
// Failures are classified by `diagnose_error` so the CLI can explain them.

mod config;
mod diagnostics;
mod ytdlp;

pub use config::ExtractorConfig;
pub use diagnostics::{diagnose_error, BlockingReason};
pub use ytdlp::{parse_playlist_json, parse_video_json, YtDlpExtractor};
