// Downloader module - stream selection, fetching and merging

pub mod errors;
pub mod extractors;
pub mod models;
pub mod muxer;
pub mod orchestrator;
pub mod progress;
pub mod quality;
pub mod tools;
pub mod traits;
pub mod utils;

pub use errors::{DownloadError, ErrorKind};
pub use extractors::{ExtractorConfig, YtDlpExtractor};
pub use models::{DownloadOutcome, PlaylistReport, QualityOption, StreamDescriptor, StreamKind};
pub use muxer::FfmpegMuxer;
pub use orchestrator::{Downloader, RunReport, UrlKind};
pub use quality::{FixedResolution, PromptResolution, ResolutionProvider};
pub use traits::{Muxer, StreamSource};
