pub mod config;
pub mod downloader;

pub use downloader::{DownloadError, Downloader, ErrorKind};

/// First prompt of an interactive run
pub const URL_PROMPT: &str = "Enter the URL of the video or playlist: ";
