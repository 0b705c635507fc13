use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::downloader::tools::{find_tool, ToolType};
use crate::downloader::{ExtractorConfig, FfmpegMuxer};

pub const ENV_YTDLP_PATH: &str = "YTDLP_PATH";
pub const ENV_FFMPEG_PATH: &str = "FFMPEG_PATH";
pub const ENV_PROXY: &str = "YTDL_MERGE_PROXY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where temporary and merged files are written
    pub output_dir: PathBuf,
    /// yt-dlp binary; searched for when unset
    pub ytdlp_path: Option<String>,
    /// ffmpeg binary; searched for when unset
    pub ffmpeg_path: Option<String>,
    /// Proxy URL passed to yt-dlp (e.g. "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,
    /// Path to a Netscape cookie file (yt-dlp compatible).
    pub cookies: Option<PathBuf>,
    /// Use yt-dlp `--cookies-from-browser` (e.g. "chrome", "firefox").
    pub cookies_from_browser: Option<String>,
    pub socket_timeout_secs: u32,
    pub info_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            ytdlp_path: None,
            ffmpeg_path: None,
            proxy: None,
            cookies: None,
            cookies_from_browser: None,
            socket_timeout_secs: 30,
            info_timeout_secs: 120,
        }
    }
}

impl Config {
    /// Apply `YTDLP_PATH`, `FFMPEG_PATH` and `YTDL_MERGE_PROXY`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty(ENV_YTDLP_PATH) {
            self.ytdlp_path = Some(v);
        }
        if let Some(v) = non_empty(ENV_FFMPEG_PATH) {
            self.ffmpeg_path = Some(v);
        }
        if let Some(v) = non_empty(ENV_PROXY) {
            self.proxy = Some(v);
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig::default()
            .with_ytdlp_path(find_tool(ToolType::YtDlp, self.ytdlp_path.as_deref()))
            .with_proxy(self.proxy.clone())
            .with_cookies_path(self.cookies.clone())
            .with_cookies_from_browser(self.cookies_from_browser.clone())
            .with_socket_timeout(self.socket_timeout_secs)
            .with_info_timeout(self.info_timeout_secs)
    }

    pub fn muxer(&self) -> FfmpegMuxer {
        FfmpegMuxer::new(find_tool(ToolType::Ffmpeg, self.ffmpeg_path.as_deref()))
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::config_dir().context("config directory unavailable")?;
    Ok(dir.join("ytdl-merge").join("config.toml"))
}

/// Load the config file. A missing default file means defaults; a missing
/// explicit file is an error.
pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match override_path {
        Some(p) => p.to_path_buf(),
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                return Ok(Config::default());
            }
            path
        }
    };

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg = toml::from_str::<Config>(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
