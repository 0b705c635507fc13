// Settings passed to every yt-dlp invocation

use std::path::PathBuf;

/// Configuration for info extraction and stream downloads
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// yt-dlp program to run
    pub ytdlp_path: String,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to a Netscape cookies.txt file
    pub cookies_path: Option<PathBuf>,
    /// Browser to read cookies from (e.g. "chrome", "firefox")
    pub cookies_from_browser: Option<String>,
    /// yt-dlp `--socket-timeout`
    pub socket_timeout_secs: u32,
    /// Wall-clock limit for metadata requests
    pub info_timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            proxy: None,
            cookies_path: None,
            cookies_from_browser: None,
            socket_timeout_secs: 30,
            info_timeout_secs: 120,
        }
    }
}

impl ExtractorConfig {
    pub fn with_ytdlp_path(mut self, path: impl Into<String>) -> Self {
        self.ytdlp_path = path.into();
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<PathBuf>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_cookies_from_browser(mut self, browser: Option<String>) -> Self {
        self.cookies_from_browser = browser;
        self
    }

    pub fn with_socket_timeout(mut self, seconds: u32) -> Self {
        self.socket_timeout_secs = seconds;
        self
    }

    pub fn with_info_timeout(mut self, seconds: u64) -> Self {
        self.info_timeout_secs = seconds;
        self
    }

    /// Network and auth arguments shared by all invocations
    pub fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout_secs.to_string(),
        ];

        // A cookie file takes precedence over browser cookies
        if let Some(path) = &self.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.to_string_lossy().to_string());
        } else if let Some(browser) = &self.cookies_from_browser {
            args.push("--cookies-from-browser".to_string());
            args.push(browser.clone());
        }

        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args
    }
}
