// Failure diagnostics - classifies yt-dlp error output
//
// Only used to explain a failure to the user. Nothing here triggers a retry.

use serde::{Deserialize, Serialize};

/// Known reasons a platform refuses to hand out a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockingReason {
    /// HTTP 403 Forbidden
    Http403Forbidden,
    /// Login required to confirm age
    AgeRestricted,
    GeoBlocked,
    /// Connection timed out or was refused
    NetworkTimeout,
    /// HTTP 429 or similar throttling
    RateLimited,
    /// Bot/captcha check triggered
    BotDetection,
    PrivateVideo,
    /// Deleted, removed or otherwise gone
    VideoUnavailable,
    /// DRM-protected content, cannot be downloaded at all
    DrmProtected,
    /// Requires channel membership
    MembersOnly,
    /// The URL is not something the extractor understands
    UnsupportedUrl,
    Unknown,
}

impl BlockingReason {
    /// Short description for the error line
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::AgeRestricted => "Age-restricted video",
            Self::GeoBlocked => "Not available in your country",
            Self::NetworkTimeout => "Network timeout",
            Self::RateLimited => "Rate limited",
            Self::BotDetection => "Bot detection triggered",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::DrmProtected => "DRM-protected content",
            Self::MembersOnly => "Members-only content",
            Self::UnsupportedUrl => "Unsupported URL",
            Self::Unknown => "Unknown error",
        }
    }

    /// What the user can do about it, if anything
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Http403Forbidden | Self::BotDetection => {
                Some("Update yt-dlp, or pass cookies from a logged-in browser (cookies_from_browser)")
            }
            Self::AgeRestricted | Self::MembersOnly | Self::PrivateVideo => {
                Some("Use cookies from an account that can watch this video")
            }
            Self::GeoBlocked => Some("Use a proxy in a region where the video is available"),
            Self::NetworkTimeout => Some("Check your connection or configure a proxy"),
            Self::RateLimited => Some("Wait a while before trying again"),
            Self::DrmProtected => Some("DRM-protected videos cannot be downloaded"),
            Self::UnsupportedUrl => Some("Check the URL"),
            Self::VideoUnavailable | Self::Unknown => None,
        }
    }

    /// No setting change will make the download possible
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::DrmProtected | Self::VideoUnavailable | Self::UnsupportedUrl
        )
    }
}

/// Classify yt-dlp stderr; `None` for empty output
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    // Most specific patterns first

    if lower.contains("drm") || lower.contains("widevine") || lower.contains("requires purchase") {
        return Some(BlockingReason::DrmProtected);
    }

    if lower.contains("members only")
        || lower.contains("members-only")
        || lower.contains("join this channel")
    {
        return Some(BlockingReason::MembersOnly);
    }

    if lower.contains("unsupported url") || lower.contains("is not a valid url") {
        return Some(BlockingReason::UnsupportedUrl);
    }

    if lower.contains("age-restricted") || lower.contains("sign in to confirm your age") {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("private video") || lower.contains("video is private") {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("no longer available")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("not available in your country") || lower.contains("geo restrict") {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("429") || lower.contains("too many requests") || lower.contains("rate limit") {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("not a bot") || lower.contains("captcha") || lower.contains("unusual traffic") {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection refused")
        || lower.contains("network is unreachable")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    if !error.trim().is_empty() {
        return Some(BlockingReason::Unknown);
    }

    None
}
