use thiserror::Error;

use crate::captions::CaptionError;

/// Failures while turning a video id into caption segments.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(
        "YouTube rejected the request as unauthenticated ({0}). The cookie file is missing, expired or invalid: export fresh cookies from a logged-in browser session and replace the cookie file"
    )]
    AuthFailed(String),
    #[error("no {lang} captions available for '{title}'")]
    NoCaptions {
        lang: String,
        title: String,
        available: Vec<String>,
    },
    #[error("video unavailable: {0}")]
    VideoUnavailable(String),
    #[error("extractor binary '{0}' not found, install yt-dlp or set YTDLP_BIN")]
    ExtractorMissing(String),
    #[error("extractor timed out after {0}s")]
    Timeout(u64),
    #[error("extractor failed: {0}")]
    Extractor(String),
    #[error("failed to download captions: {0}")]
    CaptionDownload(String),
    #[error(transparent)]
    Caption(#[from] CaptionError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Short machine-readable kind for error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthFailed(_) => "auth_failed",
            Self::NoCaptions { .. } => "no_captions",
            Self::VideoUnavailable(_) => "video_unavailable",
            Self::ExtractorMissing(_) => "extractor_missing",
            Self::Timeout(_) => "timeout",
            Self::Extractor(_) => "extractor_failed",
            Self::CaptionDownload(_) => "caption_download_failed",
            Self::Caption(_) => "caption_parse_failed",
            Self::Io(_) => "io_error",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::CaptionDownload("request timed out".to_string())
        } else {
            Self::CaptionDownload(err.to_string())
        }
    }
}
