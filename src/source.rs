use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::header::CONTENT_TYPE;

use crate::captions::{CaptionError, CaptionFormat, CaptionSegment, parse_captions};
use crate::error::FetchError;
use crate::ytdlp::{CaptionKind, VideoMetadata, YtDlp};

/// A video with its parsed caption track.
#[derive(Clone, Debug)]
pub struct VideoCaptions {
    pub metadata: VideoMetadata,
    pub language: String,
    pub caption_kind: CaptionKind,
    pub format: CaptionFormat,
    pub segments: Vec<CaptionSegment>,
}

/// Where the HTTP layer gets captions from.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// Metadata plus captions for `lang`. A video without a matching track
    /// fails with [`FetchError::NoCaptions`].
    async fn fetch(&self, video_id: &str, lang: &str) -> Result<VideoCaptions, FetchError>;

    /// Version string of the underlying extractor.
    async fn probe(&self) -> Result<String, FetchError>;
}

pub struct YtDlpSource {
    ytdlp: YtDlp,
    http: reqwest::Client,
}

impl YtDlpSource {
    pub fn new(ytdlp: YtDlp, caption_timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(caption_timeout).build()?;
        Ok(Self { ytdlp, http })
    }

    async fn download(&self, url: &str) -> Result<(String, Option<String>), FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Caption download returned {status}");
            return Err(FetchError::CaptionDownload(format!("HTTP {status}")));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        debug!("Downloaded {} bytes of captions ({:?})", body.len(), content_type);
        Ok((body, content_type))
    }
}

#[async_trait]
impl CaptionSource for YtDlpSource {
    async fn fetch(&self, video_id: &str, lang: &str) -> Result<VideoCaptions, FetchError> {
        let metadata = self.ytdlp.extract_info(video_id).await?;

        let selected = metadata.select_track(lang).ok_or_else(|| {
            info!("No {lang} captions for {video_id}");
            FetchError::NoCaptions {
                lang: lang.to_string(),
                title: metadata.title().to_string(),
                available: metadata.available_languages(),
            }
        })?;
        info!(
            "Using {:?} {} track '{}' ({}) for {video_id}",
            selected.kind,
            selected.language,
            selected.track.name.as_deref().unwrap_or(&selected.language),
            selected.track.ext
        );

        let (body, content_type) = self.download(&selected.track.url).await?;
        let format = resolve_format(selected.format(), content_type.as_deref(), &body)?;
        let segments = parse_captions(&body, format)?;
        info!("Parsed {} caption segments from {format} payload", segments.len());

        Ok(VideoCaptions {
            metadata,
            language: selected.language,
            caption_kind: selected.kind,
            format,
            segments,
        })
    }

    async fn probe(&self) -> Result<String, FetchError> {
        self.ytdlp.version().await
    }
}

/// Extension first, then the response content type, then the payload itself.
fn resolve_format(
    from_ext: Option<CaptionFormat>,
    content_type: Option<&str>,
    body: &str,
) -> Result<CaptionFormat, CaptionError> {
    from_ext
        .or_else(|| content_type.and_then(CaptionFormat::from_content_type))
        .or_else(|| CaptionFormat::sniff(body))
        .ok_or(CaptionError::UnknownFormat)
}
