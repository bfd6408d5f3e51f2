use serde::{Deserialize, Serialize};

use crate::captions::{CaptionFormat, CaptionSegment};
use crate::ytdlp::CaptionKind;

#[derive(Debug, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptDto {
    pub video_url: String,
    pub video_name: String,
    pub transcript: String,
    pub success: bool,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoInfoDto {
    pub video_id: String,
    pub video_url: String,
    pub title: String,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub caption_type: CaptionKind,
    pub caption_format: CaptionFormat,
    pub language: String,
    pub available_languages: Vec<String>,
    pub captions: Vec<CaptionSegment>,
    pub success: bool,
    pub message: String,
}
