use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, middleware::Logger, web};
use log::{debug, error, info, warn};

use crate::captions::plain_text;
use crate::config::ServerConfig;
use crate::cookies::CookieStatus;
use crate::dto::{LangQuery, TranscriptDto, VideoInfoDto};
use crate::error::FetchError;
use crate::source::{CaptionSource, YtDlpSource};
use crate::ytdlp::{YtDlp, is_valid_video_id, watch_url};

pub struct AppState {
    pub source: Arc<dyn CaptionSource>,
    pub config: ServerConfig,
}

impl AppState {
    fn lang(&self, query: &LangQuery) -> String {
        query
            .lang
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .unwrap_or(self.config.default_lang.as_str())
            .to_string()
    }
}

#[get("/")]
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "YouTube Transcript API",
        "description": "Extract video info and timestamped captions from YouTube videos",
        "endpoints": {
            "GET /transcript/{video_id}": "Video title and plain caption text",
            "GET /video-info/{video_id}": "Video metadata and timestamped caption segments",
            "GET /health": "Health check",
            "GET /auth-status": "Cookie file status",
            "GET /test-youtube": "Runs a test extraction against YouTube"
        },
        "example": "/video-info/dQw4w9WgXcQ",
        "note": "Video ID is the part after 'v=' in a YouTube URL. Add ?lang=xx to pick a caption language"
    }))
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    debug!("Health check endpoint called");
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "message": "YouTube Transcript API is running"
    }))
}

#[get("/auth-status")]
pub async fn auth_status(data: web::Data<AppState>) -> impl Responder {
    debug!("Auth status endpoint called");
    let status = CookieStatus::inspect(&data.config.cookies_file);
    if !status.is_usable() {
        warn!("Cookie file not usable: {}", status.message);
    }
    HttpResponse::Ok().json(status)
}

#[get("/test-youtube")]
pub async fn test_youtube(data: web::Data<AppState>) -> impl Responder {
    debug!("YouTube connectivity test called");
    let video_id = &data.config.probe_video_id;
    let lang = data.config.default_lang.clone();

    let extractor_version = match data.source.probe().await {
        Ok(version) => Some(version),
        Err(e) => {
            error!("Extractor probe failed: {e}");
            return HttpResponse::Ok().json(serde_json::json!({
                "success": false,
                "video_id": video_id,
                "error": e.kind(),
                "message": e.to_string(),
            }));
        }
    };

    match data.source.fetch(video_id, &lang).await {
        Ok(captions) => {
            info!("YouTube test succeeded: {} segments", captions.segments.len());
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "video_id": video_id,
                "title": captions.metadata.title(),
                "caption_count": captions.segments.len(),
                "extractor_version": extractor_version,
                "message": "YouTube access is working",
            }))
        }
        Err(e) => {
            warn!("YouTube test failed: {e}");
            HttpResponse::Ok().json(serde_json::json!({
                "success": false,
                "video_id": video_id,
                "extractor_version": extractor_version,
                "error": e.kind(),
                "message": e.to_string(),
            }))
        }
    }
}

#[get("/transcript/{video_id}")]
pub async fn transcript(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<LangQuery>,
) -> impl Responder {
    let video_id = path.into_inner();
    debug!("Transcript request for {video_id}");
    if let Some(response) = reject_invalid_id(&video_id) {
        return response;
    }

    let lang = data.lang(&query);
    match data.source.fetch(&video_id, &lang).await {
        Ok(captions) => {
            let text = plain_text(&captions.segments);
            info!("Transcript for {video_id}: {} characters", text.len());
            HttpResponse::Ok().json(TranscriptDto {
                video_url: watch_url(&video_id),
                video_name: captions.metadata.title().to_string(),
                transcript: text,
                success: true,
                message: Some(format!(
                    "Transcript extracted successfully from {} captions",
                    captions.format
                )),
            })
        }
        Err(e) => error_response(&video_id, &e),
    }
}

#[get("/video-info/{video_id}")]
pub async fn video_info(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<LangQuery>,
) -> impl Responder {
    let video_id = path.into_inner();
    debug!("Video info request for {video_id}");
    if let Some(response) = reject_invalid_id(&video_id) {
        return response;
    }

    let lang = data.lang(&query);
    match data.source.fetch(&video_id, &lang).await {
        Ok(captions) => {
            info!(
                "Video info for {video_id}: {} segments ({} {})",
                captions.segments.len(),
                captions.language,
                captions.format
            );
            let message = format!(
                "Found {} caption segments in {:?} {} captions",
                captions.segments.len(),
                captions.caption_kind,
                captions.language
            );
            let metadata = captions.metadata;
            HttpResponse::Ok().json(VideoInfoDto {
                video_url: watch_url(&metadata.id),
                title: metadata.title().to_string(),
                available_languages: metadata.available_languages(),
                video_id: metadata.id,
                duration: metadata.duration,
                uploader: metadata.uploader,
                caption_type: captions.caption_kind,
                caption_format: captions.format,
                language: captions.language,
                captions: captions.segments,
                success: true,
                message,
            })
        }
        Err(e) => error_response(&video_id, &e),
    }
}

fn reject_invalid_id(video_id: &str) -> Option<HttpResponse> {
    if is_valid_video_id(video_id) {
        return None;
    }
    warn!("Rejected invalid video id {video_id:?}");
    Some(HttpResponse::BadRequest().json(serde_json::json!({
        "detail": "Invalid video ID. Must be 11 characters of letters, digits, '-' or '_'.",
        "error": "invalid_video_id",
        "success": false,
    })))
}

pub fn status_for(err: &FetchError) -> StatusCode {
    match err {
        FetchError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
        FetchError::NoCaptions { .. } | FetchError::VideoUnavailable(_) => StatusCode::NOT_FOUND,
        FetchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        FetchError::ExtractorMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
        FetchError::Extractor(_) | FetchError::CaptionDownload(_) | FetchError::Caption(_) => {
            StatusCode::BAD_GATEWAY
        }
        FetchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(video_id: &str, err: &FetchError) -> HttpResponse {
    let status = status_for(err);
    if status.is_server_error() {
        error!("Request for {video_id} failed: {err}");
    } else {
        warn!("Request for {video_id} failed: {err}");
    }

    let mut body = serde_json::json!({
        "detail": err.to_string(),
        "error": err.kind(),
        "success": false,
        "video_id": video_id,
        "video_url": watch_url(video_id),
    });
    if let FetchError::NoCaptions { title, available, .. } = err {
        body["title"] = serde_json::json!(title);
        body["available_languages"] = serde_json::json!(available);
    }
    HttpResponse::build(status).json(body)
}

/// Registers every route, shared by the server and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(root)
        .service(health_check)
        .service(auth_status)
        .service(test_youtube)
        .service(transcript)
        .service(video_info);
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    info!("Starting YouTube transcript service");
    info!(
        "Using configuration: ytdlp_bin={}, cookies_file={:?}, default_lang={}, extract_timeout={}s",
        config.ytdlp_bin,
        config.cookies_file,
        config.default_lang,
        config.extract_timeout.as_secs()
    );

    let cookie_status = CookieStatus::inspect(&config.cookies_file);
    if cookie_status.is_usable() {
        info!("{}", cookie_status.message);
    } else {
        warn!("{}", cookie_status.message);
    }

    let ytdlp = YtDlp::new(
        config.ytdlp_bin.clone(),
        Some(config.cookies_file.clone()),
        config.extract_timeout,
    );
    let source = YtDlpSource::new(ytdlp, config.caption_timeout)
        .map_err(|e| std::io::Error::other(format!("Failed to build HTTP client: {e}")))?;

    let host = config.host.clone();
    let port = config.port;
    let app_state = web::Data::new(AppState {
        source: Arc::new(source),
        config,
    });

    info!("Starting HTTP server on {host}:{port}");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
