use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotenv::dotenv;
use log::warn;

pub const DEFAULT_PROBE_VIDEO_ID: &str = "dQw4w9WgXcQ";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub ytdlp_bin: String,
    pub cookies_file: PathBuf,
    pub default_lang: String,
    pub extract_timeout: Duration,
    pub caption_timeout: Duration,
    pub probe_video_id: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            ytdlp_bin: "yt-dlp".to_string(),
            cookies_file: PathBuf::from("cookies.txt"),
            default_lang: "en".to_string(),
            extract_timeout: Duration::from_secs(60),
            caption_timeout: Duration::from_secs(30),
            probe_video_id: DEFAULT_PROBE_VIDEO_ID.to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with `.env` and process environment.
    pub fn from_env() -> Self {
        dotenv().ok();
        let defaults = Self::default();
        Self {
            host: env_or("HOST", defaults.host),
            port: env_parse("PORT", defaults.port),
            ytdlp_bin: env_or("YTDLP_BIN", defaults.ytdlp_bin),
            cookies_file: std::env::var_os("COOKIES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.cookies_file),
            default_lang: env_or("CAPTION_LANG", defaults.default_lang),
            extract_timeout: Duration::from_secs(env_parse(
                "EXTRACT_TIMEOUT_SECS",
                defaults.extract_timeout.as_secs(),
            )),
            caption_timeout: Duration::from_secs(env_parse(
                "CAPTION_TIMEOUT_SECS",
                defaults.caption_timeout.as_secs(),
            )),
            probe_video_id: env_or("PROBE_VIDEO_ID", defaults.probe_video_id),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default,
    }
}

fn env_parse<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {key}={value}, using {default}");
            default
        }),
        Err(_) => default,
    }
}

#[derive(Debug)]
pub struct ClientConfig {
    pub server_url: String,
    pub video_id: String,
    pub lang: Option<String>,
    pub plain: bool,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_url: String, video_id: String, lang: Option<String>, plain: bool) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            video_id,
            lang,
            plain,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
