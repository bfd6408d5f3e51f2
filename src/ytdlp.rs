use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::captions::CaptionFormat;
use crate::error::FetchError;

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const PREFERRED_EXTS: &[&str] = &["json3", "srv3", "vtt", "ttml"];
const MAX_STDERR_SUMMARY: usize = 300;

pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL}{video_id}")
}

/// YouTube ids are 11 characters of `[A-Za-z0-9_-]`.
pub fn is_valid_video_id(video_id: &str) -> bool {
    video_id.len() == 11
        && video_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CaptionTrack {
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// The subset of `yt-dlp --dump-single-json` this service reads.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub subtitles: BTreeMap<String, Vec<CaptionTrack>>,
    #[serde(default)]
    pub automatic_captions: BTreeMap<String, Vec<CaptionTrack>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionKind {
    Manual,
    Automatic,
}

#[derive(Clone, Debug)]
pub struct SelectedTrack {
    pub language: String,
    pub kind: CaptionKind,
    pub track: CaptionTrack,
}

impl SelectedTrack {
    pub fn format(&self) -> Option<CaptionFormat> {
        CaptionFormat::from_ext(&self.track.ext)
    }
}

impl VideoMetadata {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown Title")
    }

    /// Picks a caption track for `lang`: uploaded subtitles before automatic
    /// captions, and within a language json3, srv3, vtt, ttml in that order.
    pub fn select_track(&self, lang: &str) -> Option<SelectedTrack> {
        [
            (&self.subtitles, CaptionKind::Manual),
            (&self.automatic_captions, CaptionKind::Automatic),
        ]
        .into_iter()
        .find_map(|(tracks, kind)| {
            let (language, candidates) = find_language(tracks, lang)?;
            let track = pick_track(candidates)?;
            Some(SelectedTrack {
                language: language.clone(),
                kind,
                track: track.clone(),
            })
        })
    }

    pub fn available_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self
            .subtitles
            .keys()
            .chain(self.automatic_captions.keys())
            .filter(|lang| lang.as_str() != "live_chat")
            .cloned()
            .collect();
        languages.sort();
        languages.dedup();
        languages
    }
}

fn find_language<'a>(
    tracks: &'a BTreeMap<String, Vec<CaptionTrack>>,
    lang: &str,
) -> Option<(&'a String, &'a Vec<CaptionTrack>)> {
    let usable = |candidates: &Vec<CaptionTrack>| candidates.iter().any(|t| !t.url.is_empty());
    if let Some((key, candidates)) = tracks.get_key_value(lang) {
        if usable(candidates) {
            return Some((key, candidates));
        }
    }
    let prefix = format!("{lang}-");
    tracks
        .iter()
        .find(|(key, candidates)| key.starts_with(&prefix) && usable(*candidates))
}

fn pick_track(candidates: &[CaptionTrack]) -> Option<&CaptionTrack> {
    let usable = || candidates.iter().filter(|t| !t.url.is_empty());
    PREFERRED_EXTS
        .iter()
        .find_map(|ext| usable().find(|t| t.ext.eq_ignore_ascii_case(ext)))
        .or_else(|| usable().next())
}

/// Runs the external `yt-dlp` binary.
#[derive(Clone, Debug)]
pub struct YtDlp {
    bin: String,
    cookies_file: Option<PathBuf>,
    timeout: Duration,
}

impl YtDlp {
    pub fn new(bin: impl Into<String>, cookies_file: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            cookies_file,
            timeout,
        }
    }

    pub async fn extract_info(&self, video_id: &str) -> Result<VideoMetadata, FetchError> {
        let url = watch_url(video_id);
        let mut args: Vec<String> = vec![
            "--dump-single-json".into(),
            "--skip-download".into(),
            "--no-warnings".into(),
            "--no-playlist".into(),
        ];

        // The cookie file is looked up per request so it can be replaced
        // without restarting the server.
        match self.cookies_file.as_ref() {
            Some(path) if path.exists() => {
                debug!("Using cookie file {}", path.display());
                args.push("--cookies".into());
                args.push(path.to_string_lossy().into_owned());
            }
            Some(path) => warn!("Cookie file {} not found, continuing without it", path.display()),
            None => {}
        }
        args.push(url);

        info!("Extracting metadata for {video_id}");
        let stdout = self.run(&args).await?;

        let metadata: VideoMetadata = serde_json::from_slice(&stdout)
            .map_err(|e| FetchError::Extractor(format!("unreadable extractor output: {e}")))?;
        debug!(
            "Extracted '{}': {} subtitle languages, {} automatic caption languages",
            metadata.title(),
            metadata.subtitles.len(),
            metadata.automatic_captions.len()
        );
        Ok(metadata)
    }

    pub async fn version(&self) -> Result<String, FetchError> {
        let stdout = self.run(&["--version".to_string()]).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    async fn run(&self, args: &[String]) -> Result<Vec<u8>, FetchError> {
        let child = Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => FetchError::ExtractorMissing(self.bin.clone()),
                _ => FetchError::Io(e),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!("{} timed out after {}s", self.bin, self.timeout.as_secs());
                FetchError::Timeout(self.timeout.as_secs())
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} exited with {}: {}", self.bin, output.status, stderr.trim());
            return Err(classify_stderr(&stderr));
        }

        Ok(output.stdout)
    }
}

/// Maps extractor error output onto the failures callers act on.
pub fn classify_stderr(stderr: &str) -> FetchError {
    let summary = summarize(stderr);
    let lower = stderr.to_lowercase();

    const AUTH_MARKERS: &[&str] = &[
        "sign in to confirm",
        "not a bot",
        "cookies are no longer valid",
        "use --cookies",
        "login required",
        "account cookies",
    ];
    const UNAVAILABLE_MARKERS: &[&str] = &[
        "private video",
        "video unavailable",
        "has been removed",
        "is not available",
        "does not exist",
        "incomplete youtube id",
    ];

    if AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
        FetchError::AuthFailed(summary)
    } else if UNAVAILABLE_MARKERS.iter().any(|m| lower.contains(m)) {
        FetchError::VideoUnavailable(summary)
    } else {
        FetchError::Extractor(summary)
    }
}

fn summarize(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let line = lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or(lines.last())
        .copied()
        .unwrap_or("no error output");
    let line = line.strip_prefix("ERROR:").unwrap_or(line).trim();
    line.chars().take(MAX_STDERR_SUMMARY).collect()
}
