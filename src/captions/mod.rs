pub mod json3;
pub mod srv3;
pub mod timestamp;
pub mod ttml;
pub mod vtt;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use self::timestamp::format_mmss;

static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\b[^>]*>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("invalid JSON captions: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unrecognised caption payload")]
    UnknownFormat,
    #[error("no caption text found in {0} payload")]
    Empty(CaptionFormat),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFormat {
    Json3,
    Srv3,
    Vtt,
    Ttml,
}

impl CaptionFormat {
    /// Maps an extractor track extension onto a parser.
    pub fn from_ext(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json3" => Some(Self::Json3),
            "srv1" | "srv2" | "srv3" => Some(Self::Srv3),
            "vtt" | "webvtt" => Some(Self::Vtt),
            "ttml" | "xml" | "dfxp" => Some(Self::Ttml),
            _ => None,
        }
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type.split(';').next().unwrap_or("").trim();
        match mime {
            "application/json" => Some(Self::Json3),
            "text/vtt" => Some(Self::Vtt),
            "application/ttml+xml" => Some(Self::Ttml),
            _ => None,
        }
    }

    /// Guesses the format from the first bytes of a payload.
    pub fn sniff(body: &str) -> Option<Self> {
        let head = body.trim_start_matches('\u{FEFF}').trim_start();
        if head.starts_with('{') {
            Some(Self::Json3)
        } else if head.starts_with("WEBVTT") {
            Some(Self::Vtt)
        } else if head.starts_with('<') {
            if head.contains("<timedtext") || head.contains("<transcript") {
                Some(Self::Srv3)
            } else {
                Some(Self::Ttml)
            }
        } else {
            None
        }
    }
}

impl fmt::Display for CaptionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json3 => "json3",
            Self::Srv3 => "srv3",
            Self::Vtt => "vtt",
            Self::Ttml => "ttml",
        };
        f.write_str(name)
    }
}

/// One timed caption line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CaptionSegment {
    pub start: String,
    pub end: String,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

impl CaptionSegment {
    pub fn new(start_ms: u64, end_ms: u64, text: String) -> Self {
        let end_ms = end_ms.max(start_ms);
        Self {
            start: format_mmss(start_ms),
            end: format_mmss(end_ms),
            start_ms,
            end_ms,
            text,
        }
    }
}

/// A cue as read from a payload, before cleanup and ordering.
#[derive(Debug)]
pub(crate) struct RawCue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

pub fn parse_captions(body: &str, format: CaptionFormat) -> Result<Vec<CaptionSegment>, CaptionError> {
    let body = body.trim_start_matches('\u{FEFF}');
    let cues = match format {
        CaptionFormat::Json3 => json3::parse(body)?,
        CaptionFormat::Srv3 => srv3::parse(body)?,
        CaptionFormat::Vtt => vtt::parse(body),
        CaptionFormat::Ttml => ttml::parse(body),
    };

    let segments = finalize(cues);
    if segments.is_empty() {
        return Err(CaptionError::Empty(format));
    }
    Ok(segments)
}

pub fn plain_text(segments: &[CaptionSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn finalize(cues: Vec<RawCue>) -> Vec<CaptionSegment> {
    let mut segments: Vec<CaptionSegment> = cues
        .into_iter()
        .filter_map(|cue| {
            let text = clean_text(&cue.text);
            if text.is_empty() {
                None
            } else {
                Some(CaptionSegment::new(cue.start_ms, cue.end_ms, text))
            }
        })
        .collect();
    // sort_by_key is stable, equal starts keep payload order
    segments.sort_by_key(|s| s.start_ms);
    segments
}

/// Strips markup, decodes entities and collapses whitespace. Only line
/// breaks become spaces; other tags may sit inside a word.
pub(crate) fn clean_text(raw: &str) -> String {
    let with_breaks = BREAK_RE.replace_all(raw, " ");
    let without_tags = TAG_RE.replace_all(&with_breaks, "");
    let decoded = html_escape::decode_html_entities(&without_tags);
    let decoded = decoded.replace('\u{a0}', " ");
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(segments: &[CaptionSegment]) {
        for pair in segments.windows(2) {
            assert!(pair[0].start_ms <= pair[1].start_ms);
        }
        for s in segments {
            assert!(s.end_ms >= s.start_ms);
            assert!(!s.text.is_empty());
        }
    }

    #[test]
    fn every_format_yields_ordered_segments() {
        let payloads = [
            (
                CaptionFormat::Json3,
                r#"{"events":[{"tStartMs":0,"dDurationMs":1000,"segs":[{"utf8":"one"}]},
                   {"tStartMs":1000,"dDurationMs":900,"segs":[{"utf8":"two"}]}]}"#,
            ),
            (
                CaptionFormat::Srv3,
                r#"<timedtext format="3"><body><p t="0" d="1000">one</p><p t="1000" d="900">two</p></body></timedtext>"#,
            ),
            (
                CaptionFormat::Vtt,
                "WEBVTT\n\n00:00.000 --> 00:01.000\none\n\n00:01.000 --> 00:01.900\ntwo\n",
            ),
            (
                CaptionFormat::Ttml,
                r#"<tt><body><div><p begin="0s" end="1s">one</p><p begin="1s" end="1.9s">two</p></div></body></tt>"#,
            ),
        ];

        for (format, body) in payloads {
            let segments = parse_captions(body, format).unwrap();
            assert_eq!(segments.len(), 2, "{format}");
            assert_eq!(segments[0].text, "one");
            assert_eq!(segments[1].text, "two");
            assert_eq!(segments[1].end_ms, 1_900);
            assert_well_formed(&segments);
        }
    }

    #[test]
    fn segment_clamps_end_before_start() {
        let segment = CaptionSegment::new(5_000, 4_000, "late".to_string());
        assert_eq!(segment.end_ms, 5_000);
        assert_eq!(segment.start, "00:05");
        assert_eq!(segment.end, "00:05");
    }

    #[test]
    fn finalize_keeps_payload_order_for_equal_starts() {
        let cues = vec![
            RawCue { start_ms: 2_000, end_ms: 3_000, text: "c".into() },
            RawCue { start_ms: 1_000, end_ms: 2_000, text: "a".into() },
            RawCue { start_ms: 1_000, end_ms: 1_500, text: "b".into() },
            RawCue { start_ms: 1_200, end_ms: 1_300, text: "  ".into() },
        ];
        let texts: Vec<_> = finalize(cues).into_iter().map(|s| s.text).collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[test]
    fn cleans_markup_and_entities() {
        assert_eq!(clean_text("<i>it&#39;s</i>\n  fine&nbsp;now"), "it's fine now");
    }

    #[test]
    fn markup_inside_words_leaves_no_gaps() {
        assert_eq!(clean_text("<i>Really</i>? I <b>can</b>'t"), "Really? I can't");
        assert_eq!(clean_text("one<br/>two<BR>three"), "one two three");
    }

    #[test]
    fn sniffs_formats() {
        assert_eq!(CaptionFormat::sniff("\u{FEFF}WEBVTT\n"), Some(CaptionFormat::Vtt));
        assert_eq!(CaptionFormat::sniff(" {\"events\":[]}"), Some(CaptionFormat::Json3));
        assert_eq!(
            CaptionFormat::sniff("<?xml version=\"1.0\"?><timedtext>"),
            Some(CaptionFormat::Srv3)
        );
        assert_eq!(CaptionFormat::sniff("<tt xmlns=\"\">"), Some(CaptionFormat::Ttml));
        assert_eq!(CaptionFormat::sniff("hello"), None);
    }

    #[test]
    fn resolves_extensions() {
        assert_eq!(CaptionFormat::from_ext("JSON3"), Some(CaptionFormat::Json3));
        assert_eq!(CaptionFormat::from_ext("srv1"), Some(CaptionFormat::Srv3));
        assert_eq!(CaptionFormat::from_ext("ttml"), Some(CaptionFormat::Ttml));
        assert_eq!(CaptionFormat::from_ext("mp4"), None);
        assert_eq!(
            CaptionFormat::from_content_type("text/vtt; charset=utf-8"),
            Some(CaptionFormat::Vtt)
        );
    }

    #[test]
    fn empty_payload_is_an_error() {
        let err = parse_captions("WEBVTT\n\n", CaptionFormat::Vtt).unwrap_err();
        assert!(matches!(err, CaptionError::Empty(CaptionFormat::Vtt)));
    }

    #[test]
    fn plain_text_joins_segments() {
        let segments = vec![
            CaptionSegment::new(0, 1, "hello".into()),
            CaptionSegment::new(1, 2, "world".into()),
        ];
        assert_eq!(plain_text(&segments), "hello world");
    }
}
