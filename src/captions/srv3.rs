//! YouTube timedtext XML.
//!
//! Format 3 uses `<p t="ms" d="ms">` paragraphs with optional `<s>` word
//! spans. The older format 1 uses `<text start="s" dur="s">`. Both are read
//! here, and a JSON body is handed to the json3 reader.

use std::sync::LazyLock;

use regex::Regex;

use super::{CaptionError, RawCue, json3};

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p\b([^>/]*)>(.*?)</p>").unwrap());
static TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b([^>/]*)>(.*?)</text>").unwrap());

pub(crate) fn parse(body: &str) -> Result<Vec<RawCue>, CaptionError> {
    if body.trim_start().starts_with('{') {
        return json3::parse(body);
    }

    let mut cues: Vec<RawCue> = PARAGRAPH_RE
        .captures_iter(body)
        .map(|caps| {
            let attrs = &caps[1];
            let start_ms = attribute(attrs, "t").and_then(|v| v.parse().ok()).unwrap_or(0);
            let duration_ms: u64 = attribute(attrs, "d").and_then(|v| v.parse().ok()).unwrap_or(0);
            RawCue {
                start_ms,
                end_ms: start_ms.saturating_add(duration_ms),
                text: caps[2].to_string(),
            }
        })
        .collect();

    if cues.is_empty() {
        cues = TEXT_RE
            .captures_iter(body)
            .map(|caps| {
                let attrs = &caps[1];
                let start_ms = attribute(attrs, "start").and_then(seconds_to_ms).unwrap_or(0);
                let duration_ms = attribute(attrs, "dur").and_then(seconds_to_ms).unwrap_or(0);
                RawCue {
                    start_ms,
                    end_ms: start_ms.saturating_add(duration_ms),
                    text: caps[2].to_string(),
                }
            })
            .collect();
    }

    Ok(cues)
}

/// Reads `name="value"` out of a tag's attribute string.
pub(crate) fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = attrs;
    while let Some(pos) = rest.find(name) {
        let preceded_ok = rest[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace());
        let after = &rest[pos + name.len()..];
        if preceded_ok {
            if let Some(value) = after.trim_start().strip_prefix('=') {
                let value = value.trim_start();
                let quote = value.chars().next()?;
                if quote == '"' || quote == '\'' {
                    let inner = &value[1..];
                    let end = inner.find(quote)?;
                    return Some(&inner[..end]);
                }
            }
        }
        rest = after;
    }
    None
}

fn seconds_to_ms(value: &str) -> Option<u64> {
    let seconds: f64 = value.parse().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some((seconds * 1000.0).round() as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::clean_text;

    #[test]
    fn reads_format_three_paragraphs() {
        let body = r#"<?xml version="1.0" encoding="utf-8" ?><timedtext format="3">
<body>
<p t="1360" d="1680" w="1"><s ac="0">We&#39;re</s><s t="240" ac="0"> no</s></p>
<p t="3040" d="2000">strangers</p>
</body>
</timedtext>"#;

        let cues = parse(body).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_ms, 1360);
        assert_eq!(cues[0].end_ms, 3040);
        assert!(cues[0].text.contains("We&#39;re"));
        assert_eq!(cues[1].text, "strangers");
    }

    #[test]
    fn word_spans_join_without_extra_spaces() {
        let body = r#"<timedtext format="3"><body><p t="0" d="900"><s>Wait</s><s>,</s><s> real</s><s>ly</s>?</p></body></timedtext>"#;
        let cues = parse(body).unwrap();
        assert_eq!(clean_text(&cues[0].text), "Wait, really?");
    }

    #[test]
    fn reads_format_one_text_nodes() {
        let body = r#"<transcript><text start="0.5" dur="1.25">hi there</text></transcript>"#;
        let cues = parse(body).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_ms, 500);
        assert_eq!(cues[0].end_ms, 1750);
    }

    #[test]
    fn json_body_is_read_as_json3() {
        let body = r#"{"events":[{"tStartMs":10,"dDurationMs":5,"segs":[{"utf8":"x"}]}]}"#;
        let cues = parse(body).unwrap();
        assert_eq!(cues[0].end_ms, 15);
    }

    #[test]
    fn attribute_lookup_matches_whole_names() {
        let attrs = r#" dt="9" t="100" d='20'"#;
        assert_eq!(attribute(attrs, "t"), Some("100"));
        assert_eq!(attribute(attrs, "d"), Some("20"));
        assert_eq!(attribute(attrs, "begin"), None);
    }
}
