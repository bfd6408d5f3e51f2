use std::sync::LazyLock;

use regex::Regex;

use super::RawCue;
use super::srv3::attribute;
use super::timestamp::parse_ttml_time;

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p\b((?:[^>/]|/[^>])*)>(.*?)</p>").unwrap());

pub(crate) fn parse(body: &str) -> Vec<RawCue> {
    PARAGRAPH_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let attrs = &caps[1];
            let start_ms = match attribute(attrs, "begin") {
                Some(begin) => parse_ttml_time(begin)?,
                None => 0,
            };
            let end_ms = match (attribute(attrs, "end"), attribute(attrs, "dur")) {
                (Some(end), _) => parse_ttml_time(end)?,
                (None, Some(dur)) => start_ms.saturating_add(parse_ttml_time(dur)?),
                (None, None) => start_ms,
            };
            Some(RawCue {
                start_ms,
                end_ms,
                text: caps[2].to_string(),
            })
        })
        .collect()
}
