//! WebVTT cues.
//!
//! YouTube's automatic captions roll: each cue repeats the previous cue's
//! last line above the new words, and short "hold" cues repeat the text
//! unchanged. Repeated lines are dropped and holds extend the earlier cue.

use super::timestamp::parse_clock;
use super::{RawCue, clean_text};

pub(crate) fn parse(body: &str) -> Vec<RawCue> {
    let mut cues: Vec<RawCue> = Vec::new();
    let mut last_line: Option<String> = None;

    for block in blocks(body) {
        let Some(timing_idx) = block.iter().position(|line| line.contains("-->")) else {
            continue;
        };
        if is_metadata_block(block[0]) {
            continue;
        }
        let Some((start_ms, end_ms)) = parse_timing(block[timing_idx]) else {
            continue;
        };

        let mut lines: Vec<String> = block[timing_idx + 1..]
            .iter()
            .map(|line| clean_text(line))
            .filter(|line| !line.is_empty())
            .collect();

        while lines.first().is_some_and(|first| Some(first) == last_line.as_ref()) {
            lines.remove(0);
        }

        let text = lines.join(" ");
        if let Some(previous) = cues.last_mut() {
            if text.is_empty() || text == previous.text {
                previous.end_ms = previous.end_ms.max(end_ms);
                continue;
            }
        }
        if text.is_empty() {
            continue;
        }

        last_line = lines.last().cloned();
        cues.push(RawCue { start_ms, end_ms, text });
    }

    cues
}

/// Splits the payload into blank-line separated blocks of trimmed lines.
fn blocks(body: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn is_metadata_block(first_line: &str) -> bool {
    ["WEBVTT", "NOTE", "STYLE", "REGION"]
        .iter()
        .any(|keyword| first_line.starts_with(keyword))
}

/// Reads `start --> end [cue settings]`.
fn parse_timing(line: &str) -> Option<(u64, u64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    Some((parse_clock(start)?, parse_clock(end)?))
}
