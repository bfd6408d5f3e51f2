use serde::Deserialize;

use super::{CaptionError, RawCue};

#[derive(Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: Option<u64>,
    #[serde(default)]
    d_duration_ms: Option<u64>,
    #[serde(default)]
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

pub(crate) fn parse(body: &str) -> Result<Vec<RawCue>, CaptionError> {
    let document: Json3Document = serde_json::from_str(body)?;

    let cues = document
        .events
        .into_iter()
        .filter_map(|event| {
            // window and style events carry no segs
            let segs = event.segs?;
            let start_ms = event.t_start_ms.unwrap_or(0);
            let end_ms = start_ms.saturating_add(event.d_duration_ms.unwrap_or(0));
            let text: String = segs.iter().map(|s| s.utf8.replace('\n', " ")).collect();
            Some(RawCue { start_ms, end_ms, text })
        })
        .collect();

    Ok(cues)
}
