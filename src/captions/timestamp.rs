/// TTML tick rate used by YouTube when a document omits `ttp:tickRate`.
const DEFAULT_TICK_RATE: u64 = 10_000_000;

/// Parses a clock value such as `01:02:03.456`, `02:03.456` or `3.456`.
///
/// A comma is accepted as the fraction separator so SRT-flavoured payloads
/// mislabelled as VTT still parse.
pub fn parse_clock(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let (clock, fraction) = match input.split_once(['.', ',']) {
        Some((clock, fraction)) => (clock, Some(fraction)),
        None => (input, None),
    };

    let mut seconds: u64 = 0;
    let mut parts = 0;
    for part in clock.split(':') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        seconds = seconds.checked_mul(60)?.checked_add(part.parse().ok()?)?;
        parts += 1;
    }
    if parts > 3 {
        return None;
    }

    let millis = match fraction {
        Some(fraction) => parse_fraction_ms(fraction)?,
        None => 0,
    };

    seconds.checked_mul(1000)?.checked_add(millis)
}

/// Parses a TTML time expression: clock time or an offset with a metric
/// (`h`, `m`, `s`, `ms`, `f` is unsupported, `t` uses the default tick rate).
pub fn parse_ttml_time(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.contains(':') {
        return parse_clock(input);
    }

    let split = input
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(input.len());
    let (value, metric) = input.split_at(split);
    if value.is_empty() {
        return None;
    }

    if metric == "t" {
        let ticks: u64 = value.parse().ok()?;
        return Some(ticks / (DEFAULT_TICK_RATE / 1000));
    }

    let value: f64 = value.parse().ok()?;
    let millis = match metric {
        "h" => value * 3_600_000.0,
        "m" => value * 60_000.0,
        "s" | "" => value * 1000.0,
        "ms" => value,
        _ => return None,
    };

    if millis.is_finite() && millis >= 0.0 {
        Some(millis.round() as u64)
    } else {
        None
    }
}

/// Renders milliseconds as `mm:ss`. Minutes keep counting past 59.
pub fn format_mmss(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

fn parse_fraction_ms(fraction: &str) -> Option<u64> {
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Only the first three digits carry millisecond precision.
    let digits: String = fraction.chars().chain("000".chars()).take(3).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_clock_variants() {
        assert_eq!(parse_clock("00:00:01.500"), Some(1_500));
        assert_eq!(parse_clock("01:02:03.004"), Some(3_723_004));
        assert_eq!(parse_clock("02:03.4"), Some(123_400));
        assert_eq!(parse_clock("00:00:05,250"), Some(5_250));
        assert_eq!(parse_clock("7"), Some(7_000));
    }

    #[test]
    fn rejects_malformed_clock() {
        assert_eq!(parse_clock(""), None);
        assert_eq!(parse_clock("aa:bb"), None);
        assert_eq!(parse_clock("1:2:3:4"), None);
        assert_eq!(parse_clock("00:01."), None);
        assert_eq!(parse_clock("-1:00"), None);
    }

    #[test]
    fn parses_ttml_offsets() {
        assert_eq!(parse_ttml_time("12.5s"), Some(12_500));
        assert_eq!(parse_ttml_time("250ms"), Some(250));
        assert_eq!(parse_ttml_time("2m"), Some(120_000));
        assert_eq!(parse_ttml_time("1h"), Some(3_600_000));
        assert_eq!(parse_ttml_time("15000000t"), Some(1_500));
        assert_eq!(parse_ttml_time("00:00:02.000"), Some(2_000));
        assert_eq!(parse_ttml_time("3f"), None);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(61_999), "01:01");
        assert_eq!(format_mmss(3_725_000), "62:05");
    }
}
