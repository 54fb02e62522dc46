use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::progress::{parse_bitrate_to_kbps, parse_ffmpeg_time, parse_size_to_bytes};

/// Totals ffmpeg prints on the last status line of a finished encode.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSummary {
    pub final_size_bytes: u64,
    pub duration: Duration,
    pub avg_bitrate_kbps: f32,
}

static FINAL_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Lsize=\s*([0-9]*\.?[0-9]+)\s*([A-Za-z]+)").unwrap());
static ENCODED_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"time=\s*([0-9:\.]+)").unwrap());
static AVERAGE_BITRATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"bitrate=\s*([0-9]*\.?[0-9]+)\s*([A-Za-z/]+)").unwrap());

/// `(value, unit)` from the first match of a `key=<number><unit>` pattern.
fn measurement<'a>(pattern: &Regex, line: &'a str) -> Option<(f32, &'a str)> {
    let caps = pattern.captures(line)?;
    let value = caps.get(1)?.as_str().parse::<f32>().ok()?;
    Some((value, caps.get(2)?.as_str()))
}

/// Only lines carrying a numeric `Lsize=` are summaries; in-flight status lines
/// report `size=` instead.
pub fn parse_summary_line(line: &str) -> Option<EncodeSummary> {
    let final_size_bytes = measurement(&FINAL_SIZE, line)
        .and_then(|(value, unit)| parse_size_to_bytes(value, unit))?;
    let duration = ENCODED_TIME
        .captures(line)
        .and_then(|caps| parse_ffmpeg_time(caps.get(1)?.as_str()))
        .unwrap_or_default();
    let avg_bitrate_kbps = measurement(&AVERAGE_BITRATE, line)
        .and_then(|(value, unit)| parse_bitrate_to_kbps(value, unit))
        .unwrap_or(0.0);

    Some(EncodeSummary {
        final_size_bytes,
        duration,
        avg_bitrate_kbps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_final_status_line() {
        let line = concat!(
            "frame=  251 fps=120 q=-1.0 Lsize=     512kB ",
            "time=00:00:10.00 bitrate= 419.4kbits/s speed=4.8x"
        );
        let summary = parse_summary_line(line).unwrap();
        assert_eq!(summary.final_size_bytes, 512 * 1024);
        assert_eq!(summary.duration, Duration::from_secs(10));
        assert!((summary.avg_bitrate_kbps - 419.4).abs() < 0.01);
    }

    #[test]
    fn in_flight_status_is_not_a_summary() {
        let line = concat!(
            "frame=  100 fps= 50 q=28.0 size=     256kB ",
            "time=00:00:04.00 bitrate= 524.3kbits/s speed=2x"
        );
        assert!(parse_summary_line(line).is_none());
        assert!(parse_summary_line("Lsize=N/A time=00:00:04.00").is_none());
    }
}
