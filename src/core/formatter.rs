use std::time::Duration;

use crate::core::summary::EncodeSummary;

/// Renders a float the way encoder option values are written: integral values keep a
/// trailing `.0` (`10.0`), others use the shortest round-trip form (`10.25`, `0.001`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// `size=3.00 MB avg_bitrate=419.4 kbps duration=00:00:10`
pub fn format_summary_line(summary: &EncodeSummary) -> String {
    let bitrate = match summary.avg_bitrate_kbps {
        kbps if kbps > 0.0 => format!("{kbps:.1} kbps"),
        _ => "unknown".to_string(),
    };
    format!(
        "size={} avg_bitrate={bitrate} duration={}",
        format_bytes(summary.final_size_bytes),
        format_duration(summary.duration)
    )
}

pub fn format_progress_line(
    label: &str,
    elapsed: Duration,
    raw_time: &str,
    total: Duration,
) -> String {
    let total_secs = total.as_secs_f64();
    let percent = if total_secs > 0.0 {
        (elapsed.as_secs_f64() / total_secs * 100.0).min(100.0)
    } else {
        0.0
    };
    format!(
        "{label}: {percent:.2}% complete (Time: {raw_time} / Total: {})",
        format_duration(total)
    )
}

/// `HH:MM:SS`, dropping fractional seconds.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = None;
    for name in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = Some(name);
    }
    match unit {
        Some(name) => format!("{value:.2} {name}"),
        None => format!("{bytes} B"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_keep_a_decimal() {
        assert_eq!(format_number(10.0), "10.0");
        assert_eq!(format_number(10.25), "10.25");
        assert_eq!(format_number(0.001), "0.001");
        assert_eq!(format_number(0.5), "0.5");
    }

    #[test]
    fn progress_is_capped_at_one_hundred() {
        let line = format_progress_line(
            "build video",
            Duration::from_secs(12),
            "00:00:12.00",
            Duration::from_secs(10),
        );
        assert_eq!(
            line,
            "build video: 100.00% complete (Time: 00:00:12.00 / Total: 00:00:10)"
        );
    }

    #[test]
    fn progress_reports_two_decimals() {
        let line = format_progress_line(
            "merge videos",
            Duration::from_millis(2500),
            "00:00:02.50",
            Duration::from_secs(10),
        );
        assert!(line.starts_with("merge videos: 25.00% complete"));
    }

    #[test]
    fn durations_and_sizes_are_human_readable() {
        assert_eq!(format_duration(Duration::from_secs(3725)), "01:02:05");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }
}
