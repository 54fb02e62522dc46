use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub time: Option<Duration>,
    pub raw_time: Option<String>,
    pub frame: Option<u64>,
    pub speed: Option<String>,
}

/// Parses the periodic `frame=... time=... speed=...` status line ffmpeg writes to stderr.
/// Lines without both `time=` and `speed=` are ignored.
pub fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    if !(line.contains("time=") && line.contains("speed=")) {
        return None;
    }

    let mut raw_time: Option<String> = None;
    let mut frame: Option<u64> = None;
    let mut speed: Option<String> = None;
    let mut pending: Option<&str> = None;

    // ffmpeg pads values, so "frame=  250" arrives as two tokens.
    for token in line.split_whitespace() {
        if let Some(key) = pending.take() {
            assign(key, token, &mut raw_time, &mut frame, &mut speed);
            continue;
        }
        if let Some((key, value)) = token.split_once('=') {
            if value.is_empty() {
                pending = Some(key);
            } else {
                assign(key, value, &mut raw_time, &mut frame, &mut speed);
            }
        }
    }

    let time = raw_time.as_deref().and_then(parse_ffmpeg_time);
    if time.is_some() || frame.is_some() || speed.is_some() {
        Some(ProgressUpdate {
            time,
            raw_time,
            frame,
            speed,
        })
    } else {
        None
    }
}

fn assign(
    key: &str,
    value: &str,
    time: &mut Option<String>,
    frame: &mut Option<u64>,
    speed: &mut Option<String>,
) {
    match key {
        "time" => *time = Some(value.to_string()),
        "frame" => *frame = value.parse::<u64>().ok(),
        "speed" => *speed = Some(value.to_string()),
        _ => {}
    }
}

/// Parses `HH:MM:SS.ss`, `MM:SS` or plain seconds.
pub fn parse_ffmpeg_time(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() || value.starts_with('-') || value == "N/A" {
        return None;
    }

    let mut seconds = 0.0f64;
    for part in value.split(':') {
        let parsed = part.parse::<f64>().ok()?;
        seconds = seconds * 60.0 + parsed;
    }

    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(seconds))
}

pub fn parse_bitrate_to_kbps(value: f32, unit: &str) -> Option<f32> {
    match unit.to_ascii_lowercase().as_str() {
        "bits/s" | "b/s" => Some(value / 1000.0),
        "kbits/s" | "kb/s" => Some(value),
        "mbits/s" | "mb/s" => Some(value * 1000.0),
        _ => None,
    }
}

pub fn parse_size_to_bytes(value: f32, unit: &str) -> Option<u64> {
    let multiplier = match unit.to_ascii_lowercase().as_str() {
        "b" => 1.0,
        "kb" | "kib" => 1024.0,
        "mb" | "mib" => 1024.0 * 1024.0,
        "gb" | "gib" => 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };
    Some((value as f64 * multiplier).round() as u64)
}
