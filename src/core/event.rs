#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Progress,
    Summary,
    Warning,
    Error,
    Info,
    Noise,
}

/// Banner, stream listing and encoder statistics lines. None of it is useful once the
/// command is known to be well formed.
const NOISE_PREFIXES: [&str; 20] = [
    "ffmpeg version",
    "built with",
    "configuration:",
    "libavutil",
    "libavcodec",
    "libavformat",
    "libavdevice",
    "libavfilter",
    "libswscale",
    "libswresample",
    "libpostproc",
    "input #",
    "output #",
    "metadata:",
    "duration:",
    "stream #",
    "stream mapping:",
    "press [q]",
    "side data:",
    "ffmpeg: lib",
];

const NOISE_CONTAINS: [&str; 17] = [
    "[libx264",
    "kb/s:",
    "qavg:",
    "video:",
    "audio:",
    "subtitle:",
    "frame i:",
    "frame p:",
    "mb i",
    "mb p",
    "coded y,",
    "i16 v,h,dc,p:",
    "i8c dc,h,v,p:",
    "compatible_brands:",
    "encoder",
    "using cpu capabilities",
    "profile high",
];

const HEADER_KEYS: [&str; 7] = [
    "major_brand",
    "minor_version",
    "creation_time",
    "handler_name",
    "vendor_id",
    "duration",
    "bitrate",
];

pub fn classify_log_line(line: &str) -> LogLevel {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LogLevel::Noise;
    }

    if trimmed.contains("Lsize=") && trimmed.contains("bitrate=") {
        return LogLevel::Summary;
    }
    if trimmed.contains("time=") && trimmed.contains("speed=") {
        return LogLevel::Progress;
    }

    let lower = trimmed.to_ascii_lowercase();

    if lower.contains("error") || lower.contains("invalid") || lower.contains("no such file") {
        return LogLevel::Error;
    }
    if lower.contains("warning") || lower.contains("deprecated") {
        return LogLevel::Warning;
    }

    if NOISE_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return LogLevel::Noise;
    }
    if NOISE_CONTAINS.iter().any(|needle| lower.contains(needle)) {
        return LogLevel::Noise;
    }
    if trimmed.starts_with('[') || lower.starts_with("frame=") || lower.starts_with("fps=") {
        return LogLevel::Noise;
    }
    if trimmed.contains(':') && HEADER_KEYS.iter().any(|key| lower.contains(key)) {
        return LogLevel::Noise;
    }

    LogLevel::Info
}
