//! Subtitle authoring: grouping word timings into on-screen segments and writing them as
//! an Advanced SubStation (`.ass`) script the `subtitles` filter can burn in.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::ComposeResult;
use crate::core::model::Dimensions;

/// Gap inserted between consecutive segments, in seconds.
const SEGMENT_GAP: f64 = 0.05;

/// One transcribed word (or punctuation mark) with its timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub text: String,
    pub start_ts: f64,
    pub end_ts: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleSegment {
    pub lines: Vec<String>,
    pub start_ts: f64,
    pub end_ts: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLimits {
    pub max_length: usize,
    pub lines: usize,
}

impl Default for SegmentLimits {
    fn default() -> Self {
        Self {
            max_length: 80,
            lines: 2,
        }
    }
}

/// ASCII punctuation in the order `string.punctuation` lists it.
const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Any run of punctuation found in [`PUNCTUATION`] counts, e.g. `"."`, `"()"` or `"-."`.
fn is_punctuation(text: &str) -> bool {
    PUNCTUATION.contains(text)
}

/// Groups words into segments of at most `limits.lines` lines, each at most
/// `limits.max_length` characters (not bytes). Punctuation sticks to the preceding word.
pub fn segment_captions(words: &[WordTiming], limits: SegmentLimits) -> Vec<SubtitleSegment> {
    let Some(first) = words.first() else {
        return Vec::new();
    };
    let line_count = limits.lines.max(1);

    let mut segments = Vec::new();
    let mut lines = vec![String::new(); line_count];
    let mut current = 0;
    let mut start_ts = first.start_ts;
    let mut end_ts = first.end_ts;

    for word in words {
        end_ts = word.end_ts;

        if is_punctuation(&word.text) {
            if current < line_count && !lines[current].is_empty() {
                lines[current].push_str(&word.text);
            }
            continue;
        }

        let line_chars = lines.get(current).map_or(0, |line| line.chars().count());
        if current < line_count && line_chars + word.text.chars().count() > limits.max_length {
            current += 1;
        }

        if current >= line_count {
            segments.push(SubtitleSegment {
                lines: std::mem::replace(&mut lines, vec![String::new(); line_count]),
                start_ts,
                end_ts,
            });
            current = 0;
            start_ts = word.start_ts + SEGMENT_GAP;
        }

        let line = &mut lines[current];
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word.text);
    }

    if lines.iter().any(|line| !line.is_empty()) {
        segments.push(SubtitleSegment {
            lines,
            start_ts,
            end_ts,
        });
    }

    for idx in 1..segments.len() {
        let next_start = segments[idx].start_ts;
        let previous = &mut segments[idx - 1];
        if previous.end_ts >= next_start {
            previous.end_ts = next_start - SEGMENT_GAP;
        }
    }

    segments
}

/// Appearance of the burned-in captions. Colours are ASS `&HAABBGGRR` literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    /// Vertical anchor as a fraction of the frame height.
    pub position_from_top: f64,
    pub font_size: u32,
    pub font_color: String,
    pub shadow_color: String,
    pub shadow_blur: u32,
    pub stroke_color: String,
    pub stroke_size: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            position_from_top: 0.4,
            font_size: 24,
            font_color: "&H00FFFFFF".to_string(),
            shadow_color: "&H80000000".to_string(),
            shadow_blur: 0,
            stroke_color: "&H00000000".to_string(),
            stroke_size: 0,
        }
    }
}

/// `H:MM:SS.cc`, truncating to centiseconds.
pub fn format_ass_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let centis = ((seconds % 1.0) * 100.0).floor() as u64;
    format!("{hours}:{minutes:02}:{secs:02}.{centis:02}")
}

pub fn render_ass(
    segments: &[SubtitleSegment],
    dimensions: Dimensions,
    style: &CaptionStyle,
) -> String {
    let Dimensions { width, height } = dimensions;
    let mut out = String::new();

    out.push_str("[Script Info]\nScriptType: v4.00+\n");
    let _ = writeln!(out, "PlayResX: {width}");
    let _ = writeln!(out, "PlayResY: {height}");
    out.push_str("\n[V4+ Styles]\n");
    out.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    let _ = writeln!(
        out,
        "Style: Default,Arial,{},{},&H000000FF,{},&H00000000,\
         -1,0,0,0,100,100,0,0,1,{},0,8,20,20,20,1",
        style.font_size, style.font_color, style.stroke_color, style.stroke_size
    );
    out.push_str("\n[Events]\n");
    out.push_str(
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
    );

    let pos_x = width / 2;
    let pos_y = (height as f64 * style.position_from_top).floor() as u64;

    for segment in segments {
        let start = format_ass_time(segment.start_ts);
        let end = format_ass_time(segment.end_ts);
        let mut text = String::new();
        for (idx, line) in segment.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            if idx > 0 {
                text.push_str("\\N");
            }
            text.push_str(line);
        }

        if style.shadow_blur > 0 {
            let opaque = style.shadow_color.replace("&H80", "&H00");
            let _ = writeln!(
                out,
                "Dialogue: 0,{start},{end},Default,,0,0,0,,{{\\pos({pos_x},{pos_y})\
                 \\1c{opaque}\\3c&H00000000\\4c&H00000000\\blur{}}}{text}",
                style.shadow_blur
            );
        }
        let _ = writeln!(
            out,
            "Dialogue: 0,{start},{end},Default,,0,0,0,,{{\\pos({pos_x},{pos_y})}}{text}"
        );
    }

    out
}

pub fn write_ass(
    path: &Path,
    segments: &[SubtitleSegment],
    dimensions: Dimensions,
    style: &CaptionStyle,
) -> ComposeResult<()> {
    fs::write(path, render_ass(segments, dimensions, style))?;
    tracing::debug!(path = %path.display(), segments = segments.len(), "subtitle (ass) written");
    Ok(())
}
