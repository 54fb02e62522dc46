//! Assembles and runs ffmpeg invocations that composite a background (still image or
//! video), an optional narration track and optional burned-in subtitles into one video.

pub mod core;
