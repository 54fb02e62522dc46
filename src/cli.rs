use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use ffcompose::core::builder::VideoBuilder;
use ffcompose::core::caption::SegmentLimits;
use ffcompose::core::config::{RenderJob, ToolPaths};
use ffcompose::core::error::{ComposeError, ComposeResult};
use ffcompose::core::merge::MergeBuilder;
use ffcompose::core::model::{
    CaptionOptions, Dimensions, PanZoomConfig, PanZoomPreset, DEFAULT_ZOOM_RATE,
};

#[derive(Debug, Parser)]
#[command(
    name = "ffcompose",
    version,
    about = "Composite a background, narration and subtitles into one video with ffmpeg"
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true, env = "FFCOMPOSE_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: String,
    #[arg(long, global = true, env = "FFCOMPOSE_FFPROBE", default_value = "ffprobe")]
    pub ffprobe: String,
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn tool_paths(&self) -> ToolPaths {
        ToolPaths {
            ffmpeg: self.ffmpeg.clone(),
            ffprobe: self.ffprobe.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build one video from a background, audio and captions
    Render(RenderArgs),
    /// Print probed metadata for a media file as JSON
    Probe(ProbeArgs),
    /// Turn word timings into an .ass subtitle script
    Captions(CaptionsArgs),
    /// Concatenate finished clips, optionally under background music
    Merge(MergeArgs),
    /// List the pan/zoom presets
    Presets,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Output size, e.g. 1080x1920
    #[arg(long, value_name = "WxH", required_unless_present = "job")]
    pub size: Option<Dimensions>,
    #[arg(long, value_name = "FILE", conflicts_with = "video")]
    pub image: Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    pub video: Option<PathBuf>,
    #[arg(long, value_name = "PRESET", requires = "image")]
    pub pan_zoom: Option<PanZoomPreset>,
    #[arg(long, requires = "image")]
    pub zoom_rate: Option<f64>,
    #[arg(long, value_name = "FILE")]
    pub audio: Option<PathBuf>,
    /// Request captions, optionally burning in the given subtitle file
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    pub captions: Option<Option<PathBuf>>,
    /// ASS style override for the burned-in subtitles
    #[arg(long, requires = "captions")]
    pub force_style: Option<String>,
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Read the whole render request from a JSON file
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = ["size", "image", "video", "audio", "captions"]
    )]
    pub job: Option<PathBuf>,
    /// Print the command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Report the first audio stream instead of the first video stream
    #[arg(long)]
    pub audio: bool,
}

#[derive(Debug, Args)]
pub struct CaptionsArgs {
    /// JSON array of {text, start_ts, end_ts}
    #[arg(long, value_name = "FILE")]
    pub words: PathBuf,
    #[arg(long, value_name = "WxH")]
    pub size: Dimensions,
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    #[arg(long, default_value_t = 80)]
    pub max_length: usize,
    #[arg(long, default_value_t = 2)]
    pub lines: usize,
    /// JSON caption style; unspecified fields keep their defaults
    #[arg(long, value_name = "FILE")]
    pub style: Option<PathBuf>,
}

impl CaptionsArgs {
    pub fn limits(&self) -> SegmentLimits {
        SegmentLimits {
            max_length: self.max_length,
            lines: self.lines,
        }
    }
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    #[arg(short = 'i', long = "input", required = true)]
    pub inputs: Vec<PathBuf>,
    #[arg(short = 'o', long = "output", default_value = "merged.mp4")]
    pub output: PathBuf,
    #[arg(long, value_name = "FILE")]
    pub music: Option<PathBuf>,
    #[arg(long, requires = "music")]
    pub music_volume: Option<f64>,
    #[arg(long)]
    pub dry_run: bool,
}

pub fn render_args_to_builder(args: RenderArgs, tools: &ToolPaths) -> ComposeResult<VideoBuilder> {
    if let Some(job) = &args.job {
        let mut builder = RenderJob::load(job)?.into_builder(tools)?;
        if let Some(output) = args.output {
            builder = builder.output_path(output);
        }
        return Ok(builder);
    }

    let size = args
        .size
        .ok_or_else(|| ComposeError::invalid("--size is required without --job"))?;
    let mut builder = VideoBuilder::with_dimensions(size)
        .ffmpeg_path(tools.ffmpeg.clone())
        .media_inspector(tools.inspector());

    if let Some(image) = args.image {
        let pan_zoom = (args.pan_zoom.is_some() || args.zoom_rate.is_some()).then(|| PanZoomConfig {
            preset: args.pan_zoom.unwrap_or_default(),
            zoom_rate: args.zoom_rate.unwrap_or(DEFAULT_ZOOM_RATE),
        });
        builder = builder.background_image(image, pan_zoom);
    } else if let Some(video) = args.video {
        builder = builder.background_video(video);
    }

    if let Some(audio) = args.audio {
        builder = builder.audio(audio);
    }
    if let Some(file) = args.captions {
        let options = CaptionOptions {
            file: None,
            force_style: args.force_style,
        };
        builder = builder.captions(file, Some(options));
    }
    if let Some(output) = args.output {
        builder = builder.output_path(output);
    }
    Ok(builder)
}

pub fn merge_args_to_builder(args: MergeArgs, tools: &ToolPaths) -> MergeBuilder {
    let mut builder = MergeBuilder::new(tools.inspector())
        .ffmpeg_path(tools.ffmpeg.clone())
        .videos(args.inputs)
        .output_path(args.output);
    if let Some(music) = args.music {
        builder = builder.music(music, args.music_volume);
    }
    builder
}
