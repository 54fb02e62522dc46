//! Assembly of the composite render command.
//!
//! A [`VideoBuilder`] accumulates a background, an optional audio track and an optional
//! subtitle overlay, then turns them into one ffmpeg invocation in a single pass:
//! validation, filter-graph construction and argument sequencing.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::command::FfmpegCommand;
use crate::core::error::{ComposeError, ComposeResult};
use crate::core::filter::{
    Extent, Filter, FilterGraph, FilterStage, MediaKind, StreamRef, ZoomPan,
};
use crate::core::formatter::format_number;
use crate::core::media::{usable_duration, MediaInspector};
use crate::core::model::{Background, CaptionOptions, Dimensions, PanZoomConfig, PanZoomPreset};
use crate::core::runner::Executor;

pub const FRAME_RATE: u32 = 25;
pub const DEFAULT_OUTPUT: &str = "output.mp4";
pub const RENDER_LABEL: &str = "build video";

pub const VIDEO_CODEC: &str = "libx264";
pub const VIDEO_PRESET: &str = "ultrafast";
pub const VIDEO_CRF: &str = "23";
pub const PIXEL_FORMAT: &str = "yuv420p";
pub const AUDIO_CODEC: &str = "aac";
pub const AUDIO_BITRATE: &str = "192k";

const BACKGROUND_LABEL: &str = "bg";
const VIDEO_LABEL: &str = "v";

/// Preset the pan/zoom stage actually uses. Zooming toward the top or the center
/// needs an upscaled source to avoid jitter, which costs too much render time.
const EFFECTIVE_PAN_ZOOM: PanZoomPreset = PanZoomPreset::ZoomToTopLeft;

/// One `-i` declaration with the options that precede it.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDecl {
    pub options: Vec<String>,
    pub path: PathBuf,
}

impl InputDecl {
    fn plain(path: &Path) -> Self {
        Self {
            options: Vec::new(),
            path: path.to_path_buf(),
        }
    }

    fn with_options<const N: usize>(options: [&str; N], path: &Path) -> Self {
        Self {
            options: options.iter().map(|opt| opt.to_string()).collect(),
            path: path.to_path_buf(),
        }
    }
}

/// The logical render graph, before it is flattened into arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub inputs: Vec<InputDecl>,
    pub graph: FilterGraph,
    pub video_output: StreamRef,
    pub audio_output: Option<StreamRef>,
    pub audio_duration: Option<f64>,
}

pub struct VideoBuilder {
    dimensions: Dimensions,
    ffmpeg_path: String,
    background: Option<Background>,
    audio: Option<PathBuf>,
    captions: Option<CaptionOptions>,
    output_path: PathBuf,
    inspector: Option<Box<dyn MediaInspector>>,
}

impl VideoBuilder {
    pub fn new(width: u32, height: u32) -> ComposeResult<Self> {
        Ok(Self::with_dimensions(Dimensions::new(width, height)?))
    }

    pub fn with_dimensions(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            ffmpeg_path: "ffmpeg".to_string(),
            background: None,
            audio: None,
            captions: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            inspector: None,
        }
    }

    pub fn ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    pub fn media_inspector(mut self, inspector: impl MediaInspector + 'static) -> Self {
        self.inspector = Some(Box::new(inspector));
        self
    }

    pub fn background_image(
        mut self,
        file: impl Into<PathBuf>,
        pan_zoom: Option<PanZoomConfig>,
    ) -> Self {
        self.background = Some(Background::Image {
            file: file.into(),
            pan_zoom: pan_zoom.unwrap_or_default(),
        });
        self
    }

    pub fn background_video(mut self, file: impl Into<PathBuf>) -> Self {
        self.background = Some(Background::Video { file: file.into() });
        self
    }

    pub fn audio(mut self, file: impl Into<PathBuf>) -> Self {
        self.audio = Some(file.into());
        self
    }

    /// Requests captions. `file` fills in when `config` names no file of its own, so a
    /// config without a file never clears an explicit `file`. This differs from a plain
    /// dictionary merge, where the config's empty `file` would win.
    pub fn captions(mut self, file: Option<PathBuf>, config: Option<CaptionOptions>) -> Self {
        let mut options = config.unwrap_or_default();
        if options.file.is_none() {
            options.file = file;
        }
        self.captions = Some(options);
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn output(&self) -> &Path {
        &self.output_path
    }

    /// Checks the accumulated settings and resolves the audio duration, if any.
    pub fn validate(&self) -> ComposeResult<Option<f64>> {
        let background = self
            .background
            .as_ref()
            .ok_or_else(|| ComposeError::invalid("background must be set (image or video)"))?;

        if self.audio.is_none() && self.captions.is_none() {
            return Err(ComposeError::invalid(
                "at least one of audio or captions must be provided",
            ));
        }

        match background {
            Background::Image { .. } if self.audio.is_none() => {
                return Err(ComposeError::invalid(
                    "audio must be provided when the background is an image",
                ));
            }
            Background::Video { .. } if self.audio.is_none() && self.captions.is_none() => {
                return Err(ComposeError::invalid(
                    "audio or captions must be provided when the background is a video",
                ));
            }
            _ => {}
        }

        let Some(audio) = &self.audio else {
            return Ok(None);
        };
        let inspector = self.inspector()?;
        let duration = match inspector.audio_info(audio) {
            Ok(info) => usable_duration(info.duration),
            Err(err) => {
                tracing::warn!(path = %audio.display(), error = %err, "audio probe failed");
                None
            }
        };
        duration
            .map(Some)
            .ok_or_else(|| ComposeError::DurationUnavailable {
                path: audio.clone(),
            })
    }

    /// Validates and lays out inputs and filter stages.
    pub fn plan(&self) -> ComposeResult<RenderPlan> {
        let audio_duration = self.validate()?;
        let Some(background) = &self.background else {
            return Err(ComposeError::invalid("background must be set (image or video)"));
        };
        let Dimensions { width, height } = self.dimensions;
        tracing::debug!(
            background = background.kind(),
            file = %background.file().display(),
            audio_duration = ?audio_duration,
            "planning render graph"
        );

        let mut inputs = Vec::new();
        let mut graph = FilterGraph::new();

        let background_index = inputs.len();
        match background {
            Background::Image { file, pan_zoom } => {
                let duration = audio_duration.ok_or_else(|| ComposeError::DurationUnavailable {
                    path: file.clone(),
                })?;
                let seconds = format_number(duration);
                inputs.push(InputDecl::with_options(["-loop", "1", "-t", &seconds], file));

                let (zoom, x, y) = EFFECTIVE_PAN_ZOOM.expressions(pan_zoom.zoom_rate);
                let frames = (duration * FRAME_RATE as f64).floor() as u64;
                graph.push(FilterStage::new(
                    StreamRef::Input(background_index),
                    vec![
                        Filter::Scale {
                            width: Extent::Fixed(width),
                            height: Extent::EvenAuto,
                            fit_inside: false,
                        },
                        Filter::SetSar { num: 1, den: 1 },
                        Filter::Crop { width, height },
                        Filter::ZoomPan(ZoomPan {
                            zoom,
                            x,
                            y,
                            // One frame of headroom so the last frame is not cut at the boundary.
                            duration_frames: frames + 1,
                            width,
                            height,
                            fps: FRAME_RATE,
                        }),
                    ],
                    BACKGROUND_LABEL,
                ));
            }
            Background::Video { file } => {
                let decl = match audio_duration {
                    Some(duration) => InputDecl::with_options(
                        ["-stream_loop", "-1", "-t", &format_number(duration)],
                        file,
                    ),
                    None => InputDecl::plain(file),
                };
                inputs.push(decl);
                graph.push(FilterStage::new(
                    StreamRef::Input(background_index),
                    vec![Filter::scale(width, height)],
                    BACKGROUND_LABEL,
                ));
            }
        }
        let mut current = StreamRef::label(BACKGROUND_LABEL);

        let audio_output = self.audio.as_deref().map(|audio| {
            let index = inputs.len();
            inputs.push(InputDecl::plain(audio));
            StreamRef::InputStream(index, MediaKind::Audio)
        });

        match &self.captions {
            Some(options) => {
                // A caption request without a file leaves the stream as `bg`.
                if let Some(file) = &options.file {
                    graph.push(FilterStage::new(
                        current,
                        vec![Filter::Subtitles {
                            file: file.to_string_lossy().into_owned(),
                            force_style: options.force_style.clone(),
                        }],
                        VIDEO_LABEL,
                    ));
                    current = StreamRef::label(VIDEO_LABEL);
                }
            }
            None => {
                if current == StreamRef::label(BACKGROUND_LABEL) {
                    graph.push(FilterStage::new(current, vec![Filter::Copy], VIDEO_LABEL));
                    current = StreamRef::label(VIDEO_LABEL);
                }
            }
        }

        Ok(RenderPlan {
            inputs,
            graph,
            video_output: current,
            audio_output,
            audio_duration,
        })
    }

    /// Assembles the full command. Fails without producing a partial command.
    pub fn build_command(&self) -> ComposeResult<FfmpegCommand> {
        let plan = self.plan()?;
        Ok(self.sequence(&plan))
    }

    fn sequence(&self, plan: &RenderPlan) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(self.ffmpeg_path.clone());
        cmd.arg("-y");

        for input in &plan.inputs {
            cmd.args(input.options.iter().cloned());
            cmd.arg("-i").arg(input.path.to_string_lossy());
        }

        if !plan.graph.is_empty() {
            cmd.arg("-filter_complex").arg(plan.graph.to_string());
        }

        cmd.arg("-map").arg(plan.video_output.map_target());
        if let Some(audio) = &plan.audio_output {
            cmd.arg("-map").arg(audio.map_target());
        }

        cmd.args(["-c:v", VIDEO_CODEC, "-preset", VIDEO_PRESET]);
        cmd.args(["-crf", VIDEO_CRF, "-pix_fmt", PIXEL_FORMAT]);

        if plan.audio_output.is_some() {
            cmd.args(["-c:a", AUDIO_CODEC, "-b:a", AUDIO_BITRATE]);
            if let Some(duration) = plan.audio_duration {
                cmd.arg("-t").arg(format_number(duration));
            }
        }

        cmd.arg(self.output_path.to_string_lossy());
        cmd
    }

    /// Duration used for progress reporting: the audio track if present, otherwise a
    /// video background's own length.
    pub fn expected_duration(&self) -> ComposeResult<Option<f64>> {
        let inspector = self.inspector()?;
        if let Some(audio) = &self.audio {
            return Ok(inspector
                .audio_info(audio)
                .ok()
                .and_then(|info| usable_duration(info.duration)));
        }
        if let Some(Background::Video { file }) = &self.background {
            return Ok(match inspector.video_info(file) {
                Ok(info) => usable_duration(info.duration),
                Err(err) => {
                    tracing::warn!(path = %file.display(), error = %err, "background probe failed");
                    None
                }
            });
        }
        Ok(None)
    }

    /// Assembles and runs the command, keeping the failure reason.
    pub fn render(&self, executor: &dyn Executor) -> ComposeResult<()> {
        self.inspector()?;
        let command = self.build_command()?;
        let expected_duration = self.expected_duration()?;

        tracing::debug!(
            command = %command,
            expected_duration = ?expected_duration,
            "executing video build command"
        );
        if executor.run(&command, RENDER_LABEL, expected_duration, true) {
            Ok(())
        } else {
            Err(ComposeError::ExecutionFailed {
                label: RENDER_LABEL.to_string(),
            })
        }
    }

    /// Like [`VideoBuilder::render`], but logs any failure and reports only success.
    pub fn execute(&self, executor: &dyn Executor) -> bool {
        let span = tracing::info_span!(
            "render",
            width = self.dimensions.width,
            height = self.dimensions.height,
            background = self.background.as_ref().map_or("none", Background::kind),
            has_audio = self.audio.is_some(),
            has_captions = self.captions.is_some(),
            output = %self.output_path.display(),
        );
        let _enter = span.enter();

        if self.inspector.is_none() {
            tracing::error!("media inspector must be set before executing video build");
            return false;
        }

        let start = Instant::now();
        tracing::debug!("building video");
        match self.render(executor) {
            Ok(()) => {
                tracing::info!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "video built successfully"
                );
                true
            }
            Err(ComposeError::ExecutionFailed { .. }) => {
                tracing::error!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "failed to build video"
                );
                false
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "error during video rendering"
                );
                false
            }
        }
    }

    fn inspector(&self) -> ComposeResult<&dyn MediaInspector> {
        self.inspector
            .as_deref()
            .ok_or(ComposeError::MissingCollaborator {
                name: "media inspector",
            })
    }
}

impl fmt::Debug for VideoBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoBuilder")
            .field("dimensions", &self.dimensions)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("background", &self.background)
            .field("audio", &self.audio)
            .field("captions", &self.captions)
            .field("output_path", &self.output_path)
            .field("inspector", &self.inspector.is_some())
            .finish()
    }
}
