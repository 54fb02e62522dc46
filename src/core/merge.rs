//! Concatenation of finished clips, with optional background music.

use std::path::{Path, PathBuf};

use crate::core::builder::{AUDIO_BITRATE, AUDIO_CODEC, PIXEL_FORMAT, VIDEO_CODEC, VIDEO_CRF};
use crate::core::command::FfmpegCommand;
use crate::core::error::{ComposeError, ComposeResult};
use crate::core::filter::{Extent, Filter, FilterGraph, FilterStage, MediaKind, StreamRef};
use crate::core::media::{usable_duration, MediaInspector};
use crate::core::model::Dimensions;
use crate::core::runner::Executor;

pub const MERGE_LABEL: &str = "merge videos";
pub const MERGE_FPS: u32 = 30;
pub const MERGE_PRESET: &str = "veryfast";
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.5;

/// Used when the first clip reports no size.
const FALLBACK_SIZE: Dimensions = Dimensions {
    width: 1080,
    height: 1920,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundMusic {
    pub file: PathBuf,
    pub volume: f64,
}

pub struct MergeBuilder {
    ffmpeg_path: String,
    videos: Vec<PathBuf>,
    music: Option<BackgroundMusic>,
    output_path: PathBuf,
    inspector: Box<dyn MediaInspector>,
}

impl MergeBuilder {
    pub fn new(inspector: impl MediaInspector + 'static) -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            videos: Vec::new(),
            music: None,
            output_path: PathBuf::from("merged.mp4"),
            inspector: Box::new(inspector),
        }
    }

    pub fn ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    pub fn video(mut self, file: impl Into<PathBuf>) -> Self {
        self.videos.push(file.into());
        self
    }

    pub fn videos<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.videos.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn music(mut self, file: impl Into<PathBuf>, volume: Option<f64>) -> Self {
        self.music = Some(BackgroundMusic {
            file: file.into(),
            volume: volume.unwrap_or(DEFAULT_MUSIC_VOLUME),
        });
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    fn target_size(&self, first: &Path) -> ComposeResult<Dimensions> {
        let info = self.inspector.video_info(first)?;
        Ok(match (info.width, info.height) {
            (Some(width), Some(height)) => Dimensions::new(width, height).unwrap_or(FALLBACK_SIZE),
            _ => FALLBACK_SIZE,
        })
    }

    pub fn build_command(&self) -> ComposeResult<FfmpegCommand> {
        let first = self
            .videos
            .first()
            .ok_or_else(|| ComposeError::invalid("no video paths provided for merging"))?;
        let size = self.target_size(first)?;
        tracing::debug!(
            target_width = size.width,
            target_height = size.height,
            "using dimensions from first video"
        );

        let mut cmd = FfmpegCommand::new(self.ffmpeg_path.clone());
        cmd.arg("-y");
        for video in &self.videos {
            cmd.arg("-i").arg(video.to_string_lossy());
        }
        let music_index = self.videos.len();
        if let Some(music) = &self.music {
            cmd.arg("-i").arg(music.file.to_string_lossy());
        }

        let normalise = |to_yuv: bool| {
            let mut chain = vec![
                Filter::Scale {
                    width: Extent::Fixed(size.width),
                    height: Extent::Fixed(size.height),
                    fit_inside: true,
                },
                Filter::Pad {
                    width: size.width,
                    height: size.height,
                    x: "(ow-iw)/2".to_string(),
                    y: "(oh-ih)/2".to_string(),
                    color: "black".to_string(),
                },
                Filter::Fps(MERGE_FPS),
            ];
            if to_yuv {
                chain.push(Filter::Format(PIXEL_FORMAT.to_string()));
            }
            chain
        };
        let music_stages =
            |graph: &mut FilterGraph, music: &BackgroundMusic, mixed_from: StreamRef, out: &str| {
                graph.push(FilterStage::new(
                    StreamRef::InputStream(music_index, MediaKind::Audio),
                    vec![Filter::Volume(music.volume)],
                    "bg",
                ));
                graph.push(FilterStage::with_inputs(
                    vec![mixed_from, StreamRef::label("bg")],
                    vec![Filter::Amix {
                        inputs: 2,
                        duration: "first".to_string(),
                    }],
                    vec![out.to_string()],
                ));
            };

        let mut graph = FilterGraph::new();
        let audio_out = if self.videos.len() == 1 {
            graph.push(FilterStage::new(
                StreamRef::InputStream(0, MediaKind::Video),
                normalise(false),
                "v",
            ));
            match &self.music {
                Some(music) => {
                    let own_audio = StreamRef::InputStream(0, MediaKind::Audio);
                    music_stages(&mut graph, music, own_audio, "a");
                    StreamRef::label("a")
                }
                None => StreamRef::InputStream(0, MediaKind::Audio),
            }
        } else {
            let mut concat_inputs = Vec::with_capacity(self.videos.len() * 2);
            for index in 0..self.videos.len() {
                let label = format!("v{index}n");
                graph.push(FilterStage::new(
                    StreamRef::InputStream(index, MediaKind::Video),
                    normalise(true),
                    label.clone(),
                ));
                concat_inputs.push(StreamRef::Label(label));
                concat_inputs.push(StreamRef::InputStream(index, MediaKind::Audio));
            }
            graph.push(FilterStage::with_inputs(
                concat_inputs,
                vec![Filter::Concat {
                    segments: self.videos.len(),
                    video: 1,
                    audio: 1,
                }],
                vec!["v".to_string(), "a".to_string()],
            ));
            match &self.music {
                Some(music) => {
                    music_stages(&mut graph, music, StreamRef::label("a"), "final_a");
                    StreamRef::label("final_a")
                }
                None => StreamRef::label("a"),
            }
        };

        cmd.arg("-filter_complex").arg(graph.to_string());
        cmd.arg("-map").arg(StreamRef::label("v").map_target());
        cmd.arg("-map").arg(audio_out.map_target());

        cmd.args(["-c:v", VIDEO_CODEC, "-preset", MERGE_PRESET, "-crf", VIDEO_CRF]);
        cmd.args(["-c:a", AUDIO_CODEC, "-b:a", AUDIO_BITRATE]);
        cmd.args(["-pix_fmt", PIXEL_FORMAT]);
        cmd.arg(self.output_path.to_string_lossy());
        Ok(cmd)
    }

    /// Sum of the clips' durations; clips that cannot be probed count as zero.
    pub fn expected_duration(&self) -> f64 {
        self.videos
            .iter()
            .map(|video| {
                self.inspector
                    .video_info(video)
                    .ok()
                    .and_then(|info| usable_duration(info.duration))
                    .unwrap_or(0.0)
            })
            .sum()
    }

    pub fn render(&self, executor: &dyn Executor) -> ComposeResult<()> {
        let command = self.build_command()?;
        let expected = self.expected_duration();
        if executor.run(&command, MERGE_LABEL, Some(expected), true) {
            Ok(())
        } else {
            Err(ComposeError::ExecutionFailed {
                label: MERGE_LABEL.to_string(),
            })
        }
    }

    pub fn execute(&self, executor: &dyn Executor) -> bool {
        let span = tracing::info_span!(
            "merge",
            number_of_videos = self.videos.len(),
            output = %self.output_path.display(),
            background_music = self.music.is_some(),
            background_music_volume = self.music.as_ref().map_or(0.0, |m| m.volume),
        );
        let _enter = span.enter();
        let start = std::time::Instant::now();

        match self.render(executor) {
            Ok(()) => {
                tracing::debug!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "videos merged successfully"
                );
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "error merging videos");
                false
            }
        }
    }
}
