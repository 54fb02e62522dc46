use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::builder::VideoBuilder;
use crate::core::error::ComposeResult;
use crate::core::media::FfprobeInspector;
use crate::core::model::{CaptionOptions, Dimensions, PanZoomConfig};

/// Locations of the external binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub ffmpeg: String,
    pub ffprobe: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl ToolPaths {
    pub fn inspector(&self) -> FfprobeInspector {
        FfprobeInspector::new(self.ffprobe.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackgroundJob {
    Image {
        file: PathBuf,
        #[serde(default)]
        pan_zoom: Option<PanZoomConfig>,
    },
    Video {
        file: PathBuf,
    },
}

/// One render described as JSON:
///
/// ```json
/// {
///   "dimensions": [1080, 1920],
///   "background": { "type": "image", "file": "bg.jpg", "pan_zoom": { "zoom_rate": 0.001 } },
///   "audio": "voice.mp3",
///   "captions": { "file": "subs.ass" },
///   "output": "out.mp4"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderJob {
    pub dimensions: Vec<i64>,
    pub background: BackgroundJob,
    #[serde(default)]
    pub audio: Option<PathBuf>,
    #[serde(default)]
    pub captions: Option<CaptionOptions>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl RenderJob {
    pub fn load(path: &Path) -> ComposeResult<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> ComposeResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Builder with every field of the job applied and the tools from `tools` bound.
    pub fn into_builder(self, tools: &ToolPaths) -> ComposeResult<VideoBuilder> {
        let dimensions = Dimensions::try_from(self.dimensions.as_slice())?;
        let mut builder = VideoBuilder::with_dimensions(dimensions)
            .ffmpeg_path(tools.ffmpeg.clone())
            .media_inspector(tools.inspector());

        builder = match self.background {
            BackgroundJob::Image { file, pan_zoom } => builder.background_image(file, pan_zoom),
            BackgroundJob::Video { file } => builder.background_video(file),
        };
        if let Some(audio) = self.audio {
            builder = builder.audio(audio);
        }
        if let Some(captions) = self.captions {
            builder = builder.captions(None, Some(captions));
        }
        if let Some(output) = self.output {
            builder = builder.output_path(output);
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ComposeError;
    use crate::core::model::{Background, PanZoomPreset};

    #[test]
    fn parses_full_job() {
        let job = RenderJob::from_json(
            r#"{
                "dimensions": [1080, 1920],
                "background": {
                    "type": "image",
                    "file": "bg.jpg",
                    "pan_zoom": {"preset": "zoom-to-center"}
                },
                "audio": "voice.mp3",
                "captions": {"file": "subs.ass"},
                "output": "out.mp4"
            }"#,
        )
        .unwrap();
        assert_eq!(
            job.background,
            BackgroundJob::Image {
                file: PathBuf::from("bg.jpg"),
                pan_zoom: Some(PanZoomConfig {
                    preset: PanZoomPreset::ZoomToCenter,
                    zoom_rate: 0.001,
                }),
            }
        );

        let builder = job.into_builder(&ToolPaths::default()).unwrap();
        assert_eq!(builder.dimensions().to_string(), "1080x1920");
        assert!(matches!(builder.background(), Some(Background::Image { .. })));
        assert_eq!(builder.output(), Path::new("out.mp4"));
    }

    #[test]
    fn caption_request_without_file() {
        let job = RenderJob::from_json(
            r#"{
                "dimensions": [1280, 720],
                "background": {"type": "video", "file": "clip.mp4"},
                "captions": {}
            }"#,
        )
        .unwrap();
        assert_eq!(job.captions, Some(CaptionOptions::default()));
        assert_eq!(job.audio, None);
    }

    #[test]
    fn rejects_bad_dimensions_and_presets() {
        let job = RenderJob::from_json(
            r#"{"dimensions": [1080], "background": {"type": "video", "file": "clip.mp4"}}"#,
        )
        .unwrap();
        assert!(matches!(
            job.into_builder(&ToolPaths::default()),
            Err(ComposeError::InvalidConfiguration { .. })
        ));

        let err = RenderJob::from_json(
            r#"{
                "dimensions": [1, 1],
                "background": {"type": "image", "file": "a.jpg", "pan_zoom": {"preset": "spin"}}
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::Json(_)));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        fs::write(
            &path,
            r#"{
                "dimensions": [640, 480],
                "background": {"type": "video", "file": "clip.mp4"},
                "audio": "a.mp3"
            }"#,
        )
        .unwrap();
        let job = RenderJob::load(&path).unwrap();
        assert_eq!(job.audio, Some(PathBuf::from("a.mp3")));
        assert!(matches!(
            RenderJob::load(&dir.path().join("missing.json")),
            Err(ComposeError::Io(_))
        ));
    }
}
