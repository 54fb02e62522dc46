use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{ComposeError, ComposeResult};
use crate::core::formatter::format_number;

/// Output frame size in pixels; both sides non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> ComposeResult<Self> {
        if width == 0 || height == 0 {
            return Err(ComposeError::invalid(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<(u32, u32)> for Dimensions {
    type Error = ComposeError;

    fn try_from((width, height): (u32, u32)) -> ComposeResult<Self> {
        Self::new(width, height)
    }
}

impl TryFrom<&[i64]> for Dimensions {
    type Error = ComposeError;

    fn try_from(values: &[i64]) -> ComposeResult<Self> {
        let [width, height] = values else {
            return Err(ComposeError::invalid(
                "dimensions must be a (width, height) pair",
            ));
        };
        let side = |value: i64| {
            u32::try_from(value).map_err(|_| {
                ComposeError::invalid(format!("dimension {value} is out of range"))
            })
        };
        Self::new(side(*width)?, side(*height)?)
    }
}

impl FromStr for Dimensions {
    type Err = ComposeError;

    fn from_str(value: &str) -> ComposeResult<Self> {
        let (width, height) = value
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| ComposeError::invalid(format!("expected WIDTHxHEIGHT, got '{value}'")))?;
        let parse = |side: &str| {
            side.trim().parse::<u32>().map_err(|_| {
                ComposeError::invalid(format!("invalid dimension '{side}' in '{value}'"))
            })
        };
        Self::new(parse(width)?, parse(height)?)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pan/zoom motion applied to still backgrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanZoomPreset {
    #[default]
    ZoomToTop,
    ZoomToCenter,
    ZoomToTopLeft,
}

impl PanZoomPreset {
    pub const ALL: [PanZoomPreset; 3] = [
        PanZoomPreset::ZoomToTop,
        PanZoomPreset::ZoomToCenter,
        PanZoomPreset::ZoomToTopLeft,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PanZoomPreset::ZoomToTop => "zoom-to-top",
            PanZoomPreset::ZoomToCenter => "zoom-to-center",
            PanZoomPreset::ZoomToTopLeft => "zoom-to-top-left",
        }
    }

    /// `(zoom, x, y)` expressions for the `zoompan` filter.
    pub fn expressions(self, zoom_rate: f64) -> (String, String, String) {
        let zoom = format!("zoom+{}", format_number(zoom_rate));
        let (x, y) = match self {
            PanZoomPreset::ZoomToTop => ("iw/2-(iw/zoom/2)", "0"),
            PanZoomPreset::ZoomToCenter => ("iw/2-(iw/zoom/2)", "ih/2-(ih/zoom/2)"),
            PanZoomPreset::ZoomToTopLeft => ("0", "0"),
        };
        (zoom, x.to_string(), y.to_string())
    }
}

impl FromStr for PanZoomPreset {
    type Err = ComposeError;

    fn from_str(value: &str) -> ComposeResult<Self> {
        PanZoomPreset::ALL
            .into_iter()
            .find(|preset| preset.name() == value.trim())
            .ok_or_else(|| ComposeError::invalid(format!("unknown pan/zoom preset '{value}'")))
    }
}

impl fmt::Display for PanZoomPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const DEFAULT_ZOOM_RATE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanZoomConfig {
    /// Requested motion. Recorded, but the command always uses
    /// [`PanZoomPreset::ZoomToTopLeft`]; the other presets need an upscale first.
    pub preset: PanZoomPreset,
    /// Zoom increment per frame.
    pub zoom_rate: f64,
}

impl Default for PanZoomConfig {
    fn default() -> Self {
        Self {
            preset: PanZoomPreset::default(),
            zoom_rate: DEFAULT_ZOOM_RATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Image {
        file: PathBuf,
        pan_zoom: PanZoomConfig,
    },
    Video {
        file: PathBuf,
    },
}

impl Background {
    pub fn file(&self) -> &Path {
        match self {
            Background::Image { file, .. } | Background::Video { file } => file,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Background::Image { .. } => "image",
            Background::Video { .. } => "video",
        }
    }
}

/// Requested subtitle overlay. Present even without a file: that still counts as
/// "captions requested" during validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionOptions {
    pub file: Option<PathBuf>,
    /// ASS style override handed to the `subtitles` filter.
    pub force_style: Option<String>,
}

impl CaptionOptions {
    pub fn with_file(file: impl Into<PathBuf>) -> Self {
        Self {
            file: Some(file.into()),
            force_style: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimension_strings() {
        assert_eq!(
            "1080x1920".parse::<Dimensions>().unwrap(),
            Dimensions {
                width: 1080,
                height: 1920
            }
        );
        assert_eq!("1280X720".parse::<Dimensions>().unwrap().to_string(), "1280x720");
        for bad in ["1080", "0x720", "x", "-1x5", "10x10x10", ""] {
            assert!(
                matches!(
                    bad.parse::<Dimensions>(),
                    Err(ComposeError::InvalidConfiguration { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_pairs_and_non_positive_values() {
        assert!(Dimensions::try_from(&[1080i64, 1920][..]).is_ok());
        let bad_inputs: [&[i64]; 6] =
            [&[1080], &[1, 2, 3], &[], &[0, 10], &[-5, 10], &[1, i64::MAX]];
        for bad in bad_inputs {
            assert!(matches!(
                Dimensions::try_from(bad),
                Err(ComposeError::InvalidConfiguration { .. })
            ));
        }
        assert!(Dimensions::try_from((0u32, 1u32)).is_err());
    }

    #[test]
    fn background_file_and_kind() {
        let image = Background::Image {
            file: PathBuf::from("bg.jpg"),
            pan_zoom: PanZoomConfig::default(),
        };
        assert_eq!(image.file(), Path::new("bg.jpg"));
        assert_eq!(image.kind(), "image");
        let video = Background::Video {
            file: PathBuf::from("clip.mp4"),
        };
        assert_eq!(video.file(), Path::new("clip.mp4"));
        assert_eq!(video.kind(), "video");
        assert_eq!(
            CaptionOptions::with_file("subs.ass").file,
            Some(PathBuf::from("subs.ass"))
        );
    }

    #[test]
    fn preset_names_round_trip() {
        for preset in PanZoomPreset::ALL {
            assert_eq!(preset.name().parse::<PanZoomPreset>().unwrap(), preset);
        }
        assert!("zoom-out".parse::<PanZoomPreset>().is_err());
    }

    #[test]
    fn preset_expressions() {
        assert_eq!(
            PanZoomPreset::ZoomToTopLeft.expressions(0.001),
            ("zoom+0.001".to_string(), "0".to_string(), "0".to_string())
        );
        let (_, x, y) = PanZoomPreset::ZoomToCenter.expressions(0.002);
        assert_eq!(x, "iw/2-(iw/zoom/2)");
        assert_eq!(y, "ih/2-(ih/zoom/2)");
    }

    #[test]
    fn pan_zoom_defaults() {
        let config: PanZoomConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PanZoomConfig::default());
        assert_eq!(config.zoom_rate, 0.001);
        let config: PanZoomConfig =
            serde_json::from_str(r#"{"preset": "zoom-to-center", "zoom_rate": 0.002}"#).unwrap();
        assert_eq!(config.preset, PanZoomPreset::ZoomToCenter);
    }
}
