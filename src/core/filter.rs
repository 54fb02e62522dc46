//! Typed filter-graph model.
//!
//! Graph construction works on [`FilterStage`] values; the textual
//! `-filter_complex` syntax only appears in the `Display` impls below.

use std::fmt;

use crate::core::formatter::format_number;

/// Separates stages in a `-filter_complex` expression.
pub const GRAPH_SEPARATOR: &str = ";";

/// Separates filters inside one stage.
pub const CHAIN_SEPARATOR: &str = ",";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    fn specifier(self) -> &'static str {
        match self {
            MediaKind::Video => "v",
            MediaKind::Audio => "a",
        }
    }
}

/// A pad feeding a stage or a `-map` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRef {
    /// Default stream of an input: `[0]`.
    Input(usize),
    /// A typed stream of an input: `[0:v]`.
    InputStream(usize, MediaKind),
    /// A labelled stage output: `[bg]`.
    Label(String),
}

impl StreamRef {
    pub fn label(name: impl Into<String>) -> Self {
        StreamRef::Label(name.into())
    }

    /// Form used after `-map`: labels stay bracketed, input streams are bare (`1:a`).
    pub fn map_target(&self) -> String {
        match self {
            StreamRef::Input(index) => index.to_string(),
            StreamRef::InputStream(index, kind) => format!("{index}:{}", kind.specifier()),
            StreamRef::Label(name) => format!("[{name}]"),
        }
    }
}

impl fmt::Display for StreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamRef::Input(index) => write!(f, "[{index}]"),
            StreamRef::InputStream(index, kind) => write!(f, "[{index}:{}]", kind.specifier()),
            StreamRef::Label(name) => write!(f, "[{name}]"),
        }
    }
}

/// One side of a `scale` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Fixed(u32),
    /// Derived from the other side, keeping aspect, rounded to an even value (`-2`).
    EvenAuto,
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extent::Fixed(value) => write!(f, "{value}"),
            Extent::EvenAuto => f.write_str("-2"),
        }
    }
}

/// Parameters of the `zoompan` filter. Expressions are passed through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomPan {
    pub zoom: String,
    pub x: String,
    pub y: String,
    pub duration_frames: u64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Scale {
        width: Extent,
        height: Extent,
        /// Shrink to fit inside the box, keeping aspect (`force_original_aspect_ratio=decrease`).
        fit_inside: bool,
    },
    SetSar {
        num: u32,
        den: u32,
    },
    Crop {
        width: u32,
        height: u32,
    },
    ZoomPan(ZoomPan),
    Pad {
        width: u32,
        height: u32,
        x: String,
        y: String,
        color: String,
    },
    Fps(u32),
    Format(String),
    Subtitles {
        file: String,
        force_style: Option<String>,
    },
    Copy,
    Volume(f64),
    Amix {
        inputs: u32,
        duration: String,
    },
    Concat {
        segments: usize,
        video: u32,
        audio: u32,
    },
}

impl Filter {
    pub fn scale(width: u32, height: u32) -> Self {
        Filter::Scale {
            width: Extent::Fixed(width),
            height: Extent::Fixed(height),
            fit_inside: false,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Scale {
                width,
                height,
                fit_inside,
            } => {
                write!(f, "scale={width}:{height}")?;
                if *fit_inside {
                    f.write_str(":force_original_aspect_ratio=decrease")?;
                }
                Ok(())
            }
            Filter::SetSar { num, den } => write!(f, "setsar={num}:{den}"),
            Filter::Crop { width, height } => write!(f, "crop={width}:{height}"),
            Filter::ZoomPan(zp) => write!(
                f,
                "zoompan=z='{}':x={}:y={}:d={}:s={}x{}:fps={}",
                zp.zoom, zp.x, zp.y, zp.duration_frames, zp.width, zp.height, zp.fps
            ),
            Filter::Pad {
                width,
                height,
                x,
                y,
                color,
            } => write!(f, "pad={width}:{height}:{x}:{y}:{color}"),
            Filter::Fps(fps) => write!(f, "fps={fps}"),
            Filter::Format(pix_fmt) => write!(f, "format={pix_fmt}"),
            Filter::Subtitles { file, force_style } => {
                write!(f, "subtitles={file}")?;
                if let Some(style) = force_style {
                    write!(f, ":force_style='{style}'")?;
                }
                Ok(())
            }
            Filter::Copy => f.write_str("copy"),
            Filter::Volume(level) => write!(f, "volume={}", format_number(*level)),
            Filter::Amix { inputs, duration } => {
                write!(f, "amix=inputs={inputs}:duration={duration}")
            }
            Filter::Concat {
                segments,
                video,
                audio,
            } => write!(f, "concat=n={segments}:v={video}:a={audio}"),
        }
    }
}

/// A linear chain of filters reading `inputs` and writing labelled `outputs`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStage {
    pub inputs: Vec<StreamRef>,
    pub chain: Vec<Filter>,
    pub outputs: Vec<String>,
}

impl FilterStage {
    pub fn new(input: StreamRef, chain: Vec<Filter>, output: impl Into<String>) -> Self {
        Self {
            inputs: vec![input],
            chain,
            outputs: vec![output.into()],
        }
    }

    pub fn with_inputs(
        inputs: Vec<StreamRef>,
        chain: Vec<Filter>,
        outputs: Vec<String>,
    ) -> Self {
        Self {
            inputs,
            chain,
            outputs,
        }
    }
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "{input}")?;
        }
        for (idx, filter) in self.chain.iter().enumerate() {
            if idx > 0 {
                f.write_str(CHAIN_SEPARATOR)?;
            }
            write!(f, "{filter}")?;
        }
        for output in &self.outputs {
            write!(f, "[{output}]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    stages: Vec<FilterStage>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: FilterStage) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, stage) in self.stages.iter().enumerate() {
            if idx > 0 {
                f.write_str(GRAPH_SEPARATOR)?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_chain_serialises_in_order() {
        let stage = FilterStage::new(
            StreamRef::Input(0),
            vec![
                Filter::Scale {
                    width: Extent::Fixed(1080),
                    height: Extent::EvenAuto,
                    fit_inside: false,
                },
                Filter::SetSar { num: 1, den: 1 },
                Filter::Crop {
                    width: 1080,
                    height: 1920,
                },
                Filter::ZoomPan(ZoomPan {
                    zoom: "zoom+0.001".to_string(),
                    x: "0".to_string(),
                    y: "0".to_string(),
                    duration_frames: 251,
                    width: 1080,
                    height: 1920,
                    fps: 25,
                }),
            ],
            "bg",
        );
        assert_eq!(
            stage.to_string(),
            concat!(
                "[0]scale=1080:-2,setsar=1:1,crop=1080:1920,",
                "zoompan=z='zoom+0.001':x=0:y=0:d=251:s=1080x1920:fps=25[bg]"
            )
        );
    }

    #[test]
    fn graph_joins_stages() {
        let mut graph = FilterGraph::new();
        assert!(graph.is_empty());
        graph.push(FilterStage::new(StreamRef::Input(0), vec![Filter::scale(1280, 720)], "bg"));
        graph.push(FilterStage::new(
            StreamRef::label("bg"),
            vec![Filter::Subtitles {
                file: "subs.srt".to_string(),
                force_style: None,
            }],
            "v",
        ));
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.to_string(), "[0]scale=1280:720[bg];[bg]subtitles=subs.srt[v]");
    }

    #[test]
    fn multi_pad_stages() {
        let stage = FilterStage::with_inputs(
            vec![
                StreamRef::label("v0n"),
                StreamRef::InputStream(0, MediaKind::Audio),
                StreamRef::label("v1n"),
                StreamRef::InputStream(1, MediaKind::Audio),
            ],
            vec![Filter::Concat {
                segments: 2,
                video: 1,
                audio: 1,
            }],
            vec!["v".to_string(), "a".to_string()],
        );
        assert_eq!(stage.to_string(), "[v0n][0:a][v1n][1:a]concat=n=2:v=1:a=1[v][a]");
    }

    #[test]
    fn map_targets() {
        assert_eq!(StreamRef::label("v").map_target(), "[v]");
        assert_eq!(StreamRef::InputStream(1, MediaKind::Audio).map_target(), "1:a");
    }

    #[test]
    fn subtitle_style_override() {
        let filter = Filter::Subtitles {
            file: "subs.ass".to_string(),
            force_style: Some("Fontsize=32".to_string()),
        };
        assert_eq!(filter.to_string(), "subtitles=subs.ass:force_style='Fontsize=32'");
        assert_eq!(Filter::Volume(0.5).to_string(), "volume=0.5");
    }
}
