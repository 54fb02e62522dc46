use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::core::error::{ComposeError, ComposeResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioInfo {
    pub duration: Option<f64>,
    pub channels: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoInfo {
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Source of media metadata.
pub trait MediaInspector {
    fn audio_info(&self, path: &Path) -> ComposeResult<AudioInfo>;
    fn video_info(&self, path: &Path) -> ComposeResult<VideoInfo>;
}

/// A duration only counts when it is present, finite and positive.
pub fn usable_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|secs| secs.is_finite() && *secs > 0.0)
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<u32>,
}

/// [`MediaInspector`] backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    program: String,
}

impl FfprobeInspector {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn probe(&self, path: &Path, selector: &str) -> ComposeResult<(Option<f64>, ProbeStream)> {
        let args = [
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            "-select_streams",
            selector,
        ];
        tracing::debug!(program = %self.program, path = %path.display(), selector, "probing media");

        let output = Command::new(&self.program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ComposeError::BinaryNotFound {
                        program: self.program.clone(),
                    }
                } else {
                    ComposeError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(path = %path.display(), %stderr, "ffprobe failed");
            return Err(ComposeError::Probe {
                path: path.to_path_buf(),
                message: format!("ffprobe exited with status {}", output.status),
            });
        }

        parse_probe_output(path, &output.stdout)
    }
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

fn parse_probe_output(path: &Path, stdout: &[u8]) -> ComposeResult<(Option<f64>, ProbeStream)> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)?;
    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| ComposeError::Probe {
            path: PathBuf::from(path),
            message: "no matching stream found in file".to_string(),
        })?;
    let duration = parsed
        .format
        .duration
        .as_deref()
        .and_then(|value| value.trim().parse::<f64>().ok());
    Ok((duration, stream))
}

impl MediaInspector for FfprobeInspector {
    fn audio_info(&self, path: &Path) -> ComposeResult<AudioInfo> {
        let (duration, stream) = self.probe(path, "a:0")?;
        Ok(AudioInfo {
            duration,
            channels: stream.channels,
        })
    }

    fn video_info(&self, path: &Path) -> ComposeResult<VideoInfo> {
        let (duration, stream) = self.probe(path, "v:0")?;
        Ok(VideoInfo {
            duration,
            width: stream.width,
            height: stream.height,
        })
    }
}
