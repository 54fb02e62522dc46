use std::collections::VecDeque;
use std::io::{BufReader, Read};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::core::command::FfmpegCommand;
use crate::core::error::{ComposeError, ComposeResult};
use crate::core::event::{classify_log_line, LogLevel};
use crate::core::formatter::{format_progress_line, format_summary_line};
use crate::core::job::{Job, JobStatus};
use crate::core::progress::parse_progress_line;
use crate::core::summary::parse_summary_line;

/// Runs assembled encoder commands. The boolean is the only success signal.
pub trait Executor {
    fn run(
        &self,
        command: &FfmpegCommand,
        label: &str,
        expected_duration: Option<f64>,
        show_progress: bool,
    ) -> bool;
}

const STDERR_TAIL_LINES: usize = 20;

/// [`Executor`] that spawns the command's program and follows its stderr.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner;

impl FfmpegRunner {
    pub fn new() -> Self {
        Self
    }

    pub fn run_job(
        &self,
        command: &FfmpegCommand,
        label: &str,
        expected_duration: Option<f64>,
        show_progress: bool,
    ) -> ComposeResult<Job> {
        let mut job = Job::new(label);
        tracing::debug!(operation = label, command = %command, "executing ffmpeg command");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ComposeError::BinaryNotFound {
                    program: command.program.clone(),
                }
            } else {
                ComposeError::ProcessFailed {
                    exit_code: None,
                    stderr: e.to_string(),
                }
            }
        })?;
        job.start();

        let stderr = child.stderr.take().ok_or_else(|| ComposeError::ProcessFailed {
            exit_code: None,
            stderr: "failed to capture ffmpeg stderr".to_string(),
        })?;

        let total = expected_duration
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64);
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

        read_lines(stderr, |line| {
            match classify_log_line(&line) {
                LogLevel::Summary => {
                    if let Some(summary) = parse_summary_line(&line) {
                        tracing::info!(operation = label, "{}", format_summary_line(&summary));
                        job.summary = Some(summary);
                    }
                }
                LogLevel::Progress => {
                    if let (true, Some(total), Some(update)) =
                        (show_progress, total, parse_progress_line(&line))
                    {
                        if let (Some(elapsed), Some(raw)) =
                            (update.time, update.raw_time.as_deref())
                        {
                            tracing::info!(
                                frame = ?update.frame,
                                speed = ?update.speed,
                                "{}",
                                format_progress_line(label, elapsed, raw, total)
                            );
                        }
                    }
                }
                LogLevel::Error => tracing::error!(operation = label, "ffmpeg: {line}"),
                LogLevel::Warning => tracing::warn!(operation = label, "ffmpeg: {line}"),
                LogLevel::Info => tracing::debug!(operation = label, "ffmpeg: {line}"),
                LogLevel::Noise => {}
            }

            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        });

        let status = child.wait().map_err(|e| ComposeError::ProcessFailed {
            exit_code: None,
            stderr: e.to_string(),
        })?;

        if status.success() {
            job.finish(JobStatus::Finished);
            tracing::debug!(operation = label, "{label} completed successfully");
            Ok(job)
        } else {
            job.finish(JobStatus::Failed);
            let stderr = tail.into_iter().collect::<Vec<_>>().join("\n");
            Err(ComposeError::ProcessFailed {
                exit_code: status.code(),
                stderr,
            })
        }
    }
}

impl Executor for FfmpegRunner {
    fn run(
        &self,
        command: &FfmpegCommand,
        label: &str,
        expected_duration: Option<f64>,
        show_progress: bool,
    ) -> bool {
        match self.run_job(command, label, expected_duration, show_progress) {
            Ok(_) => true,
            Err(ComposeError::ProcessFailed { exit_code, stderr }) => {
                tracing::error!(
                    operation = label,
                    return_code = ?exit_code,
                    %stderr,
                    "ffmpeg exited with code {exit_code:?} for {label}"
                );
                false
            }
            Err(err) => {
                tracing::error!(
                    operation = label,
                    error = %err,
                    "error executing ffmpeg command for {label}"
                );
                false
            }
        }
    }
}

/// Splits a byte stream on `\r` as well as `\n`; ffmpeg rewrites its status line in
/// place with carriage returns.
fn read_lines<R: Read>(reader: R, mut on_line: impl FnMut(String)) {
    let mut reader = BufReader::new(reader);
    let mut line_buf: Vec<u8> = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        match byte[0] {
            b'\r' | b'\n' => flush(&mut line_buf, &mut on_line),
            other => line_buf.push(other),
        }
    }

    flush(&mut line_buf, &mut on_line);
}

fn flush(buf: &mut Vec<u8>, on_line: &mut impl FnMut(String)) {
    if buf.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(buf).trim().to_string();
    buf.clear();
    if !line.is_empty() {
        on_line(line);
    }
}
