use std::time::{Duration, Instant};

use crate::core::summary::EncodeSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
    Failed,
}

/// One encoder run, from spawn to exit.
#[derive(Debug, Clone)]
pub struct Job {
    pub label: String,
    pub status: JobStatus,
    pub started_at: Option<Instant>,
    pub ended_at: Option<Instant>,
    pub summary: Option<EncodeSummary>,
}

impl Job {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: JobStatus::Pending,
            started_at: None,
            ended_at: None,
            summary: None,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = Some(Instant::now());
    }

    pub fn finish(&mut self, status: JobStatus) {
        self.status = status;
        self.ended_at = Some(Instant::now());
    }

    pub fn elapsed(&self) -> Option<Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            (Some(start), None) => Some(start.elapsed()),
            _ => None,
        }
    }
}
