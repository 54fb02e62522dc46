pub mod builder;
pub mod caption;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod formatter;
pub mod job;
pub mod media;
pub mod merge;
pub mod model;
pub mod progress;
pub mod runner;
pub mod summary;

pub use builder::VideoBuilder;
pub use command::FfmpegCommand;
pub use error::{ComposeError, ComposeResult};
pub use media::{FfprobeInspector, MediaInspector};
pub use merge::MergeBuilder;
pub use runner::{Executor, FfmpegRunner};
