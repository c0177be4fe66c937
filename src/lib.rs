//! Live microphone frequency-band visualizer core.
//!
//! Captures an input stream, keeps a continuously-updated decibel
//! spectrum snapshot on a background analysis thread, and serves banded,
//! normalized magnitudes to a caller-driven render loop.

pub mod audio;
pub mod config;
pub mod error;
pub mod ui;

pub use audio::{AnalyzerConfig, AudioStream, FrequencyAnalyzer, StreamFeed};
pub use error::{Error, Result};
