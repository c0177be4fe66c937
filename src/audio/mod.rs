pub mod analyzer;
pub mod devices;
pub mod stream;

pub use analyzer::{AnalyzerConfig, FrequencyAnalyzer};
pub use stream::{AudioStream, StreamFeed};
