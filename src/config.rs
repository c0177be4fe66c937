// Analyzer defaults, matching a Web-Audio-style analyser node.
pub const MIN_DECIBELS: f32 = -100.0;
pub const MAX_DECIBELS: f32 = -10.0;
pub const FFT_SIZE: usize = 2048;
pub const SMOOTHING: f32 = 0.8;

pub const BUFFER_SIZE: usize = 2048;

// Render loop cadence and band selection for the demo meter.
pub const UPDATE_INTERVAL_MS: u64 = 30;
pub const DEFAULT_BANDS: usize = 6;
pub const BAND_LOW_BIN: usize = 100;
pub const BAND_HIGH_BIN: usize = 600;

// Analysis worker idle tick and capture ring capacity in seconds.
pub const ANALYSIS_TICK_MS: u64 = 5;
pub const CAPTURE_RING_SECONDS: usize = 1;
