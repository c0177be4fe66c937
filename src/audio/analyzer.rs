//! Frequency analyzer session.
//!
//! Replicates a Web-Audio analyser node: an analysis thread drains the
//! capture ring, runs a Hann-windowed FFT over the most recent
//! `fft_size` samples, applies exponential smoothing on the linear
//! magnitudes, and publishes the decibel snapshot via `ArcSwap`. Readers
//! never block the capture path.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use apodize::hanning_iter;
use arc_swap::ArcSwap;
use ringbuf::HeapCons;
use ringbuf::traits::Consumer;
use rustfft::FftPlanner;
use rustfft::num_complex::Complex32;

use crate::audio::stream::AudioStream;
use crate::config::{ANALYSIS_TICK_MS, FFT_SIZE, MAX_DECIBELS, MIN_DECIBELS, SMOOTHING};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct AnalyzerConfig {
    /// Decibel floor; values below clamp to it.
    pub min_db: f32,
    /// Decibel ceiling; values above clamp to it.
    pub max_db: f32,
    /// Transform size. Power of two; the snapshot holds `fft_size / 2` bins.
    pub fft_size: usize,
    /// Smoothing factor in [0, 1]; higher means slower response.
    pub smoothing: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_db: MIN_DECIBELS,
            max_db: MAX_DECIBELS,
            fft_size: FFT_SIZE,
            smoothing: SMOOTHING,
        }
    }
}

impl AnalyzerConfig {
    fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(Error::InvalidInput(format!(
                "fft_size must be a power of two in [32, 32768], got {}",
                self.fft_size
            )));
        }

        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(Error::InvalidInput(format!(
                "smoothing must be in [0, 1], got {}",
                self.smoothing
            )));
        }

        if self.min_db >= self.max_db {
            return Err(Error::InvalidInput(format!(
                "decibel floor {} must be below ceiling {}",
                self.min_db, self.max_db
            )));
        }

        Ok(())
    }
}

// State shared between the session handle and the analysis thread.
struct AnalyzerShared {
    snapshot: ArcSwap<Vec<f32>>,
    running: AtomicBool,
}

/// One analysis session over one live stream.
///
/// Exclusively owned by its creator; create a new session per stream.
/// `destroy` (or drop) is the single release point.
pub struct FrequencyAnalyzer {
    shared: Arc<AnalyzerShared>,
    worker: Option<JoinHandle<()>>,
    config: AnalyzerConfig,
    sample_rate: u32,
    bin_count: usize,
    destroyed: bool,
    // Keeps the cpal capture stream alive for the session's lifetime.
    capture: Option<cpal::Stream>,
}

impl fmt::Debug for FrequencyAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrequencyAnalyzer")
            .field("config", &self.config)
            .field("sample_rate", &self.sample_rate)
            .field("bin_count", &self.bin_count)
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}

impl FrequencyAnalyzer {
    /// Bind to a live stream with the default configuration.
    pub fn initialize(stream: AudioStream) -> Result<Self> {
        Self::with_config(stream, AnalyzerConfig::default())
    }

    pub fn with_config(stream: AudioStream, config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;

        if !stream.is_live() {
            return Err(Error::InvalidInput("stream is not live".to_string()));
        }
        if stream.sample_rate() == 0 {
            return Err(Error::InvalidInput("stream has no sample rate".to_string()));
        }

        let (consumer, sample_rate, capture) = stream.into_parts();
        let bin_count = config.fft_size / 2;

        let shared = Arc::new(AnalyzerShared {
            // No signal yet: every bin reads as silence.
            snapshot: ArcSwap::from_pointee(vec![f32::NEG_INFINITY; bin_count]),
            running: AtomicBool::new(true),
        });

        let worker_shared = shared.clone();
        let worker = thread::Builder::new()
            .name("bandviz-analysis".to_string())
            .spawn(move || run_analysis_loop(consumer, worker_shared, config))
            .map_err(|err| {
                Error::UnsupportedEnvironment(format!("failed to spawn analysis thread: {}", err))
            })?;

        log::debug!(
            "analyzer initialized: fft_size={} sample_rate={}",
            config.fft_size,
            sample_rate
        );

        Ok(Self {
            shared,
            worker: Some(worker),
            config,
            sample_rate,
            bin_count,
            destroyed: false,
            capture,
        })
    }

    /// Copy of the latest decibel snapshot, `fft_size / 2` values.
    pub fn read_frequency_snapshot(&self) -> Result<Vec<f32>> {
        if self.destroyed {
            return Err(Error::InvalidState("analyzer already destroyed"));
        }

        Ok(self.shared.snapshot.load().as_ref().clone())
    }

    /// Slice the snapshot to `[low, high)`, normalize, and split into
    /// `bands` contiguous chunks of width `ceil(len / bands)`.
    ///
    /// `high` past the end of the buffer truncates; trailing chunks may be
    /// short or empty. A zero `bands` or `low >= high` is malformed.
    pub fn get_frequency_bands(
        &self,
        bands: usize,
        low: usize,
        high: usize,
    ) -> Result<Vec<Vec<f32>>> {
        if bands == 0 {
            return Err(Error::InvalidInput("band count must be non-zero".to_string()));
        }
        if low >= high {
            return Err(Error::InvalidInput(format!(
                "bin range [{}, {}) is empty or reversed",
                low, high
            )));
        }

        let snapshot = self.read_frequency_snapshot()?;
        let high = high.min(snapshot.len());
        let range = if low < high { &snapshot[low..high] } else { &[][..] };

        let normalized = self.normalize(range)?;
        Ok(chunk_bands(&normalized, bands))
    }

    /// Map raw decibel values into [0, 1] display values.
    pub fn normalize(&self, values: &[f32]) -> Result<Vec<f32>> {
        if self.destroyed {
            return Err(Error::InvalidState("analyzer already destroyed"));
        }

        Ok(values
            .iter()
            .map(|&v| normalize_db(v, self.config.min_db, self.config.max_db))
            .collect())
    }

    /// Center frequency of `bin` in Hz.
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.config.fft_size as f32
    }

    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stop the analysis thread and release the capture stream.
    ///
    /// Safe to call more than once; every operation except `destroy`
    /// fails with `InvalidState` afterwards.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        self.shared.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.capture = None;

        log::debug!("analyzer destroyed");
    }
}

impl Drop for FrequencyAnalyzer {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// The formula divides by the literal 100, the width of the default
/// −100/−10 range; it is not derived from the configured floor/ceiling,
/// so outputs are only guaranteed within [0, 1] at the defaults.
fn normalize_db(value: f32, min_db: f32, max_db: f32) -> f32 {
    if value == f32::NEG_INFINITY {
        return 0.0;
    }

    let clamped = value.clamp(min_db, max_db);
    (1.0 - (clamped * -1.0) / 100.0).sqrt()
}

fn chunk_bands(values: &[f32], bands: usize) -> Vec<Vec<f32>> {
    let chunk_size = values.len().div_ceil(bands).max(1);

    (0..bands)
        .map(|i| {
            let start = (i * chunk_size).min(values.len());
            let end = ((i + 1) * chunk_size).min(values.len());
            values[start..end].to_vec()
        })
        .collect()
}

fn run_analysis_loop(
    mut consumer: HeapCons<f32>,
    shared: Arc<AnalyzerShared>,
    config: AnalyzerConfig,
) {
    let fft_size = config.fft_size;
    let bin_count = fft_size / 2;

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    let window: Vec<f32> = hanning_iter(fft_size).map(|x| x as f32).collect();
    let scale = 2.0 / fft_size as f32;

    // Circular window of the most recent fft_size samples.
    let mut samples = vec![0.0f32; fft_size];
    let mut pos = 0usize;
    let mut total = 0usize;

    let mut fft_buffer = vec![Complex32::new(0.0, 0.0); fft_size];
    let mut smoothed = vec![0.0f32; bin_count];
    let mut drain = [0.0f32; 1024];

    while shared.running.load(Ordering::Acquire) {
        let mut fresh = 0usize;
        loop {
            let read = consumer.pop_slice(&mut drain);
            if read == 0 {
                break;
            }
            for &sample in &drain[..read] {
                samples[pos] = sample;
                pos = (pos + 1) % fft_size;
            }
            total = total.saturating_add(read);
            fresh += read;
        }

        if fresh > 0 && total >= fft_size {
            // Oldest-first reconstruction of the circular window.
            for i in 0..fft_size {
                let index = (pos + i) % fft_size;
                fft_buffer[i] = Complex32::new(samples[index] * window[i], 0.0);
            }

            fft.process(&mut fft_buffer);

            let tau = config.smoothing;
            let mut snapshot = Vec::with_capacity(bin_count);
            for k in 0..bin_count {
                let magnitude = fft_buffer[k].norm() * scale;
                smoothed[k] = tau * smoothed[k] + (1.0 - tau) * magnitude;
                // log10(0) is -inf, which normalize maps to exactly 0.
                snapshot.push(20.0 * smoothed[k].log10());
            }

            shared.snapshot.store(Arc::new(snapshot));
        }

        thread::sleep(Duration::from_millis(ANALYSIS_TICK_MS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-6;

    #[test]
    fn normalize_floor_is_zero() {
        assert_eq!(normalize_db(-100.0, MIN_DECIBELS, MAX_DECIBELS), 0.0);
    }

    #[test]
    fn normalize_ceiling_is_sqrt_of_nine_tenths() {
        let expected = 0.9f32.sqrt();
        assert!((normalize_db(-10.0, MIN_DECIBELS, MAX_DECIBELS) - expected).abs() < TOLERANCE);
    }

    #[test]
    fn normalize_silence_is_exactly_zero() {
        assert_eq!(
            normalize_db(f32::NEG_INFINITY, MIN_DECIBELS, MAX_DECIBELS),
            0.0
        );
    }

    #[test]
    fn normalize_clamps_to_floor_and_ceiling() {
        let at_ceiling = normalize_db(-10.0, MIN_DECIBELS, MAX_DECIBELS);
        let at_floor = normalize_db(-100.0, MIN_DECIBELS, MAX_DECIBELS);

        assert!((normalize_db(-5.0, MIN_DECIBELS, MAX_DECIBELS) - at_ceiling).abs() < TOLERANCE);
        assert!((normalize_db(-120.0, MIN_DECIBELS, MAX_DECIBELS) - at_floor).abs() < TOLERANCE);
    }

    #[test]
    fn chunks_are_ceiling_width_with_short_tail() {
        let values: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let chunks = chunk_bands(&values, 3);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(chunks[1], vec![4.0, 5.0, 6.0, 7.0]);
        assert_eq!(chunks[2], vec![8.0, 9.0]);
    }

    #[test]
    fn more_bands_than_values_yields_empty_tails() {
        let values = vec![1.0, 2.0, 3.0];
        let chunks = chunk_bands(&values, 5);

        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks[0], vec![1.0]);
        assert_eq!(chunks[1], vec![2.0]);
        assert_eq!(chunks[2], vec![3.0]);
        assert!(chunks[3].is_empty());
        assert!(chunks[4].is_empty());
    }

    #[test]
    fn empty_range_yields_all_empty_bands() {
        let chunks = chunk_bands(&[], 4);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.is_empty()));
    }

    #[test]
    fn config_rejects_non_power_of_two_fft() {
        let config = AnalyzerConfig {
            fft_size: 1000,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_out_of_range_smoothing() {
        let config = AnalyzerConfig {
            smoothing: 1.5,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_inverted_decibel_range() {
        let config = AnalyzerConfig {
            min_db: -10.0,
            max_db: -100.0,
            ..AnalyzerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(AnalyzerConfig::default().validate().is_ok());
    }
}
