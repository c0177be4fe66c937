//! Live audio input streams.
//!
//! An [`AudioStream`] hands mono samples from a capture callback to the
//! analysis thread over a SPSC ring buffer. Real streams come from a cpal
//! input device; piped streams are fed by the caller and back the tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Device, SampleFormat};
use ringbuf::traits::{Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::audio::devices::create_stream_config;
use crate::config::CAPTURE_RING_SECONDS;
use crate::error::{Error, Result};

pub struct AudioStream {
    consumer: HeapCons<f32>,
    sample_rate: u32,
    live: Arc<AtomicBool>,
    // Keeps the capture callback running; dropping it stops the device.
    stream: Option<cpal::Stream>,
}

impl AudioStream {
    /// Open a capture stream on `device` and start it.
    ///
    /// Interleaved frames are downmixed to mono inside the callback. A
    /// stream error marks the stream dead but is otherwise only logged.
    pub fn open(device: &Device) -> Result<Self> {
        let supported = device.default_input_config()?;

        if supported.sample_format() != SampleFormat::F32 {
            return Err(Error::UnsupportedEnvironment(format!(
                "input device \"{}\" does not support F32 samples",
                device.name().unwrap_or_else(|_| "unknown".to_string())
            )));
        }

        let channels = supported.channels() as usize;
        let sample_rate = supported.sample_rate();
        let (mut producer, consumer) = ring(sample_rate.0);

        let live = Arc::new(AtomicBool::new(true));
        let live_on_error = live.clone();

        let stream_config = create_stream_config(supported.channels(), sample_rate);
        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for frame in data.chunks(channels) {
                    let sample = frame.iter().sum::<f32>() / channels as f32;
                    // Overrun drops the oldest part of the signal; the
                    // analyzer only ever wants the freshest window anyway.
                    let _ = producer.try_push(sample);
                }
            },
            move |err| {
                log::warn!("input stream error: {}", err);
                live_on_error.store(false, Ordering::Release);
            },
            None,
        )?;

        stream.play()?;

        Ok(Self {
            consumer,
            sample_rate: sample_rate.0,
            live,
            stream: Some(stream),
        })
    }

    /// A stream fed by the caller instead of a capture device.
    pub fn piped(sample_rate: u32) -> (Self, StreamFeed) {
        let (producer, consumer) = ring(sample_rate);
        let live = Arc::new(AtomicBool::new(true));

        let stream = Self {
            consumer,
            sample_rate,
            live: live.clone(),
            stream: None,
        };

        (stream, StreamFeed { producer, live })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub(crate) fn into_parts(self) -> (HeapCons<f32>, u32, Option<cpal::Stream>) {
        (self.consumer, self.sample_rate, self.stream)
    }
}

fn ring(sample_rate: u32) -> (HeapProd<f32>, HeapCons<f32>) {
    let capacity = (sample_rate as usize * CAPTURE_RING_SECONDS).max(4096);
    HeapRb::<f32>::new(capacity).split()
}

/// Writer half of a piped stream.
pub struct StreamFeed {
    producer: HeapProd<f32>,
    live: Arc<AtomicBool>,
}

impl StreamFeed {
    /// Append mono samples; returns how many fit in the ring.
    pub fn push(&mut self, samples: &[f32]) -> usize {
        self.producer.push_slice(samples)
    }

    /// End the stream. The analyzer keeps serving its last state.
    pub fn close(&self) {
        self.live.store(false, Ordering::Release);
    }
}

impl Drop for StreamFeed {
    fn drop(&mut self) {
        self.close();
    }
}
