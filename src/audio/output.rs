// Device output using cpal.
// Samples cross to the audio callback through a lock-free SPSC ring
// buffer; the callback substitutes silence on underrun.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use log::{error, warn};
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};

use crate::error::PlayError;

// Roughly a quarter second of queued audio at the device rate.
const MIN_RING_CAPACITY: usize = 4096;

/// The device-facing half: owns the cpal stream. Dropping it closes the
/// stream. Not sendable across threads; it stays with the creating thread.
pub struct OutputStream {
    stream: Stream,
    sample_rate: u32,
    channels: u16,
}

/// The producer half handed to the decode thread.
pub struct OutputWriter {
    producer: HeapProd<f32>,
}

impl OutputStream {
    /// Build an output stream on `device` and split off the writer that
    /// feeds it.
    pub fn open(
        device: &cpal::Device,
        config: &cpal::SupportedStreamConfig,
    ) -> Result<(Self, OutputWriter), PlayError> {
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let capacity =
            MIN_RING_CAPACITY.max(sample_rate as usize * channels as usize / 4);
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                Self::build::<f32>(device, &config.config(), consumer)?
            }
            cpal::SampleFormat::I16 => {
                Self::build::<i16>(device, &config.config(), consumer)?
            }
            cpal::SampleFormat::U16 => {
                Self::build::<u16>(device, &config.config(), consumer)?
            }
            format => return Err(PlayError::UnsupportedFormat(format)),
        };

        Ok((
            Self {
                stream,
                sample_rate,
                channels,
            },
            OutputWriter { producer },
        ))
    }

    fn build<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        mut consumer: HeapCons<f32>,
    ) -> Result<Stream, PlayError> {
        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for sample in data.iter_mut() {
                    *sample = T::from_sample(consumer.try_pop().unwrap_or(0.0));
                }
            },
            move |err| {
                error!("audio output error: {err}");
            },
            None,
        )?;

        Ok(stream)
    }

    /// Start rendering queued samples to the device.
    pub fn start(&self) -> Result<(), PlayError> {
        self.stream.play().map_err(PlayError::Stream)
    }

    /// Silence the device. Queued samples are abandoned.
    pub fn pause(&self) {
        if let Err(err) = self.stream.pause() {
            warn!("failed to pause output stream: {err}");
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl OutputWriter {
    /// Queue samples without blocking. Returns how many were accepted.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        self.producer.push_slice(samples)
    }

    /// Samples queued but not yet consumed by the device callback.
    pub fn queued(&self) -> usize {
        self.producer.occupied_len()
    }

    /// Writer over a bare ring buffer, no device attached. The returned
    /// consumer stands in for the audio callback.
    #[cfg(test)]
    pub(crate) fn with_capacity(capacity: usize) -> (Self, HeapCons<f32>) {
        let (producer, consumer) = HeapRb::<f32>::new(capacity).split();
        (Self { producer }, consumer)
    }
}
