// The playback driver. A decode thread pulls sample blocks from the
// media item, adapts them to the device layout and feeds the output
// ring buffer. Stop and finished signals cross as atomics; a decode
// failure is parked in a mutex for the caller to collect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error};
use parking_lot::Mutex;

use crate::audio::engine::Engine;
use crate::audio::media::Media;
use crate::audio::output::{OutputStream, OutputWriter};
use crate::audio::resample::RateConverter;
use crate::error::PlayError;

const WAIT_POLL: Duration = Duration::from_millis(10);
const WRITE_BACKOFF: Duration = Duration::from_millis(1);
const DRAIN_POLL: Duration = Duration::from_millis(5);

struct Shared {
    stop: AtomicBool,
    finished: AtomicBool,
    failure: Mutex<Option<PlayError>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }
}

/// Owns one playback of one media item. Stops and joins its decode
/// thread on Drop, so handles are released on every exit path.
pub struct Player {
    output: OutputStream,
    shared: Arc<Shared>,
    job: Option<DecodeJob>,
    thread: Option<JoinHandle<()>>,
}

impl Player {
    pub(crate) fn new(engine: &Engine, media: Media) -> Result<Self, PlayError> {
        let (output, writer) = OutputStream::open(engine.device(), engine.config())?;

        let resampler = if media.sample_rate() != output.sample_rate() {
            Some(RateConverter::new(
                media.sample_rate(),
                output.sample_rate(),
                output.channels() as usize,
            )?)
        } else {
            None
        };

        let job = DecodeJob {
            media,
            writer,
            resampler,
            out_channels: output.channels() as usize,
        };

        Ok(Self {
            output,
            shared: Arc::new(Shared::new()),
            job: Some(job),
            thread: None,
        })
    }

    /// Start the device stream and the decode thread. Calling play on an
    /// already-started player is a no-op.
    pub fn play(&mut self) -> Result<(), PlayError> {
        let Some(job) = self.job.take() else {
            return Ok(());
        };

        self.output.start()?;

        let shared = Arc::clone(&self.shared);
        self.thread = Some(thread::spawn(move || job.run(&shared)));

        Ok(())
    }

    /// Block until playback finishes or `timeout` elapses, whichever
    /// comes first. Returns true if the track played to completion.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.shared.finished.load(Ordering::Acquire) {
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(WAIT_POLL);
        }
        self.shared.finished.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::Acquire)
    }

    /// Stop playback: signal the decode thread, join it, silence the
    /// stream. Idempotent.
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("decode thread panicked");
            }
        }
        self.output.pause();
    }

    /// A decode failure raised after `play()`, if any. Stops playback
    /// first so the verdict is final.
    pub fn take_failure(&mut self) -> Option<PlayError> {
        self.stop();
        self.shared.failure.lock().take()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

struct DecodeJob {
    media: Media,
    writer: OutputWriter,
    resampler: Option<RateConverter>,
    out_channels: usize,
}

impl DecodeJob {
    fn run(mut self, shared: &Shared) {
        let in_rate = self.media.sample_rate();
        let in_channels = self.media.channels();

        if let Some(duration) = self.media.duration() {
            debug!("decoding {in_channels} ch @ {in_rate} Hz, {duration:.1?}");
        }

        while !shared.stop.load(Ordering::Relaxed) {
            let block = match self.media.decode_next() {
                Ok(Some(block)) => block,
                Ok(None) => {
                    // The converter holds back a partial chunk; push it
                    // out before declaring the end.
                    let tail = match self.resampler.as_mut().map(RateConverter::flush) {
                        Some(Ok(tail)) => tail,
                        Some(Err(err)) => {
                            error!("playback stopped: {err}");
                            *shared.failure.lock() = Some(err.into());
                            Vec::new()
                        }
                        None => Vec::new(),
                    };
                    self.write_all(&tail, shared);
                    break;
                }
                Err(err) => {
                    error!("playback stopped: {err}");
                    *shared.failure.lock() = Some(err);
                    break;
                }
            };

            let block = adapt_channels(&block, in_channels, self.out_channels);
            let block = match &mut self.resampler {
                Some(rc) => match rc.process(&block) {
                    Ok(converted) => converted,
                    Err(err) => {
                        error!("playback stopped: {err}");
                        *shared.failure.lock() = Some(err.into());
                        break;
                    }
                },
                None => block,
            };

            if !self.write_all(&block, shared) {
                break;
            }
        }

        // Let the device drain what is queued before declaring the end.
        while !shared.stop.load(Ordering::Relaxed) && self.writer.queued() > 0 {
            thread::sleep(DRAIN_POLL);
        }

        shared.finished.store(true, Ordering::Release);
    }

    /// Queue a whole block, backing off while the ring is full. Returns
    /// false if a stop request interrupted the write.
    fn write_all(&mut self, samples: &[f32], shared: &Shared) -> bool {
        let mut rest = samples;
        while !rest.is_empty() {
            if shared.stop.load(Ordering::Relaxed) {
                return false;
            }
            let written = self.writer.write(rest);
            if written == 0 {
                thread::sleep(WRITE_BACKOFF);
            } else {
                rest = &rest[written..];
            }
        }
        true
    }
}

/// Re-lay frames for a different channel count: mono fans out, downmix
/// to mono averages, anything else copies matching channels and zero-fills.
fn adapt_channels(input: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return input.to_vec();
    }

    let frames = input.len() / from;
    let mut out = Vec::with_capacity(frames * to);

    for frame in input.chunks_exact(from) {
        match (from, to) {
            (1, _) => out.extend(std::iter::repeat(frame[0]).take(to)),
            (_, 1) => out.push(frame.iter().sum::<f32>() / from as f32),
            _ => {
                for ch in 0..to {
                    out.push(frame.get(ch).copied().unwrap_or(0.0));
                }
            }
        }
    }

    out
}
