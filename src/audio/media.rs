// Media items: a probed, decodable audio source.
// Uses Symphonia to sniff the container, pick the first audio track and
// decode packets to interleaved f32 samples.

use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use log::warn;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::PlayError;

/// A playable source: container reader plus a decoder for its first
/// audio track.
pub struct Media {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    duration: Option<Duration>,
    sample_buf: Option<SampleBuffer<f32>>,
}

impl std::fmt::Debug for Media {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Media")
            .field("track_id", &self.track_id)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

impl Media {
    /// Open a media item backed by a file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PlayError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| PlayError::Probe(SymphoniaError::IoError(e)))?;

        let ext = path.extension().and_then(|e| e.to_str());
        Self::probe(Box::new(file), ext)
    }

    /// Open a media item over bytes already loaded into memory.
    ///
    /// `extension` is an optional format hint, usually taken from the
    /// original file name.
    pub fn from_buffer(bytes: Vec<u8>, extension: Option<&str>) -> Result<Self, PlayError> {
        Self::probe(Box::new(Cursor::new(bytes)), extension)
    }

    fn probe(source: Box<dyn MediaSource>, extension: Option<&str>) -> Result<Self, PlayError> {
        let mss = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(PlayError::Probe)?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(PlayError::NoTrack)?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);

        let duration = track
            .codec_params
            .n_frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / sample_rate as f64));

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(PlayError::Decoder)?;

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            duration,
            sample_buf: None,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Track duration, when the container declares it.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Decode the next block of interleaved f32 samples.
    ///
    /// Returns `Ok(None)` at end of stream. Corrupt packets are skipped
    /// with a warning rather than ending playback.
    pub fn decode_next(&mut self) -> Result<Option<Vec<f32>>, PlayError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(PlayError::Demux(e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let frames = decoded.capacity() as u64;
                    let needed = decoded.capacity() * spec.channels.count();

                    // Packet sizes can grow mid-stream; resize the staging
                    // buffer when they do.
                    if self.sample_buf.as_ref().map_or(true, |b| b.capacity() < needed) {
                        self.sample_buf = None;
                    }
                    let buf = self
                        .sample_buf
                        .get_or_insert_with(|| SampleBuffer::new(frames, spec));
                    buf.copy_interleaved_ref(decoded);
                    return Ok(Some(buf.samples().to_vec()));
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("skipping undecodable packet: {e}");
                    continue;
                }
                Err(e) => return Err(PlayError::Decode(e)),
            }
        }
    }
}
