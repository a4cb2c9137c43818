// Error taxonomy: loader I/O and allocation failures, playback device
// and media failures. Each top-level kind maps to its own exit code.

use std::io;
use std::path::PathBuf;

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

/// Failures while loading a file into memory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to stat {path}: {source}")]
    Metadata { path: PathBuf, source: io::Error },

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot allocate {bytes} bytes for {path}")]
    OutOfMemory { path: PathBuf, bytes: u64 },
}

/// Failures while setting up or running playback.
#[derive(Debug, Error)]
pub enum PlayError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("failed to query output device config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported device sample format {0:?}")]
    UnsupportedFormat(cpal::SampleFormat),

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    Stream(#[from] cpal::PlayStreamError),

    #[error("unrecognized media format: {0}")]
    Probe(SymphoniaError),

    #[error("no decodable audio track found")]
    NoTrack,

    #[error("failed to create decoder: {0}")]
    Decoder(SymphoniaError),

    #[error("failed to initialize resampler: {0}")]
    ResamplerInit(#[from] rubato::ResamplerConstructionError),

    #[error("resampling failed: {0}")]
    Resample(#[from] rubato::ResampleError),

    #[error("failed to read packet: {0}")]
    Demux(SymphoniaError),

    #[error("decode failed: {0}")]
    Decode(SymphoniaError),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Play(#[from] PlayError),
}

impl Error {
    /// Process exit code for this failure. 1 is load I/O, 3 is
    /// allocation, 4 is playback; 2 is what clap exits with on usage
    /// errors and must stay free.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Load(LoadError::OutOfMemory { .. }) => 3,
            Error::Load(_) => 1,
            Error::Play(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_failure_kinds() {
        let open = Error::from(LoadError::Open {
            path: "missing.ogg".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
        let oom = Error::from(LoadError::OutOfMemory {
            path: "huge.ogg".into(),
            bytes: u64::MAX,
        });
        let play = Error::from(PlayError::NoDevice);

        assert_eq!(open.exit_code(), 1);
        assert_eq!(oom.exit_code(), 3);
        assert_eq!(play.exit_code(), 4);

        // clap terminates with 2 on usage errors; no failure kind may
        // collide with it.
        for err in [&open, &oom, &play] {
            assert_ne!(err.exit_code(), 2);
        }
    }
}
