// Tonearm - command-line audio player
// Module declarations

pub mod audio;
pub mod buffer;
pub mod error;

pub use audio::{Engine, Media, Player};
pub use buffer::Buffer;
pub use error::{Error, LoadError, PlayError};
