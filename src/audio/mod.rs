// Audio playback module
// Uses Symphonia for decoding and cpal for output

pub mod engine;
pub mod media;
pub mod output;
pub mod player;

mod resample;

pub use engine::Engine;
pub use media::Media;
pub use player::Player;
