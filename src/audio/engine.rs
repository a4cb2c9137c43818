// The playback engine instance: the default host's output device and
// its preferred stream configuration. Everything downstream (streams,
// players) is created against this handle and must not outlive it.

use cpal::traits::{DeviceTrait, HostTrait};
use log::debug;

use crate::audio::media::Media;
use crate::audio::player::Player;
use crate::error::PlayError;

pub struct Engine {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
}

impl Engine {
    /// Bind to the default output device.
    pub fn new() -> Result<Self, PlayError> {
        let host = cpal::default_host();

        let device = host.default_output_device().ok_or(PlayError::NoDevice)?;
        let config = device.default_output_config()?;

        debug!(
            "output device: {} ({} ch @ {} Hz, {:?})",
            device.name().unwrap_or_else(|_| "unknown".to_string()),
            config.channels(),
            config.sample_rate().0,
            config.sample_format(),
        );

        Ok(Self { device, config })
    }

    /// Create a player for `media`. The media handle is consumed; the
    /// player owns it from here on.
    pub fn player(&self, media: Media) -> Result<Player, PlayError> {
        Player::new(self, media)
    }

    pub(crate) fn device(&self) -> &cpal::Device {
        &self.device
    }

    pub(crate) fn config(&self) -> &cpal::SupportedStreamConfig {
        &self.config
    }
}
