// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;

use crate::config;

pub mod buffer;
pub mod cpal;
pub mod mixer;
pub mod mock;

pub use buffer::{BufferError, SampleBuffer};
pub use mixer::{clamp_volume, AudioMixer, MAX_VOLUME};

/// A running audio output that pulls samples from a mixer on its own thread.
pub trait Output: Send {
    /// Stops pulling from the mixer and releases the device. Safe to call more
    /// than once.
    fn stop(&mut self);

    /// The name of the underlying device.
    fn name(&self) -> &str;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Opens the output device named in the configuration and starts streaming
/// the mixer to it. Device names starting with "mock" open a mock device.
pub fn open_output(
    config: &config::Audio,
    mixer: AudioMixer,
) -> Result<Box<dyn Output>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Box::new(mock::Device::start(
            mixer,
            device,
            config.buffer_duration(),
        )));
    }

    Ok(Box::new(cpal::Device::start(
        mixer,
        device,
        config.buffer_duration(),
    )?))
}
