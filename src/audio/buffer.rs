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

//! Immutable in-memory PCM captures.
//!
//! Every sound the engine plays is decoded up front into a [`SampleBuffer`] so
//! nothing on the key path ever touches the filesystem.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hound::WavReader;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} contains no samples")]
    Empty(PathBuf),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// One decoded sound file. Samples are interleaved when `channels > 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
}

impl SampleBuffer {
    /// Creates a new sample buffer from interleaved samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> SampleBuffer {
        SampleBuffer {
            samples,
            sample_rate,
            channels: channels.max(1),
        }
    }

    /// Decodes an entire WAV file into memory, keeping its native format.
    pub fn from_wav<P: AsRef<Path>>(path: P) -> Result<SampleBuffer, BufferError> {
        let path = path.as_ref();
        let reader = WavReader::open(path)?;
        let spec = reader.spec();

        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(BufferError::UnsupportedFormat(format!(
                "{} has {} channels at {}Hz",
                path.display(),
                spec.channels,
                spec.sample_rate
            )));
        }

        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<f32>, hound::Error>>()?,
            hound::SampleFormat::Int => {
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(BufferError::UnsupportedFormat(format!(
                        "{} bits per sample",
                        spec.bits_per_sample
                    )));
                }
                // Use i64 to avoid overflow for 32-bit samples
                let scale_factor = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|sample| sample.map(|s| s as f32 * scale_factor))
                    .collect::<Result<Vec<f32>, hound::Error>>()?
            }
        };

        if samples.is_empty() {
            return Err(BufferError::Empty(path.to_path_buf()));
        }

        debug!(
            path = ?path,
            channels = spec.channels,
            sample_rate = spec.sample_rate,
            bits = spec.bits_per_sample,
            "Decoded WAV file"
        );

        Ok(SampleBuffer::new(samples, spec.sample_rate, spec.channels))
    }

    /// Decodes a WAV file and converts it to the engine's canonical layout:
    /// mono at `target_rate`.
    pub fn load_canonical<P: AsRef<Path>>(
        path: P,
        target_rate: u32,
    ) -> Result<SampleBuffer, BufferError> {
        let buffer = SampleBuffer::from_wav(path)?.to_mono();
        if buffer.sample_rate == target_rate {
            return Ok(buffer);
        }

        debug!(
            source_rate = buffer.sample_rate,
            target_rate, "Converting sample rate"
        );
        Ok(buffer.resampled(buffer.sample_rate as f64 / target_rate as f64, target_rate))
    }

    /// Averages all channels of each frame into a single channel.
    pub fn to_mono(self) -> SampleBuffer {
        if self.channels == 1 {
            return self;
        }

        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        SampleBuffer::new(samples, self.sample_rate, 1)
    }

    /// Reads through the buffer at `step` source frames per output frame and
    /// labels the result with `sample_rate`.
    ///
    /// A step above 1.0 shortens the sound (and raises its pitch when played
    /// back at the original rate); a step below 1.0 lengthens it.
    pub fn resampled(&self, step: f64, sample_rate: u32) -> SampleBuffer {
        SampleBuffer::new(
            resample_linear(&self.samples, self.channels, step),
            sample_rate,
            self.channels,
        )
    }

    /// The interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate.max(1) as f64)
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.samples.len() * std::mem::size_of::<f32>()
    }
}

/// Linear interpolation resampler. Good enough for short percussive one-shots,
/// which is all this crate ever plays.
pub fn resample_linear(samples: &[f32], channel_count: u16, step: f64) -> Vec<f32> {
    let channels = channel_count.max(1) as usize;
    let source_frames = samples.len() / channels;
    if source_frames == 0 || step <= 0.0 {
        return Vec::new();
    }

    let target_frames = (source_frames as f64 / step).ceil() as usize;
    let mut output = Vec::with_capacity(target_frames * channels);

    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 * step;
        let source_frame = source_pos.floor() as usize;
        if source_frame >= source_frames {
            break;
        }
        let frac = source_pos.fract() as f32;

        for channel in 0..channels {
            let idx0 = source_frame * channels + channel;
            let idx1 = (source_frame + 1) * channels + channel;

            let s0 = samples.get(idx0).copied().unwrap_or(0.0);
            let s1 = samples.get(idx1).copied().unwrap_or(s0);

            output.push(s0 + (s1 - s0) * frac);
        }
    }

    output
}
