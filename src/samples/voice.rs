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

//! One-shot voices.
//!
//! A voice is a read cursor over a shared [`SampleBuffer`]. Each trigger gets
//! its own voice, so two presses that pick the same variant play on top of each
//! other rather than sharing (and resetting) one cursor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio::buffer::SampleBuffer;

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// Represents a sound playing (or waiting to play) in the mixer.
pub struct Voice {
    /// Unique ID for this voice.
    id: u64,
    /// The audio being played. Shared with the variant pool that produced it.
    buffer: Arc<SampleBuffer>,
    /// Index of the next sample to read.
    position: usize,
}

impl Voice {
    /// Creates a new voice positioned at the start of the buffer.
    pub fn new(buffer: Arc<SampleBuffer>) -> Self {
        Self {
            id: NEXT_VOICE_ID.fetch_add(1, Ordering::Relaxed),
            buffer,
            position: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Copies up to `output.len()` samples starting at the cursor into `output`
    /// and advances the cursor. Returns the number of samples copied; anything
    /// past that in `output` is left untouched.
    pub fn read(&mut self, output: &mut [f32]) -> usize {
        let remaining = &self.buffer.samples()[self.position.min(self.buffer.samples().len())..];
        let count = remaining.len().min(output.len());
        output[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        count
    }

    /// Like [`Voice::read`] but sums into `output` instead of overwriting it.
    pub fn mix_into(&mut self, output: &mut [f32]) -> usize {
        let remaining = &self.buffer.samples()[self.position.min(self.buffer.samples().len())..];
        let count = remaining.len().min(output.len());
        for (out, sample) in output[..count].iter_mut().zip(remaining) {
            *out += *sample;
        }
        self.position += count;
        count
    }

    /// Rewinds the cursor to the beginning.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// True once every sample has been read.
    pub fn is_finished(&self) -> bool {
        self.position >= self.buffer.samples().len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.buffer.samples().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &Arc<SampleBuffer> {
        &self.buffer
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("len", &self.len())
            .finish()
    }
}
