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
// Core audio mixing logic that can be used by both CPAL and test implementations
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use rand::Rng;

use crate::samples::{VariantPool, Voice};

/// Maximum number of voices waiting to be picked up by the render thread.
pub const MAX_PENDING_VOICES: usize = 256;

/// Upper bound for the master volume.
pub const MAX_VOLUME: f32 = 2.0;

/// Clamps a requested volume to [0, MAX_VOLUME]. NaN is treated as silence.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, MAX_VOLUME)
}

/// Sums one-shot voices into a single mono signal.
///
/// Voices are handed over through a bounded channel so the key thread never
/// waits on the render thread. Only the render side touches the active list.
#[derive(Clone)]
pub struct AudioMixer {
    /// Sender side of the pending voice queue.
    voice_tx: Sender<Voice>,
    /// Receiver side, drained at the start of every render pass.
    voice_rx: Receiver<Voice>,
    /// Voices currently playing.
    active_voices: Arc<Mutex<Vec<Voice>>>,
    /// Number of active voices after the last render pass.
    active_count: Arc<AtomicUsize>,
    /// Voices dropped because the pending queue was full.
    dropped: Arc<AtomicU64>,
    /// Master volume, stored as f32 bits.
    volume: Arc<AtomicU32>,
    /// Sample rate
    sample_rate: u32,
}

impl AudioMixer {
    /// Creates a new audio mixer
    pub fn new(sample_rate: u32) -> Self {
        let (voice_tx, voice_rx) = crossbeam_channel::bounded(MAX_PENDING_VOICES);
        Self {
            voice_tx,
            voice_rx,
            active_voices: Arc::new(Mutex::new(Vec::with_capacity(MAX_PENDING_VOICES))),
            active_count: Arc::new(AtomicUsize::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
            volume: Arc::new(AtomicU32::new(1.0f32.to_bits())),
            sample_rate,
        }
    }

    /// Picks a random variant from `pool` and starts it from the beginning.
    /// Returns false if the voice was dropped because the queue is full.
    pub fn inject<R: Rng + ?Sized>(&self, pool: &VariantPool, rng: &mut R) -> bool {
        self.play(Voice::new(pool.choose(rng).clone()))
    }

    /// Queues a voice for playback. Never blocks, and never logs since it
    /// runs on the key thread.
    pub fn play(&self, mut voice: Voice) -> bool {
        voice.reset();
        match self.voice_tx.try_send(voice) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Renders the next block of mono samples into `output`.
    ///
    /// Exhausted voices are dropped in the same pass, so they never contribute
    /// anything after their last sample.
    pub fn render(&self, output: &mut [f32]) {
        output.fill(0.0);

        let mut active = self.active_voices.lock();
        while let Ok(voice) = self.voice_rx.try_recv() {
            active.push(voice);
        }

        active.retain_mut(|voice| {
            voice.mix_into(output);
            !voice.is_finished()
        });
        self.active_count.store(active.len(), Ordering::Release);
        drop(active);

        let volume = self.volume();
        if volume != 1.0 {
            for sample in output.iter_mut() {
                *sample *= volume;
            }
        }
    }

    /// Renders `num_frames` samples into a new vector.
    pub fn process_frames(&self, num_frames: usize) -> Vec<f32> {
        let mut frames = vec![0.0f32; num_frames];
        self.render(&mut frames);
        frames
    }

    /// Drops every active and pending voice.
    pub fn clear(&self) {
        while self.voice_rx.try_recv().is_ok() {}
        let mut active = self.active_voices.lock();
        active.clear();
        self.active_count.store(0, Ordering::Release);
    }

    /// Sets the master volume, clamped to [0, MAX_VOLUME]. Returns the value
    /// that was applied.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let volume = clamp_volume(volume);
        self.volume.store(volume.to_bits(), Ordering::Relaxed);
        volume
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    /// Number of voices that were still playing after the last render pass.
    pub fn active_voices(&self) -> usize {
        self.active_count.load(Ordering::Acquire)
    }

    /// Number of voices queued but not yet picked up by the render thread.
    pub fn pending_voices(&self) -> usize {
        self.voice_rx.len()
    }

    /// Total voices dropped on a full queue since the mixer was created.
    pub fn dropped_voices(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Gets the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl std::fmt::Debug for AudioMixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioMixer")
            .field("sample_rate", &self.sample_rate)
            .field("volume", &self.volume())
            .field("active_voices", &self.active_voices())
            .field("pending_voices", &self.pending_voices())
            .field("dropped_voices", &self.dropped_voices())
            .finish()
    }
}
