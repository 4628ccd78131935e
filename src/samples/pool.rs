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

//! Pitch-variant pools.
//!
//! Hearing the exact same click on every key gets tiring quickly, so the
//! standard key sound is rendered at a handful of pitches when a pack is
//! loaded and one of them is picked at random per press.

use std::sync::Arc;

use rand::Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::audio::buffer::SampleBuffer;

/// Number of pitch variants rendered for the standard key sound.
pub const DEFAULT_VARIANT_COUNT: usize = 5;

/// Pitch difference between neighbouring variants.
pub const PITCH_STEP: f64 = 0.08;

/// Returns `count` pitch ratios spaced `PITCH_STEP` apart and centred on 1.0.
/// With an odd count the middle ratio is exactly 1.0.
pub fn pitch_ratios(count: usize) -> Vec<f64> {
    let count = count.max(1);
    let center = (count - 1) as f64 / 2.0;
    (0..count)
        .map(|i| 1.0 + (i as f64 - center) * PITCH_STEP)
        .collect()
}

/// A fixed set of renderings of one logical sound.
///
/// Pools are immutable once built. Many key codes share one pool through an
/// `Arc`.
#[derive(Debug)]
pub struct VariantPool {
    /// Rendered variants, ordered by ascending pitch. Never empty.
    variants: Vec<Arc<SampleBuffer>>,
    /// Pitch ratio used to render each variant.
    ratios: Vec<f64>,
}

impl VariantPool {
    /// A pool with exactly one, unmodified, member.
    pub fn single(buffer: SampleBuffer) -> VariantPool {
        VariantPool {
            variants: vec![Arc::new(buffer)],
            ratios: vec![1.0],
        }
    }

    /// Renders `count` pitch-shifted copies of `base`. A count of 0 or 1 yields
    /// a single-member pool.
    pub fn with_pitch_variants(base: SampleBuffer, count: usize) -> VariantPool {
        if count <= 1 {
            return VariantPool::single(base);
        }

        let ratios = pitch_ratios(count);
        let base = Arc::new(base);
        let variants: Vec<Arc<SampleBuffer>> = ratios
            .par_iter()
            .map(|&ratio| {
                if ratio == 1.0 {
                    base.clone()
                } else {
                    Arc::new(base.resampled(ratio, base.sample_rate()))
                }
            })
            .collect();

        debug!(
            variants = variants.len(),
            base_frames = base.frames(),
            "Rendered pitch variants"
        );

        VariantPool { variants, ratios }
    }

    /// Picks one variant uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Arc<SampleBuffer> {
        if self.variants.len() == 1 {
            return &self.variants[0];
        }
        &self.variants[rng.gen_range(0..self.variants.len())]
    }

    pub fn variants(&self) -> &[Arc<SampleBuffer>] {
        &self.variants
    }

    pub fn ratios(&self) -> &[f64] {
        &self.ratios
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The sample rate shared by every variant.
    pub fn sample_rate(&self) -> u32 {
        self.variants[0].sample_rate()
    }

    pub fn channels(&self) -> u16 {
        self.variants[0].channels()
    }

    /// Returns the memory size in bytes. Variants shared with another pool
    /// are counted here too.
    pub fn memory_size(&self) -> usize {
        self.variants.iter().map(|v| v.memory_size()).sum()
    }
}
