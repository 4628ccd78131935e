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

//! Sound pack loading.
//!
//! Everything expensive happens here: file I/O, format conversion and pitch
//! variant rendering. The result is a finished [`SoundBank`] that the engine
//! publishes in one step.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{error, info, warn};

use super::bank::{SoundBank, SoundCategory};
use super::error::LoadError;
use super::pool::{VariantPool, DEFAULT_VARIANT_COUNT};
use crate::audio::buffer::SampleBuffer;

/// Loads sound pack directories into sound banks.
#[derive(Debug, Clone)]
pub struct PackLoader {
    /// Sample rate every loaded sound is converted to (matches the mixer).
    target_sample_rate: u32,
    /// How many pitch variants to render for the standard key sound.
    variant_count: usize,
}

impl PackLoader {
    /// Creates a new pack loader.
    pub fn new(target_sample_rate: u32) -> Self {
        Self {
            target_sample_rate,
            variant_count: DEFAULT_VARIANT_COUNT,
        }
    }

    /// Overrides the number of pitch variants.
    pub fn with_variant_count(mut self, variant_count: usize) -> Self {
        self.variant_count = variant_count.max(1);
        self
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Returns the WAV path for a sound inside a pack directory.
    pub fn sound_path(directory: &Path, category: SoundCategory) -> PathBuf {
        directory.join(format!("{}.wav", category.file_stem()))
    }

    /// Loads the pack at `directory`. Fails only when the base key sound is
    /// missing or unreadable; other sounds fall back to the standard pool.
    pub fn load(&self, directory: &Path, wants_variants: bool) -> Result<SoundBank, LoadError> {
        if !directory.is_dir() {
            error!(path = ?directory, "Sound pack directory not found");
            return Err(LoadError::MissingDirectory(directory.to_path_buf()));
        }

        let start = Instant::now();
        let mut sounds = self.load_sounds(directory)?;

        let base = match sounds.remove(&SoundCategory::Key) {
            Some(base) => base,
            None => {
                let path = Self::sound_path(directory, SoundCategory::Key);
                error!(path = ?path, "Could not load base key sound, sound pack loading failed");
                return Err(LoadError::MissingBaseFile(path));
            }
        };

        let variant_count = if wants_variants {
            self.variant_count
        } else {
            1
        };
        let standard = Arc::new(VariantPool::with_pitch_variants(base, variant_count));

        // Dedicated sounds never get pitch variants so they stay recognizable.
        let dedicated: HashMap<SoundCategory, Arc<VariantPool>> = sounds
            .into_iter()
            .map(|(category, buffer)| (category, Arc::new(VariantPool::single(buffer))))
            .collect();

        let bank = SoundBank::new(standard, dedicated);

        info!(
            path = ?directory,
            variants = bank.standard().len(),
            bank = ?bank,
            elapsed_ms = start.elapsed().as_millis(),
            "Sound pack loaded"
        );

        Ok(bank)
    }

    /// Reads every sound the pack provides. Missing or corrupt optional sounds
    /// are logged and left out; a corrupt base sound is an error.
    fn load_sounds(
        &self,
        directory: &Path,
    ) -> Result<HashMap<SoundCategory, SampleBuffer>, LoadError> {
        let results: Vec<(SoundCategory, PathBuf, Option<Result<SampleBuffer, _>>)> =
            SoundCategory::ALL[..]
                .par_iter()
                .map(|category| {
                    let path = Self::sound_path(directory, *category);
                    if !path.is_file() {
                        return (*category, path, None);
                    }
                    let loaded = SampleBuffer::load_canonical(&path, self.target_sample_rate);
                    (*category, path, Some(loaded))
                })
                .collect();

        let mut sounds = HashMap::new();
        for (category, path, result) in results {
            match result {
                Some(Ok(buffer)) => {
                    info!(
                        path = ?path,
                        sound = %category,
                        duration_ms = buffer.duration().as_millis(),
                        "Sound loaded"
                    );
                    sounds.insert(category, buffer);
                }
                Some(Err(e)) if category == SoundCategory::Key => {
                    error!(path = ?path, err = %e, "Failed to load base key sound");
                    return Err(LoadError::Buffer { path, source: e });
                }
                Some(Err(e)) => {
                    warn!(path = ?path, err = %e, "Failed to load sound, using the standard key sound");
                }
                None if category == SoundCategory::Key => {}
                None => {
                    warn!(path = ?path, "Sound file not found, using the standard key sound");
                }
            }
        }

        Ok(sounds)
    }
}
