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
use std::fs;
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use serde::Deserialize;

mod audio;
mod error;

pub use audio::Audio;
pub use error::ConfigError;

const DEFAULT_VOLUME: f32 = 1.0;
const DEFAULT_PACKS_DIRECTORY: &str = "packs";
const DEFAULT_SOUND_PACK: &str = "Default";
const DEFAULT_INPUT: &str = "rdev";

/// Settings for the `start` command. Every field is optional.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Settings {
    /// Whether key sounds are on at startup (default: true).
    enabled: Option<bool>,

    /// Master volume, 0.0 to 2.0 (default: 1.0).
    volume: Option<f32>,

    /// Directory holding one sub-directory per sound pack.
    packs_directory: Option<PathBuf>,

    /// The pack to load, by display name or directory name.
    sound_pack: Option<String>,

    /// Keyboard capture backend: rdev, stdin or mock.
    input: Option<String>,

    /// Audio output configuration.
    #[serde(default)]
    audio: Audio,
}

impl Settings {
    /// Parses settings from a YAML string.
    pub fn parse(yaml: &str) -> Result<Settings, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// Reads settings from a YAML file. Relative pack directories are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Settings::parse(&contents)?;

        if let (Some(packs_directory), Some(parent)) =
            (settings.packs_directory.as_ref(), path.parent())
        {
            if packs_directory.is_relative() {
                settings.packs_directory = Some(parent.join(packs_directory));
            }
        }

        Ok(settings)
    }

    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn volume(&self) -> f32 {
        self.volume.unwrap_or(DEFAULT_VOLUME)
    }

    pub fn packs_directory(&self) -> PathBuf {
        self.packs_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PACKS_DIRECTORY))
    }

    pub fn sound_pack(&self) -> &str {
        self.sound_pack.as_deref().unwrap_or(DEFAULT_SOUND_PACK)
    }

    pub fn input(&self) -> &str {
        self.input.as_deref().unwrap_or(DEFAULT_INPUT)
    }

    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Overrides the packs directory.
    pub fn set_packs_directory(&mut self, packs_directory: PathBuf) {
        self.packs_directory = Some(packs_directory);
    }

    /// Overrides the pack to load.
    pub fn set_sound_pack(&mut self, sound_pack: &str) {
        self.sound_pack = Some(sound_pack.to_string());
    }

    /// Overrides the input backend.
    pub fn set_input(&mut self, input: &str) {
        self.input = Some(input.to_string());
    }
}
