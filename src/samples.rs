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

//! Key-triggered sample playback data.
//!
//! This module provides:
//! - Sound pack loading (in-memory for zero-latency playback)
//! - Pitch variant rendering for the standard key sound
//! - The key code to sound mapping
//! - One-shot voices consumed by the mixer

mod bank;
mod error;
mod loader;
mod pool;
mod voice;

pub use bank::{
    SoundBank, SoundCategory, KEY_CODE_COUNT, MODIFIER_KEYS, VK_BACK, VK_RETURN, VK_SPACE,
};
pub use error::LoadError;
pub use loader::PackLoader;
pub use pool::{pitch_ratios, VariantPool, DEFAULT_VARIANT_COUNT, PITCH_STEP};
pub use voice::Voice;
