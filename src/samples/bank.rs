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

//! Key code to sound mapping.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::pool::VariantPool;

/// Number of distinct virtual key codes.
pub const KEY_CODE_COUNT: usize = 256;

pub const VK_BACK: u8 = 0x08;
pub const VK_RETURN: u8 = 0x0D;
pub const VK_SPACE: u8 = 0x20;

/// Shift, control, alt and the windows keys, generic and left/right.
pub const MODIFIER_KEYS: [u8; 11] = [
    0x10, // shift
    0x11, // control
    0x12, // alt (menu)
    0x5B, // left windows
    0x5C, // right windows
    0xA0, // left shift
    0xA1, // right shift
    0xA2, // left control
    0xA3, // right control
    0xA4, // left alt
    0xA5, // right alt
];

/// The logical sounds a pack can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCategory {
    Key,
    Space,
    Enter,
    Backspace,
    Modifier,
}

impl SoundCategory {
    pub const ALL: [SoundCategory; 5] = [
        SoundCategory::Key,
        SoundCategory::Space,
        SoundCategory::Enter,
        SoundCategory::Backspace,
        SoundCategory::Modifier,
    ];

    /// The file stem used for this sound inside a pack directory.
    pub fn file_stem(&self) -> &'static str {
        match self {
            SoundCategory::Key => "key-press",
            SoundCategory::Space => "space-press",
            SoundCategory::Enter => "enter-press",
            SoundCategory::Backspace => "backspace-press",
            SoundCategory::Modifier => "modifier-press",
        }
    }

    /// The key codes routed to this category's dedicated sound. Empty for
    /// [`SoundCategory::Key`], which covers everything else.
    pub fn key_codes(&self) -> &'static [u8] {
        match self {
            SoundCategory::Key => &[],
            SoundCategory::Space => &[VK_SPACE],
            SoundCategory::Enter => &[VK_RETURN],
            SoundCategory::Backspace => &[VK_BACK],
            SoundCategory::Modifier => &MODIFIER_KEYS,
        }
    }

    /// Returns the category a key code belongs to.
    pub fn for_key(code: u8) -> SoundCategory {
        match code {
            VK_SPACE => SoundCategory::Space,
            VK_RETURN => SoundCategory::Enter,
            VK_BACK => SoundCategory::Backspace,
            c if MODIFIER_KEYS.contains(&c) => SoundCategory::Modifier,
            _ => SoundCategory::Key,
        }
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_stem())
    }
}

/// The complete key code to pool mapping for one loaded pack. Every key code
/// has an entry.
pub struct SoundBank {
    pools: Vec<Arc<VariantPool>>,
    standard: Arc<VariantPool>,
    dedicated: HashMap<SoundCategory, Arc<VariantPool>>,
}

impl SoundBank {
    /// Builds a bank where keys with a dedicated pool use it and every other
    /// key code uses `standard`.
    pub fn new(
        standard: Arc<VariantPool>,
        dedicated: HashMap<SoundCategory, Arc<VariantPool>>,
    ) -> SoundBank {
        let mut pools = vec![standard.clone(); KEY_CODE_COUNT];
        for (category, pool) in dedicated.iter() {
            for code in category.key_codes() {
                pools[*code as usize] = pool.clone();
            }
        }

        SoundBank {
            pools,
            standard,
            dedicated,
        }
    }

    /// Returns the pool for the given key code.
    pub fn get(&self, code: u8) -> &Arc<VariantPool> {
        &self.pools[code as usize]
    }

    /// The pool used by ordinary keys.
    pub fn standard(&self) -> &Arc<VariantPool> {
        &self.standard
    }

    /// Returns true if the pack supplied its own sound for `category`.
    pub fn has_dedicated(&self, category: SoundCategory) -> bool {
        self.dedicated.contains_key(&category)
    }

    /// Total memory held by distinct pools.
    pub fn memory_size(&self) -> usize {
        self.standard.memory_size()
            + self
                .dedicated
                .values()
                .map(|pool| pool.memory_size())
                .sum::<usize>()
    }
}

impl fmt::Debug for SoundBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dedicated: Vec<String> = self.dedicated.keys().map(|c| c.to_string()).collect();
        dedicated.sort();
        f.debug_struct("SoundBank")
            .field("standard_variants", &self.standard.len())
            .field("dedicated", &dedicated)
            .field("memory_kb", &(self.memory_size() / 1024))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::SampleBuffer;

    fn pool(level: f32, variants: usize) -> Arc<VariantPool> {
        Arc::new(VariantPool::with_pitch_variants(
            SampleBuffer::new(vec![level; 100], 44100, 1),
            variants,
        ))
    }

    #[test]
    fn test_category_for_key() {
        assert_eq!(SoundCategory::for_key(0x20), SoundCategory::Space);
        assert_eq!(SoundCategory::for_key(0x0D), SoundCategory::Enter);
        assert_eq!(SoundCategory::for_key(0x08), SoundCategory::Backspace);
        for code in MODIFIER_KEYS {
            assert_eq!(SoundCategory::for_key(code), SoundCategory::Modifier);
        }
        assert_eq!(SoundCategory::for_key(0x41), SoundCategory::Key);
        assert_eq!(SoundCategory::for_key(0x00), SoundCategory::Key);
        assert_eq!(SoundCategory::for_key(0xFF), SoundCategory::Key);
    }

    #[test]
    fn test_key_codes_agree_with_for_key() {
        for category in SoundCategory::ALL {
            for code in category.key_codes() {
                assert_eq!(SoundCategory::for_key(*code), category);
            }
        }
    }

    #[test]
    fn test_every_code_has_a_pool() {
        let bank = SoundBank::new(pool(0.1, 5), HashMap::new());
        for code in 0..=255u8 {
            assert!(Arc::ptr_eq(bank.get(code), bank.standard()));
        }
    }

    #[test]
    fn test_dedicated_pools_are_shared() {
        let space = pool(0.2, 1);
        let modifier = pool(0.3, 1);
        let mut dedicated = HashMap::new();
        dedicated.insert(SoundCategory::Space, space.clone());
        dedicated.insert(SoundCategory::Modifier, modifier.clone());
        let bank = SoundBank::new(pool(0.1, 5), dedicated);

        assert!(Arc::ptr_eq(bank.get(VK_SPACE), &space));
        for code in MODIFIER_KEYS {
            assert!(Arc::ptr_eq(bank.get(code), &modifier));
        }
        assert!(Arc::ptr_eq(bank.get(VK_RETURN), bank.standard()));
        assert!(Arc::ptr_eq(bank.get(VK_BACK), bank.standard()));
        assert!(bank.has_dedicated(SoundCategory::Space));
        assert!(!bank.has_dedicated(SoundCategory::Enter));
    }
}
