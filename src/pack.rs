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

//! Sound pack metadata and discovery.
//!
//! A pack is a directory of WAV files named by role plus a `pack.json`
//! describing it.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Name of the metadata file inside a pack directory.
pub const METADATA_FILE: &str = "pack.json";

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metadata in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The contents of `pack.json`.
///
/// Explicit nulls are accepted anywhere and read as empty strings, or `true`
/// for `HasPitchVariants`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "PascalCase", default)]
pub struct PackMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cover_image: String,
    #[serde(deserialize_with = "null_as_true")]
    pub has_pitch_variants: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

impl Default for PackMetadata {
    fn default() -> Self {
        PackMetadata {
            display_name: "Unknown Pack".to_string(),
            description: String::new(),
            cover_image: String::new(),
            has_pitch_variants: true,
        }
    }
}

/// A discovered sound pack.
#[derive(Clone, Debug, PartialEq)]
pub struct PackInfo {
    metadata: PackMetadata,
    directory: PathBuf,
}

impl PackInfo {
    /// Reads the metadata of the pack in `directory`. A blank display name is
    /// replaced by the directory name.
    pub fn load(directory: &Path) -> Result<PackInfo, PackError> {
        let path = directory.join(METADATA_FILE);
        let contents = fs::read_to_string(&path).map_err(|source| PackError::Read {
            path: path.clone(),
            source,
        })?;
        let mut metadata: PackMetadata =
            serde_json::from_str(&contents).map_err(|source| PackError::Parse { path, source })?;
        if metadata.display_name.trim().is_empty() {
            metadata.display_name = directory_name(directory);
        }

        Ok(PackInfo {
            metadata,
            directory: directory.to_path_buf(),
        })
    }

    /// Describes a directory that has no metadata file, using defaults and the
    /// directory name as display name.
    pub fn unlabelled(directory: &Path) -> PackInfo {
        let metadata = PackMetadata {
            display_name: directory_name(directory),
            ..PackMetadata::default()
        };
        PackInfo {
            metadata,
            directory: directory.to_path_buf(),
        }
    }

    /// Like [`PackInfo::load`], but falls back to [`PackInfo::unlabelled`]
    /// when the metadata is missing or unreadable.
    pub fn load_or_default(directory: &Path) -> PackInfo {
        match PackInfo::load(directory) {
            Ok(info) => info,
            Err(e) => {
                warn!(path = ?directory, err = %e, "Using default pack metadata");
                PackInfo::unlabelled(directory)
            }
        }
    }

    pub fn display_name(&self) -> &str {
        &self.metadata.display_name
    }

    pub fn description(&self) -> &str {
        &self.metadata.description
    }

    pub fn has_pitch_variants(&self) -> bool {
        self.metadata.has_pitch_variants
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn metadata(&self) -> &PackMetadata {
        &self.metadata
    }

    /// The cover image path, if the pack names one and it exists.
    pub fn resolved_cover_image(&self) -> Option<PathBuf> {
        if self.metadata.cover_image.is_empty() {
            return None;
        }
        let path = self.directory.join(&self.metadata.cover_image);
        path.is_file().then_some(path)
    }

    /// Returns true if `name` is this pack's display name or directory name.
    pub fn matches(&self, name: &str) -> bool {
        self.display_name() == name
            || self
                .directory
                .file_name()
                .is_some_and(|dir_name| dir_name == name)
    }
}

fn directory_name(directory: &Path) -> String {
    directory
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| PackMetadata::default().display_name)
}

impl fmt::Display for PackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, pitch variants: {})",
            self.display_name(),
            self.directory.display(),
            if self.has_pitch_variants() { "yes" } else { "no" }
        )?;
        if !self.description().is_empty() {
            write!(f, ": {}", self.description())?;
        }
        Ok(())
    }
}

/// Lists every sub-directory of `root` with readable pack metadata, sorted by
/// display name. Directories with broken metadata are logged and skipped.
pub fn discover_packs(root: &Path) -> Result<Vec<PackInfo>, PackError> {
    let entries = fs::read_dir(root).map_err(|source| PackError::Read {
        path: root.to_path_buf(),
        source,
    })?;

    let mut packs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() || !path.join(METADATA_FILE).is_file() {
            continue;
        }
        match PackInfo::load(&path) {
            Ok(pack) => packs.push(pack),
            Err(e) => warn!(path = ?path, err = %e, "Skipping sound pack"),
        }
    }

    packs.sort_by(|a, b| a.display_name().cmp(b.display_name()));
    Ok(packs)
}

/// Finds a pack under `root` by display name or directory name. A directory
/// without metadata still matches by name.
pub fn find_pack(root: &Path, name: &str) -> Result<Option<PackInfo>, PackError> {
    if let Some(pack) = discover_packs(root)?.into_iter().find(|p| p.matches(name)) {
        return Ok(Some(pack));
    }

    let directory = root.join(name);
    if directory.is_dir() {
        return Ok(Some(PackInfo::load_or_default(&directory)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_metadata(dir: &Path, json: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(METADATA_FILE), json).unwrap();
    }

    #[test]
    fn test_parse_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write_metadata(
            dir.path(),
            r#"{"DisplayName": "Cream", "Description": "Linear switches", "CoverImage": "cover.png", "HasPitchVariants": false}"#,
        );

        let pack = PackInfo::load(dir.path()).unwrap();
        assert_eq!(pack.display_name(), "Cream");
        assert_eq!(pack.description(), "Linear switches");
        assert!(!pack.has_pitch_variants());
        // Cover named but missing on disk.
        assert_eq!(pack.resolved_cover_image(), None);

        fs::write(dir.path().join("cover.png"), b"png").unwrap();
        assert_eq!(
            pack.resolved_cover_image(),
            Some(dir.path().join("cover.png"))
        );
    }

    #[test]
    fn test_metadata_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_metadata(dir.path(), "{}");

        let pack = PackInfo::load(dir.path()).unwrap();
        assert_eq!(pack.display_name(), "Unknown Pack");
        assert!(pack.has_pitch_variants());
        assert_eq!(pack.resolved_cover_image(), None);
    }

    #[test]
    fn test_null_fields() {
        let dir = tempfile::tempdir().unwrap();
        write_metadata(
            dir.path(),
            r#"{"DisplayName": "Cream", "Description": null, "CoverImage": null, "HasPitchVariants": null}"#,
        );

        let pack = PackInfo::load(dir.path()).unwrap();
        assert_eq!(pack.display_name(), "Cream");
        assert_eq!(pack.description(), "");
        assert!(pack.has_pitch_variants());
        assert_eq!(pack.resolved_cover_image(), None);
    }

    #[test]
    fn test_blank_display_name_uses_directory() {
        let root = tempfile::tempdir().unwrap();
        write_metadata(
            &root.path().join("blank"),
            r#"{"DisplayName": "  ", "HasPitchVariants": false}"#,
        );
        write_metadata(&root.path().join("nameless"), r#"{"DisplayName": null}"#);

        let blank = PackInfo::load(&root.path().join("blank")).unwrap();
        assert_eq!(blank.display_name(), "blank");
        assert!(!blank.has_pitch_variants());

        let nameless = PackInfo::load(&root.path().join("nameless")).unwrap();
        assert_eq!(nameless.display_name(), "nameless");
    }

    #[test]
    fn test_discover_packs_with_null_description() {
        let root = tempfile::tempdir().unwrap();
        write_metadata(
            &root.path().join("cream"),
            r#"{"DisplayName": "Cream", "Description": null, "CoverImage": "", "HasPitchVariants": true}"#,
        );

        let packs = discover_packs(root.path()).unwrap();
        assert_eq!(packs.len(), 1);
        assert_eq!(packs[0].display_name(), "Cream");

        let found = find_pack(root.path(), "Cream").unwrap().unwrap();
        assert_eq!(found.directory(), root.path().join("cream"));
        assert_eq!(found.description(), "");
    }

    #[test]
    fn test_invalid_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write_metadata(dir.path(), "{ not json");
        assert!(matches!(
            PackInfo::load(dir.path()),
            Err(PackError::Parse { .. })
        ));

        let pack = PackInfo::load_or_default(dir.path());
        assert!(pack.has_pitch_variants());
    }

    #[test]
    fn test_discover_packs() {
        let root = tempfile::tempdir().unwrap();
        write_metadata(&root.path().join("b"), r#"{"DisplayName": "Zebra"}"#);
        write_metadata(&root.path().join("a"), r#"{"DisplayName": "Alpaca"}"#);
        write_metadata(&root.path().join("broken"), "nope");
        fs::create_dir_all(root.path().join("no-metadata")).unwrap();
        fs::write(root.path().join("stray.txt"), b"").unwrap();

        let packs = discover_packs(root.path()).unwrap();
        let names: Vec<&str> = packs.iter().map(|p| p.display_name()).collect();
        assert_eq!(names, vec!["Alpaca", "Zebra"]);
    }

    #[test]
    fn test_find_pack() {
        let root = tempfile::tempdir().unwrap();
        write_metadata(&root.path().join("cream"), r#"{"DisplayName": "Cream"}"#);
        fs::create_dir_all(root.path().join("plain")).unwrap();

        let by_display = find_pack(root.path(), "Cream").unwrap().unwrap();
        assert_eq!(by_display.directory(), root.path().join("cream"));

        let by_dir = find_pack(root.path(), "cream").unwrap().unwrap();
        assert_eq!(by_dir.display_name(), "Cream");

        let unlabelled = find_pack(root.path(), "plain").unwrap().unwrap();
        assert_eq!(unlabelled.display_name(), "plain");
        assert!(unlabelled.has_pitch_variants());

        assert!(find_pack(root.path(), "missing").unwrap().is_none());
    }
}
