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
use std::path::PathBuf;

use crate::audio::buffer::BufferError;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("base key sound {0} not found")]
    MissingBaseFile(PathBuf),

    #[error("pack directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("failed to load {path}: {source}")]
    Buffer {
        path: PathBuf,
        #[source]
        source: BufferError,
    },

    #[error("load of {0} was superseded by a newer load")]
    Superseded(PathBuf),
}
