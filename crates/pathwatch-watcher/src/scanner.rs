// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Recursive directory scanner
//!
//! Counts files whose extension is accepted and sums their sizes. Every call
//! walks the whole tree; nothing is cached.

use std::path::Path;
use walkdir::WalkDir;

use crate::error::ScanError;
use crate::formats::FormatSet;

/// Result of one full scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Number of matching files
    pub count: u64,
    /// Total size of matching files in bytes
    pub total_bytes: u64,
}

/// Walk `root` and summarise the non-directory entries matching `formats`
///
/// Symbolic links are not followed; a link is counted with its own size.
/// Any traversal error aborts the scan so callers never see a partial result.
pub fn scan(root: &Path, formats: &FormatSet) -> Result<ScanSummary, ScanError> {
    let mut summary = ScanSummary::default();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| ScanError::Walk {
            root: root.to_path_buf(),
            source,
        })?;

        if entry.file_type().is_dir() || !formats.matches(entry.path()) {
            continue;
        }

        let metadata = entry.metadata().map_err(|source| ScanError::Metadata {
            path: entry.path().to_path_buf(),
            source,
        })?;

        summary.count += 1;
        summary.total_bytes += metadata.len();
    }

    Ok(summary)
}
