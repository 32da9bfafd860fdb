// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Snapshot sources: where job-state records come from.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::types::{JobStateSnapshot, SnapshotError};

/// Reasons a fetch produced no usable snapshot
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed job state in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent job state in {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },
}

/// Anything that can hand over the latest job-state record.
///
/// `Ok(None)` means "nothing new"; the caller keeps whatever it had.
pub trait SnapshotSource {
    fn fetch(&mut self) -> Result<Option<JobStateSnapshot>, SourceError>;
}

/// Reads the controller's JSON record from a file (typically on a mounted disk).
///
/// The file is re-read on every fetch. A rewrite on removable media can keep
/// both its length and its mtime.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSource {
    fn fetch(&mut self) -> Result<Option<JobStateSnapshot>, SourceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            // Disk not inserted, or controller has not written yet
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SourceError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(None);
        }

        let snapshot: JobStateSnapshot =
            serde_json::from_str(&content).map_err(|source| SourceError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        snapshot.validate().map_err(|source| SourceError::Invalid {
            path: self.path.clone(),
            source,
        })?;

        Ok(Some(snapshot))
    }
}
