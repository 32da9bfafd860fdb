// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Runtime configuration for the monitor.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Panel size at text scale 1.0 when none is given
pub const DEFAULT_DISPLAY_SIZE: (u16, u16) = (80, 40);

/// A file-backed display panel, given as `PATH` or `PATH@WIDTHxHEIGHT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySpec {
    pub path: PathBuf,
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplaySpecError {
    #[error("empty display path")]
    EmptyPath,
    #[error("invalid display size '{0}', expected WIDTHxHEIGHT")]
    BadSize(String),
}

impl FromStr for DisplaySpec {
    type Err = DisplaySpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, size) = match s.rsplit_once('@') {
            Some((path, size)) => (path, Some(size)),
            None => (s, None),
        };
        if path.is_empty() {
            return Err(DisplaySpecError::EmptyPath);
        }

        let (width, height) = match size {
            Some(size) => parse_size(size).ok_or_else(|| DisplaySpecError::BadSize(size.to_string()))?,
            None => DEFAULT_DISPLAY_SIZE,
        };

        Ok(Self {
            path: PathBuf::from(path),
            width,
            height,
        })
    }
}

fn parse_size(s: &str) -> Option<(u16, u16)> {
    let (w, h) = s.split_once(['x', 'X'])?;
    let width: u16 = w.trim().parse().ok()?;
    let height: u16 = h.trim().parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}

/// Everything the scheduler needs to start the three loops
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Job-state file written by the assignment controller
    pub state_path: PathBuf,
    pub poll_interval: Duration,
    pub text_interval: Duration,
    pub map_interval: Duration,
    /// Pause after each display panel within one map cycle
    pub surface_pause: Duration,
    pub displays: Vec<DisplaySpec>,
}

impl MonitorConfig {
    pub fn new(state_path: impl Into<PathBuf>) -> Self {
        let poll_interval = Duration::from_secs(1);
        Self {
            state_path: state_path.into(),
            poll_interval,
            text_interval: Duration::from_secs(1),
            map_interval: Duration::from_secs(5),
            surface_pause: poll_interval,
            displays: Vec::new(),
        }
    }
}
