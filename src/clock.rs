// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! World-clock access in ticks.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::format::TICKS_PER_SECOND;

/// Source of the current world-clock tick
pub trait Clock: Send + Sync {
    fn now_ticks(&self) -> i64;
}

/// Wall clock expressed in ticks since the UNIX epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ticks(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(duration_to_ticks)
            .unwrap_or(0)
    }
}

/// A clock that never moves
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

#[cfg(test)]
impl Clock for FixedClock {
    fn now_ticks(&self) -> i64 {
        self.0
    }
}

/// Convert a real-time duration to whole ticks
pub fn duration_to_ticks(duration: Duration) -> i64 {
    let ticks = duration.as_millis() * TICKS_PER_SECOND as u128 / 1000;
    i64::try_from(ticks).unwrap_or(i64::MAX)
}
