// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Latest-value store for job-state snapshots.
//!
//! One writer (the poller) replaces the whole snapshot; any number of readers
//! see the most recently installed one. Snapshots are shared behind `Arc` and
//! never mutated after install, so readers cannot observe a partial update
//! and never wait on the writer beyond the pointer swap.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use super::types::JobStateSnapshot;
use crate::clock::{duration_to_ticks, Clock};

/// A snapshot together with the moment it was installed
#[derive(Debug)]
pub struct Installed {
    pub snapshot: JobStateSnapshot,
    pub installed_at: Instant,
}

impl Installed {
    /// Current world tick as seen from this snapshot.
    ///
    /// If the controller stamped the record, advance that stamp by the real
    /// time since install; otherwise ask the clock.
    pub fn world_now(&self, clock: &dyn Clock) -> i64 {
        match self.snapshot.captured_at {
            Some(captured_at) => {
                captured_at.saturating_add(duration_to_ticks(self.installed_at.elapsed()))
            }
            None => clock.now_ticks(),
        }
    }
}

type Slot = Option<Arc<Installed>>;

/// Write side of the store
pub struct JobStateStore {
    tx: watch::Sender<Slot>,
}

impl JobStateStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the current snapshot.
    ///
    /// Re-installing an identical record keeps the original install, so the
    /// `capturedAt` timebase keeps advancing across polls of an unchanged file.
    pub fn install(&self, snapshot: JobStateSnapshot) {
        let unchanged = self
            .tx
            .borrow()
            .as_ref()
            .is_some_and(|current| current.snapshot == snapshot);
        if unchanged {
            return;
        }

        let installed = Arc::new(Installed {
            snapshot,
            installed_at: Instant::now(),
        });
        self.tx.send_replace(Some(installed));
    }

    /// A read handle for a renderer task
    pub fn reader(&self) -> StoreReader {
        StoreReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for JobStateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side of the store: `current()` is the latest installed snapshot, or
/// `None` before the first successful poll
#[derive(Clone)]
pub struct StoreReader {
    rx: watch::Receiver<Slot>,
}

impl StoreReader {
    pub fn current(&self) -> Option<Arc<Installed>> {
        self.rx.borrow().clone()
    }
}
