// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Poller: pulls snapshots from a source into the store on a fixed cadence.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::source::SnapshotSource;
use super::store::{JobStateStore, StoreReader};

pub struct Poller<S> {
    source: S,
    store: JobStateStore,
    last_error: Option<String>,
    installed: u64,
}

impl<S: SnapshotSource> Poller<S> {
    pub fn new(source: S, store: JobStateStore) -> Self {
        Self {
            source,
            store,
            last_error: None,
            installed: 0,
        }
    }

    pub fn reader(&self) -> StoreReader {
        self.store.reader()
    }

    /// Fetch once and install on success. Returns whether a snapshot was installed.
    ///
    /// Failures leave the store untouched; stale data beats no data.
    pub fn poll_once(&mut self) -> bool {
        match self.source.fetch() {
            Ok(Some(snapshot)) => {
                if self.installed == 0 {
                    info!(
                        total_jobs = snapshot.total_jobs,
                        next_job = snapshot.next_job,
                        "first job state received"
                    );
                }
                debug!(
                    next_job = snapshot.next_job,
                    active = snapshot.active_jobs.len(),
                    "installing job state"
                );
                self.store.install(snapshot);
                self.installed += 1;
                self.last_error = None;
                true
            }
            Ok(None) => {
                trace!("no new job state");
                false
            }
            Err(e) => {
                // Only shout once per distinct failure; the source is retried every cycle
                let message = e.to_string();
                if self.last_error.as_deref() == Some(message.as_str()) {
                    debug!("job state still unavailable: {}", message);
                } else {
                    warn!("job state unavailable: {}", message);
                    self.last_error = Some(message);
                }
                false
            }
        }
    }

    /// Poll forever
    pub async fn run(mut self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.poll_once();
        }
    }
}
