// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Job-state record as written by the assignment controller.
//!
//! The monitor never builds these itself; they arrive through a
//! [`SnapshotSource`](super::source::SnapshotSource) and are validated before
//! being installed, so a half-valid record is never shown.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{CellStatus, GridCell};

/// One consistent read of the controller's job state.
///
/// All timestamps and durations are world-clock ticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStateSnapshot {
    /// Number of holes in the quarry
    pub total_jobs: u32,

    /// 1-based index of the next unclaimed hole
    pub next_job: u32,

    /// Holes currently being dug, keyed by index, valued by start tick.
    ///
    /// Kept ordered so per-job tables come out sorted by index.
    pub active_jobs: BTreeMap<u32, i64>,

    /// Durations of completed holes, in completion order
    #[serde(default)]
    pub job_durations: Vec<i64>,

    /// Tick at which work began
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,

    /// Tick at which all work ceased
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<i64>,

    /// Tick at which the controller wrote this record, if it says so
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<i64>,
}

/// Largest quarry the monitor accepts. Every map cycle walks all holes on the
/// single runtime thread.
pub const MAX_TOTAL_JOBS: u32 = 1_000_000;

/// Invariant violations that make a snapshot unusable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("totalJobs {total_jobs} exceeds the supported maximum of {max}")]
    TooManyJobs { total_jobs: u32, max: u32 },

    #[error("nextJob {next_job} outside 1..={max}")]
    NextJobOutOfRange { next_job: u32, max: u64 },

    #[error("active job {index} has not been claimed (nextJob {next_job})")]
    UnclaimedActiveJob { index: u32, next_job: u32 },
}

impl JobStateSnapshot {
    /// Create an empty record for `total_jobs` holes with nothing claimed
    pub fn new(total_jobs: u32) -> Self {
        Self {
            total_jobs,
            next_job: 1,
            active_jobs: BTreeMap::new(),
            job_durations: Vec::new(),
            start_time: None,
            stop_time: None,
            captured_at: None,
        }
    }

    /// Number of claimed holes (`nextJob - 1`)
    pub fn claimed_job_count(&self) -> u32 {
        self.next_job.saturating_sub(1)
    }

    /// Claimed holes that are no longer active.
    ///
    /// Signed, so an inconsistent record shows up as a negative count instead
    /// of wrapping.
    pub fn finished_job_count(&self) -> i64 {
        i64::from(self.claimed_job_count()) - self.active_jobs.len() as i64
    }

    /// Check the record against the controller's invariants
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.total_jobs > MAX_TOTAL_JOBS {
            return Err(SnapshotError::TooManyJobs {
                total_jobs: self.total_jobs,
                max: MAX_TOTAL_JOBS,
            });
        }

        let max = u64::from(self.total_jobs) + 1;
        if self.next_job < 1 || u64::from(self.next_job) > max {
            return Err(SnapshotError::NextJobOutOfRange {
                next_job: self.next_job,
                max,
            });
        }

        // Every key must lie in 1..nextJob; this also bounds |activeJobs|.
        if let Some(&index) = self
            .active_jobs
            .keys()
            .find(|&&index| index < 1 || index >= self.next_job)
        {
            return Err(SnapshotError::UnclaimedActiveJob {
                index,
                next_job: self.next_job,
            });
        }

        Ok(())
    }

    /// Status of a single hole
    pub fn status_of(&self, index: u32) -> CellStatus {
        if self.active_jobs.contains_key(&index) {
            CellStatus::Active
        } else if index < self.next_job {
            CellStatus::Done
        } else {
            CellStatus::Pending
        }
    }

    /// Every hole in the quarry, placed on the lattice
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (1..=self.total_jobs).map(move |index| GridCell::new(index, self.status_of(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> JobStateSnapshot {
        let mut snapshot = JobStateSnapshot::new(100);
        snapshot.next_job = 21;
        snapshot.active_jobs.insert(5, 1000);
        snapshot.active_jobs.insert(12, 1000);
        snapshot
    }

    #[test]
    fn test_finished_job_count() {
        let snapshot = sample();
        assert_eq!(snapshot.finished_job_count(), 18);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_deserialize_controller_record() {
        let json = r#"{
            "totalJobs": 100,
            "nextJob": 21,
            "activeJobs": {"5": 1000, "12": 1200},
            "jobDurations": [400, 600],
            "startTime": 200
        }"#;

        let snapshot: JobStateSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.total_jobs, 100);
        assert_eq!(snapshot.active_jobs.get(&12), Some(&1200));
        assert_eq!(snapshot.job_durations, vec![400, 600]);
        assert_eq!(snapshot.start_time, Some(200));
        assert_eq!(snapshot.stop_time, None);
    }

    #[test]
    fn test_missing_active_jobs_is_rejected() {
        let json = r#"{"totalJobs": 10, "nextJob": 1}"#;
        assert!(serde_json::from_str::<JobStateSnapshot>(json).is_err());
    }

    #[test]
    fn test_optional_fields_skipped() {
        let json = serde_json::to_string(&JobStateSnapshot::new(4)).unwrap();
        assert!(!json.contains("startTime"));
        assert!(!json.contains("capturedAt"));
        assert!(json.contains("\"nextJob\":1"));
    }

    #[test]
    fn test_next_job_out_of_range() {
        let mut snapshot = JobStateSnapshot::new(10);
        snapshot.next_job = 12;
        assert_eq!(
            snapshot.validate(),
            Err(SnapshotError::NextJobOutOfRange { next_job: 12, max: 11 })
        );

        snapshot.next_job = 0;
        assert!(snapshot.validate().is_err());

        snapshot.next_job = 11;
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_active_job_must_be_claimed() {
        let mut snapshot = JobStateSnapshot::new(10);
        snapshot.next_job = 4;
        snapshot.active_jobs.insert(4, 0);
        assert_eq!(
            snapshot.validate(),
            Err(SnapshotError::UnclaimedActiveJob { index: 4, next_job: 4 })
        );
    }

    #[test]
    fn test_cell_status() {
        let snapshot = sample();
        assert_eq!(snapshot.status_of(5), CellStatus::Active);
        assert_eq!(snapshot.status_of(6), CellStatus::Done);
        assert_eq!(snapshot.status_of(21), CellStatus::Pending);
        assert_eq!(snapshot.cells().count(), 100);
        assert_eq!(
            snapshot.cells().filter(|c| c.status == CellStatus::Done).count(),
            18
        );
    }

    #[test]
    fn test_total_jobs_is_bounded() {
        let mut snapshot = JobStateSnapshot::new(MAX_TOTAL_JOBS);
        assert!(snapshot.validate().is_ok());

        snapshot.total_jobs = u32::MAX;
        assert_eq!(
            snapshot.validate(),
            Err(SnapshotError::TooManyJobs {
                total_jobs: u32::MAX,
                max: MAX_TOTAL_JOBS
            })
        );
    }
}
