// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Progress and timing statistics derived from a snapshot.
//!
//! The remaining-time estimate assumes the current number of active field
//! units stays constant. It overshoots badly when nothing is active.

use std::fmt;

use thiserror::Error;

use crate::format::format_ticks;
use crate::grid::map_index_to_position;
use crate::job::JobStateSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("finished job count {finished} outside 0..={total}")]
    InconsistentCounts { finished: i64, total: u32 },
}

/// Time left on a single active hole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingEstimate {
    /// No completed holes yet, so no expectation
    Unknown,
    /// Running for more than twice the average; the unit is probably stuck
    Awol,
    /// Expected ticks left (negative when overdue)
    Ticks(i64),
}

impl fmt::Display for RemainingEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainingEstimate::Unknown => Ok(()),
            RemainingEstimate::Awol => f.write_str("AWOL"),
            RemainingEstimate::Ticks(ticks) => f.write_str(&format_ticks(*ticks)),
        }
    }
}

/// One row of the active-jobs table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveJobRow {
    pub index: u32,
    pub position: (i64, i64),
    pub remaining: RemainingEstimate,
}

/// Aggregated view of one snapshot at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStats {
    pub total_jobs: u32,
    pub finished_jobs: u32,
    pub active_count: usize,
    pub progress_percent: u32,
    /// Smoothed mean duration of finished holes; `None` until one finishes
    pub average_job_duration: Option<i64>,
    pub elapsed: i64,
    pub remaining: i64,
    /// Active holes, ascending by index
    pub active: Vec<ActiveJobRow>,
}

impl JobStats {
    pub fn average_label(&self) -> String {
        match self.average_job_duration {
            Some(avg) => format_ticks(avg),
            None => "N/A".to_string(),
        }
    }
}

/// Compute statistics for `snapshot` as of world tick `now`
pub fn aggregate(snapshot: &JobStateSnapshot, now: i64) -> Result<JobStats, StatsError> {
    let finished = snapshot.finished_job_count();
    if finished < 0 || finished > i64::from(snapshot.total_jobs) {
        return Err(StatsError::InconsistentCounts {
            finished,
            total: snapshot.total_jobs,
        });
    }

    let progress_percent = if snapshot.total_jobs > 0 {
        (finished * 100 / i64::from(snapshot.total_jobs)) as u32
    } else {
        0
    };

    // An absent start counts as starting now
    let start = snapshot.start_time.unwrap_or(now);
    let elapsed = if snapshot.active_jobs.is_empty() {
        snapshot.stop_time.unwrap_or(now).saturating_sub(start)
    } else {
        now.saturating_sub(start)
    };

    // Smoothed with one extra zero-length sample. Record values are not
    // range-checked, so all arithmetic on them saturates.
    let average_job_duration = if snapshot.job_durations.is_empty() {
        None
    } else {
        let sum = snapshot
            .job_durations
            .iter()
            .fold(0i64, |acc, &d| acc.saturating_add(d));
        Some(sum / (snapshot.job_durations.len() as i64).saturating_add(1))
    };
    let avg = average_job_duration.unwrap_or(0);

    let in_progress: i64 = snapshot
        .active_jobs
        .values()
        .fold(0i64, |acc, &started_at| acc.saturating_add(now.saturating_sub(started_at)));
    let outstanding = i64::from(snapshot.total_jobs) - finished;
    let concurrency = snapshot.active_jobs.len().max(1) as i64;
    let remaining = outstanding
        .saturating_mul(avg)
        .saturating_sub(in_progress)
        / concurrency;

    let active = snapshot
        .active_jobs
        .iter()
        .map(|(&index, &started_at)| ActiveJobRow {
            index,
            position: map_index_to_position(index),
            remaining: remaining_for(average_job_duration, now.saturating_sub(started_at)),
        })
        .collect();

    Ok(JobStats {
        total_jobs: snapshot.total_jobs,
        finished_jobs: finished as u32,
        active_count: snapshot.active_jobs.len(),
        progress_percent,
        average_job_duration,
        elapsed,
        remaining,
        active,
    })
}

fn remaining_for(average: Option<i64>, running_for: i64) -> RemainingEstimate {
    let Some(avg) = average else {
        return RemainingEstimate::Unknown;
    };
    let left = avg.saturating_sub(running_for);
    if left < avg.saturating_neg() {
        RemainingEstimate::Awol
    } else {
        RemainingEstimate::Ticks(left)
    }
}
