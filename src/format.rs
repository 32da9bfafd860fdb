// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Human-readable durations.

/// World clock rate
pub const TICKS_PER_SECOND: i64 = 20;

/// Format a tick count, truncating to whole seconds
pub fn format_ticks(ticks: i64) -> String {
    if ticks < 0 {
        return format!("-{}", format_ticks(ticks.saturating_neg()));
    }
    format_seconds(ticks / TICKS_PER_SECOND)
}

/// Format whole seconds as `45s`, `01:05` or `1:01:01`
pub fn format_seconds(secs: i64) -> String {
    if secs < 0 {
        return format!("-{}", format_seconds(secs.saturating_neg()));
    }

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    } else {
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
