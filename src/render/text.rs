// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Text renderer: progress summary plus the table of active holes.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, MoveTo, MoveToNextLine, Show},
    execute, queue,
    style::Print,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

use crate::clock::Clock;
use crate::format::format_ticks;
use crate::job::StoreReader;
use crate::stats::{aggregate, JobStats};

/// Column widths of the active-jobs table
const COL_JOB: usize = 5;
const COL_POS: usize = 12;
const COL_REMAINING: usize = 9;

/// A line-addressable text output
pub trait TextSurface {
    fn clear(&mut self) -> io::Result<()>;
    fn move_cursor(&mut self, row: u16, col: u16) -> io::Result<()>;
    fn write_line(&mut self, text: &str) -> io::Result<()>;

    /// Push buffered output to the device
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The controlling terminal, switched to the alternate screen for our lifetime
pub struct TerminalSurface {
    out: Stdout,
}

impl TerminalSurface {
    pub fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(Self { out })
    }
}

impl TextSurface for TerminalSurface {
    fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))
    }

    fn move_cursor(&mut self, row: u16, col: u16) -> io::Result<()> {
        queue!(self.out, MoveTo(col, row))
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(text), MoveToNextLine(1))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = execute!(self.out, Show, LeaveAlternateScreen);
    }
}

/// Plain line output with no cursor control (pipes, files, one-shot mode)
pub struct PlainSurface<W: Write> {
    out: W,
}

impl<W: Write> PlainSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TextSurface for PlainSurface<W> {
    fn clear(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn move_cursor(&mut self, _row: u16, _col: u16) -> io::Result<()> {
        Ok(())
    }

    fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}", text)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Lay out statistics as text lines
pub fn format_lines(stats: &JobStats) -> Vec<String> {
    let mut lines = Vec::with_capacity(stats.active.len() + 4);

    lines.push(format!(
        "Progress: {}/{} ({}%) | Active: {} | Avg: {}",
        stats.finished_jobs,
        stats.total_jobs,
        stats.progress_percent,
        stats.active_count,
        stats.average_label(),
    ));
    lines.push(format!(
        "Elapsed: {} | Remaining: {}",
        format_ticks(stats.elapsed),
        format_ticks(stats.remaining),
    ));
    lines.push(String::new());
    lines.push(format!(
        "{:>COL_JOB$}  {:>COL_POS$}  {:>COL_REMAINING$}",
        "Job", "Position", "Remaining"
    ));

    for row in &stats.active {
        let position = format!("({}, {})", row.position.0, row.position.1);
        lines.push(format!(
            "{:>COL_JOB$}  {:>COL_POS$}  {:>COL_REMAINING$}",
            row.index,
            position,
            row.remaining.to_string(),
        ));
    }

    lines
}

pub struct TextRenderer<T> {
    surface: T,
    store: StoreReader,
    clock: Arc<dyn Clock>,
}

impl<T: TextSurface> TextRenderer<T> {
    pub fn new(surface: T, store: StoreReader, clock: Arc<dyn Clock>) -> Self {
        Self {
            surface,
            store,
            clock,
        }
    }

    /// Draw one frame. Returns `Ok(false)` when there is nothing to show yet.
    pub fn render_once(&mut self) -> Result<bool> {
        let Some(current) = self.store.current() else {
            return Ok(false);
        };

        let now = current.world_now(self.clock.as_ref());
        let stats = aggregate(&current.snapshot, now).context("Failed to aggregate job state")?;

        self.surface.clear().context("Failed to clear text surface")?;
        self.surface.move_cursor(0, 0)?;
        for line in format_lines(&stats) {
            self.surface
                .write_line(&line)
                .context("Failed to write to text surface")?;
        }
        self.surface.flush()?;

        Ok(true)
    }

    /// Render forever; a failed frame is logged and the next one still runs
    pub async fn run(mut self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(e) = self.render_once() {
                warn!("text render cycle failed: {:#}", e);
            }
        }
    }
}
