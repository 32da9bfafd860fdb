// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Map renderer: draws every hole of the quarry on each display surface.

use std::io;
use std::time::Duration;

use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, warn};

use crate::grid::{compress_row, grid_extent, CellStatus};
use crate::job::{JobStateSnapshot, StoreReader};

/// Text scales a panel supports, largest first
pub const TEXT_SCALES: [f32; 10] = [5.0, 4.5, 4.0, 3.5, 3.0, 2.5, 2.0, 1.5, 1.0, 0.5];

const ORIGIN_GLYPH: char = 'O';

/// A character panel that can be scaled and plotted on cell by cell
pub trait DisplaySurface {
    /// Label used in logs
    fn name(&self) -> &str;
    fn clear(&mut self) -> io::Result<()>;
    fn set_cursor(&mut self, x: u16, y: u16) -> io::Result<()>;
    fn plot(&mut self, glyph: char) -> io::Result<()>;
    /// Addressable (width, height) at the current scale
    fn size(&self) -> (u16, u16);
    fn set_scale(&mut self, scale: f32) -> io::Result<()>;

    /// Present the finished frame
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Pick the largest scale at which `grid` fits; falls back to the smallest.
pub fn choose_scale(surface: &mut dyn DisplaySurface, grid: (u16, u16)) -> io::Result<f32> {
    for scale in TEXT_SCALES {
        surface.set_scale(scale)?;
        let (width, height) = surface.size();
        if grid.0 <= width && grid.1 <= height {
            return Ok(scale);
        }
    }
    // Last iteration left the surface at the smallest scale
    Ok(TEXT_SCALES[TEXT_SCALES.len() - 1])
}

/// Screen centre all lattice positions are drawn relative to
struct Origin {
    col: i64,
    row: i64,
    width: i64,
    height: i64,
}

impl Origin {
    fn of(surface: &dyn DisplaySurface) -> Self {
        let (width, height) = surface.size();
        Self {
            col: i64::from(width / 2),
            row: i64::from(height / 2),
            width: i64::from(width),
            height: i64::from(height),
        }
    }

    /// Screen cell for a lattice position, if it is on the panel
    fn project(&self, (x, y): (i64, i64)) -> Option<(u16, u16)> {
        let col = self.col + x;
        let row = self.row + compress_row(y);
        if (0..self.width).contains(&col) && (0..self.height).contains(&row) {
            Some((col as u16, row as u16))
        } else {
            None
        }
    }
}

fn plot_at(
    surface: &mut dyn DisplaySurface,
    origin: &Origin,
    position: (i64, i64),
    glyph: char,
) -> io::Result<()> {
    if let Some((col, row)) = origin.project(position) {
        surface.set_cursor(col, row)?;
        surface.plot(glyph)?;
    }
    Ok(())
}

/// Draw one frame of `snapshot` on `surface`.
///
/// Layers are plotted in priority order so that, where two holes share a
/// screen cell, active beats done beats pending, and the origin marker wins.
pub fn draw(surface: &mut dyn DisplaySurface, snapshot: &JobStateSnapshot) -> io::Result<()> {
    surface.clear()?;
    choose_scale(surface, grid_extent(snapshot.total_jobs))?;
    let origin = Origin::of(surface);

    for layer in [CellStatus::Pending, CellStatus::Done, CellStatus::Active] {
        for cell in snapshot.cells().filter(|cell| cell.status == layer) {
            plot_at(surface, &origin, (cell.x, cell.y), layer.as_char())?;
        }
    }

    plot_at(surface, &origin, (0, 0), ORIGIN_GLYPH)?;

    surface.flush()
}

/// Draw one surface, logging instead of failing. Returns whether it was drawn.
fn draw_surface(surface: &mut dyn DisplaySurface, snapshot: &JobStateSnapshot) -> bool {
    match draw(surface, snapshot) {
        Ok(()) => {
            debug!(surface = surface.name(), "map drawn");
            true
        }
        Err(e) => {
            warn!(surface = surface.name(), "map render failed: {}", e);
            false
        }
    }
}

pub struct MapRenderer {
    surfaces: Vec<Box<dyn DisplaySurface + Send>>,
    store: StoreReader,
    surface_pause: Duration,
}

impl MapRenderer {
    pub fn new(
        surfaces: Vec<Box<dyn DisplaySurface + Send>>,
        store: StoreReader,
        surface_pause: Duration,
    ) -> Self {
        Self {
            surfaces,
            store,
            surface_pause,
        }
    }

    /// Draw every surface once, back to back. Returns how many were drawn.
    pub fn render_all_once(&mut self) -> usize {
        let Some(current) = self.store.current() else {
            return 0;
        };

        let mut drawn = 0;
        for surface in &mut self.surfaces {
            if draw_surface(surface.as_mut(), &current.snapshot) {
                drawn += 1;
            }
        }
        drawn
    }

    /// Render forever, pausing between surfaces
    pub async fn run(mut self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            for surface in &mut self.surfaces {
                let Some(current) = self.store.current() else {
                    break;
                };
                draw_surface(surface.as_mut(), &current.snapshot);
                sleep(self.surface_pause).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::job::JobStateStore;
    use crate::render::canvas::CanvasSurface;

    fn sample() -> JobStateSnapshot {
        let mut snapshot = JobStateSnapshot::new(9);
        snapshot.next_job = 6;
        snapshot.active_jobs.insert(4, 0);
        snapshot.active_jobs.insert(5, 0);
        snapshot
    }

    fn count(canvas: &CanvasSurface, glyph: char) -> usize {
        canvas
            .rows()
            .iter()
            .map(|row| row.chars().filter(|&c| c == glyph).count())
            .sum()
    }

    #[test]
    fn test_choose_largest_fitting_scale() {
        let mut canvas = CanvasSurface::new("panel", 40, 20);
        let scale = choose_scale(&mut canvas, grid_extent(9)).unwrap();
        // 10x6 grid: 40/3.5 = 11 wide but 20/3.5 = 5 tall; 3.0 gives 13x6
        assert_eq!(scale, 3.0);
        assert_eq!(canvas.size(), (13, 6));
    }

    #[test]
    fn test_choose_scale_falls_back_to_smallest() {
        let mut canvas = CanvasSurface::new("tiny", 2, 1);
        let scale = choose_scale(&mut canvas, grid_extent(100)).unwrap();
        assert_eq!(scale, 0.5);
        assert_eq!(canvas.size(), (4, 2));
    }

    #[test]
    fn test_draw_layers() {
        let mut canvas = CanvasSurface::new("panel", 40, 20);
        draw(&mut canvas, &sample()).unwrap();

        // 13x6 at scale 3.0, centre (6, 3)
        assert_eq!(canvas.glyph_at(6, 3), Some('O'));
        // Hole 4 at lattice (-1, 2) -> (5, 4); hole 5 at (-3, 1) -> (3, 3)
        assert_eq!(canvas.glyph_at(5, 4), Some('X'));
        assert_eq!(canvas.glyph_at(3, 3), Some('X'));
        // Hole 2 at (2, 1) -> (8, 3), done
        assert_eq!(canvas.glyph_at(8, 3), Some('+'));
        // Hole 9 at (3, -1) -> (9, 2), pending
        assert_eq!(canvas.glyph_at(9, 2), Some('-'));

        assert_eq!(count(&canvas, 'X'), 2);
        assert_eq!(count(&canvas, 'O'), 1);
    }

    #[test]
    fn test_nothing_claimed_is_all_pending() {
        let mut canvas = CanvasSurface::new("panel", 40, 20);
        draw(&mut canvas, &JobStateSnapshot::new(9)).unwrap();
        assert_eq!(count(&canvas, '+'), 0);
        assert_eq!(count(&canvas, 'X'), 0);
        // Hole 1 sits under the origin marker
        assert_eq!(count(&canvas, '-'), 8);
    }

    #[test]
    fn test_render_all_once_skips_without_snapshot() {
        let store = JobStateStore::new();
        let surfaces: Vec<Box<dyn DisplaySurface + Send>> =
            vec![Box::new(CanvasSurface::new("a", 40, 20))];
        let mut renderer = MapRenderer::new(surfaces, store.reader(), Duration::ZERO);
        assert_eq!(renderer.render_all_once(), 0);

        store.install(sample());
        assert_eq!(renderer.render_all_once(), 1);
    }

    #[test]
    fn test_no_surfaces_is_not_an_error() {
        let store = JobStateStore::new();
        store.install(sample());
        let mut renderer = MapRenderer::new(Vec::new(), store.reader(), Duration::ZERO);
        assert_eq!(renderer.render_all_once(), 0);
    }

    /// Records when frames are flushed; the first `failing_clears` clears error
    struct CountingSurface {
        canvas: CanvasSurface,
        frames: Arc<Mutex<Vec<Duration>>>,
        started: tokio::time::Instant,
        failing_clears: usize,
    }

    impl DisplaySurface for CountingSurface {
        fn name(&self) -> &str {
            self.canvas.name()
        }
        fn clear(&mut self) -> io::Result<()> {
            if self.failing_clears > 0 {
                self.failing_clears -= 1;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "panel offline"));
            }
            self.canvas.clear()
        }
        fn set_cursor(&mut self, x: u16, y: u16) -> io::Result<()> {
            self.canvas.set_cursor(x, y)
        }
        fn plot(&mut self, glyph: char) -> io::Result<()> {
            self.canvas.plot(glyph)
        }
        fn size(&self) -> (u16, u16) {
            self.canvas.size()
        }
        fn set_scale(&mut self, scale: f32) -> io::Result<()> {
            self.canvas.set_scale(scale)
        }
        fn flush(&mut self) -> io::Result<()> {
            self.frames.lock().unwrap().push(self.started.elapsed());
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_pauses_between_surfaces() {
        let store = JobStateStore::new();
        store.install(sample());

        let frames = Arc::new(Mutex::new(Vec::new()));
        let started = tokio::time::Instant::now();
        let surfaces: Vec<Box<dyn DisplaySurface + Send>> = (0..2)
            .map(|i| {
                Box::new(CountingSurface {
                    canvas: CanvasSurface::new(format!("panel{}", i), 40, 20),
                    frames: frames.clone(),
                    started,
                    failing_clears: 0,
                }) as Box<dyn DisplaySurface + Send>
            })
            .collect();

        let renderer = MapRenderer::new(surfaces, store.reader(), Duration::from_secs(1));
        let handle = tokio::spawn(renderer.run(Duration::from_secs(5)));

        // Ticks at 0s and 5s, each drawing panel0 then panel1 a second later
        tokio::time::sleep(Duration::from_millis(6500)).await;
        handle.abort();

        let frames: Vec<u64> = frames.lock().unwrap().iter().map(|d| d.as_secs()).collect();
        assert_eq!(frames, vec![0, 1, 5, 6]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_survives_failing_surface() {
        let store = JobStateStore::new();
        store.install(sample());

        let frames = Arc::new(Mutex::new(Vec::new()));
        let surface = CountingSurface {
            canvas: CanvasSurface::new("flaky", 40, 20),
            frames: frames.clone(),
            started: tokio::time::Instant::now(),
            failing_clears: 2,
        };
        let surfaces: Vec<Box<dyn DisplaySurface + Send>> = vec![Box::new(surface)];

        let renderer = MapRenderer::new(surfaces, store.reader(), Duration::from_secs(1));
        let handle = tokio::spawn(renderer.run(Duration::from_secs(5)));

        // Cycles at 0s and 5s fail; 10s and 15s draw
        tokio::time::sleep(Duration::from_millis(16_500)).await;
        assert!(!handle.is_finished());
        handle.abort();

        let frames: Vec<u64> = frames.lock().unwrap().iter().map(|d| d.as_secs()).collect();
        assert_eq!(frames, vec![10, 15]);
    }

    #[test]
    fn test_render_all_once_counts_failures() {
        let store = JobStateStore::new();
        store.install(sample());
        let flaky = CountingSurface {
            canvas: CanvasSurface::new("flaky", 40, 20),
            frames: Arc::new(Mutex::new(Vec::new())),
            started: tokio::time::Instant::now(),
            failing_clears: 1,
        };
        let surfaces: Vec<Box<dyn DisplaySurface + Send>> =
            vec![Box::new(flaky), Box::new(CanvasSurface::new("ok", 40, 20))];
        let mut renderer = MapRenderer::new(surfaces, store.reader(), Duration::ZERO);

        assert_eq!(renderer.render_all_once(), 1);
        assert_eq!(renderer.render_all_once(), 2);
    }
}
