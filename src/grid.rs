// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Spiral job indexing: maps a 1-based hole index onto the excavation lattice.
//!
//! Holes are dug in square rings around the origin. The raw spiral position is
//! sheared onto a lattice: `x = 2sx - sy`, `y = 2sy + sx`.

/// Vertical compression applied when drawing the grid on character panels
/// (cells are roughly 8 units tall for every 5 wide).
pub const ASPECT_NUM: i64 = 5;
pub const ASPECT_DEN: i64 = 8;

/// Status of a single hole within the current snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Pending,
    Active,
    Done,
}

impl CellStatus {
    /// Glyph plotted on display surfaces
    pub fn as_char(&self) -> char {
        match self {
            CellStatus::Pending => '-',
            CellStatus::Done => '+',
            CellStatus::Active => 'X',
        }
    }
}

/// A hole placed on the lattice, tagged with its status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub index: u32,
    pub x: i64,
    pub y: i64,
    pub status: CellStatus,
}

impl GridCell {
    pub fn new(index: u32, status: CellStatus) -> Self {
        let (x, y) = map_index_to_position(index);
        Self { index, x, y, status }
    }
}

/// Map a 1-based job index to its lattice position.
///
/// Index 0 is treated like index 1 (the origin).
pub fn map_index_to_position(n: u32) -> (i64, i64) {
    let m = i64::from(n.saturating_sub(1));
    if m == 0 {
        return (0, 0);
    }

    let shell = (((m as f64).sqrt() + 1.0) / 2.0).floor() as i64;
    let ring_start = (2 * shell - 1).pow(2);
    let offset = m - ring_start;
    let leg = offset / (2 * shell);
    let element = offset - 2 * shell * leg - shell + 1;

    let (sx, sy) = match leg {
        0 => (shell, element),
        1 => (-element, shell),
        2 => (-shell, -element),
        _ => (element, -shell),
    };

    (sx * 2 - sy, sy * 2 + sx)
}

/// Width and height (in cells) a panel needs to show `total_jobs` holes.
///
/// The height is the width compressed by the 5/8 character aspect.
pub fn grid_extent(total_jobs: u32) -> (u16, u16) {
    let width = (f64::from(total_jobs).sqrt() * 3.0 + 1.0).floor() as i64;
    let height = width * ASPECT_NUM / ASPECT_DEN;
    (clamp_u16(width), clamp_u16(height))
}

/// Compress a lattice row coordinate for display
pub fn compress_row(y: i64) -> i64 {
    (y * ASPECT_NUM).div_euclid(ASPECT_DEN)
}

fn clamp_u16(value: i64) -> u16 {
    value.clamp(0, i64::from(u16::MAX)) as u16
}
