// SPDX-FileCopyrightText: 2026 GSI Helmholtzzentrum f. Schwerionenforschung GmbH, Darmstadt, Germany
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Character panels backed by an in-memory cell buffer.

use std::fs;
use std::io;
use std::path::PathBuf;

use ratatui::{buffer::Buffer, layout::Rect};

use super::map::DisplaySurface;

/// An in-memory panel. Its addressable area shrinks as the text scale grows.
pub struct CanvasSurface {
    name: String,
    /// Size at text scale 1.0
    base_width: u16,
    base_height: u16,
    buffer: Buffer,
    cursor: (u16, u16),
}

impl CanvasSurface {
    pub fn new(name: impl Into<String>, width: u16, height: u16) -> Self {
        Self {
            name: name.into(),
            base_width: width,
            base_height: height,
            buffer: Buffer::empty(Rect::new(0, 0, width, height)),
            cursor: (0, 0),
        }
    }

    /// Glyph at a cell, if the cell exists
    #[cfg(test)]
    pub fn glyph_at(&self, x: u16, y: u16) -> Option<char> {
        self.buffer
            .cell((x, y))
            .and_then(|cell| cell.symbol().chars().next())
    }

    /// The panel contents, one string per row
    pub fn rows(&self) -> Vec<String> {
        let area = self.buffer.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| self.buffer.cell((x, y)).map_or(" ", |cell| cell.symbol()))
                    .collect()
            })
            .collect()
    }
}

fn scaled(length: u16, scale: f32) -> u16 {
    (f32::from(length) / scale).floor() as u16
}

impl DisplaySurface for CanvasSurface {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear(&mut self) -> io::Result<()> {
        self.buffer.reset();
        self.cursor = (0, 0);
        Ok(())
    }

    fn set_cursor(&mut self, x: u16, y: u16) -> io::Result<()> {
        self.cursor = (x, y);
        Ok(())
    }

    fn plot(&mut self, glyph: char) -> io::Result<()> {
        // Off-panel writes are dropped, like on a physical display
        if let Some(cell) = self.buffer.cell_mut(self.cursor) {
            cell.set_char(glyph);
        }
        self.cursor.0 = self.cursor.0.saturating_add(1);
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.buffer.area.width, self.buffer.area.height)
    }

    fn set_scale(&mut self, scale: f32) -> io::Result<()> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid text scale {}", scale),
            ));
        }
        let area = Rect::new(
            0,
            0,
            scaled(self.base_width, scale),
            scaled(self.base_height, scale),
        );
        self.buffer.resize(area);
        self.buffer.reset();
        Ok(())
    }
}

/// A canvas whose frames are written to a file, for a viewer on another
/// terminal or an external panel driver to pick up.
pub struct FileDisplay {
    canvas: CanvasSurface,
    path: PathBuf,
}

impl FileDisplay {
    pub fn new(path: impl Into<PathBuf>, width: u16, height: u16) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self {
            canvas: CanvasSurface::new(name, width, height),
            path,
        }
    }
}

impl DisplaySurface for FileDisplay {
    fn name(&self) -> &str {
        self.canvas.name()
    }

    fn clear(&mut self) -> io::Result<()> {
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

    /// Replace the file in one step so readers never see half a frame
    fn flush(&mut self) -> io::Result<()> {
        let mut frame = self.canvas.rows().join("\n");
        frame.push('\n');

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, frame)?;
        fs::rename(&tmp, &self.path)
    }
}
