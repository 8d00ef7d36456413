// Copyright 2018 Ian Johnson

// This file is part of Chip-8.

// Chip-8 is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Chip-8 is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Chip-8.  If not, see <http://www.gnu.org/licenses/>.

//! The Chip-8 display buffer and built-in font.

use std::default::Default;

use failure::Fail;

/// The width of the display.
pub const WIDTH: usize = 64;
/// The height of the display.
pub const HEIGHT: usize = 32;
/// The number of pixels in the display.
pub const SIZE: usize = WIDTH * HEIGHT;

/// The height of a font glyph.
pub const FONT_HEIGHT: usize = 5;

/// The hex digit glyphs, which are copied to the start of memory.
pub const FONT: [[u8; FONT_HEIGHT]; 16] = [
    [0xF0, 0x90, 0x90, 0x90, 0xF0],
    [0x20, 0x60, 0x20, 0x20, 0x70],
    [0xF0, 0x10, 0xF0, 0x80, 0xF0],
    [0xF0, 0x10, 0xF0, 0x10, 0xF0],
    [0x90, 0x90, 0xF0, 0x10, 0x10],
    [0xF0, 0x80, 0xF0, 0x10, 0xF0],
    [0xF0, 0x80, 0xF0, 0x90, 0xF0],
    [0xF0, 0x10, 0x20, 0x40, 0x40],
    [0xF0, 0x90, 0xF0, 0x90, 0xF0],
    [0xF0, 0x90, 0xF0, 0x10, 0xF0],
    [0xF0, 0x90, 0xF0, 0x90, 0x90],
    [0xE0, 0x90, 0xE0, 0x90, 0xE0],
    [0xF0, 0x80, 0x80, 0x80, 0xF0],
    [0xE0, 0x90, 0x90, 0x90, 0xE0],
    [0xF0, 0x80, 0xF0, 0x80, 0xF0],
    [0xF0, 0x80, 0xF0, 0x80, 0x80],
];

/// A Chip-8 display buffer.
///
/// Pixels are stored one byte each, row-major, so that a renderer can consume
/// `data()` directly: the pixel at `(x, y)` lives at `y * WIDTH + x` and is
/// lit when nonzero.
pub struct Buffer {
    /// The underlying pixel data.
    data: [u8; SIZE],
    /// Whether the display needs to be refreshed.
    needs_refresh: bool,
}

impl Buffer {
    /// Returns a new display buffer with all pixels clear.
    pub fn new() -> Self {
        Buffer {
            data: [0; SIZE],
            needs_refresh: true,
        }
    }

    /// Clears the display.
    pub fn clear(&mut self) {
        for elem in self.data.iter_mut() {
            *elem = 0;
        }
        self.needs_refresh = true;
    }

    /// Returns a reference to the underlying pixel data.
    pub fn data(&self) -> &[u8; SIZE] {
        &self.data
    }

    /// Returns whether the pixel at the given position is lit.
    ///
    /// Positions outside the display are never lit.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < HEIGHT && self.data[y * WIDTH + x] != 0
    }

    /// XORs the given sprite onto the display at the given position.
    ///
    /// Each byte of `sprite` is one row, most significant bit leftmost.  The
    /// starting position wraps around the screen, but the sprite itself is
    /// clipped at the right and bottom edges.  Returns whether any lit pixel
    /// was turned off.
    pub fn draw_sprite(&mut self, sprite: &[u8], x: usize, y: usize) -> bool {
        let x = x % WIDTH;
        let y = y % HEIGHT;
        let mut collision = false;

        for (j, row) in sprite.iter().enumerate() {
            for i in 0..8 {
                if row & (1 << (7 - i)) != 0 && self.toggle(x + i, y + j) {
                    collision = true;
                }
            }
        }

        collision
    }

    /// Returns whether anything has changed since the last refresh.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    /// Forces a refresh on the next call to `refresh`, even if no draw
    /// operation has been performed.
    pub fn force_refresh(&mut self) {
        self.needs_refresh = true;
    }

    /// Refreshes the display using the given refresh function.
    ///
    /// If a refresh is unnecessary, nothing will be done.  The refresh
    /// function receives a "snapshot" of the display, and should draw that to
    /// whatever user-facing display is currently being used.
    pub fn refresh<F, E>(&mut self, f: F) -> Result<(), E>
    where
        F: FnOnce(&Self) -> Result<(), E>,
        E: Fail,
    {
        if self.needs_refresh {
            f(self)?;
            self.needs_refresh = false;
        }
        Ok(())
    }

    /// Flips the on/off state of the given pixel, returning whether it was
    /// flipped off from the on state.
    fn toggle(&mut self, x: usize, y: usize) -> bool {
        if x < WIDTH && y < HEIGHT {
            let pos = y * WIDTH + x;
            let old = self.data[pos] != 0;
            self.data[pos] = if old { 0 } else { 1 };
            self.needs_refresh = true;

            old
        } else {
            false
        }
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Buffer::new()
    }
}
