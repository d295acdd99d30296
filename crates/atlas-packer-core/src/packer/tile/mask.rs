use crate::geometry::{Rotation, Vec2};
use crate::model::{PixelView, Rect};
use crate::overlap::{overlaps, quad};
use std::fmt;

/// Grid of occupancy flags, one byte per tile, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMask {
    width: u32,
    height: u32,
    cells: Vec<u8>,
}

impl TileMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width as usize * height as usize],
        }
    }

    /// Occupancy of a `width x height` pixel sprite with `padding` pixels on every side.
    ///
    /// The grid covers the padded extent. A tile is occupied when any pixel within
    /// `padding` of it (after padding offset) has content.
    pub fn from_pixels(
        pixels: &PixelView<'_>,
        tile_size: u32,
        alpha_threshold: u8,
        padding: u32,
    ) -> Self {
        let (gw, gh) = grid_size(pixels.width(), pixels.height(), tile_size, padding);
        let mut mask = Self::new(gw, gh);
        let reach = 2 * padding;
        for y in 0..pixels.height() {
            for x in 0..pixels.width() {
                if !pixels.is_opaque(x, y, alpha_threshold) {
                    continue;
                }
                // padded position is x + padding; dilation reaches padding either way
                for ty in y / tile_size..=(y + reach) / tile_size {
                    for tx in x / tile_size..=(x + reach) / tile_size {
                        mask.set(tx, ty, true);
                    }
                }
            }
        }
        mask
    }

    /// Occupancy from a triangle list in normalized `[-0.5, 0.5]` sprite space.
    pub fn from_triangles(
        width: u32,
        height: u32,
        tile_size: u32,
        padding: u32,
        triangles: &[Vec2],
    ) -> Self {
        let (gw, gh) = grid_size(width, height, tile_size, padding);
        let mut mask = Self::new(gw, gh);
        if width == 0 || height == 0 {
            return mask;
        }
        let (w, h) = (width as f32, height as f32);
        let ts = tile_size as i64;
        let reach = 2 * padding as i64;
        for ty in 0..gh {
            for tx in 0..gw {
                // tile extent in sprite pixels, widened by the padding dilation
                let x0 = tx as i64 * ts - reach;
                let y0 = ty as i64 * ts - reach;
                let x1 = (tx as i64 + 1) * ts;
                let y1 = (ty as i64 + 1) * ts;
                let cell = quad(
                    Vec2::new(x0 as f32 / w - 0.5, y0 as f32 / h - 0.5),
                    Vec2::new(x1 as f32 / w - 0.5, y1 as f32 / h - 0.5),
                );
                let hit = triangles.chunks_exact(3).any(|tri| overlaps(tri, &cell));
                mask.set(tx, ty, hit);
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.cells[(y * self.width + x) as usize] != 0
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, occupied: bool) {
        self.cells[(y * self.width + x) as usize] = occupied as u8;
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    /// Every tile is occupied (and there is at least one tile).
    pub fn is_solid(&self) -> bool {
        !self.cells.is_empty() && self.cells.iter().all(|&c| c != 0)
    }

    /// Tight bounding box of occupied tiles, `None` when nothing is occupied.
    pub fn bounds(&self) -> Option<Rect> {
        let mut min = (u32::MAX, u32::MAX);
        let mut max = (0u32, 0u32);
        let mut any = false;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    any = true;
                    min = (min.0.min(x), min.1.min(y));
                    max = (max.0.max(x), max.1.max(y));
                }
            }
        }
        any.then(|| Rect::new(min.0, min.1, max.0 - min.0 + 1, max.1 - min.1 + 1))
    }

    pub fn rotated(&self, rotation: Rotation) -> Self {
        let (w, h) = rotation.apply_size(self.width, self.height);
        let mut out = Self::new(w, h);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    let (rx, ry) = rotation.apply(x, y, self.width, self.height);
                    out.set(rx, ry, true);
                }
            }
        }
        out
    }

    /// Copy of this mask enlarged to `width x height`, anchored top-left.
    pub fn grown(&self, width: u32, height: u32) -> Self {
        debug_assert!(width >= self.width && height >= self.height);
        let mut out = Self::new(width, height);
        for y in 0..self.height {
            let src = (y * self.width) as usize;
            let dst = (y * width) as usize;
            out.cells[dst..dst + self.width as usize]
                .copy_from_slice(&self.cells[src..src + self.width as usize]);
        }
        out
    }

    /// True if any occupied tile of `other`, positioned at `(x, y)`, lands on an occupied
    /// tile here. Only tiles inside `bounds` (in `other`'s space) are tested.
    pub fn collides(&self, other: &TileMask, bounds: Rect, x: u32, y: u32) -> bool {
        for oy in bounds.y..bounds.y + bounds.h {
            for ox in bounds.x..bounds.x + bounds.w {
                if other.get(ox, oy) && self.get(x + ox, y + oy) {
                    return true;
                }
            }
        }
        false
    }

    /// Marks the occupied tiles of `other` at `(x, y)`.
    pub fn stamp(&mut self, other: &TileMask, x: u32, y: u32) {
        for oy in 0..other.height {
            for ox in 0..other.width {
                if other.get(ox, oy) {
                    debug_assert!(!self.get(x + ox, y + oy), "tile claimed twice");
                    self.set(x + ox, y + oy, true);
                }
            }
        }
    }
}

impl fmt::Display for TileMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_str(if self.get(x, y) { "#" } else { "." })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Tile grid covering a sprite plus `padding` pixels on every side.
pub fn grid_size(width: u32, height: u32, tile_size: u32, padding: u32) -> (u32, u32) {
    (
        (width + 2 * padding).div_ceil(tile_size),
        (height + 2 * padding).div_ceil(tile_size),
    )
}
