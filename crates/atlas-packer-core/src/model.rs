use crate::error::{AtlasPackerError, Result};
use crate::geometry::Rotation;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        let ax2 = self.x + self.w;
        let ay2 = self.y + self.h;
        let bx2 = other.x + other.w;
        let by2 = other.y + other.h;
        !(self.x >= bx2 || other.x >= ax2 || self.y >= by2 || other.y >= ay2)
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
}

/// Stable handle of a sprite inside a [`crate::Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpriteId(pub(crate) usize);

impl SpriteId {
    /// Handle for driving a [`crate::Packer`] directly; a [`crate::Context`] assigns its own.
    pub fn new(index: usize) -> Self {
        Self(index)
    }
    pub fn index(self) -> usize {
        self.0
    }
}

/// Borrowed, row-major interleaved 8-bit pixel buffer.
///
/// The packer never copies or frees the pixels; the view only carries the shape needed to
/// read them safely.
#[derive(Debug, Clone, Copy)]
pub struct PixelView<'a> {
    width: u32,
    height: u32,
    channels: u32,
    data: &'a [u8],
}

impl<'a> PixelView<'a> {
    /// Wraps `data`, checking it holds at least `width * height * channels` bytes.
    pub fn new(width: u32, height: u32, channels: u32, data: &'a [u8]) -> Result<Self> {
        if !(1..=4).contains(&channels) {
            return Err(AtlasPackerError::InvalidInput(format!(
                "channel count must be 1..=4, got {channels}"
            )));
        }
        let needed = (width as usize) * (height as usize) * (channels as usize);
        if data.len() < needed {
            return Err(AtlasPackerError::InvalidInput(format!(
                "pixel buffer holds {} bytes, {width}x{height}x{channels} needs {needed}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn channels(&self) -> u32 {
        self.channels
    }
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// All channel values of pixel `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &'a [u8] {
        let c = self.channels as usize;
        let idx = (y as usize * self.width as usize + x as usize) * c;
        &self.data[idx..idx + c]
    }

    /// Pixel `(x, y)` widened to RGBA, missing channels default to 255.
    pub fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        let mut out = [255u8; 4];
        for (dst, src) in out.iter_mut().zip(self.pixel(x, y)) {
            *dst = *src;
        }
        out
    }

    /// True if the pixel carries content: alpha above `alpha_threshold` for 4-channel views,
    /// any non-zero channel otherwise.
    #[inline]
    pub fn is_opaque(&self, x: u32, y: u32, alpha_threshold: u8) -> bool {
        let px = self.pixel(x, y);
        if self.channels == 4 {
            px[3] > alpha_threshold
        } else {
            px.iter().any(|&c| c != 0)
        }
    }
}

impl<'a> From<&'a image::RgbaImage> for PixelView<'a> {
    fn from(img: &'a image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 4,
            data: img.as_raw(),
        }
    }
}

impl<'a> From<&'a image::GrayImage> for PixelView<'a> {
    fn from(img: &'a image::GrayImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 1,
            data: img.as_raw(),
        }
    }
}

/// Where a sprite ended up after packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Index of the page holding the sprite.
    pub page: usize,
    /// Placed rectangle within the page (post-rotation width/height).
    pub rect: Rect,
    /// Counter-clockwise rotation applied to the source pixels.
    pub rotation: Rotation,
}

/// A sprite owned by the context. Pixels are borrowed from the caller.
#[derive(Debug, Clone)]
pub struct Sprite<'a> {
    pub id: SpriteId,
    /// User-specified name (e.g., file path).
    pub name: String,
    pub pixels: PixelView<'a>,
    pub placement: Option<Placement>,
}

impl Sprite<'_> {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
    pub fn channels(&self) -> u32 {
        self.pixels.channels()
    }
    pub fn area(&self) -> u64 {
        (self.width() as u64) * (self.height() as u64)
    }
}

/// A single atlas page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub index: usize,
    pub width: u32,
    pub height: u32,
}

impl Page {
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

/// Outcome of a single `pack` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackSummary {
    pub placed: usize,
    /// Sprites left without a placement (skyline page full).
    pub unplaced: Vec<SpriteId>,
}

impl PackSummary {
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }
}

/// Serializable view of one sprite's placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteRecord {
    pub name: String,
    /// Original (unrotated) size.
    pub source_size: (u32, u32),
    pub placement: Option<Placement>,
}

/// Layout-level metadata used by exporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Schema version of the JSON layout; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub packer: String,
    pub channels: u32,
}

/// Pages plus per-sprite placements, in sprite insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasLayout {
    pub pages: Vec<Page>,
    pub sprites: Vec<SpriteRecord>,
    pub meta: Meta,
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_pages: usize,
    pub num_sprites: usize,
    pub num_placed: usize,
    /// Total area of all pages (sum of width * height for each page).
    pub total_page_area: u64,
    /// Sum of placed sprite rectangle areas.
    pub used_area: u64,
    /// Occupancy ratio: used_area / total_page_area (0.0 to 1.0).
    pub occupancy: f64,
    pub max_page_width: u32,
    pub max_page_height: u32,
    pub num_rotated: usize,
}

impl AtlasLayout {
    /// Computes packing statistics for this layout.
    pub fn stats(&self) -> PackStats {
        let total_page_area: u64 = self
            .pages
            .iter()
            .map(|p| (p.width as u64) * (p.height as u64))
            .sum();
        let max_page_width = self.pages.iter().map(|p| p.width).max().unwrap_or(0);
        let max_page_height = self.pages.iter().map(|p| p.height).max().unwrap_or(0);

        let mut num_placed = 0;
        let mut used_area = 0u64;
        let mut num_rotated = 0;
        for placement in self.sprites.iter().filter_map(|s| s.placement.as_ref()) {
            num_placed += 1;
            used_area += placement.rect.area();
            if placement.rotation != Rotation::R0 {
                num_rotated += 1;
            }
        }

        let occupancy = if total_page_area > 0 {
            used_area as f64 / total_page_area as f64
        } else {
            0.0
        };

        PackStats {
            num_pages: self.pages.len(),
            num_sprites: self.sprites.len(),
            num_placed,
            total_page_area,
            used_area,
            occupancy,
            max_page_width,
            max_page_height,
            num_rotated,
        }
    }
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Pages: {}, Sprites: {}/{} placed, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px², Rotated: {}",
            self.num_pages,
            self.num_placed,
            self.num_sprites,
            self.occupancy * 100.0,
            self.total_page_area,
            self.used_area,
            self.num_rotated,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_page_area.saturating_sub(self.used_area)
    }
}
