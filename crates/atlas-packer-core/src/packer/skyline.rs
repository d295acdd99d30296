use super::Packer;
use crate::config::{SkylineMode, SkylineOptions};
use crate::error::Result;
use crate::geometry::{Rotation, next_power_of_two};
use crate::model::{PackSummary, Page, Placement, PixelView, Rect, Sprite, SpriteId};
use tracing::{debug, instrument, warn};

/// Smallest page side the skyline packer starts from.
pub const MIN_PAGE_SIZE: u32 = 128;

// One "rooftop" of the skyline:
//
//     +-----+
//     |     +--+
// +---+
//
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkylineNode {
    pub x: u32,
    pub y: u32,
    pub w: u32,
}

impl SkylineNode {
    #[inline]
    fn left(&self) -> u32 {
        self.x
    }
    #[inline]
    fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
}

/// Skyline bin for a single fixed-size page.
pub struct Skyline {
    border: Rect,
    nodes: Vec<SkylineNode>,
}

impl Skyline {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            border: Rect::new(0, 0, width, height),
            nodes: vec![SkylineNode { x: 0, y: 0, w: width }],
        }
    }

    pub fn nodes(&self) -> &[SkylineNode] {
        &self.nodes
    }

    fn can_put(&self, mut i: usize, w: u32, h: u32) -> Option<Rect> {
        let mut rect = Rect::new(self.nodes[i].x, 0, w, h);
        let mut width_left = rect.w;
        loop {
            rect.y = rect.y.max(self.nodes[i].y);
            if rect.x + rect.w > self.border.w || rect.y + rect.h > self.border.h {
                return None;
            }
            if self.nodes[i].w >= width_left {
                return Some(rect);
            }
            width_left -= self.nodes[i].w;
            i += 1;
            if i >= self.nodes.len() {
                return None;
            }
        }
    }

    /// Lowest resting position over all nodes; ties go to the narrowest starting node.
    fn find_bottom_left(&self, w: u32, h: u32, allow_rotation: bool) -> Option<(usize, Rect)> {
        let mut best_top = u32::MAX;
        let mut best_width = u32::MAX;
        let mut best: Option<(usize, Rect)> = None;

        let orientations = [(w, h), (h, w)];
        let count = if allow_rotation && w != h { 2 } else { 1 };
        for i in 0..self.nodes.len() {
            for &(cw, ch) in &orientations[..count] {
                if let Some(r) = self.can_put(i, cw, ch) {
                    let top = r.y + r.h;
                    if top < best_top || (top == best_top && self.nodes[i].w < best_width) {
                        best_top = top;
                        best_width = self.nodes[i].w;
                        best = Some((i, r));
                    }
                }
            }
        }
        best
    }

    /// Finds a spot for a `w x h` rectangle and raises the skyline over it.
    pub fn insert(&mut self, w: u32, h: u32, allow_rotation: bool) -> Option<Rect> {
        let (i, place) = self.find_bottom_left(w, h, allow_rotation)?;
        self.split(i, &place);
        self.merge();
        Some(place)
    }

    fn split(&mut self, index: usize, rect: &Rect) {
        let skyline = SkylineNode {
            x: rect.x,
            y: rect.y + rect.h,
            w: rect.w,
        };
        debug_assert!(skyline.right() <= self.border.right());
        debug_assert!(skyline.y <= self.border.h);

        self.nodes.insert(index, skyline);

        // clip or erase the nodes now covered by the new one
        let i = index + 1;
        while i < self.nodes.len() {
            if self.nodes[i - 1].left() <= self.nodes[i].left()
                && self.nodes[i].left() <= self.nodes[i - 1].right()
            {
                let shrink = self.nodes[i - 1].right() - self.nodes[i].left() + 1;
                if self.nodes[i].w <= shrink {
                    self.nodes.remove(i);
                } else {
                    self.nodes[i].x += shrink;
                    self.nodes[i].w -= shrink;
                    break;
                }
            } else {
                break;
            }
        }
    }

    fn merge(&mut self) {
        let mut i = 1;
        while i < self.nodes.len() {
            if self.nodes[i - 1].y == self.nodes[i].y {
                let w = self.nodes[i].w;
                self.nodes[i - 1].w = self.nodes[i - 1].w.saturating_add(w);
                self.nodes.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

/// Bottom-left skyline strategy over bounding rectangles.
///
/// Packs everything onto one page sized from the total sprite area. Sprites that do not fit
/// are left without a placement and reported in the [`PackSummary`].
pub struct SkylinePacker {
    options: SkylineOptions,
}

impl SkylinePacker {
    pub fn new(options: SkylineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SkylineOptions {
        &self.options
    }

    /// Page side for a given total sprite area: next power of two of `round(sqrt(area))`,
    /// at least [`MIN_PAGE_SIZE`].
    pub fn page_size_for_area(total_area: u64) -> u32 {
        let side = (total_area as f64).sqrt().round() as u32;
        next_power_of_two(side).max(MIN_PAGE_SIZE)
    }
}

impl Packer for SkylinePacker {
    fn name(&self) -> &'static str {
        "skyline"
    }

    fn add_sprite(&mut self, _id: SpriteId, _pixels: &PixelView<'_>) -> Result<()> {
        // only sprite dimensions matter; nothing to derive
        Ok(())
    }

    fn remove_sprite(&mut self, _id: SpriteId) {}

    #[instrument(skip_all, fields(sprites = sprites.len()))]
    fn pack(&mut self, sprites: &mut [Sprite<'_>], pages: &mut Vec<Page>) -> Result<PackSummary> {
        pages.clear();
        let total_area: u64 = sprites.iter().map(|s| s.area()).sum();
        let side = Self::page_size_for_area(total_area);
        let page = Page {
            index: 0,
            width: side,
            height: side,
        };
        pages.push(page);
        debug!(width = side, height = side, "skyline page");

        let mut bin = Skyline::new(side, side);
        let mut summary = PackSummary::default();
        for sprite in sprites.iter_mut() {
            let (w, h) = (sprite.width(), sprite.height());
            let placed = match self.options.mode {
                SkylineMode::BottomLeft => bin.insert(w, h, self.options.allow_rotation),
            };
            match placed {
                Some(rect) => {
                    let rotation = if rect.w == w { Rotation::R0 } else { Rotation::R90 };
                    sprite.placement = Some(Placement {
                        page: page.index,
                        rect,
                        rotation,
                    });
                    summary.placed += 1;
                }
                None => {
                    warn!(sprite = %sprite.name, w, h, "sprite does not fit on the skyline page");
                    sprite.placement = None;
                    summary.unplaced.push(sprite.id);
                }
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(bin: &Skyline, width: u32) {
        let nodes = bin.nodes();
        assert_eq!(nodes[0].x, 0);
        for pair in nodes.windows(2) {
            assert_eq!(pair[0].x + pair[0].w, pair[1].x, "gap or overlap: {:?}", pair);
            assert_ne!(pair[0].y, pair[1].y, "unmerged neighbours: {:?}", pair);
        }
        let last = nodes[nodes.len() - 1];
        assert_eq!(last.x + last.w, width);
    }

    #[test]
    fn first_rect_goes_bottom_left() {
        let mut bin = Skyline::new(128, 128);
        let r = bin.insert(64, 64, false).unwrap();
        assert_eq!(r, Rect::new(0, 0, 64, 64));
        assert_eq!(
            bin.nodes(),
            &[
                SkylineNode { x: 0, y: 64, w: 64 },
                SkylineNode { x: 64, y: 0, w: 64 }
            ]
        );
    }

    #[test]
    fn equal_heights_merge() {
        let mut bin = Skyline::new(128, 128);
        bin.insert(64, 32, false).unwrap();
        bin.insert(64, 32, false).unwrap();
        assert_eq!(bin.nodes(), &[SkylineNode { x: 0, y: 32, w: 128 }]);
    }

    #[test]
    fn rejects_out_of_bounds() {
        let mut bin = Skyline::new(128, 128);
        assert!(bin.insert(129, 10, true).is_none());
        assert!(bin.insert(10, 200, true).is_none());
        assert_partition(&bin, 128);
    }

    #[test]
    fn rotation_only_fit() {
        let mut bin = Skyline::new(128, 64);
        let r = bin.insert(40, 100, true).expect("rotated fit");
        assert_eq!((r.w, r.h), (100, 40));
        assert!(Skyline::new(128, 64).insert(40, 100, false).is_none());
    }

    #[test]
    fn partition_holds_after_many_inserts() {
        let mut bin = Skyline::new(256, 256);
        let sizes = [
            (30, 10),
            (12, 40),
            (64, 8),
            (5, 5),
            (100, 20),
            (17, 33),
            (256, 3),
            (9, 70),
        ];
        for (w, h) in sizes {
            bin.insert(w, h, true);
            assert_partition(&bin, 256);
        }
    }

    #[test]
    fn page_size_from_area() {
        assert_eq!(SkylinePacker::page_size_for_area(0), 128);
        assert_eq!(SkylinePacker::page_size_for_area(13824), 128);
        assert_eq!(SkylinePacker::page_size_for_area(200 * 200), 256);
    }
}
