use super::Packer;
use crate::config::TileOptions;
use crate::error::{AtlasPackerError, Result};
use crate::geometry::{Rotation, Vec2, next_power_of_two};
use crate::model::{PackSummary, Page, Placement, PixelView, Rect, Sprite, SpriteId};
use std::collections::HashMap;
use tracing::{debug, instrument, trace};

pub mod mask;

pub use mask::TileMask;

/// One orientation of a sprite's occupancy.
#[derive(Debug, Clone)]
struct Variant {
    rotation: Rotation,
    mask: TileMask,
    bounds: Option<Rect>,
}

impl Variant {
    fn new(rotation: Rotation, mask: TileMask) -> Self {
        let bounds = mask.bounds();
        Self {
            rotation,
            mask,
            bounds,
        }
    }
}

#[derive(Debug, Clone)]
struct TileSprite {
    width: u32,
    height: u32,
    /// Candidate orientations, R0 first.
    variants: Vec<Variant>,
}

impl TileSprite {
    fn base(&self) -> &TileMask {
        &self.variants[0].mask
    }
}

/// Where a sprite's tile grid landed on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    pub rotation: Rotation,
    pub tile_x: u32,
    pub tile_y: u32,
}

#[derive(Debug, Clone)]
struct TilePage {
    width: u32,
    height: u32,
    mask: TileMask,
    /// Tile extent before the last growth; searched first.
    priority: Option<(u32, u32)>,
}

impl TilePage {
    fn sized_for(grid: (u32, u32), tile_size: u32) -> Self {
        let width = next_power_of_two(grid.0 * tile_size).max(tile_size);
        let height = next_power_of_two(grid.1 * tile_size).max(tile_size);
        debug!(width, height, "tile page");
        Self {
            width,
            height,
            mask: TileMask::new(width / tile_size, height / tile_size),
            priority: None,
        }
    }

    /// Doubles the smaller side (width on ties).
    fn grow(&mut self, tile_size: u32) {
        self.priority = Some((self.mask.width(), self.mask.height()));
        if self.width <= self.height {
            self.width *= 2;
        } else {
            self.height *= 2;
        }
        self.mask = self
            .mask
            .grown(self.width / tile_size, self.height / tile_size);
        debug!(width = self.width, height = self.height, "tile page grown");
    }

    fn fit_at(&self, sprite: &TileSprite, x: u32, y: u32) -> Option<usize> {
        sprite.variants.iter().position(|v| {
            x + v.mask.width() <= self.mask.width()
                && y + v.mask.height() <= self.mask.height()
                && v.bounds
                    .is_none_or(|b| !self.mask.collides(&v.mask, b, x, y))
        })
    }

    /// First free position in row-major order: inside the priority region, then anywhere.
    fn find(&self, sprite: &TileSprite) -> Option<(usize, u32, u32)> {
        let (pw, ph) = self.priority.unwrap_or((0, 0));
        for y in 0..ph {
            for x in 0..pw {
                if let Some(v) = self.fit_at(sprite, x, y) {
                    return Some((v, x, y));
                }
            }
        }
        for y in 0..self.mask.height() {
            for x in 0..self.mask.width() {
                if x < pw && y < ph {
                    continue;
                }
                if let Some(v) = self.fit_at(sprite, x, y) {
                    return Some((v, x, y));
                }
            }
        }
        None
    }
}

/// Tile occupancy strategy.
///
/// Each sprite is reduced to a grid of tiles that hold visible content (plus padding).
/// Sprites are laid on a single page whose occupied tiles never overlap, so transparent
/// corners of one sprite can host another. The page starts at the power-of-two size of the
/// first sprite and doubles until everything fits.
pub struct TilePacker {
    options: TileOptions,
    tile_size: u32,
    sprites: HashMap<SpriteId, TileSprite>,
    placed: HashMap<SpriteId, TilePlacement>,
    page: Option<TilePage>,
}

impl TilePacker {
    pub fn new(options: TileOptions) -> Result<Self> {
        options.validate()?;
        let tile_size = options.effective_tile_size();
        Ok(Self {
            options,
            tile_size,
            sprites: HashMap::new(),
            placed: HashMap::new(),
            page: None,
        })
    }

    pub fn options(&self) -> &TileOptions {
        &self.options
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Unrotated occupancy of a sprite.
    pub fn sprite_mask(&self, id: SpriteId) -> Option<&TileMask> {
        self.sprites.get(&id).map(TileSprite::base)
    }

    /// Occupancy of the page after the last `pack`.
    pub fn page_mask(&self) -> Option<&TileMask> {
        self.page.as_ref().map(|p| &p.mask)
    }

    pub fn tile_placement(&self, id: SpriteId) -> Option<TilePlacement> {
        self.placed.get(&id).copied()
    }

    fn variants(&self, base: TileMask) -> Vec<Variant> {
        let square = base.width() == base.height();
        let rotations: &[Rotation] = match (self.options.allow_rotation, base.is_solid(), square) {
            (false, _, _) | (true, true, true) => &[Rotation::R0],
            (true, true, false) => &[Rotation::R0, Rotation::R90],
            (true, false, _) => &Rotation::ALL,
        };
        rotations
            .iter()
            .map(|&r| Variant::new(r, base.rotated(r)))
            .collect()
    }

    /// Pixel offset of sprite content inside its rotated tile footprint.
    fn content_offset(&self, sprite: &TileSprite, rotation: Rotation) -> (u32, u32) {
        let p = self.options.padding;
        let base = sprite.base();
        let gw = base.width() * self.tile_size;
        let gh = base.height() * self.tile_size;
        let (w, h) = (sprite.width, sprite.height);
        match rotation {
            Rotation::R0 => (p, p),
            Rotation::R90 => (p, gw - w - p),
            Rotation::R180 => (gw - w - p, gh - h - p),
            Rotation::R270 => (gh - h - p, p),
        }
    }
}

impl Packer for TilePacker {
    fn name(&self) -> &'static str {
        "tile"
    }

    fn add_sprite(&mut self, id: SpriteId, pixels: &PixelView<'_>) -> Result<()> {
        let base = TileMask::from_pixels(
            pixels,
            self.tile_size,
            self.options.alpha_threshold,
            self.options.padding,
        );
        trace!(?id, "sprite occupancy\n{base}");
        let variants = self.variants(base);
        self.sprites.insert(
            id,
            TileSprite {
                width: pixels.width(),
                height: pixels.height(),
                variants,
            },
        );
        Ok(())
    }

    fn remove_sprite(&mut self, id: SpriteId) {
        self.sprites.remove(&id);
        self.placed.remove(&id);
    }

    fn set_sprite_triangles(&mut self, id: SpriteId, triangles: &[Vec2]) -> Result<()> {
        if triangles.len() % 3 != 0 {
            return Err(AtlasPackerError::InvalidInput(format!(
                "triangle list length {} is not a multiple of 3",
                triangles.len()
            )));
        }
        let (width, height) = match self.sprites.get(&id) {
            Some(s) => (s.width, s.height),
            None => return Err(AtlasPackerError::UnknownSprite(id)),
        };
        let base = TileMask::from_triangles(
            width,
            height,
            self.tile_size,
            self.options.padding,
            triangles,
        );
        trace!(?id, "triangle occupancy\n{base}");
        let variants = self.variants(base);
        if let Some(sprite) = self.sprites.get_mut(&id) {
            sprite.variants = variants;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(sprites = sprites.len(), tile_size = self.tile_size))]
    fn pack(&mut self, sprites: &mut [Sprite<'_>], pages: &mut Vec<Page>) -> Result<PackSummary> {
        pages.clear();
        self.placed.clear();
        self.page = None;

        let ts = self.tile_size;
        let mut summary = PackSummary::default();
        for sprite in sprites.iter_mut() {
            let record = self
                .sprites
                .get(&sprite.id)
                .ok_or(AtlasPackerError::UnknownSprite(sprite.id))?;
            let base = record.base();
            let page = self
                .page
                .get_or_insert_with(|| TilePage::sized_for((base.width(), base.height()), ts));

            let (index, tx, ty) = loop {
                if let Some(hit) = page.find(record) {
                    break hit;
                }
                page.grow(ts);
            };

            let variant = &record.variants[index];
            page.mask.stamp(&variant.mask, tx, ty);

            let (ox, oy) = self.content_offset(record, variant.rotation);
            let (w, h) = variant.rotation.apply_size(record.width, record.height);
            sprite.placement = Some(Placement {
                page: 0,
                rect: Rect::new(tx * ts + ox, ty * ts + oy, w, h),
                rotation: variant.rotation,
            });
            self.placed.insert(
                sprite.id,
                TilePlacement {
                    rotation: variant.rotation,
                    tile_x: tx,
                    tile_y: ty,
                },
            );
            summary.placed += 1;
        }

        if let Some(page) = &self.page {
            trace!("page occupancy\n{}", page.mask);
            pages.push(Page {
                index: 0,
                width: page.width,
                height: page.height,
            });
        }
        Ok(summary)
    }
}
