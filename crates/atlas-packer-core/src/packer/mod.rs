use crate::error::{AtlasPackerError, Result};
use crate::geometry::Vec2;
use crate::model::{PackSummary, Page, PixelView, Sprite, SpriteId};

pub mod skyline;
pub mod tile;

/// A packing strategy: owns its per-sprite state and lays sprites out onto pages.
///
/// Implementations must ensure placements stay inside their page and never overlap
/// (by bounding box or by occupied content, depending on the strategy).
pub trait Packer {
    fn name(&self) -> &'static str;

    /// Builds the strategy's internal record for a newly added sprite.
    fn add_sprite(&mut self, id: SpriteId, pixels: &PixelView<'_>) -> Result<()>;

    /// Releases the internal record of a sprite.
    fn remove_sprite(&mut self, id: SpriteId);

    /// Replaces pixel-derived occupancy with triangles in normalized `[-0.5, 0.5]` sprite space.
    fn set_sprite_triangles(&mut self, _id: SpriteId, _triangles: &[Vec2]) -> Result<()> {
        Err(AtlasPackerError::Unsupported(self.name()))
    }

    /// Places every sprite, writing placements in place and rebuilding `pages`.
    fn pack(&mut self, sprites: &mut [Sprite<'_>], pages: &mut Vec<Page>) -> Result<PackSummary>;
}
