use crate::compositing;
use crate::config::ContextOptions;
use crate::error::{AtlasPackerError, Result};
use crate::geometry::Vec2;
use crate::model::{
    AtlasLayout, Meta, PackStats, PackSummary, Page, Placement, PixelView, Sprite, SpriteId,
    SpriteRecord,
};
use crate::packer::Packer;
use image::DynamicImage;
use tracing::{debug, instrument};

/// Packing session: owns sprites and pages, delegates layout to a [`Packer`].
///
/// Pixel buffers are borrowed for the lifetime of the context and never copied.
pub struct Context<'a> {
    options: ContextOptions,
    packer: Box<dyn Packer>,
    sprites: Vec<Sprite<'a>>,
    pages: Vec<Page>,
    num_channels: u32,
    next_id: usize,
}

impl<'a> Context<'a> {
    pub fn new(options: ContextOptions, packer: Box<dyn Packer>) -> Self {
        Self {
            options,
            packer,
            sprites: Vec::new(),
            pages: Vec::new(),
            num_channels: 0,
            next_id: 0,
        }
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn packer_name(&self) -> &'static str {
        self.packer.name()
    }

    /// Registers a sprite. The strategy derives its own state from the pixels right away.
    pub fn add_sprite(&mut self, name: impl Into<String>, pixels: PixelView<'a>) -> Result<SpriteId> {
        let name = name.into();
        if pixels.is_empty() {
            return Err(AtlasPackerError::InvalidInput(format!(
                "sprite '{name}' has zero size ({}x{})",
                pixels.width(),
                pixels.height()
            )));
        }
        let id = SpriteId(self.next_id);
        self.packer.add_sprite(id, &pixels)?;
        self.next_id += 1;
        self.num_channels = self.num_channels.max(pixels.channels());
        debug!(?id, name = %name, w = pixels.width(), h = pixels.height(), "sprite added");
        self.sprites.push(Sprite {
            id,
            name,
            pixels,
            placement: None,
        });
        Ok(id)
    }

    pub fn remove_sprite(&mut self, id: SpriteId) -> Result<()> {
        let index = self.index_of(id)?;
        self.packer.remove_sprite(id);
        self.sprites.remove(index);
        self.num_channels = self.sprites.iter().map(|s| s.channels()).max().unwrap_or(0);
        Ok(())
    }

    /// Hands triangle occupancy for a sprite to the strategy.
    pub fn set_sprite_triangles(&mut self, id: SpriteId, triangles: &[Vec2]) -> Result<()> {
        self.index_of(id)?;
        self.packer.set_sprite_triangles(id, triangles)
    }

    /// Lays out every sprite. Pages from a previous pass are discarded.
    #[instrument(skip_all, fields(packer = self.packer.name(), sprites = self.sprites.len()))]
    pub fn pack(&mut self) -> Result<PackSummary> {
        for sprite in &mut self.sprites {
            sprite.placement = None;
        }
        let summary = self.packer.pack(&mut self.sprites, &mut self.pages)?;
        debug!(
            pages = self.pages.len(),
            placed = summary.placed,
            unplaced = summary.unplaced.len(),
            "pack finished"
        );
        Ok(summary)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Result<&Page> {
        self.pages.get(index).ok_or(AtlasPackerError::PageOutOfRange {
            page: index,
            count: self.pages.len(),
        })
    }

    pub fn sprites(&self) -> &[Sprite<'a>] {
        &self.sprites
    }

    pub fn sprite(&self, id: SpriteId) -> Result<&Sprite<'a>> {
        Ok(&self.sprites[self.index_of(id)?])
    }

    pub fn placement(&self, id: SpriteId) -> Result<Option<Placement>> {
        Ok(self.sprite(id)?.placement)
    }

    /// Largest channel count among the added sprites.
    pub fn num_channels(&self) -> u32 {
        self.num_channels
    }

    /// Composites the sprites of one page into an image with [`Self::num_channels`] channels.
    pub fn render_page(&self, index: usize) -> Result<DynamicImage> {
        let page = self.page(index)?;
        compositing::render_page(page, &self.sprites, self.num_channels, &self.options)
    }

    /// Serializable snapshot of pages and placements in insertion order.
    pub fn layout(&self) -> AtlasLayout {
        AtlasLayout {
            pages: self.pages.clone(),
            sprites: self
                .sprites
                .iter()
                .map(|s| SpriteRecord {
                    name: s.name.clone(),
                    source_size: (s.width(), s.height()),
                    placement: s.placement,
                })
                .collect(),
            meta: Meta {
                schema_version: "1".into(),
                app: "atlas-packer".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                packer: self.packer.name().into(),
                channels: self.num_channels,
            },
        }
    }

    pub fn stats(&self) -> PackStats {
        self.layout().stats()
    }

    fn index_of(&self, id: SpriteId) -> Result<usize> {
        self.sprites
            .iter()
            .position(|s| s.id == id)
            .ok_or(AtlasPackerError::UnknownSprite(id))
    }
}

/// Two-step construction of a [`Context`] that refuses to build without options or a
/// strategy.
#[derive(Default)]
pub struct ContextBuilder {
    options: Option<ContextOptions>,
    packer: Option<Box<dyn Packer>>,
}

impl ContextBuilder {
    pub fn options(mut self, options: ContextOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn packer(mut self, packer: Box<dyn Packer>) -> Self {
        self.packer = Some(packer);
        self
    }

    pub fn build<'a>(self) -> Result<Context<'a>> {
        let options = self.options.ok_or(AtlasPackerError::MissingOptions)?;
        let packer = self.packer.ok_or(AtlasPackerError::MissingPacker)?;
        Ok(Context::new(options, packer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SkylineOptions, TileOptions};
    use crate::packer::{skyline::SkylinePacker, tile::TilePacker};

    fn skyline() -> Box<dyn Packer> {
        Box::new(SkylinePacker::new(SkylineOptions::default()))
    }

    #[test]
    fn builder_requires_both_parts() {
        assert!(matches!(
            Context::builder().packer(skyline()).build(),
            Err(AtlasPackerError::MissingOptions)
        ));
        assert!(matches!(
            Context::builder().options(ContextOptions::default()).build(),
            Err(AtlasPackerError::MissingPacker)
        ));
        assert!(
            Context::builder()
                .options(ContextOptions::default())
                .packer(skyline())
                .build()
                .is_ok()
        );
    }

    #[test]
    fn channels_track_maximum() {
        let gray = vec![255u8; 4];
        let rgba = vec![255u8; 16];
        let mut ctx = Context::new(ContextOptions::default(), skyline());
        let a = ctx.add_sprite("g", PixelView::new(2, 2, 1, &gray).unwrap()).unwrap();
        assert_eq!(ctx.num_channels(), 1);
        let b = ctx.add_sprite("c", PixelView::new(2, 2, 4, &rgba).unwrap()).unwrap();
        assert_eq!(ctx.num_channels(), 4);
        assert_ne!(a, b);
        ctx.remove_sprite(b).unwrap();
        assert_eq!(ctx.num_channels(), 1);
        assert!(matches!(
            ctx.remove_sprite(b),
            Err(AtlasPackerError::UnknownSprite(_))
        ));
    }

    #[test]
    fn zero_size_sprite_rejected() {
        let mut ctx = Context::new(ContextOptions::default(), skyline());
        let err = ctx.add_sprite("empty", PixelView::new(0, 4, 4, &[]).unwrap());
        assert!(matches!(err, Err(AtlasPackerError::InvalidInput(_))));
    }

    #[test]
    fn page_queries_out_of_range() {
        let ctx = Context::new(ContextOptions::default(), skyline());
        assert_eq!(ctx.page_count(), 0);
        assert!(matches!(
            ctx.render_page(0),
            Err(AtlasPackerError::PageOutOfRange { page: 0, count: 0 })
        ));
    }

    #[test]
    fn skyline_rejects_triangles() {
        let data = vec![255u8; 16];
        let mut ctx = Context::new(ContextOptions::default(), skyline());
        let id = ctx.add_sprite("a", PixelView::new(2, 2, 4, &data).unwrap()).unwrap();
        assert!(matches!(
            ctx.set_sprite_triangles(id, &[]),
            Err(AtlasPackerError::Unsupported("skyline"))
        ));
    }

    #[test]
    fn render_matches_page_shape() {
        let data = vec![200u8; 20 * 10 * 3];
        let packer = Box::new(TilePacker::new(TileOptions::default()).unwrap());
        let mut ctx = Context::new(ContextOptions::default(), packer);
        ctx.add_sprite("rgb", PixelView::new(20, 10, 3, &data).unwrap()).unwrap();
        ctx.pack().unwrap();
        let page = *ctx.page(0).unwrap();
        let img = ctx.render_page(0).unwrap();
        assert_eq!((img.width(), img.height()), (page.width, page.height));
        assert_eq!(img.color().channel_count(), 3);
        assert_eq!(ctx.layout().meta.packer, "tile");
    }
}
