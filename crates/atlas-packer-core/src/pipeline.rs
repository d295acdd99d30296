use crate::config::{AtlasConfig, PackerKind, SortOrder};
use crate::context::Context;
use crate::error::{AtlasPackerError, Result};
use crate::hull::{convex_hull, hull_image};
use crate::model::{AtlasLayout, PackStats, PackSummary, Page, PixelView};
use image::{ColorType, DynamicImage};
use std::cmp::Ordering;
use tracing::{debug, instrument, warn};

/// In-memory image to pack (key + decoded image).
pub struct InputImage {
    pub key: String,
    pub image: DynamicImage,
}

/// Rendered page and its logical page record.
pub struct OutputPage {
    pub page: Page,
    pub image: DynamicImage,
}

/// Output of a packing run: layout, per-run summary and rendered pages.
pub struct PackOutput {
    pub layout: AtlasLayout,
    pub summary: PackSummary,
    pub pages: Vec<OutputPage>,
}

impl PackOutput {
    pub fn stats(&self) -> PackStats {
        self.layout.stats()
    }
}

/// 8-bit interleaved copy of an input image.
struct Prepared {
    key: String,
    width: u32,
    height: u32,
    channels: u32,
    data: Vec<u8>,
}

impl Prepared {
    fn from_input(input: InputImage) -> Self {
        let (width, height) = (input.image.width(), input.image.height());
        let (channels, data) = match input.image.color() {
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => {
                let channels = input.image.color().channel_count() as u32;
                (channels, input.image.into_bytes())
            }
            _ => (4, input.image.to_rgba8().into_raw()),
        };
        Self {
            key: input.key,
            width,
            height,
            channels,
            data,
        }
    }

    fn view(&self) -> Result<PixelView<'_>> {
        PixelView::new(self.width, self.height, self.channels, &self.data)
    }

    fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Area weighted by aspect ratio; elongated sprites rank higher.
    fn squareness(&self) -> f64 {
        let (lo, hi) = (self.width.min(self.height), self.width.max(self.height));
        if lo == 0 {
            return 0.0;
        }
        (hi as f64 / lo as f64) * self.area() as f64
    }
}

fn sort_prepared(prepared: &mut [Prepared], order: SortOrder) {
    match order {
        SortOrder::None => {}
        SortOrder::NameAsc => prepared.sort_by(|a, b| a.key.cmp(&b.key)),
        SortOrder::AreaDesc => {
            prepared.sort_by(|a, b| b.area().cmp(&a.area()).then_with(|| a.key.cmp(&b.key)))
        }
        SortOrder::SquarenessDesc => prepared.sort_by(|a, b| {
            b.squareness()
                .partial_cmp(&a.squareness())
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        }),
    }
}

#[instrument(skip_all)]
/// Packs `inputs` with configuration `cfg` and renders every page.
///
/// Notes:
/// - Images are converted to 8-bit; the page channel count is the largest input count.
/// - Sorting is stable for deterministic results.
/// - With the tile packer and `hull_planes` set, occupancy comes from a convex hull of each
///   sprite instead of its raw pixels.
pub fn pack_images(inputs: Vec<InputImage>, cfg: AtlasConfig) -> Result<PackOutput> {
    cfg.validate()?;
    if inputs.is_empty() {
        return Err(AtlasPackerError::Empty);
    }

    let mut prepared: Vec<Prepared> = inputs.into_iter().map(Prepared::from_input).collect();
    sort_prepared(&mut prepared, cfg.sort_order);

    let mut ctx = Context::builder()
        .options(cfg.context.clone())
        .packer(cfg.create_packer()?)
        .build()?;
    for p in &prepared {
        let view = p.view()?;
        let id = ctx.add_sprite(p.key.clone(), view)?;
        if let (PackerKind::Tile, Some(planes)) = (cfg.kind, cfg.hull_planes) {
            let mask = hull_image(&view, 0);
            let mask_view = PixelView::new(p.width, p.height, 1, &mask)?;
            match convex_hull(planes, &mask_view)? {
                Some(hull) => ctx.set_sprite_triangles(id, &hull.triangulate())?,
                None => debug!(key = %p.key, "empty hull, keeping pixel occupancy"),
            }
        }
    }

    let summary = ctx.pack()?;
    if !summary.is_complete() {
        warn!(unplaced = summary.unplaced.len(), "some sprites were not placed");
    }

    let mut pages = Vec::with_capacity(ctx.page_count());
    for page in ctx.pages() {
        let image = match ctx.render_page(page.index) {
            Ok(img) => img,
            Err(AtlasPackerError::NothingRendered { page: index }) => {
                warn!(page = index, "page holds no sprites, writing a blank image");
                blank_page(page, ctx.num_channels())
            }
            Err(e) => return Err(e),
        };
        pages.push(OutputPage { page: *page, image });
    }

    Ok(PackOutput {
        layout: ctx.layout(),
        summary,
        pages,
    })
}

fn blank_page(page: &Page, channels: u32) -> DynamicImage {
    match channels {
        1 => DynamicImage::new_luma8(page.width, page.height),
        2 => DynamicImage::new_luma_a8(page.width, page.height),
        3 => DynamicImage::new_rgb8(page.width, page.height),
        _ => DynamicImage::new_rgba8(page.width, page.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prep(key: &str, w: u32, h: u32) -> Prepared {
        Prepared {
            key: key.into(),
            width: w,
            height: h,
            channels: 4,
            data: vec![255; (w * h * 4) as usize],
        }
    }

    #[test]
    fn squareness_prefers_elongated() {
        let mut v = vec![prep("square", 10, 10), prep("long", 40, 5), prep("small", 2, 2)];
        sort_prepared(&mut v, SortOrder::SquarenessDesc);
        let keys: Vec<_> = v.iter().map(|p| p.key.as_str()).collect();
        // 8 * 200 = 1600 > 100 > 4
        assert_eq!(keys, ["long", "square", "small"]);
    }

    #[test]
    fn sixteen_bit_input_is_widened_to_rgba8() {
        let img = DynamicImage::new_rgb16(3, 2);
        let p = Prepared::from_input(InputImage {
            key: "x".into(),
            image: img,
        });
        assert_eq!(p.channels, 4);
        assert_eq!(p.data.len(), 3 * 2 * 4);
    }
}
