use atlas_packer_core::prelude::*;
use atlas_packer_core::to_json;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

fn disc(size: u32) -> DynamicImage {
    let r = size as f32 / 2.0;
    let img = RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        if dx * dx + dy * dy <= r * r {
            Rgba([250, 200, 40, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    DynamicImage::ImageRgba8(img)
}

fn inputs() -> Vec<InputImage> {
    (0..6)
        .map(|i| InputImage {
            key: format!("disc_{i}"),
            image: disc(16 + 8 * i),
        })
        .collect()
}

#[test]
fn empty_input_is_rejected() {
    let err = pack_images(Vec::new(), AtlasConfig::default());
    assert!(matches!(err, Err(atlas_packer_core::AtlasPackerError::Empty)));
}

#[test]
fn skyline_pipeline_renders_and_exports() {
    let out = pack_images(inputs(), AtlasConfig::default()).expect("pack");
    assert!(out.summary.is_complete());
    assert_eq!(out.pages.len(), 1);
    let page = &out.pages[0];
    assert_eq!(page.image.dimensions(), (page.page.width, page.page.height));

    let stats = out.stats();
    assert_eq!(stats.num_sprites, 6);
    assert_eq!(stats.num_placed, 6);
    assert!(stats.occupancy > 0.0 && stats.occupancy <= 1.0);

    let json = to_json(&out.layout);
    assert_eq!(json["sprites"].as_array().map(|a| a.len()), Some(6));
    assert_eq!(json["meta"]["packer"], "skyline");
    assert_eq!(json["meta"]["channels"], 4);
}

#[test]
fn tile_pipeline_with_hulls() {
    let cfg = AtlasConfig::builder()
        .kind(PackerKind::Tile)
        .tile_size(8)
        .padding(1)
        .hull_planes(Some(12))
        .sort_order(SortOrder::AreaDesc)
        .build();
    let out = pack_images(inputs(), cfg).expect("pack");
    assert_eq!(out.pages.len(), 1);
    let page = out.pages[0].page;
    assert!(page.width.is_power_of_two() && page.height.is_power_of_two());
    // largest disc goes first under AreaDesc
    assert_eq!(out.layout.sprites[0].name, "disc_5");
    for record in &out.layout.sprites {
        let p = record.placement.expect("tile packer places everything");
        assert!(page.bounds().contains(&p.rect));
    }
}

#[test]
fn debug_background_fills_page() {
    let cfg = AtlasConfig::builder().debug_background(true).build();
    let out = pack_images(inputs(), cfg).expect("pack");
    let img = out.pages[0].image.to_rgba8();
    // nothing reaches the bottom-right corner of the 128x128 page
    let (w, h) = img.dimensions();
    assert_eq!(img.get_pixel(w - 1, h - 1)[3], 255);
}
