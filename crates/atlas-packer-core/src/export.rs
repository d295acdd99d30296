use crate::model::AtlasLayout;
use serde_json::{Value, json};

/// Serialize a layout as `{ pages, sprites, meta }`.
///
/// Each sprite entry carries its source size and, when placed, the page index, the placed
/// frame (post-rotation size) and the counter-clockwise rotation in degrees. Unplaced
/// sprites have `"page": null` and no frame.
pub fn to_json(layout: &AtlasLayout) -> Value {
    let pages: Vec<Value> = layout
        .pages
        .iter()
        .map(|p| json!({"id": p.index, "width": p.width, "height": p.height}))
        .collect();
    let sprites: Vec<Value> = layout
        .sprites
        .iter()
        .map(|s| {
            let source_size = json!({"w": s.source_size.0, "h": s.source_size.1});
            match &s.placement {
                Some(pl) => json!({
                    "name": s.name,
                    "page": pl.page,
                    "frame": {"x": pl.rect.x, "y": pl.rect.y, "w": pl.rect.w, "h": pl.rect.h},
                    "rotation": pl.rotation.degrees(),
                    "rotated": pl.rotation.swaps_axes(),
                    "sourceSize": source_size,
                }),
                None => json!({
                    "name": s.name,
                    "page": Value::Null,
                    "sourceSize": source_size,
                }),
            }
        })
        .collect();
    json!({"pages": pages, "sprites": sprites, "meta": &layout.meta})
}
