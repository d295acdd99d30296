//! Core library for packing sprites into texture atlas pages.
//!
//! - Strategies: Skyline (bottom-left over bounding boxes) and Tile (transparency-aware
//!   occupancy masks with 4-way rotation and page growth)
//! - Geometry: convex hull extraction and a separating-axis polygon overlap test
//! - `Context` owns sprites and pages and delegates layout to a `Packer`
//! - Pipeline: `pack_images` takes in-memory images and returns rendered pages + layout
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use atlas_packer_core::{AtlasConfig, InputImage, PackerKind, pack_images};
//! # fn main() -> anyhow::Result<()> {
//! let img1 = ImageReader::open("a.png")?.decode()?;
//! let img2 = ImageReader::open("b.png")?.decode()?;
//! let inputs = vec![
//!   InputImage { key: "a".into(), image: img1 },
//!   InputImage { key: "b".into(), image: img2 },
//! ];
//! let cfg = AtlasConfig::builder().kind(PackerKind::Tile).padding(1).build();
//! let out = pack_images(inputs, cfg)?;
//! println!("pages: {}", out.pages.len());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod geometry;
pub mod hull;
pub mod model;
pub mod overlap;
pub mod packer;
pub mod pipeline;

pub use config::*;
pub use context::{Context, ContextBuilder};
pub use error::*;
pub use export::*;
pub use geometry::{Rotation, Vec2};
pub use hull::{ConvexHull, convex_hull, hull_image};
pub use model::*;
pub use overlap::overlaps;
pub use packer::Packer;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `atlas_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{
        AtlasConfig, AtlasConfigBuilder, ContextOptions, PackerKind, SkylineMode,
        SkylineOptions, SortOrder, TileOptions,
    };
    pub use crate::context::{Context, ContextBuilder};
    pub use crate::geometry::{Rotation, Vec2};
    pub use crate::model::{
        AtlasLayout, Meta, PackStats, PackSummary, Page, PixelView, Placement, Rect, SpriteId,
    };
    pub use crate::packer::{Packer, skyline::SkylinePacker, tile::TilePacker};
    pub use crate::{InputImage, OutputPage, PackOutput, pack_images};
}
