use crate::error::{AtlasPackerError, Result};
use crate::geometry::is_power_of_two;
use crate::packer::{Packer, skyline::SkylinePacker, tile::TilePacker};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Packing strategies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackerKind {
    /// Skyline bottom-left over bounding rectangles. Single fixed-size page.
    Skyline,
    /// Tile occupancy masks; follows sprite transparency, rotates and grows the page.
    Tile,
}

impl FromStr for PackerKind {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skyline" | "bin" | "binpack" => Ok(Self::Skyline),
            "tile" | "tiles" | "tilepack" => Ok(Self::Tile),
            _ => Err(()),
        }
    }
}

/// Skyline placement heuristics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SkylineMode {
    #[default]
    BottomLeft,
}

impl FromStr for SkylineMode {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bl" | "bottomleft" | "default" => Ok(Self::BottomLeft),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SkylineOptions {
    pub mode: SkylineMode,
    /// Allow 90° rotations when the rotated orientation rests lower.
    pub allow_rotation: bool,
}

impl Default for SkylineOptions {
    fn default() -> Self {
        Self {
            mode: SkylineMode::BottomLeft,
            allow_rotation: true,
        }
    }
}

pub const DEFAULT_TILE_SIZE: u32 = 16;
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TileOptions {
    /// Tile edge in pixels. 0 selects the default (16). Must be a power of two.
    pub tile_size: u32,
    /// Alpha values at or below this count as transparent (4-channel sprites).
    pub alpha_threshold: u8,
    /// Minimum pixel gap kept around each sprite's content.
    pub padding: u32,
    /// Try 90/180/270 variants of each sprite.
    pub allow_rotation: bool,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            padding: 0,
            allow_rotation: true,
        }
    }
}

impl TileOptions {
    /// Tile size with 0 mapped to the default.
    pub fn effective_tile_size(&self) -> u32 {
        if self.tile_size == 0 {
            DEFAULT_TILE_SIZE
        } else {
            self.tile_size
        }
    }

    pub fn validate(&self) -> Result<()> {
        let ts = self.effective_tile_size();
        if !is_power_of_two(ts) {
            return Err(AtlasPackerError::InvalidConfig(format!(
                "tile_size ({ts}) must be a power of two"
            )));
        }
        Ok(())
    }
}

/// Options owned by the packing context (rendering side).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContextOptions {
    /// Source texels with alpha at or below this are not drawn by `render_page`.
    pub render_alpha_threshold: u8,
    /// Fill rendered pages with a tile-sized checkerboard instead of transparent black.
    pub debug_background: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            render_alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            debug_background: false,
        }
    }
}

/// Ordering applied by [`crate::pack_images`] before sprites enter the context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Descending area weighted by aspect ratio (long side / short side).
    SquarenessDesc,
    AreaDesc,
    NameAsc,
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "squareness_desc" => Ok(Self::SquarenessDesc),
            "area_desc" => Ok(Self::AreaDesc),
            "name_asc" => Ok(Self::NameAsc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Full configuration: strategy choice plus every option set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AtlasConfig {
    #[serde(default = "default_kind")]
    pub kind: PackerKind,
    #[serde(default)]
    pub skyline: SkylineOptions,
    #[serde(default)]
    pub tile: TileOptions,
    #[serde(default)]
    pub context: ContextOptions,
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
    /// Tile packer only: derive occupancy from an N-plane convex hull instead of raw pixels.
    /// None keeps pixel occupancy; values below 3 fail validation.
    #[serde(default)]
    pub hull_planes: Option<usize>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            skyline: SkylineOptions::default(),
            tile: TileOptions::default(),
            context: ContextOptions::default(),
            sort_order: default_sort_order(),
            hull_planes: None,
        }
    }
}

impl AtlasConfig {
    pub fn validate(&self) -> Result<()> {
        if self.kind == PackerKind::Tile {
            self.tile.validate()?;
        }
        if let Some(n) = self.hull_planes {
            if n < 3 {
                return Err(AtlasPackerError::InvalidConfig(format!(
                    "hull_planes ({n}) must be at least 3"
                )));
            }
        }
        Ok(())
    }

    /// Instantiates the configured strategy.
    pub fn create_packer(&self) -> Result<Box<dyn Packer>> {
        self.validate()?;
        Ok(match self.kind {
            PackerKind::Skyline => Box::new(SkylinePacker::new(self.skyline.clone())),
            PackerKind::Tile => Box::new(TilePacker::new(self.tile.clone())?),
        })
    }

    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}

fn default_kind() -> PackerKind {
    PackerKind::Skyline
}
fn default_sort_order() -> SortOrder {
    SortOrder::SquarenessDesc
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn kind(mut self, v: PackerKind) -> Self {
        self.cfg.kind = v;
        self
    }
    /// Sets rotation for both strategies.
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.cfg.skyline.allow_rotation = v;
        self.cfg.tile.allow_rotation = v;
        self
    }
    pub fn skyline_mode(mut self, v: SkylineMode) -> Self {
        self.cfg.skyline.mode = v;
        self
    }
    pub fn tile_size(mut self, v: u32) -> Self {
        self.cfg.tile.tile_size = v;
        self
    }
    pub fn alpha_threshold(mut self, v: u8) -> Self {
        self.cfg.tile.alpha_threshold = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.tile.padding = v;
        self
    }
    pub fn render_alpha_threshold(mut self, v: u8) -> Self {
        self.cfg.context.render_alpha_threshold = v;
        self
    }
    pub fn debug_background(mut self, v: bool) -> Self {
        self.cfg.context.debug_background = v;
        self
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.sort_order = v;
        self
    }
    pub fn hull_planes(mut self, v: Option<usize>) -> Self {
        self.cfg.hull_planes = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_tile_size_means_default() {
        let opts = TileOptions {
            tile_size: 0,
            ..Default::default()
        };
        assert_eq!(opts.effective_tile_size(), 16);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn non_pow2_tile_size_rejected() {
        let cfg = AtlasConfig::builder()
            .kind(PackerKind::Tile)
            .tile_size(12)
            .build();
        assert!(matches!(
            cfg.validate(),
            Err(AtlasPackerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn hull_planes_below_three_rejected() {
        let cfg = AtlasConfig::builder()
            .kind(PackerKind::Tile)
            .hull_planes(Some(2))
            .build();
        assert!(matches!(
            cfg.validate(),
            Err(AtlasPackerError::InvalidConfig(_))
        ));
        let cfg = AtlasConfig::builder().hull_planes(None).build();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_kinds() {
        assert_eq!("Skyline".parse::<PackerKind>(), Ok(PackerKind::Skyline));
        assert_eq!("tile".parse::<PackerKind>(), Ok(PackerKind::Tile));
        assert!("maxrects".parse::<PackerKind>().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: AtlasConfig = serde_json::from_str(r#"{"kind":"tile","tile":{"padding":2}}"#)
            .expect("parse config");
        assert_eq!(cfg.kind, PackerKind::Tile);
        assert_eq!(cfg.tile.padding, 2);
        assert_eq!(cfg.tile.tile_size, 16);
        assert_eq!(cfg.tile.alpha_threshold, 8);
        assert_eq!(cfg.sort_order, SortOrder::SquarenessDesc);
    }
}
