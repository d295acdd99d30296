use crate::config::ContextOptions;
use crate::error::{AtlasPackerError, Result};
use crate::geometry::Rotation;
use crate::model::{Page, PixelView, Sprite};
use image::{DynamicImage, ImageBuffer};

/// Checker cell size of the debug background, in pixels.
pub const CHECKER_SIZE: u32 = 16;
const CHECKER_ODD: [u8; 4] = [64, 96, 64, 255];
const CHECKER_EVEN: [u8; 4] = [32, 64, 32, 255];

/// Interleaved 8-bit canvas with 1..=4 channels.
struct Canvas {
    width: u32,
    height: u32,
    channels: u32,
    data: Vec<u8>,
}

fn byte_len(width: u32, height: u32, channels: u32) -> usize {
    width as usize * height as usize * channels as usize
}

impl Canvas {
    fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0; byte_len(width, height, channels)],
        }
    }

    fn texel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let c = self.channels as usize;
        let i = (y as usize * self.width as usize + x as usize) * c;
        &mut self.data[i..i + c]
    }

    fn fill_checker(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let odd = ((x / CHECKER_SIZE) ^ (y / CHECKER_SIZE)) & 1 == 1;
                let color = if odd { CHECKER_ODD } else { CHECKER_EVEN };
                let c = self.channels as usize;
                self.texel_mut(x, y).copy_from_slice(&color[..c]);
            }
        }
    }

    fn into_image(self) -> Result<DynamicImage> {
        let (w, h) = (self.width, self.height);
        let too_small = || AtlasPackerError::InvalidInput("canvas buffer size mismatch".into());
        Ok(match self.channels {
            1 => DynamicImage::ImageLuma8(ImageBuffer::from_raw(w, h, self.data).ok_or_else(too_small)?),
            2 => DynamicImage::ImageLumaA8(ImageBuffer::from_raw(w, h, self.data).ok_or_else(too_small)?),
            3 => DynamicImage::ImageRgb8(ImageBuffer::from_raw(w, h, self.data).ok_or_else(too_small)?),
            _ => DynamicImage::ImageRgba8(ImageBuffer::from_raw(w, h, self.data).ok_or_else(too_small)?),
        })
    }
}

/// Copies `src` into the canvas at `(dx, dy)` after rotating it.
///
/// Fully transparent texels and texels with alpha at or below `alpha_threshold` are
/// skipped, as are texels landing outside the canvas. Missing source channels read as 255.
/// With `highlight`, semi-transparent texels are tinted red so they stand out.
fn blit(
    canvas: &mut Canvas,
    src: &PixelView<'_>,
    dx: u32,
    dy: u32,
    rotation: Rotation,
    alpha_threshold: u8,
    highlight: bool,
) {
    let (sw, sh) = (src.width(), src.height());
    let channels = canvas.channels as usize;
    for sy in 0..sh {
        for sx in 0..sw {
            let color = src.rgba(sx, sy);
            if color[3] <= alpha_threshold {
                continue;
            }
            let (rx, ry) = rotation.apply(sx, sy, sw, sh);
            let (tx, ty) = (dx + rx, dy + ry);
            if tx >= canvas.width || ty >= canvas.height {
                continue;
            }
            let texel = canvas.texel_mut(tx, ty);
            texel.copy_from_slice(&color[..channels]);
            if highlight && color[3] < 255 && channels == 4 {
                texel[0] = texel[0].saturating_add(48);
                texel[1] /= 2;
                texel[2] /= 2;
                texel[3] = texel[3].saturating_add(128);
            }
        }
    }
}

/// Renders every sprite placed on `page` into an image with `channels` channels.
///
/// Fails with [`AtlasPackerError::NothingRendered`] when no sprite sits on the page.
pub fn render_page(
    page: &Page,
    sprites: &[Sprite<'_>],
    channels: u32,
    options: &ContextOptions,
) -> Result<DynamicImage> {
    let channels = channels.clamp(1, 4);
    let mut canvas = Canvas::new(page.width, page.height, channels);
    if options.debug_background {
        canvas.fill_checker();
    }

    let mut rendered = 0usize;
    for sprite in sprites {
        let Some(placement) = sprite.placement else {
            continue;
        };
        if placement.page != page.index {
            continue;
        }
        blit(
            &mut canvas,
            &sprite.pixels,
            placement.rect.x,
            placement.rect.y,
            placement.rotation,
            options.render_alpha_threshold,
            options.debug_background,
        );
        rendered += 1;
    }
    if rendered == 0 {
        return Err(AtlasPackerError::NothingRendered { page: page.index });
    }
    canvas.into_image()
}
