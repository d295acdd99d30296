//! Convex N-gon around the visible content of an image.
//!
//! The hull is built from `N` planes with normals spread evenly around the circle. Each
//! plane is pushed out to the farthest texel corner along its normal, and the hull
//! vertices are the intersections of neighbouring planes. Vertices live in normalized
//! sprite space, `[-0.5, 0.5]` on both axes with the image centre at the origin. Corners
//! may land outside that range when few planes wrap a full sprite; the polygon always
//! contains every visible texel.
use crate::error::{AtlasPackerError, Result};
use crate::geometry::{Vec2, perp};
use crate::model::PixelView;
use std::f32::consts::PI;

/// Planes and vertices of an image hull.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexHull {
    /// Unit plane normals at angles `2πi/N`.
    pub normals: Vec<Vec2>,
    /// Support distance of each plane, in texels from the image centre.
    pub distances: Vec<f32>,
    /// Exactly `N` vertices in normalized sprite space.
    pub vertices: Vec<Vec2>,
}

impl ConvexHull {
    pub fn num_planes(&self) -> usize {
        self.normals.len()
    }

    /// Fan triangulation around the first vertex, three `Vec2` per triangle.
    pub fn triangulate(&self) -> Vec<Vec2> {
        let v = &self.vertices;
        let mut out = Vec::with_capacity(v.len().saturating_sub(2) * 3);
        for t in 0..v.len().saturating_sub(2) {
            out.extend_from_slice(&[v[0], v[t + 1], v[t + 2]]);
        }
        out
    }
}

const EDGE_EPSILON: f32 = 0.001;

/// Pulls coordinates that miss the image edge by float noise back onto it.
fn snap_to_edge(v: f32) -> f32 {
    if v < -0.5 && v > -0.5 - EDGE_EPSILON {
        -0.5
    } else if v > 0.5 && v < 0.5 + EDGE_EPSILON {
        0.5
    } else {
        v
    }
}

/// Computes an `num_planes`-gon around the non-zero texels of a single-channel image.
///
/// Returns `Ok(None)` when the image holds no non-zero texel.
pub fn convex_hull(num_planes: usize, image: &PixelView<'_>) -> Result<Option<ConvexHull>> {
    if num_planes < 3 {
        return Err(AtlasPackerError::InvalidInput(format!(
            "a hull needs at least 3 planes, got {num_planes}"
        )));
    }
    if image.channels() != 1 {
        return Err(AtlasPackerError::InvalidInput(format!(
            "hull input must be single-channel, got {} channels",
            image.channels()
        )));
    }

    let normals: Vec<Vec2> = (0..num_planes)
        .map(|i| {
            let angle = i as f32 * 2.0 * PI / num_planes as f32;
            Vec2::new(angle.cos(), angle.sin())
        })
        .collect();
    let mut distances = vec![-1_000_000.0f32; num_planes];

    let (width, height) = (image.width(), image.height());
    let center = Vec2::new(width as f32 / 2.0, height as f32 / 2.0);
    let mut empty = true;
    for y in 0..height {
        for x in 0..width {
            if image.pixel(x, y)[0] == 0 {
                continue;
            }
            empty = false;
            let (fx, fy) = (x as f32, y as f32);
            let corners = [
                Vec2::new(fx, fy) - center,
                Vec2::new(fx + 1.0, fy) - center,
                Vec2::new(fx + 1.0, fy + 1.0) - center,
                Vec2::new(fx, fy + 1.0) - center,
            ];
            for (normal, dist) in normals.iter().zip(distances.iter_mut()) {
                for c in corners {
                    *dist = dist.max(normal.dot(c));
                }
            }
        }
    }
    if empty {
        return Ok(None);
    }

    let half = center;
    let mut vertices = vec![Vec2::zero(); num_planes];
    for i in 0..num_planes {
        let j = (i + 1) % num_planes;
        let p0 = normals[i] * distances[i];
        let p1 = normals[j] * distances[j];
        let d0 = perp(normals[i]);
        let d1 = perp(normals[j]);
        let t = ((p0.y - p1.y) * d1.x - (p0.x - p1.x) * d1.y) / (d0.x * d1.y - d1.x * d0.y);
        let vertex = p0 + d0 * t;
        vertices[num_planes - i - 1] = Vec2::new(
            snap_to_edge(vertex.x / half.x * 0.5),
            snap_to_edge(vertex.y / half.y * 0.5),
        );
    }

    Ok(Some(ConvexHull {
        normals,
        distances,
        vertices,
    }))
}

/// Single-channel 255/0 mask of the visible texels of `image`.
///
/// With `dilate == 0` a texel is visible when its alpha is non-zero (4 channels) or any
/// channel is non-zero (other layouts). Otherwise a texel is visible when any texel within
/// `dilate` of it (square kernel, clamped to the image) is non-zero and not fully
/// transparent.
pub fn hull_image(image: &PixelView<'_>, dilate: u32) -> Vec<u8> {
    let (width, height) = (image.width(), image.height());
    let mut out = vec![0u8; width as usize * height as usize];
    let visible = |x: u32, y: u32| {
        let px = image.pixel(x, y);
        if image.channels() == 4 && px[3] == 0 {
            return false;
        }
        px.iter().any(|&c| c != 0)
    };
    for y in 0..height {
        for x in 0..width {
            let hit = if dilate == 0 {
                visible(x, y)
            } else {
                let x1 = (x + dilate).min(width - 1);
                let y1 = (y + dilate).min(height - 1);
                (y.saturating_sub(dilate)..=y1)
                    .any(|yy| (x.saturating_sub(dilate)..=x1).any(|xx| visible(xx, yy)))
            };
            if hit {
                out[(y * width + x) as usize] = 255;
            }
        }
    }
    out
}
