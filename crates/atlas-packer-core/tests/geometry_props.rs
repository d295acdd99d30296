use atlas_packer_core::geometry::{Rotation, Vec2, next_power_of_two, round_up};
use atlas_packer_core::overlap::{overlaps, quad};
use atlas_packer_core::{PixelView, convex_hull};
use rand::{Rng, SeedableRng, rngs::StdRng};

#[test]
fn quarter_turns_compose_to_identity() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let w = rng.gen_range(1..100);
        let h = rng.gen_range(1..100);
        let (x, y) = (rng.gen_range(0..w), rng.gen_range(0..h));

        let (mut cx, mut cy, mut cw, mut ch) = (x, y, w, h);
        for _ in 0..4 {
            let (nx, ny) = Rotation::R90.apply(cx, cy, cw, ch);
            (cw, ch) = Rotation::R90.apply_size(cw, ch);
            (cx, cy) = (nx, ny);
            assert!(cx < cw && cy < ch);
        }
        assert_eq!((cx, cy, cw, ch), (x, y, w, h));

        let (hx, hy) = Rotation::R180.apply(x, y, w, h);
        assert_eq!(Rotation::R180.apply(hx, hy, w, h), (x, y));

        // R270 undoes R90
        let (qx, qy) = Rotation::R90.apply(x, y, w, h);
        assert_eq!(Rotation::R270.apply(qx, qy, h, w), (x, y));
    }
}

#[test]
fn power_of_two_helpers() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let v = rng.gen_range(2..1_000_000u32);
        let p = next_power_of_two(v);
        assert!(p.is_power_of_two() && p >= v && p / 2 < v);
        let m = 1 << rng.gen_range(0..8);
        let r = round_up(v, m);
        assert!(r % m == 0 && r >= v && r - v < m);
    }
}

fn random_triangle(rng: &mut StdRng) -> [Vec2; 3] {
    let mut p = || Vec2::new(rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0));
    [p(), p(), p()]
}

#[test]
fn overlap_is_symmetric() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..2000 {
        let a = random_triangle(&mut rng);
        let b = if rng.gen_bool(0.5) {
            random_triangle(&mut rng).to_vec()
        } else {
            let min = Vec2::new(rng.gen_range(-4.0..3.0), rng.gen_range(-4.0..3.0));
            let max = min + Vec2::new(rng.gen_range(0.1..2.0), rng.gen_range(0.1..2.0));
            quad(min, max).to_vec()
        };
        assert_eq!(overlaps(&a, &b), overlaps(&b, &a), "{a:?} vs {b:?}");
    }
}

/// Point inside a convex vertex loop of either winding, allowing the edge snap slack.
fn inside(poly: &[Vec2], p: Vec2) -> bool {
    let n = poly.len();
    let sides: Vec<f32> = (0..n)
        .filter_map(|i| {
            let (a, b) = (poly[i], poly[(i + 1) % n]);
            let edge = b - a;
            let len = edge.length();
            (len > 1e-6).then(|| edge.cross(p - a) / len)
        })
        .collect();
    sides.iter().all(|&d| d >= -2e-3) || sides.iter().all(|&d| d <= 2e-3)
}

#[test]
fn hull_covers_every_visible_texel() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let w = rng.gen_range(1..40u32);
        let h = rng.gen_range(1..40u32);
        let mut data = vec![0u8; (w * h) as usize];
        for _ in 0..rng.gen_range(1..20) {
            let i = rng.gen_range(0..data.len());
            data[i] = 255;
        }
        let view = PixelView::new(w, h, 1, &data).unwrap();
        let planes = rng.gen_range(3..24);
        let hull = convex_hull(planes, &view).unwrap().expect("non-empty image");
        assert_eq!(hull.vertices.len(), planes);
        assert_eq!(hull.triangulate().len(), (planes - 2) * 3);

        for y in 0..h {
            for x in 0..w {
                if data[(y * w + x) as usize] == 0 {
                    continue;
                }
                for (cx, cy) in [(x, y), (x + 1, y), (x + 1, y + 1), (x, y + 1)] {
                    let corner = Vec2::new(cx as f32 / w as f32 - 0.5, cy as f32 / h as f32 - 0.5);
                    assert!(inside(&hull.vertices, corner), "{planes} planes miss {corner:?}");
                }
            }
        }

        // axis-aligned planes bound the hull by the image itself
        if planes % 4 == 0 {
            for v in &hull.vertices {
                assert!((-0.5..=0.5).contains(&v.x) && (-0.5..=0.5).contains(&v.y), "{v:?}");
            }
        }
    }
}

#[test]
fn few_planes_reach_past_the_image() {
    let data = vec![255u8; 64 * 64];
    let view = PixelView::new(64, 64, 1, &data).unwrap();
    let hull = convex_hull(3, &view).unwrap().unwrap();
    assert!(hull.vertices.iter().any(|v| v.x.abs() > 0.5 || v.y.abs() > 0.5));
    for corner in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
        assert!(inside(&hull.vertices, Vec2::new(corner.0, corner.1)));
    }
}

#[test]
fn blank_image_has_no_hull() {
    let data = vec![0u8; 32 * 16];
    let view = PixelView::new(32, 16, 1, &data).unwrap();
    for planes in [3, 4, 16] {
        assert!(convex_hull(planes, &view).unwrap().is_none());
    }
}

#[test]
fn axis_aligned_square_hull() {
    // opaque 8x8 square centered in a 16x16 image
    let mut data = vec![0u8; 16 * 16];
    for y in 4..12 {
        for x in 4..12 {
            data[y * 16 + x] = 255;
        }
    }
    let view = PixelView::new(16, 16, 1, &data).unwrap();
    let hull = convex_hull(4, &view).unwrap().unwrap();
    let mut corners: Vec<(i32, i32)> = hull
        .vertices
        .iter()
        .map(|v| ((v.x * 100.0).round() as i32, (v.y * 100.0).round() as i32))
        .collect();
    corners.sort();
    assert_eq!(corners, vec![(-25, -25), (-25, 25), (25, -25), (25, 25)]);
}
