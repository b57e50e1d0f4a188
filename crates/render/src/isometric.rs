//! Isometric head compositing.
//!
//! Three faces of the head cube (right, front, top) are sheared onto a
//! transparent canvas, first from the base layer and then from the overlay
//! ("hat") layer at 1.1x scale. Sampling is nearest-neighbour and faces are
//! blended source-over in draw order.

use image::{Pixel, Rgba, RgbaImage};

use crate::RenderError;

/// Render size used for cached catalog images.
pub const DEFAULT_RENDER_SIZE: u32 = 64;
/// Largest accepted render size; larger requests are clamped.
pub const MAX_RENDER_SIZE: u32 = 1024;
/// Edge length of a head face in skin pixels.
pub const FACE_PIXELS: u32 = 8;
/// Overlay layer scale relative to the base layer.
pub const OUTER_SCALE: f32 = 1.1;

const SIDE_STRETCH: f32 = 1.15;
const WIDTH_FACTOR: f32 = 2.3;
const HEIGHT_FACTOR: f32 = 2.7;
const CENTER_OFFSET: f32 = 0.54;

/// Minimum skin dimensions covering both head layers.
pub const MIN_SKIN_WIDTH: u32 = 48;
/// See [`MIN_SKIN_WIDTH`].
pub const MIN_SKIN_HEIGHT: u32 = 16;

/// Which face of the cube a region represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Right,
    Front,
    Top,
}

/// An 8x8 skin region.
#[derive(Debug, Clone, Copy)]
struct FaceRegion {
    face: Face,
    x: u32,
    y: u32,
    rotate_180: bool,
}

const fn region(face: Face, x: u32, y: u32) -> FaceRegion {
    FaceRegion {
        face,
        x,
        y,
        rotate_180: matches!(face, Face::Top),
    }
}

/// Base layer, in draw order.
const INNER: [FaceRegion; 3] = [
    region(Face::Right, 0, 8),
    region(Face::Front, 8, 8),
    region(Face::Top, 8, 0),
];

/// Overlay layer, in draw order.
const OUTER: [FaceRegion; 3] = [
    region(Face::Right, 32, 8),
    region(Face::Front, 40, 8),
    region(Face::Top, 40, 0),
];

/// 2D affine map from face coordinates `(u, v)` to canvas coordinates.
///
/// `x = tx + m00*u + m01*v`, `y = ty + m10*u + m11*v`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    tx: f32,
    ty: f32,
    m00: f32,
    m01: f32,
    m10: f32,
    m11: f32,
}

impl Affine {
    /// Translate, then shear by `(a, b, c, d)`, then scale by `(sx, sy)`.
    fn compose(origin: (f32, f32), shear: [f32; 4], scale: (f32, f32)) -> Self {
        let [a, b, c, d] = shear;
        Self {
            tx: origin.0,
            ty: origin.1,
            m00: a * scale.0,
            m01: c * scale.1,
            m10: b * scale.0,
            m11: d * scale.1,
        }
    }

    fn apply(&self, u: f32, v: f32) -> (f32, f32) {
        (
            self.tx + self.m00 * u + self.m01 * v,
            self.ty + self.m10 * u + self.m11 * v,
        )
    }

    fn invert(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let det = self.m00 * self.m11 - self.m01 * self.m10;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let dx = x - self.tx;
        let dy = y - self.ty;
        Some((
            (self.m11 * dx - self.m01 * dy) / det,
            (self.m00 * dy - self.m10 * dx) / det,
        ))
    }
}

/// Canvas dimensions for a render size, clamped to `1..=MAX_RENDER_SIZE`.
pub fn canvas_size(size: u32) -> (u32, u32) {
    let size = clamp_size(size) as f32;
    (
        (size * WIDTH_FACTOR).ceil() as u32,
        (size * HEIGHT_FACTOR).ceil() as u32,
    )
}

pub(crate) fn clamp_size(size: u32) -> u32 {
    size.clamp(1, MAX_RENDER_SIZE)
}

fn face_transform(face: Face, center: (f32, f32), scale: f32) -> Affine {
    let face_size = FACE_PIXELS as f32 * scale;
    let (cx, cy) = center;
    match face {
        Face::Right => Affine::compose(
            (cx - face_size, cy - face_size),
            [1.0, 0.5, 0.0, 1.0],
            (scale, scale * SIDE_STRETCH),
        ),
        Face::Front => Affine::compose(
            (cx, cy - face_size / 2.0),
            [1.0, -0.5, 0.0, 1.0],
            (scale, scale * SIDE_STRETCH),
        ),
        Face::Top => Affine::compose(
            (cx, cy - face_size / 2.0),
            [1.0, -0.5, -1.0, -0.5],
            (scale, scale),
        ),
    }
}

fn sample(skin: &RgbaImage, region: FaceRegion, u: u32, v: u32) -> Rgba<u8> {
    let (u, v) = if region.rotate_180 {
        (FACE_PIXELS - 1 - u, FACE_PIXELS - 1 - v)
    } else {
        (u, v)
    };
    *skin.get_pixel(region.x + u, region.y + v)
}

fn draw_face(canvas: &mut RgbaImage, skin: &RgbaImage, region: FaceRegion, transform: Affine) {
    let edge = FACE_PIXELS as f32;
    let corners =
        [(0.0, 0.0), (edge, 0.0), (0.0, edge), (edge, edge)].map(|(u, v)| transform.apply(u, v));
    let (mut lo_x, mut lo_y, mut hi_x, mut hi_y) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
    for (x, y) in corners {
        lo_x = lo_x.min(x);
        lo_y = lo_y.min(y);
        hi_x = hi_x.max(x);
        hi_y = hi_y.max(y);
    }
    // Clamp the face's bounding box to the canvas.
    let min_x = lo_x.floor().max(0.0) as u32;
    let min_y = lo_y.floor().max(0.0) as u32;
    let max_x = (hi_x.ceil().max(0.0) as u32).min(canvas.width());
    let max_y = (hi_y.ceil().max(0.0) as u32).min(canvas.height());

    for y in min_y..max_y {
        for x in min_x..max_x {
            let Some((u, v)) = transform.invert(x as f32 + 0.5, y as f32 + 0.5) else {
                return;
            };
            if !(0.0..edge).contains(&u) || !(0.0..edge).contains(&v) {
                continue;
            }
            let texel = sample(skin, region, u as u32, v as u32);
            if texel[3] == 0 {
                continue;
            }
            canvas.get_pixel_mut(x, y).blend(&texel);
        }
    }
}

/// Composite the isometric two-layer head view of `skin` at `size`.
///
/// The output is `ceil(2.3 * size) x ceil(2.7 * size)` and depends only on
/// the skin pixels and `size`.
pub fn render_isometric(skin: &RgbaImage, size: u32) -> Result<RgbaImage, RenderError> {
    if skin.width() < MIN_SKIN_WIDTH || skin.height() < MIN_SKIN_HEIGHT {
        return Err(RenderError::SkinTooSmall {
            width: skin.width(),
            height: skin.height(),
        });
    }

    let size = clamp_size(size);
    let (width, height) = canvas_size(size);
    let mut canvas = RgbaImage::new(width, height);
    let scale = size as f32 / FACE_PIXELS as f32;
    let center = (
        width as f32 / 2.0,
        height as f32 / 2.0 + size as f32 * CENTER_OFFSET,
    );

    for (layer, layer_scale) in [(INNER, scale), (OUTER, scale * OUTER_SCALE)] {
        for region in layer {
            let transform = face_transform(region.face, center, layer_scale);
            draw_face(&mut canvas, skin, region, transform);
        }
    }
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_skin() -> RgbaImage {
        let mut skin = RgbaImage::new(64, 64);
        for (x, y, px) in skin.enumerate_pixels_mut() {
            *px = match (x, y) {
                (8..=15, 0..=7) => Rgba([255, 0, 0, 255]),
                (8..=15, 8..=15) => Rgba([0, 255, 0, 255]),
                (0..=7, 8..=15) => Rgba([0, 0, 255, 255]),
                _ => Rgba([0, 0, 0, 0]),
            };
        }
        skin
    }

    #[test]
    fn canvas_matches_reference_dimensions() {
        assert_eq!(canvas_size(64), (148, 173));
        assert_eq!(canvas_size(112), (258, 303));
        let out = render_isometric(&solid_skin(), DEFAULT_RENDER_SIZE).unwrap();
        assert_eq!(out.dimensions(), (148, 173));
    }

    #[test]
    fn oversized_requests_are_clamped() {
        assert_eq!(canvas_size(100_000), canvas_size(MAX_RENDER_SIZE));
        assert_eq!(canvas_size(0), canvas_size(1));
        let out = render_isometric(&solid_skin(), 0).unwrap();
        assert_eq!(out.dimensions(), canvas_size(1));
    }

    #[test]
    fn affine_inverse_round_trips() {
        let t = face_transform(Face::Top, (74.0, 121.0), 8.0);
        let (x, y) = t.apply(3.25, 6.5);
        let (u, v) = t.invert(x, y).unwrap();
        assert!((u - 3.25).abs() < 1e-3 && (v - 6.5).abs() < 1e-3);
    }

    #[test]
    fn faces_land_on_expected_sides() {
        let out = render_isometric(&solid_skin(), 64).unwrap();
        let center = (74.0_f32, 173.0_f32 / 2.0 + 64.0 * 0.54);
        // Middle of each face in face coordinates, mapped to the canvas.
        let probe = |face| {
            let (x, y) = face_transform(face, center, 8.0).apply(4.0, 4.0);
            out.get_pixel(x as u32, y as u32).0
        };
        assert_eq!(probe(Face::Right), [0, 0, 255, 255]);
        assert_eq!(probe(Face::Front), [0, 255, 0, 255]);
        assert_eq!(probe(Face::Top), [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn rejects_undersized_skins() {
        let skin = RgbaImage::new(32, 32);
        assert!(matches!(
            render_isometric(&skin, 64),
            Err(RenderError::SkinTooSmall { width: 32, height: 32 })
        ));
    }
}
