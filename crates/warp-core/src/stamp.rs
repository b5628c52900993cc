//! Round warp stamps.
//!
//! A stamp is a bounded vector field around a warp's anchor. The field
//! magnitude tapers with distance from the center following the hardness
//! curve: a cubic Bézier from (0,1) to (1,0) whose interior control points
//! sit at (control1, 1) and (control2, 0), reparameterized by x. That
//! construction pins f(0) = 1 and f(radius) = 0 with flat tangents at both
//! ends, which keeps the warp free of ringing at the center and the rim.

use glam::Vec2 as Vec2f;
use kurbo::Point;
use warp_data::{Warp, WarpKind};

use crate::bezier::sample_cubic;
use crate::rect::IRect;

/// Lookup oversampling: table entries per pixel of radius.
pub const LOOKUP_OVERSAMPLE: usize = 10;

/// Intensity lookup table of `size + 1` entries covering distances
/// 0 ..= size. Entry 0 is 1.0, the last entry is 0.0.
pub fn hardness_lut(size: usize, control1: f64, control2: f64) -> Vec<f32> {
    let c1 = control1.clamp(0.0, 1.0);
    let c2 = control2.clamp(0.0, 1.0);

    // The curve's x(t) is monotonic for control x-coordinates inside [0,1],
    // so we can reparameterize by scanning the samples once.
    let curve = sample_cubic(
        Point::new(0.0, 1.0),
        Point::new(c1, 1.0),
        Point::new(c2, 0.0),
        Point::new(1.0, 0.0),
        size + 1,
    );

    let mut lut = vec![0.0f32; size + 1];
    lut[0] = 1.0;
    let step = 1.0 / size as f64;
    let mut x = 0.0;
    let mut j = 1;
    for value in lut.iter_mut().take(size).skip(1) {
        x += step;
        while curve[j].x < x {
            j += 1;
        }
        let dx = curve[j].x - curve[j - 1].x;
        let t = if dx > 0.0 { (x - curve[j - 1].x) / dx } else { 0.0 };
        *value = (curve[j - 1].y + t * (curve[j].y - curve[j - 1].y)) as f32;
    }
    lut[size] = 0.0;
    lut
}

/// A stamp's vector field over its square window. The extent is relative to
/// the warp's anchor: x = y = -radius, side 2 * radius + 1.
#[derive(Debug, Clone)]
pub struct Stamp {
    pub extent: IRect,
    data: Vec<Vec2f>,
}

impl Stamp {
    pub fn data(&self) -> &[Vec2f] {
        &self.data
    }

    pub fn get(&self, x: i32, y: i32) -> Vec2f {
        let w = self.extent.width;
        self.data[((y - self.extent.y) * w + (x - self.extent.x)) as usize]
    }
}

/// The window a warp's stamp occupies, in absolute raw-frame pixels.
/// None for degenerate (zero-radius) warps.
pub fn stamp_extent(warp: &Warp) -> Option<IRect> {
    let r = warp.radius_px().round() as i32;
    if r < 1 {
        return None;
    }
    Some(IRect::new(
        warp.point.x.round() as i32 - r,
        warp.point.y.round() as i32 - r,
        2 * r + 1,
        2 * r + 1,
    ))
}

/// Build the round stamp for one sampled warp; degenerate warps build
/// nothing.
///
/// Linear stamps push every pixel along the strength vector; radial stamps
/// push along (grow) or against (shrink) the pixel's own offset from the
/// center. The 0.5 factor makes the warp start to degenerate only once the
/// strength arrow crosses the radius. Each symmetric class of eight pixels
/// shares one distance computation.
pub fn build_round_stamp(warp: &Warp) -> Option<Stamp> {
    let r = warp.radius_px().round() as i32;
    if r < 1 {
        return None;
    }
    let width = 2 * r + 1;
    let mut data = vec![Vec2f::ZERO; (width * width) as usize];

    let strength = 0.5 * warp.strength_vec();
    let strength_f = Vec2f::new(strength.x as f32, strength.y as f32);
    let abs_strength = strength.hypot();

    let table_size = r as usize * LOOKUP_OVERSAMPLE;
    let lut = hardness_lut(table_size, warp.control1, warp.control2);

    let mut set = |dx: i32, dy: i32, v: Vec2f| {
        data[((r + dy) * width + (r + dx)) as usize] = v;
    };

    for y in 0..=r {
        for x in y..=r {
            let dist = ((x * x + y * y) as f64).sqrt();
            let idist = (dist * LOOKUP_OVERSAMPLE as f64).round() as usize;
            if idist >= table_size {
                // Distance only grows along the rest of this row.
                break;
            }
            let taper = lut[idist];

            // The eight octant mirrors of (x, y).
            let octants = [
                (x, -y),
                (y, -x),
                (-y, -x),
                (-x, -y),
                (-x, y),
                (-y, x),
                (y, x),
                (x, y),
            ];
            match warp.kind {
                WarpKind::Linear => {
                    let v = strength_f * taper;
                    for (dx, dy) in octants {
                        set(dx, dy, v);
                    }
                }
                WarpKind::RadialGrow | WarpKind::RadialShrink => {
                    let mut a = (abs_strength * taper as f64 / r as f64) as f32;
                    if warp.kind == WarpKind::RadialShrink {
                        a = -a;
                    }
                    for (dx, dy) in octants {
                        set(dx, dy, a * Vec2f::new(dx as f32, dy as f32));
                    }
                }
            }
        }
    }

    Some(Stamp {
        extent: IRect::new(-r, -r, width, width),
        data,
    })
}
