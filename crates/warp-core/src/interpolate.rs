//! The warp interpolator.
//!
//! Walks every path of a document and emits a dense, finite, path-ordered
//! sequence of sampled warps. Consecutive samples advance along the path by
//! [`STAMP_RELOCATION`] of the local radius, so stamp density scales with
//! stamp size.

use kurbo::{Point, Vec2};
use log::trace;
use warp_data::{Document, NodeKind, Warp};

use crate::bezier::{
    arc_length, point_at_arc_length, sample_cubic, ArcCursor, INTERPOLATION_POINTS,
};

/// Fraction of the local radius by which successive stamps advance.
pub const STAMP_RELOCATION: f64 = 0.1;

/// Steps shorter than this would stall the walk; the segment is abandoned
/// instead (a degenerate warp produces no stamp anyway).
const MIN_STEP: f64 = 1e-6;

fn mix(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Blend two warps at the point `pt`, `t` of the way from `w1` to `w2`.
///
/// Hardness controls and the radius magnitude blend linearly; the strength
/// vector blends in polar form so its direction swings smoothly along the
/// path instead of collapsing through the anchor.
fn mix_warps(w1: &Warp, w2: &Warp, pt: Point, t: f64) -> Warp {
    let radius = mix(w1.radius_px(), w2.radius_px(), t);

    let s1 = w1.strength_vec();
    let s2 = w2.strength_vec();
    let r = mix(s1.hypot(), s2.hypot(), t);
    let phi = mix(s1.atan2(), s2.atan2(), t);

    Warp {
        point: pt,
        strength: pt + r * Vec2::from_angle(phi),
        radius: pt + Vec2::new(radius, 0.0),
        control1: mix(w1.control1, w2.control1, t),
        control2: mix(w1.control2, w2.control2, t),
        kind: w1.kind,
    }
}

/// Emit samples for one segment by walking `points` (a polyline of the
/// segment) from arc length 0 to `total_length`.
fn walk_segment(out: &mut Vec<Warp>, points: &[Point], w1: &Warp, w2: &Warp, total_length: f64) {
    let mut cursor = ArcCursor::default();
    let mut s = 0.0;
    while s < total_length {
        let pt = point_at_arc_length(points, s, &mut cursor);
        let mut w = mix_warps(w1, w2, pt, s / total_length);
        // Each stamp only carries its share of the stroke.
        w.strength = w.point.lerp(w.strength, STAMP_RELOCATION);

        let step = w.radius_px() * STAMP_RELOCATION;
        if step < MIN_STEP {
            break;
        }
        s += step;
        out.push(w);
    }
}

/// Flatten a document into the ordered list of sampled warps feeding the
/// stamp compositor.
pub fn interpolate_paths(doc: &Document) -> Vec<Warp> {
    let mut out = Vec::new();

    for path in &doc.paths {
        for (prev, node) in path.segments() {
            let Some(prev) = prev else {
                // A lone MoveTo is a single free-standing warp.
                if path.len() == 1 {
                    out.push(node.warp);
                }
                continue;
            };

            let p1 = prev.point();
            let p2 = node.point();
            match node.kind {
                NodeKind::LineTo => {
                    let total = (p2 - p1).hypot();
                    let line = [p1, p2];
                    walk_segment(&mut out, &line, &prev.warp, &node.warp, total);
                }
                NodeKind::CurveTo { ctrl1, ctrl2 } => {
                    let points = sample_cubic(p1, ctrl1, ctrl2, p2, INTERPOLATION_POINTS);
                    let total = arc_length(&points);
                    walk_segment(&mut out, &points, &prev.warp, &node.warp, total);
                }
                // MoveTo never follows another node; ClosePath carries no
                // stroke of its own.
                NodeKind::MoveTo | NodeKind::ClosePath => {}
            }
        }
    }

    trace!("interpolated {} stamps", out.len());
    out
}
