//! Geometry primitives: cubic Bézier sampling, arc-length walking, Casteljau
//! subdivision and nearest-point queries.

use kurbo::{CubicBez, ParamCurve, Point, Vec2};

/// Number of polyline samples used when interpolating a Bézier segment.
pub const INTERPOLATION_POINTS: usize = 100;

/// Sample a cubic Bézier into `n` points, endpoints included.
///
/// The Bernstein basis is converted to the polynomial basis first so every
/// sample costs three multiply-adds per component.
pub fn sample_cubic(p0: Point, p1: Point, p2: Point, p3: Point, n: usize) -> Vec<Point> {
    assert!(n >= 2);
    let a = p3.to_vec2() - 3.0 * p2.to_vec2() + 3.0 * p1.to_vec2() - p0.to_vec2();
    let b = 3.0 * p2.to_vec2() - 6.0 * p1.to_vec2() + 3.0 * p0.to_vec2();
    let c = 3.0 * p1.to_vec2() - 3.0 * p0.to_vec2();
    let d = p0.to_vec2();

    let mut buf = Vec::with_capacity(n);
    buf.push(p0);
    let step = 1.0 / n as f64;
    let mut t = step;
    for _ in 1..n - 1 {
        buf.push((((a * t + b) * t + c) * t + d).to_point());
        t += step;
    }
    buf.push(p3);
    buf
}

/// Total length of a polyline.
pub fn arc_length(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1] - w[0]).hypot())
        .sum()
}

/// Resume cursor for [`point_at_arc_length`] when walking a polyline with
/// monotonically increasing arc lengths.
#[derive(Debug, Clone, Copy)]
pub struct ArcCursor {
    i: usize,
    length: f64,
}

impl Default for ArcCursor {
    fn default() -> Self {
        Self { i: 1, length: 0.0 }
    }
}

/// The point at cumulative length `arc_length` along the polyline, linearly
/// interpolated between the bracketing samples. Past the end, the last point
/// is returned. The cursor is advanced so the next (larger) query resumes
/// where this one stopped.
pub fn point_at_arc_length(points: &[Point], arc_length: f64, cursor: &mut ArcCursor) -> Point {
    let mut length = cursor.length;
    let mut i = cursor.i;

    while i < points.len() {
        let prev_length = length;
        length += (points[i] - points[i - 1]).hypot();
        if length >= arc_length {
            let t = if length > prev_length {
                (arc_length - prev_length) / (length - prev_length)
            } else {
                0.0
            };
            cursor.i = i;
            cursor.length = prev_length;
            return points[i - 1].lerp(points[i], t);
        }
        i += 1;
    }

    points[points.len() - 1]
}

/// Split a cubic at `t` into two cubics joined at the split point.
pub fn casteljau_split(c: CubicBez, t: f64) -> (CubicBez, CubicBez) {
    let p01 = c.p0.lerp(c.p1, t);
    let p12 = c.p1.lerp(c.p2, t);
    let p23 = c.p2.lerp(c.p3, t);

    let p012 = p01.lerp(p12, t);
    let p123 = p12.lerp(p23, t);

    let p0123 = p012.lerp(p123, t);

    (
        CubicBez::new(c.p0, p01, p012, p0123),
        CubicBez::new(p0123, p123, p23, c.p3),
    )
}

/// The curve parameter of the sample nearest to `q`, brute-forced over `n`
/// uniform samples. Only invoked on user clicks, so a scan is plenty.
pub fn nearest_t_on_cubic(c: CubicBez, q: Point, n: usize) -> f64 {
    let mut min_t = 0.0;
    let mut min_dist = (q - c.p0).hypot();

    for i in 0..n {
        let t = i as f64 / n as f64;
        let dist = (q - c.eval(t)).hypot();
        if dist < min_dist {
            min_dist = dist;
            min_t = t;
        }
    }
    min_t
}

/// Scalar projection of `q` onto the line through `p0` and `p1`. Outside
/// 0.0 ..= 1.0 the projection misses the segment.
pub fn nearest_t_on_line(p0: Point, p1: Point, q: Point) -> f64 {
    let b = p1 - p0;
    let len2 = b.dot(b);
    if len2 <= f64::EPSILON {
        return 0.0;
    }
    (q - p0).dot(b) / len2
}

/// Normalize, defaulting to the +x unit vector for near-zero input.
pub fn normalize_or_unit_x(v: Vec2) -> Vec2 {
    let len = v.hypot();
    if len < 1e-6 {
        Vec2::new(1.0, 0.0)
    } else {
        v / len
    }
}
