//! The spline smoother.
//!
//! Fills in the control points of curve segments so a run of knots flows
//! smoothly, honoring each knot's node type. For each path we build a
//! tridiagonal linear system over the first control points and solve it with
//! the Thomas algorithm, then derive the second control points.
//!
//! Each segment picks one of nine equations from its (start, end) tag pair.
//! "Straight" means the path runs straight into the knot (second derivative
//! zero there), "smooth" means first and second derivatives are continuous
//! through the knot, "keep" means the control point stays as the user set it:
//!
//! ```text
//!      start     end
//!   1: straight  smooth
//!   2: smooth    smooth
//!   3: smooth    straight
//!   4: keep      smooth
//!   5: keep      keep
//!   6: smooth    keep
//!   7: keep      straight
//!   8: straight  straight   (yields a line)
//!   9: straight  keep
//! ```
//!
//! Closed paths are smoothed as open paths; a cyclic system cannot be written
//! as a tridiagonal one, and ClosePath segments always select "keep".

use kurbo::Vec2;
use warp_data::{Document, NodeKind, NodeType, WarpPath};

/// Solve one path's system. `k` holds the n knots, `c1`/`c2` the n-1 control
/// points (in/out), `eqn` the per-segment equation choice.
fn solve_tridiagonal(k: &[Vec2], c1: &mut [Vec2], c2: &mut [Vec2], eqn: &[u8]) {
    let n = k.len() - 1; // number of segments / unknowns
    let mut a = vec![0.0f64; n]; // subdiagonal
    let mut b = vec![0.0f64; n]; // main diagonal
    let mut c = vec![0.0f64; n]; // superdiagonal
    let mut d = vec![Vec2::ZERO; n]; // right hand side

    for i in 0..n {
        let (ai, bi, ci, di) = match eqn[i] {
            1 => (0.0, 2.0, 1.0, k[i] + 2.0 * k[i + 1]),
            2 => (1.0, 4.0, 1.0, 4.0 * k[i] + 2.0 * k[i + 1]),
            3 => (2.0, 7.0, 0.0, 8.0 * k[i] + k[i + 1]),
            4 | 5 | 7 => (0.0, 1.0, 0.0, c1[i]),
            6 => (1.0, 4.0, 0.0, 4.0 * k[i] + c2[i]),
            8 => (0.0, 3.0, 0.0, 2.0 * k[i] + k[i + 1]),
            9 => (0.0, 2.0, 0.0, k[i] + c2[i]),
            other => unreachable!("equation {other} out of range"),
        };
        a[i] = ai;
        b[i] = bi;
        c[i] = ci;
        d[i] = di;
    }

    // Thomas elimination.
    for i in 1..n {
        let m = a[i] / b[i - 1];
        b[i] -= m * c[i - 1];
        d[i] = d[i] - m * d[i - 1];
    }
    c1[n - 1] = d[n - 1] / b[n - 1];
    for i in (0..n - 1).rev() {
        c1[i] = (d[i] - c[i] * c1[i + 1]) / b[i];
    }

    // Derive the second control points.
    for i in 0..n {
        match eqn[i] {
            // keep end: untouched
            5 | 6 | 9 => {}
            // straight end: halfway between c1 and the end knot
            3 | 7 | 8 => c2[i] = (c1[i] + k[i + 1]) / 2.0,
            // smooth end: mirror the next segment's c1 around the knot
            _ => {
                if i + 1 < n {
                    c2[i] = 2.0 * k[i + 1] - c1[i + 1];
                } else {
                    c2[i] = (c1[i] + k[i + 1]) / 2.0;
                }
            }
        }
    }
}

fn segment_equation(path: &WarpPath, k: usize) -> u8 {
    let nodes = path.nodes();
    let d = &nodes[k];
    let next = nodes.get(k + 1);
    let next_next = nodes.get(k + 2);

    let autosmooth = d.node_type == NodeType::AutoSmooth;
    let next_autosmooth = next.is_some_and(|n| n.node_type == NodeType::AutoSmooth);
    // The adjoining segments: a missing or non-curve neighbor makes the
    // boundary "straight" territory.
    let first_seg = k == 0 || !d.kind.is_curve();
    let last_seg = next_next.map_or(true, |n| !n.kind.is_curve());
    let curve_seg = next.is_some_and(|n| n.kind.is_curve());

    if !curve_seg {
        // Lines and path closures keep whatever is stored.
        return 5;
    }
    if !autosmooth && !next_autosmooth {
        return 5;
    }
    if first_seg && last_seg {
        return match (autosmooth, next_autosmooth) {
            (false, true) => 7,
            (true, true) => 8,
            (true, false) => 9,
            (false, false) => unreachable!("handled above"),
        };
    }
    if first_seg && autosmooth {
        return 1;
    }
    if last_seg && autosmooth && next_autosmooth {
        return 3;
    }
    if last_seg && !autosmooth && next_autosmooth {
        return 7;
    }
    if autosmooth && !next_autosmooth {
        return 6;
    }
    if !autosmooth && next_autosmooth {
        return 4;
    }
    2
}

fn smooth_path(path: &mut WarpPath) {
    let n = path.len();
    if n < 2 {
        return;
    }

    let mut knots = vec![Vec2::ZERO; n];
    let mut c1 = vec![Vec2::ZERO; n - 1];
    let mut c2 = vec![Vec2::ZERO; n - 1];
    let mut eqn = vec![5u8; n - 1];

    for (k, node) in path.nodes().iter().enumerate() {
        knots[k] = node.point().to_vec2();
        if k > 0 {
            if let NodeKind::CurveTo { ctrl1, ctrl2 } = node.kind {
                c1[k - 1] = ctrl1.to_vec2();
                c2[k - 1] = ctrl2.to_vec2();
            }
        }
        if k < n - 1 {
            eqn[k] = segment_equation(path, k);
        }
    }

    solve_tridiagonal(&knots, &mut c1, &mut c2, &eqn);

    for (k, node) in path.nodes_mut().iter_mut().enumerate().skip(1) {
        if let NodeKind::CurveTo { ctrl1, ctrl2 } = &mut node.kind {
            *ctrl1 = c1[k - 1].to_point();
            *ctrl2 = c2[k - 1].to_point();
        }
    }
}

/// Fill in the derived control points of every path in the document.
pub fn smooth_paths(doc: &mut Document) {
    for path in &mut doc.paths {
        smooth_path(path);
    }
}
