//! End-to-end scenarios for the warp pipeline: documents in, pixels out.

use kurbo::{Point, Vec2};
use liquify_engine::coords::Identity;
use liquify_engine::{
    process, CancelToken, Document, IRect, Kernel, Node, WarpKind, WarpPath,
};
use warp_core::resample::CHANNELS;
use warp_core::{build_map, interpolate_paths};

const W: usize = 100;
const H: usize = 100;

/// f(x, y) = x on all four channels.
fn ramp_image() -> Vec<f32> {
    let mut buf = vec![0.0f32; CHANNELS * W * H];
    for y in 0..H {
        for x in 0..W {
            for c in 0..CHANNELS {
                buf[CHANNELS * (y * W + x) + c] = x as f32;
            }
        }
    }
    buf
}

fn full_roi() -> IRect {
    IRect::new(0, 0, W as i32, H as i32)
}

fn run(doc: &Document, input: &[f32], kernel: Kernel) -> Vec<f32> {
    let mut output = vec![0.0f32; input.len()];
    process(
        doc,
        &Identity,
        input,
        &mut output,
        &full_roi(),
        &full_roi(),
        kernel,
        &CancelToken::new(),
    )
    .unwrap();
    output
}

fn pixel(buf: &[f32], x: usize, y: usize) -> f32 {
    buf[CHANNELS * (y * W + x)]
}

fn grow_doc() -> Document {
    let p = Point::new(50.0, 50.0);
    let mut node = Node::move_to(p);
    node.warp.kind = WarpKind::RadialGrow;
    node.warp.radius = p + Vec2::new(20.0, 0.0);
    node.warp.strength = p + Vec2::new(10.0, 0.0);
    node.warp.control1 = 0.5;
    node.warp.control2 = 0.5;
    let mut doc = Document::new();
    doc.paths.push(WarpPath::new(node));
    doc
}

#[test]
fn identity_line_leaves_pixels_untouched() {
    // A line of warps whose strength equals the anchor pushes nothing:
    // the output is pixel-identical to the input.
    let a = Point::new(30.0, 50.0);
    let b = Point::new(70.0, 50.0);
    let mut head = Node::move_to(a);
    head.warp.radius = a + Vec2::new(10.0, 0.0);
    let mut tail = Node::line_to(b);
    tail.warp.radius = b + Vec2::new(10.0, 0.0);
    let mut path = WarpPath::new(head);
    path.push(tail);
    let mut doc = Document::new();
    doc.paths.push(path);

    let input = ramp_image();
    let output = run(&doc, &input, Kernel::Bilinear);
    assert_eq!(input, output);
}

#[test]
fn zero_radius_warp_is_invisible() {
    // radius == anchor: the stamp is degenerate, the map empty, the output
    // a plain copy.
    let p = Point::new(50.0, 50.0);
    let mut node = Node::move_to(p);
    node.warp.strength = p + Vec2::new(30.0, 0.0);
    let mut doc = Document::new();
    doc.paths.push(WarpPath::new(node));

    let warps = interpolate_paths(&doc);
    assert!(build_map(&warps, &full_roi(), &CancelToken::new())
        .unwrap()
        .is_none());

    let input = ramp_image();
    let output = run(&doc, &input, Kernel::Bilinear);
    assert_eq!(input, output);
}

#[test]
fn radial_grow_pulls_samples_toward_center() {
    // On the +x axis of a grow warp the output must sample from nearer the
    // center, i.e. read a smaller ramp value.
    let doc = grow_doc();
    let input = ramp_image();
    let output = run(&doc, &input, Kernel::Bicubic);

    assert!(pixel(&output, 60, 50) < 60.0);
    assert!(pixel(&output, 40, 50) > 40.0);
    // Anchor and rim stay put.
    assert_eq!(pixel(&output, 50, 50), 50.0);
    assert_eq!(pixel(&output, 70, 50), 70.0);
    // Displacement on the y axis is purely vertical, so the ramp value
    // is unchanged there.
    assert_eq!(pixel(&output, 50, 60), 50.0);
}

#[test]
fn bicubic_follows_the_map_exactly_on_a_ramp() {
    // With input f(x, y) = x, the resampled value at a displaced pixel
    // equals the sampling position itself.
    let doc = grow_doc();
    let warps = interpolate_paths(&doc);
    let map = build_map(&warps, &full_roi(), &CancelToken::new())
        .unwrap()
        .unwrap();

    let input = ramp_image();
    let output = run(&doc, &input, Kernel::Bicubic);

    // The half-radius point lands on the kernel table grid exactly.
    let v = map.get(60, 50);
    let got = pixel(&output, 60, 50);
    assert!(
        (got - (60.0 + v.x)).abs() < 1e-3,
        "at (60,50): got {got}, expected {}",
        60.0 + v.x
    );

    // Elsewhere the tabulated kernel quantizes the sampling position to
    // 1/100 px, so allow that much slack.
    for (x, y) in [(58, 50), (44, 50), (55, 55)] {
        let v = map.get(x as i32, y as i32);
        let expect = x as f32 + v.x;
        let got = pixel(&output, x, y);
        assert!(
            (got - expect).abs() < 2e-2,
            "at ({x},{y}): got {got}, expected {expect}"
        );
    }
}

#[test]
fn grow_and_shrink_cancel_on_the_ramp() {
    // A shrink warp mirrors the grow warp's sampling positions.
    let grow = grow_doc();
    let mut shrink = grow_doc();
    shrink.paths[0].nodes_mut()[0].warp.kind = WarpKind::RadialShrink;

    let input = ramp_image();
    let out_grow = run(&grow, &input, Kernel::Bilinear);
    let out_shrink = run(&shrink, &input, Kernel::Bilinear);

    for (x, y) in [(60, 50), (42, 50), (55, 47)] {
        let d_grow = pixel(&out_grow, x, y) - x as f32;
        let d_shrink = pixel(&out_shrink, x, y) - x as f32;
        assert!(
            (d_grow + d_shrink).abs() < 1e-3,
            "asymmetric at ({x},{y}): {d_grow} vs {d_shrink}"
        );
    }
}

#[test]
fn all_kernels_produce_finite_output() {
    let doc = grow_doc();
    let input = ramp_image();
    for kernel in [
        Kernel::Bilinear,
        Kernel::Bicubic,
        Kernel::Lanczos2,
        Kernel::Lanczos3,
    ] {
        let output = run(&doc, &input, kernel);
        assert!(output.iter().all(|v| v.is_finite()), "{kernel:?}");
        // The warp only ever redistributes ramp values.
        assert!(output.iter().all(|v| *v >= -1.0 && *v < W as f32 + 1.0));
    }
}

#[test]
fn warped_line_moves_pixels_along_its_stroke() {
    // A linear warp along a horizontal path with upward strength drags
    // samples from below: the warped row reads values from lower rows.
    let a = Point::new(30.0, 50.0);
    let b = Point::new(70.0, 50.0);
    let mut head = Node::move_to(a);
    head.warp.radius = a + Vec2::new(12.0, 0.0);
    head.warp.strength = a + Vec2::new(0.0, -8.0);
    let mut tail = Node::line_to(b);
    tail.warp.radius = b + Vec2::new(12.0, 0.0);
    tail.warp.strength = b + Vec2::new(0.0, -8.0);
    let mut path = WarpPath::new(head);
    path.push(tail);
    let mut doc = Document::new();
    doc.paths.push(path);

    // Vertical ramp this time: f(x, y) = y.
    let mut input = vec![0.0f32; CHANNELS * W * H];
    for y in 0..H {
        for x in 0..W {
            for c in 0..CHANNELS {
                input[CHANNELS * (y * W + x) + c] = y as f32;
            }
        }
    }

    let mut output = vec![0.0f32; input.len()];
    process(
        &doc,
        &Identity,
        &input,
        &mut output,
        &full_roi(),
        &full_roi(),
        Kernel::Bilinear,
        &CancelToken::new(),
    )
    .unwrap();

    // Upward strength at the stroke means sampling from larger y.
    let got = output[CHANNELS * (50 * W + 50)];
    assert!(got > 50.0, "expected a downward pull, got {got}");
}

#[test]
fn cancellation_surfaces_as_an_error() {
    let doc = grow_doc();
    let input = ramp_image();
    let mut output = vec![0.0f32; input.len()];
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = process(
        &doc,
        &Identity,
        &input,
        &mut output,
        &full_roi(),
        &full_roi(),
        Kernel::Bilinear,
        &cancel,
    );
    assert!(err.is_err());
}
