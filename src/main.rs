use std::path::PathBuf;

use anyhow::{Context, Result};
use kurbo::{Point, Vec2};
use liquify_engine::{
    deserialize_document, warp_image, Document, Kernel, Node, Settings, WarpKind, WarpPath,
};

/// A small showcase document: a radial bulge and a linear push along a line.
fn demo_document(width: f64, height: f64) -> Document {
    let mut doc = Document::new();

    let center = Point::new(width * 0.35, height * 0.5);
    let mut bulge = Node::move_to(center);
    bulge.warp.kind = WarpKind::RadialGrow;
    bulge.warp.radius = center + Vec2::new(width.min(height) * 0.2, 0.0);
    bulge.warp.strength = center + Vec2::new(width.min(height) * 0.08, 0.0);
    doc.paths.push(WarpPath::new(bulge));

    let a = Point::new(width * 0.55, height * 0.3);
    let b = Point::new(width * 0.8, height * 0.7);
    let radius = width.min(height) * 0.1;
    let mut head = Node::move_to(a);
    head.warp.radius = a + Vec2::new(radius, 0.0);
    head.warp.strength = a + Vec2::new(0.0, -radius * 0.5);
    let mut tail = Node::line_to(b);
    tail.warp.radius = b + Vec2::new(radius, 0.0);
    tail.warp.strength = b + Vec2::new(0.0, -radius * 0.5);
    let mut path = WarpPath::new(head);
    path.push(tail);
    doc.paths.push(path);

    doc
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input_path = PathBuf::from(args.next().unwrap_or_else(|| "input.png".into()));
    let output_path = PathBuf::from(args.next().unwrap_or_else(|| "output.png".into()));
    let blob_path = args.next().map(PathBuf::from);

    println!("Loading {}...", input_path.display());
    let input = image::open(&input_path)
        .with_context(|| format!("cannot open {}", input_path.display()))?
        .into_rgba32f();
    let (width, height) = input.dimensions();

    let doc = match blob_path {
        Some(path) => {
            let blob = std::fs::read(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            deserialize_document(&blob).context("malformed parameter blob")?
        }
        None => demo_document(width as f64, height as f64),
    };

    let settings = Settings::load(&PathBuf::from("liquify.json")).unwrap_or_default();
    let kernel: Kernel = settings.kernel;

    println!("Warping {}x{} with {:?}...", width, height, kernel);
    let out = warp_image(&doc, &input, kernel)?;

    image::DynamicImage::ImageRgba32F(out)
        .into_rgba8()
        .save(&output_path)
        .with_context(|| format!("cannot write {}", output_path.display()))?;
    println!("Wrote {}", output_path.display());
    Ok(())
}
