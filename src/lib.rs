//! # Liquify Engine
//!
//! `liquify-engine` is an interactive local-warp ("liquify") effect for
//! images.
//!
//! The user places warp primitives along smooth paths; the engine
//! interpolates the paths into dense stamp sequences, accumulates the stamps
//! into a per-pixel displacement map and resamples the source image through
//! it. The heavy lifting lives in the `warp-core` and `warp-data` crates;
//! this crate adds the editing session, the pixel-pipeline entry points and
//! the host collaborators (coordinates, configuration, kernel choice).

pub mod config;
pub mod coords;
pub mod editor;
pub mod errors;
pub mod pipeline;

pub use config::Settings;
pub use coords::{CoordTransform, Identity, UniformScale};
pub use editor::{Editor, Handle, HitTarget, Modifiers, MouseButton, Tool};
pub use errors::LiquifyError;
pub use pipeline::{compute_roi_in, process, process_image};

// Re-export the engine surface the host wires up.
pub use warp_core::{CancelToken, DisplacementMap, IRect, Kernel};
pub use warp_data::{
    deserialize_document, serialize_document, BlobError, Document, Node, NodeKind, NodeRef,
    NodeType, Warp, WarpKind, WarpPath,
};

use image::Rgba32FImage;

/// Apply a document to an RGBA image in the raw frame.
pub fn warp_image(
    doc: &Document,
    input: &Rgba32FImage,
    kernel: Kernel,
) -> Result<Rgba32FImage, LiquifyError> {
    let (width, height) = input.dimensions();
    let mut out = vec![0.0f32; input.as_raw().len()];
    pipeline::process_image(doc, input.as_raw(), &mut out, width, height, kernel)?;
    Ok(Rgba32FImage::from_raw(width, height, out).expect("buffer size matches dimensions"))
}
