//! Pixel pipeline entry points.
//!
//! Both operations here are pure functions of an immutable document
//! snapshot: the host may evaluate them on worker threads while the editor
//! keeps mutating its own copy under the session lock. Buffers are
//! channel-interleaved RGBA f32, addressed by integer regions of interest
//! in the pipeline frame.

use log::debug;

use warp_core::resample::CHANNELS;
use warp_core::{
    apply_map, build_map, copy_through, interpolate_paths, map_extent, CancelToken, IRect, Kernel,
};
use warp_data::Document;

use crate::coords::{transform_document, CoordTransform};
use crate::errors::LiquifyError;

fn check_roi(buf_len: usize, roi: &IRect) -> Result<(), LiquifyError> {
    let need = CHANNELS * roi.width.max(0) as usize * roi.height.max(0) as usize;
    if buf_len < need {
        return Err(LiquifyError::BufferSize {
            need,
            got: buf_len,
        });
    }
    Ok(())
}

/// Transform a snapshot into the pipeline frame and interpolate it.
fn pipeline_warps(doc: &Document, transform: &dyn CoordTransform) -> Vec<warp_data::Warp> {
    let mut doc = doc.clone();
    transform_document(&mut doc, transform);
    interpolate_paths(&doc)
}

/// The sampling region the host must provide for `roi_out`: the output
/// region grown by every stamp that touches it, clamped to the full pipe
/// rect. Mirrors the host's region-of-interest negotiation.
pub fn compute_roi_in(
    doc: &Document,
    transform: &dyn CoordTransform,
    roi_out: &IRect,
    pipe: &IRect,
) -> IRect {
    let warps = pipeline_warps(doc, transform);
    match map_extent(roi_out, &warps) {
        Some(extent) => roi_out.union(&extent).intersection(pipe),
        None => *roi_out,
    }
}

/// Evaluate the document over one tile: copy the input through, build the
/// displacement map, resample every displaced pixel.
///
/// `roi_out` must lie inside `roi_in`. An empty stamp set degenerates to the
/// plain copy. Cancellation surfaces as an error and leaves the output
/// undefined.
#[allow(clippy::too_many_arguments)]
pub fn process(
    doc: &Document,
    transform: &dyn CoordTransform,
    input: &[f32],
    output: &mut [f32],
    roi_in: &IRect,
    roi_out: &IRect,
    kernel: Kernel,
    cancel: &CancelToken,
) -> Result<(), LiquifyError> {
    check_roi(input.len(), roi_in)?;
    check_roi(output.len(), roi_out)?;
    if roi_in.intersection(roi_out) != *roi_out {
        return Err(LiquifyError::RoiMismatch);
    }

    copy_through(input, output, roi_in, roi_out);

    let warps = pipeline_warps(doc, transform);
    let Some(map) = build_map(&warps, roi_out, cancel)? else {
        debug!("no stamp intersects the output region; identity");
        return Ok(());
    };
    apply_map(input, output, roi_in, roi_out, &map, kernel, cancel)?;
    Ok(())
}

/// Convenience wrapper for whole-image buffers in the raw frame.
pub fn process_image(
    doc: &Document,
    input: &[f32],
    output: &mut [f32],
    width: u32,
    height: u32,
    kernel: Kernel,
) -> Result<(), LiquifyError> {
    let roi = IRect::new(0, 0, width as i32, height as i32);
    let cancel = CancelToken::new();
    process(
        doc,
        &crate::coords::Identity,
        input,
        output,
        &roi,
        &roi,
        kernel,
        &cancel,
    )
}
