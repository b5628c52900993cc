//! Backward resampling through the displacement map.
//!
//! Destination pixels inside the map extent are sampled from the input at
//! `pixel + map[pixel]` with a separable reconstruction kernel; everything
//! else is an identity copy. Buffers are channel-interleaved f32 with four
//! channels, addressed by integer regions of interest in the raw frame.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::distortion::DisplacementMap;
use crate::rect::IRect;
use crate::{CancelToken, EngineError};

/// Channels per pixel.
pub const CHANNELS: usize = 4;

/// Kernel tabulation density: entries per unit distance.
const LUT_RESOLUTION: usize = 100;

/// Reconstruction kernel for the resampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Bilinear,
    #[default]
    Bicubic,
    Lanczos2,
    Lanczos3,
}

impl Kernel {
    /// Half-width of the kernel support, in pixels.
    pub fn support(self) -> usize {
        match self {
            Kernel::Bilinear => 1,
            Kernel::Bicubic => 2,
            Kernel::Lanczos2 => 2,
            Kernel::Lanczos3 => 3,
        }
    }

    pub fn id(self) -> u32 {
        match self {
            Kernel::Bilinear => 0,
            Kernel::Bicubic => 1,
            Kernel::Lanczos2 => 2,
            Kernel::Lanczos3 => 3,
        }
    }

    fn eval(self, x: f64) -> f64 {
        match self {
            Kernel::Bilinear => {
                let a = x.abs();
                if a < 1.0 {
                    1.0 - a
                } else {
                    0.0
                }
            }
            Kernel::Bicubic => bicubic(-0.5, x),
            Kernel::Lanczos2 => lanczos(2.0, x),
            Kernel::Lanczos3 => lanczos(3.0, x),
        }
    }
}

impl TryFrom<u32> for Kernel {
    type Error = EngineError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(Kernel::Bilinear),
            1 => Ok(Kernel::Bicubic),
            2 => Ok(Kernel::Lanczos2),
            3 => Ok(Kernel::Lanczos3),
            other => Err(EngineError::UnknownKernel(other)),
        }
    }
}

/// Keys bicubic convolution kernel. The negative lobes (a = -0.5) give the
/// kernel linear precision: a linear ramp is reproduced exactly.
fn bicubic(a: f64, x: f64) -> f64 {
    let absx = x.abs();
    if absx <= 1.0 {
        ((a + 2.0) * absx - (a + 3.0)) * absx * absx + 1.0
    } else if absx < 2.0 {
        ((a * absx - 5.0 * a) * absx + 8.0 * a) * absx - 4.0 * a
    } else {
        0.0
    }
}

/// Lanczos kernel with support `a`.
fn lanczos(a: f64, x: f64) -> f64 {
    if x.abs() >= a {
        return 0.0;
    }
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    let pix = std::f64::consts::PI * x;
    (a * pix.sin() * (pix / a).sin()) / (pix * pix)
}

/// A kernel tabulated at [`LUT_RESOLUTION`] entries per unit.
struct KernelLut {
    support: usize,
    weights: Vec<f32>,
}

impl KernelLut {
    fn new(kernel: Kernel) -> Self {
        let support = kernel.support();
        let n = support * LUT_RESOLUTION;
        let weights = (0..=n)
            .map(|i| kernel.eval(i as f64 / LUT_RESOLUTION as f64) as f32)
            .collect();
        Self { support, weights }
    }

    fn weight(&self, dist: f64) -> f32 {
        let idx = (dist.abs() * LUT_RESOLUTION as f64).round() as usize;
        if idx >= self.weights.len() {
            0.0
        } else {
            self.weights[idx]
        }
    }
}

/// Copy `roi_out` from the input buffer (covering `roi_in`) into the output
/// buffer. The destination region must lie inside the source region.
pub fn copy_through(input: &[f32], output: &mut [f32], roi_in: &IRect, roi_out: &IRect) {
    let in_w = roi_in.width as usize;
    let out_w = roi_out.width as usize;
    output
        .par_chunks_mut(CHANNELS * out_w)
        .take(roi_out.height as usize)
        .enumerate()
        .for_each(|(row, dest)| {
            let y = roi_out.y + row as i32;
            let src_off =
                CHANNELS * ((y - roi_in.y) as usize * in_w + (roi_out.x - roi_in.x) as usize);
            dest.copy_from_slice(&input[src_off..src_off + CHANNELS * out_w]);
        });
}

/// Sample one pixel from the input at fractional coordinates, accumulating
/// normalized kernel weights over the clamped support window.
fn sample_pixel(input: &[f32], roi_in: &IRect, sx: f64, sy: f64, lut: &KernelLut, out: &mut [f32]) {
    let w = roi_in.width as i64;
    let h = roi_in.height as i64;
    let support = lut.support as i64;

    let x0 = sx.floor() as i64;
    let y0 = sy.floor() as i64;

    let mut acc = [0.0f32; CHANNELS];
    let mut weight_sum = 0.0f32;

    for ty in (y0 - support + 1)..=(y0 + support) {
        let wy = lut.weight(sy - ty as f64);
        if wy == 0.0 {
            continue;
        }
        let cy = ty.clamp(0, h - 1);
        for tx in (x0 - support + 1)..=(x0 + support) {
            let wx = lut.weight(sx - tx as f64);
            if wx == 0.0 {
                continue;
            }
            let cx = tx.clamp(0, w - 1);
            let weight = wx * wy;
            let px = CHANNELS * (cy as usize * w as usize + cx as usize);
            for c in 0..CHANNELS {
                acc[c] += weight * input[px + c];
            }
            weight_sum += weight;
        }
    }

    if weight_sum.abs() > f32::EPSILON {
        for c in 0..CHANNELS {
            out[c] = acc[c] / weight_sum;
        }
    }
}

/// Resample every displaced pixel of `extent ∩ roi_out` from the input.
///
/// The output must already hold the identity copy (see [`copy_through`]);
/// pixels with a zero map entry keep it. The cancel flag is checked per row
/// block; on cancellation the output is undefined.
pub fn apply_map(
    input: &[f32],
    output: &mut [f32],
    roi_in: &IRect,
    roi_out: &IRect,
    map: &DisplacementMap,
    kernel: Kernel,
    cancel: &CancelToken,
) -> Result<(), EngineError> {
    let lut = KernelLut::new(kernel);
    let extent = map.extent;
    let out_w = roi_out.width as usize;

    let span = extent.intersection(roi_out);
    if span.is_empty() {
        return Ok(());
    }

    output
        .par_chunks_mut(CHANNELS * out_w)
        .enumerate()
        .for_each(|(row, dest)| {
            let y = roi_out.y + row as i32;
            if y < span.y || y >= span.bottom() || cancel.is_cancelled() {
                return;
            }
            let map_row = map.row(y);
            for x in span.x..span.right() {
                let v = map_row[(x - extent.x) as usize];
                if v.x == 0.0 && v.y == 0.0 {
                    continue;
                }
                let sx = x as f64 + v.x as f64 - roi_in.x as f64;
                let sy = y as f64 + v.y as f64 - roi_in.y as f64;
                let out_px = &mut dest[CHANNELS * (x - roi_out.x) as usize..][..CHANNELS];
                sample_pixel(input, roi_in, sx, sy, &lut, out_px);
            }
        });

    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    Ok(())
}
