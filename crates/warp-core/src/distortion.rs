//! The global displacement map.
//!
//! Stamps are accumulated, by subtraction, into a map covering only the
//! pixels any stamp touches. The map stores backward offsets: `map[p]` is
//! the vector that, added to the destination pixel `p`, gives the position
//! the source is sampled from.

use glam::Vec2 as Vec2f;
use log::debug;
use rayon::prelude::*;
use warp_data::Warp;

use crate::rect::IRect;
use crate::stamp::{build_round_stamp, stamp_extent, Stamp};
use crate::{CancelToken, EngineError};

/// The accumulated displacement field over `extent`, one backward offset per
/// pixel, row-major.
#[derive(Debug, Clone)]
pub struct DisplacementMap {
    pub extent: IRect,
    data: Vec<Vec2f>,
}

impl DisplacementMap {
    pub fn data(&self) -> &[Vec2f] {
        &self.data
    }

    /// Offset at an absolute raw-frame pixel inside the extent.
    pub fn get(&self, x: i32, y: i32) -> Vec2f {
        debug_assert!(self.extent.contains(x, y));
        let w = self.extent.width;
        self.data[((y - self.extent.y) * w + (x - self.extent.x)) as usize]
    }

    pub fn row(&self, y: i32) -> &[Vec2f] {
        let w = self.extent.width as usize;
        let start = (y - self.extent.y) as usize * w;
        &self.data[start..start + w]
    }
}

/// The union of all stamp extents that touch `roi_out`. None when nothing
/// lands inside the region of interest.
pub fn map_extent(roi_out: &IRect, warps: &[Warp]) -> Option<IRect> {
    let mut extent: Option<IRect> = None;
    for warp in warps {
        let Some(r) = stamp_extent(warp) else {
            continue;
        };
        if !r.intersects(roi_out) {
            continue;
        }
        extent = Some(match extent {
            Some(e) => e.union(&r),
            None => r,
        });
    }
    extent
}

/// Subtract one stamp, placed at its warp's anchor, from the global map over
/// the intersection with the map extent. Rows are independent.
fn subtract_stamp(
    map_data: &mut [Vec2f],
    map_extent: &IRect,
    warp: &Warp,
    stamp: &Stamp,
) {
    let mut at = stamp.extent;
    at.x += warp.point.x.round() as i32;
    at.y += warp.point.y.round() as i32;

    let clip = at.intersection(map_extent);
    if clip.is_empty() {
        return;
    }

    let map_w = map_extent.width as usize;
    map_data
        .par_chunks_mut(map_w)
        .skip((clip.y - map_extent.y) as usize)
        .take(clip.height as usize)
        .enumerate()
        .for_each(|(i, dest_row)| {
            let y = clip.y + i as i32;
            let src_row = &stamp.data()
                [((y - at.y) * at.width) as usize..][..at.width as usize];
            for x in clip.x..clip.right() {
                dest_row[(x - map_extent.x) as usize] -= src_row[(x - at.x) as usize];
            }
        });
}

/// Build the global displacement map for a list of sampled warps.
///
/// Returns `Ok(None)` when no stamp intersects `roi_out` (the caller copies
/// the input through unchanged). Degenerate warps are skipped silently; the
/// cancel flag is checked between stamps.
pub fn build_map(
    warps: &[Warp],
    roi_out: &IRect,
    cancel: &CancelToken,
) -> Result<Option<DisplacementMap>, EngineError> {
    let Some(extent) = map_extent(roi_out, warps) else {
        return Ok(None);
    };
    debug!(
        "displacement map extent: {}x{} at ({}, {})",
        extent.width, extent.height, extent.x, extent.y
    );

    let size = (extent.width as usize)
        .checked_mul(extent.height as usize)
        .ok_or(EngineError::MapTooLarge {
            width: extent.width,
            height: extent.height,
        })?;
    let mut data = Vec::new();
    data.try_reserve_exact(size)
        .map_err(|_| EngineError::MapTooLarge {
            width: extent.width,
            height: extent.height,
        })?;
    data.resize(size, Vec2f::ZERO);

    for warp in warps {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let Some(stamp) = build_round_stamp(warp) else {
            continue;
        };
        subtract_stamp(&mut data, &extent, warp, &stamp);
    }

    Ok(Some(DisplacementMap { extent, data }))
}
