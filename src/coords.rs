//! The coordinate-system collaborator.
//!
//! Persisted coordinates live in the stable raw frame of the source image;
//! the host pipeline works in a scaled and cropped frame and the display in
//! yet another. The core never knows the details: it hands batches of
//! points to a [`CoordTransform`] exactly once per evaluation (and once per
//! frame for hit testing) and requires the transform to be reversible per
//! point.

use kurbo::Point;
use warp_data::Document;

pub trait CoordTransform {
    /// Raw frame to pipeline frame, in place.
    fn forward(&self, points: &mut [Point]);
    /// Pipeline frame back to raw frame, in place.
    fn backward(&self, points: &mut [Point]);
}

/// No-op transform for hosts that evaluate in the raw frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl CoordTransform for Identity {
    fn forward(&self, _points: &mut [Point]) {}
    fn backward(&self, _points: &mut [Point]) {}
}

/// Uniform scale about the origin, the common raw-to-pipeline case.
#[derive(Debug, Clone, Copy)]
pub struct UniformScale(pub f64);

impl CoordTransform for UniformScale {
    fn forward(&self, points: &mut [Point]) {
        for p in points {
            *p = Point::new(p.x * self.0, p.y * self.0);
        }
    }

    fn backward(&self, points: &mut [Point]) {
        for p in points {
            *p = Point::new(p.x / self.0, p.y / self.0);
        }
    }
}

/// Run every stored coordinate of a document through the forward transform
/// as one batch.
pub fn transform_document(doc: &mut Document, transform: &dyn CoordTransform) {
    let mut points = Vec::new();
    doc.transform_points(|p| {
        points.push(p);
        p
    });
    transform.forward(&mut points);
    let mut iter = points.into_iter();
    doc.transform_points(|_| iter.next().expect("point count changed mid-transform"));
}
