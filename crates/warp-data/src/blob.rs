//! The serialized parameter blob.
//!
//! Layout (all integers and doubles little-endian):
//!
//! ```text
//! header { u64 blob_size; u32 blob_version }
//! repeated path {
//!     u64 path_size;            // including this field
//!     repeated node_record {
//!         u64 size; u32 kind; u32 node_type; u32 selected; u32 hovered;
//!         point, strength, radius: 2 x f64 each;
//!         f64 control1; f64 control2; u32 warp_type;
//!         [CurveTo only] ctrl1, ctrl2: 2 x f64 each;
//!     }
//! }
//! ```
//!
//! `blob_size` counts the bytes following the header. A version other than
//! 1 refuses to deserialize; a node record whose size disagrees with its
//! declared kind drops the containing path and resumes at the next one.

use kurbo::Point;
use log::warn;
use thiserror::Error;

use crate::model::{Document, Node, NodeKind, NodeType, Warp, WarpKind, WarpPath};

pub const BLOB_VERSION: u32 = 1;

const HEADER_SIZE: usize = 12;
const NODE_HEADER_SIZE: u64 = 24;
const WARP_SIZE: u64 = 68;
/// MoveTo, LineTo and ClosePath records.
const NODE_BASE_SIZE: u64 = NODE_HEADER_SIZE + WARP_SIZE;
/// CurveTo records carry two extra control points.
const NODE_CURVE_SIZE: u64 = NODE_BASE_SIZE + 32;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BlobError {
    #[error("blob truncated")]
    Truncated,
    #[error("unsupported blob version {0}")]
    UnsupportedVersion(u32),
    #[error("path frame of {declared} bytes overruns the blob")]
    BadPathFrame { declared: u64 },
}

fn node_record_size(node: &Node) -> u64 {
    match node.kind {
        NodeKind::CurveTo { .. } => NODE_CURVE_SIZE,
        _ => NODE_BASE_SIZE,
    }
}

fn expected_size(kind_tag: u32) -> Option<u64> {
    match kind_tag {
        0 | 1 | 3 => Some(NODE_BASE_SIZE),
        2 => Some(NODE_CURVE_SIZE),
        _ => None,
    }
}

// --- writing ---

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_f64(buf: &mut Vec<u8>, v: f64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_point(buf: &mut Vec<u8>, p: Point) {
    put_f64(buf, p.x);
    put_f64(buf, p.y);
}

fn put_node(buf: &mut Vec<u8>, node: &Node) {
    put_u64(buf, node_record_size(node));
    put_u32(buf, node.kind.tag());
    put_u32(buf, node.node_type.tag());
    put_u32(buf, node.selected as u32);
    put_u32(buf, node.hovered as u32);

    put_point(buf, node.warp.point);
    put_point(buf, node.warp.strength);
    put_point(buf, node.warp.radius);
    put_f64(buf, node.warp.control1);
    put_f64(buf, node.warp.control2);
    put_u32(buf, node.warp.kind.tag());

    if let NodeKind::CurveTo { ctrl1, ctrl2 } = node.kind {
        put_point(buf, ctrl1);
        put_point(buf, ctrl2);
    }
}

/// Serialize a document into a fresh blob.
pub fn serialize_document(doc: &Document) -> Vec<u8> {
    let paths_size: u64 = doc
        .paths
        .iter()
        .map(|p| 8 + p.nodes().iter().map(node_record_size).sum::<u64>())
        .sum();

    let mut buf = Vec::with_capacity(HEADER_SIZE + paths_size as usize);
    put_u64(&mut buf, paths_size);
    put_u32(&mut buf, BLOB_VERSION);

    for path in &doc.paths {
        let path_size: u64 = 8 + path.nodes().iter().map(node_record_size).sum::<u64>();
        put_u64(&mut buf, path_size);
        for node in path.nodes() {
            put_node(&mut buf, node);
        }
    }
    buf
}

// --- reading ---

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], BlobError> {
        let end = self.pos.checked_add(n).ok_or(BlobError::Truncated)?;
        if end > self.buf.len() {
            return Err(BlobError::Truncated);
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, BlobError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn u64(&mut self) -> Result<u64, BlobError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn f64(&mut self) -> Result<f64, BlobError> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn point(&mut self) -> Result<Point, BlobError> {
        let x = self.f64()?;
        let y = self.f64()?;
        Ok(Point::new(x, y))
    }
}

/// One parsed node record, or None when the record is malformed (the caller
/// then drops the whole path).
fn read_node(r: &mut Reader) -> Result<Option<Node>, BlobError> {
    let size = r.u64()?;
    let kind_tag = r.u32()?;
    let node_type_tag = r.u32()?;
    let selected = r.u32()?;
    let hovered = r.u32()?;

    match expected_size(kind_tag) {
        Some(want) if want == size => {}
        _ => {
            warn!("bogus node record: kind {kind_tag}, size {size}");
            return Ok(None);
        }
    }
    let Some(node_type) = NodeType::from_tag(node_type_tag) else {
        warn!("bogus node type {node_type_tag}");
        return Ok(None);
    };

    let point = r.point()?;
    let strength = r.point()?;
    let radius = r.point()?;
    let control1 = r.f64()?;
    let control2 = r.f64()?;
    let warp_tag = r.u32()?;
    let Some(warp_kind) = WarpKind::from_tag(warp_tag) else {
        warn!("bogus warp type {warp_tag}");
        return Ok(None);
    };

    let kind = match kind_tag {
        0 => NodeKind::MoveTo,
        1 => NodeKind::LineTo,
        2 => {
            let ctrl1 = r.point()?;
            let ctrl2 = r.point()?;
            NodeKind::CurveTo { ctrl1, ctrl2 }
        }
        3 => NodeKind::ClosePath,
        _ => unreachable!("filtered by expected_size"),
    };

    let mut warp = Warp {
        point,
        strength,
        radius,
        control1,
        control2,
        kind: warp_kind,
    };
    warp.clamp_controls();

    Ok(Some(Node {
        kind,
        node_type,
        selected: selected != 0,
        hovered: hovered != 0,
        warp,
    }))
}

/// Deserialize a version-1 blob back into a document.
///
/// Structural corruption of the outer framing is an error; a single bad
/// node record only drops its path.
pub fn deserialize_document(blob: &[u8]) -> Result<Document, BlobError> {
    let mut r = Reader::new(blob);
    let blob_size = r.u64()?;
    let version = r.u32()?;
    if version != BLOB_VERSION {
        return Err(BlobError::UnsupportedVersion(version));
    }
    if blob_size as usize != blob.len() - HEADER_SIZE {
        return Err(BlobError::Truncated);
    }

    let mut doc = Document::new();
    while r.pos < blob.len() {
        let frame_start = r.pos;
        let path_size = r.u64()?;
        let path_end = frame_start
            .checked_add(path_size as usize)
            .ok_or(BlobError::BadPathFrame {
                declared: path_size,
            })?;
        if path_size < 8 || path_end > blob.len() {
            return Err(BlobError::BadPathFrame {
                declared: path_size,
            });
        }

        let mut nodes = Vec::new();
        let mut good = true;
        while r.pos < path_end {
            match read_node(&mut r)? {
                Some(node) => nodes.push(node),
                None => {
                    good = false;
                    break;
                }
            }
        }
        r.pos = path_end;

        if !good || nodes.is_empty() {
            if !good {
                warn!("dropping malformed path ({} bytes)", path_size);
            }
            continue;
        }
        if !matches!(nodes[0].kind, NodeKind::MoveTo) {
            warn!("dropping path that does not start with a MoveTo");
            continue;
        }

        let mut path = WarpPath::new(nodes[0]);
        for node in nodes.into_iter().skip(1) {
            path.push(node);
        }
        doc.paths.push(path);
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;

    fn sample_document() -> Document {
        let mut doc = Document::new();

        let a = Point::new(100.0, 100.0);
        let b = Point::new(200.0, 120.0);
        let c = Point::new(250.0, 180.0);

        let mut head = Node::move_to(a);
        head.warp.radius = a + Vec2::new(30.0, 0.0);
        head.warp.strength = a + Vec2::new(0.0, 10.0);

        let mut line = Node::line_to(b);
        line.warp.radius = b + Vec2::new(25.0, 0.0);
        line.warp.kind = WarpKind::RadialGrow;
        line.selected = true;

        let mut curve = Node::curve_to(c);
        curve.kind = NodeKind::CurveTo {
            ctrl1: Point::new(210.0, 130.0),
            ctrl2: Point::new(230.0, 160.0),
        };
        curve.warp.radius = c + Vec2::new(40.0, 0.0);
        curve.node_type = NodeType::Symmetrical;

        let mut path = WarpPath::new(head);
        path.push(line);
        path.push(curve);
        doc.paths.push(path);

        let d = Point::new(10.0, 20.0);
        let mut lone = Node::move_to(d);
        lone.warp.radius = d + Vec2::new(5.0, 5.0);
        doc.paths.push(WarpPath::new(lone));

        doc
    }

    #[test]
    fn test_round_trip_is_stable() {
        let doc = sample_document();
        let blob = serialize_document(&doc);
        let doc2 = deserialize_document(&blob).unwrap();
        let blob2 = serialize_document(&doc2);
        assert_eq!(blob, blob2);
        assert_eq!(doc, doc2);
    }

    #[test]
    fn test_empty_document_round_trip() {
        let blob = serialize_document(&Document::new());
        assert_eq!(blob.len(), 12);
        let doc = deserialize_document(&blob).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_wrong_version_is_refused() {
        let mut blob = serialize_document(&sample_document());
        blob[8..12].copy_from_slice(&2u32.to_le_bytes());
        assert_eq!(
            deserialize_document(&blob),
            Err(BlobError::UnsupportedVersion(2))
        );
    }

    #[test]
    fn test_truncated_blob_is_refused() {
        let blob = serialize_document(&sample_document());
        assert!(deserialize_document(&blob[..blob.len() - 4]).is_err());
    }

    #[test]
    fn test_bad_node_size_drops_only_its_path() {
        let doc = sample_document();
        let blob = serialize_document(&doc);

        // Corrupt the first node record's declared size. The first path must
        // be dropped while the trailing single-node path survives.
        let mut bad = blob.clone();
        let node_size_at = 12 + 8;
        bad[node_size_at..node_size_at + 8].copy_from_slice(&999u64.to_le_bytes());

        let doc2 = deserialize_document(&bad).unwrap();
        assert_eq!(doc2.paths.len(), 1);
        assert_eq!(doc2.paths[0].first().point(), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_controls_clamped_on_read() {
        let mut doc = Document::new();
        let mut head = Node::move_to(Point::new(0.0, 0.0));
        head.warp.control1 = 7.5;
        head.warp.control2 = -1.0;
        doc.paths.push(WarpPath::new(head));

        let doc2 = deserialize_document(&serialize_document(&doc)).unwrap();
        let warp = doc2.paths[0].first().warp;
        assert_eq!(warp.control1, 1.0);
        assert_eq!(warp.control2, 0.0);
    }
}
