use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Default hardness curve controls for a freshly placed warp.
pub const DEFAULT_CONTROL1: f64 = 0.5;
pub const DEFAULT_CONTROL2: f64 = 0.75;

/// The shape of the vector field a warp stamps onto the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarpKind {
    /// A linear warp: every point inside the radius is pushed along the
    /// strength vector, tapered by the hardness curve.
    Linear,
    /// A radial warp pushing pixels away from the center.
    RadialGrow,
    /// A radial warp pulling pixels towards the center.
    RadialShrink,
}

impl WarpKind {
    pub fn tag(self) -> u32 {
        match self {
            WarpKind::Linear => 0,
            WarpKind::RadialGrow => 1,
            WarpKind::RadialShrink => 2,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(WarpKind::Linear),
            1 => Some(WarpKind::RadialGrow),
            2 => Some(WarpKind::RadialShrink),
            _ => None,
        }
    }

    /// Next kind in the ctrl-click cycle.
    pub fn cycled(self) -> Self {
        match self {
            WarpKind::Linear => WarpKind::RadialGrow,
            WarpKind::RadialGrow => WarpKind::RadialShrink,
            WarpKind::RadialShrink => WarpKind::Linear,
        }
    }
}

/// How a node's two adjoining curve control points relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Controls are independent; the path may make a corner here.
    Cusp,
    /// Controls share a direction but not a length.
    Smooth,
    /// Controls mirror each other exactly.
    Symmetrical,
    /// Controls are derived by the smoother until the user edits them.
    AutoSmooth,
}

impl NodeType {
    pub fn tag(self) -> u32 {
        match self {
            NodeType::Cusp => 0,
            NodeType::Smooth => 1,
            NodeType::Symmetrical => 2,
            NodeType::AutoSmooth => 3,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(NodeType::Cusp),
            1 => Some(NodeType::Smooth),
            2 => Some(NodeType::Symmetrical),
            3 => Some(NodeType::AutoSmooth),
            _ => None,
        }
    }

    pub fn cycled(self) -> Self {
        match self {
            NodeType::Cusp => NodeType::Smooth,
            NodeType::Smooth => NodeType::Symmetrical,
            NodeType::Symmetrical => NodeType::AutoSmooth,
            NodeType::AutoSmooth => NodeType::Cusp,
        }
    }
}

/// A single warp primitive.
///
/// Scalars and vectors are stored as points in the raw frame because points
/// are the only thing the coordinate collaborator can transform. The
/// effective strength vector is `strength - point` and the effective radius
/// is `|radius - point|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Warp {
    pub point: Point,
    pub strength: Point,
    pub radius: Point,
    /// Hardness Bézier tangent x-coordinate, clamped to 0.0 ..= 1.0.
    pub control1: f64,
    /// Hardness Bézier tangent x-coordinate, clamped to 0.0 ..= 1.0.
    pub control2: f64,
    pub kind: WarpKind,
}

impl Warp {
    /// A zero-strength, zero-radius warp anchored at `point`.
    pub fn new(kind: WarpKind, point: Point) -> Self {
        Self {
            point,
            strength: point,
            radius: point,
            control1: DEFAULT_CONTROL1,
            control2: DEFAULT_CONTROL2,
            kind,
        }
    }

    /// Effective radius in raw-frame pixels.
    pub fn radius_px(&self) -> f64 {
        (self.radius - self.point).hypot()
    }

    /// Effective strength vector.
    pub fn strength_vec(&self) -> Vec2 {
        self.strength - self.point
    }

    /// Move the whole warp, anchors and handles alike.
    pub fn translate(&mut self, delta: Vec2) {
        self.point += delta;
        self.strength += delta;
        self.radius += delta;
    }

    /// Re-anchor at `point`, carrying the radius and strength handles along.
    pub fn relocate(&mut self, point: Point) {
        let delta = point - self.point;
        self.translate(delta);
    }

    pub fn clamp_controls(&mut self) {
        self.control1 = self.control1.clamp(0.0, 1.0);
        self.control2 = self.control2.clamp(0.0, 1.0);
    }
}

/// The kind of path segment a node terminates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    MoveTo,
    LineTo,
    CurveTo { ctrl1: Point, ctrl2: Point },
    ClosePath,
}

impl NodeKind {
    pub fn tag(&self) -> u32 {
        match self {
            NodeKind::MoveTo => 0,
            NodeKind::LineTo => 1,
            NodeKind::CurveTo { .. } => 2,
            NodeKind::ClosePath => 3,
        }
    }

    pub fn is_curve(&self) -> bool {
        matches!(self, NodeKind::CurveTo { .. })
    }
}

/// One node of a warp path: a segment terminator plus the warp placed on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub node_type: NodeType,
    /// Transient UI tag; never influences pixel output.
    pub selected: bool,
    /// Transient UI tag; never influences pixel output.
    pub hovered: bool,
    pub warp: Warp,
}

impl Node {
    fn new(kind: NodeKind, point: Point) -> Self {
        Self {
            kind,
            node_type: NodeType::AutoSmooth,
            selected: false,
            hovered: false,
            warp: Warp::new(WarpKind::Linear, point),
        }
    }

    pub fn move_to(point: Point) -> Self {
        Self::new(NodeKind::MoveTo, point)
    }

    pub fn line_to(point: Point) -> Self {
        Self::new(NodeKind::LineTo, point)
    }

    /// A curve node with both control points collapsed onto the endpoint;
    /// the smoother or the user spreads them out later.
    pub fn curve_to(point: Point) -> Self {
        Self::new(
            NodeKind::CurveTo {
                ctrl1: point,
                ctrl2: point,
            },
            point,
        )
    }

    pub fn close_path(point: Point) -> Self {
        Self::new(NodeKind::ClosePath, point)
    }

    /// The node's anchor position.
    pub fn point(&self) -> Point {
        self.warp.point
    }
}

/// An ordered, non-empty sequence of nodes. The first node is always a
/// MoveTo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpPath {
    nodes: Vec<Node>,
}

impl WarpPath {
    /// Start a path at `head`, coercing it to a MoveTo.
    pub fn new(mut head: Node) -> Self {
        head.kind = NodeKind::MoveTo;
        Self { nodes: vec![head] }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn first(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn last(&self) -> &Node {
        self.nodes.last().expect("path is never empty")
    }

    /// Append a node at the tail.
    pub fn push(&mut self, node: Node) {
        debug_assert!(!matches!(node.kind, NodeKind::MoveTo));
        self.nodes.push(node);
    }

    /// Insert `node` directly after the node at `index`.
    pub fn insert_after(&mut self, index: usize, node: Node) {
        self.nodes.insert(index + 1, node);
    }

    /// Remove the node at `index`.
    ///
    /// Deleting the head promotes the successor to the new MoveTo head; it
    /// keeps its own anchor and radius/strength magnitudes. Returns false
    /// when the last remaining node was removed and the path is now empty
    /// (the caller drops it from the document).
    pub fn delete(&mut self, index: usize) -> bool {
        self.nodes.remove(index);
        if self.nodes.is_empty() {
            return false;
        }
        if index == 0 {
            self.nodes[0].kind = NodeKind::MoveTo;
        }
        true
    }

    /// Yields `(prev, node)` pairs along the path; the head MoveTo has no
    /// predecessor.
    pub fn segments(&self) -> impl Iterator<Item = (Option<&Node>, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(move |(i, n)| (if i == 0 { None } else { Some(&self.nodes[i - 1]) }, n))
    }
}

/// Addresses a node inside a document by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub path: usize,
    pub node: usize,
}

impl NodeRef {
    pub fn new(path: usize, node: usize) -> Self {
        Self { path, node }
    }
}

/// An ordered list of warp paths, in the stable raw frame of the source
/// image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub paths: Vec<WarpPath>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn node(&self, at: NodeRef) -> Option<&Node> {
        self.paths.get(at.path)?.nodes().get(at.node)
    }

    pub fn node_mut(&mut self, at: NodeRef) -> Option<&mut Node> {
        self.paths.get_mut(at.path)?.nodes_mut().get_mut(at.node)
    }

    /// Delete one node, dropping the containing path when it empties.
    pub fn delete_node(&mut self, at: NodeRef) {
        let Some(path) = self.paths.get_mut(at.path) else {
            return;
        };
        if at.node >= path.len() {
            return;
        }
        if !path.delete(at.node) {
            self.paths.remove(at.path);
        }
    }

    pub fn delete_path(&mut self, path: usize) {
        if path < self.paths.len() {
            self.paths.remove(path);
        }
    }

    /// Apply a point-wise mapping to every stored coordinate: anchors,
    /// strength and radius handles, and curve control points. This is the
    /// hook for the coordinate-system collaborator.
    pub fn transform_points(&mut self, mut f: impl FnMut(Point) -> Point) {
        for path in &mut self.paths {
            for node in path.nodes_mut() {
                node.warp.point = f(node.warp.point);
                node.warp.strength = f(node.warp.strength);
                node.warp.radius = f(node.warp.radius);
                if let NodeKind::CurveTo { ctrl1, ctrl2 } = &mut node.kind {
                    *ctrl1 = f(*ctrl1);
                    *ctrl2 = f(*ctrl2);
                }
            }
        }
    }

    pub fn clear_selection(&mut self) {
        for path in &mut self.paths {
            for node in path.nodes_mut() {
                node.selected = false;
            }
        }
    }

    pub fn hovered(&self) -> Option<NodeRef> {
        for (pi, path) in self.paths.iter().enumerate() {
            for (ni, node) in path.nodes().iter().enumerate() {
                if node.hovered {
                    return Some(NodeRef::new(pi, ni));
                }
            }
        }
        None
    }

    pub fn clear_hover(&mut self) {
        for path in &mut self.paths {
            for node in path.nodes_mut() {
                node.hovered = false;
            }
        }
    }
}
