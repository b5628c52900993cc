//! The edit state machine.
//!
//! Translates pointer events into structural edits on the document. The
//! editor is the single writer: every handler locks the document for its
//! whole duration, and the pixel pipeline only ever sees snapshots taken
//! through [`Editor::snapshot`].
//!
//! Positions arriving here are already in the raw frame; the view layer runs
//! them through the coordinate collaborator before calling in. `view_scale`
//! converts device-pixel UI metrics (drag threshold, gizmo size, default
//! strength) into raw-frame lengths.

use std::sync::{Arc, Mutex};

use kurbo::{CubicBez, ParamCurve, Point, Vec2};
use log::debug;

use warp_core::bezier::{
    casteljau_split, nearest_t_on_cubic, nearest_t_on_line, normalize_or_unit_x,
    INTERPOLATION_POINTS,
};
use warp_core::{interpolate_paths, smooth_paths};
use warp_data::{Document, Node, NodeKind, NodeRef, NodeType, WarpPath};

use crate::config::{Settings, DEFAULT_STRENGTH, GIZMO, MIN_DRAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Point,
    Line,
    Curve,
    Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        shift: true,
        alt: false,
    };
    pub const CTRL_ALT: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: true,
    };
}

/// A draggable part of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Center,
    Radius,
    Strength,
    CtrlPoint1,
    CtrlPoint2,
    Hardness1,
    Hardness2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Background,
    Handle(NodeRef, Handle),
    Segment(NodeRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditState {
    Idle,
    PlacingPoint,
    PlacingLineEnd,
    PlacingCurveEnd,
    Dragging { at: NodeRef, handle: Handle },
}

pub struct Editor {
    doc: Arc<Mutex<Document>>,
    settings: Settings,
    tool: Tool,
    prev_tool: Tool,
    /// Raw-frame pixels per device pixel.
    view_scale: f64,
    state: EditState,
    last_hit: HitTarget,
    press_pos: Option<Point>,
    /// The node currently being placed by the point/line/curve tools.
    pending: Option<NodeRef>,
}

impl Editor {
    pub fn new(settings: Settings) -> Self {
        Self::with_document(Document::new(), settings)
    }

    pub fn with_document(doc: Document, settings: Settings) -> Self {
        Self {
            doc: Arc::new(Mutex::new(doc)),
            settings,
            tool: Tool::Point,
            prev_tool: Tool::Point,
            view_scale: 1.0,
            state: EditState::Idle,
            last_hit: HitTarget::Background,
            press_pos: None,
            pending: None,
        }
    }

    /// Shared handle for the evaluation side; the pipeline clones the
    /// document under this lock before computing anything.
    pub fn document(&self) -> Arc<Mutex<Document>> {
        Arc::clone(&self.doc)
    }

    /// An immutable copy of the current document.
    pub fn snapshot(&self) -> Document {
        self.doc.lock().expect("document lock poisoned").clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools, abandoning any placement in progress (the nodes placed
    /// so far stay).
    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool != Tool::Node {
            self.prev_tool = self.tool;
        }
        self.tool = tool;
        self.pending = None;
        self.state = EditState::Idle;
    }

    pub fn set_view_scale(&mut self, scale: f64) {
        self.view_scale = scale.max(1e-9);
    }

    /// Number of stamps the current document interpolates to.
    pub fn warp_count(&self) -> usize {
        let doc = self.doc.lock().expect("document lock poisoned");
        interpolate_paths(&doc).len()
    }

    fn drag_detected(&self, pt: Point) -> bool {
        self.press_pos
            .map_or(false, |p| (pt - p).hypot() > MIN_DRAG * self.view_scale)
    }

    fn hit_radius(&self) -> f64 {
        GIZMO * self.view_scale
    }

    /// A fresh node at its anchor carrying the configured default radius and
    /// strength.
    fn seeded(&self, mut node: Node) -> Node {
        let pt = node.point();
        node.warp.radius = pt + Vec2::new(self.settings.seed_radius(self.view_scale), 0.0);
        node.warp.strength = pt + Vec2::new(DEFAULT_STRENGTH * self.view_scale, 0.0);
        node
    }

    // --- hit testing -----------------------------------------------------

    /// Hardness handles sit on the radius vector at the control fractions.
    fn handle_position(node: &Node, handle: Handle) -> Option<Point> {
        let w = &node.warp;
        match handle {
            Handle::Center => Some(w.point),
            Handle::Radius => Some(w.radius),
            Handle::Strength => Some(w.strength),
            Handle::Hardness1 => Some(w.point.lerp(w.radius, w.control1)),
            Handle::Hardness2 => Some(w.point.lerp(w.radius, w.control2)),
            Handle::CtrlPoint1 => match node.kind {
                NodeKind::CurveTo { ctrl1, .. } => Some(ctrl1),
                _ => None,
            },
            Handle::CtrlPoint2 => match node.kind {
                NodeKind::CurveTo { ctrl2, .. } => Some(ctrl2),
                _ => None,
            },
        }
    }

    fn hit_test(&self, doc: &Document, pt: Point) -> HitTarget {
        // Handles take priority over path strokes, topmost first: the anchor
        // wins over the satellites, and the hardness handles are only live
        // on a selected node.
        const ORDER: [Handle; 7] = [
            Handle::Center,
            Handle::CtrlPoint1,
            Handle::CtrlPoint2,
            Handle::Strength,
            Handle::Radius,
            Handle::Hardness1,
            Handle::Hardness2,
        ];

        let max_dist = self.hit_radius();
        for handle in ORDER {
            let mut best: Option<(f64, NodeRef)> = None;
            for (pi, path) in doc.paths.iter().enumerate() {
                for (ni, node) in path.nodes().iter().enumerate() {
                    if matches!(handle, Handle::Hardness1 | Handle::Hardness2) && !node.selected
                    {
                        continue;
                    }
                    let Some(pos) = Self::handle_position(node, handle) else {
                        continue;
                    };
                    let dist = (pt - pos).hypot();
                    if dist <= max_dist && best.map_or(true, |(d, _)| dist < d) {
                        best = Some((dist, NodeRef::new(pi, ni)));
                    }
                }
            }
            if let Some((_, at)) = best {
                return HitTarget::Handle(at, handle);
            }
        }

        // Then the path strokes themselves.
        for (pi, path) in doc.paths.iter().enumerate() {
            for (ni, (prev, node)) in path.segments().enumerate() {
                let Some(prev) = prev else { continue };
                let p0 = prev.point();
                let dist = match node.kind {
                    NodeKind::LineTo => {
                        let t = nearest_t_on_line(p0, node.point(), pt).clamp(0.0, 1.0);
                        (pt - p0.lerp(node.point(), t)).hypot()
                    }
                    NodeKind::CurveTo { ctrl1, ctrl2 } => {
                        let c = CubicBez::new(p0, ctrl1, ctrl2, node.point());
                        let t = nearest_t_on_cubic(c, pt, INTERPOLATION_POINTS);
                        (pt - c.eval(t)).hypot()
                    }
                    NodeKind::ClosePath => {
                        // The implicit closing stroke back to the head.
                        let head = path.first().point();
                        let t = nearest_t_on_line(p0, head, pt).clamp(0.0, 1.0);
                        (pt - p0.lerp(head, t)).hypot()
                    }
                    NodeKind::MoveTo => continue,
                };
                if dist <= max_dist {
                    return HitTarget::Segment(NodeRef::new(pi, ni));
                }
            }
        }

        HitTarget::Background
    }

    // --- event handlers --------------------------------------------------

    pub fn button_pressed(&mut self, pt: Point, button: MouseButton, mods: Modifiers) -> bool {
        if button == MouseButton::Middle {
            return false;
        }
        let arc = self.document();
        let mut doc = arc.lock().expect("document lock poisoned");

        if button == MouseButton::Left {
            self.press_pos = Some(pt);
        }
        if !matches!(self.state, EditState::Dragging { .. }) {
            // While dragging you would only ever hit the dragged thing.
            self.last_hit = self.hit_test(&doc, pt);
        }
        if button == MouseButton::Right {
            // All right-button work happens on release.
            return self.last_hit != HitTarget::Background || self.pending.is_some();
        }

        match self.tool {
            Tool::Point => {
                debug!("new point at {pt:?}");
                let node = self.seeded(Node::move_to(pt));
                doc.paths.push(WarpPath::new(node));
                self.pending = Some(NodeRef::new(doc.paths.len() - 1, 0));
                self.state = EditState::PlacingPoint;
                self.last_hit = HitTarget::Background;
                true
            }
            Tool::Line | Tool::Curve => {
                if self.pending.is_none() {
                    self.pending = Some(match self.last_hit {
                        // Pressing on a path's endpoint continues that path.
                        HitTarget::Handle(at, Handle::Center)
                            if at.node + 1 == doc.paths[at.path].len() =>
                        {
                            debug!("continuing path {}", at.path);
                            at
                        }
                        _ => {
                            debug!("new path at {pt:?}");
                            let node = self.seeded(Node::move_to(pt));
                            doc.paths.push(WarpPath::new(node));
                            NodeRef::new(doc.paths.len() - 1, 0)
                        }
                    });
                }
                self.state = if self.tool == Tool::Curve {
                    EditState::PlacingCurveEnd
                } else {
                    EditState::PlacingLineEnd
                };
                self.last_hit = HitTarget::Background;
                true
            }
            Tool::Node => {
                if mods == Modifiers::CTRL {
                    if let HitTarget::Handle(at, Handle::Center) = self.last_hit {
                        if let Some(node) = doc.node_mut(at) {
                            node.node_type = node.node_type.cycled();
                            return true;
                        }
                    }
                    if let HitTarget::Handle(at, Handle::Strength) = self.last_hit {
                        if let Some(node) = doc.node_mut(at) {
                            node.warp.kind = node.warp.kind.cycled();
                            return true;
                        }
                    }
                }
                self.last_hit != HitTarget::Background
            }
        }
    }

    pub fn mouse_moved(&mut self, pt: Point) -> bool {
        let arc = self.document();
        let mut doc = arc.lock().expect("document lock poisoned");

        match self.state {
            EditState::PlacingPoint => {
                // The strength arrow follows the pointer while placing.
                if let Some(node) = self.pending.and_then(|at| doc.node_mut(at)) {
                    node.warp.strength = pt;
                }
                true
            }
            EditState::PlacingCurveEnd => {
                if let Some(at) = self.pending {
                    Self::apply_drag(&mut doc, at, Handle::CtrlPoint1, pt, &mut self.settings);
                }
                true
            }
            EditState::PlacingLineEnd => false,
            EditState::Dragging { at, handle } => {
                Self::apply_drag(&mut doc, at, handle, pt, &mut self.settings);
                true
            }
            EditState::Idle => {
                if self.press_pos.is_some() && self.drag_detected(pt) {
                    if let HitTarget::Handle(at, handle) = self.last_hit {
                        self.state = EditState::Dragging { at, handle };
                        Self::apply_drag(&mut doc, at, handle, pt, &mut self.settings);
                        return true;
                    }
                    return false;
                }
                // No button down: track hover.
                let hit = self.hit_test(&doc, pt);
                let target = match hit {
                    HitTarget::Handle(at, _) | HitTarget::Segment(at) => Some(at),
                    HitTarget::Background => None,
                };
                if doc.hovered() != target {
                    doc.clear_hover();
                    if let Some(node) = target.and_then(|at| doc.node_mut(at)) {
                        node.hovered = true;
                    }
                    return true;
                }
                false
            }
        }
    }

    pub fn button_released(&mut self, pt: Point, button: MouseButton, mods: Modifiers) -> bool {
        let arc = self.document();
        let mut doc = arc.lock().expect("document lock poisoned");

        let dragged = self.drag_detected(pt);
        if button == MouseButton::Left {
            self.press_pos = None;
        }

        let handled = match button {
            MouseButton::Middle => false,
            MouseButton::Right => self.right_released(&mut doc),
            MouseButton::Left => match self.state {
                EditState::PlacingPoint => {
                    if !dragged {
                        // No drag: give the point the default strength.
                        if let Some(node) = self.pending.and_then(|at| doc.node_mut(at)) {
                            let p = node.point();
                            node.warp.strength =
                                p + Vec2::new(DEFAULT_STRENGTH * self.view_scale, 0.0);
                        }
                    }
                    self.set_tool(Tool::Node);
                    true
                }
                EditState::PlacingLineEnd => {
                    self.append_segment(&mut doc, pt, false);
                    true
                }
                EditState::PlacingCurveEnd => {
                    if dragged {
                        // The handle was pulled out, so keep it mirrored.
                        if let Some(node) = self.pending.and_then(|at| doc.node_mut(at)) {
                            node.node_type = NodeType::Symmetrical;
                        }
                    }
                    self.append_segment(&mut doc, pt, true);
                    true
                }
                EditState::Dragging { .. } => {
                    self.state = EditState::Idle;
                    true
                }
                EditState::Idle => self.node_tool_click(&mut doc, pt, mods, dragged),
            },
        };

        if button != MouseButton::Middle {
            self.last_hit = HitTarget::Background;
        }
        if handled {
            smooth_paths(&mut doc);
        }
        handled
    }

    fn right_released(&mut self, doc: &mut Document) -> bool {
        self.state = EditState::Idle;

        // Cancel a line or curve in the making: the node placed last is
        // still live and gets removed again.
        if let Some(at) = self.pending.take() {
            doc.delete_node(at);
            self.set_tool(Tool::Node);
            return true;
        }

        match self.last_hit {
            HitTarget::Background => {
                // Toggle the node tool.
                if self.tool == Tool::Node {
                    self.tool = self.prev_tool;
                } else {
                    self.prev_tool = self.tool;
                    self.tool = Tool::Node;
                }
                true
            }
            HitTarget::Handle(at, Handle::Center) => {
                debug!("deleting node {at:?}");
                doc.delete_node(at);
                true
            }
            HitTarget::Segment(at) => {
                debug!("deleting path {}", at.path);
                doc.delete_path(at.path);
                true
            }
            HitTarget::Handle(..) => false,
        }
    }

    /// Append the released line/curve end to the pending path and keep
    /// dragging its center, ready for the next press.
    fn append_segment(&mut self, doc: &mut Document, pt: Point, curve: bool) {
        let Some(at) = self.pending else {
            self.state = EditState::Idle;
            return;
        };
        let node = if curve {
            self.seeded(Node::curve_to(pt))
        } else {
            self.seeded(Node::line_to(pt))
        };
        let path = &mut doc.paths[at.path];
        path.push(node);
        let new_ref = NodeRef::new(at.path, path.len() - 1);
        self.pending = Some(new_ref);
        self.state = EditState::Dragging {
            at: new_ref,
            handle: Handle::Center,
        };
    }

    fn node_tool_click(
        &mut self,
        doc: &mut Document,
        pt: Point,
        mods: Modifiers,
        dragged: bool,
    ) -> bool {
        if self.tool != Tool::Node || dragged {
            return false;
        }

        if mods == Modifiers::NONE {
            match self.last_hit {
                HitTarget::Handle(at, Handle::Center) => {
                    let was = doc.node(at).map_or(false, |n| n.selected);
                    doc.clear_selection();
                    if let Some(node) = doc.node_mut(at) {
                        node.selected = !was;
                    }
                    return true;
                }
                HitTarget::Background => {
                    doc.clear_selection();
                    return true;
                }
                _ => return false,
            }
        }
        if mods == Modifiers::SHIFT {
            if let HitTarget::Handle(at, Handle::Center) = self.last_hit {
                if let Some(node) = doc.node_mut(at) {
                    node.selected = !node.selected;
                    return true;
                }
            }
            return false;
        }
        if mods == Modifiers::CTRL {
            if let HitTarget::Segment(at) = self.last_hit {
                return Self::insert_on_segment(doc, at, pt);
            }
            return false;
        }
        if mods == Modifiers::CTRL_ALT {
            if let HitTarget::Segment(at) = self.last_hit {
                return Self::convert_segment(doc, at);
            }
            return false;
        }
        false
    }

    // --- drags -----------------------------------------------------------

    fn apply_drag(
        doc: &mut Document,
        at: NodeRef,
        handle: Handle,
        pt: Point,
        settings: &mut Settings,
    ) {
        let next_ref = NodeRef::new(at.path, at.node + 1);
        let prev_ref = at.node.checked_sub(1).map(|n| NodeRef::new(at.path, n));

        match handle {
            Handle::Center => {
                let Some(node) = doc.node_mut(at) else { return };
                let delta = pt - node.point();
                node.warp.translate(delta);
                if let NodeKind::CurveTo { ctrl2, .. } = &mut node.kind {
                    *ctrl2 += delta;
                }
                // The incoming handle of the next segment moves with us.
                if let Some(next) = doc.node_mut(next_ref) {
                    if let NodeKind::CurveTo { ctrl1, .. } = &mut next.kind {
                        *ctrl1 += delta;
                    }
                }
            }
            Handle::Radius => {
                let Some(node) = doc.node_mut(at) else { return };
                node.warp.radius = pt;
                settings.last_used_radius = Some(node.warp.radius_px());
            }
            Handle::Strength => {
                if let Some(node) = doc.node_mut(at) {
                    node.warp.strength = pt;
                }
            }
            Handle::Hardness1 | Handle::Hardness2 => {
                let Some(node) = doc.node_mut(at) else { return };
                let radius = node.warp.radius_px();
                if radius <= f64::EPSILON {
                    return;
                }
                let frac = ((pt - node.point()).hypot() / radius).min(1.0);
                if handle == Handle::Hardness1 {
                    node.warp.control1 = frac;
                } else {
                    node.warp.control2 = frac;
                }
            }
            Handle::CtrlPoint1 => {
                // Move the outgoing control; the knot at the segment start
                // owns it and reacts according to its type.
                {
                    let Some(node) = doc.node_mut(at) else { return };
                    let NodeKind::CurveTo { ctrl1, .. } = &mut node.kind else {
                        return;
                    };
                    *ctrl1 = pt;
                }
                let Some(prev) = prev_ref.and_then(|r| doc.node_mut(r)) else {
                    return;
                };
                let anchor = prev.point();
                match prev.node_type {
                    NodeType::AutoSmooth => prev.node_type = NodeType::Cusp,
                    NodeType::Smooth => {
                        if let NodeKind::CurveTo { ctrl2, .. } = &mut prev.kind {
                            let len = (anchor - *ctrl2).hypot();
                            *ctrl2 = anchor + len * normalize_or_unit_x(anchor - pt);
                        }
                    }
                    NodeType::Symmetrical => {
                        if let NodeKind::CurveTo { ctrl2, .. } = &mut prev.kind {
                            *ctrl2 = (2.0 * anchor.to_vec2() - pt.to_vec2()).to_point();
                        }
                    }
                    NodeType::Cusp => {}
                }
            }
            Handle::CtrlPoint2 => {
                let anchor;
                let node_type;
                {
                    let Some(node) = doc.node_mut(at) else { return };
                    let NodeKind::CurveTo { ctrl2, .. } = &mut node.kind else {
                        return;
                    };
                    *ctrl2 = pt;
                    anchor = node.point();
                    node_type = node.node_type;
                    if node_type == NodeType::AutoSmooth {
                        node.node_type = NodeType::Cusp;
                    }
                }
                match node_type {
                    NodeType::Smooth => {
                        if let Some(next) = doc.node_mut(next_ref) {
                            if let NodeKind::CurveTo { ctrl1, .. } = &mut next.kind {
                                let len = (anchor - *ctrl1).hypot();
                                *ctrl1 = anchor + len * normalize_or_unit_x(anchor - pt);
                            }
                        }
                    }
                    NodeType::Symmetrical => {
                        if let Some(next) = doc.node_mut(next_ref) {
                            if let NodeKind::CurveTo { ctrl1, .. } = &mut next.kind {
                                *ctrl1 = (2.0 * anchor.to_vec2() - pt.to_vec2()).to_point();
                            }
                        }
                    }
                    NodeType::Cusp | NodeType::AutoSmooth => {}
                }
            }
        }
    }

    // --- structural edits ------------------------------------------------

    /// Split the segment ending at `at` at the click position: Casteljau for
    /// a curve, linear split for a line. The split node keeps its radius and
    /// strength magnitudes.
    fn insert_on_segment(doc: &mut Document, at: NodeRef, q: Point) -> bool {
        if at.node == 0 {
            return false;
        }
        let path = &mut doc.paths[at.path];
        let prev_pt = path.nodes()[at.node - 1].point();

        match path.nodes()[at.node].kind {
            NodeKind::CurveTo { ctrl1, ctrl2 } => {
                let end = path.nodes()[at.node].point();
                let c = CubicBez::new(prev_pt, ctrl1, ctrl2, end);
                let t = nearest_t_on_cubic(c, q, INTERPOLATION_POINTS);
                let (left, right) = casteljau_split(c, t);

                let node = &mut path.nodes_mut()[at.node];
                let tail_warp = node.warp;
                node.kind = NodeKind::CurveTo {
                    ctrl1: left.p1,
                    ctrl2: left.p2,
                };
                node.warp.relocate(left.p3);

                let mut tail = Node::curve_to(end);
                tail.kind = NodeKind::CurveTo {
                    ctrl1: right.p1,
                    ctrl2: right.p2,
                };
                tail.warp = tail_warp;
                path.insert_after(at.node, tail);
                true
            }
            NodeKind::LineTo => {
                let end = path.nodes()[at.node].point();
                let t = nearest_t_on_line(prev_pt, end, q).clamp(0.0, 1.0);
                let split = prev_pt.lerp(end, t);

                let node = &mut path.nodes_mut()[at.node];
                let tail_warp = node.warp;
                node.warp.relocate(split);

                let mut tail = Node::line_to(end);
                tail.warp = tail_warp;
                path.insert_after(at.node, tail);
                true
            }
            _ => false,
        }
    }

    /// Convert the segment ending at `at` between line and curve in place.
    /// A new curve gets its controls at the segment thirds.
    fn convert_segment(doc: &mut Document, at: NodeRef) -> bool {
        if at.node == 0 {
            return false;
        }
        let path = &mut doc.paths[at.path];
        let prev_pt = path.nodes()[at.node - 1].point();
        let node = &mut path.nodes_mut()[at.node];
        match node.kind {
            NodeKind::CurveTo { .. } => {
                debug!("curve -> line at {at:?}");
                node.kind = NodeKind::LineTo;
                node.node_type = NodeType::AutoSmooth;
                true
            }
            NodeKind::LineTo => {
                debug!("line -> curve at {at:?}");
                let p0 = prev_pt.to_vec2();
                let p1 = node.point().to_vec2();
                node.kind = NodeKind::CurveTo {
                    ctrl1: ((2.0 * p0 + p1) / 3.0).to_point(),
                    ctrl2: ((p0 + 2.0 * p1) / 3.0).to_point(),
                };
                node.node_type = NodeType::AutoSmooth;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RADIUS;

    fn editor() -> Editor {
        Editor::new(Settings::default())
    }

    fn place_point(ed: &mut Editor, pt: Point) {
        ed.set_tool(Tool::Point);
        ed.button_pressed(pt, MouseButton::Left, Modifiers::NONE);
        ed.button_released(pt, MouseButton::Left, Modifiers::NONE);
    }

    /// Lay down a vertical two-node line path and leave the node tool
    /// active. Vertical keeps the +x handle satellites off the stroke.
    fn place_line(ed: &mut Editor, from: Point, to: Point) {
        ed.set_tool(Tool::Line);
        ed.button_pressed(from, MouseButton::Left, Modifiers::NONE);
        ed.button_released(to, MouseButton::Left, Modifiers::NONE);
        ed.set_tool(Tool::Node);
    }

    #[test]
    fn test_point_tool_places_seeded_move_to() {
        let mut ed = editor();
        place_point(&mut ed, Point::new(40.0, 50.0));

        let doc = ed.snapshot();
        assert_eq!(doc.paths.len(), 1);
        let node = doc.paths[0].first();
        assert_eq!(node.kind, NodeKind::MoveTo);
        assert_eq!(node.point(), Point::new(40.0, 50.0));
        assert_eq!(node.warp.radius_px(), DEFAULT_RADIUS);
        assert!((node.warp.strength_vec().hypot() - DEFAULT_STRENGTH).abs() < 1e-9);
        // Placing a point hands over to the node tool.
        assert_eq!(ed.tool(), Tool::Node);
    }

    #[test]
    fn test_point_tool_drag_sets_strength() {
        let mut ed = editor();
        ed.set_tool(Tool::Point);
        ed.button_pressed(Point::new(10.0, 10.0), MouseButton::Left, Modifiers::NONE);
        ed.mouse_moved(Point::new(30.0, 10.0));
        ed.button_released(Point::new(30.0, 10.0), MouseButton::Left, Modifiers::NONE);

        let doc = ed.snapshot();
        let warp = doc.paths[0].first().warp;
        assert_eq!(warp.strength, Point::new(30.0, 10.0));
    }

    #[test]
    fn test_line_tool_appends_on_release() {
        let mut ed = editor();
        ed.set_tool(Tool::Line);
        ed.button_pressed(Point::new(0.0, 0.0), MouseButton::Left, Modifiers::NONE);
        ed.button_released(Point::new(50.0, 0.0), MouseButton::Left, Modifiers::NONE);

        let doc = ed.snapshot();
        assert_eq!(doc.paths.len(), 1);
        assert_eq!(doc.paths[0].len(), 2);
        assert_eq!(doc.paths[0].nodes()[1].kind, NodeKind::LineTo);
        assert_eq!(doc.paths[0].nodes()[1].point(), Point::new(50.0, 0.0));

        // A second press/release continues the same path.
        ed.button_pressed(Point::new(50.0, 0.0), MouseButton::Left, Modifiers::NONE);
        ed.button_released(Point::new(50.0, 40.0), MouseButton::Left, Modifiers::NONE);
        let doc = ed.snapshot();
        assert_eq!(doc.paths.len(), 1);
        assert_eq!(doc.paths[0].len(), 3);
    }

    #[test]
    fn test_curve_tool_drag_makes_symmetrical_node() {
        let mut ed = editor();
        ed.set_tool(Tool::Curve);
        ed.button_pressed(Point::new(0.0, 0.0), MouseButton::Left, Modifiers::NONE);
        ed.mouse_moved(Point::new(20.0, 20.0));
        ed.button_released(Point::new(20.0, 20.0), MouseButton::Left, Modifiers::NONE);

        let doc = ed.snapshot();
        // Head became symmetrical because the press was dragged.
        assert_eq!(doc.paths[0].first().node_type, NodeType::Symmetrical);
        assert!(doc.paths[0].nodes()[1].kind.is_curve());
    }

    #[test]
    fn test_right_click_on_anchor_deletes_node() {
        let mut ed = editor();
        place_point(&mut ed, Point::new(40.0, 50.0));

        ed.button_pressed(Point::new(40.0, 50.0), MouseButton::Right, Modifiers::NONE);
        ed.button_released(Point::new(40.0, 50.0), MouseButton::Right, Modifiers::NONE);
        assert!(ed.snapshot().is_empty());
    }

    #[test]
    fn test_right_click_background_toggles_node_tool() {
        let mut ed = editor();
        ed.set_tool(Tool::Line);
        ed.button_pressed(Point::new(500.0, 500.0), MouseButton::Right, Modifiers::NONE);
        ed.button_released(Point::new(500.0, 500.0), MouseButton::Right, Modifiers::NONE);
        assert_eq!(ed.tool(), Tool::Node);
        ed.button_pressed(Point::new(500.0, 500.0), MouseButton::Right, Modifiers::NONE);
        ed.button_released(Point::new(500.0, 500.0), MouseButton::Right, Modifiers::NONE);
        assert_eq!(ed.tool(), Tool::Line);
    }

    #[test]
    fn test_ctrl_click_cycles_node_type() {
        let mut ed = editor();
        place_point(&mut ed, Point::new(40.0, 50.0));
        assert_eq!(
            ed.snapshot().paths[0].first().node_type,
            NodeType::AutoSmooth
        );

        ed.button_pressed(Point::new(40.0, 50.0), MouseButton::Left, Modifiers::CTRL);
        ed.button_released(Point::new(40.0, 50.0), MouseButton::Left, Modifiers::CTRL);
        assert_eq!(ed.snapshot().paths[0].first().node_type, NodeType::Cusp);
    }

    #[test]
    fn test_ctrl_click_on_strength_cycles_warp_kind() {
        let mut ed = editor();
        place_point(&mut ed, Point::new(40.0, 50.0));
        let strength = ed.snapshot().paths[0].first().warp.strength;

        ed.button_pressed(strength, MouseButton::Left, Modifiers::CTRL);
        ed.button_released(strength, MouseButton::Left, Modifiers::CTRL);
        assert_eq!(
            ed.snapshot().paths[0].first().warp.kind,
            warp_data::WarpKind::RadialGrow
        );
    }

    #[test]
    fn test_dragging_center_carries_handles() {
        let mut ed = editor();
        place_point(&mut ed, Point::new(40.0, 50.0));

        ed.button_pressed(Point::new(40.0, 50.0), MouseButton::Left, Modifiers::NONE);
        ed.mouse_moved(Point::new(90.0, 60.0));
        ed.button_released(Point::new(90.0, 60.0), MouseButton::Left, Modifiers::NONE);

        let doc = ed.snapshot();
        let node = doc.paths[0].first();
        assert_eq!(node.point(), Point::new(90.0, 60.0));
        // Radius and strength handles moved with the anchor.
        assert_eq!(node.warp.radius_px(), DEFAULT_RADIUS);
        assert!((node.warp.strength_vec().hypot() - DEFAULT_STRENGTH).abs() < 1e-9);
    }

    #[test]
    fn test_radius_drag_persists_last_used_radius() {
        let mut ed = editor();
        place_point(&mut ed, Point::new(40.0, 50.0));

        // The radius handle sits at anchor + (radius, 0).
        ed.button_pressed(Point::new(140.0, 50.0), MouseButton::Left, Modifiers::NONE);
        ed.mouse_moved(Point::new(60.0, 50.0));
        ed.button_released(Point::new(60.0, 50.0), MouseButton::Left, Modifiers::NONE);

        assert_eq!(ed.settings().last_used_radius, Some(20.0));
        // The next point seeds from the stored radius.
        place_point(&mut ed, Point::new(300.0, 300.0));
        let doc = ed.snapshot();
        assert_eq!(doc.paths[1].first().warp.radius_px(), 20.0);
    }

    #[test]
    fn test_selection_click_and_shift_click() {
        let mut ed = editor();
        place_point(&mut ed, Point::new(40.0, 50.0));
        place_point(&mut ed, Point::new(200.0, 50.0));

        ed.button_pressed(Point::new(40.0, 50.0), MouseButton::Left, Modifiers::NONE);
        ed.button_released(Point::new(40.0, 50.0), MouseButton::Left, Modifiers::NONE);
        let doc = ed.snapshot();
        assert!(doc.paths[0].first().selected);
        assert!(!doc.paths[1].first().selected);

        // Shift-click adds to the selection.
        ed.button_pressed(Point::new(200.0, 50.0), MouseButton::Left, Modifiers::SHIFT);
        ed.button_released(Point::new(200.0, 50.0), MouseButton::Left, Modifiers::SHIFT);
        let doc = ed.snapshot();
        assert!(doc.paths[0].first().selected);
        assert!(doc.paths[1].first().selected);

        // Plain click on the background clears everything.
        ed.button_pressed(Point::new(600.0, 600.0), MouseButton::Left, Modifiers::NONE);
        ed.button_released(Point::new(600.0, 600.0), MouseButton::Left, Modifiers::NONE);
        let doc = ed.snapshot();
        assert!(!doc.paths[0].first().selected);
        assert!(!doc.paths[1].first().selected);
    }

    #[test]
    fn test_ctrl_click_splits_line_segment() {
        let mut ed = editor();
        place_line(&mut ed, Point::new(0.0, 0.0), Point::new(0.0, 100.0));
        assert_eq!(ed.snapshot().paths[0].len(), 2);

        ed.button_pressed(Point::new(0.0, 30.0), MouseButton::Left, Modifiers::CTRL);
        ed.button_released(Point::new(0.0, 30.0), MouseButton::Left, Modifiers::CTRL);

        let doc = ed.snapshot();
        assert_eq!(doc.paths[0].len(), 3);
        assert_eq!(doc.paths[0].nodes()[1].point(), Point::new(0.0, 30.0));
        assert_eq!(doc.paths[0].nodes()[2].point(), Point::new(0.0, 100.0));
        // The split node carries the tail's magnitudes along.
        assert_eq!(doc.paths[0].nodes()[1].warp.radius_px(), DEFAULT_RADIUS);
    }

    #[test]
    fn test_ctrl_alt_click_converts_line_to_curve_at_thirds() {
        let mut ed = editor();
        place_line(&mut ed, Point::new(0.0, 0.0), Point::new(0.0, 90.0));

        ed.button_pressed(Point::new(0.0, 45.0), MouseButton::Left, Modifiers::CTRL_ALT);
        ed.button_released(Point::new(0.0, 45.0), MouseButton::Left, Modifiers::CTRL_ALT);

        let doc = ed.snapshot();
        match doc.paths[0].nodes()[1].kind {
            NodeKind::CurveTo { ctrl1, ctrl2 } => {
                assert!((ctrl1 - Point::new(0.0, 30.0)).hypot() < 1e-9);
                assert!((ctrl2 - Point::new(0.0, 60.0)).hypot() < 1e-9);
            }
            other => panic!("expected a curve, got {other:?}"),
        }
    }

    #[test]
    fn test_right_click_cancels_pending_placement() {
        let mut ed = editor();
        ed.set_tool(Tool::Line);
        ed.button_pressed(Point::new(0.0, 0.0), MouseButton::Left, Modifiers::NONE);
        ed.button_released(Point::new(50.0, 0.0), MouseButton::Left, Modifiers::NONE);

        // Cancel: the pending line end is removed again.
        ed.button_pressed(Point::new(50.0, 0.0), MouseButton::Right, Modifiers::NONE);
        ed.button_released(Point::new(50.0, 0.0), MouseButton::Right, Modifiers::NONE);

        let doc = ed.snapshot();
        assert_eq!(doc.paths[0].len(), 1);
        assert_eq!(ed.tool(), Tool::Node);
    }

    #[test]
    fn test_hover_tracking() {
        let mut ed = editor();
        place_point(&mut ed, Point::new(40.0, 50.0));

        ed.mouse_moved(Point::new(41.0, 50.0));
        assert_eq!(ed.snapshot().hovered(), Some(NodeRef::new(0, 0)));
        ed.mouse_moved(Point::new(500.0, 500.0));
        assert_eq!(ed.snapshot().hovered(), None);
    }

    #[test]
    fn test_warp_count_reflects_interpolation() {
        let mut ed = editor();
        assert_eq!(ed.warp_count(), 0);
        place_point(&mut ed, Point::new(40.0, 50.0));
        assert_eq!(ed.warp_count(), 1);
    }
}
