//! The resolved scene graph.

use crate::filter::ResolvedFilter;
use crate::paint::Paint;
use crate::path::PathCommand;
use crate::style::{FillRule, FontPosture, FontWeight, LineCap, LineJoin, TextDecoration};
use crate::transform::{compose, Transform2D, TransformList};
use std::collections::HashMap;

/// Index of a node in a [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[cfg(test)]
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw arena index.
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Font of a text run.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: Option<String>,
    pub weight: FontWeight,
    pub posture: FontPosture,
    pub size: f32,
}

/// A run of text sharing one style.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub content: String,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub dx: f32,
    pub dy: f32,
    pub font: Font,
    pub decoration: TextDecoration,
    /// Vertical shift from `baseline-shift`; positive moves down.
    pub baseline_offset: f32,
}

/// An external image reference. The core never loads it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRef {
    pub href: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub preserve_aspect_ratio: String,
}

/// Geometry of a scene node.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Container without geometry of its own.
    Group,
    Path(Vec<PathCommand>),
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rx: f32,
        ry: f32,
    },
    Circle {
        cx: f32,
        cy: f32,
        r: f32,
    },
    Ellipse {
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
    Polyline(Vec<(f32, f32)>),
    Polygon(Vec<(f32, f32)>),
    Text(TextRun),
    /// Mixed text; the runs are the node's children.
    TextFlow {
        x: Option<f32>,
        y: Option<f32>,
    },
    Image(ImageRef),
}

/// Resolved presentation of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveStyle {
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: f32,
    pub dash_array: Vec<f32>,
    pub dash_offset: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
    pub fill_rule: Option<FillRule>,
    pub clip_rule: Option<FillRule>,
    pub opacity: f32,
}

impl Default for PrimitiveStyle {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            dash_array: Vec::new(),
            dash_offset: 0.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 4.0,
            fill_rule: None,
            clip_rule: None,
            opacity: 1.0,
        }
    }
}

/// A drawable primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Tag of the element the node was built from.
    pub element: String,
    pub id: Option<String>,
    pub geometry: Geometry,
    pub style: PrimitiveStyle,
    /// Local transform, in declaration order.
    pub transform: TransformList,
    pub effect: Option<ResolvedFilter>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(element: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            element: element.into(),
            id: None,
            geometry,
            style: PrimitiveStyle::default(),
            transform: TransformList::new(),
            effect: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The local transform as one matrix.
    pub fn matrix(&self) -> Transform2D {
        compose(&self.transform)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.geometry, Geometry::Group)
    }
}

/// A resolved scene: an arena of nodes rooted at the outermost `<svg>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    root: NodeId,
    ids: HashMap<String, NodeId>,
    width: f32,
    height: f32,
}

impl Scene {
    /// Create a scene holding only `root`.
    pub(crate) fn new(root: SceneNode, width: f32, height: f32) -> Self {
        Self {
            nodes: vec![root],
            root: NodeId(0),
            ids: HashMap::new(),
            width,
            height,
        }
    }

    /// Append `node` as the last child of `parent`.
    pub(crate) fn append(&mut self, parent: NodeId, mut node: SceneNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn set_ids(&mut self, ids: HashMap<String, NodeId>) {
        self.ids = ids;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: a scene always has its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(SceneNode::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(SceneNode::parent)
    }

    /// Node registered under an element id.
    pub fn node_by_id(&self, id: &str) -> Option<&SceneNode> {
        self.ids.get(id).and_then(|n| self.get(*n))
    }

    /// Index of the node registered under an element id.
    pub fn node_id(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// All nodes below and including `id`, in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if self.get(current).is_none() {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Transform from the local space of `id` to scene space.
    pub fn world_transform(&self, id: NodeId) -> Transform2D {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|n| self.get(n)) {
            chain.push(node.matrix());
            current = node.parent;
        }
        chain
            .iter()
            .rev()
            .fold(Transform2D::identity(), |acc, m| acc.multiply(m))
    }
}
