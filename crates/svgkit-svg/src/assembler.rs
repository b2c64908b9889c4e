//! Top-down walk from a document to a [`Scene`].
//!
//! A definitions pre-pass collects style blocks, gradients, filters and `use` templates
//! from the whole document, so references do not depend on document order. The main
//! walk then threads the resolved style, the propagated attributes and the current
//! viewport from each element to its children.

use crate::builder::{
    apply_style, attach_transform_and_effect, build_primitive, build_text_run, collapse_whitespace,
    BuildContext, ElementKind,
};
use crate::filter::FilterSpec;
use crate::length::{parse_length, try_parse_length};
use crate::paint::Gradient;
use crate::registry::IdRegistry;
use crate::scene::{Geometry, NodeId as SceneId, Scene, SceneNode};
use crate::style::{PropagatedAttributes, ResolvedStyle, StyleResolver, StyleRuleSet};
use crate::transform::TransformPrimitive;
use crate::viewport::{Axis, ViewBox, Viewport};
use std::collections::HashMap;
use svgkit_dom::{Document, NodeId as DomId};
use tracing::{debug, debug_span, trace};

/// Longest `href` chain followed when a gradient borrows stops.
const MAX_GRADIENT_CHAIN: usize = 16;

/// Scene size past which further `use` expansions are cut.
const MAX_USE_SCENE_NODES: usize = 1 << 16;

/// Assemble the scene for `doc`.
///
/// Never fails: unreadable values fall back to defaults and unresolved references are
/// dropped. The root element is treated as the outermost `<svg>` whatever its tag.
pub fn assemble(doc: &Document) -> Scene {
    let root = doc.root();
    let _span = debug_span!("assemble", nodes = doc.len()).entered();

    let (viewport, view_box) = element_viewport(doc, root, &Viewport::DEFAULT);
    let inner = inner_viewport(view_box, &viewport);
    let mut assembler = Assembler::new(doc);
    assembler.collect_definitions(&inner);

    let (no_style, nothing_propagated) = (ResolvedStyle::new(), PropagatedAttributes::new());
    let top = Frame {
        style: &no_style,
        propagated: &nothing_propagated,
        viewport: inner,
    };
    let style = assembler.resolve_style(root, &top);
    let propagated = top.propagated.descend(doc, root);

    let mut root_node = SceneNode::new(doc.name(root).unwrap_or("svg"), Geometry::Group);
    root_node.id = doc.attribute(root, "id").map(str::to_string);
    root_node.style = apply_style(&style, &assembler.registry);
    attach_transform_and_effect(&mut root_node, &style, &assembler.registry);
    fit_view_box(doc, root, &mut root_node, view_box, &viewport);

    let mut scene = Scene::new(root_node, viewport.width, viewport.height);
    if let Some(id) = doc.attribute(root, "id") {
        assembler.registry.register_node(id, scene.root());
    }

    if style.is_displayed() {
        let frame = Frame {
            style: &style,
            propagated: &propagated,
            viewport: inner,
        };
        let scene_root = scene.root();
        assembler.walk_children(&mut scene, scene_root, root, &frame);
    }

    scene.set_ids(assembler.registry.take_nodes());
    debug!(
        nodes = scene.len(),
        width = scene.width(),
        height = scene.height(),
        "Assembled scene"
    );
    scene
}

/// What a parent hands to its children.
struct Frame<'f> {
    style: &'f ResolvedStyle,
    propagated: &'f PropagatedAttributes,
    viewport: Viewport,
}

struct Assembler<'d> {
    doc: &'d Document,
    rules: StyleRuleSet,
    registry: IdRegistry,
    /// `use` templates currently being expanded, innermost last.
    expanding: Vec<DomId>,
}

impl<'d> Assembler<'d> {
    fn new(doc: &'d Document) -> Self {
        Self {
            doc,
            rules: StyleRuleSet::new(),
            registry: IdRegistry::new(),
            expanding: Vec::new(),
        }
    }

    fn collect_definitions(&mut self, viewport: &Viewport) {
        let doc = self.doc;
        let mut links = HashMap::new();

        for node in doc.descendants(doc.root()) {
            match doc.name(node) {
                Some("style") => self.rules.add_style_sheet(&doc.text_content(node), viewport),
                Some("linearGradient" | "radialGradient") => {
                    if let Some(gradient) = Gradient::from_element(doc, node, viewport) {
                        let id = gradient.id().to_string();
                        if self.registry.register_gradient(gradient) {
                            if let Some(target) = href_target(doc, node) {
                                links.insert(id, target.to_string());
                            }
                        }
                    }
                }
                Some("filter") => {
                    if let Some(filter) = FilterSpec::from_element(doc, node) {
                        self.registry.register_filter(filter);
                    }
                }
                _ => {}
            }
            if let Some(id) = doc.attribute(node, "id") {
                self.registry.register_template(id, node);
            }
        }

        for id in links.keys() {
            self.borrow_stops(id, &links);
        }
        debug!(rules = self.rules.len(), "Collected definitions");
    }

    /// Give a stop-less gradient the stops of the first gradient down its `href` chain
    /// that has any.
    fn borrow_stops(&mut self, id: &str, links: &HashMap<String, String>) {
        match self.registry.gradient(id) {
            Some(gradient) if gradient.stops().is_empty() => {}
            _ => return,
        }

        let mut current = links.get(id);
        let mut stops = None;
        for _ in 0..MAX_GRADIENT_CHAIN {
            let Some(target) = current else { break };
            let Some(gradient) = self.registry.gradient(target) else {
                debug!(id, href = %target, "Gradient href points to no gradient");
                break;
            };
            if !gradient.stops().is_empty() {
                stops = Some(gradient.stops().to_vec());
                break;
            }
            current = links.get(target.as_str());
        }

        if let (Some(stops), Some(gradient)) = (stops, self.registry.gradient_mut(id)) {
            trace!(id, stops = stops.len(), "Borrowed gradient stops");
            gradient.set_stops(stops);
        }
    }

    /// Nodes built inside a `use` expansion are copies; ids stay with the originals.
    fn register(&mut self, id: &str, node: SceneId) {
        if self.expanding.is_empty() {
            self.registry.register_node(id, node);
        }
    }

    fn resolve_style(&self, node: DomId, frame: &Frame<'_>) -> ResolvedStyle {
        StyleResolver::new(&self.rules).resolve(
            self.doc,
            node,
            frame.style,
            frame.propagated,
            &frame.viewport,
        )
    }

    fn build(&self, node: DomId, style: &ResolvedStyle, viewport: &Viewport) -> Option<SceneNode> {
        let ctx = BuildContext {
            registry: &self.registry,
            viewport,
        };
        build_primitive(&ctx, self.doc, node, style)
    }

    fn walk_children(&mut self, scene: &mut Scene, parent: SceneId, node: DomId, frame: &Frame<'_>) {
        let doc = self.doc;
        for child in doc.element_children(node) {
            self.visit(scene, parent, child, frame);
        }
    }

    fn visit(&mut self, scene: &mut Scene, parent: SceneId, node: DomId, frame: &Frame<'_>) {
        let doc = self.doc;
        let Some(tag) = doc.name(node) else { return };
        let kind = ElementKind::from_tag(tag);
        match kind {
            ElementKind::NonRendering => return,
            ElementKind::Unknown => {
                debug!(tag, "Skipping unsupported element");
                return;
            }
            _ => {}
        }

        let style = self.resolve_style(node, frame);
        if !style.is_displayed() {
            trace!(tag, "Skipping element with display: none");
            return;
        }
        let propagated = frame.propagated.descend(doc, node);
        let child_frame = Frame {
            style: &style,
            propagated: &propagated,
            viewport: frame.viewport,
        };

        let built = match kind {
            ElementKind::Svg => self.visit_svg(scene, parent, node, &child_frame),
            ElementKind::Group => self.build(node, &style, &frame.viewport).map(|group| {
                let id = scene.append(parent, group);
                self.walk_children(scene, id, node, &child_frame);
                id
            }),
            ElementKind::Switch => self.build(node, &style, &frame.viewport).map(|group| {
                let id = scene.append(parent, group);
                if let Some(child) = doc.element_children(node).find(|c| is_renderable(doc, *c)) {
                    self.visit(scene, id, child, &child_frame);
                }
                id
            }),
            ElementKind::Use => self.visit_use(scene, parent, node, &child_frame),
            ElementKind::Text | ElementKind::TextSpan => self.visit_text(scene, parent, node, &child_frame),
            _ => {
                if !style.is_visible() {
                    trace!(tag, "Skipping hidden element");
                    return;
                }
                self.build(node, &style, &frame.viewport)
                    .map(|leaf| scene.append(parent, leaf))
            }
        };

        if let (Some(scene_id), Some(id)) = (built, doc.attribute(node, "id")) {
            self.register(id, scene_id);
        }
    }

    /// Nested `<svg>`: a group positioned at x/y with its own viewport.
    fn visit_svg(&mut self, scene: &mut Scene, parent: SceneId, node: DomId, frame: &Frame<'_>) -> Option<SceneId> {
        let doc = self.doc;
        let enclosing = frame.viewport;
        let mut group = self.build(node, frame.style, &enclosing)?;

        let x = length_attribute(doc, node, "x", Axis::Horizontal, &enclosing);
        let y = length_attribute(doc, node, "y", Axis::Vertical, &enclosing);
        if x != 0.0 || y != 0.0 {
            group.transform.push(TransformPrimitive::Translate { x, y });
        }
        let (viewport, view_box) = element_viewport(doc, node, &enclosing);
        let inner = fit_view_box(doc, node, &mut group, view_box, &viewport);

        let id = scene.append(parent, group);
        let child_frame = Frame {
            style: frame.style,
            propagated: frame.propagated,
            viewport: inner,
        };
        self.walk_children(scene, id, node, &child_frame);
        Some(id)
    }

    fn visit_use(&mut self, scene: &mut Scene, parent: SceneId, node: DomId, frame: &Frame<'_>) -> Option<SceneId> {
        let doc = self.doc;
        let Some(target) = href_target(doc, node) else {
            debug!("use without a local href");
            return None;
        };
        let Some(template) = self.registry.template(target) else {
            debug!(href = target, "use references unknown id");
            return None;
        };
        if self.expanding.contains(&template) {
            debug!(href = target, "Cutting cyclic use reference");
            return None;
        }
        if scene.len() >= MAX_USE_SCENE_NODES {
            debug!(href = target, nodes = scene.len(), "Scene too large, cutting use expansion");
            return None;
        }

        let vp = frame.viewport;
        let mut group = self.build(node, frame.style, &vp)?;
        let x = length_attribute(doc, node, "x", Axis::Horizontal, &vp);
        let y = length_attribute(doc, node, "y", Axis::Vertical, &vp);
        if x != 0.0 || y != 0.0 {
            group.transform.push(TransformPrimitive::Translate { x, y });
        }

        let is_symbol = doc.name(template) == Some("symbol");
        let mut inner = vp;
        if is_symbol {
            let view_box = doc.attribute(template, "viewBox").and_then(ViewBox::parse);
            let target_viewport = Viewport::new(
                positive_length(doc, node, "width", Axis::Horizontal, &vp).unwrap_or(vp.width),
                positive_length(doc, node, "height", Axis::Vertical, &vp).unwrap_or(vp.height),
            );
            inner = fit_view_box(doc, template, &mut group, view_box, &target_viewport);
        }

        let id = scene.append(parent, group);
        self.expanding.push(template);
        if is_symbol {
            let symbol_style = self.resolve_style(template, frame);
            let propagated = frame.propagated.descend(doc, template);
            let symbol_frame = Frame {
                style: &symbol_style,
                propagated: &propagated,
                viewport: inner,
            };
            self.walk_children(scene, id, template, &symbol_frame);
        } else {
            self.visit(scene, id, template, frame);
        }
        self.expanding.pop();
        Some(id)
    }

    fn visit_text(&mut self, scene: &mut Scene, parent: SceneId, node: DomId, frame: &Frame<'_>) -> Option<SceneId> {
        let text = self.build(node, frame.style, &frame.viewport)?;
        let is_flow = match text.geometry {
            Geometry::TextFlow { .. } => true,
            Geometry::Text(ref run) => {
                if !frame.style.is_visible() || run.content.is_empty() {
                    return None;
                }
                false
            }
            _ => false,
        };

        let id = scene.append(parent, text);
        if is_flow {
            self.add_text_runs(scene, id, node, frame);
        }
        Some(id)
    }

    /// Children of a text flow: bare chunks take the text element's style, element
    /// children their own.
    fn add_text_runs(&mut self, scene: &mut Scene, flow: SceneId, node: DomId, frame: &Frame<'_>) {
        let doc = self.doc;
        let children = doc.children(node);
        let last = children.len().saturating_sub(1);
        let mut at_start = true;

        for (index, &child) in children.iter().enumerate() {
            let trim_end = index == last;

            if let Some(text) = doc.text(child) {
                let content = collapse_whitespace(text, at_start, trim_end);
                if content.is_empty() || !frame.style.is_visible() {
                    continue;
                }
                let ctx = BuildContext {
                    registry: &self.registry,
                    viewport: &frame.viewport,
                };
                let run = build_text_run(&ctx, doc, child, "#text", content, frame.style);
                scene.append(flow, run);
                at_start = false;
                continue;
            }

            let Some(tag) = doc.name(child) else { continue };
            if ElementKind::from_tag(tag) == ElementKind::NonRendering {
                continue;
            }
            let style = self.resolve_style(child, frame);
            if !style.is_displayed() || !style.is_visible() {
                continue;
            }
            let content = collapse_whitespace(&doc.text_content(child), at_start, trim_end);
            if content.is_empty() {
                continue;
            }

            let ctx = BuildContext {
                registry: &self.registry,
                viewport: &frame.viewport,
            };
            let mut run = build_text_run(&ctx, doc, child, tag, content, &style);
            run.id = doc.attribute(child, "id").map(str::to_string);
            attach_transform_and_effect(&mut run, &style, &self.registry);
            let run_id = scene.append(flow, run);
            at_start = false;

            if let Some(id) = doc.attribute(child, "id") {
                self.register(id, run_id);
            }
        }
    }
}

/// Viewport established by an `svg` element: width/height, else the viewBox size, else
/// the enclosing viewport.
fn element_viewport(doc: &Document, node: DomId, enclosing: &Viewport) -> (Viewport, Option<ViewBox>) {
    let view_box = doc.attribute(node, "viewBox").and_then(ViewBox::parse);
    let width = positive_length(doc, node, "width", Axis::Horizontal, enclosing)
        .unwrap_or_else(|| view_box.map_or(enclosing.width, |vb| vb.width));
    let height = positive_length(doc, node, "height", Axis::Vertical, enclosing)
        .unwrap_or_else(|| view_box.map_or(enclosing.height, |vb| vb.height));
    (Viewport::new(width, height), view_box)
}

/// Append the viewBox mapping to `group` and return the viewport its children see.
fn fit_view_box(
    doc: &Document,
    node: DomId,
    group: &mut SceneNode,
    view_box: Option<ViewBox>,
    viewport: &Viewport,
) -> Viewport {
    if let Some(vb) = view_box {
        group
            .transform
            .extend(vb.fit(viewport, doc.attribute(node, "preserveAspectRatio")));
    }
    inner_viewport(view_box, viewport)
}

/// Viewport seen inside an element: its viewBox size when it has one.
fn inner_viewport(view_box: Option<ViewBox>, viewport: &Viewport) -> Viewport {
    view_box.map_or(*viewport, |vb| Viewport::new(vb.width, vb.height))
}

fn length_attribute(doc: &Document, node: DomId, name: &str, axis: Axis, viewport: &Viewport) -> f32 {
    doc.attribute(node, name)
        .map_or(0.0, |v| parse_length(v, axis, viewport))
}

fn positive_length(doc: &Document, node: DomId, name: &str, axis: Axis, viewport: &Viewport) -> Option<f32> {
    doc.attribute(node, name)
        .and_then(|v| try_parse_length(v, axis, viewport))
        .filter(|v| *v > 0.0)
}

/// Local id referenced by `href` or `xlink:href`. External references yield `None`.
fn href_target(doc: &Document, node: DomId) -> Option<&str> {
    let href = doc
        .attribute(node, "href")
        .or_else(|| doc.attribute(node, "xlink:href"))?
        .trim();
    href.strip_prefix('#').filter(|id| !id.is_empty())
}

fn is_renderable(doc: &Document, node: DomId) -> bool {
    doc.name(node).is_some_and(|tag| {
        !matches!(
            ElementKind::from_tag(tag),
            ElementKind::NonRendering | ElementKind::Unknown
        )
    })
}
