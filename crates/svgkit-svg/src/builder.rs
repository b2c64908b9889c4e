//! Turns an element and its resolved style into a scene node.

use crate::filter::resolve_filter_id;
use crate::length::{parse_length, try_parse_length};
use crate::path::{parse_path, parse_points};
use crate::registry::IdRegistry;
use crate::scene::{Font, Geometry, ImageRef, PrimitiveStyle, SceneNode, TextRun};
use crate::style::ResolvedStyle;
use crate::transform::TransformList;
use crate::viewport::{Axis, Viewport};
use svgkit_dom::{Document, NodeId};
use tracing::debug;

/// How the assembler treats an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Root or nested `<svg>`: a group with its own viewport.
    Svg,
    /// `g` or `a`.
    Group,
    /// Group drawing only its first child.
    Switch,
    Use,
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
    Text,
    TextSpan,
    Image,
    /// Definitions and metadata; never drawn in place.
    NonRendering,
    Unknown,
}

impl ElementKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "svg" => ElementKind::Svg,
            "g" | "a" => ElementKind::Group,
            "switch" => ElementKind::Switch,
            "use" => ElementKind::Use,
            "path" => ElementKind::Path,
            "rect" => ElementKind::Rect,
            "circle" => ElementKind::Circle,
            "ellipse" => ElementKind::Ellipse,
            "line" => ElementKind::Line,
            "polyline" => ElementKind::Polyline,
            "polygon" => ElementKind::Polygon,
            "text" => ElementKind::Text,
            "tspan" => ElementKind::TextSpan,
            "image" => ElementKind::Image,
            "defs" | "symbol" | "linearGradient" | "radialGradient" | "filter" | "style" | "title"
            | "desc" | "metadata" | "clipPath" | "mask" | "pattern" | "marker" | "stop" => {
                ElementKind::NonRendering
            }
            _ => ElementKind::Unknown,
        }
    }

    /// Whether children of this element are walked as drawable content.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            ElementKind::Svg | ElementKind::Group | ElementKind::Switch | ElementKind::Use
        )
    }
}

/// Everything the builder needs besides the element itself.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub registry: &'a IdRegistry,
    pub viewport: &'a Viewport,
}

/// Build the node for `node`, or `None` for elements that produce nothing.
///
/// Containers come back as empty groups; their children are added by the caller.
/// A `text` element with element children comes back as a [`Geometry::TextFlow`] whose
/// runs the caller adds with [`build_text_run`].
pub fn build_primitive(
    ctx: &BuildContext<'_>,
    doc: &Document,
    node: NodeId,
    style: &ResolvedStyle,
) -> Option<SceneNode> {
    let tag = doc.name(node)?;
    let kind = ElementKind::from_tag(tag);
    let geometry = build_geometry(ctx, doc, node, kind, style)?;

    let mut scene_node = SceneNode::new(tag, geometry);
    scene_node.id = doc.attribute(node, "id").map(str::to_string);
    scene_node.style = apply_style(style, ctx.registry);
    attach_transform_and_effect(&mut scene_node, style, ctx.registry);
    Some(scene_node)
}

/// A text run node for `content`, positioned by the attributes of `node`.
pub fn build_text_run(
    ctx: &BuildContext<'_>,
    doc: &Document,
    node: NodeId,
    element: &str,
    content: String,
    style: &ResolvedStyle,
) -> SceneNode {
    let run = text_run(ctx, doc, node, content, style);
    let mut scene_node = SceneNode::new(element, Geometry::Text(run));
    scene_node.style = apply_style(style, ctx.registry);
    scene_node
}

/// Resolve the paint-related part of a style.
///
/// `fill-opacity` and `stroke-opacity` are multiplied into solid colors only; gradients
/// carry their own stop opacities.
pub fn apply_style(style: &ResolvedStyle, registry: &IdRegistry) -> PrimitiveStyle {
    PrimitiveStyle {
        fill: style.fill().resolve(Some(style.fill_opacity()), registry),
        stroke: style.stroke().resolve(Some(style.stroke_opacity()), registry),
        stroke_width: style.stroke_width(),
        dash_array: style.dash_array().to_vec(),
        dash_offset: style.dash_offset(),
        line_cap: style.line_cap(),
        line_join: style.line_join(),
        miter_limit: style.miter_limit(),
        fill_rule: style.fill_rule(),
        clip_rule: style.clip_rule(),
        opacity: style.opacity(),
    }
}

/// Set the element's transform list and resolve its filter.
pub fn attach_transform_and_effect(scene_node: &mut SceneNode, style: &ResolvedStyle, registry: &IdRegistry) {
    scene_node.transform = style.transform().iter().copied().collect::<TransformList>();
    scene_node.effect = style
        .filter()
        .and_then(|id| resolve_filter_id(id, registry));
}

fn build_geometry(
    ctx: &BuildContext<'_>,
    doc: &Document,
    node: NodeId,
    kind: ElementKind,
    style: &ResolvedStyle,
) -> Option<Geometry> {
    let vp = ctx.viewport;
    let len = |name: &str, axis: Axis| {
        doc.attribute(node, name)
            .map(|v| parse_length(v, axis, vp))
            .unwrap_or(0.0)
    };

    let geometry = match kind {
        ElementKind::Svg | ElementKind::Group | ElementKind::Switch | ElementKind::Use => Geometry::Group,
        ElementKind::Path => Geometry::Path(parse_path(doc.attribute(node, "d").unwrap_or_default())),
        ElementKind::Rect => {
            let width = len("width", Axis::Horizontal);
            let height = len("height", Axis::Vertical);
            let rx = doc
                .attribute(node, "rx")
                .and_then(|v| try_parse_length(v, Axis::Horizontal, vp));
            let ry = doc
                .attribute(node, "ry")
                .and_then(|v| try_parse_length(v, Axis::Vertical, vp));
            let (rx, ry) = match (rx, ry) {
                (Some(rx), Some(ry)) => (rx, ry),
                (Some(r), None) | (None, Some(r)) => (r, r),
                (None, None) => (0.0, 0.0),
            };
            Geometry::Rect {
                x: len("x", Axis::Horizontal),
                y: len("y", Axis::Vertical),
                width,
                height,
                rx: rx.clamp(0.0, (width / 2.0).max(0.0)),
                ry: ry.clamp(0.0, (height / 2.0).max(0.0)),
            }
        }
        ElementKind::Circle => Geometry::Circle {
            cx: len("cx", Axis::Horizontal),
            cy: len("cy", Axis::Vertical),
            r: len("r", Axis::Diagonal),
        },
        ElementKind::Ellipse => Geometry::Ellipse {
            cx: len("cx", Axis::Horizontal),
            cy: len("cy", Axis::Vertical),
            rx: len("rx", Axis::Horizontal),
            ry: len("ry", Axis::Vertical),
        },
        ElementKind::Line => Geometry::Line {
            x1: len("x1", Axis::Horizontal),
            y1: len("y1", Axis::Vertical),
            x2: len("x2", Axis::Horizontal),
            y2: len("y2", Axis::Vertical),
        },
        ElementKind::Polyline => Geometry::Polyline(parse_points(doc.attribute(node, "points").unwrap_or_default())),
        ElementKind::Polygon => Geometry::Polygon(parse_points(doc.attribute(node, "points").unwrap_or_default())),
        ElementKind::Text | ElementKind::TextSpan => {
            if doc.element_children(node).next().is_some() {
                Geometry::TextFlow {
                    x: first_coordinate(doc, node, "x", Axis::Horizontal, vp),
                    y: first_coordinate(doc, node, "y", Axis::Vertical, vp),
                }
            } else {
                let content = collapse_whitespace(&doc.text_content(node), true, true);
                Geometry::Text(text_run(ctx, doc, node, content, style))
            }
        }
        ElementKind::Image => {
            let href = doc
                .attribute(node, "href")
                .or_else(|| doc.attribute(node, "xlink:href"));
            let Some(href) = href else {
                debug!("Image without href");
                return None;
            };
            Geometry::Image(ImageRef {
                href: href.to_string(),
                x: len("x", Axis::Horizontal),
                y: len("y", Axis::Vertical),
                width: len("width", Axis::Horizontal),
                height: len("height", Axis::Vertical),
                preserve_aspect_ratio: doc
                    .attribute(node, "preserveAspectRatio")
                    .unwrap_or("xMidYMid meet")
                    .to_string(),
            })
        }
        ElementKind::NonRendering | ElementKind::Unknown => return None,
    };
    Some(geometry)
}

fn text_run(
    ctx: &BuildContext<'_>,
    doc: &Document,
    node: NodeId,
    content: String,
    style: &ResolvedStyle,
) -> TextRun {
    let vp = ctx.viewport;
    let font_size = style.font_size();
    TextRun {
        content,
        x: first_coordinate(doc, node, "x", Axis::Horizontal, vp),
        y: first_coordinate(doc, node, "y", Axis::Vertical, vp),
        dx: first_coordinate(doc, node, "dx", Axis::Horizontal, vp).unwrap_or(0.0),
        dy: first_coordinate(doc, node, "dy", Axis::Vertical, vp).unwrap_or(0.0),
        font: Font {
            family: style.font_family().map(str::to_string),
            weight: style.font_weight(),
            posture: style.font_style(),
            size: font_size,
        },
        decoration: style.text_decoration(),
        baseline_offset: style
            .baseline_shift()
            .map_or(0.0, |shift| shift.offset(font_size)),
    }
}

/// First entry of a coordinate list attribute such as `x="10 20 30"`.
fn first_coordinate(doc: &Document, node: NodeId, name: &str, axis: Axis, vp: &Viewport) -> Option<f32> {
    let value = doc.attribute(node, name)?;
    let first = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|p| !p.is_empty())?;
    Some(parse_length(first, axis, vp))
}

/// Collapse whitespace runs to one space, optionally trimming either end.
pub fn collapse_whitespace(text: &str, trim_start: bool, trim_end: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !(out.is_empty() && trim_start) {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    if pending_space && !trim_end && !(out.is_empty() && trim_start) {
        out.push(' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Paint, PaintSpec};
    use crate::style::{PropagatedAttributes, StyleResolver, StyleRuleSet};
    use svgkit_css::Color;

    fn build(svg: &str) -> SceneNode {
        let doc = Document::parse_xml(svg).unwrap();
        let node = doc.element_children(doc.root()).next().unwrap();
        let rules = StyleRuleSet::new();
        let vp = Viewport::new(100.0, 100.0);
        let style = StyleResolver::new(&rules).resolve(
            &doc,
            node,
            &ResolvedStyle::new(),
            &PropagatedAttributes::new(),
            &vp,
        );
        let registry = IdRegistry::new();
        let ctx = BuildContext {
            registry: &registry,
            viewport: &vp,
        };
        build_primitive(&ctx, &doc, node, &style).unwrap()
    }

    #[test]
    fn test_rect_radius_defaults() {
        let node = build(r#"<svg xmlns="http://www.w3.org/2000/svg"><rect x="1" y="2" width="20" height="10" rx="3"/></svg>"#);
        assert_eq!(
            node.geometry,
            Geometry::Rect {
                x: 1.0,
                y: 2.0,
                width: 20.0,
                height: 10.0,
                rx: 3.0,
                ry: 3.0
            }
        );

        let node = build(r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="20" height="10" ry="8"/></svg>"#);
        let Geometry::Rect { rx, ry, .. } = node.geometry else {
            panic!("expected rect");
        };
        assert_eq!((rx, ry), (8.0, 5.0));
    }

    #[test]
    fn test_fill_opacity_only_touches_solid_fill() {
        let node = build(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><circle r="5" fill="red" fill-opacity="0.5" stroke="url(#nope)" stroke-opacity="0.5"/></svg>"#,
        );
        assert_eq!(node.style.fill, Some(Paint::Color(Color::new(255, 0, 0, 0.5))));
        assert_eq!(node.style.stroke, None);
    }

    #[test]
    fn test_fill_opacity_leaves_gradient_untouched() {
        let scene = crate::load_str(
            r##"<svg xmlns="http://www.w3.org/2000/svg">
                <linearGradient id="g">
                    <stop offset="0" stop-color="red"/>
                    <stop offset="1" stop-color="blue" stop-opacity="0.5"/>
                </linearGradient>
                <rect id="faded" width="4" height="4" fill="url(#g)" fill-opacity="0.25"/>
                <rect id="plain" width="4" height="4" fill="url(#g)"/>
            </svg>"##,
        )
        .unwrap();
        let fill = |id: &str| scene.get(scene.node_id(id).unwrap()).unwrap().style.fill.clone();

        let Some(Paint::Gradient(gradient)) = fill("faded") else {
            panic!("expected a gradient fill");
        };
        assert_eq!(gradient.id(), "g");
        let colors: Vec<Color> = gradient.stops().iter().map(|stop| stop.color).collect();
        assert_eq!(colors, vec![Color::from_rgb(255, 0, 0), Color::new(0, 0, 255, 0.5)]);
        assert_eq!(fill("faded"), fill("plain"));
    }

    #[test]
    fn test_fill_rule_restricted() {
        let node = build(r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0" fill-rule="evenodd" clip-rule="odd"/></svg>"#);
        assert_eq!(node.style.fill_rule, Some(crate::style::FillRule::EvenOdd));
        assert_eq!(node.style.clip_rule, None);
    }

    #[test]
    fn test_text_run() {
        let node = build(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text x="5 6" y="7" font-size="10px" baseline-shift="super" font-family="'Arial'">  Hello
                world </text></svg>"#,
        );
        let Geometry::Text(run) = node.geometry else {
            panic!("expected text");
        };
        assert_eq!(run.content, "Hello world");
        assert_eq!((run.x, run.y), (Some(5.0), Some(7.0)));
        assert_eq!(run.font.size, 12.5);
        assert_eq!(run.font.family.as_deref(), Some("Arial"));
        assert!((run.baseline_offset + 3.75).abs() < 1e-5);
    }

    #[test]
    fn test_transform_attached() {
        let node = build(r#"<svg xmlns="http://www.w3.org/2000/svg"><line x2="10" transform="translate(1 2)"/></svg>"#);
        assert_eq!(node.matrix().apply(0.0, 0.0), (1.0, 2.0));
        assert_eq!(node.style.stroke, None);
        assert_eq!(
            node.style.fill,
            PaintSpec::Color(Color::BLACK).resolve(None, &IdRegistry::new())
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n b  ", true, true), "a b");
        assert_eq!(collapse_whitespace(" a  ", false, false), " a ");
        assert_eq!(collapse_whitespace("   ", false, false), " ");
        assert_eq!(collapse_whitespace("   ", true, true), "");
    }

    #[test]
    fn test_element_kinds() {
        assert_eq!(ElementKind::from_tag("a"), ElementKind::Group);
        assert_eq!(ElementKind::from_tag("symbol"), ElementKind::NonRendering);
        assert_eq!(ElementKind::from_tag("foreignObject"), ElementKind::Unknown);
        assert!(ElementKind::Use.is_container());
        assert!(!ElementKind::Text.is_container());
    }
}
