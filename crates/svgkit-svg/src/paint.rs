//! Paints and gradient paint servers.

use crate::length::{parse_number, parse_opacity, try_parse_length};
use crate::registry::IdRegistry;
use crate::transform::{extract_transforms, TransformList};
use crate::viewport::{Axis, Viewport};
use svgkit_css::{parse_declarations, Color};
use svgkit_dom::{Document, NodeId};
use tracing::debug;

/// A paint as written in a style, before gradient references are looked up.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintSpec {
    /// Explicit `none`.
    None,
    Color(Color),
    /// `url(#id)`, holding the bare id.
    Url(String),
}

impl PaintSpec {
    /// Parse a paint value. Unreadable values are `None` so that the cascade can fall
    /// through to the next level.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value == "none" {
            return Some(PaintSpec::None);
        }
        if value.starts_with("url(") {
            return parse_url(value).map(|id| PaintSpec::Url(id.to_string()));
        }
        Color::parse(value).map(PaintSpec::Color)
    }

    /// Resolve against the registry, multiplying `opacity` into solid colors.
    ///
    /// `None` means nothing is painted: explicit `none`, or a reference to an id that
    /// holds no gradient.
    pub fn resolve(&self, opacity: Option<f32>, registry: &IdRegistry) -> Option<Paint> {
        match self {
            PaintSpec::None => None,
            PaintSpec::Color(color) => Some(Paint::Color(match opacity {
                Some(opacity) => color.multiply_alpha(opacity),
                None => *color,
            })),
            PaintSpec::Url(id) => match registry.gradient(id) {
                Some(gradient) => Some(Paint::Gradient(gradient.clone())),
                None => {
                    debug!(id = %id, "Paint references unknown gradient");
                    None
                }
            },
        }
    }
}

/// A resolved paint.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Color(Color),
    Gradient(Gradient),
}

impl Paint {
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Paint::Color(color) => Some(*color),
            Paint::Gradient(_) => None,
        }
    }
}

/// Resolve a paint value in one step. See [`PaintSpec::resolve`].
pub fn resolve_paint(value: &str, opacity: Option<f32>, registry: &IdRegistry) -> Option<Paint> {
    PaintSpec::parse(value)?.resolve(opacity, registry)
}

/// Extract the id from `url(#id)`, `url('#id')` or `url("#id")`.
pub fn parse_url(value: &str) -> Option<&str> {
    let inner = value.trim().strip_prefix("url(")?.strip_suffix(')')?;
    let inner = inner.trim().trim_matches(|c| c == '\'' || c == '"');
    let id = inner.strip_prefix('#').unwrap_or(inner).trim();
    (!id.is_empty()).then_some(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpreadMethod {
    #[default]
    Pad,
    Reflect,
    Repeat,
}

/// Coordinate system of gradient geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradientUnits {
    /// Fractions of the painted element's bounding box.
    #[default]
    ObjectBoundingBox,
    UserSpaceOnUse,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    /// Offset clamped to `0.0..=1.0` and never below the previous stop.
    pub offset: f32,
    pub color: Color,
}

/// Shared attributes of both gradient kinds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradientBase {
    pub id: String,
    pub units: GradientUnits,
    pub spread: SpreadMethod,
    pub transform: TransformList,
    pub stops: Vec<GradientStop>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub base: GradientBase,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub base: GradientBase,
    pub cx: f32,
    pub cy: f32,
    pub r: f32,
    pub fx: f32,
    pub fy: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gradient {
    Linear(LinearGradient),
    Radial(RadialGradient),
}

impl Gradient {
    /// Build a gradient from a `linearGradient` or `radialGradient` element.
    pub fn from_element(doc: &Document, node: NodeId, viewport: &Viewport) -> Option<Self> {
        let id = doc.attribute(node, "id")?.to_string();
        let units = match doc.attribute(node, "gradientUnits") {
            Some("userSpaceOnUse") => GradientUnits::UserSpaceOnUse,
            _ => GradientUnits::ObjectBoundingBox,
        };
        let spread = match doc.attribute(node, "spreadMethod") {
            Some("reflect") => SpreadMethod::Reflect,
            Some("repeat") => SpreadMethod::Repeat,
            _ => SpreadMethod::Pad,
        };
        let transform = doc
            .attribute(node, "gradientTransform")
            .map(|t| extract_transforms(t, viewport))
            .unwrap_or_default();
        let base = GradientBase {
            id,
            units,
            spread,
            transform,
            stops: parse_stops(doc, node),
        };

        let coord = |name: &str, axis: Axis, default: f32| {
            doc.attribute(node, name)
                .and_then(|v| gradient_coordinate(v, units, axis, viewport))
                .unwrap_or(default)
        };

        match doc.name(node)? {
            "linearGradient" => {
                let x2_default = match units {
                    GradientUnits::ObjectBoundingBox => 1.0,
                    GradientUnits::UserSpaceOnUse => viewport.width,
                };
                Some(Gradient::Linear(LinearGradient {
                    x1: coord("x1", Axis::Horizontal, 0.0),
                    y1: coord("y1", Axis::Vertical, 0.0),
                    x2: coord("x2", Axis::Horizontal, x2_default),
                    y2: coord("y2", Axis::Vertical, 0.0),
                    base,
                }))
            }
            "radialGradient" => {
                let half = |axis: Axis| match units {
                    GradientUnits::ObjectBoundingBox => 0.5,
                    GradientUnits::UserSpaceOnUse => viewport.extent(axis) / 2.0,
                };
                let cx = coord("cx", Axis::Horizontal, half(Axis::Horizontal));
                let cy = coord("cy", Axis::Vertical, half(Axis::Vertical));
                Some(Gradient::Radial(RadialGradient {
                    cx,
                    cy,
                    r: coord("r", Axis::Diagonal, half(Axis::Diagonal)),
                    fx: coord("fx", Axis::Horizontal, cx),
                    fy: coord("fy", Axis::Vertical, cy),
                    base,
                }))
            }
            _ => None,
        }
    }

    pub fn base(&self) -> &GradientBase {
        match self {
            Gradient::Linear(g) => &g.base,
            Gradient::Radial(g) => &g.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.base().stops
    }

    /// Replace the stop list. Used when a gradient borrows stops through `href`.
    pub(crate) fn set_stops(&mut self, stops: Vec<GradientStop>) {
        match self {
            Gradient::Linear(g) => g.base.stops = stops,
            Gradient::Radial(g) => g.base.stops = stops,
        }
    }
}

fn gradient_coordinate(value: &str, units: GradientUnits, axis: Axis, viewport: &Viewport) -> Option<f32> {
    match units {
        GradientUnits::ObjectBoundingBox => match value.trim().strip_suffix('%') {
            Some(percent) => parse_number(percent).map(|p| p / 100.0),
            None => parse_number(value),
        },
        GradientUnits::UserSpaceOnUse => try_parse_length(value, axis, viewport),
    }
}

fn parse_stops(doc: &Document, node: NodeId) -> Vec<GradientStop> {
    let mut stops: Vec<GradientStop> = Vec::new();

    for child in doc.element_children(node) {
        if doc.name(child) != Some("stop") {
            continue;
        }

        let mut color_value = doc.attribute(child, "stop-color").map(str::to_string);
        let mut opacity_value = doc.attribute(child, "stop-opacity").map(str::to_string);
        if let Some(style) = doc.attribute(child, "style") {
            for decl in parse_declarations(style) {
                match decl.name.as_str() {
                    "stop-color" => color_value = Some(decl.value),
                    "stop-opacity" => opacity_value = Some(decl.value),
                    _ => {}
                }
            }
        }

        let color = color_value
            .as_deref()
            .and_then(Color::parse)
            .unwrap_or(Color::BLACK);
        let opacity = opacity_value
            .as_deref()
            .map(parse_opacity)
            .filter(|o| *o >= 0.0)
            .unwrap_or(1.0);

        let offset = doc
            .attribute(child, "offset")
            .and_then(|o| match o.trim().strip_suffix('%') {
                Some(percent) => parse_number(percent).map(|p| p / 100.0),
                None => parse_number(o),
            })
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        let offset = stops.last().map_or(offset, |prev| offset.max(prev.offset));

        stops.push(GradientStop {
            offset,
            color: color.multiply_alpha(opacity),
        });
    }

    stops
}
