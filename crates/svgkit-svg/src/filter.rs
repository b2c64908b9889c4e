//! Filter specifications and their resolution into effect graphs.
//!
//! A `<filter>` element is parsed once into a [`FilterSpec`]. Each element that
//! references it gets its own [`ResolvedFilter`], built in two stages over the
//! declared primitives:
//!
//! 1. **instantiate**: walk the primitives in order, skip composites whose predicate
//!    rejects them and create an effect node for each remaining one;
//! 2. **wire**: walk the applied effects again in the same order and connect each
//!    node to its inputs. A named input reads the most recent earlier producer of
//!    that name, so the graph never points forward or at itself.
//!
//! The source-alpha stand-in is created at most once between the two stages.

use crate::length::{parse_number, parse_opacity};
use crate::paint::parse_url;
use crate::registry::IdRegistry;
use smallvec::{smallvec, SmallVec};
use std::collections::HashMap;
use svgkit_css::{parse_declarations, Color};
use svgkit_dom::{Document, NodeId};
use tracing::{debug, debug_span};

/// Input reference of a filter primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterInput {
    /// Output of the preceding primitive, or the source graphic for the first one.
    Previous,
    SourceGraphic,
    SourceAlpha,
    /// `result` name of another primitive.
    Named(String),
}

impl FilterInput {
    /// Parse an `in`/`in2` attribute. A missing attribute means [`FilterInput::Previous`].
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => FilterInput::Previous,
            Some("SourceGraphic") => FilterInput::SourceGraphic,
            Some("SourceAlpha") => FilterInput::SourceAlpha,
            Some(keyword @ ("BackgroundImage" | "BackgroundAlpha" | "FillPaint" | "StrokePaint")) => {
                debug!(keyword, "Unsupported filter input, using SourceGraphic");
                FilterInput::SourceGraphic
            }
            Some(name) => FilterInput::Named(name.to_string()),
        }
    }
}

/// Filter primitive element names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterPrimitiveKind {
    GaussianBlur,
    Offset,
    Flood,
    DropShadow,
    ColorMatrix,
    Blend,
    Merge,
    Composite,
}

lazy_static::lazy_static! {
    static ref FILTER_PRIMITIVES: HashMap<&'static str, FilterPrimitiveKind> = {
        let mut m = HashMap::new();
        m.insert("feGaussianBlur", FilterPrimitiveKind::GaussianBlur);
        m.insert("feOffset", FilterPrimitiveKind::Offset);
        m.insert("feFlood", FilterPrimitiveKind::Flood);
        m.insert("feDropShadow", FilterPrimitiveKind::DropShadow);
        m.insert("feColorMatrix", FilterPrimitiveKind::ColorMatrix);
        m.insert("feBlend", FilterPrimitiveKind::Blend);
        m.insert("feMerge", FilterPrimitiveKind::Merge);
        m.insert("feComposite", FilterPrimitiveKind::Composite);
        m
    };
}

impl FilterPrimitiveKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        FILTER_PRIMITIVES.get(tag).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    /// Unknown modes fall back to `normal`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "multiply" => BlendMode::Multiply,
            "screen" => BlendMode::Screen,
            "overlay" => BlendMode::Overlay,
            "darken" => BlendMode::Darken,
            "lighten" => BlendMode::Lighten,
            "color-dodge" => BlendMode::ColorDodge,
            "color-burn" => BlendMode::ColorBurn,
            "hard-light" => BlendMode::HardLight,
            "soft-light" => BlendMode::SoftLight,
            "difference" => BlendMode::Difference,
            "exclusion" => BlendMode::Exclusion,
            _ => BlendMode::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeOperator {
    #[default]
    Over,
    In,
    Out,
    Atop,
    Xor,
    Arithmetic,
}

impl CompositeOperator {
    /// Unknown operators fall back to `over`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "in" => CompositeOperator::In,
            "out" => CompositeOperator::Out,
            "atop" => CompositeOperator::Atop,
            "xor" => CompositeOperator::Xor,
            "arithmetic" => CompositeOperator::Arithmetic,
            _ => CompositeOperator::Over,
        }
    }

    /// Whether the operator maps onto a blend of the target model.
    pub fn has_blend_equivalent(self) -> bool {
        matches!(
            self,
            CompositeOperator::Over | CompositeOperator::Atop | CompositeOperator::Arithmetic
        )
    }
}

/// `feColorMatrix` variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorMatrix {
    Saturate(f32),
    /// Degrees.
    HueRotate(f32),
    LuminanceToAlpha,
    /// Full 5x4 matrix. Parsed but not instantiated.
    Matrix(Vec<f32>),
}

/// Parameters of one filter primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPrimitive {
    GaussianBlur {
        std_dev_x: f32,
        std_dev_y: f32,
    },
    Offset {
        dx: f32,
        dy: f32,
    },
    Flood {
        color: Color,
    },
    DropShadow {
        dx: f32,
        dy: f32,
        std_dev_x: f32,
        std_dev_y: f32,
        color: Color,
    },
    ColorMatrix(ColorMatrix),
    Blend {
        mode: BlendMode,
        in2: FilterInput,
    },
    Merge {
        inputs: Vec<FilterInput>,
    },
    Composite {
        operator: CompositeOperator,
        in2: FilterInput,
        k: [f32; 4],
    },
}

/// One declared primitive of a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEffect {
    pub input: FilterInput,
    pub result: Option<String>,
    pub primitive: FilterPrimitive,
}

impl FilterEffect {
    pub fn new(primitive: FilterPrimitive) -> Self {
        Self {
            input: FilterInput::Previous,
            result: None,
            primitive,
        }
    }

    pub fn with_input(mut self, input: FilterInput) -> Self {
        self.input = input;
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    /// Every input this primitive reads, primary first.
    pub fn inputs(&self) -> SmallVec<[&FilterInput; 2]> {
        match &self.primitive {
            FilterPrimitive::Flood { .. } => SmallVec::new(),
            FilterPrimitive::Merge { inputs } => inputs.iter().collect(),
            FilterPrimitive::Blend { in2, .. } | FilterPrimitive::Composite { in2, .. } => {
                smallvec![&self.input, in2]
            }
            _ => smallvec![&self.input],
        }
    }

    /// Whether this primitive takes part, given the effects applied before it.
    ///
    /// Only composites can be skipped: a composite needs at least one earlier applied
    /// effect, must not be the first primitive, and its operator must have a blend
    /// equivalent.
    pub fn should_apply(&self, applied: &[AppliedEffect], index: usize) -> bool {
        match &self.primitive {
            FilterPrimitive::Composite { operator, .. } => {
                index > 0 && !applied.is_empty() && operator.has_blend_equivalent()
            }
            _ => true,
        }
    }

    /// The effect node kind for this primitive, or `None` when it is unsupported.
    pub fn instantiate(&self) -> Option<EffectKind> {
        let kind = match &self.primitive {
            FilterPrimitive::GaussianBlur { std_dev_x, std_dev_y } => EffectKind::GaussianBlur {
                std_dev_x: *std_dev_x,
                std_dev_y: *std_dev_y,
            },
            FilterPrimitive::Offset { dx, dy } => EffectKind::Offset { dx: *dx, dy: *dy },
            FilterPrimitive::Flood { color } => EffectKind::Flood { color: *color },
            FilterPrimitive::DropShadow {
                dx,
                dy,
                std_dev_x,
                std_dev_y,
                color,
            } => EffectKind::DropShadow {
                dx: *dx,
                dy: *dy,
                std_dev_x: *std_dev_x,
                std_dev_y: *std_dev_y,
                color: *color,
            },
            FilterPrimitive::ColorMatrix(ColorMatrix::Saturate(s)) => EffectKind::Saturate(*s),
            FilterPrimitive::ColorMatrix(ColorMatrix::HueRotate(a)) => EffectKind::HueRotate(*a),
            FilterPrimitive::ColorMatrix(ColorMatrix::LuminanceToAlpha) => EffectKind::LuminanceToAlpha,
            FilterPrimitive::ColorMatrix(ColorMatrix::Matrix(_)) => {
                debug!("feColorMatrix type=matrix is not supported");
                return None;
            }
            FilterPrimitive::Blend { mode, .. } => EffectKind::Blend { mode: *mode },
            FilterPrimitive::Merge { .. } => EffectKind::Merge,
            FilterPrimitive::Composite { operator, k, .. } => EffectKind::Composite {
                operator: *operator,
                k: *k,
            },
        };
        Some(kind)
    }
}

/// A parsed `<filter>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub id: String,
    pub effects: Vec<FilterEffect>,
}

impl FilterSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: FilterEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Parse a `<filter>` element. Unknown primitives are skipped.
    pub fn from_element(doc: &Document, node: NodeId) -> Option<Self> {
        let mut spec = FilterSpec::new(doc.attribute(node, "id")?);
        for child in doc.element_children(node) {
            let tag = doc.name(child).unwrap_or_default();
            let Some(kind) = FilterPrimitiveKind::from_tag(tag) else {
                debug!(tag, filter = %spec.id, "Skipping unsupported filter primitive");
                continue;
            };
            spec.effects.push(FilterEffect {
                input: FilterInput::parse(doc.attribute(child, "in")),
                result: doc.attribute(child, "result").map(str::to_string),
                primitive: parse_primitive(doc, child, kind),
            });
        }
        Some(spec)
    }

    /// Resolve this filter into a wired effect graph. `None` when nothing applies.
    pub fn resolve(&self) -> Option<ResolvedFilter> {
        let _span = debug_span!("resolve_filter", id = %self.id).entered();

        let mut graph = EffectGraph::default();
        let (applied, uses_source_alpha) = self.instantiate(&mut graph);
        let output = applied.last()?.effect;

        let source_alpha = uses_source_alpha.then(|| {
            graph.add(
                EffectKind::ColorAdjust { brightness: -1.0 },
                smallvec![EffectSource::SourceGraphic],
            )
        });

        wire(&mut graph, &applied, source_alpha);
        debug!(applied = applied.len(), nodes = graph.len(), "Resolved filter");

        Some(ResolvedFilter {
            filter_id: self.id.clone(),
            graph,
            applied,
            source_alpha,
            output,
        })
    }

    /// First stage: create nodes for applicable primitives, in declaration order.
    fn instantiate(&self, graph: &mut EffectGraph) -> (Vec<AppliedEffect>, bool) {
        let mut applied: Vec<AppliedEffect> = Vec::new();
        let mut uses_source_alpha = false;

        for (index, effect) in self.effects.iter().enumerate() {
            if !effect.should_apply(&applied, index) {
                debug!(index, "Skipping composite");
                continue;
            }
            let Some(kind) = effect.instantiate() else {
                continue;
            };
            if effect.inputs().iter().any(|i| **i == FilterInput::SourceAlpha) {
                uses_source_alpha = true;
            }

            let id = graph.add(kind, SmallVec::new());
            applied.push(AppliedEffect {
                index,
                spec: effect.clone(),
                effect: id,
            });
        }

        (applied, uses_source_alpha)
    }
}

/// Second stage: connect every applied node to its inputs.
fn wire(graph: &mut EffectGraph, applied: &[AppliedEffect], source_alpha: Option<EffectId>) {
    let mut previous: Option<EffectId> = None;
    let mut named: HashMap<&str, EffectId> = HashMap::new();

    for entry in applied {
        let fallback = previous.map_or(EffectSource::SourceGraphic, EffectSource::Effect);
        let inputs = entry
            .spec
            .inputs()
            .into_iter()
            .map(|input| match input {
                FilterInput::Previous => fallback,
                FilterInput::SourceGraphic => EffectSource::SourceGraphic,
                FilterInput::SourceAlpha => source_alpha.map_or(EffectSource::SourceGraphic, EffectSource::Effect),
                FilterInput::Named(name) => match named.get(name.as_str()) {
                    Some(id) => EffectSource::Effect(*id),
                    None => {
                        debug!(name = %name, "Unknown filter result, using previous");
                        fallback
                    }
                },
            })
            .collect();

        graph.nodes[entry.effect.0].inputs = inputs;
        if let Some(result) = &entry.spec.result {
            named.insert(result.as_str(), entry.effect);
        }
        previous = Some(entry.effect);
    }
}

/// Resolve a `filter` value against the registry.
///
/// `none`, values that are not `url(...)`, unknown ids and filters without any
/// applicable primitive yield `None`.
pub fn resolve_filter(value: &str, registry: &IdRegistry) -> Option<ResolvedFilter> {
    let value = value.trim();
    if value == "none" {
        return None;
    }
    resolve_filter_id(parse_url(value)?, registry)
}

/// Resolve the filter registered under `id`.
pub fn resolve_filter_id(id: &str, registry: &IdRegistry) -> Option<ResolvedFilter> {
    match registry.filter(id) {
        Some(spec) => spec.resolve(),
        None => {
            debug!(id, "Unknown filter reference");
            None
        }
    }
}

fn parse_primitive(doc: &Document, node: NodeId, kind: FilterPrimitiveKind) -> FilterPrimitive {
    let number = |name: &str, default: f32| {
        doc.attribute(node, name)
            .and_then(parse_number)
            .unwrap_or(default)
    };
    let std_deviation = |default: f32| {
        let values: Vec<f32> = doc
            .attribute(node, "stdDeviation")
            .map(numbers)
            .unwrap_or_default();
        let x = values.first().copied().unwrap_or(default).max(0.0);
        let y = values.get(1).copied().unwrap_or(x).max(0.0);
        (x, y)
    };
    let in2 = || FilterInput::parse(doc.attribute(node, "in2"));

    match kind {
        FilterPrimitiveKind::GaussianBlur => {
            let (std_dev_x, std_dev_y) = std_deviation(0.0);
            FilterPrimitive::GaussianBlur { std_dev_x, std_dev_y }
        }
        FilterPrimitiveKind::Offset => FilterPrimitive::Offset {
            dx: number("dx", 0.0),
            dy: number("dy", 0.0),
        },
        FilterPrimitiveKind::Flood => FilterPrimitive::Flood {
            color: flood_color(doc, node),
        },
        FilterPrimitiveKind::DropShadow => {
            let (std_dev_x, std_dev_y) = std_deviation(2.0);
            FilterPrimitive::DropShadow {
                dx: number("dx", 2.0),
                dy: number("dy", 2.0),
                std_dev_x,
                std_dev_y,
                color: flood_color(doc, node),
            }
        }
        FilterPrimitiveKind::ColorMatrix => {
            let values = doc.attribute(node, "values");
            let matrix = match doc.attribute(node, "type").map(str::trim) {
                Some("saturate") => ColorMatrix::Saturate(values.and_then(parse_number).unwrap_or(1.0)),
                Some("hueRotate") => ColorMatrix::HueRotate(values.and_then(parse_number).unwrap_or(0.0)),
                Some("luminanceToAlpha") => ColorMatrix::LuminanceToAlpha,
                _ => ColorMatrix::Matrix(values.map(numbers).unwrap_or_default()),
            };
            FilterPrimitive::ColorMatrix(matrix)
        }
        FilterPrimitiveKind::Blend => FilterPrimitive::Blend {
            mode: BlendMode::parse(doc.attribute(node, "mode").unwrap_or("normal")),
            in2: in2(),
        },
        FilterPrimitiveKind::Merge => FilterPrimitive::Merge {
            inputs: doc
                .element_children(node)
                .filter(|child| doc.name(*child) == Some("feMergeNode"))
                .map(|child| FilterInput::parse(doc.attribute(child, "in")))
                .collect(),
        },
        FilterPrimitiveKind::Composite => FilterPrimitive::Composite {
            operator: CompositeOperator::parse(doc.attribute(node, "operator").unwrap_or("over")),
            in2: in2(),
            k: [number("k1", 0.0), number("k2", 0.0), number("k3", 0.0), number("k4", 0.0)],
        },
    }
}

fn numbers(s: &str) -> Vec<f32> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .filter_map(parse_number)
        .collect()
}

/// `flood-color` and `flood-opacity`, from attributes or the `style` attribute.
fn flood_color(doc: &Document, node: NodeId) -> Color {
    let mut color = doc.attribute(node, "flood-color").map(str::to_string);
    let mut opacity = doc.attribute(node, "flood-opacity").map(str::to_string);
    if let Some(style) = doc.attribute(node, "style") {
        for decl in parse_declarations(style) {
            match decl.name.as_str() {
                "flood-color" => color = Some(decl.value),
                "flood-opacity" => opacity = Some(decl.value),
                _ => {}
            }
        }
    }

    let color = color.as_deref().and_then(Color::parse).unwrap_or(Color::BLACK);
    let opacity = opacity
        .as_deref()
        .map(parse_opacity)
        .filter(|o| *o >= 0.0)
        .unwrap_or(1.0);
    color.multiply_alpha(opacity)
}

/// Index of a node in an [`EffectGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(usize);

impl EffectId {
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// What an effect node reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectSource {
    /// The rendered element itself.
    SourceGraphic,
    Effect(EffectId),
}

/// Instantiated effect.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    GaussianBlur {
        std_dev_x: f32,
        std_dev_y: f32,
    },
    Offset {
        dx: f32,
        dy: f32,
    },
    Flood {
        color: Color,
    },
    DropShadow {
        dx: f32,
        dy: f32,
        std_dev_x: f32,
        std_dev_y: f32,
        color: Color,
    },
    Saturate(f32),
    HueRotate(f32),
    LuminanceToAlpha,
    /// Brightness adjustment; `-1.0` stands in for the source alpha channel.
    ColorAdjust {
        brightness: f32,
    },
    Blend {
        mode: BlendMode,
    },
    Merge,
    Composite {
        operator: CompositeOperator,
        k: [f32; 4],
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectNode {
    pub kind: EffectKind,
    pub inputs: SmallVec<[EffectSource; 2]>,
}

/// Arena of effect nodes produced by one filter resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectGraph {
    nodes: Vec<EffectNode>,
}

impl EffectGraph {
    fn add(&mut self, kind: EffectKind, inputs: SmallVec<[EffectSource; 2]>) -> EffectId {
        let id = EffectId(self.nodes.len());
        self.nodes.push(EffectNode { kind, inputs });
        id
    }

    pub fn get(&self, id: EffectId) -> Option<&EffectNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EffectId, &EffectNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (EffectId(i), n))
    }
}

/// A declared primitive paired with the node it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedEffect {
    /// Position of the primitive in its filter.
    pub index: usize,
    pub spec: FilterEffect,
    pub effect: EffectId,
}

/// The effect chain attached to one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub filter_id: String,
    pub graph: EffectGraph,
    /// Applied primitives in declaration order.
    pub applied: Vec<AppliedEffect>,
    /// Shared source-alpha stand-in, present when any primitive reads `SourceAlpha`.
    pub source_alpha: Option<EffectId>,
    /// The last applied effect.
    pub output: EffectId,
}

impl ResolvedFilter {
    pub fn output_node(&self) -> Option<&EffectNode> {
        self.graph.get(self.output)
    }

    /// Inputs of the `n`th applied effect.
    pub fn inputs_of(&self, n: usize) -> Option<&[EffectSource]> {
        let entry = self.applied.get(n)?;
        self.graph.get(entry.effect).map(|node| node.inputs.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blur(sd: f32) -> FilterPrimitive {
        FilterPrimitive::GaussianBlur {
            std_dev_x: sd,
            std_dev_y: sd,
        }
    }

    fn composite(operator: CompositeOperator) -> FilterEffect {
        FilterEffect::new(FilterPrimitive::Composite {
            operator,
            in2: FilterInput::Previous,
            k: [0.0; 4],
        })
    }

    #[test]
    fn test_named_result_survives_skipped_composite() {
        let spec = FilterSpec::new("f")
            .with_effect(FilterEffect::new(blur(2.0)).with_result("blurred"))
            .with_effect(composite(CompositeOperator::In))
            .with_effect(
                FilterEffect::new(FilterPrimitive::Offset { dx: 1.0, dy: 1.0 })
                    .with_input(FilterInput::Named("blurred".into())),
            );

        let resolved = spec.resolve().unwrap();
        assert_eq!(resolved.applied.len(), 2);
        assert_eq!(resolved.applied[1].index, 2);
        let first = resolved.applied[0].effect;
        assert_eq!(resolved.inputs_of(1), Some(&[EffectSource::Effect(first)][..]));
        assert_eq!(resolved.output, resolved.applied[1].effect);
    }

    #[test]
    fn test_named_input_beats_previous() {
        let spec = FilterSpec::new("f")
            .with_effect(
                FilterEffect::new(FilterPrimitive::Flood { color: Color::WHITE }).with_result("flood"),
            )
            .with_effect(FilterEffect::new(blur(1.0)).with_input(FilterInput::SourceGraphic))
            .with_effect(
                FilterEffect::new(FilterPrimitive::Offset { dx: 0.0, dy: 0.0 })
                    .with_input(FilterInput::Named("flood".into())),
            );
        let resolved = spec.resolve().unwrap();
        let flood = resolved.applied[0].effect;
        assert_eq!(resolved.inputs_of(1), Some(&[EffectSource::SourceGraphic][..]));
        assert_eq!(resolved.inputs_of(2), Some(&[EffectSource::Effect(flood)][..]));
        assert_eq!(resolved.inputs_of(0), Some(&[][..]));
    }

    #[test]
    fn test_duplicate_result_reads_earlier_producer() {
        let spec = FilterSpec::new("f")
            .with_effect(FilterEffect::new(blur(1.0)).with_result("x"))
            .with_effect(
                FilterEffect::new(FilterPrimitive::Offset { dx: 1.0, dy: 0.0 })
                    .with_input(FilterInput::Named("x".into())),
            )
            .with_effect(FilterEffect::new(blur(2.0)).with_result("x"))
            .with_effect(
                FilterEffect::new(FilterPrimitive::Offset { dx: 0.0, dy: 1.0 })
                    .with_input(FilterInput::Named("x".into())),
            );
        let resolved = spec.resolve().unwrap();
        let first = resolved.applied[0].effect;
        let second = resolved.applied[2].effect;
        assert_eq!(resolved.inputs_of(1), Some(&[EffectSource::Effect(first)][..]));
        assert_eq!(
            resolved.inputs_of(2),
            Some(&[EffectSource::Effect(resolved.applied[1].effect)][..])
        );
        assert_eq!(resolved.inputs_of(3), Some(&[EffectSource::Effect(second)][..]));
    }

    #[test]
    fn test_self_and_forward_references_fall_back() {
        let spec = FilterSpec::new("f")
            .with_effect(
                FilterEffect::new(FilterPrimitive::Offset { dx: 1.0, dy: 1.0 })
                    .with_input(FilterInput::Named("y".into()))
                    .with_result("y"),
            )
            .with_effect(
                FilterEffect::new(blur(1.0))
                    .with_input(FilterInput::Named("z".into()))
                    .with_result("y"),
            )
            .with_effect(FilterEffect::new(blur(3.0)).with_result("z"));
        let resolved = spec.resolve().unwrap();
        let offset = resolved.applied[0].effect;
        assert_eq!(resolved.inputs_of(0), Some(&[EffectSource::SourceGraphic][..]));
        assert_eq!(resolved.inputs_of(1), Some(&[EffectSource::Effect(offset)][..]));
        for (position, entry) in resolved.applied.iter().enumerate() {
            for input in resolved.inputs_of(position).unwrap() {
                if let EffectSource::Effect(id) = input {
                    assert!(id.0 < entry.effect.0, "{position} reads a later node");
                }
            }
        }
    }

    #[test]
    fn test_composite_predicate() {
        let over = composite(CompositeOperator::Over);
        let applied = vec![AppliedEffect {
            index: 0,
            spec: FilterEffect::new(blur(1.0)),
            effect: EffectId(0),
        }];
        assert!(!over.should_apply(&[], 0));
        assert!(!over.should_apply(&[], 1));
        assert!(over.should_apply(&applied, 1));
        assert!(composite(CompositeOperator::Arithmetic).should_apply(&applied, 1));
        assert!(!composite(CompositeOperator::Xor).should_apply(&applied, 1));
        assert!(FilterEffect::new(blur(1.0)).should_apply(&[], 0));
    }

    #[test]
    fn test_source_alpha_shared_once() {
        let spec = FilterSpec::new("f")
            .with_effect(FilterEffect::new(blur(3.0)).with_input(FilterInput::SourceAlpha))
            .with_effect(FilterEffect::new(FilterPrimitive::Blend {
                mode: BlendMode::Normal,
                in2: FilterInput::SourceAlpha,
            }));
        let resolved = spec.resolve().unwrap();
        let alpha = resolved.source_alpha.unwrap();

        let alpha_nodes = resolved
            .graph
            .iter()
            .filter(|(_, n)| n.kind == EffectKind::ColorAdjust { brightness: -1.0 })
            .count();
        assert_eq!(alpha_nodes, 1);
        assert_eq!(resolved.inputs_of(0), Some(&[EffectSource::Effect(alpha)][..]));
        assert_eq!(
            resolved.inputs_of(1),
            Some(&[EffectSource::Effect(resolved.applied[0].effect), EffectSource::Effect(alpha)][..])
        );
        assert_ne!(resolved.output, alpha);
    }

    #[test]
    fn test_unknown_name_falls_back_to_previous() {
        let spec = FilterSpec::new("f")
            .with_effect(FilterEffect::new(blur(1.0)))
            .with_effect(
                FilterEffect::new(FilterPrimitive::Offset { dx: 1.0, dy: 0.0 })
                    .with_input(FilterInput::Named("nowhere".into())),
            );
        let resolved = spec.resolve().unwrap();
        assert_eq!(
            resolved.inputs_of(1),
            Some(&[EffectSource::Effect(resolved.applied[0].effect)][..])
        );
    }

    #[test]
    fn test_empty_and_unsupported_yield_no_effect() {
        assert!(FilterSpec::new("empty").resolve().is_none());
        let only_matrix = FilterSpec::new("m").with_effect(FilterEffect::new(FilterPrimitive::ColorMatrix(
            ColorMatrix::Matrix(vec![0.0; 20]),
        )));
        assert!(only_matrix.resolve().is_none());
        assert!(resolve_filter("url(#missing)", &IdRegistry::new()).is_none());
        assert!(resolve_filter("none", &IdRegistry::new()).is_none());
    }

    #[test]
    fn test_from_element() {
        let doc = Document::parse_xml(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                <filter id="shadow">
                    <feGaussianBlur in="SourceAlpha" stdDeviation="3 1" result="blur"/>
                    <feOffset dx="2" dy="4" result="offsetBlur"/>
                    <feFlood style="flood-color: red; flood-opacity: 50%"/>
                    <feTurbulence baseFrequency="0.05"/>
                    <feComposite in2="offsetBlur" operator="in"/>
                    <feMerge><feMergeNode in="offsetBlur"/><feMergeNode in="SourceGraphic"/></feMerge>
                    <feColorMatrix type="saturate" values="0.2"/>
                </filter>
            </svg>"#,
        )
        .unwrap();
        let node = doc.element_children(doc.root()).next().unwrap();
        let spec = FilterSpec::from_element(&doc, node).unwrap();

        assert_eq!(spec.id, "shadow");
        assert_eq!(spec.effects.len(), 6);
        assert_eq!(spec.effects[0].input, FilterInput::SourceAlpha);
        assert_eq!(spec.effects[0].primitive, FilterPrimitive::GaussianBlur { std_dev_x: 3.0, std_dev_y: 1.0 });
        assert_eq!(spec.effects[1].result.as_deref(), Some("offsetBlur"));
        assert_eq!(
            spec.effects[2].primitive,
            FilterPrimitive::Flood {
                color: Color::new(255, 0, 0, 0.5)
            }
        );
        assert_eq!(
            spec.effects[4].primitive,
            FilterPrimitive::Merge {
                inputs: vec![FilterInput::Named("offsetBlur".into()), FilterInput::SourceGraphic]
            }
        );
        assert_eq!(spec.effects[5].primitive, FilterPrimitive::ColorMatrix(ColorMatrix::Saturate(0.2)));

        let resolved = spec.resolve().unwrap();
        // The `in` composite is skipped.
        assert_eq!(resolved.applied.len(), 5);
        assert!(resolved.source_alpha.is_some());
    }
}
