//! Style cascade.
//!
//! Every recognized property of an element is resolved from, highest precedence first:
//!
//! 1. declarations in the inline `style` attribute
//! 2. presentation attributes (`fill="red"`)
//! 3. class rules from `<style>` blocks, later blocks winning
//! 4. the parent's value, for inherited properties only
//! 5. the built-in default, applied by the [`ResolvedStyle`] accessors
//!
//! A value that cannot be parsed is absent at its level and the next level decides.
//!
//! On top of this, the attributes in [`PROPAGATED_ATTRIBUTES`] are handed from a
//! parent to each child that does not carry them itself (except `tspan`). A handed-down
//! attribute takes part in the cascade at its own level but only contributes
//! inherited properties, so a parent's `opacity` or `transform` is never applied twice.

use crate::length::{parse_font_size, parse_length_list, parse_number, parse_opacity, try_parse_length};
use crate::paint::{parse_url, PaintSpec};
use crate::transform::{extract_transforms, TransformList, TransformPrimitive};
use crate::viewport::{Axis, Viewport};
use std::collections::{BTreeMap, HashMap};
use svgkit_css::{parse_declarations, scan_class_blocks, Color, Declaration};
use svgkit_dom::{Document, NodeId};
use tracing::trace;

/// Attributes handed from parents to children lacking them.
pub const PROPAGATED_ATTRIBUTES: [&str; 5] = ["style", "stroke", "fill", "stroke-width", "class"];

/// A recognized style property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Property {
    Fill,
    FillOpacity,
    FillRule,
    ClipRule,
    Stroke,
    StrokeWidth,
    StrokeDasharray,
    StrokeDashoffset,
    StrokeLinecap,
    StrokeLinejoin,
    StrokeMiterlimit,
    StrokeOpacity,
    Opacity,
    Transform,
    Filter,
    FontFamily,
    FontWeight,
    FontStyle,
    FontSize,
    TextDecoration,
    BaselineShift,
    Visibility,
    Display,
}

lazy_static::lazy_static! {
    static ref PROPERTIES: HashMap<&'static str, Property> = Property::ALL
        .iter()
        .map(|p| (p.name(), *p))
        .collect();
}

impl Property {
    pub const ALL: [Property; 23] = [
        Property::Fill,
        Property::FillOpacity,
        Property::FillRule,
        Property::ClipRule,
        Property::Stroke,
        Property::StrokeWidth,
        Property::StrokeDasharray,
        Property::StrokeDashoffset,
        Property::StrokeLinecap,
        Property::StrokeLinejoin,
        Property::StrokeMiterlimit,
        Property::StrokeOpacity,
        Property::Opacity,
        Property::Transform,
        Property::Filter,
        Property::FontFamily,
        Property::FontWeight,
        Property::FontStyle,
        Property::FontSize,
        Property::TextDecoration,
        Property::BaselineShift,
        Property::Visibility,
        Property::Display,
    ];

    /// Look up a property by its CSS name.
    pub fn from_name(name: &str) -> Option<Self> {
        PROPERTIES.get(name).copied()
    }

    /// CSS name of the property, also used as presentation attribute name.
    pub fn name(self) -> &'static str {
        match self {
            Property::Fill => "fill",
            Property::FillOpacity => "fill-opacity",
            Property::FillRule => "fill-rule",
            Property::ClipRule => "clip-rule",
            Property::Stroke => "stroke",
            Property::StrokeWidth => "stroke-width",
            Property::StrokeDasharray => "stroke-dasharray",
            Property::StrokeDashoffset => "stroke-dashoffset",
            Property::StrokeLinecap => "stroke-linecap",
            Property::StrokeLinejoin => "stroke-linejoin",
            Property::StrokeMiterlimit => "stroke-miterlimit",
            Property::StrokeOpacity => "stroke-opacity",
            Property::Opacity => "opacity",
            Property::Transform => "transform",
            Property::Filter => "filter",
            Property::FontFamily => "font-family",
            Property::FontWeight => "font-weight",
            Property::FontStyle => "font-style",
            Property::FontSize => "font-size",
            Property::TextDecoration => "text-decoration",
            Property::BaselineShift => "baseline-shift",
            Property::Visibility => "visibility",
            Property::Display => "display",
        }
    }

    /// Whether children take the parent's value when they set none.
    pub fn is_inherited(self) -> bool {
        !matches!(
            self,
            Property::Opacity
                | Property::Transform
                | Property::Filter
                | Property::TextDecoration
                | Property::BaselineShift
                | Property::Display
        )
    }

    /// Type a raw value. `None` when the value is unreadable or `inherit`.
    pub fn parse_value(self, raw: &str, viewport: &Viewport) -> Option<PropertyValue> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "inherit" {
            return None;
        }

        match self {
            Property::Fill | Property::Stroke => PaintSpec::parse(raw).map(PropertyValue::Paint),
            Property::FillOpacity | Property::StrokeOpacity | Property::Opacity => {
                let opacity = parse_opacity(raw);
                (opacity >= 0.0).then(|| PropertyValue::Opacity(opacity.min(1.0)))
            }
            Property::FillRule | Property::ClipRule => FillRule::parse(raw).map(PropertyValue::FillRule),
            Property::StrokeWidth | Property::StrokeDashoffset => {
                try_parse_length(raw, Axis::Diagonal, viewport).map(PropertyValue::Length)
            }
            Property::StrokeDasharray => Some(PropertyValue::Dashes(
                parse_length_list(raw, viewport).unwrap_or_default(),
            )),
            Property::StrokeLinecap => LineCap::parse(raw).map(PropertyValue::LineCap),
            Property::StrokeLinejoin => LineJoin::parse(raw).map(PropertyValue::LineJoin),
            Property::StrokeMiterlimit => parse_number(raw)
                .filter(|m| *m >= 1.0)
                .map(PropertyValue::Number),
            Property::Transform => Some(PropertyValue::Transform(extract_transforms(raw, viewport))),
            Property::Filter => {
                if raw == "none" {
                    Some(PropertyValue::Filter(None))
                } else {
                    parse_url(raw).map(|id| PropertyValue::Filter(Some(id.to_string())))
                }
            }
            Property::FontFamily => {
                let family: String = raw.chars().filter(|c| *c != '\'' && *c != '"').collect();
                let family = family.trim();
                (!family.is_empty()).then(|| PropertyValue::FontFamily(family.to_string()))
            }
            Property::FontWeight => FontWeight::parse(raw).map(PropertyValue::FontWeight),
            Property::FontStyle => FontPosture::parse(raw).map(PropertyValue::FontStyle),
            Property::FontSize => Some(PropertyValue::FontSize(parse_font_size(raw))),
            Property::TextDecoration => TextDecoration::parse(raw).map(PropertyValue::TextDecoration),
            Property::BaselineShift => BaselineShift::parse(raw).map(PropertyValue::BaselineShift),
            Property::Visibility => match raw {
                "visible" => Some(PropertyValue::Visibility(true)),
                "hidden" | "collapse" => Some(PropertyValue::Visibility(false)),
                _ => None,
            },
            Property::Display => Some(PropertyValue::Display(raw != "none")),
        }
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Paint(PaintSpec),
    Opacity(f32),
    Length(f32),
    Number(f32),
    /// Empty for `none`.
    Dashes(Vec<f32>),
    FillRule(FillRule),
    LineCap(LineCap),
    LineJoin(LineJoin),
    Transform(TransformList),
    /// `None` for `none`, otherwise the referenced filter id.
    Filter(Option<String>),
    FontFamily(String),
    FontWeight(FontWeight),
    FontStyle(FontPosture),
    FontSize(f32),
    TextDecoration(TextDecoration),
    BaselineShift(BaselineShift),
    Visibility(bool),
    Display(bool),
}

/// Fill rule, also used for `clip-rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nonzero" => Some(FillRule::NonZero),
            "evenodd" => Some(FillRule::EvenOdd),
            _ => None,
        }
    }
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "butt" => Some(LineCap::Butt),
            "round" => Some(LineCap::Round),
            "square" => Some(LineCap::Square),
            _ => None,
        }
    }
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "miter" | "miter-clip" => Some(LineJoin::Miter),
            "round" => Some(LineJoin::Round),
            "bevel" => Some(LineJoin::Bevel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
    Bolder,
    Lighter,
    /// `100` through `900`.
    Numeric(u16),
}

impl FontWeight {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(FontWeight::Normal),
            "bold" => Some(FontWeight::Bold),
            "bolder" => Some(FontWeight::Bolder),
            "lighter" => Some(FontWeight::Lighter),
            _ => s
                .parse::<u16>()
                .ok()
                .filter(|w| (1..=1000).contains(w))
                .map(FontWeight::Numeric),
        }
    }
}

/// Font posture (`font-style`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontPosture {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontPosture {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(FontPosture::Normal),
            "italic" => Some(FontPosture::Italic),
            "oblique" => Some(FontPosture::Oblique),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
    Overline,
}

impl TextDecoration {
    /// The first recognized keyword wins.
    pub fn parse(s: &str) -> Option<Self> {
        s.split_whitespace().find_map(|keyword| match keyword {
            "none" => Some(TextDecoration::None),
            "underline" => Some(TextDecoration::Underline),
            "line-through" => Some(TextDecoration::LineThrough),
            "overline" => Some(TextDecoration::Overline),
            _ => None,
        })
    }
}

/// Vertical shift of a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaselineShift {
    Sub,
    Super,
    /// A bare number, in font-size units.
    Number(f32),
    /// The number written before `%`.
    Percent(f32),
}

impl BaselineShift {
    /// Fraction of the font size used by `sub` and `super`.
    pub const SUB_SUPER_RATIO: f32 = 0.3;

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sub" => Some(BaselineShift::Sub),
            "super" => Some(BaselineShift::Super),
            "baseline" => Some(BaselineShift::Number(0.0)),
            _ => match s.strip_suffix('%') {
                Some(percent) => parse_number(percent).map(BaselineShift::Percent),
                None => parse_number(s).map(BaselineShift::Number),
            },
        }
    }

    /// Offset along y for a run of the given font size. Positive moves down.
    pub fn offset(self, font_size: f32) -> f32 {
        match self {
            BaselineShift::Sub => font_size * Self::SUB_SUPER_RATIO,
            BaselineShift::Super => -font_size * Self::SUB_SUPER_RATIO,
            BaselineShift::Number(value) => -value * font_size,
            BaselineShift::Percent(value) => -value * 100.0 * font_size,
        }
    }
}

/// An ordered set of typed properties from one or more class blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    properties: BTreeMap<Property, PropertyValue>,
}

impl Rule {
    /// Type declarations; unrecognized properties and unreadable values are dropped.
    pub fn from_declarations(declarations: &[Declaration], viewport: &Viewport) -> Self {
        let mut properties = BTreeMap::new();
        for decl in declarations {
            let Some(property) = Property::from_name(&decl.name) else {
                trace!(name = %decl.name, "Ignoring unrecognized property");
                continue;
            };
            if let Some(value) = property.parse_value(&decl.value, viewport) {
                properties.insert(property, value);
            }
        }
        Self { properties }
    }

    pub fn get(&self, property: Property) -> Option<&PropertyValue> {
        self.properties.get(&property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, &PropertyValue)> {
        self.properties.iter().map(|(p, v)| (*p, v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Overlay `other` on this rule; its values win.
    pub fn merge(&mut self, other: &Rule) {
        for (property, value) in &other.properties {
            self.properties.insert(*property, value.clone());
        }
    }
}

/// Class rules of a document, in style-block order.
#[derive(Debug, Clone, Default)]
pub struct StyleRuleSet {
    blocks: Vec<(String, Rule)>,
    index: HashMap<String, Vec<usize>>,
}

impl StyleRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a rule set from one style sheet.
    pub fn parse(text: &str, viewport: &Viewport) -> Self {
        let mut rules = Self::new();
        rules.add_style_sheet(text, viewport);
        rules
    }

    /// Append the class blocks of another `<style>` element.
    pub fn add_style_sheet(&mut self, text: &str, viewport: &Viewport) {
        for block in scan_class_blocks(text) {
            let rule = Rule::from_declarations(&block.declarations, viewport);
            self.index
                .entry(block.name.clone())
                .or_default()
                .push(self.blocks.len());
            self.blocks.push((block.name, rule));
        }
    }

    /// Number of distinct classes.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Merged rule for one class.
    pub fn rule(&self, class: &str) -> Option<Rule> {
        let positions = self.index.get(class)?;
        let mut rule = Rule::default();
        for &i in positions {
            rule.merge(&self.blocks[i].1);
        }
        Some(rule)
    }

    /// Merged rule for a whitespace-separated class list. Blocks apply in document
    /// order regardless of the order of the list.
    pub fn matching(&self, classes: &str) -> Rule {
        let mut positions: Vec<usize> = classes
            .split_whitespace()
            .filter_map(|class| self.index.get(class))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();
        positions.dedup();

        let mut rule = Rule::default();
        for i in positions {
            rule.merge(&self.blocks[i].1);
        }
        rule
    }
}

/// Propagated attribute values in effect for an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagatedAttributes {
    values: BTreeMap<&'static str, String>,
}

impl PropagatedAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// What `node` receives from a parent holding `self`: the entries it does not
    /// carry itself. `tspan` receives nothing.
    pub fn received_by(&self, doc: &Document, node: NodeId) -> Self {
        if doc.name(node) == Some("tspan") {
            return Self::default();
        }
        let values = self
            .values
            .iter()
            .filter(|(name, _)| !doc.has_attribute(node, name))
            .map(|(name, value)| (*name, value.clone()))
            .collect();
        Self { values }
    }

    /// What `node` hands to its own children: its own values, completed by those it
    /// received.
    pub fn descend(&self, doc: &Document, node: NodeId) -> Self {
        let mut next = self.received_by(doc, node);
        for name in PROPAGATED_ATTRIBUTES {
            if let Some(value) = doc.attribute(node, name) {
                next.values.insert(name, value.to_string());
            }
        }
        next
    }
}

/// The cascaded properties of one element.
///
/// Only resolved values are stored; accessors supply the defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedStyle {
    properties: BTreeMap<Property, PropertyValue>,
}

impl ResolvedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: Property) -> Option<&PropertyValue> {
        self.properties.get(&property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, &PropertyValue)> {
        self.properties.iter().map(|(p, v)| (*p, v))
    }

    /// The subset children inherit.
    pub fn inherited(&self) -> ResolvedStyle {
        let properties = self
            .properties
            .iter()
            .filter(|(p, _)| p.is_inherited())
            .map(|(p, v)| (*p, v.clone()))
            .collect();
        ResolvedStyle { properties }
    }

    pub fn fill(&self) -> PaintSpec {
        match self.get(Property::Fill) {
            Some(PropertyValue::Paint(paint)) => paint.clone(),
            _ => PaintSpec::Color(Color::BLACK),
        }
    }

    pub fn stroke(&self) -> PaintSpec {
        match self.get(Property::Stroke) {
            Some(PropertyValue::Paint(paint)) => paint.clone(),
            _ => PaintSpec::None,
        }
    }

    fn opacity_of(&self, property: Property) -> f32 {
        match self.get(property) {
            Some(PropertyValue::Opacity(o)) => *o,
            _ => 1.0,
        }
    }

    pub fn fill_opacity(&self) -> f32 {
        self.opacity_of(Property::FillOpacity)
    }

    pub fn stroke_opacity(&self) -> f32 {
        self.opacity_of(Property::StrokeOpacity)
    }

    pub fn opacity(&self) -> f32 {
        self.opacity_of(Property::Opacity)
    }

    pub fn fill_rule(&self) -> Option<FillRule> {
        match self.get(Property::FillRule) {
            Some(PropertyValue::FillRule(rule)) => Some(*rule),
            _ => None,
        }
    }

    pub fn clip_rule(&self) -> Option<FillRule> {
        match self.get(Property::ClipRule) {
            Some(PropertyValue::FillRule(rule)) => Some(*rule),
            _ => None,
        }
    }

    pub fn stroke_width(&self) -> f32 {
        match self.get(Property::StrokeWidth) {
            Some(PropertyValue::Length(w)) => *w,
            _ => 1.0,
        }
    }

    pub fn dash_array(&self) -> &[f32] {
        match self.get(Property::StrokeDasharray) {
            Some(PropertyValue::Dashes(dashes)) => dashes,
            _ => &[],
        }
    }

    pub fn dash_offset(&self) -> f32 {
        match self.get(Property::StrokeDashoffset) {
            Some(PropertyValue::Length(offset)) => *offset,
            _ => 0.0,
        }
    }

    pub fn line_cap(&self) -> LineCap {
        match self.get(Property::StrokeLinecap) {
            Some(PropertyValue::LineCap(cap)) => *cap,
            _ => LineCap::default(),
        }
    }

    pub fn line_join(&self) -> LineJoin {
        match self.get(Property::StrokeLinejoin) {
            Some(PropertyValue::LineJoin(join)) => *join,
            _ => LineJoin::default(),
        }
    }

    pub fn miter_limit(&self) -> f32 {
        match self.get(Property::StrokeMiterlimit) {
            Some(PropertyValue::Number(limit)) => *limit,
            _ => 4.0,
        }
    }

    pub fn transform(&self) -> &[TransformPrimitive] {
        match self.get(Property::Transform) {
            Some(PropertyValue::Transform(list)) => list,
            _ => &[],
        }
    }

    /// Referenced filter id, if any.
    pub fn filter(&self) -> Option<&str> {
        match self.get(Property::Filter) {
            Some(PropertyValue::Filter(id)) => id.as_deref(),
            _ => None,
        }
    }

    pub fn font_family(&self) -> Option<&str> {
        match self.get(Property::FontFamily) {
            Some(PropertyValue::FontFamily(family)) => Some(family),
            _ => None,
        }
    }

    pub fn font_weight(&self) -> FontWeight {
        match self.get(Property::FontWeight) {
            Some(PropertyValue::FontWeight(weight)) => *weight,
            _ => FontWeight::default(),
        }
    }

    pub fn font_style(&self) -> FontPosture {
        match self.get(Property::FontStyle) {
            Some(PropertyValue::FontStyle(posture)) => *posture,
            _ => FontPosture::default(),
        }
    }

    pub fn font_size(&self) -> f32 {
        match self.get(Property::FontSize) {
            Some(PropertyValue::FontSize(size)) => *size,
            _ => crate::length::DEFAULT_FONT_SIZE,
        }
    }

    pub fn text_decoration(&self) -> TextDecoration {
        match self.get(Property::TextDecoration) {
            Some(PropertyValue::TextDecoration(decoration)) => *decoration,
            _ => TextDecoration::default(),
        }
    }

    pub fn baseline_shift(&self) -> Option<BaselineShift> {
        match self.get(Property::BaselineShift) {
            Some(PropertyValue::BaselineShift(shift)) => Some(*shift),
            _ => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self.get(Property::Visibility), Some(PropertyValue::Visibility(false)))
    }

    pub fn is_displayed(&self) -> bool {
        !matches!(self.get(Property::Display), Some(PropertyValue::Display(false)))
    }
}

/// Resolves elements against a document's class rules.
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    rules: &'a StyleRuleSet,
}

impl<'a> StyleResolver<'a> {
    pub fn new(rules: &'a StyleRuleSet) -> Self {
        Self { rules }
    }

    /// Cascade one element.
    ///
    /// `parent` is the parent's resolved style and `propagated` the attribute set the
    /// parent hands down (see [`PropagatedAttributes::descend`]).
    pub fn resolve(
        &self,
        doc: &Document,
        node: NodeId,
        parent: &ResolvedStyle,
        propagated: &PropagatedAttributes,
        viewport: &Viewport,
    ) -> ResolvedStyle {
        let received = propagated.received_by(doc, node);
        let mut properties = parent.inherited().properties;

        // Class rules.
        if let Some(classes) = doc.attribute(node, "class") {
            overlay(&mut properties, self.rules.matching(classes).iter(), false);
        } else if let Some(classes) = received.get("class") {
            overlay(&mut properties, self.rules.matching(classes).iter(), true);
        }

        // Presentation attributes.
        for property in Property::ALL {
            let (raw, inherited_only) = match doc.attribute(node, property.name()) {
                Some(raw) => (raw, false),
                None => match received.get(property.name()) {
                    Some(raw) => (raw, true),
                    None => continue,
                },
            };
            if inherited_only && !property.is_inherited() {
                continue;
            }
            if let Some(value) = property.parse_value(raw, viewport) {
                properties.insert(property, value);
            }
        }

        // Inline style.
        let inline = match doc.attribute(node, "style") {
            Some(style) => Some((style, false)),
            None => received.get("style").map(|style| (style, true)),
        };
        if let Some((style, inherited_only)) = inline {
            let rule = Rule::from_declarations(&parse_declarations(style), viewport);
            overlay(&mut properties, rule.iter(), inherited_only);
        }

        trace!(
            element = doc.name(node).unwrap_or_default(),
            properties = properties.len(),
            "Resolved style"
        );
        ResolvedStyle { properties }
    }
}

fn overlay<'v>(
    target: &mut BTreeMap<Property, PropertyValue>,
    values: impl Iterator<Item = (Property, &'v PropertyValue)>,
    inherited_only: bool,
) {
    for (property, value) in values {
        if inherited_only && !property.is_inherited() {
            continue;
        }
        target.insert(property, value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(100.0, 100.0)
    }

    fn first_child(doc: &Document) -> NodeId {
        doc.element_children(doc.root()).next().unwrap()
    }

    #[test]
    fn test_property_table() {
        for property in Property::ALL {
            assert_eq!(Property::from_name(property.name()), Some(property));
        }
        assert_eq!(Property::from_name("marker-start"), None);
        assert!(Property::Fill.is_inherited());
        assert!(!Property::Opacity.is_inherited());
    }

    #[test]
    fn test_rule_set_parse() {
        let rules = StyleRuleSet::parse(
            ".a { fill: red; stroke-width: 2; bogus: 1; opacity: nope } .a { stroke: blue }",
            &vp(),
        );
        let rule = rules.rule("a").unwrap();
        assert_eq!(rule.len(), 3);
        assert_eq!(
            rule.get(Property::Fill),
            Some(&PropertyValue::Paint(PaintSpec::Color(Color::from_rgb(255, 0, 0))))
        );
        assert_eq!(rule.get(Property::StrokeWidth), Some(&PropertyValue::Length(2.0)));
        assert!(rule.get(Property::Opacity).is_none());
        assert!(rules.rule("b").is_none());
    }

    #[test]
    fn test_later_class_block_wins() {
        let rules = StyleRuleSet::parse(".b { fill: blue } .a { fill: red }", &vp());
        let rule = rules.matching("a b");
        assert_eq!(
            rule.get(Property::Fill),
            Some(&PropertyValue::Paint(PaintSpec::Color(Color::from_rgb(255, 0, 0))))
        );
    }

    #[test]
    fn test_cascade_precedence() {
        let rules = StyleRuleSet::parse(".c { fill: blue }", &vp());
        let resolver = StyleResolver::new(&rules);
        let doc = Document::parse_xml(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                <rect class="c" fill="green" style="fill:red"/>
                <rect class="c" fill="green"/>
                <rect class="c"/>
                <rect/>
            </svg>"#,
        )
        .unwrap();
        let fills: Vec<PaintSpec> = doc
            .element_children(doc.root())
            .map(|rect| {
                resolver
                    .resolve(&doc, rect, &ResolvedStyle::new(), &PropagatedAttributes::new(), &vp())
                    .fill()
            })
            .collect();
        assert_eq!(
            fills,
            vec![
                PaintSpec::Color(Color::from_rgb(255, 0, 0)),
                PaintSpec::Color(Color::from_rgb(0, 128, 0)),
                PaintSpec::Color(Color::from_rgb(0, 0, 255)),
                PaintSpec::Color(Color::BLACK),
            ]
        );
    }

    #[test]
    fn test_unparsable_value_falls_through() {
        let rules = StyleRuleSet::new();
        let resolver = StyleResolver::new(&rules);
        let doc = Document::parse_xml(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><rect fill="green" style="fill:nonsense"/></svg>"#,
        )
        .unwrap();
        let style = resolver.resolve(
            &doc,
            first_child(&doc),
            &ResolvedStyle::new(),
            &PropagatedAttributes::new(),
            &vp(),
        );
        assert_eq!(style.fill(), PaintSpec::Color(Color::from_rgb(0, 128, 0)));
    }

    #[test]
    fn test_inheritance_skips_non_inherited() {
        let mut parent = ResolvedStyle::new();
        parent.properties.insert(Property::Opacity, PropertyValue::Opacity(0.5));
        parent.properties.insert(Property::StrokeWidth, PropertyValue::Length(3.0));

        let inherited = parent.inherited();
        assert_eq!(inherited.opacity(), 1.0);
        assert_eq!(inherited.stroke_width(), 3.0);
    }

    #[test]
    fn test_propagated_style_contributes_inherited_only() {
        let rules = StyleRuleSet::new();
        let resolver = StyleResolver::new(&rules);
        let doc = Document::parse_xml(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                <g style="opacity:0.5; fill:red"><rect/><tspan/></g>
            </svg>"#,
        )
        .unwrap();
        let g = first_child(&doc);
        let g_style = resolver.resolve(&doc, g, &ResolvedStyle::new(), &PropagatedAttributes::new(), &vp());
        assert_eq!(g_style.opacity(), 0.5);

        let handed_down = PropagatedAttributes::new().descend(&doc, g);
        assert_eq!(handed_down.get("style"), Some("opacity:0.5; fill:red"));

        let mut children = doc.element_children(g);
        let rect = children.next().unwrap();
        let rect_style = resolver.resolve(&doc, rect, &g_style, &handed_down, &vp());
        assert_eq!(rect_style.opacity(), 1.0);
        assert_eq!(rect_style.fill(), PaintSpec::Color(Color::from_rgb(255, 0, 0)));

        let tspan = children.next().unwrap();
        assert!(handed_down.received_by(&doc, tspan).is_empty());
    }

    #[test]
    fn test_propagated_fill_beats_own_class() {
        let rules = StyleRuleSet::parse(".b { fill: blue }", &vp());
        let resolver = StyleResolver::new(&rules);
        let doc = Document::parse_xml(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><g fill="red"><rect class="b"/></g></svg>"#,
        )
        .unwrap();
        let g = first_child(&doc);
        let g_style = resolver.resolve(&doc, g, &ResolvedStyle::new(), &PropagatedAttributes::new(), &vp());
        let handed_down = PropagatedAttributes::new().descend(&doc, g);
        let rect = doc.element_children(g).next().unwrap();
        let rect_style = resolver.resolve(&doc, rect, &g_style, &handed_down, &vp());
        assert_eq!(rect_style.fill(), PaintSpec::Color(Color::from_rgb(255, 0, 0)));
    }

    #[test]
    fn test_typed_values() {
        let v = vp();
        assert_eq!(
            Property::FontFamily.parse_value("'Times New Roman'", &v),
            Some(PropertyValue::FontFamily("Times New Roman".into()))
        );
        assert_eq!(
            Property::StrokeDasharray.parse_value("none", &v),
            Some(PropertyValue::Dashes(vec![]))
        );
        assert_eq!(Property::FillRule.parse_value("weird", &v), None);
        assert_eq!(
            Property::Filter.parse_value("url(#blur)", &v),
            Some(PropertyValue::Filter(Some("blur".into())))
        );
        assert_eq!(Property::Fill.parse_value("inherit", &v), None);
        assert_eq!(
            Property::FontWeight.parse_value("700", &v),
            Some(PropertyValue::FontWeight(FontWeight::Numeric(700)))
        );
        assert_eq!(
            Property::TextDecoration.parse_value("underline overline", &v),
            Some(PropertyValue::TextDecoration(TextDecoration::Underline))
        );
    }

    #[test]
    fn test_baseline_shift_offsets() {
        assert!((BaselineShift::Sub.offset(10.0) - 3.0).abs() < 1e-5);
        assert!((BaselineShift::Super.offset(10.0) + 3.0).abs() < 1e-5);
        assert_eq!(BaselineShift::parse("2"), Some(BaselineShift::Number(2.0)));
        assert_eq!(BaselineShift::Number(2.0).offset(10.0), -20.0);
        assert_eq!(BaselineShift::parse("0.5%"), Some(BaselineShift::Percent(0.5)));
        assert_eq!(BaselineShift::Percent(0.5).offset(10.0), -500.0);
        assert_eq!(BaselineShift::parse("up"), None);
    }
}
