//! # SvgKit SVG
//!
//! Resolves SVG documents into a renderer-agnostic scene graph.
//!
//! ## Features
//!
//! - **Lengths**: absolute and relative units resolved against the current viewport
//! - **Cascade**: class rules, presentation attributes, inline style and inheritance
//! - **Transforms**: transform lists kept in declaration order and composed on demand
//! - **Paints**: solid colors and linear/radial gradients, with opacity folding
//! - **Filters**: filter primitives wired into an effect graph
//! - **Scene**: shapes, text runs and images in an arena with an id lookup table
//!
//! ## Architecture
//!
//! ```text
//! Document
//!    └── Assembler (definitions pre-pass, then top-down walk)
//!           ├── StyleResolver ──► ResolvedStyle
//!           ├── Builder ──► SceneNode (geometry, paint, transform, effect)
//!           └── IdRegistry (gradients, filters, templates, nodes)
//!                  └── Scene ──► RenderHost
//! ```
//!
//! Nothing here fails on bad input: unreadable values fall back to their defaults and
//! unresolved references are dropped. Only loading and exporting return errors.

use svgkit_dom::{Document, DomError};
use thiserror::Error;
use tracing::debug;

pub mod assembler;
pub mod builder;
pub mod export;
pub mod filter;
pub mod length;
pub mod paint;
pub mod path;
pub mod registry;
pub mod scene;
pub mod style;
pub mod transform;
pub mod viewport;

pub use assembler::assemble;
pub use export::{ExportPlan, ExportScale, RenderHost};
pub use filter::{resolve_filter, EffectGraph, EffectKind, FilterSpec, ResolvedFilter};
pub use length::{parse_font_size, parse_length, parse_opacity};
pub use paint::{resolve_paint, Gradient, Paint, PaintSpec};
pub use path::PathCommand;
pub use registry::IdRegistry;
pub use scene::{Geometry, NodeId, PrimitiveStyle, Scene, SceneNode, TextRun};
pub use style::{ResolvedStyle, StyleResolver, StyleRuleSet};
pub use transform::{compose, extract_transforms, Transform2D, TransformList, TransformPrimitive};
pub use viewport::{Axis, ViewBox, Viewport};

// ==================== Errors ====================

/// Errors from loading or exporting a scene.
#[derive(Error, Debug)]
pub enum SvgError {
    #[error("Document error: {0}")]
    Dom(#[from] DomError),

    #[error("Root element is <{0}>, not <svg>")]
    MissingSvgRoot(String),

    #[error("Invalid export size: {width}x{height}")]
    InvalidSize { width: f32, height: f32 },

    #[error("Render host error: {0}")]
    Host(String),
}

/// Parse XML text and assemble its scene.
pub fn load_str(xml: &str) -> Result<Scene, SvgError> {
    let doc = Document::parse_xml(xml)?;
    load_document(&doc)
}

/// Assemble the scene of an already parsed document whose root must be `<svg>`.
pub fn load_document(doc: &Document) -> Result<Scene, SvgError> {
    match doc.name(doc.root()) {
        Some("svg") => Ok(assemble(doc)),
        other => {
            let name = other.unwrap_or_default().to_string();
            debug!(root = %name, "Refusing to assemble non-svg document");
            Err(SvgError::MissingSvgRoot(name))
        }
    }
}
