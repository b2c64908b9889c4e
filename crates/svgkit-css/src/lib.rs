//! # SvgKit CSS
//!
//! The small slice of CSS that SVG documents need:
//!
//! - [`Color`] and the color literal parser (hex, `rgb()`, `hsl()`, named colors)
//! - inline declaration lists (`fill:red; stroke:blue`)
//! - class-selector blocks from a `<style>` element (`.name { ... }`)
//!
//! Typing of property values happens in `svgkit-svg`, which knows about viewports and
//! paint servers.

mod color;
mod declarations;

pub use color::{named_color, Color};
pub use declarations::{parse_declarations, scan_class_blocks, ClassBlock, Declaration};
