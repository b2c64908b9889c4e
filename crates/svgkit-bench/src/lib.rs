//! # SvgKit Bench
//!
//! Generated SVG fixtures for the criterion benchmarks in `benches/svgkit.rs`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let svg = svgkit_bench::generate_shapes(1000);
//! let scene = svgkit_svg::load_str(&svg)?;
//! ```

use std::fmt::Write;
use tracing::debug;

const HEADER: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="1000" height="1000" viewBox="0 0 500 500">"#;

/// A flat document of `count` styled shapes sharing a stylesheet and a gradient.
pub fn generate_shapes(count: usize) -> String {
    let mut svg = String::from(HEADER);
    svg.push_str(
        r#"<style>.a { fill: steelblue; stroke: black } .b { stroke-width: 2; opacity: 0.5 }</style>
<defs><linearGradient id="g"><stop offset="0" stop-color="red"/><stop offset="1" stop-color="blue"/></linearGradient></defs>"#,
    );
    for i in 0..count {
        let x = (i % 50) * 10;
        let y = (i / 50) * 10;
        let _ = match i % 4 {
            0 => write!(svg, r#"<rect class="a" x="{x}" y="{y}" width="8" height="8" rx="2"/>"#),
            1 => write!(svg, r#"<circle class="a b" cx="{x}" cy="{y}" r="4" fill="url(#g)"/>"#),
            2 => write!(svg, r#"<path d="M{x} {y} l8 0 l-4 8 z" style="fill: rgb(10%, 20%, 30%)"/>"#),
            _ => write!(svg, r#"<polyline points="{x},{y} {},{}" stroke="red" transform="rotate(15 {x} {y})"/>"#, x + 8, y + 8),
        };
    }
    svg.push_str("</svg>");
    debug!(count, bytes = svg.len(), "Generated shape fixture");
    svg
}

/// A document nesting groups `depth` levels deep, each re-styling its children.
pub fn generate_nested(depth: usize) -> String {
    let mut svg = String::from(HEADER);
    for i in 0..depth {
        let _ = write!(
            svg,
            r#"<g fill="hsl({}, 50%, 50%)" stroke-width="{}" transform="translate(1 1)">"#,
            i * 7 % 360,
            i % 5 + 1
        );
    }
    svg.push_str(r#"<text x="1" y="10">deep <tspan font-weight="bold">text</tspan></text>"#);
    for _ in 0..depth {
        svg.push_str("</g>");
    }
    svg.push_str("</svg>");
    svg
}

/// A document applying a multi-primitive filter to `count` `use` instances.
pub fn generate_filtered(count: usize) -> String {
    let mut svg = String::from(HEADER);
    svg.push_str(
        r#"<filter id="shadow"><feGaussianBlur in="SourceAlpha" stdDeviation="3" result="blur"/><feOffset in="blur" dx="2" dy="2" result="off"/><feFlood flood-color="black" flood-opacity="0.4"/><feComposite in2="off" operator="in"/><feMerge><feMergeNode/><feMergeNode in="SourceGraphic"/></feMerge></filter>
<defs><rect id="tile" width="8" height="8"/></defs>"#,
    );
    for i in 0..count {
        let _ = write!(
            svg,
            r##"<use xlink:href="#tile" x="{}" y="{}" filter="url(#shadow)"/>"##,
            (i % 50) * 10,
            (i / 50) * 10
        );
    }
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_load() {
        for svg in [generate_shapes(20), generate_nested(10), generate_filtered(5)] {
            let doc = svgkit_dom::Document::parse_xml(&svg).unwrap();
            assert!(svgkit_svg::load_document(&doc).is_ok());
        }
    }

    #[test]
    fn test_shape_count() {
        let scene = svgkit_svg::load_str(&generate_shapes(40)).unwrap();
        assert_eq!(scene.len(), 41);
    }
}
