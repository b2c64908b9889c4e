//! Coordinate-space extents used to resolve relative lengths.

use crate::transform::TransformPrimitive;

/// Which viewport dimension a relative length resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// x coordinates and widths.
    Horizontal,
    /// y coordinates and heights.
    Vertical,
    /// Direction-less quantities: stroke width, dash lengths, circle radius.
    Diagonal,
}

/// Width and height of the current coordinate system.
///
/// Immutable. Entering a nested `<svg>` produces a new viewport instead of changing
/// this one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Extent used when a document states neither a size nor a viewBox.
    pub const DEFAULT: Viewport = Viewport {
        width: 300.0,
        height: 150.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// `sqrt((w² + h²) / 2)`, the reference length for [`Axis::Diagonal`].
    pub fn diagonal(&self) -> f32 {
        ((self.width * self.width + self.height * self.height) / 2.0).sqrt()
    }

    /// The dimension selected by `axis`.
    pub fn extent(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
            Axis::Diagonal => self.diagonal(),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// SVG viewBox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewBox {
    /// Parse a viewBox attribute. Boxes with a non-positive extent are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<f32> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .map(|p| p.trim().parse())
            .collect::<Result<_, _>>()
            .ok()?;

        if parts.len() != 4 || parts[2] <= 0.0 || parts[3] <= 0.0 {
            return None;
        }
        Some(ViewBox {
            min_x: parts[0],
            min_y: parts[1],
            width: parts[2],
            height: parts[3],
        })
    }

    /// Transform mapping this box onto `viewport`, honoring `preserveAspectRatio`.
    ///
    /// Supports `none` and the `x{Min,Mid,Max}Y{Min,Mid,Max}` alignments with `meet`
    /// or `slice`. Anything unrecognized behaves like the default `xMidYMid meet`.
    pub fn fit(&self, viewport: &Viewport, preserve_aspect_ratio: Option<&str>) -> [TransformPrimitive; 2] {
        let sx = viewport.width / self.width;
        let sy = viewport.height / self.height;

        let mut parts = preserve_aspect_ratio.unwrap_or("").split_whitespace();
        let align = parts.next().unwrap_or("xMidYMid");
        let slice = parts.next() == Some("slice");

        let (sx, sy, tx, ty) = if align == "none" {
            (sx, sy, 0.0, 0.0)
        } else {
            let s = if slice { sx.max(sy) } else { sx.min(sy) };
            let free_x = viewport.width - self.width * s;
            let free_y = viewport.height - self.height * s;
            let tx = match align.get(0..4) {
                Some("xMin") => 0.0,
                Some("xMax") => free_x,
                _ => free_x / 2.0,
            };
            let ty = match align.get(4..8) {
                Some("YMin") => 0.0,
                Some("YMax") => free_y,
                _ => free_y / 2.0,
            };
            (s, s, tx, ty)
        };

        [
            TransformPrimitive::Translate {
                x: tx - self.min_x * sx,
                y: ty - self.min_y * sy,
            },
            TransformPrimitive::Scale { x: sx, y: sy },
        ]
    }
}
