//! Transform lists and their composition.

use crate::length::parse_length;
use crate::viewport::{Axis, Viewport};
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::debug;

/// One function of a transform list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformPrimitive {
    Translate { x: f32, y: f32 },
    Scale { x: f32, y: f32 },
    /// Angle in degrees about `(cx, cy)`.
    Rotate { angle: f32, cx: f32, cy: f32 },
    /// Angle in degrees.
    SkewX(f32),
    /// Angle in degrees.
    SkewY(f32),
    /// `[a, b, c, d, e, f]`.
    Matrix([f32; 6]),
}

impl TransformPrimitive {
    /// The affine matrix of this primitive.
    pub fn to_matrix(&self) -> Transform2D {
        let id = Transform2D::identity();
        match *self {
            TransformPrimitive::Translate { x, y } => id.translate(x, y),
            TransformPrimitive::Scale { x, y } => id.scale(x, y),
            TransformPrimitive::Rotate { angle, cx, cy } => id
                .translate(cx, cy)
                .rotate(angle.to_radians())
                .translate(-cx, -cy),
            TransformPrimitive::SkewX(angle) => id.skew_x(angle.to_radians()),
            TransformPrimitive::SkewY(angle) => id.skew_y(angle.to_radians()),
            TransformPrimitive::Matrix([a, b, c, d, e, f]) => Transform2D { a, b, c, d, e, f },
        }
    }
}

/// Transform primitives in declaration order.
pub type TransformList = SmallVec<[TransformPrimitive; 4]>;

/// Transform function names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformFunction {
    Translate,
    TranslateX,
    TranslateY,
    Scale,
    ScaleX,
    ScaleY,
    Rotate,
    SkewX,
    SkewY,
    Matrix,
}

lazy_static::lazy_static! {
    static ref TRANSFORM_FUNCTIONS: HashMap<&'static str, TransformFunction> = {
        let mut m = HashMap::new();
        m.insert("translate", TransformFunction::Translate);
        m.insert("translateX", TransformFunction::TranslateX);
        m.insert("translateY", TransformFunction::TranslateY);
        m.insert("scale", TransformFunction::Scale);
        m.insert("scaleX", TransformFunction::ScaleX);
        m.insert("scaleY", TransformFunction::ScaleY);
        m.insert("rotate", TransformFunction::Rotate);
        m.insert("skewX", TransformFunction::SkewX);
        m.insert("skewY", TransformFunction::SkewY);
        m.insert("matrix", TransformFunction::Matrix);
        m
    };
}

impl TransformFunction {
    /// Look up a function by its (case-sensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        TRANSFORM_FUNCTIONS.get(name).copied()
    }

    /// Build the primitive for `args`, or `None` on an arity mismatch.
    pub fn build(self, args: &[f32]) -> Option<TransformPrimitive> {
        use TransformFunction as F;
        use TransformPrimitive as P;

        match (self, args) {
            (F::Translate, &[x, y]) => Some(P::Translate { x, y }),
            (F::TranslateX, &[x]) => Some(P::Translate { x, y: 0.0 }),
            (F::TranslateY, &[y]) => Some(P::Translate { x: 0.0, y }),
            (F::Scale, &[x, y]) => Some(P::Scale { x, y }),
            (F::ScaleX, &[x]) => Some(P::Scale { x, y: 1.0 }),
            (F::ScaleY, &[y]) => Some(P::Scale { x: 1.0, y }),
            (F::Rotate, &[angle]) => Some(P::Rotate { angle, cx: 0.0, cy: 0.0 }),
            (F::Rotate, &[angle, cx, cy]) => Some(P::Rotate { angle, cx, cy }),
            (F::SkewX, &[angle]) => Some(P::SkewX(angle)),
            (F::SkewY, &[angle]) => Some(P::SkewY(angle)),
            (F::Matrix, &[a, b, c, d, e, f]) => Some(P::Matrix([a, b, c, d, e, f])),
            _ => None,
        }
    }
}

/// Parse a transform attribute into its primitives, in declaration order.
///
/// Terms are delimited by `)`. Unknown function names and wrong argument counts drop
/// the term and parsing continues with the next one.
pub fn extract_transforms(s: &str, viewport: &Viewport) -> TransformList {
    let mut list = TransformList::new();

    for term in s.split(')') {
        let term = term.trim_matches(|c: char| c.is_whitespace() || c == ',');
        if term.is_empty() {
            continue;
        }
        let Some((name, args)) = term.split_once('(') else {
            debug!(term, "Dropping malformed transform term");
            continue;
        };
        let name = name.trim();
        let Some(function) = TransformFunction::from_name(name) else {
            debug!(name, "Dropping unknown transform function");
            continue;
        };

        let args: SmallVec<[f32; 6]> = args
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|a| !a.is_empty())
            .map(|a| parse_length(a, Axis::Horizontal, viewport))
            .collect();

        match function.build(&args) {
            Some(primitive) => list.push(primitive),
            None => debug!(name, args = args.len(), "Dropping transform with wrong arity"),
        }
    }

    list
}

/// Compose a list into one matrix: the left-to-right product of its primitives.
pub fn compose(list: &[TransformPrimitive]) -> Transform2D {
    list.iter()
        .fold(Transform2D::identity(), |acc, p| acc.multiply(&p.to_matrix()))
}

/// 2D affine transform matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform2D {
    /// Matrix elements [a, b, c, d, e, f]
    /// Represents: [a c e]
    ///             [b d f]
    ///             [0 0 1]
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Transform2D {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Post-multiply by a translation.
    pub fn translate(self, tx: f32, ty: f32) -> Self {
        self.multiply(&Transform2D {
            e: tx,
            f: ty,
            ..Self::identity()
        })
    }

    /// Post-multiply by a scale.
    pub fn scale(self, sx: f32, sy: f32) -> Self {
        self.multiply(&Transform2D {
            a: sx,
            d: sy,
            ..Self::identity()
        })
    }

    /// Post-multiply by a rotation (radians).
    pub fn rotate(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        self.multiply(&Transform2D {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        })
    }

    /// Post-multiply by a horizontal skew (radians).
    pub fn skew_x(self, angle: f32) -> Self {
        self.multiply(&Transform2D {
            c: angle.tan(),
            ..Self::identity()
        })
    }

    /// Post-multiply by a vertical skew (radians).
    pub fn skew_y(self, angle: f32) -> Self {
        self.multiply(&Transform2D {
            b: angle.tan(),
            ..Self::identity()
        })
    }

    /// `self × other`: `other` applies to a point first.
    pub fn multiply(&self, other: &Transform2D) -> Self {
        Transform2D {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Transform a point.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(100.0, 100.0)
    }

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4
    }

    #[test]
    fn test_transform_identity() {
        let t = Transform2D::identity();
        assert_eq!(t.apply(10.0, 20.0), (10.0, 20.0));
        assert!(t.is_identity());
    }

    #[test]
    fn test_extract_in_order() {
        let list = extract_transforms("translate(10,20) scale(2,3)", &vp());
        assert_eq!(
            list.as_slice(),
            &[
                TransformPrimitive::Translate { x: 10.0, y: 20.0 },
                TransformPrimitive::Scale { x: 2.0, y: 3.0 },
            ]
        );
        // The scale applies to the point first.
        assert_eq!(compose(&list).apply(1.0, 1.0), (12.0, 23.0));
    }

    #[test]
    fn test_single_argument_forms() {
        assert!(extract_transforms("translate(5) scale(2)", &vp()).is_empty());

        let list = extract_transforms("translate(5) scaleX(3) scale(2) scaleY(4) translateY(7)", &vp());
        assert_eq!(
            list.as_slice(),
            &[
                TransformPrimitive::Scale { x: 3.0, y: 1.0 },
                TransformPrimitive::Scale { x: 1.0, y: 4.0 },
                TransformPrimitive::Translate { x: 0.0, y: 7.0 },
            ]
        );
    }

    #[test]
    fn test_rotate_arity() {
        let list = extract_transforms("rotate(90)", &vp());
        assert!(close(compose(&list).apply(1.0, 0.0), (0.0, 1.0)));

        let list = extract_transforms("rotate(180 10 10)", &vp());
        assert!(close(compose(&list).apply(0.0, 0.0), (20.0, 20.0)));

        assert!(extract_transforms("rotate(90 10)", &vp()).is_empty());
    }

    #[test]
    fn test_bad_terms_are_dropped() {
        let list = extract_transforms("bogus(1) translate(1,2) matrix(1 0 0 1) skewX(45)", &vp());
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], TransformPrimitive::Translate { x: 1.0, y: 2.0 });
        assert!(close(compose(&list[1..]).apply(0.0, 1.0), (1.0, 1.0)));
    }

    #[test]
    fn test_matrix_and_commas() {
        let list = extract_transforms("matrix(1,0,0,1,5,6), scale(2, 2)", &vp());
        assert_eq!(list.len(), 2);
        assert_eq!(compose(&list).apply(1.0, 1.0), (7.0, 8.0));
    }
}
