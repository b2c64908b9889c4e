//! Color values and color literal parsing.

use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref NAMED_COLORS: HashMap<&'static str, (u8, u8, u8)> = {
        let mut m = HashMap::new();
        m.insert("aliceblue", (240, 248, 255));
        m.insert("antiquewhite", (250, 235, 215));
        m.insert("aqua", (0, 255, 255));
        m.insert("aquamarine", (127, 255, 212));
        m.insert("azure", (240, 255, 255));
        m.insert("beige", (245, 245, 220));
        m.insert("bisque", (255, 228, 196));
        m.insert("black", (0, 0, 0));
        m.insert("blanchedalmond", (255, 235, 205));
        m.insert("blue", (0, 0, 255));
        m.insert("blueviolet", (138, 43, 226));
        m.insert("brown", (165, 42, 42));
        m.insert("burlywood", (222, 184, 135));
        m.insert("cadetblue", (95, 158, 160));
        m.insert("chartreuse", (127, 255, 0));
        m.insert("chocolate", (210, 105, 30));
        m.insert("coral", (255, 127, 80));
        m.insert("cornflowerblue", (100, 149, 237));
        m.insert("cornsilk", (255, 248, 220));
        m.insert("crimson", (220, 20, 60));
        m.insert("cyan", (0, 255, 255));
        m.insert("darkblue", (0, 0, 139));
        m.insert("darkcyan", (0, 139, 139));
        m.insert("darkgoldenrod", (184, 134, 11));
        m.insert("darkgray", (169, 169, 169));
        m.insert("darkgreen", (0, 100, 0));
        m.insert("darkgrey", (169, 169, 169));
        m.insert("darkkhaki", (189, 183, 107));
        m.insert("darkmagenta", (139, 0, 139));
        m.insert("darkolivegreen", (85, 107, 47));
        m.insert("darkorange", (255, 140, 0));
        m.insert("darkorchid", (153, 50, 204));
        m.insert("darkred", (139, 0, 0));
        m.insert("darksalmon", (233, 150, 122));
        m.insert("darkseagreen", (143, 188, 143));
        m.insert("darkslateblue", (72, 61, 139));
        m.insert("darkslategray", (47, 79, 79));
        m.insert("darkslategrey", (47, 79, 79));
        m.insert("darkturquoise", (0, 206, 209));
        m.insert("darkviolet", (148, 0, 211));
        m.insert("deeppink", (255, 20, 147));
        m.insert("deepskyblue", (0, 191, 255));
        m.insert("dimgray", (105, 105, 105));
        m.insert("dimgrey", (105, 105, 105));
        m.insert("dodgerblue", (30, 144, 255));
        m.insert("firebrick", (178, 34, 34));
        m.insert("floralwhite", (255, 250, 240));
        m.insert("forestgreen", (34, 139, 34));
        m.insert("fuchsia", (255, 0, 255));
        m.insert("gainsboro", (220, 220, 220));
        m.insert("ghostwhite", (248, 248, 255));
        m.insert("gold", (255, 215, 0));
        m.insert("goldenrod", (218, 165, 32));
        m.insert("gray", (128, 128, 128));
        m.insert("grey", (128, 128, 128));
        m.insert("green", (0, 128, 0));
        m.insert("greenyellow", (173, 255, 47));
        m.insert("honeydew", (240, 255, 240));
        m.insert("hotpink", (255, 105, 180));
        m.insert("indianred", (205, 92, 92));
        m.insert("indigo", (75, 0, 130));
        m.insert("ivory", (255, 255, 240));
        m.insert("khaki", (240, 230, 140));
        m.insert("lavender", (230, 230, 250));
        m.insert("lavenderblush", (255, 240, 245));
        m.insert("lawngreen", (124, 252, 0));
        m.insert("lemonchiffon", (255, 250, 205));
        m.insert("lightblue", (173, 216, 230));
        m.insert("lightcoral", (240, 128, 128));
        m.insert("lightcyan", (224, 255, 255));
        m.insert("lightgoldenrodyellow", (250, 250, 210));
        m.insert("lightgray", (211, 211, 211));
        m.insert("lightgreen", (144, 238, 144));
        m.insert("lightgrey", (211, 211, 211));
        m.insert("lightpink", (255, 182, 193));
        m.insert("lightsalmon", (255, 160, 122));
        m.insert("lightseagreen", (32, 178, 170));
        m.insert("lightskyblue", (135, 206, 250));
        m.insert("lightslategray", (119, 136, 153));
        m.insert("lightslategrey", (119, 136, 153));
        m.insert("lightsteelblue", (176, 196, 222));
        m.insert("lightyellow", (255, 255, 224));
        m.insert("lime", (0, 255, 0));
        m.insert("limegreen", (50, 205, 50));
        m.insert("linen", (250, 240, 230));
        m.insert("magenta", (255, 0, 255));
        m.insert("maroon", (128, 0, 0));
        m.insert("mediumaquamarine", (102, 205, 170));
        m.insert("mediumblue", (0, 0, 205));
        m.insert("mediumorchid", (186, 85, 211));
        m.insert("mediumpurple", (147, 112, 219));
        m.insert("mediumseagreen", (60, 179, 113));
        m.insert("mediumslateblue", (123, 104, 238));
        m.insert("mediumspringgreen", (0, 250, 154));
        m.insert("mediumturquoise", (72, 209, 204));
        m.insert("mediumvioletred", (199, 21, 133));
        m.insert("midnightblue", (25, 25, 112));
        m.insert("mintcream", (245, 255, 250));
        m.insert("mistyrose", (255, 228, 225));
        m.insert("moccasin", (255, 228, 181));
        m.insert("navajowhite", (255, 222, 173));
        m.insert("navy", (0, 0, 128));
        m.insert("oldlace", (253, 245, 230));
        m.insert("olive", (128, 128, 0));
        m.insert("olivedrab", (107, 142, 35));
        m.insert("orange", (255, 165, 0));
        m.insert("orangered", (255, 69, 0));
        m.insert("orchid", (218, 112, 214));
        m.insert("palegoldenrod", (238, 232, 170));
        m.insert("palegreen", (152, 251, 152));
        m.insert("paleturquoise", (175, 238, 238));
        m.insert("palevioletred", (219, 112, 147));
        m.insert("papayawhip", (255, 239, 213));
        m.insert("peachpuff", (255, 218, 185));
        m.insert("peru", (205, 133, 63));
        m.insert("pink", (255, 192, 203));
        m.insert("plum", (221, 160, 221));
        m.insert("powderblue", (176, 224, 230));
        m.insert("purple", (128, 0, 128));
        m.insert("rebeccapurple", (102, 51, 153));
        m.insert("red", (255, 0, 0));
        m.insert("rosybrown", (188, 143, 143));
        m.insert("royalblue", (65, 105, 225));
        m.insert("saddlebrown", (139, 69, 19));
        m.insert("salmon", (250, 128, 114));
        m.insert("sandybrown", (244, 164, 96));
        m.insert("seagreen", (46, 139, 87));
        m.insert("seashell", (255, 245, 238));
        m.insert("sienna", (160, 82, 45));
        m.insert("silver", (192, 192, 192));
        m.insert("skyblue", (135, 206, 235));
        m.insert("slateblue", (106, 90, 205));
        m.insert("slategray", (112, 128, 144));
        m.insert("slategrey", (112, 128, 144));
        m.insert("snow", (255, 250, 250));
        m.insert("springgreen", (0, 255, 127));
        m.insert("steelblue", (70, 130, 180));
        m.insert("tan", (210, 180, 140));
        m.insert("teal", (0, 128, 128));
        m.insert("thistle", (216, 191, 216));
        m.insert("tomato", (255, 99, 71));
        m.insert("turquoise", (64, 224, 208));
        m.insert("violet", (238, 130, 238));
        m.insert("wheat", (245, 222, 179));
        m.insert("white", (255, 255, 255));
        m.insert("whitesmoke", (245, 245, 245));
        m.insert("yellow", (255, 255, 0));
        m.insert("yellowgreen", (154, 205, 50));
        m
    };
}

/// An sRGB color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };
    pub const BLACK: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
        a: 1.0,
    };

    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse a color literal. Returns `None` for anything that is not a color.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }

        if let Some(inner) = function_args(&s, "rgba").or_else(|| function_args(&s, "rgb")) {
            return parse_rgb_args(inner);
        }

        if let Some(inner) = function_args(&s, "hsla").or_else(|| function_args(&s, "hsl")) {
            return parse_hsl_args(inner);
        }

        if s == "transparent" {
            return Some(Color::TRANSPARENT);
        }

        named_color(&s)
    }

    /// Parse a color literal and multiply `opacity` into its alpha channel.
    pub fn parse_with_opacity(s: &str, opacity: f32) -> Option<Self> {
        Self::parse(s).map(|c| c.multiply_alpha(opacity))
    }

    /// Multiply the alpha channel by `factor`, clamped to `0.0..=1.0`.
    pub fn multiply_alpha(self, factor: f32) -> Self {
        Color {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }

    /// Straight RGBA as `[0.0, 1.0]` floats.
    pub fn to_f32_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Look up one of the CSS named colors.
pub fn named_color(name: &str) -> Option<Color> {
    NAMED_COLORS
        .get(name)
        .map(|&(r, g, b)| Color::from_rgb(r, g, b))
}

fn function_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    s.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Color::from_rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color::new(
            nibble(0)?,
            nibble(1)?,
            nibble(2)?,
            nibble(3)? as f32 / 255.0,
        )),
        6 => Some(Color::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::new(
            byte(0)?,
            byte(2)?,
            byte(4)?,
            byte(6)? as f32 / 255.0,
        )),
        _ => None,
    }
}

fn split_args(inner: &str) -> Vec<&str> {
    inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_channel(part: &str) -> Option<u8> {
    let value = if let Some(pct) = part.strip_suffix('%') {
        pct.parse::<f32>().ok()? * 2.55
    } else {
        part.parse::<f32>().ok()?
    };
    Some(value.round().clamp(0.0, 255.0) as u8)
}

fn parse_alpha(part: Option<&&str>) -> Option<f32> {
    match part {
        None => Some(1.0),
        Some(p) => {
            let value = if let Some(pct) = p.strip_suffix('%') {
                pct.parse::<f32>().ok()? / 100.0
            } else {
                p.parse::<f32>().ok()?
            };
            Some(value.clamp(0.0, 1.0))
        }
    }
}

fn parse_rgb_args(inner: &str) -> Option<Color> {
    let parts = split_args(inner);
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    Some(Color::new(
        parse_channel(parts[0])?,
        parse_channel(parts[1])?,
        parse_channel(parts[2])?,
        parse_alpha(parts.get(3))?,
    ))
}

fn parse_hsl_args(inner: &str) -> Option<Color> {
    let parts = split_args(inner);
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let h = parts[0].trim_end_matches("deg").parse::<f32>().ok()?;
    let s = parts[1].strip_suffix('%')?.parse::<f32>().ok()? / 100.0;
    let l = parts[2].strip_suffix('%')?.parse::<f32>().ok()? / 100.0;
    let a = parse_alpha(parts.get(3))?;

    let (r, g, b) = hsl_to_rgb(h.rem_euclid(360.0) / 360.0, s.clamp(0.0, 1.0), l.clamp(0.0, 1.0));
    Some(Color::new(r, g, b, a))
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (u8, u8, u8) {
    let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    if s == 0.0 {
        let v = to_u8(l);
        return (v, v, v);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hue = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    (
        to_u8(hue(h + 1.0 / 3.0)),
        to_u8(hue(h)),
        to_u8(hue(h - 1.0 / 3.0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Color::parse("#ff0000"), Some(Color::from_rgb(255, 0, 0)));
        assert_eq!(Color::parse("#F00"), Some(Color::from_rgb(255, 0, 0)));
        let c = Color::parse("#00ff0080").unwrap();
        assert_eq!((c.r, c.g, c.b), (0, 255, 0));
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(Color::parse("#12345"), None);
        assert_eq!(Color::parse("#zzz"), None);
    }

    #[test]
    fn test_parse_functions() {
        assert_eq!(Color::parse("rgb(0, 0, 255)"), Some(Color::from_rgb(0, 0, 255)));
        assert_eq!(Color::parse("rgb(100%,0%,0%)"), Some(Color::from_rgb(255, 0, 0)));
        assert_eq!(
            Color::parse("rgba(10,20,30,0.5)"),
            Some(Color::new(10, 20, 30, 0.5))
        );
        assert_eq!(Color::parse("hsl(120, 100%, 50%)"), Some(Color::from_rgb(0, 255, 0)));
        assert_eq!(Color::parse("hsl(0, 0%, 100%)"), Some(Color::WHITE));
        assert_eq!(Color::parse("rgb(1,2)"), None);
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(Color::parse("Blue"), Some(Color::from_rgb(0, 0, 255)));
        assert_eq!(Color::parse("rebeccapurple"), Some(Color::from_rgb(102, 51, 153)));
        assert_eq!(Color::parse("transparent"), Some(Color::TRANSPARENT));
        assert_eq!(Color::parse("not-a-color"), None);
        assert_eq!(Color::parse("url(#g)"), None);
    }

    #[test]
    fn test_opacity_is_multiplied() {
        let c = Color::parse_with_opacity("rgba(0,0,0,0.5)", 0.5).unwrap();
        assert_eq!(c.a, 0.25);
        assert_eq!(Color::WHITE.multiply_alpha(3.0).a, 1.0);
    }
}
