//! Path data and point list parsing.

use std::iter::Peekable;
use std::str::Chars;
use tracing::debug;

/// Path command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Move to (absolute).
    MoveTo(f32, f32),
    /// Move to (relative).
    MoveToRel(f32, f32),
    /// Line to (absolute).
    LineTo(f32, f32),
    /// Line to (relative).
    LineToRel(f32, f32),
    /// Horizontal line (absolute).
    HorizontalTo(f32),
    /// Horizontal line (relative).
    HorizontalToRel(f32),
    /// Vertical line (absolute).
    VerticalTo(f32),
    /// Vertical line (relative).
    VerticalToRel(f32),
    /// Cubic bezier (absolute).
    CubicTo(f32, f32, f32, f32, f32, f32),
    /// Cubic bezier (relative).
    CubicToRel(f32, f32, f32, f32, f32, f32),
    /// Smooth cubic bezier (absolute).
    SmoothCubicTo(f32, f32, f32, f32),
    /// Smooth cubic bezier (relative).
    SmoothCubicToRel(f32, f32, f32, f32),
    /// Quadratic bezier (absolute).
    QuadTo(f32, f32, f32, f32),
    /// Quadratic bezier (relative).
    QuadToRel(f32, f32, f32, f32),
    /// Smooth quadratic bezier (absolute).
    SmoothQuadTo(f32, f32),
    /// Smooth quadratic bezier (relative).
    SmoothQuadToRel(f32, f32),
    /// Arc (absolute).
    ArcTo(f32, f32, f32, bool, bool, f32, f32),
    /// Arc (relative).
    ArcToRel(f32, f32, f32, bool, bool, f32, f32),
    /// Close path.
    Close,
}

/// Parse path data.
///
/// Parsing stops at the first malformed segment; commands read up to that point are
/// kept.
pub fn parse_path(d: &str) -> Vec<PathCommand> {
    let mut commands = Vec::new();
    let mut chars = d.chars().peekable();
    let mut current_cmd = ' ';

    loop {
        skip_separators(&mut chars);
        let Some(&c) = chars.peek() else {
            break;
        };

        if c.is_ascii_alphabetic() {
            current_cmd = c;
            chars.next();
            if matches!(c, 'Z' | 'z') {
                commands.push(PathCommand::Close);
            }
            continue;
        }

        let command = match current_cmd {
            'M' => numbers::<2>(&mut chars).map(|[x, y]| {
                // Subsequent pairs are implicit line-tos.
                current_cmd = 'L';
                PathCommand::MoveTo(x, y)
            }),
            'm' => numbers::<2>(&mut chars).map(|[x, y]| {
                current_cmd = 'l';
                PathCommand::MoveToRel(x, y)
            }),
            'L' => numbers::<2>(&mut chars).map(|[x, y]| PathCommand::LineTo(x, y)),
            'l' => numbers::<2>(&mut chars).map(|[x, y]| PathCommand::LineToRel(x, y)),
            'H' => numbers::<1>(&mut chars).map(|[x]| PathCommand::HorizontalTo(x)),
            'h' => numbers::<1>(&mut chars).map(|[x]| PathCommand::HorizontalToRel(x)),
            'V' => numbers::<1>(&mut chars).map(|[y]| PathCommand::VerticalTo(y)),
            'v' => numbers::<1>(&mut chars).map(|[y]| PathCommand::VerticalToRel(y)),
            'C' => numbers::<6>(&mut chars)
                .map(|[x1, y1, x2, y2, x, y]| PathCommand::CubicTo(x1, y1, x2, y2, x, y)),
            'c' => numbers::<6>(&mut chars)
                .map(|[x1, y1, x2, y2, x, y]| PathCommand::CubicToRel(x1, y1, x2, y2, x, y)),
            'S' => numbers::<4>(&mut chars).map(|[x2, y2, x, y]| PathCommand::SmoothCubicTo(x2, y2, x, y)),
            's' => numbers::<4>(&mut chars)
                .map(|[x2, y2, x, y]| PathCommand::SmoothCubicToRel(x2, y2, x, y)),
            'Q' => numbers::<4>(&mut chars).map(|[x1, y1, x, y]| PathCommand::QuadTo(x1, y1, x, y)),
            'q' => numbers::<4>(&mut chars).map(|[x1, y1, x, y]| PathCommand::QuadToRel(x1, y1, x, y)),
            'T' => numbers::<2>(&mut chars).map(|[x, y]| PathCommand::SmoothQuadTo(x, y)),
            't' => numbers::<2>(&mut chars).map(|[x, y]| PathCommand::SmoothQuadToRel(x, y)),
            'A' | 'a' => parse_arc(&mut chars).map(|(rx, ry, angle, large_arc, sweep, x, y)| {
                if current_cmd == 'A' {
                    PathCommand::ArcTo(rx, ry, angle, large_arc, sweep, x, y)
                } else {
                    PathCommand::ArcToRel(rx, ry, angle, large_arc, sweep, x, y)
                }
            }),
            _ => None,
        };

        match command {
            Some(command) => commands.push(command),
            None => {
                debug!(command = %current_cmd, "Malformed path data, truncating");
                break;
            }
        }
    }

    commands
}

/// Parse a `points` attribute into coordinate pairs. A trailing odd number is ignored.
pub fn parse_points(s: &str) -> Vec<(f32, f32)> {
    let mut chars = s.chars().peekable();
    let mut points = Vec::new();
    while let Some([x, y]) = numbers::<2>(&mut chars) {
        points.push((x, y));
    }
    points
}

type Arc = (f32, f32, f32, bool, bool, f32, f32);

fn parse_arc(chars: &mut Peekable<Chars<'_>>) -> Option<Arc> {
    let [rx, ry, angle] = numbers::<3>(chars)?;
    let large_arc = parse_flag(chars)?;
    let sweep = parse_flag(chars)?;
    let [x, y] = numbers::<2>(chars)?;
    Some((rx, ry, angle, large_arc, sweep, x, y))
}

fn numbers<const N: usize>(chars: &mut Peekable<Chars<'_>>) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    for slot in out.iter_mut() {
        *slot = parse_number(chars)?;
    }
    Some(out)
}

fn skip_separators(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
}

/// Parse a number from character iterator.
fn parse_number(chars: &mut Peekable<Chars<'_>>) -> Option<f32> {
    skip_separators(chars);

    let mut s = String::new();
    let mut has_dot = false;
    let mut has_exp = false;

    if let Some(sign) = chars.next_if(|c| *c == '-' || *c == '+') {
        s.push(sign);
    }

    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            s.push(c);
        } else if c == '.' && !has_dot && !has_exp {
            has_dot = true;
            s.push(c);
        } else if (c == 'e' || c == 'E') && !has_exp {
            has_exp = true;
            s.push(c);
            chars.next();
            if let Some(sign) = chars.next_if(|c| *c == '-' || *c == '+') {
                s.push(sign);
            }
            continue;
        } else {
            break;
        }
        chars.next();
    }

    s.parse().ok()
}

/// Parse a flag (0 or 1).
fn parse_flag(chars: &mut Peekable<Chars<'_>>) -> Option<bool> {
    skip_separators(chars);
    match chars.next() {
        Some('0') => Some(false),
        Some('1') => Some(true),
        _ => None,
    }
}
