//! Declaration lists and class-selector blocks.

use tracing::trace;

/// A single `name: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

impl Declaration {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A `.name { ... }` block from a style sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassBlock {
    /// Class name without the leading dot.
    pub name: String,
    pub declarations: Vec<Declaration>,
}

/// Parse `a: b; c: d` into declarations, in source order.
///
/// Entries without a colon or with an empty name are skipped. Names are trimmed and
/// lowercased, values are trimmed. The value keeps everything after the first colon,
/// so `url(data:...)` survives.
pub fn parse_declarations(text: &str) -> Vec<Declaration> {
    text.split(';')
        .filter_map(|entry| {
            let (name, value) = entry.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Declaration::new(name.to_ascii_lowercase(), value.trim()))
        })
        .collect()
}

/// Scan a style sheet for class-selector blocks.
///
/// Only simple `.name` selectors are recognized; comma-separated selector lists yield
/// one block per class. Blocks with any other selector are skipped. Comments are
/// removed before scanning.
pub fn scan_class_blocks(css: &str) -> Vec<ClassBlock> {
    let css = strip_comments(css);
    let mut blocks = Vec::new();
    let mut rest = css.as_str();

    while let Some(open) = rest.find('{') {
        let selectors = &rest[..open];
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        let body = &after[..close];
        rest = &after[close + 1..];

        let declarations = parse_declarations(body);
        for selector in selectors.split(',') {
            let selector = selector.trim();
            match class_name(selector) {
                Some(name) => blocks.push(ClassBlock {
                    name: name.to_string(),
                    declarations: declarations.clone(),
                }),
                None => trace!(selector, "Skipping non-class selector"),
            }
        }
    }

    blocks
}

fn class_name(selector: &str) -> Option<&str> {
    let name = selector.strip_prefix('.')?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(name)
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declarations() {
        let decls = parse_declarations(" fill: red ;Stroke:blue;; bogus ; :x; stroke-width:2 ");
        assert_eq!(
            decls,
            vec![
                Declaration::new("fill", "red"),
                Declaration::new("stroke", "blue"),
                Declaration::new("stroke-width", "2"),
            ]
        );
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let decls = parse_declarations("fill:url(data:image/png)");
        assert_eq!(decls[0].value, "url(data:image/png)");
    }

    #[test]
    fn test_scan_class_blocks() {
        let css = r#"
            /* palette */
            .a { fill: red; }
            .b, .c { stroke: blue }
            rect { fill: green }
            .d{opacity:0.5}
        "#;
        let blocks = scan_class_blocks(css);
        let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(blocks[0].declarations, vec![Declaration::new("fill", "red")]);
        assert_eq!(blocks[2].declarations, vec![Declaration::new("stroke", "blue")]);
    }

    #[test]
    fn test_scan_unterminated_block() {
        let blocks = scan_class_blocks(".a { fill: red; } .b { fill: blue");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "a");
    }
}
