//! `font` shorthand decomposition.
//!
//! Grammar: optional style, optional variant, optional weight, optional
//! stretch, mandatory size with optional `/line-height`, mandatory
//! family, in that fixed order. System-font keywords short-circuit to a
//! single entry. Decomposition never raises; unparseable values fall back
//! to the original text plus a warning.

use crate::calc;
use crate::properties::LogicalProperty;

const SYSTEM_FONTS: [&str; 6] = [
    "caption",
    "icon",
    "menu",
    "message-box",
    "small-caption",
    "status-bar",
];

const SIZE_KEYWORDS: [&str; 9] = [
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "smaller", "larger",
];

fn is_style(token: &str) -> bool {
    matches!(token, "normal" | "italic" | "oblique")
}

fn is_variant(token: &str) -> bool {
    matches!(token, "normal" | "small-caps")
}

fn is_weight(token: &str) -> bool {
    matches!(
        token,
        "normal"
            | "bold"
            | "bolder"
            | "lighter"
            | "100"
            | "200"
            | "300"
            | "400"
            | "500"
            | "600"
            | "700"
            | "800"
            | "900"
    )
}

fn is_stretch(token: &str) -> bool {
    matches!(
        token,
        "normal"
            | "ultra-condensed"
            | "extra-condensed"
            | "condensed"
            | "semi-condensed"
            | "semi-expanded"
            | "expanded"
            | "extra-expanded"
            | "ultra-expanded"
    )
}

/// `16px`, `120%`, `1.2em`, or a fixed-size keyword. Bare numbers are not
/// sizes (they would swallow unitless weights).
fn is_size(token: &str) -> bool {
    if SIZE_KEYWORDS.contains(&token) {
        return true;
    }
    match calc::parse_dimension(token) {
        Some((_, unit)) => !unit.is_empty(),
        None => false,
    }
}

fn is_line_height(token: &str) -> bool {
    token == "normal" || calc::parse_dimension(token).is_some()
}

/// Result of decomposing one `font` value
#[derive(Debug, Clone, PartialEq)]
pub struct FontDecomposition {
    pub entries: Vec<(LogicalProperty, String)>,
    /// False when the value was emitted unparsed
    pub parsed: bool,
    pub warning: Option<String>,
}

impl FontDecomposition {
    fn unparsed(value: &str, warning: impl Into<String>) -> Self {
        Self {
            entries: vec![(LogicalProperty::Font, value.trim().to_string())],
            parsed: false,
            warning: Some(warning.into()),
        }
    }
}

/// Decompose a `font` shorthand value into logical-property entries
pub fn decompose_font(value: &str) -> FontDecomposition {
    let trimmed = value.trim();

    // System fonts carry all sub-properties opaquely
    if SYSTEM_FONTS.contains(&trimmed) {
        return FontDecomposition {
            entries: vec![(LogicalProperty::Font, trimmed.to_string())],
            parsed: true,
            warning: None,
        };
    }

    let tokens = tokenize(trimmed);
    if tokens.is_empty() {
        return FontDecomposition::unparsed(value, "empty font shorthand");
    }

    let mut entries = Vec::new();
    let mut index = 0usize;

    // Greedily consume the optional leading categories, each at most once,
    // stopping at the first size-shaped token
    let categories: [(LogicalProperty, fn(&str) -> bool); 4] = [
        (LogicalProperty::FontStyle, is_style),
        (LogicalProperty::FontVariant, is_variant),
        (LogicalProperty::FontWeight, is_weight),
        (LogicalProperty::FontStretch, is_stretch),
    ];
    for (property, predicate) in categories {
        let Some(token) = tokens.get(index) else { break };
        if is_size(size_part(token)) {
            break;
        }
        if predicate(token) {
            entries.push((property, token.clone()));
            index += 1;
        }
    }

    match take_size(&tokens, index) {
        Some((size, line_height, family_start)) => {
            finish(entries, size, line_height, &tokens, family_start, trimmed)
        }
        None => {
            // Order did not match; minimal size+family heuristic
            for (i, token) in tokens.iter().enumerate() {
                if is_size(size_part(token)) {
                    if let Some((size, line_height, family_start)) = take_size(&tokens, i) {
                        return finish(
                            Vec::new(),
                            size,
                            line_height,
                            &tokens,
                            family_start,
                            trimmed,
                        );
                    }
                }
            }
            FontDecomposition::unparsed(value, "no font-size token in font shorthand")
        }
    }
}

/// The size half of a possibly combined `size/line-height` token
fn size_part(token: &str) -> &str {
    token.split('/').next().unwrap_or(token)
}

/// Parse the size (and optional line-height) starting at `index`.
/// Returns (size, line-height, index of the first family token).
fn take_size(tokens: &[String], index: usize) -> Option<(String, Option<String>, usize)> {
    let token = tokens.get(index)?;

    // Combined `16px/1.5` token
    if let Some((size, rest)) = token.split_once('/') {
        if is_size(size) && is_line_height(rest) {
            return Some((size.to_string(), Some(rest.to_string()), index + 1));
        }
        return None;
    }

    if !is_size(token) {
        return None;
    }

    // Separated `16px / 1.5` or `16px /1.5`
    if let Some(next) = tokens.get(index + 1) {
        if next == "/" {
            let lh = tokens.get(index + 2)?;
            if is_line_height(lh) {
                return Some((token.clone(), Some(lh.clone()), index + 3));
            }
            return None;
        }
        if let Some(rest) = next.strip_prefix('/') {
            if is_line_height(rest) {
                return Some((token.clone(), Some(rest.to_string()), index + 2));
            }
            return None;
        }
    }

    Some((token.clone(), None, index + 1))
}

fn finish(
    mut entries: Vec<(LogicalProperty, String)>,
    size: String,
    line_height: Option<String>,
    tokens: &[String],
    family_start: usize,
    original: &str,
) -> FontDecomposition {
    entries.push((LogicalProperty::FontSize, size));
    if let Some(line_height) = line_height {
        entries.push((LogicalProperty::LineHeight, line_height));
    }

    if family_start >= tokens.len() {
        return FontDecomposition {
            entries,
            parsed: true,
            warning: Some(format!("font shorthand missing font-family: {}", original)),
        };
    }

    let family = normalize_family(&tokens[family_start..].join(" "));
    entries.push((LogicalProperty::FontFamily, family));
    FontDecomposition {
        entries,
        parsed: true,
        warning: None,
    }
}

/// Split whitespace-separated tokens, keeping quoted family names atomic
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                    current.push(c);
                } else if c.is_whitespace() {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                } else {
                    current.push(c);
                }
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Rejoin a family list with canonical `, ` separation, quotes preserved
pub fn normalize_family(raw: &str) -> String {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in raw.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                    current.push(c);
                } else if c == ',' {
                    parts.push(std::mem::take(&mut current));
                } else {
                    current.push(c);
                }
            }
        }
    }
    parts.push(current);

    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
