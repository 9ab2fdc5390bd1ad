use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Logical typography property names this engine recognizes.
///
/// The closed set dispatches by variant; authored custom properties
/// (`--heading-size`) map to the wildcard [`LogicalProperty::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalProperty {
    Font,
    FontFamily,
    FontSize,
    FontWeight,
    FontStyle,
    FontVariant,
    FontStretch,
    LineHeight,
    LetterSpacing,
    WordSpacing,
    TextAlign,
    TextTransform,
    TextDecoration,
    TextIndent,
    TextShadow,
    TextOverflow,
    WhiteSpace,
    WordBreak,
    OverflowWrap,
    VerticalAlign,
    /// Custom property (name kept with its `--` prefix)
    Custom(String),
}

/// The closed set, in canonical order. `Custom` is excluded.
pub const LOGICAL_PROPERTIES: [LogicalProperty; 20] = [
    LogicalProperty::Font,
    LogicalProperty::FontFamily,
    LogicalProperty::FontSize,
    LogicalProperty::FontWeight,
    LogicalProperty::FontStyle,
    LogicalProperty::FontVariant,
    LogicalProperty::FontStretch,
    LogicalProperty::LineHeight,
    LogicalProperty::LetterSpacing,
    LogicalProperty::WordSpacing,
    LogicalProperty::TextAlign,
    LogicalProperty::TextTransform,
    LogicalProperty::TextDecoration,
    LogicalProperty::TextIndent,
    LogicalProperty::TextShadow,
    LogicalProperty::TextOverflow,
    LogicalProperty::WhiteSpace,
    LogicalProperty::WordBreak,
    LogicalProperty::OverflowWrap,
    LogicalProperty::VerticalAlign,
];

impl LogicalProperty {
    /// Map an authored property name to a logical property. Returns `None`
    /// for anything outside the typography set.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.starts_with("--") {
            return Some(LogicalProperty::Custom(name.to_string()));
        }
        let prop = match name {
            "font" => LogicalProperty::Font,
            "font-family" => LogicalProperty::FontFamily,
            "font-size" => LogicalProperty::FontSize,
            "font-weight" => LogicalProperty::FontWeight,
            "font-style" => LogicalProperty::FontStyle,
            "font-variant" => LogicalProperty::FontVariant,
            "font-stretch" => LogicalProperty::FontStretch,
            "line-height" => LogicalProperty::LineHeight,
            "letter-spacing" => LogicalProperty::LetterSpacing,
            "word-spacing" => LogicalProperty::WordSpacing,
            "text-align" => LogicalProperty::TextAlign,
            "text-transform" => LogicalProperty::TextTransform,
            "text-decoration" => LogicalProperty::TextDecoration,
            "text-indent" => LogicalProperty::TextIndent,
            "text-shadow" => LogicalProperty::TextShadow,
            "text-overflow" => LogicalProperty::TextOverflow,
            "white-space" => LogicalProperty::WhiteSpace,
            "word-break" => LogicalProperty::WordBreak,
            "overflow-wrap" => LogicalProperty::OverflowWrap,
            "vertical-align" => LogicalProperty::VerticalAlign,
            _ => return None,
        };
        Some(prop)
    }

    pub fn name(&self) -> &str {
        match self {
            LogicalProperty::Font => "font",
            LogicalProperty::FontFamily => "font-family",
            LogicalProperty::FontSize => "font-size",
            LogicalProperty::FontWeight => "font-weight",
            LogicalProperty::FontStyle => "font-style",
            LogicalProperty::FontVariant => "font-variant",
            LogicalProperty::FontStretch => "font-stretch",
            LogicalProperty::LineHeight => "line-height",
            LogicalProperty::LetterSpacing => "letter-spacing",
            LogicalProperty::WordSpacing => "word-spacing",
            LogicalProperty::TextAlign => "text-align",
            LogicalProperty::TextTransform => "text-transform",
            LogicalProperty::TextDecoration => "text-decoration",
            LogicalProperty::TextIndent => "text-indent",
            LogicalProperty::TextShadow => "text-shadow",
            LogicalProperty::TextOverflow => "text-overflow",
            LogicalProperty::WhiteSpace => "white-space",
            LogicalProperty::WordBreak => "word-break",
            LogicalProperty::OverflowWrap => "overflow-wrap",
            LogicalProperty::VerticalAlign => "vertical-align",
            LogicalProperty::Custom(name) => name,
        }
    }

    /// Whether the property inherits down the element tree
    pub fn inherits(&self) -> bool {
        !matches!(
            self,
            LogicalProperty::TextDecoration
                | LogicalProperty::TextOverflow
                | LogicalProperty::VerticalAlign
        )
    }

    /// Whether the property encodes several logical properties at once
    pub fn is_shorthand(&self) -> bool {
        matches!(self, LogicalProperty::Font)
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, LogicalProperty::Custom(_))
    }
}

impl fmt::Display for LogicalProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for LogicalProperty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for LogicalProperty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NameVisitor;

        impl<'de> Visitor<'de> for NameVisitor {
            type Value = LogicalProperty;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a typography property name")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                LogicalProperty::from_name(v)
                    .ok_or_else(|| E::custom(format!("unknown typography property: {}", v)))
            }
        }

        deserializer.deserialize_str(NameVisitor)
    }
}
