//! Per-property extractors and their registry.
//!
//! Registries are explicitly constructed and caller-owned so concurrent
//! passes with different configurations never interfere. Extractors are
//! pure: no shared mutable state, same input, same output.

use crate::properties::LogicalProperty;
use crate::resolver::VariableResolutionContext;
use crate::shorthand;
use std::collections::HashMap;

/// One expanded (property, value) pair produced by an extractor
#[derive(Debug, Clone, PartialEq)]
pub struct PartialEntry {
    pub property: LogicalProperty,
    pub value: String,
    /// True for entries expanded out of a shorthand
    pub from_shorthand: bool,
}

impl PartialEntry {
    fn new(property: LogicalProperty, value: impl Into<String>) -> Self {
        Self {
            property,
            value: value.into(),
            from_shorthand: false,
        }
    }
}

/// Extractor output: expanded entries plus an optional non-fatal warning
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractOutcome {
    pub partials: Vec<PartialEntry>,
    pub warning: Option<String>,
}

/// Contract for one logical property.
///
/// `extract` expands a resolved value into entries (one for most
/// properties, several for shorthands); `validate` judges the value
/// against the property's grammar; `normalize` canonicalizes whitespace
/// and casing. A failed validation never halts the pipeline.
pub trait PropertyExtractor: Send + Sync {
    fn extract(
        &self,
        property: &LogicalProperty,
        value: &str,
        ctx: &VariableResolutionContext,
    ) -> ExtractOutcome {
        let _ = ctx;
        ExtractOutcome {
            partials: vec![PartialEntry::new(property.clone(), value)],
            warning: None,
        }
    }

    fn validate(&self, value: &str) -> bool {
        !value.trim().is_empty()
    }

    fn normalize(&self, value: &str) -> String {
        collapse_whitespace(value)
    }
}

/// Values still carrying variable references or functional expressions
/// cannot be judged against a property grammar
fn defers_validation(value: &str) -> bool {
    value.contains('$') || value.contains("var(") || crate::calc::contains_function(value)
}

const GLOBAL_KEYWORDS: [&str; 4] = ["inherit", "initial", "unset", "revert"];

pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fallback for properties with open-ended grammars
pub struct GenericExtractor;

impl PropertyExtractor for GenericExtractor {}

/// Closed keyword sets (`text-transform: uppercase`, ...)
pub struct KeywordExtractor {
    keywords: &'static [&'static str],
}

impl KeywordExtractor {
    pub fn new(keywords: &'static [&'static str]) -> Self {
        Self { keywords }
    }
}

impl PropertyExtractor for KeywordExtractor {
    fn validate(&self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        if defers_validation(value) {
            return true;
        }
        let lowered = value.to_ascii_lowercase();
        // Multi-keyword values (`text-decoration: underline dotted`) pass
        // when every token is in the set
        lowered.split_whitespace().all(|token| {
            self.keywords.contains(&token) || GLOBAL_KEYWORDS.contains(&token)
        })
    }

    fn normalize(&self, value: &str) -> String {
        let collapsed = collapse_whitespace(value);
        if defers_validation(&collapsed) {
            collapsed
        } else {
            collapsed.to_ascii_lowercase()
        }
    }
}

/// Dimension grammars (`letter-spacing: 0.02em`), with optional keyword
/// escapes and unitless numbers
pub struct DimensionExtractor {
    keywords: &'static [&'static str],
    allow_unitless: bool,
}

impl DimensionExtractor {
    pub fn new(keywords: &'static [&'static str], allow_unitless: bool) -> Self {
        Self {
            keywords,
            allow_unitless,
        }
    }
}

impl PropertyExtractor for DimensionExtractor {
    fn validate(&self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        if defers_validation(value) {
            return true;
        }
        let lowered = value.to_ascii_lowercase();
        if self.keywords.contains(&lowered.as_str()) || GLOBAL_KEYWORDS.contains(&lowered.as_str())
        {
            return true;
        }
        match crate::calc::parse_dimension(value) {
            Some((_, unit)) => self.allow_unitless || !unit.is_empty(),
            None => false,
        }
    }
}

/// `font-weight` takes keywords or numbers in [1, 1000]
pub struct FontWeightExtractor;

impl PropertyExtractor for FontWeightExtractor {
    fn validate(&self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        if defers_validation(value) {
            return true;
        }
        let lowered = value.to_ascii_lowercase();
        if matches!(lowered.as_str(), "normal" | "bold" | "bolder" | "lighter")
            || GLOBAL_KEYWORDS.contains(&lowered.as_str())
        {
            return true;
        }
        value
            .parse::<f64>()
            .map(|n| (1.0..=1000.0).contains(&n))
            .unwrap_or(false)
    }

    fn normalize(&self, value: &str) -> String {
        // Keep authored form; `bold` and `700` stay distinct
        let collapsed = collapse_whitespace(value);
        if defers_validation(&collapsed) {
            collapsed
        } else {
            collapsed.to_ascii_lowercase()
        }
    }
}

/// Family lists keep quoting and casing, separators are canonicalized
pub struct FontFamilyExtractor;

impl PropertyExtractor for FontFamilyExtractor {
    fn normalize(&self, value: &str) -> String {
        shorthand::normalize_family(value)
    }
}

/// The `font` shorthand: decomposes into logical-property entries
pub struct FontShorthandExtractor;

impl PropertyExtractor for FontShorthandExtractor {
    fn extract(
        &self,
        _property: &LogicalProperty,
        value: &str,
        _ctx: &VariableResolutionContext,
    ) -> ExtractOutcome {
        let decomposition = shorthand::decompose_font(value);
        ExtractOutcome {
            partials: decomposition
                .entries
                .into_iter()
                .map(|(property, value)| PartialEntry {
                    from_shorthand: decomposition.parsed && property != LogicalProperty::Font,
                    property,
                    value,
                })
                .collect(),
            warning: decomposition.warning,
        }
    }

    fn validate(&self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }
        if defers_validation(value) {
            return true;
        }
        shorthand::decompose_font(value).parsed
    }
}

/// Wildcard for `--custom-property` declarations; values are free-form
pub struct CustomPropertyExtractor;

impl PropertyExtractor for CustomPropertyExtractor {
    fn normalize(&self, value: &str) -> String {
        value.trim().to_string()
    }
}

/// Name-to-extractor table over the closed property set, plus a wildcard
/// slot for custom properties
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn PropertyExtractor>>,
    wildcard: Box<dyn PropertyExtractor>,
    fallback: GenericExtractor,
}

impl ExtractorRegistry {
    /// Empty registry; every property falls back to the generic extractor
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
            wildcard: Box::new(CustomPropertyExtractor),
            fallback: GenericExtractor,
        }
    }

    /// Registry covering the full typography set
    pub fn with_defaults() -> Self {
        const STYLE_KEYWORDS: &[&str] = &["normal", "italic", "oblique"];
        const VARIANT_KEYWORDS: &[&str] = &["normal", "small-caps"];
        const STRETCH_KEYWORDS: &[&str] = &[
            "normal",
            "ultra-condensed",
            "extra-condensed",
            "condensed",
            "semi-condensed",
            "semi-expanded",
            "expanded",
            "extra-expanded",
            "ultra-expanded",
        ];
        const ALIGN_KEYWORDS: &[&str] = &[
            "left", "right", "center", "justify", "start", "end", "match-parent",
        ];
        const TRANSFORM_KEYWORDS: &[&str] =
            &["none", "capitalize", "uppercase", "lowercase", "full-width"];
        const OVERFLOW_KEYWORDS: &[&str] = &["clip", "ellipsis"];
        const WHITE_SPACE_KEYWORDS: &[&str] =
            &["normal", "nowrap", "pre", "pre-wrap", "pre-line", "break-spaces"];
        const WORD_BREAK_KEYWORDS: &[&str] =
            &["normal", "break-all", "keep-all", "break-word"];
        const OVERFLOW_WRAP_KEYWORDS: &[&str] = &["normal", "break-word", "anywhere"];
        const SIZE_KEYWORDS: &[&str] = &[
            "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "smaller",
            "larger",
        ];
        const SPACING_KEYWORDS: &[&str] = &["normal"];
        const LINE_HEIGHT_KEYWORDS: &[&str] = &["normal"];
        const VERTICAL_ALIGN_KEYWORDS: &[&str] = &[
            "baseline",
            "sub",
            "super",
            "text-top",
            "text-bottom",
            "middle",
            "top",
            "bottom",
        ];

        let mut registry = Self::new();
        registry.register(LogicalProperty::Font, Box::new(FontShorthandExtractor));
        registry.register(LogicalProperty::FontFamily, Box::new(FontFamilyExtractor));
        registry.register(
            LogicalProperty::FontSize,
            Box::new(DimensionExtractor::new(SIZE_KEYWORDS, false)),
        );
        registry.register(LogicalProperty::FontWeight, Box::new(FontWeightExtractor));
        registry.register(
            LogicalProperty::FontStyle,
            Box::new(KeywordExtractor::new(STYLE_KEYWORDS)),
        );
        registry.register(
            LogicalProperty::FontVariant,
            Box::new(KeywordExtractor::new(VARIANT_KEYWORDS)),
        );
        registry.register(
            LogicalProperty::FontStretch,
            Box::new(KeywordExtractor::new(STRETCH_KEYWORDS)),
        );
        registry.register(
            LogicalProperty::LineHeight,
            Box::new(DimensionExtractor::new(LINE_HEIGHT_KEYWORDS, true)),
        );
        registry.register(
            LogicalProperty::LetterSpacing,
            Box::new(DimensionExtractor::new(SPACING_KEYWORDS, false)),
        );
        registry.register(
            LogicalProperty::WordSpacing,
            Box::new(DimensionExtractor::new(SPACING_KEYWORDS, false)),
        );
        registry.register(
            LogicalProperty::TextAlign,
            Box::new(KeywordExtractor::new(ALIGN_KEYWORDS)),
        );
        registry.register(
            LogicalProperty::TextTransform,
            Box::new(KeywordExtractor::new(TRANSFORM_KEYWORDS)),
        );
        registry.register(
            LogicalProperty::TextDecoration,
            Box::new(GenericExtractor),
        );
        registry.register(
            LogicalProperty::TextIndent,
            Box::new(DimensionExtractor::new(&[], false)),
        );
        registry.register(LogicalProperty::TextShadow, Box::new(GenericExtractor));
        registry.register(
            LogicalProperty::TextOverflow,
            Box::new(KeywordExtractor::new(OVERFLOW_KEYWORDS)),
        );
        registry.register(
            LogicalProperty::WhiteSpace,
            Box::new(KeywordExtractor::new(WHITE_SPACE_KEYWORDS)),
        );
        registry.register(
            LogicalProperty::WordBreak,
            Box::new(KeywordExtractor::new(WORD_BREAK_KEYWORDS)),
        );
        registry.register(
            LogicalProperty::OverflowWrap,
            Box::new(KeywordExtractor::new(OVERFLOW_WRAP_KEYWORDS)),
        );
        registry.register(
            LogicalProperty::VerticalAlign,
            Box::new(KeywordExtractor::new(VERTICAL_ALIGN_KEYWORDS)),
        );
        registry
    }

    pub fn register(&mut self, property: LogicalProperty, extractor: Box<dyn PropertyExtractor>) {
        self.extractors
            .insert(property.name().to_string(), extractor);
    }

    pub fn set_wildcard(&mut self, extractor: Box<dyn PropertyExtractor>) {
        self.wildcard = extractor;
    }

    /// Name lookup; custom properties hit the wildcard slot
    pub fn get(&self, property: &LogicalProperty) -> &dyn PropertyExtractor {
        if property.is_custom() {
            return self.wildcard.as_ref();
        }
        self.extractors
            .get(property.name())
            .map(Box::as_ref)
            .unwrap_or(&self.fallback)
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
