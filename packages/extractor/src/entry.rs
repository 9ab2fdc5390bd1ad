use crate::media::MediaQueryContext;
use crate::properties::LogicalProperty;
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use typedrift_ast::Span;

/// How faithfully a resolved or computed value reflects true CSS evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Exact,
    Approximate,
    Unknown,
}

/// Numeric evaluation of a value (`24.0`, `"px"`). Unit is empty for
/// unitless results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedValue {
    pub value: f64,
    pub unit: String,
    pub confidence: Confidence,
}

impl ComputedValue {
    pub fn new(value: f64, unit: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            value,
            unit: unit.into(),
            confidence,
        }
    }

    /// The zero/unknown result every evaluator failure collapses to
    pub fn unknown() -> Self {
        Self::new(0.0, "", Confidence::Unknown)
    }
}

/// Original and resolved forms of one declaration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueInfo {
    pub original: String,
    pub resolved: String,
    /// How faithfully `resolved` reflects true evaluation; `Exact` when
    /// the value carried no variable or function token
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computed: Option<ComputedValue>,
    /// Fallback values supplied in `var()` calls, in occurrence order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,
}

/// Names a value depends on. Mixins and imports are recorded, never
/// expanded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependencies {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mixins: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_properties: Vec<String>,
}

impl Dependencies {
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
            && self.mixins.is_empty()
            && self.imports.is_empty()
            && self.custom_properties.is_empty()
    }
}

/// Where an entry came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryContext {
    pub file: String,
    pub span: Span,
    pub specificity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_query: Option<MediaQueryContext>,
    /// Enclosing selectors, outermost first, as authored
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selector_path: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMetadata {
    pub is_responsive: bool,
    pub has_variables: bool,
    pub has_functions: bool,
    pub is_inherited: bool,
    pub is_shorthand: bool,
    /// Id of the shorthand declaration this entry was expanded from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shorthand_source: Option<String>,
    pub is_important: bool,
}

/// One resolved typography occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypographyEntry {
    /// Stable id derived from selector + property + original value
    pub id: String,
    pub selector: String,
    pub property: LogicalProperty,
    pub value: ValueInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<EntryContext>,
    #[serde(default, skip_serializing_if = "Dependencies::is_empty")]
    pub dependencies: Dependencies,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EntryMetadata>,
}

impl TypographyEntry {
    /// Breakpoint grouping key; entries outside any media at-rule fall
    /// into the implicit "base" bucket.
    pub fn breakpoint_key(&self) -> String {
        self.context
            .as_ref()
            .and_then(|c| c.media_query.as_ref())
            .map(|m| m.breakpoint_key())
            .unwrap_or_else(|| "base".to_string())
    }
}

/// Stable entry id from the identifying triple, CRC32 over a joined key
pub fn entry_id(selector: &str, property: &str, original: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(selector.as_bytes());
    hasher.update(b"|");
    hasher.update(property.as_bytes());
    hasher.update(b"|");
    hasher.update(original.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One `@font-face` block. `family` and `src` are required; a block
/// missing either is dropped whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontFaceDeclaration {
    pub family: String,
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unicode_range: Option<String>,
    pub file: String,
    pub span: Span,
}

/// One `--name: value` definition site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPropertyDefinition {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    /// Selector of the defining rule; `None` at the top level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    pub file: String,
    pub span: Span,
}
