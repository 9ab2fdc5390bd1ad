//! Media query parsing and responsive cascade assembly.
//!
//! Conditions are parsed coarsely into `{feature, operator, value}`
//! triples; one governing breakpoint is extracted per query. Specificity
//! only orders overlapping breakpoints deterministically, it does not
//! emulate a real cascade.

use crate::calc;
use crate::entry::TypographyEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreakpointKind {
    MinWidth,
    MaxWidth,
    Range,
}

/// The governing width condition of one media query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    #[serde(rename = "type")]
    pub kind: BreakpointKind,
    /// Value text as authored (`768px`)
    pub raw: String,
    pub unit: String,
    pub numeric: f64,
    /// Upper bound when `kind` is `Range`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_numeric: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_unit: Option<String>,
}

impl Breakpoint {
    /// Grouping key, stable across passes
    pub fn key(&self) -> String {
        match self.kind {
            BreakpointKind::MinWidth => format!("min-width:{}{}", self.numeric, self.unit),
            BreakpointKind::MaxWidth => format!("max-width:{}{}", self.numeric, self.unit),
            BreakpointKind::Range => format!(
                "range:{}{}-{}{}",
                self.numeric,
                self.unit,
                self.max_numeric.unwrap_or(0.0),
                self.max_unit.as_deref().unwrap_or(""),
            ),
        }
    }

    fn lower_px(&self) -> Option<f64> {
        calc::to_px(self.numeric, &self.unit)
    }

    fn upper_px(&self) -> Option<f64> {
        let value = self.max_numeric?;
        calc::to_px(value, self.max_unit.as_deref().unwrap_or("px"))
    }

    /// Width comparison in pixels after unit normalization
    pub fn satisfied_by(&self, viewport_width_px: f64) -> bool {
        match self.kind {
            BreakpointKind::MinWidth => self
                .lower_px()
                .map(|px| viewport_width_px >= px)
                .unwrap_or(false),
            BreakpointKind::MaxWidth => self
                .lower_px()
                .map(|px| viewport_width_px <= px)
                .unwrap_or(false),
            BreakpointKind::Range => match (self.lower_px(), self.upper_px()) {
                (Some(lo), Some(hi)) => viewport_width_px >= lo && viewport_width_px <= hi,
                _ => false,
            },
        }
    }
}

/// One parsed media condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaCondition {
    pub feature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Context for declarations inside a `@media` at-rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaQueryContext {
    /// Condition string as authored
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoint: Option<Breakpoint>,
    pub conditions: Vec<MediaCondition>,
    pub specificity: u32,
    /// Declaration-order index of the media block within the pass
    pub order: usize,
}

impl MediaQueryContext {
    /// Parse an at-rule condition string. Never fails; unparseable
    /// fragments degrade to feature-only conditions.
    pub fn parse(params: &str, order: usize) -> Self {
        let conditions = parse_conditions(params);
        let breakpoint = extract_breakpoint(&conditions);
        let specificity = specificity_of(&conditions);
        Self {
            raw: params.trim().to_string(),
            breakpoint,
            conditions,
            specificity,
            order,
        }
    }

    pub fn breakpoint_key(&self) -> String {
        self.breakpoint
            .as_ref()
            .map(|b| b.key())
            .unwrap_or_else(|| format!("media:{}", self.raw))
    }

    /// A query without a width breakpoint matches every viewport
    pub fn satisfied_by(&self, viewport_width_px: f64) -> bool {
        self.breakpoint
            .as_ref()
            .map(|b| b.satisfied_by(viewport_width_px))
            .unwrap_or(true)
    }
}

/// Parenthesized groups of the condition string; the leading media-type
/// keyword and `and`/`only`/`not` connectives are skipped.
fn parse_conditions(params: &str) -> Vec<MediaCondition> {
    let mut conditions = Vec::new();
    let bytes = params.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                let end = calc::matching_paren(params, i).unwrap_or(params.len());
                let body = params[i + 1..end.min(params.len())].trim();
                if !body.is_empty() {
                    conditions.push(parse_condition(body));
                }
                i = end + 1;
            }
            _ => i += 1,
        }
    }
    conditions
}

fn parse_condition(body: &str) -> MediaCondition {
    // `feature: value` form
    if let Some(at) = body.find(':') {
        return MediaCondition {
            feature: body[..at].trim().to_string(),
            operator: None,
            value: Some(body[at + 1..].trim().to_string()),
        };
    }
    // `feature >= value` comparison form
    for op in ["<=", ">=", "<", ">", "="] {
        if let Some(at) = body.find(op) {
            return MediaCondition {
                feature: body[..at].trim().to_string(),
                operator: Some(op.to_string()),
                value: Some(body[at + op.len()..].trim().to_string()),
            };
        }
    }
    // Bare feature (`(hover)`, `(monochrome)`)
    MediaCondition {
        feature: body.to_string(),
        operator: None,
        value: None,
    }
}

fn condition_dimension(condition: &MediaCondition) -> Option<(f64, String, String)> {
    let value = condition.value.as_deref()?;
    let (numeric, unit) = calc::parse_dimension(value)?;
    Some((numeric, unit, value.to_string()))
}

/// Locate the governing breakpoint: a min-width and/or max-width
/// condition; both present pair into a range.
fn extract_breakpoint(conditions: &[MediaCondition]) -> Option<Breakpoint> {
    let mut min: Option<(f64, String, String)> = None;
    let mut max: Option<(f64, String, String)> = None;

    for condition in conditions {
        match (condition.feature.as_str(), condition.operator.as_deref()) {
            ("min-width", _) => min = min.or_else(|| condition_dimension(condition)),
            ("max-width", _) => max = max.or_else(|| condition_dimension(condition)),
            ("width", Some(">=" | ">")) => min = min.or_else(|| condition_dimension(condition)),
            ("width", Some("<=" | "<")) => max = max.or_else(|| condition_dimension(condition)),
            _ => {}
        }
    }

    match (min, max) {
        (Some((numeric, unit, raw)), Some((max_numeric, max_unit, _))) => Some(Breakpoint {
            kind: BreakpointKind::Range,
            raw,
            unit,
            numeric,
            max_numeric: Some(max_numeric),
            max_unit: Some(max_unit),
        }),
        (Some((numeric, unit, raw)), None) => Some(Breakpoint {
            kind: BreakpointKind::MinWidth,
            raw,
            unit,
            numeric,
            max_numeric: None,
            max_unit: None,
        }),
        (None, Some((numeric, unit, raw))) => Some(Breakpoint {
            kind: BreakpointKind::MaxWidth,
            raw,
            unit,
            numeric,
            max_numeric: None,
            max_unit: None,
        }),
        (None, None) => None,
    }
}

/// Condition count plus per-feature weight; width features weigh most,
/// orientation next, resolution next, everything else least.
fn specificity_of(conditions: &[MediaCondition]) -> u32 {
    let mut score = conditions.len() as u32;
    for condition in conditions {
        let feature = condition.feature.as_str();
        score += if feature.contains("width") {
            8
        } else if feature.contains("orientation") {
            4
        } else if feature.contains("resolution") {
            2
        } else {
            1
        };
    }
    score
}

/// One breakpoint's property overrides within the cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeEntry {
    pub breakpoint_key: String,
    /// Logical property name to resolved value
    pub properties: HashMap<String, String>,
    pub context: MediaQueryContext,
}

/// Base values plus the ordered list of responsive overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cascade {
    pub base: HashMap<String, String>,
    pub entries: Vec<CascadeEntry>,
}

impl Cascade {
    /// Assemble a cascade from extraction output. Responsive entries are
    /// grouped by breakpoint key; the list is sorted by declaration
    /// order, then by descending specificity.
    pub fn build(entries: &[TypographyEntry]) -> Self {
        let mut base = HashMap::new();
        let mut grouped: Vec<CascadeEntry> = Vec::new();

        for entry in entries {
            let media = entry.context.as_ref().and_then(|c| c.media_query.as_ref());
            match media {
                None => {
                    base.insert(
                        entry.property.name().to_string(),
                        entry.value.resolved.clone(),
                    );
                }
                Some(context) => {
                    let key = context.breakpoint_key();
                    if let Some(at) = grouped.iter().position(|g| g.breakpoint_key == key) {
                        grouped[at]
                            .properties
                            .insert(entry.property.name().to_string(), entry.value.resolved.clone());
                    } else {
                        let mut properties = HashMap::new();
                        properties.insert(
                            entry.property.name().to_string(),
                            entry.value.resolved.clone(),
                        );
                        grouped.push(CascadeEntry {
                            breakpoint_key: key,
                            properties,
                            context: context.clone(),
                        });
                    }
                }
            }
        }

        grouped.sort_by(|a, b| {
            a.context
                .order
                .cmp(&b.context.order)
                .then(b.context.specificity.cmp(&a.context.specificity))
        });

        Self {
            base,
            entries: grouped,
        }
    }

    /// Effective property values for a viewport width. Per property, the
    /// winning override is the matching entry with the greatest
    /// (specificity, declaration order) pair; ties on both fall to the
    /// later declaration.
    pub fn effective_style(&self, viewport_width_px: f64) -> HashMap<String, String> {
        let mut result = self.base.clone();
        let mut winners: HashMap<&str, (u32, usize)> = HashMap::new();

        for entry in &self.entries {
            if !entry.context.satisfied_by(viewport_width_px) {
                continue;
            }
            let rank = (entry.context.specificity, entry.context.order);
            for (property, value) in &entry.properties {
                let current = winners.get(property.as_str());
                if current.map(|c| rank >= *c).unwrap_or(true) {
                    winners.insert(property, rank);
                    result.insert(property.clone(), value.clone());
                }
            }
        }

        result
    }
}
