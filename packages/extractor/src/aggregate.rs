//! Result bundle and derived groupings.
//!
//! Groupings index into the flat entry list and are recomputable from
//! it; merging batched results is concatenation plus an index rebuild,
//! which never changes an individual entry.

use crate::entry::{CustomPropertyDefinition, FontFaceDeclaration, TypographyEntry};
use crate::error::{Warning, WarningStats};
use crate::media::Cascade;
use crate::properties::LogicalProperty;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Summary counters over one result bundle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    pub total_properties: usize,
    pub unique_font_families: usize,
    pub responsive_count: usize,
    pub custom_property_count: usize,
    pub font_face_count: usize,
}

/// Everything one extraction pass (or a merged batch) produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub entries: Vec<TypographyEntry>,
    pub font_faces: Vec<FontFaceDeclaration>,
    pub custom_properties: Vec<CustomPropertyDefinition>,
    /// Logical property name to entry indices
    pub by_property: HashMap<String, Vec<usize>>,
    /// Authored selector to entry indices
    pub by_selector: HashMap<String, Vec<usize>>,
    /// Breakpoint key to entry indices; non-responsive entries land in
    /// the implicit `base` bucket
    pub by_breakpoint: HashMap<String, Vec<usize>>,
    pub summary: ExtractionSummary,
    pub warnings: Vec<Warning>,
}

impl ExtractionResult {
    /// Recompute groupings and summary from the flat lists. Groupings
    /// reflect whatever context the entries still carry; merge before
    /// stripping verbosity when exact breakpoint buckets matter.
    pub fn rebuild_indexes(&mut self) {
        self.by_property.clear();
        self.by_selector.clear();
        self.by_breakpoint.clear();

        let mut families: HashSet<String> = HashSet::new();
        let mut responsive = 0usize;

        for (index, entry) in self.entries.iter().enumerate() {
            self.by_property
                .entry(entry.property.name().to_string())
                .or_default()
                .push(index);
            self.by_selector
                .entry(entry.selector.clone())
                .or_default()
                .push(index);

            let breakpoint = entry.breakpoint_key();
            if breakpoint != "base" {
                responsive += 1;
            }
            self.by_breakpoint.entry(breakpoint).or_default().push(index);

            if entry.property == LogicalProperty::FontFamily {
                for family in entry.value.resolved.split(',') {
                    let family = family.trim().trim_matches(|c| c == '"' || c == '\'');
                    if !family.is_empty() {
                        families.insert(family.to_string());
                    }
                }
            }
        }

        self.summary = ExtractionSummary {
            total_properties: self.entries.len(),
            unique_font_families: families.len(),
            responsive_count: responsive,
            custom_property_count: self.custom_properties.len(),
            font_face_count: self.font_faces.len(),
        };
    }

    /// Merge another result in by concatenation, then rebuild. Merge
    /// order only affects ordering within the aggregated mappings, never
    /// an individual entry.
    pub fn merge(&mut self, other: ExtractionResult) {
        self.entries.extend(other.entries);
        self.font_faces.extend(other.font_faces);
        self.custom_properties.extend(other.custom_properties);
        self.warnings.extend(other.warnings);
        self.rebuild_indexes();
    }

    /// Warning counters for the host's build-gating decision
    pub fn warning_stats(&self) -> WarningStats {
        WarningStats::from_warnings(&self.warnings)
    }

    /// Responsive cascade over this result's entries
    pub fn cascade(&self) -> Cascade {
        Cascade::build(&self.entries)
    }

    /// Entries for one logical property name
    pub fn entries_for_property(&self, name: &str) -> Vec<&TypographyEntry> {
        self.by_property
            .get(name)
            .map(|indices| indices.iter().filter_map(|i| self.entries.get(*i)).collect())
            .unwrap_or_default()
    }
}
