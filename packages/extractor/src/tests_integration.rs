/// Whole-sheet extraction: groupings, summary counters, batching, and
/// output serialization
use crate::*;
use typedrift_ast::TreeBuilder;

fn theme_sheet() -> typedrift_ast::StyleSheet {
    let mut b = TreeBuilder::new("/styles/theme.scss");
    b.at_rule("import", "'reset'");
    b.variable("$body-size", "15px");
    b.variable("$heading-font", "\"Inter\", sans-serif");

    b.open_rule(":root");
    b.declaration("--scale", "1.25", false);
    b.close();

    b.open_rule("body");
    b.declaration("font-size", "$body-size", false);
    b.declaration("font-family", "$heading-font", false);
    b.declaration("line-height", "1.6", false);
    b.declaration("margin", "0", false);
    b.close();

    b.open_rule("h1");
    b.declaration("font", "700 32px/1.2 \"Inter\", sans-serif", false);
    b.close();

    b.open_at_rule("media", "(max-width: 600px)");
    b.open_rule("body");
    b.declaration("font-size", "14px", false);
    b.close();
    b.close();

    b.open_at_rule("font-face", "");
    b.declaration("font-family", "\"Inter\"", false);
    b.declaration("src", "url(/fonts/inter.woff2)", false);
    b.close();

    b.build()
}

#[test]
fn test_full_sheet_summary() {
    let result = TypographyExtractor::new().extract(&theme_sheet()).unwrap();

    // body: font-size, font-family, line-height; h1 shorthand: weight,
    // size, line-height, family; media body: font-size; :root custom
    assert_eq!(result.summary.total_properties, 9);
    assert_eq!(result.summary.responsive_count, 1);
    assert_eq!(result.summary.custom_property_count, 1);
    assert_eq!(result.summary.font_face_count, 1);
    // Inter + sans-serif
    assert_eq!(result.summary.unique_font_families, 2);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_groupings_cover_all_entries() {
    let result = TypographyExtractor::new().extract(&theme_sheet()).unwrap();

    let grouped: usize = result.by_property.values().map(Vec::len).sum();
    assert_eq!(grouped, result.entries.len());

    let by_selector: usize = result.by_selector.values().map(Vec::len).sum();
    assert_eq!(by_selector, result.entries.len());

    let by_breakpoint: usize = result.by_breakpoint.values().map(Vec::len).sum();
    assert_eq!(by_breakpoint, result.entries.len());

    assert_eq!(result.by_property.get("font-size").map(Vec::len), Some(3));
    assert!(result.by_breakpoint.contains_key("base"));
    assert!(result.by_breakpoint.contains_key("max-width:600px"));
}

#[test]
fn test_extract_all_merges_without_changing_entries() {
    let mut b = TreeBuilder::new("/styles/a.scss");
    b.open_rule(".a");
    b.declaration("font-size", "16px", false);
    b.close();
    let first = b.build();

    let mut b = TreeBuilder::new("/styles/b.scss");
    b.open_rule(".b");
    b.declaration("font-size", "14px", false);
    b.close();
    let second = b.build();

    let extractor = TypographyExtractor::new();
    let solo_a = extractor.extract(&first).unwrap();
    let solo_b = extractor.extract(&second).unwrap();
    let merged = extractor.extract_all(&[first, second]).unwrap();

    assert_eq!(merged.entries.len(), 2);
    assert_eq!(merged.entries[0], solo_a.entries[0]);
    assert_eq!(merged.entries[1], solo_b.entries[0]);
    assert_eq!(merged.summary.total_properties, 2);
    assert_eq!(merged.by_property.get("font-size").map(Vec::len), Some(2));
}

#[test]
fn test_merge_order_only_affects_grouping_order() {
    let mut b = TreeBuilder::new("/styles/a.scss");
    b.open_rule(".a");
    b.declaration("font-size", "16px", false);
    b.close();
    let first = b.build();

    let mut b = TreeBuilder::new("/styles/b.scss");
    b.open_rule(".b");
    b.declaration("font-size", "14px", false);
    b.close();
    let second = b.build();

    let extractor = TypographyExtractor::new();
    let forward = extractor
        .extract_all(&[first.clone(), second.clone()])
        .unwrap();
    let reverse = extractor.extract_all(&[second, first]).unwrap();

    let mut forward_ids: Vec<&str> = forward.entries.iter().map(|e| e.id.as_str()).collect();
    let mut reverse_ids: Vec<&str> = reverse.entries.iter().map(|e| e.id.as_str()).collect();
    forward_ids.sort_unstable();
    reverse_ids.sort_unstable();
    assert_eq!(forward_ids, reverse_ids);
    assert_eq!(forward.summary, reverse.summary);
}

#[test]
fn test_batch_error_propagates() {
    let json = r#"{"path": "/broken.scss", "nodes": [], "root": 0}"#;
    let broken: typedrift_ast::StyleSheet = serde_json::from_str(json).unwrap();

    let mut b = TreeBuilder::new("/styles/ok.scss");
    b.open_rule(".ok");
    b.declaration("font-size", "16px", false);
    b.close();
    let ok = b.build();

    let extractor = TypographyExtractor::new();
    assert!(extractor.extract_all(&[ok, broken]).is_err());
}

#[test]
fn test_output_serialization_shape() {
    let result = TypographyExtractor::new().extract(&theme_sheet()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    let entries = json.get("entries").and_then(|e| e.as_array()).unwrap();
    assert_eq!(entries.len(), result.entries.len());

    let responsive = entries
        .iter()
        .find(|e| e["context"]["mediaQuery"].is_object())
        .unwrap();
    let breakpoint = &responsive["context"]["mediaQuery"]["breakpoint"];
    assert_eq!(breakpoint["type"], "max-width");
    assert_eq!(breakpoint["numeric"], 600.0);

    // camelCase payload keys
    assert!(json.get("byProperty").is_some());
    assert!(json.get("byBreakpoint").is_some());
    assert!(json["summary"].get("totalProperties").is_some());

    // Round trip
    let back: ExtractionResult = serde_json::from_value(json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_warning_stats_interface() {
    let mut b = TreeBuilder::new("/styles/bad.scss");
    b.open_rule(".x");
    b.declaration("font-size", "$missing", false);
    b.declaration("font-size", "fast", false);
    b.close();
    b.open_at_rule("font-face", "");
    b.declaration("font-family", "\"Ghost\"", false);
    b.close();
    let sheet = b.build();

    let result = TypographyExtractor::new().extract(&sheet).unwrap();
    let stats = result.warning_stats();

    assert_eq!(stats.total, 3);
    assert_eq!(stats.count(WarningKind::VariableNotFound), 1);
    assert_eq!(stats.count(WarningKind::InvalidPropertyValue), 1);
    assert_eq!(stats.count(WarningKind::MalformedFontFace), 1);
    assert_eq!(stats.unrecovered, 1);
    assert_eq!(stats.recovered, 2);
    assert_eq!(stats.by_file.get("/styles/bad.scss"), Some(&3));
}

#[test]
fn test_entry_invariants_hold() {
    let result = TypographyExtractor::new().extract(&theme_sheet()).unwrap();
    for entry in &result.entries {
        assert!(!entry.value.original.is_empty());
        assert!(!entry.property.name().is_empty());
        let context = entry.context.as_ref().unwrap();
        if entry.metadata.as_ref().unwrap().is_responsive {
            assert!(context.media_query.is_some());
        } else {
            assert!(context.media_query.is_none());
        }
    }
}
