/// Pipeline behavior: relevance filtering, resolution, media tagging,
/// shorthand expansion, option handling
use crate::*;
use typedrift_ast::TreeBuilder;

fn extract(sheet: &typedrift_ast::StyleSheet) -> ExtractionResult {
    TypographyExtractor::new().extract(sheet).unwrap()
}

#[test]
fn test_variable_resolution_end_to_end() {
    let mut b = TreeBuilder::new("/styles/button.scss");
    b.variable("$base", "16px");
    b.open_rule(".button");
    b.declaration("font-size", "$base", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);

    let entry = &result.entries[0];
    assert_eq!(entry.selector, ".button");
    assert_eq!(entry.property, LogicalProperty::FontSize);
    assert_eq!(entry.value.original, "$base");
    assert_eq!(entry.value.resolved, "16px");
    assert_eq!(entry.value.confidence, Confidence::Exact);
    assert_eq!(
        entry.value.computed,
        Some(ComputedValue::new(16.0, "px", Confidence::Exact))
    );
    assert_eq!(entry.dependencies.variables, vec!["$base"]);
    assert!(entry.metadata.as_ref().unwrap().has_variables);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_non_typography_properties_never_emitted() {
    let mut b = TreeBuilder::new("/styles/box.scss");
    b.open_rule(".box");
    b.declaration("margin", "8px", false);
    b.declaration("color", "red", false);
    b.declaration("font-size", "14px", false);
    b.declaration("display", "flex", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].property, LogicalProperty::FontSize);
}

#[test]
fn test_media_context_attached_and_grouped() {
    let mut b = TreeBuilder::new("/styles/nav.scss");
    b.open_rule(".nav");
    b.declaration("font-size", "14px", false);
    b.close();
    b.open_at_rule("media", "(min-width: 768px)");
    b.open_rule(".nav");
    b.declaration("font-size", "16px", false);
    b.close();
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 2);

    let base = &result.entries[0];
    assert!(base.context.as_ref().unwrap().media_query.is_none());
    assert_eq!(base.breakpoint_key(), "base");

    let responsive = &result.entries[1];
    let media = responsive
        .context
        .as_ref()
        .unwrap()
        .media_query
        .as_ref()
        .unwrap();
    let breakpoint = media.breakpoint.as_ref().unwrap();
    assert_eq!(breakpoint.kind, BreakpointKind::MinWidth);
    assert_eq!(breakpoint.numeric, 768.0);
    assert!(responsive.metadata.as_ref().unwrap().is_responsive);

    assert_eq!(result.by_breakpoint.get("base"), Some(&vec![0]));
    assert_eq!(result.by_breakpoint.get("min-width:768px"), Some(&vec![1]));
    assert_eq!(result.summary.responsive_count, 1);
}

#[test]
fn test_font_shorthand_decomposition() {
    let original = "italic bold 16px/1.5 \"Helvetica Neue\", Arial, sans-serif";
    let mut b = TreeBuilder::new("/styles/type.scss");
    b.open_rule(".heading");
    b.declaration("font", original, false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 5);

    let value_of = |property: &LogicalProperty| {
        result
            .entries
            .iter()
            .find(|e| &e.property == property)
            .map(|e| e.value.resolved.as_str())
    };
    assert_eq!(value_of(&LogicalProperty::FontStyle), Some("italic"));
    assert_eq!(value_of(&LogicalProperty::FontWeight), Some("bold"));
    assert_eq!(value_of(&LogicalProperty::FontSize), Some("16px"));
    assert_eq!(value_of(&LogicalProperty::LineHeight), Some("1.5"));
    assert_eq!(
        value_of(&LogicalProperty::FontFamily),
        Some("\"Helvetica Neue\", Arial, sans-serif")
    );

    let source = entry_id(".heading", "font", original);
    for entry in &result.entries {
        let metadata = entry.metadata.as_ref().unwrap();
        assert!(metadata.is_shorthand);
        assert_eq!(metadata.shorthand_source.as_ref(), Some(&source));
    }
}

#[test]
fn test_system_font_single_entry() {
    let mut b = TreeBuilder::new("/styles/type.scss");
    b.open_rule(".native");
    b.declaration("font", "menu", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].property, LogicalProperty::Font);
    assert_eq!(result.entries[0].value.resolved, "menu");
    assert!(result.entries[0].metadata.as_ref().unwrap().is_shorthand);
}

#[test]
fn test_custom_property_wildcard_and_definition() {
    let mut b = TreeBuilder::new("/styles/tokens.scss");
    b.open_rule(":root");
    b.declaration("--heading-size", "24px", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(
        result.entries[0].property,
        LogicalProperty::Custom("--heading-size".to_string())
    );

    assert_eq!(result.custom_properties.len(), 1);
    let definition = &result.custom_properties[0];
    assert_eq!(definition.name, "--heading-size");
    assert_eq!(definition.resolved.as_deref(), Some("24px"));
    assert_eq!(definition.selector.as_deref(), Some(":root"));
    assert_eq!(result.summary.custom_property_count, 1);
}

#[test]
fn test_var_reference_tracks_dependency_and_fallback() {
    let mut b = TreeBuilder::new("/styles/tokens.scss");
    b.open_rule(":root");
    b.declaration("--body-size", "15px", false);
    b.close();
    b.open_rule("p");
    b.declaration("font-size", "var(--body-size)", false);
    b.declaration("line-height", "var(--body-leading, 1.6)", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    let size = result
        .entries
        .iter()
        .find(|e| e.property == LogicalProperty::FontSize)
        .unwrap();
    assert_eq!(size.value.resolved, "15px");
    assert_eq!(size.dependencies.custom_properties, vec!["--body-size"]);

    let leading = result
        .entries
        .iter()
        .find(|e| e.property == LogicalProperty::LineHeight)
        .unwrap();
    assert_eq!(leading.value.resolved, "1.6");
    assert_eq!(leading.value.fallbacks, vec!["1.6"]);
}

#[test]
fn test_unknown_variable_warns_but_emits() {
    let mut b = TreeBuilder::new("/styles/broken.scss");
    b.open_rule(".x");
    b.declaration("font-size", "$missing", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].value.resolved, "$missing");
    assert_eq!(result.entries[0].value.confidence, Confidence::Unknown);

    let stats = result.warning_stats();
    assert_eq!(stats.count(WarningKind::VariableNotFound), 1);
    assert_eq!(stats.recovered, 1);
}

#[test]
fn test_cycle_warns_and_terminates() {
    let mut b = TreeBuilder::new("/styles/cycle.scss");
    b.variable("$a", "$b");
    b.variable("$b", "$a");
    b.open_rule(".x");
    b.declaration("font-size", "$a", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].value.resolved, "$a");
    assert_eq!(result.entries[0].value.confidence, Confidence::Unknown);
    assert!(result.warning_stats().count(WarningKind::CircularDependency) >= 1);
}

#[test]
fn test_invalid_value_best_effort_entry() {
    let mut b = TreeBuilder::new("/styles/odd.scss");
    b.open_rule(".x");
    b.declaration("font-size", "fast", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].value.resolved, "fast");
    assert_eq!(
        result.warning_stats().count(WarningKind::InvalidPropertyValue),
        1
    );
}

#[test]
fn test_calc_evaluation_through_pipeline() {
    let mut b = TreeBuilder::new("/styles/calc.scss");
    b.open_rule(".x");
    b.declaration("font-size", "calc(1rem + 8px)", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    let entry = &result.entries[0];
    assert_eq!(entry.value.resolved, "calc(1rem + 8px)");
    let computed = entry.value.computed.as_ref().unwrap();
    assert_eq!(computed.value, 24.0);
    assert_eq!(computed.unit, "px");
    assert_eq!(computed.confidence, Confidence::Approximate);
    assert!(entry.metadata.as_ref().unwrap().has_functions);
}

#[test]
fn test_nested_rules_extend_selector_path() {
    let mut b = TreeBuilder::new("/styles/card.scss");
    b.open_rule(".card");
    b.open_rule(".title");
    b.declaration("font-weight", "600", false);
    b.close();
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    let entry = &result.entries[0];
    assert_eq!(entry.selector, ".title");
    let context = entry.context.as_ref().unwrap();
    assert_eq!(context.selector_path, vec![".card", ".title"]);
    assert_eq!(context.specificity, 20);
}

#[test]
fn test_include_recorded_as_mixin_dependency() {
    let mut b = TreeBuilder::new("/styles/mix.scss");
    b.open_rule(".x");
    b.at_rule("include", "heading($large)");
    b.declaration("font-size", "18px", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries[0].dependencies.mixins, vec!["heading"]);
}

#[test]
fn test_important_flag_carried() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.open_rule(".x");
    b.declaration("line-height", "1.2", true);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert!(result.entries[0].metadata.as_ref().unwrap().is_important);
}

#[test]
fn test_property_allow_list_filters() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.open_rule(".x");
    b.declaration("font-size", "16px", false);
    b.declaration("line-height", "1.5", false);
    b.close();
    let sheet = b.build();

    let mut options = ExtractOptions::default();
    options.properties = Some(vec![LogicalProperty::FontSize]);
    let result = TypographyExtractor::with_options(options)
        .extract(&sheet)
        .unwrap();
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].property, LogicalProperty::FontSize);
}

#[test]
fn test_selector_filter_applies_to_path() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.open_rule(".button");
    b.declaration("font-size", "16px", false);
    b.close();
    b.open_rule(".card");
    b.declaration("font-size", "14px", false);
    b.close();
    let sheet = b.build();

    let mut options = ExtractOptions::default();
    options.selector_filter = Some(".button".to_string());
    let result = TypographyExtractor::with_options(options)
        .extract(&sheet)
        .unwrap();
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].selector, ".button");
}

#[test]
fn test_resolve_variables_disabled() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.variable("$base", "16px");
    b.open_rule(".x");
    b.declaration("font-size", "$base", false);
    b.close();
    let sheet = b.build();

    let mut options = ExtractOptions::default();
    options.resolve_variables = false;
    let result = TypographyExtractor::with_options(options)
        .extract(&sheet)
        .unwrap();
    let entry = &result.entries[0];
    assert_eq!(entry.value.original, "$base");
    assert_eq!(entry.value.resolved, "$base");
    // Disabled resolution is not a lookup failure
    assert!(result.warnings.is_empty());
}

#[test]
fn test_verbosity_flags_do_not_change_values() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.variable("$base", "16px");
    b.open_rule(".x");
    b.declaration("font-size", "$base", false);
    b.close();
    let sheet = b.build();

    let full = TypographyExtractor::new().extract(&sheet).unwrap();

    let mut options = ExtractOptions::default();
    options.include_context = false;
    options.include_metadata = false;
    let slim = TypographyExtractor::with_options(options)
        .extract(&sheet)
        .unwrap();

    assert_eq!(slim.entries[0].value, full.entries[0].value);
    assert!(slim.entries[0].context.is_none());
    assert!(slim.entries[0].metadata.is_none());
    // Groupings were built before trimming
    assert_eq!(slim.by_breakpoint.keys().len(), full.by_breakpoint.keys().len());
}

#[test]
fn test_imported_variables_from_host() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.at_rule("import", "'theme'");
    b.open_rule(".x");
    b.declaration("font-size", "$theme-size", false);
    b.close();
    let sheet = b.build();

    let mut options = ExtractOptions::default();
    options
        .imported_variables
        .insert("$theme-size".to_string(), "15px".to_string());
    let result = TypographyExtractor::with_options(options)
        .extract(&sheet)
        .unwrap();

    let entry = &result.entries[0];
    assert_eq!(entry.value.resolved, "15px");
    assert_eq!(entry.dependencies.imports, vec!["theme"]);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_stable_ids_across_passes() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.open_rule(".x");
    b.declaration("font-size", "16px", false);
    b.close();
    let sheet = b.build();

    let first = extract(&sheet);
    let second = extract(&sheet);
    assert_eq!(first.entries[0].id, second.entries[0].id);
    assert_eq!(
        first.entries[0].id,
        entry_id(".x", "font-size", "16px")
    );
}
