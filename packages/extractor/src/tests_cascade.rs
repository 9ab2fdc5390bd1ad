/// Cascade assembly and effective-style computation over real
/// extraction output
use crate::*;
use typedrift_ast::TreeBuilder;

fn extract(sheet: &typedrift_ast::StyleSheet) -> ExtractionResult {
    TypographyExtractor::new().extract(sheet).unwrap()
}

fn responsive_sheet() -> typedrift_ast::StyleSheet {
    let mut b = TreeBuilder::new("/styles/responsive.scss");
    b.open_rule("body");
    b.declaration("font-size", "14px", false);
    b.declaration("line-height", "1.4", false);
    b.close();
    b.open_at_rule("media", "(min-width: 768px)");
    b.open_rule("body");
    b.declaration("font-size", "16px", false);
    b.close();
    b.close();
    b.open_at_rule("media", "(min-width: 1200px)");
    b.open_rule("body");
    b.declaration("font-size", "18px", false);
    b.close();
    b.close();
    b.build()
}

#[test]
fn test_cascade_base_and_overrides() {
    let result = extract(&responsive_sheet());
    let cascade = result.cascade();

    assert_eq!(cascade.base.get("font-size"), Some(&"14px".to_string()));
    assert_eq!(cascade.base.get("line-height"), Some(&"1.4".to_string()));
    assert_eq!(cascade.entries.len(), 2);
    assert_eq!(cascade.entries[0].breakpoint_key, "min-width:768px");
    assert_eq!(cascade.entries[1].breakpoint_key, "min-width:1200px");
}

#[test]
fn test_effective_style_per_viewport() {
    let result = extract(&responsive_sheet());
    let cascade = result.cascade();

    let phone = cascade.effective_style(480.0);
    assert_eq!(phone.get("font-size"), Some(&"14px".to_string()));

    let tablet = cascade.effective_style(800.0);
    assert_eq!(tablet.get("font-size"), Some(&"16px".to_string()));

    let desktop = cascade.effective_style(1440.0);
    assert_eq!(desktop.get("font-size"), Some(&"18px".to_string()));

    // Untouched properties fall through from the base mapping
    assert_eq!(desktop.get("line-height"), Some(&"1.4".to_string()));
}

#[test]
fn test_max_width_override() {
    let mut b = TreeBuilder::new("/styles/compact.scss");
    b.open_rule(".label");
    b.declaration("letter-spacing", "0.02em", false);
    b.close();
    b.open_at_rule("media", "(max-width: 480px)");
    b.open_rule(".label");
    b.declaration("letter-spacing", "0", false);
    b.close();
    b.close();
    let sheet = b.build();

    let cascade = extract(&sheet).cascade();
    let narrow = cascade.effective_style(320.0);
    assert_eq!(narrow.get("letter-spacing"), Some(&"0".to_string()));
    let wide = cascade.effective_style(1024.0);
    assert_eq!(wide.get("letter-spacing"), Some(&"0.02em".to_string()));
}

#[test]
fn test_range_breakpoint_grouping() {
    let mut b = TreeBuilder::new("/styles/range.scss");
    b.open_at_rule("media", "(min-width: 768px) and (max-width: 1024px)");
    b.open_rule(".hero");
    b.declaration("font-size", "20px", false);
    b.close();
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].breakpoint_key(), "range:768px-1024px");

    let cascade = result.cascade();
    assert!(cascade
        .effective_style(900.0)
        .contains_key("font-size"));
    assert!(!cascade
        .effective_style(1440.0)
        .contains_key("font-size"));
}

#[test]
fn test_responsive_entries_resolve_variables() {
    let mut b = TreeBuilder::new("/styles/vars.scss");
    b.variable("$desktop-size", "18px");
    b.open_at_rule("media", "(min-width: 1024px)");
    b.open_rule("body");
    b.declaration("font-size", "$desktop-size", false);
    b.close();
    b.close();
    let sheet = b.build();

    let cascade = extract(&sheet).cascade();
    let style = cascade.effective_style(1280.0);
    assert_eq!(style.get("font-size"), Some(&"18px".to_string()));
}

#[test]
fn test_nested_media_uses_innermost_context() {
    let mut b = TreeBuilder::new("/styles/nested.scss");
    b.open_at_rule("media", "(min-width: 600px)");
    b.open_at_rule("media", "(min-width: 900px)");
    b.open_rule(".x");
    b.declaration("font-size", "17px", false);
    b.close();
    b.close();
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    let media = result.entries[0]
        .context
        .as_ref()
        .unwrap()
        .media_query
        .as_ref()
        .unwrap();
    assert_eq!(media.breakpoint.as_ref().unwrap().numeric, 900.0);
}
