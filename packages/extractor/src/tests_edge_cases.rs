/// Error taxonomy and recovery: every failure is local to one node or
/// one value, siblings always continue
use crate::*;
use typedrift_ast::{StyleSheet, TreeBuilder};

fn extract(sheet: &StyleSheet) -> ExtractionResult {
    TypographyExtractor::new().extract(sheet).unwrap()
}

#[test]
fn test_unreadable_root_is_fatal() {
    // A sheet whose root index does not address a root node is the only
    // fatal input
    let json = r#"{
        "path": "/broken.scss",
        "nodes": [
            {
                "kind": {"type": "declaration", "property": "font-size", "value": "16px", "important": false},
                "span": {"start": 0, "end": 0, "line": 0, "column": 0, "id": "x-1"},
                "children": [],
                "parent": null
            }
        ],
        "root": 0
    }"#;
    let sheet: StyleSheet = serde_json::from_str(json).unwrap();
    let result = TypographyExtractor::new().extract(&sheet);
    assert!(matches!(result, Err(ExtractError::InvalidTree { .. })));
}

#[test]
fn test_root_index_out_of_bounds_is_fatal() {
    let json = r#"{
        "path": "/broken.scss",
        "nodes": [],
        "root": 7
    }"#;
    let sheet: StyleSheet = serde_json::from_str(json).unwrap();
    assert!(TypographyExtractor::new().extract(&sheet).is_err());
}

#[test]
fn test_empty_selector_skips_subtree_not_siblings() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.open_rule("   ");
    b.declaration("font-size", "99px", false);
    b.close();
    b.open_rule(".ok");
    b.declaration("font-size", "16px", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].selector, ".ok");
    assert_eq!(result.warning_stats().count(WarningKind::AstError), 1);
}

#[test]
fn test_empty_declaration_value_warns() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.open_rule(".x");
    b.declaration("font-size", "   ", false);
    b.declaration("line-height", "1.5", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].property, LogicalProperty::LineHeight);
    assert_eq!(result.warning_stats().count(WarningKind::AstError), 1);
}

#[test]
fn test_font_face_collected() {
    let mut b = TreeBuilder::new("/styles/fonts.scss");
    b.open_at_rule("font-face", "");
    b.declaration("font-family", "\"Inter\"", false);
    b.declaration("src", "url(/fonts/inter.woff2) format(\"woff2\")", false);
    b.declaration("font-weight", "400", false);
    b.declaration("font-display", "swap", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.font_faces.len(), 1);
    let face = &result.font_faces[0];
    assert_eq!(face.family, "\"Inter\"");
    assert_eq!(face.src, "url(/fonts/inter.woff2) format(\"woff2\")");
    assert_eq!(face.weight.as_deref(), Some("400"));
    assert_eq!(face.display.as_deref(), Some("swap"));
    assert_eq!(result.summary.font_face_count, 1);
    // Declarations inside the block are not regular entries
    assert!(result.entries.is_empty());
}

#[test]
fn test_malformed_font_face_dropped_whole() {
    let mut b = TreeBuilder::new("/styles/fonts.scss");
    b.open_at_rule("font-face", "");
    b.declaration("font-family", "\"Ghost\"", false);
    // no src
    b.close();
    b.open_at_rule("font-face", "");
    b.declaration("font-family", "\"Inter\"", false);
    b.declaration("src", "url(/fonts/inter.woff2)", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.font_faces.len(), 1);
    assert_eq!(result.font_faces[0].family, "\"Inter\"");

    let stats = result.warning_stats();
    assert_eq!(stats.count(WarningKind::MalformedFontFace), 1);
    assert_eq!(stats.unrecovered, 1);
}

#[test]
fn test_font_face_family_resolves_variables() {
    let mut b = TreeBuilder::new("/styles/fonts.scss");
    b.variable("$brand-font", "\"Inter\"");
    b.open_at_rule("font-face", "");
    b.declaration("font-family", "$brand-font", false);
    b.declaration("src", "url(/fonts/inter.woff2)", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.font_faces[0].family, "\"Inter\"");
}

#[test]
fn test_media_without_condition_skipped() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.open_at_rule("media", "  ");
    b.open_rule(".hidden");
    b.declaration("font-size", "10px", false);
    b.close();
    b.close();
    b.open_rule(".ok");
    b.declaration("font-size", "16px", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].selector, ".ok");
    assert_eq!(result.warning_stats().count(WarningKind::ParseError), 1);
}

#[test]
fn test_unknown_at_rules_descend_transparently() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.open_at_rule("supports", "(display: grid)");
    b.open_rule(".grid");
    b.declaration("font-size", "15px", false);
    b.close();
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    // No media context from non-media at-rules
    assert!(result.entries[0]
        .context
        .as_ref()
        .unwrap()
        .media_query
        .is_none());
}

#[test]
fn test_unrecognized_node_tags_are_transparent() {
    let mut b = TreeBuilder::new("/styles/x.scss");
    b.open_other("fragment");
    b.open_rule(".x");
    b.declaration("font-size", "16px", false);
    b.close();
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
}

#[test]
fn test_mixin_body_entries_are_attributable() {
    let mut b = TreeBuilder::new("/styles/mixins.scss");
    b.open_at_rule("mixin", "heading($size)");
    b.declaration("font-weight", "700", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].selector, "@mixin heading");
}

#[test]
fn test_default_and_global_variable_flags() {
    let mut b = TreeBuilder::new("/styles/vars.scss");
    b.variable("$size", "16px");
    b.variable_with_flags("$size", "99px", true, false); // !default loses
    b.open_rule(".x");
    b.variable_with_flags("$escaped", "2px", false, true); // !global
    b.declaration("font-size", "$size", false);
    b.close();
    b.open_rule(".y");
    b.declaration("letter-spacing", "$escaped", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    let size = result
        .entries
        .iter()
        .find(|e| e.property == LogicalProperty::FontSize)
        .unwrap();
    assert_eq!(size.value.resolved, "16px");

    let spacing = result
        .entries
        .iter()
        .find(|e| e.property == LogicalProperty::LetterSpacing)
        .unwrap();
    assert_eq!(spacing.value.resolved, "2px");
}

#[test]
fn test_clamp_and_min_max_through_pipeline() {
    let mut b = TreeBuilder::new("/styles/fluid.scss");
    b.open_rule(".fluid");
    b.declaration("font-size", "clamp(1rem, 2vw, 2rem)", false);
    b.declaration("line-height", "max(1.2, 1.5)", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    let size = result
        .entries
        .iter()
        .find(|e| e.property == LogicalProperty::FontSize)
        .unwrap();
    let computed = size.value.computed.as_ref().unwrap();
    assert_eq!(computed.value, 2.0);
    assert_eq!(computed.unit, "vw");
    assert_eq!(computed.confidence, Confidence::Approximate);

    let leading = result
        .entries
        .iter()
        .find(|e| e.property == LogicalProperty::LineHeight)
        .unwrap();
    assert_eq!(leading.value.computed.as_ref().unwrap().value, 1.5);
}

#[test]
fn test_unparseable_font_shorthand_recovers() {
    let mut b = TreeBuilder::new("/styles/odd.scss");
    b.open_rule(".odd");
    b.declaration("font", "bold italic", false);
    b.close();
    let sheet = b.build();

    let result = extract(&sheet);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].property, LogicalProperty::Font);
    assert_eq!(result.entries[0].value.resolved, "bold italic");
    assert!(result.warning_stats().count(WarningKind::InvalidPropertyValue) >= 1);
}
