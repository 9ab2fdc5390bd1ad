//! Property extraction pipeline.
//!
//! One depth-first pass per sheet. Rule nodes extend the enclosing
//! selector path, `@media` at-rules push a parsed context onto the media
//! stack, and every typography-relevant declaration is dispatched through
//! the extractor registry. Scope and media stacks follow strict
//! push-on-descent/pop-on-return discipline; nothing is shared across
//! concurrent passes.

use crate::aggregate::ExtractionResult;
use crate::calc;
use crate::entry::{
    entry_id, Confidence, ComputedValue, Dependencies, EntryContext, EntryMetadata,
    FontFaceDeclaration, TypographyEntry, ValueInfo,
};
use crate::error::{ExtractError, ExtractResult, Warning, WarningKind};
use crate::media::MediaQueryContext;
use crate::options::ExtractOptions;
use crate::properties::LogicalProperty;
use crate::registry::{ExtractorRegistry, PartialEntry};
use crate::resolver::{self, ResolveOptions, Resolution, VariableResolutionContext};
use crate::scope::ScopeModel;
use tracing::{debug, info, instrument, warn};
use typedrift_ast::{NodeId, NodeKind, Span, StyleSheet};

/// Typography extraction engine. Owns its options and registry so
/// concurrent extractors with different configurations never interfere.
pub struct TypographyExtractor {
    options: ExtractOptions,
    registry: ExtractorRegistry,
}

impl TypographyExtractor {
    pub fn new() -> Self {
        Self::with_options(ExtractOptions::default())
    }

    pub fn with_options(options: ExtractOptions) -> Self {
        Self {
            options,
            registry: ExtractorRegistry::with_defaults(),
        }
    }

    pub fn with_registry(options: ExtractOptions, registry: ExtractorRegistry) -> Self {
        Self { options, registry }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Run one extraction pass over a parsed sheet
    #[instrument(skip(self, sheet), fields(file = %sheet.path, nodes = sheet.len()))]
    pub fn extract(&self, sheet: &StyleSheet) -> ExtractResult<ExtractionResult> {
        info!("Starting typography extraction");

        if sheet.is_empty() || !sheet.has_valid_root() {
            return Err(ExtractError::invalid_tree(format!(
                "sheet {} has no readable root node",
                sheet.path
            )));
        }

        let scope_model = ScopeModel::build(sheet);
        let resolve_options = ResolveOptions {
            resolve_to_computed: self.options.compute_values,
            preserve_original: false,
            track_dependencies: true,
        };
        let resolution = VariableResolutionContext::new(
            &scope_model.scopes,
            &scope_model.custom_properties,
            &self.options.imported_variables,
            resolve_options,
        );

        let mut pass = Pass {
            sheet,
            options: &self.options,
            registry: &self.registry,
            scope_model: &scope_model,
            resolution,
            selector_stack: Vec::new(),
            media_stack: Vec::new(),
            media_order: 0,
            mixin_stack: vec![Vec::new()],
            entries: Vec::new(),
            font_faces: Vec::new(),
            warnings: Vec::new(),
        };
        pass.walk(sheet.root());

        let mut custom_properties = scope_model.custom_property_defs.clone();
        if self.options.resolve_variables {
            let ctx = VariableResolutionContext::new(
                &scope_model.scopes,
                &scope_model.custom_properties,
                &self.options.imported_variables,
                ResolveOptions::default(),
            );
            for definition in &mut custom_properties {
                let resolved =
                    resolver::resolve_value(&definition.value, &ctx, self.options.evaluate_functions);
                definition.resolved = Some(resolved.resolved);
            }
        }

        let mut result = ExtractionResult {
            entries: pass.entries,
            font_faces: pass.font_faces,
            custom_properties,
            warnings: pass.warnings,
            ..Default::default()
        };
        result.rebuild_indexes();

        // Verbosity trimming happens after the groupings are built so it
        // never changes resolved values or buckets
        if !self.options.include_context {
            for entry in &mut result.entries {
                entry.context = None;
            }
        }
        if !self.options.include_metadata {
            for entry in &mut result.entries {
                entry.metadata = None;
            }
        }

        info!(
            entries = result.entries.len(),
            font_faces = result.font_faces.len(),
            warnings = result.warnings.len(),
            "Typography extraction complete"
        );
        Ok(result)
    }

    /// Extract a batch of independent sheets and merge the results.
    /// Sheets share no mutable state; hosts may fan passes out one
    /// worker per tree and merge in any order.
    #[instrument(skip_all, fields(sheets = sheets.len()))]
    pub fn extract_all(&self, sheets: &[StyleSheet]) -> ExtractResult<ExtractionResult> {
        let mut merged = ExtractionResult::default();
        for sheet in sheets {
            merged.merge(self.extract(sheet)?);
        }
        Ok(merged)
    }
}

impl Default for TypographyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Mutable state of one pass; discarded when the pass ends
struct Pass<'a> {
    sheet: &'a StyleSheet,
    options: &'a ExtractOptions,
    registry: &'a ExtractorRegistry,
    scope_model: &'a ScopeModel,
    resolution: VariableResolutionContext<'a>,
    selector_stack: Vec<String>,
    media_stack: Vec<MediaQueryContext>,
    media_order: usize,
    /// One frame per rule nesting level; `@include` names recorded as
    /// dependencies, never expanded
    mixin_stack: Vec<Vec<String>>,
    entries: Vec<TypographyEntry>,
    font_faces: Vec<FontFaceDeclaration>,
    warnings: Vec<Warning>,
}

impl Pass<'_> {
    fn walk(&mut self, id: NodeId) {
        let Some(node) = self.sheet.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Root | NodeKind::Other { .. } => self.walk_children(id),
            NodeKind::Comment { .. } => {}
            // Variables were collected by the scope pre-pass
            NodeKind::Variable { .. } => {}
            NodeKind::Rule { selector } => self.rule(id, selector),
            NodeKind::AtRule { name, params } => self.at_rule(id, name, params),
            NodeKind::Declaration {
                property,
                value,
                important,
            } => self.declaration(id, property, value, *important),
        }
    }

    fn walk_children(&mut self, id: NodeId) {
        for &child in self.sheet.children(id) {
            self.walk(child);
        }
    }

    fn rule(&mut self, id: NodeId, selector: &str) {
        if selector.trim().is_empty() {
            self.warn_node(id, WarningKind::AstError, "rule with empty selector");
            return;
        }
        self.selector_stack.push(selector.to_string());
        let outer_scope = self.resolution.current_scope;
        self.resolution.current_scope = self.scope_model.scope_of(id);
        self.mixin_stack.push(Vec::new());

        self.walk_children(id);

        self.mixin_stack.pop();
        self.resolution.current_scope = outer_scope;
        self.selector_stack.pop();
    }

    fn at_rule(&mut self, id: NodeId, name: &str, params: &str) {
        match name.trim() {
            "" => self.warn_node(id, WarningKind::AstError, "at-rule with empty name"),
            "media" => {
                if params.trim().is_empty() {
                    self.warn_node(id, WarningKind::ParseError, "media at-rule without condition");
                    return;
                }
                let context = MediaQueryContext::parse(params, self.media_order);
                self.media_order += 1;
                debug!(condition = %params, breakpoint = %context.breakpoint_key(), "Entering media query");
                self.media_stack.push(context);
                self.walk_children(id);
                self.media_stack.pop();
            }
            "font-face" => self.font_face(id),
            "include" => {
                let mixin = first_token(params);
                if !mixin.is_empty() {
                    if let Some(frame) = self.mixin_stack.last_mut() {
                        frame.push(mixin);
                    }
                }
            }
            // Import paths were collected by the scope pre-pass
            "import" | "use" | "forward" => {}
            "mixin" | "function" => {
                // Bodies are walked for their declarations; the synthetic
                // selector segment keeps entries attributable
                let decl_name = first_token(params);
                self.selector_stack.push(format!("@{} {}", name, decl_name));
                let outer_scope = self.resolution.current_scope;
                self.resolution.current_scope = self.scope_model.scope_of(id);
                self.mixin_stack.push(Vec::new());

                self.walk_children(id);

                self.mixin_stack.pop();
                self.resolution.current_scope = outer_scope;
                self.selector_stack.pop();
            }
            // `supports`, `layer`, anything unrecognized: descend
            // transparently
            _ => self.walk_children(id),
        }
    }

    fn declaration(&mut self, id: NodeId, property: &str, value: &str, important: bool) {
        if property.trim().is_empty() || value.trim().is_empty() {
            self.warn_node(id, WarningKind::AstError, "declaration with empty property or value");
            return;
        }
        let Some(logical) = LogicalProperty::from_name(property.trim()) else {
            return;
        };
        if !self.options.allows_property(&logical) {
            return;
        }
        let joined_path = self.selector_stack.join(" ");
        if !self.options.allows_selector(&joined_path) {
            return;
        }

        let resolution = self.resolve(value);
        self.record_resolution_warnings(id, &resolution);

        let extractor = self.registry.get(&logical);
        let outcome = extractor.extract(&logical, resolution.resolved.trim(), &self.resolution);
        if let Some(message) = &outcome.warning {
            self.warn_node(id, WarningKind::InvalidPropertyValue, message.clone());
        }

        let selector = self.selector_stack.last().cloned().unwrap_or_default();
        let specificity = specificity_of_selector(&joined_path);
        let shorthand_id = if logical.is_shorthand() {
            Some(entry_id(&selector, logical.name(), value.trim()))
        } else {
            None
        };

        for partial in outcome.partials {
            self.emit(id, &selector, partial, value, important, &resolution, specificity, &shorthand_id);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &mut self,
        id: NodeId,
        selector: &str,
        partial: PartialEntry,
        raw: &str,
        important: bool,
        resolution: &Resolution,
        specificity: u32,
        shorthand_id: &Option<String>,
    ) {
        let extractor = self.registry.get(&partial.property);
        if !extractor.validate(&partial.value) {
            self.warn_node(
                id,
                WarningKind::InvalidPropertyValue,
                format!(
                    "invalid value for {}: {}",
                    partial.property.name(),
                    partial.value
                ),
            );
        }
        let normalized = extractor.normalize(&partial.value);

        let original = if partial.from_shorthand {
            partial.value.trim().to_string()
        } else {
            raw.trim().to_string()
        };

        let computed = if partial.from_shorthand {
            if self.options.compute_values {
                calc::parse_dimension(&normalized)
                    .map(|(value, unit)| ComputedValue::new(value, unit, resolution.confidence))
            } else {
                None
            }
        } else {
            resolution.computed.clone()
        };

        let entry = TypographyEntry {
            id: entry_id(selector, partial.property.name(), &original),
            selector: selector.to_string(),
            property: partial.property.clone(),
            value: ValueInfo {
                original,
                resolved: normalized,
                confidence: resolution.confidence,
                computed,
                fallbacks: if partial.from_shorthand {
                    Vec::new()
                } else {
                    resolution.fallbacks.clone()
                },
            },
            context: Some(EntryContext {
                file: self.sheet.path.clone(),
                span: self.node_span(id),
                specificity,
                media_query: self.media_stack.last().cloned(),
                selector_path: self.selector_stack.clone(),
            }),
            dependencies: Dependencies {
                variables: resolution.variables.clone(),
                mixins: self.mixin_stack.iter().flatten().cloned().collect(),
                imports: if resolution.used_imported || !resolution.unresolved.is_empty() {
                    self.scope_model.imports.clone()
                } else {
                    Vec::new()
                },
                custom_properties: resolution.custom_properties.clone(),
            },
            metadata: Some(EntryMetadata {
                is_responsive: !self.media_stack.is_empty(),
                has_variables: resolution.has_variables,
                has_functions: resolution.has_functions,
                is_inherited: partial.property.inherits(),
                is_shorthand: partial.from_shorthand || partial.property.is_shorthand(),
                shorthand_source: if partial.from_shorthand {
                    shorthand_id.clone()
                } else {
                    None
                },
                is_important: important,
            }),
        };

        debug!(
            selector = %entry.selector,
            property = %entry.property,
            resolved = %entry.value.resolved,
            "Extracted typography entry"
        );
        self.entries.push(entry);
    }

    /// Collect one `@font-face` block; blocks missing `font-family` or
    /// `src` are dropped whole, never partially emitted
    fn font_face(&mut self, id: NodeId) {
        let mut family = None;
        let mut src = None;
        let mut weight = None;
        let mut style = None;
        let mut display = None;
        let mut unicode_range = None;

        for &child in self.sheet.children(id) {
            let Some(node) = self.sheet.node(child) else {
                continue;
            };
            let NodeKind::Declaration {
                property, value, ..
            } = &node.kind
            else {
                continue;
            };
            match property.as_str() {
                "font-family" => family = Some(self.resolve(value).resolved),
                "src" => src = Some(value.trim().to_string()),
                "font-weight" => weight = Some(self.resolve(value).resolved),
                "font-style" => style = Some(self.resolve(value).resolved),
                "font-display" => display = Some(value.trim().to_string()),
                "unicode-range" => unicode_range = Some(value.trim().to_string()),
                _ => {}
            }
        }

        match (family, src) {
            (Some(family), Some(src)) => {
                debug!(family = %family, "Collected font-face");
                self.font_faces.push(FontFaceDeclaration {
                    family,
                    src,
                    weight,
                    style,
                    display,
                    unicode_range,
                    file: self.sheet.path.clone(),
                    span: self.node_span(id),
                });
            }
            _ => {
                warn!("Dropping font-face missing font-family or src");
                self.warnings.push(
                    Warning::new(
                        WarningKind::MalformedFontFace,
                        "font-face missing required font-family or src",
                        &self.sheet.path,
                    )
                    .with_span(self.node_span(id))
                    .unrecovered(),
                );
            }
        }
    }

    fn resolve(&self, raw: &str) -> Resolution {
        if self.options.resolve_variables {
            resolver::resolve_value(raw, &self.resolution, self.options.evaluate_functions)
        } else {
            passthrough_resolution(raw, self.options.evaluate_functions, self.options.compute_values)
        }
    }

    fn record_resolution_warnings(&mut self, id: NodeId, resolution: &Resolution) {
        for name in &resolution.unresolved {
            warn!(name = %name, "Variable not found");
            let warning = Warning::new(
                WarningKind::VariableNotFound,
                format!("{} could not be resolved", name),
                &self.sheet.path,
            )
            .with_span(self.node_span(id));
            self.warnings.push(warning);
        }
        for name in &resolution.cycles {
            warn!(name = %name, "Circular variable reference");
            let warning = Warning::new(
                WarningKind::CircularDependency,
                format!("{} participates in a reference cycle", name),
                &self.sheet.path,
            )
            .with_span(self.node_span(id));
            self.warnings.push(warning);
        }
        if let Some(message) = &resolution.eval_error {
            warn!(error = %message, "Expression evaluation failed");
            let warning = Warning::new(
                WarningKind::FunctionEvaluationError,
                message.clone(),
                &self.sheet.path,
            )
            .with_span(self.node_span(id));
            self.warnings.push(warning);
        }
    }

    fn warn_node(&mut self, id: NodeId, kind: WarningKind, message: impl Into<String>) {
        let warning = Warning::new(kind, message, &self.sheet.path).with_span(self.node_span(id));
        self.warnings.push(warning);
    }

    fn node_span(&self, id: NodeId) -> Span {
        self.sheet
            .node(id)
            .map(|n| n.span.clone())
            .unwrap_or_else(|| Span::new(0, 0, 0, 0, String::new()))
    }
}

/// Resolution stand-in when variable resolution is disabled: the value
/// passes through untouched, function expressions may still evaluate
fn passthrough_resolution(raw: &str, evaluate_functions: bool, compute_values: bool) -> Resolution {
    let has_variables = raw.contains('$') || raw.contains("var(");
    let has_functions = calc::contains_function(raw);

    let mut resolution = Resolution {
        resolved: raw.to_string(),
        confidence: if has_variables {
            Confidence::Unknown
        } else {
            Confidence::Exact
        },
        computed: None,
        variables: Vec::new(),
        custom_properties: Vec::new(),
        fallbacks: Vec::new(),
        unresolved: Vec::new(),
        cycles: Vec::new(),
        used_imported: false,
        has_variables,
        has_functions,
        eval_error: None,
    };

    if has_functions && evaluate_functions && !has_variables {
        match calc::evaluate_expression(raw) {
            Ok(computed) => {
                resolution.confidence = computed.confidence;
                resolution.computed = Some(computed);
            }
            Err(err) => {
                resolution.eval_error = Some(err.to_string());
                resolution.confidence = Confidence::Unknown;
                resolution.computed = Some(ComputedValue::unknown());
            }
        }
    } else if !has_variables && !has_functions && compute_values {
        resolution.computed = calc::parse_dimension(raw)
            .map(|(value, unit)| ComputedValue::new(value, unit, Confidence::Exact));
    }

    resolution
}

fn first_token(params: &str) -> String {
    params
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Coarse specificity: ids x100, classes x10, element-name characters x1.
/// Ranks entries relative to each other; not a faithful cascade.
fn specificity_of_selector(selector: &str) -> u32 {
    let mut score = 0u32;
    let mut chars = selector.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '#' => {
                score += 100;
                consume_name(&mut chars);
            }
            '.' => {
                score += 10;
                consume_name(&mut chars);
            }
            ':' => {
                // Pseudo-classes and pseudo-elements are not counted
                while chars.peek() == Some(&':') {
                    chars.next();
                }
                consume_name(&mut chars);
                if chars.peek() == Some(&'(') {
                    let mut depth = 0i32;
                    for c in chars.by_ref() {
                        match c {
                            '(' => depth += 1,
                            ')' => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
            '[' => {
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                }
            }
            c if c.is_ascii_alphabetic() => {
                let mut len = 1u32;
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '-' || next == '_' {
                        chars.next();
                        len += 1;
                    } else {
                        break;
                    }
                }
                score += len;
            }
            _ => {}
        }
    }
    score
}

fn consume_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(&next) = chars.peek() {
        if next.is_ascii_alphanumeric() || next == '-' || next == '_' {
            chars.next();
        } else {
            break;
        }
    }
}
