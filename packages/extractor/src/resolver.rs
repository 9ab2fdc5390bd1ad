//! Variable and expression resolution.
//!
//! `$name` references resolve through the scope chain (current scope,
//! then global, then the imported table); `var(--name, fallback)` calls
//! resolve through the custom-property table. Resolution is recursive and
//! guarded by an explicit in-flight name set: re-encountering a name
//! before its resolution returns fails that one value instead of
//! recursing unboundedly.

use crate::calc;
use crate::entry::{ComputedValue, Confidence};
use crate::scope::{ScopeArena, GLOBAL_SCOPE};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOptions {
    /// Parse fully-resolved dimension values into numeric form
    pub resolve_to_computed: bool,
    /// On any failed lookup or cycle, return the original text untouched
    /// instead of a partial substitution
    pub preserve_original: bool,
    pub track_dependencies: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            resolve_to_computed: true,
            preserve_original: false,
            track_dependencies: true,
        }
    }
}

/// Everything one value resolution needs. Built once per pass; the
/// current scope index is the only field the pipeline mutates while
/// descending.
pub struct VariableResolutionContext<'a> {
    pub scopes: &'a ScopeArena,
    pub current_scope: usize,
    pub global_scope: usize,
    pub custom_properties: &'a HashMap<String, String>,
    pub imported: &'a HashMap<String, String>,
    pub options: ResolveOptions,
}

impl<'a> VariableResolutionContext<'a> {
    pub fn new(
        scopes: &'a ScopeArena,
        custom_properties: &'a HashMap<String, String>,
        imported: &'a HashMap<String, String>,
        options: ResolveOptions,
    ) -> Self {
        Self {
            scopes,
            current_scope: GLOBAL_SCOPE,
            global_scope: GLOBAL_SCOPE,
            custom_properties,
            imported,
            options,
        }
    }

    fn lookup_variable(&self, name: &str) -> Option<(&str, bool)> {
        // Scope chain first (current scope up to global), imported last
        if let Some(value) = self.scopes.lookup(self.current_scope, name) {
            return Some((value, false));
        }
        if let Some(value) = self.imported.get(name) {
            return Some((value.as_str(), true));
        }
        None
    }
}

/// Outcome of resolving one declaration value
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub resolved: String,
    pub confidence: Confidence,
    pub computed: Option<ComputedValue>,
    /// Variable names the value depends on, in occurrence order
    pub variables: Vec<String>,
    pub custom_properties: Vec<String>,
    /// Fallback values supplied in `var()` calls
    pub fallbacks: Vec<String>,
    /// Names that failed lookup
    pub unresolved: Vec<String>,
    /// Names re-encountered while already being resolved
    pub cycles: Vec<String>,
    pub used_imported: bool,
    pub has_variables: bool,
    pub has_functions: bool,
    /// Evaluator failure message, if any
    pub eval_error: Option<String>,
}

impl Resolution {
    fn identity(raw: &str) -> Self {
        Self {
            resolved: raw.to_string(),
            confidence: Confidence::Exact,
            computed: None,
            variables: Vec::new(),
            custom_properties: Vec::new(),
            fallbacks: Vec::new(),
            unresolved: Vec::new(),
            cycles: Vec::new(),
            used_imported: false,
            has_variables: false,
            has_functions: false,
            eval_error: None,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty() && self.cycles.is_empty()
    }
}

/// Substitution state threaded through one top-level resolution. The
/// in-flight set must not leak across calls.
struct SubstState {
    in_flight: HashSet<String>,
    variables: Vec<String>,
    custom_properties: Vec<String>,
    fallbacks: Vec<String>,
    unresolved: Vec<String>,
    cycles: Vec<String>,
    used_imported: bool,
}

/// Resolve one raw declaration value against the active context.
///
/// `evaluate_functions` gates expression evaluation; substitution is
/// always attempted (callers that disable it skip the resolver entirely).
pub fn resolve_value(
    raw: &str,
    ctx: &VariableResolutionContext,
    evaluate_functions: bool,
) -> Resolution {
    let has_variables = contains_variable_token(raw);
    let has_functions = calc::contains_function(raw);

    // Values with no variable or function token resolve to themselves
    if !has_variables && !has_functions {
        let mut resolution = Resolution::identity(raw);
        if ctx.options.resolve_to_computed {
            resolution.computed = calc::parse_dimension(raw)
                .map(|(value, unit)| ComputedValue::new(value, unit, Confidence::Exact));
        }
        return resolution;
    }

    let mut state = SubstState {
        in_flight: HashSet::new(),
        variables: Vec::new(),
        custom_properties: Vec::new(),
        fallbacks: Vec::new(),
        unresolved: Vec::new(),
        cycles: Vec::new(),
        used_imported: false,
    };

    let mut resolved = substitute(raw, ctx, &mut state);
    let clean = state.unresolved.is_empty() && state.cycles.is_empty();

    if !clean && ctx.options.preserve_original {
        resolved = raw.to_string();
    }

    let mut resolution = Resolution {
        resolved,
        confidence: if clean {
            Confidence::Exact
        } else {
            Confidence::Unknown
        },
        computed: None,
        variables: dedupe(state.variables),
        custom_properties: dedupe(state.custom_properties),
        fallbacks: state.fallbacks,
        unresolved: dedupe(state.unresolved),
        cycles: dedupe(state.cycles),
        used_imported: state.used_imported,
        has_variables,
        has_functions,
        eval_error: None,
    };

    if has_functions && evaluate_functions {
        if clean {
            match calc::evaluate_expression(&resolution.resolved) {
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
        }
        // Unresolved tokens inside the expression: evaluation cannot
        // succeed, confidence is already Unknown
    } else if clean && ctx.options.resolve_to_computed && !has_functions {
        resolution.computed = calc::parse_dimension(&resolution.resolved)
            .map(|(value, unit)| ComputedValue::new(value, unit, Confidence::Exact));
    }

    if !ctx.options.track_dependencies {
        resolution.variables.clear();
        resolution.custom_properties.clear();
    }

    resolution
}

fn contains_variable_token(text: &str) -> bool {
    text.contains('$') || find_var_call(text, 0).is_some()
}

fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(n.clone())).collect()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Locate the next `var(` call at or after `from`, at a word boundary
fn find_var_call(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut at = from;
    while let Some(rel) = text[at..].find("var(") {
        let pos = at + rel;
        let boundary_ok = pos == 0 || !is_name_char(bytes[pos - 1] as char);
        if boundary_ok {
            return Some(pos);
        }
        at = pos + 4;
    }
    None
}

fn substitute(text: &str, ctx: &VariableResolutionContext, state: &mut SubstState) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c == '$' {
            let name_start = i + 1;
            let mut end = name_start;
            while end < bytes.len() && is_name_char(bytes[end] as char) {
                end += 1;
            }
            if end == name_start {
                out.push('$');
                i += 1;
                continue;
            }
            let name = &text[i..end];
            substitute_variable(name, ctx, state, &mut out);
            i = end;
        } else if c == 'v' && find_var_call(text, i) == Some(i) {
            let body_start = i + 4;
            let Some(body_end) = calc::matching_paren(text, body_start - 1) else {
                // Unbalanced call; emit the rest verbatim
                out.push_str(&text[i..]);
                break;
            };
            substitute_var_call(&text[i..=body_end], &text[body_start..body_end], ctx, state, &mut out);
            i = body_end + 1;
        } else {
            let mut end = i + 1;
            while end < bytes.len() && !text.is_char_boundary(end) {
                end += 1;
            }
            out.push_str(&text[i..end]);
            i = end;
        }
    }

    out
}

fn substitute_variable(
    name: &str,
    ctx: &VariableResolutionContext,
    state: &mut SubstState,
    out: &mut String,
) {
    state.variables.push(name.to_string());

    if state.in_flight.contains(name) {
        state.cycles.push(name.to_string());
        out.push_str(name);
        return;
    }

    match ctx.lookup_variable(name) {
        Some((value, imported)) => {
            state.used_imported |= imported;
            let value = value.to_string();
            state.in_flight.insert(name.to_string());
            let substituted = substitute(&value, ctx, state);
            state.in_flight.remove(name);
            out.push_str(&substituted);
        }
        None => {
            state.unresolved.push(name.to_string());
            out.push_str(name);
        }
    }
}

fn substitute_var_call(
    full: &str,
    body: &str,
    ctx: &VariableResolutionContext,
    state: &mut SubstState,
    out: &mut String,
) {
    let parts = calc::split_top_level(body, ',');
    let Some(name) = parts.first().map(|p| p.trim()) else {
        out.push_str(full);
        return;
    };
    if !name.starts_with("--") {
        out.push_str(full);
        return;
    }
    let fallback = if parts.len() > 1 {
        // Everything after the first comma, fallbacks may contain commas
        body.find(',').map(|at| body[at + 1..].trim().to_string())
    } else {
        None
    };

    state.custom_properties.push(name.to_string());

    if state.in_flight.contains(name) {
        state.cycles.push(name.to_string());
        out.push_str(full);
        return;
    }

    match ctx.custom_properties.get(name) {
        Some(value) => {
            let value = value.clone();
            state.in_flight.insert(name.to_string());
            let substituted = substitute(&value, ctx, state);
            state.in_flight.remove(name);
            out.push_str(&substituted);
        }
        None => match fallback {
            // Fallback applies only when the name is undefined
            Some(fallback) => {
                state.fallbacks.push(fallback.clone());
                let substituted = substitute(&fallback, ctx, state);
                out.push_str(&substituted);
            }
            None => {
                state.unresolved.push(name.to_string());
                out.push_str(full);
            }
        },
    }
}
