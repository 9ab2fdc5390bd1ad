//! Scope chain construction.
//!
//! One pre-pass over the tree builds the global variable table, the global
//! custom-property table, and the scope-chain skeleton the resolver walks.
//! Scopes live for one pass and are discarded with it; cross-file
//! persistence is the caller's concern.

use crate::entry::CustomPropertyDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use typedrift_ast::{self as ast, NodeId, StyleSheet, Visitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Global,
    Block,
    Mixin,
    Function,
}

/// One node in the scope chain
#[derive(Debug, Clone)]
pub struct ScopeContext {
    pub kind: ScopeKind,
    /// Owning selector for block scopes, declaration name for mixin and
    /// function scopes
    pub selector: Option<String>,
    vars: HashMap<String, String>,
    pub parent: Option<usize>,
}

impl ScopeContext {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Flat arena of scopes, parent-linked by index. Index 0 is the global
/// scope.
#[derive(Debug, Clone)]
pub struct ScopeArena {
    scopes: Vec<ScopeContext>,
}

pub const GLOBAL_SCOPE: usize = 0;

impl ScopeArena {
    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeContext {
                kind: ScopeKind::Global,
                selector: None,
                vars: HashMap::new(),
                parent: None,
            }],
        }
    }

    pub fn push(&mut self, kind: ScopeKind, selector: Option<String>, parent: usize) -> usize {
        self.scopes.push(ScopeContext {
            kind,
            selector,
            vars: HashMap::new(),
            parent: Some(parent),
        });
        self.scopes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ScopeContext> {
        self.scopes.get(index)
    }

    pub fn define(&mut self, scope: usize, name: &str, value: &str) {
        if let Some(ctx) = self.scopes.get_mut(scope) {
            ctx.vars.insert(name.to_string(), value.to_string());
        }
    }

    /// `!default` semantics: only define when the name is still unbound in
    /// this scope
    pub fn define_default(&mut self, scope: usize, name: &str, value: &str) {
        if let Some(ctx) = self.scopes.get_mut(scope) {
            ctx.vars
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    /// Walk the chain from `from` towards the global scope; first hit wins
    pub fn lookup(&self, from: usize, name: &str) -> Option<&str> {
        let mut current = Some(from);
        while let Some(index) = current {
            let ctx = self.scopes.get(index)?;
            if let Some(value) = ctx.get(name) {
                return Some(value);
            }
            current = ctx.parent;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the scope pre-pass produces for one sheet
#[derive(Debug, Clone)]
pub struct ScopeModel {
    pub scopes: ScopeArena,
    node_scopes: HashMap<NodeId, usize>,
    /// Global custom-property table; last definition in document order wins
    pub custom_properties: HashMap<String, String>,
    /// Every `--name` definition site, in document order
    pub custom_property_defs: Vec<CustomPropertyDefinition>,
    /// Import paths in document order
    pub imports: Vec<String>,
}

impl ScopeModel {
    /// Single pass over the sheet building all tables
    pub fn build(sheet: &StyleSheet) -> Self {
        let mut builder = ScopeBuilder {
            sheet,
            scopes: ScopeArena::new(),
            node_scopes: HashMap::new(),
            custom_properties: HashMap::new(),
            custom_property_defs: Vec::new(),
            imports: Vec::new(),
            stack: vec![GLOBAL_SCOPE],
        };
        ast::walk(&mut builder, sheet);

        ScopeModel {
            scopes: builder.scopes,
            node_scopes: builder.node_scopes,
            custom_properties: builder.custom_properties,
            custom_property_defs: builder.custom_property_defs,
            imports: builder.imports,
        }
    }

    /// Scope owning a container node; nodes outside any rule resolve to
    /// the global scope
    pub fn scope_of(&self, node: NodeId) -> usize {
        self.node_scopes.get(&node).copied().unwrap_or(GLOBAL_SCOPE)
    }
}

struct ScopeBuilder<'a> {
    sheet: &'a StyleSheet,
    scopes: ScopeArena,
    node_scopes: HashMap<NodeId, usize>,
    custom_properties: HashMap<String, String>,
    custom_property_defs: Vec<CustomPropertyDefinition>,
    imports: Vec<String>,
    stack: Vec<usize>,
}

impl ScopeBuilder<'_> {
    fn current(&self) -> usize {
        *self.stack.last().unwrap_or(&GLOBAL_SCOPE)
    }

    /// Innermost enclosing scope that carries a selector
    fn enclosing_selector(&self) -> Option<String> {
        let mut current = Some(self.current());
        while let Some(index) = current {
            let ctx = self.scopes.get(index)?;
            if let Some(selector) = &ctx.selector {
                return Some(selector.clone());
            }
            current = ctx.parent;
        }
        None
    }
}

impl Visitor for ScopeBuilder<'_> {
    fn visit_rule(&mut self, sheet: &StyleSheet, id: NodeId, selector: &str) {
        let scope = self
            .scopes
            .push(ScopeKind::Block, Some(selector.to_string()), self.current());
        self.node_scopes.insert(id, scope);
        self.stack.push(scope);
        ast::walk_children(self, sheet, id);
        self.stack.pop();
    }

    fn visit_at_rule(&mut self, sheet: &StyleSheet, id: NodeId, name: &str, params: &str) {
        match name {
            "mixin" | "function" => {
                let kind = if name == "mixin" {
                    ScopeKind::Mixin
                } else {
                    ScopeKind::Function
                };
                // Declaration name is the first token of the params,
                // stripped of its argument list
                let decl_name = params
                    .split(|c: char| c == '(' || c.is_whitespace())
                    .next()
                    .unwrap_or("")
                    .to_string();
                let scope = self.scopes.push(kind, Some(decl_name), self.current());
                self.node_scopes.insert(id, scope);
                self.stack.push(scope);
                ast::walk_children(self, sheet, id);
                self.stack.pop();
            }
            "import" | "use" | "forward" => {
                for part in params.split(',') {
                    let path = strip_import_path(part);
                    if !path.is_empty() {
                        self.imports.push(path);
                    }
                }
            }
            _ => {
                ast::walk_children(self, sheet, id);
            }
        }
    }

    fn visit_variable(
        &mut self,
        _sheet: &StyleSheet,
        _id: NodeId,
        name: &str,
        value: &str,
        is_default: bool,
        is_global: bool,
    ) {
        let scope = if is_global { GLOBAL_SCOPE } else { self.current() };
        if is_default {
            self.scopes.define_default(scope, name, value);
        } else {
            self.scopes.define(scope, name, value);
        }
    }

    fn visit_declaration(
        &mut self,
        sheet: &StyleSheet,
        id: NodeId,
        property: &str,
        value: &str,
        _important: bool,
    ) {
        if property.starts_with("--") {
            self.custom_properties
                .insert(property.to_string(), value.to_string());
            let span = sheet.node(id).map(|n| n.span.clone());
            let selector = self.enclosing_selector();
            if let Some(span) = span {
                self.custom_property_defs.push(CustomPropertyDefinition {
                    name: property.to_string(),
                    value: value.to_string(),
                    resolved: None,
                    selector,
                    file: self.sheet.path.clone(),
                    span,
                });
            }
        }
    }
}

/// `@import` params carry quotes and occasionally `url(...)` wrappers
fn strip_import_path(raw: &str) -> String {
    let mut path = raw.trim();
    if let Some(inner) = path.strip_prefix("url(").and_then(|p| p.strip_suffix(')')) {
        path = inner.trim();
    }
    path.trim_matches(|c| c == '"' || c == '\'').to_string()
}
