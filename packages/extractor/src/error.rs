use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use typedrift_ast::Span;

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Fatal extraction errors. Everything recoverable is a [`Warning`]
/// collected on the pass instead.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid stylesheet tree: {message}")]
    InvalidTree { message: String },
}

impl ExtractError {
    pub fn invalid_tree(message: impl Into<String>) -> Self {
        Self::InvalidTree {
            message: message.into(),
        }
    }
}

/// Warning taxonomy. All kinds are local to one node or one value; none
/// aborts traversal of siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    ParseError,
    AstError,
    InvalidPropertyValue,
    VariableNotFound,
    CircularDependency,
    FunctionEvaluationError,
    MalformedFontFace,
}

/// One recoverable problem recorded during a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Whether a best-effort entry was still emitted
    pub recovered: bool,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: file.into(),
            span: None,
            recovered: true,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn unrecovered(mut self) -> Self {
        self.recovered = false;
        self
    }
}

/// Aggregated warning counters, exposed so the host tool can decide
/// whether to fail a build or merely flag drift risk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningStats {
    pub total: usize,
    pub recovered: usize,
    pub unrecovered: usize,
    pub by_kind: HashMap<WarningKind, usize>,
    pub by_file: HashMap<String, usize>,
}

impl WarningStats {
    pub fn from_warnings(warnings: &[Warning]) -> Self {
        let mut stats = Self::default();
        for warning in warnings {
            stats.total += 1;
            if warning.recovered {
                stats.recovered += 1;
            } else {
                stats.unrecovered += 1;
            }
            *stats.by_kind.entry(warning.kind).or_insert(0) += 1;
            *stats.by_file.entry(warning.file.clone()).or_insert(0) += 1;
        }
        stats
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}
