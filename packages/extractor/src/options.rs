use crate::properties::LogicalProperty;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Engine configuration for one or more extraction passes.
///
/// `include_context` and `include_metadata` control payload verbosity
/// only; they never change resolved values. `parallel` and
/// `cache_results` are advisory to the host (the engine embeds no
/// executor and holds no cache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractOptions {
    pub resolve_variables: bool,
    pub evaluate_functions: bool,
    pub compute_values: bool,
    /// Restrict extraction to these logical properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<LogicalProperty>>,
    /// Substring filter on the authored selector path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector_filter: Option<String>,
    pub parallel: bool,
    pub cache_results: bool,
    pub include_context: bool,
    pub include_metadata: bool,
    /// Host-supplied cross-file variables; import graphs are resolved
    /// upstream
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub imported_variables: HashMap<String, String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            resolve_variables: true,
            evaluate_functions: true,
            compute_values: true,
            properties: None,
            selector_filter: None,
            parallel: false,
            cache_results: false,
            include_context: true,
            include_metadata: true,
            imported_variables: HashMap::new(),
        }
    }
}

impl ExtractOptions {
    pub fn allows_property(&self, property: &LogicalProperty) -> bool {
        match &self.properties {
            Some(allowed) => allowed.contains(property),
            None => true,
        }
    }

    pub fn allows_selector(&self, selector: &str) -> bool {
        match &self.selector_filter {
            Some(filter) => selector.contains(filter.as_str()),
            None => true,
        }
    }
}
