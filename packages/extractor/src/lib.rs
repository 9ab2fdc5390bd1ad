pub mod aggregate;
pub mod calc;
pub mod entry;
pub mod error;
pub mod media;
pub mod options;
pub mod pipeline;
pub mod properties;
pub mod registry;
pub mod resolver;
pub mod scope;
pub mod shorthand;

#[cfg(test)]
mod tests_pipeline;

#[cfg(test)]
mod tests_cascade;

#[cfg(test)]
mod tests_edge_cases;

#[cfg(test)]
mod tests_integration;

pub use aggregate::{ExtractionResult, ExtractionSummary};
pub use calc::{CalcAst, CalcError, CalcOp, CalcResult};
pub use entry::{
    entry_id, ComputedValue, Confidence, CustomPropertyDefinition, Dependencies, EntryContext,
    EntryMetadata, FontFaceDeclaration, TypographyEntry, ValueInfo,
};
pub use error::{ExtractError, ExtractResult, Warning, WarningKind, WarningStats};
pub use media::{Breakpoint, BreakpointKind, Cascade, CascadeEntry, MediaCondition, MediaQueryContext};
pub use options::ExtractOptions;
pub use pipeline::TypographyExtractor;
pub use properties::{LogicalProperty, LOGICAL_PROPERTIES};
pub use registry::{ExtractOutcome, ExtractorRegistry, PartialEntry, PropertyExtractor};
pub use resolver::{resolve_value, ResolveOptions, Resolution, VariableResolutionContext};
pub use scope::{ScopeArena, ScopeContext, ScopeKind, ScopeModel, GLOBAL_SCOPE};
pub use shorthand::{decompose_font, FontDecomposition};
