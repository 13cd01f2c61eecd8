//! Error types for module resolution and analysis.

use sedge_qmltypes::CatalogueError;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Error resolving an import name to a parsed module.
///
/// Resolution results are memoised, errors included, so these are shared
/// behind `Arc` once they enter a cache or an import record.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("plugins.qmltypes not found in any of the candidate paths")]
    QmlTypesNotFound,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse qmltypes file at {path}: {source}")]
    Catalogue {
        path: String,
        #[source]
        source: CatalogueError,
    },

    #[error("{tool} failed: {message}")]
    Subprocess { tool: String, message: String },

    #[error(
        "failed to resolve import to a file, and qmlplugindump is disabled, \
         preventing using it to resolve data: {0}"
    )]
    PluginDumpDisabled(#[source] Box<ResolveError>),
}

/// Error from the analysis engine. Most of these are captured on the file
/// context or the import record rather than propagated; the typing variants
/// are per-expression and never abort the walk.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("file not ingested: {0}")]
    FileNotIngested(String),

    #[error("component not found: {name} (alias {alias:?}) in {uri}")]
    ComponentNotFound {
        alias: Option<String>,
        name: String,
        uri: String,
    },

    #[error("failed to resolve import {import}: {source}")]
    ResolveFailed {
        import: String,
        #[source]
        source: Arc<ResolveError>,
    },

    #[error("parser produced no tree for {0}")]
    ParseFailed(String),

    #[error("query compilation failed: {0}")]
    Query(String),

    #[error("variable {0} not found")]
    VariableNotFound(String),

    #[error("expression type not implemented yet: {0}")]
    UnsupportedExpression(String),

    #[error("statement type not implemented yet: {0}")]
    UnsupportedStatement(String),

    #[error("condition of ternary expression is {0}, not bool")]
    TernaryConditionNotBool(String),

    #[error("branches of ternary expression disagree: {consequence} vs {alternative}")]
    TernaryBranchMismatch {
        consequence: String,
        alternative: String,
    },
}
