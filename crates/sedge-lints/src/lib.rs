//! Diagnostic passes over analysed QML files.
//!
//! A pass is anything implementing [`LintPass`]; it reads a file context
//! and the engine's query results and produces range-tagged diagnostics.
//! Passes never mutate the file context. The cancellation token is
//! forwarded to passes for embedders with their own deadlines; the runner
//! itself does not check it between passes.

mod alias_property;
mod condition_assignment;
mod double_negation;
mod equality_coercion;
mod import_resolution;
mod layout_anchors;
mod unused_imports;
mod var_keyword;
mod with_statement;

pub use alias_property::AliasProperty;
pub use condition_assignment::ConditionAssignment;
pub use double_negation::DoubleNegation;
pub use equality_coercion::EqualityCoercion;
pub use import_resolution::ImportResolution;
pub use layout_anchors::LayoutAnchors;
pub use unused_imports::UnusedImports;
pub use var_keyword::VarKeyword;
pub use with_statement::WithStatement;

use sedge_analysis::{Engine, FileContext, SpanRange};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// A single finding: where, how bad, which lint, and what to tell the user.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub range: SpanRange,
    pub severity: Severity,
    /// Short tag naming the producing lint.
    pub source: &'static str,
    pub message: String,
    /// Span of surrounding context worth showing with the message.
    pub context: Option<SpanRange>,
}

/// Cooperative cancellation handle. Forwarded to passes; the core does not
/// honour it between passes.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A diagnostic pass.
pub trait LintPass {
    /// Analyse one ingested file. Must not mutate the context.
    fn analyze(
        &self,
        uri: &str,
        ctx: &FileContext,
        engine: &Engine,
        cancel: &CancelToken,
    ) -> Vec<Diagnostic>;
}

/// The default pass set, in run order.
pub fn default_passes() -> Vec<Box<dyn LintPass>> {
    vec![
        Box::new(ConditionAssignment),
        Box::new(DoubleNegation),
        Box::new(EqualityCoercion),
        Box::new(VarKeyword),
        Box::new(WithStatement),
        Box::new(AliasProperty),
        Box::new(UnusedImports),
        Box::new(LayoutAnchors),
    ]
}

/// Run every pass over one file and collect the findings.
pub fn run_passes(
    passes: &[Box<dyn LintPass>],
    uri: &str,
    ctx: &FileContext,
    engine: &Engine,
    cancel: &CancelToken,
) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    for pass in passes {
        diags.extend(pass.analyze(uri, ctx, engine, cancel));
    }
    diags
}
