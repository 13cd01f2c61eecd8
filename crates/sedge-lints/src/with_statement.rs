//! Warn on `with` statements in embedded script.

use crate::{CancelToken, Diagnostic, LintPass, Severity};
use sedge_analysis::queries::collect_captures;
use sedge_analysis::{Engine, FileContext, SpanRange};

pub struct WithStatement;

impl LintPass for WithStatement {
    fn analyze(
        &self,
        _uri: &str,
        ctx: &FileContext,
        engine: &Engine,
        _cancel: &CancelToken,
    ) -> Vec<Diagnostic> {
        collect_captures(
            &engine.queries().with_statements,
            ctx.root(),
            &ctx.body,
            "bad",
        )
        .into_iter()
        .map(|node| Diagnostic {
            range: SpanRange::from_node(&node),
            severity: Severity::Warning,
            source: "with lint",
            message: "Don't use with statements in modern JavaScript".to_string(),
            context: None,
        })
        .collect()
    }
}
