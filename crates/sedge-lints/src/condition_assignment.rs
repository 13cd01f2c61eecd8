//! Warn on assignment expressions directly under a parenthesised
//! condition, which are usually mistyped comparisons.

use crate::{CancelToken, Diagnostic, LintPass, Severity};
use sedge_analysis::queries::collect_captures;
use sedge_analysis::{Engine, FileContext, SpanRange};

pub struct ConditionAssignment;

impl LintPass for ConditionAssignment {
    fn analyze(
        &self,
        _uri: &str,
        ctx: &FileContext,
        engine: &Engine,
        _cancel: &CancelToken,
    ) -> Vec<Diagnostic> {
        collect_captures(
            &engine.queries().assignment_in_condition,
            ctx.root(),
            &ctx.body,
            "assign",
        )
        .into_iter()
        .map(|node| Diagnostic {
            range: SpanRange::from_node(&node),
            severity: Severity::Warning,
            source: "condition assignment",
            message: "Avoid assigning to variables in conditions.".to_string(),
            context: None,
        })
        .collect()
    }
}
