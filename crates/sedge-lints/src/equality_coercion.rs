//! Point out `==` and `!=` comparisons, which coerce their operands.

use crate::{CancelToken, Diagnostic, LintPass, Severity};
use sedge_analysis::queries::collect_captures;
use sedge_analysis::{Engine, FileContext, SpanRange};

pub struct EqualityCoercion;

impl LintPass for EqualityCoercion {
    fn analyze(
        &self,
        _uri: &str,
        ctx: &FileContext,
        engine: &Engine,
        _cancel: &CancelToken,
    ) -> Vec<Diagnostic> {
        let mut diags = Vec::new();

        for node in collect_captures(
            &engine.queries().coercing_equality,
            ctx.root(),
            &ctx.body,
            "expr",
        ) {
            diags.push(Diagnostic {
                range: SpanRange::from_node(&node),
                severity: Severity::Info,
                source: "equality coercion",
                message: "== may perform type coercion, leading to unexpected results. \
                          Consider using === instead."
                    .to_string(),
                context: None,
            });
        }

        for node in collect_captures(
            &engine.queries().coercing_inequality,
            ctx.root(),
            &ctx.body,
            "expr",
        ) {
            diags.push(Diagnostic {
                range: SpanRange::from_node(&node),
                severity: Severity::Info,
                source: "inequality coercion",
                message: "!= may perform type coercion, leading to unexpected results. \
                          Consider using !== instead."
                    .to_string(),
                context: None,
            });
        }

        diags
    }
}
