//! Suggest `Boolean(x)` over `!!x`.

use crate::{CancelToken, Diagnostic, LintPass, Severity};
use sedge_analysis::{Engine, FileContext, SpanRange};
use streaming_iterator::StreamingIterator;
use tree_sitter::QueryCursor;

pub struct DoubleNegation;

impl LintPass for DoubleNegation {
    fn analyze(
        &self,
        _uri: &str,
        ctx: &FileContext,
        engine: &Engine,
        _cancel: &CancelToken,
    ) -> Vec<Diagnostic> {
        let query = &engine.queries().double_negation;
        let (Some(outer_idx), Some(arg_idx)) = (
            query.capture_index_for_name("outer"),
            query.capture_index_for_name("arg"),
        ) else {
            return Vec::new();
        };

        let mut diags = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, ctx.root(), ctx.body.as_bytes());
        while let Some(m) = matches.next() {
            let outer = m.captures.iter().find(|c| c.index == outer_idx);
            let arg = m.captures.iter().find(|c| c.index == arg_idx);
            let (Some(outer), Some(arg)) = (outer, arg) else {
                continue;
            };

            let arg_text = arg.node.utf8_text(ctx.body.as_bytes()).unwrap_or("");
            diags.push(Diagnostic {
                range: SpanRange::from_node(&outer.node),
                severity: Severity::Info,
                source: "double negation lint",
                message: format!(
                    "Many people find double negation hard to read. Consider using \
                     \"Boolean({arg_text})\" instead."
                ),
                context: Some(SpanRange::from_node(&outer.node)),
            });
        }

        diags
    }
}
