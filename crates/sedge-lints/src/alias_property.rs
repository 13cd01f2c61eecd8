//! Warn on `property alias` declarations.

use crate::{CancelToken, Diagnostic, LintPass, Severity};
use sedge_analysis::queries::collect_captures;
use sedge_analysis::{Engine, FileContext, SpanRange};

pub struct AliasProperty;

impl LintPass for AliasProperty {
    fn analyze(
        &self,
        _uri: &str,
        ctx: &FileContext,
        engine: &Engine,
        _cancel: &CancelToken,
    ) -> Vec<Diagnostic> {
        let mut diags = Vec::new();

        for node in collect_captures(
            &engine.queries().property_types,
            ctx.root(),
            &ctx.body,
            "ident",
        ) {
            if node.utf8_text(ctx.body.as_bytes()).unwrap_or("") != "alias" {
                continue;
            }
            diags.push(Diagnostic {
                range: SpanRange::from_node(&node),
                severity: Severity::Warning,
                source: "alias lint",
                message: "Don't use property alias. Instead, consider binding the aliased \
                          property to a property of the concrete type on this type."
                    .to_string(),
                context: node.parent().map(|p| SpanRange::from_node(&p)),
            });
        }

        diags
    }
}
