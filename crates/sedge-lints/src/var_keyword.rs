//! Suggest `let` or `const` for `var` declarations, depending on whether
//! the variable is assigned again later in its block.

use crate::{CancelToken, Diagnostic, LintPass, Severity};
use sedge_analysis::{Engine, FileContext, SpanRange};

pub struct VarKeyword;

impl LintPass for VarKeyword {
    fn analyze(
        &self,
        uri: &str,
        ctx: &FileContext,
        engine: &Engine,
        _cancel: &CancelToken,
    ) -> Vec<Diagnostic> {
        let Ok(decls) = engine.var_declarations(uri, ctx.root()) else {
            return Vec::new();
        };

        decls
            .into_iter()
            .map(|decl| {
                let suggestion = if decl.assigned_later { "let" } else { "const" };
                Diagnostic {
                    range: SpanRange::from_node(&decl.keyword),
                    severity: Severity::Warning,
                    source: "var lint",
                    message: format!(
                        "Don't use var in modern JavaScript. Consider using \"{suggestion}\" here instead."
                    ),
                    context: None,
                }
            })
            .collect()
    }
}
