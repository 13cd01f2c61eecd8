//! Rewrite `var` declarations to `let` (reassigned later) or `const`.

use crate::RefactorError;
use crate::spans::{SpanEdit, apply_edits};
use sedge_analysis::Engine;

pub(crate) fn execute(uri: &str, engine: &mut Engine) -> Result<(), RefactorError> {
    let new_body = {
        let ctx = engine.get_context(uri)?;
        let decls = engine.var_declarations(uri, ctx.root())?;

        let edits: Vec<SpanEdit> = decls
            .iter()
            .map(|decl| {
                let keyword = if decl.assigned_later { "let" } else { "const" };
                SpanEdit::new(
                    decl.keyword.start_byte(),
                    decl.keyword.end_byte(),
                    keyword,
                )
            })
            .collect();

        if edits.is_empty() {
            return Ok(());
        }
        apply_edits(&ctx.body, &edits)?
    };

    engine.ingest(uri, new_body)?;
    Ok(())
}
