//! Replace every use of one component with another, adding the
//! destination import when the file lacks it.

use crate::manifest::{RefactorManifest, ReplaceUses};
use crate::spans::{SpanEdit, apply_edits};
use crate::RefactorError;
use sedge_analysis::Engine;
use tracing::debug;

// TODO: rewrite minor versions when needed
pub(crate) fn execute(
    manifest: &RefactorManifest,
    replace: &ReplaceUses,
    uri: &str,
    engine: &mut Engine,
) -> Result<(), RefactorError> {
    let mut edits: Vec<SpanEdit> = Vec::new();
    let mut replaced = false;

    let new_body = {
        let ctx = engine.get_context(uri)?;

        let mut destination_found = false;
        let mut destination_prefix = String::new();
        let mut source_prefix = String::new();
        let mut last_import_end = 0usize;

        for import in &ctx.imports {
            if import.uri.path == replace.with.uri
                && import.uri.major == replace.with.major_version
            {
                destination_prefix = import.prefix();
                destination_found = true;
                break;
            }
            last_import_end = import.range.end_byte;
        }

        for import in &ctx.imports {
            if import.uri.path == replace.of.uri && import.uri.major == replace.of.major_version
            {
                source_prefix = import.prefix();
                break;
            }
        }

        if !destination_found {
            let alias = manifest.preferred_alias(&replace.with);
            destination_prefix = alias.map(|a| format!("{a}.")).unwrap_or_default();
            edits.push(SpanEdit::insert(
                last_import_end,
                format!("\n{}", replace.with.import_statement(alias)),
            ));
        }

        let wanted = format!("{source_prefix}{}", replace.of.name);
        let references = engine.type_references(uri, ctx.root())?;

        'references: for usage in references {
            let written = usage.utf8_text(ctx.body.as_bytes()).unwrap_or("");
            if written != wanted {
                continue;
            }

            for import in &ctx.imports {
                if import.uri.path != replace.of.uri
                    || import.uri.major != replace.of.major_version
                {
                    continue;
                }

                // Handle aliased imports: the reference is written
                // `Alias.Name`, the catalogue knows it as `Name`.
                let prefix = import.prefix();
                let replacement = format!("{destination_prefix}{}", replace.with.name);

                if let Some(module) = &import.module {
                    for component in &module.components {
                        if format!("{prefix}{}", component.sane_name()) == written {
                            edits.push(SpanEdit::new(
                                usage.start_byte(),
                                usage.end_byte(),
                                replacement.clone(),
                            ));
                            replaced = true;
                            continue 'references;
                        }
                    }
                }

                // Weak match: the alias prefix fits but the catalogue does
                // not know the component.
                if !prefix.is_empty()
                    && written.starts_with(&prefix)
                    && written.ends_with(&replace.of.name)
                {
                    edits.push(SpanEdit::new(
                        usage.start_byte(),
                        usage.end_byte(),
                        replacement,
                    ));
                    replaced = true;
                    continue 'references;
                }
            }
        }

        if !replaced {
            debug!(uri, of = %replace.of.name, "no uses found, leaving the file unchanged");
            return Ok(());
        }

        apply_edits(&ctx.body, &edits)?
    };

    engine.ingest(uri, new_body)?;
    Ok(())
}
