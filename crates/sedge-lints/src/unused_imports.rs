//! Warn on imports nothing in the file references.

use crate::{CancelToken, Diagnostic, LintPass, Severity};
use sedge_analysis::{Engine, FileContext};

pub struct UnusedImports;

impl LintPass for UnusedImports {
    fn analyze(
        &self,
        uri: &str,
        ctx: &FileContext,
        engine: &Engine,
        _cancel: &CancelToken,
    ) -> Vec<Diagnostic> {
        let Ok(used) = engine.used_imports(uri, ctx.root()) else {
            return Vec::new();
        };

        ctx.imports
            .iter()
            .zip(used)
            .filter(|(_, used)| !used)
            .map(|(import, _)| Diagnostic {
                range: import.range,
                severity: Severity::Warning,
                source: "import lint",
                message: "Unused import".to_string(),
                context: None,
            })
            .collect()
    }
}
