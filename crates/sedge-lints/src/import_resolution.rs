//! Surface import resolution failures recorded on the file context.
//!
//! Not part of the default set: a file full of locally-unresolvable
//! imports is still worth linting quietly, so front-ends opt in.

use crate::{CancelToken, Diagnostic, LintPass, Severity};
use sedge_analysis::{Engine, FileContext};

pub struct ImportResolution;

impl LintPass for ImportResolution {
    fn analyze(
        &self,
        _uri: &str,
        ctx: &FileContext,
        _engine: &Engine,
        _cancel: &CancelToken,
    ) -> Vec<Diagnostic> {
        ctx.imports
            .iter()
            .filter_map(|import| {
                let error = import.error.as_ref()?;
                Some(Diagnostic {
                    range: import.range,
                    severity: Severity::Error,
                    source: "import resolution",
                    message: format!("Could not resolve import {}: {error}", import.uri),
                    context: None,
                })
            })
            .collect()
    }
}
