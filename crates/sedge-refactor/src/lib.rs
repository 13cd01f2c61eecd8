//! Manifest-driven refactorings.
//!
//! A refactor manifest is written in the same catalogue syntax as module
//! files and names the rewrites to perform: replacing uses of one
//! component with another, and converting `var` declarations to
//! `let`/`const`. All rewriting bottoms out in the non-overlapping
//! span-edit primitive of [`spans`].

mod manifest;
mod replace_uses;
mod replace_var;
pub mod spans;

pub use manifest::{ComponentRef, PreferredAlias, RefactorManifest, ReplaceUses};
pub use spans::{EditError, SpanEdit, apply_edits};

use sedge_analysis::{AnalysisError, Engine};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefactorError {
    #[error("failed to load refactor manifest {path}: {source}")]
    Manifest {
        path: String,
        #[source]
        source: sedge_qmltypes::CatalogueError,
    },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

impl RefactorManifest {
    /// Run every refactor of this manifest against one ingested file,
    /// re-ingesting after each rewrite.
    pub fn execute(&self, uri: &str, engine: &mut Engine) -> Result<(), RefactorError> {
        for replace in &self.replace_uses {
            replace_uses::execute(self, replace, uri, engine)?;
        }
        if !self.replace_var_with_let_and_const.is_empty() {
            replace_var::execute(uri, engine)?;
        }
        Ok(())
    }
}
