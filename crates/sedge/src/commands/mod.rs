//! Subcommand implementations.

pub mod cfg;
pub mod imports;
pub mod lint;
pub mod refactor;

use sedge_analysis::engine::Engine;
use sedge_analysis::syntax::GrammarLoader;
use sedge_analysis::{builtin, search};
use std::path::PathBuf;
use tracing::warn;

/// Module search paths for this invocation: `QML2_IMPORT_PATH` plus the
/// qmake-probed runtime path. A failed probe degrades to the environment
/// paths with a warning; with neither available it is an error.
pub fn search_paths() -> Result<Vec<PathBuf>, String> {
    match search::default_search_paths() {
        Ok(paths) => Ok(paths),
        Err(e) => {
            let env_only: Vec<PathBuf> = std::env::var("QML2_IMPORT_PATH")
                .unwrap_or_default()
                .split(':')
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect();
            if env_only.is_empty() {
                return Err(format!(
                    "could not determine module search paths: {e}\n\
                     set QML2_IMPORT_PATH or install qmake"
                ));
            }
            warn!(error = %e, "qmake probe failed, using QML2_IMPORT_PATH only");
            Ok(env_only)
        }
    }
}

/// Build an engine: dynamically loaded QML grammar, bundled builtins, and
/// the module search paths.
pub fn build_engine() -> Result<Engine, String> {
    let loader = GrammarLoader::new();
    let language = loader.qml().ok_or_else(|| {
        "no qml grammar found; install qml.so into ~/.config/sedge/grammars \
         or set SEDGE_GRAMMAR_PATH"
            .to_string()
    })?;

    let builtin = builtin::builtin_module().map_err(|e| format!("bundled builtins: {e}"))?;
    let paths = search_paths()?;

    Engine::new(language, builtin, paths).map_err(|e| e.to_string())
}
