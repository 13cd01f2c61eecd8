//! Parser construction and dynamic grammar loading.
//!
//! The QML grammar is an external collaborator: the engine works against an
//! injected [`tree_sitter::Language`]. [`GrammarLoader`] provides the
//! standard way of obtaining one, loading a compiled grammar shared library
//! (`qml.so` / `qml.dylib` / `qml.dll`) from the configured search paths.

use libloading::{Library, Symbol};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tree_sitter::{Language, Parser, Tree};
use tree_sitter_language::LanguageFn;

/// Parse a source string with the given grammar. Returns `None` when the
/// parser could not be driven at all; syntax errors still yield a tree.
pub fn parse(language: &Language, source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(language).ok()?;
    parser.parse(source, None)
}

/// Loaded grammar library.
struct LoadedGrammar {
    /// Keep the library alive while the Language is in use.
    _library: Library,
    language: Language,
}

/// Dynamic grammar loader with caching.
pub struct GrammarLoader {
    search_paths: Vec<PathBuf>,
    cache: RwLock<HashMap<String, Arc<LoadedGrammar>>>,
}

impl GrammarLoader {
    /// Create a loader with the default search paths:
    /// `SEDGE_GRAMMAR_PATH` (colon-separated) first, then
    /// `~/.config/sedge/grammars`.
    pub fn new() -> Self {
        let mut paths = Vec::new();

        if let Ok(env_path) = std::env::var("SEDGE_GRAMMAR_PATH") {
            for p in env_path.split(':') {
                if !p.is_empty() {
                    paths.push(PathBuf::from(p));
                }
            }
        }

        if let Some(config) = dirs::config_dir() {
            paths.push(config.join("sedge/grammars"));
        }

        Self::with_paths(paths)
    }

    /// Create a loader with custom search paths.
    pub fn with_paths(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The QML grammar, if installed.
    pub fn qml(&self) -> Option<Language> {
        self.get("qml")
    }

    /// Get a grammar by name. Returns `None` when no library for it exists
    /// in the search paths.
    pub fn get(&self, name: &str) -> Option<Language> {
        if let Some(loaded) = self.cache.read().ok()?.get(name) {
            return Some(loaded.language.clone());
        }

        let lib_name = grammar_lib_name(name);
        for search_path in &self.search_paths {
            let lib_path = search_path.join(&lib_name);
            if lib_path.exists() {
                if let Some(lang) = self.load_from_path(name, &lib_path) {
                    return Some(lang);
                }
            }
        }

        None
    }

    fn load_from_path(&self, name: &str, path: &Path) -> Option<Language> {
        // Safety: loading shared libraries is inherently unsafe. We trust
        // that grammars in the search paths are legitimate.
        let library = unsafe { Library::new(path).ok()? };

        let symbol_name = grammar_symbol_name(name);
        let language = unsafe {
            let func: Symbol<unsafe extern "C" fn() -> *const ()> =
                library.get(symbol_name.as_bytes()).ok()?;
            let lang_fn = LanguageFn::from_raw(*func);
            Language::new(lang_fn)
        };

        let loaded = Arc::new(LoadedGrammar {
            _library: library,
            language: language.clone(),
        });

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(name.to_string(), loaded);
        }

        Some(language)
    }

    /// List grammar libraries present in the search paths.
    pub fn available(&self) -> Vec<String> {
        let mut grammars = Vec::new();
        let ext = grammar_extension();

        for path in &self.search_paths {
            if let Ok(entries) = std::fs::read_dir(path) {
                for entry in entries.flatten() {
                    let name = entry.file_name();
                    let name_str = name.to_string_lossy();
                    if let Some(stem) = name_str.strip_suffix(ext) {
                        if !grammars.iter().any(|g| g == stem) {
                            grammars.push(stem.to_string());
                        }
                    }
                }
            }
        }

        grammars.sort();
        grammars
    }
}

impl Default for GrammarLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn grammar_lib_name(name: &str) -> String {
    format!("{name}{}", grammar_extension())
}

fn grammar_symbol_name(name: &str) -> String {
    let normalized = name.replace('-', "_");
    format!("tree_sitter_{normalized}")
}

fn grammar_extension() -> &'static str {
    if cfg!(target_os = "macos") {
        ".dylib"
    } else if cfg!(target_os = "windows") {
        ".dll"
    } else {
        ".so"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_and_lib_names() {
        assert_eq!(grammar_symbol_name("qml"), "tree_sitter_qml");
        assert_eq!(grammar_symbol_name("ssh-config"), "tree_sitter_ssh_config");
        assert!(grammar_lib_name("qml").starts_with("qml."));
    }

    #[test]
    fn missing_grammar_is_none() {
        let loader = GrammarLoader::with_paths(vec![PathBuf::from("/nonexistent")]);
        assert!(loader.get("qml").is_none());
        assert!(loader.available().is_empty());
    }
}
