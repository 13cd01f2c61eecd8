//! Module resolution: import name → on-disk directory → parsed module.
//!
//! Results are memoised in two tables (name → path, path → module), both of
//! which cache failures as well as successes so a broken module is probed
//! only once. When no candidate directory carries a catalogue the resolver
//! can fall back to running qmlplugindump and parsing its output.

use crate::error::ResolveError;
use crate::imports::ImportName;
use crate::search::{self, PLUGINS_QMLTYPES};
use sedge_qmltypes::{Module, parse_export};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ModuleResolver {
    paths: Vec<PathBuf>,
    plugin_dump: bool,
    name_to_path: HashMap<ImportName, Result<PathBuf, Arc<ResolveError>>>,
    path_to_module: HashMap<PathBuf, Result<Arc<Module>, Arc<ResolveError>>>,
}

impl ModuleResolver {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        ModuleResolver {
            paths,
            plugin_dump: true,
            name_to_path: HashMap::new(),
            path_to_module: HashMap::new(),
        }
    }

    /// Enable or disable the qmlplugindump fallback. On by default; batch
    /// tools turn it off for hermeticity.
    pub fn set_plugin_dump(&mut self, enabled: bool) {
        self.plugin_dump = enabled;
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Resolve a dotted import to its parsed module.
    pub fn resolve(
        &mut self,
        parts: &[String],
        vmaj: i64,
        vmin: i64,
    ) -> Result<Arc<Module>, Arc<ResolveError>> {
        let name = ImportName::absolute(parts, vmaj, vmin);

        let resolved = match self.name_to_path.get(&name) {
            Some(Ok(path)) => path.clone(),
            Some(Err(e)) => return Err(e.clone()),
            None => {
                let outcome = self.resolve_path(parts, vmaj, vmin);
                self.name_to_path.insert(name.clone(), outcome.clone());
                outcome?
            }
        };

        if let Some(cached) = self.path_to_module.get(&resolved) {
            return cached.clone();
        }

        let loaded = load_plugin_types_file(&resolved).map(Arc::new).map_err(Arc::new);
        self.path_to_module.insert(resolved, loaded.clone());
        loaded
    }

    fn resolve_path(
        &mut self,
        parts: &[String],
        vmaj: i64,
        vmin: i64,
    ) -> Result<PathBuf, Arc<ResolveError>> {
        match actual_qml_path(parts, &self.paths, vmaj, vmin) {
            Ok(path) => Ok(path),
            Err(ResolveError::QmlTypesNotFound) if self.plugin_dump => {
                let synthetic = PathBuf::from(format!(
                    "inmem:{}@{vmaj}.{vmin}",
                    parts.join(".")
                ));
                let data = qml_plugin_dump(parts, vmaj, vmin).map_err(Arc::new)?;
                let loaded = load_plugin_types("inmemory", &data)
                    .map(Arc::new)
                    .map_err(Arc::new);
                self.path_to_module.insert(synthetic.clone(), loaded.clone());
                loaded?;
                Ok(synthetic)
            }
            Err(ResolveError::QmlTypesNotFound) => Err(Arc::new(
                ResolveError::PluginDumpDisabled(Box::new(ResolveError::QmlTypesNotFound)),
            )),
            Err(other) => Err(Arc::new(other)),
        }
    }
}

/// The first candidate directory that contains a `plugins.qmltypes` file.
fn actual_qml_path(
    parts: &[String],
    bases: &[PathBuf],
    vmaj: i64,
    vmin: i64,
) -> Result<PathBuf, ResolveError> {
    for candidate in search::candidate_paths(parts, bases, vmaj, vmin) {
        let types = candidate.join(PLUGINS_QMLTYPES);
        match std::fs::metadata(&types) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(ResolveError::Io {
                    path: types,
                    source: e,
                });
            }
        }
    }
    Err(ResolveError::QmlTypesNotFound)
}

/// Parse and unmarshal catalogue bytes into a module.
pub fn load_plugin_types(origin: &str, data: &str) -> Result<Module, ResolveError> {
    let doc = sedge_qmltypes::parse(data).map_err(|e| ResolveError::Catalogue {
        path: origin.to_string(),
        source: e,
    })?;
    Module::from_document(&doc).map_err(|e| ResolveError::Catalogue {
        path: origin.to_string(),
        source: e,
    })
}

/// Read and parse the catalogue of a resolved module directory.
pub fn load_plugin_types_file(dir: &Path) -> Result<Module, ResolveError> {
    let types_path = dir.join(PLUGINS_QMLTYPES);
    let data = std::fs::read_to_string(&types_path).map_err(|e| ResolveError::Io {
        path: types_path.clone(),
        source: e,
    })?;
    load_plugin_types(&types_path.to_string_lossy(), &data)
}

/// Run qmlplugindump to synthesise catalogue bytes for a module that has
/// none installed.
fn qml_plugin_dump(parts: &[String], vmaj: i64, vmin: i64) -> Result<String, ResolveError> {
    let dotted = parts.join(".");
    info!(module = %dotted, version = format!("{vmaj}.{vmin}"), "qmltypes not found, running qmlplugindump");

    let mut last_err = None;
    for tool in ["qmlplugindump", "qmlplugindump-qt5"] {
        match Command::new(tool)
            .arg(&dotted)
            .arg(format!("{vmaj}.{vmin}"))
            .output()
        {
            Ok(output) if output.status.success() => {
                debug!(tool, module = %dotted, "qmlplugindump succeeded");
                return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
            }
            Ok(output) => {
                last_err = Some(ResolveError::Subprocess {
                    tool: tool.to_string(),
                    message: format!("exited with {}", output.status),
                });
            }
            Err(e) => {
                last_err = Some(ResolveError::Subprocess {
                    tool: tool.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    let err = last_err.unwrap_or(ResolveError::QmlTypesNotFound);
    warn!(module = %dotted, error = %err, "qmlplugindump failed");
    Err(err)
}

/// An importable module discovered under the search paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoveredImport {
    pub url: String,
    pub major: i64,
}

/// Scan every search root for `qmldir` directories and derive the set of
/// importable `(url, major)` pairs, together with the highest minor version
/// seen for each. Unreadable or malformed catalogues are skipped.
pub fn possible_imports(
    paths: &[PathBuf],
) -> (Vec<DiscoveredImport>, HashMap<DiscoveredImport, i64>) {
    let mut imports = Vec::new();
    let mut minors: HashMap<DiscoveredImport, i64> = HashMap::new();

    for base in paths {
        for entry in walkdir::WalkDir::new(base)
            .into_iter()
            .filter_map(Result::ok)
        {
            if entry.file_name() != "qmldir" {
                continue;
            }
            let Some(dir) = entry.path().parent() else {
                continue;
            };

            let module = match load_plugin_types_file(dir) {
                Ok(m) => m,
                Err(e) => {
                    debug!(dir = %dir.display(), error = %e, "skipping module directory");
                    continue;
                }
            };

            for component in &module.components {
                for export in &component.exports {
                    let Some(parsed) = parse_export(export) else {
                        continue;
                    };
                    let key = DiscoveredImport {
                        url: parsed.url,
                        major: parsed.major,
                    };
                    match minors.get_mut(&key) {
                        Some(minor) => *minor = (*minor).max(parsed.minor),
                        None => {
                            minors.insert(key.clone(), parsed.minor);
                            imports.push(key);
                        }
                    }
                }
            }
        }
    }

    (imports, minors)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOGUE: &str = r#"
Module {
    Component {
        name: "QQuickAboutPage"
        exports: ["org.kde.kirigami/AboutPage 2.10"]
        Property { name: "heading"; type: "string" }
    }
}
"#;

    fn fixture_tree() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("org/kde/kirigami.2.10");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(PLUGINS_QMLTYPES), CATALOGUE).unwrap();
        std::fs::write(dir.join("qmldir"), "module org.kde.kirigami\n").unwrap();
        tmp
    }

    fn parts(s: &[&str]) -> Vec<String> {
        s.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn resolves_fully_versioned_directory() {
        let tmp = fixture_tree();
        let mut resolver = ModuleResolver::new(vec![tmp.path().to_path_buf()]);
        resolver.set_plugin_dump(false);

        let module = resolver
            .resolve(&parts(&["org", "kde", "kirigami"]), 2, 10)
            .unwrap();
        assert!(module.component("AboutPage").is_some());

        // Second resolution is a cache hit on the same Arc.
        let again = resolver
            .resolve(&parts(&["org", "kde", "kirigami"]), 2, 10)
            .unwrap();
        assert!(Arc::ptr_eq(&module, &again));
    }

    #[test]
    fn missing_module_error_is_cached() {
        let tmp = tempfile::tempdir().unwrap();
        let mut resolver = ModuleResolver::new(vec![tmp.path().to_path_buf()]);
        resolver.set_plugin_dump(false);

        let first = resolver.resolve(&parts(&["no", "such"]), 1, 0).unwrap_err();
        let second = resolver.resolve(&parts(&["no", "such"]), 1, 0).unwrap_err();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(matches!(*first, ResolveError::PluginDumpDisabled(_)));
    }

    #[test]
    fn malformed_catalogue_is_a_catalogue_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("broken");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(PLUGINS_QMLTYPES), "Module { name ]").unwrap();

        let mut resolver = ModuleResolver::new(vec![tmp.path().to_path_buf()]);
        resolver.set_plugin_dump(false);
        let err = resolver.resolve(&parts(&["broken"]), 1, 0).unwrap_err();
        assert!(matches!(*err, ResolveError::Catalogue { .. }));
    }

    #[test]
    fn scans_qmldir_trees_for_importable_modules() {
        let tmp = fixture_tree();
        let (imports, minors) = possible_imports(&[tmp.path().to_path_buf()]);
        assert_eq!(
            imports,
            vec![DiscoveredImport {
                url: "org.kde.kirigami".into(),
                major: 2
            }]
        );
        assert_eq!(minors[&imports[0]], 10);
    }
}
