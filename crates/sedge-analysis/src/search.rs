//! Module search paths and candidate directory generation.

use crate::error::ResolveError;
use std::path::PathBuf;
use std::process::Command;

/// Name of the catalogue file a module directory must contain.
pub const PLUGINS_QMLTYPES: &str = "plugins.qmltypes";

/// Assemble the default module search paths: `QML2_IMPORT_PATH` entries
/// first, then the installed runtime path probed from qmake. The probe's
/// failure propagates; batch tools that want hermeticity pass their own
/// path list to the engine instead.
pub fn default_search_paths() -> Result<Vec<PathBuf>, ResolveError> {
    let mut paths: Vec<PathBuf> = std::env::var("QML2_IMPORT_PATH")
        .unwrap_or_default()
        .split(':')
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect();

    paths.push(qt_install_qml()?);
    Ok(paths)
}

/// Probe the installed QML runtime path: the `QT_INSTALL_QML:` line of
/// `qmake -query`.
pub fn qt_install_qml() -> Result<PathBuf, ResolveError> {
    let mut last_err = None;
    for tool in ["qmake", "qmake-qt5"] {
        match Command::new(tool).arg("-query").output() {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                for line in stdout.lines() {
                    if let Some(path) = line.strip_prefix("QT_INSTALL_QML:") {
                        return Ok(PathBuf::from(path.trim()));
                    }
                }
                last_err = Some(ResolveError::Subprocess {
                    tool: tool.to_string(),
                    message: "no QT_INSTALL_QML line in -query output".to_string(),
                });
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
    Err(last_err.unwrap_or(ResolveError::QmlTypesNotFound))
}

#[derive(Clone, Copy)]
enum ImportVersion {
    Fully,
    Majorly,
    Not,
}

fn version_suffix(vmaj: i64, vmin: i64, version: ImportVersion) -> String {
    match version {
        ImportVersion::Fully => format!(".{vmaj}.{vmin}"),
        ImportVersion::Majorly => format!(".{vmaj}"),
        ImportVersion::Not => String::new(),
    }
}

/// All candidate directories for an import, in resolution order: fully
/// versioned, then majorly versioned, then unversioned. For the versioned
/// tries, each intermediate prefix of the dotted name also gets the version
/// suffix.
pub fn candidate_paths(
    parts: &[String],
    base_paths: &[PathBuf],
    vmaj: i64,
    vmin: i64,
) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    for version in [ImportVersion::Fully, ImportVersion::Majorly, ImportVersion::Not] {
        let suffix = version_suffix(vmaj, vmin, version);

        for base in base_paths {
            let base = base.display();
            candidates.push(PathBuf::from(format!(
                "{base}/{}{suffix}",
                parts.join("/")
            )));

            if !matches!(version, ImportVersion::Not) {
                for index in (0..parts.len().saturating_sub(1)).rev() {
                    let prefix = parts[..=index].join("/");
                    let rest = parts[index + 1..].join("/");
                    candidates.push(PathBuf::from(format!("{base}/{prefix}{suffix}/{rest}")));
                }
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(s: &[&str]) -> Vec<String> {
        s.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn fully_versioned_candidates_come_first() {
        let got = candidate_paths(
            &parts(&["org", "kde", "kirigami"]),
            &[PathBuf::from("/usr/lib/qml")],
            2,
            10,
        );

        assert_eq!(got[0], PathBuf::from("/usr/lib/qml/org/kde/kirigami.2.10"));
        // Intermediate prefixes carry the suffix, innermost first.
        assert_eq!(
            got[1],
            PathBuf::from("/usr/lib/qml/org/kde.2.10/kirigami")
        );
        assert_eq!(
            got[2],
            PathBuf::from("/usr/lib/qml/org.2.10/kde/kirigami")
        );
        // Then the majorly-versioned block.
        assert_eq!(got[3], PathBuf::from("/usr/lib/qml/org/kde/kirigami.2"));
        // The unversioned try has no prefix expansion.
        assert_eq!(
            got.last().unwrap(),
            &PathBuf::from("/usr/lib/qml/org/kde/kirigami")
        );
        assert_eq!(got.len(), 7);
    }

    #[test]
    fn single_part_names_have_no_prefix_expansion() {
        let got = candidate_paths(&parts(&["QtQuick"]), &[PathBuf::from("/base")], 2, 15);
        assert_eq!(
            got,
            vec![
                PathBuf::from("/base/QtQuick.2.15"),
                PathBuf::from("/base/QtQuick.2"),
                PathBuf::from("/base/QtQuick"),
            ]
        );
    }

    #[test]
    fn multiple_bases_interleave_per_version_tier() {
        let got = candidate_paths(
            &parts(&["A"]),
            &[PathBuf::from("/one"), PathBuf::from("/two")],
            1,
            0,
        );
        assert_eq!(got[0], PathBuf::from("/one/A.1.0"));
        assert_eq!(got[1], PathBuf::from("/two/A.1.0"));
        assert_eq!(got[2], PathBuf::from("/one/A.1"));
    }
}
