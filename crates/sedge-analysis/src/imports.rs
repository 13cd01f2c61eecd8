//! Extraction of import statements from a parsed file.

use crate::srcrange::SpanRange;
use tree_sitter::Node;

/// The identity of an import: dotted path plus version, or a relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportName {
    pub path: String,
    pub major: i64,
    pub minor: i64,
    pub is_relative: bool,
}

impl ImportName {
    pub fn absolute(parts: &[String], major: i64, minor: i64) -> Self {
        ImportName {
            path: parts.join("."),
            major,
            minor,
            is_relative: false,
        }
    }

    pub fn relative(path: &str) -> Self {
        ImportName {
            path: path.to_string(),
            major: 0,
            minor: 0,
            is_relative: true,
        }
    }
}

impl std::fmt::Display for ImportName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_relative {
            write!(f, "{:?}", self.path)
        } else {
            write!(f, "{} {}.{}", self.path, self.major, self.minor)
        }
    }
}

/// An absolute import statement as it appears in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct AstImport {
    pub parts: Vec<String>,
    pub major: i64,
    pub minor: i64,
    pub alias: Option<String>,
    /// The full statement range, so diagnostics can highlight it.
    pub range: SpanRange,
}

impl AstImport {
    pub fn name(&self) -> ImportName {
        ImportName::absolute(&self.parts, self.major, self.minor)
    }
}

/// A relative (quoted-path) import statement.
#[derive(Debug, Clone, PartialEq)]
pub struct RelativeImport {
    pub path: String,
    pub alias: Option<String>,
    pub range: SpanRange,
}

/// Read the import statements out of a file's root node. Children with
/// parse errors are skipped.
pub fn extract_imports(root: Node, body: &str) -> (Vec<AstImport>, Vec<RelativeImport>) {
    let mut absolute = Vec::new();
    let mut relative = Vec::new();

    for i in 0..root.named_child_count() {
        let Some(child) = root.named_child(i) else {
            continue;
        };
        if child.has_error() {
            continue;
        }

        match child.kind() {
            "relative_import_statement" => {
                let mut path = String::new();
                let mut alias = None;
                if let Some(uri) = child.named_child(0) {
                    path = text(uri, body).trim_matches('"').to_string();
                }
                if child.named_child_count() == 2 {
                    alias = child
                        .named_child(1)
                        .and_then(|a| a.named_child(0))
                        .map(|n| text(n, body).to_string());
                }
                relative.push(RelativeImport {
                    path,
                    alias,
                    range: SpanRange::from_node(&child),
                });
            }
            "import_statement" => {
                // Children: qualified identifier, version, optional alias.
                let (Some(name), Some(version)) = (child.named_child(0), child.named_child(1))
                else {
                    continue;
                };
                let (major, minor) = extract_version_number(version, body);
                let alias = if child.named_child_count() == 3 {
                    child
                        .named_child(2)
                        .and_then(|a| a.named_child(0))
                        .map(|n| text(n, body).to_string())
                } else {
                    None
                };
                absolute.push(AstImport {
                    parts: extract_qualified_identifier(name, body),
                    major,
                    minor,
                    alias,
                    range: SpanRange::from_node(&child),
                });
            }
            _ => {}
        }
    }

    (absolute, relative)
}

/// The identifier parts of a qualified identifier node, in order.
pub fn extract_qualified_identifier(node: Node, body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    for i in 0..node.child_count() {
        let Some(child) = node.child(i) else { continue };
        if child.kind() == "identifier" {
            parts.push(text(child, body).to_string());
        }
    }
    parts
}

fn extract_version_number(node: Node, body: &str) -> (i64, i64) {
    let raw = text(node, body);
    let (maj, min) = raw.split_once('.').unwrap_or((raw, "0"));
    (
        maj.trim().parse().unwrap_or(0),
        min.trim().parse().unwrap_or(0),
    )
}

fn text<'a>(node: Node, body: &'a str) -> &'a str {
    node.utf8_text(body.as_bytes()).unwrap_or("")
}
