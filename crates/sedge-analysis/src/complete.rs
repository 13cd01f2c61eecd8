//! Completion candidates derived from a file's imports and the builtin
//! module.
//!
//! This is the engine half of completion: given the word under the cursor
//! and the component enclosing it, produce the matching components,
//! properties, enum members and attached properties. Editor front-ends own
//! cursor handling and ranking.

use crate::engine::ImportRecord;
use crate::resolve::DiscoveredImport;
use sedge_qmltypes::{Component, Module};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Component,
    Property,
    EnumMember,
    Import,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionItem {
    /// Full label, alias prefix included.
    pub label: String,
    pub kind: CompletionKind,
    /// Extra information: a property's type, an enum's name, the host of
    /// an attached property.
    pub detail: Option<String>,
    /// The text completing what the user already typed.
    pub insert_text: String,
}

fn item(
    label: String,
    kind: CompletionKind,
    detail: Option<String>,
    word: &str,
) -> CompletionItem {
    let insert_text = label.strip_prefix(word).unwrap_or(&label).to_string();
    CompletionItem {
        label,
        kind,
        detail,
        insert_text,
    }
}

/// Candidates from one module's components under one alias prefix.
///
/// `enclosing` is the written name of the component whose block the cursor
/// is inside, if any; its properties complete bare.
fn module_candidates(
    word: &str,
    enclosing: Option<&str>,
    prefix: &str,
    components: &[Component],
    out: &mut Vec<CompletionItem>,
) {
    for component in components {
        let written = format!("{prefix}{}", component.sane_name());

        if written.starts_with(word) {
            out.push(item(written.clone(), CompletionKind::Component, None, word));
        }

        if Some(written.as_str()) == enclosing {
            for property in &component.properties {
                if property.name.starts_with(word) {
                    out.push(item(
                        property.name.clone(),
                        CompletionKind::Property,
                        Some(property.type_name.clone()),
                        word,
                    ));
                }
            }
        }

        for en in &component.enums {
            for member in en.values.keys() {
                let full = format!("{written}.{member}");
                if full.starts_with(word) {
                    out.push(item(
                        full,
                        CompletionKind::EnumMember,
                        Some(format!("{written}.{}", en.name)),
                        word,
                    ));
                }
            }
        }

        let Some(attached) = &component.attached_type else {
            continue;
        };
        // Attached types are referenced by raw name within the same module.
        let Some(host) = components.iter().find(|c| &c.name == attached) else {
            continue;
        };
        for property in &host.properties {
            let full = format!("{written}.{}", property.name);
            if full.starts_with(word) {
                out.push(item(
                    full,
                    CompletionKind::Property,
                    Some(format!("attached {written}")),
                    word,
                ));
            }
        }
    }
}

/// All component-position candidates for a file: the builtin module plus
/// every resolved import under its alias prefix.
pub fn component_candidates(
    word: &str,
    enclosing: Option<&str>,
    builtin: &Module,
    imports: &[ImportRecord],
) -> Vec<CompletionItem> {
    let mut out = Vec::new();
    module_candidates(word, enclosing, "", &builtin.components, &mut out);
    for import in imports {
        let Some(module) = &import.module else {
            continue;
        };
        module_candidates(
            word,
            enclosing,
            &import.prefix(),
            &module.components,
            &mut out,
        );
    }
    out
}

/// Import-statement candidates from the modules discovered under the
/// search paths.
pub fn import_candidates(
    word: &str,
    discovered: &[(DiscoveredImport, i64)],
) -> Vec<CompletionItem> {
    let mut out = Vec::new();
    for (import, minor) in discovered {
        let label = format!("{} {}.{}", import.url, import.major, minor);
        if label.starts_with(word) || import.url.starts_with(word) {
            out.push(item(label, CompletionKind::Import, None, word));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::ImportName;
    use crate::srcrange::{Point, SpanRange};
    use sedge_qmltypes::parse;
    use std::sync::Arc;

    fn zero_range() -> SpanRange {
        SpanRange {
            start_byte: 0,
            end_byte: 0,
            start_point: Point { row: 0, column: 0 },
            end_point: Point { row: 0, column: 0 },
        }
    }

    fn kirigami_import() -> ImportRecord {
        let module = Module::from_document(
            &parse(
                r#"Module {
    Component {
        name: "QQuickAboutPage"
        exports: ["org.kde.kirigami/AboutPage 2.10"]
        Property { name: "heading"; type: "string" }
        Property { name: "padding"; type: "double" }
    }
    Component {
        name: "QQuickScrollablePage"
        exports: ["org.kde.kirigami/ScrollablePage 2.10"]
        attachedType: "QQuickPageAttached"
    }
    Component {
        name: "QQuickPageAttached"
        Property { name: "inView"; type: "bool" }
    }
}"#,
            )
            .unwrap(),
        )
        .unwrap();

        ImportRecord {
            uri: ImportName {
                path: "org.kde.kirigami".into(),
                major: 2,
                minor: 10,
                is_relative: false,
            },
            alias: Some("Kirigami".into()),
            module: Some(Arc::new(module)),
            error: None,
            range: zero_range(),
        }
    }

    #[test]
    fn components_complete_with_their_alias_prefix() {
        let builtin = Module::default();
        let imports = vec![kirigami_import()];

        let items = component_candidates("Kirigami.A", None, &builtin, &imports);
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert!(labels.contains(&"Kirigami.AboutPage"), "{labels:?}");
        assert!(!labels.contains(&"Kirigami.ScrollablePage"));

        let about = items
            .iter()
            .find(|i| i.label == "Kirigami.AboutPage")
            .unwrap();
        assert_eq!(about.kind, CompletionKind::Component);
        assert_eq!(about.insert_text, "boutPage");
    }

    #[test]
    fn enclosing_component_offers_its_properties() {
        let builtin = Module::default();
        let imports = vec![kirigami_import()];

        let items =
            component_candidates("he", Some("Kirigami.AboutPage"), &builtin, &imports);
        let heading = items.iter().find(|i| i.label == "heading").unwrap();
        assert_eq!(heading.kind, CompletionKind::Property);
        assert_eq!(heading.detail.as_deref(), Some("string"));

        // Outside the AboutPage block, its properties stay hidden.
        let items = component_candidates("he", None, &builtin, &imports);
        assert!(items.iter().all(|i| i.label != "heading"));
    }

    #[test]
    fn attached_properties_complete_under_the_host_component() {
        let builtin = Module::default();
        let imports = vec![kirigami_import()];

        let items = component_candidates(
            "Kirigami.ScrollablePage.in",
            None,
            &builtin,
            &imports,
        );
        let attached = items
            .iter()
            .find(|i| i.label == "Kirigami.ScrollablePage.inView")
            .expect("attached property candidate");
        assert_eq!(attached.kind, CompletionKind::Property);
        assert_eq!(
            attached.detail.as_deref(),
            Some("attached Kirigami.ScrollablePage")
        );
    }

    #[test]
    fn enum_members_complete_dotted() {
        let builtin = Module::from_document(
            &parse(
                r#"Module {
    Component {
        name: "QQuickText"
        exports: ["QtQuick/Text 2.0"]
        Enum {
            name: "HAlignment"
            values: { "AlignLeft": 1, "AlignRight": 2 }
        }
    }
}"#,
            )
            .unwrap(),
        )
        .unwrap();

        let items = component_candidates("Text.Align", None, &builtin, &[]);
        let left = items.iter().find(|i| i.label == "Text.AlignLeft").unwrap();
        assert_eq!(left.kind, CompletionKind::EnumMember);
        assert_eq!(left.detail.as_deref(), Some("Text.HAlignment"));
    }

    #[test]
    fn unresolved_imports_contribute_nothing() {
        let mut import = kirigami_import();
        import.module = None;
        let items = component_candidates("Kirigami.", None, &Module::default(), &[import]);
        assert!(items.is_empty());
    }

    #[test]
    fn import_statement_candidates() {
        let discovered = vec![
            (
                DiscoveredImport {
                    url: "org.kde.kirigami".into(),
                    major: 2,
                },
                10,
            ),
            (
                DiscoveredImport {
                    url: "QtQuick".into(),
                    major: 2,
                },
                15,
            ),
        ];

        let items = import_candidates("org.kde", &discovered);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "org.kde.kirigami 2.10");
        assert_eq!(items[0].kind, CompletionKind::Import);
    }
}
