//! Engine integration tests against a real QML grammar.
//!
//! The grammar is loaded dynamically; when none is installed the tests
//! return early with a note, the same way the grammar-loader tests skip
//! when no grammar has been built.

use sedge_analysis::engine::Engine;
use sedge_analysis::syntax::GrammarLoader;
use sedge_analysis::{builtin, error::ResolveError};
use std::path::PathBuf;
use tree_sitter::Language;

fn qml_grammar() -> Option<Language> {
    let loader = GrammarLoader::new();
    match loader.qml() {
        Some(language) => Some(language),
        None => {
            eprintln!("skipping: no qml grammar found on SEDGE_GRAMMAR_PATH");
            None
        }
    }
}

fn engine_with_paths(language: Language, paths: Vec<PathBuf>) -> Engine {
    let builtin = builtin::builtin_module().expect("builtins parse");
    let mut engine = Engine::new(language, builtin, paths).expect("engine");
    engine.set_plugin_dump(false);
    engine
}

const KIRIGAMI: &str = r#"
Module {
    Component {
        name: "QQuickAboutPage"
        exports: ["org.kde.kirigami/AboutPage 2.10"]
        Property { name: "heading"; type: "string" }
        Property { name: "padding"; type: "double" }
    }
}
"#;

fn kirigami_tree() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("org/kde/kirigami.2.10");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("plugins.qmltypes"), KIRIGAMI).unwrap();
    tmp
}

#[test]
fn unused_imports_have_false_bits() {
    let Some(language) = qml_grammar() else { return };
    let mut engine = engine_with_paths(language, vec![]);

    let src = "import A.B 1.0\nimport C.D 1.0 as X\nRectangle { }\n";
    engine.ingest("test.qml", src.to_string()).unwrap();

    let ctx = engine.get_context("test.qml").unwrap();
    assert_eq!(ctx.imports.len(), 2);
    // Neither module resolves, and nothing references them either way.
    let used = engine.used_imports("test.qml", ctx.root()).unwrap();
    assert_eq!(used, vec![false, false]);

    // The failed imports are retained with their error, not dropped.
    for import in &ctx.imports {
        assert!(import.module.is_none());
        assert!(import.error.is_some());
    }
}

#[test]
fn alias_prefix_marks_import_used_and_resolves_component() {
    let Some(language) = qml_grammar() else { return };
    let tmp = kirigami_tree();
    let mut engine = engine_with_paths(language, vec![tmp.path().to_path_buf()]);

    let src = "import org.kde.kirigami 2.10 as Kirigami\nKirigami.AboutPage { }\n";
    engine.ingest("about.qml", src.to_string()).unwrap();

    let ctx = engine.get_context("about.qml").unwrap();
    assert_eq!(ctx.imports.len(), 1);
    assert_eq!(ctx.imports[0].alias.as_deref(), Some("Kirigami"));
    assert!(ctx.imports[0].module.is_some());

    let used = engine.used_imports("about.qml", ctx.root()).unwrap();
    assert_eq!(used, vec![true]);

    let (component, name, _module) = engine
        .resolve_component(Some("Kirigami"), "AboutPage", "about.qml")
        .unwrap();
    assert_eq!(component.sane_name(), "AboutPage");
    assert_eq!(name.path, "org.kde.kirigami");
    assert_eq!((name.major, name.minor), (2, 10));
}

#[test]
fn component_not_found_for_wrong_alias() {
    let Some(language) = qml_grammar() else { return };
    let tmp = kirigami_tree();
    let mut engine = engine_with_paths(language, vec![tmp.path().to_path_buf()]);

    let src = "import org.kde.kirigami 2.10 as Kirigami\nKirigami.AboutPage { }\n";
    engine.ingest("about.qml", src.to_string()).unwrap();

    assert!(
        engine
            .resolve_component(Some("Other"), "AboutPage", "about.qml")
            .is_err()
    );
    assert!(
        engine
            .resolve_component(Some("Kirigami"), "NoSuchThing", "about.qml")
            .is_err()
    );
}

#[test]
fn object_scopes_are_seeded_with_component_properties() {
    let Some(language) = qml_grammar() else { return };
    let mut engine = engine_with_paths(language, vec![]);

    let src = "Rectangle { }\n";
    engine.ingest("rect.qml", src.to_string()).unwrap();

    let ctx = engine.get_context("rect.qml").unwrap();
    // Find the object declaration node and look its seeded properties up.
    let mut stack = vec![ctx.root()];
    let mut seen = false;
    while let Some(node) = stack.pop() {
        if node.kind() == "object_declaration" {
            seen = true;
            assert!(
                ctx.scopes.lookup(&node, "color").is_some(),
                "Rectangle.color not seeded"
            );
            assert!(
                ctx.scopes.lookup(&node, "width").is_none(),
                "prototype chains are not materialised"
            );
        }
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                stack.push(child);
            }
        }
    }
    assert!(seen, "no object declaration parsed");
}

#[test]
fn forget_drops_the_context() {
    let Some(language) = qml_grammar() else { return };
    let mut engine = engine_with_paths(language, vec![]);

    engine.ingest("gone.qml", "Item { }\n".to_string()).unwrap();
    assert!(engine.get_context("gone.qml").is_ok());
    engine.forget("gone.qml");
    assert!(engine.get_context("gone.qml").is_err());
}

#[test]
fn relative_imports_carry_an_empty_module() {
    let Some(language) = qml_grammar() else { return };
    let mut engine = engine_with_paths(language, vec![]);

    let src = "import \"../components\" as Local\nItem { }\n";
    engine.ingest("rel.qml", src.to_string()).unwrap();

    let ctx = engine.get_context("rel.qml").unwrap();
    assert_eq!(ctx.imports.len(), 1);
    let import = &ctx.imports[0];
    assert!(import.uri.is_relative);
    assert_eq!(import.uri.path, "../components");
    assert_eq!(import.alias.as_deref(), Some("Local"));
    assert!(import.module.is_some(), "relative imports get an empty module");
    assert!(import.error.is_none());
    assert_eq!(
        import.to_source_string(),
        "import \"../components\" as Local"
    );
}

#[test]
fn completions_follow_the_file_imports() {
    let Some(language) = qml_grammar() else { return };
    let tmp = kirigami_tree();
    let mut engine = engine_with_paths(language, vec![tmp.path().to_path_buf()]);

    let src = "import org.kde.kirigami 2.10 as Kirigami\nItem { }\n";
    engine.ingest("complete.qml", src.to_string()).unwrap();

    let items = engine
        .component_completions("complete.qml", "Kirigami.Ab", None)
        .unwrap();
    assert!(items.iter().any(|i| i.label == "Kirigami.AboutPage"));

    // Builtins complete without any import.
    let items = engine
        .component_completions("complete.qml", "Rect", None)
        .unwrap();
    assert!(items.iter().any(|i| i.label == "Rectangle"));
}

#[test]
fn inline_components_are_enumerated() {
    let Some(language) = qml_grammar() else { return };
    let mut engine = engine_with_paths(language, vec![]);

    let src = "Item {\n    component Banner : Rectangle {\n        radius: 4\n    }\n}\n";
    engine.ingest("inline.qml", src.to_string()).unwrap();

    let ctx = engine.get_context("inline.qml").unwrap();
    let inline = engine.inline_components("inline.qml", ctx.root()).unwrap();
    assert_eq!(inline.len(), 1);
    assert_eq!(
        inline[0].name.utf8_text(ctx.body.as_bytes()).unwrap(),
        "Banner"
    );
    assert_eq!(
        inline[0].superclass.utf8_text(ctx.body.as_bytes()).unwrap(),
        "Rectangle"
    );
}

#[test]
fn module_resolution_errors_mention_the_import_triple() {
    let Some(language) = qml_grammar() else { return };
    let mut engine = engine_with_paths(language, vec![]);

    let parts: Vec<String> = vec!["no".into(), "such".into()];
    let err = engine.module(&parts, 4, 2).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("no.such 4.2"), "got: {message}");
    // The memoised error is shared on repeat lookups.
    let again = engine.module(&parts, 4, 2).unwrap_err();
    match (err, again) {
        (
            sedge_analysis::AnalysisError::ResolveFailed { source: a, .. },
            sedge_analysis::AnalysisError::ResolveFailed { source: b, .. },
        ) => {
            assert!(std::sync::Arc::ptr_eq(&a, &b));
            assert!(matches!(*a, ResolveError::PluginDumpDisabled(_)));
        }
        other => panic!("unexpected errors: {other:?}"),
    }
}
