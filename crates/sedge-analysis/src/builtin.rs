//! The bundled builtin module: the core QtQuick components every file can
//! reference without an import.

use sedge_qmltypes::{CatalogueError, Module};

static BUILTINS: &str = include_str!("../assets/builtins.qmltypes");

/// Parse the embedded builtins catalogue.
pub fn builtin_module() -> Result<Module, CatalogueError> {
    let doc = sedge_qmltypes::parse(BUILTINS)?;
    Module::from_document(&doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_parse_and_export_the_core_components() {
        let module = builtin_module().expect("embedded builtins must parse");
        for name in ["Item", "Rectangle", "Text", "QtObject", "MouseArea"] {
            assert!(
                module.component(name).is_some(),
                "missing builtin component {name}"
            );
        }

        let rect = module.component("Rectangle").unwrap();
        assert!(rect.properties.iter().any(|p| p.name == "color"));

        let text = module.component("Text").unwrap();
        assert!(!text.enums.is_empty());
    }
}
