//! Type URIs: the identity of a type as seen by the typing pass.

use serde::Serialize;

/// The identity of a type. Primitive URIs carry an empty module path;
/// component URIs carry the path and major version of the module that
/// provides them. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypeUri {
    /// Dotted module path; empty for primitives.
    pub module: String,
    pub major: i64,
    pub name: String,
    pub is_list: bool,
    pub is_pointer: bool,
}

impl TypeUri {
    pub fn primitive(name: &str) -> Self {
        TypeUri {
            module: String::new(),
            major: 0,
            name: name.to_string(),
            is_list: false,
            is_pointer: false,
        }
    }

    pub fn number() -> Self {
        Self::primitive("number")
    }

    pub fn string() -> Self {
        Self::primitive("string")
    }

    pub fn bool() -> Self {
        Self::primitive("bool")
    }

    /// The catch-all type for values the analysis cannot pin down.
    pub fn complex() -> Self {
        Self::primitive("complexType")
    }

    pub fn component(module: &str, major: i64, name: &str) -> Self {
        TypeUri {
            module: module.to_string(),
            major,
            name: name.to_string(),
            is_list: false,
            is_pointer: false,
        }
    }

    pub fn as_list(mut self) -> Self {
        self.is_list = true;
        self
    }

    pub fn as_pointer(mut self) -> Self {
        self.is_pointer = true;
        self
    }

    pub fn is_primitive(&self) -> bool {
        self.module.is_empty()
    }

    /// Map a declared property type name onto a URI: the QML value-type
    /// names collapse onto the primitives, everything else is a component
    /// of the providing module.
    pub fn for_property_type(type_name: &str, module: &str, major: i64) -> Self {
        match type_name {
            "int" | "uint" | "real" | "double" | "float" => Self::number(),
            "string" | "QString" => Self::string(),
            "bool" => Self::bool(),
            "var" | "variant" | "QVariant" => Self::complex(),
            _ => Self::component(module, major, type_name),
        }
    }
}

impl std::fmt::Display for TypeUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.module.is_empty() {
            write!(f, "{} {}/", self.module, self.major)?;
        }
        write!(f, "{}", self.name)?;
        if self.is_list {
            write!(f, "[]")?;
        }
        if self.is_pointer {
            write!(f, "*")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_have_empty_module_paths() {
        assert!(TypeUri::number().is_primitive());
        assert!(TypeUri::complex().is_primitive());
        assert!(!TypeUri::component("QtQuick", 2, "Item").is_primitive());
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(
            TypeUri::for_property_type("double", "QtQuick", 2),
            TypeUri::number()
        );
        assert_ne!(
            TypeUri::component("QtQuick", 2, "Item"),
            TypeUri::component("QtQuick", 2, "Item").as_list()
        );
    }

    #[test]
    fn property_types_map_onto_primitives() {
        assert_eq!(TypeUri::for_property_type("int", "M", 1), TypeUri::number());
        assert_eq!(TypeUri::for_property_type("QString", "M", 1), TypeUri::string());
        assert_eq!(TypeUri::for_property_type("var", "M", 1), TypeUri::complex());
        assert_eq!(
            TypeUri::for_property_type("QQuickItem", "QtQuick", 2),
            TypeUri::component("QtQuick", 2, "QQuickItem")
        );
    }
}
