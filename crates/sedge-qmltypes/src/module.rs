//! The module and component records unmarshalled from a catalogue.

use crate::error::CatalogueError;
use crate::parse::Document;
use crate::value::Object;
use std::collections::BTreeMap;

/// A parsed QML module: the set of components it provides plus the names of
/// the modules it depends on. Immutable after load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub dependencies: Vec<String>,
    pub components: Vec<Component>,
}

/// One component of a module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Component {
    /// The raw (C++-side) name, e.g. `QQuickRectangle`.
    pub name: String,
    /// Export strings of the form `url/Name major.minor`.
    pub exports: Vec<String>,
    pub properties: Vec<Property>,
    pub enums: Vec<Enum>,
    /// Raw name of the attached type, if any.
    pub attached_type: Option<String>,
    sane_name: String,
}

/// A property of a component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Property {
    pub name: String,
    pub type_name: String,
    pub is_list: bool,
    pub is_pointer: bool,
}

/// An enum of a component. The catalogue syntax permits the values block to
/// be either a map literal or an ordered list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enum {
    pub name: String,
    pub values: BTreeMap<String, i64>,
}

/// A parsed export string: `org.kde.kirigami/AboutPage 2.10`.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub url: String,
    pub name: String,
    pub major: i64,
    pub minor: i64,
}

/// Split an export string into its parts. Exports with no slash or no
/// version separator are malformed; a version that fails to parse falls
/// back piecewise to `1.0`.
pub fn parse_export(export: &str) -> Option<Export> {
    let (url, rest) = export.split_once('/')?;
    let (name, version) = rest.split_once(' ')?;

    let (major, minor) = match version.split_once('.') {
        None => (1, 0),
        Some((maj, min)) => match maj.parse::<i64>() {
            Err(_) => (1, 0),
            Ok(maj) => (maj, min.parse::<i64>().unwrap_or(0)),
        },
    };

    Some(Export {
        url: url.to_string(),
        name: name.to_string(),
        major,
        minor,
    })
}

impl Component {
    /// Unmarshal a component from a `Component { … }` object.
    pub fn from_object(obj: &Object) -> Result<Self, CatalogueError> {
        let name = obj.field_str("name")?.unwrap_or_default();
        let exports = obj.field_str_list("exports")?;

        let mut properties = Vec::new();
        for (idx, child) in obj.children_of("Property").enumerate() {
            properties.push(Property::from_object(child).map_err(|e| e.in_element(idx))?);
        }

        let mut enums = Vec::new();
        for (idx, child) in obj.children_of("Enum").enumerate() {
            enums.push(Enum::from_object(child).map_err(|e| e.in_element(idx))?);
        }

        let attached_type = obj.field_str("attachedType")?.filter(|s| !s.is_empty());

        let sane_name = exports
            .first()
            .and_then(|e| parse_export(e))
            .map(|e| e.name)
            .unwrap_or_else(|| name.clone());

        Ok(Component {
            name,
            exports,
            properties,
            enums,
            attached_type,
            sane_name,
        })
    }

    /// The canonical external name: the short name of the first export, or
    /// the raw name when the component exports nothing. Consumers always
    /// match components by this name.
    pub fn sane_name(&self) -> &str {
        &self.sane_name
    }

    /// Parsed forms of every export string.
    pub fn parsed_exports(&self) -> impl Iterator<Item = Export> + '_ {
        self.exports.iter().filter_map(|e| parse_export(e))
    }
}

impl Property {
    pub fn from_object(obj: &Object) -> Result<Self, CatalogueError> {
        Ok(Property {
            name: obj.field_str("name")?.unwrap_or_default(),
            type_name: obj.field_str("type")?.unwrap_or_default(),
            is_list: obj.field_bool("isList")?.unwrap_or(false),
            is_pointer: obj.field_bool("isPointer")?.unwrap_or(false),
        })
    }
}

impl Enum {
    pub fn from_object(obj: &Object) -> Result<Self, CatalogueError> {
        Ok(Enum {
            name: obj.field_str("name")?.unwrap_or_default(),
            values: obj.field_int_map("values")?,
        })
    }
}

impl Module {
    /// Unmarshal a module from a parsed catalogue document.
    pub fn from_document(doc: &Document) -> Result<Self, CatalogueError> {
        Self::from_object(&doc.root)
    }

    pub fn from_object(obj: &Object) -> Result<Self, CatalogueError> {
        let dependencies = obj.field_str_list("dependencies")?;

        let mut components = Vec::new();
        for (idx, child) in obj.children_of("Component").enumerate() {
            components.push(
                Component::from_object(child)
                    .map_err(|e| e.in_element(idx).in_field("Component"))?,
            );
        }

        Ok(Module {
            dependencies,
            components,
        })
    }

    /// Find a component by its sane name.
    pub fn component(&self, sane_name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.sane_name() == sane_name)
    }
}
