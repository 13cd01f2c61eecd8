//! Parser and unmarshaller for the qmltypes catalogue format.
//!
//! A catalogue file describes the components of a QML module: their exported
//! names, properties, enums and attached types. The format is a small nested
//! object syntax with a handful of `import` statements at the head:
//!
//! ```qmltypes
//! import QtQuick.tooling 1.2
//!
//! Module {
//!     dependencies: []
//!     Component {
//!         name: "QQuickRectangle"
//!         exports: ["QtQuick/Rectangle 2.0"]
//!         Property { name: "color"; type: "QColor" }
//!     }
//! }
//! ```
//!
//! This crate provides:
//! - Lexing and parsing into a [`Document`] of [`Object`]/[`Value`] nodes
//! - Field access with structured, field-chain error context
//! - The [`Module`]/[`Component`] records used by the analysis engine

mod error;
mod lex;
mod module;
mod parse;
mod value;

pub use error::CatalogueError;
pub use module::{Component, Enum, Export, Module, Property, parse_export};
pub use parse::{Document, Import, parse};
pub use value::{Item, Object, Value};
