//! Error type for catalogue parsing and unmarshalling.

use thiserror::Error;

/// Error produced while parsing or unmarshalling a catalogue file.
///
/// Unmarshalling failures are wrapped in a chain naming every traversed
/// field and list element, so a schema mismatch three levels deep reads
/// `in field "Component": in element 2: in field "values": not a map`.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("not a {0}")]
    NotA(&'static str),

    #[error("missing field {0:?}")]
    MissingField(String),

    #[error("in field {field:?}: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<CatalogueError>,
    },

    #[error("in element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<CatalogueError>,
    },
}

impl CatalogueError {
    /// Wrap this error with the name of the field being unmarshalled.
    pub fn in_field(self, field: &str) -> Self {
        CatalogueError::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    /// Wrap this error with the index of the list element being unmarshalled.
    pub fn in_element(self, index: usize) -> Self {
        CatalogueError::Element {
            index,
            source: Box::new(self),
        }
    }
}
