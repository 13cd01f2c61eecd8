//! The parsed value tree of a catalogue document, with the typed accessors
//! used for unmarshalling.

use crate::error::CatalogueError;
use std::collections::BTreeMap;

/// A named object: `Ident { items }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: String,
    pub items: Vec<Item>,
}

/// One entry of an object body: either a `name: value` field or a nested
/// child object.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Field { name: String, value: Value },
    Child(Object),
}

/// A scalar or composite value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    /// Quotes already stripped.
    String(String),
    List(Vec<Value>),
    /// Ordered; keys already stripped of quotes.
    Map(Vec<(String, Value)>),
    Object(Object),
}

impl Object {
    /// Find a field value by name. First match wins.
    pub fn find_field(&self, name: &str) -> Option<&Value> {
        self.items.iter().find_map(|item| match item {
            Item::Field { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }

    /// All nested child objects with the given header name.
    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Object> {
        self.items.iter().filter_map(move |item| match item {
            Item::Child(obj) if obj.name == name => Some(obj),
            _ => None,
        })
    }

    /// Unmarshal a scalar field, wrapping failures with the field name.
    /// Missing fields yield `Ok(None)`; unrecognised fields are simply never
    /// asked for.
    pub fn field_str(&self, name: &str) -> Result<Option<String>, CatalogueError> {
        match self.find_field(name) {
            None => Ok(None),
            Some(v) => v.as_str().map(Some).map_err(|e| e.in_field(name)),
        }
    }

    pub fn field_bool(&self, name: &str) -> Result<Option<bool>, CatalogueError> {
        match self.find_field(name) {
            None => Ok(None),
            Some(v) => v.as_bool().map(Some).map_err(|e| e.in_field(name)),
        }
    }

    pub fn field_int(&self, name: &str) -> Result<Option<i64>, CatalogueError> {
        match self.find_field(name) {
            None => Ok(None),
            Some(v) => v.as_int().map(Some).map_err(|e| e.in_field(name)),
        }
    }

    /// Unmarshal a list-of-strings field. Missing means empty.
    pub fn field_str_list(&self, name: &str) -> Result<Vec<String>, CatalogueError> {
        match self.find_field(name) {
            None => Ok(Vec::new()),
            Some(v) => v.str_list().map_err(|e| e.in_field(name)),
        }
    }

    /// Unmarshal a name-to-integer field that accepts either a map literal
    /// or an ordered list whose 0-based indices become the values. Missing
    /// means empty.
    pub fn field_int_map(&self, name: &str) -> Result<BTreeMap<String, i64>, CatalogueError> {
        match self.find_field(name) {
            None => Ok(BTreeMap::new()),
            Some(v) => v.int_map().map_err(|e| e.in_field(name)),
        }
    }
}

impl Value {
    pub fn as_bool(&self) -> Result<bool, CatalogueError> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(CatalogueError::NotA("boolean")),
        }
    }

    pub fn as_int(&self) -> Result<i64, CatalogueError> {
        match self {
            Value::Int(i) => Ok(*i),
            _ => Err(CatalogueError::NotA("integer")),
        }
    }

    pub fn as_str(&self) -> Result<String, CatalogueError> {
        match self {
            Value::String(s) => Ok(s.clone()),
            _ => Err(CatalogueError::NotA("string")),
        }
    }

    pub fn as_object(&self) -> Result<&Object, CatalogueError> {
        match self {
            Value::Object(o) => Ok(o),
            _ => Err(CatalogueError::NotA("object")),
        }
    }

    pub fn str_list(&self) -> Result<Vec<String>, CatalogueError> {
        let Value::List(items) = self else {
            return Err(CatalogueError::NotA("list"));
        };
        items
            .iter()
            .enumerate()
            .map(|(idx, v)| v.as_str().map_err(|e| e.in_element(idx)))
            .collect()
    }

    /// Map-or-list reading: a map yields its entries, a list of strings
    /// yields each string mapped to its index.
    pub fn int_map(&self) -> Result<BTreeMap<String, i64>, CatalogueError> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), v.as_int().map_err(|e| e.in_field(k))?)))
                .collect(),
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(idx, v)| {
                    let name = v.as_str().map_err(|e| e.in_element(idx))?;
                    Ok((name, idx as i64))
                })
                .collect(),
            _ => Err(CatalogueError::NotA("map or list")),
        }
    }
}
