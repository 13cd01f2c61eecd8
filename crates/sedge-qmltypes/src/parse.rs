//! Recursive-descent parser for the catalogue syntax.
//!
//! Grammar:
//!
//! ```text
//! File   := Import* Object
//! Import := "import" QualifiedName Float
//! Object := Ident "{" (Field | Object ";"?)* "}"
//! Field  := Ident ":" Value
//! Value  := Bool | "-"? Int | String | List | Map | Object
//! ```

use crate::error::CatalogueError;
use crate::lex::Token;
use crate::value::{Item, Object, Value};
use logos::Logos;
use std::ops::Range;

/// A parsed catalogue file: header imports plus the root object.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub imports: Vec<Import>,
    pub root: Object,
}

/// A header import: `import QtQuick.tooling 1.2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// Dotted module name.
    pub path: String,
    pub major: i64,
    pub minor: i64,
}

/// Parse catalogue source into a [`Document`].
pub fn parse(source: &str) -> Result<Document, CatalogueError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(tok) = lexer.next() {
        match tok {
            Ok(t) => tokens.push((t, lexer.span())),
            Err(()) => {
                return Err(error_at(source, lexer.span().start, "unrecognised token"));
            }
        }
    }

    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let doc = parser.document()?;
    if let Some((tok, span)) = parser.peek_spanned() {
        return Err(error_at(
            source,
            span.start,
            &format!("expected end of file, found {}", tok.describe()),
        ));
    }
    Ok(doc)
}

fn error_at(source: &str, offset: usize, message: &str) -> CatalogueError {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, str::len) + 1;
    CatalogueError::Parse {
        line,
        column,
        message: message.to_string(),
    }
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<(Token<'src>, Range<usize>)>,
    pos: usize,
}

impl<'src> Parser<'src> {
    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_spanned(&self) -> Option<(&Token<'src>, &Range<usize>)> {
        self.tokens.get(self.pos).map(|(t, s)| (t, s))
    }

    fn peek2(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos + 1).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<(Token<'src>, Range<usize>)> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| s.start)
            .unwrap_or(self.source.len())
    }

    fn fail(&self, message: &str) -> CatalogueError {
        error_at(self.source, self.offset(), message)
    }

    fn expect(&mut self, want: Token<'src>, what: &str) -> Result<(), CatalogueError> {
        match self.advance() {
            Some((tok, _)) if tok == want => Ok(()),
            Some((tok, span)) => Err(error_at(
                self.source,
                span.start,
                &format!("expected {what}, found {}", tok.describe()),
            )),
            None => Err(self.fail(&format!("expected {what}, found end of file"))),
        }
    }

    fn ident(&mut self, what: &str) -> Result<&'src str, CatalogueError> {
        match self.advance() {
            Some((Token::Ident(name), _)) => Ok(name),
            Some((tok, span)) => Err(error_at(
                self.source,
                span.start,
                &format!("expected {what}, found {}", tok.describe()),
            )),
            None => Err(self.fail(&format!("expected {what}, found end of file"))),
        }
    }

    fn document(&mut self) -> Result<Document, CatalogueError> {
        let mut imports = Vec::new();
        while self.peek() == Some(&Token::Import) {
            imports.push(self.import()?);
        }
        let root = self.object()?;
        Ok(Document { imports, root })
    }

    fn import(&mut self) -> Result<Import, CatalogueError> {
        self.expect(Token::Import, "'import'")?;
        let mut parts = vec![self.ident("module name")?.to_string()];
        while self.peek() == Some(&Token::Dot) {
            self.advance();
            parts.push(self.ident("module name part")?.to_string());
        }
        let (major, minor) = match self.advance() {
            Some((Token::Float(text), span)) => {
                let (maj, min) = text.split_once('.').unwrap_or((text, "0"));
                let parse = |s: &str| {
                    s.parse::<i64>().map_err(|_| {
                        error_at(self.source, span.start, "bad import version number")
                    })
                };
                (parse(maj)?, parse(min)?)
            }
            Some((tok, span)) => {
                return Err(error_at(
                    self.source,
                    span.start,
                    &format!("expected import version, found {}", tok.describe()),
                ));
            }
            None => return Err(self.fail("expected import version, found end of file")),
        };
        Ok(Import {
            path: parts.join("."),
            major,
            minor,
        })
    }

    fn object(&mut self) -> Result<Object, CatalogueError> {
        let name = self.ident("object name")?.to_string();
        self.expect(Token::LBrace, "'{'")?;
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(Token::RBrace) => {
                    self.advance();
                    break;
                }
                Some(Token::Ident(_)) => {
                    match self.peek2() {
                        Some(Token::LBrace) => items.push(Item::Child(self.object()?)),
                        Some(Token::Colon) => {
                            let name = self.ident("field name")?.to_string();
                            self.expect(Token::Colon, "':'")?;
                            let value = self.value()?;
                            items.push(Item::Field { name, value });
                        }
                        _ => {
                            self.advance();
                            return Err(self.fail("expected ':' or '{' after identifier"));
                        }
                    }
                    if self.peek() == Some(&Token::Semi) {
                        self.advance();
                    }
                }
                Some(tok) => {
                    return Err(self.fail(&format!(
                        "expected field, nested object or '}}', found {}",
                        tok.describe()
                    )));
                }
                None => return Err(self.fail("unclosed object body")),
            }
        }
        Ok(Object { name, items })
    }

    fn value(&mut self) -> Result<Value, CatalogueError> {
        match self.peek() {
            Some(Token::True) => {
                self.advance();
                Ok(Value::Bool(true))
            }
            Some(Token::False) => {
                self.advance();
                Ok(Value::Bool(false))
            }
            Some(Token::Minus) => {
                self.advance();
                let n = self.int("integer after '-'")?;
                Ok(Value::Int(-n))
            }
            Some(Token::Int(_)) => {
                let n = self.int("integer")?;
                Ok(Value::Int(n))
            }
            Some(Token::Str(raw)) => {
                let s = unquote(raw);
                self.advance();
                Ok(Value::String(s))
            }
            Some(Token::LBracket) => self.list(),
            Some(Token::LBrace) => self.map(),
            Some(Token::Ident(_)) => Ok(Value::Object(self.object()?)),
            Some(tok) => Err(self.fail(&format!("expected value, found {}", tok.describe()))),
            None => Err(self.fail("expected value, found end of file")),
        }
    }

    fn int(&mut self, what: &str) -> Result<i64, CatalogueError> {
        match self.advance() {
            Some((Token::Int(text), span)) => text
                .parse::<i64>()
                .map_err(|_| error_at(self.source, span.start, "integer out of range")),
            Some((tok, span)) => Err(error_at(
                self.source,
                span.start,
                &format!("expected {what}, found {}", tok.describe()),
            )),
            None => Err(self.fail(&format!("expected {what}, found end of file"))),
        }
    }

    fn list(&mut self) -> Result<Value, CatalogueError> {
        self.expect(Token::LBracket, "'['")?;
        let mut values = Vec::new();
        if self.peek() != Some(&Token::RBracket) {
            values.push(self.value()?);
            while self.peek() == Some(&Token::Comma) {
                self.advance();
                values.push(self.value()?);
            }
        }
        self.expect(Token::RBracket, "']'")?;
        Ok(Value::List(values))
    }

    fn map(&mut self) -> Result<Value, CatalogueError> {
        self.expect(Token::LBrace, "'{'")?;
        let mut entries = Vec::new();
        if self.peek() != Some(&Token::RBrace) {
            entries.push(self.map_entry()?);
            while self.peek() == Some(&Token::Comma) {
                self.advance();
                entries.push(self.map_entry()?);
            }
        }
        self.expect(Token::RBrace, "'}'")?;
        Ok(Value::Map(entries))
    }

    fn map_entry(&mut self) -> Result<(String, Value), CatalogueError> {
        let key = match self.advance() {
            Some((Token::Ident(name), _)) => name.to_string(),
            Some((Token::Str(raw), _)) => unquote(raw),
            Some((tok, span)) => {
                return Err(error_at(
                    self.source,
                    span.start,
                    &format!("expected map key, found {}", tok.describe()),
                ));
            }
            None => return Err(self.fail("expected map key, found end of file")),
        };
        self.expect(Token::Colon, "':'")?;
        let value = self.value()?;
        Ok((key, value))
    }
}

/// Strip the surrounding double quotes from a string token.
fn unquote(raw: &str) -> String {
    raw.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_imports_and_root() {
        let doc = parse("import QtQuick.tooling 1.2\nModule { }").unwrap();
        assert_eq!(
            doc.imports,
            vec![Import {
                path: "QtQuick.tooling".into(),
                major: 1,
                minor: 2
            }]
        );
        assert_eq!(doc.root.name, "Module");
        assert!(doc.root.items.is_empty());
    }

    #[test]
    fn parses_scalars_lists_and_maps() {
        let doc = parse(
            r#"Module {
                dependencies: ["QtQuick 2.0"]
                Component {
                    name: "QQuickText"
                    revision: -1
                    composite: true
                    Enum {
                        name: "HAlignment"
                        values: { "AlignLeft": 1, "AlignRight": 2 }
                    }
                }
            }"#,
        )
        .unwrap();

        let comp = doc.root.children_of("Component").next().unwrap();
        assert_eq!(comp.field_str("name").unwrap().as_deref(), Some("QQuickText"));
        assert_eq!(comp.field_int("revision").unwrap(), Some(-1));
        assert_eq!(comp.field_bool("composite").unwrap(), Some(true));

        let en = comp.children_of("Enum").next().unwrap();
        let values = en.field_int_map("values").unwrap();
        assert_eq!(values["AlignLeft"], 1);
        assert_eq!(values["AlignRight"], 2);
    }

    #[test]
    fn semicolons_between_fields_are_accepted() {
        let doc = parse(r#"Module { Property { name: "color"; type: "QColor"; isList: false } }"#)
            .unwrap();
        let prop = doc.root.children_of("Property").next().unwrap();
        assert_eq!(prop.field_str("type").unwrap().as_deref(), Some("QColor"));
        assert_eq!(prop.field_bool("isList").unwrap(), Some(false));
    }

    #[test]
    fn reports_position_of_errors() {
        let err = parse("Module {\n  name ]\n}").unwrap_err();
        match err {
            CatalogueError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nested_objects_as_values() {
        let doc = parse(r#"Root { inner: Sub { x: 1 } }"#).unwrap();
        let inner = doc.root.find_field("inner").unwrap().as_object().unwrap();
        assert_eq!(inner.name, "Sub");
        assert_eq!(inner.field_int("x").unwrap(), Some(1));
    }
}
