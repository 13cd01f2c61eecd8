//! Token definitions for the catalogue syntax.

use logos::Logos;

/// Catalogue tokens. Whitespace and comments are skipped; generated
/// catalogue files carry a `//` banner at the top.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum Token<'src> {
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token("-")]
    Minus,

    #[token("import")]
    Import,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),

    /// A double-quoted string, quotes included. Stripped by the parser.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    Str(&'src str),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice())]
    Float(&'src str),

    #[regex(r"[0-9]+", |lex| lex.slice())]
    Int(&'src str),
}

impl<'src> Token<'src> {
    /// Short human-readable description for parse errors.
    pub fn describe(&self) -> &'static str {
        match self {
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::Colon => "':'",
            Token::Comma => "','",
            Token::Semi => "';'",
            Token::Dot => "'.'",
            Token::Minus => "'-'",
            Token::Import => "'import'",
            Token::True | Token::False => "boolean",
            Token::Ident(_) => "identifier",
            Token::Str(_) => "string",
            Token::Float(_) => "number",
            Token::Int(_) => "integer",
        }
    }
}
