//! QML static-analysis engine.
//!
//! This crate is the analytic core shared by the lint CLI, the refactoring
//! engine and any editor front-end. It parses QML sources with an injected
//! tree-sitter grammar, resolves module imports against on-disk `qmltypes`
//! catalogues, marks lexical and object scopes, lowers embedded script
//! regions to control-flow graphs and runs a flow-sensitive typing pass
//! over them.
//!
//! The entry point is [`engine::Engine`]:
//!
//! ```ignore
//! let language = syntax::GrammarLoader::new().qml()?;
//! let builtin = builtin::builtin_module()?;
//! let mut engine = Engine::new(language, builtin, search::default_search_paths()?)?;
//! engine.ingest("main.qml", source)?;
//! ```

pub mod builtin;
pub mod cfg;
pub mod complete;
pub mod engine;
pub mod error;
pub mod facts;
pub mod flow;
pub mod imports;
pub mod queries;
pub mod resolve;
pub mod scopes;
pub mod search;
pub mod srcrange;
pub mod syntax;
pub mod types;
pub mod typing;

pub use engine::{Engine, FileContext, ImportRecord};
pub use error::{AnalysisError, ResolveError};
pub use srcrange::{Point, SpanRange};
pub use types::TypeUri;
