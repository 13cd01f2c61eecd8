//! The analysis engine: file contexts, the ingest pipeline, and the
//! queries the other tools are built on.

use crate::error::{AnalysisError, ResolveError};
use crate::imports::{self, ImportName};
use crate::queries::{QuerySet, collect_captures};
use crate::resolve::ModuleResolver;
use crate::scopes::{self, ScopeTable};
use crate::srcrange::SpanRange;
use crate::syntax;
use crate::typing;
use sedge_qmltypes::{Component, Module};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use streaming_iterator::StreamingIterator;
use tracing::debug;
use tree_sitter::{Language, Node, QueryCursor, Tree};

/// One resolved (or failed) import of a file. Exactly one of `module` and
/// `error` is set; relative imports resolve to an empty module.
#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub uri: ImportName,
    pub alias: Option<String>,
    pub module: Option<Arc<Module>>,
    pub error: Option<Arc<ResolveError>>,
    /// The full statement range, for diagnostics.
    pub range: SpanRange,
}

impl ImportRecord {
    /// The prefix a component of this import is written with: `Alias.` for
    /// aliased imports, empty otherwise.
    pub fn prefix(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{alias}."),
            None => String::new(),
        }
    }

    /// Render the import back to source form.
    pub fn to_source_string(&self) -> String {
        let mut out = if self.uri.is_relative {
            format!("import \"{}\"", self.uri.path)
        } else {
            format!(
                "import {} {}.{}",
                self.uri.path, self.uri.major, self.uri.minor
            )
        };
        if let Some(alias) = &self.alias {
            out.push_str(" as ");
            out.push_str(alias);
        }
        out
    }
}

/// Everything the engine knows about one ingested file. Immutable between
/// ingests; nodes handed out stay valid until the next `ingest` or
/// `forget` of the same uri.
pub struct FileContext {
    pub body: String,
    pub tree: Tree,
    pub imports: Vec<ImportRecord>,
    pub scopes: ScopeTable,
    /// Captured per-expression and per-import analysis failures.
    pub errors: Vec<AnalysisError>,
}

impl FileContext {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// A `var` declaration found in a statement block, with whether the
/// declared name is assigned again later in the block.
#[derive(Debug, Clone)]
pub struct VarDecl<'t> {
    pub keyword: Node<'t>,
    pub name: String,
    pub assigned_later: bool,
}

/// An inline component declaration: `component Name: Superclass { … }`.
#[derive(Debug, Clone, Copy)]
pub struct InlineComponent<'t> {
    pub name: Node<'t>,
    pub superclass: Node<'t>,
    pub body: Node<'t>,
}

/// Module path and major version the builtin components are attributed to.
pub const BUILTIN_MODULE: (&str, i64) = ("QtQuick", 2);

pub struct Engine {
    language: Language,
    queries: QuerySet,
    resolver: ModuleResolver,
    builtin: Module,
    contexts: HashMap<String, FileContext>,
}

impl Engine {
    /// Build an engine around an injected QML grammar, a builtin module and
    /// a list of module search roots. Query compilation failures surface
    /// here.
    pub fn new(
        language: Language,
        builtin: Module,
        search_paths: Vec<PathBuf>,
    ) -> Result<Self, AnalysisError> {
        let queries = QuerySet::new(&language)?;
        Ok(Engine {
            language,
            queries,
            resolver: ModuleResolver::new(search_paths),
            builtin,
            contexts: HashMap::new(),
        })
    }

    /// Enable or disable the qmlplugindump fallback (default on).
    pub fn set_plugin_dump(&mut self, enabled: bool) {
        self.resolver.set_plugin_dump(enabled);
    }

    pub fn queries(&self) -> &QuerySet {
        &self.queries
    }

    pub fn builtin_module(&self) -> &Module {
        &self.builtin
    }

    /// Run the full pipeline on a file, replacing any previous context
    /// under the same uri: parse, resolve imports in document order, mark
    /// scopes, seed object environments, type every embedded script region.
    pub fn ingest(&mut self, uri: &str, body: String) -> Result<(), AnalysisError> {
        let tree = syntax::parse(&self.language, &body)
            .ok_or_else(|| AnalysisError::ParseFailed(uri.to_string()))?;

        let mut errors = Vec::new();
        let mut records = Vec::new();

        let (absolute, relative) = imports::extract_imports(tree.root_node(), &body);
        for imp in absolute {
            let name = imp.name();
            match self.resolver.resolve(&imp.parts, imp.major, imp.minor) {
                Ok(module) => records.push(ImportRecord {
                    uri: name,
                    alias: imp.alias,
                    module: Some(module),
                    error: None,
                    range: imp.range,
                }),
                Err(error) => {
                    debug!(uri, import = %name, %error, "import failed to resolve");
                    records.push(ImportRecord {
                        uri: name,
                        alias: imp.alias,
                        module: None,
                        error: Some(error),
                        range: imp.range,
                    });
                }
            }
        }
        for imp in relative {
            records.push(ImportRecord {
                uri: ImportName::relative(&imp.path),
                alias: imp.alias,
                module: Some(Arc::new(Module::default())),
                error: None,
                range: imp.range,
            });
        }

        let mut table = ScopeTable::new();
        scopes::mark_scopes(tree.root_node(), &body, &self.queries, &mut table);
        scopes::seed_object_scopes(
            tree.root_node(),
            &body,
            &self.queries,
            &self.builtin,
            BUILTIN_MODULE,
            &records,
            &mut table,
        );

        for script in collect_captures(&self.queries.embedded_scripts, tree.root_node(), &body, "script")
        {
            let first = script.named_child(0);
            match first {
                Some(child) if child.kind() == "statement_block" => {
                    if let Err(e) = typing::type_region(script, &body, &mut table, &mut errors) {
                        errors.push(e);
                    }
                }
                Some(expr) => {
                    if let Err(e) = typing::type_expression(expr, &body, &mut table, &mut errors) {
                        errors.push(e);
                    }
                }
                None => {}
            }
        }

        self.contexts.insert(
            uri.to_string(),
            FileContext {
                body,
                tree,
                imports: records,
                scopes: table,
                errors,
            },
        );

        Ok(())
    }

    /// Drop the context of a file.
    pub fn forget(&mut self, uri: &str) {
        self.contexts.remove(uri);
    }

    pub fn get_context(&self, uri: &str) -> Result<&FileContext, AnalysisError> {
        self.contexts
            .get(uri)
            .ok_or_else(|| AnalysisError::FileNotIngested(uri.to_string()))
    }

    /// Resolve a written component name against a file's imports, in import
    /// order. A non-empty alias restricts the search to imports carrying
    /// that alias.
    pub fn resolve_component(
        &self,
        alias: Option<&str>,
        name: &str,
        uri: &str,
    ) -> Result<(Component, ImportName, Arc<Module>), AnalysisError> {
        let ctx = self.get_context(uri)?;

        for import in &ctx.imports {
            if alias.is_some() && import.alias.as_deref() != alias {
                continue;
            }
            let Some(module) = &import.module else {
                continue;
            };
            if let Some(component) = module.component(name) {
                return Ok((component.clone(), import.uri.clone(), module.clone()));
            }
        }

        Err(AnalysisError::ComponentNotFound {
            alias: alias.map(str::to_string),
            name: name.to_string(),
            uri: uri.to_string(),
        })
    }

    /// Every type reference under a subtree: type names in property
    /// declarations and type names heading object declarations.
    pub fn type_references<'t>(
        &self,
        uri: &str,
        node: Node<'t>,
    ) -> Result<Vec<Node<'t>>, AnalysisError> {
        let ctx = self.get_context(uri)?;
        let mut refs =
            collect_captures(&self.queries.property_types, node, &ctx.body, "ident");
        refs.extend(collect_captures(
            &self.queries.object_declaration_types,
            node,
            &ctx.body,
            "ident",
        ));
        Ok(refs)
    }

    /// One bit per import of the file: true iff some type reference in the
    /// subtree resolves to a component of that import. A reference whose
    /// alias prefix matches but whose component the catalogue lacks counts
    /// as a weak match.
    pub fn used_imports(&self, uri: &str, node: Node) -> Result<Vec<bool>, AnalysisError> {
        let ctx = self.get_context(uri)?;
        let refs = self.type_references(uri, node)?;
        let mut used = vec![false; ctx.imports.len()];

        for reference in refs {
            let written = reference.utf8_text(ctx.body.as_bytes()).unwrap_or("");
            for (idx, import) in ctx.imports.iter().enumerate() {
                if used[idx] {
                    continue;
                }
                let prefix = import.prefix();
                if let Some(module) = &import.module {
                    if module
                        .components
                        .iter()
                        .any(|c| written == format!("{prefix}{}", c.sane_name()))
                    {
                        used[idx] = true;
                        continue;
                    }
                }
                if !prefix.is_empty() && written.starts_with(&prefix) {
                    used[idx] = true;
                }
            }
        }

        Ok(used)
    }

    /// Resolve a module by dotted name and version. Delegates to the
    /// memoising resolver.
    pub fn module(
        &mut self,
        parts: &[String],
        vmaj: i64,
        vmin: i64,
    ) -> Result<Arc<Module>, AnalysisError> {
        self.resolver.resolve(parts, vmaj, vmin).map_err(|source| {
            AnalysisError::ResolveFailed {
                import: format!("{} {vmaj}.{vmin}", parts.join(".")),
                source,
            }
        })
    }

    /// Completion candidates for a component-name position in a file:
    /// the builtin module plus every resolved import.
    pub fn component_completions(
        &self,
        uri: &str,
        word: &str,
        enclosing: Option<&str>,
    ) -> Result<Vec<crate::complete::CompletionItem>, AnalysisError> {
        let ctx = self.get_context(uri)?;
        Ok(crate::complete::component_candidates(
            word,
            enclosing,
            &self.builtin,
            &ctx.imports,
        ))
    }

    /// Every inline component declaration under a subtree: its name, its
    /// superclass reference and its body block.
    pub fn inline_components<'t>(
        &self,
        uri: &str,
        node: Node<'t>,
    ) -> Result<Vec<InlineComponent<'t>>, AnalysisError> {
        let ctx = self.get_context(uri)?;
        let query = &self.queries.inline_components;

        let indices = (
            query.capture_index_for_name("name"),
            query.capture_index_for_name("superclass"),
            query.capture_index_for_name("body"),
        );
        let (Some(name_idx), Some(super_idx), Some(body_idx)) = indices else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, node, ctx.body.as_bytes());
        while let Some(m) = matches.next() {
            let get = |idx: u32| m.captures.iter().find(|c| c.index == idx).map(|c| c.node);
            let (Some(name), Some(superclass), Some(body)) =
                (get(name_idx), get(super_idx), get(body_idx))
            else {
                continue;
            };
            found.push(InlineComponent {
                name,
                superclass,
                body,
            });
        }

        Ok(found)
    }

    /// Every `var` declaration in the statement blocks under a subtree,
    /// with whether the declared name is assigned later in its block.
    pub fn var_declarations<'t>(
        &self,
        uri: &str,
        node: Node<'t>,
    ) -> Result<Vec<VarDecl<'t>>, AnalysisError> {
        let ctx = self.get_context(uri)?;
        let query = &self.queries.statement_blocks_with_var_declarations;

        let keyword_idx = query.capture_index_for_name("keyword");
        let name_idx = query.capture_index_for_name("name");
        let following_idx = query.capture_index_for_name("following");
        let (Some(keyword_idx), Some(name_idx), Some(following_idx)) =
            (keyword_idx, name_idx, following_idx)
        else {
            return Ok(Vec::new());
        };

        let mut decls = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(query, node, ctx.body.as_bytes());
        while let Some(m) = matches.next() {
            let keyword = m.captures.iter().find(|c| c.index == keyword_idx);
            let name = m.captures.iter().find(|c| c.index == name_idx);
            let (Some(keyword), Some(name)) = (keyword, name) else {
                continue;
            };
            let name = name.node.utf8_text(ctx.body.as_bytes()).unwrap_or("");

            let mut assigned_later = false;
            'following: for cap in m.captures.iter().filter(|c| c.index == following_idx) {
                for ident in collect_captures(
                    &self.queries.variable_assignments,
                    cap.node,
                    &ctx.body,
                    "ident",
                ) {
                    if ident.utf8_text(ctx.body.as_bytes()).unwrap_or("") == name {
                        assigned_later = true;
                        break 'following;
                    }
                }
            }

            decls.push(VarDecl {
                keyword: keyword.node,
                name: name.to_string(),
                assigned_later,
            });
        }

        Ok(decls)
    }
}
