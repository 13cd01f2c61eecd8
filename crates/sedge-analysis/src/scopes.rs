//! Lexical and object scopes.
//!
//! Scope information hangs off AST nodes through a side table keyed by the
//! parser's stable node ids. Strong scopes (statement blocks, script
//! bodies, the program, inline component declarations) participate in
//! lexical binding; weak scopes (object blocks) are seeded from the
//! declared component's properties and participate in lookup only.

use crate::engine::ImportRecord;
use crate::queries::{QuerySet, collect_captures};
use crate::types::TypeUri;
use sedge_qmltypes::Module;
use std::collections::HashMap;
use tree_sitter::Node;

/// Per-node analysis data.
#[derive(Debug, Default)]
pub struct NodeData {
    pub is_strong_scope: bool,
    pub is_weak_scope: bool,
    /// Local environment. Initialised empty the moment a node is marked as
    /// a scope.
    pub env: HashMap<String, TypeUri>,
    /// Cached inferred type of this node, if it is an expression the typing
    /// pass has visited.
    pub kind: Option<TypeUri>,
}

/// Node-id-keyed side table of [`NodeData`].
#[derive(Debug, Default)]
pub struct ScopeTable {
    data: HashMap<usize, NodeData>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: &Node) -> Option<&NodeData> {
        self.data.get(&node.id())
    }

    fn entry(&mut self, node: &Node) -> &mut NodeData {
        self.data.entry(node.id()).or_default()
    }

    /// Mark a node as a strong scope, allocating its empty environment.
    pub fn mark_strong(&mut self, node: &Node) {
        self.entry(node).is_strong_scope = true;
    }

    /// Mark a node as a weak scope, allocating its empty environment.
    pub fn mark_weak(&mut self, node: &Node) {
        self.entry(node).is_weak_scope = true;
    }

    /// Look a name up through the scope chain: the nearest enclosing scope
    /// (strong or weak) that binds the name wins.
    pub fn lookup(&self, node: &Node, name: &str) -> Option<&TypeUri> {
        let mut current = Some(*node);
        while let Some(n) = current {
            if let Some(data) = self.data.get(&n.id()) {
                if (data.is_strong_scope || data.is_weak_scope) && data.env.contains_key(name) {
                    return data.env.get(name);
                }
            }
            current = n.parent();
        }
        None
    }

    /// Bind a name in the nearest enclosing strong scope. Panics when no
    /// strong scope encloses the node: scope marking runs before any write,
    /// so that is a bug, not an input error.
    pub fn write(&mut self, node: &Node, name: &str, ty: TypeUri) {
        let mut current = Some(*node);
        while let Some(n) = current {
            if self.data.get(&n.id()).is_some_and(|d| d.is_strong_scope) {
                self.entry(&n).env.insert(name.to_string(), ty);
                return;
            }
            current = n.parent();
        }
        panic!("write of {name:?} with no enclosing strong scope");
    }

    /// Bind a name in the nearest enclosing weak-or-strong scope.
    pub fn write_weak(&mut self, node: &Node, name: &str, ty: TypeUri) {
        let mut current = Some(*node);
        while let Some(n) = current {
            if self
                .data
                .get(&n.id())
                .is_some_and(|d| d.is_strong_scope || d.is_weak_scope)
            {
                self.entry(&n).env.insert(name.to_string(), ty);
                return;
            }
            current = n.parent();
        }
        panic!("weak write of {name:?} with no enclosing scope");
    }

    pub fn kind_of(&self, node: &Node) -> Option<&TypeUri> {
        self.data.get(&node.id()).and_then(|d| d.kind.as_ref())
    }

    pub fn set_kind(&mut self, node: &Node, ty: TypeUri) {
        self.entry(node).kind = Some(ty);
    }
}

/// Mark every strong-scope node and every object declaration in the tree.
pub fn mark_scopes(root: Node, body: &str, queries: &QuerySet, table: &mut ScopeTable) {
    for node in collect_captures(&queries.strong_scopes, root, body, "scope") {
        table.mark_strong(&node);
    }
    for node in collect_captures(&queries.object_declarations, root, body, "decl") {
        table.mark_weak(&node);
    }
}

/// Seed every object declaration's environment with the properties of the
/// component it declares, looked up under the builtin module and every
/// import with its alias prefix applied. Attached types are not
/// materialised here; downstream lookups consult them on demand.
pub fn seed_object_scopes(
    root: Node,
    body: &str,
    queries: &QuerySet,
    builtin: &Module,
    builtin_name: (&str, i64),
    imports: &[ImportRecord],
    table: &mut ScopeTable,
) {
    for decl in collect_captures(&queries.object_declarations, root, body, "decl") {
        let Some(type_node) = decl.named_child(0) else {
            continue;
        };
        let written = type_node.utf8_text(body.as_bytes()).unwrap_or("");
        let (prefix, bare) = match written.rsplit_once('.') {
            Some((p, b)) => (Some(p), b),
            None => (None, written),
        };

        if prefix.is_none() {
            if let Some(component) = builtin.component(bare) {
                seed_from(table, &decl, component, builtin_name.0, builtin_name.1);
            }
        }

        for import in imports {
            if import.alias.as_deref() != prefix {
                continue;
            }
            let Some(module) = &import.module else {
                continue;
            };
            if let Some(component) = module.component(bare) {
                seed_from(table, &decl, component, &import.uri.path, import.uri.major);
            }
        }
    }
}

fn seed_from(
    table: &mut ScopeTable,
    decl: &Node,
    component: &sedge_qmltypes::Component,
    module_path: &str,
    major: i64,
) {
    for property in &component.properties {
        let mut ty = TypeUri::for_property_type(&property.type_name, module_path, major);
        ty.is_list = property.is_list;
        ty.is_pointer = property.is_pointer;
        table.entry(decl).env.insert(property.name.clone(), ty);
    }
}
