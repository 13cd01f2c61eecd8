//! Flow-sensitive type inference over embedded script regions.
//!
//! Each statement-block script region lowers to a control-flow graph which
//! is walked once from `start`. Body nodes drive per-statement inference
//! into the scope chain; assignments record facts on their outgoing edges;
//! facts accumulate along edges and merge at joins with the `must` claim
//! downgraded unless it holds on every incoming edge. Per-expression
//! failures are recorded and never abort the walk.

use crate::cfg::{EdgeId, Graph, NodeId, NodeKind};
use crate::error::AnalysisError;
use crate::facts::{FactClaim, Facts};
use crate::scopes::ScopeTable;
use crate::types::TypeUri;
use std::collections::{HashMap, HashSet, VecDeque};
use tree_sitter::Node;

/// The result of typing one script region. The graph and facts are
/// transient: inferred expression types persist on the scope table.
pub struct RegionTyping<'t> {
    pub graph: Graph<'t>,
    pub facts: Facts,
}

/// Type a statement-block script region.
pub fn type_region<'t>(
    script: Node<'t>,
    body: &str,
    scopes: &mut ScopeTable,
    errors: &mut Vec<AnalysisError>,
) -> Result<RegionTyping<'t>, AnalysisError> {
    let graph = Graph::from_script(script)?;
    let facts = walk(&graph, body, scopes, errors);
    Ok(RegionTyping { graph, facts })
}

/// Type a bare expression under the scope chain, outside any graph.
pub fn type_expression(
    expr: Node,
    body: &str,
    scopes: &mut ScopeTable,
    errors: &mut Vec<AnalysisError>,
) -> Result<TypeUri, AnalysisError> {
    let mut facts = Facts::new();
    type_expr(expr, body, scopes, &mut facts, &[], errors)
}

fn walk(
    graph: &Graph<'_>,
    body: &str,
    scopes: &mut ScopeTable,
    errors: &mut Vec<AnalysisError>,
) -> Facts {
    let mut facts = Facts::new();
    let back_edges = back_edges(graph);

    let mut indegree: HashMap<NodeId, usize> = HashMap::new();
    for node in &graph.nodes {
        indegree.insert(node.id, 0);
    }
    for edge in &graph.edges {
        if !back_edges.contains(&edge.id) {
            *indegree.entry(edge.to).or_default() += 1;
        }
    }

    let mut queue: VecDeque<NodeId> = graph
        .nodes
        .iter()
        .filter(|n| indegree[&n.id] == 0)
        .map(|n| n.id)
        .collect();

    while let Some(id) = queue.pop_front() {
        let Some(node) = graph.node(id) else { continue };

        let incoming: Vec<EdgeId> = graph.incoming_edges(id).map(|e| e.id).collect();
        let outgoing: Vec<EdgeId> = graph.outgoing_edges(id).map(|e| e.id).collect();

        // Facts flow through every node; merging is the identity for a
        // single populated incoming edge.
        for &out in &outgoing {
            if incoming.is_empty() {
                continue;
            }
            facts.merge(&incoming, out);
        }

        match node.kind {
            NodeKind::Body => {
                if let Some(stmt) = node.ast {
                    type_statement(stmt, body, scopes, &mut facts, &outgoing, errors);
                }
            }
            NodeKind::Fork => {
                if let Some(condition) = node.ast {
                    if let Err(e) =
                        type_expr(condition, body, scopes, &mut facts, &outgoing, errors)
                    {
                        errors.push(e);
                    }
                }
            }
            _ => {}
        }

        for edge in graph.outgoing_edges(id) {
            if back_edges.contains(&edge.id) {
                continue;
            }
            let entry = indegree.get_mut(&edge.to).expect("known node");
            *entry = entry.saturating_sub(1);
            if *entry == 0 {
                queue.push_back(edge.to);
            }
        }
    }

    facts
}

/// Edges closing a cycle, found by depth-first search from `start`.
fn back_edges(graph: &Graph<'_>) -> HashSet<EdgeId> {
    let mut back = HashSet::new();
    let mut open = HashSet::new();
    let mut done = HashSet::new();

    // (node, next outgoing edge index) stack for an iterative DFS.
    let mut stack: Vec<(NodeId, usize)> = vec![(graph.start(), 0)];
    open.insert(graph.start());

    while let Some((node, idx)) = stack.pop() {
        let outgoing: Vec<_> = graph.outgoing_edges(node).collect();
        if idx >= outgoing.len() {
            open.remove(&node);
            done.insert(node);
            continue;
        }
        stack.push((node, idx + 1));

        let edge = outgoing[idx];
        if open.contains(&edge.to) {
            back.insert(edge.id);
        } else if !done.contains(&edge.to) {
            open.insert(edge.to);
            stack.push((edge.to, 0));
        }
    }

    back
}

fn type_statement(
    stmt: Node,
    body: &str,
    scopes: &mut ScopeTable,
    facts: &mut Facts,
    out_edges: &[EdgeId],
    errors: &mut Vec<AnalysisError>,
) {
    match stmt.kind() {
        "lexical_declaration" | "variable_declaration" => {
            for i in 0..stmt.named_child_count() {
                let Some(declarator) = stmt.named_child(i) else {
                    continue;
                };
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                let Some(name_node) = declarator.child_by_field_name("name") else {
                    continue;
                };
                let name = text(name_node, body);

                match declarator.child_by_field_name("value") {
                    None => scopes.write(&stmt, name, TypeUri::complex()),
                    Some(value) => {
                        match type_expr(value, body, scopes, facts, out_edges, errors) {
                            Ok(ty) => scopes.write(&stmt, name, ty),
                            Err(e) => errors.push(e),
                        }
                    }
                }
            }
        }
        "expression_statement" | "return_statement" | "throw_statement" => {
            if let Some(child) = stmt.named_child(0) {
                if let Err(e) = type_expr(child, body, scopes, facts, out_edges, errors) {
                    errors.push(e);
                }
            }
        }
        other => errors.push(AnalysisError::UnsupportedStatement(other.to_string())),
    }
}

fn type_expr(
    expr: Node,
    body: &str,
    scopes: &mut ScopeTable,
    facts: &mut Facts,
    out_edges: &[EdgeId],
    errors: &mut Vec<AnalysisError>,
) -> Result<TypeUri, AnalysisError> {
    if let Some(cached) = scopes.kind_of(&expr) {
        return Ok(cached.clone());
    }

    let ty = match expr.kind() {
        "number" => TypeUri::number(),
        "string" => TypeUri::string(),
        "true" | "false" => TypeUri::bool(),
        "identifier" => {
            let name = text(expr, body);
            scopes
                .lookup(&expr, name)
                .cloned()
                .ok_or_else(|| AnalysisError::VariableNotFound(name.to_string()))?
        }
        "parenthesized_expression" => {
            let inner = expr
                .named_child(0)
                .ok_or_else(|| AnalysisError::UnsupportedExpression("()".into()))?;
            type_expr(inner, body, scopes, facts, out_edges, errors)?
        }
        "ternary_expression" => {
            // The condition and alternative are typed for their side
            // effects; disagreements are flagged but never fatal, and the
            // consequence type wins the tie-break.
            if let Some(condition) = expr.child_by_field_name("condition") {
                match type_expr(condition, body, scopes, facts, out_edges, errors) {
                    Ok(ty) if ty != TypeUri::bool() => {
                        errors.push(AnalysisError::TernaryConditionNotBool(ty.to_string()));
                    }
                    Ok(_) => {}
                    Err(e) => errors.push(e),
                }
            }

            let consequence = expr
                .child_by_field_name("consequence")
                .ok_or_else(|| AnalysisError::UnsupportedExpression("ternary".into()))?;
            let cons_ty = type_expr(consequence, body, scopes, facts, out_edges, errors)?;

            if let Some(alternative) = expr.child_by_field_name("alternative") {
                match type_expr(alternative, body, scopes, facts, out_edges, errors) {
                    Ok(alt_ty) if alt_ty != cons_ty => {
                        errors.push(AnalysisError::TernaryBranchMismatch {
                            consequence: cons_ty.to_string(),
                            alternative: alt_ty.to_string(),
                        });
                    }
                    Ok(_) => {}
                    Err(e) => errors.push(e),
                }
            }

            cons_ty
        }
        "assignment_expression" => {
            let right = expr
                .child_by_field_name("right")
                .ok_or_else(|| AnalysisError::UnsupportedExpression("assignment".into()))?;
            let ty = type_expr(right, body, scopes, facts, out_edges, errors)?;

            if let Some(left) = expr.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    let name = text(left, body);
                    for &edge in out_edges {
                        facts.record(edge, name, FactClaim::Initialised, true);
                        facts.record(edge, name, FactClaim::Type(ty.clone()), true);
                    }
                }
            }

            ty
        }
        other => return Err(AnalysisError::UnsupportedExpression(other.to_string())),
    };

    scopes.set_kind(&expr, ty.clone());
    Ok(ty)
}

fn text<'a>(node: Node, body: &'a str) -> &'a str {
    node.utf8_text(body.as_bytes()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::NodeKind;
    use crate::syntax;
    use tree_sitter::Tree;

    fn js() -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    fn body_block(tree: &Tree) -> Node<'_> {
        tree.root_node()
            .named_child(0)
            .and_then(|f| f.child_by_field_name("body"))
            .expect("function body")
    }

    /// Mark every statement block and the program as strong scopes, the way
    /// the engine's scope-marking query pass does for QML sources.
    fn mark_js_scopes(node: Node, table: &mut ScopeTable) {
        if matches!(node.kind(), "program" | "statement_block") {
            table.mark_strong(&node);
        }
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                mark_js_scopes(child, table);
            }
        }
    }

    /// The scope table and facts are node-id keyed and carry no borrows,
    /// so they outlive the region built inside.
    fn analyze(tree: &Tree, src: &str) -> (ScopeTable, Vec<AnalysisError>, Facts) {
        let mut scopes = ScopeTable::new();
        mark_js_scopes(tree.root_node(), &mut scopes);
        let mut errors = Vec::new();
        let region = type_region(body_block(tree), src, &mut scopes, &mut errors).expect("region");
        let facts = region.facts;
        (scopes, errors, facts)
    }

    #[test]
    fn literals_and_declarations_enter_the_scope() {
        let src = r#"function f() { let a = 1; let b = "hi"; let c = true; let d; }"#;
        let tree = syntax::parse(&js(), src).unwrap();
        let (scopes, errors, _) = analyze(&tree, src);
        assert!(errors.is_empty(), "{errors:?}");

        let block = body_block(&tree);
        assert_eq!(scopes.lookup(&block, "a"), Some(&TypeUri::number()));
        assert_eq!(scopes.lookup(&block, "b"), Some(&TypeUri::string()));
        assert_eq!(scopes.lookup(&block, "c"), Some(&TypeUri::bool()));
        // No initial value: the declaration still initialises the binding.
        assert_eq!(scopes.lookup(&block, "d"), Some(&TypeUri::complex()));
    }

    #[test]
    fn unknown_identifiers_are_recorded_not_fatal() {
        let src = "function f() { y; let a = 1; }";
        let tree = syntax::parse(&js(), src).unwrap();
        let (scopes, errors, _) = analyze(&tree, src);
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, AnalysisError::VariableNotFound(n) if n == "y"))
        );
        // The failure did not stop the rest of the region.
        let block = body_block(&tree);
        assert_eq!(scopes.lookup(&block, "a"), Some(&TypeUri::number()));
    }

    #[test]
    fn ternary_disagreement_is_flagged_and_consequence_wins() {
        let src = r#"function f() { let a = true ? 1 : "s"; }"#;
        let tree = syntax::parse(&js(), src).unwrap();
        let (scopes, errors, _) = analyze(&tree, src);
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, AnalysisError::TernaryBranchMismatch { .. }))
        );
        let block = body_block(&tree);
        assert_eq!(scopes.lookup(&block, "a"), Some(&TypeUri::number()));
    }

    #[test]
    fn ternary_condition_must_be_bool() {
        let src = "function f() { let a = 1 ? 2 : 3; }";
        let tree = syntax::parse(&js(), src).unwrap();
        let (_, errors, _) = analyze(&tree, src);
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, AnalysisError::TernaryConditionNotBool(_)))
        );
    }

    #[test]
    fn inferred_types_are_cached_on_the_node() {
        let src = "function f() { let a = 1; }";
        let tree = syntax::parse(&js(), src).unwrap();
        let mut scopes = ScopeTable::new();
        mark_js_scopes(tree.root_node(), &mut scopes);
        let mut errors = Vec::new();
        type_region(body_block(&tree), src, &mut scopes, &mut errors).unwrap();

        // Find the numeric literal and check its cached kind.
        let mut stack = vec![tree.root_node()];
        let mut found = false;
        while let Some(n) = stack.pop() {
            if n.kind() == "number" {
                assert_eq!(scopes.kind_of(&n), Some(&TypeUri::number()));
                found = true;
            }
            for i in 0..n.named_child_count() {
                if let Some(c) = n.named_child(i) {
                    stack.push(c);
                }
            }
        }
        assert!(found);
    }

    #[test]
    fn branch_assignments_merge_with_must_downgrade() {
        let src = r#"function f() { let x = 1; if (true) { x = "hi"; } else { x = 2; } }"#;
        let tree = syntax::parse(&js(), src).unwrap();
        let mut scopes = ScopeTable::new();
        mark_js_scopes(tree.root_node(), &mut scopes);
        let mut errors = Vec::new();
        let region = type_region(body_block(&tree), src, &mut scopes, &mut errors).unwrap();

        let join = region
            .graph
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Join)
            .expect("post-if join");
        let out = region
            .graph
            .outgoing_edges(join.id)
            .next()
            .expect("join outgoing edge");

        let merged = region.facts.for_edge(out.id);
        let init = merged
            .iter()
            .find(|f| f.variable == "x" && f.claim == FactClaim::Initialised)
            .expect("initialised fact");
        assert!(init.must, "assigned on both branches");

        let string_fact = merged
            .iter()
            .find(|f| f.claim == FactClaim::Type(TypeUri::string()))
            .expect("string type fact");
        let number_fact = merged
            .iter()
            .find(|f| f.claim == FactClaim::Type(TypeUri::number()))
            .expect("number type fact");
        assert!(!string_fact.must);
        assert!(!number_fact.must);
    }

    #[test]
    fn loops_terminate_the_walk() {
        let src = "function f() { let i = 1; while (true) { i = 2; } let j = 3; }";
        let tree = syntax::parse(&js(), src).unwrap();
        let (scopes, errors, _) = analyze(&tree, src);
        assert!(errors.is_empty(), "{errors:?}");
        let block = body_block(&tree);
        assert_eq!(scopes.lookup(&block, "j"), Some(&TypeUri::number()));
    }

    #[test]
    fn unsupported_statements_are_recorded() {
        let src = "function f() { for (let i = 0; i; i = 0) { } }";
        let tree = syntax::parse(&js(), src).unwrap();
        let (_, errors, _) = analyze(&tree, src);
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, AnalysisError::UnsupportedStatement(k) if k == "for_statement"))
        );
    }
}
