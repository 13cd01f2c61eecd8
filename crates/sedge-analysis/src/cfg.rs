//! Control-flow graphs for embedded script regions.
//!
//! A script body lowers to a graph with three fixed sentinel nodes: a
//! unique `start`, a `good-end` reached by falling off the end or
//! returning, and a `bad-end` reached by throwing. Statement blocks are
//! bracketed by open/close sentinels so halting statements can route
//! through the block they leave.

use crate::error::AnalysisError;
use std::collections::HashSet;
use tree_sitter::Node;

pub type NodeId = u32;
pub type EdgeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Start,
    GoodEnd,
    BadEnd,
    BlockOpen,
    BlockClose,
    /// A statement.
    Body,
    /// A branching condition expression.
    Fork,
    /// A merge point; carries no AST.
    Join,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::GoodEnd => "good end",
            NodeKind::BadEnd => "bad end",
            NodeKind::BlockOpen => "block open",
            NodeKind::BlockClose => "block close",
            NodeKind::Body => "body",
            NodeKind::Fork => "fork",
            NodeKind::Join => "join",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Halt,
    OnTrue,
    OnFalse,
    Join,
    Body,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Halt => "halt",
            EdgeKind::OnTrue => "on true",
            EdgeKind::OnFalse => "on false",
            EdgeKind::Join => "join",
            EdgeKind::Body => "body",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GraphNode<'t> {
    pub id: NodeId,
    pub kind: NodeKind,
    pub ast: Option<Node<'t>>,
}

#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub id: EdgeId,
}

pub struct Graph<'t> {
    next_node: NodeId,
    next_edge: EdgeId,
    start: NodeId,
    good_end: NodeId,
    bad_end: NodeId,
    pub nodes: Vec<GraphNode<'t>>,
    pub edges: Vec<Edge>,
}

impl<'t> Graph<'t> {
    /// Lower a script region to a graph. Accepts either a `script_statement`
    /// wrapper or a bare `statement_block`.
    pub fn from_script(node: Node<'t>) -> Result<Graph<'t>, AnalysisError> {
        let block = match node.kind() {
            "statement_block" => node,
            "script_statement" => node
                .named_child(0)
                .ok_or_else(|| AnalysisError::UnsupportedStatement("empty script".into()))?,
            other => return Err(AnalysisError::UnsupportedExpression(other.to_string())),
        };

        let mut graph = Graph {
            next_node: 0,
            next_edge: 0,
            start: 0,
            good_end: 0,
            bad_end: 0,
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        graph.start = graph.new_node(NodeKind::Start, None);
        graph.good_end = graph.new_node(NodeKind::GoodEnd, None);
        graph.bad_end = graph.new_node(NodeKind::BadEnd, None);

        let (come_to, go_from) = graph.handle_statement_block(block);
        match come_to {
            Some(id) => graph.connect(graph.start, id, EdgeKind::Body),
            None => graph.connect(graph.start, graph.good_end, EdgeKind::Body),
        }
        if let Some(id) = go_from {
            graph.connect(id, graph.good_end, EdgeKind::Body);
        }

        Ok(graph)
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn good_end(&self) -> NodeId {
        self.good_end
    }

    pub fn bad_end(&self) -> NodeId {
        self.bad_end
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode<'t>> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn incoming_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.to == id)
    }

    pub fn outgoing_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.from == id)
    }

    fn new_node(&mut self, kind: NodeKind, ast: Option<Node<'t>>) -> NodeId {
        let id = self.next_node;
        self.next_node += 1;
        self.nodes.push(GraphNode { id, kind, ast });
        id
    }

    fn connect(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) {
        assert_ne!(from, to, "self-connect in control-flow graph");
        let id = self.next_edge;
        self.next_edge += 1;
        self.edges.push(Edge { from, to, kind, id });
    }

    fn handle_statement_block(&mut self, block: Node<'t>) -> (Option<NodeId>, Option<NodeId>) {
        let open = self.new_node(NodeKind::BlockOpen, Some(block));
        let close = self.new_node(NodeKind::BlockClose, Some(block));

        let mut first_in = None;
        let mut inner_join: Option<NodeId> = None;
        let mut out = None;

        for i in 0..block.named_child_count() {
            let Some(child) = block.named_child(i) else {
                continue;
            };
            let (come_to, go_from) = self.handle_statement(child, Some(close));

            if first_in.is_none() {
                first_in = come_to;
            }
            if let (Some(prev), Some(next)) = (inner_join, come_to) {
                self.connect(prev, next, EdgeKind::Body);
            }
            inner_join = go_from;
            out = go_from;
        }

        let come_to = first_in.map(|id| {
            self.connect(open, id, EdgeKind::Body);
            open
        });
        let go_from = out.map(|id| {
            self.connect(id, close, EdgeKind::Body);
            close
        });

        (come_to, go_from)
    }

    fn handle_statement(
        &mut self,
        stmt: Node<'t>,
        closer: Option<NodeId>,
    ) -> (Option<NodeId>, Option<NodeId>) {
        match stmt.kind() {
            "lexical_declaration" | "variable_declaration" | "expression_statement" => {
                let id = self.new_node(NodeKind::Body, Some(stmt));
                (Some(id), Some(id))
            }
            "return_statement" => {
                let id = self.new_node(NodeKind::Body, Some(stmt));
                self.halt(id, closer, self.good_end);
                (Some(id), None)
            }
            "throw_statement" => {
                let id = self.new_node(NodeKind::Body, Some(stmt));
                self.halt(id, closer, self.bad_end);
                (Some(id), None)
            }
            "if_statement" => self.handle_if(stmt, closer),
            "while_statement" => self.handle_while(stmt, closer),
            "statement_block" => self.handle_statement_block(stmt),
            // Anything else flows through as a plain statement; the typing
            // pass records what it could not handle.
            _ => {
                let id = self.new_node(NodeKind::Body, Some(stmt));
                (Some(id), Some(id))
            }
        }
    }

    fn halt(&mut self, from: NodeId, closer: Option<NodeId>, end: NodeId) {
        match closer {
            None => self.connect(from, end, EdgeKind::Halt),
            Some(close) => {
                self.connect(from, close, EdgeKind::Body);
                self.connect(close, end, EdgeKind::Halt);
            }
        }
    }

    fn handle_if(
        &mut self,
        stmt: Node<'t>,
        closer: Option<NodeId>,
    ) -> (Option<NodeId>, Option<NodeId>) {
        let fork = self.new_node(NodeKind::Fork, stmt.child_by_field_name("condition"));
        let join = self.new_node(NodeKind::Join, None);

        match stmt.child_by_field_name("consequence") {
            Some(consequence) => {
                let (come_to, go_from) = self.handle_statement(consequence, closer);
                match come_to {
                    Some(id) => self.connect(fork, id, EdgeKind::OnTrue),
                    None => self.connect(fork, join, EdgeKind::OnTrue),
                }
                if let Some(id) = go_from {
                    self.connect(id, join, EdgeKind::Join);
                }
            }
            None => self.connect(fork, join, EdgeKind::OnTrue),
        }

        match stmt
            .child_by_field_name("alternative")
            .and_then(|alt| alt.named_child(0))
        {
            None => self.connect(fork, join, EdgeKind::OnFalse),
            Some(alternative) => {
                let (come_to, go_from) = self.handle_statement(alternative, closer);
                match come_to {
                    Some(id) => self.connect(fork, id, EdgeKind::OnFalse),
                    None => self.connect(fork, join, EdgeKind::OnFalse),
                }
                if let Some(id) = go_from {
                    self.connect(id, join, EdgeKind::Join);
                }
            }
        }

        (Some(fork), Some(join))
    }

    fn handle_while(
        &mut self,
        stmt: Node<'t>,
        closer: Option<NodeId>,
    ) -> (Option<NodeId>, Option<NodeId>) {
        let fork = self.new_node(NodeKind::Fork, stmt.child_by_field_name("condition"));
        let join = self.new_node(NodeKind::Join, None);

        self.connect(fork, join, EdgeKind::OnFalse);

        match stmt.child_by_field_name("body") {
            Some(body) => {
                let (come_to, go_from) = self.handle_statement(body, closer);
                match come_to {
                    Some(id) => self.connect(fork, id, EdgeKind::OnTrue),
                    None => self.connect(fork, join, EdgeKind::OnTrue),
                }
                if let Some(id) = go_from {
                    self.connect(id, fork, EdgeKind::Join);
                }
            }
            None => self.connect(fork, join, EdgeKind::OnTrue),
        }

        (Some(fork), Some(join))
    }

    /// Every node reachable from `start` by following edges forward.
    pub fn reachable_from_start(&self) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        let mut stack = vec![self.start];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            for edge in self.outgoing_edges(id) {
                stack.push(edge.to);
            }
        }
        seen
    }

    /// Render the graph as Graphviz dot, labelling body nodes with the
    /// first line of their source text.
    pub fn to_dot(&self, body: &str) -> String {
        use std::fmt::Write;

        let mut out = String::from("digraph cfg {\n");
        for node in &self.nodes {
            let label = match node.ast {
                Some(ast) if !matches!(node.kind, NodeKind::BlockOpen | NodeKind::BlockClose) => {
                    let text = ast.utf8_text(body.as_bytes()).unwrap_or("");
                    let first = text.lines().next().unwrap_or("");
                    format!("{}\\n{}", node.kind.as_str(), first.replace('"', "\\\""))
                }
                _ => node.kind.as_str().to_string(),
            };
            let _ = writeln!(out, "  n{} [label=\"{}\"];", node.id, label);
        }
        for edge in &self.edges {
            let _ = writeln!(
                out,
                "  n{} -> n{} [label=\"{}\"];",
                edge.from,
                edge.to,
                edge.kind.as_str()
            );
        }
        out.push_str("}\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax;

    fn js() -> tree_sitter::Language {
        tree_sitter_javascript::LANGUAGE.into()
    }

    /// Parse a JS function and return the graph of its body. The embedded
    /// script sub-language shares its statement grammar with JavaScript.
    fn graph_of(tree: &tree_sitter::Tree) -> Graph<'_> {
        let root = tree.root_node();
        let func = root.named_child(0).expect("function");
        let block = func.child_by_field_name("body").expect("body");
        Graph::from_script(block).expect("graph")
    }

    #[test]
    fn straight_line_statements_chain() {
        let src = "function f() { let x = 1; x = 2; }";
        let tree = syntax::parse(&js(), src).unwrap();
        let g = graph_of(&tree);

        assert!(g.incoming_edges(g.start()).next().is_none());
        assert!(g.outgoing_edges(g.good_end()).next().is_none());
        assert!(g.outgoing_edges(g.bad_end()).next().is_none());

        let bodies: Vec<_> = g
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Body)
            .collect();
        assert_eq!(bodies.len(), 2);

        // start -> open -> body -> body -> close -> good end
        let reachable = g.reachable_from_start();
        assert!(reachable.contains(&g.good_end()));
        assert!(!reachable.contains(&g.bad_end()));
    }

    #[test]
    fn return_halts_through_block_close() {
        let src = "function f() { return 1; }";
        let tree = syntax::parse(&js(), src).unwrap();
        let g = graph_of(&tree);

        let ret = g
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Body)
            .expect("return body node");
        let out: Vec<_> = g.outgoing_edges(ret.id).collect();
        assert_eq!(out.len(), 1);

        let close = out[0].to;
        assert_eq!(g.node(close).unwrap().kind, NodeKind::BlockClose);
        assert!(
            g.outgoing_edges(close)
                .any(|e| e.to == g.good_end() && e.kind == EdgeKind::Halt)
        );
    }

    #[test]
    fn throw_reaches_bad_end() {
        let src = "function f() { throw 1; }";
        let tree = syntax::parse(&js(), src).unwrap();
        let g = graph_of(&tree);
        assert!(g.reachable_from_start().contains(&g.bad_end()));
        assert!(g.edges.iter().any(|e| e.kind == EdgeKind::Halt && e.to == g.bad_end()));
    }

    #[test]
    fn if_without_else_short_circuits_to_join() {
        let src = "function f() { if (x) { y = 1; } }";
        let tree = syntax::parse(&js(), src).unwrap();
        let g = graph_of(&tree);

        let fork = g
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Fork)
            .expect("fork");
        let join = g
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Join)
            .expect("join");

        let on_false: Vec<_> = g
            .outgoing_edges(fork.id)
            .filter(|e| e.kind == EdgeKind::OnFalse)
            .collect();
        assert_eq!(on_false.len(), 1);
        assert_eq!(on_false[0].to, join.id);

        assert!(
            g.outgoing_edges(fork.id)
                .any(|e| e.kind == EdgeKind::OnTrue && e.to != join.id)
        );
    }

    #[test]
    fn while_body_rejoins_the_fork() {
        let src = "function f() { while (x) { y = 1; } }";
        let tree = syntax::parse(&js(), src).unwrap();
        let g = graph_of(&tree);

        let fork = g
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Fork)
            .expect("fork");
        assert!(
            g.incoming_edges(fork.id)
                .any(|e| e.kind == EdgeKind::Join),
            "loop back edge missing"
        );
    }

    #[test]
    fn every_node_reachable_except_bad_end_without_throw() {
        let src = "function f() { let a = 1; if (a) { a = 2; } else { a = 3; } while (a) { a = 4; } return a; }";
        let tree = syntax::parse(&js(), src).unwrap();
        let g = graph_of(&tree);

        let reachable = g.reachable_from_start();
        for node in &g.nodes {
            if node.id == g.bad_end() {
                assert!(!reachable.contains(&node.id));
            } else {
                assert!(
                    reachable.contains(&node.id),
                    "node {} ({}) unreachable",
                    node.id,
                    node.kind.as_str()
                );
            }
        }
    }
}
