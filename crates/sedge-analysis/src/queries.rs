//! The fixed set of precompiled tree-sitter queries, initialised once per
//! engine against the injected QML grammar.

use crate::error::AnalysisError;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Query, QueryCursor};

/// Precompiled queries over the QML grammar.
pub struct QuerySet {
    /// Type names in property declarations: `property <T> name`.
    pub property_types: Query,
    /// Type names heading object declarations: `<T> { … }`.
    pub object_declaration_types: Query,
    /// Whole object declarations.
    pub object_declarations: Query,
    /// `with` statements in embedded script.
    pub with_statements: Query,
    /// Parent object type plus a property set by a direct child object.
    pub parent_object_child_property_sets: Query,
    /// `var` declarations inside a statement block, with the statements
    /// following them.
    pub statement_blocks_with_var_declarations: Query,
    /// Assignments to a plain identifier.
    pub variable_assignments: Query,
    /// `!!expr`.
    pub double_negation: Query,
    /// Inline component declarations.
    pub inline_components: Query,
    /// Coercing `==` comparisons.
    pub coercing_equality: Query,
    /// Coercing `!=` comparisons.
    pub coercing_inequality: Query,
    /// Assignment expressions directly under a parenthesised condition.
    pub assignment_in_condition: Query,
    /// Embedded script regions.
    pub embedded_scripts: Query,
    /// Every identifier.
    pub identifiers: Query,
    /// Nodes that open a strong (lexical) scope.
    pub strong_scopes: Query,
}

impl QuerySet {
    pub fn new(language: &Language) -> Result<Self, AnalysisError> {
        let q = |src: &str| {
            Query::new(language, src)
                .map_err(|e| AnalysisError::Query(format!("{src:?}: {e}")))
        };

        Ok(QuerySet {
            property_types: q("(property_declarator (property_type) @ident)")?,
            object_declaration_types: q("(object_declaration (qualified_identifier) @ident)")?,
            object_declarations: q("(object_declaration) @decl")?,
            with_statements: q(r#"(with_statement "with" @bad)"#)?,
            parent_object_child_property_sets: q(
                r#"(object_declaration
                    (qualified_identifier) @outer
                    (object_block
                        (object_declaration
                            (object_block
                                (property_set (qualified_identifier) @prop)))))"#,
            )?,
            statement_blocks_with_var_declarations: q(
                r#"(statement_block
                    (variable_declaration
                        "var" @keyword
                        (variable_declarator name: (identifier) @name))
                    (_)* @following)"#,
            )?,
            variable_assignments: q("(assignment_expression left: (identifier) @ident)")?,
            double_negation: q(
                r#"(unary_expression
                    operator: "!"
                    argument: (unary_expression operator: "!" argument: (_) @arg)) @outer"#,
            )?,
            inline_components: q(
                r#"(inline_type_declaration
                    (identifier) @name
                    (qualified_identifier) @superclass
                    (object_block) @body)"#,
            )?,
            coercing_equality: q(r#"(binary_expression operator: "==") @expr"#)?,
            coercing_inequality: q(r#"(binary_expression operator: "!=") @expr"#)?,
            assignment_in_condition: q(
                r#"(if_statement
                    condition: (parenthesized_expression (assignment_expression) @assign))
                   (while_statement
                    condition: (parenthesized_expression (assignment_expression) @assign))"#,
            )?,
            embedded_scripts: q("(script_statement) @script")?,
            identifiers: q("(identifier) @ident")?,
            strong_scopes: q(
                r#"[(statement_block)
                    (script_statement)
                    (program)
                    (inline_type_declaration)] @scope"#,
            )?,
        })
    }
}

/// Collect every node captured under `capture` by running `query` over
/// `node`, in match order.
pub fn collect_captures<'t>(
    query: &Query,
    node: Node<'t>,
    body: &str,
    capture: &str,
) -> Vec<Node<'t>> {
    let Some(want) = query.capture_index_for_name(capture) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, node, body.as_bytes());
    while let Some(m) = matches.next() {
        for cap in m.captures {
            if cap.index == want {
                out.push(cap.node);
            }
        }
    }
    out
}
