//! Antecedent-chained flow nodes.
//!
//! A second lowering of script bodies, independent of the control-flow
//! graph: every AST position maps to the flow node that was current when it
//! was visited, and each flow node chains back to its antecedents. Type
//! narrowing walks these chains backwards through assignments and assumed
//! conditions.

use std::collections::HashMap;
use thiserror::Error;
use tree_sitter::Node;

pub type FlowId = u32;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("flow for labelled {0} not supported")]
    LabelledJump(&'static str),
}

#[derive(Debug)]
pub enum FlowKind<'t> {
    Start,
    Unreachable {
        #[allow(dead_code)]
        reportable: bool,
    },
    /// Several flows converge here.
    Join { antecedents: Vec<FlowId> },
    /// A value may be assigned to one or more identifiers.
    Assignment {
        antecedent: FlowId,
        node: Node<'t>,
    },
    /// Control passed a condition with a known outcome.
    Condition {
        antecedent: FlowId,
        node: Node<'t>,
        assume_true: bool,
    },
}

#[derive(Debug)]
pub struct FlowNode<'t> {
    pub id: FlowId,
    pub kind: FlowKind<'t>,
}

/// Builds the flow-node arena for one script body.
pub struct FlowBuilder<'t> {
    nodes: Vec<FlowNode<'t>>,
    current: FlowId,
    break_target: Option<FlowId>,
    continue_target: Option<FlowId>,
    /// AST node id → the flow node current when that position was visited.
    pub flow_at: HashMap<usize, FlowId>,
}

impl<'t> FlowBuilder<'t> {
    pub fn new() -> Self {
        let mut b = FlowBuilder {
            nodes: Vec::new(),
            current: 0,
            break_target: None,
            continue_target: None,
            flow_at: HashMap::new(),
        };
        b.current = b.note(FlowKind::Start);
        b
    }

    pub fn current_flow(&self) -> FlowId {
        self.current
    }

    pub fn node(&self, id: FlowId) -> &FlowNode<'t> {
        &self.nodes[id as usize]
    }

    pub fn nodes(&self) -> &[FlowNode<'t>] {
        &self.nodes
    }

    fn note(&mut self, kind: FlowKind<'t>) -> FlowId {
        let id = self.nodes.len() as FlowId;
        self.nodes.push(FlowNode { id, kind });
        id
    }

    fn new_unreachable(&mut self) -> FlowId {
        self.note(FlowKind::Unreachable { reportable: false })
    }

    fn new_join(&mut self) -> FlowId {
        self.note(FlowKind::Join {
            antecedents: Vec::new(),
        })
    }

    fn add_antecedent(&mut self, join: FlowId, antecedent: FlowId) {
        match &mut self.nodes[join as usize].kind {
            FlowKind::Join { antecedents } => antecedents.push(antecedent),
            _ => unreachable!("antecedent added to non-join flow node"),
        }
    }

    fn new_condition(
        &mut self,
        antecedent: FlowId,
        expression: Option<Node<'t>>,
        assume_true: bool,
    ) -> FlowId {
        let Some(expression) = expression else {
            return antecedent;
        };

        // A constant condition contradicting the assumption means this arm
        // can never run.
        let kind = expression.kind();
        if (kind == "true" && !assume_true) || (kind == "false" && assume_true) {
            return self.new_unreachable();
        }

        if !is_narrowing_expression(expression) {
            return antecedent;
        }

        self.note(FlowKind::Condition {
            antecedent,
            node: expression,
            assume_true,
        })
    }

    fn new_assignment(&mut self, antecedent: FlowId, node: Node<'t>) -> FlowId {
        debug_assert_eq!(node.kind(), "variable_declarator");
        self.note(FlowKind::Assignment { antecedent, node })
    }

    /// A join with one antecedent collapses to it; one with none is
    /// unreachable.
    fn finish_flow(&mut self, mut flow: FlowId) -> FlowId {
        loop {
            match &self.nodes[flow as usize].kind {
                FlowKind::Join { antecedents } if antecedents.is_empty() => {
                    return self.new_unreachable();
                }
                FlowKind::Join { antecedents } if antecedents.len() == 1 => {
                    flow = antecedents[0];
                }
                _ => return flow,
            }
        }
    }

    pub fn build(&mut self, node: Node<'t>) -> Result<(), FlowError> {
        self.flow_at.insert(node.id(), self.current);
        match node.kind() {
            "while_statement" => self.build_while(node),
            "if_statement" => self.build_if(node),
            "variable_declarator" => self.build_declarator(node),
            "break_statement" => self.build_jump(node, "break"),
            "continue_statement" => self.build_jump(node, "continue"),
            _ => self.build_children(node),
        }
    }

    fn build_children(&mut self, node: Node<'t>) -> Result<(), FlowError> {
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                self.build(child)?;
            }
        }
        Ok(())
    }

    fn build_declarator(&mut self, node: Node<'t>) -> Result<(), FlowError> {
        self.build_children(node)?;
        if node.child_by_field_name("value").is_some() {
            self.current = self.new_assignment(self.current, node);
        }
        Ok(())
    }

    fn build_jump(&mut self, node: Node<'t>, which: &'static str) -> Result<(), FlowError> {
        if node.child_by_field_name("label").is_some() {
            return Err(FlowError::LabelledJump(which));
        }
        let target = if which == "break" {
            self.break_target
        } else {
            self.continue_target
        };
        if let Some(join) = target {
            self.add_antecedent(join, self.current);
            self.current = self.new_unreachable();
        }
        Ok(())
    }

    fn build_if(&mut self, node: Node<'t>) -> Result<(), FlowError> {
        let post_if = self.new_join();
        let condition = node.child_by_field_name("condition");

        if let Some(cond) = condition {
            self.build(cond)?;
        }
        let post_condition = self.current;

        self.current = self.new_condition(post_condition, condition, true);
        if let Some(consequence) = node.child_by_field_name("consequence") {
            self.build(consequence)?;
        }
        self.add_antecedent(post_if, self.current);

        self.current = self.new_condition(post_condition, condition, false);
        if let Some(alternative) = node.child_by_field_name("alternative") {
            self.build(alternative)?;
        }
        self.add_antecedent(post_if, self.current);

        self.current = self.finish_flow(post_if);
        Ok(())
    }

    fn build_while(&mut self, node: Node<'t>) -> Result<(), FlowError> {
        let pre_while = self.new_join();
        let post_while = self.new_join();

        self.add_antecedent(pre_while, self.current);
        self.current = pre_while;

        let condition = node.child_by_field_name("condition");
        if let Some(cond) = condition {
            self.build(cond)?;
        }

        let exit = self.new_condition(self.current, condition, false);
        self.add_antecedent(post_while, exit);

        self.current = self.new_condition(self.current, condition, true);

        let saved_break = self.break_target;
        let saved_continue = self.continue_target;
        self.break_target = Some(post_while);
        self.continue_target = Some(pre_while);

        if let Some(body) = node.child_by_field_name("body") {
            self.build(body)?;
        }

        self.break_target = saved_break;
        self.continue_target = saved_continue;

        self.add_antecedent(pre_while, self.current);
        self.current = self.finish_flow(post_while);
        Ok(())
    }
}

impl Default for FlowBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether an expression is admitted as a narrowing antecedent.
pub fn is_narrowing_expression(expression: Node) -> bool {
    match expression.kind() {
        "identifier" | "this" | "member_expression" | "call_expression" => true,
        "parenthesized_expression" => expression
            .named_child(0)
            .is_some_and(is_narrowing_expression),
        "binary_expression" => is_narrowing_binary_expression(expression),
        _ => false,
    }
}

fn is_narrowing_binary_expression(expression: Node) -> bool {
    let (Some(left), Some(operator)) = (
        expression.child_by_field_name("left"),
        expression.child_by_field_name("operator"),
    ) else {
        return false;
    };
    let right = expression.child_by_field_name("right");

    match operator.kind() {
        "==" | "!=" | "===" | "!==" => {
            is_narrowing_expression(left)
                && right.is_some_and(|r| matches!(r.kind(), "null" | "identifier"))
        }
        "&&" | "||" => {
            is_narrowing_expression(left) || right.is_some_and(is_narrowing_expression)
        }
        "instanceof" => is_narrowing_expression(left),
        _ => false,
    }
}
