//! Shared node-shape recognition rules.
//!
//! Every backend walks the AST with the same conventions: a statement whose
//! children carry an `Identifier`, an `Operator("=")` (or `":="`) and a
//! value expression is an assignment; trailing `Operator(";")` children are
//! noise; expression rules emit their children in order with `Operator`
//! leaves contributing their text. Grammars are free to use their own rule
//! names, so the conventions here are about child shapes, with a small set
//! of well-known rule names for expression chains.

use craft_parser::AstNode;

/// Rule names conventionally used for expression chains and wrappers.
const EXPR_RULES: &[&str] = &[
    "expr",
    "Expr",
    "expression",
    "comparison",
    "addition",
    "multiplication",
    "term",
    "factor",
    "primary",
    "atom",
    "unary",
    "call",
    "Call",
    "arg_list",
];

/// An assignment recognized from child shape.
pub(crate) struct Assignment<'a> {
    pub target: &'a AstNode,
    pub op: &'a str,
    pub value: &'a AstNode,
}

/// Recognize `[..., Identifier, Operator("="|":="), value, ...]` in a
/// node's children. Trailing semicolon operators are ignored.
pub(crate) fn as_assignment(node: &AstNode) -> Option<Assignment<'_>> {
    let children = node.children();
    for window_start in 0..children.len() {
        let target = &children[window_start];
        if target.node_type() != "Identifier" {
            continue;
        }
        let op = match children.get(window_start + 1) {
            Some(op) if op.node_type() == "Operator" => match op.value() {
                Some("=") => "=",
                Some(":=") => ":=",
                _ => continue,
            },
            _ => continue,
        };
        match children.get(window_start + 2) {
            Some(value) if !value.is_operator(";") => {
                return Some(Assignment { target, op, value });
            }
            _ => continue,
        }
    }
    None
}

/// Whether this node is one of the conventional expression-chain rules or a
/// token leaf, i.e. something that renders as an expression.
pub(crate) fn is_expression(node: &AstNode) -> bool {
    node.kind().is_token() || EXPR_RULES.contains(&node.node_type())
}

/// Children that are not `Operator` leaves.
pub(crate) fn meaningful<'a>(node: &'a AstNode) -> Vec<&'a AstNode> {
    node.children()
        .iter()
        .filter(|c| c.node_type() != "Operator")
        .collect()
}

/// Whether an operator leaf is structural punctuation rather than a real
/// operator in an expression chain.
pub(crate) fn is_structural(op: &str) -> bool {
    matches!(op, ";" | "," | ":" | "=")
}

/// Recognize a call to the `print` builtin and return its argument nodes
/// (operator leaves dropped, one `arg_list` wrapper level flattened).
pub(crate) fn print_call_args(node: &AstNode) -> Option<Vec<&AstNode>> {
    let children = node.children();
    let paren = children.iter().position(|c| c.is_operator("("))?;
    if paren == 0 {
        return None;
    }
    let callee = children[..paren]
        .iter()
        .find(|c| c.node_type() == "Identifier")?;
    if callee.value() != Some("print") {
        return None;
    }
    let args: Vec<&AstNode> = children[paren..]
        .iter()
        .filter(|c| c.node_type() != "Operator")
        .collect();
    Some(flatten_arg_lists(&args))
}

/// Expand `arg_list`/`param_list` wrappers into their meaningful children.
pub(crate) fn flatten_arg_lists<'n>(args: &[&'n AstNode]) -> Vec<&'n AstNode> {
    let mut flat = Vec::new();
    for arg in args {
        match arg.node_type() {
            "arg_list" | "param_list" => flat.extend(meaningful(arg)),
            _ => flat.push(*arg),
        }
    }
    flat
}

/// Whether any leaf in the subtree is a `String` token.
pub(crate) fn contains_string_leaf(node: &AstNode) -> bool {
    if node.node_type() == "String" {
        return true;
    }
    node.children().iter().any(contains_string_leaf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use craft_parser::{NodeKind, Position};

    fn leaf(kind: NodeKind, value: &str) -> AstNode {
        AstNode::leaf(kind, value, Position::new(1, 1), value)
    }

    fn statement(children: Vec<AstNode>) -> AstNode {
        AstNode::new(
            NodeKind::Rule("statement".to_string()),
            None,
            children,
            Position::new(1, 1),
            String::new(),
        )
    }

    #[test]
    fn test_assignment_with_operator_nodes() {
        let node = statement(vec![
            leaf(NodeKind::Identifier, "x"),
            leaf(NodeKind::Operator, "="),
            leaf(NodeKind::Number, "1"),
            leaf(NodeKind::Operator, ";"),
        ]);
        let assign = as_assignment(&node).expect("recognized");
        assert_eq!(assign.target.value(), Some("x"));
        assert_eq!(assign.op, "=");
        assert_eq!(assign.value.value(), Some("1"));
    }

    #[test]
    fn test_assignment_with_walrus() {
        let node = statement(vec![
            leaf(NodeKind::Identifier, "x"),
            leaf(NodeKind::Operator, ":="),
            leaf(NodeKind::Number, "2"),
        ]);
        assert_eq!(as_assignment(&node).map(|a| a.op), Some(":="));
    }

    #[test]
    fn test_not_an_assignment() {
        let node = statement(vec![
            leaf(NodeKind::Number, "1"),
            leaf(NodeKind::Operator, "+"),
            leaf(NodeKind::Number, "2"),
        ]);
        assert!(as_assignment(&node).is_none());

        let dangling = statement(vec![
            leaf(NodeKind::Identifier, "x"),
            leaf(NodeKind::Operator, "="),
            leaf(NodeKind::Operator, ";"),
        ]);
        assert!(as_assignment(&dangling).is_none());
    }

    #[test]
    fn test_is_expression() {
        assert!(is_expression(&leaf(NodeKind::Number, "3")));
        let expr = AstNode::new(
            NodeKind::Rule("expr".to_string()),
            None,
            vec![],
            Position::new(1, 1),
            String::new(),
        );
        assert!(is_expression(&expr));
        let stmt = statement(vec![]);
        assert!(!is_expression(&stmt));
    }
}
