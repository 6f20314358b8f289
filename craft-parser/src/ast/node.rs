//! The AST node produced by the grammar engine.
//!
//! Every node exposes the same stable surface: a node type string, an
//! optional value, ordered children, a 1-based source position and the
//! matched span. The four token classes get a closed enum variant each;
//! composite nodes stay keyed by their rule name, so rule names pass
//! straight from grammar to AST with no translation table. Backends dispatch
//! on [`AstNode::node_type`] and keep working regardless of which variant
//! backs it.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::ast::source_map::Position;

/// Node type: one of the built-in token classes, or a composite keyed by
/// the grammar rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Number,
    Identifier,
    Str,
    Operator,
    Rule(String),
}

impl NodeKind {
    /// The stable node-type string seen by backends and external consumers.
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Number => "Number",
            NodeKind::Identifier => "Identifier",
            NodeKind::Str => "String",
            NodeKind::Operator => "Operator",
            NodeKind::Rule(name) => name,
        }
    }

    /// True for the four leaf token classes.
    pub fn is_token(&self) -> bool {
        !matches!(self, NodeKind::Rule(_))
    }
}

/// One node of the source AST.
///
/// A parent exclusively owns its children; the tree is a pure value with no
/// shared substructure. Nodes are never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    kind: NodeKind,
    value: Option<String>,
    children: Vec<AstNode>,
    position: Position,
    span: String,
}

impl AstNode {
    pub fn new(
        kind: NodeKind,
        value: Option<String>,
        children: Vec<AstNode>,
        position: Position,
        span: String,
    ) -> Self {
        Self {
            kind,
            value,
            children,
            position,
            span,
        }
    }

    /// A leaf token node (no children).
    pub fn leaf(kind: NodeKind, value: impl Into<String>, position: Position, span: impl Into<String>) -> Self {
        Self::new(kind, Some(value.into()), Vec::new(), position, span.into())
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The node type string: `"Number"`, `"Identifier"`, `"String"`,
    /// `"Operator"`, or the producing rule's name.
    pub fn node_type(&self) -> &str {
        self.kind.name()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn children(&self) -> &[AstNode] {
        &self.children
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// 1-based line of the first matched character.
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// 1-based column of the first matched character.
    pub fn column(&self) -> usize {
        self.position.column
    }

    /// The source text this node matched, verbatim.
    pub fn span(&self) -> &str {
        &self.span
    }

    /// True when this node is an `Operator` leaf with the given text.
    pub fn is_operator(&self, text: &str) -> bool {
        self.kind == NodeKind::Operator && self.value.as_deref() == Some(text)
    }

    /// Pretty-print the tree, one node per line, indented by depth.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.pretty_into(&mut out, 0);
        out
    }

    fn pretty_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        match (&self.value, self.children.is_empty()) {
            (Some(value), _) => out.push_str(&format!("{}({:?})\n", self.node_type(), value)),
            (None, false) => {
                out.push_str(&format!("{}[{}]\n", self.node_type(), self.children.len()))
            }
            (None, true) => out.push_str(&format!("{}\n", self.node_type())),
        }
        for child in &self.children {
            child.pretty_into(out, depth + 1);
        }
    }
}

impl Serialize for AstNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AstNode", 6)?;
        state.serialize_field("type", self.kind.name())?;
        state.serialize_field("value", &self.value)?;
        state.serialize_field("children", &self.children)?;
        state.serialize_field("line", &self.position.line)?;
        state.serialize_field("column", &self.position.column)?;
        state.serialize_field("span", &self.span)?;
        state.end()
    }
}
