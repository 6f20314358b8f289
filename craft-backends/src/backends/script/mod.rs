//! High-level transpiler: the fastest path from a parsed program to a
//! runnable one.
//!
//! Emits an indentation-sensitive imperative form in the style of
//! mainstream scripting languages. Identifier leaves can be remapped
//! through a keyword table, call-position identifiers through a function
//! table, and operator leaves through an operator table, which is what lets
//! one grammar target many surface vocabularies. The `execute` entry point
//! transpiles and immediately evaluates the emitted text in a fresh scope,
//! returning the top-level bindings.

pub mod eval;

pub use eval::{Bindings, Value};

use std::collections::HashMap;

use craft_parser::AstNode;

use crate::backend::Backend;
use crate::error::BackendError;
use crate::shape;

/// Options for the script backend.
#[derive(Debug, Clone)]
pub struct TranspileOptions {
    /// Indentation unit, four spaces unless overridden.
    pub indent: String,
    /// Source-identifier to target-keyword remapping, applied to
    /// `Identifier` leaves.
    pub keyword_map: HashMap<String, String>,
    /// Function-name remapping, applied to identifiers in call position.
    pub function_map: HashMap<String, String>,
    /// Operator remapping, applied to `Operator` leaves in expressions.
    pub operator_map: HashMap<String, String>,
    /// Wrap emitted top-level statements in a main-style guard.
    pub wrap_in_main: bool,
    /// Emit one comment per statement recording its source line.
    pub source_map_comments: bool,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            keyword_map: HashMap::new(),
            function_map: HashMap::new(),
            operator_map: HashMap::new(),
            wrap_in_main: false,
            source_map_comments: false,
        }
    }
}

/// The high-level script backend.
pub struct ScriptBackend {
    options: TranspileOptions,
}

impl ScriptBackend {
    pub fn new() -> Self {
        Self {
            options: TranspileOptions::default(),
        }
    }

    pub fn with_options(options: TranspileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TranspileOptions {
        &self.options
    }

    /// Transpile and evaluate in a fresh top-level scope, returning every
    /// binding whose name does not begin with a double underscore. The
    /// main-style guard is never applied on this path.
    pub fn execute(&self, ast: &AstNode) -> Result<Bindings, BackendError> {
        let script = self.render(ast, false);
        let bindings =
            eval::run_script(&script).map_err(|msg| BackendError::execution("script", msg))?;
        Ok(bindings
            .into_iter()
            .filter(|(name, _)| !name.starts_with("__"))
            .collect())
    }

    fn render(&self, ast: &AstNode, wrap: bool) -> String {
        let mut emitter = Emitter {
            options: &self.options,
            lines: Vec::new(),
            depth: 0,
        };
        emitter.emit_node(ast);
        let mut out = if wrap {
            let mut wrapped = vec!["if __name__ == \"__main__\":".to_string()];
            for line in &emitter.lines {
                if line.trim().is_empty() {
                    wrapped.push(String::new());
                } else {
                    wrapped.push(format!("{}{line}", self.options.indent));
                }
            }
            wrapped.join("\n")
        } else {
            emitter.lines.join("\n")
        };
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

impl Default for ScriptBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for ScriptBackend {
    fn name(&self) -> &str {
        "script"
    }

    fn description(&self) -> &str {
        "runnable high-level script form"
    }

    fn translate(&self, ast: &AstNode) -> Result<String, BackendError> {
        Ok(self.render(ast, self.options.wrap_in_main))
    }
}

struct Emitter<'a> {
    options: &'a TranspileOptions,
    lines: Vec<String>,
    depth: usize,
}

impl Emitter<'_> {
    fn push_line(&mut self, text: impl Into<String>) {
        let text = text.into();
        let mut line = self.options.indent.repeat(self.depth);
        line.push_str(&text);
        self.lines.push(line);
    }

    fn source_comment(&mut self, node: &AstNode) {
        if self.options.source_map_comments {
            self.push_line(format!("# src: line {}", node.line()));
        }
    }

    fn emit_node(&mut self, node: &AstNode) {
        match node.node_type() {
            "function_def" | "FunctionDef" => self.emit_function_def(node),
            "if_stmt" | "IfStmt" => self.emit_conditional(node, "if"),
            "while_stmt" | "WhileStmt" => self.emit_conditional(node, "while"),
            "for_stmt" | "ForStmt" => self.emit_for(node),
            "return_stmt" | "ReturnStmt" => self.emit_return(node),
            "print_stmt" | "PrintStmt" => self.emit_print(node),
            "block" | "Block" => {
                for child in node.children() {
                    self.emit_node(child);
                }
            }
            "Operator" => {}
            _ => {
                if let Some(assign) = shape::as_assignment(node) {
                    self.source_comment(node);
                    let target = self.map_identifier(assign.target.value().unwrap_or(""));
                    let value = self.expr_text(assign.value);
                    self.push_line(format!("{target} = {value}"));
                } else if shape::is_expression(node) {
                    let text = self.expr_text(node);
                    if !text.is_empty() {
                        self.source_comment(node);
                        self.push_line(text);
                    }
                } else {
                    for child in node.children() {
                        self.emit_node(child);
                    }
                }
            }
        }
    }

    fn emit_function_def(&mut self, node: &AstNode) {
        self.source_comment(node);
        let mut name = String::new();
        let mut params = String::new();
        let mut body: Vec<&AstNode> = Vec::new();
        for child in node.children() {
            match child.node_type() {
                "Identifier" => {
                    if name.is_empty() {
                        name = self.map_identifier(child.value().unwrap_or(""));
                    } else {
                        body.push(child);
                    }
                }
                "param_list" => params = self.list_text(child),
                "block" | "Block" => body.extend(child.children().iter()),
                "Operator" => {}
                _ => body.push(child),
            }
        }
        self.push_line(format!("def {name}({params}):"));
        self.emit_body(&body);
    }

    /// Shared shape for `if` and `while`: condition first, body after.
    fn emit_conditional(&mut self, node: &AstNode, keyword: &str) {
        self.source_comment(node);
        let mut condition: Option<String> = None;
        let mut body: Vec<&AstNode> = Vec::new();
        let mut else_body: Vec<&AstNode> = Vec::new();
        for child in node.children() {
            match child.node_type() {
                "Operator" => {}
                "else_block" => else_body.extend(child.children().iter()),
                "block" | "Block" if condition.is_some() => {
                    body.extend(child.children().iter())
                }
                _ => {
                    if condition.is_none() {
                        condition = Some(self.expr_text(child));
                    } else {
                        body.push(child);
                    }
                }
            }
        }
        let condition = condition.unwrap_or_default();
        self.push_line(format!("{keyword} {condition}:"));
        self.emit_body(&body);
        if !else_body.is_empty() {
            self.push_line("else:");
            self.emit_body(&else_body);
        }
    }

    fn emit_for(&mut self, node: &AstNode) {
        self.source_comment(node);
        let meaningful = shape::meaningful(node);
        if meaningful.len() < 2 {
            for child in node.children() {
                self.emit_node(child);
            }
            return;
        }
        let var = self.expr_text(meaningful[0]);
        let iterable = self.expr_text(meaningful[1]);
        let mut body: Vec<&AstNode> = Vec::new();
        for child in &meaningful[2..] {
            match child.node_type() {
                "block" | "Block" => body.extend(child.children().iter()),
                _ => body.push(child),
            }
        }
        self.push_line(format!("for {var} in {iterable}:"));
        self.emit_body(&body);
    }

    fn emit_return(&mut self, node: &AstNode) {
        self.source_comment(node);
        match shape::meaningful(node).first() {
            Some(value) => {
                let text = self.expr_text(value);
                self.push_line(format!("return {text}"));
            }
            None => self.push_line("return"),
        }
    }

    fn emit_print(&mut self, node: &AstNode) {
        self.source_comment(node);
        let args = self.args_text(&shape::meaningful(node));
        self.push_line(format!("print({args})"));
    }

    fn emit_body(&mut self, body: &[&AstNode]) {
        self.depth += 1;
        let before = self.lines.len();
        for child in body {
            self.emit_node(child);
        }
        if self.lines.len() == before {
            self.push_line("pass");
        }
        self.depth -= 1;
    }

    /// Render an expression subtree to text.
    fn expr_text(&self, node: &AstNode) -> String {
        match node.node_type() {
            "Number" => node.value().unwrap_or("0").to_string(),
            "Identifier" => self.map_identifier(node.value().unwrap_or("")),
            "String" => quote(node.value().unwrap_or("")),
            "Operator" => self.map_operator(node.value().unwrap_or("")),
            _ => {
                let children = node.children();
                if children.is_empty() {
                    return node.value().unwrap_or("").to_string();
                }
                match children.iter().position(|c| c.is_operator("(")) {
                    // Parenthesized group: `(` leads.
                    Some(0) => match shape::meaningful(node).first() {
                        Some(inner) => format!("({})", self.expr_text(inner)),
                        None => String::new(),
                    },
                    // Call: something precedes the `(`.
                    Some(paren) => {
                        let callee = self.callee_text(&children[..paren]);
                        let args: Vec<&AstNode> = children[paren..]
                            .iter()
                            .filter(|c| c.node_type() != "Operator")
                            .collect();
                        format!("{callee}({})", self.args_text(&args))
                    }
                    None => self.chain_text(node),
                }
            }
        }
    }

    /// Join an expression chain's children with spaces, skipping
    /// structural punctuation.
    fn chain_text(&self, node: &AstNode) -> String {
        let mut parts = Vec::new();
        for child in node.children() {
            if child.node_type() == "Operator" {
                let op = child.value().unwrap_or("");
                if shape::is_structural(op) {
                    continue;
                }
                parts.push(self.map_operator(op));
            } else {
                let text = self.expr_text(child);
                if !text.is_empty() {
                    parts.push(text);
                }
            }
        }
        parts.join(" ")
    }

    fn callee_text(&self, children: &[AstNode]) -> String {
        for child in children {
            if child.node_type() == "Identifier" {
                return self.map_function(child.value().unwrap_or(""));
            }
        }
        children
            .first()
            .map(|c| self.expr_text(c))
            .unwrap_or_default()
    }

    /// Comma-joined arguments, flattening one `arg_list`/`param_list`
    /// wrapper level.
    fn args_text(&self, args: &[&AstNode]) -> String {
        let mut parts = Vec::new();
        for arg in args {
            match arg.node_type() {
                "arg_list" | "param_list" => {
                    for inner in shape::meaningful(arg) {
                        parts.push(self.expr_text(inner));
                    }
                }
                _ => parts.push(self.expr_text(arg)),
            }
        }
        parts.join(", ")
    }

    fn list_text(&self, node: &AstNode) -> String {
        let parts: Vec<String> = shape::meaningful(node)
            .iter()
            .map(|c| self.expr_text(c))
            .collect();
        parts.join(", ")
    }

    fn map_identifier(&self, name: &str) -> String {
        self.options
            .keyword_map
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    fn map_function(&self, name: &str) -> String {
        self.options
            .function_map
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.map_identifier(name))
    }

    fn map_operator(&self, op: &str) -> String {
        self.options
            .operator_map
            .get(op)
            .cloned()
            .unwrap_or_else(|| op.to_string())
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
