//! ANSI C backend.
//!
//! Emits a complete translation unit: the three standard includes, a single
//! `int main(void)` body holding every translated statement, and `return
//! 0;` at the end. Integer locals are declared at their first assignment;
//! `print` calls lower to `printf` with a format string inferred from the
//! argument shapes.

use std::collections::HashSet;

use craft_parser::AstNode;

use crate::backend::Backend;
use crate::error::BackendError;
use crate::shape;

const INCLUDES: [&str; 3] = ["<stdio.h>", "<stdlib.h>", "<string.h>"];

pub struct CBackend;

impl Backend for CBackend {
    fn name(&self) -> &str {
        "c"
    }

    fn description(&self) -> &str {
        "ANSI C translation unit"
    }

    fn translate(&self, ast: &AstNode) -> Result<String, BackendError> {
        let mut emitter = CEmitter {
            lines: Vec::new(),
            depth: 1,
            declared: HashSet::new(),
        };
        emitter.emit_node(ast)?;

        let mut out = String::new();
        for include in INCLUDES {
            out.push_str("#include ");
            out.push_str(include);
            out.push('\n');
        }
        out.push_str("\nint main(void) {\n");
        for line in &emitter.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("    return 0;\n}\n");
        Ok(out)
    }
}

struct CEmitter {
    lines: Vec<String>,
    depth: usize,
    declared: HashSet<String>,
}

impl CEmitter {
    fn push_line(&mut self, text: impl Into<String>) {
        let mut line = "    ".repeat(self.depth);
        line.push_str(&text.into());
        self.lines.push(line);
    }

    fn emit_node(&mut self, node: &AstNode) -> Result<(), BackendError> {
        match node.node_type() {
            "if_stmt" | "IfStmt" => self.emit_conditional(node, "if"),
            "while_stmt" | "WhileStmt" => self.emit_conditional(node, "while"),
            "return_stmt" | "ReturnStmt" => {
                match shape::meaningful(node).first() {
                    Some(value) => {
                        let text = self.expr_text(value);
                        self.push_line(format!("return {text};"));
                    }
                    None => self.push_line("return;"),
                }
                Ok(())
            }
            "print_stmt" | "PrintStmt" => {
                self.emit_printf(&shape::meaningful(node));
                Ok(())
            }
            "Operator" => Ok(()),
            _ => {
                if let Some(assign) = shape::as_assignment(node) {
                    let target = assign.target.value().unwrap_or("").to_string();
                    let value = self.expr_text(assign.value);
                    if self.declared.insert(target.clone()) {
                        self.push_line(format!("int {target} = {value};"));
                    } else {
                        self.push_line(format!("{target} = {value};"));
                    }
                    Ok(())
                } else if let Some(args) = shape::print_call_args(node) {
                    self.emit_printf(&args);
                    Ok(())
                } else if shape::is_expression(node) {
                    let text = self.expr_text(node);
                    if !text.is_empty() {
                        self.push_line(format!("{text};"));
                    }
                    Ok(())
                } else {
                    for child in node.children() {
                        self.emit_node(child)?;
                    }
                    Ok(())
                }
            }
        }
    }

    fn emit_conditional(&mut self, node: &AstNode, keyword: &str) -> Result<(), BackendError> {
        let mut condition: Option<String> = None;
        let mut body: Vec<&AstNode> = Vec::new();
        for child in node.children() {
            match child.node_type() {
                "Operator" => {}
                "block" | "Block" if condition.is_some() => body.extend(child.children().iter()),
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
        self.push_line(format!("{keyword} ({condition}) {{"));
        self.depth += 1;
        for child in body {
            self.emit_node(child)?;
        }
        self.depth -= 1;
        self.push_line("}");
        Ok(())
    }

    /// `printf` with one `%d` per integer expression and one `%s` per
    /// string expression, newline-terminated.
    fn emit_printf(&mut self, args: &[&AstNode]) {
        let mut formats = Vec::new();
        let mut values = Vec::new();
        for arg in shape::flatten_arg_lists(args) {
            formats.push(if shape::contains_string_leaf(arg) {
                "%s"
            } else {
                "%d"
            });
            values.push(self.expr_text(arg));
        }
        if values.is_empty() {
            self.push_line("printf(\"\\n\");");
        } else {
            self.push_line(format!(
                "printf(\"{}\\n\", {});",
                formats.join(" "),
                values.join(", ")
            ));
        }
    }

    fn expr_text(&self, node: &AstNode) -> String {
        match node.node_type() {
            "Number" => node.value().unwrap_or("0").to_string(),
            "Identifier" => node.value().unwrap_or("").to_string(),
            "String" => format!("\"{}\"", node.value().unwrap_or("")),
            "Operator" => node.value().unwrap_or("").to_string(),
            _ => {
                let children = node.children();
                if children.is_empty() {
                    return node.value().unwrap_or("").to_string();
                }
                if let Some(paren) = children.iter().position(|c| c.is_operator("(")) {
                    if paren > 0 {
                        if let Some(callee) =
                            children[..paren].iter().find(|c| c.node_type() == "Identifier")
                        {
                            let args: Vec<&AstNode> = children[paren..]
                                .iter()
                                .filter(|c| c.node_type() != "Operator")
                                .collect();
                            let rendered: Vec<String> = shape::flatten_arg_lists(&args)
                                .iter()
                                .map(|a| self.expr_text(a))
                                .collect();
                            return format!(
                                "{}({})",
                                callee.value().unwrap_or(""),
                                rendered.join(", ")
                            );
                        }
                    }
                }
                // Plain chain: children joined with spaces, operator leaves
                // (parentheses included) contributing their text.
                let mut parts = Vec::new();
                for child in children {
                    if child.node_type() == "Operator" {
                        let op = child.value().unwrap_or("");
                        if shape::is_structural(op) {
                            continue;
                        }
                        parts.push(op.to_string());
                    } else {
                        let text = self.expr_text(child);
                        if !text.is_empty() {
                            parts.push(text);
                        }
                    }
                }
                parts.join(" ")
            }
        }
    }
}

