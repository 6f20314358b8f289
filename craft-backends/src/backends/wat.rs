//! WebAssembly text backend.
//!
//! Emits one `(module ...)` with a 256-page memory, a `$main` function
//! returning `i32 0`, and one `(local $name i32)` per assigned identifier.
//! Arithmetic lowers to nested `i32` instructions; a `print` call becomes a
//! call to a host-provided import (declared only when used).

use craft_parser::AstNode;

use crate::backend::Backend;
use crate::error::BackendError;
use crate::shape;

pub struct WatBackend;

impl Backend for WatBackend {
    fn name(&self) -> &str {
        "wat"
    }

    fn description(&self) -> &str {
        "WebAssembly text module"
    }

    fn translate(&self, ast: &AstNode) -> Result<String, BackendError> {
        let mut emitter = WatEmitter {
            locals: Vec::new(),
            body: Vec::new(),
            needs_print: false,
        };
        emitter.emit_node(ast)?;

        let mut out = String::new();
        out.push_str("(module\n");
        if emitter.needs_print {
            out.push_str("  (import \"env\" \"print\" (func $print (param i32)))\n");
        }
        out.push_str("  (memory 256)\n");
        out.push_str("  (func $main (export \"main\") (result i32)\n");
        for name in &emitter.locals {
            out.push_str(&format!("    (local ${name} i32)\n"));
        }
        for line in &emitter.body {
            out.push_str(&format!("    {line}\n"));
        }
        out.push_str("    (i32.const 0)\n");
        out.push_str("  )\n");
        out.push_str(")\n");
        Ok(out)
    }
}

struct WatEmitter {
    locals: Vec<String>,
    body: Vec<String>,
    needs_print: bool,
}

impl WatEmitter {
    fn emit_node(&mut self, node: &AstNode) -> Result<(), BackendError> {
        if let Some(assign) = shape::as_assignment(node) {
            let name = assign.target.value().unwrap_or("").to_string();
            if !self.locals.contains(&name) {
                self.locals.push(name.clone());
            }
            let rhs = self.expr_instr(assign.value)?;
            self.body.push(format!("(local.set ${name} {rhs})"));
            return Ok(());
        }
        if let Some(args) = shape::print_call_args(node) {
            self.needs_print = true;
            for arg in args {
                let instr = self.expr_instr(arg)?;
                self.body.push(format!("(call $print {instr})"));
            }
            return Ok(());
        }
        if node.node_type() == "Operator" {
            return Ok(());
        }
        if shape::is_expression(node) {
            let instr = self.expr_instr(node)?;
            self.body.push(format!("(drop {instr})"));
            return Ok(());
        }
        for child in node.children() {
            self.emit_node(child)?;
        }
        Ok(())
    }

    /// Build the nested instruction string for an expression subtree.
    fn expr_instr(&mut self, node: &AstNode) -> Result<String, BackendError> {
        match node.node_type() {
            "Number" => {
                let value = node.value().unwrap_or("0");
                if value.contains('.') {
                    Ok(format!("(f64.const {value})"))
                } else {
                    Ok(format!("(i32.const {value})"))
                }
            }
            "Identifier" => Ok(format!("(local.get ${})", node.value().unwrap_or(""))),
            "String" => Err(BackendError::malformed(
                "wat",
                "string literal in integer expression",
            )),
            "Operator" => Ok(String::new()),
            _ => {
                let children = node.children();
                if children.is_empty() {
                    return Ok(format!("(i32.const {})", node.value().unwrap_or("0")));
                }
                if let Some(paren) = children.iter().position(|c| c.is_operator("(")) {
                    if paren == 0 {
                        return match shape::meaningful(node).first() {
                            Some(inner) => self.expr_instr(inner),
                            None => Ok("(i32.const 0)".to_string()),
                        };
                    }
                    if let Some(callee) =
                        children[..paren].iter().find(|c| c.node_type() == "Identifier")
                    {
                        let mut rendered = Vec::new();
                        for arg in children[paren..].iter().filter(|c| c.node_type() != "Operator") {
                            rendered.push(self.expr_instr(arg)?);
                        }
                        return Ok(format!(
                            "(call ${} {})",
                            callee.value().unwrap_or(""),
                            rendered.join(" ")
                        ));
                    }
                }
                self.chain_instr(node)
            }
        }
    }

    /// Left-associative fold of an operator chain into nested instructions.
    fn chain_instr(&mut self, node: &AstNode) -> Result<String, BackendError> {
        let operands: Vec<&AstNode> = node
            .children()
            .iter()
            .filter(|c| c.node_type() != "Operator")
            .collect();
        let operators: Vec<&str> = node
            .children()
            .iter()
            .filter(|c| c.node_type() == "Operator")
            .filter_map(|c| c.value())
            .filter(|op| !shape::is_structural(op))
            .collect();

        let mut acc = match operands.first() {
            Some(first) => self.expr_instr(first)?,
            None => return Ok("(i32.const 0)".to_string()),
        };
        for (i, op) in operators.iter().enumerate() {
            let rhs_node = match operands.get(i + 1) {
                Some(node) => node,
                None => break,
            };
            let rhs = self.expr_instr(rhs_node)?;
            let instr = wat_op(op).ok_or_else(|| {
                BackendError::malformed("wat", format!("no i32 instruction for operator '{op}'"))
            })?;
            acc = format!("({instr} {acc} {rhs})");
        }
        Ok(acc)
    }
}

fn wat_op(op: &str) -> Option<&'static str> {
    match op {
        "+" => Some("i32.add"),
        "-" => Some("i32.sub"),
        "*" => Some("i32.mul"),
        "/" => Some("i32.div_s"),
        "%" => Some("i32.rem_s"),
        "==" => Some("i32.eq"),
        "!=" => Some("i32.ne"),
        "<" => Some("i32.lt_s"),
        ">" => Some("i32.gt_s"),
        "<=" => Some("i32.le_s"),
        ">=" => Some("i32.ge_s"),
        _ => None,
    }
}
