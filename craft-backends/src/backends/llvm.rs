//! LLVM IR backend.
//!
//! Emits textual IR: a `define i32 @main()` with a single `entry:` block,
//! one `alloca i32` per assigned variable, `load`/`store` for reads and
//! writes, SSA arithmetic over serially numbered temporaries, and a final
//! `ret i32 0`. A `print` call lowers to `printf` against a module-level
//! format constant; the declaration and constants appear only when used.

use std::collections::HashMap;

use craft_parser::AstNode;

use crate::backend::Backend;
use crate::error::BackendError;
use crate::shape;

pub struct LlvmBackend;

impl Backend for LlvmBackend {
    fn name(&self) -> &str {
        "llvm"
    }

    fn description(&self) -> &str {
        "textual LLVM IR"
    }

    fn translate(&self, ast: &AstNode) -> Result<String, BackendError> {
        let mut emitter = LlvmEmitter {
            lines: Vec::new(),
            vars: HashMap::new(),
            globals: Vec::new(),
            counter: 0,
            needs_printf: false,
            terminated: false,
        };
        emitter.emit_node(ast)?;

        let mut out = String::new();
        if emitter.needs_printf {
            out.push_str("declare i32 @printf(ptr, ...)\n\n");
        }
        for global in &emitter.globals {
            out.push_str(global);
            out.push('\n');
        }
        if !emitter.globals.is_empty() {
            out.push('\n');
        }
        out.push_str("define i32 @main() {\nentry:\n");
        for line in &emitter.lines {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
        if !emitter.terminated {
            out.push_str("  ret i32 0\n");
        }
        out.push_str("}\n");
        Ok(out)
    }
}

struct LlvmEmitter {
    lines: Vec<String>,
    /// Variable name to the register holding its `alloca` pointer.
    vars: HashMap<String, String>,
    globals: Vec<String>,
    counter: u32,
    needs_printf: bool,
    terminated: bool,
}

impl LlvmEmitter {
    fn next_reg(&mut self) -> String {
        self.counter += 1;
        format!("%{}", self.counter)
    }

    fn emit(&mut self, line: String) {
        if !self.terminated {
            self.lines.push(line);
        }
    }

    fn emit_node(&mut self, node: &AstNode) -> Result<(), BackendError> {
        if let Some(assign) = shape::as_assignment(node) {
            let name = assign.target.value().unwrap_or("").to_string();
            let value = self.emit_expr(assign.value)?;
            let ptr = match self.vars.get(&name) {
                Some(ptr) => ptr.clone(),
                None => {
                    let ptr = self.next_reg();
                    self.emit(format!("{ptr} = alloca i32"));
                    self.vars.insert(name, ptr.clone());
                    ptr
                }
            };
            self.emit(format!("store i32 {value}, ptr {ptr}"));
            return Ok(());
        }
        if let Some(args) = shape::print_call_args(node) {
            return self.emit_print(&args);
        }
        match node.node_type() {
            "return_stmt" | "ReturnStmt" => {
                let value = match shape::meaningful(node).first() {
                    Some(expr) => self.emit_expr(expr)?,
                    None => "0".to_string(),
                };
                self.emit(format!("ret i32 {value}"));
                self.terminated = true;
                Ok(())
            }
            "print_stmt" | "PrintStmt" => {
                let args = shape::meaningful(node);
                self.emit_print(&shape::flatten_arg_lists(&args))
            }
            "Operator" => Ok(()),
            _ => {
                if shape::is_expression(node) {
                    self.emit_expr(node)?;
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

    fn emit_print(&mut self, args: &[&AstNode]) -> Result<(), BackendError> {
        self.needs_printf = true;
        let mut formats = Vec::new();
        let mut typed_args = Vec::new();
        for arg in args {
            if shape::contains_string_leaf(arg) {
                let text = first_string_value(arg).unwrap_or_default();
                let global = self.string_constant(&text);
                formats.push("%s");
                typed_args.push(format!("ptr {global}"));
            } else {
                let value = self.emit_expr(arg)?;
                formats.push("%d");
                typed_args.push(format!("i32 {value}"));
            }
        }
        let fmt = self.format_constant(&formats.join(" "));
        let reg = self.next_reg();
        if typed_args.is_empty() {
            self.emit(format!("{reg} = call i32 (ptr, ...) @printf(ptr {fmt})"));
        } else {
            self.emit(format!(
                "{reg} = call i32 (ptr, ...) @printf(ptr {fmt}, {})",
                typed_args.join(", ")
            ));
        }
        Ok(())
    }

    /// Intern a `%d %s`-style format string with trailing newline as a
    /// module-level constant.
    fn format_constant(&mut self, body: &str) -> String {
        let name = format!("@.fmt.{}", self.globals.len());
        let len = body.len() + 2;
        self.globals.push(format!(
            "{name} = private unnamed_addr constant [{len} x i8] c\"{}\\0A\\00\"",
            escape_c_string(body)
        ));
        name
    }

    fn string_constant(&mut self, text: &str) -> String {
        let name = format!("@.str.{}", self.globals.len());
        let len = text.len() + 1;
        self.globals.push(format!(
            "{name} = private unnamed_addr constant [{len} x i8] c\"{}\\00\"",
            escape_c_string(text)
        ));
        name
    }

    /// Evaluate an expression subtree, returning an `i32` operand: either a
    /// constant or the register holding the result.
    fn emit_expr(&mut self, node: &AstNode) -> Result<String, BackendError> {
        match node.node_type() {
            "Number" => {
                let value = node.value().unwrap_or("0");
                if value.contains('.') {
                    // Integer backend; a decimal literal is truncated.
                    Ok(value
                        .parse::<f64>()
                        .map(|v| (v as i64).to_string())
                        .unwrap_or_else(|_| "0".to_string()))
                } else {
                    Ok(value.to_string())
                }
            }
            "Identifier" => {
                let name = node.value().unwrap_or("");
                match self.vars.get(name) {
                    Some(ptr) => {
                        let ptr = ptr.clone();
                        let reg = self.next_reg();
                        self.emit(format!("{reg} = load i32, ptr {ptr}"));
                        Ok(reg)
                    }
                    None => Ok("0".to_string()),
                }
            }
            "String" => Err(BackendError::malformed(
                "llvm",
                "string literal in integer expression",
            )),
            "Operator" => Ok("0".to_string()),
            _ => {
                let children = node.children();
                if children.is_empty() {
                    return Ok(node.value().unwrap_or("0").to_string());
                }
                if let Some(paren) = children.iter().position(|c| c.is_operator("(")) {
                    if paren == 0 {
                        return match shape::meaningful(node).first() {
                            Some(inner) => self.emit_expr(inner),
                            None => Ok("0".to_string()),
                        };
                    }
                    if let Some(callee) = children[..paren]
                        .iter()
                        .find(|c| c.node_type() == "Identifier")
                    {
                        let mut rendered = Vec::new();
                        for arg in children[paren..]
                            .iter()
                            .filter(|c| c.node_type() != "Operator")
                        {
                            let value = self.emit_expr(arg)?;
                            rendered.push(format!("i32 {value}"));
                        }
                        let reg = self.next_reg();
                        self.emit(format!(
                            "{reg} = call i32 @{}({})",
                            callee.value().unwrap_or(""),
                            rendered.join(", ")
                        ));
                        return Ok(reg);
                    }
                }
                self.chain_expr(node)
            }
        }
    }

    fn chain_expr(&mut self, node: &AstNode) -> Result<String, BackendError> {
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
            .filter(|op| !shape::is_structural(op) && *op != "(" && *op != ")")
            .collect();

        let mut acc = match operands.first() {
            Some(first) => self.emit_expr(first)?,
            None => return Ok("0".to_string()),
        };
        for (i, op) in operators.iter().enumerate() {
            let rhs_node = match operands.get(i + 1) {
                Some(node) => node,
                None => break,
            };
            let rhs = self.emit_expr(rhs_node)?;
            let inst = llvm_op(op).ok_or_else(|| {
                BackendError::malformed("llvm", format!("no i32 instruction for operator '{op}'"))
            })?;
            let reg = self.next_reg();
            self.emit(format!("{reg} = {inst} i32 {acc}, {rhs}"));
            acc = reg;
        }
        Ok(acc)
    }
}

fn llvm_op(op: &str) -> Option<&'static str> {
    match op {
        "+" => Some("add"),
        "-" => Some("sub"),
        "*" => Some("mul"),
        "/" => Some("sdiv"),
        "%" => Some("srem"),
        "==" => Some("icmp eq"),
        "!=" => Some("icmp ne"),
        "<" => Some("icmp slt"),
        ">" => Some("icmp sgt"),
        "<=" => Some("icmp sle"),
        ">=" => Some("icmp sge"),
        _ => None,
    }
}

fn first_string_value(node: &AstNode) -> Option<String> {
    if node.node_type() == "String" {
        return node.value().map(|v| v.to_string());
    }
    node.children().iter().find_map(first_string_value)
}

fn escape_c_string(text: &str) -> String {
    let mut out = String::new();
    for byte in text.bytes() {
        match byte {
            b'"' => out.push_str("\\22"),
            b'\\' => out.push_str("\\5C"),
            0x20..=0x7E => out.push(byte as char),
            other => out.push_str(&format!("\\{other:02X}")),
        }
    }
    out
}
