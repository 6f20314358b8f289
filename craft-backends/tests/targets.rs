//! WebAssembly text and LLVM IR backend tests.

use craft_backends::{Backend, BackendRegistry, LlvmBackend, WatBackend};
use craft_parser::{parse_grammar, AstNode, Interpreter};

const ARITH: &str = "program   <- statement+\n\
                     statement <- IDENT \"=\" expr \";\"\n\
                     expr      <- term ((\"+\" / \"-\") term)*\n\
                     term      <- factor ((\"*\" / \"/\") factor)*\n\
                     factor    <- NUMBER / IDENT / \"(\" expr \")\"";

const WITH_PRINT: &str = "program <- statement+\n\
                          statement <- call \";\" / IDENT \"=\" expr \";\"\n\
                          call <- IDENT \"(\" arg_list \")\"\n\
                          arg_list <- expr (\",\" expr)*\n\
                          expr <- term ((\"+\" / \"-\") term)*\n\
                          term <- factor ((\"*\" / \"/\") factor)*\n\
                          factor <- NUMBER / IDENT";

fn parse_with(grammar_text: &str, source: &str) -> AstNode {
    let grammar = parse_grammar(grammar_text, "test").expect("grammar builds");
    Interpreter::new(&grammar).parse(source).expect("parses")
}

#[test]
fn test_wat_module_shell() {
    let ast = parse_with(ARITH, "x = 1 + 2 ;");
    let output = WatBackend.translate(&ast).expect("translates");
    assert!(output.starts_with("(module\n"));
    assert!(output.contains("  (memory 256)\n"));
    assert!(output.contains("  (func $main (export \"main\") (result i32)\n"));
    assert!(output.contains("    (local $x i32)\n"));
    assert!(output.contains("    (i32.const 0)\n"));
    assert!(output.trim_end().ends_with(')'));
}

#[test]
fn test_wat_assignment_and_arithmetic() {
    let ast = parse_with(ARITH, "x = 1 + 2 ;");
    let output = WatBackend.translate(&ast).expect("translates");
    assert!(output.contains("(local.set $x (i32.add (i32.const 1) (i32.const 2)))"));
}

#[test]
fn test_wat_precedence_is_nested() {
    let ast = parse_with(ARITH, "x = 2 + 3 * 4 ;");
    let output = WatBackend.translate(&ast).expect("translates");
    assert!(output
        .contains("(local.set $x (i32.add (i32.const 2) (i32.mul (i32.const 3) (i32.const 4))))"));
}

#[test]
fn test_wat_parenthesized_grouping() {
    let ast = parse_with(ARITH, "x = ( 1 + 2 ) * 3 ;");
    let output = WatBackend.translate(&ast).expect("translates");
    assert!(output
        .contains("(local.set $x (i32.mul (i32.add (i32.const 1) (i32.const 2)) (i32.const 3)))"));
}

#[test]
fn test_wat_identifier_reads_and_subtraction_division() {
    let ast = parse_with(ARITH, "a = 9 ; b = a - 4 ; c = b / 2 ;");
    let output = WatBackend.translate(&ast).expect("translates");
    assert!(output.contains("(local $a i32)"));
    assert!(output.contains("(local $b i32)"));
    assert!(output.contains("(local $c i32)"));
    assert!(output.contains("(local.set $b (i32.sub (local.get $a) (i32.const 4)))"));
    assert!(output.contains("(local.set $c (i32.div_s (local.get $b) (i32.const 2)))"));
}

#[test]
fn test_wat_print_import_only_when_used() {
    let plain = WatBackend
        .translate(&parse_with(ARITH, "x = 1 ;"))
        .expect("translates");
    assert!(!plain.contains("import"));

    let printing = WatBackend
        .translate(&parse_with(WITH_PRINT, "x = 1 ; print ( x ) ;"))
        .expect("translates");
    assert!(printing.contains("(import \"env\" \"print\" (func $print (param i32)))"));
    assert!(printing.contains("(call $print (local.get $x))"));
}

#[test]
fn test_llvm_main_shell() {
    let ast = parse_with(ARITH, "x = 1 ;");
    let output = LlvmBackend.translate(&ast).expect("translates");
    assert!(output.contains("define i32 @main() {\n"));
    assert!(output.contains("entry:\n"));
    assert!(output.trim_end().ends_with('}'));
    assert!(output.contains("  ret i32 0\n"));
}

#[test]
fn test_llvm_ssa_arithmetic() {
    let ast = parse_with(ARITH, "x = 2 + 3 * 4 ; y = x ;");
    let output = LlvmBackend.translate(&ast).expect("translates");
    assert!(output.contains("%1 = mul i32 3, 4"));
    assert!(output.contains("%2 = add i32 2, %1"));
    assert!(output.contains("%3 = alloca i32"));
    assert!(output.contains("store i32 %2, ptr %3"));
    assert!(output.contains("%4 = load i32, ptr %3"));
    assert!(output.contains("store i32 %4, ptr %5"));
}

#[test]
fn test_llvm_division_uses_sdiv() {
    let ast = parse_with(ARITH, "x = 8 / 2 ;");
    let output = LlvmBackend.translate(&ast).expect("translates");
    assert!(output.contains("%1 = sdiv i32 8, 2"));
}

#[test]
fn test_llvm_print_declares_printf_only_when_used() {
    let plain = LlvmBackend
        .translate(&parse_with(ARITH, "x = 1 ;"))
        .expect("translates");
    assert!(!plain.contains("printf"));

    let printing = LlvmBackend
        .translate(&parse_with(WITH_PRINT, "x = 6 * 7 ; print ( x ) ;"))
        .expect("translates");
    assert!(printing.contains("declare i32 @printf(ptr, ...)"));
    assert!(printing
        .contains("@.fmt.0 = private unnamed_addr constant [4 x i8] c\"%d\\0A\\00\""));
    assert!(printing.contains("@printf(ptr @.fmt.0, i32 %"));
}

#[test]
fn test_all_backends_handle_the_same_ast() {
    let ast = parse_with(ARITH, "x = 2 + 3 * 4 ; y = ( x - 1 ) * 2 ;");
    let registry = BackendRegistry::with_defaults();
    for name in registry.list_backends() {
        let output = registry.translate(&ast, &name).expect("translates");
        assert!(!output.is_empty(), "backend {name} produced no output");
        assert!(output.ends_with('\n'));
    }
}
