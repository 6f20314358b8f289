//! End-to-end tests for the script backend: transpile output shape and the
//! execute path over the arithmetic scenarios.

use std::collections::HashMap;

use craft_backends::{Backend, BackendError, ScriptBackend, TranspileOptions, Value};
use craft_parser::{parse_grammar, AstNode, Interpreter};
use rstest::rstest;

const ARITH: &str = "program   <- statement+\n\
                     statement <- IDENT \"=\" expr \";\"\n\
                     expr      <- term ((\"+\" / \"-\") term)*\n\
                     term      <- factor ((\"*\" / \"/\") factor)*\n\
                     factor    <- NUMBER / IDENT / \"(\" expr \")\"";

const PASCALISH: &str = "program   <- statement+\n\
                         statement <- IDENT \":=\" expr \";\"\n\
                         expr      <- term ((\"+\" / \"-\") term)*\n\
                         term      <- factor ((\"*\" / \"/\") factor)*\n\
                         factor    <- NUMBER / IDENT / \"(\" expr \")\"";

fn parse_with(grammar_text: &str, source: &str) -> AstNode {
    let grammar = parse_grammar(grammar_text, "test").expect("grammar builds");
    Interpreter::new(&grammar).parse(source).expect("parses")
}

#[rstest]
#[case(ARITH, "x = 2 + 3 * 4 ; y = ( x - 1 ) * 2 ;", &[("x", 14), ("y", 26)])]
#[case(PASCALISH, "x := 10 ; y := x * 2 + 5 ; area := x * y ;", &[("x", 10), ("y", 25), ("area", 250)])]
fn test_execute_scenarios(
    #[case] grammar: &str,
    #[case] source: &str,
    #[case] expected: &[(&str, i64)],
) {
    let ast = parse_with(grammar, source);
    let bindings = ScriptBackend::new().execute(&ast).expect("executes");
    assert_eq!(bindings.len(), expected.len());
    for (name, value) in expected {
        assert_eq!(
            bindings.get(*name),
            Some(&Value::Int(*value)),
            "binding {name}"
        );
    }
}

#[test]
fn test_transpile_output_lines() {
    let ast = parse_with(ARITH, "x = 2 + 3 * 4 ; y = ( x - 1 ) * 2 ;");
    let output = ScriptBackend::new().translate(&ast).expect("translates");
    assert_eq!(output, "x = 2 + 3 * 4\ny = (x - 1) * 2\n");
}

#[test]
fn test_wrap_in_main_guard() {
    let ast = parse_with(ARITH, "x = 1 ;");
    let backend = ScriptBackend::with_options(TranspileOptions {
        wrap_in_main: true,
        ..TranspileOptions::default()
    });
    let output = backend.translate(&ast).expect("translates");
    assert!(output.starts_with("if __name__ == \"__main__\":\n"));
    assert!(output.contains("\n    x = 1\n"));
}

#[test]
fn test_execute_ignores_main_guard_option() {
    let ast = parse_with(ARITH, "x = 1 ;");
    let backend = ScriptBackend::with_options(TranspileOptions {
        wrap_in_main: true,
        ..TranspileOptions::default()
    });
    let bindings = backend.execute(&ast).expect("executes");
    assert_eq!(bindings.get("x"), Some(&Value::Int(1)));
}

#[test]
fn test_source_map_comments() {
    let ast = parse_with(ARITH, "x = 1 ;\ny = 2 ;");
    let backend = ScriptBackend::with_options(TranspileOptions {
        source_map_comments: true,
        ..TranspileOptions::default()
    });
    let output = backend.translate(&ast).expect("translates");
    assert!(output.contains("# src: line 1\nx = 1\n"));
    assert!(output.contains("# src: line 2\ny = 2\n"));

    // Comments never disturb execution.
    let bindings = backend.execute(&ast).expect("executes");
    assert_eq!(bindings.get("y"), Some(&Value::Int(2)));
}

#[test]
fn test_custom_indent() {
    let grammar = "program <- statement+\n\
                   statement <- if_stmt / IDENT \"=\" expr \";\"\n\
                   if_stmt <- \"if\" expr \":\" block \"end\"\n\
                   block <- statement+\n\
                   expr <- NUMBER / IDENT";
    let ast = parse_with(grammar, "if 1 : x = 2 ; end");
    let backend = ScriptBackend::with_options(TranspileOptions {
        indent: "  ".to_string(),
        ..TranspileOptions::default()
    });
    let output = backend.translate(&ast).expect("translates");
    assert!(output.contains("if 1:\n  x = 2\n"));
}

#[test]
fn test_keyword_map_applies_to_identifiers() {
    let ast = parse_with(ARITH, "resultado = 5 ;");
    let mut keyword_map = HashMap::new();
    keyword_map.insert("resultado".to_string(), "result".to_string());
    let backend = ScriptBackend::with_options(TranspileOptions {
        keyword_map,
        ..TranspileOptions::default()
    });
    let output = backend.translate(&ast).expect("translates");
    assert_eq!(output, "result = 5\n");
    let bindings = backend.execute(&ast).expect("executes");
    assert_eq!(bindings.get("result"), Some(&Value::Int(5)));
}

#[test]
fn test_function_map_applies_in_call_position() {
    let grammar = "program <- statement+\n\
                   statement <- call \";\" / IDENT \"=\" expr \";\"\n\
                   call <- IDENT \"(\" arg_list \")\"\n\
                   arg_list <- expr (\",\" expr)*\n\
                   expr <- term ((\"+\" / \"-\") term)*\n\
                   term <- factor ((\"*\" / \"/\") factor)*\n\
                   factor <- NUMBER / IDENT";
    let ast = parse_with(grammar, "imprime ( 41 + 1 ) ;");
    let mut function_map = HashMap::new();
    function_map.insert("imprime".to_string(), "print".to_string());
    let backend = ScriptBackend::with_options(TranspileOptions {
        function_map,
        ..TranspileOptions::default()
    });
    let output = backend.translate(&ast).expect("translates");
    assert_eq!(output, "print(41 + 1)\n");
}

#[test]
fn test_operator_map() {
    let ast = parse_with(ARITH, "x = 7 / 2 ;");
    let mut operator_map = HashMap::new();
    operator_map.insert("/".to_string(), "//".to_string());
    let backend = ScriptBackend::with_options(TranspileOptions {
        operator_map,
        ..TranspileOptions::default()
    });
    let output = backend.translate(&ast).expect("translates");
    assert_eq!(output, "x = 7 // 2\n");
}

#[test]
fn test_execute_filters_dunder_names() {
    let ast = parse_with(ARITH, "__scratch = 1 ; x = __scratch + 1 ;");
    let bindings = ScriptBackend::new().execute(&ast).expect("executes");
    assert_eq!(bindings.get("x"), Some(&Value::Int(2)));
    assert!(!bindings.contains_key("__scratch"));
}

#[test]
fn test_execute_reports_execution_errors() {
    let grammar = "program <- statement+\n\
                   statement <- IDENT \"=\" expr \";\"\n\
                   expr <- NUMBER / IDENT";
    let ast = parse_with(grammar, "x = missing ;");
    match ScriptBackend::new().execute(&ast) {
        Err(BackendError::Execution { backend, message }) => {
            assert_eq!(backend, "script");
            assert!(message.contains("undefined variable 'missing'"));
        }
        other => panic!("expected execution error, got {other:?}"),
    }
}

#[test]
fn test_unknown_nodes_are_walked_not_rejected() {
    // A grammar with its own statement rule name still lowers, because
    // recognition is by child shape, not rule name.
    let grammar = "program <- widget+\n\
                   widget <- IDENT \"=\" NUMBER \";\"";
    let ast = parse_with(grammar, "a = 1 ; b = 2 ;");
    let bindings = ScriptBackend::new().execute(&ast).expect("executes");
    assert_eq!(bindings.get("a"), Some(&Value::Int(1)));
    assert_eq!(bindings.get("b"), Some(&Value::Int(2)));
}
