//! Command-line interface for ParserCraft.
//!
//! Parses a source program against a PEG grammar and either prints the AST
//! or lowers it to one of the registered backends.
//!
//! Usage:
//!   craft `<source>` --grammar `<peg-file>` [--emit `<target>`]    - Lower to a target form
//!   craft `<source>` --config `<config>` --execute               - Run via the script backend
//!
//! Exit codes: 0 on success, 1 on a structured error from the core
//! (grammar, source, or backend) or an unreadable input/configuration
//! file, 2 on invalid invocation.

use std::process;

use clap::{Arg, ArgAction, Command};

use craft_backends::{BackendRegistry, ScriptBackend, TranspileOptions};
use craft_config::LanguageConfig;
use craft_parser::{parse_grammar, Grammar, Interpreter};

const EMIT_TARGETS: [&str; 5] = ["ast", "script", "c", "wat", "llvm"];

fn main() {
    let matches = Command::new("craft")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parse a program with a PEG grammar and lower it to a target form")
        .arg_required_else_help(true)
        .arg(
            Arg::new("source")
                .help("Path to the source program")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("grammar")
                .long("grammar")
                .short('g')
                .help("Path to the grammar in PEG notation"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Language configuration file (YAML or JSON)"),
        )
        .arg(
            Arg::new("emit")
                .long("emit")
                .short('e')
                .help("Output form: ast, script, c, wat, or llvm")
                .default_value("script"),
        )
        .arg(
            Arg::new("start-rule")
                .long("start-rule")
                .help("Override the grammar's start rule"),
        )
        .arg(
            Arg::new("execute")
                .long("execute")
                .help("Run the program via the script backend and print its bindings")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let emit = matches
        .get_one::<String>("emit")
        .map(String::as_str)
        .unwrap_or("script");
    if !EMIT_TARGETS.contains(&emit) {
        eprintln!("unknown emit target '{emit}' (expected one of: {})", EMIT_TARGETS.join(", "));
        process::exit(2);
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => craft_config::load_file(path).unwrap_or_else(|e| {
            eprintln!("could not load configuration '{path}': {e}");
            process::exit(1);
        }),
        None => LanguageConfig::default(),
    };

    let grammar = load_grammar(&matches, &config);

    let source_path = matches
        .get_one::<String>("source")
        .map(String::as_str)
        .unwrap_or_default();
    let source = read_file(source_path);

    let ast = Interpreter::new(&grammar).parse(&source).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let script_backend = ScriptBackend::with_options(TranspileOptions {
        keyword_map: config.keyword_map.clone(),
        function_map: config.function_map.clone(),
        operator_map: config.operator_map.clone(),
        ..TranspileOptions::default()
    });

    if matches.get_flag("execute") {
        let bindings = script_backend.execute(&ast).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        });
        for (name, value) in &bindings {
            println!("{name} = {value}");
        }
        return;
    }

    let output = match emit {
        "ast" => serde_json::to_string_pretty(&ast).unwrap_or_else(|e| {
            eprintln!("could not serialize AST: {e}");
            process::exit(1);
        }),
        target => {
            let mut registry = BackendRegistry::with_defaults();
            registry.register(script_backend);
            registry.translate(&ast, target).unwrap_or_else(|e| {
                eprintln!("{e}");
                process::exit(1);
            })
        }
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
}

/// Resolve the grammar from `--grammar` or the configuration's inline
/// grammar section, applying any start-rule override.
fn load_grammar(matches: &clap::ArgMatches, config: &LanguageConfig) -> Grammar {
    let grammar = match matches.get_one::<String>("grammar") {
        Some(path) => {
            let text = read_file(path);
            parse_grammar(&text, path).unwrap_or_else(|e| {
                eprintln!("{e}");
                process::exit(1);
            })
        }
        None => match &config.grammar {
            Some(section) => {
                let grammar = parse_grammar(&section.to_peg_notation(), "config")
                    .unwrap_or_else(|e| {
                        eprintln!("{e}");
                        process::exit(1);
                    });
                grammar.with_start(section.start_rule()).unwrap_or_else(|e| {
                    eprintln!("{e}");
                    process::exit(1);
                })
            }
            None => {
                eprintln!("no grammar given: pass --grammar or a configuration with a grammar section");
                process::exit(2);
            }
        },
    };

    let start_override = matches
        .get_one::<String>("start-rule")
        .cloned()
        .or_else(|| config.start_rule.clone());
    match start_override {
        Some(start) => grammar.with_start(start).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        }),
        None => grammar,
    }
}

fn read_file(path: &str) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("could not read '{path}': {e}");
        process::exit(1);
    })
}
