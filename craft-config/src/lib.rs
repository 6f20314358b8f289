//! Shared configuration loader for the ParserCraft toolchain.
//!
//! Language configurations are key-value documents in YAML or JSON.
//! Applications layer files and string sources through [`Loader`] before
//! deserializing into [`LanguageConfig`]. The core reads only the remap
//! tables, the start-rule override, and the optional grammar section; every
//! other field belongs to outer tooling and is ignored here.

use std::collections::HashMap;
use std::path::Path;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat};
use serde::Deserialize;

/// The configuration keys consumed by the core.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Identifier-to-keyword remapping for the high-level transpiler.
    pub keyword_map: HashMap<String, String>,
    /// Function-name remapping for call-position identifiers.
    pub function_map: HashMap<String, String>,
    /// Operator remapping for operator leaves.
    pub operator_map: HashMap<String, String>,
    /// Overrides the grammar's default start rule.
    pub start_rule: Option<String>,
    /// Optional inline grammar definition.
    pub grammar: Option<GrammarSection>,
}

/// An inline grammar carried inside a language configuration: one PEG
/// pattern per rule name, plus an optional start rule (defaulting to
/// `program`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GrammarSection {
    pub start: Option<String>,
    pub rules: HashMap<String, String>,
}

impl GrammarSection {
    /// Assemble the rules into PEG notation for the grammar parser. Rules
    /// are emitted in name order; the effective start rule is `start`, or
    /// `program` when unset.
    pub fn to_peg_notation(&self) -> String {
        let mut names: Vec<&String> = self.rules.keys().collect();
        names.sort();
        let mut out = String::new();
        for name in names {
            out.push_str(name);
            out.push_str(" <- ");
            out.push_str(&self.rules[name]);
            out.push('\n');
        }
        out
    }

    /// The start rule this section asks for.
    pub fn start_rule(&self) -> &str {
        self.start.as_deref().unwrap_or("program")
    }
}

/// Helper for layering configuration sources.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start an empty loader.
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Layer a configuration file; the format follows the extension
    /// (`.json` is JSON, anything else is read as YAML). Missing files
    /// trigger an error at build time.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let format = format_for(path.as_ref());
        let source = File::from(path.as_ref()).format(format).required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let format = format_for(path.as_ref());
        let source = File::from(path.as_ref()).format(format).required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an in-memory YAML document.
    pub fn with_yaml(mut self, text: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(text, FileFormat::Yaml));
        self
    }

    /// Layer an in-memory JSON document.
    pub fn with_json(mut self, text: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(text, FileFormat::Json));
        self
    }

    /// Finalize and deserialize the layered configuration.
    pub fn build(self) -> Result<LanguageConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

fn format_for(path: &Path) -> FileFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => FileFormat::Json,
        _ => FileFormat::Yaml,
    }
}

/// Convenience wrapper: load one configuration file.
pub fn load_file(path: impl AsRef<Path>) -> Result<LanguageConfig, ConfigError> {
    Loader::new().with_file(path).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_defaults() {
        let config = Loader::new().with_yaml("{}").build().expect("builds");
        assert!(config.keyword_map.is_empty());
        assert!(config.start_rule.is_none());
        assert!(config.grammar.is_none());
    }

    #[test]
    fn test_yaml_maps() {
        let config = Loader::new()
            .with_yaml(
                "keyword_map:\n  si: if\n  mientras: while\n\
                 function_map:\n  imprime: print\n\
                 operator_map:\n  y: and\n\
                 start_rule: program",
            )
            .build()
            .expect("builds");
        assert_eq!(config.keyword_map.get("si").map(String::as_str), Some("if"));
        assert_eq!(
            config.function_map.get("imprime").map(String::as_str),
            Some("print")
        );
        assert_eq!(config.operator_map.get("y").map(String::as_str), Some("and"));
        assert_eq!(config.start_rule.as_deref(), Some("program"));
    }

    #[test]
    fn test_json_source() {
        let config = Loader::new()
            .with_json(r#"{"keyword_map": {"si": "if"}, "start_rule": "expr"}"#)
            .build()
            .expect("builds");
        assert_eq!(config.keyword_map.get("si").map(String::as_str), Some("if"));
        assert_eq!(config.start_rule.as_deref(), Some("expr"));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let config = Loader::new()
            .with_yaml("name: teachlang\npresets: [basic]\nkeyword_map:\n  si: if")
            .build()
            .expect("builds");
        assert_eq!(config.keyword_map.len(), 1);
    }

    #[test]
    fn test_later_sources_override() {
        let config = Loader::new()
            .with_yaml("start_rule: program")
            .with_yaml("start_rule: expr")
            .build()
            .expect("builds");
        assert_eq!(config.start_rule.as_deref(), Some("expr"));
    }

    #[test]
    fn test_grammar_section_notation() {
        let config = Loader::new()
            .with_yaml(
                "grammar:\n  start: program\n  rules:\n    program: statement+\n    statement: \"IDENT '=' expr ';'\"\n    expr: NUMBER",
            )
            .build()
            .expect("builds");
        let section = config.grammar.expect("grammar section present");
        assert_eq!(section.start_rule(), "program");
        let notation = section.to_peg_notation();
        assert!(notation.contains("program <- statement+\n"));
        assert!(notation.contains("statement <- IDENT '=' expr ';'\n"));
        assert!(notation.contains("expr <- NUMBER\n"));
    }

    #[test]
    fn test_grammar_section_default_start() {
        let section = GrammarSection::default();
        assert_eq!(section.start_rule(), "program");
    }
}
