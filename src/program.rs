//! Program assembly
//!
//! Turns raw script text into named code blocks: library imports are
//! resolved and prepended, macros expand, the text splits into trimmed
//! lines, and `@name` ... `@` function definitions are extracted and
//! parsed. The host hands libraries over as already-read text.

use crate::ast::CodeBlock;
use crate::block::parse_block;
use crate::config;
use crate::error::{AmtaError, ErrorKind, Result};
use crate::macros::expand_macros;
use crate::scope::{self, Callable, Scope};
use std::collections::HashMap;

/// Registry of importable library sources, keyed by the name scripts
/// use in `+name` lines.
#[derive(Debug, Default)]
pub struct Libraries {
    sources: HashMap<String, String>,
}

impl Libraries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(name.into(), source.into());
    }

    /// Resolve a library by name. Fatal if it was never registered.
    pub fn resolve(&self, name: &str) -> Result<&str> {
        self.sources
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| AmtaError::new(ErrorKind::UnknownLibrary(name.to_string())))
    }
}

/// Parses a whole script into its function blocks.
pub struct ProgramParser {
    script: String,
    pub functions: Vec<CodeBlock>,
    raw_lines: Vec<String>,
}

impl ProgramParser {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            functions: Vec::new(),
            raw_lines: Vec::new(),
        }
    }

    /// Run the full pipeline: imports, macro expansion, line splitting,
    /// function extraction.
    pub fn parse(&mut self, libraries: &Libraries) -> Result<()> {
        self.import_libraries(libraries)?;
        self.script = expand_macros(&self.script)?;
        self.convert_to_lines();
        self.parse_functions()
    }

    /// Resolve the leading contiguous run of `+name` lines and prepend
    /// the library text, in encounter order, ahead of the rest.
    fn import_libraries(&mut self, libraries: &Libraries) -> Result<()> {
        let mut compiled = String::new();
        let mut imported = 0;
        for raw_line in self.script.split('\n') {
            let line = raw_line.trim();
            let Some(name) = line.strip_prefix('+') else {
                break;
            };
            compiled.push_str(libraries.resolve(name)?);
            compiled.push('\n');
            imported += 1;
        }
        let rest: Vec<&str> = self.script.split('\n').skip(imported).collect();
        self.script = compiled + &rest.join("\n");
        Ok(())
    }

    fn convert_to_lines(&mut self) {
        self.raw_lines = self
            .script
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
    }

    /// Scan for `@name` openers; a lone `@` closes the body.
    fn parse_functions(&mut self) -> Result<()> {
        let mut i = 0;
        while i < self.raw_lines.len() {
            if let Some(name) = self.raw_lines[i].strip_prefix('@') {
                let name = name.to_string();
                let mut body = String::new();
                loop {
                    i += 1;
                    if i >= self.raw_lines.len() {
                        return Err(AmtaError::new(ErrorKind::UnterminatedFunction(name)));
                    }
                    if self.raw_lines[i] == "@" {
                        break;
                    }
                    body.push_str(&self.raw_lines[i]);
                    body.push('\n');
                }
                self.functions
                    .push(CodeBlock::new(name, parse_block(&body)?));
            }
            i += 1;
        }
        Ok(())
    }
}

/// Register the stock `print` and `print_scope` natives.
///
/// `print` takes its argument from `$print_string` or `$print_0` and
/// consumes it; bad input prints a warning instead of aborting the run.
pub fn register_stock_natives(scope: &mut Scope) -> Result<()> {
    scope.register_function(
        "print",
        Callable::native("print", |scope| {
            let name = if scope.get_variable("print_string").is_some() {
                "print_string"
            } else {
                "print_0"
            };
            if scope.get_variable(name).is_none() {
                println!(
                    "[AutoMaTA] print called with no parameter; use $print_string or $print_0"
                );
                return Ok(());
            }
            match scope::take_str(scope, name) {
                Some(s) => println!("{}", s),
                None => println!("[AutoMaTA] print called, but argument was not a string"),
            }
            Ok(())
        }),
    )?;
    scope.register_function(
        "print_scope",
        Callable::native("print_scope", |scope| {
            println!("[AutoMaTA] current scope:");
            let dump = scope.to_string();
            println!("{}", dump);
            Ok(())
        }),
    )?;
    config::debug("registered stock natives");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stmt;

    #[test]
    fn functions_are_extracted_in_order() {
        let script = "@helper\n$y = 2\n@\n@main\n$x = 1\n!helper\n@\n";
        let mut parser = ProgramParser::new(script);
        parser.parse(&Libraries::new()).unwrap();
        assert_eq!(parser.functions.len(), 2);
        assert_eq!(parser.functions[0].name, "helper");
        assert_eq!(parser.functions[1].name, "main");
        assert_eq!(parser.functions[1].stmts.len(), 2);
    }

    #[test]
    fn libraries_prepend_in_encounter_order() {
        let mut libraries = Libraries::new();
        libraries.register("math", "@square\n$r = $n * $n\n@\n");
        libraries.register("io", "@emit\n!print\n@\n");
        let script = "+math\n+io\n@main\n$n = 3\n!square\n@\n";
        let mut parser = ProgramParser::new(script);
        parser.parse(&libraries).unwrap();
        let names: Vec<&str> = parser.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["square", "emit", "main"]);
    }

    #[test]
    fn import_scan_stops_at_first_non_plus_line() {
        let mut libraries = Libraries::new();
        libraries.register("real", "@lib\n$a = 1\n@\n");
        // "+late" comes after a statement line, so it is never resolved.
        let script = "+real\n@main\n$x = 1\n@\n+late\n";
        let mut parser = ProgramParser::new(script);
        parser.parse(&libraries).unwrap();
        assert_eq!(parser.functions.len(), 2);
    }

    #[test]
    fn unknown_library_is_fatal() {
        let mut parser = ProgramParser::new("+missing\n@main\n@\n");
        assert!(parser.parse(&Libraries::new()).is_err());
    }

    #[test]
    fn unterminated_function_is_fatal() {
        let mut parser = ProgramParser::new("@main\n$x = 1\n");
        assert!(parser.parse(&Libraries::new()).is_err());
    }

    #[test]
    fn macros_expand_before_function_extraction() {
        let script = "MACRO assign(v,n) => $v = n\n@main\n^assign(x,5)\n@\n";
        let mut parser = ProgramParser::new(script);
        parser.parse(&Libraries::new()).unwrap();
        assert!(matches!(
            &parser.functions[0].stmts[0],
            Stmt::Assign { name, .. } if name == "x"
        ));
    }
}
