//! AutoMaTA - a macro-driven, line-oriented scripting language
//!
//! Scripts are preprocessed by a textual macro expander, parsed into
//! function blocks, and tree-walked against one shared mutable scope.

pub mod ast;
pub mod block;
pub mod config;
pub mod error;
pub mod eval;
pub mod exec;
pub mod ext;
pub mod macros;
pub mod parser;
pub mod program;
pub mod scope;
pub mod value;

pub use error::{AmtaError, Result};
pub use program::{Libraries, ProgramParser};
pub use scope::{Callable, Scope};
pub use value::Value;

/// Convenience function to run a script: parse it, register the stock
/// natives and extensions, then call its `main` function. Returns the
/// scope so callers can inspect what the run left behind.
pub fn run(script: &str, libraries: &Libraries) -> Result<Scope> {
    let mut parser = ProgramParser::new(script);
    parser.parse(libraries)?;

    let mut scope = Scope::new("AutoMaTA Processor");
    program::register_stock_natives(&mut scope)?;
    ext::arrays::register(&mut scope)?;
    ext::strings::register(&mut scope)?;
    scope.import_functions(parser.functions)?;

    let main = scope.get_function("main").ok_or_else(|| {
        AmtaError::in_scope(error::ErrorKind::UnknownFunction("main".to_string()), &scope.name)
    })?;
    main.call(&mut scope)?;
    Ok(scope)
}

/// Version of the AutoMaTA interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
