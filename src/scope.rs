//! The shared execution scope
//!
//! One `Scope` is created at program start and lives for the whole run.
//! Every block, branch and function executes against the same instance;
//! there is no call stack and no lexical nesting. Callers and callees
//! communicate through shared, conventionally named variables.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::CodeBlock;
use crate::error::{AmtaError, ErrorKind, Result};
use crate::exec;
use crate::value::Value;

/// Signature of a host-provided native function.
///
/// By convention a native named `f` reads its inputs from `$f_0`, `$f_1`,
/// ..., deletes each input it consumed, and writes its result to `$f_ret`
/// (creating it if absent). Natives report their own failures as sentinel
/// return values, never as engine errors.
pub type NativeHandler = Rc<dyn Fn(&mut Scope) -> Result<()>>;

/// Something the `!name` statement can invoke: a parsed code block or a
/// host-provided native handler. Both run against the shared scope.
#[derive(Clone)]
pub enum Callable {
    Block(Rc<CodeBlock>),
    Native(NativeFn),
}

impl Callable {
    pub fn native(name: &str, f: impl Fn(&mut Scope) -> Result<()> + 'static) -> Self {
        Callable::Native(NativeFn {
            name: name.to_string(),
            handler: Rc::new(f),
        })
    }

    pub fn call(&self, scope: &mut Scope) -> Result<()> {
        match self {
            Callable::Block(block) => exec::call_block(block, scope),
            Callable::Native(native) => (native.handler)(scope),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Block(block) => write!(f, "<block {}>", block.name),
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
        }
    }
}

/// A named native handler
#[derive(Clone)]
pub struct NativeFn {
    pub name: String,
    handler: NativeHandler,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name)
            .field("variables", &self.variables)
            .field("functions", &self.functions)
            .field(
                "extensions",
                &self.extensions.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// The single mutable execution context
pub struct Scope {
    pub name: String,
    variables: BTreeMap<String, Value>,
    functions: BTreeMap<String, Callable>,
    extensions: BTreeMap<String, Box<dyn Any>>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: BTreeMap::new(),
            functions: BTreeMap::new(),
            extensions: BTreeMap::new(),
        }
    }

    // ==================== Variables ====================

    /// Register a new variable. Fatal if the name is already taken.
    pub fn register_variable(&mut self, name: &str, value: Value) -> Result<()> {
        if self.variables.contains_key(name) {
            return Err(AmtaError::in_scope(
                ErrorKind::VariableExists(name.to_string()),
                &self.name,
            ));
        }
        self.variables.insert(name.to_string(), value);
        Ok(())
    }

    /// Look up a variable. Absence is not an error here; callers decide.
    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Overwrite a variable in place, or create it if absent.
    ///
    /// This is the assignment path: it never raises a redefinition error.
    pub fn assign(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    /// Remove a variable. Fatal if it does not exist.
    pub fn unregister_variable(&mut self, name: &str) -> Result<()> {
        if self.variables.remove(name).is_none() {
            return Err(AmtaError::in_scope(
                ErrorKind::UnknownVariable(name.to_string()),
                &self.name,
            ));
        }
        Ok(())
    }

    // ==================== Functions ====================

    /// Register a callable. Fatal if the name is already taken.
    pub fn register_function(&mut self, name: &str, body: Callable) -> Result<()> {
        if self.functions.contains_key(name) {
            return Err(AmtaError::in_scope(
                ErrorKind::FunctionExists(name.to_string()),
                &self.name,
            ));
        }
        self.functions.insert(name.to_string(), body);
        Ok(())
    }

    /// Look up a callable by name. Returned by value so the caller can
    /// invoke it while mutating the scope.
    pub fn get_function(&self, name: &str) -> Option<Callable> {
        self.functions.get(name).cloned()
    }

    /// Register every parsed function under its own name. Fatal on collision.
    pub fn import_functions(&mut self, functions: Vec<CodeBlock>) -> Result<()> {
        for function in functions {
            let name = function.name.clone();
            self.register_function(&name, Callable::Block(Rc::new(function)))?;
        }
        Ok(())
    }

    // ==================== Extension state ====================

    /// Claim a private extension-state slot. A repeated claim on a key
    /// already in use is a silent no-op, not an overwrite.
    pub fn claim_extension(&mut self, key: &str, state: Box<dyn Any>) {
        self.extensions.entry(key.to_string()).or_insert(state);
    }

    pub fn has_extension(&self, key: &str) -> bool {
        self.extensions.contains_key(key)
    }

    /// Borrow the extension state under `key`, downcast to `T`.
    pub fn extension_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.extensions.get_mut(key)?.downcast_mut::<T>()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[scope: {}]", self.name)?;
        writeln!(f, "Variables:")?;
        for (name, value) in &self.variables {
            writeln!(f, "  {} = {} ({})", name, value, value.type_name())?;
        }
        writeln!(f, "Functions:")?;
        for (name, body) in &self.functions {
            writeln!(f, "  {} {:?}", name, body)?;
        }
        Ok(())
    }
}

// ==================== Native calling convention ====================

/// Write a native's result: overwrite `name` if present, create otherwise.
pub fn return_value(scope: &mut Scope, name: &str, value: Value) {
    scope.assign(name, value);
}

/// Consume a string argument: removed from the scope on success. Returns
/// `None` if the variable is absent or not a string, leaving it in place.
pub fn take_str(scope: &mut Scope, name: &str) -> Option<String> {
    match scope.get_variable(name) {
        Some(Value::Str(_)) => match scope.variables.remove(name) {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

/// Consume a numeric argument: removed from the scope on success. Returns
/// `None` if the variable is absent or not a number, leaving it in place.
pub fn take_num(scope: &mut Scope, name: &str) -> Option<f64> {
    match scope.get_variable(name) {
        Some(Value::Num(n)) => {
            let n = *n;
            scope.variables.remove(name);
            Some(n)
        }
        _ => None,
    }
}

/// Consume an argument of either type.
pub fn take_value(scope: &mut Scope, name: &str) -> Option<Value> {
    scope.variables.remove(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_twice_is_fatal() {
        let mut scope = Scope::new("test");
        scope.register_variable("x", Value::Num(1.0)).unwrap();
        assert!(scope.register_variable("x", Value::Num(2.0)).is_err());
    }

    #[test]
    fn assign_never_errors_on_redefinition() {
        let mut scope = Scope::new("test");
        scope.assign("x", Value::Num(1.0));
        scope.assign("x", Value::Str("now a string".to_string()));
        assert_eq!(
            scope.get_variable("x"),
            Some(&Value::Str("now a string".to_string()))
        );
    }

    #[test]
    fn delete_unknown_is_fatal() {
        let mut scope = Scope::new("test");
        assert!(scope.unregister_variable("missing").is_err());
        scope.assign("x", Value::Num(1.0));
        scope.unregister_variable("x").unwrap();
        assert!(scope.get_variable("x").is_none());
    }

    #[test]
    fn extension_claim_is_idempotent() {
        let mut scope = Scope::new("test");
        scope.claim_extension("slot", Box::new(41usize));
        scope.claim_extension("slot", Box::new(0usize));
        assert_eq!(scope.extension_mut::<usize>("slot"), Some(&mut 41));
    }

    #[test]
    fn take_helpers_respect_types() {
        let mut scope = Scope::new("test");
        scope.assign("n", Value::Num(3.0));
        scope.assign("s", Value::Str("hi".to_string()));
        assert_eq!(take_num(&mut scope, "s"), None);
        assert!(scope.get_variable("s").is_some());
        assert_eq!(take_num(&mut scope, "n"), Some(3.0));
        assert!(scope.get_variable("n").is_none());
        assert_eq!(take_str(&mut scope, "s"), Some("hi".to_string()));
    }
}
