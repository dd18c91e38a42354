//! String utilities extension
//!
//! Character-level string natives plus the `$_amtaex_string__quote`
//! variable, which gives scripts a way to embed a literal quote.

use std::io::BufRead;

use crate::error::Result;
use crate::scope::{self, Callable, Scope};
use crate::value::Value;

const QUOTE_VAR: &str = "_amtaex_string__quote";

/// Register the bundle. A second registration is a no-op.
pub fn register(scope: &mut Scope) -> Result<()> {
    if scope.get_variable(QUOTE_VAR).is_some() {
        return Ok(());
    }
    scope.register_variable(QUOTE_VAR, Value::from("\""))?;

    scope.register_function(
        "_amtaex_string_length",
        Callable::native("_amtaex_string_length", |scope| {
            let Some(s) = scope::take_str(scope, "_amtaex_string_length_0") else {
                return Ok(());
            };
            scope::return_value(
                scope,
                "_amtaex_string_length_ret",
                Value::Num(s.chars().count() as f64),
            );
            Ok(())
        }),
    )?;

    scope.register_function(
        "_amtaex_string_charat",
        Callable::native("_amtaex_string_charat", |scope| {
            if !has_str(scope, "_amtaex_string_charat_0")
                || !has_num(scope, "_amtaex_string_charat_1")
            {
                return Ok(());
            }
            let s = scope::take_str(scope, "_amtaex_string_charat_0").unwrap_or_default();
            let idx = scope::take_num(scope, "_amtaex_string_charat_1").unwrap_or_default() as i64;
            let result = if idx < 0 {
                Value::from("idx < 0")
            } else {
                match s.chars().nth(idx as usize) {
                    Some(c) => Value::Str(c.to_string()),
                    None => Value::from("idx >= string length"),
                }
            };
            scope::return_value(scope, "_amtaex_string_charat_ret", result);
            Ok(())
        }),
    )?;

    scope.register_function(
        "_amtaex_string_setchar",
        Callable::native("_amtaex_string_setchar", |scope| {
            if !has_str(scope, "_amtaex_string_setchar_0")
                || !has_num(scope, "_amtaex_string_setchar_1")
                || !has_str(scope, "_amtaex_string_setchar_2")
            {
                return Ok(());
            }
            let s = scope::take_str(scope, "_amtaex_string_setchar_0").unwrap_or_default();
            let idx = scope::take_num(scope, "_amtaex_string_setchar_1").unwrap_or_default() as i64;
            let replacement =
                scope::take_str(scope, "_amtaex_string_setchar_2").unwrap_or_default();
            let result = if idx < 0 {
                Value::from("idx < 0")
            } else if idx as usize >= s.chars().count() {
                Value::from("idx >= string length")
            } else if replacement.chars().count() != 1 {
                Value::Str(format!("\"{}\" is not a single character", replacement))
            } else {
                let replacement = replacement.chars().next().unwrap_or(' ');
                Value::Str(
                    s.chars()
                        .enumerate()
                        .map(|(i, c)| if i as i64 == idx { replacement } else { c })
                        .collect(),
                )
            };
            scope::return_value(scope, "_amtaex_string_setchar_ret", result);
            Ok(())
        }),
    )?;

    scope.register_function(
        "_amtaex_string_pad",
        Callable::native("_amtaex_string_pad", |scope| {
            if !has_str(scope, "_amtaex_string_pad_0") || !has_num(scope, "_amtaex_string_pad_1") {
                return Ok(());
            }
            let mut s = scope::take_str(scope, "_amtaex_string_pad_0").unwrap_or_default();
            let padding = scope::take_num(scope, "_amtaex_string_pad_1").unwrap_or_default() as i64;
            if padding < 0 {
                return Ok(());
            }
            while (s.chars().count() as i64) < padding {
                s.insert(0, ' ');
            }
            scope::return_value(scope, "_amtaex_string_pad_ret", Value::Str(s));
            Ok(())
        }),
    )?;

    scope.register_function(
        "_amtaex_string_number",
        Callable::native("_amtaex_string_number", |scope| {
            let Some(s) = scope::take_str(scope, "_amtaex_string_number_0") else {
                return Ok(());
            };
            let n = s.trim().parse::<f64>().unwrap_or(0.0);
            scope::return_value(scope, "_amtaex_string_number_ret", Value::Num(n));
            Ok(())
        }),
    )?;

    scope.register_function(
        "_amtaex_string_readline",
        Callable::native("_amtaex_string_readline", |scope| {
            let mut line = String::new();
            let _ = std::io::stdin().lock().read_line(&mut line);
            let line = line.trim_end_matches(['\n', '\r']).to_string();
            scope::return_value(scope, "_amtaex_string_readline_ret", Value::Str(line));
            Ok(())
        }),
    )?;
    Ok(())
}

fn has_str(scope: &Scope, name: &str) -> bool {
    matches!(scope.get_variable(name), Some(Value::Str(_)))
}

fn has_num(scope: &Scope, name: &str) -> bool {
    matches!(scope.get_variable(name), Some(Value::Num(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(scope: &mut Scope, name: &str) {
        let function = scope.get_function(name).expect("native registered");
        function.call(scope).expect("native never errors");
    }

    #[test]
    fn quote_variable_is_registered() {
        let mut scope = Scope::new("test");
        register(&mut scope).unwrap();
        assert_eq!(scope.get_variable(QUOTE_VAR), Some(&Value::from("\"")));
        // And a repeated registration leaves it alone.
        register(&mut scope).unwrap();
    }

    #[test]
    fn length_and_charat() {
        let mut scope = Scope::new("test");
        register(&mut scope).unwrap();

        scope.assign("_amtaex_string_length_0", Value::from("hello"));
        call(&mut scope, "_amtaex_string_length");
        assert_eq!(
            scope.get_variable("_amtaex_string_length_ret"),
            Some(&Value::Num(5.0))
        );

        scope.assign("_amtaex_string_charat_0", Value::from("hello"));
        scope.assign("_amtaex_string_charat_1", Value::Num(1.0));
        call(&mut scope, "_amtaex_string_charat");
        assert_eq!(
            scope.get_variable("_amtaex_string_charat_ret"),
            Some(&Value::from("e"))
        );

        scope.assign("_amtaex_string_charat_0", Value::from("hello"));
        scope.assign("_amtaex_string_charat_1", Value::Num(99.0));
        call(&mut scope, "_amtaex_string_charat");
        assert_eq!(
            scope.get_variable("_amtaex_string_charat_ret"),
            Some(&Value::from("idx >= string length"))
        );
    }

    #[test]
    fn setchar_guards() {
        let mut scope = Scope::new("test");
        register(&mut scope).unwrap();

        scope.assign("_amtaex_string_setchar_0", Value::from("cat"));
        scope.assign("_amtaex_string_setchar_1", Value::Num(0.0));
        scope.assign("_amtaex_string_setchar_2", Value::from("b"));
        call(&mut scope, "_amtaex_string_setchar");
        assert_eq!(
            scope.get_variable("_amtaex_string_setchar_ret"),
            Some(&Value::from("bat"))
        );

        scope.assign("_amtaex_string_setchar_0", Value::from("cat"));
        scope.assign("_amtaex_string_setchar_1", Value::Num(0.0));
        scope.assign("_amtaex_string_setchar_2", Value::from("xy"));
        call(&mut scope, "_amtaex_string_setchar");
        assert_eq!(
            scope.get_variable("_amtaex_string_setchar_ret"),
            Some(&Value::from("\"xy\" is not a single character"))
        );
    }

    #[test]
    fn pad_and_number() {
        let mut scope = Scope::new("test");
        register(&mut scope).unwrap();

        scope.assign("_amtaex_string_pad_0", Value::from("7"));
        scope.assign("_amtaex_string_pad_1", Value::Num(3.0));
        call(&mut scope, "_amtaex_string_pad");
        assert_eq!(
            scope.get_variable("_amtaex_string_pad_ret"),
            Some(&Value::from("  7"))
        );

        scope.assign("_amtaex_string_number_0", Value::from("2.5"));
        call(&mut scope, "_amtaex_string_number");
        assert_eq!(
            scope.get_variable("_amtaex_string_number_ret"),
            Some(&Value::Num(2.5))
        );

        scope.assign("_amtaex_string_number_0", Value::from("not a number"));
        call(&mut scope, "_amtaex_string_number");
        assert_eq!(
            scope.get_variable("_amtaex_string_number_ret"),
            Some(&Value::Num(0.0))
        );
    }

    #[test]
    fn wrong_typed_arguments_are_left_alone() {
        let mut scope = Scope::new("test");
        register(&mut scope).unwrap();
        scope.assign("_amtaex_string_length_0", Value::Num(5.0));
        call(&mut scope, "_amtaex_string_length");
        assert!(scope.get_variable("_amtaex_string_length_ret").is_none());
        assert!(scope.get_variable("_amtaex_string_length_0").is_some());
    }
}
