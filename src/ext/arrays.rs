//! Array storage extension
//!
//! Scripts have no array type; this bundle keeps named value arrays in
//! the scope's extension state and exposes create/get/set natives over
//! them. Arrays are addressed by a string name and a numeric index.

use std::collections::HashMap;

use crate::error::Result;
use crate::scope::{self, Callable, Scope};
use crate::value::Value;

const STATE_KEY: &str = "amtaex_arrays_extension";

type Storage = HashMap<String, Vec<Value>>;

/// Register the bundle. A second registration is a no-op.
pub fn register(scope: &mut Scope) -> Result<()> {
    if scope.has_extension(STATE_KEY) {
        return Ok(());
    }
    scope.claim_extension(STATE_KEY, Box::new(Storage::new()));

    scope.register_function(
        "_amtaex_arrays_create",
        Callable::native("_amtaex_arrays_create", |scope| {
            if !is_str(scope, "_amtaex_arrays_create_0")
                || !is_num(scope, "_amtaex_arrays_create_1")
            {
                return Ok(());
            }
            let name = match scope::take_str(scope, "_amtaex_arrays_create_0") {
                Some(name) => name,
                None => return Ok(()),
            };
            let length = match scope::take_num(scope, "_amtaex_arrays_create_1") {
                Some(length) => length as i64,
                None => return Ok(()),
            };
            if length < 1 {
                return Ok(());
            }
            if let Some(storage) = scope.extension_mut::<Storage>(STATE_KEY) {
                storage.insert(name, vec![Value::Num(0.0); length as usize]);
            }
            Ok(())
        }),
    )?;

    scope.register_function(
        "_amtaex_arrays_get",
        Callable::native("_amtaex_arrays_get", |scope| {
            if !is_str(scope, "_amtaex_arrays_get_0") || !is_num(scope, "_amtaex_arrays_get_1") {
                return Ok(());
            }
            let name = match scope::take_str(scope, "_amtaex_arrays_get_0") {
                Some(name) => name,
                None => return Ok(()),
            };
            let idx = match scope::take_num(scope, "_amtaex_arrays_get_1") {
                Some(idx) => idx as i64,
                None => return Ok(()),
            };
            if idx < 0 {
                scope::return_value(scope, "_amtaex_arrays_get_ret", Value::from("[idx < 0]"));
                return Ok(());
            }
            let result = match scope.extension_mut::<Storage>(STATE_KEY) {
                Some(storage) => match storage.get(&name) {
                    Some(array) => match array.get(idx as usize) {
                        Some(value) => value.clone(),
                        None => Value::from("[idx >= array length]"),
                    },
                    None => Value::from("[non-existing array]"),
                },
                None => Value::from("[non-existing array]"),
            };
            scope::return_value(scope, "_amtaex_arrays_get_ret", result);
            Ok(())
        }),
    )?;

    scope.register_function(
        "_amtaex_arrays_set",
        Callable::native("_amtaex_arrays_set", |scope| {
            if !is_str(scope, "_amtaex_arrays_set_0")
                || !is_num(scope, "_amtaex_arrays_set_1")
                || scope.get_variable("_amtaex_arrays_set_2").is_none()
            {
                return Ok(());
            }
            let name = match scope::take_str(scope, "_amtaex_arrays_set_0") {
                Some(name) => name,
                None => return Ok(()),
            };
            let idx = match scope::take_num(scope, "_amtaex_arrays_set_1") {
                Some(idx) => idx as i64,
                None => return Ok(()),
            };
            let value = match scope::take_value(scope, "_amtaex_arrays_set_2") {
                Some(value) => value,
                None => return Ok(()),
            };
            if idx < 0 {
                return Ok(());
            }
            if let Some(storage) = scope.extension_mut::<Storage>(STATE_KEY) {
                if let Some(slot) = storage
                    .get_mut(&name)
                    .and_then(|array| array.get_mut(idx as usize))
                {
                    *slot = value;
                }
            }
            Ok(())
        }),
    )?;
    Ok(())
}

fn is_str(scope: &Scope, name: &str) -> bool {
    matches!(scope.get_variable(name), Some(Value::Str(_)))
}

fn is_num(scope: &Scope, name: &str) -> bool {
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
    fn create_set_get_round_trip() {
        let mut scope = Scope::new("test");
        register(&mut scope).unwrap();

        scope.assign("_amtaex_arrays_create_0", Value::from("data"));
        scope.assign("_amtaex_arrays_create_1", Value::Num(3.0));
        call(&mut scope, "_amtaex_arrays_create");

        scope.assign("_amtaex_arrays_set_0", Value::from("data"));
        scope.assign("_amtaex_arrays_set_1", Value::Num(1.0));
        scope.assign("_amtaex_arrays_set_2", Value::from("stored"));
        call(&mut scope, "_amtaex_arrays_set");

        scope.assign("_amtaex_arrays_get_0", Value::from("data"));
        scope.assign("_amtaex_arrays_get_1", Value::Num(1.0));
        call(&mut scope, "_amtaex_arrays_get");
        assert_eq!(
            scope.get_variable("_amtaex_arrays_get_ret"),
            Some(&Value::from("stored"))
        );

        // Untouched slots keep the zero fill.
        scope.assign("_amtaex_arrays_get_0", Value::from("data"));
        scope.assign("_amtaex_arrays_get_1", Value::Num(0.0));
        call(&mut scope, "_amtaex_arrays_get");
        assert_eq!(
            scope.get_variable("_amtaex_arrays_get_ret"),
            Some(&Value::Num(0.0))
        );
    }

    #[test]
    fn get_reports_failures_as_sentinels() {
        let mut scope = Scope::new("test");
        register(&mut scope).unwrap();

        scope.assign("_amtaex_arrays_get_0", Value::from("missing"));
        scope.assign("_amtaex_arrays_get_1", Value::Num(0.0));
        call(&mut scope, "_amtaex_arrays_get");
        assert_eq!(
            scope.get_variable("_amtaex_arrays_get_ret"),
            Some(&Value::from("[non-existing array]"))
        );

        scope.assign("_amtaex_arrays_get_0", Value::from("missing"));
        scope.assign("_amtaex_arrays_get_1", Value::Num(-1.0));
        call(&mut scope, "_amtaex_arrays_get");
        assert_eq!(
            scope.get_variable("_amtaex_arrays_get_ret"),
            Some(&Value::from("[idx < 0]"))
        );
    }

    #[test]
    fn double_registration_is_a_noop() {
        let mut scope = Scope::new("test");
        register(&mut scope).unwrap();
        register(&mut scope).unwrap();
    }

    #[test]
    fn consumed_arguments_are_deleted() {
        let mut scope = Scope::new("test");
        register(&mut scope).unwrap();
        scope.assign("_amtaex_arrays_create_0", Value::from("a"));
        scope.assign("_amtaex_arrays_create_1", Value::Num(2.0));
        call(&mut scope, "_amtaex_arrays_create");
        assert!(scope.get_variable("_amtaex_arrays_create_0").is_none());
        assert!(scope.get_variable("_amtaex_arrays_create_1").is_none());
    }
}
