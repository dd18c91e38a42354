//! Statement and block execution
//!
//! Statements run strictly in order against the one shared scope.
//! While loops are bounded by the configurable governor; hitting the
//! cap stops the loop silently rather than raising an error.

use crate::ast::{CodeBlock, Stmt};
use crate::config;
use crate::error::{AmtaError, ErrorKind, Result};
use crate::eval::eval;
use crate::scope::Scope;

impl Stmt {
    pub fn execute(&self, scope: &mut Scope) -> Result<()> {
        match self {
            Stmt::Assign { name, value } => {
                let value = eval(value, scope)?;
                scope.assign(name, value);
                Ok(())
            }
            Stmt::Delete { name } => scope.unregister_variable(name),
            Stmt::Call { name } => {
                let function = scope.get_function(name).ok_or_else(|| {
                    AmtaError::in_scope(ErrorKind::UnknownFunction(name.clone()), &scope.name)
                })?;
                function.call(scope)
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                let taken = eval(cond, scope)?.as_num("if condition")? != 0.0;
                if taken {
                    call_block(then_block, scope)
                } else if let Some(else_block) = else_block {
                    call_block(else_block, scope)
                } else {
                    Ok(())
                }
            }
            Stmt::While { cond, body } => {
                let mut steps = 0;
                // Governor is re-read every iteration, not cached.
                while steps < config::max_while_loops()
                    && eval(cond, scope)?.as_num("while condition")? != 0.0
                {
                    call_block(body, scope)?;
                    steps += 1;
                }
                Ok(())
            }
        }
    }
}

/// Run every statement of a block, in order, against the shared scope.
pub fn call_block(block: &CodeBlock, scope: &mut Scope) -> Result<()> {
    config::debug(format!("entering block {}", block.name));
    for stmt in &block.stmts {
        stmt.execute(scope)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, OpKind};
    use crate::value::Value;

    #[test]
    fn assign_creates_then_overwrites() {
        let mut scope = Scope::new("test");
        let create = Stmt::Assign {
            name: "x".to_string(),
            value: Expr::Num(5.0),
        };
        create.execute(&mut scope).unwrap();
        assert_eq!(scope.get_variable("x"), Some(&Value::Num(5.0)));

        let overwrite = Stmt::Assign {
            name: "x".to_string(),
            value: Expr::Str("swapped".to_string()),
        };
        overwrite.execute(&mut scope).unwrap();
        assert_eq!(
            scope.get_variable("x"),
            Some(&Value::Str("swapped".to_string()))
        );
    }

    #[test]
    fn delete_then_reference_is_fatal() {
        let mut scope = Scope::new("test");
        scope.assign("x", Value::Num(1.0));
        Stmt::Delete {
            name: "x".to_string(),
        }
        .execute(&mut scope)
        .unwrap();
        assert!(eval(&Expr::Var("x".to_string()), &scope).is_err());
    }

    #[test]
    fn call_unknown_function_is_fatal() {
        let mut scope = Scope::new("test");
        let call = Stmt::Call {
            name: "nowhere".to_string(),
        };
        assert!(call.execute(&mut scope).is_err());
    }

    #[test]
    fn while_governor_bounds_iterations() {
        config::set_max_while_loops(7);
        let mut scope = Scope::new("test");
        scope.assign("count", Value::Num(0.0));
        // while 1: count = count + 1
        let body = CodeBlock::new(
            "_while_block",
            vec![Stmt::Assign {
                name: "count".to_string(),
                value: Expr::Op {
                    kind: OpKind::Add,
                    lhs: Box::new(Expr::Var("count".to_string())),
                    rhs: Some(Box::new(Expr::Num(1.0))),
                },
            }],
        );
        let stmt = Stmt::While {
            cond: Expr::Num(1.0),
            body,
        };
        stmt.execute(&mut scope).unwrap();
        assert_eq!(scope.get_variable("count"), Some(&Value::Num(7.0)));
        config::set_max_while_loops(config::DEFAULT_MAX_WHILE_LOOPS as i64);
    }

    #[test]
    fn if_without_else_is_noop_when_false() {
        let mut scope = Scope::new("test");
        let stmt = Stmt::If {
            cond: Expr::Num(0.0),
            then_block: CodeBlock::new(
                "_if_true_branch",
                vec![Stmt::Assign {
                    name: "ran".to_string(),
                    value: Expr::Num(1.0),
                }],
            ),
            else_block: None,
        };
        stmt.execute(&mut scope).unwrap();
        assert!(scope.get_variable("ran").is_none());
    }
}
