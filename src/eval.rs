//! Expression evaluator
//!
//! Walks an expression tree against the shared scope and produces a
//! fresh value. Evaluation is pure given a scope: it reads variables
//! but never writes them.

use crate::ast::{Expr, OpKind};
use crate::error::{AmtaError, ErrorKind, Result};
use crate::scope::Scope;
use crate::value::Value;

/// Evaluate an expression against a scope.
pub fn eval(expr: &Expr, scope: &Scope) -> Result<Value> {
    match expr {
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Num(n) => Ok(Value::Num(*n)),
        Expr::Var(name) => scope.get_variable(name).cloned().ok_or_else(|| {
            AmtaError::in_scope(ErrorKind::UnknownVariable(name.clone()), &scope.name)
        }),
        Expr::Op { kind, lhs, rhs } => eval_op(*kind, lhs, rhs.as_deref(), scope),
    }
}

fn eval_op(kind: OpKind, lhs: &Expr, rhs: Option<&Expr>, scope: &Scope) -> Result<Value> {
    let left = eval(lhs, scope)?;

    // Unary operators consume only the left side.
    match kind {
        OpKind::Floor => return Ok(Value::Num(num_operand(&left, lhs)?.floor())),
        OpKind::Not => return Ok(Value::from_bool(!left.is_truthy_num(lhs)?)),
        OpKind::NumToStr => return Ok(Value::Str(num_operand(&left, lhs)?.to_string())),
        OpKind::Lowercase => return Ok(Value::Str(str_operand(&left, lhs)?.to_lowercase())),
        _ => {}
    }

    let rhs = rhs.ok_or_else(|| {
        AmtaError::in_scope(ErrorKind::MissingOperand(kind.to_string()), &scope.name)
    })?;
    let right = eval(rhs, scope)?;

    let result = match kind {
        OpKind::Add => Value::Num(num_operand(&left, lhs)? + num_operand(&right, rhs)?),
        OpKind::Sub => Value::Num(num_operand(&left, lhs)? - num_operand(&right, rhs)?),
        OpKind::Mul => Value::Num(num_operand(&left, lhs)? * num_operand(&right, rhs)?),
        OpKind::Div => Value::Num(num_operand(&left, lhs)? / num_operand(&right, rhs)?),
        OpKind::And => {
            Value::from_bool(left.is_truthy_num(lhs)? && right.is_truthy_num(rhs)?)
        }
        OpKind::Or => {
            Value::from_bool(left.is_truthy_num(lhs)? || right.is_truthy_num(rhs)?)
        }
        OpKind::Lt => Value::from_bool(num_operand(&left, lhs)? < num_operand(&right, rhs)?),
        OpKind::Gt => Value::from_bool(num_operand(&left, lhs)? > num_operand(&right, rhs)?),
        OpKind::NumEq => Value::from_bool(num_operand(&left, lhs)? == num_operand(&right, rhs)?),
        OpKind::Append => {
            let mut s = str_operand(&left, lhs)?.to_string();
            s.push_str(str_operand(&right, rhs)?);
            Value::Str(s)
        }
        OpKind::StrEq => Value::from_bool(str_operand(&left, lhs)? == str_operand(&right, rhs)?),
        OpKind::Floor | OpKind::Not | OpKind::NumToStr | OpKind::Lowercase => unreachable!(),
    };
    Ok(result)
}

/// Name an operand for a type-mismatch report: the variable name when the
/// operand is a reference, a generic label otherwise.
fn operand_name(expr: &Expr) -> String {
    match expr {
        Expr::Var(name) => name.clone(),
        Expr::Str(_) => "string constant".to_string(),
        Expr::Num(_) => "number constant".to_string(),
        Expr::Op { .. } => "expression result".to_string(),
    }
}

fn num_operand(value: &Value, expr: &Expr) -> Result<f64> {
    value.as_num(&operand_name(expr))
}

fn str_operand<'a>(value: &'a Value, expr: &Expr) -> Result<&'a str> {
    value.as_str(&operand_name(expr))
}

impl Value {
    /// Truthiness for boolean operators: the operand must be a number.
    fn is_truthy_num(&self, expr: &Expr) -> Result<bool> {
        Ok(num_operand(self, expr)? != 0.0)
    }
}
