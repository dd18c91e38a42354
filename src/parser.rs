//! Expression parser
//!
//! Parses one macro-expanded, trimmed line fragment into an expression
//! tree. The algorithm is a precedence-table scan: one pass records
//! every depth-0, out-of-string operator position, the loosest-binding
//! operator class present is chosen, and the text is split at every
//! occurrence of that class. Ties fold left-associatively, so
//! `10 - 2 - 3` parses as `(10 - 2) - 3`. A lone class-0 marker is a
//! unary operator over everything to its right.

use crate::ast::{Expr, OpKind};
use crate::error::{AmtaError, ErrorKind, Result};
use crate::macros::is_ident;

/// Operator classes, first-evaluated to last. The class listed later
/// binds loosest and is split first during top-down descent.
const OPERATOR_ORDER: [&str; 6] = ["!_sl", "*/", "+-~", "?'<>", "&", "|"];

fn operator_class(c: char) -> Option<usize> {
    OPERATOR_ORDER.iter().position(|class| class.contains(c))
}

fn operator_kind(c: char) -> Option<OpKind> {
    let kind = match c {
        '+' => OpKind::Add,
        '-' => OpKind::Sub,
        '*' => OpKind::Mul,
        '/' => OpKind::Div,
        '&' => OpKind::And,
        '|' => OpKind::Or,
        '?' => OpKind::NumEq,
        '<' => OpKind::Lt,
        '>' => OpKind::Gt,
        '~' => OpKind::Append,
        '\'' => OpKind::StrEq,
        '!' => OpKind::Not,
        '_' => OpKind::Floor,
        's' => OpKind::NumToStr,
        'l' => OpKind::Lowercase,
        _ => return None,
    };
    Some(kind)
}

/// Parse an expression fragment into a tree.
pub fn parse_expression(expr: &str) -> Result<Expr> {
    let expr = strip_outer_parens(expr.trim());
    let chars: Vec<char> = expr.chars().collect();

    // One pass: record every operator character at depth 0 outside
    // string literals, skipping identifier runs after '$'.
    let mut depth = 0i32;
    let mut in_str = false;
    let mut operators: Vec<usize> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '(' if !in_str => depth += 1,
            ')' if !in_str => depth -= 1,
            '"' => in_str = !in_str,
            '$' if !in_str => {
                while i + 1 < chars.len() && is_ident(chars[i + 1]) {
                    i += 1;
                }
            }
            _ => {
                if depth == 0 && !in_str && operator_class(c).is_some() {
                    operators.push(i);
                }
            }
        }
        i += 1;
    }

    if operators.is_empty() {
        return parse_terminal(&chars, expr);
    }

    // The class with the highest index present is evaluated last, so it
    // is the one to split on.
    let mut class = 0;
    let mut splits: Vec<usize> = Vec::new();
    for &pos in &operators {
        let this_class = operator_class(chars[pos]).unwrap_or(0);
        if this_class > class {
            class = this_class;
            splits.clear();
            splits.push(pos);
        } else if this_class == class {
            splits.push(pos);
        }
    }

    let kind_at = |pos: usize| -> OpKind {
        // Position came from operator_class, so the lookup cannot miss.
        operator_kind(chars[pos]).unwrap_or(OpKind::Add)
    };

    if class == 0 {
        // Unary marker: everything to its right is the operand.
        let operand: String = chars[splits[0] + 1..].iter().collect();
        return Ok(Expr::Op {
            kind: kind_at(splits[0]),
            lhs: Box::new(parse_expression(&operand)?),
            rhs: None,
        });
    }

    // Split at every tied position and fold pairwise left-to-right.
    let mut bounds = splits.clone();
    bounds.push(chars.len());
    let mut segments: Vec<Expr> = Vec::new();
    let mut last = 0;
    for &pos in &bounds {
        let segment: String = chars[last..pos].iter().collect();
        segments.push(parse_expression(&segment)?);
        last = pos + 1;
    }
    let mut segments = segments.into_iter();
    let mut tree = segments.next().unwrap_or(Expr::Num(0.0));
    for (idx, rhs) in segments.enumerate() {
        tree = Expr::Op {
            kind: kind_at(splits[idx]),
            lhs: Box::new(tree),
            rhs: Some(Box::new(rhs)),
        };
    }
    Ok(tree)
}

/// Unwrap `(expr)` down to `expr`, but only while the outer parentheses
/// actually match each other.
fn strip_outer_parens(expr: &str) -> &str {
    let mut expr = expr;
    while expr.starts_with('(') && expr.ends_with(')') && outer_parens_match(expr) {
        expr = expr[1..expr.len() - 1].trim();
    }
    expr
}

fn outer_parens_match(expr: &str) -> bool {
    let mut depth = 0i32;
    let mut in_str = false;
    for (i, c) in expr.char_indices() {
        match c {
            '"' => in_str = !in_str,
            '(' if !in_str => depth += 1,
            ')' if !in_str => {
                depth -= 1;
                if depth == 0 {
                    return i == expr.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

fn parse_terminal(chars: &[char], expr: &str) -> Result<Expr> {
    if let Some(&'$') = chars.first() {
        let name: String = chars[1..]
            .iter()
            .take_while(|&&c| is_ident(c))
            .collect();
        return Ok(Expr::Var(name));
    }
    if let Some(&'"') = chars.first() {
        let Some(end) = chars[1..].iter().position(|&c| c == '"') else {
            return Err(AmtaError::new(ErrorKind::UnterminatedString(
                expr.to_string(),
            )));
        };
        let literal: String = chars[1..1 + end].iter().collect();
        return Ok(Expr::Str(literal));
    }
    let digits: String = chars
        .iter()
        .take_while(|&&c| c.is_ascii_digit() || c == '.')
        .collect();
    digits
        .parse::<f64>()
        .map(Expr::Num)
        .map_err(|_| AmtaError::new(ErrorKind::ExpectedNumber(expr.to_string())))
}
