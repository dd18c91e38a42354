//! Statement and block parser
//!
//! Dispatches each line by prefix and extracts nested `if`/`while`
//! blocks by depth counting. Lines with no recognized prefix are
//! silently skipped; scripts rely on that tolerance.

use crate::ast::{CodeBlock, Stmt};
use crate::error::{AmtaError, ErrorKind, Result};
use crate::parser::parse_expression;

/// Parse a block of newline-separated statements.
pub fn parse_block(block: &str) -> Result<Vec<Stmt>> {
    let lines: Vec<&str> = block.split('\n').map(str::trim).collect();
    let mut stmts = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if let Some(name) = line.strip_prefix("delete$") {
            stmts.push(Stmt::Delete {
                name: name.trim().to_string(),
            });
        } else if line.starts_with('$') {
            stmts.push(parse_assign(line)?);
        } else if let Some(name) = line.strip_prefix('!') {
            stmts.push(Stmt::Call {
                name: name.trim().to_string(),
            });
        } else if line.starts_with("if") {
            let start = i;
            let mut depth = 1;
            let mut has_else = false;
            while depth > 0 {
                i += 1;
                if i >= lines.len() {
                    return Err(AmtaError::new(ErrorKind::UnterminatedBlock("if".to_string())));
                }
                if lines[i].starts_with("if") {
                    depth += 1;
                }
                if lines[i].starts_with("el") && depth == 1 {
                    has_else = true;
                }
                if lines[i].starts_with("fi") {
                    depth -= 1;
                }
            }
            stmts.push(parse_if(&lines[start..=i], has_else)?);
        } else if line.starts_with("while") {
            let start = i;
            let mut depth = 1;
            while depth > 0 {
                i += 1;
                if i >= lines.len() {
                    return Err(AmtaError::new(ErrorKind::UnterminatedBlock(
                        "while".to_string(),
                    )));
                }
                if lines[i].starts_with("while") {
                    depth += 1;
                }
                if lines[i].starts_with("ewhil") {
                    depth -= 1;
                }
            }
            stmts.push(parse_while(&lines[start..=i])?);
        }
        // Anything else is skipped on purpose.
        i += 1;
    }
    Ok(stmts)
}

/// `$name = expr`: split at the first '='.
fn parse_assign(line: &str) -> Result<Stmt> {
    let (lhs, rhs) = line.split_once('=').unwrap_or((line, ""));
    let name = lhs.trim().trim_start_matches('$').to_string();
    Ok(Stmt::Assign {
        name,
        value: parse_expression(rhs)?,
    })
}

fn parse_if(lines: &[&str], has_else: bool) -> Result<Stmt> {
    let cond = parse_expression(&lines[0][2..])?;
    if !has_else {
        let body = lines[1..lines.len() - 1].join("\n");
        return Ok(Stmt::If {
            cond,
            then_block: CodeBlock::new("_if_true_branch", parse_block(&body)?),
            else_block: None,
        });
    }
    // Locate the depth-1 'el' separating the branches.
    let mut i = 0;
    let mut depth = 1;
    loop {
        i += 1;
        if lines[i].starts_with("if") {
            depth += 1;
        }
        if lines[i].starts_with("el") && depth == 1 {
            break;
        }
        if lines[i].starts_with("fi") {
            depth -= 1;
        }
    }
    let then_body = lines[1..i].join("\n");
    let else_body = lines[i + 1..lines.len() - 1].join("\n");
    Ok(Stmt::If {
        cond,
        then_block: CodeBlock::new("_if_true_branch", parse_block(&then_body)?),
        else_block: Some(CodeBlock::new("_if_false_branch", parse_block(&else_body)?)),
    })
}

fn parse_while(lines: &[&str]) -> Result<Stmt> {
    let cond = parse_expression(&lines[0][5..])?;
    let body = lines[1..lines.len() - 1].join("\n");
    Ok(Stmt::While {
        cond,
        body: CodeBlock::new("_while_block", parse_block(&body)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    #[test]
    fn prefix_dispatch() {
        let stmts = parse_block("$x = 1\ndelete$x\n!main\nthis line is skipped").unwrap();
        assert_eq!(stmts.len(), 3);
        assert!(matches!(&stmts[0], Stmt::Assign { name, .. } if name == "x"));
        assert!(matches!(&stmts[1], Stmt::Delete { name } if name == "x"));
        assert!(matches!(&stmts[2], Stmt::Call { name } if name == "main"));
    }

    #[test]
    fn assign_splits_at_first_equals() {
        let stmts = parse_block("$msg = \"a=b\"").unwrap();
        match &stmts[0] {
            Stmt::Assign { name, value } => {
                assert_eq!(name, "msg");
                assert!(matches!(value, Expr::Str(s) if s == "a=b"));
            }
            other => panic!("expected assign, got {:?}", other),
        }
    }

    #[test]
    fn if_with_else() {
        let stmts = parse_block("if $x > 0\n$y = 1\nel\n$y = 2\nfi").unwrap();
        match &stmts[0] {
            Stmt::If {
                then_block,
                else_block,
                ..
            } => {
                assert_eq!(then_block.stmts.len(), 1);
                assert_eq!(else_block.as_ref().map(|b| b.stmts.len()), Some(1));
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn nested_if_is_one_statement() {
        let script = "if $a\nif $b\n$x = 1\nfi\nel\n$x = 2\nfi";
        let stmts = parse_block(script).unwrap();
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::If {
                then_block,
                else_block,
                ..
            } => {
                // Inner if belongs to the then-branch, not split at the inner fi.
                assert_eq!(then_block.stmts.len(), 1);
                assert!(matches!(then_block.stmts[0], Stmt::If { .. }));
                assert!(else_block.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn while_block() {
        let stmts = parse_block("while $x > 0\n$x = $x - 1\newhil").unwrap();
        assert_eq!(stmts.len(), 1);
        match &stmts[0] {
            Stmt::While { body, .. } => assert_eq!(body.stmts.len(), 1),
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_block_is_fatal() {
        assert!(parse_block("if $x\n$y = 1").is_err());
        assert!(parse_block("while $x\n$y = 1").is_err());
    }
}
