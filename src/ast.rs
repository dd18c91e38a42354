//! Syntax trees for AutoMaTA
//!
//! Expressions, statements and code blocks as built by the parsers.
//! Trees are immutable once built; evaluation never rewrites them.

use std::fmt;

/// Expression nodes
#[derive(Debug, Clone)]
pub enum Expr {
    /// String literal: "hello"
    Str(String),

    /// Number literal: 42, 3.14
    Num(f64),

    /// Variable reference: $foo
    Var(String),

    /// Operation over one or two sub-expressions.
    ///
    /// Unary kinds (Not, Floor, NumToStr, Lowercase) carry only `lhs`;
    /// every other kind requires `rhs`. A binary kind with `rhs: None`
    /// is a builder bug and evaluates to a fatal error.
    Op {
        kind: OpKind,
        lhs: Box<Expr>,
        rhs: Option<Box<Expr>>,
    },
}

/// Operator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,       // +
    Sub,       // -
    Mul,       // *
    Div,       // /
    Floor,     // _  (unary)
    And,       // &
    Or,        // |
    Not,       // !  (unary)
    Lt,        // <
    Gt,        // >
    NumEq,     // ?
    Append,    // ~
    NumToStr,  // s  (unary)
    Lowercase, // l  (unary)
    StrEq,     // '
}

impl OpKind {
    /// Unary kinds take a single operand to their right.
    pub fn is_unary(&self) -> bool {
        matches!(
            self,
            OpKind::Not | OpKind::Floor | OpKind::NumToStr | OpKind::Lowercase
        )
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            OpKind::Add => "+",
            OpKind::Sub => "-",
            OpKind::Mul => "*",
            OpKind::Div => "/",
            OpKind::Floor => "_",
            OpKind::And => "&",
            OpKind::Or => "|",
            OpKind::Not => "!",
            OpKind::Lt => "<",
            OpKind::Gt => ">",
            OpKind::NumEq => "?",
            OpKind::Append => "~",
            OpKind::NumToStr => "s",
            OpKind::Lowercase => "l",
            OpKind::StrEq => "'",
        };
        write!(f, "{}", symbol)
    }
}

/// Statement nodes
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Assignment: $name = expr
    ///
    /// Overwrites if the variable exists, creates it otherwise.
    Assign { name: String, value: Expr },

    /// Deletion: delete$name
    Delete { name: String },

    /// Conditional: if expr ... [el ...] fi
    If {
        cond: Expr,
        then_block: CodeBlock,
        else_block: Option<CodeBlock>,
    },

    /// Bounded loop: while expr ... ewhil
    While { cond: Expr, body: CodeBlock },

    /// Function call: !name
    Call { name: String },
}

/// A named, ordered statement sequence.
///
/// Function bodies, if-branches and while bodies are all code blocks;
/// calling one executes its statements strictly in order against the
/// shared scope.
#[derive(Debug, Clone)]
pub struct CodeBlock {
    pub name: String,
    pub stmts: Vec<Stmt>,
}

impl CodeBlock {
    pub fn new(name: impl Into<String>, stmts: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            stmts,
        }
    }
}
