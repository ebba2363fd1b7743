//! Abstract syntax tree produced by the [parser][crate::parser].
//!
//! Every subtree is owned exclusively by its parent - there is no sharing -
//! and nodes are never mutated once built. The tree outlives parsing but not
//! the evaluator that walks it once.

use crate::token::{Token, TokenKind};

/// A block is an ordered list of statements; its value (when used as an
/// expression, e.g. an `if`/`while` condition) is that of its last
/// statement, or `nil` if empty.
#[derive(Debug, Clone, Default)]
pub struct Block(pub Vec<Stmt>);

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self(statements)
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    /// `name op= value`, where `op` is one of the seven assignment kinds.
    /// The left-hand side must be a bare identifier - indexed targets are
    /// not assignable - so only the name is kept, not a general expression.
    Assign {
        name: String,
        op: TokenKind,
        value: Expr,
    },
    If {
        cond: Block,
        then_block: Block,
        else_ifs: Vec<(Block, Block)>,
        else_block: Option<Block>,
    },
    While {
        cond: Block,
        body: Block,
    },
    /// `for <var> in <iterable> then <body> end for`. Note that `break` and
    /// `continue` are not caught here - only by `while` - per the source
    /// this is grounded on.
    For {
        var: String,
        iterable: Block,
        body: Block,
    },
    Break,
    Continue,
    Return(Option<Expr>),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number(Token),
    Str(Token),
    Bool(Token),
    Nil,
    Variable(String),
    List(Vec<Expr>),
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// Bounds default to `Nil`, resolved to `0` (start) / length (end) at
    /// evaluation time.
    Slice {
        object: Box<Expr>,
        start: Box<Expr>,
        end: Box<Expr>,
    },
    Unary {
        op: TokenKind,
        operand: Box<Expr>,
    },
    Binary {
        op: TokenKind,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `object` carries the parsed variable reference but is never
    /// consulted during evaluation - only `name` is looked up. Kept to
    /// mirror the call-site shape the grammar actually produces.
    Call {
        name: String,
        object: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
    /// Parameters are parsed as full expressions and validated to be bare
    /// identifiers only once the literal is evaluated into a closure - see
    /// `Evaluator::eval_function_literal`.
    Function {
        params: Vec<Expr>,
        body: Block,
    },
}
