//! Token vector → AST root block.
//!
//! Statements are recursive descent; expressions are precedence climbing
//! (see [`Parser::parse_bin`]). Control-flow statements use symmetric
//! `end <keyword>` terminators, so most of the parser's shape is a handful
//! of near-identical `header ... then <block> end <keyword>` readers.

use crate::ast::{Block, Expr, Stmt};
use crate::error::{InterpError, Result};
use crate::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Binding power table for [`Parser::parse_bin`]. Higher binds tighter.
/// Compound-assignment kinds share their base operator's tier; they never
/// actually reach this table in practice since `a += b` is consumed whole
/// by [`Parser::parse_assignment`], but keeping the mapping complete avoids
/// a silent gap if that ever changes.
fn priority(kind: TokenKind) -> i32 {
    use TokenKind::*;
    match kind {
        Or => 1,
        And => 2,
        Eq | NotEq | Less | Greater | LessEq | GreaterEq => 3,
        Plus | PlusAssign | Minus | MinusAssign => 4,
        Multiply | MultiplyAssign | Divide | DivideAssign | Mod | ModAssign => 5,
        Pow | PowAssign => 6,
        _ => 0,
    }
}

const ASSIGN_OPS: &[TokenKind] = &[
    TokenKind::Assign,
    TokenKind::PlusAssign,
    TokenKind::MinusAssign,
    TokenKind::MultiplyAssign,
    TokenKind::DivideAssign,
    TokenKind::ModAssign,
    TokenKind::PowAssign,
];

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Block> {
        let mut statements = Vec::new();
        while self.pos < self.tokens.len() - 1 {
            statements.push(self.parse_statement()?);
        }
        Ok(Block::new(statements))
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    /// Advances and returns the current token if its kind is in `kinds`,
    /// otherwise leaves `pos` untouched and returns `None`.
    fn matches(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if kinds.contains(&self.peek_kind()) {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            Some(token)
        } else {
            None
        }
    }

    fn require(&mut self, kinds: &[TokenKind], expected: &'static str) -> Result<Token> {
        self.matches(kinds).ok_or(InterpError::UnexpectedToken {
            token_index: self.pos,
            expected,
        })
    }

    fn accept(&mut self, kinds: &[TokenKind]) -> bool {
        self.matches(kinds).is_some()
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        match self.peek_kind() {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Break => {
                self.pos += 1;
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                self.pos += 1;
                Ok(Stmt::Continue)
            }
            TokenKind::Function => Ok(Stmt::Expr(self.parse_function()?)),
            TokenKind::Identifier if self.next_token_is_assignment() => self.parse_assignment(),
            _ => Ok(Stmt::Expr(self.parse_bin(0)?)),
        }
    }

    /// True when the token *after* the current identifier is one of the
    /// seven assignment operators - the lookahead that tells
    /// [`Parser::parse_statement`] whether to read an assignment or a
    /// plain expression statement.
    fn next_token_is_assignment(&self) -> bool {
        self.tokens
            .get(self.pos + 1)
            .is_some_and(|t| ASSIGN_OPS.contains(&t.kind))
    }

    fn parse_assignment(&mut self) -> Result<Stmt> {
        let variable = self.require(&[TokenKind::Identifier], "identifier")?;
        let operation = self.require(ASSIGN_OPS, "assignment operator")?;
        let value = self.parse_bin(0)?;
        Ok(Stmt::Assign {
            name: variable.lexeme,
            op: operation.kind,
            value,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        self.require(&[TokenKind::Return], "'return'")?;
        // A bare `return` is only legal right before a block terminator or
        // EOF; anywhere else the following tokens are parsed as the
        // returned expression.
        let has_value = !matches!(
            self.peek_kind(),
            TokenKind::Eof | TokenKind::End | TokenKind::Else
        );
        if has_value {
            Ok(Stmt::Return(Some(self.parse_bin(0)?)))
        } else {
            Ok(Stmt::Return(None))
        }
    }

    /// Reads statements until the current token's kind is in `terminators`
    /// (or the stream is exhausted). Used for both loop/if bodies and for
    /// the `<cond>`/`<iterable>` slot between a header keyword and `then` -
    /// which in principle should be a single expression, but the grammar
    /// accepts any block there (see the module docs of [`crate::eval`]).
    fn parse_code_until(&mut self, terminators: &[TokenKind]) -> Result<Block> {
        let mut statements = Vec::new();
        while self.pos < self.tokens.len() - 1 && !terminators.contains(&self.peek_kind()) {
            statements.push(self.parse_statement()?);
        }
        Ok(Block::new(statements))
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        self.require(&[TokenKind::If], "'if'")?;
        let cond = self.parse_code_until(&[TokenKind::Then])?;
        self.require(&[TokenKind::Then], "'then'")?;
        let then_block = self.parse_code_until(&[TokenKind::End, TokenKind::Else])?;

        let mut else_ifs = Vec::new();
        let mut else_block = None;

        loop {
            if !self.accept(&[TokenKind::Else]) {
                break;
            }
            if !self.accept(&[TokenKind::If]) {
                // Plain `else`: read its block and stop.
                else_block = Some(self.parse_code_until(&[TokenKind::End])?);
                break;
            }
            let elif_cond = self.parse_code_until(&[TokenKind::Then])?;
            self.require(&[TokenKind::Then], "'then'")?;
            let elif_block = self.parse_code_until(&[TokenKind::End, TokenKind::Else])?;
            else_ifs.push((elif_cond, elif_block));
        }

        self.require(&[TokenKind::End], "'end'")?;
        self.require(&[TokenKind::If], "'if'")?;

        Ok(Stmt::If {
            cond,
            then_block,
            else_ifs,
            else_block,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        self.require(&[TokenKind::While], "'while'")?;
        let cond = self.parse_code_until(&[TokenKind::Then])?;
        self.require(&[TokenKind::Then], "'then'")?;
        let body = self.parse_code_until(&[TokenKind::End])?;
        self.require(&[TokenKind::End], "'end'")?;
        self.require(&[TokenKind::While], "'while'")?;
        Ok(Stmt::While { cond, body })
    }

    fn parse_for(&mut self) -> Result<Stmt> {
        self.require(&[TokenKind::For], "'for'")?;
        let iter = self.require(&[TokenKind::Identifier], "identifier")?;
        self.require(&[TokenKind::In], "'in'")?;
        let iterable = self.parse_code_until(&[TokenKind::Then])?;
        self.require(&[TokenKind::Then], "'then'")?;
        let body = self.parse_code_until(&[TokenKind::End])?;
        self.require(&[TokenKind::End], "'end'")?;
        self.require(&[TokenKind::For], "'for'")?;
        Ok(Stmt::For {
            var: iter.lexeme,
            iterable,
            body,
        })
    }

    fn parse_function(&mut self) -> Result<Expr> {
        self.require(&[TokenKind::Function], "'function'")?;
        self.require(&[TokenKind::LParen], "'('")?;
        let mut params = Vec::new();
        if self.peek_kind() != TokenKind::RParen {
            loop {
                params.push(self.parse_bin(0)?);
                if !self.accept(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.require(&[TokenKind::RParen], "')'")?;
        let body = self.parse_code_until(&[TokenKind::End])?;
        self.require(&[TokenKind::End], "'end'")?;
        self.require(&[TokenKind::Function], "'function'")?;
        Ok(Expr::Function { params, body })
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let kind = self.peek_kind();
        if matches!(kind, TokenKind::Minus | TokenKind::Plus | TokenKind::Not) {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: kind,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    /// Precedence climbing: reads a unary operand, then keeps folding in
    /// binary operators whose priority is `>= min_priority`, recursing with
    /// `priority + 1` so that same-tier operators fold left-associatively
    /// and `^` ends up effectively non-associative (`a^b^c` parses as
    /// `(a^b)^c`).
    fn parse_bin(&mut self, min_priority: i32) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let kind = self.peek_kind();
            let prio = priority(kind);
            if prio == 0 || prio < min_priority {
                break;
            }
            self.pos += 1;
            let right = self.parse_bin(prio + 1)?;
            left = Expr::Binary {
                op: kind,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.tokens[self.pos].clone();

        match token.kind {
            TokenKind::Nil => {
                self.pos += 1;
                Ok(Expr::Nil)
            }
            TokenKind::Number => {
                self.pos += 1;
                Ok(Expr::Number(token))
            }
            TokenKind::Bool => {
                self.pos += 1;
                Ok(Expr::Bool(token))
            }
            TokenKind::String => {
                self.pos += 1;
                if self.peek_kind() == TokenKind::LBracket {
                    self.parse_index_and_slice(Expr::Str(token))
                } else {
                    Ok(Expr::Str(token))
                }
            }
            TokenKind::Identifier => {
                self.pos += 1;
                if self.peek_kind() == TokenKind::LParen {
                    self.parse_call(token)
                } else if self.peek_kind() == TokenKind::LBracket {
                    self.parse_index_and_slice(Expr::Variable(token.lexeme))
                } else {
                    Ok(Expr::Variable(token.lexeme))
                }
            }
            TokenKind::LParen => {
                self.pos += 1;
                let expr = self.parse_bin(0)?;
                self.require(&[TokenKind::RParen], "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_list_literal(),
            TokenKind::Function => self.parse_function(),
            _ => Err(InterpError::UnexpectedToken {
                token_index: self.pos,
                expected: "number, string, bool, nil, identifier, '(', '[' or 'function'",
            }),
        }
    }

    /// `name(arg, arg, ...)`. Each argument is parsed as a single primary,
    /// not a full expression - `f(a + b)` does not do what it looks like it
    /// does. Commas are only skipped, not required, matching the grammar
    /// this is grounded on.
    fn parse_call(&mut self, name: Token) -> Result<Expr> {
        self.require(&[TokenKind::LParen], "'('")?;
        let mut args = Vec::new();
        while self.pos < self.tokens.len() && self.peek_kind() != TokenKind::RParen {
            self.accept(&[TokenKind::Comma]);
            args.push(self.parse_primary()?);
        }
        self.require(&[TokenKind::RParen], "')'")?;
        Ok(Expr::Call {
            name: name.lexeme.clone(),
            object: Some(Box::new(Expr::Variable(name.lexeme))),
            args,
        })
    }

    fn parse_list_literal(&mut self) -> Result<Expr> {
        self.require(&[TokenKind::LBracket], "'['")?;
        let mut elements = Vec::new();
        while self.pos < self.tokens.len() && self.peek_kind() != TokenKind::RBracket {
            self.accept(&[TokenKind::Comma]);
            elements.push(self.parse_bin(0)?);
        }
        self.require(&[TokenKind::RBracket], "']'")?;
        Ok(Expr::List(elements))
    }

    /// After `[`: an optional start expression, then either `]` (index) or
    /// `: <optional end> ]` (slice). Omitted bounds are represented as
    /// `Expr::Nil`, resolved to `0`/length at evaluation time.
    fn parse_index_and_slice(&mut self, object: Expr) -> Result<Expr> {
        self.require(&[TokenKind::LBracket], "'['")?;

        let start = if self.peek_kind() == TokenKind::Colon {
            Expr::Nil
        } else {
            self.parse_bin(0)?
        };

        if self.accept(&[TokenKind::Colon]) {
            let end = if self.peek_kind() == TokenKind::RBracket {
                Expr::Nil
            } else {
                self.parse_bin(0)?
            };
            self.require(&[TokenKind::RBracket], "']'")?;
            return Ok(Expr::Slice {
                object: Box::new(object),
                start: Box::new(start),
                end: Box::new(end),
            });
        }

        self.require(&[TokenKind::RBracket], "']'")?;
        Ok(Expr::Index {
            object: Box::new(object),
            index: Box::new(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Block {
        let tokens = Lexer::new(src).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    #[test]
    fn parses_precedence_correctly() {
        let block = parse("x = 1 + 2 * 3");
        assert_eq!(block.0.len(), 1);
        match &block.0[0] {
            Stmt::Assign { value, .. } => match value {
                Expr::Binary {
                    op: TokenKind::Plus,
                    right,
                    ..
                } => assert!(matches!(**right, Expr::Binary { op: TokenKind::Multiply, .. })),
                other => panic!("expected top-level '+', got {other:?}"),
            },
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn pow_is_left_folded_by_the_climbing_rule() {
        let block = parse("x = a ^ b ^ c");
        match &block.0[0] {
            Stmt::Assign { value, .. } => match value {
                Expr::Binary {
                    op: TokenKind::Pow,
                    left,
                    ..
                } => assert!(matches!(**left, Expr::Binary { op: TokenKind::Pow, .. })),
                other => panic!("expected top-level '^', got {other:?}"),
            },
            _ => panic!("expected assignment"),
        }
    }

    #[test]
    fn if_else_if_else_chain_parses() {
        let block = parse(
            "if a then 1 else if b then 2 else if c then 3 else 4 end if",
        );
        match &block.0[0] {
            Stmt::Expr(_) => panic!("if should be a statement, not bare expr"),
            Stmt::If { else_ifs, else_block, .. } => {
                assert_eq!(else_ifs.len(), 2);
                assert!(else_block.is_some());
            }
            other => panic!("expected if, got {other:?}"),
        }
    }

    #[test]
    fn call_arguments_are_single_primaries() {
        let block = parse("f(a, b)");
        match &block.0[0] {
            Stmt::Expr(Expr::Call { args, .. }) => assert_eq!(args.len(), 2),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn slice_with_omitted_bounds_uses_nil() {
        let block = parse("a[:]");
        match &block.0[0] {
            Stmt::Expr(Expr::Slice { start, end, .. }) => {
                assert!(matches!(**start, Expr::Nil));
                assert!(matches!(**end, Expr::Nil));
            }
            other => panic!("expected slice, got {other:?}"),
        }
    }
}
