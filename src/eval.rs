//! Tree-walking evaluator.
//!
//! `break`/`continue`/`return` are modeled as [`Flow`] variants rather than
//! folded into [`InterpError`] - they are non-local jumps, not failures, and
//! only `while` and function call sites ever catch them. `for` deliberately
//! does not, mirroring the source this is grounded on: a `break` inside a
//! `for` body unwinds straight through it looking for an enclosing `while`
//! or the top of a function call.

use crate::ast::{Block, Expr, Stmt};
use crate::error::{InterpError, Result};
use crate::scope::Scope;
use crate::token::TokenKind;
use crate::value::{format_value, UserFnData, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Either a propagating error or one of the three non-local jumps.
/// `From<InterpError>` lets evaluator code keep using `?` unchanged.
pub enum Flow {
    Error(InterpError),
    Break,
    Continue,
    Return(Value),
}

impl From<InterpError> for Flow {
    fn from(e: InterpError) -> Self {
        Flow::Error(e)
    }
}

pub type EvalResult = std::result::Result<Value, Flow>;

pub struct Evaluator {
    pub root: Scope,
    /// Names of functions currently on the call stack, innermost last; read
    /// by the `stacktrace` builtin.
    pub call_stack: Rc<RefCell<Vec<String>>>,
}

impl Evaluator {
    pub fn new(root: Scope) -> Self {
        Self {
            root,
            call_stack: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Runs a full program: any [`Flow::Break`]/[`Flow::Continue`]/[`Flow::Return`]
    /// that escapes every loop and function call is a program error, not a
    /// silent no-op - there is nothing left to catch it.
    pub fn run(&self, program: &Block) -> Result<Value> {
        match self.eval_block(program) {
            Ok(v) => Ok(v),
            Err(Flow::Error(e)) => Err(e),
            Err(Flow::Break) | Err(Flow::Continue) | Err(Flow::Return(_)) => {
                Err(InterpError::runtime("break/continue/return outside of any loop or function"))
            }
        }
    }

    pub fn eval_block(&self, block: &Block) -> EvalResult {
        let mut last = Value::Nil;
        for stmt in &block.0 {
            last = self.eval_stmt(stmt)?;
        }
        Ok(last)
    }

    fn eval_stmt(&self, stmt: &Stmt) -> EvalResult {
        match stmt {
            Stmt::Expr(expr) => self.eval(expr),
            Stmt::Assign { name, op, value } => self.eval_assign(name, *op, value),
            Stmt::If {
                cond,
                then_block,
                else_ifs,
                else_block,
            } => self.eval_if(cond, then_block, else_ifs, else_block),
            Stmt::While { cond, body } => self.eval_while(cond, body),
            Stmt::For { var, iterable, body } => self.eval_for(var, iterable, body),
            Stmt::Break => Err(Flow::Break),
            Stmt::Continue => Err(Flow::Continue),
            Stmt::Return(value) => {
                let v = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Nil,
                };
                Err(Flow::Return(v))
            }
        }
    }

    fn eval(&self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::Number(token) => {
                let n: f64 = token
                    .lexeme
                    .parse()
                    .map_err(|_| InterpError::runtime(format!("invalid number literal '{}'", token.lexeme)))?;
                Ok(Value::Number(n))
            }
            Expr::Str(token) => Ok(Value::Str(token.lexeme.clone())),
            Expr::Bool(token) => Ok(Value::Bool(token.lexeme == "true")),
            Expr::Nil => Ok(Value::Nil),
            Expr::Variable(name) => Ok(self.root.look_up(name)?),
            Expr::List(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for e in elements {
                    values.push(self.eval(e)?);
                }
                Ok(Value::list(values))
            }
            Expr::Unary { op, operand } => self.eval_unary(*op, operand),
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right),
            Expr::Index { object, index } => self.eval_index(object, index),
            Expr::Slice { object, start, end } => self.eval_slice(object, start, end),
            Expr::Call { name, args, .. } => self.eval_call(name, args),
            Expr::Function { params, body } => self.eval_function_literal(params, body),
        }
    }

    /// Only `-` is actually implemented. `+` and `not` parse but have no
    /// evaluation rule - calling either is a runtime error, not a silent
    /// identity/negation. This mirrors the source exactly: its switch over
    /// unary operators only has a `MINUS` case.
    fn eval_unary(&self, op: TokenKind, operand: &Expr) -> EvalResult {
        let value = self.eval(operand)?;
        match op {
            TokenKind::Minus => match value {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(InterpError::runtime(format!(
                    "unary '-' is only defined for numbers, got {}",
                    other.type_name()
                ))
                .into()),
            },
            TokenKind::Plus => Err(InterpError::runtime("unary '+' has no evaluation rule").into()),
            TokenKind::Not => Err(InterpError::runtime("unary 'not' has no evaluation rule").into()),
            _ => unreachable!("parser never produces a unary op outside -/+/not"),
        }
    }

    /// `name (op)= value`. Plain `=` replaces the binding wholesale (and, if
    /// the value is a still-anonymous function literal, names it after the
    /// target - which is what makes `f = function(...) ... end function`
    /// usable recursively by name). The six compound forms all require both
    /// sides to already be numbers.
    fn eval_assign(&self, name: &str, op: TokenKind, value: &Expr) -> EvalResult {
        if op == TokenKind::Assign {
            let val = self.eval(value)?;
            if let Value::UserFn(f) = &val {
                if f.borrow().name.is_empty() {
                    f.borrow_mut().name = name.to_string();
                }
            }
            self.root.assign(name, val.clone());
            return Ok(val);
        }

        let rhs = self.eval(value)?;
        let rhs = match rhs {
            Value::Number(n) => n,
            other => {
                return Err(InterpError::runtime(format!(
                    "compound assignment requires a number, got {}",
                    other.type_name()
                ))
                .into())
            }
        };
        let current = self.root.look_up(name)?;
        let current = match current {
            Value::Number(n) => n,
            other => {
                return Err(InterpError::runtime(format!(
                    "compound assignment requires a number, got {}",
                    other.type_name()
                ))
                .into())
            }
        };

        let result = match op {
            TokenKind::PlusAssign => current + rhs,
            TokenKind::MinusAssign => current - rhs,
            TokenKind::MultiplyAssign => current * rhs,
            TokenKind::DivideAssign => current / rhs,
            TokenKind::ModAssign => current % rhs,
            TokenKind::PowAssign => current.powf(rhs),
            _ => unreachable!("parser only emits the seven assignment kinds"),
        };
        self.root.assign(name, Value::Number(result));
        Ok(Value::Number(rhs))
    }

    fn eval_if(
        &self,
        cond: &Block,
        then_block: &Block,
        else_ifs: &[(Block, Block)],
        else_block: &Option<Block>,
    ) -> EvalResult {
        if self.eval_condition(cond)? {
            return self.eval_block(then_block);
        }
        for (elif_cond, elif_block) in else_ifs {
            if self.eval_condition(elif_cond)? {
                return self.eval_block(elif_block);
            }
        }
        match else_block {
            Some(block) => self.eval_block(block),
            None => Ok(Value::Nil),
        }
    }

    fn eval_condition(&self, cond: &Block) -> std::result::Result<bool, Flow> {
        match self.eval_block(cond)? {
            Value::Bool(b) => Ok(b),
            other => Err(InterpError::runtime(format!(
                "condition must be a bool, got {}",
                other.type_name()
            ))
            .into()),
        }
    }

    fn eval_while(&self, cond: &Block, body: &Block) -> EvalResult {
        while self.eval_condition(cond)? {
            match self.eval_block(body) {
                Ok(_) => {}
                Err(Flow::Break) => break,
                Err(Flow::Continue) => continue,
                Err(other) => return Err(other),
            }
        }
        Ok(Value::Nil)
    }

    /// `break`/`continue` propagate straight through - only `while` and
    /// function boundaries catch them.
    fn eval_for(&self, var: &str, iterable: &Block, body: &Block) -> EvalResult {
        let list = match self.eval_block(iterable)? {
            Value::List(items) => items,
            other => {
                return Err(InterpError::runtime(format!(
                    "for loop requires a list to iterate, got {}",
                    other.type_name()
                ))
                .into())
            }
        };
        for item in list.iter() {
            self.root.assign(var, item.clone());
            self.eval_block(body)?;
        }
        Ok(Value::Nil)
    }

    /// Evaluates `index`, then `object` - in that order, matching evaluation
    /// order elsewhere in this module, since either subexpression may call a
    /// function with observable side effects.
    fn eval_index(&self, object: &Expr, index: &Expr) -> EvalResult {
        let index = self.eval(index)?;
        let object = self.eval(object)?;

        let i = require_whole_number(&index, "index")?;

        match object {
            Value::Str(s) => {
                let bytes = s.as_bytes();
                let idx = in_bounds(i, bytes.len())?;
                Ok(Value::Str(String::from_utf8_lossy(&bytes[idx..idx + 1]).into_owned()))
            }
            Value::List(items) => {
                let idx = in_bounds(i, items.len())?;
                Ok(items[idx].clone())
            }
            other => Err(InterpError::runtime(format!(
                "cannot index into a {}",
                other.type_name()
            ))
            .into()),
        }
    }

    /// Evaluates `start`, then `end`, defaults a nil `start` to `0`, then
    /// evaluates `object` - this exact order (and the fact that `end`'s
    /// nil-default depends on `object`'s runtime type) is preserved from the
    /// source this is grounded on.
    ///
    /// String bounds are inclusive on the right (`end - start + 1` bytes);
    /// list bounds are the usual half-open `[start, end)`. This asymmetry is
    /// intentional, not a bug to normalize away.
    fn eval_slice(&self, object: &Expr, start: &Expr, end: &Expr) -> EvalResult {
        let start_v = self.eval(start)?;
        let end_v = self.eval(end)?;
        let start_v = if matches!(start_v, Value::Nil) {
            Value::Number(0.0)
        } else {
            start_v
        };
        let object_v = self.eval(object)?;

        match object_v {
            Value::Str(s) => {
                let bytes = s.as_bytes();
                let end_v = if matches!(end_v, Value::Nil) {
                    Value::Number(bytes.len() as f64)
                } else {
                    end_v
                };
                let istart = require_whole_number(&start_v, "slice bound")?;
                let iend = require_whole_number(&end_v, "slice bound")?;
                if istart < 0 || iend <= istart || iend as usize > bytes.len() {
                    return Err(InterpError::runtime("slice index is out of range").into());
                }
                Ok(Value::Str(
                    String::from_utf8_lossy(&bytes[istart as usize..iend as usize]).into_owned(),
                ))
            }
            Value::List(items) => {
                let end_v = if matches!(end_v, Value::Nil) {
                    Value::Number(items.len() as f64)
                } else {
                    end_v
                };
                let istart = require_whole_number(&start_v, "slice bound")?;
                let iend = require_whole_number(&end_v, "slice bound")?;
                if istart < 0 || iend <= istart || iend as usize > items.len() {
                    return Err(InterpError::runtime("slice index is out of range").into());
                }
                Ok(Value::list(items[istart as usize..iend as usize].to_vec()))
            }
            other => Err(InterpError::runtime(format!(
                "cannot slice a {}",
                other.type_name()
            ))
            .into()),
        }
    }

    /// Pushes `name` onto the call stack before evaluating arguments (so a
    /// `stacktrace()` call nested inside an argument expression sees its
    /// caller), looks up the callee, evaluates the arguments, and dispatches.
    fn eval_call(&self, name: &str, args: &[Expr]) -> EvalResult {
        self.call_stack.borrow_mut().push(name.to_string());
        let callee = self.root.look_up(name).map_err(Flow::from);
        let callee = match callee {
            Ok(v) => v,
            Err(e) => {
                self.call_stack.borrow_mut().pop();
                return Err(e);
            }
        };

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match self.eval(arg) {
                Ok(v) => values.push(v),
                Err(e) => {
                    self.call_stack.borrow_mut().pop();
                    return Err(e);
                }
            }
        }

        match callee {
            Value::HostFn(f) => {
                let result = f(&values).map_err(Flow::from);
                self.call_stack.borrow_mut().pop();
                result
            }
            Value::UserFn(f) => {
                let result = self.call_user_function(&f, values);
                self.call_stack.borrow_mut().pop();
                result
            }
            other => {
                self.call_stack.borrow_mut().pop();
                Err(InterpError::runtime(format!("{name} is not a function ({})", other.type_name())).into())
            }
        }
    }

    /// Binds each argument into a fresh scope chained under the closure -
    /// but see the scope module docs: because that scope starts empty, the
    /// binding rule sends every one of these writes straight to the shared
    /// root, same as any other assignment.
    fn call_user_function(&self, f: &Rc<RefCell<UserFnData>>, args: Vec<Value>) -> EvalResult {
        let (params, body, closure) = {
            let data = f.borrow();
            (data.params.clone(), data.body.clone(), data.closure.clone())
        };
        if args.len() != params.len() {
            return Err(InterpError::runtime(format!(
                "expected {} argument(s), got {}",
                params.len(),
                args.len()
            ))
            .into());
        }

        let local = Scope::child_of(&closure);
        for (param, arg) in params.iter().zip(args) {
            local.assign(param, arg);
        }

        // A fresh `Evaluator` borrowing the same call stack, rooted at the
        // call's local scope for the body's duration - there is nothing to
        // restore afterwards since `self` is untouched.
        let evaluator = Evaluator {
            root: local,
            call_stack: self.call_stack.clone(),
        };
        match evaluator.eval_block(&body) {
            Ok(v) => Ok(v),
            Err(Flow::Return(v)) => Ok(v),
            Err(other) => Err(other),
        }
    }

    /// Parameters were parsed as full expressions; only bare identifiers are
    /// legal here, and that is validated now rather than in the parser.
    fn eval_function_literal(&self, params: &[Expr], body: &Block) -> EvalResult {
        let mut names = Vec::with_capacity(params.len());
        for p in params {
            match p {
                Expr::Variable(name) => names.push(name.clone()),
                other => {
                    return Err(InterpError::runtime(format!(
                        "function parameters must be plain identifiers, got {other:?}"
                    ))
                    .into())
                }
            }
        }
        Ok(Value::UserFn(Rc::new(RefCell::new(UserFnData {
            name: String::new(),
            params: names,
            body: body.clone(),
            closure: self.root.clone(),
        }))))
    }

    fn eval_binary(&self, op: TokenKind, left: &Expr, right: &Expr) -> EvalResult {
        let l = self.eval(left)?;
        let r = self.eval(right)?;
        binary_op(op, l, r).map_err(Flow::from)
    }
}

fn require_whole_number(v: &Value, what: &str) -> std::result::Result<i64, Flow> {
    match v {
        Value::Number(n) if n.fract() == 0.0 => Ok(*n as i64),
        Value::Number(_) => Err(InterpError::runtime(format!("{what} must be a whole number")).into()),
        other => Err(InterpError::runtime(format!("{what} must be a number, got {}", other.type_name())).into()),
    }
}

fn in_bounds(i: i64, len: usize) -> std::result::Result<usize, Flow> {
    if i < 0 || i as usize >= len {
        Err(InterpError::runtime("index is out of range").into())
    } else {
        Ok(i as usize)
    }
}

/// The full left/right-type dispatch table for binary operators: number x
/// number (all arithmetic and comparisons), string x string (`+` concat,
/// `-` strips a matching suffix), string x number/bool (`*` repeats with a
/// fractional tail), list x list (`+` concat only), list x number (`*`
/// repeats with a fractional tail). Anything else is "Unknown operation" -
/// deliberately, not a gap to fill in.
fn binary_op(op: TokenKind, left: Value, right: Value) -> Result<Value> {
    use TokenKind::*;
    match (&left, &right) {
        (Value::Number(l), Value::Number(r)) => number_op(op, *l, *r),
        (Value::Str(l), Value::Str(r)) => string_op(op, l, r),
        (Value::Str(l), Value::Number(r)) => repeat_string(op, l, *r),
        (Value::Str(l), Value::Bool(r)) => repeat_string(op, l, if *r { 1.0 } else { 0.0 }),
        (Value::List(l), Value::List(r)) => list_list_op(op, l, r),
        (Value::List(l), Value::Number(r)) => repeat_list(op, l, *r),
        _ => {
            let _ = op;
            Err(InterpError::runtime(format!(
                "unknown operation between {} and {}",
                left.type_name(),
                right.type_name()
            )))
        }
    }
}

fn number_op(op: TokenKind, l: f64, r: f64) -> Result<Value> {
    use TokenKind::*;
    Ok(match op {
        Plus => Value::Number(l + r),
        Minus => Value::Number(l - r),
        Multiply => Value::Number(l * r),
        Pow => Value::Number(l.powf(r)),
        Mod => Value::Number(l % r),
        Divide => {
            if r == 0.0 {
                return Err(InterpError::runtime("division by 0"));
            }
            Value::Number(l / r)
        }
        Eq => Value::Bool(l == r),
        NotEq => Value::Bool(l != r),
        Greater => Value::Bool(l > r),
        Less => Value::Bool(l < r),
        GreaterEq => Value::Bool(l >= r),
        LessEq => Value::Bool(l <= r),
        _ => return Err(InterpError::runtime("unknown operator for numbers")),
    })
}

fn string_op(op: TokenKind, l: &str, r: &str) -> Result<Value> {
    use TokenKind::*;
    Ok(match op {
        Plus => Value::Str(format!("{l}{r}")),
        Minus => {
            if l.len() >= r.len() && &l[l.len() - r.len()..] == r {
                Value::Str(l[..l.len() - r.len()].to_string())
            } else {
                return Err(InterpError::runtime("left string is not a substring of the right"));
            }
        }
        Eq => Value::Bool(l == r),
        Greater => Value::Bool(l > r),
        Less => Value::Bool(l < r),
        GreaterEq => Value::Bool(l >= r),
        LessEq => Value::Bool(l <= r),
        _ => return Err(InterpError::runtime("unknown operator for strings")),
    })
}

/// `string * number` (and `string * bool`, treating the bool as 0/1): repeat
/// the string `floor(r)` whole times, then append a prefix of length
/// `floor(fract(r) * len)` - the same "fractional repeat" rule used for
/// lists in [`repeat_list`].
fn repeat_string(op: TokenKind, l: &str, r: f64) -> Result<Value> {
    if op != TokenKind::Multiply {
        return Err(InterpError::runtime("unknown operation between string and number"));
    }
    if r < 0.0 {
        return Err(InterpError::runtime("string cannot be multiplied by a negative number"));
    }
    let bytes = l.as_bytes();
    let whole = r.trunc() as usize;
    let frac = r - r.trunc();
    let mut result = Vec::with_capacity(bytes.len() * (whole + 1));
    for _ in 0..whole {
        result.extend_from_slice(bytes);
    }
    let tail_len = ((frac * bytes.len() as f64) as usize).min(bytes.len());
    result.extend_from_slice(&bytes[..tail_len]);
    Ok(Value::Str(String::from_utf8_lossy(&result).into_owned()))
}

fn list_list_op(op: TokenKind, l: &[Value], r: &[Value]) -> Result<Value> {
    if op != TokenKind::Plus {
        return Err(InterpError::runtime("unknown operation between lists"));
    }
    let mut result = Vec::with_capacity(l.len() + r.len());
    result.extend_from_slice(l);
    result.extend_from_slice(r);
    Ok(Value::list(result))
}

fn repeat_list(op: TokenKind, l: &[Value], r: f64) -> Result<Value> {
    if op != TokenKind::Multiply {
        return Err(InterpError::runtime("unknown operation between list and number"));
    }
    let whole = r.trunc() as usize;
    let frac = r - r.trunc();
    let mut result = Vec::new();
    for _ in 0..whole {
        result.extend_from_slice(l);
    }
    let tail_len = (frac * l.len() as f64) as usize;
    result.extend_from_slice(&l[..tail_len.min(l.len())]);
    Ok(Value::list(result))
}

/// Used by the `println`/`print` builtins and by list-element rendering.
pub fn render(value: &Value) -> String {
    format_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(src: &str) -> Value {
        let tokens = Lexer::new(src).tokenize().unwrap();
        let ast = Parser::new(tokens).parse().unwrap();
        let evaluator = Evaluator::new(Scope::root());
        evaluator.run(&ast).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        let v = run("x = 1 + 2 * 3\nx");
        assert!(matches!(v, Value::Number(n) if n == 7.0));
    }

    #[test]
    fn string_minus_strips_matching_suffix() {
        let v = run("\"hello world\" - \" world\"");
        assert!(matches!(v, Value::Str(s) if s == "hello"));
    }

    #[test]
    fn list_slice_is_half_open() {
        let v = run("a = [1, 2, 3, 4, 5]\na[1:3]");
        match v {
            Value::List(items) => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn string_slice_is_inclusive_on_the_right() {
        let v = run("\"hello\"[0:2]");
        assert!(matches!(v, Value::Str(s) if s == "hel"));
    }

    #[test]
    fn function_closures_see_their_defining_scope() {
        let v = run(
            "make_adder = function(n) \
                return function(x) return x + n end function \
             end function\n\
             add5 = make_adder(5)\n\
             add5(10)",
        );
        assert!(matches!(v, Value::Number(n) if n == 15.0));
    }

    #[test]
    fn for_does_not_catch_break() {
        let tokens = Lexer::new(
            "for i in [1, 2, 3] then\n\
               if i == 2 then break end if\n\
             end for",
        )
        .tokenize()
        .unwrap();
        let ast = Parser::new(tokens).parse().unwrap();
        let evaluator = Evaluator::new(Scope::root());
        // The break escapes the for loop entirely and reaches the top with
        // nothing left to catch it.
        assert!(evaluator.run(&ast).is_err());
    }

    #[test]
    fn while_catches_break() {
        let v = run(
            "result = 0\n\
             i = 0\n\
             while i < 5 then\n\
               i = i + 1\n\
               if i == 3 then break end if\n\
               result = result + i\n\
             end while\n\
             result",
        );
        assert!(matches!(v, Value::Number(n) if n == 3.0));
    }

    #[test]
    fn root_catch_all_scope_rule_applies_to_parameters() {
        // A parameter named the same as an existing variable does not
        // shadow it - because the call scope is empty, the parameter bind
        // ascends to the same root slot the outer variable lives in.
        let v = run(
            "value = 1\n\
             f = function(value) return value end function\n\
             f(99)\n\
             value",
        );
        assert!(matches!(v, Value::Number(n) if n == 99.0));
    }
}
