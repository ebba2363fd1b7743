//! The dynamically-typed runtime value and its formatting rules.
//!
//! Scalars ([`Value::Number`], [`Value::Str`], [`Value::Bool`], [`Value::Nil`])
//! are plain owned data and are copied by value on every clone, matching the
//! value semantics the language gives them. [`Value::List`] and
//! [`Value::UserFn`] wrap a [`Rc`] and are therefore shared references -
//! cloning the `Value` clones the handle, not the underlying data.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Block;
use crate::error::Result;
use crate::scope::Scope;

/// A native function registered into the root scope by [`crate::stdlib`].
/// Total over its argument slice: it must fail (not panic) on arity or type
/// mismatch.
pub type HostFn = dyn Fn(&[Value]) -> Result<Value>;

/// A user-defined function together with the scope it closed over.
///
/// `name` starts empty for an unbound function literal and is filled in the
/// moment the value is bound to an identifier by `=` (see
/// `Evaluator::eval_assign`), which is also what makes direct recursion by
/// name work without a separate letrec construct.
pub struct UserFnData {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub closure: Scope,
}

#[derive(Clone)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    Nil,
    List(Rc<Vec<Value>>),
    HostFn(Rc<HostFn>),
    UserFn(Rc<RefCell<UserFnData>>),
}

impl Value {
    pub fn list(elements: Vec<Value>) -> Self {
        Value::List(Rc::new(elements))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Nil => "nil",
            Value::List(_) => "list",
            Value::HostFn(_) | Value::UserFn(_) => "function",
        }
    }

    pub fn truthy(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Nil => write!(f, "Nil"),
            Value::List(l) => write!(f, "List(len={})", l.len()),
            Value::HostFn(_) => write!(f, "HostFn"),
            Value::UserFn(u) => write!(f, "UserFn({:?})", u.borrow().name),
        }
    }
}

/// Renders a value the way `print`/`println`/list-element-printing do.
///
/// Function values have unspecified rendering; we print a short tag rather
/// than panicking, since nothing in the language exercises it deliberately.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Number(n) => format_number(*n),
        Value::Str(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Nil => "nil".to_string(),
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::HostFn(_) => "<host fn>".to_string(),
        Value::UserFn(u) => format!("<fn {}>", u.borrow().name),
    }
}

/// Formats a number the way a C-style default stream would: up to six
/// significant digits, general (not fixed) notation, trailing zeros and a
/// dangling decimal point stripped. Not a literal port of any particular
/// runtime's formatter - the language leaves the exact policy unspecified -
/// just a stable, readable default that round-trips through `parse_num`.
pub fn format_number(n: f64) -> String {
    const SIG_DIGITS: i32 = 6;

    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let exponent = n.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= SIG_DIGITS {
        let mantissa_digits = (SIG_DIGITS - 1).max(0) as usize;
        let scientific = format!("{n:.mantissa_digits$e}");
        clean_scientific(&scientific)
    } else {
        let decimals = (SIG_DIGITS - 1 - exponent).max(0) as usize;
        let fixed = format!("{n:.decimals$}");
        clean_fixed(&fixed).to_string()
    }
}

fn clean_fixed(s: &str) -> &str {
    if !s.contains('.') {
        return s;
    }
    let trimmed = s.trim_end_matches('0');
    let trimmed = trimmed.trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0"
    } else {
        trimmed
    }
}

fn clean_scientific(s: &str) -> String {
    match s.split_once('e') {
        Some((mantissa, exp)) => format!("{}e{exp}", clean_fixed(mantissa)),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_values_print_without_a_decimal_point() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn fractional_values_trim_trailing_zeros() {
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1), "0.1");
    }

    #[test]
    fn list_formatting_uses_comma_space_separator() {
        let list = Value::list(vec![Value::Number(1.0), Value::Str("a".into()), Value::Bool(true)]);
        assert_eq!(format_value(&list), "[1, a, true]");
    }
}
