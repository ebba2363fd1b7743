//! Builtin functions installed into the root scope before a program runs.
//!
//! Every entry here is grounded one-to-one on a function of the same name in
//! the standard library this interpreter's semantics are pinned to: same
//! arity, same argument types, same error conditions. `print`/`println`
//! write through a caller-supplied sink rather than directly to stdout so
//! that embedding and testing can capture output; `stacktrace` reads the
//! call-name stack an [`Evaluator`](crate::eval::Evaluator) already
//! maintains for this purpose.

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;

use rand::Rng;

use crate::error::{InterpError, Result};
use crate::eval::render;
use crate::scope::Scope;
use crate::value::Value;

fn want_number(v: &Value, who: &str) -> Result<f64> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(InterpError::runtime(format!(
            "{who}: argument must be a number, got {}",
            other.type_name()
        ))),
    }
}

fn want_string<'a>(v: &'a Value, who: &str) -> Result<&'a str> {
    match v {
        Value::Str(s) => Ok(s),
        other => Err(InterpError::runtime(format!(
            "{who}: argument must be a string, got {}",
            other.type_name()
        ))),
    }
}

fn want_list<'a>(v: &'a Value, who: &str) -> Result<&'a [Value]> {
    match v {
        Value::List(items) => Ok(items),
        other => Err(InterpError::runtime(format!(
            "{who}: argument must be a list, got {}",
            other.type_name()
        ))),
    }
}

fn want_arity(args: &[Value], n: usize, who: &str) -> Result<()> {
    if args.len() != n {
        return Err(InterpError::runtime(format!(
            "{who} needs {n} argument{}, got {}",
            if n == 1 { "" } else { "s" },
            args.len()
        )));
    }
    Ok(())
}

/// Parses the longest leading numeric prefix of `s`, the way `std::stod`
/// does ("239abc" -> 239.0), rather than requiring the whole string to be
/// numeric. Leading whitespace is skipped first, matching `std::stod`.
fn parse_leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut saw_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        saw_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            saw_digit = true;
        }
    }
    if !saw_digit {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok()
}

/// Installs every builtin into `scope`. `output` backs `print`/`println`;
/// `stdin` backs `read`; `call_stack` is shared with the evaluator so
/// `stacktrace()` can read it.
pub fn register(
    scope: &Scope,
    output: Rc<RefCell<dyn Write>>,
    stdin: Rc<RefCell<dyn BufRead>>,
    call_stack: Rc<RefCell<Vec<String>>>,
) {
    let out = output.clone();
    scope.assign(
        "print",
        Value::HostFn(Rc::new(move |args: &[Value]| {
            let mut out = out.borrow_mut();
            for v in args {
                write!(out, "{}", render(v)).map_err(io_err)?;
            }
            Ok(Value::Nil)
        })),
    );

    let out = output.clone();
    scope.assign(
        "println",
        Value::HostFn(Rc::new(move |args: &[Value]| {
            let mut out = out.borrow_mut();
            for v in args {
                write!(out, "{}", render(v)).map_err(io_err)?;
            }
            writeln!(out).map_err(io_err)?;
            Ok(Value::Nil)
        })),
    );

    scope.assign(
        "abs",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "abs")?;
            Ok(Value::Number(want_number(&args[0], "abs")?.abs()))
        })),
    );

    scope.assign(
        "ceil",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "ceil")?;
            Ok(Value::Number(want_number(&args[0], "ceil")?.ceil()))
        })),
    );

    scope.assign(
        "floor",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "floor")?;
            Ok(Value::Number(want_number(&args[0], "floor")?.floor()))
        })),
    );

    scope.assign(
        "round",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "round")?;
            Ok(Value::Number(want_number(&args[0], "round")?.round()))
        })),
    );

    scope.assign(
        "sqrt",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "sqrt")?;
            Ok(Value::Number(want_number(&args[0], "sqrt")?.sqrt()))
        })),
    );

    scope.assign(
        "rnd",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "rnd")?;
            let bound = want_number(&args[0], "rnd")?.trunc() as i64;
            if bound < 1 {
                return Err(InterpError::runtime("rnd: argument must be at least 1"));
            }
            let n = rand::thread_rng().gen_range(0..bound);
            Ok(Value::Number(n as f64))
        })),
    );

    scope.assign(
        "parse_num",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "parse_num")?;
            let s = want_string(&args[0], "parse_num")?;
            Ok(parse_leading_number(s).map(Value::Number).unwrap_or(Value::Nil))
        })),
    );

    scope.assign(
        "to_string",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "to_string")?;
            let n = want_number(&args[0], "to_string")?;
            Ok(Value::Str(crate::value::format_number(n)))
        })),
    );

    scope.assign(
        "len",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "len")?;
            match &args[0] {
                Value::Str(s) => Ok(Value::Number(s.len() as f64)),
                Value::List(items) => Ok(Value::Number(items.len() as f64)),
                other => Err(InterpError::runtime(format!(
                    "len: argument must be a string or a list, got {}",
                    other.type_name()
                ))),
            }
        })),
    );

    scope.assign(
        "lower",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "lower")?;
            Ok(Value::Str(want_string(&args[0], "lower")?.to_lowercase()))
        })),
    );

    scope.assign(
        "upper",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "upper")?;
            Ok(Value::Str(want_string(&args[0], "upper")?.to_uppercase()))
        })),
    );

    scope.assign(
        "split",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 2, "split")?;
            let s = want_string(&args[0], "split")?;
            let delim = want_string(&args[1], "split")?;
            let parts: Vec<Value> = if delim.is_empty() {
                vec![Value::Str(s.to_string())]
            } else {
                s.split(delim).map(|p| Value::Str(p.to_string())).collect()
            };
            Ok(Value::list(parts))
        })),
    );

    scope.assign(
        "join",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 2, "join")?;
            let items = want_list(&args[0], "join")?;
            let delim = want_string(&args[1], "join")?;
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(want_string(item, "join")?.to_string());
            }
            Ok(Value::Str(parts.join(delim)))
        })),
    );

    scope.assign(
        "replace",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 3, "replace")?;
            let s = want_string(&args[0], "replace")?;
            let old = want_string(&args[1], "replace")?;
            let new = want_string(&args[2], "replace")?;
            if old.is_empty() {
                return Err(InterpError::runtime("replace: pattern must not be empty"));
            }
            Ok(Value::Str(s.replace(old, new)))
        })),
    );

    scope.assign(
        "range",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 3, "range")?;
            let first = want_number(&args[0], "range")?;
            let last = want_number(&args[1], "range")?;
            let step = want_number(&args[2], "range")?;
            if step == 0.0 {
                return Err(InterpError::runtime("range: step must not be 0"));
            }
            let mut out = Vec::new();
            let mut i = first;
            if step > 0.0 {
                while i < last {
                    out.push(Value::Number(i));
                    i += step;
                }
            } else {
                while i > last {
                    out.push(Value::Number(i));
                    i += step;
                }
            }
            Ok(Value::list(out))
        })),
    );

    scope.assign(
        "push",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 2, "push")?;
            let items = want_list(&args[0], "push")?;
            let mut out = items.to_vec();
            out.push(args[1].clone());
            Ok(Value::list(out))
        })),
    );

    scope.assign(
        "pop",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "pop")?;
            let items = want_list(&args[0], "pop")?;
            items
                .last()
                .cloned()
                .ok_or_else(|| InterpError::runtime("pop: list is empty"))
        })),
    );

    scope.assign(
        "insert",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 3, "insert")?;
            let items = want_list(&args[0], "insert")?;
            let index = want_number(&args[1], "insert")?.trunc() as i64;
            if index < 0 || index as usize > items.len() {
                return Err(InterpError::runtime("insert: index out of range"));
            }
            let mut out = items.to_vec();
            out.insert(index as usize, args[2].clone());
            Ok(Value::list(out))
        })),
    );

    scope.assign(
        "remove",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 2, "remove")?;
            let items = want_list(&args[0], "remove")?;
            let index = want_number(&args[1], "remove")?.trunc() as i64;
            if index < 0 || index as usize >= items.len() {
                return Err(InterpError::runtime("remove: index out of range"));
            }
            let mut out = items.to_vec();
            out.remove(index as usize);
            Ok(Value::list(out))
        })),
    );

    scope.assign(
        "sort",
        Value::HostFn(Rc::new(|args: &[Value]| {
            want_arity(args, 1, "sort")?;
            let items = want_list(&args[0], "sort")?;
            let mut out = items.to_vec();
            sort_in_place(&mut out)?;
            Ok(Value::list(out))
        })),
    );

    let input = stdin;
    scope.assign(
        "read",
        Value::HostFn(Rc::new(move |_args: &[Value]| {
            let mut line = String::new();
            let n = input.borrow_mut().read_line(&mut line).map_err(io_err)?;
            if n == 0 {
                return Ok(Value::Nil);
            }
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Value::Str(line))
        })),
    );

    let stack = call_stack;
    scope.assign(
        "stacktrace",
        Value::HostFn(Rc::new(move |_args: &[Value]| {
            let frames = stack.borrow();
            Ok(Value::list(
                frames.iter().map(|f| Value::Str(f.clone())).collect(),
            ))
        })),
    );
}

fn io_err(e: std::io::Error) -> InterpError {
    InterpError::runtime(format!("output error: {e}"))
}

/// All elements must share one scalar variant (number, string, or bool) -
/// mixed-type lists are a hard error, not a partial sort.
fn sort_in_place(v: &mut [Value]) -> Result<()> {
    let Some(first) = v.first() else {
        return Ok(());
    };
    let tag = first.type_name();
    if tag != "number" && tag != "string" && tag != "bool" {
        return Err(InterpError::runtime("sort: elements must be numbers, strings, or bools"));
    }
    for el in v.iter() {
        if el.type_name() != tag {
            return Err(InterpError::runtime("sort: all elements must be of one type"));
        }
    }
    v.sort_by(|a, b| match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => unreachable!("type uniformity was checked above"),
    });
    Ok(())
}
