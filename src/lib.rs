//! A tree-walking interpreter for itmoscript, a small dynamically-typed
//! imperative scripting language with first-class functions, lists, and
//! strings.
//!
//! The pipeline is the usual three stages: [`lexer`] turns source text into
//! a token vector, [`parser`] turns that into an [`ast::Block`], and
//! [`eval::Evaluator`] walks the tree, mutating a [`scope::Scope`] chain and
//! writing to a caller-supplied output sink. [`stdlib`] installs the
//! built-in functions the evaluator calls out to.
//!
//! ```
//! let output = itmoscript::run_to_string("print(1 + 2 * 3)");
//! assert_eq!(output, "7");
//! ```

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod stdlib;
pub mod token;
pub mod value;

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;

pub use error::{InterpError, Result};
use eval::Evaluator;
use lexer::Lexer;
use parser::Parser as ItmoParser;
use scope::Scope;

/// Lexes, parses, and evaluates `source` against `output`/`stdin`. Returns
/// the program's final value on success; lex/parse/runtime failures are all
/// reported through the same [`InterpError`], since none of them are
/// recoverable mid-program.
pub fn run(source: &str, output: Rc<RefCell<dyn Write>>, stdin: Rc<RefCell<dyn BufRead>>) -> Result<value::Value> {
    let tokens = Lexer::new(source).tokenize()?;
    let ast = ItmoParser::new(tokens).parse()?;

    let root = Scope::root();
    let call_stack = Rc::new(RefCell::new(Vec::new()));
    stdlib::register(&root, output, stdin, call_stack.clone());

    let evaluator = Evaluator {
        root,
        call_stack,
    };
    evaluator.run(&ast)
}

/// Runs `source` with an in-memory output sink and an empty stdin, returning
/// everything written to the sink as a `String`. On failure, the error's
/// message plus a trailing newline is returned instead - mirroring the CLI's
/// "errors are just more output" behavior (see [`crate`] docs and the `main`
/// binary).
pub fn run_to_string(source: &str) -> String {
    let output = Rc::new(RefCell::new(Vec::new()));
    let stdin = Rc::new(RefCell::new(std::io::Cursor::new(Vec::new())));

    let result = run(source, output.clone(), stdin);

    let mut text = String::from_utf8_lossy(&output.borrow()).into_owned();
    if let Err(e) = result {
        text.push_str(&e.to_string());
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_precedence_example() {
        assert_eq!(run_to_string("x = 1 + 2 * 3\nprint(x)"), "7");
    }

    #[test]
    fn end_to_end_string_repeat_example() {
        assert_eq!(
            run_to_string("x = \"2\"*2\ny = x + \"3\"*2 + \"9\"*2\nprint(y)"),
            "223399"
        );
    }

    #[test]
    fn end_to_end_for_range_example() {
        assert_eq!(run_to_string("for i in range(0,5,1) then print(i) end for"), "01234");
    }

    #[test]
    fn end_to_end_while_string_repeat_example() {
        assert_eq!(
            run_to_string("s = \"ITMO\"\nwhile len(s) < 12 then s = s * 2 end while\nprint(s)"),
            "ITMOITMOITMOITMO"
        );
    }

    #[test]
    fn runtime_errors_are_printed_not_propagated_to_the_caller() {
        let output = run_to_string("1 / 0");
        assert!(output.contains("division by 0"));
    }
}
