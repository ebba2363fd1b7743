use itmoscript::run_to_string;

#[test]
fn integer_arithmetic_and_precedence() {
    let output = run_to_string(
        "
        x = 1
        y = 2
        z = 3 * x + y
        print(z)
    ",
    );
    assert_eq!(output, "5");
}

#[test]
fn string_repeat_and_concat() {
    let output = run_to_string(
        "
        x = \"2\"*2
        y = x + \"3\"*2 + \"9\"*2
        print(y)
    ",
    );
    assert_eq!(output, "223399");
}

#[test]
fn additive_before_multiplicative_is_respected_by_parens() {
    assert_eq!(run_to_string("x = 1 + 2 * 3 \n print(x)"), "7");
    assert_eq!(run_to_string("x = (1 + 2) * 3 \n print(x)"), "9");
}

#[test]
fn pow_is_effectively_non_associative() {
    // a^b^c parses as (a^b)^c under the +1 precedence-climbing rule.
    assert_eq!(run_to_string("print(2^3^2)"), "64");
}

#[test]
fn string_minus_requires_a_matching_suffix() {
    assert_eq!(run_to_string("print(\"hello world\" - \" world\")"), "hello");
    assert!(run_to_string("print(\"hello\" - \"xyz\")").contains("not a substring"));
}

#[test]
fn comparisons_do_not_cross_types() {
    // number == string is not in the dispatch table: an "Unknown operation" error.
    let output = run_to_string("print(1 == \"1\")");
    assert!(output.contains("unknown operation"));
}

#[test]
fn unary_plus_and_not_have_no_evaluation_rule() {
    // `print(+1)` never reaches eval_unary: call arguments are parsed via
    // parse_primary, which has no arm for a leading unary operator, so that
    // shape is a parse-time "unexpected token" instead. The eval-time failure
    // is only reachable where parse_unary is, i.e. at statement level.
    assert!(run_to_string("x = +1").contains("no evaluation rule"));
    assert!(run_to_string("not true").contains("no evaluation rule"));
}

#[test]
fn division_by_zero_is_an_error() {
    assert!(run_to_string("print(1 / 0)").contains("division by 0"));
}
