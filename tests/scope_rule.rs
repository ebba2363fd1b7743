//! The deliberately surprising assignment rule: a fresh call scope is empty,
//! so the very first write to any name from inside a function body - params
//! included - never lands locally. It ascends to the shared root instead.
//! See `src/scope.rs` for the long version.

use itmoscript::run_to_string;

#[test]
fn writing_an_unbound_name_inside_a_function_lands_in_the_root() {
    let output = run_to_string(
        "
        set_it = function()
            n = 42
        end function
        set_it()
        print(n)
    ",
    );
    assert_eq!(output, "42");
}

#[test]
fn two_unrelated_functions_observe_each_other_through_the_shared_root() {
    let output = run_to_string(
        "
        writer = function()
            shared = 1
        end function
        reader = function()
            return shared
        end function
        writer()
        print(reader())
    ",
    );
    assert_eq!(output, "1");
}

#[test]
fn an_outer_binding_is_reachable_and_mutable_from_inside_a_function() {
    let output = run_to_string(
        "
        total = 0
        add = function(n)
            total = total + n
        end function
        add(5)
        add(10)
        print(total)
    ",
    );
    assert_eq!(output, "15");
}
