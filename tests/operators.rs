//! Binary operator behavior: arithmetic guards, comparisons, deep
//! equality, logical short-circuiting, and polymorphic concatenation.

mod common;

use common::{eval, eval_err, num, str_value, vec_of};
use wyg::{RuntimeError, Error, Value};

#[test]
fn arithmetic_over_numbers() {
    assert_eq!(eval("10 - 3;"), num(7.0));
    assert_eq!(eval("10 / 4;"), num(2.5));
    assert_eq!(eval("10 % 4;"), num(2.0));
    assert_eq!(eval("1.5 * 4;"), num(6.0));
}

#[test]
fn comparisons_yield_booleans() {
    assert_eq!(eval("3 < 4;"), Value::Bool(true));
    assert_eq!(eval("3 > 4;"), Value::Bool(false));
    assert_eq!(eval("4 <= 4;"), Value::Bool(true));
    assert_eq!(eval("4 >= 5;"), Value::Bool(false));
}

#[test]
fn equality_is_deep() {
    assert_eq!(eval("[1, [2, \"x\"]] == [1, [2, \"x\"]];"), Value::Bool(true));
    assert_eq!(eval("[1, 2] == [1, 2, 3];"), Value::Bool(false));
    assert_eq!(eval("[1, 2] != [1, 3];"), Value::Bool(true));
    assert_eq!(eval("\"a\" == \"a\";"), Value::Bool(true));
}

#[test]
fn mismatched_types_are_never_equal() {
    assert_eq!(eval("1 == \"1\";"), Value::Bool(false));
    assert_eq!(eval("false == 0;"), Value::Bool(false));
}

#[test]
fn logical_operators_yield_operands() {
    assert_eq!(eval("2 && 3;"), num(3.0));
    assert_eq!(eval("false && 3;"), Value::FALSE);
    assert_eq!(eval("2 || 3;"), num(2.0));
    assert_eq!(eval("false || 3;"), num(3.0));
    // zero and the empty string are truthy; only false is falsy
    assert_eq!(eval("0 && 1;"), num(1.0));
    assert_eq!(eval("\"\" || 1;"), str_value(""));
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(eval("false && no'such'name;"), Value::FALSE);
    assert_eq!(eval("1 || no'such'name;"), num(1.0));
}

#[test]
fn concatenation_of_strings() {
    assert_eq!(eval("\"a\" <> \"b\";"), str_value("ab"));
}

#[test]
fn concatenation_normalizes_scalars_into_vectors() {
    assert_eq!(eval("1 <> 2;"), vec_of(vec![num(1.0), num(2.0)]));
    assert_eq!(
        eval("1 <> 2 <> [[\"x\"]];"),
        vec_of(vec![
            num(1.0),
            num(2.0),
            vec_of(vec![str_value("x")]),
        ])
    );
    assert_eq!(
        eval("[1, 2] <> 3;"),
        vec_of(vec![num(1.0), num(2.0), num(3.0)])
    );
    assert_eq!(
        eval("[1] <> [2, 3];"),
        vec_of(vec![num(1.0), num(2.0), num(3.0)])
    );
    // a string beside a non-string is a scalar operand
    assert_eq!(
        eval("\"a\" <> 1;"),
        vec_of(vec![str_value("a"), num(1.0)])
    );
}

#[test]
fn concatenation_deep_equality_round_trip() {
    assert_eq!(
        eval("1 <> 2 <> 3 <> [[\"hello\"]] == [1, 2, 3, [\"hello\"]];"),
        Value::Bool(true)
    );
}

#[test]
fn unary_not_compares_against_false() {
    assert_eq!(eval("!false;"), Value::Bool(true));
    assert_eq!(eval("!true;"), Value::Bool(false));
    // !3 is `false == 3`, which is simply not equal
    assert_eq!(eval("!3;"), Value::Bool(false));
}

#[test]
fn unary_minus_subtracts_from_zero() {
    assert_eq!(eval("let (n = 5) in -n;"), num(-5.0));
    assert_eq!(eval("2 * -3;"), num(-6.0));
}

#[test]
fn arithmetic_requires_numbers() {
    assert!(matches!(
        eval_err("\"a\" + 1;"),
        Error::Runtime(RuntimeError::Type { .. })
    ));
    assert!(matches!(
        eval_err("true * 2;"),
        Error::Runtime(RuntimeError::Type { .. })
    ));
    assert!(matches!(
        eval_err("[1] - 1;"),
        Error::Runtime(RuntimeError::Type { .. })
    ));
}

#[test]
fn comparisons_require_numbers() {
    assert!(matches!(
        eval_err("\"a\" < \"b\";"),
        Error::Runtime(RuntimeError::Type { .. })
    ));
}

#[test]
fn division_and_modulo_guard_zero() {
    assert!(matches!(
        eval_err("1 / 0;"),
        Error::Runtime(RuntimeError::Arithmetic { .. })
    ));
    assert!(matches!(
        eval_err("1 % 0;"),
        Error::Runtime(RuntimeError::Arithmetic { .. })
    ));
}

#[test]
fn caret_has_no_binary_rule() {
    // the tokenizer admits `^` as an operator character, but no
    // precedence level consumes it
    assert!(wyg::run("2 ^ 3;").is_err());
}
