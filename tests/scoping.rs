//! Scope-chain semantics: shadowing, mutation through the chain, the
//! root-definition convention, and sibling-binding visibility.

mod common;

use common::{eval, eval_err, num, vec_of};
use wyg::{Error, RuntimeError, Value};

#[test]
fn let_bindings_shadow_outer_names() {
    let source = "let (x = 1) in
      let (x = 2) in
        x;";
    assert_eq!(eval(source), num(2.0));
}

#[test]
fn inner_shadow_leaves_outer_untouched() {
    let source = "let (x = 1) {
      let (x = 2) in x;
      x
    };";
    assert_eq!(eval(source), num(1.0));
}

#[test]
fn assignment_mutates_the_nearest_owner() {
    let source = "let (x = 1) {
      let (y = 0) in x = x + 10;
      x
    };";
    assert_eq!(eval(source), num(11.0));
}

#[test]
fn assignment_yields_the_assigned_value() {
    assert_eq!(eval("let (x = 1) in x = 5;"), num(5.0));
}

#[test]
fn both_assign_operators_mutate() {
    assert_eq!(eval("let (x = 1) { x = 2; x <- x + 1; x };"), num(3.0));
}

#[test]
fn root_set_defines_fresh_names() {
    // the bootstrap convention: an unowned name set at the top level
    // lands in the root frame
    assert_eq!(eval("fresh <- 7; fresh;"), num(7.0));
}

#[test]
fn set_in_a_child_scope_requires_an_owner() {
    let err = eval_err("let (x = 1) in y <- 2;");
    match err {
        Error::Runtime(RuntimeError::Scope { action, name, bound }) => {
            assert_eq!(action, "set");
            assert_eq!(name, "y");
            assert!(bound.iter().any(|n| n == "x"));
        }
        other => panic!("expected scope error, got {other:?}"),
    }
}

#[test]
fn siblings_do_not_see_each_other() {
    // initializers evaluate in the enclosing scope, before any of the
    // group's bindings exist
    let err = eval_err("let (a = 1, b = a + 1) in b;");
    match err {
        Error::Runtime(RuntimeError::Scope { name, .. }) => assert_eq!(name, "a"),
        other => panic!("expected scope error, got {other:?}"),
    }
}

#[test]
fn shadowing_initializer_reads_the_outer_binding() {
    let source = "let (n = 1) in
      let (n = n + 10) in
        n;";
    assert_eq!(eval(source), num(11.0));
}

#[test]
fn bindings_without_initializers_are_false() {
    assert_eq!(eval("let (a) in a;"), Value::FALSE);
}

#[test]
fn block_bodies_share_the_let_scope() {
    let source = "let (a = 1, b = 2) {
      a = a + b;
      a
    };";
    assert_eq!(eval(source), num(3.0));
}

#[test]
fn lambda_frames_are_fresh_per_call() {
    let source = "
      make <- |start| |n| start <- start + n;
      bump <- make(100);
      bump(1);
      bump(2);
      bump(0);";
    // the closure keeps mutating its own captured frame
    assert_eq!(eval(source), num(103.0));
}

#[test]
fn closures_do_not_leak_call_frames() {
    let source = "
      id <- |n| n;
      id(5);
      n;";
    let err = eval_err(source);
    match err {
        Error::Runtime(RuntimeError::Scope { name, .. }) => assert_eq!(name, "n"),
        other => panic!("expected scope error, got {other:?}"),
    }
}

#[test]
fn named_lambda_sees_itself_only() {
    // the self-binding frame belongs to the closure, not the caller
    let source = "
      f <- fn helper |n| if n == 0 then 0 else helper(n - 1);
      f(3);
      helper(1);";
    let err = eval_err(source);
    match err {
        Error::Runtime(RuntimeError::Scope { name, .. }) => assert_eq!(name, "helper"),
        other => panic!("expected scope error, got {other:?}"),
    }
}

#[test]
fn nested_let_scopes_spec_example() {
    let source = "let (a = 1, b = 2) {
      let (c = a + b, d = |n| n / 4) in
        if d(c) < d(2 * b)
        then b = 4 else b = 3;
      b = b * 2 + 1;
      [a, b]
    };";
    assert_eq!(eval(source), vec_of(vec![num(1.0), num(9.0)]));
}

#[test]
fn conditional_branches_assign_into_the_let_frame() {
    let source = "let (b = 2) {
      if b > 1 then b = 4 else b = 3;
      b
    };";
    assert_eq!(eval(source), num(4.0));
}
