#![allow(dead_code)]

use wyg::{run, Error, Value};

/// Evaluates a program against a fresh bootstrapped runtime.
pub fn eval(source: &str) -> Value {
    run(source).expect("program should evaluate")
}

pub fn eval_err(source: &str) -> Error {
    run(source).expect_err("program should fail")
}

pub fn num(n: f64) -> Value {
    Value::Number(n)
}

pub fn str_value(s: &str) -> Value {
    Value::Str(s.into())
}

pub fn vec_of(items: Vec<Value>) -> Value {
    Value::vector(items)
}
