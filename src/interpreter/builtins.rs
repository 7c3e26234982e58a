use std::rc::Rc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use super::environment::Scope;
use super::error::{Error, RuntimeError};
use super::evaluator::Evaluator;
use super::parser;
use crate::format::format_value;
use crate::value::{BuiltinFn, NativeFn, Value};

/// The in-language part of the standard runtime. Evaluated verbatim
/// against the root scope at startup; the root `set`-defines
/// convention is what lets these `<-` bindings land in the root frame.
pub const BOOTSTRAP: &str = "
~~ Basic built-in utilities
cons <- |a, b| |c| c(a, b);
car <- |cell| cell(|a, b| a);
cdr <- |cell| cell(|a, b| b);
nil <- |f| f(nil, nil);

for'each <- |list, f| if list != nil
  then {
    f(car(list));
    for'each(cdr(list), f)
};

range <- |a, b| if
  a <= b then cons(a, range(a + 1, b))
  else nil;

math'abs <- |n| if n >= 0 then n else -n;
";

fn native(scope: &Rc<Scope>, name: &'static str, call: NativeFn) {
    scope.def(name, Value::Builtin(Rc::new(BuiltinFn { name, call })));
}

/// Formats its argument to stdout and passes it through.
fn builtin_print(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, RuntimeError> {
    let value = args.first().cloned().unwrap_or(Value::FALSE);
    println!("{}", format_value(&value));
    Ok(value)
}

/// Wall-clock milliseconds since the epoch.
fn builtin_time(_evaluator: &Evaluator, _args: &[Value]) -> Result<Value, RuntimeError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0);
    Ok(Value::Number(millis))
}

/// Times a zero-argument callable, reporting to stderr and returning
/// the callable's result. A non-callable argument passes through.
fn builtin_delta(evaluator: &Evaluator, args: &[Value]) -> Result<Value, RuntimeError> {
    let target = args.first().cloned().unwrap_or(Value::FALSE);
    if !target.is_callable() {
        eprintln!("Callable expression not provided.");
        return Ok(target);
    }
    let started = Instant::now();
    let result = evaluator.apply(&target, &[]);
    eprintln!("dt = {:?}", started.elapsed());
    result
}

/// Long-form type name of the argument.
fn builtin_type_of(_evaluator: &Evaluator, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(match args.first() {
        Some(value) => Value::Str(value.type_name().into()),
        None => Value::FALSE,
    })
}

/// Builds the root scope: native bindings first, then the bootstrap
/// program evaluated against it.
pub fn runtime() -> Result<Rc<Scope>, Error> {
    let scope = Scope::root();
    native(&scope, "print", builtin_print);
    native(&scope, "t'sec", builtin_time);
    native(&scope, "t'delta", builtin_delta);
    native(&scope, "type'of", builtin_type_of);

    let ast = parser::parse(BOOTSTRAP)?;
    Evaluator::new().evaluate(&ast, &scope)?;
    Ok(scope)
}
