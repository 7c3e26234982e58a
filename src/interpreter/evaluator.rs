use std::rc::Rc;

use super::builtins;
use super::environment::Scope;
use super::error::{Error, RuntimeError};
use super::parser;
use crate::ast::{Binding, Expr, LambdaExpr, Param};
use crate::format::format_value;
use crate::token::{op, Token, TokenValue};
use crate::value::{Closure, Value};

/// Direct-style tree walker. Evaluation is a pure recursive descent
/// over the AST with the scope chain threaded alongside; the only
/// state machine is the native call stack.
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, expr: &Expr, env: &Rc<Scope>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(token) => Ok(literal_value(token)),
            Expr::Reference(token) => env.get(token.text()),
            Expr::Assign { left, right, .. } => self.assign(left, right, env),
            Expr::Binary { operator, left, right } => self.branch(operator, left, right, env),
            Expr::Lambda(decl) => Ok(self.lambda(decl, env)),
            Expr::Conditional { cond, then, otherwise } => {
                self.conditional(cond, then, otherwise.as_deref(), env)
            }
            Expr::Block { body } => self.block(body, env),
            Expr::Call { target, args } => self.call(target, args, env),
            Expr::Variable { bindings, body } => self.variable(bindings, body, env),
            Expr::Vector { body } => self.vector(body, env),
            Expr::Index { body, idx } => self.index(body, idx, env),
        }
    }

    /// The left side must be a bare reference; mutation lands in the
    /// nearest owning frame and yields the assigned value.
    fn assign(&self, left: &Expr, right: &Expr, env: &Rc<Scope>) -> Result<Value, RuntimeError> {
        let name = match left.reference_name() {
            Some(name) => name.to_string(),
            None => return Err(RuntimeError::reference(describe_node(left))),
        };
        let value = self.evaluate(right, env)?;
        env.set(&name, value)
    }

    /// `&&`/`||` short-circuit over the only-false-is-falsy rule and
    /// yield an operand; everything else evaluates both sides first.
    fn branch(
        &self,
        operator: &str,
        left: &Expr,
        right: &Expr,
        env: &Rc<Scope>,
    ) -> Result<Value, RuntimeError> {
        match operator {
            op::AND => {
                let a = self.evaluate(left, env)?;
                if a.is_false() {
                    Ok(a)
                } else {
                    self.evaluate(right, env)
                }
            }
            op::OR => {
                let a = self.evaluate(left, env)?;
                if a.is_truthy() {
                    Ok(a)
                } else {
                    self.evaluate(right, env)
                }
            }
            _ => {
                let a = self.evaluate(left, env)?;
                let b = self.evaluate(right, env)?;
                self.binary(operator, a, b)
            }
        }
    }

    fn binary(&self, operator: &str, a: Value, b: Value) -> Result<Value, RuntimeError> {
        match operator {
            op::PLUS => Ok(Value::Number(number(&a)? + number(&b)?)),
            op::MINUS => Ok(Value::Number(number(&a)? - number(&b)?)),
            op::TIMES => Ok(Value::Number(number(&a)? * number(&b)?)),
            op::DIV => Ok(Value::Number(number(&a)? / nonzero(&b, operator)?)),
            op::MOD => Ok(Value::Number(number(&a)? % nonzero(&b, operator)?)),
            op::LT => Ok(Value::Bool(number(&a)? < number(&b)?)),
            op::GT => Ok(Value::Bool(number(&a)? > number(&b)?)),
            op::LEQ => Ok(Value::Bool(number(&a)? <= number(&b)?)),
            op::GEQ => Ok(Value::Bool(number(&a)? >= number(&b)?)),
            op::EQ => Ok(Value::Bool(a == b)),
            op::NEQ => Ok(Value::Bool(a != b)),
            op::CONC => Ok(self.concatenate(a, b)),
            _ => Err(RuntimeError::type_error(format!(
                "Unable to recognize operator {operator}"
            ))),
        }
    }

    /// Total, polymorphic concatenation: string pairs join into a
    /// string, any other combination normalizes into a flat binary
    /// vector join with non-vector operands as single elements.
    fn concatenate(&self, a: Value, b: Value) -> Value {
        match (a, b) {
            (Value::Str(x), Value::Str(y)) => Value::Str(format!("{x}{y}").into()),
            (Value::Vector(x), Value::Vector(y)) => {
                let mut items = x.borrow().clone();
                items.extend(y.borrow().iter().cloned());
                Value::vector(items)
            }
            (Value::Vector(x), scalar) => {
                let mut items = x.borrow().clone();
                items.push(scalar);
                Value::vector(items)
            }
            (scalar, Value::Vector(y)) => {
                let mut items = vec![scalar];
                items.extend(y.borrow().iter().cloned());
                Value::vector(items)
            }
            (a, b) => Value::vector(vec![a, b]),
        }
    }

    fn conditional(
        &self,
        cond: &Expr,
        then: &Expr,
        otherwise: Option<&Expr>,
        env: &Rc<Scope>,
    ) -> Result<Value, RuntimeError> {
        if self.evaluate(cond, env)?.is_truthy() {
            return self.evaluate(then, env);
        }
        match otherwise {
            Some(expr) => self.evaluate(expr, env),
            None => Ok(Value::FALSE),
        }
    }

    /// Sub-expressions run in sequence in the same scope; the block is
    /// worth its last value, false when empty.
    fn block(&self, body: &[Expr], env: &Rc<Scope>) -> Result<Value, RuntimeError> {
        let mut result = Value::FALSE;
        for expr in body {
            result = self.evaluate(expr, env)?;
        }
        Ok(result)
    }

    /// One extended frame per binding. Initializers evaluate in the
    /// enclosing scope, so bindings never see their siblings; only the
    /// body sees the fully-extended chain.
    fn variable(
        &self,
        bindings: &[Binding],
        body: &Expr,
        env: &Rc<Scope>,
    ) -> Result<Value, RuntimeError> {
        let mut scope = Rc::clone(env);
        for binding in bindings {
            let value = match &binding.init {
                Some(init) => self.evaluate(init, env)?,
                None => Value::FALSE,
            };
            scope = scope.extend();
            scope.def(binding.name.clone(), value);
        }
        self.evaluate(body, &scope)
    }

    /// A named lambda gets one extra frame binding the name to the
    /// closure itself, giving it a back-reference for self-recursion
    /// through the scope chain.
    fn lambda(&self, decl: &Rc<LambdaExpr>, env: &Rc<Scope>) -> Value {
        let mut env = Rc::clone(env);
        if decl.name.is_some() {
            env = env.extend();
        }
        let closure = Rc::new(Closure {
            decl: Rc::clone(decl),
            env: Rc::clone(&env),
        });
        if let Some(name) = &decl.name {
            env.def(name.clone(), Value::Closure(Rc::clone(&closure)));
        }
        Value::Closure(closure)
    }

    fn call(&self, target: &Expr, args: &[Expr], env: &Rc<Scope>) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(target, env)?;
        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(self.evaluate(arg, env)?);
        }
        self.apply(&callee, &evaluated)
    }

    /// Applies a closure or builtin to already-evaluated arguments.
    /// Closure application extends the captured scope once, binding
    /// parameters positionally; missing arguments bind to false.
    pub fn apply(&self, callee: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
        match callee {
            Value::Closure(closure) => {
                let scope = closure.env.extend();
                for (i, param) in closure.decl.params.iter().enumerate() {
                    let value = match args.get(i) {
                        Some(arg) => {
                            check_annotation(param, arg)?;
                            arg.clone()
                        }
                        None => Value::FALSE,
                    };
                    scope.def(param.name.clone(), value);
                }
                self.evaluate(&closure.decl.body, &scope)
            }
            Value::Builtin(builtin) => (builtin.call)(self, args),
            other => Err(RuntimeError::type_error(format!(
                "Unable to call non-closure value {}",
                format_value(other)
            ))),
        }
    }

    fn vector(&self, body: &[Expr], env: &Rc<Scope>) -> Result<Value, RuntimeError> {
        let mut items = Vec::with_capacity(body.len());
        for expr in body {
            items.push(self.evaluate(expr, env)?);
        }
        Ok(Value::vector(items))
    }

    /// The index expression evaluates first and must be numeric. A
    /// literal-vector body evaluates only the selected element;
    /// otherwise the body value is indexed as a vector or string.
    fn index(&self, body: &Expr, idx: &Expr, env: &Rc<Scope>) -> Result<Value, RuntimeError> {
        let idx_value = self.evaluate(idx, env)?;
        let n = idx_value.as_number().ok_or_else(|| {
            RuntimeError::type_error(format!(
                "Only numbers may be used as indices for vectors/lists, however {} was provided",
                format_value(&idx_value)
            ))
        })?;

        if let Expr::Vector { body: elements } = body {
            let at = element_index(n, elements.len())?;
            return self.evaluate(&elements[at], env);
        }

        match self.evaluate(body, env)? {
            Value::Vector(items) => {
                let items = items.borrow();
                let at = element_index(n, items.len())?;
                Ok(items[at].clone())
            }
            Value::Str(s) => {
                let length = s.chars().count();
                let at = element_index(n, length)?;
                let ch: String = s.chars().skip(at).take(1).collect();
                Ok(Value::Str(ch.into()))
            }
            other => Err(RuntimeError::type_error(format!(
                "Unable to index non-list/vector/string {}",
                format_value(&other)
            ))),
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_value(token: &Token) -> Value {
    match &token.value {
        TokenValue::Number(n) => Value::Number(*n),
        TokenValue::Str(s) => Value::Str(Rc::clone(s)),
        TokenValue::Bool(b) => Value::Bool(*b),
    }
}

fn describe_node(expr: &Expr) -> String {
    match expr {
        Expr::Literal(token) => format!("`{}`", token.text()),
        Expr::Reference(token) => format!("`{}`", token.text()),
        Expr::Block { .. } => "a block".to_string(),
        Expr::Conditional { .. } => "a conditional".to_string(),
        Expr::Vector { .. } => "a vector".to_string(),
        Expr::Index { .. } => "an index expression".to_string(),
        Expr::Lambda(_) => "a lambda".to_string(),
        Expr::Variable { .. } => "a let-binding".to_string(),
        Expr::Call { .. } => "a call".to_string(),
        Expr::Assign { .. } => "an assignment".to_string(),
        Expr::Binary { .. } => "a binary expression".to_string(),
    }
}

fn number(value: &Value) -> Result<f64, RuntimeError> {
    value.as_number().ok_or_else(|| {
        RuntimeError::type_error(format!("Expected a number, but got {}", format_value(value)))
    })
}

fn nonzero(value: &Value, operator: &str) -> Result<f64, RuntimeError> {
    let n = number(value)?;
    if n == 0.0 {
        Err(RuntimeError::arithmetic(operator))
    } else {
        Ok(n)
    }
}

fn element_index(idx: f64, length: usize) -> Result<usize, RuntimeError> {
    if idx < 0.0 || idx.fract() != 0.0 || (idx as usize) >= length {
        Err(RuntimeError::index(idx, length))
    } else {
        Ok(idx as usize)
    }
}

fn check_annotation(param: &Param, value: &Value) -> Result<(), RuntimeError> {
    let Some(annotation) = &param.annotation else {
        return Ok(());
    };
    if &**annotation == "Any" || &**annotation == value.meta_type() {
        Ok(())
    } else {
        Err(RuntimeError::type_error(format!(
            "Incorrect parameter type for {}. Expected {} but got {}",
            param.name,
            annotation,
            value.meta_type()
        )))
    }
}

/// Parses and evaluates against a fresh bootstrapped runtime.
pub fn run(source: &str) -> Result<Value, Error> {
    let env = builtins::runtime()?;
    run_in(source, &env)
}

/// Parses and evaluates against a caller-owned scope, so REPL state
/// survives between lines.
pub fn run_in(source: &str, env: &Rc<Scope>) -> Result<Value, Error> {
    let ast = parser::parse(source)?;
    Ok(Evaluator::new().evaluate(&ast, env)?)
}

/// Parses without evaluating, for inspection tooling.
pub fn parse_only(source: &str) -> Result<Expr, Error> {
    parser::parse(source)
}
