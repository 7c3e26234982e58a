use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::LambdaExpr;
use crate::interpreter::environment::Scope;
use crate::interpreter::error::RuntimeError;
use crate::interpreter::evaluator::Evaluator;

/// Native function signature. Builtins receive the evaluator so they
/// can apply wyg callables handed to them (`t'delta` times one).
pub type NativeFn = fn(&Evaluator, &[Value]) -> Result<Value, RuntimeError>;

/// A lambda paired with the scope active at its definition site.
pub struct Closure {
    pub decl: Rc<LambdaExpr>,
    pub env: Rc<Scope>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.decl.params.iter().map(|p| &*p.name).collect();
        write!(
            f,
            "{} |{}|",
            self.decl.name.as_deref().unwrap_or("#<lambda>"),
            params.join(", ")
        )
    }
}

pub struct BuiltinFn {
    pub name: &'static str,
    pub call: NativeFn,
}

impl fmt::Debug for BuiltinFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<builtin:{}>", self.name)
    }
}

/// Dynamically-typed runtime value. `Bool(false)` doubles as the
/// canonical "no value" / end-of-list sentinel.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Vector(Rc<RefCell<Vec<Value>>>),
    Closure(Rc<Closure>),
    Builtin(Rc<BuiltinFn>),
}

impl Value {
    pub const FALSE: Value = Value::Bool(false);

    pub fn vector(items: Vec<Value>) -> Self {
        Value::Vector(Rc::new(RefCell::new(items)))
    }

    /// The only falsy value is the literal false.
    pub fn is_false(&self) -> bool {
        matches!(self, Value::Bool(false))
    }

    pub fn is_truthy(&self) -> bool {
        !self.is_false()
    }

    pub fn as_number(&self) -> Option<f64> {
        if let Value::Number(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::Str(s) = self {
            Some(s.as_ref())
        } else {
            None
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Builtin(_))
    }

    /// Long-form type name, as reported by the `type'of` builtin and
    /// used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::Str(_) => "String",
            Value::Vector(_) => "Vector",
            Value::Closure(_) => "Closure",
            Value::Builtin(_) => "Builtin",
        }
    }

    /// Short builtin type tag matched against parameter annotations.
    pub fn meta_type(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Num",
            Value::Str(_) => "Str",
            Value::Vector(_) => "Vec",
            Value::Closure(_) | Value::Builtin(_) => "Fn",
        }
    }
}

/// Structural deep equality: vectors recurse element-wise, closures and
/// builtins compare by identity, mismatched types are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
