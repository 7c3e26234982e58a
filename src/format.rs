use crate::value::Value;

/// Renders a runtime value for the REPL and the `print` builtin.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::Str(s) => format!("\"{}\"", escape_string(s)),
        Value::Vector(items) => {
            let rendered: Vec<String> = items.borrow().iter().map(format_value).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Closure(closure) => {
            let params: Vec<&str> = closure.decl.params.iter().map(|p| &*p.name).collect();
            format!(
                "{} |{}|",
                closure.decl.name.as_deref().unwrap_or("#<lambda>"),
                params.join(", ")
            )
        }
        Value::Builtin(builtin) => format!("#<builtin:{}>", builtin.name),
    }
}

/// Integral numbers print without a trailing fraction.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_trim_integral_fractions() {
        assert_eq!(format_value(&Value::Number(3.0)), "3");
        assert_eq!(format_value(&Value::Number(3.5)), "3.5");
        assert_eq!(format_value(&Value::Number(-2.0)), "-2");
    }

    #[test]
    fn vectors_nest() {
        let value = Value::vector(vec![
            Value::Number(1.0),
            Value::vector(vec![Value::Str("x".into())]),
        ]);
        assert_eq!(format_value(&value), "[1, [\"x\"]]");
    }

    #[test]
    fn the_false_sentinel_prints_as_false() {
        assert_eq!(format_value(&Value::FALSE), "false");
    }
}
