//! Dynamic values the operator runtime works on

use super::error::RuntimeResult;
use super::operator::{BinaryOperator, UnaryOperator};
use super::undefined::Undefined;
use crate::grammar::ast::Literal;
use num_complex::Complex64;
use std::fmt;
use std::sync::Arc;

/// Capability contract for host-provided values.
///
/// Every hook returns `None` when the capability is absent, letting the
/// dispatcher move on to the other operand or to the built-in semantics.
pub trait Object: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    /// `reflected` is set when the value is the right-hand operand of an
    /// arithmetic operator whose left operand declined
    fn binary_op(
        &self,
        _op: BinaryOperator,
        _other: &Value,
        _reflected: bool,
    ) -> Option<RuntimeResult<Value>> {
        None
    }

    fn unary_op(&self, _op: UnaryOperator) -> Option<RuntimeResult<Value>> {
        None
    }

    fn truth(&self) -> Option<RuntimeResult<bool>> {
        None
    }

    fn contains(&self, _item: &Value) -> Option<RuntimeResult<bool>> {
        None
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex64),
    Str(String),
    Seq(Vec<Value>),
    /// Insertion-ordered key/value pairs
    Map(Vec<(Value, Value)>),
    Undefined(Undefined),
    Custom(Arc<dyn Object>),
}

impl Value {
    pub fn type_name(&self) -> &str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::Str(_) => "str",
            Value::Seq(_) => "list",
            Value::Map(_) => "dict",
            Value::Undefined(undefined) => undefined.type_name(),
            Value::Custom(object) => object.type_name(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Complex(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The capability hooks of a value, if it carries any
    pub fn capability(&self) -> Option<&dyn Object> {
        match self {
            Value::Undefined(undefined) => Some(undefined),
            Value::Custom(object) => Some(object.as_ref()),
            _ => None,
        }
    }

    /// Python-style `repr`, used inside container renderings
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => quote_str(s),
            other => other.to_string(),
        }
    }
}

fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Structural equality; numbers of different kinds are distinct here
pub fn structural_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Complex(a), Value::Complex(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Seq(a), Value::Seq(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| structural_eq(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, value)| {
                    b.iter()
                        .any(|(other_key, other_value)| {
                            structural_eq(key, other_key) && structural_eq(value, other_value)
                        })
                })
        }
        (Value::Undefined(a), Value::Undefined(b)) => a.kind() == b.kind(),
        (Value::Custom(a), Value::Custom(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other)
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{:?}", f)
    }
}

fn format_complex(c: &Complex64) -> String {
    let im = format!("{}j", format_float(c.im).trim_end_matches(".0"));
    if c.re == 0.0 && c.re.is_sign_positive() {
        return im;
    }
    let sign = if c.im.is_sign_negative() { "" } else { "+" };
    format!("({}{}{})", format_float(c.re).trim_end_matches(".0"), sign, im)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Complex(c) => write!(f, "{}", format_complex(c)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Seq(items) => {
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Map(pairs) => {
                let parts: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.repr(), value.repr()))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Value::Undefined(_) => Ok(()),
            Value::Custom(object) => write!(f, "<{} object>", object.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Complex64> for Value {
    fn from(value: Complex64) -> Self {
        Value::Complex(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Seq(value)
    }
}

impl From<Undefined> for Value {
    fn from(value: Undefined) -> Self {
        Value::Undefined(value)
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match literal {
            Literal::None => Value::None,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::Int(*i),
            Literal::Float(x) => Value::Float(*x),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::None.type_name(), "NoneType");
        assert_eq!(Value::Int(1).type_name(), "int");
        assert_eq!(Value::Seq(vec![]).type_name(), "list");
        assert_eq!(Value::Map(vec![]).type_name(), "dict");
    }

    #[test]
    fn test_display_follows_python_rendering() {
        assert_eq!(Value::Float(7.0).to_string(), "7.0");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Complex(Complex64::new(3.0, 1.0)).to_string(), "(3+1j)");
        assert_eq!(Value::Complex(Complex64::new(0.0, 2.0)).to_string(), "2j");
        assert_eq!(
            Value::Seq(vec![Value::from("foo"), Value::Int(3)]).to_string(),
            "['foo', 3]"
        );
        assert_eq!(
            Value::Map(vec![(Value::from("a"), Value::Int(1))]).to_string(),
            "{'a': 1}"
        );
    }

    #[test]
    fn test_string_repr_quoting() {
        assert_eq!(Value::from("it's").repr(), "\"it's\"");
        assert_eq!(Value::from("a\nb").repr(), "'a\\nb'");
    }

    #[test]
    fn test_structural_equality() {
        let left = Value::Map(vec![
            (Value::from("a"), Value::Int(1)),
            (Value::from("b"), Value::Int(2)),
        ]);
        let right = Value::Map(vec![
            (Value::from("b"), Value::Int(2)),
            (Value::from("a"), Value::Int(1)),
        ]);
        assert!(structural_eq(&left, &right));
        assert!(!structural_eq(&Value::Int(1), &Value::Float(1.0)));
        assert!(!structural_eq(
            &Value::Seq(vec![Value::Int(1)]),
            &Value::Seq(vec![Value::Int(1), Value::Int(2)])
        ));
    }

    #[test]
    fn test_literal_conversion() {
        assert_eq!(Value::from(&Literal::Int(5)), Value::Int(5));
        assert_eq!(Value::from(&Literal::None), Value::None);
        assert_eq!(Value::from(&Literal::Str("x".into())), Value::from("x"));
    }
}
