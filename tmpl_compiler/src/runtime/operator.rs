//! Operator dispatch over dynamic values
//!
//! Binary operators try, in order: the left operand's capability, the right
//! operand's capability (reflected for arithmetic, mirrored for
//! comparisons), the built-in numeric/string/sequence semantics, and finally
//! fail with an unsupported-operands error.

use super::error::{RuntimeError, RuntimeResult};
use super::value::{structural_eq, Value};
use crate::config::compile_time::runtime::MAX_REPEAT_LENGTH;
use num_complex::Complex64;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    /// Operator to ask the right operand for when the left one declined a comparison
    pub fn mirrored(&self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Gt => Self::Lt,
            Self::Le => Self::Ge,
            Self::Ge => Self::Le,
            other => *other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Pos,
    Neg,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Pos => "+",
            Self::Neg => "-",
        }
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Apply a binary operator following the capability dispatch order
pub fn binary(op: BinaryOperator, left: &Value, right: &Value) -> RuntimeResult<Value> {
    if let Some(result) = left
        .capability()
        .and_then(|object| object.binary_op(op, right, false))
    {
        return result;
    }

    if let Some(object) = right.capability() {
        let result = if op.is_comparison() {
            object.binary_op(op.mirrored(), left, false)
        } else {
            object.binary_op(op, left, true)
        };
        if let Some(result) = result {
            return result;
        }
    }

    builtin_binary(op, left, right)
}

pub fn add(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Add, left, right)
}

pub fn sub(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Sub, left, right)
}

pub fn mul(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Mul, left, right)
}

pub fn div(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Div, left, right)
}

pub fn floor_div(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::FloorDiv, left, right)
}

pub fn modulo(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Mod, left, right)
}

pub fn pow(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Pow, left, right)
}

pub fn eq(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Eq, left, right)
}

pub fn ne(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Ne, left, right)
}

pub fn lt(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Lt, left, right)
}

pub fn le(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Le, left, right)
}

pub fn gt(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Gt, left, right)
}

pub fn ge(left: &Value, right: &Value) -> RuntimeResult<Value> {
    binary(BinaryOperator::Ge, left, right)
}

/// `item in container`
pub fn contains(container: &Value, item: &Value) -> RuntimeResult<bool> {
    if let Some(result) = container
        .capability()
        .and_then(|object| object.contains(item))
    {
        return result;
    }

    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            _ => Err(RuntimeError::unsupported_operands(
                "in",
                item.type_name(),
                container.type_name(),
            )),
        },
        Value::Seq(items) => {
            for element in items {
                if truth(&eq(element, item)?)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Map(pairs) => {
            for (key, _) in pairs {
                if truth(&eq(key, item)?)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(RuntimeError::unsupported_operands(
            "in",
            item.type_name(),
            container.type_name(),
        )),
    }
}

/// Boolean coercion
pub fn truth(value: &Value) -> RuntimeResult<bool> {
    if let Some(result) = value.capability().and_then(|object| object.truth()) {
        return result;
    }

    Ok(match value {
        Value::None => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Complex(c) => *c != Complex64::new(0.0, 0.0),
        Value::Str(s) => !s.is_empty(),
        Value::Seq(items) => !items.is_empty(),
        Value::Map(pairs) => !pairs.is_empty(),
        Value::Undefined(_) | Value::Custom(_) => true,
    })
}

pub fn not(value: &Value) -> RuntimeResult<bool> {
    truth(value).map(|b| !b)
}

pub fn unary(op: UnaryOperator, value: &Value) -> RuntimeResult<Value> {
    if let Some(result) = value.capability().and_then(|object| object.unary_op(op)) {
        return result;
    }

    match (op, value) {
        (UnaryOperator::Pos, Value::Int(_) | Value::Float(_) | Value::Complex(_)) => {
            Ok(value.clone())
        }
        (UnaryOperator::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or(RuntimeError::Overflow { op: "-" }),
        (UnaryOperator::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOperator::Neg, Value::Complex(c)) => Ok(Value::Complex(-c)),
        _ => Err(RuntimeError::unsupported_operand(
            op.symbol(),
            value.type_name(),
        )),
    }
}

pub fn pos(value: &Value) -> RuntimeResult<Value> {
    unary(UnaryOperator::Pos, value)
}

pub fn neg(value: &Value) -> RuntimeResult<Value> {
    unary(UnaryOperator::Neg, value)
}

// ============================================================================
// BUILT-IN SEMANTICS
// ============================================================================

/// Both operands lifted onto their common numeric domain
enum NumPair {
    Int(i64, i64),
    Float(f64, f64),
    Complex(Complex64, Complex64),
}

fn as_complex(value: &Value) -> Option<Complex64> {
    match value {
        Value::Int(i) => Some(Complex64::new(*i as f64, 0.0)),
        Value::Float(f) => Some(Complex64::new(*f, 0.0)),
        Value::Complex(c) => Some(*c),
        _ => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn coerce(left: &Value, right: &Value) -> Option<NumPair> {
    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(NumPair::Int(*a, *b)),
        (Value::Complex(_), _) | (_, Value::Complex(_)) => {
            Some(NumPair::Complex(as_complex(left)?, as_complex(right)?))
        }
        _ => Some(NumPair::Float(as_float(left)?, as_float(right)?)),
    }
}

fn unsupported(op: BinaryOperator, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::unsupported_operands(op.symbol(), left.type_name(), right.type_name())
}

fn builtin_binary(op: BinaryOperator, left: &Value, right: &Value) -> RuntimeResult<Value> {
    if let Some(pair) = coerce(left, right) {
        return numeric(op, pair).unwrap_or_else(|| Err(unsupported(op, left, right)));
    }

    match op {
        BinaryOperator::Eq => Ok(Value::Bool(structural_eq(left, right))),
        BinaryOperator::Ne => Ok(Value::Bool(!structural_eq(left, right))),
        BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
            let ordering = compare(op, left, right)?;
            Ok(Value::Bool(ordering_matches(op, ordering)))
        }
        BinaryOperator::Add => match (left, right) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            (Value::Seq(a), Value::Seq(b)) => {
                Ok(Value::Seq(a.iter().chain(b.iter()).cloned().collect()))
            }
            _ => Err(unsupported(op, left, right)),
        },
        BinaryOperator::Mul => match (left, right) {
            (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
                let count = repeat_count(op, s.len(), *n)?;
                Ok(Value::Str(s.repeat(count)))
            }
            (Value::Seq(items), Value::Int(n)) | (Value::Int(n), Value::Seq(items)) => {
                let count = repeat_count(op, items.len(), *n)?;
                let mut repeated = Vec::with_capacity(items.len() * count);
                for _ in 0..count {
                    repeated.extend(items.iter().cloned());
                }
                Ok(Value::Seq(repeated))
            }
            _ => Err(unsupported(op, left, right)),
        },
        _ => Err(unsupported(op, left, right)),
    }
}

/// Negative counts repeat zero times; the repeated length is bounded
fn repeat_count(op: BinaryOperator, len: usize, n: i64) -> RuntimeResult<usize> {
    let count = usize::try_from(n).unwrap_or(0);
    match len.checked_mul(count) {
        Some(total) if total <= MAX_REPEAT_LENGTH => Ok(count),
        _ => Err(overflow(op)),
    }
}

/// Bases whose powers stay in range for any exponent
fn pow_of_unit(base: i64, exponent: i64) -> Option<i64> {
    match base {
        0 => Some(0),
        1 => Some(1),
        -1 => Some(if exponent % 2 == 0 { 1 } else { -1 }),
        _ => None,
    }
}

fn ordering_matches(op: BinaryOperator, ordering: Ordering) -> bool {
    match op {
        BinaryOperator::Lt => ordering == Ordering::Less,
        BinaryOperator::Le => ordering != Ordering::Greater,
        BinaryOperator::Gt => ordering == Ordering::Greater,
        BinaryOperator::Ge => ordering != Ordering::Less,
        _ => false,
    }
}

/// Ordering for strings and sequences
fn compare(op: BinaryOperator, left: &Value, right: &Value) -> RuntimeResult<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(a.chars().cmp(b.chars())),
        (Value::Seq(a), Value::Seq(b)) => {
            for (x, y) in a.iter().zip(b) {
                if truth(&eq(x, y)?)? {
                    continue;
                }
                return if truth(&lt(x, y)?)? {
                    Ok(Ordering::Less)
                } else {
                    Ok(Ordering::Greater)
                };
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => Err(unsupported(op, left, right)),
    }
}

/// `None` when the operator has no meaning in the domain
fn numeric(op: BinaryOperator, pair: NumPair) -> Option<RuntimeResult<Value>> {
    match pair {
        NumPair::Int(a, b) => int_op(op, a, b),
        NumPair::Float(a, b) => Some(float_op(op, a, b)),
        NumPair::Complex(a, b) => complex_op(op, a, b),
    }
}

fn overflow(op: BinaryOperator) -> RuntimeError {
    RuntimeError::Overflow { op: op.symbol() }
}

fn int_op(op: BinaryOperator, a: i64, b: i64) -> Option<RuntimeResult<Value>> {
    let checked = |result: Option<i64>| result.map(Value::Int).ok_or_else(|| overflow(op));

    let result = match op {
        BinaryOperator::Add => checked(a.checked_add(b)),
        BinaryOperator::Sub => checked(a.checked_sub(b)),
        BinaryOperator::Mul => checked(a.checked_mul(b)),
        BinaryOperator::Div => {
            if b == 0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        BinaryOperator::FloorDiv => {
            if b == 0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                checked(a.checked_div(b).map(|q| {
                    if (a % b != 0) && ((a < 0) != (b < 0)) {
                        q - 1
                    } else {
                        q
                    }
                }))
            }
        }
        BinaryOperator::Mod => {
            if b == 0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                // wrapping_rem only wraps for MIN % -1, where the remainder is 0
                let r = a.wrapping_rem(b);
                Ok(Value::Int(if r != 0 && ((r < 0) != (b < 0)) {
                    r + b
                } else {
                    r
                }))
            }
        }
        BinaryOperator::Pow => {
            if b >= 0 {
                match u32::try_from(b) {
                    Ok(exponent) => checked(a.checked_pow(exponent)),
                    Err(_) => checked(pow_of_unit(a, b)),
                }
            } else if a == 0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                Ok(Value::Float((a as f64).powf(b as f64)))
            }
        }
        BinaryOperator::Eq => Ok(Value::Bool(a == b)),
        BinaryOperator::Ne => Ok(Value::Bool(a != b)),
        BinaryOperator::Lt => Ok(Value::Bool(a < b)),
        BinaryOperator::Le => Ok(Value::Bool(a <= b)),
        BinaryOperator::Gt => Ok(Value::Bool(a > b)),
        BinaryOperator::Ge => Ok(Value::Bool(a >= b)),
    };
    Some(result)
}

fn float_op(op: BinaryOperator, a: f64, b: f64) -> RuntimeResult<Value> {
    let needs_divisor = matches!(
        op,
        BinaryOperator::Div | BinaryOperator::FloorDiv | BinaryOperator::Mod
    );
    if needs_divisor && b == 0.0 {
        return Err(RuntimeError::DivisionByZero);
    }

    Ok(match op {
        BinaryOperator::Add => Value::Float(a + b),
        BinaryOperator::Sub => Value::Float(a - b),
        BinaryOperator::Mul => Value::Float(a * b),
        BinaryOperator::Div => Value::Float(a / b),
        BinaryOperator::FloorDiv => Value::Float((a / b).floor()),
        BinaryOperator::Mod => {
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                Value::Float(r + b)
            } else {
                Value::Float(r)
            }
        }
        BinaryOperator::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::Float(a.powf(b))
        }
        BinaryOperator::Eq => Value::Bool(a == b),
        BinaryOperator::Ne => Value::Bool(a != b),
        BinaryOperator::Lt => Value::Bool(a < b),
        BinaryOperator::Le => Value::Bool(a <= b),
        BinaryOperator::Gt => Value::Bool(a > b),
        BinaryOperator::Ge => Value::Bool(a >= b),
    })
}

fn complex_op(op: BinaryOperator, a: Complex64, b: Complex64) -> Option<RuntimeResult<Value>> {
    let result = match op {
        BinaryOperator::Add => Ok(Value::Complex(a + b)),
        BinaryOperator::Sub => Ok(Value::Complex(a - b)),
        BinaryOperator::Mul => Ok(Value::Complex(a * b)),
        BinaryOperator::Div => {
            if b == Complex64::new(0.0, 0.0) {
                Err(RuntimeError::DivisionByZero)
            } else {
                Ok(Value::Complex(a / b))
            }
        }
        BinaryOperator::Pow => Err(RuntimeError::not_implemented(
            "pow is not implemented for complex operands",
        )),
        BinaryOperator::Eq => Ok(Value::Bool(a == b)),
        BinaryOperator::Ne => Ok(Value::Bool(a != b)),
        BinaryOperator::FloorDiv
        | BinaryOperator::Mod
        | BinaryOperator::Lt
        | BinaryOperator::Le
        | BinaryOperator::Gt
        | BinaryOperator::Ge => return None,
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    /// Adds or multiplies a fixed amount, optionally only as the right operand
    #[derive(Debug)]
    struct Fixed {
        op: BinaryOperator,
        amount: i64,
        reflected_only: bool,
    }

    impl crate::runtime::Object for Fixed {
        fn type_name(&self) -> &str {
            "Fixed"
        }

        fn binary_op(
            &self,
            op: BinaryOperator,
            other: &Value,
            reflected: bool,
        ) -> Option<RuntimeResult<Value>> {
            if op != self.op || reflected != self.reflected_only {
                return None;
            }
            if !other.is_numeric() {
                return Some(Err(RuntimeError::custom("expected numeric")));
            }
            Some(binary(op, &Value::Int(self.amount), other))
        }
    }

    /// Compares against 42 through one comparison operator
    #[derive(Debug)]
    struct Threshold(BinaryOperator);

    impl crate::runtime::Object for Threshold {
        fn type_name(&self) -> &str {
            "Threshold"
        }

        fn binary_op(
            &self,
            op: BinaryOperator,
            other: &Value,
            _reflected: bool,
        ) -> Option<RuntimeResult<Value>> {
            if op != self.0 {
                return None;
            }
            if op == BinaryOperator::Eq {
                return Some(Ok(Value::Bool(other == &Value::Int(42))));
            }
            if !other.is_numeric() {
                return Some(Err(RuntimeError::custom("expected numeric")));
            }
            Some(binary(op, &Value::Int(42), other))
        }
    }

    fn custom(object: impl crate::runtime::Object + 'static) -> Value {
        Value::Custom(std::sync::Arc::new(object))
    }

    fn forward(op: BinaryOperator) -> Value {
        custom(Fixed {
            op,
            amount: 21,
            reflected_only: false,
        })
    }

    fn reflected(op: BinaryOperator, amount: i64) -> Value {
        custom(Fixed {
            op,
            amount,
            reflected_only: true,
        })
    }

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    fn c(re: f64, im: f64) -> Value {
        Value::Complex(Complex64::new(re, im))
    }

    #[test]
    fn test_add() {
        use BinaryOperator::Add;

        assert_eq!(add(&Value::Int(3), &Value::Int(4)).unwrap(), Value::Int(7));
        assert_eq!(add(&Value::Int(3), &Value::Float(4.0)).unwrap(), Value::Float(7.0));
        assert_eq!(add(&Value::Int(3), &c(0.0, 1.0)).unwrap(), c(3.0, 1.0));
        assert_eq!(add(&s("foo"), &s("bar")).unwrap(), s("foobar"));
        assert_eq!(
            add(&Value::Seq(vec![s("foo")]), &Value::Seq(vec![Value::Int(3)])).unwrap(),
            Value::Seq(vec![s("foo"), Value::Int(3)])
        );
        assert_eq!(add(&forward(Add), &Value::Int(21)).unwrap(), Value::Int(42));
        assert_eq!(add(&Value::Int(3), &reflected(Add, 21)).unwrap(), Value::Int(24));

        assert!(add(&s("3"), &reflected(Add, 21)).is_err());
        assert!(add(&forward(Add), &s("21")).is_err());
        assert!(add(&s("foo"), &Value::Int(3)).is_err());
        assert!(add(&reflected(Add, 21), &Value::Int(21)).is_err());
        assert!(add(&Value::Int(3), &forward(Add)).is_err());
        assert!(add(&Value::Seq(vec![]), &Value::Int(3)).is_err());
    }

    #[test]
    fn test_mul() {
        use BinaryOperator::Mul;
        let pair = Value::Seq(vec![s("foo"), Value::Int(42)]);
        let tripled = Value::Seq(vec![
            s("foo"),
            Value::Int(42),
            s("foo"),
            Value::Int(42),
            s("foo"),
            Value::Int(42),
        ]);

        assert_eq!(mul(&Value::Int(3), &Value::Int(4)).unwrap(), Value::Int(12));
        assert_eq!(mul(&Value::Int(3), &Value::Float(4.0)).unwrap(), Value::Float(12.0));
        assert_eq!(mul(&Value::Int(3), &c(3.0, 1.0)).unwrap(), c(9.0, 3.0));
        assert_eq!(mul(&pair, &Value::Int(3)).unwrap(), tripled);
        assert_eq!(mul(&Value::Int(3), &pair).unwrap(), tripled);
        assert_eq!(mul(&s("aa"), &Value::Int(3)).unwrap(), s("aaaaaa"));
        assert_eq!(mul(&Value::Int(3), &s("aa")).unwrap(), s("aaaaaa"));
        assert_eq!(mul(&s("ab"), &Value::Int(-2)).unwrap(), s(""));
        assert_eq!(mul(&forward(Mul), &Value::Int(2)).unwrap(), Value::Int(42));
        assert_eq!(mul(&Value::Int(3), &reflected(Mul, 2)).unwrap(), Value::Int(6));

        assert!(mul(&s("3"), &reflected(Mul, 2)).is_err());
        assert!(mul(&forward(Mul), &s("21")).is_err());
        assert!(mul(&reflected(Mul, 2), &Value::Int(21)).is_err());
        assert!(mul(&Value::Int(3), &forward(Mul)).is_err());
        assert!(mul(&Value::Seq(vec![s("foo")]), &Value::Seq(vec![Value::Int(3)])).is_err());
        assert_matches!(
            mul(&s("foo"), &s("bar")),
            Err(RuntimeError::UnsupportedOperands { op: "*", .. })
        );
    }

    #[test]
    fn test_repeat_beyond_limit_is_overflow() {
        let seq = Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);

        assert_matches!(
            mul(&s("ab"), &Value::Int(i64::MAX)),
            Err(RuntimeError::Overflow { op: "*" })
        );
        assert_matches!(
            mul(&seq, &Value::Int(i64::MAX)),
            Err(RuntimeError::Overflow { op: "*" })
        );
        assert_matches!(
            mul(&Value::Int(i64::MAX), &seq),
            Err(RuntimeError::Overflow { op: "*" })
        );
        let over = i64::try_from(MAX_REPEAT_LENGTH).unwrap() + 1;
        assert_matches!(mul(&s("a"), &Value::Int(over)), Err(RuntimeError::Overflow { .. }));
        assert_eq!(mul(&s(""), &Value::Int(i64::MAX)).unwrap(), s(""));
        assert_eq!(mul(&Value::Seq(vec![]), &Value::Int(i64::MAX)).unwrap(), Value::Seq(vec![]));
    }

    #[test]
    fn test_eq() {
        let is_42 = custom(Threshold(BinaryOperator::Eq));

        assert_eq!(eq(&Value::Int(3), &Value::Int(3)).unwrap(), Value::Bool(true));
        assert_eq!(eq(&Value::Int(3), &Value::Float(3.0)).unwrap(), Value::Bool(true));
        assert_eq!(eq(&Value::Int(3), &c(3.0, 0.0)).unwrap(), Value::Bool(true));
        assert_eq!(eq(&Value::Bool(true), &Value::Bool(true)).unwrap(), Value::Bool(true));
        assert_eq!(eq(&Value::Int(42), &is_42).unwrap(), Value::Bool(true));
        assert_eq!(eq(&is_42, &Value::Int(42)).unwrap(), Value::Bool(true));
        assert_eq!(eq(&s("foo"), &s("foo")).unwrap(), Value::Bool(true));
        assert_eq!(
            eq(&Value::Seq(vec![s("foo")]), &Value::Seq(vec![s("foo")])).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(eq(&s("foo"), &s("bar")).unwrap(), Value::Bool(false));
        assert_eq!(
            eq(&Value::Seq(vec![s("foo")]), &Value::Seq(vec![s("bar")])).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(ne(&s("foo"), &s("bar")).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_le() {
        let le_42 = custom(Threshold(BinaryOperator::Le));
        let ge_42 = custom(Threshold(BinaryOperator::Ge));

        assert_eq!(le(&Value::Int(3), &Value::Int(4)).unwrap(), Value::Bool(true));
        assert_eq!(le(&Value::Int(3), &Value::Float(4.0)).unwrap(), Value::Bool(true));
        assert_eq!(le(&le_42, &Value::Int(43)).unwrap(), Value::Bool(true));
        assert_eq!(le(&Value::Int(21), &ge_42).unwrap(), Value::Bool(true));
        assert_eq!(le(&s("foo"), &s("foobar")).unwrap(), Value::Bool(true));

        assert!(le(&Value::Int(21), &le_42).is_err());
        assert!(le(&ge_42, &Value::Int(21)).is_err());
        assert!(le(&Value::Bool(true), &Value::Bool(true)).is_err());
        assert!(le(&Value::Int(3), &s("4")).is_err());
    }

    #[test]
    fn test_division_semantics() {
        assert_eq!(div(&Value::Int(7), &Value::Int(2)).unwrap(), Value::Float(3.5));
        assert_eq!(floor_div(&Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(-4));
        assert_eq!(modulo(&Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(1));
        assert_eq!(modulo(&Value::Int(7), &Value::Int(-2)).unwrap(), Value::Int(-1));
        assert_eq!(modulo(&Value::Float(-7.5), &Value::Int(2)).unwrap(), Value::Float(0.5));

        for zero in [Value::Int(0), Value::Float(0.0), c(0.0, 0.0)] {
            assert_matches!(div(&Value::Int(1), &zero), Err(RuntimeError::DivisionByZero));
            assert_matches!(div(&Value::Float(2.5), &zero), Err(RuntimeError::DivisionByZero));
        }
        assert_matches!(floor_div(&Value::Int(1), &Value::Int(0)), Err(RuntimeError::DivisionByZero));
        assert_matches!(modulo(&Value::Int(1), &Value::Int(0)), Err(RuntimeError::DivisionByZero));
        assert_matches!(
            floor_div(&c(1.0, 1.0), &Value::Int(2)),
            Err(RuntimeError::UnsupportedOperands { .. })
        );
    }

    #[test]
    fn test_pow() {
        assert_eq!(pow(&Value::Int(2), &Value::Int(10)).unwrap(), Value::Int(1024));
        assert_eq!(pow(&Value::Int(2), &Value::Int(-1)).unwrap(), Value::Float(0.5));
        assert_eq!(pow(&Value::Float(4.0), &Value::Float(0.5)).unwrap(), Value::Float(2.0));
        assert_matches!(
            pow(&c(1.0, 1.0), &Value::Int(2)),
            Err(RuntimeError::NotImplemented { .. })
        );
        assert_matches!(
            pow(&Value::Int(10), &Value::Int(100)),
            Err(RuntimeError::Overflow { op: "**" })
        );

        let huge = Value::Int(i64::from(u32::MAX) + 1);
        let huge_odd = Value::Int(i64::from(u32::MAX) + 2);
        assert_eq!(pow(&Value::Int(0), &huge).unwrap(), Value::Int(0));
        assert_eq!(pow(&Value::Int(1), &huge).unwrap(), Value::Int(1));
        assert_eq!(pow(&Value::Int(-1), &huge).unwrap(), Value::Int(1));
        assert_eq!(pow(&Value::Int(-1), &huge_odd).unwrap(), Value::Int(-1));
        assert_matches!(pow(&Value::Int(2), &huge), Err(RuntimeError::Overflow { op: "**" }));
    }

    #[test]
    fn test_integer_overflow_is_reported() {
        assert_matches!(
            add(&Value::Int(i64::MAX), &Value::Int(1)),
            Err(RuntimeError::Overflow { op: "+" })
        );
        assert_matches!(neg(&Value::Int(i64::MIN)), Err(RuntimeError::Overflow { .. }));
        assert_matches!(
            floor_div(&Value::Int(i64::MIN), &Value::Int(-1)),
            Err(RuntimeError::Overflow { .. })
        );
        assert_eq!(modulo(&Value::Int(i64::MIN), &Value::Int(-1)).unwrap(), Value::Int(0));
        assert_eq!(modulo(&Value::Int(i64::MIN), &Value::Int(3)).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_contains() {
        let seq = Value::Seq(vec![Value::Int(1), s("two")]);
        let map = Value::Map(vec![(s("key"), Value::Int(1))]);

        assert!(contains(&s("foobar"), &s("oba")).unwrap());
        assert!(!contains(&s("foobar"), &s("baz")).unwrap());
        assert!(contains(&seq, &Value::Float(1.0)).unwrap());
        assert!(contains(&seq, &s("two")).unwrap());
        assert!(!contains(&seq, &Value::Int(2)).unwrap());
        assert!(contains(&map, &s("key")).unwrap());
        assert!(!contains(&map, &Value::Int(1)).unwrap());
        assert!(contains(&s("foo"), &Value::Int(1)).is_err());
        assert!(contains(&Value::Int(1), &Value::Int(1)).is_err());
    }

    #[test]
    fn test_truth_and_unary() {
        assert!(!truth(&Value::None).unwrap());
        assert!(!truth(&s("")).unwrap());
        assert!(truth(&Value::Seq(vec![Value::None])).unwrap());
        assert!(!truth(&Value::Float(0.0)).unwrap());
        assert!(not(&Value::Int(0)).unwrap());
        assert_eq!(neg(&Value::Int(3)).unwrap(), Value::Int(-3));
        assert_eq!(pos(&Value::Float(1.5)).unwrap(), Value::Float(1.5));
        assert_matches!(
            neg(&s("x")),
            Err(RuntimeError::UnsupportedOperand { op: "-", .. })
        );
    }

    #[test]
    fn test_string_and_sequence_ordering() {
        assert_eq!(lt(&s("a"), &s("b")).unwrap(), Value::Bool(true));
        assert_eq!(gt(&s("b"), &s("abc")).unwrap(), Value::Bool(true));
        assert_eq!(
            lt(
                &Value::Seq(vec![Value::Int(1), Value::Int(2)]),
                &Value::Seq(vec![Value::Int(1), Value::Int(3)])
            )
            .unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            ge(&Value::Seq(vec![Value::Int(1)]), &Value::Seq(vec![Value::Int(1)])).unwrap(),
            Value::Bool(true)
        );
    }
}
