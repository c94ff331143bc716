//! Placeholder values produced when a lookup fails
//!
//! Four flavours share one shape and differ only in how they react to
//! coercions and operators:
//!
//! - `Lenient` is falsy, renders as an empty string and fails on arithmetic.
//! - `Strict` fails on nearly everything, including truth tests and rendering.
//! - `Debug` renders a `{{ ... }}` diagnostic instead of an empty string.
//! - `Chainable` returns itself from attribute and item access.

use super::error::{RuntimeError, RuntimeResult};
use super::operator::{BinaryOperator, UnaryOperator};
use super::value::{Object, Value};
use crate::logging::{codes, LogEvent, Logger};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UndefinedKind {
    Lenient,
    Strict,
    Debug,
    Chainable,
}

impl UndefinedKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Lenient => "Undefined",
            Self::Strict => "StrictUndefined",
            Self::Debug => "DebugUndefined",
            Self::Chainable => "ChainableUndefined",
        }
    }
}

/// What the failed lookup was performed on
#[derive(Debug, Clone)]
pub enum UndefinedSource {
    /// Top-level name that does not exist
    Missing,
    /// Attribute or item lookup on an existing value
    Object(Box<Value>),
}

pub type ErrorFactory = Arc<dyn Fn(String) -> RuntimeError + Send + Sync>;

#[derive(Clone)]
pub struct Undefined {
    kind: UndefinedKind,
    hint: Option<String>,
    source: UndefinedSource,
    name: Option<String>,
    error_factory: ErrorFactory,
    logger: Option<Arc<dyn Logger>>,
}

impl fmt::Debug for Undefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Undefined")
            .field("kind", &self.kind)
            .field("hint", &self.hint)
            .field("source", &self.source)
            .field("name", &self.name)
            .field("has_logger", &self.logger.is_some())
            .finish()
    }
}

impl Undefined {
    pub fn new(kind: UndefinedKind) -> Self {
        Self {
            kind,
            hint: None,
            source: UndefinedSource::Missing,
            name: None,
            error_factory: Arc::new(|message: String| RuntimeError::undefined(message)),
            logger: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_object(mut self, object: Value) -> Self {
        self.source = UndefinedSource::Object(Box::new(object));
        self
    }

    pub fn with_error_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(String) -> RuntimeError + Send + Sync + 'static,
    {
        self.error_factory = Arc::new(factory);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn kind(&self) -> UndefinedKind {
        self.kind
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> &UndefinedSource {
        &self.source
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn object_type_name(&self) -> &str {
        match &self.source {
            UndefinedSource::Missing => "missing",
            UndefinedSource::Object(object) => object.type_name(),
        }
    }

    /// Message carried by every error this value raises
    pub fn message(&self) -> String {
        if let Some(hint) = &self.hint {
            return hint.clone();
        }

        match (&self.source, &self.name) {
            (UndefinedSource::Missing, Some(name)) => format!("'{}' is undefined", name),
            (UndefinedSource::Missing, None) => "None is undefined".to_string(),
            (UndefinedSource::Object(_), None) => {
                format!("'{}' has no element 'None'", self.object_type_name())
            }
            (UndefinedSource::Object(_), Some(name)) => {
                format!("'{}' has no attribute '{}'", self.object_type_name(), name)
            }
        }
    }

    /// Build the error for this value, logging it when a sink is attached
    pub fn fail(&self) -> RuntimeError {
        let error = (self.error_factory)(self.message());
        if let Some(logger) = &self.logger {
            logger.log(
                &LogEvent::error(
                    codes::runtime::UNDEFINED_VALUE,
                    &format!("Template variable error: {}", error),
                )
                .with_context("undefined", self.type_name()),
            );
        }
        error
    }

    fn log_coercion(&self) {
        if let Some(logger) = &self.logger {
            logger.log(
                &LogEvent::warning_with_code(
                    codes::runtime::UNDEFINED_COERCION,
                    &format!("Template variable warning: {}", self.message()),
                )
                .with_context("undefined", self.type_name()),
            );
        }
    }

    fn is_strict(&self) -> bool {
        self.kind == UndefinedKind::Strict
    }

    fn debug_reason(&self) -> String {
        if let Some(hint) = &self.hint {
            return hint.clone();
        }
        let name = self.name.as_deref().unwrap_or("None");
        match &self.source {
            UndefinedSource::Missing => name.to_string(),
            UndefinedSource::Object(object) => {
                format!("no such element: '{}' [{}]", object.type_name(), name)
            }
        }
    }

    /// String coercion
    pub fn render(&self) -> RuntimeResult<String> {
        match self.kind {
            UndefinedKind::Strict => Err(self.fail()),
            UndefinedKind::Debug => {
                self.log_coercion();
                Ok(format!("{{{{ {} }}}}", self.debug_reason()))
            }
            UndefinedKind::Lenient | UndefinedKind::Chainable => {
                self.log_coercion();
                Ok(String::new())
            }
        }
    }

    pub fn truth(&self) -> RuntimeResult<bool> {
        if self.is_strict() {
            return Err(self.fail());
        }
        self.log_coercion();
        Ok(false)
    }

    pub fn length(&self) -> RuntimeResult<usize> {
        if self.is_strict() {
            return Err(self.fail());
        }
        Ok(0)
    }

    pub fn iterate(&self) -> RuntimeResult<Vec<Value>> {
        if self.is_strict() {
            return Err(self.fail());
        }
        Ok(Vec::new())
    }

    /// Equal only to another undefined of the same flavour
    pub fn equals(&self, other: &Value) -> RuntimeResult<bool> {
        if self.is_strict() {
            return Err(self.fail());
        }
        Ok(matches!(other, Value::Undefined(u) if u.kind == self.kind))
    }

    pub fn hash_code(&self) -> RuntimeResult<u64> {
        if self.is_strict() {
            return Err(self.fail());
        }
        let mut hasher = DefaultHasher::new();
        self.kind.hash(&mut hasher);
        Ok(hasher.finish())
    }

    pub fn contains(&self, _item: &Value) -> RuntimeResult<bool> {
        if self.is_strict() {
            return Err(self.fail());
        }
        Ok(false)
    }

    pub fn get_attr(&self, _name: &str) -> RuntimeResult<Value> {
        if self.kind == UndefinedKind::Chainable {
            return Ok(Value::Undefined(self.clone()));
        }
        Err(self.fail())
    }

    pub fn get_item(&self, _key: &Value) -> RuntimeResult<Value> {
        if self.kind == UndefinedKind::Chainable {
            return Ok(Value::Undefined(self.clone()));
        }
        Err(self.fail())
    }

    pub fn call(&self, _args: &[Value]) -> RuntimeResult<Value> {
        Err(self.fail())
    }
}

impl Object for Undefined {
    fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    fn binary_op(
        &self,
        op: BinaryOperator,
        other: &Value,
        _reflected: bool,
    ) -> Option<RuntimeResult<Value>> {
        let result = match op {
            BinaryOperator::Eq => self.equals(other).map(Value::Bool),
            BinaryOperator::Ne => self.equals(other).map(|equal| Value::Bool(!equal)),
            _ => Err(self.fail()),
        };
        Some(result)
    }

    fn unary_op(&self, _op: UnaryOperator) -> Option<RuntimeResult<Value>> {
        Some(Err(self.fail()))
    }

    fn truth(&self) -> Option<RuntimeResult<bool>> {
        Some(Undefined::truth(self))
    }

    fn contains(&self, item: &Value) -> Option<RuntimeResult<bool>> {
        Some(Undefined::contains(self, item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::service::create_test_logger;
    use crate::runtime::operator;
    use assert_matches::assert_matches;

    fn missing(kind: UndefinedKind, name: &str) -> Undefined {
        Undefined::new(kind).with_name(name)
    }

    #[test]
    fn test_message_branches() {
        assert_eq!(
            Undefined::new(UndefinedKind::Lenient).with_hint("custom").message(),
            "custom"
        );
        assert_eq!(
            missing(UndefinedKind::Lenient, "user").message(),
            "'user' is undefined"
        );
        assert_eq!(
            Undefined::new(UndefinedKind::Lenient).message(),
            "None is undefined"
        );
        assert_eq!(
            Undefined::new(UndefinedKind::Lenient)
                .with_object(Value::Int(1))
                .message(),
            "'int' has no element 'None'"
        );
        assert_eq!(
            Undefined::new(UndefinedKind::Lenient)
                .with_object(Value::Map(vec![]))
                .with_name("title")
                .message(),
            "'dict' has no attribute 'title'"
        );
    }

    #[test]
    fn test_lenient_coercions() {
        let undefined = missing(UndefinedKind::Lenient, "x");

        assert_eq!(undefined.render().unwrap(), "");
        assert!(!undefined.truth().unwrap());
        assert_eq!(undefined.length().unwrap(), 0);
        assert!(undefined.iterate().unwrap().is_empty());
        assert!(!undefined.contains(&Value::Int(1)).unwrap());
        assert!(undefined.hash_code().is_ok());
        assert_matches!(undefined.get_attr("y"), Err(RuntimeError::Undefined { .. }));
        assert_matches!(undefined.call(&[]), Err(RuntimeError::Undefined { .. }));
    }

    #[test]
    fn test_lenient_operators_fail() {
        let value = Value::Undefined(missing(UndefinedKind::Lenient, "x"));

        assert_matches!(
            operator::add(&value, &Value::Int(1)),
            Err(RuntimeError::Undefined { message }) if message == "'x' is undefined"
        );
        assert!(operator::add(&Value::Int(1), &value).is_err());
        assert!(operator::lt(&value, &Value::Int(1)).is_err());
        assert!(operator::neg(&value).is_err());
        assert!(!operator::truth(&value).unwrap());
    }

    #[test]
    fn test_undefined_equality() {
        let a = Value::Undefined(missing(UndefinedKind::Lenient, "a"));
        let b = Value::Undefined(missing(UndefinedKind::Lenient, "b"));
        let strict = Value::Undefined(missing(UndefinedKind::Strict, "c"));

        assert_eq!(operator::eq(&a, &b).unwrap(), Value::Bool(true));
        assert_eq!(operator::eq(&a, &strict).unwrap(), Value::Bool(false));
        assert_eq!(operator::ne(&a, &Value::None).unwrap(), Value::Bool(true));
        assert_eq!(operator::eq(&Value::Int(1), &a).unwrap(), Value::Bool(false));
        assert!(operator::eq(&strict, &a).is_err());
    }

    #[test]
    fn test_strict_fails_everywhere() {
        let undefined = missing(UndefinedKind::Strict, "x");

        assert!(undefined.render().is_err());
        assert!(undefined.truth().is_err());
        assert!(undefined.length().is_err());
        assert!(undefined.iterate().is_err());
        assert!(undefined.hash_code().is_err());
        assert!(undefined.contains(&Value::Int(1)).is_err());
        assert!(undefined.equals(&Value::Int(1)).is_err());
        assert!(operator::contains(&Value::Undefined(undefined), &Value::Int(1)).is_err());
    }

    #[test]
    fn test_debug_rendering() {
        assert_eq!(
            missing(UndefinedKind::Debug, "user").render().unwrap(),
            "{{ user }}"
        );
        assert_eq!(
            Undefined::new(UndefinedKind::Debug)
                .with_hint("no user")
                .render()
                .unwrap(),
            "{{ no user }}"
        );
        assert_eq!(
            Undefined::new(UndefinedKind::Debug)
                .with_object(Value::Seq(vec![]))
                .with_name("name")
                .render()
                .unwrap(),
            "{{ no such element: 'list' [name] }}"
        );
        assert_eq!(
            Undefined::new(UndefinedKind::Debug)
                .with_object(Value::Int(3))
                .render()
                .unwrap(),
            "{{ no such element: 'int' [None] }}"
        );
    }

    #[test]
    fn test_chainable_access() {
        let root = missing(UndefinedKind::Chainable, "a");
        let chained = root
            .get_attr("b")
            .and_then(|value| match value {
                Value::Undefined(inner) => inner.get_item(&Value::Int(0)),
                other => Ok(other),
            })
            .unwrap();

        assert_matches!(&chained, Value::Undefined(u) if u.kind() == UndefinedKind::Chainable);
        if let Value::Undefined(inner) = chained {
            assert_eq!(inner.message(), "'a' is undefined");
        }
        assert!(root.call(&[]).is_err());
    }

    #[test]
    fn test_custom_error_factory() {
        let undefined = missing(UndefinedKind::Strict, "x")
            .with_error_factory(|message| RuntimeError::custom(format!("lookup: {}", message)));

        assert_matches!(
            undefined.truth(),
            Err(RuntimeError::Custom { message }) if message == "lookup: 'x' is undefined"
        );
    }

    #[test]
    fn test_logging_side_effects() {
        let logger = create_test_logger();
        let lenient = missing(UndefinedKind::Lenient, "x").with_logger(logger.clone());

        assert!(!lenient.truth().unwrap());
        assert_eq!(lenient.render().unwrap(), "");
        assert!(logger.has_warning_with_code(codes::runtime::UNDEFINED_COERCION));
        assert_eq!(logger.get_warnings().len(), 2);

        let _ = lenient.call(&[]);
        assert!(logger.has_error_with_code(codes::runtime::UNDEFINED_VALUE));

        let silent = missing(UndefinedKind::Lenient, "y");
        assert!(!silent.truth().unwrap());
        assert_eq!(logger.event_count(), 3);
    }
}
