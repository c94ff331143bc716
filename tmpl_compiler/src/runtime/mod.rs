//! Dynamic-typing runtime: values, operator dispatch and undefined values

pub mod error;
pub mod operator;
pub mod undefined;
pub mod value;

pub use error::{RuntimeError, RuntimeResult};
pub use operator::{BinaryOperator, UnaryOperator};
pub use undefined::{Undefined, UndefinedKind, UndefinedSource};
pub use value::{Object, Value};
