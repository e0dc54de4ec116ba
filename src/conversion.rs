//! Bidirectional conversions attached to codec nodes, plus the built-ins
//! schema documents can name.
use std::fmt;
use std::sync::Arc;

use crate::ast::{LeafKind, Node};
use crate::error::{Side, TranscodeError};
use crate::value::{self, Value};

/// A pair of pure functions bridging a codec's two sides.
///
/// Errors carry paths relative to the value handed in; the transcoder
/// re-anchors them.
pub trait Conversion: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Encoded-side value → decoded-side value.
    fn decode(&self, input: &Value) -> Result<Value, TranscodeError>;

    /// Decoded-side value → encoded-side value.
    fn encode(&self, input: &Value) -> Result<Value, TranscodeError>;

    /// For conversions that rename object keys: the key that `key`, named
    /// on the opposite side, carries on `side`. `None` means unchanged.
    fn key_on(&self, _key: &str, _side: Side) -> Option<&str> {
        None
    }
}

fn type_mismatch(expected: &'static str, found: &Value) -> TranscodeError {
    TranscodeError::TypeMismatch {
        path: String::new(),
        expected,
        found: found.kind(),
    }
}

// ------------------------------ DateFromString ---------------------------- //

/// RFC 3339 text ⇄ `Value::Date`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFromString;

impl DateFromString {
    pub const NAME: &'static str = "date-from-string";

    pub fn node() -> Node {
        Node::codec(Node::leaf(LeafKind::String), Node::leaf(LeafKind::Date), Arc::new(Self))
    }

    fn parse(&self, src: &str) -> Result<Value, TranscodeError> {
        value::parse_date(src).map(Value::Date).map_err(|error| TranscodeError::Conversion {
            path: String::new(),
            conversion: Self::NAME.to_string(),
            message: format!("`{src}` is not an RFC 3339 timestamp: {error}"),
        })
    }
}

impl Conversion for DateFromString {
    fn name(&self) -> &str { Self::NAME }

    fn decode(&self, input: &Value) -> Result<Value, TranscodeError> {
        match input {
            Value::String(s) => self.parse(s),
            other => Err(type_mismatch("string", other)),
        }
    }

    /// Decoded-side JSON cannot hold a timestamp, so RFC 3339 text is
    /// accepted here as well and normalized.
    fn encode(&self, input: &Value) -> Result<Value, TranscodeError> {
        let date = match input {
            Value::Date(d) => *d,
            Value::String(s) => match self.parse(s)? {
                Value::Date(d) => d,
                other => return Err(type_mismatch("date", &other)),
            },
            other => return Err(type_mismatch("date", other)),
        };
        Ok(Value::String(value::format_date(&date)))
    }
}

// ---------------------------- BooleanFromLiteral -------------------------- //

/// Two string literals ⇄ `Value::Bool`, e.g. `"Y"`/`"N"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanFromLiteral {
    pub truthy: String,
    pub falsy: String,
}

impl BooleanFromLiteral {
    pub const NAME: &'static str = "boolean-from-literal";

    pub fn new(truthy: impl Into<String>, falsy: impl Into<String>) -> Self {
        Self { truthy: truthy.into(), falsy: falsy.into() }
    }

    pub fn yes_no() -> Self { Self::new("Y", "N") }

    pub fn node(self) -> Node {
        Node::codec(Node::leaf(LeafKind::String), Node::leaf(LeafKind::Boolean), Arc::new(self))
    }
}

impl Conversion for BooleanFromLiteral {
    fn name(&self) -> &str { Self::NAME }

    fn decode(&self, input: &Value) -> Result<Value, TranscodeError> {
        match input {
            Value::String(s) if *s == self.truthy => Ok(Value::Bool(true)),
            Value::String(s) if *s == self.falsy => Ok(Value::Bool(false)),
            Value::String(s) => Err(TranscodeError::Conversion {
                path: String::new(),
                conversion: Self::NAME.to_string(),
                message: format!("expected `{}` or `{}`, found `{s}`", self.truthy, self.falsy),
            }),
            other => Err(type_mismatch("string", other)),
        }
    }

    fn encode(&self, input: &Value) -> Result<Value, TranscodeError> {
        match input {
            Value::Bool(true) => Ok(Value::String(self.truthy.clone())),
            Value::Bool(false) => Ok(Value::String(self.falsy.clone())),
            other => Err(type_mismatch("boolean", other)),
        }
    }
}
