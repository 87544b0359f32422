//! Instructions - `[method, argument]` directives sent to components.
//!
//! On the wire an instruction list is a JSON array of pairs:
//!
//! ```text
//! [["append", {"scope": "post", "id": "3"}], ["revert"]]
//! ```
//!
//! The argument is optional and defaults to `null`.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::ComponentError;

/// One method call to run on a component.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Vec<Value>")]
pub struct Instruction {
    pub method: String,
    pub arg: Value,
}

impl Instruction {
    pub fn new(method: impl Into<String>, arg: Value) -> Self {
        Self {
            method: method.into(),
            arg,
        }
    }

    /// Instruction without an argument.
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Value::Null)
    }
}

impl TryFrom<Vec<Value>> for Instruction {
    type Error = ComponentError;

    fn try_from(parts: Vec<Value>) -> Result<Self, Self::Error> {
        let mut parts = parts.into_iter();
        let method = match parts.next() {
            Some(Value::String(method)) => method,
            Some(other) => {
                return Err(ComponentError::MalformedInstruction(format!(
                    "method must be a string, got {other}"
                )));
            }
            None => {
                return Err(ComponentError::MalformedInstruction("empty instruction".into()));
            }
        };
        let arg = parts.next().unwrap_or(Value::Null);
        if parts.next().is_some() {
            return Err(ComponentError::MalformedInstruction(format!(
                "`{method}` takes a single argument"
            )));
        }
        Ok(Self { method, arg })
    }
}

impl Serialize for Instruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.arg {
            Value::Null => (&self.method,).serialize(serializer),
            arg => (&self.method, arg).serialize(serializer),
        }
    }
}
