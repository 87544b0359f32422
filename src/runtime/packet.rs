//! Packets - what the messaging transport hands to `push`.
//!
//! ```text
//! {"channel": "posts", "payload": {"instruct": [["append", {...}]]}}
//! {"channel": "posts", "payload": {"anything": "else"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::component::Instruction;
use crate::error::Result;

/// A message addressed to one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub channel: String,
    #[serde(default)]
    pub payload: Value,
}

impl Packet {
    pub fn new(channel: impl Into<String>, payload: Value) -> Self {
        Self {
            channel: channel.into(),
            payload,
        }
    }

    /// Packet whose payload is an instruction list.
    pub fn instruct(channel: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self::new(channel, json!({ "instruct": instructions }))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// The decoded instruction list, if the payload carries a non-null
    /// `instruct` member.
    pub fn instructions(&self) -> Option<Result<Vec<Instruction>>> {
        let raw = self.payload.get("instruct").filter(|v| !v.is_null())?;
        Some(Vec::<Instruction>::deserialize(raw).map_err(Into::into))
    }
}
