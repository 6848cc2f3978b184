//! Failure values handed back by platform collaborators, and the one place
//! they are turned into text a user can read.
//!
//! Native bridges do not always fail with a proper error. A gallery plugin
//! may reject with a bare string, a share sheet with an event object that
//! stringifies to `[object Event]`, a filesystem bridge with an empty JSON
//! object. [`Fault`] captures each of those shapes and [`normalize_error`]
//! unwraps them in a fixed order:
//!
//! 1. a non-empty string is used as-is
//! 2. an error's message (its `Display`)
//! 3. the stringified representation, unless it is an opaque object tag or
//!    an empty structure
//! 4. the caller's fallback
//!
//! Every catch site in the crate goes through this function, so a raw
//! platform value never reaches a notice unformatted.

use std::fmt;

/// A failure reported by a collaborator (rasterizer, gallery, filesystem,
/// share sheet, download).
#[derive(Debug)]
pub enum Fault {
    /// The collaborator failed with a plain string.
    Message(String),
    /// A real error value.
    Error(Box<dyn std::error::Error + Send + Sync>),
    /// A bare platform event (load/abort/error) with no message attached.
    Event { kind: String },
    /// A loosely-typed payload from a native bridge.
    Payload(serde_json::Value),
}

impl Fault {
    pub fn message(text: impl Into<String>) -> Self {
        Fault::Message(text.into())
    }

    pub fn event(kind: impl Into<String>) -> Self {
        Fault::Event { kind: kind.into() }
    }

    pub fn error(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Fault::Error(Box::new(err))
    }
}

impl From<std::io::Error> for Fault {
    fn from(err: std::io::Error) -> Self {
        Fault::error(err)
    }
}

impl From<serde_json::Value> for Fault {
    fn from(value: serde_json::Value) -> Self {
        Fault::Payload(value)
    }
}

/// Raw stringification, without any of the unwrapping `normalize_error` does.
/// This is what a naive `String(err)` would have produced.
impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Message(text) => f.write_str(text),
            Fault::Error(err) => write!(f, "{err}"),
            Fault::Event { .. } => f.write_str("[object Event]"),
            Fault::Payload(serde_json::Value::Object(_)) => f.write_str("[object Object]"),
            Fault::Payload(value) => write!(f, "{value}"),
        }
    }
}

/// Generic message used when nothing better can be recovered.
pub const GENERIC_FAILURE: &str = "Operation failed, please try again";

/// Turn any [`Fault`] into a human-readable message.
///
/// Never returns an `[object …]` tag or an empty-structure dump; those fall
/// through to `fallback` (or [`GENERIC_FAILURE`] when `fallback` is blank).
pub fn normalize_error(fault: &Fault, fallback: &str) -> String {
    let fallback = if fallback.trim().is_empty() {
        GENERIC_FAILURE
    } else {
        fallback
    };

    let candidate = match fault {
        Fault::Message(text) => Some(text.trim().to_string()),
        Fault::Error(err) => Some(err.to_string().trim().to_string()),
        // Events carry nothing worth showing
        Fault::Event { .. } => None,
        Fault::Payload(value) => payload_message(value),
    };

    candidate
        .filter(|text| is_presentable(text))
        .unwrap_or_else(|| fallback.to_string())
}

/// `.message` first, then the serialized payload.
fn payload_message(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.trim().to_string()),
        serde_json::Value::Object(map) => match map.get("message") {
            Some(serde_json::Value::String(text)) if !text.trim().is_empty() => {
                Some(text.trim().to_string())
            }
            _ => serde_json::to_string(value).ok(),
        },
        other => serde_json::to_string(other).ok(),
    }
}

fn is_presentable(text: &str) -> bool {
    !text.is_empty()
        && !text.starts_with("[object ")
        && !matches!(text, "{}" | "[]" | "null" | "\"\"" | "undefined")
}
