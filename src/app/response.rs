//! Structured command responses.
//!
//! A [`Response`] is a status plus an *ordered* list of fields.  It is
//! rendered as a flat JSON object with `status` first, then the fields in
//! insertion order:
//!
//! ```text
//! {"status":"ok","relay":"ON"}
//! {"status":"error","message":"Unknown command: FOO:BAR"}
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
    /// Presence / full status report.
    Online,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Online => "online",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: Status,
    fields: Vec<(&'static str, Value)>,
}

impl Response {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            fields: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(Status::Ok)
    }

    pub fn online() -> Self {
        Self::new(Status::Online)
    }

    /// `status=error` with a human-readable `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error).with("message", message.into())
    }

    /// Append a field.  Keys are not deduplicated; callers add each once.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status != Status::Error
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(&'static str, Value)] {
        &self.fields
    }

    /// Wire form.
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("response serialisation failed: {}", e);
                format!("{{\"status\":\"{}\"}}", self.status.as_str())
            }
        }
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("status", self.status.as_str())?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
