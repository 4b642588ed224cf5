//! Opaque, type-tagged entity ids.

use base64::{engine::general_purpose::STANDARD, Engine};

/// A primary key tagged with its type name, encoded as `base64("<type>:<id>")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalId {
    pub type_name: String,
    pub id: String,
}

impl GlobalId {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    pub fn encode(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.type_name, self.id))
    }

    /// Reverse [`GlobalId::encode`]. Returns `None` for anything not produced by it.
    pub fn decode(value: &str) -> Option<Self> {
        let bytes = STANDARD.decode(value).ok()?;
        let text = String::from_utf8(bytes).ok()?;
        let (type_name, id) = text.split_once(':')?;
        if type_name.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(type_name, id))
    }
}
