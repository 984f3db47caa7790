//! Per-page session state

/// State that lives for one page session: the last generated key
#[derive(Debug, Clone, Default)]
pub struct Session {
    key_id: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier of the most recent successful generation
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Record a successful generation, replacing any earlier identifier
    pub fn set_key_id(&mut self, key_id: impl Into<String>) {
        self.key_id = Some(key_id.into());
    }

    pub fn has_key(&self) -> bool {
        self.key_id.is_some()
    }
}
