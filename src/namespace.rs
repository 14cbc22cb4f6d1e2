//! Deterministic key namespacing.
//!
//! Every key sent to the store is qualified as
//! `<name><sep><version><sep>[<origin><sep>]<key>`. The namer is pure:
//! no I/O, no error cases, same output for same input.

/// Builds fully-qualified keys from a fixed tenant identity.
#[derive(Debug, Clone)]
pub struct KeyNamer {
    name: String,
    version: String,
    separator: String,
}

impl KeyNamer {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        separator: impl Into<String>,
    ) -> Self {
        KeyNamer {
            name: name.into(),
            version: version.into(),
            separator: separator.into(),
        }
    }

    /// Qualifies `key` with the tenant identity: `name:version:key`.
    pub fn prefix(&self, key: &str) -> String {
        [self.name.as_str(), self.version.as_str(), key].join(&self.separator)
    }

    /// Scopes `key` under an origin: `origin:key`. Object access composes
    /// this with [`prefix`](Self::prefix), yielding
    /// `name:version:origin:key`.
    pub fn with_origin(&self, origin: &str, key: &str) -> String {
        [origin, key].join(&self.separator)
    }
}
