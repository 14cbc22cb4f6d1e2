//! # Client Configuration
//!
//! Purpose: Capture tenant identity and pool tuning in one value that is
//! handed to the client at construction and never mutated afterwards.
//! The separator and settings-key literals live here as explicit fields
//! rather than process-wide globals, so two clients in one process can
//! never observe each other's namespacing rules.

use std::time::Duration;

/// Default separator placed between key components.
pub const DEFAULT_SEPARATOR: &str = ":";

/// Reserved sub-key holding each origin's canonical settings blob.
pub const DEFAULT_SETTINGS_KEY: &str = "settings";

/// Construction-time configuration for [`Client`](crate::Client).
///
/// `name` and `version` identify the tenant and prefix every key this
/// client touches, so two deployments of the same worker at different
/// versions get disjoint key spaces on a shared store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Tenant name, first component of every qualified key.
    pub name: String,
    /// Tenant version, second component of every qualified key.
    pub version: String,
    /// String separating key components. Fixed to `":"` in the stable
    /// design; changing it breaks interoperability with existing keys.
    pub separator: String,
    /// Reserved sub-key used by the settings convenience methods.
    pub settings_key: String,
    /// Maximum idle connections kept for reuse.
    pub max_idle: usize,
    /// Maximum total connections (idle + on loan). 0 means unbounded;
    /// the default is bounded so unlimited growth is an explicit opt-in.
    pub max_active: usize,
    /// Idle connections older than this are discarded on the next borrow.
    pub idle_timeout: Duration,
    /// Optional TCP connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Optional TCP read timeout.
    pub read_timeout: Option<Duration>,
    /// Optional TCP write timeout.
    pub write_timeout: Option<Duration>,
}

impl Config {
    /// Creates a configuration for the given tenant identity with default
    /// pool tuning.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Config {
            name: name.into(),
            version: version.into(),
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: String::new(),
            version: String::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
            settings_key: DEFAULT_SETTINGS_KEY.to_string(),
            max_idle: 3,
            max_active: 16,
            idle_timeout: Duration::from_secs(240),
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
