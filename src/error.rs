//! Error taxonomy. Most I/O/device-layer plumbing uses the crate-wide
//! `Result` alias (a boxed `std::error::Error`, as the teacher does);
//! configuration failures get their own small type so `main` can map them
//! to the distinct exit code spec.md §7 assigns them.

use std::fmt;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// A validation or parse failure in CLI flags or the config file.
/// Always exits the process with code 2.
#[derive(Debug, Clone)]
pub struct ConfigError(String);

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConfigError {}
