use serde::{Deserialize, Serialize};
use std::fmt;

/// Extension and handler priority. Higher values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(pub i32);

impl Priority {
    pub const CRITICAL: Priority = Priority(1_000_000);
    pub const HIGHEST: Priority = Priority(100_000);
    pub const HIGH: Priority = Priority(10_000);
    pub const MEDIUM: Priority = Priority(1_000);
    pub const DEFAULT: Priority = Priority(100);
    pub const LOW: Priority = Priority(10);
    pub const LOWEST: Priority = Priority(0);
}

impl Default for Priority {
    fn default() -> Self {
        Priority::DEFAULT
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Priority(value)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
