//! Type-safe identifiers for stock resources and the callers holding slots in them.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Type-safe identifier for a sales stock (the resource whose slots are allocated).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Type-safe identifier for a claimant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HolderId(pub String);

impl From<&str> for HolderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for HolderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
