//! Role Entity
//!
//! A role pairs a unique identifier with an authority name such as `USER`
//! or `ADMIN`. Both fields are fixed at construction. Equality and hashing
//! cover both fields, so two roles are equal only when id and authority
//! match.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in authority names used by the bundled endpoints
pub mod authorities {
    pub const USER: &str = "USER";
    pub const ADMIN: &str = "ADMIN";
}

/// Role definition, stored in the `roles` collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "_id")]
    id: String,

    authority: String,
}

impl Role {
    pub fn new(id: impl Into<String>, authority: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            authority: authority.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.authority, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        assert_eq!(Role::new("1", "USER"), Role::new("1", "USER"));
        assert_ne!(Role::new("1", "USER"), Role::new("2", "USER"));
        assert_ne!(Role::new("1", "USER"), Role::new("1", "ADMIN"));
    }

    #[test]
    fn test_set_membership_is_idempotent() {
        let mut roles = HashSet::new();
        assert!(roles.insert(Role::new("1", "USER")));
        assert!(!roles.insert(Role::new("1", "USER")));
        assert_eq!(roles.len(), 1);
    }

    #[test]
    fn test_document_shape() {
        let doc = bson::to_document(&Role::new("1", "USER")).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), "1");
        assert_eq!(doc.get_str("authority").unwrap(), "USER");

        let back: Role = bson::from_document(doc).unwrap();
        assert_eq!(back.authority(), authorities::USER);
    }
}
