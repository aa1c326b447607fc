//! Authorization Policy
//!
//! Authority checks over the role set already attached to a principal.
//! Matching is exact and case-sensitive. Roles only imply other roles when
//! an implication mapping is supplied at construction, e.g. `ADMIN -> USER`;
//! the mapping is closed transitively up front so checks stay lookups.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::principal::entity::Principal;

#[derive(Debug, Clone, Default)]
pub struct AuthorizationPolicy {
    /// authority -> every authority it implies (transitively, excluding itself)
    implied: HashMap<String, HashSet<String>>,
}

impl AuthorizationPolicy {
    /// Policy with no role hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy with a `{role -> implied roles}` mapping
    pub fn with_implications<I, R, V>(mapping: I) -> Self
    where
        I: IntoIterator<Item = (R, V)>,
        R: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let direct: HashMap<String, Vec<String>> = mapping
            .into_iter()
            .map(|(role, implied)| (role.into(), implied.into_iter().map(Into::into).collect()))
            .collect();

        let implied = direct
            .keys()
            .map(|role| (role.clone(), close_over(role, &direct)))
            .collect();

        Self { implied }
    }

    /// All authorities a principal holds, directly or through implication
    pub fn effective_authorities(&self, principal: &Principal) -> HashSet<String> {
        let mut effective = HashSet::new();
        for authority in principal.authorities() {
            effective.insert(authority.to_string());
            if let Some(implied) = self.implied.get(authority) {
                effective.extend(implied.iter().cloned());
            }
        }
        effective
    }

    /// True iff `required` is held directly or implied by a held role.
    pub fn is_authorized(&self, principal: &Principal, required: &str) -> bool {
        let granted = principal.authorities().any(|held| {
            held == required
                || self
                    .implied
                    .get(held)
                    .is_some_and(|implied| implied.contains(required))
        });

        if !granted {
            debug!(identifier = %principal.identifier(), required, "Authority not held");
        }
        granted
    }

    /// At least one of `authorities`. An empty set grants nothing.
    pub fn require_any<I>(&self, principal: &Principal, authorities: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        authorities
            .into_iter()
            .any(|a| self.is_authorized(principal, a.as_ref()))
    }

    /// Every one of `authorities`. An empty set is trivially satisfied.
    pub fn require_all<I>(&self, principal: &Principal, authorities: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        authorities
            .into_iter()
            .all(|a| self.is_authorized(principal, a.as_ref()))
    }
}

fn close_over(root: &str, direct: &HashMap<String, Vec<String>>) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut stack: Vec<&str> = direct
        .get(root)
        .map(|v| v.iter().map(String::as_str).collect())
        .unwrap_or_default();

    while let Some(role) = stack.pop() {
        if role == root || !seen.insert(role.to_string()) {
            continue;
        }
        if let Some(next) = direct.get(role) {
            stack.extend(next.iter().map(String::as_str));
        }
    }
    seen
}
