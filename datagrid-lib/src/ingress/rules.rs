//! Ingress rules.

use serde::Deserialize;
use serde::Serialize;

use crate::error::GridError;

/// Matches any origin or any action.
pub const WILDCARD: &str = "*";

/// Actions one origin may perform on a grid.
///
/// # Example
///
/// ```
/// use datagrid_lib::ingress::IngressRule;
///
/// let rule = IngressRule::new("sidebar", ["api.selectRow", "onSelectionChanged"]);
/// assert!(rule.allows("api.selectRow"));
/// assert!(!rule.allows("api.setFilterModel"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    /// Caller grid id, or `*` for every caller.
    pub origin: String,
    /// Allowed actions or wildcard patterns.
    pub permissions: Vec<String>,
}

impl IngressRule {
    pub fn new<I, S>(origin: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origin: origin.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if the rule applies to `origin`.
    pub fn matches_origin(&self, origin: &str) -> bool {
        self.origin == WILDCARD || self.origin == origin
    }

    /// Returns `true` if any permission covers `action`.
    pub fn allows(&self, action: &str) -> bool {
        self.permissions
            .iter()
            .any(|pattern| action_matches(pattern, action))
    }
}

/// Matches an action against a permission pattern.
///
/// `*` matches everything and `prefix.*` matches every action under
/// `prefix.`; anything else must match exactly.
pub fn action_matches(pattern: &str, action: &str) -> bool {
    if pattern == WILDCARD {
        return true;
    }
    match pattern.strip_suffix(".*") {
        Some(prefix) => action
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.')),
        None => pattern == action,
    }
}

/// The ingress rules of one grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngressPolicy {
    rules: Option<Vec<IngressRule>>,
}

impl IngressPolicy {
    /// Allows every origin every action.
    pub fn open() -> Self {
        Self { rules: None }
    }

    /// Allows only what `rules` grant. An empty list denies everything.
    pub fn restricted(rules: Vec<IngressRule>) -> Self {
        Self { rules: Some(rules) }
    }

    /// Wraps an optional rule list as configured on a grid.
    pub fn from_rules(rules: Option<Vec<IngressRule>>) -> Self {
        Self { rules }
    }

    pub fn is_open(&self) -> bool {
        self.rules.is_none()
    }

    /// Returns `true` if `origin` may perform `action`.
    pub fn is_allowed(&self, origin: &str, action: &str) -> bool {
        match &self.rules {
            None => true,
            Some(rules) => rules
                .iter()
                .filter(|rule| rule.matches_origin(origin))
                .any(|rule| rule.allows(action)),
        }
    }

    /// Like [`is_allowed`](Self::is_allowed), logging and returning the
    /// denial as an error.
    pub fn check(&self, origin: &str, action: &str) -> Result<(), GridError> {
        if self.is_allowed(origin, action) {
            return Ok(());
        }
        let error = GridError::denied(origin, action);
        log::warn!("{}", error);
        Err(error)
    }
}
