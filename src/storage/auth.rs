use std::collections::BTreeSet;

use crate::types::Visibility;

/// Decides whether the caller may read data carrying a visibility label.
///
/// The engine treats implementations as pure predicates: it calls them as often
/// as it needs to and never caches an answer between calls.
pub trait Authorizations: Send + Sync {
    /// Returns `true` when the caller may read `visibility`.
    fn can_read(&self, visibility: &Visibility) -> bool;
}

/// Reads `visibility` through `auth`, treating the empty label as readable
/// without consulting the oracle.
#[inline]
pub fn can_read(visibility: &Visibility, auth: &dyn Authorizations) -> bool {
    visibility.is_empty() || auth.can_read(visibility)
}

/// Grants every label in a fixed set, matched exactly.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AuthorizationSet {
    labels: BTreeSet<String>,
}

impl AuthorizationSet {
    /// Builds a set from labels.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// A set granting only the empty label.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a copy without `label`.
    pub fn without(&self, label: &str) -> Self {
        let mut labels = self.labels.clone();
        labels.remove(label);
        Self { labels }
    }

    /// Granted labels in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Authorizations for AuthorizationSet {
    fn can_read(&self, visibility: &Visibility) -> bool {
        self.labels.contains(visibility.as_str())
    }
}

/// Grants everything. Used by administrative paths such as hard deletes.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl Authorizations for AllowAll {
    fn can_read(&self, _visibility: &Visibility) -> bool {
        true
    }
}
