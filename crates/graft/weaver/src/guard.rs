//! Collision guard: visited-member bookkeeping and name-unique insertion.

use std::collections::HashSet;

use graft_model::Member;
use tracing::debug;

/// Key of an interface member already handled within one job.
///
/// Accessor methods claimed by the property and event synthesizers are
/// recorded as [`MemberKey::Method`] so the stub pass leaves them alone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKey {
    Property(String),
    Event(String),
    Method(String),
}

impl MemberKey {
    pub fn property(name: impl Into<String>) -> Self {
        Self::Property(name.into())
    }

    pub fn event(name: impl Into<String>) -> Self {
        Self::Event(name.into())
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::Method(name.into())
    }
}

/// Interface members already handled in the current job.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<MemberKey>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`; returns `false` if it was already visited.
    pub fn claim(&mut self, key: MemberKey) -> bool {
        self.seen.insert(key)
    }

    pub fn contains(&self, key: &MemberKey) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Insertion-time guard for member collections.
pub struct CollisionGuard;

impl CollisionGuard {
    /// Append `member` unless the collection already holds one with the
    /// same name. Returns whether it was inserted.
    pub fn append_unique<T: Member>(collection: &mut Vec<T>, member: T) -> bool {
        if collection.iter().any(|m| m.name() == member.name()) {
            debug!(member = member.name(), "Member already present, not inserted");
            return false;
        }
        collection.push(member);
        true
    }
}
