//! Named, typed fixture registry
//!
//! A [`Registry`] stores fixtures by name and answers "all fixtures of kind K"
//! queries. Fixtures are compared by identity, never by value: two distinct
//! `Arc`s holding equal data are different fixtures, and one `Arc` may be
//! stored under a single name only.
//!
//! Store order is preserved. Re-binding an existing name to another fixture
//! keeps the name's original position.

use crate::config::CollisionPolicy;
use crate::{Error, Result};
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use tracing::debug;

/// A value that can live in a [`Registry`]
pub trait Fixture: Clone + fmt::Debug {
    /// Discriminator checked at store time
    type Kind: Copy + Eq + Hash + fmt::Debug;

    fn kind(&self) -> Self::Kind;

    /// Identity comparison: true only for the very same instance
    fn same(&self, other: &Self) -> bool;
}

/// Compare two `Arc`s by data address, ignoring trait-object metadata
pub fn same_instance<T: ?Sized, U: ?Sized>(a: &std::sync::Arc<T>, b: &std::sync::Arc<U>) -> bool {
    std::ptr::eq(
        std::sync::Arc::as_ptr(a) as *const (),
        std::sync::Arc::as_ptr(b) as *const (),
    )
}

/// Ordered name → fixture map with a secondary kind index
#[derive(Debug)]
pub struct Registry<F: Fixture> {
    entries: IndexMap<String, F>,
    by_kind: HashMap<F::Kind, IndexSet<String>>,
    reserved: HashSet<String>,
    policy: CollisionPolicy,
}

impl<F: Fixture> Default for Registry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fixture> Registry<F> {
    pub fn new() -> Self {
        Self::with_policy(CollisionPolicy::default())
    }

    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            entries: IndexMap::new(),
            by_kind: HashMap::new(),
            reserved: HashSet::new(),
            policy,
        }
    }

    /// Mark a name whose entry can never be destroyed
    pub fn reserve(&mut self, name: impl Into<String>) -> &mut Self {
        self.reserved.insert(name.into());
        self
    }

    /// Bind `fixture` to `name` and reserve the name
    ///
    /// Unlike [`Registry::store`] this cannot fail: whatever `name` held is
    /// replaced, and any other binding of the same instance is dropped.
    pub fn pin(&mut self, name: &str, fixture: F) -> &mut Self {
        if let Some(previous) = self.name_of(&fixture).map(str::to_string) {
            if let Some(removed) = self.entries.shift_remove(&previous) {
                self.unindex(removed.kind(), &previous);
            }
        }
        if let Some(previous) = self.entries.get(name).map(F::kind) {
            self.unindex(previous, name);
        }

        let kind = fixture.kind();
        debug!("Pinning {:?} fixture as {}", kind, name);
        self.entries.insert(name.to_string(), fixture);
        self.by_kind
            .entry(kind)
            .or_default()
            .insert(name.to_string());
        self.reserved.insert(name.to_string());
        self
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// All fixtures of `kind` in store order, minus any identical to a member of `exclude`
    pub fn list(&self, kind: F::Kind, exclude: &[F]) -> Vec<F> {
        let Some(names) = self.by_kind.get(&kind) else {
            return Vec::new();
        };

        let mut positions: Vec<usize> = names
            .iter()
            .filter_map(|name| self.entries.get_index_of(name))
            .collect();
        positions.sort_unstable();

        positions
            .into_iter()
            .filter_map(|i| self.entries.get_index(i).map(|(_, f)| f))
            .filter(|f| !exclude.iter().any(|x| x.same(f)))
            .cloned()
            .collect()
    }

    /// Store `fixture` under `name`, requiring it to be of `kind`
    pub fn store(&mut self, name: &str, fixture: F, kind: F::Kind) -> Result<&mut Self> {
        let found = fixture.kind();
        if found != kind {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: format!("{:?}", kind),
                found: format!("{:?}", found),
            });
        }

        if let Some(existing) = self.name_of(&fixture).map(str::to_string) {
            if existing == name {
                return Ok(self);
            }
            return Err(Error::IdentityConflict {
                name: name.to_string(),
                existing,
            });
        }

        if let Some(previous) = self.entries.get(name).map(F::kind) {
            match self.policy {
                CollisionPolicy::Reject => {
                    return Err(Error::AlreadyExists {
                        kind: format!("{:?}", previous),
                        id: name.to_string(),
                    });
                }
                CollisionPolicy::Replace => {
                    debug!("Replacing {:?} fixture bound to {}", previous, name);
                    self.unindex(previous, name);
                }
            }
        }

        debug!("Storing {:?} fixture as {}", kind, name);
        self.entries.insert(name.to_string(), fixture);
        self.by_kind
            .entry(kind)
            .or_default()
            .insert(name.to_string());
        Ok(self)
    }

    /// Remove the entry holding `fixture`, unless its name is reserved
    pub fn destroy(&mut self, fixture: &F) -> &mut Self {
        let Some(name) = self.name_of(fixture).map(str::to_string) else {
            return self;
        };
        if self.reserved.contains(&name) {
            debug!("Refusing to destroy reserved entry {}", name);
            return self;
        }

        if let Some(removed) = self.entries.shift_remove(&name) {
            debug!("Destroyed {:?} fixture {}", removed.kind(), name);
            self.unindex(removed.kind(), &name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&F> {
        self.entries.get(name)
    }

    /// Name under which this exact instance is stored
    pub fn name_of(&self, fixture: &F) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, stored)| stored.same(fixture))
            .map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, fixture: &F) -> bool {
        self.name_of(fixture).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn unindex(&mut self, kind: F::Kind, name: &str) {
        if let Some(names) = self.by_kind.get_mut(&kind) {
            names.shift_remove(name);
            if names.is_empty() {
                self.by_kind.remove(&kind);
            }
        }
    }
}
