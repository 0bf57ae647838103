//! Activity hierarchy resolution.
//!
//! # Responsibility
//! - Expand one root activity into the bounded set of its descendants.
//!
//! # Invariants
//! - The root id is always part of a by-id closure, even if no such row exists.
//! - Expansion stops after `max_depth` tree levels counted from the root, so
//!   parent-chain cycles cannot cause unbounded work.
//! - An unknown root name resolves to an empty set, never an error.

use crate::model::activity::ActivityId;
use crate::repo::directory_repo::{DirectoryStore, RepoResult};
use log::debug;
use std::collections::BTreeSet;

/// Tree levels included in a closure by default: root, children, grandchildren.
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Bounded-depth descendant resolver over a directory store.
pub struct ActivityHierarchy<'store, S: DirectoryStore> {
    store: &'store S,
    max_depth: u32,
}

impl<'store, S: DirectoryStore> ActivityHierarchy<'store, S> {
    /// Creates a resolver using [`DEFAULT_MAX_DEPTH`].
    pub fn new(store: &'store S) -> Self {
        Self::with_max_depth(store, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(store: &'store S, max_depth: u32) -> Self {
        Self { store, max_depth }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Returns `root_id` plus its descendants within `max_depth` levels.
    ///
    /// `max_depth` counts levels including the root: `1` keeps only the
    /// root, `3` adds children and grandchildren. `0` behaves like `1`.
    pub fn closure(&self, root_id: ActivityId) -> RepoResult<BTreeSet<ActivityId>> {
        let mut ids = BTreeSet::from([root_id]);
        let mut frontier = ids.clone();
        let mut level = 1;

        while !frontier.is_empty() && level < self.max_depth {
            frontier = self.store.child_activity_ids(&frontier)?;
            ids.extend(frontier.iter().copied());
            level += 1;
        }

        debug!(
            "event=activity_closure module=hierarchy status=ok root_id={} max_depth={} levels={} size={}",
            root_id,
            self.max_depth,
            level,
            ids.len()
        );
        Ok(ids)
    }

    /// Resolves `name` by exact match, then expands it like [`Self::closure`].
    ///
    /// Returns an empty set when no activity carries that name.
    pub fn closure_by_name(&self, name: &str) -> RepoResult<BTreeSet<ActivityId>> {
        match self.store.activity_by_name(name)? {
            Some(root) => self.closure(root.id),
            None => Ok(BTreeSet::new()),
        }
    }
}
