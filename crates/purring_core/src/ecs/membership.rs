//! # Membership Cache
//!
//! Derived index from a component set to the ordered list of entities
//! holding every type in that set.
//!
//! The `ALL` bucket always exists and lists live entities in creation order.
//! Any other bucket is only built when first asked for, then kept current by
//! the registry after every structural mutation:
//! - an entity is appended to each bucket whose set it newly satisfies
//! - it is removed, order preserved, from each bucket it no longer satisfies
//!
//! The cache is never the source of truth. The registry can rebuild any
//! bucket from entity signatures and compare the two.

use std::collections::HashMap;

use super::entity::EntityId;
use super::signature::ComponentSet;

/// Buckets of entities keyed by component set.
#[derive(Debug)]
pub struct MembershipCache {
    buckets: HashMap<ComponentSet, Vec<EntityId>>,
}

impl Default for MembershipCache {
    fn default() -> Self {
        let mut buckets = HashMap::new();
        buckets.insert(ComponentSet::ALL, Vec::new());
        Self { buckets }
    }
}

impl MembershipCache {
    /// Creates a cache holding only the empty `ALL` bucket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every live entity in creation order.
    #[inline]
    #[must_use]
    pub fn all(&self) -> &[EntityId] {
        self.get(ComponentSet::ALL).unwrap_or(&[])
    }

    /// Returns the bucket for `set` if it has been built.
    #[inline]
    #[must_use]
    pub fn get(&self, set: ComponentSet) -> Option<&[EntityId]> {
        self.buckets.get(&set).map(Vec::as_slice)
    }

    /// Checks if a bucket for `set` exists.
    #[inline]
    #[must_use]
    pub fn is_cached(&self, set: ComponentSet) -> bool {
        self.buckets.contains_key(&set)
    }

    /// Number of buckets, `ALL` included.
    #[inline]
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Iterates over the sets with a built bucket.
    pub fn sets(&self) -> impl Iterator<Item = ComponentSet> + '_ {
        self.buckets.keys().copied()
    }

    /// Returns the bucket for `set`, building it from the `ALL` bucket if missing.
    ///
    /// `satisfies` must report whether an entity holds every type in `set`.
    pub fn get_or_build(
        &mut self,
        set: ComponentSet,
        satisfies: impl FnMut(&EntityId) -> bool,
    ) -> &[EntityId] {
        if !self.buckets.contains_key(&set) {
            let bucket = self.scan(satisfies);
            self.buckets.insert(set, bucket);
        }
        self.get(set).unwrap_or(&[])
    }

    /// Filters the `ALL` bucket without touching the cache.
    #[must_use]
    pub fn scan(&self, satisfies: impl FnMut(&EntityId) -> bool) -> Vec<EntityId> {
        self.all().iter().copied().filter(satisfies).collect()
    }

    /// Replaces the bucket for `set`, returning the previous one.
    pub fn replace(&mut self, set: ComponentSet, bucket: Vec<EntityId>) -> Option<Vec<EntityId>> {
        self.buckets.insert(set, bucket)
    }

    /// Drops the bucket for `set` so it is rebuilt on next request.
    ///
    /// The `ALL` bucket cannot be dropped.
    pub fn invalidate(&mut self, set: ComponentSet) -> bool {
        if set == ComponentSet::ALL {
            return false;
        }
        self.buckets.remove(&set).is_some()
    }

    /// Records a newly created entity.
    pub fn on_create(&mut self, id: EntityId) {
        self.buckets.entry(ComponentSet::ALL).or_default().push(id);
    }

    /// Moves `id` between buckets after its signature went from `old` to `new`.
    pub fn on_change(&mut self, id: EntityId, old: ComponentSet, new: ComponentSet) {
        for (set, bucket) in &mut self.buckets {
            let before = old.is_superset_of(*set);
            let after = new.is_superset_of(*set);
            if after && !before {
                bucket.push(id);
            } else if before && !after {
                if let Some(pos) = bucket.iter().position(|e| *e == id) {
                    bucket.remove(pos);
                }
            }
        }
    }

    /// Purges a destroyed entity whose last signature was `signature`.
    pub fn on_destroy(&mut self, id: EntityId, signature: ComponentSet) {
        for (set, bucket) in &mut self.buckets {
            if signature.is_superset_of(*set) {
                if let Some(pos) = bucket.iter().position(|e| *e == id) {
                    bucket.remove(pos);
                }
            }
        }
    }
}
