//! Generation-stamped factory lists and caches.
//!
//! A [`FactoryChain`] holds an immutable, versioned list of factories behind
//! an [`ArcSwap`]. Readers take a snapshot and iterate it without locking;
//! writers install a new version with one more factory at the front.
//!
//! A [`GenerationCache`] remembers resolved mappers together with the
//! generation they were built under. An entry whose stamp no longer matches
//! the current generation is treated as absent, so a mapper built
//! concurrently with a registration can never be served afterwards.

use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rowmap_core::TypeDescriptor;

/// One immutable version of a factory list, highest priority first.
pub(crate) struct FactoryList<F: ?Sized> {
    pub generation: u64,
    pub factories: Vec<Arc<F>>,
}

/// Versioned, copy-on-write list of factories.
pub(crate) struct FactoryChain<F: ?Sized> {
    current: ArcSwap<FactoryList<F>>,
}

impl<F: ?Sized> FactoryChain<F> {
    pub fn new() -> Self {
        Self::from_factories(Vec::new())
    }

    /// Chain starting at generation 0 with `factories`, highest priority
    /// first.
    pub fn from_factories(factories: Vec<Arc<F>>) -> Self {
        Self {
            current: ArcSwap::from_pointee(FactoryList {
                generation: 0,
                factories,
            }),
        }
    }

    /// Current version of the list.
    pub fn load(&self) -> Arc<FactoryList<F>> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }

    pub fn len(&self) -> usize {
        self.current.load().factories.len()
    }

    /// Install a new version with `factory` in front. Returns the new
    /// generation.
    pub fn push_front(&self, factory: Arc<F>) -> u64 {
        loop {
            let cur = self.current.load_full();
            let mut factories = Vec::with_capacity(cur.factories.len() + 1);
            factories.push(factory.clone());
            factories.extend(cur.factories.iter().cloned());

            let generation = cur.generation + 1;
            let next = Arc::new(FactoryList {
                generation,
                factories,
            });
            let prev = self.current.compare_and_swap(&cur, next);
            if Arc::ptr_eq(&prev, &cur) {
                return generation;
            }
        }
    }

    /// Independent chain starting from `list`.
    pub fn fork(list: Arc<FactoryList<F>>) -> Self {
        Self {
            current: ArcSwap::new(list),
        }
    }
}

/// Version stamp of a cache entry.
pub(crate) trait Stamp: Copy + PartialEq {
    /// Whether a value built under `self` may replace one built under
    /// `other`.
    fn supersedes(self, other: Self) -> bool;
}

impl Stamp for u64 {
    fn supersedes(self, other: Self) -> bool {
        self > other
    }
}

// Row entries are stamped with (row generation, column generation). Neither
// half may move backwards.
impl Stamp for (u64, u64) {
    fn supersedes(self, other: Self) -> bool {
        self != other && self.0 >= other.0 && self.1 >= other.1
    }
}

struct Stamped<V, S> {
    stamp: S,
    value: V,
}

/// Concurrent map from descriptor to a value built under stamp `S`.
pub(crate) struct GenerationCache<V, S> {
    entries: DashMap<TypeDescriptor, Stamped<V, S>>,
}

impl<V: Clone, S: Stamp> GenerationCache<V, S> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Cached value for `ty`, if it was built under `stamp`.
    pub fn get(&self, ty: &TypeDescriptor, stamp: S) -> Option<V> {
        let entry = self.entries.get(ty)?;
        let stamped = entry.value();
        (stamped.stamp == stamp).then(|| stamped.value.clone())
    }

    /// Store `value` for `ty` and return the value that is now cached.
    ///
    /// When another resolver already stored a value under the same stamp,
    /// that value is kept and returned, so concurrent resolvers of one type
    /// converge on a single instance. A value built under an older stamp
    /// never replaces a newer entry; it is handed back uncached.
    pub fn insert(&self, ty: &TypeDescriptor, stamp: S, value: V) -> V {
        match self.entries.entry(ty.clone()) {
            Entry::Occupied(entry) if entry.get().stamp == stamp => entry.get().value.clone(),
            Entry::Occupied(mut entry) if stamp.supersedes(entry.get().stamp) => {
                entry.insert(Stamped {
                    stamp,
                    value: value.clone(),
                });
                value
            }
            Entry::Occupied(_) => value,
            Entry::Vacant(entry) => {
                entry.insert(Stamped {
                    stamp,
                    value: value.clone(),
                });
                value
            }
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, including stale ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Copy of the entries built under `stamp`.
    pub fn snapshot(&self, stamp: S) -> Self {
        let entries = DashMap::new();
        for entry in self.entries.iter() {
            let stamped = entry.value();
            if stamped.stamp == stamp {
                entries.insert(
                    entry.key().clone(),
                    Stamped {
                        stamp,
                        value: stamped.value.clone(),
                    },
                );
            }
        }
        Self { entries }
    }
}
