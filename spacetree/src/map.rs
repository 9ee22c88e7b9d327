//! Thread-safe associative storage, used to memoize oracle evaluations
use crate::types::Point;
use ordered_float::OrderedFloat;
use std::{collections::HashMap, hash::Hash, sync::Mutex};

/// A hash map guarded by a single lock
///
/// Every operation takes the lock for its own duration; there is no sharding.
#[derive(Debug)]
pub struct ThreadSafeMap<K, V> {
    inner: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for ThreadSafeMap<K, V> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> ThreadSafeMap<K, V> {
    /// Builds an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a value by key, returning a copy
    pub fn find(&self, k: &K) -> Option<V> {
        self.inner.lock().unwrap().get(k).cloned()
    }

    /// Inserts a value only if the key is absent
    ///
    /// Returns `true` if the value was inserted.
    pub fn emplace(&self, k: K, v: V) -> bool {
        let mut map = self.inner.lock().unwrap();
        if map.contains_key(&k) {
            false
        } else {
            map.insert(k, v);
            true
        }
    }

    /// Inserts a value, returning the previous one (if any)
    pub fn insert(&self, k: K, v: V) -> Option<V> {
        self.inner.lock().unwrap().insert(k, v)
    }

    /// Returns the cached value for `k`, computing it on a miss
    ///
    /// `f` runs without the lock held, so concurrent callers may compute the
    /// same key more than once; only the first result is stored, and every
    /// caller receives the stored value.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&self, k: K, f: F) -> V {
        if let Some(v) = self.find(&k) {
            return v;
        }
        let v = f();
        self.inner.lock().unwrap().entry(k).or_insert(v).clone()
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Checks whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> ThreadSafeMap<K, V> {
    /// Returns a copy of every entry, in arbitrary order
    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Key type for a [`TargetMap`]: a point compared by exact bit pattern
pub type PointKey<const D: usize> = [OrderedFloat<f64>; D];

/// Converts a point into a hashable map key
pub fn point_key<const D: usize>(p: &Point<D>) -> PointKey<D> {
    std::array::from_fn(|i| OrderedFloat(p[i]))
}

/// Memoized oracle values, keyed by sample position
///
/// Points are compared exactly, so only samples at bit-identical positions
/// share an entry.
pub type TargetMap<const D: usize, V> = ThreadSafeMap<PointKey<D>, V>;

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[test]
    fn emplace_keeps_first() {
        let m = ThreadSafeMap::new();
        assert!(m.is_empty());
        assert!(m.emplace(1, "a"));
        assert!(!m.emplace(1, "b"));
        assert_eq!(m.find(&1), Some("a"));
        assert_eq!(m.insert(1, "c"), Some("a"));
        assert_eq!(m.find(&1), Some("c"));
        assert_eq!(m.find(&2), None);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn get_or_insert_with_caches() {
        let m = ThreadSafeMap::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let v = m.get_or_insert_with("k", || {
                calls.fetch_add(1, Ordering::Relaxed);
                42
            });
            assert_eq!(v, 42);
        }
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn point_keys() {
        let m: TargetMap<2, f64> = TargetMap::new();
        m.insert(point_key(&Point::<2>::new(0.5, 1.0)), 3.0);
        assert_eq!(m.find(&point_key(&Point::<2>::new(0.5, 1.0))), Some(3.0));
        let near = Point::<2>::new(0.5, 1.0 + 1e-12);
        assert_eq!(m.find(&point_key(&near)), None);
    }

    #[test]
    fn concurrent_emplace() {
        let m = Arc::new(ThreadSafeMap::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let m = m.clone();
                std::thread::spawn(move || {
                    (0..100).filter(|i| m.emplace(*i, t)).count()
                })
            })
            .collect();
        let inserted: usize =
            handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(inserted, 100);
        assert_eq!(m.len(), 100);
        assert_eq!(m.snapshot().len(), 100);
    }
}
