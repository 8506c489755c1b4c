use parking_lot::RwLock;
use std::collections::HashMap;

/// String-keyed map behind a reader/writer lock
///
/// Readers share the lock; `set`, `delete` and `clear` take it exclusively.
/// `keys` and `values` return snapshot copies, not live views.
#[derive(Debug)]
pub struct GuardedMap<V> {
    data: RwLock<HashMap<String, V>>,
}

impl<V> Default for GuardedMap<V> {
    fn default() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> GuardedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        self.data.write().insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    pub fn get_or_default(&self, key: &str, default: V) -> V {
        self.data.read().get(key).cloned().unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    pub fn delete(&self, key: &str) {
        self.data.write().remove(key);
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.data.read().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<V> {
        self.data.read().values().cloned().collect()
    }

    pub fn clear(&self) {
        self.data.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_map_operations() {
        let map = GuardedMap::new();
        assert!(map.is_empty());

        map.set("a", 1);
        map.set("b", 2);
        map.set("a", 3);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(3));
        assert_eq!(map.get("missing"), None);
        assert_eq!(map.get_or_default("missing", 7), 7);
        assert!(map.has("b"));

        map.delete("b");
        assert!(!map.has("b"));

        map.clear();
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_snapshots_do_not_track_later_writes() {
        let map = GuardedMap::new();
        map.set("x", 1);
        map.set("y", 2);

        let mut keys = map.keys();
        let values = map.values();
        map.set("z", 3);

        keys.sort();
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(values.len(), 2);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_concurrent_writers() {
        let map = Arc::new(GuardedMap::new());

        crossbeam::thread::scope(|s| {
            for worker_id in 0..4 {
                let map = map.clone();
                s.spawn(move |_| {
                    for i in 0..100 {
                        map.set(format!("{worker_id}-{i}"), i);
                    }
                });
            }
        })
        .unwrap();

        assert_eq!(map.len(), 400);
    }
}
