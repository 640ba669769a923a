use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// In-process cache for single-instance deployments and tests.
///
/// Entries carry an absolute deadline and are dropped lazily on read, so no
/// background sweeper is needed. Safe for concurrent requests: the map is
/// behind a mutex and each operation is a single critical section.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, StoredValue>>>,
}

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    deadline: Instant,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match entries.get(key) {
            Some(stored) if stored.deadline > Instant::now() => Some(stored.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set_string_with_ttl(&self, key: &str, value: &str, ttl: Duration) {
        let stored = StoredValue {
            value: value.to_string(),
            deadline: Instant::now() + ttl,
        };
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(key.to_string(), stored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_before_deadline() {
        let cache = MemoryCache::new();
        cache.set_string_with_ttl("k", "v", Duration::from_secs(5));
        assert_eq!(cache.get_string("k").as_deref(), Some("v"));
    }

    #[test]
    fn expired_entry_is_removed_on_read() {
        let cache = MemoryCache::new();
        cache.set_string_with_ttl("k", "v", Duration::from_millis(0));
        assert!(cache.get_string("k").is_none());
        assert!(cache.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn overwrite_replaces_value_and_deadline() {
        let cache = MemoryCache::new();
        cache.set_string_with_ttl("k", "old", Duration::from_secs(5));
        cache.set_string_with_ttl("k", "new", Duration::from_secs(5));
        assert_eq!(cache.get_string("k").as_deref(), Some("new"));
    }
}
