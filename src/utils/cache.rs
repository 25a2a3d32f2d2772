use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Cached<V> {
    value: V,
    timestamp: Instant,
}

/// In-process cache with a fixed time-to-live per entry.
/// Expired entries are dropped on read. A restart clears everything.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Cached<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_seconds),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(cached) if cached.timestamp.elapsed() < self.ttl => {
                log::debug!("📦 Cache hit for {} (age: {}s)", key, cached.timestamp.elapsed().as_secs());
                Some(cached.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: &str, value: V) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                Cached {
                    value,
                    timestamp: Instant::now(),
                },
            );
            log::debug!("💾 Cached {}", key);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_returns_fresh_value() {
        let cache = TtlCache::new(60);
        cache.set("stock_TCS", 3678.90);
        assert_eq!(cache.get("stock_TCS"), Some(3678.90));
        assert_eq!(cache.get("stock_INFY"), None);
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = TtlCache::new(0);
        cache.set("commodities", vec![1, 2, 3]);
        assert_eq!(cache.get("commodities"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = TtlCache::new(60);
        cache.set("a", 1);
        cache.set("b", 2);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
