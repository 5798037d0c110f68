use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Key/value store that goes stale as a whole.
///
/// There is a single clock per cache: every `set` touches it, and a `get`
/// made once the lifetime has passed since the last `set` drops the
/// requested key before looking it up. Nothing is evicted in the background.
#[derive(Debug)]
pub struct ExpiringCache<V> {
    lifetime: Duration,
    inner: Mutex<CacheInner<V>>,
}

#[derive(Debug)]
struct CacheInner<V> {
    data: HashMap<String, V>,
    last_update: Instant,
}

impl<V: Clone> ExpiringCache<V> {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            inner: Mutex::new(CacheInner {
                data: HashMap::new(),
                last_update: Instant::now(),
            }),
        }
    }

    pub fn exists(&self, key: &str) -> bool {
        self.inner.lock().data.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();
        if inner.last_update.elapsed() > self.lifetime && inner.data.remove(key).is_some() {
            tracing::info!("Deleted stale key {}", key);
        }
        inner.data.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut inner = self.inner.lock();
        if inner.data.contains_key(&key) {
            tracing::info!("Overwriting cached key {}", key);
        }
        inner.data.insert(key, value);
        inner.last_update = Instant::now();
    }
}
