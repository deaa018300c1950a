use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Well-known view keys used by the invalidation hook.
pub mod views {
    /// Dashboard analytics summary.
    pub const DASHBOARD: &str = "dashboard";
    /// Prefix covering every order view: list pages and per-order details.
    pub const ORDERS: &str = "orders";

    /// One unfiltered page of the order list.
    pub fn orders_page(page: u64, limit: u64) -> String {
        format!("orders?page={page}&limit={limit}")
    }

    /// Order detail view for one order.
    pub fn order_detail(id: &uuid::Uuid) -> String {
        format!("orders/{id}")
    }
}

struct CachedView {
    value: Value,
    cached_at: Instant,
}

/// Small read-through cache for rendered view payloads, keyed by view path.
///
/// Writes invalidate the views they affect synchronously, so a read that
/// follows a write in program order always sees fresh data. Entries also
/// expire after a TTL as a backstop.
#[derive(Clone)]
pub struct ViewCache {
    entries: Arc<DashMap<String, CachedView>>,
    ttl: Duration,
}

impl ViewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        if entry.cached_at.elapsed() > self.ttl {
            drop(entry);
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn put(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(
            key.into(),
            CachedView {
                value,
                cached_at: Instant::now(),
            },
        );
    }

    /// Marks one view stale. Unknown keys are a no-op: callers name every view
    /// affected by a write whether or not it is currently cached.
    pub fn invalidate(&self, key: &str) {
        if self.entries.remove(key).is_some() {
            debug!(view = %key, "view cache invalidated");
        }
    }

    /// Marks every view under a key prefix stale. Writes that touch a whole
    /// resource use this to drop its list pages and details in one pass.
    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries.retain(|key, _| !key.starts_with(prefix));
        debug!(prefix = %prefix, "view cache prefix invalidated");
    }
}
