use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use super::erp::Product;

struct Entry {
    fetched_at: Instant,
    products: Arc<Vec<Product>>,
}

/// TTL snapshot cache for the ERP catalog. Owned by `AppState` and handed to
/// handlers explicitly; a stale snapshot stays readable so the storefront
/// keeps working while the upstream is down.
pub struct ProductCache {
    ttl: Duration,
    slot: RwLock<Option<Entry>>,
}

impl ProductCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// The current snapshot, if one is within the TTL.
    pub async fn fresh(&self) -> Option<Arc<Vec<Product>>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| Arc::clone(&e.products))
    }

    /// The last snapshot regardless of age.
    pub async fn stale(&self) -> Option<Arc<Vec<Product>>> {
        let slot = self.slot.read().await;
        slot.as_ref().map(|e| Arc::clone(&e.products))
    }

    pub async fn store(&self, products: Vec<Product>) -> Arc<Vec<Product>> {
        let products = Arc::new(products);
        let mut slot = self.slot.write().await;
        *slot = Some(Entry {
            fetched_at: Instant::now(),
            products: Arc::clone(&products),
        });
        products
    }

    pub async fn age(&self) -> Option<Duration> {
        let slot = self.slot.read().await;
        slot.as_ref().map(|e| e.fetched_at.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(code: &str) -> Product {
        Product {
            item_code: code.into(),
            item_name: code.into(),
            item_group: "Nike".into(),
            price: 100.0,
            stock_qty: 5,
            image: String::new(),
            description: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_within_ttl_then_expires() {
        let cache = ProductCache::new(Duration::from_secs(300));
        assert!(cache.fresh().await.is_none());

        cache.store(vec![product("SKU1")]).await;
        assert_eq!(cache.fresh().await.expect("fresh").len(), 1);

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(cache.fresh().await.is_none());
        // stale snapshot survives expiry
        assert_eq!(cache.stale().await.expect("stale").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn store_resets_the_clock() {
        let cache = ProductCache::new(Duration::from_secs(300));
        cache.store(vec![product("SKU1")]).await;
        tokio::time::advance(Duration::from_secs(299)).await;
        cache.store(vec![product("SKU1"), product("SKU2")]).await;
        tokio::time::advance(Duration::from_secs(299)).await;

        let snapshot = cache.fresh().await.expect("fresh");
        assert_eq!(snapshot.len(), 2);
        assert!(cache.age().await.expect("age") >= Duration::from_secs(299));
    }
}
