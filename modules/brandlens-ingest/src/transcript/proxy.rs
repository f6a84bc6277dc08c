use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Process-wide proxy pool, lazily populated from a public list endpoint.
///
/// Refreshes swap the whole list at once; concurrent refreshes may race and
/// double-fetch, which is harmless. Workers pick a random entry per attempt.
pub struct ProxyPool {
    list_url: String,
    http: reqwest::Client,
    proxies: RwLock<Arc<Vec<String>>>,
}

impl ProxyPool {
    pub fn new(list_url: &str) -> Self {
        Self {
            list_url: list_url.to_string(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            proxies: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Random proxy from the pool, fetching the list first if it's empty.
    /// Returns None when no proxies can be obtained.
    pub async fn pick(&self) -> Option<String> {
        let snapshot = self.proxies.read().await.clone();
        let snapshot = if snapshot.is_empty() {
            self.refresh().await;
            self.proxies.read().await.clone()
        } else {
            snapshot
        };

        if snapshot.is_empty() {
            return None;
        }
        let idx = rand::rng().random_range(0..snapshot.len());
        Some(snapshot[idx].clone())
    }

    async fn refresh(&self) {
        match self.http.get(&self.list_url).send().await {
            Ok(resp) => match resp.text().await {
                Ok(body) => {
                    let list: Vec<String> = body
                        .lines()
                        .map(str::trim)
                        .filter(|l| !l.is_empty())
                        .map(String::from)
                        .collect();
                    info!(count = list.len(), "Refreshed proxy pool");
                    *self.proxies.write().await = Arc::new(list);
                }
                Err(e) => warn!(error = %e, "Failed to read proxy list body"),
            },
            Err(e) => warn!(error = %e, "Failed to fetch proxy list"),
        }
    }

    #[cfg(test)]
    pub(crate) async fn set_proxies(&self, list: Vec<String>) {
        *self.proxies.write().await = Arc::new(list);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pick_from_seeded_pool() {
        let pool = ProxyPool::new("http://localhost:1/proxies");
        pool.set_proxies(vec!["http://1.2.3.4:8080".to_string()]).await;
        assert_eq!(pool.pick().await, Some("http://1.2.3.4:8080".to_string()));
    }

    #[tokio::test]
    async fn empty_pool_and_unreachable_list_yields_none() {
        let pool = ProxyPool::new("http://127.0.0.1:1/proxies");
        assert_eq!(pool.pick().await, None);
    }
}
