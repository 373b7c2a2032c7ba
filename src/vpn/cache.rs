use crate::vpn::oracle::VpnOracle;
use anyhow::Result;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const DEFAULT_TTL_SECS: u64 = 60;
const MAX_TTL_SECS: u64 = 3600;
const LOCAL_PRUNE_THRESHOLD: usize = 10_000;
/// Upper bound on each Redis round trip; an expired budget counts as a miss.
const SHARED_TIER_BUDGET: Duration = Duration::from_millis(200);

/// Verdict cache in front of another oracle. The local map is always consulted first; the
/// Redis tier, when configured, shares verdicts between instances. Cache errors only cost a
/// lookup, they never change a verdict.
#[derive(Clone)]
pub struct CachedVpnOracle {
    inner: Arc<dyn VpnOracle>,
    local: Arc<RwLock<HashMap<String, (Instant, bool)>>>,
    redis: Option<redis::Client>,
    ttl: Duration,
}

pub fn clamp_ttl_secs(secs: u64) -> u64 {
    secs.clamp(1, MAX_TTL_SECS)
}

impl CachedVpnOracle {
    pub fn new(inner: Arc<dyn VpnOracle>, ttl_secs: u64) -> Self {
        Self {
            inner,
            local: Arc::new(RwLock::new(HashMap::new())),
            redis: None,
            ttl: Duration::from_secs(clamp_ttl_secs(ttl_secs)),
        }
    }

    pub fn with_redis(mut self, client: redis::Client) -> Self {
        self.redis = Some(client);
        self
    }

    pub fn redis_key(ip: &str) -> String {
        let hash = Sha256::digest(ip.as_bytes());
        let hex: String = hash.iter().map(|b| format!("{:02x}", b)).collect();
        format!("vpn:{}", hex)
    }

    async fn local_get(&self, ip: &str) -> Option<bool> {
        let read = self.local.read().await;
        match read.get(ip) {
            Some((stored_at, verdict)) if stored_at.elapsed() <= self.ttl => Some(*verdict),
            _ => None,
        }
    }

    async fn local_put(&self, ip: &str, verdict: bool) {
        let mut write = self.local.write().await;
        if write.len() >= LOCAL_PRUNE_THRESHOLD {
            let ttl = self.ttl;
            write.retain(|_, (stored_at, _)| stored_at.elapsed() <= ttl);
        }
        write.insert(ip.to_string(), (Instant::now(), verdict));
    }

    async fn shared_get(client: &redis::Client, ip: &str) -> Result<Option<bool>> {
        let lookup = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let stored: Option<String> = conn.get(Self::redis_key(ip)).await?;
            Ok::<_, anyhow::Error>(stored.map(|v| v == "1"))
        };
        tokio::time::timeout(SHARED_TIER_BUDGET, lookup).await?
    }

    async fn shared_put(client: redis::Client, key: String, verdict: bool, ttl_secs: u64) -> Result<()> {
        let write = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let value = if verdict { "1" } else { "0" };
            let _: () = conn.set_ex(key, value, ttl_secs).await?;
            Ok::<_, anyhow::Error>(())
        };
        tokio::time::timeout(SHARED_TIER_BUDGET, write).await?
    }
}

#[async_trait::async_trait]
impl VpnOracle for CachedVpnOracle {
    async fn is_vpn(&self, ip: &str) -> bool {
        if let Some(verdict) = self.local_get(ip).await {
            return verdict;
        }

        if let Some(client) = &self.redis {
            match Self::shared_get(client, ip).await {
                Ok(Some(verdict)) => {
                    self.local_put(ip, verdict).await;
                    return verdict;
                }
                Ok(None) => {}
                Err(e) => tracing::debug!("vpn cache read failed: {}", e),
            }
        }

        let verdict = self.inner.is_vpn(ip).await;
        self.local_put(ip, verdict).await;
        if let Some(client) = &self.redis {
            let (client, key, ttl_secs) = (client.clone(), Self::redis_key(ip), self.ttl.as_secs());
            tokio::spawn(async move {
                if let Err(e) = Self::shared_put(client, key, verdict, ttl_secs).await {
                    tracing::debug!("vpn cache write failed: {}", e);
                }
            });
        }
        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        answer: bool,
    }

    #[async_trait::async_trait]
    impl VpnOracle for Counting {
        async fn is_vpn(&self, _ip: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }

    #[tokio::test]
    async fn repeated_lookups_hit_the_cache() {
        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            answer: true,
        });
        let cached = CachedVpnOracle::new(inner.clone(), 60);
        assert!(cached.is_vpn("93.184.216.34").await);
        assert!(cached.is_vpn("93.184.216.34").await);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        assert!(cached.is_vpn("8.8.8.8").await);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreachable_redis_falls_through_to_the_oracle() {
        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            answer: false,
        });
        let client = redis::Client::open("redis://127.0.0.1:1/").unwrap();
        let cached = CachedVpnOracle::new(inner.clone(), 60).with_redis(client);
        assert!(!cached.is_vpn("93.184.216.34").await);
        assert!(!cached.is_vpn("93.184.216.34").await);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stalled_redis_does_not_hold_the_verdict() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let inner = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            answer: false,
        });
        let client = redis::Client::open(format!("redis://{}/", addr)).unwrap();
        let cached = CachedVpnOracle::new(inner.clone(), 60).with_redis(client);

        let started = Instant::now();
        let verdict = tokio::time::timeout(Duration::from_secs(5), cached.is_vpn("93.184.216.34")).await;
        assert!(matches!(verdict, Ok(false)));
        assert!(started.elapsed() < Duration::from_millis(1500));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn ttl_is_clamped_and_keys_are_hashed() {
        assert_eq!(clamp_ttl_secs(0), 1);
        assert_eq!(clamp_ttl_secs(90_000), 3600);
        let key = CachedVpnOracle::redis_key("1.2.3.4");
        assert!(key.starts_with("vpn:"));
        assert_eq!(key.len(), 4 + 64);
    }
}
