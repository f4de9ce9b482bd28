// 🔮 Deauth Oracle - "is this memo a recognized deauthorization hash?"
//
// The explorer answers 200 for hashes it knows. A definite "unknown hash"
// (404 / 400) is a negative answer; anything else means we cannot classify
// the mint and the pass must abort.

use crate::error::{ReconcileError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// DeauthOracle - existence check by hash
#[async_trait]
pub trait DeauthOracle: Send + Sync {
    async fn is_deauth_hash(&self, hash: &str) -> Result<bool>;
}

#[async_trait]
impl<T: DeauthOracle + ?Sized> DeauthOracle for Arc<T> {
    async fn is_deauth_hash(&self, hash: &str) -> Result<bool> {
        (**self).is_deauth_hash(hash).await
    }
}

#[async_trait]
impl<'a, T: DeauthOracle + ?Sized> DeauthOracle for &'a T {
    async fn is_deauth_hash(&self, hash: &str) -> Result<bool> {
        (**self).is_deauth_hash(hash).await
    }
}

/// Map the explorer's answer for `/explorer/hashes/{hash}` to a verdict
pub fn verdict(status: StatusCode, hash: &str) -> Result<bool> {
    match status {
        StatusCode::OK => Ok(true),
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Ok(false),
        status => Err(ReconcileError::OracleUnavailable {
            hash: hash.to_string(),
            reason: format!("unexpected status {}", status),
        }),
    }
}

// ============================================================================
// EXPLORER ORACLE (remote)
// ============================================================================

pub struct ExplorerDeauthOracle {
    client: Client,
    base_url: String,
}

impl ExplorerDeauthOracle {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DeauthOracle for ExplorerDeauthOracle {
    async fn is_deauth_hash(&self, hash: &str) -> Result<bool> {
        let url = format!("{}/explorer/hashes/{}", self.base_url, hash);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ReconcileError::OracleUnavailable {
                hash: hash.to_string(),
                reason: e.to_string(),
            })?;

        verdict(response.status(), hash)
    }
}

// ============================================================================
// CACHING WRAPPER
// ============================================================================

/// Remembers every answer so each distinct hash reaches the inner oracle once
pub struct CachingOracle<O> {
    inner: O,
    answers: Mutex<HashMap<String, bool>>,
}

impl<O: DeauthOracle> CachingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            answers: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, hash: &str) -> Option<bool> {
        self.answers
            .lock()
            .ok()
            .and_then(|answers| answers.get(hash).copied())
    }

    pub fn cached_len(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or(0)
    }
}

#[async_trait]
impl<O: DeauthOracle> DeauthOracle for CachingOracle<O> {
    async fn is_deauth_hash(&self, hash: &str) -> Result<bool> {
        if let Some(known) = self.cached(hash) {
            debug!("oracle cache hit for {}", hash);
            return Ok(known);
        }
        let answer = self.inner.is_deauth_hash(hash).await?;
        if let Ok(mut answers) = self.answers.lock() {
            answers.insert(hash.to_string(), answer);
        }
        Ok(answer)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory oracle that counts every lookup
    pub struct FakeOracle {
        known: HashSet<String>,
        failing: HashSet<String>,
        pub calls: AtomicUsize,
    }

    impl FakeOracle {
        pub fn new(known: &[&str]) -> Self {
            FakeOracle {
                known: known.iter().map(|h| h.to_string()).collect(),
                failing: HashSet::new(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing_on(mut self, hash: &str) -> Self {
            self.failing.insert(hash.to_string());
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DeauthOracle for FakeOracle {
        async fn is_deauth_hash(&self, hash: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(hash) {
                return Err(ReconcileError::OracleUnavailable {
                    hash: hash.to_string(),
                    reason: "explorer down".to_string(),
                });
            }
            Ok(self.known.contains(hash))
        }
    }

    #[test]
    fn test_status_verdicts() {
        assert!(verdict(StatusCode::OK, "ab").unwrap());
        assert!(!verdict(StatusCode::NOT_FOUND, "ab").unwrap());
        assert!(!verdict(StatusCode::BAD_REQUEST, "ab").unwrap());

        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::NO_CONTENT,
            StatusCode::MOVED_PERMANENTLY,
        ] {
            match verdict(status, "ab01") {
                Err(ReconcileError::OracleUnavailable { hash, reason }) => {
                    assert_eq!(hash, "ab01");
                    assert!(reason.contains(status.as_str()));
                }
                other => panic!("{} should be fatal, got {:?}", status, other.map_err(|e| e.to_string())),
            }
        }

        println!("✅ Explorer status mapping test passed");
    }

    #[tokio::test]
    async fn test_caching_oracle_queries_once() {
        let fake = Arc::new(FakeOracle::new(&["dead"]));
        let oracle = CachingOracle::new(fake.clone());

        assert!(oracle.is_deauth_hash("dead").await.unwrap());
        assert!(oracle.is_deauth_hash("dead").await.unwrap());
        assert!(!oracle.is_deauth_hash("beef").await.unwrap());
        assert!(!oracle.is_deauth_hash("beef").await.unwrap());

        assert_eq!(fake.call_count(), 2);
        assert_eq!(oracle.cached_len(), 2);

        println!("✅ Oracle cache test passed: {} remote calls", fake.call_count());
    }

    #[tokio::test]
    async fn test_caching_oracle_does_not_cache_failures() {
        let fake = Arc::new(FakeOracle::new(&[]).failing_on("bad"));
        let oracle = CachingOracle::new(fake.clone());

        assert!(oracle.is_deauth_hash("bad").await.is_err());
        assert!(oracle.is_deauth_hash("bad").await.is_err());
        assert_eq!(fake.call_count(), 2);
        assert_eq!(oracle.cached_len(), 0);
    }
}
