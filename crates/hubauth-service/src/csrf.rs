//! One-time CSRF tokens for the OAuth redirect flow.
//!
//! A process-wide expiring set: redirect initiation inserts a random
//! token, the callback consumes it exactly once, and entries not consumed
//! within their TTL are evicted. Constructed explicitly and owned by the
//! HTTP-facing state, so tests build a fresh one and tear it down
//! deterministically.

use std::time::Duration;

use moka::future::Cache;
use rand::rngs::OsRng;
use rand::RngCore;

/// Expiring set of outstanding CSRF tokens.
pub struct CsrfTokens {
    cache: Cache<String, ()>,
}

impl CsrfTokens {
    /// Create the set with the given entry lifetime.
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Generate, remember and return a fresh token.
    pub async fn issue(&self) -> String {
        let mut bytes = [0u8; 16];
        OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);
        self.cache.insert(token.clone(), ()).await;
        token
    }

    /// Consume a token, returning whether it was outstanding.
    ///
    /// A token can be consumed at most once, even under concurrent
    /// callers: the removal is atomic, so only one of them observes the
    /// entry. Unknown and expired tokens report `false`.
    pub async fn consume(&self, token: &str) -> bool {
        self.cache.remove(token).await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokens_are_consumed_exactly_once() {
        let tokens = CsrfTokens::new(Duration::from_secs(60));
        let token = tokens.issue().await;
        assert!(tokens.consume(&token).await);
        assert!(!tokens.consume(&token).await);
    }

    #[tokio::test]
    async fn concurrent_consumers_race_for_one_token() {
        let tokens = CsrfTokens::new(Duration::from_secs(60));
        let token = tokens.issue().await;
        let (first, second) = tokio::join!(tokens.consume(&token), tokens.consume(&token));
        assert!(first ^ second, "exactly one consumer may win");
    }

    #[tokio::test]
    async fn unknown_tokens_are_rejected() {
        let tokens = CsrfTokens::new(Duration::from_secs(60));
        assert!(!tokens.consume("never-issued").await);
    }

    #[tokio::test]
    async fn expired_tokens_are_rejected() {
        let tokens = CsrfTokens::new(Duration::from_millis(10));
        let token = tokens.issue().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!tokens.consume(&token).await);
    }

    #[tokio::test]
    async fn issued_tokens_are_distinct() {
        let tokens = CsrfTokens::new(Duration::from_secs(60));
        assert_ne!(tokens.issue().await, tokens.issue().await);
    }
}
