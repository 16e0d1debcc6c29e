use std::time::Duration;

use moka::future::Cache;
use rand::Rng;

/// Codes live for five minutes, no grace period.
pub const OTP_TTL: Duration = Duration::from_secs(300);

/// Generate a 6-digit one-time code.
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// Time-expiring store for registration codes, keyed `otp_<email>`.
#[derive(Clone)]
pub struct OtpStore {
    cache: Cache<String, String>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::with_ttl(OTP_TTL)
    }

    fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    fn key(email: &str) -> String {
        format!("otp_{email}")
    }

    pub async fn put(&self, email: &str, code: &str) {
        self.cache.insert(Self::key(email), code.to_string()).await;
    }

    /// Exact string comparison against the live entry; a missing or
    /// expired entry never matches.
    pub async fn matches(&self, email: &str, code: &str) -> bool {
        self.cache
            .get(&Self::key(email))
            .await
            .is_some_and(|stored| stored == code)
    }

    pub async fn invalidate(&self, email: &str) {
        self.cache.invalidate(&Self::key(email)).await;
    }
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn stored_code_matches_exactly_once_invalidated() {
        let store = OtpStore::new();
        store.put("a@example.com", "123456").await;

        assert!(store.matches("a@example.com", "123456").await);
        assert!(!store.matches("a@example.com", "654321").await);
        assert!(!store.matches("b@example.com", "123456").await);

        store.invalidate("a@example.com").await;
        assert!(!store.matches("a@example.com", "123456").await);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let store = OtpStore::with_ttl(Duration::from_millis(50));
        store.put("a@example.com", "123456").await;
        assert!(store.matches("a@example.com", "123456").await);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(!store.matches("a@example.com", "123456").await);
    }

    #[tokio::test]
    async fn reissue_overwrites_previous_code() {
        let store = OtpStore::new();
        store.put("a@example.com", "111111").await;
        store.put("a@example.com", "222222").await;

        assert!(!store.matches("a@example.com", "111111").await);
        assert!(store.matches("a@example.com", "222222").await);
    }
}
