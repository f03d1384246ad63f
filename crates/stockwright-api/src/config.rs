use std::env;
use std::time::Duration;

/// Connection settings for the persistence service.
///
/// Reads `STOCKWRIGHT_API_URL` and `STOCKWRIGHT_API_TIMEOUT_SECS`, falling back
/// to `http://localhost:8080/api` and a 30 second transport timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix, without a trailing slash.
    pub base_url: String,
    /// Transport-level timeout applied to every request.
    pub timeout: Duration,
}

impl ApiConfig {
    /// The default base URL used when nothing else is configured.
    pub const DEFAULT_URL: &str = "http://localhost:8080/api";

    /// The default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Build a config from the environment.
    pub fn from_env() -> Self {
        let base_url =
            env::var("STOCKWRIGHT_API_URL").unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        let timeout = env::var("STOCKWRIGHT_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Self::DEFAULT_TIMEOUT);
        Self::new(base_url).with_timeout(timeout)
    }

    /// Build a config from an explicit URL (useful for tests and CLI flags).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join an absolute API path (`/products/1`) onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url() {
        let cfg = ApiConfig::new(ApiConfig::DEFAULT_URL);
        assert_eq!(cfg.base_url, "http://localhost:8080/api");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let cfg = ApiConfig::new("http://inventory:9000/api/");
        assert_eq!(cfg.url("/products"), "http://inventory:9000/api/products");
    }

    #[test]
    fn explicit_timeout() {
        let cfg = ApiConfig::new("http://x/api").with_timeout(Duration::from_secs(3));
        assert_eq!(cfg.timeout, Duration::from_secs(3));
    }
}
