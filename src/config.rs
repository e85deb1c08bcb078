use std::time::Duration;

/// Default base URL of the rate API sandbox.
const DEFAULT_API_URL: &str = "http://api-sandbox.oanda.com";
/// Default HTTP request timeout in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Runtime configuration, sourced from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the rate API
    pub api_url: String,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
}

impl Config {
    /// Build a configuration from environment variables.
    ///
    /// `RATES_API_URL` overrides the API base URL and `HTTP_TIMEOUT_SECS`
    /// the request timeout; both fall back to sandbox defaults.
    pub fn from_env() -> Self {
        let api_url =
            std::env::var("RATES_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let http_timeout = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS));

        Self {
            api_url,
            http_timeout,
        }
    }
}
