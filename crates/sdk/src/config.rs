//! Client configuration

use std::time::Duration;

/// Data Manager API URL environment variable
pub const DM_API_URL_ENV: &str = "SQUONK2_DMAPI_URL";
/// Data Manager SSL verification environment variable ("yes" or "no")
pub const DM_API_VERIFY_SSL_CERT_ENV: &str = "SQUONK2_DMAPI_VERIFY_SSL_CERT";
/// Account Server API URL environment variable
pub const AS_API_URL_ENV: &str = "SQUONK2_ASAPI_URL";
/// Account Server SSL verification environment variable ("yes" or "no")
pub const AS_API_VERIFY_SSL_CERT_ENV: &str = "SQUONK2_ASAPI_VERIFY_SSL_CERT";

/// Metadata request timeout (4s)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);
/// File listing timeout (8s)
pub const DEFAULT_LISTING_TIMEOUT: Duration = Duration::from_secs(8);
/// Upload/download timeout, per file (2 minutes)
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-request timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Simple metadata calls
    pub request: Duration,
    /// Project file listings
    pub listing: Duration,
    /// File uploads and downloads
    pub transfer: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: DEFAULT_REQUEST_TIMEOUT,
            listing: DEFAULT_LISTING_TIMEOUT,
            transfer: DEFAULT_TRANSFER_TIMEOUT,
        }
    }
}

/// Configuration for one REST API client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// i.e. `https://example.com/data-manager-api`. Calls fail with
    /// `ApiError::NoApiUrl` until this is set.
    pub base_url: Option<String>,
    pub verify_tls: bool,
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            verify_tls: true,
            timeouts: Timeouts::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    pub fn with_verify_tls(mut self, verify_tls: bool) -> Self {
        self.verify_tls = verify_tls;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Build a configuration from environment variables.
    ///
    /// An unset or empty URL variable leaves the URL undefined.
    /// Verification is on unless the verification variable is set to
    /// something other than "yes".
    pub fn from_env(url_var: &str, verify_var: &str) -> Self {
        Self::from_lookup(url_var, verify_var, |name| std::env::var(name).ok())
    }

    /// Data Manager configuration from `SQUONK2_DMAPI_URL`
    pub fn dm_from_env() -> Self {
        Self::from_env(DM_API_URL_ENV, DM_API_VERIFY_SSL_CERT_ENV)
    }

    /// Account Server configuration from `SQUONK2_ASAPI_URL`
    pub fn as_from_env() -> Self {
        Self::from_env(AS_API_URL_ENV, AS_API_VERIFY_SSL_CERT_ENV)
    }

    fn from_lookup(
        url_var: &str,
        verify_var: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let base_url = lookup(url_var).filter(|url| !url.trim().is_empty());
        let verify_tls = lookup(verify_var)
            .map(|value| is_yes(&value))
            .unwrap_or(true);

        Self {
            base_url,
            verify_tls,
            timeouts: Timeouts::default(),
        }
    }
}

/// "yes" (any case) is true, anything else is false
pub fn is_yes(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}
