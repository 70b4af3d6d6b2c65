//! Exchange Credentials and Adapter Options
//!
//! The recognized options an adapter is constructed with: an API key pair
//! and the limit-only flag.
//!
//! # Security Model
//!
//! - The secret lives in `Zeroizing` memory and is wiped on drop
//! - `Debug` output never includes the secret
//! - Nothing here is serializable

use std::fmt;
use zeroize::Zeroize;

// =============================================================================
// Exchange Type
// =============================================================================

/// Supported exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    /// Kraken spot
    Kraken,
}

impl Exchange {
    /// Get the exchange name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Kraken => "kraken",
        }
    }

    /// Display name used in logs and snapshots.
    pub fn display_name(&self) -> &'static str {
        match self {
            Exchange::Kraken => "Kraken",
        }
    }

    /// Get the base URL for API calls.
    pub fn base_url(&self) -> &'static str {
        match self {
            Exchange::Kraken => "https://api.kraken.com",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// API credentials (in-memory only, never persisted).
///
/// This struct contains the plaintext credentials and should:
/// - Never be logged
/// - Never be serialized to disk
/// - Be zeroized when dropped
pub struct ApiCredentials {
    /// API Key (public identifier)
    pub api_key: String,
    /// API Secret (base64 private key)
    pub api_secret: zeroize::Zeroizing<String>,
}

impl ApiCredentials {
    /// Create new API credentials.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: zeroize::Zeroizing::new(api_secret.into()),
        }
    }

    /// Whether both halves of the key pair are present.
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl zeroize::Zeroize for ApiCredentials {
    fn zeroize(&mut self) {
        self.api_key.zeroize();
        self.api_secret.zeroize();
    }
}

impl Drop for ApiCredentials {
    fn drop(&mut self) {
        self.zeroize();
    }
}

// =============================================================================
// Exchange Config
// =============================================================================

/// Recognized adapter options.
#[derive(Debug)]
pub struct ExchangeConfig {
    /// Key pair used for private endpoints
    pub credentials: ApiCredentials,
    /// Restrict order placement to limit orders
    pub limit_only: bool,
}

impl ExchangeConfig {
    /// Build from the raw option values.
    pub fn new(
        public_api_key: impl Into<String>,
        private_api_key: impl Into<String>,
        limit_only: bool,
    ) -> Self {
        Self {
            credentials: ApiCredentials::new(public_api_key, private_api_key),
            limit_only,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
