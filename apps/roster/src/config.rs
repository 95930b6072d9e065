//! # Configuration
//!
//! The clap `serve` arguments are the configuration layer; each flag falls
//! back to a `ROSTER_*` environment variable. [`AppConfig`] is the validated
//! form the server runs with.

use clap::Args;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use thiserror::Error;

/// Minimum HS256 secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("JWT secret must be at least 32 bytes (got {0})")]
    SecretTooShort(usize),

    #[error("JWT expiry must be at least one minute")]
    ZeroExpiry,

    #[error("rate limit must allow at least one request per minute")]
    ZeroRateLimit,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "ROSTER_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Scheme and authority used in generated links (defaults to the request Host).
    #[arg(long, env = "ROSTER_BASE_URL")]
    pub base_url: Option<String>,

    /// HS256 signing secret, at least 32 bytes.
    #[arg(long, env = "ROSTER_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "ROSTER_JWT_ISSUER", default_value = "CompanyEmployees")]
    pub jwt_issuer: String,

    #[arg(long, env = "ROSTER_JWT_AUDIENCE", default_value = "https://localhost:5001")]
    pub jwt_audience: String,

    /// Token lifetime in minutes.
    #[arg(long, env = "ROSTER_JWT_EXPIRES", default_value_t = 60)]
    pub jwt_expires_minutes: u64,

    /// Requests per minute allowed per client IP.
    #[arg(long, env = "ROSTER_RATE_LIMIT", default_value_t = 100)]
    pub rate_limit: u32,

    /// `max-age` for cacheable responses, in seconds. 0 disables the server cache.
    #[arg(long, env = "ROSTER_CACHE_MAX_AGE", default_value_t = 120)]
    pub cache_max_age: u64,

    /// Mark responses `public` and share them through the server-side cache.
    #[arg(long, env = "ROSTER_CACHE_PUBLIC")]
    pub cache_public: bool,

    /// Take the client IP from `X-Forwarded-For` when the peer is a known proxy.
    #[arg(long, env = "ROSTER_TRUST_FORWARDED")]
    pub trust_forwarded: bool,

    /// Proxy addresses allowed to set `X-Forwarded-For`, besides loopback.
    #[arg(long = "known-proxy", env = "ROSTER_KNOWN_PROXIES", value_delimiter = ',')]
    pub known_proxies: Vec<IpAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expires_minutes: u64,
}

/// Where responses may be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLocation {
    Public,
    Private,
}

impl CacheLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub location: CacheLocation,
    pub max_age: u64,
}

impl CachePolicy {
    /// `Cache-Control` header value.
    pub fn header_value(&self) -> String {
        format!(
            "{}, max-age={}, must-revalidate",
            self.location.as_str(),
            self.max_age
        )
    }

    /// Whether responses go into the server-side cache.
    pub fn stores_responses(&self) -> bool {
        self.location == CacheLocation::Public && self.max_age > 0
    }
}

/// Which peers may name the client through `X-Forwarded-For`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedTrust {
    pub enabled: bool,
    pub known_proxies: Vec<IpAddr>,
}

impl ForwardedTrust {
    pub fn trusts(&self, peer: IpAddr) -> bool {
        self.enabled && (peer.is_loopback() || self.known_proxies.contains(&peer))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub base_url: Option<String>,
    pub jwt: JwtConfig,
    pub rate_limit_per_minute: NonZeroU32,
    pub cache: CachePolicy,
    pub forwarded: ForwardedTrust,
}

impl AppConfig {
    /// Defaults with the given signing secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            base_url: None,
            jwt: JwtConfig {
                secret: secret.into(),
                issuer: "CompanyEmployees".to_string(),
                audience: "https://localhost:5001".to_string(),
                expires_minutes: 60,
            },
            rate_limit_per_minute: NonZeroU32::new(100).unwrap_or(NonZeroU32::MIN),
            cache: CachePolicy {
                location: CacheLocation::Private,
                max_age: 120,
            },
            forwarded: ForwardedTrust::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::SecretTooShort(self.jwt.secret.len()));
        }
        if self.jwt.expires_minutes == 0 {
            return Err(ConfigError::ZeroExpiry);
        }
        Ok(())
    }
}

impl TryFrom<ServeArgs> for AppConfig {
    type Error = ConfigError;

    fn try_from(args: ServeArgs) -> Result<Self, Self::Error> {
        let rate_limit_per_minute =
            NonZeroU32::new(args.rate_limit).ok_or(ConfigError::ZeroRateLimit)?;
        let config = Self {
            bind: args.bind,
            base_url: args
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            jwt: JwtConfig {
                secret: args.jwt_secret,
                issuer: args.jwt_issuer,
                audience: args.jwt_audience,
                expires_minutes: args.jwt_expires_minutes,
            },
            rate_limit_per_minute,
            cache: CachePolicy {
                location: if args.cache_public {
                    CacheLocation::Public
                } else {
                    CacheLocation::Private
                },
                max_age: args.cache_max_age,
            },
            forwarded: ForwardedTrust {
                enabled: args.trust_forwarded,
                known_proxies: args.known_proxies,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::with_secret(SECRET);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.rate_limit_per_minute.get(), 100);
        assert_eq!(
            config.cache.header_value(),
            "private, max-age=120, must-revalidate"
        );
        assert!(!config.cache.stores_responses());
        assert!(!config.forwarded.enabled);
    }

    #[test]
    fn short_secret_is_rejected() {
        let config = AppConfig::with_secret("short");
        assert_eq!(config.validate(), Err(ConfigError::SecretTooShort(5)));
    }

    #[test]
    fn private_location_skips_server_cache() {
        let policy = CachePolicy {
            location: CacheLocation::Private,
            max_age: 120,
        };
        assert!(!policy.stores_responses());
        assert!(policy.header_value().starts_with("private"));
    }

    #[test]
    fn public_location_is_stored() {
        let policy = CachePolicy {
            location: CacheLocation::Public,
            max_age: 120,
        };
        assert!(policy.stores_responses());
        let disabled = CachePolicy { max_age: 0, ..policy };
        assert!(!disabled.stores_responses());
    }

    #[test]
    fn forwarded_trust_needs_a_known_peer() {
        let proxy = IpAddr::from([10, 0, 0, 2]);
        let trust = ForwardedTrust {
            enabled: true,
            known_proxies: vec![proxy],
        };
        assert!(trust.trusts(IpAddr::from([127, 0, 0, 1])));
        assert!(trust.trusts(proxy));
        assert!(!trust.trusts(IpAddr::from([203, 0, 113, 9])));

        let off = ForwardedTrust {
            enabled: false,
            ..trust
        };
        assert!(!off.trusts(proxy));
    }
}
