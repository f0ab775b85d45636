//! Environment snapshot.
//!
//! Credentials and the deployment flag come from process environment
//! variables. They are captured once into a [`StorageEnv`] and passed to the
//! subsystems that need them, so tests can build any combination without
//! touching the real environment.

use serde::Serialize;
use std::fmt;

pub const KV_REST_API_URL: &str = "KV_REST_API_URL";
pub const KV_REST_API_TOKEN: &str = "KV_REST_API_TOKEN";
pub const KV_REST_API_READ_ONLY_TOKEN: &str = "KV_REST_API_READ_ONLY_TOKEN";
pub const KV_URL: &str = "KV_URL";
pub const REDIS_URL: &str = "REDIS_URL";
pub const APP_ENV: &str = "APP_ENV";
pub const ALLOW_VIEW_COUNT_DEBUG: &str = "ALLOW_VIEW_COUNT_DEBUG";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    /// Parse an `APP_ENV` value. Unset or unrecognised values mean production.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("development") | Some("dev") => Environment::Development,
            Some("test") => Environment::Test,
            _ => Environment::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings for the networked KV store, one variant per client.
#[derive(Clone, PartialEq, Eq)]
pub enum KvConnection {
    /// Managed REST endpoint with bearer token.
    Rest { url: String, token: String },
    /// Direct connection URL (`redis://` or `rediss://`).
    Direct { url: String },
}

impl fmt::Debug for KvConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens and URLs may embed secrets.
        match self {
            KvConnection::Rest { .. } => f.write_str("KvConnection::Rest"),
            KvConnection::Direct { .. } => f.write_str("KvConnection::Direct"),
        }
    }
}

/// Snapshot of every environment signal the service recognises.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StorageEnv {
    pub environment: Option<String>,
    pub kv_rest_api_url: Option<String>,
    pub kv_rest_api_token: Option<String>,
    pub kv_rest_api_read_only_token: Option<String>,
    pub kv_url: Option<String>,
    pub redis_url: Option<String>,
    pub allow_debug: bool,
}

impl fmt::Debug for StorageEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageEnv")
            .field("environment", &self.environment())
            .field("presence", &self.presence())
            .field("allow_debug", &self.allow_debug)
            .finish()
    }
}

/// Which recognised variables are set, without their values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvPresence {
    #[serde(rename = "KV_REST_API_URL")]
    pub kv_rest_api_url: bool,
    #[serde(rename = "KV_REST_API_TOKEN")]
    pub kv_rest_api_token: bool,
    #[serde(rename = "KV_URL")]
    pub kv_url: bool,
    #[serde(rename = "KV_REST_API_READ_ONLY_TOKEN")]
    pub kv_rest_api_read_only_token: bool,
    #[serde(rename = "REDIS_URL")]
    pub redis_url: bool,
}

impl StorageEnv {
    /// Capture the current process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            environment: get(APP_ENV),
            kv_rest_api_url: get(KV_REST_API_URL),
            kv_rest_api_token: get(KV_REST_API_TOKEN),
            kv_rest_api_read_only_token: get(KV_REST_API_READ_ONLY_TOKEN),
            kv_url: get(KV_URL),
            redis_url: get(REDIS_URL),
            allow_debug: get(ALLOW_VIEW_COUNT_DEBUG).as_deref() == Some("true"),
        }
    }

    pub fn environment(&self) -> Environment {
        Environment::parse(self.environment.as_deref())
    }

    /// Resolve the networked KV client configuration, if any.
    ///
    /// A REST URL with a token (read-write preferred) wins; otherwise a
    /// direct connection URL is used, `REDIS_URL` before `KV_URL`.
    pub fn kv_connection(&self) -> Option<KvConnection> {
        if let Some(url) = &self.kv_rest_api_url {
            let token = self
                .kv_rest_api_token
                .as_ref()
                .or(self.kv_rest_api_read_only_token.as_ref());
            if let Some(token) = token {
                return Some(KvConnection::Rest {
                    url: url.clone(),
                    token: token.clone(),
                });
            }
        }

        self.redis_url
            .as_ref()
            .or(self.kv_url.as_ref())
            .map(|url| KvConnection::Direct { url: url.clone() })
    }

    pub fn has_kv_connection(&self) -> bool {
        self.kv_connection().is_some()
    }

    pub fn presence(&self) -> EnvPresence {
        EnvPresence {
            kv_rest_api_url: self.kv_rest_api_url.is_some(),
            kv_rest_api_token: self.kv_rest_api_token.is_some(),
            kv_url: self.kv_url.is_some(),
            kv_rest_api_read_only_token: self.kv_rest_api_read_only_token.is_some(),
            redis_url: self.redis_url.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> StorageEnv {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StorageEnv::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::parse(Some("development")), Environment::Development);
        assert_eq!(Environment::parse(Some("DEV")), Environment::Development);
        assert_eq!(Environment::parse(Some("test")), Environment::Test);
        assert_eq!(Environment::parse(Some("production")), Environment::Production);
        assert_eq!(Environment::parse(Some("staging")), Environment::Production);
        assert_eq!(Environment::parse(None), Environment::Production);
    }

    #[test]
    fn test_rest_requires_token() {
        let snapshot = env(&[(KV_REST_API_URL, "https://kv.example.com")]);
        assert!(snapshot.kv_connection().is_none());

        let snapshot = env(&[
            (KV_REST_API_URL, "https://kv.example.com"),
            (KV_REST_API_READ_ONLY_TOKEN, "ro"),
        ]);
        assert_eq!(
            snapshot.kv_connection(),
            Some(KvConnection::Rest {
                url: "https://kv.example.com".into(),
                token: "ro".into()
            })
        );
    }

    #[test]
    fn test_read_write_token_preferred() {
        let snapshot = env(&[
            (KV_REST_API_URL, "https://kv.example.com"),
            (KV_REST_API_TOKEN, "rw"),
            (KV_REST_API_READ_ONLY_TOKEN, "ro"),
        ]);
        match snapshot.kv_connection() {
            Some(KvConnection::Rest { token, .. }) => assert_eq!(token, "rw"),
            other => panic!("unexpected connection: {other:?}"),
        }
    }

    #[test]
    fn test_direct_url_precedence() {
        let snapshot = env(&[(KV_URL, "redis://kv:6379"), (REDIS_URL, "redis://redis:6379")]);
        assert_eq!(
            snapshot.kv_connection(),
            Some(KvConnection::Direct {
                url: "redis://redis:6379".into()
            })
        );
    }

    #[test]
    fn test_empty_values_are_unset() {
        let snapshot = env(&[(REDIS_URL, "  "), (ALLOW_VIEW_COUNT_DEBUG, "yes")]);
        assert!(!snapshot.has_kv_connection());
        assert!(!snapshot.allow_debug);
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let snapshot = env(&[
            (KV_REST_API_URL, "https://kv.example.com"),
            (KV_REST_API_TOKEN, "super-secret"),
        ]);
        let rendered = format!("{snapshot:?} {:?}", snapshot.kv_connection());
        assert!(!rendered.contains("super-secret"));
    }
}
