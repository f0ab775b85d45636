//! Managed REST KV client.
//!
//! Commands are posted as a JSON array (`["INCR", "views:post"]`) with a
//! bearer token; the endpoint answers `{"result": ...}` or `{"error": "..."}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::KvConfig;
use crate::storage::kv::{parse_count, KvClient, KvError};

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    result: Value,
    error: Option<String>,
}

/// Stateless REST client; every call is an independent HTTP request.
pub struct RestKv {
    http: Client,
    url: Url,
    token: String,
}

impl RestKv {
    pub fn new(url: &str, token: &str, config: &KvConfig) -> Result<Self, KvError> {
        let url = Url::parse(url).map_err(|e| KvError::InvalidUrl(e.to_string()))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url,
            token: token.to_string(),
        })
    }

    async fn command(&self, args: &[&str]) -> Result<Value, KvError> {
        let response = self
            .http
            .post(self.url.clone())
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await?;

        let status = response.status();
        let reply: Reply = match response.json().await {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(KvError::Remote(format!("HTTP {status}")));
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(error) = reply.error {
            return Err(KvError::Remote(error));
        }
        if !status.is_success() {
            return Err(KvError::Remote(format!("HTTP {status}")));
        }
        Ok(reply.result)
    }
}

/// Interpret a reply value as an optional counter.
fn count_from(key: &str, value: Value) -> Result<Option<u64>, KvError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().map(Some).ok_or_else(|| KvError::InvalidValue {
            key: key.to_string(),
            value: n.to_string(),
        }),
        Value::String(s) => parse_count(key, &s).map(Some),
        other => Err(KvError::InvalidValue {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

fn string_from(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl KvClient for RestKv {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn get_count(&self, key: &str) -> Result<Option<u64>, KvError> {
        count_from(key, self.command(&["GET", key]).await?)
    }

    async fn incr(&self, key: &str) -> Result<u64, KvError> {
        let value = self.command(&["INCR", key]).await?;
        count_from(key, value)?.ok_or_else(|| KvError::InvalidValue {
            key: key.to_string(),
            value: "null".to_string(),
        })
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(string_from(self.command(&["GET", key]).await?))
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError> {
        let ttl = ttl_secs.to_string();
        self.command(&["SET", key, value, "EX", &ttl]).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.command(&["DEL", key]).await?;
        Ok(())
    }
}
