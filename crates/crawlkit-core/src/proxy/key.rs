//! Proxy endpoint: host, port and optional credentials.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An outbound HTTP proxy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Proxy {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Proxy URL for curl (`http://host:port`). Credentials are passed separately.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Parse `host:port`, `user:pass@host:port` or a full `http://` proxy URL.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let with_scheme = if s.contains("://") {
            s.to_string()
        } else {
            format!("http://{s}")
        };
        let parsed =
            url::Url::parse(&with_scheme).with_context(|| format!("invalid proxy: {s}"))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("proxy missing host: {s}"))?
            .to_string();
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| anyhow::anyhow!("proxy missing port: {s}"))?;
        let mut proxy = Proxy::new(host, port);
        if !parsed.username().is_empty() {
            proxy.username = Some(parsed.username().to_string());
            proxy.password = parsed.password().map(str::to_string);
        }
        Ok(proxy)
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
