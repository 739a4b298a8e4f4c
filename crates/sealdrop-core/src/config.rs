use serde::{Deserialize, Serialize};

/// Client configuration (loadable from a TOML file or built in code).
///
/// Credentials are issued per integration: `api_key` identifies the caller,
/// `api_secret` signs every request and never travels on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the API host, e.g. "https://secure.example.com"
    pub host: String,
    /// API key id, sent in the `ss-api-key` header
    pub api_key: String,
    /// Shared secret keying the per-request HMAC signature
    pub api_secret: String,
    /// Optional integration tag, sent in `ss-request-api`
    pub request_api: Option<String>,
    /// Accept-Language header value
    pub accept_language: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Optional outbound HTTP(S) proxy URL
    pub proxy: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "https://secure.sealdrop.example".into(),
            api_key: String::new(),
            api_secret: String::new(),
            request_api: None,
            accept_language: "en-US, en;q=0.8".into(),
            timeout_secs: 30,
            proxy: None,
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document; missing fields take defaults.
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).map_err(|e| anyhow::anyhow!("parsing client config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
host = "https://secure.example.com"
api_key = "KEY_ID"
api_secret = "KEY_SECRET"
request_api = "ACME_INTEGRATION"
accept_language = "de-DE"
timeout_secs = 60
proxy = "http://proxy.internal:3128"
"#;
        let config = ClientConfig::from_toml(toml_str).unwrap();

        assert_eq!(config.host, "https://secure.example.com");
        assert_eq!(config.api_key, "KEY_ID");
        assert_eq!(config.api_secret, "KEY_SECRET");
        assert_eq!(config.request_api.as_deref(), Some("ACME_INTEGRATION"));
        assert_eq!(config.accept_language, "de-DE");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.proxy.as_deref(), Some("http://proxy.internal:3128"));
    }

    #[test]
    fn test_parse_partial_config() {
        let config = ClientConfig::from_toml(r#"host = "https://other.example.com""#).unwrap();

        // Overridden
        assert_eq!(config.host, "https://other.example.com");
        // Defaults
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.accept_language, "en-US, en;q=0.8");
        assert!(config.proxy.is_none());
        assert!(config.request_api.is_none());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = ClientConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = ClientConfig::from_toml(&toml_str).unwrap();

        assert_eq!(config.host, parsed.host);
        assert_eq!(config.timeout_secs, parsed.timeout_secs);
    }
}
