//! Signed request client

use chrono::Utc;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use sealdrop_core::{ClientConfig, SdResult, SealdropError};

use crate::envelope::{envelope_gate, ApiReply, Envelope, ResponseStatus};

/// Timestamp format required by the signature scheme: UTC with a literal
/// `+0000` suffix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+0000";

/// Signed HTTP client. Stateless beyond credentials and connection
/// configuration; holds no package or transfer state.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    host: String,
    api_key: String,
    api_secret: String,
    request_api: Option<String>,
    accept_language: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> SdResult<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("sealdrop-rs/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(config.timeout_secs));
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| SealdropError::InvalidInput(format!("invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| SealdropError::Other(anyhow::anyhow!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            request_api: config.request_api.clone(),
            accept_language: config.accept_language.clone(),
        })
    }

    /// Send a signed JSON request. The typed payload is parsed only when
    /// the envelope status is SUCCESS.
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> SdResult<ApiReply<T>> {
        let body_string = match &body {
            Some(value) => serde_json::to_string(value)
                .map_err(|e| SealdropError::Other(anyhow::anyhow!("serializing body: {e}")))?,
            None => String::new(),
        };
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let signature = self.request_signature(path, &timestamp, &body_string)?;

        let mut request = self
            .signed_request(method.clone(), path, &timestamp, &signature);
        if body.is_some() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body_string);
        }

        let response = request.send().await.map_err(map_network_error)?;
        let text = response.text().await.map_err(map_network_error)?;
        debug!(%method, path, "response received");
        parse_reply(&text)
    }

    /// Upload one encrypted segment as multipart/form-data. Multipart
    /// bodies are signed with an empty body string.
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> SdResult<ApiReply<T>> {
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let signature = self.request_signature(path, &timestamp, "")?;

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| SealdropError::Other(anyhow::anyhow!("building multipart part: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .signed_request(Method::POST, path, &timestamp, &signature)
            .multipart(form)
            .send()
            .await
            .map_err(map_network_error)?;
        let text = response.text().await.map_err(map_network_error)?;
        parse_reply(&text)
    }

    /// Send a signed request whose success response is a raw byte stream
    /// (segment download). Error responses still arrive as JSON envelopes
    /// and are mapped like any other reply.
    pub async fn send_bytes(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> SdResult<Vec<u8>> {
        let body_string = match &body {
            Some(value) => serde_json::to_string(value)
                .map_err(|e| SealdropError::Other(anyhow::anyhow!("serializing body: {e}")))?,
            None => String::new(),
        };
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let signature = self.request_signature(path, &timestamp, &body_string)?;

        let mut request = self.signed_request(method, path, &timestamp, &signature);
        if body.is_some() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body_string);
        }

        let response = request.send().await.map_err(map_network_error)?;
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);
        if is_json {
            let text = response.text().await.map_err(map_network_error)?;
            let reply: ApiReply<serde_json::Value> = parse_reply(&text)?;
            return Err(SealdropError::ActionFailed {
                status: reply.status.as_str().to_string(),
                message: reply.message,
            });
        }
        let bytes = response.bytes().await.map_err(map_network_error)?;
        Ok(bytes.to_vec())
    }

    fn signed_request(
        &self,
        method: Method,
        path: &str,
        timestamp: &str,
        signature: &str,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(method, format!("{}{}", self.host, path))
            .header("ss-api-key", &self.api_key)
            .header("ss-request-timestamp", timestamp)
            .header("ss-request-signature", signature)
            .header(reqwest::header::ACCEPT_LANGUAGE, &self.accept_language);
        if let Some(tag) = &self.request_api {
            request = request.header("ss-request-api", tag);
        }
        request
    }

    /// HMAC-SHA256 over `api_key || path || timestamp || body`, hex.
    /// The path excludes any query string.
    fn request_signature(&self, path: &str, timestamp: &str, body: &str) -> SdResult<String> {
        let path = path.split('?').next().unwrap_or(path);
        let data = format!("{}{}{}{}", self.api_key, path, timestamp, body);
        sealdrop_crypto::sign(&self.api_secret, &data).map_err(SealdropError::Other)
    }
}

/// Envelope-first parse: extract the status discriminant, raise shared
/// failures, and only then parse the typed payload (on SUCCESS).
fn parse_reply<T: DeserializeOwned>(text: &str) -> SdResult<ApiReply<T>> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| SealdropError::Other(anyhow::anyhow!("malformed response envelope: {e}")))?;
    envelope_gate(&envelope)?;

    let payload = if envelope.response == ResponseStatus::Success {
        let parsed: T = serde_json::from_str(text)
            .map_err(|e| SealdropError::Other(anyhow::anyhow!("parsing response payload: {e}")))?;
        Some(parsed)
    } else {
        None
    };

    Ok(ApiReply {
        status: envelope.response,
        message: envelope.message,
        errors: envelope.errors,
        payload,
    })
}

fn map_network_error(err: reqwest::Error) -> SealdropError {
    SealdropError::ServerUnavailable(err.to_string())
}
