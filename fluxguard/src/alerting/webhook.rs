//! HTTP webhook delivery.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ring::hmac;
use serde_json::json;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{AlertDispatcher, AlertPayload, DeliveryOutcome, BLOCK_EVENT};
use crate::error::{FluxError, Result};
use crate::logging::{truncate_field, DEFAULT_MAX_FIELD_LENGTH};
use crate::report::{quantize, DEFAULT_DIGITS};

/// A secret that is cleared from memory when dropped.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecureString(String);

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl SecureString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string value. Avoid storing the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Convert to a regular string, zeroizing the wrapper.
    pub fn into_string(mut self) -> String {
        let value = std::mem::take(&mut self.0);
        self.0.zeroize();
        value
    }
}

/// Body layout of the POST request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WebhookFormat {
    /// `{"event": ..., "payload": ...}`
    #[default]
    Generic,
    /// `{"text": ...}`
    Slack,
}

/// Configuration for [`WebhookDispatcher`].
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    url: String,
    format: WebhookFormat,
    headers: HashMap<String, String>,
    secret: Option<SecureString>,
    timeout: Duration,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: WebhookFormat::default(),
            headers: HashMap::new(),
            secret: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_format(mut self, format: WebhookFormat) -> Self {
        self.format = format;
        self
    }

    /// Add a custom header to be sent with webhook requests.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set a secret for HMAC-SHA256 signing of payloads.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecureString::new(secret.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(FluxError::config("Webhook URL cannot be empty"));
        }

        let url_lower = self.url.to_lowercase();
        if !url_lower.starts_with("http://") && !url_lower.starts_with("https://") {
            return Err(FluxError::config(
                "Webhook URL must start with http:// or https://",
            ));
        }

        if reqwest::Url::parse(&self.url).is_err() {
            return Err(FluxError::config(format!(
                "Invalid webhook URL: {}",
                self.url
            )));
        }

        Ok(())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn format(&self) -> WebhookFormat {
        self.format
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn secret(&self) -> Option<&SecureString> {
        self.secret.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Posts alerts to an HTTP endpoint.
pub struct WebhookDispatcher {
    name: String,
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookDispatcher {
    pub fn new(name: impl Into<String>, config: WebhookConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FluxError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            client,
            config,
        })
    }

    /// Request body for `payload` in the configured format.
    pub fn body(&self, payload: &AlertPayload) -> Result<String> {
        let value = match self.config.format {
            WebhookFormat::Generic => json!({
                "event": BLOCK_EVENT,
                "payload": quantize(serde_json::to_value(payload)?, DEFAULT_DIGITS),
            }),
            WebhookFormat::Slack => json!({ "text": payload.text }),
        };
        Ok(serde_json::to_string(&value)?)
    }

    /// Sign a payload using HMAC-SHA256.
    pub fn sign_payload(body: &str, secret: &str) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
        let signature = hmac::sign(&key, body.as_bytes());
        hex::encode(signature.as_ref())
    }

    async fn send(&self, body: String) -> std::result::Result<(), String> {
        let mut request = self
            .client
            .post(&self.config.url)
            .header("Content-Type", "application/json");

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        if let Some(secret) = &self.config.secret {
            let signature = Self::sign_payload(&body, secret.expose());
            request = request.header("X-Signature-256", format!("sha256={signature}"));
        }

        let response = request.body(body).send().await.map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(format!(
                "HTTP {status}: {}",
                truncate_field(&message, DEFAULT_MAX_FIELD_LENGTH)
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AlertDispatcher for WebhookDispatcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn dispatch(&self, payload: &AlertPayload) -> DeliveryOutcome {
        let body = match self.body(payload) {
            Ok(body) => body,
            Err(e) => return DeliveryOutcome::failed(&self.name, e.to_string()),
        };
        match self.send(body).await {
            Ok(()) => DeliveryOutcome::delivered(&self.name),
            Err(reason) => DeliveryOutcome::failed(&self.name, reason),
        }
    }
}
