use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use url::Url;

use crate::config::AuditConfig;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid audit endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Audit function returned status {0}")]
    Rejected(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Remote invokable endpoint receiving serialized audit records.
///
/// Callers never inspect the outcome; implementations report failures only so
/// that tests can observe them.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn invoke(&self, function_name: &str, payload: String) -> Result<(), AuditError>;
}

/// Asynchronous invocation of a function-as-a-service endpoint over HTTP.
///
/// Payloads are POSTed to `{endpoint}/2014-11-13/functions/{name}/invoke-async/`.
pub struct HttpFunctionSink {
    client: reqwest::Client,
    endpoint: Url,
    auth_token: Option<String>,
}

impl HttpFunctionSink {
    pub fn new(endpoint: &str, auth_token: Option<String>) -> Result<Self, AuditError> {
        let mut endpoint =
            Url::parse(endpoint).map_err(|e| AuditError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(AuditError::InvalidEndpoint(endpoint.to_string()));
        }
        // Url::join replaces the last segment unless the base ends with a slash
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            auth_token,
        })
    }

    pub fn invoke_url(&self, function_name: &str) -> Result<Url, AuditError> {
        self.endpoint
            .join(&format!("2014-11-13/functions/{}/invoke-async/", function_name))
            .map_err(|e| AuditError::InvalidEndpoint(e.to_string()))
    }
}

#[async_trait]
impl AuditSink for HttpFunctionSink {
    async fn invoke(&self, function_name: &str, payload: String) -> Result<(), AuditError> {
        let mut request = self
            .client
            .post(self.invoke_url(function_name)?)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AuditError::Rejected(response.status()));
        }
        Ok(())
    }
}

/// Emits audit payloads as trace events when no remote endpoint is configured
pub struct LogSink;

#[async_trait]
impl AuditSink for LogSink {
    async fn invoke(&self, function_name: &str, payload: String) -> Result<(), AuditError> {
        tracing::debug!(function = function_name, "audit event: {}", payload);
        Ok(())
    }
}

/// Choose the sink for the configured environment
pub fn from_config(config: &AuditConfig) -> Result<std::sync::Arc<dyn AuditSink>, AuditError> {
    match config.endpoint.as_deref() {
        Some(endpoint) => {
            tracing::info!("Audit events go to {} ({})", endpoint, config.function_name);
            Ok(std::sync::Arc::new(HttpFunctionSink::new(
                endpoint,
                config.auth_token.clone(),
            )?))
        }
        None => {
            tracing::info!("AUDIT_ENDPOINT not set; audit events are only traced");
            Ok(std::sync::Arc::new(LogSink))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_invoke_async_url() {
        let sink = HttpFunctionSink::new("http://localhost:9001", None).unwrap();
        assert_eq!(
            sink.invoke_url("auditHandler").unwrap().as_str(),
            "http://localhost:9001/2014-11-13/functions/auditHandler/invoke-async/"
        );

        let nested = HttpFunctionSink::new("https://gateway.example.com/lambda", None).unwrap();
        assert_eq!(
            nested.invoke_url("auditHandler").unwrap().as_str(),
            "https://gateway.example.com/lambda/2014-11-13/functions/auditHandler/invoke-async/"
        );
    }

    #[test]
    fn rejects_bad_endpoints() {
        assert!(matches!(
            HttpFunctionSink::new("not a url", None),
            Err(AuditError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            HttpFunctionSink::new("mailto:audit@example.com", None),
            Err(AuditError::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_http_error() {
        let port = portpicker::pick_unused_port().unwrap();
        let sink = HttpFunctionSink::new(&format!("http://127.0.0.1:{}", port), None).unwrap();
        let result = sink.invoke("auditHandler", "{}".to_string()).await;
        assert!(matches!(result, Err(AuditError::Http(_))));
    }
}
