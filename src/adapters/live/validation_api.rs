//! Remote validation over HTTP.
//!
//! `POST {base_url}/{endpoint}` with `{"value": ".."}`; the server answers
//! `{"is_valid": bool, "error_message": string?}`.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::{ApiValidation, PortError, PortFuture, ValidationApi};

/// Calls a validation service over HTTP.
pub struct HttpValidationApi {
    client: Client,
    base_url: String,
}

impl HttpValidationApi {
    /// Creates a client for the service at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: Client::new(), base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

#[derive(Serialize)]
struct ValidationRequest<'a> {
    value: &'a str,
}

#[derive(Deserialize)]
struct ValidationResponse {
    is_valid: bool,
    #[serde(default)]
    error_message: Option<String>,
}

impl ValidationApi for HttpValidationApi {
    fn validate(&self, endpoint: &str, value: &str) -> PortFuture<'_, ApiValidation> {
        let url = self.url(endpoint);
        let value = value.to_string();

        Box::pin(async move {
            let response = self
                .client
                .post(&url)
                .json(&ValidationRequest { value: &value })
                .send()
                .await
                .map_err(|e| -> PortError {
                    format!("Validation request to {url} failed: {e}").into()
                })?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| -> PortError {
                    format!("Failed to read validation response: {e}").into()
                })?;

            if !status.is_success() {
                let code = status.as_u16();
                return Err(format!("Validation service error ({code}): {body}").into());
            }

            let parsed: ValidationResponse = serde_json::from_str(&body)
                .map_err(|e| -> PortError {
                    format!("Failed to parse validation response: {e}").into()
                })?;

            Ok(ApiValidation { is_valid: parsed.is_valid, error_message: parsed.error_message })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_endpoint() {
        let api = HttpValidationApi::new("http://localhost:8080/api/");
        assert_eq!(api.url("/bins/check"), "http://localhost:8080/api/bins/check");
        assert_eq!(api.url("pallets"), "http://localhost:8080/api/pallets");
    }

    #[test]
    fn response_tolerates_missing_message() {
        let parsed: ValidationResponse = serde_json::from_str(r#"{"is_valid": true}"#).unwrap();
        assert!(parsed.is_valid);
        assert!(parsed.error_message.is_none());
    }

    #[tokio::test]
    async fn unreachable_service_is_a_port_error() {
        let api = HttpValidationApi::new("http://127.0.0.1:9");
        let err = api.validate("bins/check", "A-01").await.unwrap_err();
        assert!(err.to_string().contains("failed"));
    }
}
