//! Client for the prediction service's HTTP endpoints.
//!
//! Every call is a single round-trip with no retry: this is an interactive
//! client, so the human is the retry loop. Failures are normalized into one
//! error channel and surfaced verbatim. Prediction responses are kept as
//! opaque JSON; interpretation belongs to the presenter.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::http_client;
use crate::payload::{BatchPayload, RequestPayload};
use crate::schema::{ModelCatalog, ModelKind};

/// Origin used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Errors from talking to the service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The configured base URL does not parse or uses an unsupported scheme.
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBase {
        /// The offending URL text.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The catalog could not be fetched or decoded.
    #[error("Schema unavailable: {0}")]
    SchemaUnavailable(String),
    /// A predict or health round-trip failed.
    #[error("Request failed: {0}")]
    RequestFailed(String),
}

/// Decoded `/health` response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    /// Whatever status text the server reports.
    pub status: String,
}

/// An uninterpreted prediction response.
///
/// The embedded `model_type` tag decides presentation later; the client
/// itself never looks inside beyond re-tagging batch rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult(pub Value);

impl PredictionResult {
    /// The response's model tag, when present and recognized.
    pub fn model_kind(&self) -> Option<ModelKind> {
        self.0
            .get("model_type")
            .and_then(Value::as_str)
            .and_then(ModelKind::from_tag)
    }

    /// Pretty-printed JSON for the raw output panel.
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

/// Blocking client bound to one service origin.
#[derive(Debug, Clone)]
pub struct PredictionClient {
    base: String,
}

impl PredictionClient {
    /// Bind to `base_url`, with a trailing slash stripped. An empty string
    /// selects the default local origin.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Ok(Self {
                base: DEFAULT_BASE_URL.to_string(),
            });
        }
        let parsed = Url::parse(trimmed).map_err(|err| ClientError::InvalidBase {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidBase {
                url: base_url.to_string(),
                reason: "only http and https origins are supported".to_string(),
            });
        }
        Ok(Self {
            base: trimmed.to_string(),
        })
    }

    /// The origin requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Fetch and decode the model catalog.
    pub fn fetch_catalog(&self) -> Result<ModelCatalog, ClientError> {
        let bytes = self
            .get_bytes("/schema")
            .map_err(ClientError::SchemaUnavailable)?;
        ModelCatalog::parse(&bytes).map_err(|err| ClientError::SchemaUnavailable(err.to_string()))
    }

    /// Submit one prediction payload.
    pub fn predict(&self, payload: &RequestPayload) -> Result<PredictionResult, ClientError> {
        self.post_json("/predict", payload).map(PredictionResult)
    }

    /// Submit a batch payload; each returned row is re-tagged with the
    /// request's model tag so it presents like a single prediction.
    pub fn predict_batch(
        &self,
        payload: &BatchPayload,
    ) -> Result<Vec<PredictionResult>, ClientError> {
        #[derive(Deserialize)]
        struct BatchResponse {
            model_type: String,
            results: Vec<Value>,
        }

        let value = self.post_json("/batch_predict", payload)?;
        let response: BatchResponse = serde_json::from_value(value).map_err(|err| {
            ClientError::RequestFailed(format!("Unexpected batch response shape: {err}"))
        })?;
        Ok(response
            .results
            .into_iter()
            .map(|mut row| {
                if let Value::Object(map) = &mut row {
                    map.entry("model_type")
                        .or_insert_with(|| Value::String(response.model_type.clone()));
                }
                PredictionResult(row)
            })
            .collect())
    }

    /// Ask the service whether it is up.
    pub fn health(&self) -> Result<HealthStatus, ClientError> {
        let bytes = self
            .get_bytes("/health")
            .map_err(ClientError::RequestFailed)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ClientError::RequestFailed(format!("Health response: {err}")))
    }

    fn get_bytes(&self, path: &str) -> Result<Vec<u8>, String> {
        let url = format!("{}{path}", self.base);
        let response = match http_client::agent()
            .get(&url)
            .set("Accept", "application/json")
            .call()
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(format!("HTTP {code}: {body}"));
            }
            Err(ureq::Error::Transport(err)) => return Err(err.to_string()),
        };
        http_client::read_body(response, http_client::MAX_BODY_BYTES).map_err(|err| err.to_string())
    }

    fn post_json(&self, path: &str, body: &impl Serialize) -> Result<Value, ClientError> {
        let url = format!("{}{path}", self.base);
        let response = match http_client::agent()
            .post(&url)
            .set("Accept", "application/json")
            .send_json(body)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(ClientError::RequestFailed(format!("HTTP {code}: {body}")));
            }
            Err(ureq::Error::Transport(err)) => {
                return Err(ClientError::RequestFailed(err.to_string()));
            }
        };
        let bytes = http_client::read_body(response, http_client::MAX_BODY_BYTES)
            .map_err(|err| ClientError::RequestFailed(err.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ClientError::RequestFailed(format!("Response body: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn serve_once(body: &str) -> String {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        serve_raw(response)
    }

    fn serve_raw(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    #[test]
    fn empty_base_selects_the_default_origin() {
        let client = PredictionClient::new("").unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = PredictionClient::new("http://10.0.0.8:5000/").unwrap();
        assert_eq!(client.base_url(), "http://10.0.0.8:5000");
    }

    #[test]
    fn non_http_schemes_are_rejected() {
        let err = PredictionClient::new("ftp://example.com").unwrap_err();
        assert!(matches!(err, ClientError::InvalidBase { .. }));
        assert!(PredictionClient::new("not a url").is_err());
    }

    #[test]
    fn fetch_catalog_decodes_the_document() {
        let body = serde_json::json!({
            "models": {
                "svm_churn": {"model_type": "svm", "required_fields": ["price"]}
            }
        })
        .to_string();
        let client = PredictionClient::new(&serve_once(&body)).unwrap();
        let catalog = client.fetch_catalog().unwrap();
        assert_eq!(catalog.available(), vec![ModelKind::Svm]);
    }

    #[test]
    fn malformed_catalog_reports_schema_unavailable() {
        let client = PredictionClient::new(&serve_once("not json")).unwrap();
        let err = client.fetch_catalog().unwrap_err();
        assert!(matches!(err, ClientError::SchemaUnavailable(_)));
    }

    #[test]
    fn predict_returns_the_raw_response() {
        let body = r#"{"model_type":"kmeans","prediction_cluster":2}"#;
        let client = PredictionClient::new(&serve_once(body)).unwrap();
        let payload = RequestPayload {
            model_type: "kmeans".to_string(),
            features: serde_json::Map::new(),
        };
        let result = client.predict(&payload).unwrap();
        assert_eq!(result.model_kind(), Some(ModelKind::Kmeans));
        assert_eq!(result.0.get("prediction_cluster"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn error_status_is_surfaced_with_its_body() {
        let response = "HTTP/1.1 500 Internal Server Error\r\nConnection: close\r\nContent-Length: 16\r\n\r\n{\"error\":\"boom\"}".to_string();
        let client = PredictionClient::new(&serve_raw(response)).unwrap();
        let err = client.health().unwrap_err();
        let ClientError::RequestFailed(reason) = err else {
            panic!("expected RequestFailed");
        };
        assert!(reason.starts_with("HTTP 500"));
    }

    #[test]
    fn unreachable_host_is_a_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = PredictionClient::new(&format!("http://{addr}")).unwrap();
        assert!(matches!(
            client.health(),
            Err(ClientError::RequestFailed(_))
        ));
    }

    #[test]
    fn batch_rows_are_retagged_with_the_model_type() {
        let body = serde_json::json!({
            "model_type": "linreg",
            "results": [
                {"input": {}, "predicted_sales_value": 100.0},
                {"input": {}, "predicted_sales_value": 250.5}
            ]
        })
        .to_string();
        let client = PredictionClient::new(&serve_once(&body)).unwrap();
        let payload = BatchPayload {
            model_type: "linreg".to_string(),
            rows: vec![serde_json::Map::new(), serde_json::Map::new()],
        };
        let results = client.predict_batch(&payload).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|result| result.model_kind() == Some(ModelKind::Linreg)));
    }

    #[test]
    fn health_decodes_status() {
        let client = PredictionClient::new(&serve_once(r#"{"status":"ok"}"#)).unwrap();
        assert_eq!(client.health().unwrap().status, "ok");
    }
}
