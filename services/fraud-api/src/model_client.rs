use crate::errors::{ApiError, Result};
use crate::metrics::MODEL_PROXY_REQUESTS;
use crate::models::ModelFeatures;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};

/// Client for the external model-serving endpoint
///
/// Responses are relayed as-is; this client never interprets the prediction.
pub struct ModelServiceClient {
    url: String,
    client: Client,
}

impl ModelServiceClient {
    pub fn new(url: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ModelServiceClient { url, client })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Forward features to the model service and return its JSON verbatim
    pub async fn predict(&self, features: &ModelFeatures) -> Result<Value> {
        let response = self
            .client
            .post(&self.url)
            .json(features)
            .send()
            .await
            .map_err(|e| {
                error!("Error contacting model service at {}: {}", self.url, e);
                MODEL_PROXY_REQUESTS.with_label_values(&["unavailable"]).inc();
                ApiError::ModelUnavailable(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read model service response: {}", e);
            MODEL_PROXY_REQUESTS.with_label_values(&["unavailable"]).inc();
            ApiError::ModelUnavailable(e.to_string())
        })?;

        if !status.is_success() {
            warn!("Model service responded with status {}", status);
            MODEL_PROXY_REQUESTS
                .with_label_values(&["upstream_error"])
                .inc();
            return Err(ApiError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let data = serde_json::from_str::<Value>(&body).map_err(|_| {
            warn!("Model service returned a non-JSON body");
            MODEL_PROXY_REQUESTS.with_label_values(&["invalid_json"]).inc();
            ApiError::InvalidModelResponse
        })?;

        MODEL_PROXY_REQUESTS.with_label_values(&["ok"]).inc();
        info!("Model service prediction relayed");

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn features() -> ModelFeatures {
        ModelFeatures {
            time: 100.0,
            amount: 1200.0,
            v: [0.5; 28],
        }
    }

    #[tokio::test]
    async fn test_relays_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_partial_json(json!({"Amount": 1200.0, "V28": 0.5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fraud_probability": 0.42,
                "fraud_label": 0,
                "model_type": "mock-heuristic"
            })))
            .mount(&server)
            .await;

        let client = ModelServiceClient::new(format!("{}/predict", server.uri()), 5).unwrap();
        let data = client.predict(&features()).await.unwrap();

        assert_eq!(data["model_type"], "mock-heuristic");
        assert_eq!(data["fraud_probability"], 0.42);
    }

    #[tokio::test]
    async fn test_upstream_error_status_relayed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("{\"detail\":\"bad\"}"))
            .mount(&server)
            .await;

        let client = ModelServiceClient::new(server.uri(), 5).unwrap();
        match client.predict(&features()).await {
            Err(ApiError::UpstreamStatus { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "{\"detail\":\"bad\"}");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = ModelServiceClient::new(server.uri(), 5).unwrap();
        assert!(matches!(
            client.predict(&features()).await,
            Err(ApiError::InvalidModelResponse)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let client = ModelServiceClient::new("http://127.0.0.1:9/predict".to_string(), 1).unwrap();
        assert!(matches!(
            client.predict(&features()).await,
            Err(ApiError::ModelUnavailable(_))
        ));
    }
}
