/// HTTP implementation of [`PredictionService`] on top of the synchronous
/// `ureq` client.
///
/// One `POST` per prediction with the frozen form as the JSON body. No
/// retries. The transport timeout is optional and off by default, so a hung
/// service keeps the caller waiting until the OS gives up on the socket.
use std::time::Duration;

use serde::Deserialize;

use super::endpoint;
use super::{PredictError, PredictionResult, PredictionService};
use crate::config::schema::ServiceConfig;
use crate::schema::FrozenInput;

/// Longest slice of an error body kept for diagnostics.
const MAX_DETAIL_CHARS: usize = 200;

/// Health checks never wait longer than this, even without a configured
/// request timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of `GET /health`.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Blocking HTTP client for the prediction service.
#[derive(Debug)]
pub struct HttpPredictionClient {
    endpoint: String,
    timeout: Option<Duration>,
    agent: ureq::Agent,
}

impl HttpPredictionClient {
    /// Build a client from the `[service]` config section.
    ///
    /// A `timeout_ms` of zero means no timeout.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        Self::new(&config.url, timeout)
    }

    pub fn new(url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            endpoint: endpoint::resolve(url),
            timeout,
            agent: builder.build(),
        }
    }

    /// The resolved prediction URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Query the service's health route.
    ///
    /// Returns the reported status string (`"healthy"` for a live service).
    pub fn health(&self) -> Result<String, PredictError> {
        let url = endpoint::health_url(&self.endpoint);
        let resp = self
            .agent
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .call()
            .map_err(classify)?;

        let parsed: HealthResponse = resp
            .into_json()
            .map_err(|e| PredictError::MalformedResponse(e.to_string()))?;
        Ok(parsed.status)
    }
}

impl PredictionService for HttpPredictionClient {
    fn predict(&self, input: &FrozenInput) -> Result<PredictionResult, PredictError> {
        let resp = self
            .agent
            .post(&self.endpoint)
            .send_json(input)
            .map_err(classify)?;

        let body: serde_json::Value = resp
            .into_json()
            .map_err(|e| PredictError::MalformedResponse(format!("body is not JSON: {e}")))?;

        PredictionResult::from_json(body)
    }
}

/// Map a `ureq` error onto the failure taxonomy.
fn classify(err: ureq::Error) -> PredictError {
    match err {
        ureq::Error::Status(status, resp) => {
            let body = resp.into_string().unwrap_or_default();
            PredictError::ServerRejected {
                status,
                detail: truncate(body.trim(), MAX_DETAIL_CHARS),
            }
        }
        ureq::Error::Transport(transport) => PredictError::Transport(transport.to_string()),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_default_config() {
        let client = HttpPredictionClient::from_config(&ServiceConfig::default());
        assert_eq!(client.endpoint(), endpoint::DEFAULT_ENDPOINT);
        assert_eq!(client.timeout(), None);
    }

    #[test]
    fn client_applies_timeout_and_resolution() {
        let config = ServiceConfig {
            url: "https://farm.onrender.com".to_string(),
            timeout_ms: 2500,
        };
        let client = HttpPredictionClient::from_config(&config);
        assert_eq!(client.endpoint(), "https://farm.onrender.com/predict");
        assert_eq!(client.timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("model not loaded", 200), "model not loaded");
    }

    #[test]
    fn truncate_cuts_on_char_boundary() {
        assert_eq!(truncate("ééééé", 3), "ééé...");
    }
}
