/// Prediction client: the single outbound call to the yield-prediction
/// service.
///
/// The client is reached through the [`PredictionService`] trait so the
/// runtime can be driven by the HTTP implementation in production and by
/// in-process fakes in tests. Every implementation resolves to either a
/// [`PredictionResult`] or a classified [`PredictError`]; nothing panics
/// across this boundary and nothing is retried.
///
/// # Failure kinds
///
/// | Kind                | Meaning                                         |
/// |---------------------|-------------------------------------------------|
/// | `Transport`         | No response at all (refused, DNS, timeout)      |
/// | `ServerRejected`    | The service answered with a non-2xx status      |
/// | `MalformedResponse` | 2xx, but the body is not the expected shape     |
pub mod endpoint;
pub mod http;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::FrozenInput;

pub use http::HttpPredictionClient;

// ---------------------------------------------------------------------------
// Response type
// ---------------------------------------------------------------------------

/// The fields of a prediction response this crate relies on.
///
/// Extra fields in the response are ignored; a missing or mistyped required
/// field makes the whole response malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(rename = "Yield_per_Hectare")]
    pub yield_per_hectare: f64,
    #[serde(rename = "Total_Yield")]
    pub total_yield: f64,
    #[serde(rename = "Area_in_Hectares")]
    pub area_in_hectares: f64,
    #[serde(rename = "Yield_Unit")]
    pub yield_unit: String,
}

impl PredictionResult {
    /// Validate an untrusted JSON body into a result.
    pub fn from_json(body: serde_json::Value) -> Result<Self, PredictError> {
        if !body.is_object() {
            return Err(PredictError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                json_kind(&body)
            )));
        }
        serde_json::from_value(body).map_err(|e| PredictError::MalformedResponse(e.to_string()))
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Classified failure of a single prediction attempt.
///
/// The `String` payloads are diagnostic detail for the journal; they are
/// never shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("service rejected the request with status {status}: {detail}")]
    ServerRejected { status: u16, detail: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl PredictError {
    /// Stable short name of the failure kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::ServerRejected { .. } => "server_rejected",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}

// ---------------------------------------------------------------------------
// Service seam
// ---------------------------------------------------------------------------

/// Anything that can turn a frozen form into a prediction.
///
/// Implementations make exactly one attempt per call.
pub trait PredictionService: Send + Sync {
    fn predict(&self, input: &FrozenInput) -> Result<PredictionResult, PredictError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_complete_body() {
        let body = json!({
            "Yield_per_Hectare": 4.2,
            "Total_Yield": 4.2,
            "Area_in_Hectares": 1,
            "Yield_Unit": "Ton",
            "model_version": "xgb-3"
        });
        let result = PredictionResult::from_json(body).unwrap();
        assert_eq!(result.yield_per_hectare, 4.2);
        assert_eq!(result.area_in_hectares, 1.0);
        assert_eq!(result.yield_unit, "Ton");
    }

    #[test]
    fn missing_field_is_malformed() {
        let body = json!({
            "Yield_per_Hectare": 4.2,
            "Area_in_Hectares": 1,
            "Yield_Unit": "Ton"
        });
        let err = PredictionResult::from_json(body).unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
        assert!(err.to_string().contains("Total_Yield"));
    }

    #[test]
    fn mistyped_field_is_malformed() {
        let body = json!({
            "Yield_per_Hectare": "4.2",
            "Total_Yield": 4.2,
            "Area_in_Hectares": 1,
            "Yield_Unit": "Ton"
        });
        assert!(matches!(
            PredictionResult::from_json(body),
            Err(PredictError::MalformedResponse(_))
        ));
    }

    #[test]
    fn null_field_is_not_defaulted() {
        let body = json!({
            "Yield_per_Hectare": 4.2,
            "Total_Yield": null,
            "Area_in_Hectares": 1,
            "Yield_Unit": "Ton"
        });
        assert!(PredictionResult::from_json(body).is_err());
    }

    #[test]
    fn non_object_body_is_malformed() {
        let err = PredictionResult::from_json(json!([1, 2, 3])).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn error_kinds_are_distinct() {
        let kinds = [
            PredictError::Transport("refused".into()).kind(),
            PredictError::ServerRejected {
                status: 500,
                detail: String::new(),
            }
            .kind(),
            PredictError::MalformedResponse("x".into()).kind(),
        ];
        assert_eq!(kinds, ["transport", "server_rejected", "malformed_response"]);
    }
}
