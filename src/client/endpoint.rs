/// Endpoint resolution for the prediction service.
///
/// The service URL comes from config (which already folded in the
/// `YIELDCAST_API_URL` environment override). Hosted deployments on
/// `*.onrender.com` are often configured with the bare host, so for those
/// the `/predict` route is appended when it is missing.
use std::sync::OnceLock;

use regex::Regex;

/// Local development endpoint of the prediction service.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/predict";

/// Route the service exposes predictions on.
const PREDICT_PATH: &str = "/predict";

/// Route the service exposes its health check on.
const HEALTH_PATH: &str = "/health";

fn hosted_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^https?://[^/]*\.onrender\.com(?::\d+)?(?:/|$)")
            .expect("hosted deployment pattern is a valid regex")
    })
}

/// Resolve the URL predictions are posted to.
///
/// An empty value falls back to [`DEFAULT_ENDPOINT`].
pub fn resolve(configured: &str) -> String {
    let url = configured.trim();
    if url.is_empty() {
        return DEFAULT_ENDPOINT.to_string();
    }

    if hosted_pattern().is_match(url) && !url.ends_with(PREDICT_PATH) {
        let base = url.trim_end_matches('/');
        return format!("{base}{PREDICT_PATH}");
    }

    url.to_string()
}

/// URL of the service's health check, derived from the prediction endpoint.
pub fn health_url(endpoint: &str) -> String {
    let base = endpoint
        .strip_suffix(PREDICT_PATH)
        .unwrap_or(endpoint)
        .trim_end_matches('/');
    format!("{base}{HEALTH_PATH}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
