//! Blocking JSON fetches against the upstream providers.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Upstream connect and read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6);

const USER_AGENT: &str = concat!("zonnetijden/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("response from {url} is not JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fetch a JSON document. Query parameters are URL-encoded by the source.
pub trait JsonSource: Send + Sync {
    fn fetch_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, FetchError>;
}

/// [`JsonSource`] over a ureq agent: short timeout, redirects not followed.
#[derive(Debug, Clone)]
pub struct UreqSource {
    agent: ureq::Agent,
}

impl UreqSource {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .redirects(0)
            .user_agent(USER_AGENT)
            .build();
        Self { agent }
    }
}

impl Default for UreqSource {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl JsonSource for UreqSource {
    fn fetch_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let mut request = self.agent.get(url);
        for (name, value) in query {
            request = request.query(name, value);
        }

        let response = match request.call() {
            Ok(r) => r,
            Err(ureq::Error::Status(status, _)) => {
                return Err(FetchError::Status { url: url.to_string(), status });
            }
            // The transport error's own Display repeats the full URL, query
            // string and API key included, so only the kind is kept.
            Err(ureq::Error::Transport(t)) => {
                let message = match t.message() {
                    Some(m) => format!("{}: {}", t.kind(), m),
                    None => t.kind().to_string(),
                };
                return Err(FetchError::Transport { url: url.to_string(), message });
            }
        };

        tracing::debug!(url, status = response.status(), "upstream answered");
        response
            .into_json::<Value>()
            .map_err(|source| FetchError::Decode { url: url.to_string(), source })
    }
}

// ─── Payload helpers ────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accept `3.6`, `"3.6"` and `"3,6"`. Providers are not consistent.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| de::Error::custom(format!("not a number: '{}'", s))),
    }
}

pub(crate) fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "lenient_f64")] f64);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(v)| v))
}
