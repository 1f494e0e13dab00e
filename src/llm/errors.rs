use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} API request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Failed to parse {provider} response: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned empty response")]
    EmptyResponse { provider: &'static str },
    #[error("No LLM API key configured: set {0}")]
    MissingApiKey(&'static str),
    #[error("Answer request admission was closed")]
    AdmissionClosed,
}
