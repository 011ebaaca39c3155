#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("an application id is required")]
    MissingApplicationId,

    #[error("an api key is required")]
    MissingApiKey,

    #[error("at least one host is required")]
    NoHosts,

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[source] http::header::InvalidHeaderValue),

    #[error("http client build failed: {0}")]
    HttpClientBuild(#[source] reqwest::Error),

    #[error("invalid application id or API key")]
    InvalidCredentials,

    #[error("resource does not exist")]
    NotFound,

    #[error("hosts unreachable")]
    HostsUnreachable,

    #[error("request json encode failed: {0}")]
    JsonEncode(#[source] serde_json::Error),

    #[error("object is missing a non-empty objectID")]
    MissingObjectId,

    #[error("index name must not be empty")]
    MissingIndexName,

    #[error("API key value must not be empty")]
    MissingUserKey,

    #[error("unexpected response: {0}")]
    UnexpectedResponse(serde_json::Value),
}

/// Failure of a single attempt against one host.
///
/// The dispatcher treats every variant as transient and moves on to the next
/// host, so these never reach callers of `execute`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("response body read failed: {0}")]
    ResponseBody(#[source] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
