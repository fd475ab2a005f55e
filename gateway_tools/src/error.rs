use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The response did not contain the expected data. {0}")]
    EmptyResponse(String),
    #[error("Could not encrypt the entity secret: {0}")]
    Encryption(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl GatewayApiError {
    /// True if the request may succeed when repeated (network problems, rate limits and server-side errors).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RestResponseError(_) => true,
            Self::QueryError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("The signature header is missing or malformed. {0}")]
    MalformedHeader(String),
    #[error("The webhook timestamp is outside the tolerance window")]
    TimestampOutOfRange,
    #[error("No signature in the header matches the payload")]
    SignatureMismatch,
    #[error("The webhook signing secret cannot be used. {0}")]
    InvalidSecret(String),
    #[error("The webhook body is not a valid event. {0}")]
    MalformedEvent(String),
}
