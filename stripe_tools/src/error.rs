use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Stripe could not be reached: {0}")]
    Unreachable(String),
    #[error("The request to Stripe timed out")]
    Timeout,
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The Stripe-Signature header is malformed: {0}")]
    MalformedSignatureHeader(String),
    #[error("The webhook timestamp is outside the tolerance window")]
    StaleTimestamp,
    #[error("No signature in the header matches the payload")]
    SignatureMismatch,
}

impl StripeApiError {
    /// True if the failure was a signature problem rather than a transport or parsing problem.
    pub fn is_signature_error(&self) -> bool {
        matches!(self, Self::MalformedSignatureHeader(_) | Self::StaleTimestamp | Self::SignatureMismatch)
    }
}

impl From<reqwest::Error> for StripeApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Unreachable(e.to_string())
        }
    }
}
