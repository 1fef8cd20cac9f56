use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use market_engine::{CartApiError, OrderLedgerError, PaymentIntentError, ReconcileError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("An upstream service failed. {0}")]
    UpstreamError(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Internal and upstream details stay in the log
        let message = match status {
            StatusCode::BAD_GATEWAY => {
                error!("💻️ {self}");
                "An upstream service failed. Please try again later.".to_string()
            },
            s if s.is_server_error() => {
                error!("💻️ {self}");
                "An internal error occurred. Please try again later.".to_string()
            },
            _ => self.to_string(),
        };
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": message }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token has expired.")]
    TokenExpired,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::DatabaseError(s) => Self::BackendError(s),
            CartApiError::InvalidQuantity(_) | CartApiError::TotalOverflow => Self::ValidationError(e.to_string()),
            CartApiError::ProductNotFound(_) | CartApiError::ItemNotInCart(_) => Self::NoRecordFound(e.to_string()),
            CartApiError::ProductUnavailable(_) => Self::Conflict(e.to_string()),
            CartApiError::CatalogError(_) => Self::UpstreamError(e.to_string()),
        }
    }
}

impl From<OrderLedgerError> for ServerError {
    fn from(e: OrderLedgerError) -> Self {
        match e {
            OrderLedgerError::DatabaseError(s) => Self::BackendError(s),
            OrderLedgerError::MissingShippingAddress |
            OrderLedgerError::MissingBillingAddress |
            OrderLedgerError::InvalidPaymentMethod(_) |
            OrderLedgerError::InvalidStatus(_) |
            OrderLedgerError::EmptyCart |
            OrderLedgerError::ProductNotFound(_) |
            OrderLedgerError::ProductUnavailable(_) |
            OrderLedgerError::TotalOverflow => Self::ValidationError(e.to_string()),
            OrderLedgerError::CatalogError(_) => Self::UpstreamError(e.to_string()),
            OrderLedgerError::CartChanged => Self::Conflict(e.to_string()),
            OrderLedgerError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
        }
    }
}

impl From<PaymentIntentError> for ServerError {
    fn from(e: PaymentIntentError) -> Self {
        match e {
            PaymentIntentError::DatabaseError(s) => Self::BackendError(s),
            PaymentIntentError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentIntentError::InvalidAmount |
            PaymentIntentError::InvalidCurrency(_) |
            PaymentIntentError::AmountMismatch { .. } => Self::ValidationError(e.to_string()),
            PaymentIntentError::OrderNotPayable(..) | PaymentIntentError::DuplicateIntent(_) => {
                Self::Conflict(e.to_string())
            },
            PaymentIntentError::GatewayTimeout | PaymentIntentError::GatewayError(_) => {
                Self::UpstreamError(e.to_string())
            },
        }
    }
}

impl From<ReconcileError> for ServerError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::MissingSignature => Self::AuthenticationError(AuthError::MissingToken),
            ReconcileError::InvalidSignature(s) => Self::AuthenticationError(AuthError::ValidationError(s)),
            ReconcileError::MalformedEvent(s) => Self::InvalidRequestBody(s),
            e => Self::BackendError(e.to_string()),
        }
    }
}
