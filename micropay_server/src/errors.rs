use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use micropay_engine::{traits::StorageError, ProvisioningError, RechargeFlowError};
use thiserror::Error;

/// The message returned to clients whenever an upstream service fails. The details are only logged.
pub const EXTERNAL_SERVICE_MESSAGE: &str = "A payment service is temporarily unavailable. Please try again later.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("Recharges are temporarily unavailable. Please try again later.")]
    InsufficientLiquidity,
    #[error("{EXTERNAL_SERVICE_MESSAGE}")]
    ExternalServiceError,
    #[error("{0}")]
    Conflict(String),
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
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientLiquidity => StatusCode::CONFLICT,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ExternalServiceError => StatusCode::BAD_GATEWAY,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("The X-Account-Id header is missing.")]
    MissingAccountHeader,
    #[error("The X-Account-Id header is not a valid account id.")]
    InvalidAccountHeader,
    #[error("Invalid webhook signature. {0}")]
    InvalidSignature(String),
}

impl From<StorageError> for ServerError {
    fn from(e: StorageError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<RechargeFlowError> for ServerError {
    fn from(e: RechargeFlowError) -> Self {
        match e {
            RechargeFlowError::Validation(e) => Self::ValidationError(e.to_string()),
            RechargeFlowError::AccountNotFound(id) => Self::NoRecordFound(format!("Account {id}")),
            RechargeFlowError::InsufficientLiquidity { .. } => Self::InsufficientLiquidity,
            RechargeFlowError::ExternalService(e) => {
                error!("💻️ Recharge failed because of an upstream service. {e}");
                Self::ExternalServiceError
            },
            RechargeFlowError::Storage(e) => e.into(),
        }
    }
}

impl From<ProvisioningError> for ServerError {
    fn from(e: ProvisioningError) -> Self {
        match e {
            ProvisioningError::Validation(msg) => Self::ValidationError(msg),
            ProvisioningError::Conflict(email) => Self::Conflict(format!("An account for {email} already exists")),
            ProvisioningError::WalletProvider(e) => {
                error!("💻️ Account creation failed because of the wallet provider. {e}");
                Self::ExternalServiceError
            },
            ProvisioningError::Storage(e) => e.into(),
        }
    }
}
