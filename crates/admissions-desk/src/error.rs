use crate::admissions::{ActionError, InvalidApplicationId, SubmitError, ValidationError};
use crate::api::ApiError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Client(ApiError),
    InvalidId(InvalidApplicationId),
    Validation(ValidationError),
    Action(ActionError),
    Io(std::io::Error),
    Export(csv::Error),
}

impl AppError {
    /// Short text shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidId(_) => "Invalid application id.".to_string(),
            AppError::Validation(err) => err.to_string(),
            AppError::Action(err) => err.user_message().to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Client(err) => write!(f, "client error: {}", err),
            AppError::InvalidId(err) => write!(f, "{}", err),
            AppError::Validation(err) => write!(f, "{}", err),
            AppError::Action(err) => write!(f, "{}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Client(err) => Some(err),
            AppError::InvalidId(err) => Some(err),
            AppError::Validation(err) => Some(err),
            AppError::Action(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Export(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Client(value)
    }
}

impl From<InvalidApplicationId> for AppError {
    fn from(value: InvalidApplicationId) -> Self {
        Self::InvalidId(value)
    }
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<ActionError> for AppError {
    fn from(value: ActionError) -> Self {
        Self::Action(value)
    }
}

impl From<SubmitError> for AppError {
    fn from(value: SubmitError) -> Self {
        match value {
            SubmitError::Validation(err) => Self::Validation(err),
            SubmitError::Action(err) => Self::Action(err),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Export(value)
    }
}
