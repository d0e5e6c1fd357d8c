use crate::favorites::FavoritesError;
use crate::model::ValidationError;
use crate::providers::ProviderError;
use crate::report::ReportError;

pub const USER_FACING_WEATHER_ERROR: &str = "Failed to load weather data. Please try again.";
pub const USER_FACING_FORECAST_ERROR: &str = "Failed to load forecast data. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    User,
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::User,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Runtime,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind {
            ErrorKind::User => 2,
            ErrorKind::Runtime => 1,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::user(value.to_string())
    }
}

impl From<ProviderError> for AppError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::MissingApiKey => Self::user(value.to_string()),
            other => Self::runtime(other.to_string()),
        }
    }
}

impl From<FavoritesError> for AppError {
    fn from(value: FavoritesError) -> Self {
        match value {
            FavoritesError::NotConfigured | FavoritesError::Validation(_) => {
                Self::user(value.to_string())
            }
            other => Self::runtime(other.to_string()),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(value: ReportError) -> Self {
        Self::user(value.to_string())
    }
}
