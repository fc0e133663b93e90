//! Error types and handling for the urban simulator API

use thiserror::Error;

/// Main error type for the urban simulator
#[derive(Error, Debug)]
pub enum UrbanSimError {
    /// The requested city or resource key is not served
    #[error("City not servable: '{requested}' (supported: {})", supported.join(", "))]
    NotServable {
        requested: String,
        supported: Vec<String>,
    },

    /// No API route matches the request path
    #[error("No route for '{path}'")]
    UnknownRoute { path: String },

    /// Malformed request parameters
    #[error("Invalid input for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Defects that must not be reported to clients in detail
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl UrbanSimError {
    /// Create a new not-servable error listing the supported cities
    pub fn not_servable<S: Into<String>>(requested: S, supported: Vec<String>) -> Self {
        Self::NotServable {
            requested: requested.into(),
            supported,
        }
    }

    /// Create a new unknown-route error
    pub fn unknown_route<S: Into<String>>(path: S) -> Self {
        Self::UnknownRoute { path: path.into() }
    }

    /// Create a new validation error for the given request field
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the message that may be shown to API clients
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            UrbanSimError::NotServable { supported, .. } => {
                format!(
                    "Cidade não disponível. Cidades suportadas: {}",
                    supported.join(", ")
                )
            }
            UrbanSimError::UnknownRoute { path } => {
                format!("Rota não encontrada: {path}")
            }
            UrbanSimError::Validation { field, message } => {
                format!("Parâmetro inválido '{field}': {message}")
            }
            UrbanSimError::Config { .. } | UrbanSimError::Internal { .. } | UrbanSimError::Io { .. } => {
                "Erro interno do servidor".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = UrbanSimError::not_servable("saopaulo", vec!["Brasília".to_string()]);
        assert!(matches!(err, UrbanSimError::NotServable { .. }));

        let err = UrbanSimError::validation("raio", "must be positive");
        assert!(matches!(err, UrbanSimError::Validation { .. }));

        let err = UrbanSimError::internal("estimator produced NaN");
        assert!(matches!(err, UrbanSimError::Internal { .. }));
    }

    #[test]
    fn test_user_messages() {
        let err = UrbanSimError::not_servable("saopaulo", vec!["Brasília".to_string()]);
        assert!(err.user_message().contains("Brasília"));

        let err = UrbanSimError::unknown_route("/api/desconhecido");
        assert!(err.user_message().contains("/api/desconhecido"));

        let err = UrbanSimError::validation("raio", "must be positive");
        let message = err.user_message();
        assert!(message.contains("raio"));
        assert!(message.contains("must be positive"));
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = UrbanSimError::internal("weights table corrupted at index 3");
        assert!(!err.user_message().contains("index 3"));

        let err = UrbanSimError::config("bad port");
        assert!(!err.user_message().contains("port"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: UrbanSimError = io_err.into();
        assert!(matches!(err, UrbanSimError::Io { .. }));
    }
}
