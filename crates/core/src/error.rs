use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Message returned to callers for failures whose detail must stay internal.
pub const GENERIC_FAILURE_MESSAGE: &str = "An internal error occurred";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::Validation(format!("missing required field `{field}`"))
    }

    /// Whether the error's own message may be shown to the end user.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Validation(_)
                | Self::Permission(_)
                | Self::InvalidTransition { .. }
        )
    }

    /// Message suitable for the end user. Collaborator and storage failures
    /// collapse into a generic message; their detail only goes to the logs.
    pub fn user_message(&self) -> String {
        if self.is_user_visible() {
            self.to_string()
        } else {
            GENERIC_FAILURE_MESSAGE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_visible_errors_keep_message() {
        let err = EngineError::not_found("campaign", "c-1");
        assert!(err.is_user_visible());
        assert_eq!(err.user_message(), "campaign not found: c-1");

        let err = EngineError::missing_field("brief");
        assert_eq!(
            err.user_message(),
            "Validation error: missing required field `brief`"
        );
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let err = EngineError::Persistence("connection refused to 10.0.0.3".into());
        assert!(!err.is_user_visible());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);

        let err = EngineError::ExternalService("HTTP 503 from model".into());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }
}
