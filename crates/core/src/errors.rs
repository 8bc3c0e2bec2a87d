use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("interest score {0} is outside 0..=100")]
    InterestScoreOutOfRange(u8),
    #[error("product {product_id} is invalid: {reason}")]
    InvalidProduct { product_id: String, reason: String },
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("recommendation limit {limit} is outside 1..={max}")]
    LimitOutOfRange { limit: usize, max: usize },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// A collaborator (catalog, conversation store) failed; nothing was applied.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// What a caller outside the engine gets to see.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("invalid input: {detail}")]
    InvalidInput { detail: String },
    #[error("menu unavailable: {detail}")]
    Unavailable { detail: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "Your message could not be processed. Please try again.",
            Self::Unavailable { .. } => {
                "The menu is temporarily unavailable. Please retry shortly."
            }
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidInput { detail } | Self::Unavailable { detail } => detail,
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::InvalidInput { detail: error.to_string() },
            ApplicationError::Persistence(detail) => Self::Unavailable { detail },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn domain_errors_surface_as_invalid_input() {
        let interface = InterfaceError::from(ApplicationError::from(
            DomainError::LimitOutOfRange { limit: 50, max: 20 },
        ));

        assert!(matches!(interface, InterfaceError::InvalidInput { .. }));
        assert_eq!(interface.detail(), "recommendation limit 50 is outside 1..=20");
        assert_eq!(
            interface.user_message(),
            "Your message could not be processed. Please try again."
        );
    }

    #[test]
    fn persistence_failures_keep_their_detail() {
        let interface =
            InterfaceError::from(ApplicationError::Persistence("catalog offline".to_owned()));

        assert_eq!(interface, InterfaceError::Unavailable { detail: "catalog offline".to_owned() });
        assert_eq!(
            interface.user_message(),
            "The menu is temporarily unavailable. Please retry shortly."
        );
    }
}
