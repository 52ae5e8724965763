use thiserror::Error;

use crate::api::ApiError;
use crate::models::ItemKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Sign in to continue")]
    AuthenticationRequired,

    #[error("Could not save {kind} {id}: {source}")]
    SaveFailed {
        id: i64,
        kind: ItemKind,
        #[source]
        source: ApiError,
    },

    #[error("Could not unsave {kind} {id}: {source}")]
    UnsaveFailed {
        id: i64,
        kind: ItemKind,
        #[source]
        source: ApiError,
    },

    #[error("A change to {kind} {id} is already in progress")]
    MutationInFlight { id: i64, kind: ItemKind },

    #[error("Invalid preference value: {0}")]
    InvalidPreference(#[source] serde_json::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    /// Message suitable for a notification, without internal detail.
    pub fn user_message(&self) -> String {
        match self {
            Error::SaveFailed { kind, source, .. } | Error::UnsaveFailed { kind, source, .. } => {
                let verb = if matches!(self, Error::SaveFailed { .. }) {
                    "save"
                } else {
                    "remove"
                };
                match source {
                    ApiError::Network(_) => format!("Could not {} {}. Check your connection.", verb, kind),
                    ApiError::Unauthorized => "Session expired. Please sign in again.".to_string(),
                    _ => format!("Could not {} {}. Please try again.", verb, kind),
                }
            }
            Error::Api(ApiError::Network(_)) => "Network error. Check your connection.".to_string(),
            Error::Api(ApiError::Unauthorized) => "Session expired. Please sign in again.".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_status_detail() {
        let err = Error::SaveFailed {
            id: 42,
            kind: ItemKind::Event,
            source: ApiError::Rejected {
                status: 500,
                body: "stack trace".to_string(),
            },
        };
        assert_eq!(err.user_message(), "Could not save event. Please try again.");

        let err = Error::UnsaveFailed {
            id: 9,
            kind: ItemKind::Place,
            source: ApiError::Network("reset".to_string()),
        };
        assert_eq!(err.user_message(), "Could not remove place. Check your connection.");
    }
}
