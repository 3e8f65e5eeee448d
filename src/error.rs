use std::error::Error as StdError;

#[derive(Debug, thiserror::Error)]
pub enum FavoritesError<E: StdError + 'static> {
    #[error("no user is signed in")]
    Unauthenticated,
    #[error("failed to persist favorites")]
    Storage(#[source] E),
    #[error("failed to encode favorites")]
    Encode(#[source] serde_json::Error),
}

impl<E: StdError + 'static> FavoritesError<E> {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, FavoritesError::Unauthenticated)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError<E: StdError + 'static> {
    #[error("failed to access the stored session")]
    Storage(#[source] E),
    #[error("failed to encode the session")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("movie record has no id")]
    MissingId,
    #[error("movie id must be an integer or a string")]
    InvalidId,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a boolean, got {value:?}")]
    InvalidBool { name: &'static str, value: String },
}
