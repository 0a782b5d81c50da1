use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache invalidation failed: {0}")]
    InvalidationFailed(String),
}

impl From<moka::PredicateError> for CacheError {
    fn from(err: moka::PredicateError) -> Self {
        CacheError::InvalidationFailed(err.to_string())
    }
}
