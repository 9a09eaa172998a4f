use pdpcore::error::{
    BackendError,
    ValidationError,
};
use std::time::Duration;
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("store did not respond within {0:?}")]
    StoreTimeout(Duration),
    #[error("policy set is not ready")]
    NotReady,
    /// The durable store and the live policy set no longer agree.
    #[error("store and policy set diverged: {0}")]
    InternalInconsistency(String),
    #[error("missing required argument: {0}")]
    Misconfiguration(&'static str),
    #[error(transparent)]
    Rbac(#[from] pdprbac::error::Error),
}

impl Error {
    /// Whether the caller may reasonably retry the same operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend(e) => e.is_retryable(),
            Self::StoreTimeout(_) | Self::NotReady => true,
            _ => false,
        }
    }
}
