use async_trait::async_trait;
use crate::{
    error::BackendError,
    policy::{
        Policy,
        Request,
        StoredPolicy,
    },
};

/// Durable persistence of policy tuples.
#[async_trait]
pub trait PolicyBackend {
    /// Persist one tuple, returning the identifier assigned by the store.
    async fn add_policy(
        &self,
        policy: &Policy,
    ) -> Result<i64, BackendError>;
    /// Every tuple currently persisted, ordered by identifier.
    async fn list_policies(
        &self,
    ) -> Result<Vec<StoredPolicy>, BackendError>;
}

/// Decides whether a request is permitted.
///
/// Implementations other than the exact triple matcher (e.g. one that
/// resolves role inheritance) plug in here.
pub trait Enforcer {
    type Error;

    fn enforce(&self, request: &Request) -> Result<bool, Self::Error>;
}
