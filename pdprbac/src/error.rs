#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The same store identifier was offered for two different tuples.
    #[error("policy id {0} is already assigned to a different tuple")]
    DuplicateId(i64),
    #[cfg(feature = "casbin")]
    #[error(transparent)]
    Casbin(#[from] casbin::Error),
}
