use pdpac::platform::{
    Builder,
    Platform,
};
use pdpdb_sqlite::SqliteBackend;
use std::sync::Arc;

pub async fn create_sqlite_backend() -> anyhow::Result<Arc<SqliteBackend>> {
    Ok(Arc::new(SqliteBackend::pd(&"sqlite::memory:".into()).await?))
}

/// A ready platform over a fresh in-memory store, along with the store
/// itself for out-of-band access.
pub async fn create_sqlite_platform() -> anyhow::Result<(Platform, Arc<SqliteBackend>)> {
    let backend = create_sqlite_backend().await?;
    let platform = Builder::new()
        .boxed_pd_platform(backend.clone())
        .build()?;
    platform.reload().await?;
    Ok((platform, backend))
}
