use pdpcore::{
    error::BackendError,
    platform::PDPlatform,
};
#[cfg(feature = "sqlite")]
use pdpdb_sqlite::SqliteBackend;
use std::sync::Arc;

pub use pdpcore::platform::ConnectorOption;

pub struct Backend;

#[derive(Clone, Debug, PartialEq)]
pub struct Error(String);

#[derive(Debug)]
enum BackendKind {
    Sqlite,
}

mod display {
    use super::{BackendKind, Error};
    use std::fmt::{Display, Formatter, Result};

    impl Display for BackendKind {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            match self {
                Self::Sqlite => "sqlite".fmt(f),
            }
        }
    }

    impl Display for Error {
        fn fmt(&self, f: &mut Formatter<'_>) -> Result {
            self.0.fmt(f)
        }
    }

    impl std::error::Error for Error {}
}

impl TryFrom<&str> for BackendKind {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.split(':').next() {
            Some("sqlite") => Ok(BackendKind::Sqlite),
            _ => Err(Error(format!("The connection string {s:?} is unsupported.")))
        }
    }
}

async fn connect_once(
    kind: &BackendKind,
    opts: &ConnectorOption,
) -> Result<Arc<dyn PDPlatform>, BackendError> {
    match kind {
        #[cfg(feature = "sqlite")]
        BackendKind::Sqlite => Ok(Arc::new(SqliteBackend::pd(opts).await?)),
        #[cfg(not(feature = "sqlite"))]
        s => Err(BackendError::AppInvariantViolation(format!(
            "The feature {s:?} must be enabled for pdpdb in order to connect to {:?}",
            opts.url,
        ))),
    }
}

/// Retry `connect` with a fixed delay for as long as it fails with a
/// retryable error, up to `attempts` attempts in total.
async fn retry<T, F, Fut>(
    attempts: u32,
    delay: std::time::Duration,
    mut connect: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, BackendError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match connect().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < attempts => {
                log::warn!(
                    "connection attempt {attempt}/{attempts} failed: {e}; \
                    retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                log::error!("giving up on connection after {attempt} attempt(s): {e}");
                return Err(e);
            }
        }
    }
}

impl Backend {
    pub async fn pd(
        opts: ConnectorOption,
    ) -> Result<Arc<dyn PDPlatform>, Box<dyn std::error::Error + Send + Sync + 'static>> {
        let kind = BackendKind::try_from(opts.url.as_str())?;
        log::info!("connecting to {kind} store");
        let platform = retry(
            opts.connect_attempts,
            opts.connect_delay,
            || connect_once(&kind, &opts),
        ).await?;
        log::info!("database connection successful");
        Ok(platform)
    }
}

/// Command line and environment arguments for connecting to the store.
#[cfg(feature = "clap")]
#[derive(Clone, Debug, clap::Args)]
pub struct ConnectorArgs {
    #[clap(long, value_name = "DB_DSN", env = "DB_DSN")]
    pub db_dsn: String,
    #[clap(long, value_name = "DB_CONNECT_ATTEMPTS", env = "DB_CONNECT_ATTEMPTS", default_value = "10")]
    pub db_connect_attempts: u32,
    #[clap(long, value_name = "DB_CONNECT_DELAY_MS", env = "DB_CONNECT_DELAY_MS", default_value = "1000")]
    pub db_connect_delay_ms: u64,
    #[clap(long, env = "DB_UNIQUE_POLICIES")]
    pub db_unique_policies: bool,
}

#[cfg(feature = "clap")]
impl ConnectorArgs {
    pub fn connector_option(&self) -> ConnectorOption {
        ConnectorOption::new()
            .url(self.db_dsn.clone())
            .auto_create_db(true)
            .unique_policies(self.db_unique_policies)
            .connect_attempts(self.db_connect_attempts)
            .connect_delay(std::time::Duration::from_millis(self.db_connect_delay_ms))
    }
}
