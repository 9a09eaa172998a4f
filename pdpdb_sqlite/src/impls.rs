use pdpcore::platform::{ConnectorOption, PlatformUrl};
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::sync::Arc;

use crate::SqliteBackend;

impl PlatformUrl for SqliteBackend {
    fn url(&self) -> &str {
        self.url.as_ref()
    }
}

impl SqliteBackend {
    pub async fn connect(opts: &ConnectorOption) -> Result<SqliteBackend, sqlx::Error> {
        if opts.auto_create_db && !Sqlite::database_exists(&opts.url).await.unwrap_or(false) {
            log::warn!("sqlite database {} does not exist; creating...", &opts.url);
            Sqlite::create_database(&opts.url).await?
        }

        let pool = SqlitePool::connect(&opts.url).await?;
        Ok(SqliteBackend {
            pool: Arc::new(pool),
            url: opts.url.clone(),
        })
    }

    pub async fn migrate_pd(self) -> Result<Self, sqlx::Error> {
        sqlx::migrate!("./migrations").run(&*self.pool).await?;
        Ok(self)
    }

    /// Rejects further inserts of a tuple already stored.  Fails if the
    /// table already holds duplicates.
    pub async fn unique_policies(self) -> Result<Self, sqlx::Error> {
        sqlx::query(r#"
CREATE UNIQUE INDEX IF NOT EXISTS policy_unique_tuple
ON policy(subject, object, action)
        "#)
            .execute(&*self.pool)
            .await?;
        log::info!("uniqueness constraint on policy tuples is active");
        Ok(self)
    }

    /// Connect and prepare the schema for the policy decision platform.
    pub async fn pd(opts: &ConnectorOption) -> Result<Self, sqlx::Error> {
        let backend = SqliteBackend::connect(opts).await?
            .migrate_pd()
            .await?;
        if opts.unique_policies {
            backend.unique_policies().await
        } else {
            Ok(backend)
        }
    }
}

mod policy;

mod default_impl {
    use pdpcore::platform::DefaultPDPlatform;
    use crate::SqliteBackend;

    impl DefaultPDPlatform for SqliteBackend {}
}
