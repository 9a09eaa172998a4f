use async_trait::async_trait;
use pdpcore::{
    error::BackendError,
    policy::{
        Policy,
        StoredPolicy,
    },
    traits::PolicyBackend,
};
use sqlx::Row;

use crate::SqliteBackend;

pub(crate) async fn add_policy_sqlite(
    backend: &SqliteBackend,
    subject: &str,
    object: &str,
    action: &str,
) -> Result<i64, BackendError> {
    let id = sqlx::query(
        r#"
INSERT INTO policy (
    subject,
    object,
    action
)
VALUES ( ?1, ?2, ?3 )
        "#,
    )
    .bind(subject)
    .bind(object)
    .bind(action)
    .execute(&*backend.pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

async fn list_policies_sqlite(
    backend: &SqliteBackend,
) -> Result<Vec<StoredPolicy>, BackendError> {
    let recs = sqlx::query(r#"
SELECT
    id,
    subject,
    object,
    action
FROM
    policy
ORDER BY id
        "#,
    )
    .try_map(|row: sqlx::sqlite::SqliteRow| Ok(StoredPolicy {
        id: row.try_get("id")?,
        subject: row.try_get("subject")?,
        object: row.try_get("object")?,
        action: row.try_get("action")?,
    }))
    .fetch_all(&*backend.pool)
    .await?;
    Ok(recs)
}

#[async_trait]
impl PolicyBackend for SqliteBackend {
    async fn add_policy(
        &self,
        policy: &Policy,
    ) -> Result<i64, BackendError> {
        add_policy_sqlite(
            &self,
            &policy.subject,
            &policy.object,
            &policy.action,
        ).await
    }

    async fn list_policies(
        &self,
    ) -> Result<Vec<StoredPolicy>, BackendError> {
        list_policies_sqlite(&self).await
    }
}
