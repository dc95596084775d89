//! 登录凭证仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use application::repository::CredentialRepository;
use domain::{Credential, PasswordHash, RepositoryError, UserId};

use crate::db::{map_sqlx_err, DbPool};

#[derive(Debug, FromRow)]
struct CredentialRecord {
    uid: Uuid,
    username: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CredentialRecord> for Credential {
    type Error = RepositoryError;

    fn try_from(record: CredentialRecord) -> Result<Self, Self::Error> {
        let password = PasswordHash::new(record.password)
            .map_err(|err| RepositoryError::storage(err.to_string()))?;
        Credential::new(
            UserId::from(record.uid),
            record.username,
            password,
            record.created_at,
        )
        .map_err(|err| RepositoryError::storage(err.to_string()))
    }
}

pub struct PgCredentialRepository {
    pool: DbPool,
}

impl PgCredentialRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialRepository for PgCredentialRepository {
    async fn exists_by_username(&self, username: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM credential_user_info WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(exists)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Credential>, RepositoryError> {
        let record = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT uid, username, password, created_at
            FROM credential_user_info
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Credential::try_from).transpose()
    }
}
