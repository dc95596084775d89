//! 用户档案仓储实现

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use application::repository::UserRepository;
use domain::{Credential, Nickname, RepositoryError, UserId, UserProfile};

use crate::db::{map_sqlx_err, DbPool};

#[derive(Debug, FromRow)]
pub(crate) struct UserRecord {
    pub id: Uuid,
    pub nickname: String,
    pub level: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for UserProfile {
    type Error = RepositoryError;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let nickname = Nickname::parse(record.nickname)
            .map_err(|err| RepositoryError::storage(err.to_string()))?;
        UserProfile::restore(
            UserId::from(record.id),
            nickname,
            record.level,
            record.created_at,
            record.updated_at,
        )
        .map_err(|err| RepositoryError::storage(err.to_string()))
    }
}

pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, nickname, level, created_at, updated_at FROM user_info WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(UserProfile::try_from).transpose()
    }

    async fn find_all_by_ids(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, UserProfile>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw_ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT id, nickname, level, created_at, updated_at FROM user_info WHERE id = ANY($1)",
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records
            .into_iter()
            .map(|record| {
                let id = UserId::from(record.id);
                UserProfile::try_from(record).map(|user| (id, user))
            })
            .collect()
    }

    async fn create_with_credential(
        &self,
        user: UserProfile,
        credential: Credential,
    ) -> Result<UserProfile, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO user_info (id, nickname, level, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, nickname, level, created_at, updated_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.nickname.as_str())
        .bind(user.level)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        sqlx::query(
            r#"
            INSERT INTO credential_user_info (uid, username, password, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::from(credential.uid))
        .bind(&credential.username)
        .bind(credential.password.as_str())
        .bind(credential.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;

        UserProfile::try_from(record)
    }
}
