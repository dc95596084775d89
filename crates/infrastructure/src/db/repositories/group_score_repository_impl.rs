//! 小组得分仓储实现（只读）

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use application::repository::GroupScoreRepository;
use domain::{GroupId, GroupScore, MembershipId, RepositoryError, UserId};

use crate::db::{map_sqlx_err, DbPool};

#[derive(Debug, FromRow)]
struct GroupScoreRecord {
    group_user_id: Uuid,
    uid: Uuid,
    group_id: Uuid,
    score: Option<i64>,
}

impl From<GroupScoreRecord> for GroupScore {
    fn from(record: GroupScoreRecord) -> Self {
        GroupScore {
            membership_id: MembershipId::from(record.group_user_id),
            uid: UserId::from(record.uid),
            group_id: GroupId::from(record.group_id),
            score: record.score,
        }
    }
}

pub struct PgGroupScoreRepository {
    pool: DbPool,
}

impl PgGroupScoreRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupScoreRepository for PgGroupScoreRepository {
    async fn find_all_by_group(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<GroupScore>, RepositoryError> {
        let records = sqlx::query_as::<_, GroupScoreRecord>(
            r#"
            SELECT group_user_id, uid, group_id, score
            FROM group_user_score
            WHERE group_id = $1
            "#,
        )
        .bind(Uuid::from(group_id))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(GroupScore::from).collect())
    }
}
