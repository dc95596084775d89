//! 小组成员仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use application::repository::GroupMemberRepository;
use domain::{GroupId, GroupMember, MembershipId, RepositoryError, UserId};

use crate::db::{map_sqlx_err, DbPool};

#[derive(Debug, FromRow)]
pub(crate) struct GroupMemberRecord {
    pub id: Uuid,
    pub group_id: Uuid,
    pub uid: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<GroupMemberRecord> for GroupMember {
    fn from(record: GroupMemberRecord) -> Self {
        GroupMember::new(
            MembershipId::from(record.id),
            GroupId::from(record.group_id),
            UserId::from(record.uid),
            record.created_at,
        )
    }
}

const MEMBER_COLUMNS: &str = "id, group_id, uid, created_at";

pub struct PgGroupMemberRepository {
    pool: DbPool,
}

impl PgGroupMemberRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupMemberRepository for PgGroupMemberRepository {
    async fn insert(&self, member: GroupMember) -> Result<GroupMember, RepositoryError> {
        let record = sqlx::query_as::<_, GroupMemberRecord>(&format!(
            r#"
            INSERT INTO group_user (id, group_id, uid, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(Uuid::from(member.id))
        .bind(Uuid::from(member.group_id))
        .bind(Uuid::from(member.uid))
        .bind(member.joined_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(GroupMember::from(record))
    }

    async fn find_by_id(&self, id: MembershipId) -> Result<Option<GroupMember>, RepositoryError> {
        let record = sqlx::query_as::<_, GroupMemberRecord>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM group_user WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(GroupMember::from))
    }

    async fn find(
        &self,
        group_id: GroupId,
        uid: UserId,
    ) -> Result<Option<GroupMember>, RepositoryError> {
        let record = sqlx::query_as::<_, GroupMemberRecord>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM group_user WHERE group_id = $1 AND uid = $2"
        ))
        .bind(Uuid::from(group_id))
        .bind(Uuid::from(uid))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(GroupMember::from))
    }

    async fn find_all_by_uid(&self, uid: UserId) -> Result<Vec<GroupMember>, RepositoryError> {
        let records = sqlx::query_as::<_, GroupMemberRecord>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM group_user WHERE uid = $1"
        ))
        .bind(Uuid::from(uid))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(GroupMember::from).collect())
    }

    async fn find_all_by_group_and_uids(
        &self,
        group_id: GroupId,
        uids: &[UserId],
    ) -> Result<Vec<GroupMember>, RepositoryError> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_uids: Vec<Uuid> = uids.iter().copied().map(Uuid::from).collect();
        let records = sqlx::query_as::<_, GroupMemberRecord>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM group_user WHERE group_id = $1 AND uid = ANY($2)"
        ))
        .bind(Uuid::from(group_id))
        .bind(&raw_uids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(GroupMember::from).collect())
    }

    async fn find_by_uid_and_group_ids(
        &self,
        uid: UserId,
        group_ids: &[GroupId],
    ) -> Result<Vec<GroupMember>, RepositoryError> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids: Vec<Uuid> = group_ids.iter().copied().map(Uuid::from).collect();
        let records = sqlx::query_as::<_, GroupMemberRecord>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM group_user WHERE uid = $1 AND group_id = ANY($2)"
        ))
        .bind(Uuid::from(uid))
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(GroupMember::from).collect())
    }

    async fn count_by_group(&self, group_id: GroupId) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_user WHERE group_id = $1")
            .bind(Uuid::from(group_id))
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(count as u64)
    }

    async fn find_first_joined_excluding(
        &self,
        group_id: GroupId,
        excluded_uid: UserId,
    ) -> Result<Option<GroupMember>, RepositoryError> {
        let record = sqlx::query_as::<_, GroupMemberRecord>(&format!(
            r#"
            SELECT {MEMBER_COLUMNS} FROM group_user
            WHERE group_id = $1 AND uid <> $2
            ORDER BY created_at ASC
            LIMIT 1
            "#
        ))
        .bind(Uuid::from(group_id))
        .bind(Uuid::from(excluded_uid))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(GroupMember::from))
    }
}
