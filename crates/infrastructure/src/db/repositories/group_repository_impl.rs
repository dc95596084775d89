//! 小组仓储实现
//!
//! 复合写入方法各自打开一个事务，提交前完成全部语句；
//! 任何一步失败都随事务回滚。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use application::dto::PageRequest;
use application::repository::GroupRepository;
use domain::{Group, GroupId, GroupMember, MembershipId, RepositoryError, UserId};

use crate::db::repositories::group_member_repository_impl::GroupMemberRecord;
use crate::db::{map_sqlx_err, DbPool};

#[derive(Debug, FromRow)]
pub(crate) struct GroupRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_uid: Uuid,
    pub is_hidden: bool,
    pub join_code: Option<String>,
    pub user_count: i32,
    pub user_capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupRecord> for Group {
    fn from(record: GroupRecord) -> Self {
        Group {
            id: GroupId::from(record.id),
            name: record.name,
            description: record.description,
            owner_uid: UserId::from(record.owner_uid),
            is_hidden: record.is_hidden,
            join_code: record.join_code,
            user_count: record.user_count,
            user_capacity: record.user_capacity,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

const GROUP_COLUMNS: &str = "id, name, description, owner_uid, is_hidden, join_code, \
                             user_count, user_capacity, created_at, updated_at";

pub struct PgGroupRepository {
    pool: DbPool,
}

impl PgGroupRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn update_group(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        group: &Group,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE groups
            SET name = $2, description = $3, owner_uid = $4, is_hidden = $5,
                join_code = $6, user_count = $7, user_capacity = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(group.id))
        .bind(&group.name)
        .bind(&group.description)
        .bind(Uuid::from(group.owner_uid))
        .bind(group.is_hidden)
        .bind(&group.join_code)
        .bind(group.user_count)
        .bind(group.user_capacity)
        .bind(group.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_err)?;

        Ok(())
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM groups WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_err)?;

        Ok(exists)
    }

    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, RepositoryError> {
        let record = sqlx::query_as::<_, GroupRecord>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Group::from))
    }

    async fn find_by_id_and_owner(
        &self,
        id: GroupId,
        owner_uid: UserId,
    ) -> Result<Option<Group>, RepositoryError> {
        let record = sqlx::query_as::<_, GroupRecord>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1 AND owner_uid = $2"
        ))
        .bind(Uuid::from(id))
        .bind(Uuid::from(owner_uid))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Group::from))
    }

    async fn find_page(&self, page: PageRequest) -> Result<(Vec<Group>, u64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        let records = sqlx::query_as::<_, GroupRecord>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.size as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok((
            records.into_iter().map(Group::from).collect(),
            total as u64,
        ))
    }

    async fn create(&self, group: Group) -> Result<Group, RepositoryError> {
        let record = sqlx::query_as::<_, GroupRecord>(&format!(
            r#"
            INSERT INTO groups (id, name, description, owner_uid, is_hidden, join_code,
                                user_count, user_capacity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(Uuid::from(group.id))
        .bind(&group.name)
        .bind(&group.description)
        .bind(Uuid::from(group.owner_uid))
        .bind(group.is_hidden)
        .bind(&group.join_code)
        .bind(group.user_count)
        .bind(group.user_capacity)
        .bind(group.created_at)
        .bind(group.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(Group::from(record))
    }

    async fn save_with_new_member(
        &self,
        group: Group,
        member: GroupMember,
    ) -> Result<GroupMember, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        // 事务内按成员表重查容量，并发加入者只有一个能提交
        let current: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM group_user WHERE group_id = $1")
            .bind(Uuid::from(group.id))
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        if current >= group.user_capacity as i64 {
            return Err(RepositoryError::Conflict);
        }

        Self::update_group(&mut tx, &group).await?;

        let record = sqlx::query_as::<_, GroupMemberRecord>(
            r#"
            INSERT INTO group_user (id, group_id, uid, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, group_id, uid, created_at
            "#,
        )
        .bind(Uuid::from(member.id))
        .bind(Uuid::from(member.group_id))
        .bind(Uuid::from(member.uid))
        .bind(member.joined_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;

        Ok(GroupMember::from(record))
    }

    async fn save_with_removed_member(
        &self,
        group: Group,
        membership_id: MembershipId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        Self::update_group(&mut tx, &group).await?;

        let result = sqlx::query("DELETE FROM group_user WHERE id = $1")
            .bind(Uuid::from(membership_id))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn delete_with_member(
        &self,
        group_id: GroupId,
        membership_id: MembershipId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        sqlx::query("DELETE FROM group_user WHERE id = $1")
            .bind(Uuid::from(membership_id))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;

        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(Uuid::from(group_id))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }
}
