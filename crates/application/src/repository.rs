//! 仓储契约。
//!
//! 复合写入方法（`create_with_credential`、`save_with_new_member` 等）
//! 由实现方保证在单个事务内完成，失败时整体回滚。

use std::collections::HashMap;

use async_trait::async_trait;
use domain::{
    Credential, Group, GroupId, GroupMember, GroupScore, MembershipId, RepositoryError,
    UserId, UserProfile,
};

use crate::dto::PageRequest;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError>;

    async fn find_all_by_ids(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, UserProfile>, RepositoryError>;

    /// 原子地创建用户档案与登录凭证，两者不得只落一边。
    async fn create_with_credential(
        &self,
        user: UserProfile,
        credential: Credential,
    ) -> Result<UserProfile, RepositoryError>;
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn exists_by_username(&self, username: &str) -> Result<bool, RepositoryError>;

    async fn find_by_username(&self, username: &str)
        -> Result<Option<Credential>, RepositoryError>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError>;

    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, RepositoryError>;

    async fn find_by_id_and_owner(
        &self,
        id: GroupId,
        owner_uid: UserId,
    ) -> Result<Option<Group>, RepositoryError>;

    async fn find_page(&self, page: PageRequest) -> Result<(Vec<Group>, u64), RepositoryError>;

    async fn create(&self, group: Group) -> Result<Group, RepositoryError>;

    /// 保存小组（已含递增后的成员数）并插入成员记录，单事务。
    /// 事务内会重新校验容量，超员时以 [`RepositoryError::Conflict`] 中止。
    async fn save_with_new_member(
        &self,
        group: Group,
        member: GroupMember,
    ) -> Result<GroupMember, RepositoryError>;

    /// 保存小组（已含递减后的成员数或移交后的组长）并删除成员记录，单事务。
    async fn save_with_removed_member(
        &self,
        group: Group,
        membership_id: MembershipId,
    ) -> Result<(), RepositoryError>;

    /// 删除小组及最后一名成员的记录，单事务。
    async fn delete_with_member(
        &self,
        group_id: GroupId,
        membership_id: MembershipId,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait GroupMemberRepository: Send + Sync {
    async fn insert(&self, member: GroupMember) -> Result<GroupMember, RepositoryError>;

    async fn find_by_id(&self, id: MembershipId) -> Result<Option<GroupMember>, RepositoryError>;

    async fn find(
        &self,
        group_id: GroupId,
        uid: UserId,
    ) -> Result<Option<GroupMember>, RepositoryError>;

    async fn find_all_by_uid(&self, uid: UserId) -> Result<Vec<GroupMember>, RepositoryError>;

    async fn find_all_by_group_and_uids(
        &self,
        group_id: GroupId,
        uids: &[UserId],
    ) -> Result<Vec<GroupMember>, RepositoryError>;

    async fn find_by_uid_and_group_ids(
        &self,
        uid: UserId,
        group_ids: &[GroupId],
    ) -> Result<Vec<GroupMember>, RepositoryError>;

    async fn count_by_group(&self, group_id: GroupId) -> Result<u64, RepositoryError>;

    /// 按加入时间升序找出除指定用户外最早加入的成员（组长退出时的继任者）。
    async fn find_first_joined_excluding(
        &self,
        group_id: GroupId,
        excluded_uid: UserId,
    ) -> Result<Option<GroupMember>, RepositoryError>;
}

#[async_trait]
pub trait GroupScoreRepository: Send + Sync {
    async fn find_all_by_group(&self, group_id: GroupId)
        -> Result<Vec<GroupScore>, RepositoryError>;
}
