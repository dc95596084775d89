//! 单元测试用的内存仓储与测试替身。
//!
//! 复合写入方法在这里用一把写锁模拟事务的原子性，并复刻数据库侧的
//! 唯一约束（小组名、全局唯一成员记录）与容量复查。

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use domain::{
    Credential, Group, GroupId, GroupMember, GroupScore, MembershipId, PasswordHash,
    RepositoryError, Timestamp, TokenPayload, UserId, UserProfile, ACCESS_TOKEN_TYPE,
};
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::dto::PageRequest;
use crate::password::{PasswordHasher, PasswordHasherError};
use crate::repository::{
    CredentialRepository, GroupMemberRepository, GroupRepository, GroupScoreRepository,
    UserRepository,
};
use crate::token::{TokenError, TokenService};

#[derive(Default)]
pub struct InMemoryStore {
    pub users: RwLock<HashMap<UserId, UserProfile>>,
    pub credentials: RwLock<HashMap<String, Credential>>,
    pub groups: RwLock<HashMap<GroupId, Group>>,
    pub members: RwLock<HashMap<MembershipId, GroupMember>>,
    pub scores: RwLock<Vec<GroupScore>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn member_count(&self, group_id: GroupId) -> u64 {
        let members = self.members.read().await;
        members
            .values()
            .filter(|member| member.group_id == group_id)
            .count() as u64
    }

    pub async fn group(&self, group_id: GroupId) -> Option<Group> {
        self.groups.read().await.get(&group_id).cloned()
    }

    pub async fn push_score(&self, score: GroupScore) {
        self.scores.write().await.push(score);
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_all_by_ids(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, UserProfile>, RepositoryError> {
        let users = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(|user| (*id, user.clone())))
            .collect())
    }

    async fn create_with_credential(
        &self,
        user: UserProfile,
        credential: Credential,
    ) -> Result<UserProfile, RepositoryError> {
        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(&credential.username) {
            return Err(RepositoryError::Conflict);
        }
        credentials.insert(credential.username.clone(), credential);
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl CredentialRepository for InMemoryStore {
    async fn exists_by_username(&self, username: &str) -> Result<bool, RepositoryError> {
        Ok(self.credentials.read().await.contains_key(username))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Credential>, RepositoryError> {
        Ok(self.credentials.read().await.get(username).cloned())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .groups
            .read()
            .await
            .values()
            .any(|group| group.name == name))
    }

    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, RepositoryError> {
        Ok(self.groups.read().await.get(&id).cloned())
    }

    async fn find_by_id_and_owner(
        &self,
        id: GroupId,
        owner_uid: UserId,
    ) -> Result<Option<Group>, RepositoryError> {
        Ok(self
            .groups
            .read()
            .await
            .get(&id)
            .filter(|group| group.owner_uid == owner_uid)
            .cloned())
    }

    async fn find_page(&self, page: PageRequest) -> Result<(Vec<Group>, u64), RepositoryError> {
        let groups = self.groups.read().await;
        let mut all: Vec<Group> = groups.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = all.len() as u64;
        let start = page.offset() as usize;
        let content = if start >= all.len() {
            Vec::new()
        } else {
            let end = (start + page.size as usize).min(all.len());
            all[start..end].to_vec()
        };
        Ok((content, total))
    }

    async fn create(&self, group: Group) -> Result<Group, RepositoryError> {
        let mut groups = self.groups.write().await;
        if groups.values().any(|existing| existing.name == group.name) {
            return Err(RepositoryError::Conflict);
        }
        groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn save_with_new_member(
        &self,
        group: Group,
        member: GroupMember,
    ) -> Result<GroupMember, RepositoryError> {
        // 锁序固定为 groups -> members
        let mut groups = self.groups.write().await;
        let mut members = self.members.write().await;

        // 复刻数据库事务内的容量复查与全局唯一成员约束
        let current = members
            .values()
            .filter(|existing| existing.group_id == group.id)
            .count() as i32;
        if current >= group.user_capacity {
            return Err(RepositoryError::Conflict);
        }
        if members.values().any(|existing| existing.uid == member.uid) {
            return Err(RepositoryError::Conflict);
        }

        members.insert(member.id, member.clone());
        groups.insert(group.id, group);
        Ok(member)
    }

    async fn save_with_removed_member(
        &self,
        group: Group,
        membership_id: MembershipId,
    ) -> Result<(), RepositoryError> {
        let mut groups = self.groups.write().await;
        let mut members = self.members.write().await;
        if members.remove(&membership_id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        groups.insert(group.id, group);
        Ok(())
    }

    async fn delete_with_member(
        &self,
        group_id: GroupId,
        membership_id: MembershipId,
    ) -> Result<(), RepositoryError> {
        let mut groups = self.groups.write().await;
        let mut members = self.members.write().await;
        if groups.remove(&group_id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        members.remove(&membership_id);
        Ok(())
    }
}

#[async_trait]
impl GroupMemberRepository for InMemoryStore {
    async fn insert(&self, member: GroupMember) -> Result<GroupMember, RepositoryError> {
        let mut members = self.members.write().await;
        if members.values().any(|existing| existing.uid == member.uid) {
            return Err(RepositoryError::Conflict);
        }
        members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn find_by_id(&self, id: MembershipId) -> Result<Option<GroupMember>, RepositoryError> {
        Ok(self.members.read().await.get(&id).cloned())
    }

    async fn find(
        &self,
        group_id: GroupId,
        uid: UserId,
    ) -> Result<Option<GroupMember>, RepositoryError> {
        Ok(self
            .members
            .read()
            .await
            .values()
            .find(|member| member.group_id == group_id && member.uid == uid)
            .cloned())
    }

    async fn find_all_by_uid(&self, uid: UserId) -> Result<Vec<GroupMember>, RepositoryError> {
        Ok(self
            .members
            .read()
            .await
            .values()
            .filter(|member| member.uid == uid)
            .cloned()
            .collect())
    }

    async fn find_all_by_group_and_uids(
        &self,
        group_id: GroupId,
        uids: &[UserId],
    ) -> Result<Vec<GroupMember>, RepositoryError> {
        Ok(self
            .members
            .read()
            .await
            .values()
            .filter(|member| member.group_id == group_id && uids.contains(&member.uid))
            .cloned()
            .collect())
    }

    async fn find_by_uid_and_group_ids(
        &self,
        uid: UserId,
        group_ids: &[GroupId],
    ) -> Result<Vec<GroupMember>, RepositoryError> {
        Ok(self
            .members
            .read()
            .await
            .values()
            .filter(|member| member.uid == uid && group_ids.contains(&member.group_id))
            .cloned()
            .collect())
    }

    async fn count_by_group(&self, group_id: GroupId) -> Result<u64, RepositoryError> {
        Ok(self.member_count(group_id).await)
    }

    async fn find_first_joined_excluding(
        &self,
        group_id: GroupId,
        excluded_uid: UserId,
    ) -> Result<Option<GroupMember>, RepositoryError> {
        Ok(self
            .members
            .read()
            .await
            .values()
            .filter(|member| member.group_id == group_id && member.uid != excluded_uid)
            .min_by_key(|member| (member.joined_at, member.uid))
            .cloned())
    }
}

#[async_trait]
impl GroupScoreRepository for InMemoryStore {
    async fn find_all_by_group(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<GroupScore>, RepositoryError> {
        Ok(self
            .scores
            .read()
            .await
            .iter()
            .filter(|score| score.group_id == group_id)
            .cloned()
            .collect())
    }
}

/// 每次读取都前进一秒的时钟，保证加入时间可比较。
pub struct SteppingClock {
    now: Mutex<Timestamp>,
}

impl SteppingClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> Timestamp {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(1);
        *now
    }
}

/// 明文拼接的密码哈希替身。
pub struct FakePasswordHasher;

#[async_trait]
impl PasswordHasher for FakePasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("hashed::{plaintext}"))
            .map_err(|err| PasswordHasherError::hash_error(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(hashed.as_str() == format!("hashed::{plaintext}"))
    }
}

/// 令牌服务替身：签发即登记，校验即查表。
#[derive(Default)]
pub struct FakeTokenService {
    issued: Mutex<HashMap<String, TokenPayload>>,
}

impl FakeTokenService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 手工铸造任意类型的令牌，用于类型门控测试。
    pub fn mint(&self, uid: UserId, token_type: &str) -> String {
        let token = format!("tok-{}-{}", token_type, uid);
        let payload = TokenPayload {
            id: uid,
            aud: "groupfit".to_string(),
            iss: "groupfit-server".to_string(),
            exp: 0,
            token_type: token_type.to_string(),
        };
        self.issued.lock().unwrap().insert(token.clone(), payload);
        token
    }
}

impl TokenService for FakeTokenService {
    fn issue(&self, uid: UserId) -> Result<String, TokenError> {
        Ok(self.mint(uid, ACCESS_TOKEN_TYPE))
    }

    fn verify(&self, token: &str) -> Result<TokenPayload, TokenError> {
        self.issued
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| TokenError::invalid("unknown token"))
    }
}
