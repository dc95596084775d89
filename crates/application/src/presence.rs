//! 实时在线成员推送。
//!
//! 注册表是唯一持有连接映射的结构，所有读写都经过内部锁；
//! 连接断开时必须从所有小组里注销，否则映射会无界增长。

use std::collections::HashMap;
use std::sync::Arc;

use domain::{GroupId, GroupMember, UserId};
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use crate::{
    clock::Clock,
    dto::{ConcurrentMessage, ConcurrentUser},
    error::ApplicationError,
    repository::{GroupMemberRepository, UserRepository},
};

/// 单个连接的发送端。
pub type PresenceSender = mpsc::UnboundedSender<ConcurrentMessage>;

/// groupId -> (uid -> 连接发送端) 的受锁注册表。
#[derive(Default)]
pub struct PresenceRegistry {
    connections: RwLock<HashMap<GroupId, HashMap<UserId, PresenceSender>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, group_id: GroupId, uid: UserId, sender: PresenceSender) {
        let mut connections = self.connections.write().await;
        connections.entry(group_id).or_default().insert(uid, sender);
    }

    /// 将用户从所有小组注销，返回受影响的小组。
    pub async fn deregister_user(&self, uid: UserId) -> Vec<GroupId> {
        let mut connections = self.connections.write().await;
        let mut affected = Vec::new();
        connections.retain(|group_id, members| {
            if members.remove(&uid).is_some() {
                affected.push(*group_id);
            }
            !members.is_empty()
        });
        affected
    }

    pub async fn remove(&self, group_id: GroupId, uid: UserId) {
        let mut connections = self.connections.write().await;
        if let Some(members) = connections.get_mut(&group_id) {
            members.remove(&uid);
            if members.is_empty() {
                connections.remove(&group_id);
            }
        }
    }

    pub async fn senders_of(&self, group_id: GroupId) -> Vec<(UserId, PresenceSender)> {
        let connections = self.connections.read().await;
        connections
            .get(&group_id)
            .map(|members| {
                members
                    .iter()
                    .map(|(uid, sender)| (*uid, sender.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub struct PresenceBroadcasterDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub member_repository: Arc<dyn GroupMemberRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 在线成员快照广播器。
pub struct PresenceBroadcaster {
    registry: PresenceRegistry,
    deps: PresenceBroadcasterDependencies,
}

impl PresenceBroadcaster {
    pub fn new(deps: PresenceBroadcasterDependencies) -> Self {
        Self {
            registry: PresenceRegistry::new(),
            deps,
        }
    }

    /// 新连接接入：按权威成员记录注册到用户所属的每个小组，
    /// 并向这些小组的全部在线连接推送新快照。
    pub async fn connect(
        &self,
        uid: UserId,
        sender: PresenceSender,
    ) -> Result<Vec<GroupId>, ApplicationError> {
        let memberships = self.deps.member_repository.find_all_by_uid(uid).await?;
        let group_ids: Vec<GroupId> = memberships.iter().map(|member| member.group_id).collect();

        for group_id in &group_ids {
            self.registry.register(*group_id, uid, sender.clone()).await;
        }

        info!(uid = %uid, groups = group_ids.len(), "concurrent user connected");

        for group_id in &group_ids {
            self.broadcast_snapshot(*group_id).await?;
        }

        Ok(group_ids)
    }

    /// 连接断开：从所有小组注销并刷新受影响小组的快照。
    pub async fn disconnect(&self, uid: UserId) {
        let affected = self.registry.deregister_user(uid).await;

        info!(uid = %uid, groups = affected.len(), "concurrent user disconnected");

        for group_id in affected {
            if let Err(err) = self.broadcast_snapshot(group_id).await {
                warn!(group_id = %group_id, error = %err, "presence snapshot refresh failed");
            }
        }
    }

    /// 重算并推送一个小组的在线成员快照。
    /// 在线集合与权威成员记录取交集，解析失败的成员被丢弃。
    pub async fn broadcast_snapshot(&self, group_id: GroupId) -> Result<(), ApplicationError> {
        let connections = self.registry.senders_of(group_id).await;
        if connections.is_empty() {
            return Ok(());
        }

        let uids: Vec<UserId> = connections.iter().map(|(uid, _)| *uid).collect();

        let (users, members) = tokio::try_join!(
            async {
                self.deps
                    .user_repository
                    .find_all_by_ids(&uids)
                    .await
                    .map_err(ApplicationError::from)
            },
            async {
                self.deps
                    .member_repository
                    .find_all_by_group_and_uids(group_id, &uids)
                    .await
                    .map_err(ApplicationError::from)
            },
        )?;

        let member_by_uid: HashMap<UserId, GroupMember> = members
            .into_iter()
            .map(|member| (member.uid, member))
            .collect();

        let group_users: Vec<ConcurrentUser> = uids
            .iter()
            .filter_map(|uid| {
                let member = member_by_uid.get(uid)?;
                let info = users.get(uid)?;
                Some(ConcurrentUser {
                    group_user_id: member.id,
                    uid: *uid,
                    nickname: info.nickname.as_str().to_owned(),
                })
            })
            .collect();

        let message = ConcurrentMessage {
            timestamp: self.deps.clock.now(),
            group_id,
            group_users,
        };

        for (uid, sender) in connections {
            if sender.send(message.clone()).is_err() {
                // 发送端已关闭说明连接早已死亡，清掉残留注册
                self.registry.remove(group_id, uid).await;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ids() -> (GroupId, UserId) {
        (GroupId::from(Uuid::new_v4()), UserId::from(Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_register_and_deregister() {
        let registry = PresenceRegistry::new();
        let (group_id, uid) = ids();
        let (sender, _receiver) = mpsc::unbounded_channel();

        registry.register(group_id, uid, sender).await;
        assert_eq!(registry.senders_of(group_id).await.len(), 1);

        let affected = registry.deregister_user(uid).await;
        assert_eq!(affected, vec![group_id]);
        assert!(registry.senders_of(group_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_deregister_removes_user_from_every_group() {
        let registry = PresenceRegistry::new();
        let uid = UserId::from(Uuid::new_v4());
        let group_a = GroupId::from(Uuid::new_v4());
        let group_b = GroupId::from(Uuid::new_v4());
        let (sender, _receiver) = mpsc::unbounded_channel();

        registry.register(group_a, uid, sender.clone()).await;
        registry.register(group_b, uid, sender).await;

        let mut affected = registry.deregister_user(uid).await;
        affected.sort();
        let mut expected = vec![group_a, group_b];
        expected.sort();
        assert_eq!(affected, expected);
    }

    #[tokio::test]
    async fn test_remove_drops_empty_group_entry() {
        let registry = PresenceRegistry::new();
        let (group_id, uid) = ids();
        let (sender, _receiver) = mpsc::unbounded_channel();

        registry.register(group_id, uid, sender).await;
        registry.remove(group_id, uid).await;

        let connections = registry.connections.read().await;
        assert!(!connections.contains_key(&group_id));
    }
}
