use crate::value_objects::{GroupId, MembershipId, Timestamp, UserId};

/// 小组成员记录。
/// 全局唯一约束：同一用户同一时刻至多持有一条成员记录。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroupMember {
    pub id: MembershipId,
    pub group_id: GroupId,
    pub uid: UserId,
    pub joined_at: Timestamp,
}

impl GroupMember {
    pub fn new(id: MembershipId, group_id: GroupId, uid: UserId, joined_at: Timestamp) -> Self {
        Self {
            id,
            group_id,
            uid,
            joined_at,
        }
    }
}
