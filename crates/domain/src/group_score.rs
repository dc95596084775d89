use crate::value_objects::{GroupId, MembershipId, UserId};

/// 小组成员的活动得分。
/// 得分由外部的活动统计子系统写入，本系统只读；
/// `score` 为空表示该成员尚未参与排名。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroupScore {
    pub membership_id: MembershipId,
    pub uid: UserId,
    pub group_id: GroupId,
    pub score: Option<i64>,
}

impl GroupScore {
    pub fn is_ranked(&self) -> bool {
        self.score.is_some()
    }
}
