//! 对外数据传输对象。

use domain::{Group, GroupId, MembershipId, Timestamp, UserId, UserProfile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInfoResponse {
    pub id: UserId,
    pub nickname: String,
    pub level: i32,
    pub max_level: bool,
}

impl From<&UserProfile> for UserInfoResponse {
    fn from(user: &UserProfile) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname.as_str().to_owned(),
            level: user.level,
            max_level: user.max_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub is_hidden: bool,
    pub join_code: Option<String>,
    pub user_capacity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateGroupResponse {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub owner_uid: UserId,
    pub is_hidden: bool,
    pub user_count: i32,
    pub user_capacity: i32,
}

impl From<&Group> for CreateGroupResponse {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            description: group.description.clone(),
            owner_uid: group.owner_uid,
            is_hidden: group.is_hidden,
            user_count: group.user_count,
            user_capacity: group.user_capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinGroupResponse {
    pub group_id: GroupId,
    pub uid: UserId,
    pub group_user_id: MembershipId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRankEntry {
    pub group_user_id: MembershipId,
    pub name: String,
    pub rank: u32,
    pub score: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetGroupResponse {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub owner_uid: UserId,
    /// 组长昵称
    pub owner_name: String,
    pub is_hidden: bool,
    /// 仅组长可见
    pub join_code: Option<String>,
    pub user_count: i32,
    pub user_capacity: i32,
    /// 公开小组附带前五名排名
    pub ranks: Option<Vec<GroupRankEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetGroupRanksResponse {
    pub group_id: GroupId,
    pub ranks: Vec<GroupRankEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchGroupResponse {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub owner_uid: UserId,
    pub is_hidden: bool,
    pub user_count: i32,
    pub user_capacity: i32,
    /// 调用者是否已是该小组成员（仅供展示）
    pub has_joined: bool,
}

impl SearchGroupResponse {
    pub fn from_group(group: &Group, has_joined: bool) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            description: group.description.clone(),
            owner_uid: group.owner_uid,
            is_hidden: group.is_hidden,
            user_count: group.user_count,
            user_capacity: group.user_capacity,
            has_joined,
        }
    }
}

/// 分页请求，页码从 0 开始。
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "PageRequest::default_size")]
    pub size: u32,
}

impl PageRequest {
    pub const MAX_SIZE: u32 = 100;

    fn default_size() -> u32 {
        20
    }

    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// 将页大小钳制到合法区间。
    pub fn normalized(self) -> Self {
        Self {
            page: self.page,
            size: self.size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::default_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    pub fn new(content: Vec<T>, page: PageRequest, total_elements: u64) -> Self {
        let total_pages = if page.size == 0 {
            0
        } else {
            total_elements.div_ceil(page.size as u64)
        };
        Self {
            content,
            page: page.page,
            size: page.size,
            total_elements,
            total_pages,
        }
    }
}

/// 实时在线成员快照里的单个成员。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrentUser {
    pub group_user_id: MembershipId,
    pub uid: UserId,
    pub nickname: String,
}

/// 推送给小组所有在线连接的实时快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrentMessage {
    pub timestamp: Timestamp,
    pub group_id: GroupId,
    pub group_users: Vec<ConcurrentUser>,
}
