use crate::errors::DomainError;
use crate::value_objects::{GroupId, Timestamp, UserId};

/// 运动小组。
///
/// 不变量：
/// - `user_count` 始终在 `0..=user_capacity` 区间内
/// - 隐藏小组必须持有加入码
/// - `owner_uid` 指向的用户必须是小组成员
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub owner_uid: UserId,
    pub is_hidden: bool,
    #[serde(skip_serializing)] // 加入码只在响应构建时按权限放出
    pub join_code: Option<String>,
    pub user_count: i32,
    pub user_capacity: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Group {
    /// 创建新小组，创建者即组长，成员数从 1 开始。
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: GroupId,
        name: impl Into<String>,
        description: Option<String>,
        owner_uid: UserId,
        is_hidden: bool,
        join_code: Option<String>,
        user_capacity: i32,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let name = Self::validate_name(name.into())?;
        if user_capacity < 1 {
            return Err(DomainError::invalid_argument(
                "user_capacity",
                "must be at least 1",
            ));
        }
        if is_hidden && join_code.as_deref().map_or(true, |c| c.trim().is_empty()) {
            return Err(DomainError::invalid_argument(
                "join_code",
                "hidden group requires a join code",
            ));
        }
        Ok(Self {
            id,
            name,
            description,
            owner_uid,
            is_hidden,
            join_code,
            user_count: 1,
            user_capacity,
            created_at,
            updated_at: created_at,
        })
    }

    /// 隐藏小组校验加入码；公开小组总是放行。
    pub fn join_code_matches(&self, code: Option<&str>) -> bool {
        if !self.is_hidden {
            return true;
        }
        match (&self.join_code, code) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }

    /// 接纳一名新成员，容量已满时拒绝。
    pub fn admit_member(&mut self, now: Timestamp) -> Result<(), DomainError> {
        if self.user_count >= self.user_capacity {
            return Err(DomainError::ExceedGroupUserCount);
        }
        self.user_count += 1;
        self.updated_at = now;
        Ok(())
    }

    /// 释放一名成员，计数下限为 0。
    pub fn release_member(&mut self, now: Timestamp) {
        self.user_count = (self.user_count - 1).max(0);
        self.updated_at = now;
    }

    /// 组长退出时将所有权移交给指定成员。
    pub fn transfer_owner(&mut self, uid: UserId, now: Timestamp) {
        self.owner_uid = uid;
        self.updated_at = now;
    }

    pub fn is_owner(&self, uid: UserId) -> bool {
        self.owner_uid == uid
    }

    fn validate_name(name: String) -> Result<String, DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_argument(
                "group_name",
                "cannot be empty",
            ));
        }
        if trimmed.len() > 60 {
            return Err(DomainError::invalid_argument("group_name", "too long"));
        }
        Ok(trimmed.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn group(is_hidden: bool, join_code: Option<&str>, capacity: i32) -> Group {
        Group::create(
            GroupId::from(Uuid::new_v4()),
            "morning-runners",
            None,
            UserId::from(Uuid::new_v4()),
            is_hidden,
            join_code.map(str::to_owned),
            capacity,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_starts_with_owner_as_only_member() {
        let group = group(false, None, 10);
        assert_eq!(group.user_count, 1);
    }

    #[test]
    fn test_hidden_group_requires_join_code() {
        let result = Group::create(
            GroupId::from(Uuid::new_v4()),
            "secret",
            None,
            UserId::from(Uuid::new_v4()),
            true,
            None,
            10,
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_join_code_matches() {
        let hidden = group(true, Some("X1"), 10);
        assert!(hidden.join_code_matches(Some("X1")));
        assert!(!hidden.join_code_matches(Some("wrong")));
        assert!(!hidden.join_code_matches(None));

        let open = group(false, None, 10);
        assert!(open.join_code_matches(None));
    }

    #[test]
    fn test_admit_member_rejects_over_capacity() {
        let mut group = group(false, None, 2);
        assert!(group.admit_member(Utc::now()).is_ok());
        assert_eq!(group.user_count, 2);

        let result = group.admit_member(Utc::now());
        assert_eq!(result, Err(DomainError::ExceedGroupUserCount));
        assert_eq!(group.user_count, 2);
    }

    #[test]
    fn test_release_member_never_goes_negative() {
        let mut group = group(false, None, 2);
        group.release_member(Utc::now());
        group.release_member(Utc::now());
        assert_eq!(group.user_count, 0);
    }

    #[test]
    fn test_transfer_owner() {
        let mut group = group(false, None, 5);
        let successor = UserId::from(Uuid::new_v4());
        group.transfer_owner(successor, Utc::now());
        assert!(group.is_owner(successor));
    }

    #[test]
    fn test_invalid_capacity_rejected() {
        let result = Group::create(
            GroupId::from(Uuid::new_v4()),
            "empty",
            None,
            UserId::from(Uuid::new_v4()),
            false,
            None,
            0,
            Utc::now(),
        );
        assert!(result.is_err());
    }
}
