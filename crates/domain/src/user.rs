use crate::errors::DomainError;
use crate::value_objects::{Nickname, Timestamp, UserId};

/// 用户等级上限
pub const MAX_USER_LEVEL: i32 = 5;

/// 用户档案。等级只增不减，封顶 [`MAX_USER_LEVEL`]。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub nickname: Nickname,
    pub level: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserProfile {
    pub fn register(id: UserId, nickname: Nickname, created_at: Timestamp) -> Self {
        Self {
            id,
            nickname,
            level: 1,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn rename(&mut self, nickname: Nickname, now: Timestamp) {
        self.nickname = nickname;
        self.updated_at = now;
    }

    pub fn level_up(&mut self, now: Timestamp) {
        if self.level < MAX_USER_LEVEL {
            self.level += 1;
            self.updated_at = now;
        }
    }

    pub fn max_level(&self) -> bool {
        self.level >= MAX_USER_LEVEL
    }
}

/// 从存储层还原档案时使用，等级必须在合法区间内。
impl UserProfile {
    pub fn restore(
        id: UserId,
        nickname: Nickname,
        level: i32,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Result<Self, DomainError> {
        if !(1..=MAX_USER_LEVEL).contains(&level) {
            return Err(DomainError::invalid_argument("level", "out of range"));
        }
        Ok(Self {
            id,
            nickname,
            level,
            created_at,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn profile() -> UserProfile {
        UserProfile::register(
            UserId::from(Uuid::new_v4()),
            Nickname::parse("tester").unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn test_level_up_caps_at_max() {
        let mut user = profile();
        for _ in 0..10 {
            user.level_up(Utc::now());
        }
        assert_eq!(user.level, MAX_USER_LEVEL);
        assert!(user.max_level());
    }

    #[test]
    fn test_new_user_is_not_max_level() {
        let user = profile();
        assert_eq!(user.level, 1);
        assert!(!user.max_level());
    }

    #[test]
    fn test_restore_rejects_out_of_range_level() {
        let now = Utc::now();
        let result = UserProfile::restore(
            UserId::from(Uuid::new_v4()),
            Nickname::parse("tester").unwrap(),
            9,
            now,
            now,
        );
        assert!(result.is_err());
    }
}
