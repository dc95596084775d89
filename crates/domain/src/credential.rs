use crate::errors::DomainError;
use crate::value_objects::{PasswordHash, Timestamp, UserId};

/// 登录凭证，与用户档案一一对应。
/// 注册时必须与 [`crate::UserProfile`] 在同一事务内创建。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Credential {
    pub uid: UserId,
    pub username: String,
    #[serde(skip_serializing)] // 密码哈希不暴露给客户端
    pub password: PasswordHash,
    pub created_at: Timestamp,
}

impl Credential {
    pub fn new(
        uid: UserId,
        username: impl Into<String>,
        password: PasswordHash,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let username = Self::validate_username(username.into())?;
        Ok(Self {
            uid,
            username,
            password,
            created_at,
        })
    }

    fn validate_username(username: String) -> Result<String, DomainError> {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_argument("username", "cannot be empty"));
        }
        if trimmed.len() > 50 {
            return Err(DomainError::invalid_argument("username", "too long"));
        }
        Ok(trimmed.to_owned())
    }
}
