//! 认证与授权模型

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::UserId;

/// 自定义认证头
pub const AUTH_TOKEN_HEADER: &str = "X-HERO-AUTH-TOKEN";

/// 访问令牌的合法类型标记
pub const ACCESS_TOKEN_TYPE: &str = "accessToken";

/// 已认证用户及其授权判定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: UserId,
    pub context: AuthContext,
}

/// 用户上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// 昵称
    pub name: String,
}

impl AuthUser {
    pub fn new(uid: UserId, name: impl Into<String>) -> Self {
        Self {
            uid,
            context: AuthContext { name: name.into() },
        }
    }

    pub fn is_author(&self, uid: UserId) -> bool {
        self.uid == uid
    }

    /// 要求调用者就是目标用户，否则无权限。
    pub fn ensure_author(&self, uid: UserId) -> Result<(), DomainError> {
        if !self.is_author(uid) {
            return Err(DomainError::NoAuthority);
        }
        Ok(())
    }

    /// 要求调用者不是目标用户（例如不能对自己执行管理操作）。
    pub fn ensure_not_author(&self, uid: UserId) -> Result<(), DomainError> {
        if self.is_author(uid) {
            return Err(DomainError::NoAuthority);
        }
        Ok(())
    }
}

/// 从请求头提取出的原始令牌。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUserToken {
    pub key: String,
    pub value: String,
}

impl AuthUserToken {
    pub fn from_value(value: impl Into<String>) -> Self {
        Self {
            key: AUTH_TOKEN_HEADER.to_string(),
            value: value.into(),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.key.trim().is_empty() || self.value.trim().is_empty()
    }
}

/// 解码后的令牌负载。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub id: UserId,
    pub aud: String,
    pub iss: String,
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: String,
}

impl TokenPayload {
    /// 只有 `accessToken` 类型的负载可用于认证；其他类型一律拒绝。
    pub fn ensure_access_token(&self) -> Result<(), DomainError> {
        if self.token_type != ACCESS_TOKEN_TYPE {
            return Err(DomainError::InvalidToken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_ensure_author() {
        let uid = UserId::from(Uuid::new_v4());
        let other = UserId::from(Uuid::new_v4());
        let user = AuthUser::new(uid, "tester");

        assert!(user.ensure_author(uid).is_ok());
        assert_eq!(user.ensure_author(other), Err(DomainError::NoAuthority));
    }

    #[test]
    fn test_ensure_not_author() {
        let uid = UserId::from(Uuid::new_v4());
        let other = UserId::from(Uuid::new_v4());
        let user = AuthUser::new(uid, "tester");

        assert!(user.ensure_not_author(other).is_ok());
        assert_eq!(user.ensure_not_author(uid), Err(DomainError::NoAuthority));
    }

    #[test]
    fn test_token_payload_type_gate() {
        let payload = TokenPayload {
            id: UserId::from(Uuid::new_v4()),
            aud: "groupfit".to_string(),
            iss: "groupfit-server".to_string(),
            exp: 0,
            token_type: "refreshToken".to_string(),
        };
        assert_eq!(
            payload.ensure_access_token(),
            Err(DomainError::InvalidToken)
        );

        let payload = TokenPayload {
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            ..payload
        };
        assert!(payload.ensure_access_token().is_ok());
    }

    #[test]
    fn test_blank_token_is_invalid() {
        assert!(AuthUserToken::from_value("  ").is_invalid());
        assert!(!AuthUserToken::from_value("abc").is_invalid());
    }
}
