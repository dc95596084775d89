use domain::{TokenPayload, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token issuing failed: {0}")]
    Issue(String),
}

impl TokenError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn issue(message: impl Into<String>) -> Self {
        Self::Issue(message.into())
    }
}

/// 令牌签发与校验契约。
/// 实现方负责签名算法与过期校验；类型门控（accessToken）由调用方执行。
pub trait TokenService: Send + Sync {
    fn issue(&self, uid: UserId) -> Result<String, TokenError>;
    fn verify(&self, token: &str) -> Result<TokenPayload, TokenError>;
}
