//! 领域模型错误定义

use thiserror::Error;

/// 领域模型错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 参数校验失败
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 用户不存在
    #[error("user not found")]
    UserNotFound,

    /// 小组不存在
    #[error("group not found")]
    GroupNotFound,

    /// 小组成员记录不存在
    #[error("group membership not found")]
    MembershipNotFound,

    /// 用户名已被注册
    #[error("username already registered")]
    DuplicatedUsername,

    /// 小组名已存在
    #[error("group name already exists")]
    DuplicateGroupName,

    /// 用户已加入其他小组
    #[error("user already joined another group")]
    DuplicateGroupJoin,

    /// 小组人数已满
    #[error("group user count exceeded")]
    ExceedGroupUserCount,

    /// 加入条件不满足（隐藏小组的加入码错误）
    #[error("impossible to join group")]
    ImpossibleToJoin,

    /// 调用者不是小组成员
    #[error("caller is not a group member")]
    NotGroupMember,

    /// 令牌无效或类型错误
    #[error("invalid token")]
    InvalidToken,

    /// 无操作权限
    #[error("no authority")]
    NoAuthority,
}

impl DomainError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 仓储层错误类型
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// 记录不存在
    #[error("record not found")]
    NotFound,

    /// 唯一约束冲突
    #[error("record conflicts with existing data")]
    Conflict,

    /// 存储层故障
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
