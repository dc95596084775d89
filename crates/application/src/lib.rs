//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、事务边界、
//! 以及对外部适配器（例如密码哈希、令牌签发）的抽象。

pub mod clock;
pub mod dto;
pub mod error;
pub mod events;
pub mod password;
pub mod presence;
pub mod repository;
pub mod services;
pub mod token;

pub use clock::{Clock, SystemClock};
pub use dto::*;
pub use error::ApplicationError;
pub use events::{GroupEvent, GroupEventBus};
pub use password::{PasswordHasher, PasswordHasherError};
pub use presence::{
    PresenceBroadcaster, PresenceBroadcasterDependencies, PresenceRegistry, PresenceSender,
};
pub use repository::{
    CredentialRepository, GroupMemberRepository, GroupRepository, GroupScoreRepository,
    UserRepository,
};
pub use services::{AuthService, AuthServiceDependencies, GroupService, GroupServiceDependencies};
pub use token::{TokenError, TokenService};
