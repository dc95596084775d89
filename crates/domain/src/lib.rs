//! 运动小组系统核心领域模型
//!
//! 包含用户、凭证、小组、小组成员等核心实体，以及相关的业务规则。

pub mod auth;
pub mod credential;
pub mod errors;
pub mod group;
pub mod group_member;
pub mod group_score;
pub mod user;
pub mod value_objects;

pub use auth::*;
pub use credential::*;
pub use errors::*;
pub use group::*;
pub use group_member::*;
pub use group_score::*;
pub use user::*;
pub use value_objects::*;
