//! 基础设施层
//!
//! 提供仓储契约的 PostgreSQL 实现、bcrypt 密码哈希、JWT 令牌服务。

pub mod db;
pub mod jwt;
pub mod password;

pub use db::repositories::{
    PgCredentialRepository, PgGroupMemberRepository, PgGroupRepository, PgGroupScoreRepository,
    PgUserRepository,
};
pub use db::{create_pg_pool, MIGRATOR};
pub use jwt::JwtTokenService;
pub use password::BcryptPasswordHasher;
