mod credential_repository_impl;
mod group_member_repository_impl;
mod group_repository_impl;
mod group_score_repository_impl;
mod user_repository_impl;

pub use credential_repository_impl::PgCredentialRepository;
pub use group_member_repository_impl::PgGroupMemberRepository;
pub use group_repository_impl::PgGroupRepository;
pub use group_score_repository_impl::PgGroupScoreRepository;
pub use user_repository_impl::PgUserRepository;
