//! 认证服务
//!
//! 负责注册、登录、令牌解析为已认证用户。

use std::sync::Arc;

use domain::{AuthUser, AuthUserToken, Credential, DomainError, Nickname, UserId, UserProfile};
use tracing::info;
use uuid::Uuid;

use crate::{
    clock::Clock,
    dto::{SignInRequest, SignUpRequest, TokenResponse, UserInfoResponse},
    error::ApplicationError,
    password::PasswordHasher,
    repository::{CredentialRepository, UserRepository},
    token::TokenService,
};

pub struct AuthServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub credential_repository: Arc<dyn CredentialRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub token_service: Arc<dyn TokenService>,
    pub clock: Arc<dyn Clock>,
}

pub struct AuthService {
    deps: AuthServiceDependencies,
}

impl AuthService {
    pub fn new(deps: AuthServiceDependencies) -> Self {
        Self { deps }
    }

    /// 注册：档案与凭证在同一事务内创建，任何一步失败都不留孤儿记录。
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<TokenResponse, ApplicationError> {
        if self
            .deps
            .credential_repository
            .exists_by_username(&request.username)
            .await?
        {
            return Err(DomainError::DuplicatedUsername.into());
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let now = self.deps.clock.now();

        let user = UserProfile::register(
            UserId::from(Uuid::new_v4()),
            Nickname::parse(&request.username)?,
            now,
        );
        let credential = Credential::new(user.id, request.username, password_hash, now)?;

        let stored = self
            .deps
            .user_repository
            .create_with_credential(user, credential)
            .await
            .map_err(|err| match err {
                // 与并发注册撞车时表现为唯一约束冲突
                domain::RepositoryError::Conflict => {
                    ApplicationError::Domain(DomainError::DuplicatedUsername)
                }
                other => ApplicationError::Repository(other),
            })?;

        let access_token = self.deps.token_service.issue(stored.id)?;

        info!(uid = %stored.id, "用户注册成功");
        Ok(TokenResponse { access_token })
    }

    /// 登录。用户名不存在与密码错误返回同一种失败，避免枚举用户。
    pub async fn sign_in(&self, request: SignInRequest) -> Result<TokenResponse, ApplicationError> {
        let credential = self
            .deps
            .credential_repository
            .find_by_username(&request.username)
            .await?
            .ok_or(ApplicationError::Authentication)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &credential.password)
            .await?;
        if !password_ok {
            return Err(ApplicationError::Authentication);
        }

        let access_token = self.deps.token_service.issue(credential.uid)?;

        info!(uid = %credential.uid, "用户登录成功");
        Ok(TokenResponse { access_token })
    }

    /// 把原始令牌解析成已认证用户。
    /// 非 accessToken 类型一律硬性拒绝，不做静默降级。
    pub async fn resolve_auth_user(
        &self,
        token: &AuthUserToken,
    ) -> Result<AuthUser, ApplicationError> {
        if token.is_invalid() {
            return Err(DomainError::InvalidToken.into());
        }

        let payload = self.deps.token_service.verify(&token.value)?;
        payload.ensure_access_token()?;

        let user = self
            .deps
            .user_repository
            .find_by_id(payload.id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        Ok(AuthUser::new(user.id, user.nickname.as_str()))
    }

    pub async fn get_user_info(
        &self,
        user: &AuthUser,
    ) -> Result<UserInfoResponse, ApplicationError> {
        let profile = self
            .deps
            .user_repository
            .find_by_id(user.uid)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        Ok(UserInfoResponse::from(&profile))
    }
}
