//! 认证服务单元测试

use std::sync::Arc;

use chrono::Utc;
use domain::{AuthUserToken, DomainError, Nickname, UserId, UserProfile};
use uuid::Uuid;

use crate::dto::{SignInRequest, SignUpRequest};
use crate::error::ApplicationError;
use crate::services::auth_service::{AuthService, AuthServiceDependencies};
use crate::services::test_support::{FakePasswordHasher, FakeTokenService, InMemoryStore, SteppingClock};

struct Harness {
    store: Arc<InMemoryStore>,
    tokens: Arc<FakeTokenService>,
    service: AuthService,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let tokens = Arc::new(FakeTokenService::new());
    let service = AuthService::new(AuthServiceDependencies {
        user_repository: store.clone(),
        credential_repository: store.clone(),
        password_hasher: Arc::new(FakePasswordHasher),
        token_service: tokens.clone(),
        clock: Arc::new(SteppingClock::new()),
    });
    Harness {
        store,
        tokens,
        service,
    }
}

#[tokio::test]
async fn test_sign_up_creates_user_and_credential_atomically() {
    let harness = harness();

    let response = harness
        .service
        .sign_up(SignUpRequest {
            username: "runner".to_string(),
            password: "secret-password".to_string(),
        })
        .await
        .unwrap();
    assert!(!response.access_token.is_empty());

    let users = harness.store.users.read().await;
    let credentials = harness.store.credentials.read().await;
    assert_eq!(users.len(), 1);
    assert!(credentials.contains_key("runner"));

    let credential = credentials.get("runner").unwrap();
    assert!(users.contains_key(&credential.uid));
}

#[tokio::test]
async fn test_sign_up_duplicated_username_creates_nothing() {
    let harness = harness();

    harness
        .service
        .sign_up(SignUpRequest {
            username: "runner".to_string(),
            password: "secret-password".to_string(),
        })
        .await
        .unwrap();

    let result = harness
        .service
        .sign_up(SignUpRequest {
            username: "runner".to_string(),
            password: "another-password".to_string(),
        })
        .await;

    match result {
        Err(ApplicationError::Domain(DomainError::DuplicatedUsername)) => {}
        other => panic!("expected DuplicatedUsername, got {other:?}"),
    }

    // 没有新增任何行
    assert_eq!(harness.store.users.read().await.len(), 1);
    assert_eq!(harness.store.credentials.read().await.len(), 1);
}

#[tokio::test]
async fn test_sign_in_with_valid_credentials() {
    let harness = harness();

    harness
        .service
        .sign_up(SignUpRequest {
            username: "runner".to_string(),
            password: "secret-password".to_string(),
        })
        .await
        .unwrap();

    let response = harness
        .service
        .sign_in(SignInRequest {
            username: "runner".to_string(),
            password: "secret-password".to_string(),
        })
        .await
        .unwrap();
    assert!(!response.access_token.is_empty());
}

#[tokio::test]
async fn test_sign_in_failures_are_uniform() {
    let harness = harness();

    harness
        .service
        .sign_up(SignUpRequest {
            username: "runner".to_string(),
            password: "secret-password".to_string(),
        })
        .await
        .unwrap();

    // 密码错误
    let wrong_password = harness
        .service
        .sign_in(SignInRequest {
            username: "runner".to_string(),
            password: "wrong".to_string(),
        })
        .await;
    assert!(matches!(
        wrong_password,
        Err(ApplicationError::Authentication)
    ));

    // 用户名不存在，失败形态一致
    let unknown_user = harness
        .service
        .sign_in(SignInRequest {
            username: "ghost".to_string(),
            password: "secret-password".to_string(),
        })
        .await;
    assert!(matches!(unknown_user, Err(ApplicationError::Authentication)));
}

#[tokio::test]
async fn test_resolve_auth_user_roundtrip() {
    let harness = harness();

    let signed_up = harness
        .service
        .sign_up(SignUpRequest {
            username: "runner".to_string(),
            password: "secret-password".to_string(),
        })
        .await
        .unwrap();

    let user = harness
        .service
        .resolve_auth_user(&AuthUserToken::from_value(signed_up.access_token))
        .await
        .unwrap();
    assert_eq!(user.context.name, "runner");
}

#[tokio::test]
async fn test_resolve_auth_user_rejects_non_access_token() {
    let harness = harness();

    // 有对应用户，但令牌类型不是 accessToken
    let user = UserProfile::register(
        UserId::from(Uuid::new_v4()),
        Nickname::parse("runner").unwrap(),
        Utc::now(),
    );
    let uid = user.id;
    harness.store.users.write().await.insert(uid, user);

    let refresh_token = harness.tokens.mint(uid, "refreshToken");
    let result = harness
        .service
        .resolve_auth_user(&AuthUserToken::from_value(refresh_token))
        .await;

    match result {
        Err(ApplicationError::Domain(DomainError::InvalidToken)) => {}
        other => panic!("expected InvalidToken, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resolve_auth_user_unknown_user() {
    let harness = harness();

    let token = harness
        .tokens
        .mint(UserId::from(Uuid::new_v4()), "accessToken");
    let result = harness
        .service
        .resolve_auth_user(&AuthUserToken::from_value(token))
        .await;

    match result {
        Err(ApplicationError::Domain(DomainError::UserNotFound)) => {}
        other => panic!("expected UserNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resolve_auth_user_blank_token() {
    let harness = harness();

    let result = harness
        .service
        .resolve_auth_user(&AuthUserToken::from_value("   "))
        .await;

    match result {
        Err(ApplicationError::Domain(DomainError::InvalidToken)) => {}
        other => panic!("expected InvalidToken, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_user_info() {
    let harness = harness();

    let signed_up = harness
        .service
        .sign_up(SignUpRequest {
            username: "runner".to_string(),
            password: "secret-password".to_string(),
        })
        .await
        .unwrap();

    let user = harness
        .service
        .resolve_auth_user(&AuthUserToken::from_value(signed_up.access_token))
        .await
        .unwrap();

    let info = harness.service.get_user_info(&user).await.unwrap();
    assert_eq!(info.nickname, "runner");
    assert_eq!(info.level, 1);
    assert!(!info.max_level);
}
