//! 主应用程序入口
//!
//! 启动 Axum Web API 服务。

use std::sync::Arc;
use std::time::Duration;

use application::{
    AuthService, AuthServiceDependencies, Clock, GroupEvent, GroupEventBus, GroupService,
    GroupServiceDependencies, PasswordHasher, PresenceBroadcaster,
    PresenceBroadcasterDependencies, SystemClock, TokenService,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, BcryptPasswordHasher, JwtTokenService, PgCredentialRepository,
    PgGroupMemberRepository, PgGroupRepository, PgGroupScoreRepository, PgUserRepository, MIGRATOR,
};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env_with_defaults();

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );

    let pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;
    MIGRATOR.run(&pool).await?;

    // 仓储
    let user_repository = Arc::new(PgUserRepository::new(pool.clone()));
    let credential_repository = Arc::new(PgCredentialRepository::new(pool.clone()));
    let group_repository = Arc::new(PgGroupRepository::new(pool.clone()));
    let member_repository = Arc::new(PgGroupMemberRepository::new(pool.clone()));
    let score_repository = Arc::new(PgGroupScoreRepository::new(pool));

    // 适配器
    let password_hasher: Arc<dyn PasswordHasher> = match config.server.bcrypt_cost {
        Some(cost) => Arc::new(BcryptPasswordHasher::new(cost)),
        None => Arc::new(BcryptPasswordHasher::default()),
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));
    let event_bus = GroupEventBus::default();

    // 应用层服务
    let auth_service = Arc::new(AuthService::new(AuthServiceDependencies {
        user_repository: user_repository.clone(),
        credential_repository,
        password_hasher,
        token_service,
        clock: clock.clone(),
    }));

    let group_service = Arc::new(GroupService::new(GroupServiceDependencies {
        group_repository,
        member_repository: member_repository.clone(),
        score_repository,
        user_repository: user_repository.clone(),
        clock: clock.clone(),
        event_bus: event_bus.clone(),
    }));

    let presence = Arc::new(PresenceBroadcaster::new(PresenceBroadcasterDependencies {
        user_repository,
        member_repository,
        clock,
    }));

    // 小组创建事件订阅：补建组长成员记录
    let mut events = event_bus.subscribe();
    let listener = group_service.clone();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(GroupEvent::Created { group }) => {
                    if let Err(err) = listener.attach_owner_membership(&group).await {
                        tracing::error!(group_id = %group.id, error = %err, "组长成员记录补建失败");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "group event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let state = AppState::new(
        auth_service,
        group_service,
        presence,
        Duration::from_millis(config.presence.heartbeat_interval_ms),
    );

    let app = router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("服务器启动在 http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
