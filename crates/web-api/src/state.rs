use std::sync::Arc;
use std::time::Duration;

use application::{AuthService, GroupService, PresenceBroadcaster};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub group_service: Arc<GroupService>,
    pub presence: Arc<PresenceBroadcaster>,
    /// 每个长连接的心跳推送间隔
    pub heartbeat_interval: Duration,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        group_service: Arc<GroupService>,
        presence: Arc<PresenceBroadcaster>,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            auth_service,
            group_service,
            presence,
            heartbeat_interval,
        }
    }
}
