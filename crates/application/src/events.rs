//! 进程内领域事件总线。
//!
//! 小组创建等副作用通过显式的发布/订阅传递给感兴趣的协作方，
//! 投递语义为尽力而为：落后的订阅者可能丢失事件。

use domain::Group;
use tokio::sync::broadcast;

/// 小组领域事件
#[derive(Debug, Clone)]
pub enum GroupEvent {
    /// 小组创建完成（订阅方负责补建组长的成员记录）
    Created { group: Group },
}

#[derive(Clone)]
pub struct GroupEventBus {
    sender: broadcast::Sender<GroupEvent>,
}

impl GroupEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GroupEvent> {
        self.sender.subscribe()
    }

    /// 发布事件。没有任何订阅者时静默丢弃。
    pub fn publish(&self, event: GroupEvent) {
        if let Err(err) = self.sender.send(event) {
            tracing::debug!(error = %err, "no subscriber for group event");
        }
    }
}

impl Default for GroupEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
