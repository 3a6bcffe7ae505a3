//! 连接状态通知
//!
//! 管理类操作（connect/disconnect）完成后向请求方发送事件

use rat_logger::{debug, info, warn};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::GatewayResult;

/// 连接完成事件名
pub const CONNECTED_EVENT: &str = "cfx-mongodb:connected";

/// 断开完成事件名
pub const DISCONNECTED_EVENT: &str = "cfx-mongodb:disconnected";

/// 连接状态事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityEvent {
    /// 事件名
    pub name: String,
    /// 接收方（发起请求的一方）
    pub target: String,
    pub success: bool,
    /// 失败时的错误文本
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectivityEvent {
    pub fn new<N: Into<String>, T: Into<String>>(name: N, target: T, result: &GatewayResult<()>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            success: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
        }
    }
}

/// 连接状态通知器
pub trait ConnectivityNotifier: Send + Sync {
    fn notify(&self, event: ConnectivityEvent);
}

/// 只写日志的通知器
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ConnectivityNotifier for LogNotifier {
    fn notify(&self, event: ConnectivityEvent) {
        match &event.error {
            None => info!("[CFX-MongoDB] {} -> {}: success", event.name, event.target),
            Some(error) => warn!("[CFX-MongoDB] {} -> {}: failed ({})", event.name, event.target, error),
        }
    }
}

/// 把事件转发到tokio通道的通知器，由宿主负责投递
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<ConnectivityEvent>,
}

impl ChannelNotifier {
    /// 创建通知器及对应的接收端
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ConnectivityEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ConnectivityNotifier for ChannelNotifier {
    fn notify(&self, event: ConnectivityEvent) {
        if let Err(e) = self.sender.send(event) {
            debug!("[CFX-MongoDB] 事件接收端已关闭，丢弃事件: {}", e.0.name);
        }
    }
}
