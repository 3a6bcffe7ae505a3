//! 连接管理器核心定义

use crate::adapter::{DatabaseAdapter, DatabaseHandle};
use crate::config::ConnectionConfig;
use crate::error::GatewayResult;
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rat_logger::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 当前活跃的连接
struct ActiveConnection {
    handle: Arc<dyn DatabaseHandle>,
    database_name: String,
    connection_string: String,
    connected_at: DateTime<Utc>,
}

/// 连接状态快照
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    /// 默认数据库名，未连接时为None
    pub database_name: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    /// 隐去凭据的连接字符串
    pub connection_string: String,
    /// 适配器名称
    pub adapter: String,
}

/// 连接管理器 - 持有进程内唯一的数据库连接
///
/// 句柄存在当且仅当处于已连接状态。连接/断开通过内部互斥锁串行执行，
/// 读取句柄不加锁
pub struct ConnectionManager {
    adapter: Arc<dyn DatabaseAdapter>,
    config: RwLock<ConnectionConfig>,
    active: ArcSwapOption<ActiveConnection>,
    transition: Mutex<()>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("adapter", &self.adapter.name())
            .field("connection_string", &self.config.read().redacted_connection_string())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl ConnectionManager {
    /// 创建连接管理器，config为无参connect使用的默认配置
    pub fn new(adapter: Arc<dyn DatabaseAdapter>, config: ConnectionConfig) -> Self {
        debug!(
            "创建连接管理器: 适配器={}, 连接={}",
            adapter.name(),
            config.redacted_connection_string()
        );

        Self {
            adapter,
            config: RwLock::new(config),
            active: ArcSwapOption::empty(),
            transition: Mutex::new(()),
        }
    }

    /// 建立连接
    ///
    /// - 未传配置且已连接：直接返回
    /// - 传入新配置：先断开现有连接，替换保存的配置后重新连接
    ///
    /// 连接失败时保持未连接状态并把错误返回给调用方
    pub async fn connect(&self, config: Option<ConnectionConfig>) -> GatewayResult<()> {
        let _guard = self.transition.lock().await;

        match config {
            None if self.is_connected() => {
                info!("[MongoDB] Connection already established");
                return Ok(());
            }
            None => {}
            Some(config) => {
                if self.is_connected() {
                    info!("[MongoDB] 使用新配置重新连接，先关闭现有连接");
                    if let Err(e) = self.teardown().await {
                        warn!("[MongoDB] 关闭旧连接失败，继续使用新配置连接: {}", e);
                    }
                }
                *self.config.write() = config;
            }
        }

        let config = self.config.read().clone();
        let connection_string = config.redacted_connection_string();
        debug!("[MongoDB] 正在连接: {}", connection_string);

        match self.adapter.connect(&config).await {
            Ok(handle) => {
                let database_name = handle.database_name().to_string();
                self.active.store(Some(Arc::new(ActiveConnection {
                    handle,
                    database_name: database_name.clone(),
                    connection_string,
                    connected_at: Utc::now(),
                })));
                info!("[MongoDB] Successfully connected (database: {})", database_name);
                Ok(())
            }
            Err(e) => {
                error!("[MongoDB] Connection error: {}", e);
                Err(e)
            }
        }
    }

    /// 断开连接
    ///
    /// 未连接时什么也不做。关闭失败时状态同样会被清空，错误继续返回给调用方
    pub async fn disconnect(&self) -> GatewayResult<()> {
        let _guard = self.transition.lock().await;

        if !self.is_connected() {
            info!("[MongoDB] No connection available");
            return Ok(());
        }

        match self.teardown().await {
            Ok(()) => {
                info!("[MongoDB] Connection successfully closed");
                Ok(())
            }
            Err(e) => {
                error!("[MongoDB] Error while disconnecting: {}", e);
                Err(e)
            }
        }
    }

    /// 先清空状态再关闭句柄
    async fn teardown(&self) -> GatewayResult<()> {
        match self.active.swap(None) {
            Some(active) => active.handle.close().await,
            None => Ok(()),
        }
    }

    /// 是否已连接
    pub fn is_connected(&self) -> bool {
        self.active.load().is_some()
    }

    /// 当前句柄，未连接时为None
    pub fn get_handle(&self) -> Option<Arc<dyn DatabaseHandle>> {
        self.active.load_full().map(|active| active.handle.clone())
    }

    /// 默认数据库中的全部集合名
    ///
    /// 未连接或驱动出错时返回空列表，错误只记录日志
    pub async fn list_collection_names(&self) -> Vec<String> {
        let Some(handle) = self.get_handle() else {
            info!("[MongoDB] No connection available");
            return Vec::new();
        };

        match handle.list_collection_names().await {
            Ok(names) => names,
            Err(e) => {
                error!("[MongoDB] Error fetching collections: {}", e);
                Vec::new()
            }
        }
    }

    /// 连接状态快照
    pub fn status(&self) -> ConnectionStatus {
        match self.active.load_full() {
            Some(active) => ConnectionStatus {
                connected: true,
                database_name: Some(active.database_name.clone()),
                connected_at: Some(active.connected_at),
                connection_string: active.connection_string.clone(),
                adapter: self.adapter.name().to_string(),
            },
            None => ConnectionStatus {
                connected: false,
                database_name: None,
                connected_at: None,
                connection_string: self.config.read().redacted_connection_string(),
                adapter: self.adapter.name().to_string(),
            },
        }
    }

    /// 当前保存的连接配置
    pub fn config(&self) -> ConnectionConfig {
        self.config.read().clone()
    }
}
