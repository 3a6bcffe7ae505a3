//! 导出函数表
//!
//! 供运行时内其他脚本按名称调用的函数表。参数为位置JSON参数，返回值为JSON。
//! 同一实现会以多个历史名称注册：
//!
//! | 名称 | 操作 |
//! |------|------|
//! | `insert` / `insertOne` | 插入 |
//! | `find` / `findMany` / `findAll` | 查询全部匹配 |
//! | `findOne` | 查询第一个匹配 |
//! | `update` / `updateOne` | 更新 |
//! | `delete` / `deleteOne` | 删除 |
//! | `count` | 计数 |
//! | `isConnected` | 连接状态 |
//! | `listCollections` | 集合列表 |
//! | `connect` / `disconnect` | 连接管理 |

mod args;
mod handlers;

use crate::error::GatewayResult;
use crate::gateway::CrudGateway;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use rat_logger::debug;
use serde_json::Value as JsonValue;
use std::future::Future;
use std::sync::Arc;

/// 调用上下文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    /// 发起调用的一方，连接事件会发回给它
    pub source: String,
}

impl CallContext {
    pub fn new<S: Into<String>>(source: S) -> Self {
        Self { source: source.into() }
    }
}

type ExportFn = Arc<dyn Fn(CallContext, Vec<JsonValue>) -> BoxFuture<'static, GatewayResult<JsonValue>> + Send + Sync>;

/// 导出函数表
#[derive(Default)]
pub struct ExportTable {
    entries: DashMap<String, ExportFn>,
}

impl std::fmt::Debug for ExportTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportTable").field("names", &self.names()).finish()
    }
}

impl ExportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册所有门面操作及其别名
    pub fn for_gateway(gateway: Arc<CrudGateway>) -> Self {
        let table = Self::new();
        table.bind(&["insert", "insertOne"], &gateway, handlers::insert);
        table.bind(&["find", "findMany", "findAll"], &gateway, handlers::find_many);
        table.bind(&["findOne"], &gateway, handlers::find_one);
        table.bind(&["update", "updateOne"], &gateway, handlers::update);
        table.bind(&["delete", "deleteOne"], &gateway, handlers::delete);
        table.bind(&["count"], &gateway, handlers::count);
        table.bind(&["isConnected"], &gateway, handlers::is_connected);
        table.bind(&["listCollections"], &gateway, handlers::list_collections);
        table.bind(&["connect"], &gateway, handlers::connect);
        table.bind(&["disconnect"], &gateway, handlers::disconnect);
        debug!("[CFX-MongoDB] 导出函数表已构建，共 {} 项", table.len());
        table
    }

    fn bind<F, Fut>(&self, names: &[&str], gateway: &Arc<CrudGateway>, handler: F)
    where
        F: Fn(Arc<CrudGateway>, CallContext, Vec<JsonValue>) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = GatewayResult<JsonValue>> + Send + 'static,
    {
        for name in names {
            let gateway = gateway.clone();
            let handler = handler.clone();
            self.register(name, move |ctx, args| handler(gateway.clone(), ctx, args));
        }
    }

    /// 注册导出函数，同名时覆盖
    pub fn register<F, Fut>(&self, name: &str, handler: F)
    where
        F: Fn(CallContext, Vec<JsonValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = GatewayResult<JsonValue>> + Send + 'static,
    {
        let entry: ExportFn = Arc::new(move |ctx, args| handler(ctx, args).boxed());
        self.entries.insert(name.to_string(), entry);
    }

    /// 按名称调用
    ///
    /// 只有名称未注册时返回错误；数据操作的失败以信封形式出现在返回值中
    pub async fn call(&self, name: &str, ctx: CallContext, args: Vec<JsonValue>) -> GatewayResult<JsonValue> {
        let entry = self
            .entries
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| crate::gateway_error!(unknown_export, name))?;
        entry(ctx, args).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 已注册的名称，按字母排序
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
