//! 数据库适配器模块
//!
//! 定义门面依赖的驱动契约：适配器负责建立连接，句柄负责按集合执行操作。
//! 提供两个实现：
//! - mongodb: 基于官方mongodb驱动
//! - memory: 进程内文档存储，用于测试和离线运行

use crate::config::ConnectionConfig;
use crate::error::GatewayResult;
use async_trait::async_trait;
use ::mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

mod memory;
mod mongodb;

pub use memory::{MemoryAdapter, MemoryHandle};
pub use self::mongodb::{MongoAdapter, MongoHandle};

/// 查询选项，字段名与脚本侧一致（camelCase）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindOptions {
    /// 排序文档，值为1升序、-1降序
    pub sort: Option<Document>,
    /// 投影文档
    pub projection: Option<Document>,
    /// 跳过的文档数
    pub skip: Option<u64>,
    /// 最多返回的文档数，0表示不限制
    pub limit: Option<i64>,
}

impl FindOptions {
    /// 从运行时传入的JSON对象解析，null视为空选项
    pub fn from_json(value: serde_json::Value) -> GatewayResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| crate::gateway_error!(serialization, format!("查询选项解析失败: {}", e)))
    }
}

/// updateOne 的驱动结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// 数据库适配器trait，负责建立连接
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// 适配器名称，用于日志
    fn name(&self) -> &'static str;

    /// 打开连接并选择连接字符串中的默认数据库
    ///
    /// 只有在连接可用时才返回句柄，句柄要么完全可用，要么不存在
    async fn connect(&self, config: &ConnectionConfig) -> GatewayResult<Arc<dyn DatabaseHandle>>;
}

/// 已连接的数据库句柄
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// 默认数据库名
    fn database_name(&self) -> &str;

    /// 插入单个文档，返回存储分配的主键
    async fn insert_one(&self, collection: &str, document: Document) -> GatewayResult<Bson>;

    /// 查找全部匹配的文档
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> GatewayResult<Vec<Document>>;

    /// 查找第一个匹配的文档
    async fn find_one(&self, collection: &str, filter: Document) -> GatewayResult<Option<Document>>;

    /// 更新第一个匹配的文档，update必须是操作符形式
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> GatewayResult<UpdateOutcome>;

    /// 删除第一个匹配的文档，返回删除数量
    async fn delete_one(&self, collection: &str, filter: Document) -> GatewayResult<u64>;

    /// 统计匹配的文档数量
    async fn count_documents(&self, collection: &str, filter: Document) -> GatewayResult<u64>;

    /// 默认数据库中全部集合名
    async fn list_collection_names(&self) -> GatewayResult<Vec<String>>;

    /// 关闭连接
    async fn close(&self) -> GatewayResult<()>;
}

/// 适配器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// MongoDB官方驱动
    MongoDB,
    /// 进程内文档存储
    Memory,
}

/// 根据类型创建适配器
pub fn create_adapter(kind: AdapterKind) -> Arc<dyn DatabaseAdapter> {
    match kind {
        AdapterKind::MongoDB => Arc::new(MongoAdapter::new()),
        AdapterKind::Memory => Arc::new(MemoryAdapter::new()),
    }
}

/// 从连接字符串中取出默认数据库名，未指定时为 `test`
pub fn default_database_name(connection_string: &str) -> GatewayResult<String> {
    let rest = connection_string
        .strip_prefix("mongodb://")
        .or_else(|| connection_string.strip_prefix("mongodb+srv://"))
        .ok_or_else(|| {
            crate::gateway_error!(
                connection,
                "Invalid scheme, expected connection string to start with \"mongodb://\" or \"mongodb+srv://\""
            )
        })?;

    let path = match rest.find('/') {
        Some(slash) => &rest[slash + 1..],
        None => "",
    };
    let name = path.split('?').next().unwrap_or_default();

    if name.is_empty() {
        Ok("test".to_string())
    } else {
        Ok(urlencoding::decode(name)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_database_name() {
        assert_eq!(default_database_name("mongodb://localhost:27017/redm_dev").unwrap(), "redm_dev");
        assert_eq!(default_database_name("mongodb://u:p@h:1/live?authSource=admin").unwrap(), "live");
        assert_eq!(default_database_name("mongodb+srv://cluster.example.net").unwrap(), "test");
        assert_eq!(default_database_name("mongodb://localhost:27017/").unwrap(), "test");
        assert!(default_database_name("http://localhost").is_err());
    }

    #[test]
    fn test_find_options_from_json() {
        let options = FindOptions::from_json(json!({ "sort": { "level": -1 }, "limit": 5, "skip": 2 })).unwrap();
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.skip, Some(2));
        assert!(options.sort.is_some());
        assert_eq!(FindOptions::from_json(serde_json::Value::Null).unwrap(), FindOptions::default());
    }
}
