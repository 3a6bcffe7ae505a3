//! 通用CRUD门面
//!
//! 每次调用都重新向连接管理器借用句柄，不跨调用缓存。所有数据操作都会返回
//! [`Envelope`]，驱动错误、未连接和未命中统一折叠为失败信封

use crate::adapter::{DatabaseHandle, FindOptions};
use crate::config::{ConnectionConfig, ConnectionOptions};
use crate::error::{GatewayError, GatewayResult};
use crate::manager::ConnectionManager;
use crate::types::{
    coerce_filter_id, normalize_document_id, Data, DataResponse, DeleteResponse, Deleted, Envelope,
    InsertResponse, Inserted, UpdateResponse, Updated,
};
use mongodb::bson::{doc, Document};
use rat_logger::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::notifier::{ConnectivityEvent, ConnectivityNotifier, LogNotifier, CONNECTED_EVENT, DISCONNECTED_EVENT};

/// 非操作符形式的更新包装为 `$set`，操作符形式原样返回
pub fn build_update_document(update: Document) -> Document {
    if update.keys().any(|key| key.starts_with('$')) {
        update
    } else {
        doc! { "$set": update }
    }
}

/// 把操作结果折叠为信封，失败时按操作名记录日志
fn finish<T>(operation: &str, result: GatewayResult<T>) -> Envelope<T> {
    match result {
        Ok(body) => Envelope::success(body),
        Err(GatewayError::DocumentNotFound) => {
            debug!("[CFX-MongoDB Export] {}: document not found", operation);
            Envelope::failure(GatewayError::DocumentNotFound.to_string())
        }
        Err(e) => {
            error!("[CFX-MongoDB Export] {} error: {}", operation, e);
            Envelope::failure(e.to_string())
        }
    }
}

fn into_typed<T: DeserializeOwned>(mut document: Document) -> GatewayResult<T> {
    normalize_document_id(&mut document);
    Ok(mongodb::bson::from_document(document)?)
}

/// CRUD门面
#[derive(Clone)]
pub struct CrudGateway {
    manager: Arc<ConnectionManager>,
    notifier: Arc<dyn ConnectivityNotifier>,
}

impl std::fmt::Debug for CrudGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrudGateway").field("manager", &self.manager).finish()
    }
}

impl CrudGateway {
    /// 使用日志通知器创建门面
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self::with_notifier(manager, Arc::new(LogNotifier))
    }

    pub fn with_notifier(manager: Arc<ConnectionManager>, notifier: Arc<dyn ConnectivityNotifier>) -> Self {
        Self { manager, notifier }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    fn handle(&self) -> GatewayResult<Arc<dyn DatabaseHandle>> {
        self.manager.get_handle().ok_or(GatewayError::NotConnected)
    }

    /// 插入单个文档，返回存储分配的主键（保持原生形式）
    pub async fn insert<T: Serialize + ?Sized + Sync>(&self, collection: &str, document: &T) -> InsertResponse {
        finish("insertOne", self.try_insert(collection, document).await)
    }

    async fn try_insert<T: Serialize + ?Sized + Sync>(&self, collection: &str, document: &T) -> GatewayResult<Inserted> {
        let handle = self.handle()?;
        let document = mongodb::bson::to_document(document)?;
        let inserted_id = handle.insert_one(collection, document).await?;
        Ok(Inserted { inserted_id })
    }

    /// 查找全部匹配的文档，结果中的 `_id` 为字符串
    pub async fn find_many<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> DataResponse<Vec<T>> {
        finish("find", self.try_find_many(collection, filter, options).await)
    }

    async fn try_find_many<T: DeserializeOwned>(
        &self,
        collection: &str,
        mut filter: Document,
        options: FindOptions,
    ) -> GatewayResult<Data<Vec<T>>> {
        let handle = self.handle()?;
        coerce_filter_id(&mut filter);

        let documents = handle.find(collection, filter, options).await?;
        let data = documents
            .into_iter()
            .map(into_typed::<T>)
            .collect::<GatewayResult<Vec<T>>>()?;
        Ok(Data { data })
    }

    /// 查找第一个匹配的文档，未命中时返回 "Document not found"
    pub async fn find_one<T: DeserializeOwned>(&self, collection: &str, filter: Document) -> DataResponse<T> {
        finish("findOne", self.try_find_one(collection, filter).await)
    }

    async fn try_find_one<T: DeserializeOwned>(&self, collection: &str, mut filter: Document) -> GatewayResult<Data<T>> {
        let handle = self.handle()?;
        coerce_filter_id(&mut filter);

        let document = handle
            .find_one(collection, filter)
            .await?
            .ok_or(GatewayError::DocumentNotFound)?;
        Ok(Data { data: into_typed(document)? })
    }

    /// 按字段合并更新第一个匹配的文档
    pub async fn update(&self, collection: &str, filter: Document, update: Document) -> UpdateResponse {
        finish("updateOne", self.try_update(collection, filter, update).await)
    }

    async fn try_update(&self, collection: &str, mut filter: Document, update: Document) -> GatewayResult<Updated> {
        let handle = self.handle()?;
        coerce_filter_id(&mut filter);
        debug!("[CFX-MongoDB] Updating with filter: {}", filter);

        let outcome = handle
            .update_one(collection, filter, build_update_document(update))
            .await?;
        info!(
            "[CFX-MongoDB] Update result: matched={}, modified={}",
            outcome.matched_count, outcome.modified_count
        );

        Ok(Updated {
            matched_count: outcome.matched_count,
            modified_count: outcome.modified_count,
        })
    }

    /// 删除匹配的文档，没有删除任何文档时返回 "Document not found"
    pub async fn delete(&self, collection: &str, filter: Document) -> DeleteResponse {
        finish("deleteOne", self.try_delete(collection, filter).await)
    }

    async fn try_delete(&self, collection: &str, mut filter: Document) -> GatewayResult<Deleted> {
        let handle = self.handle()?;
        coerce_filter_id(&mut filter);

        let deleted_count = handle.delete_one(collection, filter.clone()).await?;
        if deleted_count == 0 {
            return Err(GatewayError::DocumentNotFound);
        }
        if deleted_count > 1 {
            warn!("[CFX-MongoDB] Warning: More than one document deleted ({})", deleted_count);
        }
        info!("[CFX-MongoDB] Deleted document with filter: {}", filter);
        Ok(Deleted { deleted_count })
    }

    /// 统计匹配的文档数量
    pub async fn count(&self, collection: &str, filter: Document) -> DataResponse<u64> {
        finish("countDocuments", self.try_count(collection, filter).await)
    }

    async fn try_count(&self, collection: &str, mut filter: Document) -> GatewayResult<Data<u64>> {
        let handle = self.handle()?;
        coerce_filter_id(&mut filter);
        let data = handle.count_documents(collection, filter).await?;
        Ok(Data { data })
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// 默认数据库中的集合名，不可用时为空
    pub async fn list_collections(&self) -> Vec<String> {
        self.manager.list_collection_names().await
    }

    /// 管理操作：连接并通知请求方
    ///
    /// 未提供连接字符串时沿用管理器中保存的连接字符串；
    /// 此时若带有非默认选项，则以新选项重新连接
    pub async fn connect(
        &self,
        target: &str,
        connection_string: Option<String>,
        options: ConnectionOptions,
    ) -> GatewayResult<()> {
        let config = match connection_string.filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(ConnectionConfig::new(url, options)),
            None if options != ConnectionOptions::default() => {
                let stored = self.manager.config();
                debug!(
                    "[CFX-MongoDB] No connection string given, applying options to {}",
                    stored.redacted_connection_string()
                );
                Some(ConnectionConfig::new(stored.connection_string, options))
            }
            None => None,
        };
        let redacted = config.as_ref().map(|c| c.redacted_connection_string());

        let result = self.manager.connect(config).await;
        match &result {
            Ok(()) => info!(
                "[CFX-MongoDB] Connected to {}",
                redacted.unwrap_or_else(|| self.manager.config().redacted_connection_string())
            ),
            Err(e) => error!("[CFX-MongoDB] Connection error: {}", e),
        }

        self.notifier.notify(ConnectivityEvent::new(CONNECTED_EVENT, target, &result));
        result
    }

    /// 管理操作：断开并通知请求方
    pub async fn disconnect(&self, target: &str) -> GatewayResult<()> {
        let result = self.manager.disconnect().await;
        match &result {
            Ok(()) => info!("[CFX-MongoDB] Disconnected"),
            Err(e) => error!("[CFX-MongoDB] Disconnection error: {}", e),
        }

        self.notifier.notify(ConnectivityEvent::new(DISCONNECTED_EVENT, target, &result));
        result
    }
}
