//! MongoDB句柄trait实现

use crate::adapter::mongodb::MongoHandle;
use crate::adapter::{DatabaseHandle, FindOptions, UpdateOutcome};
use crate::error::GatewayResult;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document};
use mongodb::Collection;
use rat_logger::debug;

impl MongoHandle {
    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

/// 转换为驱动的查询选项
fn to_driver_options(options: FindOptions) -> mongodb::options::FindOptions {
    let mut find_options = mongodb::options::FindOptions::default();
    find_options.sort = options.sort;
    find_options.projection = options.projection;
    find_options.skip = options.skip;
    find_options.limit = options.limit;
    find_options
}

#[async_trait]
impl DatabaseHandle for MongoHandle {
    fn database_name(&self) -> &str {
        self.database.name()
    }

    async fn insert_one(&self, collection: &str, document: Document) -> GatewayResult<Bson> {
        debug!("执行MongoDB插入到集合 {}: {:?}", collection, document);

        let result = self
            .collection(collection)
            .insert_one(document, None)
            .await
            .map_err(|e| crate::gateway_error!(driver, "insertOne", e))?;

        Ok(result.inserted_id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> GatewayResult<Vec<Document>> {
        debug!("执行MongoDB查询 {}: 条件={:?}, 选项={:?}", collection, filter, options);

        let cursor = self
            .collection(collection)
            .find(filter, Some(to_driver_options(options)))
            .await
            .map_err(|e| crate::gateway_error!(driver, "find", e))?;

        cursor
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| crate::gateway_error!(driver, "find", e))
    }

    async fn find_one(&self, collection: &str, filter: Document) -> GatewayResult<Option<Document>> {
        debug!("执行MongoDB单条查询 {}: {:?}", collection, filter);

        self.collection(collection)
            .find_one(filter, None)
            .await
            .map_err(|e| crate::gateway_error!(driver, "findOne", e))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> GatewayResult<UpdateOutcome> {
        debug!("执行MongoDB更新 {}: 查询={:?}, 更新={:?}", collection, filter, update);

        let result = self
            .collection(collection)
            .update_one(filter, update, None)
            .await
            .map_err(|e| crate::gateway_error!(driver, "updateOne", e))?;

        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> GatewayResult<u64> {
        debug!("执行MongoDB删除 {}: {:?}", collection, filter);

        let result = self
            .collection(collection)
            .delete_one(filter, None)
            .await
            .map_err(|e| crate::gateway_error!(driver, "deleteOne", e))?;

        Ok(result.deleted_count)
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> GatewayResult<u64> {
        self.collection(collection)
            .count_documents(filter, None)
            .await
            .map_err(|e| crate::gateway_error!(driver, "countDocuments", e))
    }

    async fn list_collection_names(&self) -> GatewayResult<Vec<String>> {
        self.database
            .list_collection_names(None)
            .await
            .map_err(|e| crate::gateway_error!(driver, "listCollections", e))
    }

    async fn close(&self) -> GatewayResult<()> {
        // shutdown会等待游标和会话释放后再断开
        self.client.clone().shutdown().await;
        Ok(())
    }
}
