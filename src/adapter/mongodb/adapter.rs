//! MongoDB数据库适配器
//!
//! 使用mongodb库建立真实连接

use crate::adapter::{DatabaseAdapter, DatabaseHandle};
use crate::config::ConnectionConfig;
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use rat_logger::debug;
use std::sync::Arc;

/// MongoDB适配器
#[derive(Debug, Default, Clone, Copy)]
pub struct MongoAdapter;

impl MongoAdapter {
    pub fn new() -> Self {
        Self
    }

    /// 解析连接字符串并合并驱动选项
    async fn client_options(config: &ConnectionConfig) -> GatewayResult<ClientOptions> {
        let mut client_options = ClientOptions::parse(&config.connection_string)
            .await
            .map_err(|e| GatewayError::ConnectionError { message: e.to_string() })?;

        let options = &config.options;
        if let Some(timeout) = options.server_selection_timeout() {
            client_options.server_selection_timeout = Some(timeout);
        }
        if let Some(timeout) = options.connect_timeout() {
            client_options.connect_timeout = Some(timeout);
        }
        if options.max_pool_size.is_some() {
            client_options.max_pool_size = options.max_pool_size;
        }
        if options.min_pool_size.is_some() {
            client_options.min_pool_size = options.min_pool_size;
        }
        if let Some(app_name) = &options.app_name {
            client_options.app_name = Some(app_name.clone());
        }

        // useNewUrlParser/useUnifiedTopology 是Node驱动的遗留标志，这里没有对应项
        debug!(
            "[MongoDB] 忽略遗留标志 useNewUrlParser={} useUnifiedTopology={}",
            options.use_new_url_parser, options.use_unified_topology
        );
        if !options.extra.is_empty() {
            debug!("[MongoDB] 未识别的连接选项不会传给驱动: {:?}", options.extra.keys().collect::<Vec<_>>());
        }

        Ok(client_options)
    }
}

#[async_trait]
impl DatabaseAdapter for MongoAdapter {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn connect(&self, config: &ConnectionConfig) -> GatewayResult<Arc<dyn DatabaseHandle>> {
        let client_options = Self::client_options(config).await?;

        let client = Client::with_options(client_options)
            .map_err(|e| GatewayError::ConnectionError { message: e.to_string() })?;

        // 连接字符串未指定数据库时与Node驱动一致，使用test
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database("test"));

        // 驱动是惰性连接的，用ping确认服务端可达
        database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| GatewayError::ConnectionError { message: e.to_string() })?;

        debug!("[MongoDB] 已选择默认数据库: {}", database.name());
        Ok(Arc::new(MongoHandle { client, database }))
    }
}

/// MongoDB连接句柄
#[derive(Debug, Clone)]
pub struct MongoHandle {
    pub(crate) client: Client,
    pub(crate) database: Database,
}
