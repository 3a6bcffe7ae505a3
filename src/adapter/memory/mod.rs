//! 进程内文档存储适配器
//!
//! 实现与MongoDB适配器相同的契约，数据按数据库名保存在适配器内部，
//! 断开重连后仍然保留。提供连接/操作计数和故障注入，供测试与离线运行使用

mod filter;
mod update;

use crate::adapter::{default_database_name, DatabaseAdapter, DatabaseHandle, FindOptions, UpdateOutcome};
use crate::config::ConnectionConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::types::PRIMARY_KEY;
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

type Collections = HashMap<String, Vec<Document>>;

#[derive(Default)]
struct MemoryState {
    databases: RwLock<HashMap<String, Collections>>,
    connects: AtomicUsize,
    operations: AtomicUsize,
    closes: AtomicUsize,
    last_update: Mutex<Option<Document>>,
    connect_failure: Mutex<Option<String>>,
    close_failure: Mutex<Option<String>>,
}

/// 进程内文档存储适配器
#[derive(Clone, Default)]
pub struct MemoryAdapter {
    state: Arc<MemoryState>,
}

impl std::fmt::Debug for MemoryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAdapter")
            .field("connects", &self.connect_count())
            .field("operations", &self.operation_count())
            .finish()
    }
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 成功建立的连接数
    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// 所有句柄累计执行的驱动操作数
    pub fn operation_count(&self) -> usize {
        self.state.operations.load(Ordering::SeqCst)
    }

    /// close被调用的次数
    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// 最近一次传给updateOne的更新文档
    pub fn last_update(&self) -> Option<Document> {
        self.state.last_update.lock().clone()
    }

    /// 让下一次connect失败
    pub fn fail_next_connect<S: Into<String>>(&self, message: S) {
        *self.state.connect_failure.lock() = Some(message.into());
    }

    /// 让下一次close失败
    pub fn fail_next_close<S: Into<String>>(&self, message: S) {
        *self.state.close_failure.lock() = Some(message.into());
    }

    /// 读取集合中的原始文档（不经过任何输出规范化）
    pub fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        self.state
            .databases
            .read()
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseAdapter for MemoryAdapter {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self, config: &ConnectionConfig) -> GatewayResult<Arc<dyn DatabaseHandle>> {
        if let Some(message) = self.state.connect_failure.lock().take() {
            return Err(crate::gateway_error!(connection, message));
        }

        let database = default_database_name(&config.connection_string)?;
        let handle_id = self.state.connects.fetch_add(1, Ordering::SeqCst) + 1;
        crate::debug_log!("[Memory] 打开句柄 #{}，数据库: {}", handle_id, database);

        Ok(Arc::new(MemoryHandle {
            state: self.state.clone(),
            database,
            handle_id,
            closed: AtomicBool::new(false),
        }))
    }
}

/// 内存存储句柄
pub struct MemoryHandle {
    state: Arc<MemoryState>,
    database: String,
    handle_id: usize,
    closed: AtomicBool,
}

impl MemoryHandle {
    /// 句柄序号，每次成功connect递增
    pub fn handle_id(&self) -> usize {
        self.handle_id
    }

    fn begin(&self, operation: &str) -> GatewayResult<()> {
        self.state.operations.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(crate::gateway_error!(driver, operation, "Topology is closed"));
        }
        Ok(())
    }

    fn read_collection<R>(&self, collection: &str, f: impl FnOnce(&[Document]) -> R) -> R {
        let databases = self.state.databases.read();
        let documents = databases
            .get(&self.database)
            .and_then(|collections| collections.get(collection))
            .map(|documents| documents.as_slice())
            .unwrap_or(&[]);
        f(documents)
    }

    fn filter_documents(&self, collection: &str, filter: &Document) -> GatewayResult<Vec<Document>> {
        self.read_collection(collection, |documents| {
            let mut matched = Vec::new();
            for document in documents {
                if filter::matches(document, filter)? {
                    matched.push(document.clone());
                }
            }
            Ok(matched)
        })
    }
}

fn apply_projection(document: Document, projection: &Document) -> Document {
    let truthy = |value: &Bson| match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(i) => *i != 0,
        Bson::Int64(i) => *i != 0,
        Bson::Double(d) => *d != 0.0,
        _ => true,
    };

    let inclusive = projection
        .iter()
        .any(|(key, value)| key != PRIMARY_KEY && truthy(value));

    if inclusive {
        let keep_id = projection.get(PRIMARY_KEY).map(truthy).unwrap_or(true);
        document
            .into_iter()
            .filter(|(key, _)| {
                if key == PRIMARY_KEY {
                    keep_id
                } else {
                    projection.get(key).map(truthy).unwrap_or(false)
                }
            })
            .collect()
    } else {
        document
            .into_iter()
            .filter(|(key, _)| projection.get(key).map(truthy).unwrap_or(true))
            .collect()
    }
}

fn sort_documents(documents: &mut [Document], sort: &Document) {
    documents.sort_by(|left, right| {
        for (field, direction) in sort {
            let descending = match direction {
                Bson::Int32(i) => *i < 0,
                Bson::Int64(i) => *i < 0,
                Bson::Double(d) => *d < 0.0,
                Bson::String(s) => s.eq_ignore_ascii_case("desc") || s.eq_ignore_ascii_case("descending"),
                _ => false,
            };
            let ordering = filter::sort_order(filter::lookup_path(left, field), filter::lookup_path(right, field));
            let ordering = if descending { ordering.reverse() } else { ordering };
            if ordering != std::cmp::Ordering::Equal {
                return ordering;
            }
        }
        std::cmp::Ordering::Equal
    });
}

#[async_trait]
impl DatabaseHandle for MemoryHandle {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn insert_one(&self, collection: &str, document: Document) -> GatewayResult<Bson> {
        self.begin("insertOne")?;

        let id = document
            .get(PRIMARY_KEY)
            .cloned()
            .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));

        // 主键放在第一个字段，与服务端行为一致
        let mut stored = Document::new();
        stored.insert(PRIMARY_KEY, id.clone());
        for (key, value) in document {
            if key != PRIMARY_KEY {
                stored.insert(key, value);
            }
        }

        let mut databases = self.state.databases.write();
        let documents = databases
            .entry(self.database.clone())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        if documents.iter().any(|existing| existing.get(PRIMARY_KEY) == Some(&id)) {
            return Err(GatewayError::driver(
                "insertOne",
                format!(
                    "E11000 duplicate key error collection: {}.{} index: _id_ dup key: {{ _id: {} }}",
                    self.database, collection, id
                ),
            ));
        }

        documents.push(stored);
        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> GatewayResult<Vec<Document>> {
        self.begin("find")?;

        let mut documents = self.filter_documents(collection, &filter)?;

        if let Some(sort) = &options.sort {
            sort_documents(&mut documents, sort);
        }

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = match options.limit {
            Some(limit) if limit != 0 => limit.unsigned_abs() as usize,
            _ => usize::MAX,
        };

        let documents = documents.into_iter().skip(skip).take(limit);
        Ok(match &options.projection {
            Some(projection) => documents.map(|d| apply_projection(d, projection)).collect(),
            None => documents.collect(),
        })
    }

    async fn find_one(&self, collection: &str, filter: Document) -> GatewayResult<Option<Document>> {
        self.begin("findOne")?;

        self.read_collection(collection, |documents| {
            for document in documents {
                if filter::matches(document, &filter)? {
                    return Ok(Some(document.clone()));
                }
            }
            Ok(None)
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> GatewayResult<UpdateOutcome> {
        self.begin("updateOne")?;
        *self.state.last_update.lock() = Some(update.clone());
        update::validate_update(&update)?;

        let mut databases = self.state.databases.write();
        let Some(documents) = databases
            .get_mut(&self.database)
            .and_then(|collections| collections.get_mut(collection))
        else {
            return Ok(UpdateOutcome::default());
        };

        for document in documents.iter_mut() {
            if filter::matches(document, &filter)? {
                let mut updated = document.clone();
                update::apply_update(&mut updated, &update)?;
                let modified = updated != *document;
                if modified {
                    *document = updated;
                }
                return Ok(UpdateOutcome {
                    matched_count: 1,
                    modified_count: u64::from(modified),
                });
            }
        }

        Ok(UpdateOutcome::default())
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> GatewayResult<u64> {
        self.begin("deleteOne")?;

        let mut databases = self.state.databases.write();
        let Some(documents) = databases
            .get_mut(&self.database)
            .and_then(|collections| collections.get_mut(collection))
        else {
            return Ok(0);
        };

        let mut position = None;
        for (index, document) in documents.iter().enumerate() {
            if filter::matches(document, &filter)? {
                position = Some(index);
                break;
            }
        }

        Ok(match position {
            Some(index) => {
                documents.remove(index);
                1
            }
            None => 0,
        })
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> GatewayResult<u64> {
        self.begin("countDocuments")?;
        Ok(self.filter_documents(collection, &filter)?.len() as u64)
    }

    async fn list_collection_names(&self) -> GatewayResult<Vec<String>> {
        self.begin("listCollections")?;

        let databases = self.state.databases.read();
        let mut names: Vec<String> = databases
            .get(&self.database)
            .map(|collections| collections.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        Ok(names)
    }

    async fn close(&self) -> GatewayResult<()> {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);

        if let Some(message) = self.state.close_failure.lock().take() {
            return Err(crate::gateway_error!(driver, "close", message));
        }
        crate::debug_log!("[Memory] 句柄 #{} 已关闭", self.handle_id);
        Ok(())
    }
}
