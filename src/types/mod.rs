//! 公共类型定义
//!
//! 文档统一使用 `bson::Document` 表示；主键与响应信封在子模块中定义

pub mod envelope;
pub mod identifier;

// 重新导出所有公共类型
pub use envelope::{
    AckResponse, Acknowledged, Data, DataResponse, Deleted, DeleteResponse, Envelope, InsertResponse, Inserted, Updated,
    UpdateResponse,
};
pub use identifier::{coerce_filter_id, normalize_document_id, Identifier, PRIMARY_KEY};
pub use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
