//! 文档主键处理
//!
//! 主键在库外以字符串形式出现，在驱动内部是ObjectId。
//! 两种形式的转换只发生在过滤条件构建和结果输出两个边界上

use crate::error::GatewayResult;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use rat_logger::debug;

/// 主键字段名
pub const PRIMARY_KEY: &str = "_id";

/// 文档标识符
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// 驱动原生的ObjectId
    Native(ObjectId),
    /// 字符串形式
    Text(String),
}

impl Identifier {
    /// 转换为驱动原生类型
    pub fn to_native(&self) -> GatewayResult<ObjectId> {
        match self {
            Identifier::Native(oid) => Ok(*oid),
            Identifier::Text(s) => {
                ObjectId::parse_str(s).map_err(|_| crate::gateway_error!(invalid_id, s))
            }
        }
    }

    /// 对外输出使用的字符串形式
    pub fn to_text(&self) -> String {
        match self {
            Identifier::Native(oid) => oid.to_hex(),
            Identifier::Text(s) => s.clone(),
        }
    }
}

impl From<ObjectId> for Identifier {
    fn from(value: ObjectId) -> Self {
        Identifier::Native(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Text(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::Text(value)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

/// 将过滤条件中字符串形式的 `_id` 转换为ObjectId
///
/// 不是合法ObjectId的字符串保持原样（自定义字符串主键），只记录调试日志。
/// 返回值表示是否发生了转换
pub fn coerce_filter_id(filter: &mut Document) -> bool {
    let identifier = match filter.get(PRIMARY_KEY) {
        Some(Bson::String(s)) => Identifier::Text(s.clone()),
        _ => return false,
    };

    match identifier.to_native() {
        Ok(oid) => {
            filter.insert(PRIMARY_KEY, oid);
            true
        }
        Err(e) => {
            debug!("[CFX-MongoDB] _id保持字符串形式: {} ({})", identifier, e);
            false
        }
    }
}

/// 将文档的 `_id` 改写为字符串形式
///
/// 只作用于输出结果，不会影响数据库中的数据
pub fn normalize_document_id(document: &mut Document) {
    let normalized = match document.get(PRIMARY_KEY) {
        None | Some(Bson::String(_)) => return,
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::Int32(i)) => i.to_string(),
        Some(Bson::Int64(i)) => i.to_string(),
        Some(Bson::Double(d)) => d.to_string(),
        Some(other) => other.clone().into_relaxed_extjson().to_string(),
    };
    document.insert(PRIMARY_KEY, normalized);
}
