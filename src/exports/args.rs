//! 导出函数的位置参数解析
//!
//! 参数以MongoDB扩展JSON读取，`{"$oid": "..."}` 等写法会被还原为对应的BSON类型

use crate::error::GatewayResult;
use mongodb::bson::{Bson, Document};
use serde_json::Value as JsonValue;

/// 位置参数
pub(crate) struct Args {
    values: Vec<JsonValue>,
}

impl Args {
    pub(crate) fn new(values: Vec<JsonValue>) -> Self {
        Self { values }
    }

    /// 缺失和null视为未提供
    fn get(&self, position: usize) -> Option<&JsonValue> {
        self.values.get(position).filter(|value| !value.is_null())
    }

    /// 集合名：非空字符串
    pub(crate) fn collection(&self, position: usize) -> GatewayResult<String> {
        match self.get(position) {
            Some(JsonValue::String(name)) if !name.is_empty() => Ok(name.clone()),
            Some(JsonValue::String(_)) => Err(crate::gateway_error!(argument, position, "集合名不能为空")),
            Some(other) => Err(crate::gateway_error!(
                argument,
                position,
                format!("集合名必须是字符串，实际为 {}", other)
            )),
            None => Err(crate::gateway_error!(argument, position, "缺少集合名")),
        }
    }

    /// 必填的文档参数
    pub(crate) fn document(&self, position: usize) -> GatewayResult<Document> {
        match self.get(position) {
            Some(value) => to_document(position, value),
            None => Err(crate::gateway_error!(argument, position, "缺少文档参数")),
        }
    }

    /// 可选的文档参数，未提供时为空文档
    pub(crate) fn document_or_empty(&self, position: usize) -> GatewayResult<Document> {
        match self.get(position) {
            Some(value) => to_document(position, value),
            None => Ok(Document::new()),
        }
    }

    /// 可选的字符串参数
    pub(crate) fn optional_string(&self, position: usize) -> GatewayResult<Option<String>> {
        match self.get(position) {
            None => Ok(None),
            Some(JsonValue::String(text)) => Ok(Some(text.clone())),
            Some(other) => Err(crate::gateway_error!(
                argument,
                position,
                format!("需要字符串，实际为 {}", other)
            )),
        }
    }

    /// 原始JSON参数，未提供时为null
    pub(crate) fn raw(&self, position: usize) -> JsonValue {
        self.get(position).cloned().unwrap_or(JsonValue::Null)
    }
}

fn to_document(position: usize, value: &JsonValue) -> GatewayResult<Document> {
    if !value.is_object() {
        return Err(crate::gateway_error!(
            argument,
            position,
            format!("需要对象，实际为 {}", value)
        ));
    }

    match Bson::try_from(value.clone()) {
        Ok(Bson::Document(document)) => Ok(document),
        Ok(other) => Err(crate::gateway_error!(
            argument,
            position,
            format!("需要对象，实际为 {}", other)
        )),
        Err(e) => Err(crate::gateway_error!(argument, position, e)),
    }
}
