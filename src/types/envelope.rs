//! 统一响应信封
//!
//! 每个数据操作都返回 `Envelope`，序列化后的形状为
//! `{"success": true, ...}` 或 `{"success": false, "error": "..."}`

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use mongodb::bson::Bson;

/// 响应信封
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    /// 成功，携带操作相关的字段
    Success(T),
    /// 失败，只携带错误字符串
    Failure { error: String },
}

impl<T> Envelope<T> {
    pub fn success(body: T) -> Self {
        Envelope::Success(body)
    }

    pub fn failure<S: Into<String>>(error: S) -> Self {
        Envelope::Failure { error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    /// 失败时的错误字符串
    pub fn error(&self) -> Option<&str> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Failure { error } => Some(error),
        }
    }

    /// 成功时的消息体
    pub fn body(&self) -> Option<&T> {
        match self {
            Envelope::Success(body) => Some(body),
            Envelope::Failure { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Envelope::Success(body) => Ok(body),
            Envelope::Failure { error } => Err(error),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Envelope<U> {
        match self {
            Envelope::Success(body) => Envelope::Success(f(body)),
            Envelope::Failure { error } => Envelope::Failure { error },
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Envelope::Success(body) => {
                #[derive(Serialize)]
                struct SuccessShape<'a, B> {
                    success: bool,
                    #[serde(flatten)]
                    body: &'a B,
                }
                SuccessShape { success: true, body }.serialize(serializer)
            }
            Envelope::Failure { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

/// 通用数据结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Data<T> {
    pub data: T,
}

/// 插入结果，主键保持驱动原生形式
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inserted {
    pub inserted_id: Bson,
}

/// 更新结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Updated {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// 删除结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub deleted_count: u64,
}

/// 没有附加字段的成功结果，用于连接管理类操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Acknowledged {}

pub type DataResponse<T> = Envelope<Data<T>>;
pub type InsertResponse = Envelope<Inserted>;
pub type UpdateResponse = Envelope<Updated>;
pub type DeleteResponse = Envelope<Deleted>;
pub type AckResponse = Envelope<Acknowledged>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape_flattens_body() {
        let response: UpdateResponse = Envelope::success(Updated { matched_count: 1, modified_count: 0 });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "success": true, "matchedCount": 1, "modifiedCount": 0 })
        );
    }

    #[test]
    fn test_failure_shape() {
        let response: DeleteResponse = Envelope::failure("Document not found");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "success": false, "error": "Document not found" })
        );
        assert_eq!(response.error(), Some("Document not found"));
    }

    #[test]
    fn test_data_shape() {
        let response: DataResponse<u64> = Envelope::success(Data { data: 0 });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "success": true, "data": 0 })
        );
    }

    #[test]
    fn test_inserted_id_keeps_native_form() {
        let oid = mongodb::bson::oid::ObjectId::new();
        let response: InsertResponse = Envelope::success(Inserted { inserted_id: Bson::ObjectId(oid) });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "success": true, "insertedId": { "$oid": oid.to_hex() } })
        );
    }

    #[test]
    fn test_acknowledged_shape() {
        let response: AckResponse = Envelope::success(Acknowledged {});
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({ "success": true }));
    }
}
