//! 错误类型定义
//!
//! 所有失败最终都会被折叠为统一的错误字符串（见 [`crate::types::Envelope`]），
//! 这里的枚举只用于库内部传递和日志记录

use thiserror::Error;

/// 未连接时所有数据操作返回的固定错误消息
pub const NOT_CONNECTED_MESSAGE: &str = "Database not connected";

/// findOne/delete 未命中时返回的固定错误消息
pub const DOCUMENT_NOT_FOUND_MESSAGE: &str = "Document not found";

/// 网关错误类型
#[derive(Error, Debug)]
pub enum GatewayError {
    /// 当前没有可用的数据库句柄
    #[error("Database not connected")]
    NotConnected,

    /// 查询或删除没有命中任何文档
    #[error("Document not found")]
    DocumentNotFound,

    /// 建立或关闭连接失败
    #[error("{message}")]
    ConnectionError { message: String },

    /// 驱动层返回的错误（网络、校验、重复键等）
    #[error("{message}")]
    DriverError { operation: String, message: String },

    /// 字符串形式的标识符无法转换为ObjectId
    #[error("{message}")]
    InvalidIdentifier { value: String, message: String },

    /// 导出函数参数不合法
    #[error("{message}")]
    InvalidArgument { position: usize, message: String },

    /// 导出表中不存在该名称
    #[error("{message}")]
    UnknownExport { name: String, message: String },

    /// 配置错误
    #[error("{message}")]
    ConfigError { message: String },

    /// 文档序列化/反序列化失败
    #[error("{message}")]
    SerializationError { message: String },

    /// IO错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// 网关结果类型
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// 是否属于驱动层错误
    pub fn is_driver_error(&self) -> bool {
        matches!(self, GatewayError::DriverError { .. })
    }

    /// 从驱动错误构造，保留操作名以便日志定位
    pub fn driver<O: Into<String>, E: std::fmt::Display>(operation: O, error: E) -> Self {
        GatewayError::DriverError {
            operation: operation.into(),
            message: error.to_string(),
        }
    }
}

impl From<mongodb::bson::ser::Error> for GatewayError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        crate::gateway_error!(serialization, e.to_string())
    }
}

impl From<mongodb::bson::de::Error> for GatewayError {
    fn from(e: mongodb::bson::de::Error) -> Self {
        crate::gateway_error!(serialization, e.to_string())
    }
}

/// 快速构造错误的宏
///
/// 消息模板来自 [`crate::i18n`]，随当前语言设置变化
#[macro_export]
macro_rules! gateway_error {
    (config, $msg:expr) => {
        $crate::error::GatewayError::ConfigError {
            message: $crate::i18n::tf("error.config", &[("message", &$msg.to_string())]),
        }
    };
    (connection, $msg:expr) => {
        $crate::error::GatewayError::ConnectionError {
            message: $msg.to_string(),
        }
    };
    (driver, $op:expr, $err:expr) => {
        $crate::error::GatewayError::driver($op, $err)
    };
    (invalid_id, $value:expr) => {
        $crate::error::GatewayError::InvalidIdentifier {
            value: $value.to_string(),
            message: $crate::i18n::tf("error.invalid_identifier", &[("value", &$value.to_string())]),
        }
    };
    (argument, $pos:expr, $msg:expr) => {
        $crate::error::GatewayError::InvalidArgument {
            position: $pos,
            message: $crate::i18n::tf(
                "error.invalid_argument",
                &[("position", &$pos.to_string()), ("message", &$msg.to_string())],
            ),
        }
    };
    (unknown_export, $name:expr) => {
        $crate::error::GatewayError::UnknownExport {
            name: $name.to_string(),
            message: $crate::i18n::tf("error.unknown_export", &[("name", &$name.to_string())]),
        }
    };
    (serialization, $msg:expr) => {
        $crate::error::GatewayError::SerializationError {
            message: $crate::i18n::tf("error.serialization", &[("message", &$msg.to_string())]),
        }
    };
}
