//! # 配置变量来源
//!
//! 运行时通过具名配置变量（convar）提供连接信息，这里把它抽象为 `ConfigSource`

use crate::error::{GatewayError, GatewayResult};
use rat_logger::info;
use std::collections::HashMap;
use std::path::Path;

/// 具名配置变量的只读来源
pub trait ConfigSource: Send + Sync {
    /// 读取变量，不存在时返回None
    fn get(&self, key: &str) -> Option<String>;

    /// 读取变量，不存在或为空时返回默认值
    fn get_or(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(value) if !value.is_empty() => value,
            _ => default.to_string(),
        }
    }
}

/// 进程环境变量来源
///
/// 先查找原样的键名，再查找大写形式（`mongodb_dev_url` -> `MONGODB_DEV_URL`）
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .or_else(|_| std::env::var(key.to_uppercase()))
            .ok()
    }
}

/// 内存映射来源
#[derive(Debug, Default, Clone)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.values.insert(key.into(), value.into());
    }
}

impl From<HashMap<String, String>> for MapSource {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// 配置文件来源，文件内容为扁平的键值表（TOML或JSON）
#[derive(Debug, Clone)]
pub struct FileSource {
    inner: MapSource,
}

impl FileSource {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `config_path` - 配置文件路径，扩展名为 `.toml` 时按TOML解析，否则按JSON解析
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> GatewayResult<Self> {
        let content = std::fs::read_to_string(config_path.as_ref())
            .map_err(GatewayError::IoError)?;

        let table: HashMap<String, toml::Value> = if config_path.as_ref().extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&content)
                .map_err(|e| crate::gateway_error!(config, format!("解析TOML配置文件失败: {}", e)))?
        } else {
            let json: HashMap<String, serde_json::Value> = serde_json::from_str(&content)
                .map_err(|e| crate::gateway_error!(config, format!("解析JSON配置文件失败: {}", e)))?;
            json.into_iter()
                .map(|(k, v)| (k, json_scalar_to_toml(v)))
                .collect()
        };

        let mut inner = MapSource::new();
        for (key, value) in table {
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(crate::gateway_error!(
                        config,
                        format!("配置项 {} 必须是标量值，实际为: {}", key, other.type_str())
                    ));
                }
            };
            inner.set(key, text);
        }

        info!("从文件加载配置: {:?}", config_path.as_ref());
        Ok(Self { inner })
    }
}

fn json_scalar_to_toml(value: serde_json::Value) -> toml::Value {
    match value {
        serde_json::Value::String(s) => toml::Value::String(s),
        serde_json::Value::Bool(b) => toml::Value::Boolean(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => toml::Value::Integer(i),
            None => toml::Value::Float(n.as_f64().unwrap_or_default()),
        },
        other => toml::Value::Array(vec![toml::Value::String(other.to_string())]),
    }
}

impl ConfigSource for FileSource {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }
}

/// 按顺序查找的多来源组合，前面的来源优先
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn ConfigSource>>,
}

impl LayeredSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl ConfigSource for LayeredSource {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}
