//! 多语言错误消息模块
//!
//! 使用rat_embed_lang框架提供统一的错误消息多语言支持
//!
//! 注意："Database not connected" 和 "Document not found" 属于对外契约，
//! 不经过翻译，见 [`crate::error`]

use std::collections::HashMap;
use once_cell::sync::OnceCell;
use rat_embed_lang::register_translations;

static REGISTERED: OnceCell<()> = OnceCell::new();

/// 错误消息翻译注册器
pub struct ErrorMessageI18n;

impl ErrorMessageI18n {
    /// 注册所有错误消息翻译
    fn register_all_translations() {
        let mut translations = HashMap::new();

        // 配置错误
        let mut config_errors = HashMap::new();
        config_errors.insert("zh-CN".to_string(), "配置错误: {message}".to_string());
        config_errors.insert("en-US".to_string(), "Configuration error: {message}".to_string());
        config_errors.insert("ja-JP".to_string(), "設定エラー: {message}".to_string());
        translations.insert("error.config".to_string(), config_errors);

        // 标识符转换失败
        let mut invalid_id_errors = HashMap::new();
        invalid_id_errors.insert("zh-CN".to_string(), "无效的ObjectId: {value}".to_string());
        invalid_id_errors.insert("en-US".to_string(), "Invalid ObjectId: {value}".to_string());
        invalid_id_errors.insert("ja-JP".to_string(), "無効なObjectId: {value}".to_string());
        translations.insert("error.invalid_identifier".to_string(), invalid_id_errors);

        // 导出函数参数错误
        let mut argument_errors = HashMap::new();
        argument_errors.insert("zh-CN".to_string(), "第{position}个参数无效: {message}".to_string());
        argument_errors.insert("en-US".to_string(), "Invalid argument #{position}: {message}".to_string());
        argument_errors.insert("ja-JP".to_string(), "引数#{position}が無効です: {message}".to_string());
        translations.insert("error.invalid_argument".to_string(), argument_errors);

        // 未知的导出名称
        let mut unknown_export_errors = HashMap::new();
        unknown_export_errors.insert("zh-CN".to_string(), "未注册的导出函数: {name}".to_string());
        unknown_export_errors.insert("en-US".to_string(), "No export registered under '{name}'".to_string());
        unknown_export_errors.insert("ja-JP".to_string(), "登録されていないエクスポート: {name}".to_string());
        translations.insert("error.unknown_export".to_string(), unknown_export_errors);

        // 序列化错误
        let mut serialization_errors = HashMap::new();
        serialization_errors.insert("zh-CN".to_string(), "文档序列化失败: {message}".to_string());
        serialization_errors.insert("en-US".to_string(), "Document serialization failed: {message}".to_string());
        serialization_errors.insert("ja-JP".to_string(), "ドキュメントのシリアライズに失敗しました: {message}".to_string());
        translations.insert("error.serialization".to_string(), serialization_errors);

        // 注册所有翻译
        register_translations(translations);
    }

    /// 初始化错误消息多语言支持
    ///
    /// 可重复调用，翻译只注册一次
    pub fn init() {
        REGISTERED.get_or_init(Self::register_all_translations);

        // 从环境变量获取语言设置，默认为zh-CN
        let lang = std::env::var("RAT_LANG")
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_else(|_| "zh-CN".to_string());

        // 标准化语言代码
        use rat_embed_lang::normalize_language_code;
        let normalized_lang = normalize_language_code(&lang);
        set_language(&normalized_lang);
    }
}

/// 重新导出rat_embed_lang的核心函数
pub use rat_embed_lang::{t, tf, set_language, current_language};
