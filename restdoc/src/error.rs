//! restdoc 错误处理
//!
//! 定义了文档编译过程中可能出现的错误类型。编译要么完整成功，要么返回其中一种错误，
//! 不存在部分结果。

use thiserror::Error;

/// 文档编译相关的错误类型
#[derive(Error, Debug)]
pub enum RestDocError {
    /// 路由中出现了未注册的路径转换器
    #[error("不支持的路径转换器: {converter} (路由 {rule})")]
    UnsupportedPathConverter { converter: String, rule: String },

    /// 响应声明的形态不合法
    #[error("不合法的响应声明 {code}: {reason}")]
    MalformedResponseDeclaration { code: String, reason: String },

    /// 标签既不是字符串、二元组，也不是带 name 的映射
    #[error("不支持的标签格式: {tag}")]
    UnknownTagFormat { tag: String },

    /// 注解文档中的字段类型不合法
    #[error("不合法的注解字段 {field}: {message}")]
    InvalidAnnotation { field: String, message: String },

    /// JSON序列化/反序列化错误
    #[error("JSON处理错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// restdoc 的 Result 类型别名
pub type Result<T> = std::result::Result<T, RestDocError>;

impl RestDocError {
    /// 创建路径转换器错误
    pub fn unsupported_converter<C: Into<String>, R: Into<String>>(converter: C, rule: R) -> Self {
        Self::UnsupportedPathConverter {
            converter: converter.into(),
            rule: rule.into(),
        }
    }

    /// 创建响应声明错误
    pub fn malformed_response<C: Into<String>, S: Into<String>>(code: C, reason: S) -> Self {
        Self::MalformedResponseDeclaration {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// 创建标签格式错误
    pub fn unknown_tag<S: Into<String>>(tag: S) -> Self {
        Self::UnknownTagFormat { tag: tag.into() }
    }

    /// 创建注解字段错误
    pub fn invalid_annotation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::InvalidAnnotation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = RestDocError::unsupported_converter("slug", "/posts/<slug:title>");
        assert!(error.to_string().contains("slug"));
        assert!(error.to_string().contains("/posts/<slug:title>"));

        let error = RestDocError::malformed_response("404", "期望 1 到 3 个元素");
        assert!(error.to_string().contains("404"));

        let error = RestDocError::unknown_tag("42");
        assert!(error.to_string().contains("42"));
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: RestDocError = err.into();
        assert!(matches!(error, RestDocError::Json(_)));
    }
}
