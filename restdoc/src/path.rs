//! 路由模式与 Swagger 路径模板的转换
//!
//! 路由占位符形如 `<name>`、`<int:id>` 或 `<string(length=2):code>`，
//! 转换为 Swagger 的 `{name}` 模板，并提取出对应的路径参数。

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::param::{Param, ParamType};
use crate::{RestDocError, Result};

static RE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<(?:(?P<converter>[A-Za-z_][A-Za-z0-9_]*)(?:\((?P<args>[^)]*)\))?:)?(?P<variable>[A-Za-z_][A-Za-z0-9_]*)>",
    )
    .expect("placeholder pattern is valid")
});

/// 路由器可识别的转换器表
#[derive(Debug, Clone)]
pub struct Converters {
    names: IndexSet<String>,
}

impl Default for Converters {
    fn default() -> Self {
        let names = ["default", "string", "any", "path", "int", "float", "uuid"]
            .into_iter()
            .map(String::from)
            .collect();
        Self { names }
    }
}

impl Converters {
    /// 注册自定义转换器，其参数类型按字符串处理
    pub fn register<S: Into<String>>(&mut self, name: S) {
        self.names.insert(name.into());
    }

    pub fn with<S: Into<String>>(mut self, name: S) -> Self {
        self.register(name);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// 转换器对应的 Swagger 类型
fn path_type(converter: &str) -> Option<ParamType> {
    match converter {
        "int" => Some(ParamType::Integer),
        "float" => Some(ParamType::Number),
        "string" | "default" => Some(ParamType::String),
        _ => None,
    }
}

/// 把路由模式转换为 Swagger 路径模板
///
/// `/users/<int:id>/posts/<slug>` → `/users/{id}/posts/{slug}`
pub fn to_spec_path(pattern: &str) -> String {
    RE_PLACEHOLDER
        .replace_all(pattern, "{${variable}}")
        .into_owned()
}

/// 按出现顺序提取路径参数
pub fn extract_path_params(
    pattern: &str,
    converters: &Converters,
) -> Result<IndexMap<String, Param>> {
    let mut params = IndexMap::new();
    for captures in RE_PLACEHOLDER.captures_iter(pattern) {
        let variable = &captures["variable"];
        let converter = captures
            .name("converter")
            .map(|m| m.as_str())
            .unwrap_or("default");

        let ty = match path_type(converter) {
            Some(ty) => ty,
            None if converters.contains(converter) => ParamType::String,
            None => return Err(RestDocError::unsupported_converter(converter, pattern)),
        };

        params.insert(
            variable.to_string(),
            Param::path(variable).ty(ty).required(true),
        );
    }
    Ok(params)
}

/// 路由模式中的占位符名称
pub fn placeholder_names(pattern: &str) -> Vec<String> {
    RE_PLACEHOLDER
        .captures_iter(pattern)
        .map(|captures| captures["variable"].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Location;
    use serde_json::json;

    #[test]
    fn test_path_format_conversion() {
        assert_eq!(
            to_spec_path("/users/<int:id>/posts/<slug>"),
            "/users/{id}/posts/{slug}"
        );
        assert_eq!(
            to_spec_path("/codes/<string(length=2):code>"),
            "/codes/{code}"
        );
        assert_eq!(to_spec_path("/simple/path"), "/simple/path");
    }

    #[test]
    fn test_extract_path_params_in_order() {
        let converters = Converters::default();
        let params = extract_path_params("/users/<int:id>/posts/<slug>", &converters).unwrap();
        let rendered: Vec<_> = params
            .values()
            .map(|p| serde_json::to_value(p.to_object(Location::Path)).unwrap())
            .collect();
        assert_eq!(
            rendered,
            vec![
                json!({"name": "id", "in": "path", "required": true, "type": "integer"}),
                json!({"name": "slug", "in": "path", "required": true, "type": "string"}),
            ]
        );
    }

    #[test]
    fn test_registered_converters_map_to_string() {
        let converters = Converters::default();
        let params = extract_path_params("/files/<path:file>/<uuid:ref>", &converters).unwrap();
        assert_eq!(params["file"].ty, Some(ParamType::String));
        assert_eq!(params["ref"].ty, Some(ParamType::String));

        let converters = Converters::default().with("slug");
        let params = extract_path_params("/posts/<slug:title>", &converters).unwrap();
        assert_eq!(params["title"].ty, Some(ParamType::String));
    }

    #[test]
    fn test_unsupported_converter() {
        let converters = Converters::default();
        let err = extract_path_params("/posts/<slug:title>", &converters).unwrap_err();
        match err {
            RestDocError::UnsupportedPathConverter { converter, rule } => {
                assert_eq!(converter, "slug");
                assert_eq!(rule, "/posts/<slug:title>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(
            placeholder_names("/a/<int:x>/b/<y>"),
            vec!["x".to_string(), "y".to_string()]
        );
    }
}
