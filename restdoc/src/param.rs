//! 参数描述
//!
//! 参数的身份键是 `(name, in)`。声明时可以不写位置，编译具体 URL 时再决定：
//! 名称与路径占位符相同的视为路径参数，其余默认为 query。

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::merge::{Merge, replace};
use crate::schema::SchemaRef;

/// 已确定位置的参数身份键
pub type ParamKey = (String, Location);

/// 声明时的参数键，位置可能尚未确定
pub type DeclaredKey = (String, Option<Location>);

/// 参数位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    Path,
    Query,
    Header,
    FormData,
    Body,
    Cookie,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::FormData => "formData",
            Location::Body => "body",
            Location::Cookie => "cookie",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(Location::Path),
            "query" => Some(Location::Query),
            "header" => Some(Location::Header),
            "formData" => Some(Location::FormData),
            "body" => Some(Location::Body),
            "cookie" => Some(Location::Cookie),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 参数与响应头的基础类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    File,
    Array(Box<ParamType>),
}

impl ParamType {
    pub fn array(items: ParamType) -> Self {
        ParamType::Array(Box::new(items))
    }

    /// Swagger 类型名
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::File => "file",
            ParamType::Array(_) => "array",
        }
    }

    /// 解析类型名，同时接受 `int`/`float`/`str`/`bool` 这类简写
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "string" | "str" => Some(ParamType::String),
            "integer" | "int" => Some(ParamType::Integer),
            "number" | "float" => Some(ParamType::Number),
            "boolean" | "bool" => Some(ParamType::Boolean),
            "file" => Some(ParamType::File),
            _ => None,
        }
    }

    /// 数组类型的元素描述
    pub fn items(&self) -> Option<Items> {
        match self {
            ParamType::Array(inner) => Some(Items::from(inner.as_ref())),
            _ => None,
        }
    }
}

/// 数组元素描述
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Items {
    #[serde(rename = "type")]
    pub ty: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Items>>,
}

impl From<&ParamType> for Items {
    fn from(ty: &ParamType) -> Self {
        Self {
            ty: ty.name(),
            items: ty.items().map(Box::new),
        }
    }
}

/// 参数描述
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Param {
    pub name: String,
    pub location: Option<Location>,
    pub ty: Option<ParamType>,
    pub format: Option<String>,
    pub schema: Option<SchemaRef>,
    pub required: Option<bool>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub enum_values: Option<Vec<Value>>,
}

impl Param {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn path<S: Into<String>>(name: S) -> Self {
        Self::new(name).location(Location::Path)
    }

    pub fn query<S: Into<String>>(name: S) -> Self {
        Self::new(name).location(Location::Query)
    }

    pub fn header<S: Into<String>>(name: S) -> Self {
        Self::new(name).location(Location::Header)
    }

    pub fn form<S: Into<String>>(name: S) -> Self {
        Self::new(name).location(Location::FormData)
    }

    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn ty(mut self, ty: ParamType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn enum_values<I: IntoIterator<Item = Value>>(mut self, values: I) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    /// 声明键
    pub fn declared_key(&self) -> DeclaredKey {
        (self.name.clone(), self.location)
    }

    /// 渲染为参数对象，位置由调用方确定
    pub fn to_object(&self, location: Location) -> ParameterObject {
        let required = match location {
            Location::Path => Some(true),
            _ => self.required,
        };
        let ty = match (&self.ty, &self.schema) {
            (Some(ty), _) => Some(ty.clone()),
            (None, None) => Some(ParamType::String),
            (None, Some(_)) => None,
        };
        ParameterObject {
            name: self.name.clone(),
            location,
            description: self.description.clone(),
            required,
            items: ty.as_ref().and_then(ParamType::items),
            ty: ty.as_ref().map(ParamType::name),
            format: self.format.clone(),
            schema: if self.ty.is_some() {
                None
            } else {
                self.schema.clone()
            },
            default: self.default.clone(),
            enum_values: self.enum_values.clone(),
        }
    }
}

impl Merge for Param {
    fn merge(&self, overlay: &Self) -> Self {
        Self {
            name: overlay.name.clone(),
            location: replace(&self.location, &overlay.location),
            ty: replace(&self.ty, &overlay.ty),
            format: replace(&self.format, &overlay.format),
            schema: replace(&self.schema, &overlay.schema),
            required: replace(&self.required, &overlay.required),
            description: replace(&self.description, &overlay.description),
            default: replace(&self.default, &overlay.default),
            enum_values: replace(&self.enum_values, &overlay.enum_values),
        }
    }
}

/// 输出文档中的参数对象
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterObject {
    pub name: String,
    #[serde(rename = "in")]
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterObject {
    pub fn key(&self) -> ParamKey {
        (self.name.clone(), self.location)
    }
}

/// 期望输入的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgLocation {
    Json,
    Query,
    QueryString,
    Form,
    Headers,
    Files,
    Cookies,
}

impl ArgLocation {
    /// 对应的 Swagger 参数位置
    pub fn location(&self) -> Location {
        match self {
            ArgLocation::Json => Location::Body,
            ArgLocation::Query | ArgLocation::QueryString => Location::Query,
            ArgLocation::Form | ArgLocation::Files => Location::FormData,
            ArgLocation::Headers => Location::Header,
            ArgLocation::Cookies => Location::Cookie,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(ArgLocation::Json),
            "query" => Some(ArgLocation::Query),
            "querystring" => Some(ArgLocation::QueryString),
            "form" => Some(ArgLocation::Form),
            "headers" => Some(ArgLocation::Headers),
            "files" => Some(ArgLocation::Files),
            "cookies" => Some(ArgLocation::Cookies),
            _ => None,
        }
    }
}

/// 期望的请求输入
#[derive(Debug, Clone, PartialEq)]
pub struct Expect {
    pub schema: SchemaRef,
    pub source: ArgLocation,
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: Option<bool>,
}

impl Expect {
    pub const DEFAULT_NAME: &'static str = "payload";

    pub fn new(source: ArgLocation, schema: SchemaRef) -> Self {
        Self {
            schema,
            source,
            name: None,
            description: None,
            required: None,
        }
    }

    /// JSON 请求体
    pub fn body(schema: SchemaRef) -> Self {
        Self::new(ArgLocation::Json, schema)
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn to_object(&self) -> ParameterObject {
        let is_file = self.source == ArgLocation::Files;
        ParameterObject {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| Self::DEFAULT_NAME.to_string()),
            location: self.source.location(),
            description: self.description.clone(),
            required: self.required,
            ty: is_file.then_some(ParamType::File.name()),
            items: None,
            format: None,
            schema: (!is_file).then(|| self.schema.clone()),
            default: None,
            enum_values: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_defaults_to_string() {
        let object = Param::new("q").to_object(Location::Query);
        assert_eq!(
            serde_json::to_value(&object).unwrap(),
            json!({"name": "q", "in": "query", "type": "string"})
        );
    }

    #[test]
    fn test_array_param() {
        let object = Param::new("ids")
            .ty(ParamType::array(ParamType::Integer))
            .description("identifiers")
            .to_object(Location::Query);
        assert_eq!(
            serde_json::to_value(&object).unwrap(),
            json!({
                "name": "ids",
                "in": "query",
                "description": "identifiers",
                "type": "array",
                "items": {"type": "integer"}
            })
        );
    }

    #[test]
    fn test_path_param_is_always_required() {
        let object = Param::new("id").required(false).to_object(Location::Path);
        assert_eq!(object.required, Some(true));
    }

    #[test]
    fn test_param_merge_overrides_fields() {
        let base = Param::path("id")
            .ty(ParamType::String)
            .description("identifier");
        let overlay = Param::new("id").ty(ParamType::Integer);
        let merged = base.merge(&overlay);
        assert_eq!(merged.ty, Some(ParamType::Integer));
        assert_eq!(merged.location, Some(Location::Path));
        assert_eq!(merged.description.as_deref(), Some("identifier"));
    }

    #[test]
    fn test_expect_body() {
        let object = Expect::body(SchemaRef::named("User")).to_object();
        assert_eq!(
            serde_json::to_value(&object).unwrap(),
            json!({"name": "payload", "in": "body", "schema": {"$ref": "#/definitions/User"}})
        );

        let upload = Expect::new(ArgLocation::Files, SchemaRef::inline(json!({})))
            .name("avatar")
            .to_object();
        assert_eq!(upload.location, Location::FormData);
        assert_eq!(upload.ty, Some("file"));
        assert_eq!(upload.schema, None);
    }

    #[test]
    fn test_location_parse() {
        assert_eq!(Location::parse("formData"), Some(Location::FormData));
        assert_eq!(Location::parse("nowhere"), None);
        assert_eq!(
            ArgLocation::parse("querystring").map(|l| l.location()),
            Some(Location::Query)
        );
        assert_eq!(ParamType::parse("int"), Some(ParamType::Integer));
    }
}
