//! 响应声明与解析
//!
//! 响应按资源级、方法级的顺序收集：后出现的声明逐字段覆盖 `description`
//! 和 `schema`，响应头取并集。文档字符串中的 `:raises Kind:` 会引用
//! 已注册错误处理器对应的共享响应。

use std::fmt;

use http::StatusCode;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::doc::{Doc, Docstring};
use crate::merge::{Merge, replace};
use crate::param::{Items, ParamType};
use crate::schema::SchemaRef;
use crate::{RestDocError, Result};

/// 缺省的响应描述
pub const DEFAULT_RESPONSE_DESCRIPTION: &str = "Success";

/// 响应状态码键，例如 `"200"` 或 `"default"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseCode(String);

impl ResponseCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<u16> for ResponseCode {
    fn from(code: u16) -> Self {
        Self(code.to_string())
    }
}

impl From<i32> for ResponseCode {
    fn from(code: i32) -> Self {
        Self(code.to_string())
    }
}

impl From<StatusCode> for ResponseCode {
    fn from(code: StatusCode) -> Self {
        Self(code.as_u16().to_string())
    }
}

impl From<&str> for ResponseCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for ResponseCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 响应头声明
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub description: Option<String>,
    pub ty: Option<ParamType>,
    pub format: Option<String>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
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

    /// 渲染为响应头对象，未声明类型时按字符串处理
    pub fn to_object(&self) -> HeaderObject {
        let ty = self.ty.clone().unwrap_or(ParamType::String);
        HeaderObject {
            description: self.description.clone(),
            ty: ty.name(),
            items: ty.items(),
            format: self.format.clone(),
        }
    }
}

impl From<&str> for Header {
    fn from(description: &str) -> Self {
        Self::new().description(description)
    }
}

impl Merge for Header {
    fn merge(&self, overlay: &Self) -> Self {
        Self {
            description: replace(&self.description, &overlay.description),
            ty: replace(&self.ty, &overlay.ty),
            format: replace(&self.format, &overlay.format),
        }
    }
}

/// 输出文档中的响应头对象
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// 响应声明的附加选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseOptions {
    pub headers: IndexMap<String, Header>,
}

impl ResponseOptions {
    pub fn header<S: Into<String>, H: Into<Header>>(mut self, name: S, header: H) -> Self {
        self.headers.insert(name.into(), header.into());
        self
    }
}

/// 单个响应声明
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseSpec {
    /// 仅描述
    Bare(String),
    /// 描述与 schema
    WithSchema(Option<String>, Option<SchemaRef>),
    /// 描述、schema 与附加选项
    WithOptions(Option<String>, Option<SchemaRef>, ResponseOptions),
}

impl ResponseSpec {
    pub fn schema<S: Into<String>>(description: S, schema: SchemaRef) -> Self {
        Self::WithSchema(Some(description.into()), Some(schema))
    }

    fn parts(&self) -> (Option<&str>, Option<&SchemaRef>, Option<&ResponseOptions>) {
        match self {
            ResponseSpec::Bare(description) => (Some(description.as_str()), None, None),
            ResponseSpec::WithSchema(description, schema) => {
                (description.as_deref(), schema.as_ref(), None)
            }
            ResponseSpec::WithOptions(description, schema, options) => {
                (description.as_deref(), schema.as_ref(), Some(options))
            }
        }
    }

    /// 从无类型的声明解析
    ///
    /// 接受字符串、`[description, schema]` 与
    /// `[description, schema, {"headers": {...}}]` 三种形态。
    pub fn from_value(code: &str, value: &Value) -> Result<Self> {
        let description = |value: &Value| -> Result<Option<String>> {
            match value {
                Value::Null => Ok(None),
                Value::String(text) => Ok(Some(text.clone())),
                other => Err(RestDocError::malformed_response(
                    code,
                    format!("描述必须是字符串: {other}"),
                )),
            }
        };
        match value {
            Value::String(text) => Ok(Self::Bare(text.clone())),
            Value::Array(items) if items.len() == 2 => Ok(Self::WithSchema(
                description(&items[0])?,
                SchemaRef::from_value(&items[1])?,
            )),
            Value::Array(items) if items.len() == 3 => {
                let options = match &items[2] {
                    Value::Null => ResponseOptions::default(),
                    Value::Object(map) => {
                        let mut options = ResponseOptions::default();
                        if let Some(headers) = map.get("headers") {
                            options.headers = crate::loader::headers_from_value(headers)?;
                        }
                        options
                    }
                    other => {
                        return Err(RestDocError::malformed_response(
                            code,
                            format!("附加选项必须是对象: {other}"),
                        ));
                    }
                };
                Ok(Self::WithOptions(
                    description(&items[0])?,
                    SchemaRef::from_value(&items[1])?,
                    options,
                ))
            }
            Value::Array(items) => Err(RestDocError::malformed_response(
                code,
                format!("期望 2 或 3 个元素，实际为 {}", items.len()),
            )),
            other => Err(RestDocError::malformed_response(
                code,
                format!("无法识别的响应声明: {other}"),
            )),
        }
    }
}

impl From<&str> for ResponseSpec {
    fn from(description: &str) -> Self {
        Self::Bare(description.to_string())
    }
}

impl From<String> for ResponseSpec {
    fn from(description: String) -> Self {
        Self::Bare(description)
    }
}

impl Merge for ResponseSpec {
    fn merge(&self, overlay: &Self) -> Self {
        overlay.clone()
    }
}

/// 输出文档中的响应对象
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseObject {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(Response),
}

impl ResponseObject {
    /// 引用共享响应
    pub fn reference(name: &str) -> Self {
        Self::Ref {
            reference: format!("#/responses/{name}"),
        }
    }

    pub fn as_inline(&self) -> Option<&Response> {
        match self {
            ResponseObject::Inline(response) => Some(response),
            ResponseObject::Ref { .. } => None,
        }
    }
}

/// 内联响应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, HeaderObject>,
}

impl Response {
    fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            schema: None,
            headers: IndexMap::new(),
        }
    }

    fn absorb_headers<'a, I>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (&'a String, &'a Header)>,
    {
        for (name, header) in headers {
            self.headers.insert(name.clone(), header.to_object());
        }
    }
}

/// 错误处理器注册项
///
/// 以稳定的错误类别标识注册，文档字符串的首句作为共享响应的描述。
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorHandler {
    pub kind: String,
    pub docstring: Option<String>,
    pub code: Option<ResponseCode>,
    pub schema: Option<SchemaRef>,
    pub headers: IndexMap<String, Header>,
}

impl ErrorHandler {
    pub fn new<S: Into<String>>(kind: S) -> Self {
        Self {
            kind: kind.into(),
            docstring: None,
            code: None,
            schema: None,
            headers: IndexMap::new(),
        }
    }

    pub fn docstring<S: Into<String>>(mut self, docstring: S) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    /// 处理器产生的状态码
    pub fn response<C: Into<ResponseCode>>(mut self, code: C) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn header<S: Into<String>, H: Into<Header>>(mut self, name: S, header: H) -> Self {
        self.headers.insert(name.into(), header.into());
        self
    }

    /// 渲染为共享响应
    pub fn to_response(&self) -> Response {
        let docstring = Docstring::parse(self.docstring.as_deref());
        let description = docstring.summary.unwrap_or_else(|| self.kind.clone());
        let mut response = Response::new(&description);
        response.schema = self.schema.clone();
        response.absorb_headers(&self.headers);
        response
    }
}

/// 错误处理器注册表，按错误类别索引
pub type ErrorHandlers = IndexMap<String, ErrorHandler>;

/// 解析单个操作的响应
///
/// `resource` 为资源级文档，`method` 为合并后的方法文档，`raises` 来自方法的文档字符串。
pub fn resolve_responses(
    resource: &Doc,
    method: &Doc,
    raises: &IndexMap<String, String>,
    handlers: &ErrorHandlers,
) -> IndexMap<String, ResponseObject> {
    let mut responses: IndexMap<String, ResponseObject> = IndexMap::new();

    for doc in [resource, method] {
        for (code, spec) in &doc.responses {
            let (description, schema, options) = spec.parts();
            let entry = responses.entry(code.clone()).or_insert_with(|| {
                ResponseObject::Inline(Response::new(
                    description.unwrap_or(DEFAULT_RESPONSE_DESCRIPTION),
                ))
            });
            if let ResponseObject::Inline(response) = entry {
                if let Some(description) = description {
                    response.description = description.to_string();
                }
                if let Some(schema) = schema {
                    response.schema = Some(schema.clone());
                }
                response.absorb_headers(&resource.headers);
                response.absorb_headers(&method.headers);
                if let Some(options) = options {
                    response.absorb_headers(&options.headers);
                }
            }
        }
    }

    for name in raises.keys() {
        match handlers.get(name) {
            Some(ErrorHandler { code: Some(code), .. }) => {
                responses.insert(code.to_string(), ResponseObject::reference(name));
            }
            Some(_) => {
                tracing::warn!(
                    error_kind = %name,
                    "error handler declares no status code, response omitted"
                );
            }
            None => {
                tracing::debug!(
                    error_kind = %name,
                    "no error handler registered for raised error"
                );
            }
        }
    }

    if responses.is_empty() {
        let mut response = Response::new(DEFAULT_RESPONSE_DESCRIPTION);
        response.absorb_headers(&resource.headers);
        response.absorb_headers(&method.headers);
        responses.insert(
            StatusCode::OK.as_u16().to_string(),
            ResponseObject::Inline(response),
        );
    }
    responses
}

/// 全部错误处理器对应的共享响应
pub fn register_errors(handlers: &ErrorHandlers) -> IndexMap<String, Response> {
    handlers
        .iter()
        .map(|(kind, handler)| (kind.clone(), handler.to_response()))
        .collect()
}
