//! 从 JSON 加载注解文档
//!
//! 无类型的注解沿用声明式写法：`false` 表示隐藏，参数可以直接写成描述字符串，
//! 响应写成字符串、二元组或三元组，HTTP 方法名作为子文档键。

use http::Method;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::doc::{Annotation, Doc};
use crate::param::{ArgLocation, Expect, Location, Param, ParamType};
use crate::response::{Header, ResponseSpec};
use crate::schema::SchemaRef;
use crate::security::Security;
use crate::{RestDocError, Result};

const HTTP_METHODS: [&str; 8] = [
    "get", "head", "post", "put", "delete", "options", "trace", "patch",
];

impl Annotation<Doc> {
    /// 从 JSON 加载，`false` 为隐藏
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(false) => Ok(Annotation::Hidden),
            Value::Bool(true) | Value::Null => Ok(Annotation::Doc(Doc::new())),
            Value::Object(_) => Doc::from_value(value).map(Annotation::Doc),
            other => Err(RestDocError::invalid_annotation(
                "doc",
                format!("注解必须是对象或 false: {other}"),
            )),
        }
    }
}

impl Doc {
    /// 从 JSON 对象加载
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            RestDocError::invalid_annotation("doc", format!("注解必须是对象: {value}"))
        })?;
        doc_from_map(map)
    }
}

fn doc_from_map(map: &Map<String, Value>) -> Result<Doc> {
    let mut doc = Doc::new();
    for (key, value) in map {
        match key.as_str() {
            "id" => doc.id = string_field(key, value)?,
            "summary" => doc.summary = string_field(key, value)?,
            "description" => doc.description = string_field(key, value)?,
            "docstring" => doc.docstring = string_field(key, value)?,
            "params" => {
                for param in params_from_value(value)? {
                    doc = doc.param(param);
                }
            }
            "expect" => doc.expect = expect_from_value(value)?,
            "responses" => {
                let entries = object_field(key, value)?;
                for (code, response) in entries {
                    doc.responses
                        .insert(code.clone(), ResponseSpec::from_value(code, response)?);
                }
            }
            "headers" => doc.headers = headers_from_value(value)?,
            "security" => doc.security = Some(Security::from_value(value)?),
            "deprecated" => doc.deprecated = Some(bool_field(key, value)?),
            "vendor" => {
                for (name, value) in object_field(key, value)? {
                    doc.vendor.insert(name.clone(), value.clone());
                }
            }
            "produces" => doc.produces = Some(string_list(key, value)?),
            method if HTTP_METHODS.contains(&method) => {
                let method = Method::from_bytes(method.to_uppercase().as_bytes()).map_err(|e| {
                    RestDocError::invalid_annotation(key.as_str(), e.to_string())
                })?;
                doc.methods
                    .insert(method, Annotation::<Doc>::from_value(value)?);
            }
            other => {
                tracing::debug!(field = other, "ignoring unknown annotation field");
            }
        }
    }
    Ok(doc)
}

fn params_from_value(value: &Value) -> Result<Vec<Param>> {
    let mut params = Vec::new();
    for (name, value) in object_field("params", value)? {
        let param = match value {
            Value::String(description) => {
                Param::new(name.as_str()).description(description.as_str())
            }
            Value::Object(map) => param_from_map(name, map)?,
            other => {
                return Err(RestDocError::invalid_annotation(
                    format!("params.{name}"),
                    format!("参数必须是描述字符串或对象: {other}"),
                ));
            }
        };
        params.push(param);
    }
    Ok(params)
}

fn param_from_map(name: &str, map: &Map<String, Value>) -> Result<Param> {
    let field = |key: &str| format!("params.{name}.{key}");
    let mut param = Param::new(name);
    for (key, value) in map {
        match key.as_str() {
            "in" => {
                let location = value.as_str().and_then(Location::parse).ok_or_else(|| {
                    RestDocError::invalid_annotation(field(key), format!("未知的参数位置: {value}"))
                })?;
                param = param.location(location);
            }
            "type" => param = param.ty(type_from_value(&field(key), value)?),
            "format" => param.format = string_field(key, value)?,
            "schema" => param.schema = SchemaRef::from_value(value)?,
            "required" => param = param.required(bool_field(&field(key), value)?),
            "description" => param.description = string_field(key, value)?,
            "default" => param = param.default_value(value.clone()),
            "enum" => {
                let values = value.as_array().ok_or_else(|| {
                    RestDocError::invalid_annotation(field(key), "enum 必须是数组")
                })?;
                param = param.enum_values(values.iter().cloned());
            }
            other => {
                tracing::debug!(param = name, field = other, "unknown param field ignored");
            }
        }
    }
    Ok(param)
}

fn type_from_value(field: &str, value: &Value) -> Result<ParamType> {
    let invalid = || RestDocError::invalid_annotation(field, format!("未知的类型: {value}"));
    match value {
        Value::String(name) => ParamType::parse(name).ok_or_else(invalid),
        Value::Array(items) if items.len() == 1 => {
            type_from_value(field, &items[0]).map(ParamType::array)
        }
        _ => Err(invalid()),
    }
}

fn expect_from_value(value: &Value) -> Result<Vec<Expect>> {
    let items = match value {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        single => vec![single],
    };
    let mut expect = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Object(map) if map.contains_key("schema") => {
                let schema = SchemaRef::from_value(&map["schema"])?.ok_or_else(|| {
                    RestDocError::invalid_annotation("expect.schema", "schema 不能为空")
                })?;
                let source = match map.get("location") {
                    Some(location) => arg_location(location)?,
                    None => ArgLocation::Json,
                };
                let mut entry = Expect::new(source, schema);
                if let Some(name) = map.get("name") {
                    entry.name = string_field("expect.name", name)?;
                }
                if let Some(description) = map.get("description") {
                    entry.description = string_field("expect.description", description)?;
                }
                if let Some(required) = map.get("required") {
                    entry = entry.required(bool_field("expect.required", required)?);
                }
                expect.push(entry);
            }
            other => {
                if let Some(schema) = SchemaRef::from_value(other)? {
                    expect.push(Expect::body(schema));
                }
            }
        }
    }
    Ok(expect)
}

fn arg_location(value: &Value) -> Result<ArgLocation> {
    value.as_str().and_then(ArgLocation::parse).ok_or_else(|| {
        RestDocError::invalid_annotation("expect.location", format!("未知的输入位置: {value}"))
    })
}

/// 解析响应头声明：名称到描述字符串或 `{description, type, format}`
pub(crate) fn headers_from_value(value: &Value) -> Result<IndexMap<String, Header>> {
    let mut headers = IndexMap::new();
    for (name, value) in object_field("headers", value)? {
        let header = match value {
            Value::String(description) => Header::from(description.as_str()),
            Value::Object(map) => {
                let mut header = Header::new();
                if let Some(description) = map.get("description") {
                    header.description = string_field("headers.description", description)?;
                }
                if let Some(ty) = map.get("type") {
                    header = header.ty(type_from_value(&format!("headers.{name}.type"), ty)?);
                }
                if let Some(format) = map.get("format") {
                    header.format = string_field("headers.format", format)?;
                }
                header
            }
            other => {
                return Err(RestDocError::invalid_annotation(
                    format!("headers.{name}"),
                    format!("响应头必须是描述字符串或对象: {other}"),
                ));
            }
        };
        headers.insert(name.clone(), header);
    }
    Ok(headers)
}

fn string_field(field: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text.clone())),
        other => Err(RestDocError::invalid_annotation(
            field,
            format!("期望字符串: {other}"),
        )),
    }
}

fn bool_field(field: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| RestDocError::invalid_annotation(field, format!("期望布尔值: {value}")))
}

fn object_field<'a>(field: &str, value: &'a Value) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| RestDocError::invalid_annotation(field, format!("期望对象: {value}")))
}

fn string_list(field: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(single) => Ok(vec![single.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(String::from).ok_or_else(|| {
                    RestDocError::invalid_annotation(field, format!("期望字符串: {item}"))
                })
            })
            .collect(),
        other => Err(RestDocError::invalid_annotation(
            field,
            format!("期望字符串列表: {other}"),
        )),
    }
}
