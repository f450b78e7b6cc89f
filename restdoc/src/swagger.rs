//! Swagger 2.0 文档对象

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::operation::Operation;
use crate::param::{ParamKey, ParameterObject};
use crate::response::Response;
use crate::security::{SecurityRequirement, SecurityScheme};
use crate::tag::Tag;
use crate::{RestDocError, Result};

pub const SWAGGER_VERSION: &str = "2.0";

/// 编译得到的 Swagger 文档
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Swagger {
    pub swagger: &'static str,
    pub info: Info,
    #[serde(rename = "basePath")]
    pub base_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    #[serde(
        rename = "securityDefinitions",
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub security_definitions: IndexMap<String, SecurityScheme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub definitions: IndexMap<String, Value>,
    pub paths: IndexMap<String, PathItem>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Response>,
}

impl Swagger {
    /// 序列化为JSON字符串
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(RestDocError::Json)
    }

    /// 序列化为格式化的JSON字符串
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(RestDocError::Json)
    }

    /// 序列化为JSON Value
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(RestDocError::Json)
    }
}

/// 文档信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// 路径项：共享参数加上按小写方法名索引的操作
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterObject>,
    #[serde(flatten)]
    pub operations: IndexMap<String, Operation>,
}

impl PathItem {
    /// 没有任何操作的路径项不输出，即使它带有共享参数
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// 绑定到同一模板的另一个资源：同名参数与操作由后者覆盖
    pub fn absorb(&mut self, other: PathItem) {
        let mut parameters: IndexMap<ParamKey, ParameterObject> = self
            .parameters
            .drain(..)
            .map(|parameter| (parameter.key(), parameter))
            .collect();
        for parameter in other.parameters {
            parameters.insert(parameter.key(), parameter);
        }
        self.parameters = parameters.into_values().collect();
        self.operations.extend(other.operations);
    }
}
