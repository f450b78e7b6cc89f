//! 安全声明
//!
//! 安全要求可以是单个方案名、方案到 scope 列表的映射，或它们的列表，
//! 统一规范化为 `[{scheme: [scope, ...]}]`。方法级声明整体覆盖资源级声明。

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::merge::Merge;
use crate::{RestDocError, Result};

/// 规范化后的单个安全要求
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// 注解中的安全声明
#[derive(Debug, Clone, PartialEq)]
pub enum Security {
    /// 不带 scope 的方案名
    Scheme(String),
    /// 方案名到 scope 列表的映射
    Scopes(IndexMap<String, Vec<String>>),
    /// 多个可选的安全要求，空列表表示无需认证
    List(Vec<Security>),
}

impl Security {
    pub fn scheme<S: Into<String>>(name: S) -> Self {
        Self::Scheme(name.into())
    }

    pub fn scopes<S, I, T>(scheme: S, scopes: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut map = IndexMap::new();
        map.insert(scheme.into(), scopes.into_iter().map(Into::into).collect());
        Self::Scopes(map)
    }

    /// 显式声明无需认证
    pub fn none() -> Self {
        Self::List(Vec::new())
    }

    /// 规范化为安全要求列表
    pub fn requirements(&self) -> Vec<SecurityRequirement> {
        match self {
            Security::Scheme(name) => {
                let mut requirement = IndexMap::new();
                requirement.insert(name.clone(), Vec::new());
                vec![requirement]
            }
            Security::Scopes(scopes) => vec![scopes.clone()],
            Security::List(items) => items.iter().flat_map(Security::requirements).collect(),
        }
    }

    /// 从无类型的声明解析
    ///
    /// 映射中单个 scope 字符串会被包装为单元素列表；`null`、`false`
    /// 和空字符串都视为无需认证。
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Null | Value::Bool(false) => Ok(Self::none()),
            Value::String(name) if name.is_empty() => Ok(Self::none()),
            Value::String(name) => Ok(Self::scheme(name.as_str())),
            Value::Object(map) => {
                let mut scopes = IndexMap::new();
                for (scheme, value) in map {
                    let list = match value {
                        Value::String(scope) => vec![scope.clone()],
                        Value::Array(items) => items
                            .iter()
                            .map(|item| {
                                item.as_str().map(String::from).ok_or_else(|| {
                                    RestDocError::invalid_annotation(
                                        "security",
                                        format!("scope 必须是字符串: {item}"),
                                    )
                                })
                            })
                            .collect::<Result<Vec<_>>>()?,
                        Value::Null => Vec::new(),
                        other => {
                            return Err(RestDocError::invalid_annotation(
                                "security",
                                format!("无法识别的 scope 声明: {other}"),
                            ));
                        }
                    };
                    scopes.insert(scheme.clone(), list);
                }
                Ok(Self::Scopes(scopes))
            }
            Value::Array(items) => items
                .iter()
                .map(Self::from_value)
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            other => Err(RestDocError::invalid_annotation(
                "security",
                format!("无法识别的安全声明: {other}"),
            )),
        }
    }
}

impl From<&str> for Security {
    fn from(name: &str) -> Self {
        Self::scheme(name)
    }
}

impl Merge for Security {
    fn merge(&self, overlay: &Self) -> Self {
        overlay.clone()
    }
}

/// 资源级声明与方法级声明解析出的操作安全要求
pub fn security_for(
    resource: Option<&Security>,
    method: Option<&Security>,
) -> Option<Vec<SecurityRequirement>> {
    method.or(resource).map(Security::requirements)
}

/// API Key 所在位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Query,
    Header,
}

/// OAuth2 授权流程
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OAuth2Flow {
    Implicit,
    Password,
    Application,
    AccessCode,
}

/// `securityDefinitions` 中的安全方案
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    #[serde(rename = "basic")]
    Basic {
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    #[serde(rename = "oauth2")]
    OAuth2 {
        flow: OAuth2Flow,
        #[serde(rename = "authorizationUrl", skip_serializing_if = "Option::is_none")]
        authorization_url: Option<String>,
        #[serde(rename = "tokenUrl", skip_serializing_if = "Option::is_none")]
        token_url: Option<String>,
        scopes: IndexMap<String, String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl SecurityScheme {
    pub fn basic() -> Self {
        Self::Basic { description: None }
    }

    pub fn api_key<S: Into<String>>(name: S, location: ApiKeyLocation) -> Self {
        Self::ApiKey {
            name: name.into(),
            location,
            description: None,
        }
    }

    pub fn oauth2(flow: OAuth2Flow) -> Self {
        Self::OAuth2 {
            flow,
            authorization_url: None,
            token_url: None,
            scopes: IndexMap::new(),
            description: None,
        }
    }

    pub fn description<S: Into<String>>(mut self, text: S) -> Self {
        match &mut self {
            Self::Basic { description }
            | Self::ApiKey { description, .. }
            | Self::OAuth2 { description, .. } => *description = Some(text.into()),
        }
        self
    }

    /// 仅对 OAuth2 生效
    pub fn authorization_url<S: Into<String>>(mut self, url: S) -> Self {
        if let Self::OAuth2 {
            authorization_url, ..
        } = &mut self
        {
            *authorization_url = Some(url.into());
        }
        self
    }

    /// 仅对 OAuth2 生效
    pub fn token_url<S: Into<String>>(mut self, url: S) -> Self {
        if let Self::OAuth2 { token_url, .. } = &mut self {
            *token_url = Some(url.into());
        }
        self
    }

    /// 仅对 OAuth2 生效
    pub fn scope<N: Into<String>, D: Into<String>>(mut self, name: N, description: D) -> Self {
        if let Self::OAuth2 { scopes, .. } = &mut self {
            scopes.insert(name.into(), description.into());
        }
        self
    }
}

impl Merge for SecurityScheme {
    fn merge(&self, overlay: &Self) -> Self {
        overlay.clone()
    }
}
