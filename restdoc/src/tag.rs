//! 标签
//!
//! 显式声明的标签排在前面，之后每个至少注册了一个资源的命名空间贡献一个同名标签。
//! 同名标签只出现一次，命名空间的描述会附加到已声明的标签上。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::Namespace;
use crate::{RestDocError, Result};

/// 输出文档中的标签
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// 标签声明
#[derive(Debug, Clone, PartialEq)]
pub enum TagSpec {
    Name(String),
    Pair(String, String),
    Tag(Tag),
}

impl TagSpec {
    pub fn into_tag(self) -> Tag {
        match self {
            TagSpec::Name(name) => Tag {
                name,
                description: None,
            },
            TagSpec::Pair(name, description) => Tag {
                name,
                description: Some(description),
            },
            TagSpec::Tag(tag) => tag,
        }
    }
}

impl From<&str> for TagSpec {
    fn from(name: &str) -> Self {
        TagSpec::Name(name.to_string())
    }
}

impl From<(&str, &str)> for TagSpec {
    fn from((name, description): (&str, &str)) -> Self {
        TagSpec::Pair(name.to_string(), description.to_string())
    }
}

impl From<Tag> for TagSpec {
    fn from(tag: Tag) -> Self {
        TagSpec::Tag(tag)
    }
}

impl TryFrom<&Value> for TagSpec {
    type Error = RestDocError;

    /// 接受字符串、`[name, description]` 和带 `name` 的对象
    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Ok(TagSpec::Name(name.clone())),
            Value::Array(items) => match items.as_slice() {
                [Value::String(name), Value::String(description)] => {
                    Ok(TagSpec::Pair(name.clone(), description.clone()))
                }
                _ => Err(RestDocError::unknown_tag(value.to_string())),
            },
            Value::Object(map) if map.get("name").is_some_and(Value::is_string) => {
                serde_json::from_value(value.clone())
                    .map(TagSpec::Tag)
                    .map_err(|_| RestDocError::unknown_tag(value.to_string()))
            }
            other => Err(RestDocError::unknown_tag(other.to_string())),
        }
    }
}

/// 合并显式标签与命名空间标签
pub fn extract_tags(explicit: &[TagSpec], namespaces: &[Namespace]) -> Vec<Tag> {
    let mut tags: IndexMap<String, Tag> = IndexMap::new();
    for spec in explicit {
        let tag = spec.clone().into_tag();
        tags.insert(tag.name.clone(), tag);
    }
    for namespace in namespaces {
        if namespace.resources.is_empty() {
            continue;
        }
        match tags.get_mut(&namespace.name) {
            Some(existing) => {
                if namespace.description.is_some() {
                    existing.description = namespace.description.clone();
                }
            }
            None => {
                tags.insert(
                    namespace.name.clone(),
                    Tag {
                        name: namespace.name.clone(),
                        description: namespace.description.clone(),
                    },
                );
            }
        }
    }
    tags.into_values().collect()
}
