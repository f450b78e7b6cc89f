//! Schema 引用与定义转换
//!
//! schema 对象由 utoipa 提供，编译器只把它们当作不透明的值透传到
//! `definitions` 中。这里负责两件事：在注解里引用 schema，以及把 utoipa
//! 生成的 OpenAPI 3.1 schema 调整为 Swagger 2.0 能接受的形式。

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use utoipa::openapi::RefOr;
use utoipa::openapi::schema::Schema;

use crate::merge::Merge;
use crate::{RestDocError, Result};

const COMPONENTS_PREFIX: &str = "#/components/schemas/";
const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// 注解中对 schema 的引用
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaRef {
    /// 按名称引用已注册的定义
    Ref(String),
    /// 内联 schema
    Inline(Value),
    /// 元素为给定 schema 的数组
    Array(Box<SchemaRef>),
}

impl SchemaRef {
    /// 按名称引用
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self::Ref(name.into())
    }

    /// 引用 utoipa 类型对应的定义
    pub fn of<T: ToSchema>() -> Self {
        Self::Ref(T::name().into_owned())
    }

    /// 内联 schema，其中的 `$ref` 会被改写为 Swagger 2.0 形式
    pub fn inline(value: Value) -> Self {
        Self::Inline(to_swagger_schema(value))
    }

    /// 包装为数组
    pub fn list(self) -> Self {
        Self::Array(Box::new(self))
    }

    /// 渲染为 Swagger 2.0 schema 对象
    pub fn to_value(&self) -> Value {
        match self {
            SchemaRef::Ref(name) => {
                let mut map = Map::new();
                map.insert(
                    "$ref".into(),
                    Value::String(format!("{DEFINITIONS_PREFIX}{name}")),
                );
                Value::Object(map)
            }
            SchemaRef::Inline(value) => value.clone(),
            SchemaRef::Array(items) => {
                let mut map = Map::new();
                map.insert("type".into(), Value::String("array".into()));
                map.insert("items".into(), items.to_value());
                Value::Object(map)
            }
        }
    }

    /// 从无类型的注解值解析：字符串为名称引用，对象为内联 schema，
    /// 单元素数组为列表，`null` 表示没有 schema。
    pub fn from_value(value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::String(name) => Ok(Some(Self::named(name.as_str()))),
            Value::Object(_) => Ok(Some(Self::inline(value.clone()))),
            Value::Array(items) if items.len() == 1 => {
                Ok(Self::from_value(&items[0])?.map(SchemaRef::list))
            }
            other => Err(RestDocError::invalid_annotation(
                "schema",
                format!("无法识别的 schema 声明: {other}"),
            )),
        }
    }
}

impl Serialize for SchemaRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl Merge for SchemaRef {
    fn merge(&self, overlay: &Self) -> Self {
        overlay.clone()
    }
}

/// 收集 utoipa 类型及其依赖的全部定义
///
/// 返回 `(名称, schema)` 列表，依赖在前，类型自身在最后。
pub fn definitions_of<T: ToSchema>() -> Result<Vec<(String, Value)>> {
    let mut collected: Vec<(String, RefOr<Schema>)> = Vec::new();
    T::schemas(&mut collected);
    collected.push((T::name().into_owned(), T::schema()));

    let mut definitions = Vec::with_capacity(collected.len());
    for (name, schema) in collected {
        let value = serde_json::to_value(&schema)?;
        definitions.push((name, to_swagger_schema(value)));
    }
    Ok(definitions)
}

/// 把 OpenAPI 3.1 schema 调整为 Swagger 2.0 形式
///
/// - `#/components/schemas/X` 引用改写为 `#/definitions/X`
/// - `type: [T, "null"]` 收敛为 `type: T` 并标记 `x-nullable`
/// - `oneOf: [{type: null}, X]` 收敛为 X
pub fn to_swagger_schema(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                match (key.as_str(), value) {
                    ("$ref", Value::String(reference)) => {
                        let reference = match reference.strip_prefix(COMPONENTS_PREFIX) {
                            Some(name) => format!("{DEFINITIONS_PREFIX}{name}"),
                            None => reference,
                        };
                        out.insert(key, Value::String(reference));
                    }
                    ("type", Value::Array(types)) => {
                        let concrete: Vec<Value> = types
                            .into_iter()
                            .filter(|t| t.as_str() != Some("null"))
                            .collect();
                        let nullable = concrete.len() == 1;
                        match concrete.into_iter().next() {
                            Some(single) if nullable => {
                                out.insert(key, single);
                                out.insert("x-nullable".into(), Value::Bool(true));
                            }
                            Some(single) => {
                                out.insert(key, single);
                            }
                            None => {}
                        }
                    }
                    (_, value) => {
                        out.insert(key, to_swagger_schema(value));
                    }
                }
            }
            collapse_nullable_one_of(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(to_swagger_schema).collect()),
        other => other,
    }
}

fn collapse_nullable_one_of(mut map: Map<String, Value>) -> Value {
    let variant = match map.get("oneOf") {
        Some(Value::Array(variants)) if variants.len() == 2 => {
            let is_null = |v: &Value| v.get("type").and_then(Value::as_str) == Some("null");
            match (is_null(&variants[0]), is_null(&variants[1])) {
                (true, false) => Some(variants[1].clone()),
                (false, true) => Some(variants[0].clone()),
                _ => None,
            }
        }
        _ => None,
    };
    match variant {
        Some(Value::Object(inner)) => {
            map.remove("oneOf");
            for (key, value) in inner {
                map.entry(key).or_insert(value);
            }
            Value::Object(map)
        }
        _ => Value::Object(map),
    }
}
