//! 操作对象的生成

use std::sync::Arc;

use http::Method;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{CompiledMethod, CompiledResource};
use crate::doc::Docstring;
use crate::param::{Location, ParamKey, ParameterObject};
use crate::response::{ErrorHandlers, ResponseObject, resolve_responses};
use crate::security::{SecurityRequirement, security_for};

static RE_FIRST_CAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("first cap pattern is valid"));
static RE_ALL_CAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("all cap pattern is valid"));

/// 生成 operationId 的函数：`(资源名, 小写方法名)`
pub type DefaultId = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// `CamelCase` → `camel_case`
///
/// 先在“大写字母 + 小写字母”之前插入分隔符，再在“小写字母或数字 + 大写字母”之间插入。
pub fn camel_to_dash(value: &str) -> String {
    let first = RE_FIRST_CAP.replace_all(value, "${1}_${2}");
    RE_ALL_CAP.replace_all(&first, "${1}_${2}").to_lowercase()
}

/// 缺省的 operationId：`{method}_{camel_to_dash(resource)}`
pub fn default_id(resource: &str, method: &str) -> String {
    format!("{method}_{}", camel_to_dash(resource))
}

/// 输出文档中的操作对象
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produces: Option<Vec<String>>,
    pub responses: IndexMap<String, ResponseObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(flatten)]
    pub vendor: IndexMap<String, Value>,
}

/// 生成操作时需要的 API 级上下文
pub struct OperationContext<'a> {
    pub tag: &'a str,
    pub error_handlers: &'a ErrorHandlers,
    pub default_id: &'a DefaultId,
}

/// 路径级共享参数
pub fn shared_parameters(resource: &CompiledResource) -> Vec<ParameterObject> {
    resource
        .params
        .iter()
        .map(|((_, location), param)| param.to_object(*location))
        .collect()
}

/// 方法参数与期望输入，按 `(name, in)` 去重，后出现的覆盖先出现的
fn method_parameters(method: &CompiledMethod) -> Vec<ParameterObject> {
    let mut parameters: IndexMap<ParamKey, ParameterObject> = IndexMap::new();
    for ((_, location), param) in &method.params {
        let object = param.to_object(*location);
        parameters.insert(object.key(), object);
    }
    for expect in &method.expect {
        let object = expect.to_object();
        parameters.insert(object.key(), object);
    }
    parameters.into_values().collect()
}

/// 存在 formData 参数时的 consumes
fn form_consumes(
    shared: &[ParameterObject],
    parameters: &[ParameterObject],
) -> Option<Vec<String>> {
    let all = || shared.iter().chain(parameters.iter());
    if !all().any(|p| p.location == Location::FormData) {
        return None;
    }
    let consumes = if all().any(|p| p.ty == Some("file")) {
        vec![mime::MULTIPART_FORM_DATA.to_string()]
    } else {
        vec![
            mime::APPLICATION_WWW_FORM_URLENCODED.to_string(),
            mime::MULTIPART_FORM_DATA.to_string(),
        ]
    };
    Some(consumes)
}

fn description_for(
    resource: &CompiledResource,
    method: &CompiledMethod,
    docstring: &Docstring,
) -> Option<String> {
    let parts: Vec<&str> = [
        resource.doc.description.as_deref(),
        method.doc.description.as_deref(),
        docstring.details.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    let description = parts.join("\n").trim().to_string();
    (!description.is_empty()).then_some(description)
}

fn vendor_fields(resource: &CompiledResource, method: &CompiledMethod) -> IndexMap<String, Value> {
    resource
        .doc
        .vendor
        .iter()
        .chain(method.doc.vendor.iter())
        .map(|(key, value)| {
            let key = if key.starts_with("x-") {
                key.clone()
            } else {
                format!("x-{key}")
            };
            (key, value.clone())
        })
        .collect()
}

/// 生成单个方法的操作对象
pub fn compile_operation(
    resource: &CompiledResource,
    method: &Method,
    compiled: &CompiledMethod,
    context: &OperationContext<'_>,
) -> Operation {
    let docstring = Docstring::parse(compiled.doc.docstring.as_deref());
    let verb = method.as_str().to_lowercase();

    let parameters = method_parameters(compiled);
    let consumes = form_consumes(&shared_parameters(resource), &parameters);
    let deprecated =
        resource.doc.deprecated == Some(true) || compiled.doc.deprecated == Some(true);

    Operation {
        tags: vec![context.tag.to_string()],
        summary: compiled
            .doc
            .summary
            .clone()
            .or_else(|| docstring.summary.clone()),
        description: description_for(resource, compiled, &docstring),
        operation_id: compiled
            .doc
            .id
            .clone()
            .unwrap_or_else(|| (context.default_id)(&resource.name, &verb)),
        parameters,
        consumes,
        produces: compiled.doc.produces.clone(),
        responses: resolve_responses(
            &resource.doc,
            &compiled.doc,
            &docstring.raises,
            context.error_handlers,
        ),
        security: security_for(
            resource.doc.security.as_ref(),
            compiled.doc.security.as_ref(),
        ),
        deprecated: deprecated.then_some(true),
        vendor: vendor_fields(resource, compiled),
    }
}
