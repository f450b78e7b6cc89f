//! 资源文档收集
//!
//! 把资源级注解、路径参数和各方法的注解合并为每个方法的文档，并处理参数下推：
//! 只要有一个方法重新声明了共享参数，这个参数就不再作为路径级共享参数输出，
//! 而是复制到每个没有自行声明它的方法中。Swagger 2.0 的共享参数无法表达
//! “同一参数在 GET 和 POST 上含义不同”。

use std::collections::HashSet;

use http::Method;
use indexmap::IndexMap;

use crate::Result;
use crate::doc::{Annotation, Doc};
use crate::merge::Merge;
use crate::param::{DeclaredKey, Expect, Location, Param, ParamKey};
use crate::path::{Converters, extract_path_params, placeholder_names};
use crate::resource::{Registration, Resource};

/// 编译后的资源：共享参数和每个方法的文档
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledResource {
    pub name: String,
    /// 资源级文档（不含 `methods` 子文档）
    pub doc: Doc,
    /// 下推之后仍然共享的参数
    pub params: IndexMap<ParamKey, Param>,
    pub methods: IndexMap<Method, CompiledMethod>,
}

/// 单个方法合并后的文档
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMethod {
    pub doc: Doc,
    /// 方法自己的参数加上下推的参数
    pub params: IndexMap<ParamKey, Param>,
    /// 资源级在前，方法级在后
    pub expect: Vec<Expect>,
}

/// 把声明键解析为确定位置的键：未声明位置时，路径占位符为 path，其余为 query
fn resolve_key(key: &DeclaredKey, placeholders: &[String]) -> ParamKey {
    let (name, location) = key;
    let location = location.unwrap_or_else(|| {
        if placeholders.iter().any(|p| p == name) {
            Location::Path
        } else {
            Location::Query
        }
    });
    (name.clone(), location)
}

fn resolve_params(
    params: &IndexMap<DeclaredKey, Param>,
    placeholders: &[String],
) -> IndexMap<ParamKey, Param> {
    let mut resolved: IndexMap<ParamKey, Param> = IndexMap::new();
    for (key, param) in params {
        let key = resolve_key(key, placeholders);
        let merged = match resolved.get(&key) {
            Some(existing) => existing.merge(param),
            None => param.clone(),
        };
        resolved.insert(key, merged);
    }
    resolved
}

/// 编译资源绑定在 `url` 上的文档，资源被隐藏时返回 `None`
pub fn compile_resource_doc(
    resource: &Resource,
    url: &str,
    registration: &Registration,
    converters: &Converters,
) -> Result<Option<CompiledResource>> {
    let Annotation::Doc(resource_doc) = &resource.doc else {
        tracing::debug!(resource = %resource.name, url, "resource hidden, skipped");
        return Ok(None);
    };

    let placeholders = placeholder_names(url);

    let mut shared: IndexMap<ParamKey, Param> = IndexMap::new();
    for (name, param) in extract_path_params(url, converters)? {
        shared.insert((name, Location::Path), param);
    }
    for (key, param) in resolve_params(&resource_doc.params, &placeholders) {
        let merged = match shared.get(&key) {
            Some(existing) => existing.merge(&param),
            None => param,
        };
        shared.insert(key, merged);
    }
    for ((_, location), param) in shared.iter_mut() {
        if *location == Location::Path {
            param.required = Some(true);
        }
    }

    let mut methods: IndexMap<Method, (Doc, IndexMap<ParamKey, Param>)> = IndexMap::new();
    let mut push_down: HashSet<ParamKey> = HashSet::new();

    for (method, handler) in &resource.handlers {
        if !registration.allows(method) {
            tracing::debug!(resource = %resource.name, %method, "method excluded by registration");
            continue;
        }
        let sub_doc = resource_doc
            .methods
            .get(method)
            .cloned()
            .unwrap_or_default();
        let Annotation::Doc(method_doc) = sub_doc.accumulate(handler) else {
            tracing::debug!(resource = %resource.name, %method, "method hidden, skipped");
            continue;
        };

        let own = resolve_params(&method_doc.params, &placeholders);
        for key in own.keys() {
            if shared.contains_key(key) {
                tracing::trace!(
                    resource = %resource.name,
                    %method,
                    param = %key.0,
                    location = %key.1,
                    "shared parameter overridden, pushing down"
                );
                push_down.insert(key.clone());
            }
        }
        methods.insert(method.clone(), (method_doc, own));
    }

    let methods = methods
        .into_iter()
        .map(|(method, (doc, own))| {
            let mut params: IndexMap<ParamKey, Param> = IndexMap::new();
            for (key, param) in &shared {
                if !push_down.contains(key) {
                    continue;
                }
                let merged = match own.get(key) {
                    Some(overlay) => param.merge(overlay),
                    None => param.clone(),
                };
                params.insert(key.clone(), merged);
            }
            for (key, param) in own {
                params.entry(key).or_insert(param);
            }
            for ((_, location), param) in params.iter_mut() {
                if *location == Location::Path {
                    param.required = Some(true);
                }
            }

            let expect = resource_doc
                .expect
                .iter()
                .chain(doc.expect.iter())
                .cloned()
                .collect();
            (
                method,
                CompiledMethod {
                    doc,
                    params,
                    expect,
                },
            )
        })
        .collect();

    shared.retain(|key, _| !push_down.contains(key));

    let mut doc = resource_doc.clone();
    doc.methods.clear();

    Ok(Some(CompiledResource {
        name: resource.name.clone(),
        doc,
        params: shared,
        methods,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RestDocError;
    use crate::param::ParamType;
    use crate::schema::SchemaRef;

    fn compile(resource: &Resource, url: &str) -> CompiledResource {
        compile_resource_doc(
            resource,
            url,
            &Registration::default(),
            &Converters::default(),
        )
        .unwrap()
        .unwrap()
    }

    fn keys(params: &IndexMap<ParamKey, Param>) -> Vec<(&str, Location)> {
        params
            .keys()
            .map(|(name, location)| (name.as_str(), *location))
            .collect()
    }

    #[test]
    fn test_hidden_resource() {
        let resource = Resource::new("Secret").hide().get(Doc::new());
        let compiled = compile_resource_doc(
            &resource,
            "/secret",
            &Registration::default(),
            &Converters::default(),
        )
        .unwrap();
        assert!(compiled.is_none());
    }

    #[test]
    fn test_shared_path_params() {
        let id = Param::new("id").description("identifier").required(false);
        let resource = Resource::new("Item")
            .doc(Doc::new().param(id))
            .get(Doc::new())
            .delete(Doc::new());
        let compiled = compile(&resource, "/items/<int:id>");
        assert_eq!(keys(&compiled.params), vec![("id", Location::Path)]);
        let id = &compiled.params[&("id".to_string(), Location::Path)];
        assert_eq!(id.ty, Some(ParamType::Integer));
        assert_eq!(id.description.as_deref(), Some("identifier"));
        assert_eq!(id.required, Some(true));
        assert!(compiled.methods[&Method::GET].params.is_empty());
    }

    #[test]
    fn test_push_down_on_divergent_methods() {
        let resource = Resource::new("Item")
            .get(Doc::new().param(Param::new("id").ty(ParamType::Integer)))
            .post(Doc::new().param(Param::new("id").ty(ParamType::String)))
            .delete(Doc::new());
        let compiled = compile(&resource, "/items/<id>");
        let key = ("id".to_string(), Location::Path);

        assert!(compiled.params.is_empty());
        let param = |method: Method| &compiled.methods[&method].params[&key];
        assert_eq!(param(Method::GET).ty, Some(ParamType::Integer));
        assert_eq!(param(Method::POST).ty, Some(ParamType::String));
        // 未声明的方法拿到共享的描述
        assert_eq!(param(Method::DELETE).ty, Some(ParamType::String));
        assert_eq!(param(Method::DELETE).required, Some(true));
    }

    #[test]
    fn test_method_only_params_stay_local() {
        let resource = Resource::new("Items")
            .doc(Doc::new().param(Param::header("X-Tenant")))
            .get(Doc::new().param(Param::new("limit").ty(ParamType::Integer)))
            .post(Doc::new());
        let compiled = compile(&resource, "/items");
        assert_eq!(keys(&compiled.params), vec![("X-Tenant", Location::Header)]);
        assert_eq!(
            keys(&compiled.methods[&Method::GET].params),
            vec![("limit", Location::Query)]
        );
        assert!(compiled.methods[&Method::POST].params.is_empty());
    }

    #[test]
    fn test_resource_sub_document_and_handler_merge() {
        let sub = Doc::new()
            .description("replace")
            .expect(Expect::body(SchemaRef::named("Sub")));
        let handler = Doc::new()
            .id("replace_item")
            .expect(Expect::body(SchemaRef::named("Handler")));
        let resource = Resource::new("Item")
            .doc(
                Doc::new()
                    .expect(Expect::body(SchemaRef::named("Base")))
                    .method(Method::PUT, sub)
                    .hide_method(Method::DELETE),
            )
            .put(handler)
            .delete(Doc::new());
        let compiled = compile(&resource, "/items/<id>");

        assert!(!compiled.methods.contains_key(&Method::DELETE));
        let put = &compiled.methods[&Method::PUT];
        assert_eq!(put.doc.id.as_deref(), Some("replace_item"));
        assert_eq!(put.doc.description.as_deref(), Some("replace"));
        let schemas: Vec<_> = put.expect.iter().map(|e| e.schema.clone()).collect();
        assert_eq!(
            schemas,
            vec![
                SchemaRef::named("Base"),
                SchemaRef::named("Sub"),
                SchemaRef::named("Handler")
            ]
        );
    }

    #[test]
    fn test_repeated_resource_docs_accumulate_method_expect() {
        let a = Expect::body(SchemaRef::named("A")).name("a");
        let b = Expect::body(SchemaRef::named("B")).name("b");
        let resource = Resource::new("Item")
            .doc(Doc::new().method(Method::PUT, Doc::new().expect(a)))
            .doc(Doc::new().method(Method::PUT, Doc::new().expect(b)))
            .put(Doc::new());
        let compiled = compile(&resource, "/items/<id>");
        let names: Vec<_> = compiled.methods[&Method::PUT]
            .expect
            .iter()
            .map(|e| e.name.as_deref())
            .collect();
        assert_eq!(names, vec![Some("a"), Some("b")]);
    }

    #[test]
    fn test_latest_param_declaration_wins() {
        let resource = Resource::new("Item")
            .doc(Doc::new().param(Param::path("id").description("first")))
            .doc(Doc::new().param(Param::new("id").description("second")))
            .doc(Doc::new().param(Param::path("id").description("third")))
            .get(Doc::new());
        let compiled = compile(&resource, "/items/<int:id>");
        assert_eq!(keys(&compiled.params), vec![("id", Location::Path)]);
        let id = &compiled.params[&("id".to_string(), Location::Path)];
        assert_eq!(id.description.as_deref(), Some("third"));
    }

    #[test]
    fn test_registration_excludes_methods() {
        let resource = Resource::new("Item")
            .get(Doc::new().param(Param::new("id").ty(ParamType::Integer)))
            .post(Doc::new());
        let compiled = compile_resource_doc(
            &resource,
            "/items/<id>",
            &Registration::methods([Method::POST]),
            &Converters::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            compiled.methods.keys().collect::<Vec<_>>(),
            vec![&Method::POST]
        );
        // 被排除的方法不触发下推
        assert_eq!(keys(&compiled.params), vec![("id", Location::Path)]);
    }

    #[test]
    fn test_resource_without_methods() {
        let compiled = compile(&Resource::new("Empty"), "/empty");
        assert!(compiled.methods.is_empty());
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_unsupported_converter_is_fatal() {
        let err = compile_resource_doc(
            &Resource::new("Post").get(Doc::new()),
            "/posts/<slug:title>",
            &Registration::default(),
            &Converters::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RestDocError::UnsupportedPathConverter { .. }));
    }
}
