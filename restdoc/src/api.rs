//! API 配置与文档编译
//!
//! `Api` 持有全部命名空间和 API 级设置，`compile` 按固定顺序生成文档：
//! 信息块、basePath/host、安全方案、默认安全要求、标签、定义、路径、共享错误响应。
//! 编译只读取注册表，可以重复调用。

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::Result;
use crate::aggregate::{CompiledResource, compile_resource_doc};
use crate::merge::Merge;
use crate::operation::{self, DefaultId, OperationContext, compile_operation, shared_parameters};
use crate::path::{Converters, to_spec_path};
use crate::resource::Namespace;
use crate::response::{ErrorHandler, ErrorHandlers, register_errors};
use crate::security::{Security, SecurityScheme};
use crate::swagger::{Contact, Info, License, PathItem, SWAGGER_VERSION, Swagger};
use crate::tag::{TagSpec, extract_tags};

/// 可从配置文件加载的 API 设置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub terms_url: Option<String>,
    pub contact: Option<String>,
    pub contact_email: Option<String>,
    pub contact_url: Option<String>,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub base_path: Option<String>,
    #[serde(alias = "server_name")]
    pub host: Option<String>,
    pub subdomain: Option<String>,
    pub schemes: Vec<String>,
    pub tags: Vec<Value>,
    pub security: Option<Value>,
    pub representations: Vec<String>,
    pub converters: Vec<String>,
}

impl ApiConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// 一个 API：命名空间与全局设置
#[derive(Clone)]
pub struct Api {
    title: String,
    version: String,
    description: Option<String>,
    terms_url: Option<String>,
    contact: Option<String>,
    contact_email: Option<String>,
    contact_url: Option<String>,
    license: Option<String>,
    license_url: Option<String>,
    base_path: String,
    host: Option<String>,
    subdomain: Option<String>,
    schemes: Vec<String>,
    tags: Vec<TagSpec>,
    security: Option<Security>,
    authorizations: IndexMap<String, SecurityScheme>,
    representations: Vec<String>,
    converters: Converters,
    error_handlers: ErrorHandlers,
    default_id: DefaultId,
    namespaces: Vec<Namespace>,
}

impl Default for Api {
    fn default() -> Self {
        Self::new("API", "1.0")
    }
}

impl Api {
    pub fn new<T: Into<String>, V: Into<String>>(title: T, version: V) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
            terms_url: None,
            contact: None,
            contact_email: None,
            contact_url: None,
            license: None,
            license_url: None,
            base_path: "/".to_string(),
            host: None,
            subdomain: None,
            schemes: Vec::new(),
            tags: Vec::new(),
            security: None,
            authorizations: IndexMap::new(),
            representations: vec![mime::APPLICATION_JSON.to_string()],
            converters: Converters::default(),
            error_handlers: ErrorHandlers::new(),
            default_id: Arc::new(operation::default_id),
            namespaces: Vec::new(),
        }
    }

    /// 从配置创建，标签和安全声明格式错误时失败
    pub fn from_config(config: ApiConfig) -> Result<Self> {
        let mut api = Self::default();
        if let Some(title) = config.title {
            api.title = title;
        }
        if let Some(version) = config.version {
            api.version = version;
        }
        if let Some(base_path) = config.base_path {
            api.base_path = base_path;
        }
        if !config.representations.is_empty() {
            api.representations = config.representations;
        }
        for converter in config.converters {
            api.converters.register(converter);
        }
        api.description = config.description;
        api.terms_url = config.terms_url;
        api.contact = config.contact;
        api.contact_email = config.contact_email;
        api.contact_url = config.contact_url;
        api.license = config.license;
        api.license_url = config.license_url;
        api.host = config.host;
        api.subdomain = config.subdomain;
        api.schemes = config.schemes;
        api.tags = config
            .tags
            .iter()
            .map(TagSpec::try_from)
            .collect::<Result<_>>()?;
        api.security = config
            .security
            .as_ref()
            .map(Security::from_value)
            .transpose()?;
        Ok(api)
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn terms_url<S: Into<String>>(mut self, url: S) -> Self {
        self.terms_url = Some(url.into());
        self
    }

    /// 联系人；只有同时提供邮箱或网址时才会输出
    pub fn contact<S: Into<String>>(
        mut self,
        name: S,
        email: Option<&str>,
        url: Option<&str>,
    ) -> Self {
        self.contact = Some(name.into());
        self.contact_email = email.map(String::from);
        self.contact_url = url.map(String::from);
        self
    }

    pub fn license<S: Into<String>>(mut self, name: S, url: Option<&str>) -> Self {
        self.license = Some(name.into());
        self.license_url = url.map(String::from);
        self
    }

    pub fn base_path<S: Into<String>>(mut self, base_path: S) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn subdomain<S: Into<String>>(mut self, subdomain: S) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    pub fn scheme<S: Into<String>>(mut self, scheme: S) -> Self {
        self.schemes.push(scheme.into());
        self
    }

    pub fn tag<T: Into<TagSpec>>(mut self, tag: T) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// API 级的默认安全要求
    pub fn security<S: Into<Security>>(mut self, security: S) -> Self {
        self.security = Some(security.into());
        self
    }

    pub fn authorization<S: Into<String>>(mut self, name: S, scheme: SecurityScheme) -> Self {
        self.authorizations.insert(name.into(), scheme);
        self
    }

    /// 替换输出的媒体类型列表
    pub fn representations<I, S>(mut self, mimetypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.representations = mimetypes.into_iter().map(Into::into).collect();
        self
    }

    /// 注册路由器的自定义转换器
    pub fn converter<S: Into<String>>(mut self, name: S) -> Self {
        self.converters.register(name);
        self
    }

    pub fn errorhandler(mut self, handler: ErrorHandler) -> Self {
        self.error_handlers.insert(handler.kind.clone(), handler);
        self
    }

    /// 自定义 operationId 生成：`(资源名, 小写方法名)`
    pub fn default_id<F>(mut self, default_id: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        self.default_id = Arc::new(default_id);
        self
    }

    pub fn namespace(mut self, namespace: Namespace) -> Self {
        self.namespaces.push(namespace);
        self
    }

    /// API 级与全部命名空间的错误处理器，命名空间的注册覆盖同类别的 API 级注册
    pub fn error_handlers(&self) -> ErrorHandlers {
        self.namespaces
            .iter()
            .fold(self.error_handlers.clone(), |mut handlers, namespace| {
                handlers.extend(namespace.error_handlers.clone());
                handlers
            })
    }

    fn info(&self) -> Info {
        let contact = match (&self.contact, &self.contact_email, &self.contact_url) {
            (Some(name), email, url) if email.is_some() || url.is_some() => Some(Contact {
                name: name.clone(),
                email: email.clone(),
                url: url.clone(),
            }),
            _ => None,
        };
        let license = self.license.as_ref().map(|name| License {
            name: name.clone(),
            url: self.license_url.clone(),
        });
        Info {
            title: self.title.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            terms_of_service: self.terms_url.clone(),
            contact,
            license,
        }
    }

    fn normalized_base_path(&self) -> String {
        match self.base_path.strip_suffix('/') {
            Some(stripped) if self.base_path.len() > 1 => stripped.to_string(),
            _ => self.base_path.clone(),
        }
    }

    fn normalized_host(&self) -> Option<String> {
        let host = self.host.as_deref().filter(|host| !host.is_empty())?;
        Some(match self.subdomain.as_deref().filter(|s| !s.is_empty()) {
            Some(subdomain) => format!("{subdomain}.{host}"),
            None => host.to_string(),
        })
    }

    fn path_item(
        &self,
        compiled: &CompiledResource,
        tag: &str,
        error_handlers: &ErrorHandlers,
    ) -> PathItem {
        let context = OperationContext {
            tag,
            error_handlers,
            default_id: &self.default_id,
        };
        let operations = compiled
            .methods
            .iter()
            .map(|(method, compiled_method)| {
                let operation = compile_operation(compiled, method, compiled_method, &context);
                (method.as_str().to_lowercase(), operation)
            })
            .collect();
        PathItem {
            parameters: shared_parameters(compiled),
            operations,
        }
    }

    fn paths(&self, error_handlers: &ErrorHandlers) -> Result<IndexMap<String, PathItem>> {
        let mut paths: IndexMap<String, PathItem> = IndexMap::new();
        for namespace in &self.namespaces {
            for registered in &namespace.resources {
                for url in namespace.urls(registered) {
                    let Some(compiled) = compile_resource_doc(
                        &registered.resource,
                        &url,
                        &registered.registration,
                        &self.converters,
                    )?
                    else {
                        continue;
                    };

                    let item = self.path_item(&compiled, &namespace.name, error_handlers);
                    if item.is_empty() {
                        tracing::debug!(
                            resource = %compiled.name,
                            url = %url,
                            "no operations, path skipped"
                        );
                        continue;
                    }

                    let template = to_spec_path(&url);
                    match paths.get_mut(&template) {
                        Some(existing) => existing.absorb(item),
                        None => {
                            paths.insert(template, item);
                        }
                    }
                }
            }
        }
        Ok(paths)
    }

    /// 编译文档
    ///
    /// 任一资源使用了未注册的转换器时整体失败，不返回部分文档。
    pub fn compile(&self) -> Result<Swagger> {
        tracing::debug!(
            title = %self.title,
            namespaces = self.namespaces.len(),
            "compiling swagger document"
        );

        let info = self.info();
        let base_path = self.normalized_base_path();
        let host = self.normalized_host();

        let security_definitions = self
            .namespaces
            .iter()
            .fold(self.authorizations.clone(), |merged, namespace| {
                merged.merge(&namespace.authorizations)
            });
        let security = self
            .security
            .as_ref()
            .map(Security::requirements)
            .filter(|requirements| !requirements.is_empty());

        let tags = extract_tags(&self.tags, &self.namespaces);
        tracing::debug!(count = tags.len(), "tags extracted");

        let mut definitions = IndexMap::new();
        for namespace in &self.namespaces {
            for (name, schema) in &namespace.schemas {
                definitions.insert(name.clone(), schema.clone());
            }
        }
        tracing::debug!(count = definitions.len(), "definitions registered");

        let error_handlers = self.error_handlers();
        let paths = self.paths(&error_handlers)?;
        tracing::debug!(count = paths.len(), "paths compiled");

        let responses = register_errors(&error_handlers);

        Ok(Swagger {
            swagger: SWAGGER_VERSION,
            info,
            base_path,
            host,
            schemes: self.schemes.clone(),
            consumes: vec![mime::APPLICATION_JSON.to_string()],
            produces: self.representations.clone(),
            security_definitions,
            security,
            tags,
            definitions,
            paths,
            responses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RestDocError;
    use crate::doc::Doc;
    use crate::resource::Resource;
    use crate::security::ApiKeyLocation;
    use http::Method;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_minimal_document() {
        let swagger = Api::new("Pets", "2.0").compile().unwrap();
        assert_eq!(
            swagger.to_value().unwrap(),
            json!({
                "swagger": "2.0",
                "info": {"title": "Pets", "version": "2.0"},
                "basePath": "/",
                "consumes": ["application/json"],
                "produces": ["application/json"],
                "tags": [],
                "paths": {}
            })
        );
    }

    #[test]
    fn test_info_block() {
        let api = Api::new("Pets", "1.0")
            .description("Pet store")
            .terms_url("https://example.com/terms")
            .contact("Team", Some("team@example.com"), None)
            .license("MIT", Some("https://opensource.org/licenses/MIT"));
        let info = serde_json::to_value(api.compile().unwrap().info).unwrap();
        assert_eq!(
            info,
            json!({
                "title": "Pets",
                "version": "1.0",
                "description": "Pet store",
                "termsOfService": "https://example.com/terms",
                "contact": {"name": "Team", "email": "team@example.com"},
                "license": {"name": "MIT", "url": "https://opensource.org/licenses/MIT"}
            })
        );

        let anonymous = Api::default().contact("Team", None, None);
        assert_eq!(anonymous.compile().unwrap().info.contact, None);
    }

    #[test]
    fn test_path_without_operations_is_skipped() {
        let resource = Resource::new("Item")
            .doc(Doc::new().hide_method(Method::GET))
            .get(Doc::new());
        let ns = Namespace::new("items").add_resource(resource, ["/<int:id>"]);
        let swagger = Api::default().namespace(ns).compile().unwrap();
        assert!(swagger.paths.is_empty());
        assert_eq!(swagger.tags.len(), 1);
    }

    #[test]
    fn test_base_path_and_host() {
        let swagger = Api::default()
            .base_path("/api/v1/")
            .host("example.com")
            .subdomain("pets")
            .scheme("https")
            .compile()
            .unwrap();
        assert_eq!(swagger.base_path, "/api/v1");
        assert_eq!(swagger.host.as_deref(), Some("pets.example.com"));
        assert_eq!(swagger.schemes, vec!["https".to_string()]);
        let root = Api::default().base_path("/").compile().unwrap();
        assert_eq!(root.base_path, "/");
    }

    #[test]
    fn test_security_definitions_merge_namespaces() {
        let admin = Namespace::new("admin").authorization("basic", SecurityScheme::basic());
        let api = Api::default()
            .authorization(
                "apikey",
                SecurityScheme::api_key("X-API-KEY", ApiKeyLocation::Header),
            )
            .security("apikey")
            .namespace(admin);
        let swagger = api.compile().unwrap().to_value().unwrap();
        assert_eq!(
            swagger["securityDefinitions"],
            json!({
                "apikey": {"type": "apiKey", "name": "X-API-KEY", "in": "header"},
                "basic": {"type": "basic"}
            })
        );
        assert_eq!(swagger["security"], json!([{"apikey": []}]));

        let none = Api::default().security(Security::none()).compile().unwrap();
        assert_eq!(none.security, None);
    }

    #[test]
    fn test_custom_default_id() {
        let pet = Resource::new("Pet").get(Doc::new());
        let api = Api::default()
            .default_id(|resource, method| format!("{resource}.{method}"))
            .namespace(Namespace::new("pets").add_resource(pet, ["/"]));
        let swagger = api.compile().unwrap();
        let operation = &swagger.paths["/pets/"].operations["get"];
        assert_eq!(operation.operation_id, "Pet.get");
    }

    #[test]
    fn test_from_config() {
        let config = ApiConfig::from_json(
            r#"{
                "title": "Configured",
                "version": "3.1",
                "server_name": "api.example.com",
                "base_path": "/v3/",
                "tags": ["pets", ["users", "People"]],
                "security": {"oauth2": "read"},
                "converters": ["slug"]
            }"#,
        )
        .unwrap();
        let post = Resource::new("Post").get(Doc::new());
        let posts = Namespace::new("posts").add_resource(post, ["/<slug:title>"]);
        let api = Api::from_config(config).unwrap().namespace(posts);
        let swagger = api.compile().unwrap().to_value().unwrap();
        assert_eq!(
            swagger["info"],
            json!({"title": "Configured", "version": "3.1"})
        );
        assert_eq!(swagger["host"], json!("api.example.com"));
        assert_eq!(swagger["basePath"], json!("/v3"));
        assert_eq!(swagger["security"], json!([{"oauth2": ["read"]}]));
        assert_eq!(
            swagger["tags"],
            json!([{"name": "pets"}, {"name": "users", "description": "People"}, {"name": "posts"}])
        );
        assert!(swagger["paths"]["/posts/{title}"]["get"].is_object());
    }

    #[test]
    fn test_config_rejects_unknown_tag() {
        let config = ApiConfig::from_json(r#"{"tags": [42]}"#).unwrap();
        assert!(matches!(
            Api::from_config(config),
            Err(RestDocError::UnknownTagFormat { .. })
        ));
        let err = ApiConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, RestDocError::Json(_)));
    }
}
