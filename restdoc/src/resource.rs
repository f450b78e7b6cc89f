//! 资源与命名空间
//!
//! 命名空间在应用启动时构建，注册完成后只读。资源记录它实现的 HTTP 方法，
//! 每个方法携带处理函数自身的注解文档。

use http::Method;
use indexmap::IndexMap;
use serde_json::Value;
use utoipa::ToSchema;

use crate::Result;
use crate::doc::{Annotation, Doc};
use crate::response::{ErrorHandler, ErrorHandlers};
use crate::schema::definitions_of;
use crate::security::SecurityScheme;

/// 一个资源：名称、资源级注解，以及各个方法处理函数的注解
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub doc: Annotation<Doc>,
    pub handlers: IndexMap<Method, Annotation<Doc>>,
}

impl Resource {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            doc: Annotation::default(),
            handlers: IndexMap::new(),
        }
    }

    /// 追加资源级注解，重复调用逐次合并
    pub fn doc<A: Into<Annotation<Doc>>>(mut self, doc: A) -> Self {
        self.doc = self.doc.accumulate(&doc.into());
        self
    }

    /// 从文档中隐藏整个资源
    pub fn hide(mut self) -> Self {
        self.doc = Annotation::Hidden;
        self
    }

    /// 声明实现的方法及其处理函数注解
    pub fn handler<A: Into<Annotation<Doc>>>(mut self, method: Method, doc: A) -> Self {
        let doc = doc.into();
        let merged = match self.handlers.get(&method) {
            Some(existing) => existing.accumulate(&doc),
            None => doc,
        };
        self.handlers.insert(method, merged);
        self
    }

    pub fn get<A: Into<Annotation<Doc>>>(self, doc: A) -> Self {
        self.handler(Method::GET, doc)
    }

    pub fn post<A: Into<Annotation<Doc>>>(self, doc: A) -> Self {
        self.handler(Method::POST, doc)
    }

    pub fn put<A: Into<Annotation<Doc>>>(self, doc: A) -> Self {
        self.handler(Method::PUT, doc)
    }

    pub fn patch<A: Into<Annotation<Doc>>>(self, doc: A) -> Self {
        self.handler(Method::PATCH, doc)
    }

    pub fn delete<A: Into<Annotation<Doc>>>(self, doc: A) -> Self {
        self.handler(Method::DELETE, doc)
    }

    pub fn head<A: Into<Annotation<Doc>>>(self, doc: A) -> Self {
        self.handler(Method::HEAD, doc)
    }

    pub fn options<A: Into<Annotation<Doc>>>(self, doc: A) -> Self {
        self.handler(Method::OPTIONS, doc)
    }
}

/// 注册资源时的选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registration {
    /// 方法白名单，为空表示不限制
    pub methods: Vec<Method>,
}

impl Registration {
    pub fn methods<I: IntoIterator<Item = Method>>(methods: I) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }

    pub fn allows(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// 已注册的资源
#[derive(Debug, Clone)]
pub struct RegisteredResource {
    pub resource: Resource,
    pub urls: Vec<String>,
    pub registration: Registration,
}

/// 共享 URL 前缀的一组资源
#[derive(Debug, Clone)]
pub struct Namespace {
    pub name: String,
    pub description: Option<String>,
    path: Option<String>,
    pub resources: Vec<RegisteredResource>,
    pub schemas: IndexMap<String, Value>,
    pub authorizations: IndexMap<String, SecurityScheme>,
    pub error_handlers: ErrorHandlers,
}

impl Namespace {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            description: None,
            path: None,
            resources: Vec::new(),
            schemas: IndexMap::new(),
            authorizations: IndexMap::new(),
            error_handlers: ErrorHandlers::new(),
        }
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 自定义 URL 前缀
    pub fn path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(path.into());
        self
    }

    /// URL 前缀，缺省为 `/{name}`，末尾的 `/` 会被去掉
    pub fn prefix(&self) -> String {
        match self.path.as_deref().filter(|path| !path.is_empty()) {
            Some(path) => path.trim_end_matches('/').to_string(),
            None => format!("/{}", self.name).trim_end_matches('/').to_string(),
        }
    }

    pub fn add_resource<I, S>(self, resource: Resource, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_resource_with(resource, urls, Registration::default())
    }

    pub fn add_resource_with<I, S>(
        mut self,
        resource: Resource,
        urls: I,
        registration: Registration,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.push(RegisteredResource {
            resource,
            urls: urls.into_iter().map(Into::into).collect(),
            registration,
        });
        self
    }

    /// 注册 utoipa 类型及其依赖的全部定义
    pub fn register_schema<T: ToSchema>(mut self) -> Result<Self> {
        for (name, schema) in definitions_of::<T>()? {
            self.schemas.insert(name, schema);
        }
        Ok(self)
    }

    /// 注册一个原样输出的定义
    pub fn schema<S: Into<String>>(mut self, name: S, schema: Value) -> Self {
        self.schemas.insert(name.into(), crate::schema::to_swagger_schema(schema));
        self
    }

    pub fn authorization<S: Into<String>>(mut self, name: S, scheme: SecurityScheme) -> Self {
        self.authorizations.insert(name.into(), scheme);
        self
    }

    pub fn errorhandler(mut self, handler: ErrorHandler) -> Self {
        self.error_handlers.insert(handler.kind.clone(), handler);
        self
    }

    /// 资源绑定的完整 URL
    pub fn urls<'a>(
        &self,
        registered: &'a RegisteredResource,
    ) -> impl Iterator<Item = String> + 'a {
        let prefix = self.prefix();
        registered
            .urls
            .iter()
            .map(move |url| format!("{prefix}{url}"))
    }
}
