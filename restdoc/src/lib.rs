//! # restdoc
//!
//! 把资源上的声明式注解编译为 Swagger 2.0 文档。
//!
//! ## 主要特性
//!
//! - 命名空间、资源、方法三级注解的覆盖式合并
//! - 路由占位符到 `{name}` 模板的转换和路径参数提取
//! - 方法间参数分歧时的共享参数下推
//! - 响应声明、文档字符串 `:raises` 与共享错误响应
//! - 基于 utoipa 的 schema 定义
//!
//! ## 快速开始
//!
//! ```rust
//! use restdoc::{Api, Doc, Namespace, Resource};
//!
//! let pets = Namespace::new("pets").description("Pet operations").add_resource(
//!     Resource::new("Pet")
//!         .get(Doc::new().docstring("Fetch a pet"))
//!         .delete(Doc::new().response(204, "Deleted")),
//!     ["/<int:id>"],
//! );
//!
//! let swagger = Api::new("Pet Store", "1.0").namespace(pets).compile().unwrap();
//! assert!(swagger.paths.contains_key("/pets/{id}"));
//! ```

pub mod aggregate;
pub mod api;
pub mod doc;
pub use restdoc_macros::endpoint;
pub mod error;
mod loader;
pub mod merge;
pub mod operation;
pub mod param;
pub mod path;
pub mod resource;
pub mod response;
pub mod schema;
pub mod security;
pub mod swagger;
pub mod tag;

// 重新导出核心类型
pub use api::{Api, ApiConfig};
pub use doc::{Annotation, Doc, Docstring};
pub use error::{RestDocError, Result};
pub use merge::{Merge, merge};
pub use operation::{camel_to_dash, default_id};
pub use param::{ArgLocation, Expect, Location, Param, ParamType};
pub use path::{Converters, extract_path_params, to_spec_path};
pub use resource::{Namespace, Registration, Resource};
pub use response::{ErrorHandler, Header, ResponseCode, ResponseOptions, ResponseSpec};
pub use schema::SchemaRef;
pub use security::{ApiKeyLocation, OAuth2Flow, Security, SecurityScheme};
pub use swagger::Swagger;
pub use tag::{Tag, TagSpec};

// 重新导出utoipa的schema派生，方便用户使用
pub use utoipa::ToSchema;

/// restdoc 的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
