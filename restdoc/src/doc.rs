//! 注解文档
//!
//! 资源和处理函数上的文档片段通过构建器声明。每次声明都返回新的合并结果，
//! 不修改已有文档；同一字段重复声明时后者覆盖前者，`expect` 按声明顺序累积。

use http::Method;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::merge::{Merge, merge_option, replace, replace_list};
use crate::param::{DeclaredKey, Expect, Param};
use crate::response::{Header, ResponseCode, ResponseSpec};
use crate::security::Security;

static RE_RAISES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*:raises\s+(?P<name>[\w\d_]+)\s*:\s*(?P<description>.*)$")
        .expect("raises pattern is valid")
});

/// 注解：显式隐藏，或一份文档
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation<T> {
    Hidden,
    Doc(T),
}

impl<T> Annotation<T> {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Annotation::Hidden)
    }

    pub fn as_doc(&self) -> Option<&T> {
        match self {
            Annotation::Doc(doc) => Some(doc),
            Annotation::Hidden => None,
        }
    }
}

impl<T: Default> Default for Annotation<T> {
    fn default() -> Self {
        Annotation::Doc(T::default())
    }
}

impl<T: Merge> Merge for Annotation<T> {
    fn merge(&self, overlay: &Self) -> Self {
        match (self, overlay) {
            (Annotation::Doc(base), Annotation::Doc(overlay)) => {
                Annotation::Doc(base.merge(overlay))
            }
            _ => Annotation::Hidden,
        }
    }
}

impl Annotation<Doc> {
    /// 累积一份新的声明，`expect` 拼接而非替换
    pub fn accumulate(&self, overlay: &Self) -> Self {
        match (self, overlay) {
            (Annotation::Doc(base), Annotation::Doc(overlay)) => {
                Annotation::Doc(base.accumulate(overlay))
            }
            _ => Annotation::Hidden,
        }
    }
}

impl From<Doc> for Annotation<Doc> {
    fn from(doc: Doc) -> Self {
        Annotation::Doc(doc)
    }
}

/// 资源或方法上的注解文档
///
/// `methods` 只在资源级文档中使用，保存针对单个 HTTP 方法的子文档。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Doc {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub params: IndexMap<DeclaredKey, Param>,
    pub expect: Vec<Expect>,
    pub responses: IndexMap<String, ResponseSpec>,
    pub headers: IndexMap<String, Header>,
    pub security: Option<Security>,
    pub deprecated: Option<bool>,
    pub vendor: IndexMap<String, Value>,
    pub produces: Option<Vec<String>>,
    pub docstring: Option<String>,
    pub methods: IndexMap<Method, Annotation<Doc>>,
}

impl Doc {
    pub fn new() -> Self {
        Self::default()
    }

    /// 显式的 operationId
    pub fn id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn summary<S: Into<String>>(mut self, summary: S) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 声明参数，同名同位置的参数逐字段合并
    pub fn param(mut self, param: Param) -> Self {
        declare_param(&mut self.params, param.declared_key(), &param);
        self
    }

    pub fn expect(mut self, expect: Expect) -> Self {
        self.expect.push(expect);
        self
    }

    pub fn response<C, R>(mut self, code: C, response: R) -> Self
    where
        C: Into<ResponseCode>,
        R: Into<ResponseSpec>,
    {
        self.responses
            .insert(code.into().into_inner(), response.into());
        self
    }

    pub fn header<S: Into<String>, H: Into<Header>>(mut self, name: S, header: H) -> Self {
        self.headers.insert(name.into(), header.into());
        self
    }

    pub fn security<S: Into<Security>>(mut self, security: S) -> Self {
        self.security = Some(security.into());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = Some(true);
        self
    }

    /// 厂商扩展字段，缺少 `x-` 前缀时输出时补上
    pub fn vendor<S: Into<String>>(mut self, key: S, value: Value) -> Self {
        self.vendor.insert(key.into(), value);
        self
    }

    pub fn produces<I, S>(mut self, mimetypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces = Some(mimetypes.into_iter().map(Into::into).collect());
        self
    }

    /// 处理函数的文档字符串
    pub fn docstring<S: Into<String>>(mut self, docstring: S) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    /// 针对单个 HTTP 方法的子文档
    pub fn method<A: Into<Annotation<Doc>>>(mut self, method: Method, doc: A) -> Self {
        let doc = doc.into();
        let merged = match self.methods.get(&method) {
            Some(existing) => existing.accumulate(&doc),
            None => doc,
        };
        self.methods.insert(method, merged);
        self
    }

    /// 在规范中隐藏某个方法
    pub fn hide_method(self, method: Method) -> Self {
        self.method(method, Annotation::Hidden)
    }

    /// 合并并拼接 `expect`，方法子文档同样累积
    pub fn accumulate(&self, overlay: &Doc) -> Doc {
        let mut merged = self.merge(overlay);
        merged.expect = self
            .expect
            .iter()
            .chain(overlay.expect.iter())
            .cloned()
            .collect();
        for (method, doc) in &overlay.methods {
            if let Some(existing) = self.methods.get(method) {
                merged
                    .methods
                    .insert(method.clone(), existing.accumulate(doc));
            }
        }
        merged
    }
}

/// 声明一个参数
///
/// 同名但位置不同的声明在解析位置后可能指向同一个参数，此时重复声明的条目
/// 移到末尾，解析时按最后一次声明覆盖。
fn declare_param(params: &mut IndexMap<DeclaredKey, Param>, key: DeclaredKey, param: &Param) {
    let has_sibling = params
        .keys()
        .any(|(name, location)| *name == key.0 && *location != key.1);
    let existing = if has_sibling {
        params.shift_remove(&key)
    } else {
        params.get(&key).cloned()
    };
    let merged = match existing {
        Some(existing) => existing.merge(param),
        None => param.clone(),
    };
    params.insert(key, merged);
}

fn merge_params(
    base: &IndexMap<DeclaredKey, Param>,
    overlay: &IndexMap<DeclaredKey, Param>,
) -> IndexMap<DeclaredKey, Param> {
    let mut params = base.clone();
    for (key, param) in overlay {
        declare_param(&mut params, key.clone(), param);
    }
    params
}

impl Merge for Doc {
    fn merge(&self, overlay: &Self) -> Self {
        Self {
            id: replace(&self.id, &overlay.id),
            summary: replace(&self.summary, &overlay.summary),
            description: replace(&self.description, &overlay.description),
            params: merge_params(&self.params, &overlay.params),
            expect: replace_list(&self.expect, &overlay.expect),
            responses: self.responses.merge(&overlay.responses),
            headers: self.headers.merge(&overlay.headers),
            security: merge_option(&self.security, &overlay.security),
            deprecated: replace(&self.deprecated, &overlay.deprecated),
            vendor: self.vendor.merge(&overlay.vendor),
            produces: replace(&self.produces, &overlay.produces),
            docstring: replace(&self.docstring, &overlay.docstring),
            methods: self.methods.merge(&overlay.methods),
        }
    }
}

/// 解析后的文档字符串
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Docstring {
    pub summary: Option<String>,
    pub details: Option<String>,
    pub raises: IndexMap<String, String>,
}

impl Docstring {
    /// 首行的第一句作为摘要，其余内容（去掉 `:raises` 行）作为详情
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };

        let first_line = raw.lines().next().unwrap_or_default();
        let summary = first_line.split('.').next().unwrap_or_default().trim();

        let mut raises = IndexMap::new();
        for captures in RE_RAISES.captures_iter(raw) {
            raises.insert(
                captures["name"].to_string(),
                captures["description"].trim().to_string(),
            );
        }

        let rest = raw.replacen(summary, "", 1);
        let rest = RE_RAISES.replace_all(&rest, "");
        let details = rest
            .trim_start_matches(['.', ' ', '\n', '\r'])
            .trim()
            .to_string();

        Self {
            summary: (!summary.is_empty()).then(|| summary.to_string()),
            details: (!details.is_empty()).then_some(details),
            raises,
        }
    }
}
