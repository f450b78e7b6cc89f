//! 注解文档的递归合并
//!
//! 两棵文档树合并时，后者覆盖前者：同名键两侧都是映射则递归合并，
//! 否则整体替换（标量、列表和类型不一致的值都不做合并）。
//! 列表拼接（例如 `expect`）由调用方自行处理。

use std::hash::Hash;

use indexmap::IndexMap;
use serde_json::Value;

/// 合并两个 JSON 文档，返回新的文档，`base` 保持不变。
///
/// 任意一侧不是对象时直接返回 `overlay`。
pub fn merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            let mut result = base.clone();
            for (key, value) in overlay {
                let merged = match result.get(key) {
                    Some(existing @ Value::Object(_)) => merge(existing, value),
                    _ => value.clone(),
                };
                result.insert(key.clone(), merged);
            }
            Value::Object(result)
        }
        _ => overlay.clone(),
    }
}

/// 具备覆盖合并语义的文档片段
pub trait Merge: Clone {
    /// 以 `overlay` 覆盖 `self`，返回合并后的新值
    fn merge(&self, overlay: &Self) -> Self;
}

impl Merge for Value {
    fn merge(&self, overlay: &Self) -> Self {
        merge(self, overlay)
    }
}

impl<K, V> Merge for IndexMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Merge,
{
    fn merge(&self, overlay: &Self) -> Self {
        let mut result = self.clone();
        for (key, value) in overlay {
            let merged = match result.get(key) {
                Some(existing) => existing.merge(value),
                None => value.clone(),
            };
            result.insert(key.clone(), merged);
        }
        result
    }
}

/// 叶子值：overlay 存在时整体替换
pub(crate) fn replace<T: Clone>(base: &Option<T>, overlay: &Option<T>) -> Option<T> {
    overlay.clone().or_else(|| base.clone())
}

/// 两侧都存在时递归合并
pub(crate) fn merge_option<T: Merge>(base: &Option<T>, overlay: &Option<T>) -> Option<T> {
    match (base, overlay) {
        (Some(base), Some(overlay)) => Some(base.merge(overlay)),
        (_, Some(overlay)) => Some(overlay.clone()),
        (base, None) => base.clone(),
    }
}

/// 列表：overlay 非空时整体替换
pub(crate) fn replace_list<T: Clone>(base: &[T], overlay: &[T]) -> Vec<T> {
    if overlay.is_empty() {
        base.to_vec()
    } else {
        overlay.to_vec()
    }
}
