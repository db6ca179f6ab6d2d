//! 内存存储
//!
//! 使用 DashMap 实现的并发内存存储，承载参考后端的模板、持有券和订单。

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

/// 通用内存存储
///
/// 克隆只复制 `Arc`，多个处理器共享同一份数据。
#[derive(Debug)]
pub struct MemoryStore<T> {
    data: Arc<DashMap<String, T>>,
}

impl<T: Clone> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    /// 插入或覆盖
    pub fn insert(&self, id: &str, value: T) {
        self.data.insert(id.to_string(), value);
    }

    /// 仅在 key 不存在时插入，返回是否插入成功
    ///
    /// 检查与写入在同一分片锁内完成，并发插入同一 key 只有一个成功。
    pub fn insert_if_absent(&self, id: &str, value: T) -> bool {
        match self.data.entry(id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }

    /// 获取数据的克隆，不持有锁
    pub fn get(&self, id: &str) -> Option<T> {
        self.data.get(id).map(|v| v.clone())
    }

    /// 在分片锁内原地修改
    ///
    /// 闭包执行期间同一 key 的其它读写会等待，适合“检查后扣减”这类操作。
    /// key 不存在时返回 None。
    pub fn update<F, R>(&self, id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        self.data.get_mut(id).map(|mut entry| f(entry.value_mut()))
    }

    pub fn list(&self) -> Vec<T> {
        self.data
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// 按条件筛选
    pub fn list_by<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.data
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    /// 批量插入，key 由 `key_fn` 从元素中提取
    pub fn insert_many<I, F>(&self, items: I, key_fn: F)
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> String,
    {
        for item in items {
            let key = key_fn(&item);
            self.data.insert(key, item);
        }
    }
}

impl<T: Clone> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}
