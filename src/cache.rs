//! 查询结果缓存。
//!
//! 默认提供进程内 TTL 缓存；写操作不会主动失效缓存条目，
//! 缓存期内可能读到旧数据，由调用方权衡过期时间。

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::gateway::Record;

/// 缓存存储契约。`ttl` 单位秒，`-1` 表示永不过期。
pub trait CacheStorage {
    fn get(&mut self, key: &str) -> Option<Vec<Record>>;

    fn set(&mut self, key: &str, value: Vec<Record>, ttl: i64);
}

/// 进程内 TTL 缓存。
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<String, (Vec<Record>, Option<Instant>)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl CacheStorage for MemoryCache {
    fn get(&mut self, key: &str) -> Option<Vec<Record>> {
        match self.entries.get(key) {
            Some((_, Some(deadline))) if Instant::now() >= *deadline => {
                self.entries.remove(key);
                None
            }
            Some((rows, _)) => Some(rows.clone()),
            None => None,
        }
    }

    fn set(&mut self, key: &str, value: Vec<Record>, ttl: i64) {
        let deadline = if ttl < 0 {
            None
        } else {
            Some(Instant::now() + Duration::from_secs(ttl as u64))
        };
        self.entries.insert(key.to_string(), (value, deadline));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{CacheStorage, MemoryCache};
    use crate::record;

    #[test]
    fn set_get_roundtrip() {
        let mut cache = MemoryCache::new();
        let rows = vec![record! {"id" => 1}];
        cache.set("k", rows.clone(), 3600);
        assert_eq!(cache.get("k"), Some(rows));
    }

    #[test]
    fn expired_entry_is_removed() {
        let mut cache = MemoryCache::new();
        cache.set("k", vec![record! {"id" => 1}], 0);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn permanent_entry_survives() {
        let mut cache = MemoryCache::new();
        cache.set("k", Vec::new(), -1);
        assert_eq!(cache.get("k"), Some(Vec::new()));
    }
}
