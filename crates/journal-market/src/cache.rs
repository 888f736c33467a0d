//! 읽기 시점 TTL 검사 인메모리 캐시.
//!
//! 항목은 성공적인 조회 시에만 기록되며, 만료는 읽기 시점의 나이 비교로만
//! 판정합니다 (별도 퇴출 스레드 없음). 락은 단일 키의 읽기/쓰기 구간에만
//! 잡습니다.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::RwLock;

/// 캐시 항목: 값과 조회 시각.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// TTL 기반 키-값 캐시.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// 주어진 TTL(초)로 캐시를 생성합니다. TTL 0은 캐시 비활성화와 같습니다.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// 키의 유효한(만료되지 않은) 값을 반환합니다.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        let age = Utc::now().signed_duration_since(entry.fetched_at);
        if age < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    /// 성공한 조회 결과를 기록합니다. 기존 항목은 교체됩니다.
    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Utc::now(),
            },
        );
    }

    /// 현재 보관 중인 항목 수 (만료 여부 무관).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 캐시가 비어 있는지 확인합니다.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
