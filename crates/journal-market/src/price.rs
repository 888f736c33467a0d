//! 종목 가격 제공자 - 캐시 + 단일 벤더 소스.
//!
//! 환율 제공자와 같은 "캐시 확인 → 조회 → 성공 시 캐시" 구조이지만
//! 폴백 체인 없이 단일 벤더만 사용합니다. 벤더 내부에서는 실시간 체결가
//! 실패 시 가장 최근 과거 종가로 한 번 더 시도합니다.

use crate::bridge::BlockingBridge;
use crate::cache::TtlCache;
use crate::error::MarketDataError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use journal_core::MarketConfig;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 가격 조회 결과.
#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    /// 정규화된(대문자) 종목 심볼
    pub symbol: String,
    /// 현재 가격
    pub price: Decimal,
    /// 조회 시각
    pub fetched_at: DateTime<Utc>,
}

/// 가격 조회 인터페이스.
///
/// 포지션 모니터는 이 trait에만 의존합니다.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// 종목의 현재 가격을 조회합니다.
    async fn get_price(&self, symbol: &str) -> Result<PriceQuote, MarketDataError>;
}

/// 캐시된 벤더 가격 제공자.
pub struct PriceProvider {
    bridge: Arc<BlockingBridge>,
    aliases: HashMap<String, String>,
    cache: TtlCache<String, PriceQuote>,
}

impl PriceProvider {
    /// 새 가격 제공자를 생성합니다.
    pub fn new(
        bridge: Arc<BlockingBridge>,
        aliases: HashMap<String, String>,
        ttl_secs: u64,
    ) -> Self {
        let aliases = aliases
            .into_iter()
            .map(|(symbol, vendor)| (symbol.to_uppercase(), vendor))
            .collect();

        Self {
            bridge,
            aliases,
            cache: TtlCache::new(ttl_secs),
        }
    }

    /// 설정으로부터 제공자를 생성합니다. 브리지는 환율 제공자와 공유합니다.
    pub fn from_config(config: &MarketConfig, bridge: Arc<BlockingBridge>) -> Self {
        Self::new(
            bridge,
            config.vendor_aliases.clone(),
            config.price_cache_ttl_secs,
        )
    }

    /// 정규 심볼을 벤더 심볼로 변환합니다. 별칭이 없으면 심볼 그대로 사용.
    fn vendor_symbol(&self, symbol: &str) -> String {
        self.aliases
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| symbol.to_string())
    }
}

#[async_trait]
impl PriceSource for PriceProvider {
    async fn get_price(&self, symbol: &str) -> Result<PriceQuote, MarketDataError> {
        let key = symbol.trim().to_uppercase();

        if let Some(quote) = self.cache.get(&key).await {
            debug!(symbol = %key, price = %quote.price, "가격 캐시 적중");
            return Ok(quote);
        }

        let vendor = self.vendor_symbol(&key);

        let price = match self.bridge.last_price(&vendor).await {
            Ok(price) => price,
            Err(last_err) => {
                warn!(
                    symbol = %key,
                    vendor = %vendor,
                    error = %last_err,
                    "실시간 가격 조회 실패, 최근 종가로 폴백"
                );
                self.bridge.recent_close(&vendor).await.map_err(|close_err| {
                    MarketDataError::NotFound(format!(
                        "price unavailable for {} (last: {}; close: {})",
                        key, last_err, close_err
                    ))
                })?
            }
        };

        let quote = PriceQuote {
            symbol: key.clone(),
            price,
            fetched_at: Utc::now(),
        };
        self.cache.insert(key, quote.clone()).await;
        debug!(symbol = %quote.symbol, price = %quote.price, "가격 조회 성공");

        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MarketDataClient;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct MockVendor {
        last: HashMap<String, Decimal>,
        close: HashMap<String, Decimal>,
        last_calls: Arc<AtomicU32>,
        close_calls: Arc<AtomicU32>,
    }

    impl MarketDataClient for MockVendor {
        fn last_price(&self, vendor_symbol: &str) -> Result<Decimal, MarketDataError> {
            self.last_calls.fetch_add(1, Ordering::SeqCst);
            self.last
                .get(vendor_symbol)
                .copied()
                .ok_or_else(|| MarketDataError::NotFound(vendor_symbol.to_string()))
        }

        fn recent_close(&self, vendor_symbol: &str) -> Result<Decimal, MarketDataError> {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
            self.close
                .get(vendor_symbol)
                .copied()
                .ok_or_else(|| MarketDataError::NotFound(vendor_symbol.to_string()))
        }
    }

    struct Counters {
        last: Arc<AtomicU32>,
        close: Arc<AtomicU32>,
    }

    fn provider(
        last: HashMap<String, Decimal>,
        close: HashMap<String, Decimal>,
        aliases: HashMap<String, String>,
        ttl_secs: u64,
    ) -> (PriceProvider, Counters) {
        let counters = Counters {
            last: Arc::new(AtomicU32::new(0)),
            close: Arc::new(AtomicU32::new(0)),
        };
        let client = Arc::new(MockVendor {
            last,
            close,
            last_calls: Arc::clone(&counters.last),
            close_calls: Arc::clone(&counters.close),
        });
        let bridge = Arc::new(BlockingBridge::new(client, 2, Duration::from_secs(2)).unwrap());
        (PriceProvider::new(bridge, aliases, ttl_secs), counters)
    }

    #[tokio::test]
    async fn test_last_price_cached_within_ttl() {
        let mut last = HashMap::new();
        last.insert("BTCUSD".to_string(), dec!(64250.5));
        let (provider, counters) = provider(last, HashMap::new(), HashMap::new(), 60);

        let quote = provider.get_price("btcusd").await.unwrap();
        assert_eq!(quote.symbol, "BTCUSD");
        assert_eq!(quote.price, dec!(64250.5));

        // 캐시 적중 - 벤더 호출 1회 유지
        provider.get_price("BTCUSD").await.unwrap();
        assert_eq!(counters.last.load(Ordering::SeqCst), 1);
        assert_eq!(counters.close.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_alias_translation() {
        let mut last = HashMap::new();
        last.insert("^GDAXI".to_string(), dec!(18123));
        let mut aliases = HashMap::new();
        aliases.insert("dax".to_string(), "^GDAXI".to_string());

        let (provider, _counters) = provider(last, HashMap::new(), aliases, 60);

        let quote = provider.get_price("DAX").await.unwrap();
        // 결과 심볼은 벤더 심볼이 아닌 정규 심볼
        assert_eq!(quote.symbol, "DAX");
        assert_eq!(quote.price, dec!(18123));
    }

    #[tokio::test]
    async fn test_falls_back_to_recent_close() {
        let mut close = HashMap::new();
        close.insert("AAPL".to_string(), dec!(227.3));
        let (provider, counters) = provider(HashMap::new(), close, HashMap::new(), 60);

        let quote = provider.get_price("AAPL").await.unwrap();
        assert_eq!(quote.price, dec!(227.3));
        assert_eq!(counters.last.load(Ordering::SeqCst), 1);
        assert_eq!(counters.close.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_both_sources_failing_yields_not_found() {
        let (provider, _counters) =
            provider(HashMap::new(), HashMap::new(), HashMap::new(), 60);

        let err = provider.get_price("GHOST").await.unwrap_err();
        assert!(matches!(err, MarketDataError::NotFound(_)));
        assert!(err.to_string().contains("GHOST"));
        // 실패는 캐시되지 않음
        assert!(provider.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_zero_ttl_refetches() {
        let mut last = HashMap::new();
        last.insert("AAPL".to_string(), dec!(227));
        let (provider, counters) = provider(last, HashMap::new(), HashMap::new(), 0);

        provider.get_price("AAPL").await.unwrap();
        provider.get_price("AAPL").await.unwrap();
        assert_eq!(counters.last.load(Ordering::SeqCst), 2);
    }
}
