//! 동기 벤더 클라이언트용 유한 워커 풀 브리지.
//!
//! 동기 클라이언트 호출을 `tokio::task::spawn_blocking`으로 분리된 스레드
//! 풀에서 실행하고, 세마포어로 동시 호출 수를 제한합니다. 느린 벤더 호출이
//! 이벤트 루프나 호스트 애플리케이션을 막지 않습니다.

use crate::client::MarketDataClient;
use crate::error::MarketDataError;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

/// 유한 워커 풀을 통한 동기 클라이언트 브리지.
pub struct BlockingBridge {
    client: Arc<dyn MarketDataClient>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl std::fmt::Debug for BlockingBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingBridge")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl BlockingBridge {
    /// 새 브리지를 생성합니다.
    ///
    /// `workers`가 0이면 설정 오류입니다.
    pub fn new(
        client: Arc<dyn MarketDataClient>,
        workers: usize,
        timeout: Duration,
    ) -> Result<Self, MarketDataError> {
        if workers == 0 {
            return Err(MarketDataError::ConfigError(
                "vendor_workers must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(workers)),
            timeout,
        })
    }

    /// 최근 체결가를 비동기로 조회합니다.
    pub async fn last_price(&self, vendor_symbol: &str) -> Result<Decimal, MarketDataError> {
        self.dispatch(vendor_symbol, |client, symbol| client.last_price(symbol))
            .await
    }

    /// 가장 최근 과거 종가를 비동기로 조회합니다.
    pub async fn recent_close(&self, vendor_symbol: &str) -> Result<Decimal, MarketDataError> {
        self.dispatch(vendor_symbol, |client, symbol| client.recent_close(symbol))
            .await
    }

    /// 워커 풀 슬롯을 확보한 뒤 blocking 호출을 실행합니다.
    async fn dispatch<F>(&self, vendor_symbol: &str, op: F) -> Result<Decimal, MarketDataError>
    where
        F: FnOnce(&dyn MarketDataClient, &str) -> Result<Decimal, MarketDataError>
            + Send
            + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MarketDataError::source_error("vendor", "worker pool closed"))?;

        debug!(symbol = %vendor_symbol, "벤더 호출 디스패치");

        let client = Arc::clone(&self.client);
        let symbol = vendor_symbol.to_string();
        let task = tokio::task::spawn_blocking(move || op(client.as_ref(), &symbol));

        match tokio::time::timeout(self.timeout, task).await {
            Err(_) => Err(MarketDataError::Timeout(format!(
                "vendor call for {} exceeded {}s",
                vendor_symbol,
                self.timeout.as_secs()
            ))),
            Ok(Err(join_err)) => Err(MarketDataError::source_error("vendor", join_err.to_string())),
            Ok(Ok(result)) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StubClient {
        price: Decimal,
        delay: Duration,
        calls: AtomicU32,
    }

    impl MarketDataClient for StubClient {
        fn last_price(&self, _vendor_symbol: &str) -> Result<Decimal, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            Ok(self.price)
        }

        fn recent_close(&self, vendor_symbol: &str) -> Result<Decimal, MarketDataError> {
            Err(MarketDataError::NotFound(vendor_symbol.to_string()))
        }
    }

    #[tokio::test]
    async fn test_dispatch_returns_client_result() {
        let client = Arc::new(StubClient {
            price: dec!(101.5),
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        });
        let bridge =
            BlockingBridge::new(client.clone(), 2, Duration::from_secs(5)).unwrap();

        let price = bridge.last_price("AAPL").await.unwrap();
        assert_eq!(price, dec!(101.5));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);

        let err = bridge.recent_close("AAPL").await.unwrap_err();
        assert!(matches!(err, MarketDataError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_typed_error() {
        let client = Arc::new(StubClient {
            price: dec!(1),
            delay: Duration::from_millis(200),
            calls: AtomicU32::new(0),
        });
        let bridge =
            BlockingBridge::new(client, 1, Duration::from_millis(20)).unwrap();

        let err = bridge.last_price("SLOW").await.unwrap_err();
        assert!(matches!(err, MarketDataError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_zero_workers_rejected() {
        let client = Arc::new(StubClient {
            price: dec!(1),
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        });
        let err = BlockingBridge::new(client, 0, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, MarketDataError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        // 워커 1개 + 호출당 50ms면 두 호출은 순차 실행되어 최소 100ms 소요
        let client = Arc::new(StubClient {
            price: dec!(1),
            delay: Duration::from_millis(50),
            calls: AtomicU32::new(0),
        });
        let bridge = Arc::new(
            BlockingBridge::new(client, 1, Duration::from_secs(5)).unwrap(),
        );

        let started = std::time::Instant::now();
        let first = {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move { bridge.last_price("A").await })
        };
        let second = {
            let bridge = Arc::clone(&bridge);
            tokio::spawn(async move { bridge.last_price("B").await })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(100));
    }
}
