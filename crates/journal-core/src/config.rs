//! 설정 관리.
//!
//! 이 모듈은 시장 데이터/손익 엔진의 설정을 정의하고 관리합니다.
//! TOML 파일에서 로드하며 `JOURNAL__` 접두사 환경 변수로 오버라이드할 수 있습니다.

use crate::domain::InstrumentSpec;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 엔진 전체 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// 계좌 기준 통화 코드 (예: "USD")
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// 시장 데이터 설정
    #[serde(default)]
    pub market: MarketConfig,
    /// 포지션 모니터 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 종목별 명세 (네이티브 통화, 포인트 가치)
    #[serde(default)]
    pub instruments: HashMap<String, InstrumentSpec>,
}

fn default_base_currency() -> String {
    "USD".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            market: MarketConfig::default(),
            monitor: MonitorConfig::default(),
            logging: LoggingConfig::default(),
            instruments: HashMap::new(),
        }
    }
}

/// 시장 데이터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketConfig {
    /// 환율 캐시 TTL (초)
    #[serde(default = "default_rate_cache_ttl")]
    pub rate_cache_ttl_secs: u64,
    /// 가격 캐시 TTL (초)
    #[serde(default = "default_price_cache_ttl")]
    pub price_cache_ttl_secs: u64,
    /// 외부 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// 동기 벤더 클라이언트용 워커 풀 크기
    #[serde(default = "default_vendor_workers")]
    pub vendor_workers: usize,
    /// 1차 환율 HTTP 엔드포인트 (GET {url}/{BASE} → rates 맵)
    #[serde(default = "default_primary_rate_url")]
    pub primary_rate_url: String,
    /// 2차 환율 HTTP 엔드포인트 (1차와 동일 계약)
    #[serde(default = "default_secondary_rate_url")]
    pub secondary_rate_url: String,
    /// 정적 폴백 환율 테이블 (페어 키 "EURUSD" → 환율)
    #[serde(default = "default_fallback_rates")]
    pub fallback_rates: HashMap<String, Decimal>,
    /// 종목 심볼 → 벤더 심볼 별칭 테이블
    #[serde(default)]
    pub vendor_aliases: HashMap<String, String>,
}

fn default_rate_cache_ttl() -> u64 {
    300
}
fn default_price_cache_ttl() -> u64 {
    15
}
fn default_request_timeout() -> u64 {
    10
}
fn default_vendor_workers() -> usize {
    4
}
fn default_primary_rate_url() -> String {
    "https://open.er-api.com/v6/latest".to_string()
}
fn default_secondary_rate_url() -> String {
    "https://api.exchangerate-api.com/v4/latest".to_string()
}

/// 주요 통화쌍의 정적 폴백 환율.
///
/// 모든 네트워크 tier가 실패했을 때의 마지막 수단이며, 설정 파일에서
/// 교체하거나 확장할 수 있습니다.
fn default_fallback_rates() -> HashMap<String, Decimal> {
    let mut rates = HashMap::new();
    rates.insert("EURUSD".to_string(), Decimal::new(108, 2));
    rates.insert("GBPUSD".to_string(), Decimal::new(127, 2));
    rates.insert("AUDUSD".to_string(), Decimal::new(66, 2));
    rates.insert("USDJPY".to_string(), Decimal::new(1500, 1));
    rates.insert("USDCHF".to_string(), Decimal::new(88, 2));
    rates.insert("USDCAD".to_string(), Decimal::new(136, 2));
    rates
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            rate_cache_ttl_secs: default_rate_cache_ttl(),
            price_cache_ttl_secs: default_price_cache_ttl(),
            request_timeout_secs: default_request_timeout(),
            vendor_workers: default_vendor_workers(),
            primary_rate_url: default_primary_rate_url(),
            secondary_rate_url: default_secondary_rate_url(),
            fallback_rates: default_fallback_rates(),
            vendor_aliases: HashMap::new(),
        }
    }
}

/// 포지션 모니터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// 모니터 폴링 주기 (초)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    60
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("base_currency", "USD")?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드 (예: JOURNAL__MONITOR__POLL_INTERVAL_SECS)
            .add_source(
                config::Environment::with_prefix("JOURNAL")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.base_currency, "USD");
        assert_eq!(config.market.rate_cache_ttl_secs, 300);
        assert_eq!(config.market.vendor_workers, 4);
        assert_eq!(config.monitor.poll_interval_secs, 60);
        assert!(!config.market.fallback_rates.is_empty());
    }

    #[test]
    fn test_fallback_table_values() {
        let rates = default_fallback_rates();
        assert_eq!(rates.get("EURUSD"), Some(&Decimal::new(108, 2)));
        // 역방향 페어는 테이블에 없음 - 제공자가 역수로 계산
        assert!(!rates.contains_key("USDEUR"));
    }
}
