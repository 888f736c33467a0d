//! 환율 제공자 - 캐시 + 4단계 폴백 체인.
//!
//! 조회 순서:
//! 1. 동기 벤더 클라이언트 (통화쌍을 rate-as-price 심볼로 변환)
//! 2. 1차 HTTP 환율 엔드포인트
//! 3. 2차 HTTP 환율 엔드포인트 (1차와 동일 계약, 독립 운영)
//! 4. 정적 폴백 테이블 (직접 조회 + 역방향 페어의 역수)
//!
//! 각 tier의 실패는 로그 후 다음 tier로 진행하며, 4단계 모두 소진된 경우에만
//! typed Failure를 반환합니다. 성공한 결과만 캐시됩니다.

use crate::bridge::BlockingBridge;
use crate::cache::TtlCache;
use crate::client::pair_symbol;
use crate::error::MarketDataError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use journal_core::MarketConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 환율 출처 tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTier {
    /// 동일 통화 (항상 1.0, 네트워크 없음)
    SameCurrency,
    /// 동기 벤더 클라이언트
    Vendor,
    /// 1차 HTTP 엔드포인트
    PrimaryHttp,
    /// 2차 HTTP 엔드포인트
    SecondaryHttp,
    /// 정적 폴백 테이블
    StaticTable,
}

impl std::fmt::Display for RateTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateTier::SameCurrency => write!(f, "same_currency"),
            RateTier::Vendor => write!(f, "vendor"),
            RateTier::PrimaryHttp => write!(f, "primary_http"),
            RateTier::SecondaryHttp => write!(f, "secondary_http"),
            RateTier::StaticTable => write!(f, "static_table"),
        }
    }
}

/// 환율 조회 결과.
#[derive(Debug, Clone, Serialize)]
pub struct RateQuote {
    /// 환율 (from 1단위당 to 금액)
    pub rate: Decimal,
    /// 환율을 제공한 tier
    pub source: RateTier,
    /// 정적 테이블 폴백 여부 (HTTP tier는 정식 출처로 취급)
    pub is_fallback: bool,
    /// 조회 시각
    pub fetched_at: DateTime<Utc>,
}

/// 환율 조회 인터페이스.
///
/// 손익 엔진은 이 trait에만 의존합니다.
#[async_trait]
pub trait ExchangeRates: Send + Sync {
    /// 통화쌍의 환율을 조회합니다.
    async fn get_rate(&self, from: &str, to: &str) -> Result<RateQuote, MarketDataError>;
}

/// `GET {url}/{BASE}` → `{"rates": {통화: 환율}}` 계약의 HTTP 환율 소스.
struct HttpRateSource {
    name: &'static str,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RateMapResponse {
    rates: HashMap<String, f64>,
}

impl HttpRateSource {
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Decimal, MarketDataError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), from);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::source_error(
                self.name,
                format!("HTTP {}", status),
            ));
        }

        let body: RateMapResponse = response.json().await?;
        let raw = body.rates.get(to).copied().ok_or_else(|| {
            MarketDataError::NotFound(format!("{}: no rate for {}", self.name, to))
        })?;

        Decimal::from_f64_retain(raw)
            .filter(|rate| rate.is_sign_positive() && !rate.is_zero())
            .ok_or_else(|| {
                MarketDataError::ParseError(format!(
                    "{}: invalid rate {} for {}",
                    self.name, raw, to
                ))
            })
    }
}

/// 캐시되고 폴백 체인을 갖춘 환율 제공자.
pub struct ExchangeRateProvider {
    bridge: Arc<BlockingBridge>,
    primary: HttpRateSource,
    secondary: HttpRateSource,
    fallback_rates: HashMap<String, Decimal>,
    cache: TtlCache<String, RateQuote>,
}

impl std::fmt::Debug for ExchangeRateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeRateProvider")
            .field("bridge", &self.bridge)
            .field("fallback_rates", &self.fallback_rates)
            .finish_non_exhaustive()
    }
}

impl ExchangeRateProvider {
    /// 새 제공자를 생성합니다.
    ///
    /// 엔드포인트 URL이 비어 있으면 설정 오류로 실패합니다.
    pub fn new(
        bridge: Arc<BlockingBridge>,
        primary_url: impl Into<String>,
        secondary_url: impl Into<String>,
        fallback_rates: HashMap<String, Decimal>,
        ttl_secs: u64,
        request_timeout: Duration,
    ) -> Result<Self, MarketDataError> {
        let primary_url = primary_url.into();
        let secondary_url = secondary_url.into();

        if primary_url.trim().is_empty() || secondary_url.trim().is_empty() {
            return Err(MarketDataError::ConfigError(
                "rate endpoint URL must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| MarketDataError::ConfigError(e.to_string()))?;

        let fallback_rates = fallback_rates
            .into_iter()
            .map(|(pair, rate)| (pair.to_uppercase(), rate))
            .collect();

        Ok(Self {
            bridge,
            primary: HttpRateSource {
                name: "primary_http",
                base_url: primary_url,
                client: client.clone(),
            },
            secondary: HttpRateSource {
                name: "secondary_http",
                base_url: secondary_url,
                client,
            },
            fallback_rates,
            cache: TtlCache::new(ttl_secs),
        })
    }

    /// 설정으로부터 제공자를 생성합니다. 브리지는 가격 제공자와 공유합니다.
    pub fn from_config(
        config: &MarketConfig,
        bridge: Arc<BlockingBridge>,
    ) -> Result<Self, MarketDataError> {
        Self::new(
            bridge,
            &config.primary_rate_url,
            &config.secondary_rate_url,
            config.fallback_rates.clone(),
            config.rate_cache_ttl_secs,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn pair_key(from: &str, to: &str) -> String {
        format!("{}{}", from, to)
    }

    /// 정적 테이블 조회: 직접 키, 그다음 역방향 페어의 역수.
    fn table_rate(&self, from: &str, to: &str) -> Result<Decimal, MarketDataError> {
        if let Some(rate) = self.fallback_rates.get(&Self::pair_key(from, to)) {
            return Ok(*rate);
        }

        if let Some(inverse) = self.fallback_rates.get(&Self::pair_key(to, from)) {
            if !inverse.is_zero() {
                return Ok(Decimal::ONE / *inverse);
            }
        }

        Err(MarketDataError::NotFound(format!(
            "no static rate for {}/{}",
            from, to
        )))
    }

    async fn cache_and_return(
        &self,
        key: String,
        rate: Decimal,
        source: RateTier,
    ) -> Result<RateQuote, MarketDataError> {
        let quote = RateQuote {
            rate,
            source,
            is_fallback: matches!(source, RateTier::StaticTable),
            fetched_at: Utc::now(),
        };
        self.cache.insert(key, quote.clone()).await;
        Ok(quote)
    }
}

#[async_trait]
impl ExchangeRates for ExchangeRateProvider {
    async fn get_rate(&self, from: &str, to: &str) -> Result<RateQuote, MarketDataError> {
        let from = from.trim().to_uppercase();
        let to = to.trim().to_uppercase();

        // 동일 통화는 캐시도 네트워크도 건드리지 않음
        if from == to {
            return Ok(RateQuote {
                rate: Decimal::ONE,
                source: RateTier::SameCurrency,
                is_fallback: false,
                fetched_at: Utc::now(),
            });
        }

        let key = Self::pair_key(&from, &to);
        if let Some(quote) = self.cache.get(&key).await {
            debug!(pair = %key, rate = %quote.rate, "환율 캐시 적중");
            return Ok(quote);
        }

        // Tier 1: 벤더 클라이언트 (통화쌍을 가격처럼 조회)
        match self.bridge.last_price(&pair_symbol(&from, &to)).await {
            Ok(rate) => {
                info!(pair = %key, %rate, tier = %RateTier::Vendor, "환율 조회 성공");
                return self.cache_and_return(key, rate, RateTier::Vendor).await;
            }
            Err(e) => warn!(pair = %key, error = %e, "벤더 환율 조회 실패, 다음 tier 진행"),
        }

        // Tier 2-3: 독립 HTTP 엔드포인트 두 곳
        for (source, tier) in [
            (&self.primary, RateTier::PrimaryHttp),
            (&self.secondary, RateTier::SecondaryHttp),
        ] {
            match source.fetch_rate(&from, &to).await {
                Ok(rate) => {
                    info!(pair = %key, %rate, tier = %tier, "환율 조회 성공");
                    return self.cache_and_return(key, rate, tier).await;
                }
                Err(e) => {
                    warn!(pair = %key, source = source.name, error = %e, "HTTP 환율 조회 실패, 다음 tier 진행")
                }
            }
        }

        // Tier 4: 정적 폴백 테이블
        match self.table_rate(&from, &to) {
            Ok(rate) => {
                warn!(pair = %key, %rate, "모든 네트워크 tier 실패, 정적 폴백 환율 사용");
                return self.cache_and_return(key, rate, RateTier::StaticTable).await;
            }
            Err(e) => debug!(pair = %key, error = %e, "정적 테이블 항목 없음"),
        }

        Err(MarketDataError::NotFound(format!(
            "exchange rate unavailable for {}/{}",
            from, to
        )))
    }
}
