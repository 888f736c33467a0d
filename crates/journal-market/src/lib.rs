//! # Journal Market
//!
//! 시장 데이터 수집 - 환율 및 종목 가격.
//!
//! 이 크레이트는 불안정한 외부 데이터 소스를 감싸는 복원력 있는 계층입니다:
//! - `ExchangeRateProvider` - 캐시 + 4단계 폴백 체인 환율 조회
//! - `PriceProvider` - 캐시 + 단일 벤더 가격 조회
//! - `BlockingBridge` - 동기 벤더 클라이언트용 유한 워커 풀 브리지
//!
//! 모든 제공자 경계는 typed Failure를 반환하며 절대 panic하지 않습니다.

pub mod bridge;
pub mod cache;
pub mod client;
pub mod error;
pub mod price;
pub mod rates;

pub use bridge::BlockingBridge;
pub use cache::TtlCache;
pub use client::{pair_symbol, MarketDataClient};
pub use error::MarketDataError;
pub use price::{PriceProvider, PriceQuote, PriceSource};
pub use rates::{ExchangeRateProvider, ExchangeRates, RateQuote, RateTier};
