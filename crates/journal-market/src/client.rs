//! 외부 시장 데이터 클라이언트 인터페이스.
//!
//! 호스트 애플리케이션이 구체 클라이언트를 주입합니다. 클라이언트는
//! *동기* 호출 계약을 가지므로 반드시 [`crate::BlockingBridge`]를 통해
//! 비동기 루프에서 호출해야 합니다.

use crate::error::MarketDataError;
use rust_decimal::Decimal;

/// 동기 시장 데이터 벤더 클라이언트.
///
/// 구현체는 벤더 심볼 형식의 심볼을 받습니다
/// (별칭 변환은 제공자 계층의 책임입니다).
pub trait MarketDataClient: Send + Sync {
    /// 최근 체결가를 조회합니다.
    fn last_price(&self, vendor_symbol: &str) -> Result<Decimal, MarketDataError>;

    /// 가장 최근 과거 종가를 조회합니다.
    ///
    /// 실시간 체결가가 없는 종목(장 마감, 저유동성)의 폴백입니다.
    fn recent_close(&self, vendor_symbol: &str) -> Result<Decimal, MarketDataError>;
}

/// 통화쌍을 벤더의 rate-as-price 심볼로 변환합니다.
///
/// 예: ("EUR", "USD") → "EURUSD=X"
pub fn pair_symbol(from: &str, to: &str) -> String {
    format!("{}{}=X", from.to_uppercase(), to.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_symbol() {
        assert_eq!(pair_symbol("EUR", "USD"), "EURUSD=X");
        assert_eq!(pair_symbol("usd", "jpy"), "USDJPY=X");
    }
}
