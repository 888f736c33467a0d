//! 손익 계산 엔진.
//!
//! 모든 금액 계산은 `Decimal`로 수행합니다. 네이티브 통화가 기준 통화와
//! 다른 종목은 환율 제공자를 통해 변환하며, 변환 실패 시 1:1 환율로
//! 저하하고 결과에 표시합니다 (절대 오류로 전파하지 않음).

use crate::error::{PnlError, PnlResult};
use journal_core::{Direction, InstrumentRegistry};
use journal_market::{ExchangeRates, RateTier};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// 기준 통화 금액의 산출 근거.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBasis {
    /// 네이티브 통화가 기준 통화와 동일 (변환 불필요)
    SameCurrency,
    /// 환율 제공자가 반환한 환율 사용
    Market(RateTier),
    /// 변환 실패 - 1:1 환율로 저하됨
    ConversionFailed,
}

impl RateBasis {
    /// 기준 통화 금액을 신뢰할 수 있는지 확인합니다.
    pub fn trusted(&self) -> bool {
        !matches!(self, RateBasis::ConversionFailed)
    }
}

/// 손익 계산 결과.
#[derive(Debug, Clone, Serialize)]
pub struct PnlBreakdown {
    /// 종목 심볼
    pub instrument: String,
    /// 포지션 방향
    pub direction: Direction,
    /// 네이티브 통화 기준 손익
    pub pnl_native: Decimal,
    /// 종목의 네이티브 통화
    pub native_currency: String,
    /// 기준 통화 기준 손익 (소수점 2자리 반올림)
    pub pnl_base: Decimal,
    /// 계좌 기준 통화
    pub base_currency: String,
    /// 적용된 환율 (변환 실패 시 1)
    pub exchange_rate: Decimal,
    /// 환율 산출 근거
    pub rate_basis: RateBasis,
}

/// 손익비 계산 결과.
#[derive(Debug, Clone, Serialize)]
pub struct RiskReward {
    /// 리스크 거리 (진입가 ↔ 손절가)
    pub risk: Decimal,
    /// 보상 거리 (진입가 ↔ 익절가)
    pub reward: Decimal,
    /// 손익비 (reward / risk, 소수점 2자리)
    pub ratio: Decimal,
}

/// 포지션 크기 계산 결과.
#[derive(Debug, Clone, Serialize)]
pub struct PositionSize {
    /// 기준 통화 리스크 예산
    pub risk_amount_base: Decimal,
    /// 네이티브 통화로 변환된 리스크 예산
    pub risk_amount_native: Decimal,
    /// 손절 거리 (가격 포인트)
    pub stop_distance: Decimal,
    /// 권장 랏 크기 (소수점 2자리)
    pub lot_size: Decimal,
    /// 적용된 환율 (네이티브 → 기준)
    pub exchange_rate: Decimal,
    /// 환율 산출 근거
    pub rate_basis: RateBasis,
}

/// 손익 계산 엔진.
///
/// 시작 시 한 번 생성되어 참조로 전달됩니다 (모듈 싱글턴 없음).
pub struct PnLEngine {
    rates: Arc<dyn ExchangeRates>,
    instruments: Arc<InstrumentRegistry>,
    base_currency: String,
}

impl PnLEngine {
    /// 새 엔진을 생성합니다.
    pub fn new(
        rates: Arc<dyn ExchangeRates>,
        instruments: Arc<InstrumentRegistry>,
        base_currency: impl Into<String>,
    ) -> Self {
        Self {
            rates,
            instruments,
            base_currency: base_currency.into().to_uppercase(),
        }
    }

    /// 계좌 기준 통화를 반환합니다.
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// 네이티브 → 기준 통화 환율을 조회합니다.
    ///
    /// 실패해도 오류를 반환하지 않고 1:1로 저하합니다.
    async fn base_rate(&self, native_currency: &str) -> (Decimal, RateBasis) {
        if native_currency == self.base_currency {
            return (Decimal::ONE, RateBasis::SameCurrency);
        }

        match self
            .rates
            .get_rate(native_currency, &self.base_currency)
            .await
        {
            Ok(quote) if !quote.rate.is_zero() => (quote.rate, RateBasis::Market(quote.source)),
            Ok(_) => {
                warn!(
                    native = %native_currency,
                    base = %self.base_currency,
                    "환율 제공자가 0을 반환, 1:1 환율로 저하"
                );
                (Decimal::ONE, RateBasis::ConversionFailed)
            }
            Err(e) => {
                warn!(
                    native = %native_currency,
                    base = %self.base_currency,
                    error = %e,
                    "환율 변환 실패, 1:1 환율로 저하"
                );
                (Decimal::ONE, RateBasis::ConversionFailed)
            }
        }
    }

    /// 실현 손익을 계산합니다.
    ///
    /// 가격 델타는 방향 인식: 롱은 `청산가 - 진입가`, 숏은 `진입가 - 청산가`.
    /// 네이티브 손익 = 델타 × 포인트 가치 × 랏 크기.
    pub async fn calculate_realized(
        &self,
        instrument: &str,
        direction: Direction,
        entry_price: Decimal,
        exit_price: Decimal,
        lot_size: Decimal,
    ) -> PnlBreakdown {
        let spec = self.instruments.spec(instrument);

        let delta = match direction {
            Direction::Long => exit_price - entry_price,
            Direction::Short => entry_price - exit_price,
        };
        let pnl_native = delta * spec.point_value * lot_size;

        let (rate, rate_basis) = self.base_rate(&spec.native_currency).await;
        let pnl_base = (pnl_native * rate).round_dp(2);

        PnlBreakdown {
            instrument: instrument.to_uppercase(),
            direction,
            pnl_native,
            native_currency: spec.native_currency,
            pnl_base,
            base_currency: self.base_currency.clone(),
            exchange_rate: rate,
            rate_basis,
        }
    }

    /// 미실현 손익을 계산합니다.
    ///
    /// 청산가 자리에 현재 시장 가격을 대입한 실현 손익 계산과 동일합니다.
    pub async fn calculate_unrealized(
        &self,
        instrument: &str,
        direction: Direction,
        entry_price: Decimal,
        market_price: Decimal,
        lot_size: Decimal,
    ) -> PnlBreakdown {
        self.calculate_realized(instrument, direction, entry_price, market_price, lot_size)
            .await
    }

    /// 손익비를 계산합니다.
    ///
    /// 롱: risk = 진입가 - 손절가, reward = 익절가 - 진입가. 숏은 반대.
    /// 리스크 또는 보상이 0 이하이면 손절/익절 배치가 비정상이므로
    /// 검증 오류입니다 (일시적 실패가 아님).
    pub fn calculate_risk_reward(
        &self,
        entry_price: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
        direction: Direction,
    ) -> PnlResult<RiskReward> {
        let (risk, reward) = match direction {
            Direction::Long => (entry_price - stop_loss, take_profit - entry_price),
            Direction::Short => (stop_loss - entry_price, entry_price - take_profit),
        };

        if risk <= Decimal::ZERO {
            return Err(PnlError::Validation(format!(
                "손절 배치 비정상: {} 포지션의 리스크가 양수가 아님 (entry {}, sl {})",
                direction, entry_price, stop_loss
            )));
        }
        if reward <= Decimal::ZERO {
            return Err(PnlError::Validation(format!(
                "익절 배치 비정상: {} 포지션의 보상이 양수가 아님 (entry {}, tp {})",
                direction, entry_price, take_profit
            )));
        }

        Ok(RiskReward {
            risk,
            reward,
            ratio: (reward / risk).round_dp(2),
        })
    }

    /// 리스크 비율 기반 포지션 크기를 계산합니다.
    ///
    /// 리스크 예산 = 잔고 × 리스크% / 100. 예산을 역환율로 종목의 네이티브
    /// 통화로 변환한 뒤 `손절 거리 × 포인트 가치`로 나눠 랏 크기를 얻습니다.
    pub async fn calculate_position_size(
        &self,
        balance: Decimal,
        risk_pct: Decimal,
        entry_price: Decimal,
        stop_loss: Decimal,
        instrument: &str,
    ) -> PnlResult<PositionSize> {
        if balance <= Decimal::ZERO {
            return Err(PnlError::Validation(format!(
                "잔고는 양수여야 함: {}",
                balance
            )));
        }
        if risk_pct <= Decimal::ZERO || risk_pct > Decimal::ONE_HUNDRED {
            return Err(PnlError::Validation(format!(
                "리스크 비율은 (0, 100] 범위여야 함: {}",
                risk_pct
            )));
        }

        let stop_distance = (entry_price - stop_loss).abs();
        if stop_distance.is_zero() {
            return Err(PnlError::Validation(
                "손절 거리가 0입니다 (진입가와 손절가가 동일)".to_string(),
            ));
        }

        let spec = self.instruments.spec(instrument);
        let point_risk = stop_distance * spec.point_value;
        if point_risk.is_zero() {
            return Err(PnlError::Validation(format!(
                "종목 {}의 포인트 가치가 0입니다",
                instrument
            )));
        }

        let risk_amount_base = balance * risk_pct / Decimal::ONE_HUNDRED;

        // 네이티브 → 기준 환율의 역수로 예산을 네이티브 통화로 변환
        let (rate, rate_basis) = self.base_rate(&spec.native_currency).await;
        let risk_amount_native = risk_amount_base / rate;

        let lot_size = (risk_amount_native / point_risk).round_dp(2);

        Ok(PositionSize {
            risk_amount_base: risk_amount_base.round_dp(2),
            risk_amount_native: risk_amount_native.round_dp(2),
            stop_distance,
            lot_size,
            exchange_rate: rate,
            rate_basis,
        })
    }
}
