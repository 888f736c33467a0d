//! 포지션 스냅샷 타입.
//!
//! 외부 포지션 저장소가 제공하는 읽기 전용 뷰입니다.
//! 엔진은 이 스냅샷을 절대 변경하지 않습니다.

use crate::domain::Direction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 오픈 포지션의 읽기 전용 스냅샷.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSnapshot {
    /// 저장소의 포지션 ID
    pub id: Uuid,
    /// 종목 심볼 (예: "DAX", "BTCUSD")
    pub instrument: String,
    /// 포지션 방향
    pub direction: Direction,
    /// 진입 가격
    pub entry_price: Decimal,
    /// 손절 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    /// 익절 가격
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Decimal>,
    /// 랏 크기
    pub lot_size: Decimal,
    /// 포지션 소유자 (저널 사용자) ID
    pub owner_id: String,
}

impl PositionSnapshot {
    /// 손절 또는 익절 레벨이 설정되어 있는지 확인합니다.
    pub fn has_triggers(&self) -> bool {
        self.stop_loss.is_some() || self.take_profit.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(stop_loss: Option<Decimal>, take_profit: Option<Decimal>) -> PositionSnapshot {
        PositionSnapshot {
            id: Uuid::new_v4(),
            instrument: "DAX".to_string(),
            direction: Direction::Long,
            entry_price: dec!(18000),
            stop_loss,
            take_profit,
            lot_size: dec!(1),
            owner_id: "user-1".to_string(),
        }
    }

    #[test]
    fn test_has_triggers() {
        assert!(snapshot(Some(dec!(17900)), None).has_triggers());
        assert!(snapshot(None, Some(dec!(18100))).has_triggers());
        assert!(!snapshot(None, None).has_triggers());
    }
}
