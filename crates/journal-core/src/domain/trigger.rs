//! 손절/익절 트리거 판정.
//!
//! 방향에 따른 트리거 판정 규칙:
//! - 롱: 가격이 손절가 이하로 내려가면 손절, 익절가 이상으로 오르면 익절
//! - 숏: 반대 방향 (손절가 이상 / 익절가 이하)

use crate::domain::Direction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 트리거 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// 손절 (Stop Loss)
    StopLoss,
    /// 익절 (Take Profit)
    TakeProfit,
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerKind::StopLoss => write!(f, "stop_loss"),
            TriggerKind::TakeProfit => write!(f, "take_profit"),
        }
    }
}

/// 현재 가격이 어느 트리거에 도달했는지 판정합니다.
///
/// 경계값 포함: 가격이 정확히 손절가/익절가에 닿아도 트리거됩니다.
/// 갭 체결 등으로 양쪽 레벨을 동시에 관통한 경우 둘 다 반환될 수 있습니다.
pub fn evaluate_triggers(
    direction: Direction,
    price: Decimal,
    stop_loss: Option<Decimal>,
    take_profit: Option<Decimal>,
) -> Vec<TriggerKind> {
    let mut hits = Vec::new();

    if let Some(sl) = stop_loss {
        let hit = match direction {
            Direction::Long => price <= sl,
            Direction::Short => price >= sl,
        };
        if hit {
            hits.push(TriggerKind::StopLoss);
        }
    }

    if let Some(tp) = take_profit {
        let hit = match direction {
            Direction::Long => price >= tp,
            Direction::Short => price <= tp,
        };
        if hit {
            hits.push(TriggerKind::TakeProfit);
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_long_stop_loss() {
        // 가격이 손절가 아래
        let hits = evaluate_triggers(Direction::Long, dec!(94), Some(dec!(95)), Some(dec!(110)));
        assert_eq!(hits, vec![TriggerKind::StopLoss]);

        // 경계값: 손절가와 같음
        let hits = evaluate_triggers(Direction::Long, dec!(95), Some(dec!(95)), None);
        assert_eq!(hits, vec![TriggerKind::StopLoss]);
    }

    #[test]
    fn test_long_take_profit() {
        let hits = evaluate_triggers(Direction::Long, dec!(111), Some(dec!(95)), Some(dec!(110)));
        assert_eq!(hits, vec![TriggerKind::TakeProfit]);

        let hits = evaluate_triggers(Direction::Long, dec!(110), None, Some(dec!(110)));
        assert_eq!(hits, vec![TriggerKind::TakeProfit]);
    }

    #[test]
    fn test_short_mirrored() {
        // 숏: 가격 상승이 손절
        let hits = evaluate_triggers(Direction::Short, dec!(106), Some(dec!(105)), Some(dec!(90)));
        assert_eq!(hits, vec![TriggerKind::StopLoss]);

        // 숏: 가격 하락이 익절
        let hits = evaluate_triggers(Direction::Short, dec!(89), Some(dec!(105)), Some(dec!(90)));
        assert_eq!(hits, vec![TriggerKind::TakeProfit]);
    }

    #[test]
    fn test_no_trigger_inside_bracket() {
        let hits = evaluate_triggers(Direction::Long, dec!(100), Some(dec!(95)), Some(dec!(110)));
        assert!(hits.is_empty());

        // 레벨이 없으면 아무것도 트리거되지 않음
        let hits = evaluate_triggers(Direction::Long, dec!(0), None, None);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_degenerate_bracket_fires_both() {
        // 손절가가 익절가 위에 있는 비정상 브래킷은 양쪽 모두 탐지
        let hits = evaluate_triggers(Direction::Long, dec!(100), Some(dec!(100)), Some(dec!(100)));
        assert_eq!(hits, vec![TriggerKind::StopLoss, TriggerKind::TakeProfit]);
    }
}
