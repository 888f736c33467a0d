//! 알림 타입 및 trait 정의.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use journal_core::{Direction, TriggerKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 알림 우선순위 레벨.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    /// 낮은 우선순위 (정보성)
    Low,
    /// 일반 우선순위
    #[default]
    Normal,
    /// 높은 우선순위 (중요 이벤트)
    High,
    /// 긴급 우선순위
    Critical,
}

impl AlertPriority {
    /// 트리거 종류에 따른 기본 우선순위.
    ///
    /// 손절은 즉시 확인이 필요하므로 High, 익절은 Normal.
    pub fn for_trigger(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::StopLoss => AlertPriority::High,
            TriggerKind::TakeProfit => AlertPriority::Normal,
        }
    }
}

/// 손절/익절 트리거 알림.
///
/// 모니터가 트리거 탐지 시점에 조립하는 완결된 페이로드입니다.
/// 구독자는 추가 조회 없이 이 구조체만으로 메시지를 구성할 수 있습니다.
#[derive(Debug, Clone, Serialize)]
pub struct TriggerAlert {
    /// 알림 고유 ID
    pub id: Uuid,
    /// 트리거된 포지션 ID
    pub position_id: Uuid,
    /// 포지션 소유자 ID
    pub owner_id: String,
    /// 종목 심볼
    pub instrument: String,
    /// 포지션 방향
    pub direction: Direction,
    /// 트리거 종류 (손절/익절)
    pub kind: TriggerKind,
    /// 트리거 레벨 (설정된 손절가/익절가)
    pub trigger_level: Decimal,
    /// 트리거를 발생시킨 시장 가격
    pub market_price: Decimal,
    /// 진입 가격
    pub entry_price: Decimal,
    /// 랏 크기
    pub lot_size: Decimal,
    /// 네이티브 통화 손익
    pub pnl_native: Decimal,
    /// 네이티브 통화
    pub native_currency: String,
    /// 기준 통화 손익
    pub pnl_base: Decimal,
    /// 기준 통화
    pub base_currency: String,
    /// 적용된 환율
    pub exchange_rate: Decimal,
    /// 환율 신뢰 여부 (변환 실패로 1:1 저하 시 false)
    pub rate_trusted: bool,
    /// 우선순위
    pub priority: AlertPriority,
    /// 트리거 탐지 시각
    pub triggered_at: DateTime<Utc>,
}

/// 알림 작업용 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 전송 오류.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    #[error("잘못된 설정: {0}")]
    InvalidConfig(String),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 알림 구독자 trait.
///
/// 모니터는 등록된 모든 구독자에게 순차적으로 알림을 전달하며, 한
/// 구독자의 실패가 나머지 구독자나 모니터 루프를 막지 않습니다.
#[async_trait]
pub trait AlertSubscriber: Send + Sync {
    /// 알림을 전달합니다.
    async fn notify(&self, alert: &TriggerAlert) -> NotificationResult<()>;

    /// 구독자 이름 (등록 해제 키).
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_for_trigger() {
        assert_eq!(
            AlertPriority::for_trigger(TriggerKind::StopLoss),
            AlertPriority::High
        );
        assert_eq!(
            AlertPriority::for_trigger(TriggerKind::TakeProfit),
            AlertPriority::Normal
        );
    }
}
