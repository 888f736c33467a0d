//! 손익 엔진 오류 타입.

use thiserror::Error;

/// 손익 계산 오류.
///
/// 엔진은 데이터 소스 실패를 오류로 전파하지 않으므로
/// 입력 검증 실패만 존재합니다.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PnlError {
    /// 잘못된 입력 (비정상 손절/익절 배치, 범위 밖 리스크 비율 등)
    #[error("입력 검증 실패: {0}")]
    Validation(String),
}

/// 손익 계산용 Result 타입.
pub type PnlResult<T> = Result<T, PnlError>;
