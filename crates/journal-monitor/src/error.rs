//! 모니터 오류 타입.

use thiserror::Error;

/// 포지션 모니터 오류.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// 이미 실행 중인 모니터에 start()를 호출함
    #[error("모니터가 이미 실행 중입니다")]
    AlreadyRunning,

    /// 포지션 저장소 조회 실패 (사이클 내에서 복구됨)
    #[error("저장소 조회 실패: {0}")]
    Repository(String),
}
