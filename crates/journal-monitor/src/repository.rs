//! 외부 포지션 저장소 포트.
//!
//! 영속성은 호스트 애플리케이션의 책임입니다. 엔진은 "손절 또는 익절이
//! 설정된 오픈 포지션 조회"라는 좁은 읽기 인터페이스에만 의존합니다.

use async_trait::async_trait;
use journal_core::PositionSnapshot;
use thiserror::Error;

/// 저장소 조회 오류.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// 쿼리 실행 실패
    #[error("query failed: {0}")]
    Query(String),

    /// 저장소 사용 불가 (연결 끊김 등)
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// 포지션 저장소 읽기 포트.
#[async_trait]
pub trait PositionRepository: Send + Sync {
    /// 손절 또는 익절 레벨이 설정된 오픈 포지션을 반환합니다.
    async fn open_positions_with_triggers(
        &self,
    ) -> Result<Vec<PositionSnapshot>, RepositoryError>;
}
