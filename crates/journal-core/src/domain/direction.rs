//! 포지션 방향 타입.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 포지션 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// 롱 (매수)
    Long,
    /// 숏 (매도)
    Short,
}

impl Direction {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// 방향 파싱 실패.
///
/// 대화형 파서가 넘겨주는 자유 텍스트가 유효한 방향이 아닐 때 발생합니다.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("유효하지 않은 포지션 방향: {0}")]
pub struct DirectionParseError(pub String);

impl std::str::FromStr for Direction {
    type Err = DirectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" | "buy" => Ok(Direction::Long),
            "short" | "sell" => Ok(Direction::Short),
            _ => Err(DirectionParseError(s.to_string())),
        }
    }
}
