//! 시장 데이터 모듈 오류 타입.

use thiserror::Error;

/// 시장 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// 체인의 모든 소스에서 데이터를 찾지 못함
    #[error("No data available: {0}")]
    NotFound(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 벤더/엔드포인트별 오류
    #[error("Source error ({name}): {message}")]
    SourceError { name: String, message: String },

    /// 응답 파싱 오류
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 설정 오류 (생성 시점에 검증)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MarketDataError {
    /// 소스 오류를 생성합니다.
    pub fn source_error(name: impl Into<String>, message: impl Into<String>) -> Self {
        MarketDataError::SourceError {
            name: name.into(),
            message: message.into(),
        }
    }

    /// 재시도 가능한 오류인지 확인합니다.
    ///
    /// NotFound는 체인 전체가 소진된 결과이므로 즉시 재시도해도 의미가 없고,
    /// 설정/파싱 오류는 재시도로 해결되지 않습니다.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MarketDataError::Timeout(_) | MarketDataError::SourceError { .. }
        )
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MarketDataError::Timeout(err.to_string())
        } else if err.is_decode() {
            MarketDataError::ParseError(err.to_string())
        } else {
            MarketDataError::source_error("http", err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(MarketDataError::Timeout("10s".to_string()).is_retryable());
        assert!(MarketDataError::source_error("vendor", "500").is_retryable());
        assert!(!MarketDataError::NotFound("EURUSD".to_string()).is_retryable());
        assert!(!MarketDataError::ConfigError("empty url".to_string()).is_retryable());
    }
}
