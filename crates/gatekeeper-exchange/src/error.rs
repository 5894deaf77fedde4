//! 거래소 에러 타입.

use thiserror::Error;

/// 거래소 API 호출 에러.
///
/// 호출자(워크플로)는 이 상세 정보를 사용자에게 노출하지 않고
/// "서비스 이용 불가"로 일괄 처리합니다.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 2xx 이외의 HTTP 응답
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// API 에러 코드
    #[error("API error {code}: {message}")]
    ApiError { code: String, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 요청 서명 실패
    #[error("Signing error: {0}")]
    SigningError(String),

    /// rate limiter 대기 중 취소됨
    #[error("Rate limiter wait cancelled")]
    RateLimiterCancelled,

    /// 요청 진행 중 취소됨
    #[error("Request cancelled")]
    Cancelled,

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ExchangeError {
    /// 메트릭 라벨용 분류 문자열.
    pub fn category(&self) -> &'static str {
        match self {
            ExchangeError::NetworkError(_) => "network",
            ExchangeError::HttpStatus { .. } => "http_status",
            ExchangeError::ApiError { .. } => "api",
            ExchangeError::ParseError(_) => "parse",
            ExchangeError::SigningError(_) => "signing",
            ExchangeError::RateLimiterCancelled => "rate_limiter",
            ExchangeError::Cancelled => "cancelled",
            ExchangeError::Timeout(_) => "timeout",
            ExchangeError::Unknown(_) => "unknown",
        }
    }
}

/// 거래소 작업용 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_connect() {
            ExchangeError::NetworkError(err.to_string())
        } else {
            ExchangeError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_error_maps_to_parse() {
        let err: ExchangeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ExchangeError::ParseError(_)));
        assert_eq!(err.category(), "parse");
    }
}
