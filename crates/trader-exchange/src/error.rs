//! 브로커 에러 타입.

use thiserror::Error;

/// 브로커 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 인증/권한 에러
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// API 에러 코드
    #[error("API error {code}: {message}")]
    ApiError { code: i32, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 주문을 찾을 수 없음
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// 포지션을 찾을 수 없음
    #[error("Position not found: {0}")]
    PositionNotFound(String),

    /// 주문 거부됨
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExchangeError {
    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ExchangeError::Unauthorized(_))
    }

    /// HTTP 상태 코드와 응답 본문을 에러로 변환합니다.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ExchangeError::Unauthorized(body),
            404 => ExchangeError::OrderNotFound(body),
            429 => ExchangeError::RateLimited,
            _ => ExchangeError::ApiError {
                code: status as i32,
                message: body,
            },
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_decode() {
            ExchangeError::ParseError(err.to_string())
        } else {
            ExchangeError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}
