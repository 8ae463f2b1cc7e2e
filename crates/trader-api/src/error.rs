//! API 에러 응답 타입.
//!
//! 모든 엔드포인트가 같은 JSON 에러 형식을 사용합니다.
//!
//! ```json
//! {
//!   "code": "ORDER_REJECTED",
//!   "message": "Max trades reached",
//!   "timestamp": 1738300800
//! }
//! ```

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trader_execution::{ExecutionError, OrderRejection};

/// 통합 API 에러 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "ORDER_REJECTED", "BROKER_ERROR")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }

    /// 에러 코드 반환.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 에러 메시지 반환.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 주문 거부를 400 응답으로 변환합니다.
///
/// 메시지는 거부 사유 문자열을 그대로 사용합니다.
pub fn rejection_response(rejection: &OrderRejection) -> (StatusCode, Json<ApiErrorResponse>) {
    let code = match rejection {
        OrderRejection::TradingInactive => "TRADING_INACTIVE",
        OrderRejection::TradingDisabled => "TRADING_DISABLED",
        OrderRejection::Risk(_) => "ORDER_REJECTED",
    };
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::new(code, rejection.message())),
    )
}

/// 실행 오류를 HTTP 응답으로 변환합니다.
///
/// | 오류 | 상태 코드 |
/// |------|-----------|
/// | 잘못된 주문 | 400 |
/// | 주문/포지션 없음 | 404 |
/// | 브로커 타임아웃 | 504 |
/// | 그 외 브로커 오류 | 502 |
pub fn execution_error_response(err: &ExecutionError) -> (StatusCode, Json<ApiErrorResponse>) {
    use trader_exchange::ExchangeError;

    let (status, code) = match err {
        ExecutionError::InvalidOrder(_) => (StatusCode::BAD_REQUEST, "INVALID_ORDER"),
        ExecutionError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "BROKER_TIMEOUT"),
        ExecutionError::Exchange(ExchangeError::OrderNotFound(_)) => {
            (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND")
        }
        ExecutionError::Exchange(ExchangeError::PositionNotFound(_)) => {
            (StatusCode::NOT_FOUND, "POSITION_NOT_FOUND")
        }
        ExecutionError::Exchange(ExchangeError::Timeout(_)) => {
            (StatusCode::GATEWAY_TIMEOUT, "BROKER_TIMEOUT")
        }
        ExecutionError::Exchange(_) => (StatusCode::BAD_GATEWAY, "BROKER_ERROR"),
    };

    (status, Json(ApiErrorResponse::new(code, err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trader_exchange::ExchangeError;
    use trader_risk::RejectReason;

    #[test]
    fn test_api_error_response_new() {
        let error = ApiErrorResponse::new("TEST_ERROR", "Test message");
        assert_eq!(error.code(), "TEST_ERROR");
        assert_eq!(error.message(), "Test message");
        assert!(error.timestamp.is_some());
        assert!(error.details.is_none());
        assert_eq!(error.to_string(), "[TEST_ERROR] Test message");
    }

    #[test]
    fn test_json_omits_empty_details() {
        let error = ApiErrorResponse::new("NOT_FOUND", "Resource not found");
        let json = serde_json::to_string(&error).unwrap();

        assert!(!json.contains("details"));
        assert!(json.contains(r#""code":"NOT_FOUND""#));

        let detailed = ApiErrorResponse::with_details(
            "BROKER_ERROR",
            "exit failed",
            serde_json::json!({"symbol": "SBIN"}),
        );
        assert_eq!(detailed.details.unwrap()["symbol"], "SBIN");
    }

    #[test]
    fn test_rejection_keeps_reason_text() {
        let (status, Json(body)) =
            rejection_response(&OrderRejection::Risk(RejectReason::MaxTradesReached));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, "Max trades reached");

        let (_, Json(body)) = rejection_response(&OrderRejection::TradingInactive);
        assert_eq!(body.code, "TRADING_INACTIVE");
        assert_eq!(body.message, "Trading not active");
    }

    #[test]
    fn test_execution_error_status_codes() {
        let cases = [
            (
                ExecutionError::InvalidOrder("quantity".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ExecutionError::Timeout {
                    operation: "place_order",
                    timeout_ms: 10,
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ExecutionError::Exchange(ExchangeError::OrderNotFound("1".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                ExecutionError::Exchange(ExchangeError::NetworkError("down".into())),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(execution_error_response(&err).0, expected, "{}", err);
        }
    }
}
