//! 헬스 체크 및 서비스 정보 엔드포인트.
//!
//! - `GET /` - 서비스 이름, 버전, 적용 중인 리스크 규칙
//! - `GET /health` - liveness 체크

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 서비스 이름.
pub const SERVICE_NAME: &str = "Risk-gated Trading Controller";

/// 적용 중인 리스크 규칙 요약.
#[derive(Debug, Serialize, Deserialize)]
pub struct RulesSummary {
    /// 일일 최대 손실 (예: "20%")
    pub max_daily_loss: String,
    /// 거래 가능 시간 (예: "09:25:00 - 15:00:00")
    pub trading_hours: String,
    /// 일일 최대 거래 횟수
    pub max_trades_per_day: u32,
}

/// 서비스 정보 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfoResponse {
    pub status: String,
    pub version: String,
    /// 사용 중인 브로커
    pub broker: String,
    pub uptime_secs: i64,
    pub rules: RulesSummary,
}

/// 기본 헬스 체크 (liveness).
///
/// 서버가 응답 가능한지만 확인합니다.
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// 서비스 정보와 리스크 규칙.
pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfoResponse> {
    let risk = state.executor.risk_manager().read().await;
    let config = risk.config();

    let percent = (config.loss_fraction * Decimal::ONE_HUNDRED).normalize();

    Json(ServiceInfoResponse {
        status: SERVICE_NAME.to_string(),
        version: state.version.clone(),
        broker: state.executor.broker_name().to_string(),
        uptime_secs: state.uptime_secs(),
        rules: RulesSummary {
            max_daily_loss: format!("{}%", percent),
            trading_hours: config.trading_window.to_string(),
            max_trades_per_day: config.max_trades,
        },
    })
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
}
