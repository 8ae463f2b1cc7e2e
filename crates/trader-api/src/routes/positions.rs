//! 포지션 및 계좌 엔드포인트.
//!
//! - `POST /exit_all` - 모든 오픈 포지션 청산
//! - `GET /positions` - 브로커 포지션 조회
//! - `GET /margin` - 증거금 조회

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use trader_core::Position;
use trader_exchange::MarginInfo;
use trader_execution::LiquidationReport;

use crate::error::{execution_error_response, ApiResult};
use crate::state::AppState;

/// 전체 청산 응답.
///
/// 개별 청산 실패가 있어도 200으로 응답하며 `success`가 false가 됩니다.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExitAllResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub report: LiquidationReport,
}

/// 포지션 목록 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct PositionsResponse {
    pub positions: Vec<Position>,
    pub count: usize,
}

/// 모든 오픈 포지션 청산.
///
/// 포지션 조회 자체가 실패하면 502를 반환합니다.
pub async fn exit_all(State(state): State<Arc<AppState>>) -> ApiResult<Json<ExitAllResponse>> {
    info!("Manual exit of all positions requested");

    let report = state
        .executor
        .exit_all_positions()
        .await
        .map_err(|e| execution_error_response(&e))?;

    let message = if report.is_complete() {
        "All positions exited".to_string()
    } else {
        format!(
            "{} of {} positions failed to exit",
            report.failures.len(),
            report.attempted
        )
    };

    Ok(Json(ExitAllResponse {
        success: report.is_complete(),
        message,
        report,
    }))
}

/// 브로커 포지션 조회.
pub async fn get_positions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PositionsResponse>> {
    let positions = state
        .executor
        .positions()
        .await
        .map_err(|e| execution_error_response(&e))?;

    Ok(Json(PositionsResponse {
        count: positions.len(),
        positions,
    }))
}

/// 증거금 조회.
pub async fn get_margin(State(state): State<Arc<AppState>>) -> ApiResult<Json<MarginInfo>> {
    state
        .executor
        .margin()
        .await
        .map(Json)
        .map_err(|e| execution_error_response(&e))
}

/// 포지션 라우터 생성.
pub fn positions_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/exit_all", post(exit_all))
        .route("/positions", get(get_positions))
        .route("/margin", get(get_margin))
}
