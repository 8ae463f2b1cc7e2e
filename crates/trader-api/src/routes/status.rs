//! 리스크 상태, 손익 피드, 관리자 거래 스위치.
//!
//! - `GET /status` - 리스크 스냅샷과 현재 시각, 세션 상태
//! - `POST /pnl` - 실현 손익 반영 `{ "delta": "-1500" }`
//! - `POST /trading_enabled` - 관리자 거래 활성화 스위치 `{ "enabled": false }`

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use trader_execution::{LifecyclePhase, PnlUpdate, Transition};
use trader_risk::RiskStatus;

use crate::state::AppState;

/// `current_time` 표시 형식.
pub const CURRENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 다음 예정 전환.
#[derive(Debug, Serialize, Deserialize)]
pub struct NextTransition {
    pub transition: Transition,
    pub at: NaiveDateTime,
}

/// 상태 조회 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub risk: RiskStatus,
    /// 시장 현지 시각 ("%Y-%m-%d %H:%M:%S")
    pub current_time: String,
    /// 세션 주문 접수 여부
    pub trading_active: bool,
    /// 현재 생명주기 단계
    pub phase: LifecyclePhase,
    pub next_transition: NextTransition,
}

/// 손익 반영 요청.
#[derive(Debug, Deserialize)]
pub struct PnlRequest {
    pub delta: Decimal,
}

/// 관리자 거래 스위치 요청.
#[derive(Debug, Deserialize)]
pub struct TradingEnabledRequest {
    pub enabled: bool,
}

/// 리스크 스냅샷과 세션 상태를 조회합니다.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let risk = state.executor.status().await;
    let next = state.scheduler.lock().await.next_transition();
    let session = state.executor.session();

    Json(StatusResponse {
        risk,
        current_time: state.clock.now().format(CURRENT_TIME_FORMAT).to_string(),
        trading_active: session.is_active(),
        phase: session.phase(),
        next_transition: NextTransition {
            transition: next.transition,
            at: next.at,
        },
    })
}

/// 실현 손익을 반영합니다.
///
/// 손실 한도에 도달하면 `STOP_TRADING` 신호를 반환합니다.
pub async fn apply_pnl(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PnlRequest>,
) -> Json<PnlUpdate> {
    let update = state.executor.apply_pnl(request.delta).await;

    info!(
        delta = %request.delta,
        daily_pnl = %update.status.daily_pnl,
        signal = ?update.signal,
        "P&L applied"
    );

    Json(update)
}

/// 관리자 거래 활성화 스위치.
///
/// 차단 래치는 해제하지 않습니다. 차단은 일일 초기화로만 풀립니다.
pub async fn set_trading_enabled(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TradingEnabledRequest>,
) -> Json<RiskStatus> {
    let mut risk = state.executor.risk_manager().write().await;
    risk.set_trading_enabled(request.enabled);

    if request.enabled {
        info!("Trading enabled by operator");
    } else {
        warn!("Trading disabled by operator");
    }

    Json(risk.status())
}

/// 상태 라우터 생성.
pub fn status_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(get_status))
        .route("/pnl", post(apply_pnl))
        .route("/trading_enabled", post(set_trading_enabled))
}
