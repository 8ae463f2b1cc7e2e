//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/`, `/health` - 서비스 정보, 헬스 체크
//! - `/status`, `/pnl`, `/trading_enabled` - 리스크 상태와 손익 피드
//! - `/place_order`, `/orders/{id}` - 주문
//! - `/exit_all`, `/positions`, `/margin` - 포지션과 계좌

pub mod health;
pub mod orders;
pub mod positions;
pub mod status;

pub use health::{health_router, RulesSummary, ServiceInfoResponse};
pub use orders::{orders_router, CancelOrderResponse, PlaceOrderResponse};
pub use positions::{positions_router, ExitAllResponse, PositionsResponse};
pub use status::{status_router, NextTransition, PnlRequest, StatusResponse, TradingEnabledRequest};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health_router())
        .merge(status_router())
        .merge(orders_router())
        .merge(positions_router())
}
