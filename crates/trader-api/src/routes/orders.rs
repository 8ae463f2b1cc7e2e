//! 주문 엔드포인트.
//!
//! - `POST /place_order` - 리스크 검사 후 브로커로 주문 제출
//! - `DELETE /orders/{id}` - 주문 취소

use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trader_core::OrderRequest;
use trader_execution::OrderOutcome;

use crate::error::{execution_error_response, rejection_response, ApiResult};
use crate::state::AppState;

/// 주문 제출 성공 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaceOrderResponse {
    pub success: bool,
    pub order_id: String,
    pub message: String,
    /// 이 주문을 포함한 당일 거래 횟수
    pub trade_count: u32,
    /// 남은 거래 횟수
    pub remaining_trades: u32,
}

/// 주문 취소 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelOrderResponse {
    pub success: bool,
    pub order_id: String,
}

/// 주문 제출.
///
/// 세션이 비활성이거나 리스크 규칙에 걸리면 400과 함께 사유를 그대로
/// 반환하고 브로커로 전달하지 않습니다.
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OrderRequest>,
) -> ApiResult<Json<PlaceOrderResponse>> {
    let outcome = state
        .executor
        .submit_order(&request)
        .await
        .map_err(|e| execution_error_response(&e))?;

    match outcome {
        OrderOutcome::Placed(receipt) => Ok(Json(PlaceOrderResponse {
            success: true,
            order_id: receipt.order_id,
            message: "Order placed successfully".to_string(),
            trade_count: receipt.trade_count,
            remaining_trades: receipt.remaining_trades,
        })),
        OrderOutcome::Rejected(rejection) => Err(rejection_response(&rejection)),
    }
}

/// 주문 취소.
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<CancelOrderResponse>> {
    state
        .executor
        .cancel_order(&order_id)
        .await
        .map_err(|e| execution_error_response(&e))?;

    Ok(Json(CancelOrderResponse {
        success: true,
        order_id,
    }))
}

/// 주문 라우터 생성.
pub fn orders_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/place_order", post(place_order))
        .route("/orders/{id}", delete(cancel_order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorResponse;
    use crate::state::create_test_state;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::{NaiveDate, NaiveTime};
    use std::time::Duration;
    use tower::ServiceExt;
    use trader_core::ManualClock;
    use trader_exchange::SimulatedBroker;

    struct Fixture {
        state: Arc<AppState>,
        broker: SimulatedBroker,
        clock: ManualClock,
    }

    /// 10:00에 세션이 열린 상태.
    fn open_session() -> Fixture {
        let clock = ManualClock::at(
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        );
        let broker = SimulatedBroker::default();
        let state = Arc::new(create_test_state(clock.clone(), broker.clone()));
        state.executor.session().set_active(true);
        Fixture {
            state,
            broker,
            clock,
        }
    }

    fn order_request(symbol: &str) -> Request<Body> {
        let body = serde_json::json!({
            "symbol": symbol,
            "exchange": "NSE",
            "side": "BUY",
            "quantity": "5",
            "orderType": "MARKET"
        });
        Request::builder()
            .method("POST")
            .uri("/place_order")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn error_body(response: axum::response::Response) -> ApiErrorResponse {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_place_order_success() {
        let f = open_session();
        let app = orders_router().with_state(Arc::clone(&f.state));

        let response = app.oneshot(order_request("SBIN")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let placed: PlaceOrderResponse = serde_json::from_slice(&body).unwrap();
        assert!(placed.success);
        assert_eq!(placed.order_id, "SIM-000001");
        assert_eq!(placed.trade_count, 1);
        assert_eq!(placed.remaining_trades, 9);

        assert_eq!(f.broker.orders().await.len(), 1);
    }

    #[tokio::test]
    async fn test_place_order_rejected_when_inactive() {
        let f = open_session();
        f.state.executor.session().set_active(false);
        let app = orders_router().with_state(Arc::clone(&f.state));

        let response = app.oneshot(order_request("SBIN")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.message, "Trading not active");
        assert!(f.broker.orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_place_order_rejected_outside_window() {
        let f = open_session();
        f.clock.set_time(NaiveTime::from_hms_opt(15, 0, 1).unwrap());
        let app = orders_router().with_state(Arc::clone(&f.state));

        let response = app.oneshot(order_request("SBIN")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.message, "Outside trading hours");
    }

    #[tokio::test]
    async fn test_eleventh_order_rejected() {
        let f = open_session();
        let app = orders_router().with_state(Arc::clone(&f.state));

        for i in 0..10 {
            let response = app
                .clone()
                .oneshot(order_request(&format!("SYM{}", i)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.oneshot(order_request("SBIN")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.message, "Max trades reached");
        assert_eq!(f.broker.orders().await.len(), 10);
    }

    #[tokio::test]
    async fn test_broker_failure_maps_to_bad_gateway() {
        let f = open_session();
        f.broker.fail_orders(true).await;
        let app = orders_router().with_state(Arc::clone(&f.state));

        let response = app.oneshot(order_request("SBIN")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error_body(response).await.code, "BROKER_ERROR");
        assert_eq!(f.state.executor.status().await.trade_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_broker_timeout_maps_to_gateway_timeout() {
        let f = open_session();
        f.broker.set_order_delay(Some(Duration::from_secs(60))).await;
        let app = orders_router().with_state(Arc::clone(&f.state));

        let response = app.oneshot(order_request("SBIN")).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(f.state.executor.status().await.trade_count, 0);
    }

    #[tokio::test]
    async fn test_invalid_quantity_is_bad_request() {
        let f = open_session();
        let app = orders_router().with_state(Arc::clone(&f.state));

        let body = serde_json::json!({
            "symbol": "SBIN",
            "exchange": "NSE",
            "side": "BUY",
            "quantity": "0"
        });
        let request = Request::builder()
            .method("POST")
            .uri("/place_order")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.code, "INVALID_ORDER");
    }

    #[tokio::test]
    async fn test_cancel_order() {
        let f = open_session();
        let app = orders_router().with_state(Arc::clone(&f.state));

        let response = app.clone().oneshot(order_request("SBIN")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/orders/SIM-000001")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(f.broker.orders().await[0].cancelled);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/orders/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // 취소는 거래 횟수를 되돌리지 않음
        assert_eq!(f.state.executor.status().await.trade_count, 1);
    }
}
