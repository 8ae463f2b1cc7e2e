//! Dhan REST API 클라이언트.
//!
//! # 지원 기능
//!
//! - 증거금 조회 (`GET /margins`)
//! - 주문 제출 (`POST /orders`)
//! - 주문 취소 (`DELETE /orders/{id}`)
//! - 포지션 조회 (`GET /positions`)
//! - 포지션 청산 (`DELETE /positions`)
//!
//! 모든 요청은 `access-token` 헤더로 인증합니다.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};
use trader_core::{OrderRequest, OrderType, Position, Side};

use crate::traits::{Broker, ExchangeResult, MarginInfo};
use crate::ExchangeError;

/// Dhan API 기본 URL.
pub const DHAN_API_URL: &str = "https://api.dhan.co";

/// Dhan API 설정.
#[derive(Debug)]
pub struct DhanConfig {
    /// REST 기본 URL
    pub base_url: String,
    /// 클라이언트 ID (주문 본문에 포함)
    pub client_id: Option<String>,
    /// 액세스 토큰
    pub access_token: SecretString,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl DhanConfig {
    /// 액세스 토큰으로 설정 생성.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DHAN_API_URL.to_string(),
            client_id: None,
            access_token: SecretString::new(access_token.into().into_boxed_str()),
            timeout_secs: 10,
        }
    }

    /// 기본 URL 설정.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 클라이언트 ID 설정.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// 요청 타임아웃 설정.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// 환경 변수에서 설정 생성.
    ///
    /// # 환경 변수
    /// - `DHAN_ACCESS_TOKEN` (필수)
    /// - `DHAN_CLIENT_ID`
    /// - `DHAN_API_URL`
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("DHAN_ACCESS_TOKEN").ok()?;
        let mut config = Self::new(token);

        if let Ok(client_id) = std::env::var("DHAN_CLIENT_ID") {
            config = config.with_client_id(client_id);
        }
        if let Ok(url) = std::env::var("DHAN_API_URL") {
            config = config.with_base_url(url);
        }

        Some(config)
    }
}

/// 주문 제출 요청 본문.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    dhan_client_id: Option<&'a str>,
    transaction_type: Side,
    exchange_segment: &'a str,
    trading_symbol: &'a str,
    quantity: Decimal,
    order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<Decimal>,
}

/// 주문 제출 응답.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderResponse {
    order_id: Option<String>,
    #[serde(default)]
    order_status: Option<String>,
}

/// 포지션 청산 요청 본문.
#[derive(Debug, Serialize)]
struct ExitPositionBody<'a> {
    symbol: &'a str,
    exchange: &'a str,
    transaction_type: Side,
}

/// Dhan REST API 클라이언트.
pub struct DhanClient {
    config: DhanConfig,
    client: Client,
}

impl DhanClient {
    /// 새 클라이언트 생성.
    pub fn new(config: DhanConfig) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(base_url = %config.base_url, "Dhan client created");

        Ok(Self { config, client })
    }

    /// 설정 참조 반환.
    pub fn config(&self) -> &DhanConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        self.client
            .request(method, url)
            .header("access-token", self.config.access_token.expose_secret())
            .header("Accept", "application/json")
    }

    /// 요청을 보내고 성공 응답 본문을 반환합니다.
    async fn send(&self, builder: RequestBuilder, what: &str) -> ExchangeResult<String> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ExchangeError::Timeout(e.to_string())
            } else {
                ExchangeError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Dhan {} failed: {} - {}", what, status, body);
            return Err(ExchangeError::from_status(status.as_u16(), body));
        }

        debug!("Dhan {} response: {}", what, body);
        Ok(body)
    }
}

#[async_trait]
impl Broker for DhanClient {
    fn name(&self) -> &str {
        "dhan"
    }

    async fn get_margin(&self) -> ExchangeResult<MarginInfo> {
        let body = self
            .send(self.request(Method::GET, "/margins"), "margin inquiry")
            .await?;

        serde_json::from_str(&body)
            .map_err(|e| ExchangeError::ParseError(format!("Failed to parse margin response: {}", e)))
    }

    async fn place_order(&self, request: &OrderRequest) -> ExchangeResult<String> {
        let payload = PlaceOrderBody {
            dhan_client_id: self.config.client_id.as_deref(),
            transaction_type: request.side,
            exchange_segment: &request.exchange,
            trading_symbol: &request.symbol,
            quantity: request.quantity,
            order_type: request.order_type,
            price: request.price,
        };

        let body = self
            .send(
                self.request(Method::POST, "/orders").json(&payload),
                "order placement",
            )
            .await?;

        let resp: PlaceOrderResponse = serde_json::from_str(&body)
            .map_err(|e| ExchangeError::ParseError(format!("Failed to parse order response: {}", e)))?;

        if resp
            .order_status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("REJECTED"))
        {
            return Err(ExchangeError::OrderRejected(body));
        }

        let order_id = resp
            .order_id
            .ok_or_else(|| ExchangeError::ParseError("order response missing orderId".into()))?;

        info!(
            order_id = %order_id,
            symbol = %request.symbol,
            side = %request.side,
            quantity = %request.quantity,
            "Dhan order placed"
        );

        Ok(order_id)
    }

    async fn cancel_order(&self, order_id: &str) -> ExchangeResult<()> {
        self.send(
            self.request(Method::DELETE, &format!("/orders/{}", order_id)),
            "order cancel",
        )
        .await?;

        info!(order_id = %order_id, "Dhan order cancelled");
        Ok(())
    }

    async fn get_positions(&self) -> ExchangeResult<Vec<Position>> {
        let body = self
            .send(self.request(Method::GET, "/positions"), "position inquiry")
            .await?;

        serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse positions response: {}", e))
        })
    }

    async fn exit_position(&self, position: &Position) -> ExchangeResult<()> {
        let payload = ExitPositionBody {
            symbol: &position.symbol,
            exchange: &position.exchange,
            transaction_type: position.exit_side(),
        };

        self.send(
            self.request(Method::DELETE, "/positions").json(&payload),
            "position exit",
        )
        .await?;

        info!(position = %position, side = %payload.transaction_type, "Dhan position exit requested");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use rust_decimal_macros::dec;
    use serde_json::json;

    async fn client_for(server: &mockito::ServerGuard) -> DhanClient {
        let config = DhanConfig::new("test-token")
            .with_base_url(server.url())
            .with_client_id("1000001");
        DhanClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_get_margin() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/margins")
            .match_header("access-token", "test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"availabelBalance": 98440.0, "utilizedAmount": 1560.0, "withdrawableBalance": 98000.0}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let margin = client.get_margin().await.unwrap();

        assert_eq!(margin.available_balance, dec!(98440));
        assert_eq!(margin.utilized_amount, dec!(1560));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_place_order_returns_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/orders")
            .match_header("access-token", "test-token")
            .match_body(Matcher::PartialJson(json!({
                "dhanClientId": "1000001",
                "transactionType": "BUY",
                "exchangeSegment": "NSE",
                "tradingSymbol": "SBIN",
                "orderType": "MARKET"
            })))
            .with_status(200)
            .with_body(r#"{"orderId": "112111182198", "orderStatus": "PENDING"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let order = OrderRequest::market_buy("SBIN", "NSE", dec!(10));
        let order_id = client.place_order(&order).await.unwrap();

        assert_eq!(order_id, "112111182198");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_place_order_rejected_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/orders")
            .with_status(200)
            .with_body(r#"{"orderId": "1", "orderStatus": "REJECTED"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        let result = client
            .place_order(&OrderRequest::market_sell("SBIN", "NSE", dec!(1)))
            .await;

        assert!(matches!(result, Err(ExchangeError::OrderRejected(_))));
    }

    #[tokio::test]
    async fn test_http_error_mapped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/positions")
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;
        server
            .mock("GET", "/margins")
            .with_status(401)
            .with_body("invalid token")
            .create_async()
            .await;

        let client = client_for(&server).await;

        match client.get_positions().await {
            Err(ExchangeError::ApiError { code, message }) => {
                assert_eq!(code, 500);
                assert_eq!(message, "internal");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(client.get_margin().await.unwrap_err().is_auth_error());
    }

    #[tokio::test]
    async fn test_get_positions_parses_broker_fields() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/positions")
            .with_status(200)
            .with_body(
                r#"[
                    {"tradingSymbol": "SBIN", "exchangeSegment": "NSE_EQ", "netQty": 25},
                    {"tradingSymbol": "TCS", "exchangeSegment": "NSE_EQ", "netQty": -5}
                ]"#,
            )
            .create_async()
            .await;

        let client = client_for(&server).await;
        let positions = client.get_positions().await.unwrap();

        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0], Position::new("SBIN", "NSE_EQ", dec!(25)));
        assert_eq!(positions[1].exit_side(), Side::Buy);
    }

    #[tokio::test]
    async fn test_exit_position_uses_opposite_side() {
        let mut server = mockito::Server::new_async().await;
        let long_exit = server
            .mock("DELETE", "/positions")
            .match_body(Matcher::Json(json!({
                "symbol": "SBIN",
                "exchange": "NSE",
                "transaction_type": "SELL"
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let short_exit = server
            .mock("DELETE", "/positions")
            .match_body(Matcher::Json(json!({
                "symbol": "TCS",
                "exchange": "NSE",
                "transaction_type": "BUY"
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&server).await;
        client
            .exit_position(&Position::new("SBIN", "NSE", dec!(10)))
            .await
            .unwrap();
        client
            .exit_position(&Position::new("TCS", "NSE", dec!(-3)))
            .await
            .unwrap();

        long_exit.assert_async().await;
        short_exit.assert_async().await;
    }

    #[tokio::test]
    async fn test_cancel_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/orders/42")
            .match_header("access-token", "test-token")
            .with_status(202)
            .with_body(r#"{"orderId": "42", "orderStatus": "CANCELLED"}"#)
            .create_async()
            .await;

        let client = client_for(&server).await;
        client.cancel_order("42").await.unwrap();
        mock.assert_async().await;
    }
}
