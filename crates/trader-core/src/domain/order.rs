//! 주문 요청 타입.
//!
//! 브로커로 전달되는 주문 관련 타입을 정의합니다:
//! - `Side` - 주문 방향 (매수/매도)
//! - `OrderType` - 주문 유형 (시장가, 지정가)
//! - `OrderRequest` - 주문 요청

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{TraderError, TraderResult};

/// 주문 방향 (매수 또는 매도).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// 매수
    #[serde(alias = "buy")]
    Buy,
    /// 매도
    #[serde(alias = "sell")]
    Sell,
}

impl Side {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// 주문 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// 시장가 주문
    #[default]
    #[serde(alias = "market")]
    Market,
    /// 지정가 주문
    #[serde(alias = "limit")]
    Limit,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
        }
    }
}

/// 신규 주문 요청.
///
/// HTTP 경계에서 역직렬화되어 리스크 검사를 거친 뒤 브로커로 전달됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    /// 종목 심볼
    pub symbol: String,
    /// 거래소 (예: "NSE", "BSE")
    pub exchange: String,
    /// 주문 방향
    #[serde(alias = "transactionType")]
    pub side: Side,
    /// 주문 수량
    pub quantity: Decimal,
    /// 주문 유형
    #[serde(default)]
    pub order_type: OrderType,
    /// 지정가 (지정가 주문에만 사용)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl OrderRequest {
    /// 시장가 매수 주문 생성.
    pub fn market_buy(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: exchange.into(),
            side: Side::Buy,
            quantity,
            order_type: OrderType::Market,
            price: None,
        }
    }

    /// 시장가 매도 주문 생성.
    pub fn market_sell(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            side: Side::Sell,
            ..Self::market_buy(symbol, exchange, quantity)
        }
    }

    /// 지정가 주문 생성.
    pub fn limit(
        symbol: impl Into<String>,
        exchange: impl Into<String>,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: exchange.into(),
            side,
            quantity,
            order_type: OrderType::Limit,
            price: Some(price),
        }
    }

    /// 주문 요청의 형식 검증.
    pub fn validate(&self) -> TraderResult<()> {
        if self.symbol.trim().is_empty() {
            return Err(TraderError::InvalidInput("symbol is required".into()));
        }
        if self.exchange.trim().is_empty() {
            return Err(TraderError::InvalidInput("exchange is required".into()));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(TraderError::InvalidInput(format!(
                "quantity must be positive: {}",
                self.quantity
            )));
        }
        match (self.order_type, self.price) {
            (OrderType::Limit, None) => Err(TraderError::InvalidInput(
                "limit order requires a price".into(),
            )),
            (OrderType::Limit, Some(price)) if price <= Decimal::ZERO => Err(
                TraderError::InvalidInput(format!("price must be positive: {}", price)),
            ),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_order_request_validation() {
        assert!(OrderRequest::market_buy("RELIANCE", "NSE", dec!(10))
            .validate()
            .is_ok());

        let empty_symbol = OrderRequest::market_buy("", "NSE", dec!(10));
        assert!(empty_symbol.validate().is_err());

        let zero_qty = OrderRequest::market_sell("RELIANCE", "NSE", dec!(0));
        assert!(zero_qty.validate().is_err());

        let mut limit = OrderRequest::limit("TCS", "NSE", Side::Buy, dec!(1), dec!(3500));
        assert!(limit.validate().is_ok());
        limit.price = None;
        assert!(limit.validate().is_err());
    }

    #[test]
    fn test_order_request_deserialize() {
        let json = r#"{"symbol":"INFY","exchange":"NSE","transactionType":"buy","quantity":"5"}"#;
        let order: OrderRequest = serde_json::from_str(json).unwrap();

        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.quantity, dec!(5));
        assert_eq!(order.order_type, OrderType::Market);
        assert!(order.price.is_none());
    }
}
