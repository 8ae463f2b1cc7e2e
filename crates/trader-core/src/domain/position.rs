//! 브로커가 보고하는 오픈 포지션.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Side;

/// 심볼의 보유량을 나타내는 포지션.
///
/// 순수량(`quantity`)은 부호를 가집니다. 양수는 롱, 음수는 숏입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// 종목 심볼
    #[serde(alias = "tradingSymbol")]
    pub symbol: String,
    /// 거래소
    #[serde(alias = "exchangeSegment")]
    pub exchange: String,
    /// 순수량 (롱 > 0, 숏 < 0)
    #[serde(default, alias = "netQty")]
    pub quantity: Decimal,
}

impl Position {
    /// 새 포지션을 생성합니다.
    pub fn new(symbol: impl Into<String>, exchange: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            exchange: exchange.into(),
            quantity,
        }
    }

    /// 포지션 방향. 수량이 0이면 `None`.
    pub fn side(&self) -> Option<Side> {
        if self.quantity > Decimal::ZERO {
            Some(Side::Buy)
        } else if self.quantity < Decimal::ZERO {
            Some(Side::Sell)
        } else {
            None
        }
    }

    /// 청산할 수량이 남아있는지 확인합니다.
    pub fn is_open(&self) -> bool {
        !self.quantity.is_zero()
    }

    /// 포지션을 닫기 위한 주문 방향 (롱은 매도, 숏은 매수).
    pub fn exit_side(&self) -> Side {
        self.side().map(|s| s.opposite()).unwrap_or(Side::Sell)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} ({})", self.exchange, self.symbol, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exit_side_follows_direction() {
        let long = Position::new("SBIN", "NSE", dec!(100));
        assert_eq!(long.side(), Some(Side::Buy));
        assert_eq!(long.exit_side(), Side::Sell);

        let short = Position::new("SBIN", "NSE", dec!(-50));
        assert_eq!(short.side(), Some(Side::Sell));
        assert_eq!(short.exit_side(), Side::Buy);

        let flat = Position::new("SBIN", "NSE", dec!(0));
        assert!(!flat.is_open());
        assert_eq!(flat.side(), None);
    }

    #[test]
    fn test_position_broker_aliases() {
        let json = r#"{"tradingSymbol":"HDFCBANK","exchangeSegment":"NSE_EQ","netQty":-25}"#;
        let position: Position = serde_json::from_str(json).unwrap();

        assert_eq!(position.symbol, "HDFCBANK");
        assert_eq!(position.exchange, "NSE_EQ");
        assert_eq!(position.quantity, dec!(-25));
    }
}
