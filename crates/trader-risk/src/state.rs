//! 일일 리스크 상태.
//!
//! `RiskState`는 `RiskManager`가 단독으로 소유하며 외부에서는 읽기 전용
//! 참조로만 노출됩니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{RiskConfig, TradingWindow};

/// 자본, 당일 손익, 거래 횟수, 차단 래치.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    /// 마지막 일일 초기화 시점의 자본금
    pub initial_capital: Decimal,
    /// `initial_capital` + 당일 누적 손익
    pub current_capital: Decimal,
    /// 당일 손익 (부호 있음)
    pub daily_pnl: Decimal,
    /// 당일 체결된 거래 수
    pub trade_count: u32,
    /// 하루 최대 거래 횟수
    pub max_trades: u32,
    /// `initial_capital × loss_fraction`
    pub max_daily_loss: Decimal,
    /// 규칙 위반 래치. 일일 초기화에서만 해제됩니다.
    pub blocked: bool,
    /// 거래 가능 시간대
    pub trading_window: TradingWindow,
}

impl RiskState {
    /// 설정으로부터 초기 상태를 생성합니다.
    pub fn from_config(config: &RiskConfig) -> Self {
        Self {
            initial_capital: config.initial_capital,
            current_capital: config.initial_capital,
            daily_pnl: Decimal::ZERO,
            trade_count: 0,
            max_trades: config.max_trades,
            max_daily_loss: config.max_daily_loss_for(config.initial_capital),
            blocked: false,
            trading_window: config.trading_window,
        }
    }

    /// 당일 손익이 손실 한도에 도달했는지 확인합니다.
    pub fn loss_limit_breached(&self) -> bool {
        self.daily_pnl <= -self.max_daily_loss
    }

    /// 거래 횟수 상한에 도달했는지 확인합니다.
    pub fn trade_limit_reached(&self) -> bool {
        self.trade_count >= self.max_trades
    }

    /// 당일 시작 자본 대비 손실 비율 (%). 이익이거나 자본이 0이면 0.
    pub fn loss_percentage(&self) -> Decimal {
        if self.daily_pnl < Decimal::ZERO && !self.initial_capital.is_zero() {
            (self.daily_pnl.abs() / self.initial_capital * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_config() {
        let state = RiskState::from_config(&RiskConfig::default());

        assert_eq!(state.initial_capital, dec!(100000));
        assert_eq!(state.current_capital, dec!(100000));
        assert_eq!(state.max_daily_loss, dec!(20000));
        assert_eq!(state.trade_count, 0);
        assert!(!state.blocked);
    }

    #[test]
    fn test_loss_percentage() {
        let mut state = RiskState::from_config(&RiskConfig::default());
        assert_eq!(state.loss_percentage(), Decimal::ZERO);

        state.daily_pnl = dec!(-12346);
        assert_eq!(state.loss_percentage(), dec!(12.35));

        state.daily_pnl = dec!(5000);
        assert_eq!(state.loss_percentage(), Decimal::ZERO);

        state.daily_pnl = dec!(-100);
        state.initial_capital = Decimal::ZERO;
        assert_eq!(state.loss_percentage(), Decimal::ZERO);
    }

    #[test]
    fn test_limit_predicates() {
        let mut state = RiskState::from_config(&RiskConfig::default());

        state.daily_pnl = dec!(-19999.99);
        assert!(!state.loss_limit_breached());
        state.daily_pnl = dec!(-20000);
        assert!(state.loss_limit_breached());

        state.trade_count = 9;
        assert!(!state.trade_limit_reached());
        state.trade_count = 10;
        assert!(state.trade_limit_reached());
    }
}
