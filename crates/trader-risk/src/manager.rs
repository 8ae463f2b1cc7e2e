//! 리스크 매니저 구현.
//!
//! 신규 거래 허용 여부의 단일 결정 주체입니다:
//! - 차단 래치 / 거래 시간대 / 일일 손실 한도 / 거래 횟수 상한 순서의 허용 검사
//! - 실현 손익 반영 및 손실 한도 도달 시 차단
//! - 일일 초기화 (자본 이월)
//!
//! 규칙 위반은 에러가 아니라 `TradeDecision::Rejected` 값으로 반환됩니다.
//! 동시 접근 직렬화는 호출자가 하나의 락으로 감싸서 보장합니다.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trader_core::Clock;

use crate::config::{RiskConfig, TradingWindow};
use crate::state::RiskState;

/// 거래 거부 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// 이전 규칙 위반으로 차단됨
    Blocked,
    /// 거래 시간대 밖
    OutsideTradingHours,
    /// 일일 손실 한도 도달
    DailyLossLimit,
    /// 거래 횟수 상한 도달
    MaxTradesReached,
}

impl RejectReason {
    /// 호출자에게 그대로 전달되는 사유 문자열.
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::Blocked => "Trading blocked due to rule violation",
            RejectReason::OutsideTradingHours => "Outside trading hours",
            RejectReason::DailyLossLimit => "Daily loss limit reached",
            RejectReason::MaxTradesReached => "Max trades reached",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// 허용 검사 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDecision {
    /// 거래 허용
    Allowed,
    /// 거래 거부
    Rejected(RejectReason),
}

impl TradeDecision {
    /// 허용 여부.
    pub fn is_allowed(&self) -> bool {
        matches!(self, TradeDecision::Allowed)
    }

    /// 거부 사유 (허용이면 None).
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            TradeDecision::Allowed => None,
            TradeDecision::Rejected(reason) => Some(*reason),
        }
    }

    /// "OK" 또는 거부 사유 문자열.
    pub fn message(&self) -> &'static str {
        match self {
            TradeDecision::Allowed => "OK",
            TradeDecision::Rejected(reason) => reason.message(),
        }
    }
}

/// 손익 반영 후 호출자에게 보내는 신호.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PnlSignal {
    /// 계속 거래
    Continue,
    /// 당일 신규 거래 중단 (필요시 청산)
    StopTrading,
}

/// 외부 모니터링용 읽기 전용 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskStatus {
    pub initial_capital: Decimal,
    pub current_capital: Decimal,
    pub daily_pnl: Decimal,
    pub trade_count: u32,
    pub max_trades: u32,
    pub max_daily_loss: Decimal,
    /// 관리자 플래그 AND NOT 차단
    pub trading_enabled: bool,
    pub blocked: bool,
    /// 당일 손실 비율 (%), 이익이면 0
    pub loss_percentage: Decimal,
    pub trading_window: TradingWindow,
    pub last_reset_date: Option<NaiveDate>,
}

/// 거래 허용 검사와 일일 노출 관리를 위한 리스크 매니저.
#[derive(Debug)]
pub struct RiskManager {
    /// 리스크 설정
    config: RiskConfig,
    /// 일일 상태
    state: RiskState,
    /// 관리자 거래 활성화 플래그
    enabled: bool,
    /// 마지막 일일 초기화 날짜
    last_reset: Option<NaiveDate>,
    /// 시장 현지 시계
    clock: Arc<dyn Clock>,
}

impl RiskManager {
    /// 설정과 시계로 새 리스크 매니저 생성.
    pub fn new(config: RiskConfig, clock: Arc<dyn Clock>) -> Self {
        let state = RiskState::from_config(&config);

        info!(
            initial_capital = %state.initial_capital,
            max_daily_loss = %state.max_daily_loss,
            max_trades = state.max_trades,
            window = %state.trading_window,
            "RiskManager initialized"
        );

        Self {
            enabled: config.enabled,
            config,
            state,
            last_reset: None,
            clock,
        }
    }

    /// 설정 참조 조회.
    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// 현재 상태 조회.
    pub fn state(&self) -> &RiskState {
        &self.state
    }

    /// 현재 시장 현지 시각.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// 관리자 거래 활성화 플래그.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// 관리자 거래 활성화 플래그를 변경합니다 (차단 래치와 무관).
    pub fn set_trading_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            info!(enabled, "Trading enabled flag changed");
        }
        self.enabled = enabled;
    }

    /// 신규 거래 허용 여부를 검사합니다.
    ///
    /// 검사 순서: 차단 래치 → 거래 시간대 → 일일 손실 한도 → 거래 횟수 상한.
    /// 손실 한도나 거래 횟수 상한에서 거부하면 차단 래치를 설정합니다.
    pub fn can_trade(&mut self) -> TradeDecision {
        if self.state.blocked {
            return TradeDecision::Rejected(RejectReason::Blocked);
        }

        let now = self.clock.time_of_day();
        if !self.state.trading_window.contains(now) {
            debug!(time = %now, window = %self.state.trading_window, "Outside trading hours");
            return TradeDecision::Rejected(RejectReason::OutsideTradingHours);
        }

        if self.state.loss_limit_breached() {
            self.block(RejectReason::DailyLossLimit);
            return TradeDecision::Rejected(RejectReason::DailyLossLimit);
        }

        if self.state.trade_limit_reached() {
            self.block(RejectReason::MaxTradesReached);
            return TradeDecision::Rejected(RejectReason::MaxTradesReached);
        }

        TradeDecision::Allowed
    }

    /// 실현 손익을 반영합니다.
    ///
    /// 반영 후 당일 손익이 `-max_daily_loss` 이하이면 차단하고
    /// `StopTrading`을 반환합니다.
    pub fn update_pnl(&mut self, delta: Decimal) -> PnlSignal {
        self.state.daily_pnl += delta;
        self.state.current_capital += delta;

        debug!(
            delta = %delta,
            daily_pnl = %self.state.daily_pnl,
            current_capital = %self.state.current_capital,
            "P&L updated"
        );

        if self.state.loss_limit_breached() {
            self.block(RejectReason::DailyLossLimit);
            return PnlSignal::StopTrading;
        }

        PnlSignal::Continue
    }

    /// 체결된 거래 1건을 기록합니다.
    ///
    /// 허용된 거래마다 정확히 한 번 호출되어야 합니다.
    pub fn record_trade(&mut self) {
        if self.state.trade_limit_reached() {
            warn!(
                trade_count = self.state.trade_count,
                max_trades = self.state.max_trades,
                "Trade recorded beyond daily ceiling without admission"
            );
        }

        self.state.trade_count = self.state.trade_count.saturating_add(1);

        if self.state.trade_limit_reached() {
            self.block(RejectReason::MaxTradesReached);
        }
    }

    /// 새 거래일을 위해 일일 카운터를 초기화하고 자본을 이월합니다.
    pub fn reset_for_new_day(&mut self) {
        let today = self.clock.today();
        if self.last_reset == Some(today) {
            warn!(date = %today, "Daily reset invoked more than once for the same day");
        }

        let previous = self.state.clone();

        self.state.daily_pnl = Decimal::ZERO;
        self.state.trade_count = 0;
        self.state.blocked = false;
        self.state.initial_capital = self.state.current_capital;
        self.state.max_daily_loss = self.config.max_daily_loss_for(self.state.initial_capital);
        self.last_reset = Some(today);

        info!(
            date = %today,
            previous_pnl = %previous.daily_pnl,
            previous_trades = previous.trade_count,
            initial_capital = %self.state.initial_capital,
            max_daily_loss = %self.state.max_daily_loss,
            "Daily risk reset completed"
        );
    }

    /// 현재 상태 스냅샷 (상태를 변경하지 않음).
    pub fn status(&self) -> RiskStatus {
        RiskStatus {
            initial_capital: self.state.initial_capital,
            current_capital: self.state.current_capital,
            daily_pnl: self.state.daily_pnl,
            trade_count: self.state.trade_count,
            max_trades: self.state.max_trades,
            max_daily_loss: self.state.max_daily_loss,
            trading_enabled: self.enabled && !self.state.blocked,
            blocked: self.state.blocked,
            loss_percentage: self.state.loss_percentage(),
            trading_window: self.state.trading_window,
            last_reset_date: self.last_reset,
        }
    }

    /// 마지막 일일 초기화 날짜.
    pub fn last_reset_date(&self) -> Option<NaiveDate> {
        self.last_reset
    }

    fn block(&mut self, reason: RejectReason) {
        if !self.state.blocked {
            warn!(
                reason = %reason,
                daily_pnl = %self.state.daily_pnl,
                max_daily_loss = %self.state.max_daily_loss,
                trade_count = self.state.trade_count,
                "Trading blocked until next daily reset"
            );
        }
        self.state.blocked = true;
    }
}
