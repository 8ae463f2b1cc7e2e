//! 리스크 관리 설정.
//!
//! 일일 손실 한도, 거래 횟수 상한, 거래 가능 시간대를 정의합니다.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// 거래 가능 시간대 (양 끝 포함).
///
/// `start > end`이면 자정을 넘어가는 구간으로 해석합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindow {
    /// 시작 시각
    pub start: NaiveTime,
    /// 종료 시각
    pub end: NaiveTime,
}

impl TradingWindow {
    /// 새 거래 시간대를 생성합니다.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// 주어진 시각이 거래 시간대 안에 있는지 확인합니다.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time <= self.end
        } else {
            time >= self.start || time <= self.end
        }
    }

    /// 자정을 넘어가는 구간인지 확인합니다.
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }
}

impl Default for TradingWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 25, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(15, 0, 0).unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for TradingWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%H:%M:%S"),
            self.end.format("%H:%M:%S")
        )
    }
}

/// 리스크 관리 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// 프로세스 시작 시 자본금 (기본값: 100,000)
    #[serde(default = "default_initial_capital")]
    pub initial_capital: Decimal,

    /// 하루 최대 거래 횟수 (기본값: 10)
    #[serde(default = "default_max_trades")]
    pub max_trades: u32,

    /// 당일 시작 자본 대비 최대 손실 비율 (기본값: 0.20)
    /// 이 한도에 도달하면 다음 일일 초기화까지 거래가 차단됩니다
    #[serde(default = "default_loss_fraction")]
    pub loss_fraction: Decimal,

    /// 거래 가능 시간대 (기본값: 09:25:00 - 15:00:00)
    #[serde(default)]
    pub trading_window: TradingWindow,

    /// 관리자 거래 활성화 플래그 (기본값: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 손실 한도 도달 시 전체 포지션 청산 여부 (기본값: false)
    #[serde(default)]
    pub liquidate_on_loss_limit: bool,
}

fn default_initial_capital() -> Decimal {
    dec!(100000)
}

fn default_max_trades() -> u32 {
    10
}

fn default_loss_fraction() -> Decimal {
    dec!(0.20)
}

fn default_true() -> bool {
    true
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            initial_capital: default_initial_capital(),
            max_trades: default_max_trades(),
            loss_fraction: default_loss_fraction(),
            trading_window: TradingWindow::default(),
            enabled: true,
            liquidate_on_loss_limit: false,
        }
    }
}

impl RiskConfig {
    /// 기본값으로 새 RiskConfig를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 시작 자본금을 지정합니다.
    pub fn with_initial_capital(mut self, capital: Decimal) -> Self {
        self.initial_capital = capital;
        self
    }

    /// 하루 최대 거래 횟수를 지정합니다.
    pub fn with_max_trades(mut self, max_trades: u32) -> Self {
        self.max_trades = max_trades;
        self
    }

    /// 최대 손실 비율을 지정합니다.
    pub fn with_loss_fraction(mut self, fraction: Decimal) -> Self {
        self.loss_fraction = fraction;
        self
    }

    /// 거래 시간대를 지정합니다.
    pub fn with_trading_window(mut self, window: TradingWindow) -> Self {
        self.trading_window = window;
        self
    }

    /// 주어진 자본금에 대한 최대 일일 손실 금액.
    pub fn max_daily_loss_for(&self, capital: Decimal) -> Decimal {
        capital * self.loss_fraction
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigValidationError::InvalidValue(
                "initial_capital must be greater than 0".into(),
            ));
        }

        if self.max_trades == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "max_trades must be at least 1".into(),
            ));
        }

        if self.loss_fraction <= Decimal::ZERO || self.loss_fraction > Decimal::ONE {
            return Err(ConfigValidationError::InvalidValue(
                "loss_fraction must be in (0, 1]".into(),
            ));
        }

        if self.trading_window.start == self.trading_window.end {
            return Err(ConfigValidationError::InvalidValue(
                "trading_window start and end must differ".into(),
            ));
        }

        Ok(())
    }
}

/// 설정 검증 오류.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
