//! 애플리케이션 설정.
//!
//! `config/default.toml`(선택)과 `TRADER__` 접두사 환경 변수에서 로드합니다.
//!
//! ```toml
//! [server]
//! port = 10000
//!
//! [risk]
//! initial_capital = "100000"
//! max_trades = 10
//!
//! [broker]
//! kind = "paper"
//! ```
//!
//! 브로커 access token은 설정 파일이 아닌 `DHAN_ACCESS_TOKEN` 환경 변수로만 받습니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use trader_core::{load_layered, LoggingConfig, ServerConfig};
use trader_execution::{ExecutorConfig, ScheduleConfig};
use trader_risk::{ConfigValidationError, RiskConfig};

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 브로커 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    /// 메모리 내 페이퍼 브로커
    #[default]
    Paper,
    /// Dhan REST API
    Dhan,
}

impl std::fmt::Display for BrokerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrokerKind::Paper => write!(f, "paper"),
            BrokerKind::Dhan => write!(f, "dhan"),
        }
    }
}

/// 브로커 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerSettings {
    /// 브로커 종류
    #[serde(default)]
    pub kind: BrokerKind,
    /// API 기본 URL (없으면 `DHAN_API_URL` 또는 기본 URL)
    #[serde(default)]
    pub base_url: Option<String>,
    /// 브로커 호출 타임아웃 (초)
    #[serde(default = "default_broker_timeout_secs")]
    pub timeout_secs: u64,
    /// 페이퍼 브로커 초기 잔고
    #[serde(default)]
    pub paper_balance: Option<Decimal>,
}

fn default_broker_timeout_secs() -> u64 {
    10
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            kind: BrokerKind::default(),
            base_url: None,
            timeout_secs: default_broker_timeout_secs(),
            paper_balance: None,
        }
    }
}

/// 전체 애플리케이션 설정.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub broker: BrokerSettings,
}

impl AppConfig {
    /// 설정 파일과 환경 변수에서 로드합니다.
    ///
    /// `TRADER_CONFIG` 환경 변수로 설정 파일 경로를 바꿀 수 있습니다.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let path = std::env::var("TRADER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from(Path::new(&path))
    }

    /// 지정한 파일(없으면 건너뜀)과 환경 변수에서 로드합니다.
    pub fn load_from(path: &Path) -> Result<Self, ::config::ConfigError> {
        load_layered(Some(path))
    }

    /// 설정 검증.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.risk.validate()?;
        self.schedule.validate()?;

        if self.broker.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "broker.timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(balance) = self.broker.paper_balance {
            if balance < Decimal::ZERO {
                return Err(ConfigValidationError::InvalidValue(
                    "broker.paper_balance must not be negative".into(),
                ));
            }
        }

        Ok(())
    }

    /// 주문 executor 설정.
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            broker_timeout: Duration::from_secs(self.broker.timeout_secs),
            liquidate_on_loss_limit: self.risk.liquidate_on_loss_limit,
        }
    }
}
