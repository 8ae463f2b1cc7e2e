//! 리스크 관리 시스템.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 거래 허용 검사 (차단 래치, 거래 시간대, 일일 손실 한도, 거래 횟수 상한)
//! - 실현 손익 추적 및 손실 한도 도달 시 거래 중단 신호
//! - 자본 이월을 포함한 일일 초기화
//!
//! # 예제
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trader_core::MarketClock;
//! use trader_risk::{RiskConfig, RiskManager, TradeDecision};
//!
//! let clock = Arc::new(MarketClock::from_name("Asia/Kolkata")?);
//! let mut manager = RiskManager::new(RiskConfig::default(), clock);
//!
//! if let TradeDecision::Rejected(reason) = manager.can_trade() {
//!     println!("rejected: {}", reason);
//! }
//! ```

pub mod config;
pub mod manager;
pub mod state;

// 주요 타입 재내보내기
pub use config::{ConfigValidationError, RiskConfig, TradingWindow};
pub use manager::{PnlSignal, RejectReason, RiskManager, RiskStatus, TradeDecision};
pub use state::RiskState;
