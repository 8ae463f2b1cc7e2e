//! # Trader Core
//!
//! 트레이딩 컨트롤러 전반에서 사용하는 기본 타입을 제공합니다:
//! - 주문 요청 및 브로커 포지션
//! - 시장 현지 시각을 제공하는 시계 추상화
//! - 설정 로딩
//! - 로깅 인프라

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use clock::{Clock, ManualClock, MarketClock};
pub use config::{load_layered, LoggingConfig, ServerConfig};
pub use domain::*;
pub use error::*;
pub use logging::{init_logging, LogConfig, LogFormat};
