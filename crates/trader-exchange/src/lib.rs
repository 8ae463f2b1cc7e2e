//! 브로커 연동 계층.
//!
//! 주문 경계에서 사용하는 `Broker` trait과 구현체를 제공합니다:
//! - `DhanClient` - Dhan REST API
//! - `SimulatedBroker` - 인메모리 페이퍼 트레이딩

pub mod dhan;
pub mod error;
pub mod simulated;
pub mod traits;

pub use dhan::{DhanClient, DhanConfig, DHAN_API_URL};
pub use error::ExchangeError;
pub use simulated::{SimulatedBroker, SimulatedOrder};
pub use traits::{Broker, ExchangeResult, MarginInfo};
