//! 도메인 모델.
//!
//! - 주문 요청 (`order`)
//! - 브로커 포지션 (`position`)

pub mod order;
pub mod position;

pub use order::*;
pub use position::*;
