//! 백그라운드 태스크 모듈.
//!
//! - 생명주기: 시장 현지 시각에 맞춰 일일 초기화, 장 시작, 강제 청산, 장 마감 실행

pub mod lifecycle;

pub use lifecycle::{run_lifecycle_tick, start_lifecycle_task};
