//! 트레이딩 시스템의 에러 타입.
//!
//! 리스크 규칙 위반은 에러가 아니라 값(`TradeDecision`)으로 반환되므로
//! 이 모듈에는 포함되지 않습니다.

use thiserror::Error;

/// 핵심 트레이딩 에러.
#[derive(Debug, Error)]
pub enum TraderError {
    /// 설정 에러 (시간대 이름 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 트레이딩 작업을 위한 Result 타입.
pub type TraderResult<T> = Result<T, TraderError>;
