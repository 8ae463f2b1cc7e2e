//! 주문 실행 및 일일 생명주기.
//!
//! 이 crate는 다음을 제공합니다:
//! - 리스크 허용 검사를 거쳐 브로커로 주문을 전달하는 executor
//! - 프로세스 단위 거래 세션 (`trading_active` 플래그와 생명주기 단계)
//! - 시장 현지 시각 기준 일일 스케줄러
//! - 스케줄된 전환을 동작으로 연결하는 생명주기 컨트롤러
//!
//! # 예제
//!
//! ```rust,ignore
//! use trader_execution::{DailyScheduler, LifecycleController, OrderExecutor};
//!
//! let controller = LifecycleController::new(executor.clone());
//! for due in scheduler.due(clock.now()) {
//!     controller.apply(due.transition).await;
//! }
//! ```

pub mod executor;
pub mod lifecycle;
pub mod scheduler;
pub mod session;

// 주요 타입 재내보내기
pub use executor::{
    ExecutionError, ExecutorConfig, ExitFailure, LiquidationReport, OrderExecutor, OrderOutcome,
    OrderReceipt, OrderRejection, PnlUpdate,
};
pub use lifecycle::{LifecycleController, TransitionOutcome};
pub use scheduler::{DailyScheduler, LifecyclePhase, ScheduleConfig, ScheduledTransition, Transition};
pub use session::TradingSession;
