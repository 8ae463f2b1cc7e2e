//! 리스크 게이트 거래 컨트롤러의 HTTP 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (상태 조회, 주문, 청산, 손익 피드)
//! - 일일 생명주기 백그라운드 태스크
//! - 설정에서 브로커와 공유 상태를 조립하는 부트스트랩
//!
//! # 모듈 구성
//!
//! - [`config`]: 애플리케이션 설정 (AppConfig)
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`tasks`]: 백그라운드 태스크
//! - [`bootstrap`]: 브로커 선택과 라우터 조립

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod tasks;

pub use bootstrap::{build_broker, build_router, build_state, BootstrapError};
pub use config::{AppConfig, BrokerKind, BrokerSettings};
pub use error::{ApiErrorResponse, ApiResult};
pub use routes::*;
pub use state::AppState;
pub use tasks::{run_lifecycle_tick, start_lifecycle_task};

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
