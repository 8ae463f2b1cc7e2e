//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 요청 핸들러와 백그라운드 생명주기 태스크가
//! 같은 executor, 스케줄러, 시계를 공유합니다.

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use trader_core::Clock;
use trader_exchange::Broker;
use trader_execution::{
    DailyScheduler, ExecutorConfig, LifecycleController, OrderExecutor, ScheduleConfig,
    TradingSession,
};
use trader_risk::{RiskConfig, RiskManager};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 주문 실행기 - 허용 검사, 손익 반영, 청산
    pub executor: Arc<OrderExecutor>,

    /// 생명주기 컨트롤러 - 스케줄된 전환 적용
    pub controller: Arc<LifecycleController>,

    /// 일일 스케줄러 - 백그라운드 태스크가 매 틱마다 갱신
    pub scheduler: Arc<Mutex<DailyScheduler>>,

    /// 시장 현지 시계
    pub clock: Arc<dyn Clock>,

    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 구성 요소를 조립해 AppState를 생성합니다.
    ///
    /// 세션은 비활성 상태로 시작하며, 스케줄러는 현재 시각 이후의 전환만
    /// 실행합니다.
    pub fn new(
        broker: Arc<dyn Broker>,
        risk_config: RiskConfig,
        schedule_config: ScheduleConfig,
        executor_config: ExecutorConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let risk_manager = RiskManager::new(risk_config, Arc::clone(&clock));
        let executor = Arc::new(OrderExecutor::new(
            broker,
            Arc::new(RwLock::new(risk_manager)),
            Arc::new(TradingSession::new()),
            executor_config,
        ));
        let scheduler = DailyScheduler::new(schedule_config, clock.now());

        Self {
            controller: Arc::new(LifecycleController::new(Arc::clone(&executor))),
            executor,
            scheduler: Arc::new(Mutex::new(scheduler)),
            clock,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 가동 시간 (초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

/// 테스트용 AppState 생성.
///
/// 페이퍼 브로커와 수동 시계를 사용합니다. 반환된 시계와 브로커는
/// 상태와 내부를 공유하므로 테스트에서 시간을 옮기거나 실패를 주입할 수 있습니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state(
    clock: trader_core::ManualClock,
    broker: trader_exchange::SimulatedBroker,
) -> AppState {
    AppState::new(
        Arc::new(broker),
        RiskConfig::default(),
        ScheduleConfig::default(),
        ExecutorConfig::default(),
        Arc::new(clock),
    )
}
