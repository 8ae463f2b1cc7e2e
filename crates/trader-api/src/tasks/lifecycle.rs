//! 일일 생명주기 백그라운드 태스크.
//!
//! `tick_interval_ms`마다 시계를 읽어 스케줄러가 돌려준 전환을 순서대로
//! 적용합니다. 처리 지연으로 놓친 틱은 건너뛰며, 놓친 전환은 다음 틱에서
//! 스케줄러가 따라잡습니다.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use trader_execution::{Transition, TransitionOutcome};

use crate::state::AppState;

/// 한 번의 틱을 처리합니다.
///
/// 현재 시각까지 도래한 전환을 적용하고 그 결과를 반환합니다.
pub async fn run_lifecycle_tick(state: &AppState) -> Vec<(Transition, TransitionOutcome)> {
    let now = state.clock.now();
    let due = state.scheduler.lock().await.due(now);

    let mut applied = Vec::with_capacity(due.len());
    for scheduled in due {
        if scheduled.date != now.date() {
            warn!(
                transition = %scheduled.transition,
                scheduled_at = %scheduled.at,
                "Applying overdue transition from an earlier date"
            );
        }

        let outcome = state.controller.apply(scheduled.transition).await;
        info!(
            transition = %scheduled.transition,
            scheduled_at = %scheduled.at,
            outcome = ?outcome,
            "Scheduled transition completed"
        );
        applied.push((scheduled.transition, outcome));
    }

    applied
}

/// 생명주기 태스크 시작.
///
/// 종료 토큰이 취소되면 진행 중인 틱을 마친 뒤 종료합니다.
pub fn start_lifecycle_task(
    state: Arc<AppState>,
    shutdown_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (tick_interval, next) = {
            let scheduler = state.scheduler.lock().await;
            (scheduler.config().tick_interval(), scheduler.next_transition())
        };

        info!(
            tick_ms = tick_interval.as_millis() as u64,
            next_transition = %next.transition,
            next_at = %next.at,
            "Lifecycle task started"
        );

        let mut ticker = interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let applied = run_lifecycle_tick(&state).await;
                    if !applied.is_empty() {
                        debug!(count = applied.len(), "Transitions applied on tick");
                    }
                }
                _ = shutdown_token.cancelled() => {
                    info!("Lifecycle task received shutdown signal");
                    break;
                }
            }
        }

        info!("Lifecycle task stopped");
    })
}
