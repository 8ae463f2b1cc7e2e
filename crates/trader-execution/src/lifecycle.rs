//! 스케줄된 전환을 실제 동작으로 연결합니다.
//!
//! | 전환 | 동작 |
//! |------|------|
//! | 장 전 점검 | 리스크 일일 초기화 |
//! | 장 시작 | 주문 접수 활성화 |
//! | 강제 청산 | 주문 접수 중단 후 전체 포지션 청산 |
//! | 장 마감 | 주문 접수 중단 |

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::executor::{LiquidationReport, OrderExecutor};
use crate::scheduler::{LifecyclePhase, Transition};

/// 전환 처리 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// 리스크 일일 초기화 완료
    DailyReset {
        initial_capital: Decimal,
        max_daily_loss: Decimal,
    },
    /// 주문 접수 활성화
    TradingEnabled,
    /// 주문 접수 중단 및 청산 완료 (일부 실패 포함 가능)
    Liquidated { report: LiquidationReport },
    /// 주문 접수는 중단했으나 포지션 조회 실패로 청산하지 못함
    LiquidationFailed { error: String },
    /// 주문 접수 중단
    TradingDisabled { was_active: bool },
}

/// 생명주기 컨트롤러.
pub struct LifecycleController {
    executor: Arc<OrderExecutor>,
}

impl LifecycleController {
    /// 새 컨트롤러 생성.
    pub fn new(executor: Arc<OrderExecutor>) -> Self {
        Self { executor }
    }

    /// 현재 단계.
    pub fn phase(&self) -> LifecyclePhase {
        self.executor.session().phase()
    }

    /// 전환을 적용하고 세션 단계를 갱신합니다.
    pub async fn apply(&self, transition: Transition) -> TransitionOutcome {
        let session = self.executor.session();

        let outcome = match transition {
            Transition::PreMarketCheck => {
                let mut risk = self.executor.risk_manager().write().await;
                risk.reset_for_new_day();
                let state = risk.state();
                TransitionOutcome::DailyReset {
                    initial_capital: state.initial_capital,
                    max_daily_loss: state.max_daily_loss,
                }
            }
            Transition::Open => {
                session.set_active(true);
                TransitionOutcome::TradingEnabled
            }
            Transition::ForcedClose => {
                // 진행 중인 주문 제출이 끝난 뒤 접수를 닫아야 청산 목록에 포함됨
                {
                    let _risk = self.executor.risk_manager().write().await;
                    session.set_active(false);
                }
                match self.executor.exit_all_positions().await {
                    Ok(report) => TransitionOutcome::Liquidated { report },
                    Err(e) => {
                        error!(error = %e, "Forced close could not fetch positions");
                        TransitionOutcome::LiquidationFailed {
                            error: e.to_string(),
                        }
                    }
                }
            }
            Transition::EndOfDay => {
                let _risk = self.executor.risk_manager().write().await;
                let was_active = session.set_active(false);
                TransitionOutcome::TradingDisabled { was_active }
            }
        };

        let phase = transition.phase_after();
        session.set_phase(phase);

        info!(
            transition = %transition,
            phase = %phase,
            trading_active = session.is_active(),
            "Lifecycle transition applied"
        );

        outcome
    }
}
