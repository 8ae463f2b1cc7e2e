//! 프로세스 단위 거래 세션 상태.
//!
//! `trading_active` 플래그는 리스크 매니저와 별개로 주문 경계에서 확인되며
//! 스케줄된 전환(장 시작/강제 청산/장 마감)만 변경합니다.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::scheduler::LifecyclePhase;

/// 거래 세션.
#[derive(Debug)]
pub struct TradingSession {
    active: AtomicBool,
    phase: RwLock<LifecyclePhase>,
}

impl Default for TradingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TradingSession {
    /// 비활성 상태로 세션을 생성합니다. 다음 장 전 점검을 기다리는 단계에서 시작합니다.
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            phase: RwLock::new(LifecyclePhase::PostReset),
        }
    }

    /// 주문 접수 가능 여부.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// 주문 접수 플래그를 설정하고 이전 값을 반환합니다.
    pub fn set_active(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::SeqCst)
    }

    /// 현재 생명주기 단계.
    pub fn phase(&self) -> LifecyclePhase {
        *self.phase.read().unwrap_or_else(|e| e.into_inner())
    }

    /// 생명주기 단계를 변경합니다.
    pub fn set_phase(&self, phase: LifecyclePhase) {
        *self.phase.write().unwrap_or_else(|e| e.into_inner()) = phase;
    }
}
