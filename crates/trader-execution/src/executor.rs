//! 주문 executor 구현.
//!
//! 주문 경계의 단일 진입점입니다:
//! - 세션 플래그와 리스크 매니저로 신규 주문 허용 검사
//! - 허용 검사, 브로커 주문 제출, 거래 기록을 하나의 리스크 락 안에서 수행
//! - 실현 손익 반영 및 손실 한도 도달 시 선택적 청산
//! - 전체 포지션 청산 (개별 실패는 모아서 보고)

use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use trader_core::{OrderRequest, Position};
use trader_exchange::{Broker, ExchangeError, MarginInfo};
use trader_risk::{PnlSignal, RejectReason, RiskManager, RiskStatus, TradeDecision};

use crate::session::TradingSession;

/// 실행 오류 유형.
///
/// 규칙에 의한 거부는 오류가 아니라 `OrderOutcome::Rejected`로 반환됩니다.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Broker call timed out after {timeout_ms}ms: {operation}")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

/// 주문 거부 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderRejection {
    /// 세션이 주문 접수 중이 아님
    TradingInactive,
    /// 관리자가 거래를 비활성화함
    TradingDisabled,
    /// 리스크 규칙 위반
    Risk(RejectReason),
}

impl OrderRejection {
    /// 호출자에게 그대로 전달되는 사유 문자열.
    pub fn message(&self) -> &'static str {
        match self {
            OrderRejection::TradingInactive => "Trading not active",
            OrderRejection::TradingDisabled => "Trading disabled by operator",
            OrderRejection::Risk(reason) => reason.message(),
        }
    }
}

impl std::fmt::Display for OrderRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// 제출된 주문 영수증.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// 브로커 주문 ID
    pub order_id: String,
    /// 이 주문을 포함한 당일 거래 수
    pub trade_count: u32,
    /// 남은 거래 가능 횟수
    pub remaining_trades: u32,
}

/// 주문 제출 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    /// 브로커에 제출됨
    Placed(OrderReceipt),
    /// 규칙에 의해 거부됨 (브로커로 전달되지 않음)
    Rejected(OrderRejection),
}

/// 청산 실패 항목.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitFailure {
    pub position: Position,
    pub error: String,
}

/// 전체 포지션 청산 결과.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidationReport {
    /// 청산을 시도한 포지션 수
    pub attempted: usize,
    /// 청산 요청이 성공한 포지션
    pub exited: Vec<Position>,
    /// 청산 요청이 실패한 포지션
    pub failures: Vec<ExitFailure>,
}

impl LiquidationReport {
    /// 모든 포지션 청산 요청이 성공했는지 확인.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 손익 반영 결과.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PnlUpdate {
    pub signal: PnlSignal,
    pub status: RiskStatus,
    /// 손실 한도 도달로 수행한 청산 결과
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation: Option<LiquidationReport>,
    /// 청산을 시작하지 못한 경우의 오류
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidation_error: Option<String>,
}

/// executor 설정.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// 브로커 호출 타임아웃
    pub broker_timeout: Duration,
    /// 손실 한도 도달 시 전체 포지션 청산 여부
    pub liquidate_on_loss_limit: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            broker_timeout: Duration::from_secs(10),
            liquidate_on_loss_limit: false,
        }
    }
}

/// 주문 경계의 executor.
///
/// 리스크 매니저는 `Arc<RwLock<_>>`로 스케줄러와 공유됩니다. 상태를 바꾸는
/// 모든 호출은 쓰기 락 안에서 수행되므로 동시 주문이 거래 횟수 상한을
/// 넘어 허용되지 않습니다.
pub struct OrderExecutor {
    /// 브로커
    broker: Arc<dyn Broker>,
    /// 리스크 관리자
    risk_manager: Arc<RwLock<RiskManager>>,
    /// 거래 세션
    session: Arc<TradingSession>,
    /// 실행 설정
    config: ExecutorConfig,
}

impl OrderExecutor {
    /// 새로운 주문 executor 생성.
    pub fn new(
        broker: Arc<dyn Broker>,
        risk_manager: Arc<RwLock<RiskManager>>,
        session: Arc<TradingSession>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            broker,
            risk_manager,
            session,
            config,
        }
    }

    /// 리스크 관리자 핸들.
    pub fn risk_manager(&self) -> &Arc<RwLock<RiskManager>> {
        &self.risk_manager
    }

    /// 거래 세션 핸들.
    pub fn session(&self) -> &Arc<TradingSession> {
        &self.session
    }

    /// 브로커 이름.
    pub fn broker_name(&self) -> &str {
        self.broker.name()
    }

    /// 리스크 상태 스냅샷.
    pub async fn status(&self) -> RiskStatus {
        self.risk_manager.read().await.status()
    }

    /// 신규 주문을 검사하고 브로커에 제출합니다.
    ///
    /// 거부되면 브로커로 전달하지 않습니다. 제출에 성공하면 거래 1건을
    /// 기록합니다. 브로커 오류나 타임아웃은 거래로 기록하지 않고 오류로
    /// 반환합니다.
    pub async fn submit_order(&self, request: &OrderRequest) -> Result<OrderOutcome, ExecutionError> {
        request
            .validate()
            .map_err(|e| ExecutionError::InvalidOrder(e.to_string()))?;

        // 세션 플래그는 락 안에서 읽어야 전환과 직렬화됨
        let mut risk = self.risk_manager.write().await;

        if !self.session.is_active() {
            info!(symbol = %request.symbol, "Order rejected: trading not active");
            return Ok(OrderOutcome::Rejected(OrderRejection::TradingInactive));
        }

        if !risk.is_enabled() {
            info!(symbol = %request.symbol, "Order rejected: trading disabled");
            return Ok(OrderOutcome::Rejected(OrderRejection::TradingDisabled));
        }

        if let TradeDecision::Rejected(reason) = risk.can_trade() {
            info!(symbol = %request.symbol, reason = %reason, "Order rejected by risk rules");
            return Ok(OrderOutcome::Rejected(OrderRejection::Risk(reason)));
        }

        let order_id = self
            .with_timeout("place_order", self.broker.place_order(request))
            .await
            .map_err(|e| {
                if matches!(e, ExecutionError::Timeout { .. }) {
                    warn!(
                        symbol = %request.symbol,
                        "Order placement timed out; broker-side state unknown, trade not recorded"
                    );
                } else {
                    error!(symbol = %request.symbol, error = %e, "Order placement failed");
                }
                e
            })?;

        risk.record_trade();
        let state = risk.state();
        let receipt = OrderReceipt {
            order_id,
            trade_count: state.trade_count,
            remaining_trades: state.max_trades.saturating_sub(state.trade_count),
        };

        info!(
            order_id = %receipt.order_id,
            symbol = %request.symbol,
            side = %request.side,
            quantity = %request.quantity,
            trade_count = receipt.trade_count,
            "Order placed"
        );

        Ok(OrderOutcome::Placed(receipt))
    }

    /// 실현 손익을 반영합니다.
    ///
    /// `StopTrading`이 반환되고 손실 한도 청산이 설정되어 있으면 전체 포지션을
    /// 청산합니다.
    pub async fn apply_pnl(&self, delta: Decimal) -> PnlUpdate {
        let (signal, status) = {
            let mut risk = self.risk_manager.write().await;
            let signal = risk.update_pnl(delta);
            (signal, risk.status())
        };

        let mut update = PnlUpdate {
            signal,
            status,
            liquidation: None,
            liquidation_error: None,
        };

        if signal == PnlSignal::StopTrading {
            warn!(
                daily_pnl = %update.status.daily_pnl,
                max_daily_loss = %update.status.max_daily_loss,
                "Daily loss limit reached, new orders halted"
            );

            if self.config.liquidate_on_loss_limit {
                match self.exit_all_positions().await {
                    Ok(report) => update.liquidation = Some(report),
                    Err(e) => update.liquidation_error = Some(e.to_string()),
                }
            }
        }

        update
    }

    /// 모든 오픈 포지션을 청산합니다.
    ///
    /// 포지션 조회 실패는 오류입니다. 개별 청산 실패는 나머지 포지션 처리를
    /// 멈추지 않고 보고서에 모입니다.
    pub async fn exit_all_positions(&self) -> Result<LiquidationReport, ExecutionError> {
        let positions = self
            .with_timeout("get_positions", self.broker.get_positions())
            .await?;

        let open: Vec<Position> = positions.into_iter().filter(|p| p.is_open()).collect();
        if open.is_empty() {
            info!("No open positions to exit");
            return Ok(LiquidationReport::default());
        }

        info!(count = open.len(), "Exiting all open positions");

        let results = join_all(open.iter().map(|position| async move {
            let result = self
                .with_timeout("exit_position", self.broker.exit_position(position))
                .await;
            (position.clone(), result)
        }))
        .await;

        let mut report = LiquidationReport {
            attempted: open.len(),
            ..Default::default()
        };

        for (position, result) in results {
            match result {
                Ok(()) => report.exited.push(position),
                Err(e) => {
                    error!(position = %position, error = %e, "Position exit failed");
                    report.failures.push(ExitFailure {
                        position,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            attempted = report.attempted,
            exited = report.exited.len(),
            failed = report.failures.len(),
            "Liquidation finished"
        );

        Ok(report)
    }

    /// 주문 취소.
    pub async fn cancel_order(&self, order_id: &str) -> Result<(), ExecutionError> {
        self.with_timeout("cancel_order", self.broker.cancel_order(order_id))
            .await
    }

    /// 현재 포지션 조회.
    pub async fn positions(&self) -> Result<Vec<Position>, ExecutionError> {
        self.with_timeout("get_positions", self.broker.get_positions())
            .await
    }

    /// 증거금 조회.
    pub async fn margin(&self) -> Result<MarginInfo, ExecutionError> {
        self.with_timeout("get_margin", self.broker.get_margin())
            .await
    }

    async fn with_timeout<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, ExchangeError>>,
    ) -> Result<T, ExecutionError> {
        match tokio::time::timeout(self.config.broker_timeout, call).await {
            Ok(result) => result.map_err(ExecutionError::from),
            Err(_) => Err(ExecutionError::Timeout {
                operation,
                timeout_ms: self.config.broker_timeout.as_millis() as u64,
            }),
        }
    }
}
