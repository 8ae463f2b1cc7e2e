//! 시뮬레이션(페이퍼) 브로커 구현.
//!
//! 주문은 즉시 체결된 것으로 간주되어 포지션을 열거나 늘립니다.
//! 테스트를 위해 주문/포지션 조회/심볼별 청산 실패를 주입할 수 있습니다.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use trader_core::{OrderRequest, Position, Side};

use crate::traits::{Broker, ExchangeResult, MarginInfo};
use crate::ExchangeError;

/// 제출된 주문 기록.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedOrder {
    /// 주문 ID
    pub order_id: String,
    /// 원 주문 요청
    pub request: OrderRequest,
    /// 취소 여부
    pub cancelled: bool,
}

/// 실패 주입 설정.
#[derive(Debug, Clone, Default)]
struct FailureInjection {
    /// 주문 제출 실패
    place_order: bool,
    /// 포지션 조회 실패
    positions: bool,
    /// 청산 실패 심볼
    exit_symbols: HashSet<String>,
    /// 주문 제출 지연
    order_delay: Option<Duration>,
}

/// 내부 계정 상태.
#[derive(Debug, Clone)]
struct AccountState {
    /// (거래소, 심볼) → 순수량
    positions: BTreeMap<(String, String), Decimal>,
    /// 제출된 주문
    orders: Vec<SimulatedOrder>,
    /// 다음 주문 번호
    next_order_id: u64,
    /// 사용 가능한 잔고
    available_balance: Decimal,
    /// 청산 요청 기록
    exits: Vec<Position>,
}

/// 시뮬레이션 브로커.
///
/// 복제본은 같은 계정 상태를 공유합니다.
#[derive(Debug, Clone)]
pub struct SimulatedBroker {
    state: Arc<RwLock<AccountState>>,
    failures: Arc<RwLock<FailureInjection>>,
}

impl Default for SimulatedBroker {
    fn default() -> Self {
        Self::new(dec!(100000))
    }
}

impl SimulatedBroker {
    /// 초기 잔고로 생성합니다.
    pub fn new(available_balance: Decimal) -> Self {
        Self {
            state: Arc::new(RwLock::new(AccountState {
                positions: BTreeMap::new(),
                orders: Vec::new(),
                next_order_id: 1,
                available_balance,
                exits: Vec::new(),
            })),
            failures: Arc::new(RwLock::new(FailureInjection::default())),
        }
    }

    /// 포지션을 직접 설정합니다.
    pub async fn set_position(&self, position: Position) {
        let mut state = self.state.write().await;
        let key = (position.exchange, position.symbol);
        if position.quantity.is_zero() {
            state.positions.remove(&key);
        } else {
            state.positions.insert(key, position.quantity);
        }
    }

    /// 주문 제출 실패를 설정합니다.
    pub async fn fail_orders(&self, fail: bool) {
        self.failures.write().await.place_order = fail;
    }

    /// 포지션 조회 실패를 설정합니다.
    pub async fn fail_positions(&self, fail: bool) {
        self.failures.write().await.positions = fail;
    }

    /// 특정 심볼의 청산 실패를 설정합니다.
    pub async fn fail_exit_for(&self, symbol: impl Into<String>) {
        self.failures.write().await.exit_symbols.insert(symbol.into());
    }

    /// 주문 제출 지연을 설정합니다.
    pub async fn set_order_delay(&self, delay: Option<Duration>) {
        self.failures.write().await.order_delay = delay;
    }

    /// 제출된 주문 목록.
    pub async fn orders(&self) -> Vec<SimulatedOrder> {
        self.state.read().await.orders.clone()
    }

    /// 청산 요청 기록.
    pub async fn exits(&self) -> Vec<Position> {
        self.state.read().await.exits.clone()
    }
}

#[async_trait]
impl Broker for SimulatedBroker {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn get_margin(&self) -> ExchangeResult<MarginInfo> {
        let state = self.state.read().await;
        Ok(MarginInfo {
            available_balance: state.available_balance,
            utilized_amount: Decimal::ZERO,
            withdrawable_balance: state.available_balance,
        })
    }

    async fn place_order(&self, request: &OrderRequest) -> ExchangeResult<String> {
        let (fail, delay) = {
            let failures = self.failures.read().await;
            (failures.place_order, failures.order_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(ExchangeError::NetworkError(
                "simulated order placement failure".into(),
            ));
        }

        request
            .validate()
            .map_err(|e| ExchangeError::OrderRejected(e.to_string()))?;

        let mut state = self.state.write().await;
        let order_id = format!("SIM-{:06}", state.next_order_id);
        state.next_order_id += 1;

        let signed = match request.side {
            Side::Buy => request.quantity,
            Side::Sell => -request.quantity,
        };
        let key = (request.exchange.clone(), request.symbol.clone());
        let net = state.positions.get(&key).copied().unwrap_or(Decimal::ZERO) + signed;
        if net.is_zero() {
            state.positions.remove(&key);
        } else {
            state.positions.insert(key, net);
        }

        state.orders.push(SimulatedOrder {
            order_id: order_id.clone(),
            request: request.clone(),
            cancelled: false,
        });

        info!(
            order_id = %order_id,
            symbol = %request.symbol,
            side = %request.side,
            quantity = %request.quantity,
            "Simulated order filled"
        );

        Ok(order_id)
    }

    async fn cancel_order(&self, order_id: &str) -> ExchangeResult<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.order_id == order_id)
            .ok_or_else(|| ExchangeError::OrderNotFound(order_id.to_string()))?;

        order.cancelled = true;
        debug!(order_id = %order_id, "Simulated order cancelled");
        Ok(())
    }

    async fn get_positions(&self) -> ExchangeResult<Vec<Position>> {
        if self.failures.read().await.positions {
            return Err(ExchangeError::NetworkError(
                "simulated position fetch failure".into(),
            ));
        }

        let state = self.state.read().await;
        Ok(state
            .positions
            .iter()
            .map(|((exchange, symbol), qty)| Position::new(symbol.clone(), exchange.clone(), *qty))
            .collect())
    }

    async fn exit_position(&self, position: &Position) -> ExchangeResult<()> {
        if self.failures.read().await.exit_symbols.contains(&position.symbol) {
            return Err(ExchangeError::ApiError {
                code: 500,
                message: format!("simulated exit failure for {}", position.symbol),
            });
        }

        let mut state = self.state.write().await;
        let key = (position.exchange.clone(), position.symbol.clone());
        if state.positions.remove(&key).is_none() {
            return Err(ExchangeError::PositionNotFound(position.to_string()));
        }
        state.exits.push(position.clone());

        info!(position = %position, side = %position.exit_side(), "Simulated position exited");
        Ok(())
    }
}
