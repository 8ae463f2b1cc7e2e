//! 브로커 trait 정의.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trader_core::{OrderRequest, Position};

use crate::ExchangeError;

/// 브로커 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 계좌 증거금 정보.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginInfo {
    /// 주문 가능 잔고
    #[serde(default, alias = "availabelBalance")]
    pub available_balance: Decimal,
    /// 사용 중인 증거금
    #[serde(default)]
    pub utilized_amount: Decimal,
    /// 출금 가능 잔고
    #[serde(default)]
    pub withdrawable_balance: Decimal,
}

/// 주문 경계의 브로커 인터페이스.
///
/// 모든 호출은 외부 네트워크 요청일 수 있으며 실패는 `ExchangeError`로 보고됩니다.
#[async_trait]
pub trait Broker: Send + Sync {
    /// 브로커 이름 반환.
    fn name(&self) -> &str;

    /// 사용 가능한 증거금 조회.
    async fn get_margin(&self) -> ExchangeResult<MarginInfo>;

    /// 새 주문 제출. 브로커 주문 ID를 반환합니다.
    async fn place_order(&self, request: &OrderRequest) -> ExchangeResult<String>;

    /// 주문 취소.
    async fn cancel_order(&self, order_id: &str) -> ExchangeResult<()>;

    /// 현재 포지션 조회.
    async fn get_positions(&self) -> ExchangeResult<Vec<Position>>;

    /// 포지션 청산 (반대 방향 주문).
    async fn exit_position(&self, position: &Position) -> ExchangeResult<()>;
}
