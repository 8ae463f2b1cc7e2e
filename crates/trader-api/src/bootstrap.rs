//! 설정에서 실행 구성 요소를 조립합니다.

use axum::http::StatusCode;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use trader_core::{Clock, MarketClock};
use trader_exchange::{Broker, DhanClient, DhanConfig, ExchangeError, SimulatedBroker};
use trader_risk::ConfigValidationError;

use crate::config::{AppConfig, BrokerKind};
use crate::routes::create_api_router;
use crate::state::AppState;

/// 요청 전역 타임아웃.
///
/// 브로커 타임아웃보다 길어야 504가 408보다 먼저 나갑니다.
const REQUEST_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// 부트스트랩 오류.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error(transparent)]
    Validation(#[from] ConfigValidationError),

    #[error("Broker setup failed: {0}")]
    Broker(#[from] ExchangeError),

    #[error("Invalid timezone: {0}")]
    Timezone(String),
}

/// 설정에 맞는 브로커를 생성합니다.
///
/// `dhan`은 `DHAN_ACCESS_TOKEN` 환경 변수가 필요합니다.
pub fn build_broker(config: &AppConfig) -> Result<Arc<dyn Broker>, BootstrapError> {
    let settings = &config.broker;

    match settings.kind {
        BrokerKind::Paper => {
            let broker = match settings.paper_balance {
                Some(balance) => SimulatedBroker::new(balance),
                None => SimulatedBroker::default(),
            };
            info!("Paper broker selected");
            Ok(Arc::new(broker))
        }
        BrokerKind::Dhan => {
            let mut dhan = DhanConfig::from_env().ok_or_else(|| {
                ConfigValidationError::MissingField("DHAN_ACCESS_TOKEN".to_string())
            })?;
            if let Some(url) = &settings.base_url {
                dhan = dhan.with_base_url(url.clone());
            }
            dhan = dhan.with_timeout_secs(settings.timeout_secs);

            let client = DhanClient::new(dhan)?;
            info!("Dhan broker selected");
            Ok(Arc::new(client))
        }
    }
}

/// 설정을 검증하고 공유 상태를 조립합니다.
pub fn build_state(config: &AppConfig) -> Result<AppState, BootstrapError> {
    config.validate()?;

    let clock = MarketClock::from_name(&config.schedule.timezone)
        .map_err(|e| BootstrapError::Timezone(e.to_string()))?;
    let clock: Arc<dyn Clock> = Arc::new(clock);
    let broker = build_broker(config)?;

    Ok(AppState::new(
        broker,
        config.risk.clone(),
        config.schedule.clone(),
        config.executor_config(),
        clock,
    ))
}

/// CORS 레이어 생성.
///
/// `CORS_ORIGINS`(쉼표 구분)가 없으면 모든 origin을 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                AllowOrigin::list(origins)
            }
        }
        _ => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

/// 미들웨어가 적용된 전체 라우터.
pub fn build_router(state: Arc<AppState>, broker_timeout: Duration) -> Router {
    create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            broker_timeout + REQUEST_TIMEOUT_GRACE,
        ))
        .layer(cors_layer())
}
