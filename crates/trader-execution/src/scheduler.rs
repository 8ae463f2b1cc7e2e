//! 일일 생명주기 스케줄러.
//!
//! 하루 네 번의 전환(장 전 점검, 장 시작, 강제 청산, 장 마감)을 시장 현지
//! 시각에 맞춰 발생시킵니다. 틱마다 `(마지막 틱, 현재]` 구간에 들어오는
//! 전환만 시간 순서대로 반환하므로:
//! - 같은 (전환, 날짜)는 한 번만 발생합니다
//! - 스케줄러 시작 이전 시각의 전환은 소급 발생하지 않습니다
//! - 시계가 뒤로 가면 아무것도 발생하지 않습니다

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};
use trader_risk::ConfigValidationError;

/// 하루 중 생명주기 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecyclePhase {
    /// 일일 초기화 완료, 장 시작 대기
    PreMarket,
    /// 주문 접수 중
    Open,
    /// 주문 중단 및 포지션 청산 완료
    ForcedClose,
    /// 장 마감, 다음 장 전 점검 대기
    PostReset,
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LifecyclePhase::PreMarket => "PRE_MARKET",
            LifecyclePhase::Open => "OPEN",
            LifecyclePhase::ForcedClose => "FORCED_CLOSE",
            LifecyclePhase::PostReset => "POST_RESET",
        };
        f.write_str(s)
    }
}

/// 스케줄된 전환.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// 장 전 점검: 리스크 일일 초기화
    PreMarketCheck,
    /// 장 시작: 주문 접수 활성화
    Open,
    /// 강제 청산: 주문 중단 후 전체 포지션 청산
    ForcedClose,
    /// 장 마감: 주문 중단
    EndOfDay,
}

impl Transition {
    /// 하루 중 발생 순서.
    pub const ALL: [Transition; 4] = [
        Transition::PreMarketCheck,
        Transition::Open,
        Transition::ForcedClose,
        Transition::EndOfDay,
    ];

    /// 전환 후 단계.
    pub fn phase_after(&self) -> LifecyclePhase {
        match self {
            Transition::PreMarketCheck => LifecyclePhase::PreMarket,
            Transition::Open => LifecyclePhase::Open,
            Transition::ForcedClose => LifecyclePhase::ForcedClose,
            Transition::EndOfDay => LifecyclePhase::PostReset,
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Transition::PreMarketCheck => "pre_market_check",
            Transition::Open => "open",
            Transition::ForcedClose => "forced_close",
            Transition::EndOfDay => "end_of_day",
        };
        f.write_str(s)
    }
}

/// 스케줄 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// 시장 시간대 (IANA 이름)
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// 장 전 점검 시각 (기본값: 09:15:00)
    #[serde(default = "default_pre_market")]
    pub pre_market: NaiveTime,
    /// 장 시작 시각 (기본값: 09:25:00)
    #[serde(default = "default_market_open")]
    pub market_open: NaiveTime,
    /// 강제 청산 시각 (기본값: 15:00:00)
    #[serde(default = "default_forced_close")]
    pub forced_close: NaiveTime,
    /// 장 마감 시각 (기본값: 15:30:00)
    #[serde(default = "default_end_of_day")]
    pub end_of_day: NaiveTime,
    /// 스케줄러 틱 간격 (밀리초, 기본값: 1000)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap_or_default()
}

fn default_pre_market() -> NaiveTime {
    hms(9, 15, 0)
}

fn default_market_open() -> NaiveTime {
    hms(9, 25, 0)
}

fn default_forced_close() -> NaiveTime {
    hms(15, 0, 0)
}

fn default_end_of_day() -> NaiveTime {
    hms(15, 30, 0)
}

fn default_tick_interval_ms() -> u64 {
    1000
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            pre_market: default_pre_market(),
            market_open: default_market_open(),
            forced_close: default_forced_close(),
            end_of_day: default_end_of_day(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl ScheduleConfig {
    /// 전환별 발생 시각.
    pub fn time_of(&self, transition: Transition) -> NaiveTime {
        match transition {
            Transition::PreMarketCheck => self.pre_market,
            Transition::Open => self.market_open,
            Transition::ForcedClose => self.forced_close,
            Transition::EndOfDay => self.end_of_day,
        }
    }

    /// 틱 간격.
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }

    /// 설정 값을 검증합니다.
    ///
    /// 네 시각은 같은 날 안에서 엄격하게 증가해야 합니다.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "unknown timezone: {}",
                self.timezone
            )));
        }

        let times: Vec<NaiveTime> = Transition::ALL.iter().map(|t| self.time_of(*t)).collect();
        if times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigValidationError::InvalidValue(
                "schedule times must be strictly increasing: pre_market < market_open < forced_close < end_of_day".into(),
            ));
        }

        if self.tick_interval_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "tick_interval_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

/// 발생 시점이 정해진 전환.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTransition {
    /// 전환 종류
    pub transition: Transition,
    /// 발생 시장 일자
    pub date: NaiveDate,
    /// 예정 시각
    pub at: NaiveDateTime,
}

/// 일일 스케줄러.
#[derive(Debug, Clone)]
pub struct DailyScheduler {
    config: ScheduleConfig,
    /// 마지막으로 처리한 틱 시각
    last_tick: NaiveDateTime,
    /// 전환별 마지막 발생 일자
    last_fired: HashMap<Transition, NaiveDate>,
}

impl DailyScheduler {
    /// `started_at` 이후의 전환만 발생시키는 스케줄러를 생성합니다.
    pub fn new(config: ScheduleConfig, started_at: NaiveDateTime) -> Self {
        Self {
            config,
            last_tick: started_at,
            last_fired: HashMap::new(),
        }
    }

    /// 설정 참조.
    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// 마지막 틱 시각.
    pub fn last_tick(&self) -> NaiveDateTime {
        self.last_tick
    }

    /// 전환의 마지막 발생 일자.
    pub fn last_fired(&self, transition: Transition) -> Option<NaiveDate> {
        self.last_fired.get(&transition).copied()
    }

    /// `(마지막 틱, now]` 구간에서 발생해야 할 전환을 시간 순서대로 반환하고
    /// 마지막 틱을 `now`로 옮깁니다.
    ///
    /// 하루 이상 멈춰 있었다면 전날과 오늘의 전환만 고려합니다.
    pub fn due(&mut self, now: NaiveDateTime) -> Vec<ScheduledTransition> {
        if now < self.last_tick {
            warn!(
                now = %now,
                last_tick = %self.last_tick,
                "Clock moved backwards, skipping tick"
            );
            return Vec::new();
        }
        if now == self.last_tick {
            return Vec::new();
        }

        let earliest = now.date() - Duration::days(1);
        let mut date = self.last_tick.date().max(earliest);
        let mut due = Vec::new();

        while date <= now.date() {
            for transition in Transition::ALL {
                let at = date.and_time(self.config.time_of(transition));
                if at > self.last_tick
                    && at <= now
                    && self.last_fired(transition) != Some(date)
                {
                    due.push(ScheduledTransition {
                        transition,
                        date,
                        at,
                    });
                }
            }
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }

        due.sort_by_key(|t| t.at);

        for item in &due {
            self.last_fired.insert(item.transition, item.date);
            debug!(transition = %item.transition, at = %item.at, "Transition due");
        }
        self.last_tick = now;

        due
    }

    /// 마지막 틱 이후 다음 전환.
    pub fn next_transition(&self) -> ScheduledTransition {
        let today = self.last_tick.date();
        for date in [today, today + Duration::days(1)] {
            for transition in Transition::ALL {
                let at = date.and_time(self.config.time_of(transition));
                if at > self.last_tick {
                    return ScheduledTransition {
                        transition,
                        date,
                        at,
                    };
                }
            }
        }

        // 시각이 검증되지 않은 설정에서만 도달
        let date = today + Duration::days(1);
        ScheduledTransition {
            transition: Transition::PreMarketCheck,
            date,
            at: date.and_time(self.config.pre_market),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn kinds(due: &[ScheduledTransition]) -> Vec<Transition> {
        due.iter().map(|t| t.transition).collect()
    }

    #[test]
    fn test_default_config_valid() {
        let config = ScheduleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timezone, "Asia/Kolkata");
        assert_eq!(config.tick_interval(), std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_config() {
        let mut config = ScheduleConfig::default();
        config.market_open = config.pre_market;
        assert!(config.validate().is_err());

        let mut config = ScheduleConfig::default();
        config.timezone = "Nowhere/Land".into();
        assert!(config.validate().is_err());

        let mut config = ScheduleConfig::default();
        config.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fires_once_at_scheduled_time() {
        let mut scheduler = DailyScheduler::new(ScheduleConfig::default(), at(4, 9, 0, 0));

        assert!(scheduler.due(at(4, 9, 14, 59)).is_empty());
        assert_eq!(kinds(&scheduler.due(at(4, 9, 15, 0))), vec![Transition::PreMarketCheck]);
        assert!(scheduler.due(at(4, 9, 15, 1)).is_empty());
        assert_eq!(kinds(&scheduler.due(at(4, 9, 25, 0))), vec![Transition::Open]);
        assert!(scheduler.due(at(4, 12, 0, 0)).is_empty());
    }

    #[test]
    fn test_no_retroactive_firing_on_start() {
        let mut scheduler = DailyScheduler::new(ScheduleConfig::default(), at(4, 12, 0, 0));

        assert!(scheduler.due(at(4, 12, 0, 1)).is_empty());
        assert_eq!(kinds(&scheduler.due(at(4, 15, 0, 0))), vec![Transition::ForcedClose]);
    }

    #[test]
    fn test_catch_up_in_order_after_stall() {
        let mut scheduler = DailyScheduler::new(ScheduleConfig::default(), at(4, 9, 0, 0));

        let due = scheduler.due(at(4, 15, 10, 0));
        assert_eq!(
            kinds(&due),
            vec![Transition::PreMarketCheck, Transition::Open, Transition::ForcedClose]
        );
        assert_eq!(due[2].at, at(4, 15, 0, 0));
        assert_eq!(kinds(&scheduler.due(at(4, 15, 30, 0))), vec![Transition::EndOfDay]);
    }

    #[test]
    fn test_runs_across_midnight() {
        let mut scheduler = DailyScheduler::new(ScheduleConfig::default(), at(4, 15, 20, 0));

        assert_eq!(kinds(&scheduler.due(at(4, 23, 59, 59))), vec![Transition::EndOfDay]);
        assert!(scheduler.due(at(5, 0, 0, 1)).is_empty());

        let due = scheduler.due(at(5, 9, 15, 0));
        assert_eq!(kinds(&due), vec![Transition::PreMarketCheck]);
        assert_eq!(due[0].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(
            scheduler.last_fired(Transition::EndOfDay),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
    }

    #[test]
    fn test_backwards_clock_yields_nothing() {
        let mut scheduler = DailyScheduler::new(ScheduleConfig::default(), at(4, 9, 0, 0));
        assert_eq!(scheduler.due(at(4, 9, 20, 0)).len(), 1);

        assert!(scheduler.due(at(4, 9, 10, 0)).is_empty());
        assert_eq!(scheduler.last_tick(), at(4, 9, 20, 0));

        // 시계가 되돌아온 뒤에도 같은 날 장 전 점검은 다시 발생하지 않음
        assert_eq!(kinds(&scheduler.due(at(4, 9, 25, 0))), vec![Transition::Open]);
    }

    #[test]
    fn test_long_gap_only_recent_days() {
        let mut scheduler = DailyScheduler::new(ScheduleConfig::default(), at(1, 16, 0, 0));

        let due = scheduler.due(at(4, 9, 20, 0));
        let dates: Vec<u32> = due.iter().map(|t| chrono::Datelike::day(&t.date)).collect();

        assert_eq!(
            kinds(&due),
            vec![
                Transition::PreMarketCheck,
                Transition::Open,
                Transition::ForcedClose,
                Transition::EndOfDay,
                Transition::PreMarketCheck,
            ]
        );
        assert_eq!(dates, vec![3, 3, 3, 3, 4]);
    }

    #[test]
    fn test_next_transition() {
        let scheduler = DailyScheduler::new(ScheduleConfig::default(), at(4, 9, 20, 0));
        let next = scheduler.next_transition();
        assert_eq!(next.transition, Transition::Open);
        assert_eq!(next.at, at(4, 9, 25, 0));

        let scheduler = DailyScheduler::new(ScheduleConfig::default(), at(4, 16, 0, 0));
        let next = scheduler.next_transition();
        assert_eq!(next.transition, Transition::PreMarketCheck);
        assert_eq!(next.at, at(5, 9, 15, 0));
    }
}
