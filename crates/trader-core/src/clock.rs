//! 시장 현지 시각을 제공하는 시계 추상화.
//!
//! 거래 시간대 판정과 일일 스케줄은 모두 `Clock`을 통해 현재 시각을 얻으므로
//! 테스트에서는 `ManualClock`으로 임의의 시각을 주입할 수 있습니다.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, Mutex};

use crate::error::{TraderError, TraderResult};

/// 시장 현지 벽시계.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// 현재 시장 현지 날짜/시각.
    fn now(&self) -> NaiveDateTime;

    /// 현재 시장 현지 날짜.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// 현재 시장 현지 시각(시:분:초).
    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }
}

/// 시스템 시계를 시장 시간대로 변환하는 시계.
#[derive(Debug, Clone, Copy)]
pub struct MarketClock {
    tz: Tz,
}

impl MarketClock {
    /// 주어진 시간대로 생성합니다.
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// IANA 시간대 이름(예: "Asia/Kolkata")으로 생성합니다.
    pub fn from_name(name: &str) -> TraderResult<Self> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|e| TraderError::Config(format!("unknown time zone '{}': {}", name, e)))
    }

    /// 시장 시간대.
    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Clock for MarketClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}

/// 수동으로 설정하는 시계.
///
/// 복제본끼리 같은 시각을 공유하므로 테스트에서 한 핸들로 시간을 움직이면
/// 리스크 매니저와 스케줄러가 동일한 시각을 봅니다.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    /// 주어진 시각에서 시작하는 시계를 생성합니다.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// 날짜와 시각으로 생성합니다.
    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self::new(date.and_time(time))
    }

    /// 현재 시각을 변경합니다.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// 같은 날짜에서 시각만 변경합니다.
    pub fn set_time(&self, time: NaiveTime) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = guard.date().and_time(time);
    }

    /// 시각을 앞으로 이동합니다.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_market_clock_from_name() {
        let clock = MarketClock::from_name("Asia/Kolkata").unwrap();
        assert_eq!(clock.timezone(), chrono_tz::Asia::Kolkata);

        assert!(MarketClock::from_name("Mars/Olympus").is_err());
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::at(date(2024, 3, 4), time(9, 0, 0));
        let handle = clock.clone();

        handle.set_time(time(9, 30, 0));
        assert_eq!(clock.time_of_day(), time(9, 30, 0));

        handle.advance(Duration::hours(15));
        assert_eq!(clock.today(), date(2024, 3, 5));
        assert_eq!(clock.time_of_day(), time(0, 30, 0));
    }
}
