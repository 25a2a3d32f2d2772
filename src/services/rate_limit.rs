use chrono::{DateTime, NaiveDate, Utc};
use lazy_static::lazy_static;
use std::sync::Mutex;

const MINUTE_WARN_THRESHOLD: u32 = 12;
const DAY_WARN_THRESHOLD: u32 = 15;
const DAY_CRITICAL_THRESHOLD: u32 = 20;

/// Counts AI requests per rolling minute and per calendar day (UTC).
/// Logging only; it never rejects a request.
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    minute_window_start: Option<DateTime<Utc>>,
    minute_count: u32,
    day: Option<NaiveDate>,
    day_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestCounts {
    pub last_minute: u32,
    pub today: u32,
}

impl RateLimitTracker {
    pub fn record_at(&mut self, now: DateTime<Utc>) -> RequestCounts {
        let window_expired = self
            .minute_window_start
            .map(|start| (now - start).num_seconds() >= 60)
            .unwrap_or(true);
        if window_expired {
            self.minute_window_start = Some(now);
            self.minute_count = 0;
        }

        if self.day != Some(now.date_naive()) {
            self.day = Some(now.date_naive());
            self.day_count = 0;
        }

        self.minute_count += 1;
        self.day_count += 1;

        RequestCounts {
            last_minute: self.minute_count,
            today: self.day_count,
        }
    }
}

lazy_static! {
    static ref TRACKER: Mutex<RateLimitTracker> = Mutex::new(RateLimitTracker::default());
}

/// Records one AI request on the process-wide tracker and logs threshold warnings.
pub fn record() -> Option<RequestCounts> {
    let counts = TRACKER.lock().ok()?.record_at(Utc::now());

    log::info!(
        "📊 Rate Limit Tracker: {} req/min, {} req/day",
        counts.last_minute,
        counts.today
    );
    if counts.last_minute >= MINUTE_WARN_THRESHOLD {
        log::warn!("⚠️ Approaching RPM limit: {}/15", counts.last_minute);
    }
    if counts.today >= DAY_CRITICAL_THRESHOLD {
        log::error!(
            "🔄 Daily Gemini limit reached ({}/{}), expect Groq fallback",
            counts.today,
            DAY_CRITICAL_THRESHOLD
        );
    } else if counts.today >= DAY_WARN_THRESHOLD {
        log::warn!(
            "⚠️ Approaching daily limit: {}/{}",
            counts.today,
            DAY_CRITICAL_THRESHOLD
        );
    }

    Some(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_minute_window_resets() {
        let mut tracker = RateLimitTracker::default();
        let t0 = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();

        for _ in 0..11 {
            tracker.record_at(t0);
        }
        assert_eq!(tracker.record_at(t0 + Duration::seconds(30)).last_minute, 12);

        let after = tracker.record_at(t0 + Duration::seconds(61));
        assert_eq!(after.last_minute, 1);
        assert_eq!(after.today, 13);
    }

    #[test]
    fn test_day_window_resets_at_midnight() {
        let mut tracker = RateLimitTracker::default();
        let late = Utc.with_ymd_and_hms(2025, 3, 10, 23, 59, 50).unwrap();
        tracker.record_at(late);
        tracker.record_at(late);

        let next_day = tracker.record_at(late + Duration::seconds(20));
        assert_eq!(next_day.today, 1);
        assert_eq!(next_day.last_minute, 3);
    }

    #[test]
    fn test_global_record_never_blocks() {
        for _ in 0..25 {
            assert!(record().is_some());
        }
    }
}
