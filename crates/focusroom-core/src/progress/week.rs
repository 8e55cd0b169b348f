//! Weekly window arithmetic. Weeks start Sunday 00:00 in the clock's zone.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Start of the week containing `at`.
pub fn week_start<Tz: TimeZone>(at: &DateTime<Tz>) -> DateTime<Tz> {
    let date = at.date_naive();
    let sunday = date - Duration::days(i64::from(date.weekday().num_days_from_sunday()));
    midnight(&at.timezone(), sunday)
}

/// Start of the week after the one beginning at `start`.
pub fn next_week_start<Tz: TimeZone>(start: &DateTime<Tz>) -> DateTime<Tz> {
    let date = start.date_naive();
    let sunday = date - Duration::days(i64::from(date.weekday().num_days_from_sunday()));
    midnight(&start.timezone(), sunday + Duration::days(7))
}

/// Local midnight of `date`. When midnight does not exist (DST gap) the
/// first valid instant after it is used.
fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// The current week: `[last_reset_at, next_reset_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekWindow {
    pub last_reset_at: DateTime<Local>,
    pub next_reset_at: DateTime<Local>,
}

impl WeekWindow {
    /// The week containing `now`.
    pub fn containing(now: &DateTime<Local>) -> Self {
        let start = week_start(now);
        let next = next_week_start(&start);
        Self {
            last_reset_at: start,
            next_reset_at: next,
        }
    }

    pub fn is_crossed(&self, now: &DateTime<Local>) -> bool {
        *now >= self.next_reset_at
    }

    /// Move the window to the week containing `now` and return how many
    /// boundaries were crossed. Zero (and no change) if `now` is still
    /// inside the window.
    pub fn advance_to(&mut self, now: &DateTime<Local>) -> u32 {
        if !self.is_crossed(now) {
            return 0;
        }
        let current = Self::containing(now);
        let days = (current.last_reset_at.date_naive() - self.next_reset_at.date_naive()).num_days();
        let weeks = u32::try_from(days / 7).unwrap_or(u32::MAX).saturating_add(1);
        *self = current;
        weeks
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.last_reset_at < self.next_reset_at {
            Ok(())
        } else {
            Err("week window ends before it starts".into())
        }
    }
}
