use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Timestamptz;
use serde::Serialize;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::serde::rfc3339;
use time::{Duration, OffsetDateTime};

/// Logs how long a scope took when dropped.
pub struct Timer<'a> {
    name: &'a str,
    start: std::time::Instant,
}

impl<'a> Timer<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for Timer<'_> {
    fn drop(&mut self) {
        let elapsed_time = self.start.elapsed();
        let time_in_s = elapsed_time.as_secs_f32();
        match elapsed_time.as_nanos().checked_ilog10().unwrap_or(0) {
            0..3 => tracing::debug!("{} took {:.1}ns", self.name, time_in_s * 1e9),
            3..6 => tracing::debug!("{} took {:.1}μs", self.name, time_in_s * 1e6),
            6..9 => tracing::debug!("{} took {:.1}ms", self.name, time_in_s * 1e3),
            9.. => tracing::debug!("{} took {:.1}s", self.name, time_in_s),
        }
    }
}

// A wrapper for time::OffsetDateTime that serializes according to RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Timestamptz)]
pub struct DateTime(#[serde(with = "rfc3339")] OffsetDateTime);

const DISPLAY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

impl DateTime {
    pub fn now() -> Self {
        OffsetDateTime::now_utc().into()
    }

    /// Human readable elapsed time between `self` and `now`, e.g. "3 hours ago".
    /// Times in the future read as "just now".
    pub fn elapsed_since(self, now: DateTime) -> String {
        const MINUTE: i64 = 60;
        const HOUR: i64 = 60 * MINUTE;
        const DAY: i64 = 24 * HOUR;
        const MONTH: i64 = 30 * DAY;
        const YEAR: i64 = 365 * DAY;

        let seconds = (now.0 - self.0).whole_seconds();
        let (amount, unit) = match seconds {
            ..MINUTE => return String::from("just now"),
            MINUTE..HOUR => (seconds / MINUTE, "minute"),
            HOUR..DAY => (seconds / HOUR, "hour"),
            DAY..MONTH => (seconds / DAY, "day"),
            MONTH..YEAR => (seconds / MONTH, "month"),
            YEAR.. => (seconds / YEAR, "year"),
        };
        match amount {
            1 => format!("1 {unit} ago"),
            _ => format!("{amount} {unit}s ago"),
        }
    }

    /// Formats as `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn display(self) -> String {
        self.0
            .to_offset(time::UtcOffset::UTC)
            .format(DISPLAY_FORMAT)
            .unwrap_or_else(|_| self.0.to_string())
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(value: OffsetDateTime) -> Self {
        DateTime(value)
    }
}

impl std::ops::Add<Duration> for DateTime {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self::Output {
        DateTime(self.0 + rhs)
    }
}

impl std::ops::Sub<Duration> for DateTime {
    type Output = Self;
    fn sub(self, rhs: Duration) -> Self::Output {
        DateTime(self.0 - rhs)
    }
}

impl<DB: Backend> ToSql<Timestamptz, DB> for DateTime
where
    OffsetDateTime: ToSql<Timestamptz, DB>,
{
    fn to_sql<'a>(&'a self, out: &mut Output<'a, '_, DB>) -> serialize::Result {
        self.0.to_sql(out)
    }
}

impl<DB: Backend> FromSql<Timestamptz, DB> for DateTime
where
    OffsetDateTime: FromSql<Timestamptz, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> deserialize::Result<Self> {
        OffsetDateTime::from_sql(bytes).map(DateTime)
    }
}
