use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};

use super::project::Project;

/// Shortest window (and shortest bar) the timeline will ever divide by.
pub const MIN_SPAN_MS: i64 = 86_400_000;

/// Convert a calendar date to the timestamp of its midnight (UTC).
pub fn to_timestamp(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Convert a timestamp back to the nearest calendar date.
pub fn to_calendar_date(ts: DateTime<Utc>) -> NaiveDate {
    (ts + Duration::hours(12)).date_naive()
}

/// Start/end of a bar as absolute timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Bounds {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(to_timestamp(start), to_timestamp(end))
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn shifted(&self, delta: Duration) -> Self {
        Self::new(self.start + delta, self.end + delta)
    }

    pub fn start_date(&self) -> NaiveDate {
        to_calendar_date(self.start)
    }

    pub fn end_date(&self) -> NaiveDate {
        to_calendar_date(self.end)
    }
}

/// A month boundary tick in the header.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthMarker {
    pub date: NaiveDate,
    pub position: f64,
    pub label: String,
}

/// The absolute date range every percentage position is computed against.
///
/// `end > start` always holds: a degenerate range is widened to
/// [`MIN_SPAN_MS`] on construction, so no division here can produce NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimelineWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let floor = start + Duration::milliseconds(MIN_SPAN_MS);
        Self {
            start,
            end: end.max(floor),
        }
    }

    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(to_timestamp(start), to_timestamp(end))
    }

    /// Window for a project: the configured start/end dates when both are
    /// present, otherwise the min/max of every contained date widened by
    /// `padding_ratio` of the span on each side. A project with no dates at
    /// all gets the one-day floor starting at `today`. Inverted or equal
    /// ranges are kept and widened to the floor by [`TimelineWindow::new`].
    pub fn for_project(project: &Project, padding_ratio: f64, today: NaiveDate) -> Self {
        if let Some((start, end)) = project.config.configured_range() {
            if end <= start {
                tracing::debug!(%start, %end, "configured project range is degenerate, flooring");
            }
            return Self::from_dates(start, end);
        }

        let dates = project.all_dates();
        let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
            return Self::from_dates(today, today);
        };

        let min = to_timestamp(*min);
        let span = (to_timestamp(*max) - min).max(Duration::milliseconds(MIN_SPAN_MS));
        let pad = Duration::milliseconds(
            (span.num_milliseconds() as f64 * padding_ratio.max(0.0)).round() as i64,
        );
        Self::new(min - pad, min + span + pad)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration_ms(&self) -> f64 {
        (self.end - self.start).num_milliseconds().max(MIN_SPAN_MS) as f64
    }

    /// Percentage position of `ts`. Not clipped to [0, 100]: items that start
    /// before the window stay representable.
    pub fn position_of(&self, ts: DateTime<Utc>) -> f64 {
        let offset = (ts - self.start).num_milliseconds() as f64;
        offset / self.duration_ms() * 100.0
    }

    /// Inverse of [`position_of`](Self::position_of).
    pub fn date_of(&self, percent: f64) -> DateTime<Utc> {
        let offset = percent / 100.0 * self.duration_ms();
        self.start + Duration::milliseconds(offset.round() as i64)
    }

    /// One marker per calendar month, from the first day of the month
    /// containing `start` through `end`. The first marker may sit at a
    /// negative position when the window starts mid-month.
    pub fn month_markers(&self) -> Vec<MonthMarker> {
        let first = self.start.date_naive();
        let Some(mut date) = NaiveDate::from_ymd_opt(first.year(), first.month(), 1) else {
            return Vec::new();
        };

        let mut markers = Vec::new();
        while to_timestamp(date) <= self.end {
            let label = if markers.is_empty() || date.month() == 1 {
                date.format("%b %Y").to_string()
            } else {
                date.format("%b").to_string()
            };
            markers.push(MonthMarker {
                date,
                position: self.position_of(to_timestamp(date)),
                label,
            });

            let (y, m) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            match NaiveDate::from_ymd_opt(y, m, 1) {
                Some(next) => date = next,
                None => break,
            }
        }
        markers
    }

    /// Position of `now`, or `None` when it falls outside the window.
    pub fn today_position_at(&self, now: DateTime<Utc>) -> Option<f64> {
        if now < self.start || now > self.end {
            return None;
        }
        Some(self.position_of(now))
    }
}
