//! Comparison windows and period-over-period deltas.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::analytics::{AnalyticsMetrics, MetricDeltas};

/// Window of the same length ending the day before `start`.
pub fn previous_period(start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
    let length = end.signed_duration_since(start).num_days().max(0);
    let prev_end = start - Duration::days(1);
    let prev_start = prev_end - Duration::days(length);
    (prev_start, prev_end)
}

/// Calendar-month windows relative to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindows {
    /// First of this month through `today`.
    pub this_month: (NaiveDate, NaiveDate),
    /// The whole previous month.
    pub last_month: (NaiveDate, NaiveDate),
}

pub fn month_windows(today: NaiveDate) -> MonthWindows {
    let this_month_start = today.with_day(1).unwrap_or(today);
    let last_month_end = this_month_start - Duration::days(1);
    let last_month_start = last_month_end.with_day(1).unwrap_or(last_month_end);

    MonthWindows {
        this_month: (this_month_start, today),
        last_month: (last_month_start, last_month_end),
    }
}

/// `None` when there is nothing to compare against.
pub fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

pub fn metric_deltas(current: &AnalyticsMetrics, previous: &AnalyticsMetrics) -> MetricDeltas {
    MetricDeltas {
        sessions: percent_change(current.sessions as f64, previous.sessions as f64),
        users: percent_change(current.users as f64, previous.users as f64),
        page_views: percent_change(current.page_views as f64, previous.page_views as f64),
        bounce_rate: percent_change(current.bounce_rate, previous.bounce_rate),
        avg_session_duration: percent_change(current.avg_session_duration, previous.avg_session_duration),
        conversions: percent_change(current.conversions as f64, previous.conversions as f64),
    }
}
