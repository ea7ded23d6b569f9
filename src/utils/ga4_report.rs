//! Shapes GA4 `runReport` rows into the dashboard's analytics types.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::models::analytics::{
    AnalyticsMetrics, ChannelCategory, ChartPoint, CountryMetrics, DateRange, ReportRow,
    RunReportResponse, TrafficSource,
};

/// `20240115` -> `2024-01-15`. Anything else is returned unchanged.
pub fn format_report_date(raw: &str) -> String {
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8])
    } else {
        raw.to_string()
    }
}

/// Folds a GA4 channel-group label into a dashboard category.
///
/// Checks run from most to least specific: "Organic Social" has to land in
/// Social before the organic check sees it, and "Paid Search" must not be
/// read as organic.
pub fn normalize_channel(label: &str) -> ChannelCategory {
    let lower = label.trim().to_lowercase();

    if lower.contains("social") {
        ChannelCategory::Social
    } else if lower.contains("email") || lower.contains("mail") {
        ChannelCategory::Email
    } else if lower.contains("direct") || lower == "(none)" {
        ChannelCategory::Direct
    } else if lower.contains("organic") || (lower.contains("search") && !lower.contains("paid")) {
        ChannelCategory::Organic
    } else if lower.contains("referral") {
        ChannelCategory::Referral
    } else if lower.contains("unassigned") {
        ChannelCategory::Unassigned
    } else {
        ChannelCategory::Other(label.to_string())
    }
}

/// Sums sessions per normalized channel, largest first.
pub fn aggregate_traffic_sources(rows: &[ReportRow]) -> Vec<TrafficSource> {
    let mut sources: Vec<TrafficSource> = Vec::new();

    for row in rows {
        let label = row
            .dimension(0)
            .filter(|label| !label.is_empty())
            .unwrap_or("Unknown");
        let name = normalize_channel(label);
        let sessions = row.metric_u64(0);

        match sources.iter_mut().find(|source| source.name == name) {
            Some(existing) => existing.value += sessions,
            None => sources.push(TrafficSource { name, value: sessions }),
        }
    }

    sources.sort_by(|a, b| b.value.cmp(&a.value));
    sources
}

/// GA4's placeholder for rows it could not attribute to a country.
pub fn is_not_set(country: &str) -> bool {
    let lower = country.trim().to_lowercase();
    lower == "(not set)" || lower == "not set"
}

/// Country breakdown without "(not set)" rows, most sessions first.
///
/// Metric order: sessions, totalUsers, screenPageViews, bounceRate,
/// averageSessionDuration.
pub fn country_rows(rows: &[ReportRow]) -> Vec<CountryMetrics> {
    let mut countries: Vec<CountryMetrics> = rows
        .iter()
        .filter_map(|row| {
            let country = row
                .dimension(0)
                .filter(|country| !country.is_empty())
                .unwrap_or("Unknown");
            if is_not_set(country) {
                return None;
            }
            Some(CountryMetrics {
                country: country.to_string(),
                sessions: row.metric_u64(0),
                users: row.metric_u64(1),
                page_views: row.metric_u64(2),
                bounce_rate: row.metric_f64(3),
                avg_session_duration: row.metric_f64(4),
            })
        })
        .collect();

    countries.sort_by(|a, b| b.sessions.cmp(&a.sessions));
    countries
}

/// Longest range, in days, that is zero-filled day by day.
pub const MAX_FILLED_DAYS: i64 = 3660;

/// Daily session series for the chart.
///
/// With ISO bounds the series has exactly one point per calendar day of the
/// inclusive range, zero-filled. With relative bounds ("7daysAgo") or a range
/// longer than [`MAX_FILLED_DAYS`] the rows are returned in upstream order.
pub fn daily_series(rows: &[ReportRow], range: &DateRange) -> Vec<ChartPoint> {
    let points: Vec<ChartPoint> = rows
        .iter()
        .filter_map(|row| {
            row.dimension(0).map(|raw| ChartPoint {
                date: format_report_date(raw),
                sessions: row.metric_u64(0),
            })
        })
        .collect();

    let (start, end) = match (parse_iso_date(&range.start_date), parse_iso_date(&range.end_date)) {
        (Some(start), Some(end))
            if start <= end && end.signed_duration_since(start).num_days() < MAX_FILLED_DAYS =>
        {
            (start, end)
        }
        _ => return points,
    };

    let mut by_date: HashMap<String, u64> = HashMap::new();
    for point in points {
        *by_date.entry(point.date).or_insert(0) += point.sessions;
    }

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| {
            let date = day.format("%Y-%m-%d").to_string();
            let sessions = by_date.get(&date).copied().unwrap_or(0);
            ChartPoint { date, sessions }
        })
        .collect()
}

/// Totals from the dimensionless report, which has a single row.
///
/// Metric order: sessions, totalUsers, screenPageViews, bounceRate,
/// averageSessionDuration, conversions.
pub fn aggregate_metrics(report: &RunReportResponse) -> AnalyticsMetrics {
    match report.rows.first() {
        Some(row) => AnalyticsMetrics {
            sessions: row.metric_u64(0),
            users: row.metric_u64(1),
            page_views: row.metric_u64(2),
            bounce_rate: row.metric_f64(3),
            avg_session_duration: row.metric_f64(4),
            conversions: row.metric_u64(5),
        },
        None => AnalyticsMetrics::default(),
    }
}

pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Accepts `properties/123` or a bare `123`.
pub fn normalize_property_id(property_id: &str) -> String {
    let trimmed = property_id.trim();
    if trimmed.starts_with("properties/") {
        trimmed.to_string()
    } else {
        format!("properties/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: serde_json::Value) -> Vec<ReportRow> {
        serde_json::from_value(value).unwrap()
    }

    fn dim_row(dimension: &str, metrics: &[&str]) -> serde_json::Value {
        json!({
            "dimensionValues": [{ "value": dimension }],
            "metricValues": metrics.iter().map(|m| json!({ "value": m })).collect::<Vec<_>>(),
        })
    }

    #[test]
    fn test_format_report_date() {
        assert_eq!(format_report_date("20240115"), "2024-01-15");
        assert_eq!(format_report_date("2024-01-15"), "2024-01-15");
        assert_eq!(format_report_date("2024011"), "2024011");
    }

    #[test]
    fn test_normalize_channel() {
        assert_eq!(normalize_channel("Paid Social"), ChannelCategory::Social);
        assert_eq!(normalize_channel("Organic Social"), ChannelCategory::Social);
        assert_eq!(normalize_channel("(none)"), ChannelCategory::Direct);
        assert_eq!(normalize_channel("Direct"), ChannelCategory::Direct);
        assert_eq!(normalize_channel("Organic Search"), ChannelCategory::Organic);
        assert_eq!(normalize_channel("Organic Shopping"), ChannelCategory::Organic);
        assert_eq!(normalize_channel("Email"), ChannelCategory::Email);
        assert_eq!(normalize_channel("Referral"), ChannelCategory::Referral);
        assert_eq!(normalize_channel("Unassigned"), ChannelCategory::Unassigned);
        assert_eq!(normalize_channel("Affiliate"), ChannelCategory::Other("Affiliate".to_string()));
        assert_eq!(normalize_channel("Paid Search"), ChannelCategory::Other("Paid Search".to_string()));
    }

    #[test]
    fn test_traffic_sources_merge_by_category() {
        let rows = rows(json!([
            dim_row("Organic Search", &["50"]),
            dim_row("Paid Social", &["20"]),
            dim_row("Organic Social", &["15"]),
            dim_row("Direct", &["40"]),
            dim_row("(none)", &["5"]),
            dim_row("Affiliates", &["2"]),
        ]));

        let sources = aggregate_traffic_sources(&rows);
        let summary: Vec<(String, u64)> = sources
            .iter()
            .map(|s| (s.name.to_string(), s.value))
            .collect();

        assert_eq!(summary, vec![
            ("Organic".to_string(), 50),
            ("Direct".to_string(), 45),
            ("Social".to_string(), 35),
            ("Affiliates".to_string(), 2),
        ]);
    }

    #[test]
    fn test_country_rows_drop_not_set() {
        let rows = rows(json!([
            dim_row("United States", &["80", "70", "200", "0.41", "93.5"]),
            dim_row("(not set)", &["30", "30", "31", "0.9", "1.0"]),
            dim_row("(Not Set)", &["3", "3", "3", "0.9", "1.0"]),
            dim_row("Canada", &["10", "9", "25", "0.5", "60"]),
        ]));

        let countries = country_rows(&rows);
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[0].country, "United States");
        assert_eq!(countries[1].country, "Canada");
        assert_eq!(countries[1].sessions, 10);
        assert_eq!(countries[1].users, 9);
        assert_eq!(countries[1].page_views, 25);
        assert_eq!(countries[1].bounce_rate, 0.5);
        assert_eq!(countries[1].avg_session_duration, 60.0);
    }

    #[test]
    fn test_country_rows_default_missing_metrics() {
        let rows = rows(json!([dim_row("Japan", &["4"])]));
        let countries = country_rows(&rows);
        assert_eq!(countries[0].users, 0);
        assert_eq!(countries[0].bounce_rate, 0.0);
    }

    #[test]
    fn test_daily_series_fills_gaps() {
        let rows = rows(json!([
            dim_row("20240101", &["7"]),
            dim_row("20240103", &["3"]),
        ]));

        let series = daily_series(&rows, &DateRange::new("2024-01-01", "2024-01-04"));
        assert_eq!(series, vec![
            ChartPoint { date: "2024-01-01".to_string(), sessions: 7 },
            ChartPoint { date: "2024-01-02".to_string(), sessions: 0 },
            ChartPoint { date: "2024-01-03".to_string(), sessions: 3 },
            ChartPoint { date: "2024-01-04".to_string(), sessions: 0 },
        ]);
    }

    #[test]
    fn test_daily_series_with_relative_dates_keeps_rows() {
        let rows = rows(json!([
            dim_row("20240102", &["1"]),
            dim_row("20240101", &["2"]),
        ]));

        let series = daily_series(&rows, &DateRange::new("7daysAgo", "today"));
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, "2024-01-02");
    }

    #[test]
    fn test_daily_series_does_not_fill_huge_ranges() {
        let rows = rows(json!([
            dim_row("20150814", &["5"]),
            dim_row("20240101", &["2"]),
        ]));

        let series = daily_series(&rows, &DateRange::new("2015-08-14", "2999-12-31"));
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].date, "2024-01-01");

        let decade = daily_series(&[], &DateRange::new("2015-01-01", "2024-12-31"));
        assert_eq!(decade.len(), 3653);
    }

    #[test]
    fn test_aggregate_metrics() {
        let report: RunReportResponse = serde_json::from_value(json!({
            "rows": [{
                "metricValues": [
                    { "value": "120" }, { "value": "95" }, { "value": "410" },
                    { "value": "0.52" }, { "value": "143.2" }, { "value": "6" }
                ]
            }]
        }))
        .unwrap();

        let metrics = aggregate_metrics(&report);
        assert_eq!(metrics.sessions, 120);
        assert_eq!(metrics.users, 95);
        assert_eq!(metrics.page_views, 410);
        assert_eq!(metrics.bounce_rate, 0.52);
        assert_eq!(metrics.avg_session_duration, 143.2);
        assert_eq!(metrics.conversions, 6);

        assert_eq!(aggregate_metrics(&RunReportResponse::default()), AnalyticsMetrics::default());
    }

    #[test]
    fn test_normalize_property_id() {
        assert_eq!(normalize_property_id("123456"), "properties/123456");
        assert_eq!(normalize_property_id("properties/123456"), "properties/123456");
    }
}
