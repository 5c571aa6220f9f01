//! Pure derivation of the three weather panels from a [`WeatherSnapshot`].

use chrono::{NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::{
    config::Limits,
    model::{ForecastEntry, WeatherSnapshot},
};

const KELVIN_OFFSET: f64 = 273.15;

/// `round(kelvin - 273.15)`, rounding half away from zero.
pub fn kelvin_to_celsius(kelvin: f64) -> i64 {
    (kelvin - KELVIN_OFFSET).round() as i64
}

/// Large icon variant, used for current conditions.
pub fn large_icon_url(icon_host: &str, code: &str) -> String {
    format!("{}/{code}@4x.png", icon_host.trim_end_matches('/'))
}

/// Small icon variant, used for forecast items.
pub fn small_icon_url(icon_host: &str, code: &str) -> String {
    format!("{}/{code}.png", icon_host.trim_end_matches('/'))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentView {
    pub city: String,
    pub temp_c: i64,
    pub description: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyItem {
    /// 12-hour clock label, e.g. `3 PM`.
    pub label: String,
    pub temp_c: i64,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyItem {
    /// Full weekday name, e.g. `Monday`.
    pub weekday: String,
    /// Short month/day of the group's first entry, e.g. `Oct 19`.
    pub date: String,
    pub icon_url: String,
    /// Mean of the group's Kelvin readings, then converted.
    pub temp_c: i64,
}

/// Everything the view draws for a found city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherView {
    pub current: CurrentView,
    pub hourly: Vec<HourlyItem>,
    pub weekly: Vec<DailyItem>,
}

impl WeatherView {
    pub fn build<Tz: TimeZone>(
        snapshot: &WeatherSnapshot,
        limits: &Limits,
        icon_host: &str,
        tz: &Tz,
    ) -> Self {
        let current = &snapshot.current;
        Self {
            current: CurrentView {
                city: current.name.clone(),
                temp_c: kelvin_to_celsius(current.temp_kelvin),
                description: current.description.clone(),
                icon_url: large_icon_url(icon_host, &current.icon),
            },
            hourly: hourly(&snapshot.forecast, limits.hourly_window, icon_host, tz),
            weekly: weekly(&snapshot.forecast, limits.weekly_days, icon_host, tz),
        }
    }
}

/// The first `window` entries, in input order.
pub fn hourly<Tz: TimeZone>(
    entries: &[ForecastEntry],
    window: usize,
    icon_host: &str,
    tz: &Tz,
) -> Vec<HourlyItem> {
    entries
        .iter()
        .take(window)
        .map(|entry| HourlyItem {
            label: local_time(entry.dt, tz)
                .map(|t| t.format("%-I %p").to_string())
                .unwrap_or_default(),
            temp_c: kelvin_to_celsius(entry.temp_kelvin),
            icon_url: small_icon_url(icon_host, &entry.icon),
        })
        .collect()
}

/// Entries grouped by weekday name, keeping the first `max_days` groups in encounter order.
///
/// Grouping is by name rather than by date, so a forecast longer than a week
/// folds later days into the earlier group with the same name.
pub fn weekly<Tz: TimeZone>(
    entries: &[ForecastEntry],
    max_days: usize,
    icon_host: &str,
    tz: &Tz,
) -> Vec<DailyItem> {
    let mut groups: Vec<(String, NaiveDateTime, Vec<&ForecastEntry>)> = Vec::new();

    for entry in entries {
        let Some(time) = local_time(entry.dt, tz) else {
            tracing::debug!(dt = entry.dt, "skipping forecast entry with unrepresentable timestamp");
            continue;
        };
        let weekday = time.format("%A").to_string();

        match groups.iter_mut().find(|(name, _, _)| *name == weekday) {
            Some((_, _, members)) => members.push(entry),
            None => groups.push((weekday, time, vec![entry])),
        }
    }

    groups
        .into_iter()
        .take(max_days)
        .map(|(weekday, first_time, members)| {
            let mean = members.iter().map(|e| e.temp_kelvin).sum::<f64>() / members.len() as f64;
            DailyItem {
                weekday,
                date: first_time.format("%b %-d").to_string(),
                icon_url: small_icon_url(icon_host, &members[0].icon),
                temp_c: kelvin_to_celsius(mean),
            }
        })
        .collect()
}

fn local_time<Tz: TimeZone>(dt: i64, tz: &Tz) -> Option<NaiveDateTime> {
    tz.timestamp_opt(dt, 0).single().map(|t| t.naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CurrentConditions;
    use chrono::{FixedOffset, Utc};

    const HOST: &str = "https://openweathermap.org/img/wn";
    // 2024-01-01 00:00:00 UTC, a Monday.
    const MONDAY: i64 = 1_704_067_200;
    const HOUR: i64 = 3_600;
    const DAY: i64 = 86_400;

    fn entry(dt: i64, temp_kelvin: f64, icon: &str) -> ForecastEntry {
        ForecastEntry { dt, temp_kelvin, icon: icon.to_string() }
    }

    #[test]
    fn kelvin_conversion_rounds() {
        assert_eq!(kelvin_to_celsius(300.0), 27);
        assert_eq!(kelvin_to_celsius(273.15), 0);
        assert_eq!(kelvin_to_celsius(274.0), 1);
        assert_eq!(kelvin_to_celsius(260.0), -13);
    }

    #[test]
    fn icon_urls_use_size_variants() {
        assert_eq!(large_icon_url(HOST, "10d"), "https://openweathermap.org/img/wn/10d@4x.png");
        assert_eq!(
            small_icon_url(&format!("{HOST}/"), "10d"),
            "https://openweathermap.org/img/wn/10d.png"
        );
    }

    #[test]
    fn hourly_takes_first_window_in_order() {
        let entries: Vec<_> = (0..10)
            .map(|i| entry(MONDAY + i * 3 * HOUR, 280.0 + i as f64, &format!("0{i}d")))
            .collect();

        let items = hourly(&entries, 8, HOST, &Utc);

        assert_eq!(items.len(), 8);
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["12 AM", "3 AM", "6 AM", "9 AM", "12 PM", "3 PM", "6 PM", "9 PM"]);
        assert_eq!(items[0].temp_c, kelvin_to_celsius(280.0));
        assert_eq!(items[7].icon_url, small_icon_url(HOST, "07d"));
    }

    #[test]
    fn hourly_labels_follow_time_zone() {
        let entries = [entry(MONDAY, 290.0, "01d")];
        let plus_two = FixedOffset::east_opt(2 * 3_600).unwrap();

        let items = hourly(&entries, 8, HOST, &plus_two);
        assert_eq!(items[0].label, "2 AM");
    }

    #[test]
    fn weekly_groups_by_weekday_and_averages_kelvin() {
        let entries = [
            entry(MONDAY, 280.0, "01d"),
            entry(MONDAY + 12 * HOUR, 281.0, "02d"),
            entry(MONDAY + DAY, 290.0, "10d"),
            entry(MONDAY + DAY + 3 * HOUR, 291.0, "11d"),
        ];

        let days = weekly(&entries, 7, HOST, &Utc);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].weekday, "Monday");
        assert_eq!(days[0].date, "Jan 1");
        assert_eq!(days[0].icon_url, small_icon_url(HOST, "01d"));
        // mean(280.0, 281.0) = 280.5 -> 7.35 -> 7
        assert_eq!(days[0].temp_c, 7);
        assert_eq!(days[1].weekday, "Tuesday");
        assert_eq!(days[1].date, "Jan 2");
        assert_eq!(days[1].icon_url, small_icon_url(HOST, "10d"));
        assert_eq!(days[1].temp_c, 17);
    }

    #[test]
    fn weekly_mean_is_taken_before_conversion() {
        // Rounding each entry first would give 0, 0 and 1, which averages to 0.
        let entries = [
            entry(MONDAY, 273.6, "01d"),
            entry(MONDAY + HOUR, 273.6, "01d"),
            entry(MONDAY + 2 * HOUR, 274.14, "01d"),
        ];
        let days = weekly(&entries, 7, HOST, &Utc);
        // mean 273.78 -> 0.63 -> 1
        assert_eq!(days[0].temp_c, 1);
    }

    #[test]
    fn weekly_caps_groups_in_encounter_order() {
        let entries: Vec<_> = (0..9).map(|d| entry(MONDAY + d * DAY, 280.0, "01d")).collect();

        let days = weekly(&entries, 7, HOST, &Utc);

        let names: Vec<_> = days.iter().map(|d| d.weekday.as_str()).collect();
        assert_eq!(
            names,
            ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
        // Days 8 and 9 fold into the first Monday and Tuesday groups.
        assert_eq!(days[0].date, "Jan 1");
    }

    #[test]
    fn weekly_respects_smaller_cap() {
        let entries: Vec<_> = (0..5).map(|d| entry(MONDAY + d * DAY, 280.0, "01d")).collect();
        let days = weekly(&entries, 3, HOST, &Utc);
        assert_eq!(days.len(), 3);
        assert_eq!(days[2].weekday, "Wednesday");
    }

    #[test]
    fn view_build_uses_limits() {
        let snapshot = WeatherSnapshot {
            current: CurrentConditions {
                name: "Paris".into(),
                temp_kelvin: 300.0,
                description: "clear sky".into(),
                icon: "01d".into(),
                status: "200".into(),
            },
            forecast: (0..16).map(|i| entry(MONDAY + i * 3 * HOUR, 280.0, "01d")).collect(),
        };
        let limits = Limits { hourly_window: 4, weekly_days: 1, ..Limits::default() };

        let view = WeatherView::build(&snapshot, &limits, HOST, &Utc);

        assert_eq!(view.current.city, "Paris");
        assert_eq!(view.current.temp_c, 27);
        assert_eq!(view.current.icon_url, large_icon_url(HOST, "01d"));
        assert_eq!(view.hourly.len(), 4);
        assert_eq!(view.weekly.len(), 1);
    }
}
