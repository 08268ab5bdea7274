//! Sowing time-window resolution
//!
//! Bookings are bucketed into fixed 5-day windows aligned to the calendar
//! month: days 1-5, 6-10, 11-15, 16-20, 21-25, 26-30, and whatever remains
//! of the month. The final window of a month is clamped to its last day and
//! may cover fewer than 5 days. Alignment is by day-of-month, not a rolling
//! lookback, so two bookings one day apart land in different schedules when
//! they straddle a slot boundary (day 5 vs day 6).

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Calendar days in a full sowing window
pub const WINDOW_DAYS: u32 = 5;

/// A 5-calendar-day aggregation window, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SowingWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SowingWindow {
    /// Window start as an instant: 00:00:00.000 on the start date
    pub fn start_at(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start_date.and_time(NaiveTime::MIN))
    }

    /// Window end as an instant: 23:59:59.999 on the end date
    pub fn end_at(&self) -> DateTime<Utc> {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        Utc.from_utc_datetime(&self.end_date.and_time(end_of_day))
    }

    /// Display name for a newly created schedule
    pub fn label(&self) -> String {
        format!(
            "Sowing {} - {}",
            self.start_date.format("%d %b %Y"),
            self.end_date.format("%d %b %Y")
        )
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Resolve the sowing window a date belongs to. Pure, no I/O.
pub fn resolve_window(date: NaiveDate) -> SowingWindow {
    let day = date.day();
    let slot_start_day = (day - 1) / WINDOW_DAYS * WINDOW_DAYS + 1;
    // slot_start_day <= day, so the substitution always yields a valid date
    let start_date = date.with_day(slot_start_day).unwrap_or(date);
    let end_day = (slot_start_day + WINDOW_DAYS - 1).min(last_day_of_month(date));
    let end_date = date.with_day(end_day).unwrap_or(date);
    SowingWindow {
        start_date,
        end_date,
    }
}

/// All windows touching the inclusive date span [from, to].
///
/// Each window is re-derived from the day after the previous window's end;
/// month boundaries (where the trailing window is short) are handled without
/// assuming contiguous 5-day strides.
pub fn windows_spanning(from: NaiveDate, to: NaiveDate) -> Vec<SowingWindow> {
    let mut windows = Vec::new();
    if from > to {
        return windows;
    }
    let mut cursor = from;
    loop {
        let window = resolve_window(cursor);
        let window_end = window.end_date;
        windows.push(window);
        if window_end >= to {
            break;
        }
        match window_end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    windows
}

fn last_day_of_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_for_mid_slot_date() {
        let window = resolve_window(date(2024, 6, 3));
        assert_eq!(window.start_date, date(2024, 6, 1));
        assert_eq!(window.end_date, date(2024, 6, 5));
    }

    #[test]
    fn test_slot_boundary_splits_adjacent_days() {
        let before = resolve_window(date(2024, 6, 5));
        let after = resolve_window(date(2024, 6, 6));
        assert_eq!(before.end_date, date(2024, 6, 5));
        assert_eq!(after.start_date, date(2024, 6, 6));
        assert_ne!(before, after);
    }

    #[test]
    fn test_final_window_clamped_to_month_end() {
        let window = resolve_window(date(2024, 1, 31));
        assert_eq!(window.start_date, date(2024, 1, 31));
        assert_eq!(window.end_date, date(2024, 1, 31));
    }

    #[test]
    fn test_trailing_window_of_30_day_month() {
        let window = resolve_window(date(2024, 6, 28));
        assert_eq!(window.start_date, date(2024, 6, 26));
        assert_eq!(window.end_date, date(2024, 6, 30));
    }

    #[test]
    fn test_february_leap_year() {
        let window = resolve_window(date(2024, 2, 27));
        assert_eq!(window.start_date, date(2024, 2, 26));
        assert_eq!(window.end_date, date(2024, 2, 29));
    }

    #[test]
    fn test_february_non_leap_year() {
        let window = resolve_window(date(2023, 2, 28));
        assert_eq!(window.start_date, date(2023, 2, 26));
        assert_eq!(window.end_date, date(2023, 2, 28));
    }

    #[test]
    fn test_window_instants() {
        let window = resolve_window(date(2024, 6, 3));
        assert_eq!(window.start_at().to_rfc3339(), "2024-06-01T00:00:00+00:00");
        assert_eq!(
            window.end_at().to_rfc3339(),
            "2024-06-05T23:59:59.999+00:00"
        );
    }

    #[test]
    fn test_windows_spanning_month_boundary() {
        let windows = windows_spanning(date(2024, 1, 28), date(2024, 2, 4));
        assert_eq!(
            windows,
            vec![
                SowingWindow {
                    start_date: date(2024, 1, 26),
                    end_date: date(2024, 1, 30),
                },
                SowingWindow {
                    start_date: date(2024, 1, 31),
                    end_date: date(2024, 1, 31),
                },
                SowingWindow {
                    start_date: date(2024, 2, 1),
                    end_date: date(2024, 2, 5),
                },
            ]
        );
    }

    #[test]
    fn test_windows_spanning_empty_for_inverted_span() {
        assert!(windows_spanning(date(2024, 6, 10), date(2024, 6, 1)).is_empty());
    }
}
