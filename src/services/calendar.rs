//! Week-of-month addressing.
//!
//! A month's weeks are 7-day buckets anchored on its first Monday. Week `w`
//! starts `(w - 1) * 7` days after that Monday and its Friday may fall in the
//! following month; dates are reported as reached, never clamped.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::MenuError;
use crate::models::menu::{is_valid_week, TEACHING_DAYS, WEEKS_PER_MONTH};

pub fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, MenuError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| MenuError::Validation(format!("Tháng không hợp lệ: {month}/{year}")))
}

/// Day of month (1–7) of the first Monday.
pub fn first_monday(first: NaiveDate) -> u32 {
    (0..7)
        .map(|offset| first + Duration::days(offset))
        .find(|d| d.weekday() == Weekday::Mon)
        .map(|d| d.day())
        // A 7-day scan always finds a Monday.
        .unwrap_or(1)
}

/// Monday of `week` (1–4) in the given month.
pub fn week_start(week: u8, month: u32, year: i32) -> Result<NaiveDate, MenuError> {
    if !is_valid_week(week) {
        return Err(MenuError::Validation(format!(
            "Tuần phải nằm trong khoảng 1–{WEEKS_PER_MONTH}, nhận {week}"
        )));
    }
    let first = first_of_month(year, month)?;
    let offset = i64::from(first_monday(first)) - 1 + i64::from(week - 1) * 7;
    Ok(first + Duration::days(offset))
}

/// `DD/MM` labels for Monday through Friday of `week`.
pub fn week_dates(week: u8, month: u32, year: i32) -> Result<[String; TEACHING_DAYS], MenuError> {
    let monday = week_start(week, month, year)?;
    Ok(std::array::from_fn(|i| {
        (monday + Duration::days(i as i64)).format("%d/%m").to_string()
    }))
}

/// Week bucket (1–4) that `today` falls into within its own month.
pub fn current_week_of_month(today: NaiveDate) -> u8 {
    let first = today.with_day(1).unwrap_or(today);
    let since_monday = i64::from(today.day()) - i64::from(first_monday(first));
    let week = since_monday.div_euclid(7) + 1;
    week.clamp(1, i64::from(WEEKS_PER_MONTH)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_monday_of_known_months() {
        // June 2024 starts on a Saturday.
        assert_eq!(first_monday(date(2024, 6, 1)), 3);
        // July 2024 starts on a Monday.
        assert_eq!(first_monday(date(2024, 7, 1)), 1);
        // September 2024 starts on a Sunday.
        assert_eq!(first_monday(date(2024, 9, 1)), 2);
    }

    #[test]
    fn week_dates_for_june_2024() {
        assert_eq!(
            week_dates(1, 6, 2024).unwrap(),
            ["03/06", "04/06", "05/06", "06/06", "07/06"]
        );
        assert_eq!(
            week_dates(4, 6, 2024).unwrap(),
            ["24/06", "25/06", "26/06", "27/06", "28/06"]
        );
    }

    #[test]
    fn week_four_can_roll_into_next_month() {
        // First Monday of February 2021 is the 1st; week 4 ends on the 26th.
        assert_eq!(week_dates(4, 2, 2021).unwrap()[4], "26/02");
        // First Monday of February 2026 is the 2nd; week 4 spans 23–27.
        assert_eq!(week_dates(4, 2, 2026).unwrap()[4], "27/02");
        // April 2025: first Monday 7th, week 4 starts the 28th, Friday is 2 May.
        assert_eq!(
            week_dates(4, 4, 2025).unwrap(),
            ["28/04", "29/04", "30/04", "01/05", "02/05"]
        );
    }

    #[test]
    fn week_dates_is_pure() {
        assert_eq!(week_dates(3, 11, 2025).unwrap(), week_dates(3, 11, 2025).unwrap());
    }

    #[test]
    fn rejects_invalid_arguments() {
        assert!(week_dates(0, 6, 2024).is_err());
        assert!(week_dates(5, 6, 2024).is_err());
        assert!(week_dates(1, 13, 2024).is_err());
    }

    #[test]
    fn current_week_buckets() {
        // June 2024: first Monday is the 3rd.
        assert_eq!(current_week_of_month(date(2024, 6, 1)), 1);
        assert_eq!(current_week_of_month(date(2024, 6, 3)), 1);
        assert_eq!(current_week_of_month(date(2024, 6, 9)), 1);
        assert_eq!(current_week_of_month(date(2024, 6, 10)), 2);
        assert_eq!(current_week_of_month(date(2024, 6, 19)), 3);
        assert_eq!(current_week_of_month(date(2024, 6, 24)), 4);
        assert_eq!(current_week_of_month(date(2024, 6, 30)), 4);
        // July 2024 starts on a Monday, so the 29th opens a fifth bucket,
        // which still reads as week 4.
        assert_eq!(current_week_of_month(date(2024, 7, 29)), 4);
    }

    #[test]
    fn current_week_always_in_range() {
        let mut day = date(2024, 1, 1);
        while day < date(2025, 1, 1) {
            let week = current_week_of_month(day);
            assert!((1..=4).contains(&week), "{day} -> {week}");
            day += Duration::days(1);
        }
    }
}
