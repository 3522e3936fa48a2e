//! Maps a trip's inclusive date range onto 1-based day numbers.
//!
//! All arithmetic happens on [`NaiveDate`]: a trip day is a calendar date,
//! not an instant, so no timezone offset can shift it to a neighbouring day.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::AppError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TripDay {
    pub day_number: u32,
    pub date: NaiveDate,
}

/// Parses a `YYYY-MM-DD` form value as a calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, AppError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
        if trimmed.is_empty() {
            AppError::validation("Please pick a date.")
        } else {
            AppError::validation(format!("'{trimmed}' is not a valid date."))
        }
    })
}

/// Number of days from `start` to `end` inclusive; zero for a reversed range.
pub fn span_len(start: NaiveDate, end: NaiveDate) -> u32 {
    if start > end {
        return 0;
    }
    let days = end.signed_duration_since(start).num_days() + 1;
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Every date of the range paired with its day number, in date order.
/// A reversed range yields nothing.
pub fn expand(start: NaiveDate, end: NaiveDate) -> Vec<TripDay> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .zip(1u32..)
        .map(|(date, day_number)| TripDay { day_number, date })
        .collect()
}

/// The date of day `day_number` (1-based) within the range.
pub fn resolve(start: NaiveDate, end: NaiveDate, day_number: u32) -> Result<NaiveDate, AppError> {
    let total_days = span_len(start, end);
    let out_of_range = AppError::OutOfRange {
        day_number,
        total_days,
    };
    if day_number == 0 || day_number > total_days {
        return Err(out_of_range);
    }
    start
        .checked_add_days(Days::new(u64::from(day_number - 1)))
        .ok_or(out_of_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn expands_inclusive_range() {
        let days = expand(date("2024-03-01"), date("2024-03-03"));
        assert_eq!(
            days,
            vec![
                TripDay {
                    day_number: 1,
                    date: date("2024-03-01")
                },
                TripDay {
                    day_number: 2,
                    date: date("2024-03-02")
                },
                TripDay {
                    day_number: 3,
                    date: date("2024-03-03")
                },
            ]
        );
    }

    #[test]
    fn expansion_steps_one_day_at_a_time_across_month_and_leap_boundaries() {
        let start = date("2024-02-27");
        let end = date("2024-03-02");
        let days = expand(start, end);
        assert_eq!(days.len() as u32, span_len(start, end));
        assert_eq!(days.len(), 5);
        for pair in days.windows(2) {
            assert_eq!(pair[1].day_number, pair[0].day_number + 1);
            assert_eq!(pair[1].date, pair[0].date.succ_opt().unwrap());
        }
        assert_eq!(days[2].date, date("2024-02-29"));
    }

    #[test]
    fn single_day_and_reversed_ranges() {
        let day = date("2024-07-14");
        assert_eq!(expand(day, day).len(), 1);
        assert_eq!(span_len(day, day), 1);

        assert!(expand(date("2024-03-03"), date("2024-03-01")).is_empty());
        assert_eq!(span_len(date("2024-03-03"), date("2024-03-01")), 0);
    }

    #[test]
    fn resolve_hits_both_ends() {
        let start = date("2023-12-30");
        let end = date("2024-01-02");
        assert_eq!(resolve(start, end, 1).unwrap(), start);
        assert_eq!(resolve(start, end, 4).unwrap(), end);
        assert_eq!(resolve(start, end, 3).unwrap(), date("2024-01-01"));
    }

    #[test]
    fn resolve_rejects_day_zero_and_past_the_end() {
        let start = date("2024-03-01");
        let end = date("2024-03-03");
        assert!(matches!(
            resolve(start, end, 0),
            Err(AppError::OutOfRange {
                day_number: 0,
                total_days: 3
            })
        ));
        assert!(matches!(
            resolve(start, end, 4),
            Err(AppError::OutOfRange {
                day_number: 4,
                total_days: 3
            })
        ));
    }

    #[test]
    fn parses_plain_calendar_dates() {
        assert_eq!(parse_date(" 2024-03-01 ").unwrap(), date("2024-03-01"));
        assert!(matches!(parse_date(""), Err(AppError::Validation(_))));
        assert!(matches!(
            parse_date("2024-02-30"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_date("03/01/2024"),
            Err(AppError::Validation(_))
        ));
    }
}
