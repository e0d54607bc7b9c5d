//! Calendar dimension generation.
//!
//! [`generate_calendar`] is a pure function of the year bounds: one
//! [`CalendarDay`] per day from January 1 of the start year to December 31
//! of the end year. [`build_calendar`] replaces `dimensions.calendar` with
//! those rows.

use crate::constants::{CALENDAR_TABLE, DIMENSIONS_SCHEMA};
use crate::db::Database;
use crate::error::{IngestError, Result};
use crate::manifest::TableRef;
use chrono::{Datelike, NaiveDate};
use duckdb::params;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Inclusive year bounds for the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarRange {
    pub start_year: i32,
    pub end_year: i32,
}

impl CalendarRange {
    pub fn new(start_year: i32, end_year: i32) -> Result<Self> {
        let range = Self {
            start_year,
            end_year,
        };
        range.validate()?;
        Ok(range)
    }

    /// Years must keep the date key at eight digits and be in order
    pub fn validate(&self) -> Result<()> {
        if !(1000..=9999).contains(&self.start_year) || !(1000..=9999).contains(&self.end_year) {
            return Err(IngestError::configuration(format!(
                "Calendar years must be between 1000 and 9999, got {}-{}",
                self.start_year, self.end_year
            )));
        }
        if self.start_year > self.end_year {
            return Err(IngestError::configuration(format!(
                "Calendar start year {} is after end year {}",
                self.start_year, self.end_year
            )));
        }
        Ok(())
    }

    fn bounds(&self) -> Result<(NaiveDate, NaiveDate)> {
        self.validate()?;
        let first = NaiveDate::from_ymd_opt(self.start_year, 1, 1);
        let last = NaiveDate::from_ymd_opt(self.end_year, 12, 31);
        first.zip(last).ok_or_else(|| {
            IngestError::configuration(format!(
                "Calendar years {}-{} are out of range",
                self.start_year, self.end_year
            ))
        })
    }

    /// Number of days in the range, 0 if the range is invalid
    pub fn day_count(&self) -> usize {
        self.bounds()
            .map(|(first, last)| (last - first).num_days() as usize + 1)
            .unwrap_or(0)
    }
}

/// One row of the calendar dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub date_key: i32,
    pub year: i32,
    pub quarter: i32,
    pub month: i32,
    pub month_name: &'static str,
    pub week: i32,
    pub day: i32,
    /// Monday = 1 through Sunday = 7
    pub day_of_week: i32,
    pub day_name: &'static str,
    pub is_weekend: bool,
    pub is_month_start: bool,
    pub is_month_end: bool,
    pub is_quarter_start: bool,
    pub is_quarter_end: bool,
    pub is_year_start: bool,
    pub is_year_end: bool,
}

impl CalendarDay {
    /// Derive every attribute from the date alone
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        let month = date.month();
        let day = date.day();
        let day_of_week = date.weekday().number_from_monday();

        let is_month_start = day == 1;
        let is_month_end = date.succ_opt().is_none_or(|next| next.month() != month);
        let quarter_first_month = month % 3 == 1;
        let quarter_last_month = month % 3 == 0;

        Self {
            date,
            date_key: year * 10_000 + (month * 100 + day) as i32,
            year,
            quarter: ((month - 1) / 3 + 1) as i32,
            month: month as i32,
            month_name: MONTH_NAMES[month as usize - 1],
            week: date.iso_week().week() as i32,
            day: day as i32,
            day_of_week: day_of_week as i32,
            day_name: DAY_NAMES[day_of_week as usize - 1],
            is_weekend: day_of_week >= 6,
            is_month_start,
            is_month_end,
            is_quarter_start: is_month_start && quarter_first_month,
            is_quarter_end: is_month_end && quarter_last_month,
            is_year_start: is_month_start && month == 1,
            is_year_end: is_month_end && month == 12,
        }
    }
}

/// Enumerate every day in the range
pub fn generate_calendar(range: CalendarRange) -> Result<Vec<CalendarDay>> {
    let (first, last) = range.bounds()?;
    Ok(first
        .iter_days()
        .take_while(|date| *date <= last)
        .map(CalendarDay::from_date)
        .collect())
}

fn calendar_table() -> TableRef {
    TableRef {
        schema: DIMENSIONS_SCHEMA.to_string(),
        table: CALENDAR_TABLE.to_string(),
    }
}

/// Replace `dimensions.calendar` with a freshly generated calendar
pub fn build_calendar(db: &mut Database, range: CalendarRange) -> Result<usize> {
    let days = generate_calendar(range)?;
    let table = calendar_table().qualified();

    let tx = db.connection_mut().transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
             date_key INTEGER PRIMARY KEY,
             date DATE NOT NULL,
             year INTEGER NOT NULL,
             quarter INTEGER NOT NULL,
             month INTEGER NOT NULL,
             month_name VARCHAR NOT NULL,
             week INTEGER NOT NULL,
             day INTEGER NOT NULL,
             day_of_week INTEGER NOT NULL,
             day_name VARCHAR NOT NULL,
             is_weekend INTEGER NOT NULL,
             is_month_start INTEGER NOT NULL,
             is_month_end INTEGER NOT NULL,
             is_quarter_start INTEGER NOT NULL,
             is_quarter_end INTEGER NOT NULL,
             is_year_start INTEGER NOT NULL,
             is_year_end INTEGER NOT NULL
         );"
    ))?;

    {
        let mut appender = tx.appender_to_db(CALENDAR_TABLE, DIMENSIONS_SCHEMA)?;
        for day in &days {
            appender.append_row(params![
                day.date_key,
                day.date.format("%Y-%m-%d").to_string(),
                day.year,
                day.quarter,
                day.month,
                day.month_name,
                day.week,
                day.day,
                day.day_of_week,
                day.day_name,
                i32::from(day.is_weekend),
                i32::from(day.is_month_start),
                i32::from(day.is_month_end),
                i32::from(day.is_quarter_start),
                i32::from(day.is_quarter_end),
                i32::from(day.is_year_start),
                i32::from(day.is_year_end),
            ])?;
        }
        appender.flush()?;
    }
    tx.commit()?;

    debug!("Appended {} calendar rows", days.len());
    info!(
        "Created calendar dimension: {} rows ({}-{})",
        days.len(),
        range.start_year,
        range.end_year
    );
    Ok(days.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_row_count_matches_day_count() {
        for (start, end, expected) in [(2019, 2019, 365), (2020, 2020, 366), (2016, 2025, 3653)] {
            let range = CalendarRange::new(start, end).unwrap();
            let days = generate_calendar(range).unwrap();
            assert_eq!(days.len(), expected, "{start}-{end}");
            assert_eq!(range.day_count(), expected);
        }
    }

    #[test]
    fn test_date_keys_strictly_increase() {
        let days = generate_calendar(CalendarRange::new(2016, 2018).unwrap()).unwrap();
        assert!(days.windows(2).all(|w| w[0].date_key < w[1].date_key));
        assert_eq!(days.first().unwrap().date_key, 20160101);
        assert_eq!(days.last().unwrap().date_key, 20181231);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let range = CalendarRange::new(2017, 2018).unwrap();
        assert_eq!(generate_calendar(range).unwrap(), generate_calendar(range).unwrap());
    }

    #[test]
    fn test_day_attributes() {
        // 2018-06-15 was a Friday in ISO week 24
        let day = CalendarDay::from_date(date(2018, 6, 15));
        assert_eq!(day.date_key, 20180615);
        assert_eq!(day.quarter, 2);
        assert_eq!(day.month_name, "June");
        assert_eq!(day.week, 24);
        assert_eq!(day.day_of_week, 5);
        assert_eq!(day.day_name, "Friday");
        assert!(!day.is_weekend);
        assert!(!day.is_month_start && !day.is_month_end);

        // 2017-01-01 was a Sunday belonging to ISO week 52 of 2016
        let day = CalendarDay::from_date(date(2017, 1, 1));
        assert_eq!(day.day_of_week, 7);
        assert_eq!(day.day_name, "Sunday");
        assert_eq!(day.week, 52);
        assert!(day.is_weekend);
        assert!(day.is_month_start && day.is_quarter_start && day.is_year_start);
        assert!(!day.is_year_end);
    }

    #[test]
    fn test_period_end_flags() {
        let leap_feb = CalendarDay::from_date(date(2020, 2, 29));
        assert!(leap_feb.is_month_end);
        assert!(!leap_feb.is_quarter_end);

        let feb_28 = CalendarDay::from_date(date(2020, 2, 28));
        assert!(!feb_28.is_month_end);

        let sep_30 = CalendarDay::from_date(date(2021, 9, 30));
        assert!(sep_30.is_month_end && sep_30.is_quarter_end && !sep_30.is_year_end);
        assert_eq!(sep_30.quarter, 3);

        let dec_31 = CalendarDay::from_date(date(2025, 12, 31));
        assert!(dec_31.is_month_end && dec_31.is_quarter_end && dec_31.is_year_end);
        assert_eq!(dec_31.quarter, 4);

        let oct_1 = CalendarDay::from_date(date(2021, 10, 1));
        assert!(oct_1.is_quarter_start && !oct_1.is_year_start);
    }

    #[test]
    fn test_quarter_boundaries() {
        let quarters: Vec<i32> = (1..=12)
            .map(|m| CalendarDay::from_date(date(2019, m, 1)).quarter)
            .collect();
        assert_eq!(quarters, vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(CalendarRange::new(2021, 2020).is_err());
        assert!(CalendarRange::new(999, 2020).is_err());
        assert_eq!(
            CalendarRange {
                start_year: 2021,
                end_year: 2020
            }
            .day_count(),
            0
        );
    }

    #[test]
    fn test_build_calendar_replaces_table() {
        let mut db = Database::open_in_memory().unwrap();
        db.connection()
            .execute_batch("CREATE SCHEMA dimensions")
            .unwrap();

        let range = CalendarRange::new(2020, 2020).unwrap();
        assert_eq!(build_calendar(&mut db, range).unwrap(), 366);
        assert_eq!(build_calendar(&mut db, range).unwrap(), 366);
        assert_eq!(db.count_rows(&calendar_table()).unwrap(), 366);

        let (weekday, flag): (String, i32) = db
            .connection()
            .query_row(
                "SELECT day_name, is_weekend FROM dimensions.calendar WHERE date = DATE '2020-02-29'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(weekday, "Saturday");
        assert_eq!(flag, 1);
    }

    #[test]
    fn test_default_range_bulk_loads_into_file_database() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut db = Database::open(&temp_dir.path().join("calendar.db")).unwrap();
        db.connection()
            .execute_batch("CREATE SCHEMA dimensions")
            .unwrap();

        let range = CalendarRange::new(2016, 2025).unwrap();
        let start = std::time::Instant::now();
        assert_eq!(build_calendar(&mut db, range).unwrap(), 3653);
        let elapsed = start.elapsed();

        // Row-at-a-time inserts take tens of seconds for this range
        assert!(elapsed.as_secs() < 5, "calendar build took {elapsed:?}");

        let (first, last, leap_day): (String, String, i64) = db
            .connection()
            .query_row(
                "SELECT CAST(MIN(date) AS VARCHAR), CAST(MAX(date) AS VARCHAR), \
                        COUNT(*) FILTER (WHERE date_key = 20240229 AND date = DATE '2024-02-29') \
                 FROM dimensions.calendar",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(first, "2016-01-01");
        assert_eq!(last, "2025-12-31");
        assert_eq!(leap_day, 1);
        db.close().unwrap();
    }
}
