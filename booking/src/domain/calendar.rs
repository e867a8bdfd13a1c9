//! Calendar domain logic for the booking widget.
//!
//! This module owns the date arithmetic behind the month grid: leap years,
//! month lengths, the weekday of the first day, cursor navigation and the
//! generation of the grid itself. Everything here is a pure function of
//! its inputs so the grid can be tested without any rendering surface.

use chrono::{Datelike, NaiveDate};
use shared::{format_date_key, month_name, DayClassification};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::errors::BookingError;

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// A local calendar date, rendered and parsed as YYYY-MM-DD
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_date_key(self.0))
    }
}

impl FromStr for DateKey {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // chrono accepts unpadded fields; the canonical key is always 10 chars
        if s.len() != 10 {
            return Err(BookingError::InvalidDateKey(s.to_string()));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| BookingError::InvalidDateKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDirection {
    Previous,
    Next,
}

/// The month/year currently displayed by the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    /// 1 = January
    month: u32,
    year: i32,
}

impl CalendarCursor {
    pub fn new(month: u32, year: i32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { month, year })
        } else {
            None
        }
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn navigate(&mut self, direction: NavigationDirection) {
        let (month, year) = match direction {
            NavigationDirection::Previous => previous_month(self.month, self.year),
            NavigationDirection::Next => next_month(self.month, self.year),
        };
        self.month = month;
        self.year = year;
    }

    pub fn contains(&self, date: &DateKey) -> bool {
        date.month() == self.month && date.year() == self.year
    }

    pub fn title(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }
}

pub fn previous_month(month: u32, year: i32) -> (u32, i32) {
    if month == 1 {
        (12, year - 1)
    } else {
        (month - 1, year)
    }
}

pub fn next_month(month: u32, year: i32) -> (u32, i32) {
    if month == 12 {
        (1, year + 1)
    } else {
        (month + 1, year)
    }
}

/// Check if a year is a leap year
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Get the number of days in a given month and year
pub fn days_in_month(month: u32, year: i32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Get the first day of month (0 = Sunday, 1 = Monday, etc.)
pub fn first_day_of_month(month: u32, year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.weekday().num_days_from_sunday())
        .unwrap_or(0)
}

/// Availability shown on a month cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAvailability {
    /// Classification not loaded yet
    Unknown,
    Past,
    Classified(DayClassification),
}

/// Type of calendar cell for explicit rendering logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCell {
    /// Dimmed trailing day of the previous month, used for grid alignment
    PaddingBefore { day: u32 },
    MonthDay(MonthDayCell),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthDayCell {
    pub day: u32,
    pub date: DateKey,
    pub is_past: bool,
    pub availability: CellAvailability,
    pub is_selected: bool,
}

impl MonthDayCell {
    pub fn is_interactive(&self) -> bool {
        !self.is_past && self.availability != CellAvailability::Classified(DayClassification::Full)
    }

    pub fn css_classes(&self) -> String {
        let mut classes = vec!["calendar-day"];
        match self.availability {
            CellAvailability::Past => classes.push("calendar-date-past"),
            CellAvailability::Unknown => classes.push("calendar-date-unknown"),
            CellAvailability::Classified(classification) => {
                classes.push(classification.css_class())
            }
        }
        if self.is_selected {
            classes.push("selected");
        }
        classes.join(" ")
    }
}

/// Rendered month: header title, weekday labels and a 7-column cell list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarGrid {
    pub month: u32,
    pub year: i32,
    pub title: String,
    pub first_day_of_week: u32,
    pub days_in_month: u32,
    pub cells: Vec<CalendarCell>,
}

impl CalendarGrid {
    pub fn weekday_labels(&self) -> [&'static str; 7] {
        WEEKDAY_LABELS
    }

    pub fn leading_cells(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, CalendarCell::PaddingBefore { .. }))
            .count()
    }

    pub fn month_days(&self) -> impl Iterator<Item = &MonthDayCell> {
        self.cells.iter().filter_map(|c| match c {
            CalendarCell::MonthDay(cell) => Some(cell),
            CalendarCell::PaddingBefore { .. } => None,
        })
    }

    pub fn day(&self, date: &DateKey) -> Option<&MonthDayCell> {
        self.month_days().find(|cell| cell.date == *date)
    }

    pub fn selected_days(&self) -> Vec<&MonthDayCell> {
        self.month_days().filter(|cell| cell.is_selected).collect()
    }

    /// Cells split into week rows; the last row may be short
    pub fn rows(&self) -> Vec<&[CalendarCell]> {
        self.cells.chunks(7).collect()
    }
}

/// Build the grid for the cursor month.
///
/// `today` is the local date; anything strictly before it is past.
/// `classifications` only needs entries for days already classified.
pub fn generate_calendar_grid(
    cursor: &CalendarCursor,
    today: NaiveDate,
    classifications: &HashMap<DateKey, DayClassification>,
    selected: Option<&DateKey>,
) -> CalendarGrid {
    let month = cursor.month();
    let year = cursor.year();
    let first_day = first_day_of_month(month, year);
    let day_count = days_in_month(month, year);
    let (prev_month, prev_year) = previous_month(month, year);
    let prev_day_count = days_in_month(prev_month, prev_year);

    log::debug!(
        "🗓️ Generating grid for {}/{}: {} days, first weekday {}",
        month,
        year,
        day_count,
        first_day
    );

    let mut cells = Vec::with_capacity((first_day + day_count) as usize);

    for i in (1..=first_day).rev() {
        cells.push(CalendarCell::PaddingBefore {
            day: prev_day_count - i + 1,
        });
    }

    for day in 1..=day_count {
        let Some(date) = DateKey::from_ymd(year, month, day) else {
            continue;
        };
        let is_past = date.date() < today;
        let availability = if is_past {
            CellAvailability::Past
        } else {
            classifications
                .get(&date)
                .map(|c| CellAvailability::Classified(*c))
                .unwrap_or(CellAvailability::Unknown)
        };
        cells.push(CalendarCell::MonthDay(MonthDayCell {
            day,
            date,
            is_past,
            availability,
            is_selected: selected == Some(&date),
        }));
    }

    CalendarGrid {
        month,
        year,
        title: cursor.title(),
        first_day_of_week: first_day,
        days_in_month: day_count,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn empty_grid(month: u32, year: i32, today: NaiveDate) -> CalendarGrid {
        let cursor = CalendarCursor::new(month, year).unwrap();
        generate_calendar_grid(&cursor, today, &HashMap::new(), None)
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(1, 2025), 31);
        assert_eq!(days_in_month(2, 2025), 28);
        assert_eq!(days_in_month(2, 2024), 29);
        assert_eq!(days_in_month(2, 1900), 28);
        assert_eq!(days_in_month(2, 2000), 29);
        assert_eq!(days_in_month(4, 2025), 30);
        assert_eq!(days_in_month(12, 2025), 31);
    }

    #[test]
    fn test_is_leap_year() {
        assert!(is_leap_year(2024));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2025));
    }

    #[test]
    fn test_navigation_wraps_year() {
        assert_eq!(previous_month(6, 2025), (5, 2025));
        assert_eq!(previous_month(1, 2025), (12, 2024));
        assert_eq!(next_month(6, 2025), (7, 2025));
        assert_eq!(next_month(12, 2025), (1, 2026));

        let mut cursor = CalendarCursor::new(1, 2024).unwrap();
        cursor.navigate(NavigationDirection::Previous);
        assert_eq!((cursor.month(), cursor.year()), (12, 2023));
        cursor.navigate(NavigationDirection::Next);
        assert_eq!((cursor.month(), cursor.year()), (1, 2024));
    }

    #[test]
    fn test_cursor_rejects_invalid_month() {
        assert!(CalendarCursor::new(0, 2025).is_none());
        assert!(CalendarCursor::new(13, 2025).is_none());
    }

    #[test]
    fn test_leading_cells_match_first_weekday_for_every_month() {
        let today = ymd(1999, 1, 1);
        for year in [2023, 2024, 2025, 2100] {
            for month in 1..=12 {
                let grid = empty_grid(month, year, today);
                let expected = ymd(year, month, 1).weekday().num_days_from_sunday() as usize;
                assert_eq!(grid.leading_cells(), expected, "{}/{}", month, year);
                assert_eq!(grid.month_days().count() as u32, days_in_month(month, year));
            }
        }
    }

    #[test]
    fn test_march_2024_starts_on_friday() {
        let grid = empty_grid(3, 2024, ymd(2024, 3, 1));
        assert_eq!(grid.first_day_of_week, 5);
        assert_eq!(grid.month_days().count(), 31);
        assert_eq!(grid.title, "March 2024");

        // Filler shows the last five days of February 2024, including the 29th
        let padding: Vec<u32> = grid
            .cells
            .iter()
            .filter_map(|c| match c {
                CalendarCell::PaddingBefore { day } => Some(*day),
                _ => None,
            })
            .collect();
        assert_eq!(padding, vec![25, 26, 27, 28, 29]);
    }

    #[test]
    fn test_february_2024_has_single_leap_day() {
        let grid = empty_grid(2, 2024, ymd(2024, 2, 1));
        let leap_days: Vec<_> = grid
            .month_days()
            .filter(|c| c.date.to_string() == "2024-02-29")
            .collect();
        assert_eq!(leap_days.len(), 1);
        assert_eq!(grid.month_days().last().unwrap().day, 29);
    }

    #[test]
    fn test_past_days_are_not_interactive() {
        let grid = empty_grid(6, 2025, ymd(2025, 6, 15));
        let day_14 = grid.day(&DateKey::from_ymd(2025, 6, 14).unwrap()).unwrap();
        let day_15 = grid.day(&DateKey::from_ymd(2025, 6, 15).unwrap()).unwrap();
        assert!(day_14.is_past);
        assert!(!day_14.is_interactive());
        assert_eq!(day_14.availability, CellAvailability::Past);
        assert!(!day_15.is_past);
        assert!(day_15.is_interactive());
    }

    #[test]
    fn test_full_days_are_not_interactive() {
        let cursor = CalendarCursor::new(6, 2025).unwrap();
        let full = DateKey::from_ymd(2025, 6, 20).unwrap();
        let partial = DateKey::from_ymd(2025, 6, 21).unwrap();
        let mut classifications = HashMap::new();
        classifications.insert(full, DayClassification::Full);
        classifications.insert(partial, DayClassification::Partial);

        let grid =
            generate_calendar_grid(&cursor, ymd(2025, 6, 1), &classifications, Some(&partial));

        assert!(!grid.day(&full).unwrap().is_interactive());
        let partial_cell = grid.day(&partial).unwrap();
        assert!(partial_cell.is_interactive());
        assert!(partial_cell.css_classes().contains("calendar-date-partial"));
        assert!(partial_cell.css_classes().contains("selected"));
        assert_eq!(grid.selected_days().len(), 1);
    }

    #[test]
    fn test_date_key_parsing() {
        let key: DateKey = "2024-02-29".parse().unwrap();
        assert_eq!(key.to_string(), "2024-02-29");
        assert!("2025-02-29".parse::<DateKey>().is_err());
        assert!("2024-2-9".parse::<DateKey>().is_err());
        assert!("not-a-date".parse::<DateKey>().is_err());
    }

    #[test]
    fn test_rows_have_seven_columns() {
        let grid = empty_grid(3, 2024, ymd(2024, 3, 1));
        let rows = grid.rows();
        assert!(rows[..rows.len() - 1].iter().all(|r| r.len() == 7));
        assert_eq!(grid.weekday_labels()[0], "Sun");
    }
}
