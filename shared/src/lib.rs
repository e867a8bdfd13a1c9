use serde::{Deserialize, Serialize};
use std::fmt;

/// Request for the per-day availability summary of one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthAvailabilityRequest {
    /// Calendar month, 1 = January
    pub month: u32,
    pub year: i32,
}

/// Per-day availability summary for a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthAvailabilityResponse {
    pub month: u32,
    pub year: i32,
    pub days: Vec<DayAvailabilitySummary>,
}

/// How booked a single day is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailabilitySummary {
    /// Local calendar date in YYYY-MM-DD format
    pub date: String,
    /// Number of slots already taken
    pub booked_slots: u32,
    /// Size of the slot universe for that day
    pub total_slots: u32,
}

impl DayAvailabilitySummary {
    pub fn classification(&self) -> DayClassification {
        DayClassification::from_booked(self.booked_slots, self.total_slots)
    }
}

/// Request for the slot-level availability of a single date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlotsRequest {
    /// Local calendar date in YYYY-MM-DD format
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlotsResponse {
    pub date: String,
    pub slots: Vec<SlotAvailability>,
}

/// Availability of one half-hour slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    /// 24-hour HH:MM
    pub time: String,
    pub is_available: bool,
}

/// Day-level availability bucket used to style a calendar cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayClassification {
    /// Half or fewer of the slots are booked
    Available,
    /// More than half booked, but not all
    Partial,
    /// Every slot is booked; the day cannot be selected
    Full,
}

impl DayClassification {
    pub fn from_booked(booked: u32, total: u32) -> Self {
        if booked >= total {
            DayClassification::Full
        } else if booked * 2 > total {
            DayClassification::Partial
        } else {
            DayClassification::Available
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            DayClassification::Available => "calendar-date-available",
            DayClassification::Partial => "calendar-date-partial",
            DayClassification::Full => "calendar-date-full",
        }
    }
}

/// Severity of a transient toast notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Success,
    Warning,
    Error,
}

impl AlertSeverity {
    /// Anything that is not "error" or "warning" is treated as a success toast.
    pub fn from_label(label: &str) -> Self {
        match label {
            "error" => AlertSeverity::Error,
            "warning" => AlertSeverity::Warning,
            _ => AlertSeverity::Success,
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            AlertSeverity::Success => "success",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Error => "error",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.icon())
    }
}

/// Values written to the two output fields consumed by the booking form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSelection {
    /// YYYY-MM-DD
    pub selected_date: Option<String>,
    /// HH:MM
    pub selected_time: Option<String>,
}

impl BookingSelection {
    pub fn is_complete(&self) -> bool {
        self.selected_date.is_some() && self.selected_time.is_some()
    }
}

/// Format a local calendar date as the canonical YYYY-MM-DD key
pub fn format_date_key(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Get the human-readable name for a month number (1 = January)
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Invalid Month",
    }
}
