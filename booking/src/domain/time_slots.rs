//! Half-hour appointment slots and their 12-hour labels.

use std::fmt;
use std::str::FromStr;

use shared::DaySlotsResponse;

use super::calendar::DateKey;
use super::errors::BookingError;

/// Number of slots in the default 09:00..16:30 universe
pub const DEFAULT_SLOT_COUNT: usize = 16;

/// Start time of a slot, rendered and parsed as 24-hour HH:MM
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime {
    hour: u8,
    minute: u8,
}

impl SlotTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    fn minutes_since_midnight(&self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }

    fn from_minutes(minutes: u32) -> Option<Self> {
        Self::new((minutes / 60) as u8, (minutes % 60) as u8)
    }

    /// Label such as "9:00 AM" or "12:30 PM"
    pub fn display_label(&self) -> String {
        twelve_hour_label(self.hour as u32, &format!("{:02}", self.minute))
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for SlotTime {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BookingError::InvalidSlotTime(s.to_string());
        let (hours, minutes) = s.split_once(':').ok_or_else(invalid)?;
        if hours.len() != 2 || minutes.len() != 2 {
            return Err(invalid());
        }
        let hour = hours.parse::<u8>().map_err(|_| invalid())?;
        let minute = minutes.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

fn twelve_hour_label(hour: u32, minutes: &str) -> String {
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = if hour == 0 {
        12
    } else if hour > 12 {
        hour - 12
    } else {
        hour
    };
    format!("{}:{} {}", display_hour, minutes, suffix)
}

/// Convert 24-hour "HH:MM" into "h:mm AM/PM". Minutes are kept verbatim.
pub fn format_time(time: &str) -> Result<String, BookingError> {
    let invalid = || BookingError::InvalidSlotTime(time.to_string());
    let (hours, minutes) = time.split_once(':').ok_or_else(invalid)?;
    let hour = hours.parse::<u32>().map_err(|_| invalid())?;
    if hour > 23 || minutes.is_empty() {
        return Err(invalid());
    }
    Ok(twelve_hour_label(hour, minutes))
}

/// Ordered slot start times from `first` to `last` inclusive
pub fn slot_universe(first: SlotTime, last: SlotTime, interval_minutes: u32) -> Vec<SlotTime> {
    if interval_minutes == 0 || last < first {
        return Vec::new();
    }
    (first.minutes_since_midnight()..=last.minutes_since_midnight())
        .step_by(interval_minutes as usize)
        .filter_map(SlotTime::from_minutes)
        .collect()
}

/// The fixed 09:00..16:30 half-hour universe
pub fn default_slot_universe() -> Vec<SlotTime> {
    match (SlotTime::new(9, 0), SlotTime::new(16, 30)) {
        (Some(first), Some(last)) => slot_universe(first, last, 30),
        _ => Vec::new(),
    }
}

/// One rendered slot button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotControl {
    pub time: SlotTime,
    pub label: String,
    pub enabled: bool,
    pub is_selected: bool,
}

impl SlotControl {
    pub fn css_classes(&self) -> &'static str {
        match (self.enabled, self.is_selected) {
            (false, _) => "time-slot-btn disabled",
            (true, true) => "time-slot-btn selected",
            (true, false) => "time-slot-btn",
        }
    }
}

/// Content of the time-slot container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotBoard {
    /// No date chosen yet
    Empty,
    Loading { date: DateKey },
    Ready {
        date: DateKey,
        slots: Vec<SlotControl>,
    },
    /// Lookup failed; the container offers a retry
    Failed { date: DateKey, message: String },
}

impl SlotBoard {
    /// Build the ready board by walking the universe in order.
    ///
    /// Slots missing from the response are rendered disabled, and entries
    /// outside the universe are ignored.
    pub fn from_response(
        date: DateKey,
        universe: &[SlotTime],
        response: &DaySlotsResponse,
    ) -> Self {
        let slots = universe
            .iter()
            .map(|time| {
                let key = time.to_string();
                let enabled = response
                    .slots
                    .iter()
                    .any(|slot| slot.time == key && slot.is_available);
                SlotControl {
                    time: *time,
                    label: time.display_label(),
                    enabled,
                    is_selected: false,
                }
            })
            .collect();
        SlotBoard::Ready { date, slots }
    }

    pub fn date(&self) -> Option<&DateKey> {
        match self {
            SlotBoard::Empty => None,
            SlotBoard::Loading { date }
            | SlotBoard::Ready { date, .. }
            | SlotBoard::Failed { date, .. } => Some(date),
        }
    }

    pub fn controls(&self) -> &[SlotControl] {
        match self {
            SlotBoard::Ready { slots, .. } => slots,
            _ => &[],
        }
    }

    pub fn is_enabled(&self, time: &SlotTime) -> bool {
        self.controls().iter().any(|c| c.time == *time && c.enabled)
    }

    pub fn selected(&self) -> Vec<&SlotControl> {
        self.controls().iter().filter(|c| c.is_selected).collect()
    }

    /// Mark exactly one slot as selected, clearing any earlier mark
    pub fn mark_selected(&mut self, time: &SlotTime) {
        if let SlotBoard::Ready { slots, .. } = self {
            for control in slots.iter_mut() {
                control.is_selected = control.time == *time;
            }
        }
    }

    pub fn status_message(&self) -> Option<String> {
        match self {
            SlotBoard::Empty => Some("Please select a date first".to_string()),
            SlotBoard::Loading { .. } => Some("Loading available time slots...".to_string()),
            SlotBoard::Failed { message, .. } => {
                Some(format!("Could not load time slots ({}). Tap to retry.", message))
            }
            SlotBoard::Ready { .. } => None,
        }
    }
}
