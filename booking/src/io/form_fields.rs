//! Output fields read by the appointment form.
//!
//! The widget only writes plain strings here (`YYYY-MM-DD` and `HH:MM`);
//! submitting them is left to whoever owns the form.

use serde::{Deserialize, Serialize};
use shared::BookingSelection;

/// The pair of date/time fields the widget writes its selection into
pub trait FormFields: Send {
    fn set_date(&mut self, value: &str);
    fn set_time(&mut self, value: &str);
    fn date(&self) -> Option<String>;
    fn time(&self) -> Option<String>;

    /// Empty both fields
    fn clear(&mut self);

    fn selection(&self) -> BookingSelection {
        BookingSelection {
            selected_date: self.date(),
            selected_time: self.time(),
        }
    }
}

/// In-memory output fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOutputs {
    pub selected_date: Option<String>,
    pub selected_time: Option<String>,
}

impl FormOutputs {
    /// Serialize the current values for a form submission
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.selection())
    }
}

impl FormFields for FormOutputs {
    fn set_date(&mut self, value: &str) {
        self.selected_date = Some(value.to_string());
    }

    fn set_time(&mut self, value: &str) {
        self.selected_time = Some(value.to_string());
    }

    fn date(&self) -> Option<String> {
        self.selected_date.clone()
    }

    fn time(&self) -> Option<String> {
        self.selected_time.clone()
    }

    fn clear(&mut self) {
        self.selected_date = None;
        self.selected_time = None;
    }
}
