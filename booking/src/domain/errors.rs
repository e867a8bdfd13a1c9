use std::fmt;

/// What a fetch was issued for; used to tag results and errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    Month { year: i32, month: u32 },
    Day { date: String },
}

impl fmt::Display for FetchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchTarget::Month { year, month } => write!(f, "month {:04}-{:02}", year, month),
            FetchTarget::Day { date } => write!(f, "day {}", date),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Date or slot is not currently selectable
    #[error("Invalid selection: {reason}")]
    InvalidSelection { reason: String },

    #[error("Availability lookup for {target} failed: {message}")]
    AvailabilityFetchFailed {
        target: FetchTarget,
        message: String,
    },

    /// A fetch result arrived for a month or date that is no longer current
    #[error("Discarded stale availability result for {target}")]
    StaleResult { target: FetchTarget },

    #[error("Invalid date key '{0}', expected YYYY-MM-DD")]
    InvalidDateKey(String),

    #[error("Invalid slot time '{0}', expected HH:MM")]
    InvalidSlotTime(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BookingError {
    pub fn invalid_selection(reason: impl Into<String>) -> Self {
        BookingError::InvalidSelection {
            reason: reason.into(),
        }
    }

    /// Stale results are dropped quietly; everything else may be shown to the user.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, BookingError::StaleResult { .. })
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
