//! Appointment booking calendar.
//!
//! A month-grid calendar with per-day availability, a half-hour slot picker
//! and the alerts shown around it. The widget state is plain Rust and is
//! driven asynchronously by [`BookingController`] against any
//! [`AvailabilityService`].

pub mod config;
pub mod domain;
pub mod io;

pub use config::{BookingConfig, FetchPolicy};
pub use domain::{
    AvailabilityService, BookingController, BookingError, BookingResult, BookingWidget,
    CalendarGrid, DateKey, NavigationDirection, SimulatedAvailabilityService, SlotBoard, SlotTime,
};
pub use io::{FormFields, FormOutputs, LogNotifier, Notifier};

use std::sync::Arc;

/// Controller backed by the simulated service, the log notifier and the system clock
pub fn simulated_controller(config: &BookingConfig) -> BookingResult<BookingController> {
    let service = SimulatedAvailabilityService::from_config(config, Arc::new(domain::UuidRandom))?;
    Ok(BookingController::new(
        Arc::new(service),
        Arc::new(LogNotifier::new(&config.alerts)),
        Arc::new(domain::SystemClock),
        config.fetch.policy(),
        config.slots.universe()?,
        Box::new(FormOutputs::default()),
    ))
}
