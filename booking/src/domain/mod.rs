//! # Domain Module
//!
//! Contains the booking calendar logic, independent of any rendering
//! surface or transport.
//!
//! ## Module Organization
//!
//! - **calendar**: month arithmetic, cursor navigation and grid generation
//! - **time_slots**: the half-hour slot universe, 12-hour labels and the slot board
//! - **widget**: the owned widget state and its select-a-date, select-a-time flow
//! - **availability**: the availability service contract and the simulated placeholder
//! - **controller**: async driver with timeouts, retries and stale-result handling
//! - **clock**: source of "today" for the past-day check
//! - **errors**: domain error type
//!
//! ## Business Rules
//!
//! - Days strictly before today (local midnight) can never be selected
//! - Fully booked days can never be selected
//! - Only slots rendered as enabled can be selected
//! - Navigating months never clears the output fields
//! - A lookup result is applied only if it belongs to the pending request

pub mod availability;
pub mod calendar;
pub mod clock;
pub mod controller;
pub mod errors;
pub mod time_slots;
pub mod widget;

pub use availability::*;
pub use calendar::*;
pub use clock::*;
pub use controller::*;
pub use errors::*;
pub use time_slots::*;
pub use widget::*;
