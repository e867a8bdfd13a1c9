//! # IO Module
//!
//! The edges the widget talks to but does not own: the two form fields it
//! writes the selection into, and the toast/dialog notifier.

pub mod alerts;
pub mod form_fields;

pub use alerts::*;
pub use form_fields::*;
