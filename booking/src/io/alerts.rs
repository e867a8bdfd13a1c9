//! Toasts and dialogs shown around the booking flow.
//!
//! `Notifier` is the capability the controller calls into. `AlertPresets`
//! builds the option payloads for the popup library with the house
//! styling, so a browser bridge only has to pass them through.

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::AlertSeverity;
use std::sync::Mutex;

use crate::config::AlertsConfig;

pub const DEFAULT_CONFIRM_LABEL: &str = "Yes, delete it!";

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Transient toast in the corner of the page
    fn toast(&self, message: &str, severity: AlertSeverity);

    /// Ask the user to confirm; `None` uses the default confirm label
    async fn confirm(&self, title: &str, body: &str, confirm_label: Option<&str>) -> bool;

    fn success(&self, title: &str, body: &str);

    fn error(&self, title: &str, body: &str);
}

/// House styling for every alert kind
#[derive(Debug, Clone)]
pub struct AlertPresets {
    toast_timer_ms: u64,
    toast_position: String,
}

impl Default for AlertPresets {
    fn default() -> Self {
        Self::from_config(&AlertsConfig::default())
    }
}

impl AlertPresets {
    pub fn from_config(config: &AlertsConfig) -> Self {
        Self {
            toast_timer_ms: config.toast_timer_ms,
            toast_position: config.toast_position.clone(),
        }
    }

    fn dialog_classes(confirm_button: &str) -> Value {
        json!({
            "popup": "rounded-2xl",
            "title": "text-2xl font-bold text-gray-900",
            "htmlContainer": "text-gray-600",
            "confirmButton": confirm_button,
        })
    }

    pub fn toast_payload(&self, message: &str, severity: AlertSeverity) -> Value {
        json!({
            "toast": true,
            "position": self.toast_position,
            "showConfirmButton": false,
            "timer": self.toast_timer_ms,
            "timerProgressBar": true,
            "pauseOnHover": true,
            "customClass": {
                "popup": "rounded-2xl shadow-2xl",
                "timerProgressBar": "bg-primary-600",
            },
            "icon": severity.icon(),
            "title": message,
        })
    }

    pub fn confirm_payload(&self, title: &str, body: &str, confirm_label: Option<&str>) -> Value {
        let mut classes = Self::dialog_classes(
            "bg-red-600 hover:bg-red-700 text-white font-bold py-3 px-6 rounded-xl ml-2 transition-all",
        );
        classes["cancelButton"] = json!(
            "bg-gray-300 hover:bg-gray-400 text-gray-800 font-bold py-3 px-6 rounded-xl mr-2 transition-all"
        );
        json!({
            "customClass": classes,
            "buttonsStyling": false,
            "showCancelButton": true,
            "confirmButtonText": confirm_label.unwrap_or(DEFAULT_CONFIRM_LABEL),
            "cancelButtonText": "Cancel",
            "reverseButtons": true,
            "icon": "warning",
            "title": title,
            "html": body,
        })
    }

    pub fn success_payload(&self, title: &str, body: &str) -> Value {
        json!({
            "customClass": Self::dialog_classes(
                "bg-primary-600 hover:bg-primary-700 text-white font-bold py-3 px-6 rounded-xl transition-all",
            ),
            "buttonsStyling": false,
            "icon": "success",
            "confirmButtonText": "OK",
            "title": title,
            "html": body,
        })
    }

    pub fn error_payload(&self, title: &str, body: &str) -> Value {
        json!({
            "customClass": Self::dialog_classes(
                "bg-red-600 hover:bg-red-700 text-white font-bold py-3 px-6 rounded-xl transition-all",
            ),
            "buttonsStyling": false,
            "icon": "error",
            "confirmButtonText": "OK",
            "title": title,
            "html": body,
        })
    }
}

/// Writes every alert to the log; used where there is no page to show it on
pub struct LogNotifier {
    presets: AlertPresets,
    confirm_default: bool,
}

impl LogNotifier {
    pub fn new(config: &AlertsConfig) -> Self {
        Self {
            presets: AlertPresets::from_config(config),
            confirm_default: config.confirm_default,
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn toast(&self, message: &str, severity: AlertSeverity) {
        let payload = self.presets.toast_payload(message, severity);
        match severity {
            AlertSeverity::Error => log::error!("🔔 toast {}", payload),
            AlertSeverity::Warning => log::warn!("🔔 toast {}", payload),
            AlertSeverity::Success => log::info!("🔔 toast {}", payload),
        }
    }

    async fn confirm(&self, title: &str, body: &str, confirm_label: Option<&str>) -> bool {
        let payload = self.presets.confirm_payload(title, body, confirm_label);
        log::info!("❓ confirm {} -> {}", payload, self.confirm_default);
        self.confirm_default
    }

    fn success(&self, title: &str, body: &str) {
        log::info!("✅ dialog {}", self.presets.success_payload(title, body));
    }

    fn error(&self, title: &str, body: &str) {
        log::error!("❌ dialog {}", self.presets.error_payload(title, body));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertEvent {
    Toast {
        message: String,
        severity: AlertSeverity,
    },
    Confirm {
        title: String,
        body: String,
        confirm_label: String,
    },
    Success { title: String, body: String },
    Error { title: String, body: String },
}

/// Notifier that keeps every call for later inspection
pub struct RecordingNotifier {
    events: Mutex<Vec<AlertEvent>>,
    confirm_answer: bool,
}

impl RecordingNotifier {
    pub fn new(confirm_answer: bool) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            confirm_answer,
        }
    }

    fn record(&self, event: AlertEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }

    pub fn events(&self) -> Vec<AlertEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn toasts(&self, severity: AlertSeverity) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                AlertEvent::Toast {
                    message,
                    severity: s,
                } if s == severity => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn toast(&self, message: &str, severity: AlertSeverity) {
        self.record(AlertEvent::Toast {
            message: message.to_string(),
            severity,
        });
    }

    async fn confirm(&self, title: &str, body: &str, confirm_label: Option<&str>) -> bool {
        self.record(AlertEvent::Confirm {
            title: title.to_string(),
            body: body.to_string(),
            confirm_label: confirm_label.unwrap_or(DEFAULT_CONFIRM_LABEL).to_string(),
        });
        self.confirm_answer
    }

    fn success(&self, title: &str, body: &str) {
        self.record(AlertEvent::Success {
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    fn error(&self, title: &str, body: &str) {
        self.record(AlertEvent::Error {
            title: title.to_string(),
            body: body.to_string(),
        });
    }
}
