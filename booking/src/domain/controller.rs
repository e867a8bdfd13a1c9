//! Async driver for the booking widget.
//!
//! `BookingController` wires a `BookingWidget` to an availability service
//! and a notifier. Every lookup runs in its own tokio task. Starting a new
//! month lookup aborts the previous one, and so does starting a new day
//! lookup. Whatever still slips through is rejected by the widget's ticket
//! check. Must be used from within a tokio runtime.

use shared::{AlertSeverity, BookingSelection, DaySlotsRequest, MonthAvailabilityRequest};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use super::availability::AvailabilityService;
use super::calendar::{CalendarCursor, CalendarGrid, NavigationDirection};
use super::clock::Clock;
use super::errors::{BookingError, BookingResult, FetchTarget};
use super::time_slots::{SlotBoard, SlotTime};
use super::widget::{BookingWidget, DayTicket, MonthStatus, MonthTicket, WidgetPhase};
use crate::config::FetchPolicy;
use crate::io::alerts::Notifier;
use crate::io::form_fields::FormFields;

#[derive(Clone)]
pub struct BookingController {
    widget: Arc<Mutex<BookingWidget>>,
    service: Arc<dyn AvailabilityService>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: FetchPolicy,
    month_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    day_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run `call` with a per-attempt timeout, retrying with exponential backoff.
pub async fn fetch_with_retry<T, F, Fut>(
    policy: &FetchPolicy,
    target: &FetchTarget,
    mut call: F,
) -> BookingResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match tokio::time::timeout(policy.timeout, call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => last_error = e.to_string(),
            Err(_) => last_error = format!("timed out after {} ms", policy.timeout.as_millis()),
        }
        log::warn!(
            "Availability lookup for {} failed (attempt {}/{}): {}",
            target,
            attempt,
            attempts,
            last_error
        );
        if attempt < attempts {
            tokio::time::sleep(backoff).await;
            backoff *= policy.backoff_multiplier;
        }
    }

    Err(BookingError::AvailabilityFetchFailed {
        target: target.clone(),
        message: last_error,
    })
}

impl BookingController {
    pub fn new(
        service: Arc<dyn AvailabilityService>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: FetchPolicy,
        slot_universe: Vec<SlotTime>,
        fields: Box<dyn FormFields>,
    ) -> Self {
        let widget = BookingWidget::new(clock.today(), slot_universe, fields);
        Self {
            widget: Arc::new(Mutex::new(widget)),
            service,
            notifier,
            clock,
            policy,
            month_task: Arc::new(Mutex::new(None)),
            day_task: Arc::new(Mutex::new(None)),
        }
    }

    fn widget(&self) -> MutexGuard<'_, BookingWidget> {
        lock(&self.widget)
    }

    /// Show today's month and start loading its availability
    pub fn initialize(&self) -> CalendarGrid {
        let (ticket, grid) = {
            let mut widget = self.widget();
            widget.set_today(self.clock.today());
            let ticket = widget.initialize();
            (ticket, widget.grid().clone())
        };
        self.spawn_month_fetch(ticket);
        grid
    }

    pub fn navigate(&self, direction: NavigationDirection) -> CalendarGrid {
        let (ticket, grid) = {
            let mut widget = self.widget();
            widget.set_today(self.clock.today());
            let ticket = widget.navigate(direction);
            (ticket, widget.grid().clone())
        };
        self.spawn_month_fetch(ticket);
        grid
    }

    pub fn retry_month_availability(&self) {
        let ticket = self.widget().retry_month_availability();
        self.spawn_month_fetch(ticket);
    }

    /// Select a date and start loading its slots.
    ///
    /// Rejected selections are reported with a warning toast and change nothing.
    pub fn select_date(&self, date_key: &str) -> BookingResult<()> {
        let result = {
            let mut widget = self.widget();
            widget.set_today(self.clock.today());
            widget.select_date(date_key)
        };
        match result {
            Ok(ticket) => {
                self.spawn_day_fetch(ticket);
                Ok(())
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    pub fn retry_day_slots(&self) -> BookingResult<()> {
        let result = self.widget().retry_day_slots();
        match result {
            Ok(ticket) => {
                self.spawn_day_fetch(ticket);
                Ok(())
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    pub fn select_time_slot(&self, time: &str) -> BookingResult<()> {
        let result = self.widget().select_time_slot(time);
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    fn spawn_month_fetch(&self, ticket: MonthTicket) {
        let this = self.clone();
        let handle = tokio::spawn(async move { this.run_month_fetch(ticket).await });
        if let Some(previous) = lock(&self.month_task).replace(handle) {
            previous.abort();
        }
    }

    fn spawn_day_fetch(&self, ticket: DayTicket) {
        let this = self.clone();
        let handle = tokio::spawn(async move { this.run_day_fetch(ticket).await });
        if let Some(previous) = lock(&self.day_task).replace(handle) {
            previous.abort();
        }
    }

    async fn run_month_fetch(&self, ticket: MonthTicket) {
        let request = MonthAvailabilityRequest {
            month: ticket.month,
            year: ticket.year,
        };
        let service = self.service.clone();
        let result = fetch_with_retry(&self.policy, &ticket.target(), || {
            let service = service.clone();
            let request = request.clone();
            async move { service.month_availability(request).await }
        })
        .await;

        let outcome = {
            let mut widget = self.widget();
            match result {
                Ok(response) => widget.apply_month_availability(ticket, &response),
                Err(err) => widget
                    .fail_month_availability(ticket, err.to_string())
                    .and(Err(err)),
            }
        };
        if let Err(err) = outcome {
            self.report(&err);
        }
    }

    async fn run_day_fetch(&self, ticket: DayTicket) {
        let request = DaySlotsRequest {
            date: ticket.date.to_string(),
        };
        let service = self.service.clone();
        let result = fetch_with_retry(&self.policy, &ticket.target(), || {
            let service = service.clone();
            let request = request.clone();
            async move { service.day_slots(request).await }
        })
        .await;

        let outcome = {
            let mut widget = self.widget();
            match result {
                Ok(response) => widget.apply_day_slots(ticket, &response),
                Err(err) => widget.fail_day_slots(ticket, err.to_string()).and(Err(err)),
            }
        };
        if let Err(err) = outcome {
            self.report(&err);
        }
    }

    fn report(&self, err: &BookingError) {
        if !err.is_user_visible() {
            log::debug!("{}", err);
            return;
        }
        match err {
            BookingError::AvailabilityFetchFailed { .. } => {
                log::error!("{}", err);
                self.notifier.toast(
                    "Could not load availability. Please try again.",
                    AlertSeverity::Error,
                );
            }
            BookingError::InvalidSelection { reason } => {
                log::warn!("{}", err);
                self.notifier.toast(reason, AlertSeverity::Warning);
            }
            other => log::error!("{}", other),
        }
    }

    async fn wait_for(task: &Mutex<Option<JoinHandle<()>>>) {
        let handle = lock(task).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    log::error!("Availability task failed: {}", e);
                }
            }
        }
    }

    /// Wait until the in-flight month lookup, if any, has finished
    pub async fn wait_for_month(&self) {
        Self::wait_for(&self.month_task).await;
    }

    /// Wait until the in-flight slot lookup, if any, has finished
    pub async fn wait_for_slots(&self) {
        Self::wait_for(&self.day_task).await;
    }

    pub fn grid(&self) -> CalendarGrid {
        self.widget().grid().clone()
    }

    pub fn slot_board(&self) -> SlotBoard {
        self.widget().slot_board().clone()
    }

    pub fn cursor(&self) -> CalendarCursor {
        self.widget().cursor()
    }

    pub fn phase(&self) -> WidgetPhase {
        self.widget().phase()
    }

    pub fn month_status(&self) -> MonthStatus {
        self.widget().month_status().clone()
    }

    pub fn selection(&self) -> BookingSelection {
        self.widget().selection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::availability::{SequenceRandom, SimulatedAvailabilityService};
    use crate::domain::calendar::CellAvailability;
    use crate::domain::clock::FixedClock;
    use crate::domain::time_slots::default_slot_universe;
    use crate::io::alerts::RecordingNotifier;
    use crate::io::form_fields::FormOutputs;
    use anyhow::bail;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use shared::{
        DayAvailabilitySummary, DaySlotsResponse, MonthAvailabilityResponse, SlotAvailability,
    };
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Everything open except the 20th; fails the first calls of each kind
    struct FlakyService {
        month_failures: u32,
        day_failures: u32,
        month_calls: AtomicU32,
        day_calls: AtomicU32,
        delay: Duration,
    }

    impl FlakyService {
        fn new(failures: u32) -> Self {
            Self {
                month_failures: failures,
                day_failures: failures,
                month_calls: AtomicU32::new(0),
                day_calls: AtomicU32::new(0),
                delay: Duration::from_millis(300),
            }
        }
    }

    #[async_trait]
    impl AvailabilityService for FlakyService {
        async fn month_availability(
            &self,
            request: MonthAvailabilityRequest,
        ) -> anyhow::Result<MonthAvailabilityResponse> {
            tokio::time::sleep(self.delay).await;
            if self.month_calls.fetch_add(1, Ordering::SeqCst) < self.month_failures {
                bail!("service unavailable");
            }
            let days = (1..=crate::domain::calendar::days_in_month(request.month, request.year))
                .map(|day| DayAvailabilitySummary {
                    date: format!("{:04}-{:02}-{:02}", request.year, request.month, day),
                    booked_slots: if day == 20 { 16 } else { 0 },
                    total_slots: 16,
                })
                .collect();
            Ok(MonthAvailabilityResponse {
                month: request.month,
                year: request.year,
                days,
            })
        }

        async fn day_slots(&self, request: DaySlotsRequest) -> anyhow::Result<DaySlotsResponse> {
            tokio::time::sleep(self.delay).await;
            if self.day_calls.fetch_add(1, Ordering::SeqCst) < self.day_failures {
                bail!("service unavailable");
            }
            Ok(DaySlotsResponse {
                date: request.date,
                slots: default_slot_universe()
                    .iter()
                    .map(|t| SlotAvailability {
                        time: t.to_string(),
                        is_available: true,
                    })
                    .collect(),
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn controller_with(
        service: Arc<dyn AvailabilityService>,
        policy: FetchPolicy,
    ) -> (BookingController, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = BookingController::new(
            service,
            notifier.clone(),
            Arc::new(FixedClock::new(today())),
            policy,
            default_slot_universe(),
            Box::new(FormOutputs::default()),
        );
        (controller, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_booking_flow_with_simulated_service() {
        let service = SimulatedAvailabilityService::new(
            Duration::from_millis(300),
            20,
            default_slot_universe(),
            Arc::new(SequenceRandom::new(vec![2, 5, 11, 0, 7])),
        );
        let (controller, notifier) = controller_with(Arc::new(service), FetchPolicy::default());

        let grid = controller.initialize();
        assert_eq!(grid.title, "June 2025");
        controller.wait_for_month().await;
        assert_eq!(controller.month_status(), MonthStatus::Loaded);

        let date = controller
            .grid()
            .month_days()
            .find(|c| c.is_interactive())
            .map(|c| c.date.to_string())
            .unwrap();
        controller.select_date(&date).unwrap();
        assert_eq!(controller.phase(), WidgetPhase::SlotsLoading);
        controller.wait_for_slots().await;
        assert_eq!(controller.phase(), WidgetPhase::SlotsReady);

        let slot = controller
            .slot_board()
            .controls()
            .iter()
            .find(|c| c.enabled)
            .map(|c| c.time.to_string())
            .unwrap();
        controller.select_time_slot(&slot).unwrap();

        let selection = controller.selection();
        assert_eq!(selection.selected_date, Some(date));
        assert_eq!(selection.selected_time, Some(slot));
        assert!(notifier.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_discards_earlier_month_result() {
        let (controller, notifier) =
            controller_with(Arc::new(FlakyService::new(0)), FetchPolicy::default());

        controller.initialize();
        controller.navigate(NavigationDirection::Next);
        controller.wait_for_month().await;

        let grid = controller.grid();
        assert_eq!((grid.month, grid.year), (7, 2025));
        let july_20 = grid.month_days().find(|c| c.day == 20).unwrap();
        assert!(!july_20.is_interactive());
        assert!(grid.month_days().all(|c| c.availability != CellAvailability::Unknown));
        assert!(notifier.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let service = Arc::new(FlakyService::new(2));
        let (controller, notifier) = controller_with(service.clone(), FetchPolicy::default());

        controller.initialize();
        controller.wait_for_month().await;

        assert_eq!(service.month_calls.load(Ordering::SeqCst), 3);
        assert_eq!(controller.month_status(), MonthStatus::Loaded);
        assert!(notifier.toasts(AlertSeverity::Error).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_failure_and_recover() {
        let service = Arc::new(FlakyService::new(3));
        let (controller, notifier) = controller_with(service.clone(), FetchPolicy::default());

        controller.initialize();
        controller.wait_for_month().await;

        assert!(matches!(controller.month_status(), MonthStatus::Failed { .. }));
        assert_eq!(notifier.toasts(AlertSeverity::Error).len(), 1);

        controller.retry_month_availability();
        controller.wait_for_month().await;
        assert_eq!(controller.month_status(), MonthStatus::Loaded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_failure_offers_retry() {
        let service = Arc::new(FlakyService {
            day_failures: 1,
            ..FlakyService::new(0)
        });
        let policy = FetchPolicy {
            max_attempts: 1,
            ..FetchPolicy::default()
        };
        let (controller, notifier) = controller_with(service.clone(), policy);
        controller.initialize();
        controller.wait_for_month().await;

        controller.select_date("2025-06-12").unwrap();
        controller.wait_for_slots().await;
        assert!(matches!(controller.slot_board(), SlotBoard::Failed { .. }));
        assert!(controller.slot_board().status_message().unwrap().contains("retry"));
        assert_eq!(notifier.toasts(AlertSeverity::Error).len(), 1);

        controller.retry_day_slots().unwrap();
        controller.wait_for_slots().await;
        assert_eq!(controller.slot_board().controls().len(), 16);
        assert_eq!(controller.phase(), WidgetPhase::SlotsReady);
        assert_eq!(service.day_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeouts_count_as_failures() {
        let mut slow = FlakyService::new(0);
        slow.delay = Duration::from_secs(10);
        let policy = FetchPolicy {
            timeout: Duration::from_millis(500),
            max_attempts: 2,
            ..FetchPolicy::default()
        };
        let (controller, notifier) = controller_with(Arc::new(slow), policy);

        controller.initialize();
        controller.wait_for_month().await;

        match controller.month_status() {
            MonthStatus::Failed { message } => assert!(message.contains("timed out")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(notifier.toasts(AlertSeverity::Error).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_selections_warn_and_change_nothing() {
        let (controller, notifier) =
            controller_with(Arc::new(FlakyService::new(0)), FetchPolicy::default());
        controller.initialize();
        controller.wait_for_month().await;

        assert!(controller.select_date("2025-06-09").is_err());
        assert!(controller.select_date("2025-06-20").is_err());
        assert!(controller.select_time_slot("09:00").is_err());

        assert_eq!(notifier.toasts(AlertSeverity::Warning).len(), 3);
        assert_eq!(controller.selection(), BookingSelection::default());
        assert_eq!(controller.phase(), WidgetPhase::Rendered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_date_uses_current_clock_date() {
        let clock = Arc::new(FixedClock::new(today()));
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = BookingController::new(
            Arc::new(FlakyService::new(0)),
            notifier.clone(),
            clock.clone(),
            FetchPolicy::default(),
            default_slot_universe(),
            Box::new(FormOutputs::default()),
        );
        controller.initialize();
        controller.wait_for_month().await;

        clock.set(NaiveDate::from_ymd_opt(2025, 6, 11).unwrap());
        let err = controller.select_date("2025-06-10").unwrap_err();

        assert!(matches!(err, BookingError::InvalidSelection { .. }));
        assert_eq!(controller.selection().selected_date, None);
        assert_eq!(notifier.toasts(AlertSeverity::Warning).len(), 1);
        let june_10 = controller.grid().month_days().find(|c| c.day == 10).cloned().unwrap();
        assert!(june_10.is_past);

        controller.select_date("2025-06-11").unwrap();
        controller.wait_for_slots().await;
        assert_eq!(controller.phase(), WidgetPhase::SlotsReady);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reselecting_date_aborts_previous_slot_lookup() {
        let service = Arc::new(FlakyService::new(0));
        let (controller, notifier) = controller_with(service.clone(), FetchPolicy::default());
        controller.initialize();
        controller.wait_for_month().await;

        controller.select_date("2025-06-12").unwrap();
        controller.select_date("2025-06-13").unwrap();
        controller.wait_for_slots().await;

        match controller.slot_board() {
            SlotBoard::Ready { date, .. } => assert_eq!(date.to_string(), "2025-06-13"),
            other => panic!("expected ready board, got {:?}", other),
        }
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn test_only_user_visible_errors_raise_toasts() {
        let (controller, notifier) =
            controller_with(Arc::new(FlakyService::new(0)), FetchPolicy::default());

        controller.report(&BookingError::StaleResult {
            target: FetchTarget::Month {
                year: 2025,
                month: 6,
            },
        });
        assert!(notifier.events().is_empty());

        controller.report(&BookingError::invalid_selection("2025-06-09 is in the past"));
        assert_eq!(
            notifier.toasts(AlertSeverity::Warning),
            vec!["2025-06-09 is in the past".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_with_retry_backs_off() {
        let policy = FetchPolicy {
            timeout: Duration::from_secs(1),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            backoff_multiplier: 2,
        };
        let target = FetchTarget::Day {
            date: "2025-06-12".to_string(),
        };
        let start = tokio::time::Instant::now();

        let result: BookingResult<()> =
            fetch_with_retry(&policy, &target, || async { Err(anyhow::anyhow!("boom")) }).await;

        assert!(matches!(result, Err(BookingError::AvailabilityFetchFailed { .. })));
        // 100 ms + 200 ms of backoff between the three attempts
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_secs(1));
    }
}
