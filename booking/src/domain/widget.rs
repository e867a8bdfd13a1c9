//! Booking calendar widget state.
//!
//! `BookingWidget` is the single owner of the cursor, the selection and the
//! derived views (month grid and slot board). It performs no I/O: every
//! availability lookup is represented by a ticket that the caller resolves
//! later with `apply_*` or `fail_*`. A ticket that is no longer the pending
//! one is rejected as stale, so late results can never touch another
//! month's cells or another date's slots.

use chrono::NaiveDate;
use shared::{BookingSelection, DayClassification, DaySlotsResponse, MonthAvailabilityResponse};
use std::collections::HashMap;

use super::calendar::{
    generate_calendar_grid, CalendarCursor, CalendarGrid, DateKey, NavigationDirection,
};
use super::errors::{BookingError, BookingResult, FetchTarget};
use super::time_slots::{SlotBoard, SlotTime};
use crate::io::form_fields::FormFields;

/// Where the widget is in the select-a-date, select-a-time flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetPhase {
    Idle,
    Rendered,
    DateSelected,
    SlotsLoading,
    SlotsReady,
    TimeSelected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthStatus {
    Loading,
    Loaded,
    Failed { message: String },
}

/// Identifies one month availability request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthTicket {
    pub generation: u64,
    pub month: u32,
    pub year: i32,
}

impl MonthTicket {
    pub fn target(&self) -> FetchTarget {
        FetchTarget::Month {
            year: self.year,
            month: self.month,
        }
    }
}

/// Identifies one day-slots request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTicket {
    pub generation: u64,
    pub date: DateKey,
}

impl DayTicket {
    pub fn target(&self) -> FetchTarget {
        FetchTarget::Day {
            date: self.date.to_string(),
        }
    }
}

pub struct BookingWidget {
    cursor: CalendarCursor,
    today: NaiveDate,
    slot_universe: Vec<SlotTime>,
    classifications: HashMap<DateKey, DayClassification>,
    month_status: MonthStatus,
    grid: CalendarGrid,
    slot_board: SlotBoard,
    selected_date: Option<DateKey>,
    selected_time: Option<SlotTime>,
    phase: WidgetPhase,
    next_generation: u64,
    pending_month: Option<MonthTicket>,
    pending_day: Option<DayTicket>,
    fields: Box<dyn FormFields>,
}

impl BookingWidget {
    pub fn new(
        today: NaiveDate,
        slot_universe: Vec<SlotTime>,
        fields: Box<dyn FormFields>,
    ) -> Self {
        let cursor = CalendarCursor::containing(today);
        let classifications = HashMap::new();
        let grid = generate_calendar_grid(&cursor, today, &classifications, None);
        Self {
            cursor,
            today,
            slot_universe,
            classifications,
            month_status: MonthStatus::Loading,
            grid,
            slot_board: SlotBoard::Empty,
            selected_date: None,
            selected_time: None,
            phase: WidgetPhase::Idle,
            next_generation: 0,
            pending_month: None,
            pending_day: None,
            fields,
        }
    }

    /// Reset to today's month with an empty selection and render it.
    ///
    /// Returns the ticket for the month availability lookup.
    pub fn initialize(&mut self) -> MonthTicket {
        self.cursor = CalendarCursor::containing(self.today);
        self.selected_date = None;
        self.selected_time = None;
        self.fields.clear();
        self.slot_board = SlotBoard::Empty;
        self.pending_day = None;
        log::info!("🗓️ Booking calendar initialized at {}", self.cursor.title());
        self.enter_month()
    }

    /// Move the cursor one month and render it.
    ///
    /// The selection and the output fields are left as they are.
    pub fn navigate(&mut self, direction: NavigationDirection) -> MonthTicket {
        self.cursor.navigate(direction);
        log::info!("🗓️ Navigated {:?} to {}", direction, self.cursor.title());
        self.enter_month()
    }

    fn enter_month(&mut self) -> MonthTicket {
        self.phase = WidgetPhase::Idle;
        self.classifications.clear();
        self.month_status = MonthStatus::Loading;
        self.render();
        self.phase = WidgetPhase::Rendered;
        self.issue_month_ticket()
    }

    fn issue_month_ticket(&mut self) -> MonthTicket {
        let ticket = MonthTicket {
            generation: self.bump_generation(),
            month: self.cursor.month(),
            year: self.cursor.year(),
        };
        self.pending_month = Some(ticket);
        ticket
    }

    fn issue_day_ticket(&mut self, date: DateKey) -> DayTicket {
        let ticket = DayTicket {
            generation: self.bump_generation(),
            date,
        };
        self.pending_day = Some(ticket);
        ticket
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Regenerate the month grid from the current state
    pub fn render(&mut self) -> &CalendarGrid {
        self.grid = generate_calendar_grid(
            &self.cursor,
            self.today,
            &self.classifications,
            self.selected_date.as_ref(),
        );
        &self.grid
    }

    /// Update the local date used for the past-day check, re-rendering if it changed
    pub fn set_today(&mut self, today: NaiveDate) {
        if self.today != today {
            self.today = today;
            self.render();
        }
    }

    fn check_month_ticket(&self, ticket: &MonthTicket) -> BookingResult<()> {
        if self.pending_month.as_ref() == Some(ticket) {
            Ok(())
        } else {
            Err(BookingError::StaleResult {
                target: ticket.target(),
            })
        }
    }

    fn check_day_ticket(&self, ticket: &DayTicket) -> BookingResult<()> {
        if self.pending_day.as_ref() == Some(ticket) {
            Ok(())
        } else {
            Err(BookingError::StaleResult {
                target: ticket.target(),
            })
        }
    }

    /// Classify every non-past day of the ticket's month.
    pub fn apply_month_availability(
        &mut self,
        ticket: MonthTicket,
        response: &MonthAvailabilityResponse,
    ) -> BookingResult<()> {
        self.check_month_ticket(&ticket)?;
        if response.month != ticket.month || response.year != ticket.year {
            return Err(BookingError::StaleResult {
                target: ticket.target(),
            });
        }

        let mut classified = 0;
        for summary in &response.days {
            let Ok(date) = summary.date.parse::<DateKey>() else {
                log::warn!("Ignoring availability for malformed date '{}'", summary.date);
                continue;
            };
            if !self.cursor.contains(&date) || date.date() < self.today {
                continue;
            }
            self.classifications.insert(date, summary.classification());
            classified += 1;
        }

        log::info!("✅ Classified {} days for {}", classified, self.cursor.title());
        self.pending_month = None;
        self.month_status = MonthStatus::Loaded;
        self.render();
        Ok(())
    }

    pub fn fail_month_availability(
        &mut self,
        ticket: MonthTicket,
        message: impl Into<String>,
    ) -> BookingResult<()> {
        self.check_month_ticket(&ticket)?;
        self.pending_month = None;
        self.month_status = MonthStatus::Failed {
            message: message.into(),
        };
        Ok(())
    }

    /// Issue a fresh lookup for the displayed month, dropping any pending one
    pub fn retry_month_availability(&mut self) -> MonthTicket {
        self.month_status = MonthStatus::Loading;
        self.issue_month_ticket()
    }

    /// Select a rendered, non-past, non-full day of the displayed month.
    ///
    /// Writes the date to the output field and returns the ticket for the
    /// slot lookup. A previously chosen time stays in its output field.
    pub fn select_date(&mut self, date_key: &str) -> BookingResult<DayTicket> {
        let date: DateKey = date_key
            .parse()
            .map_err(|_| BookingError::invalid_selection(format!("'{}' is not a date", date_key)))?;

        let cell = self.grid.day(&date).ok_or_else(|| {
            BookingError::invalid_selection(format!("{} is not shown on the calendar", date))
        })?;
        if cell.is_past || date.date() < self.today {
            return Err(BookingError::invalid_selection(format!("{} is in the past", date)));
        }
        if !cell.is_interactive() {
            return Err(BookingError::invalid_selection(format!("{} is fully booked", date)));
        }

        self.selected_date = Some(date);
        self.fields.set_date(&date.to_string());
        self.phase = WidgetPhase::DateSelected;
        self.render();

        self.slot_board = SlotBoard::Loading { date };
        self.phase = WidgetPhase::SlotsLoading;
        log::info!("📅 Selected date {}", date);
        Ok(self.issue_day_ticket(date))
    }

    pub fn apply_day_slots(
        &mut self,
        ticket: DayTicket,
        response: &DaySlotsResponse,
    ) -> BookingResult<()> {
        self.check_day_ticket(&ticket)?;
        if response.date != ticket.date.to_string() {
            return Err(BookingError::StaleResult {
                target: ticket.target(),
            });
        }
        self.pending_day = None;
        self.slot_board = SlotBoard::from_response(ticket.date, &self.slot_universe, response);
        self.phase = WidgetPhase::SlotsReady;
        log::debug!(
            "Loaded {} open slots for {}",
            self.slot_board.controls().iter().filter(|c| c.enabled).count(),
            ticket.date
        );
        Ok(())
    }

    pub fn fail_day_slots(
        &mut self,
        ticket: DayTicket,
        message: impl Into<String>,
    ) -> BookingResult<()> {
        self.check_day_ticket(&ticket)?;
        self.pending_day = None;
        self.slot_board = SlotBoard::Failed {
            date: ticket.date,
            message: message.into(),
        };
        Ok(())
    }

    /// Reissue the slot lookup for the selected date
    pub fn retry_day_slots(&mut self) -> BookingResult<DayTicket> {
        let date = self
            .selected_date
            .ok_or_else(|| BookingError::invalid_selection("no date selected"))?;
        self.slot_board = SlotBoard::Loading { date };
        self.phase = WidgetPhase::SlotsLoading;
        Ok(self.issue_day_ticket(date))
    }

    /// Select one of the slots currently rendered as enabled.
    pub fn select_time_slot(&mut self, time: &str) -> BookingResult<()> {
        let slot: SlotTime = time.parse().map_err(|_| {
            BookingError::invalid_selection(format!("'{}' is not a slot time", time))
        })?;
        if !self.slot_universe.contains(&slot) {
            return Err(BookingError::invalid_selection(format!("{} is not a bookable slot", slot)));
        }
        if !self.slot_board.is_enabled(&slot) {
            return Err(BookingError::invalid_selection(format!("{} is not available", slot)));
        }

        self.selected_time = Some(slot);
        self.fields.set_time(&slot.to_string());
        self.slot_board.mark_selected(&slot);
        self.phase = WidgetPhase::TimeSelected;
        log::info!("🕘 Selected time slot {}", slot);
        Ok(())
    }

    pub fn cursor(&self) -> CalendarCursor {
        self.cursor
    }

    pub fn grid(&self) -> &CalendarGrid {
        &self.grid
    }

    pub fn slot_board(&self) -> &SlotBoard {
        &self.slot_board
    }

    pub fn phase(&self) -> WidgetPhase {
        self.phase
    }

    pub fn month_status(&self) -> &MonthStatus {
        &self.month_status
    }

    pub fn selected_date(&self) -> Option<DateKey> {
        self.selected_date
    }

    pub fn selected_time(&self) -> Option<SlotTime> {
        self.selected_time
    }

    pub fn pending_month(&self) -> Option<MonthTicket> {
        self.pending_month
    }

    pub fn pending_day(&self) -> Option<DayTicket> {
        self.pending_day
    }

    /// Values currently held by the two output fields
    pub fn selection(&self) -> BookingSelection {
        self.fields.selection()
    }
}
