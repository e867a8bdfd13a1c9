//! # Availability Service
//!
//! The widget asks two questions of the scheduling backend: how booked is
//! each day of a month, and which slots of one date are still open. This
//! module defines that contract and ships the placeholder implementation
//! used until a real backend exists.
//!
//! The placeholder keeps one booking set per date and answers both
//! questions from it, so a day classified `full` never shows open slots.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    DayAvailabilitySummary, DaySlotsRequest, DaySlotsResponse, MonthAvailabilityRequest,
    MonthAvailabilityResponse, SlotAvailability,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use super::calendar::{days_in_month, DateKey};
use super::errors::BookingResult;
use super::time_slots::SlotTime;
use crate::config::BookingConfig;

#[async_trait]
pub trait AvailabilityService: Send + Sync {
    /// Per-day booked counts for every day of the requested month
    async fn month_availability(
        &self,
        request: MonthAvailabilityRequest,
    ) -> Result<MonthAvailabilityResponse>;

    /// Open/closed state of every slot on one date
    async fn day_slots(&self, request: DaySlotsRequest) -> Result<DaySlotsResponse>;
}

/// Uniform integer source for the simulated service
pub trait RandomSource: Send + Sync {
    /// Value in `0..bound`; `bound` of 0 yields 0
    fn next_below(&self, bound: u32) -> u32;
}

/// Draws from v4 UUIDs, which are backed by the OS random generator.
///
/// The low half of a UUID carries the two variant bits at its top, so
/// values are taken from the 62 random bits below them. Draws at or above the
/// largest multiple of `bound` are rejected, which keeps the result
/// uniform with no modulo bias.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRandom;

const UUID_RANDOM_BITS: u64 = (1 << 62) - 1;

impl RandomSource for UuidRandom {
    fn next_below(&self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        let bound = u64::from(bound);
        let zone = (UUID_RANDOM_BITS + 1) / bound * bound;
        loop {
            let (_, low) = Uuid::new_v4().as_u64_pair();
            let value = low & UUID_RANDOM_BITS;
            if value < zone {
                return (value % bound) as u32;
            }
        }
    }
}

/// Replays a fixed list of values, cycling when exhausted
#[derive(Debug)]
pub struct SequenceRandom {
    values: Mutex<VecDeque<u32>>,
}

impl SequenceRandom {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_below(&self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        let mut values = self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match values.pop_front() {
            Some(value) => {
                values.push_back(value);
                value % bound
            }
            None => 0,
        }
    }
}

/// Random availability with a fixed artificial delay
pub struct SimulatedAvailabilityService {
    delay: Duration,
    max_booked_draw: u32,
    universe: Vec<SlotTime>,
    random: Arc<dyn RandomSource>,
    /// Booked flag per slot, keyed by YYYY-MM-DD
    bookings: Mutex<HashMap<String, Vec<bool>>>,
}

impl SimulatedAvailabilityService {
    pub fn new(
        delay: Duration,
        max_booked_draw: u32,
        universe: Vec<SlotTime>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            delay,
            max_booked_draw,
            universe,
            random,
            bookings: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(
        config: &BookingConfig,
        random: Arc<dyn RandomSource>,
    ) -> BookingResult<Self> {
        Ok(Self::new(
            Duration::from_millis(config.simulation.delay_ms),
            config.simulation.max_booked_draw,
            config.slots.universe()?,
            random,
        ))
    }

    /// Pick a booked count, then which slots it covers (partial Fisher-Yates)
    fn generate_bookings(&self) -> Vec<bool> {
        let total = self.universe.len();
        let booked = (self.random.next_below(self.max_booked_draw) as usize).min(total);

        let mut indices: Vec<usize> = (0..total).collect();
        for i in 0..booked {
            let j = i + self.random.next_below((total - i) as u32) as usize;
            indices.swap(i, j);
        }

        let mut taken = vec![false; total];
        for &index in &indices[..booked] {
            taken[index] = true;
        }
        taken
    }

    fn bookings_for(&self, date: &str) -> Result<Vec<bool>> {
        let mut bookings = self
            .bookings
            .lock()
            .map_err(|_| anyhow!("availability cache lock poisoned"))?;
        if let Some(existing) = bookings.get(date) {
            return Ok(existing.clone());
        }
        let generated = self.generate_bookings();
        bookings.insert(date.to_string(), generated.clone());
        Ok(generated)
    }
}

#[async_trait]
impl AvailabilityService for SimulatedAvailabilityService {
    async fn month_availability(
        &self,
        request: MonthAvailabilityRequest,
    ) -> Result<MonthAvailabilityResponse> {
        if !(1..=12).contains(&request.month) {
            bail!("invalid month {}", request.month);
        }
        tokio::time::sleep(self.delay).await;

        let mut days = Vec::new();
        for day in 1..=days_in_month(request.month, request.year) {
            let date = DateKey::from_ymd(request.year, request.month, day)
                .with_context(|| {
                    format!("invalid date {}-{}-{}", request.year, request.month, day)
                })?
                .to_string();
            let booked_slots = self.bookings_for(&date)?.iter().filter(|b| **b).count() as u32;
            days.push(DayAvailabilitySummary {
                date,
                booked_slots,
                total_slots: self.universe.len() as u32,
            });
        }

        log::debug!(
            "Simulated availability for {}/{}: {} days",
            request.month,
            request.year,
            days.len()
        );
        Ok(MonthAvailabilityResponse {
            month: request.month,
            year: request.year,
            days,
        })
    }

    async fn day_slots(&self, request: DaySlotsRequest) -> Result<DaySlotsResponse> {
        NaiveDate::parse_from_str(&request.date, "%Y-%m-%d")
            .with_context(|| format!("invalid date '{}'", request.date))?;
        tokio::time::sleep(self.delay).await;

        let booked = self.bookings_for(&request.date)?;
        let slots = self
            .universe
            .iter()
            .zip(booked)
            .map(|(time, taken)| SlotAvailability {
                time: time.to_string(),
                is_available: !taken,
            })
            .collect();
        Ok(DaySlotsResponse {
            date: request.date,
            slots,
        })
    }
}
