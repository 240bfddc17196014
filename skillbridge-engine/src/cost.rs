//! Daily cost governance for the completion service
//!
//! The ledger resets on the first access after the calendar date (UTC) moves
//! past `last_reset_date`; there is no timer. Budget checks that precede a call
//! go through [`CostTracker::try_reserve`] so that the check and the eventual
//! charge form one critical section from the budget's point of view.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use skillbridge_core::{round_to, Clock, CostConfig, GenerationError, PricingConfig, SystemClock};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Snapshot of the cost ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub current_cost: f64,
    pub daily_limit: f64,
    pub remaining_budget: f64,
    pub request_count: u64,
    pub cost_percentage: f64,
}

#[derive(Debug)]
struct CostLedger {
    current_cost: f64,
    request_count: u64,
    last_reset_date: NaiveDate,
    /// Estimates held by in-flight calls
    reserved: f64,
}

impl CostLedger {
    fn roll_over(&mut self, today: NaiveDate) {
        if today > self.last_reset_date {
            tracing::info!(
                previous_date = %self.last_reset_date,
                spent = self.current_cost,
                requests = self.request_count,
                "Resetting daily cost ledger"
            );
            self.current_cost = 0.0;
            self.request_count = 0;
            self.last_reset_date = today;
        }
    }

    fn committed_and_reserved(&self) -> f64 {
        self.current_cost + self.reserved
    }
}

pub struct CostTracker {
    daily_limit: f64,
    ledger: Mutex<CostLedger>,
    clock: Arc<dyn Clock>,
}

impl CostTracker {
    pub fn new(daily_limit: f64) -> Self {
        Self::with_clock(daily_limit, Arc::new(SystemClock))
    }

    pub fn with_clock(daily_limit: f64, clock: Arc<dyn Clock>) -> Self {
        let today = clock.today();
        Self {
            daily_limit,
            ledger: Mutex::new(CostLedger {
                current_cost: 0.0,
                request_count: 0,
                last_reset_date: today,
                reserved: 0.0,
            }),
            clock,
        }
    }

    pub fn from_config(config: &CostConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(config.daily_limit, clock)
    }

    pub fn daily_limit(&self) -> f64 {
        self.daily_limit
    }

    /// Lock the ledger, applying any pending day rollover first.
    fn ledger(&self) -> MutexGuard<'_, CostLedger> {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger.roll_over(self.clock.today());
        ledger
    }

    /// True if `estimated_cost` fits in what is left of today's budget.
    /// Estimates reserved by in-flight calls count as spent.
    pub fn can_make_request(&self, estimated_cost: f64) -> bool {
        let ledger = self.ledger();
        ledger.committed_and_reserved() + estimated_cost <= self.daily_limit
    }

    /// Charge a completed request against today's budget.
    pub fn record_request(&self, cost: f64) {
        let mut ledger = self.ledger();
        ledger.current_cost += cost.max(0.0);
        ledger.request_count += 1;
    }

    /// Atomically check the budget and hold `estimated_cost` against it.
    ///
    /// The hold is released when the reservation is dropped, or replaced by
    /// the actual cost via [`CostReservation::commit`].
    pub fn try_reserve(&self, estimated_cost: f64) -> Result<CostReservation<'_>, GenerationError> {
        let estimated_cost = estimated_cost.max(0.0);
        let mut ledger = self.ledger();
        let committed = ledger.committed_and_reserved();

        if committed + estimated_cost > self.daily_limit {
            return Err(GenerationError::BudgetExceeded {
                current_cost: committed,
                estimated_cost,
                daily_limit: self.daily_limit,
            });
        }

        ledger.reserved += estimated_cost;
        Ok(CostReservation {
            tracker: self,
            amount: estimated_cost,
            settled: false,
        })
    }

    fn settle(&self, amount: f64, actual: Option<f64>) {
        let mut ledger = self.ledger();
        ledger.reserved = (ledger.reserved - amount).max(0.0);
        if let Some(cost) = actual {
            ledger.current_cost += cost.max(0.0);
            ledger.request_count += 1;
        }
    }

    pub fn get_usage_stats(&self) -> UsageStats {
        let ledger = self.ledger();
        let cost_percentage = if self.daily_limit > 0.0 {
            ledger.current_cost / self.daily_limit * 100.0
        } else {
            0.0
        };

        UsageStats {
            current_cost: round_to(ledger.current_cost, 4),
            daily_limit: self.daily_limit,
            remaining_budget: round_to((self.daily_limit - ledger.current_cost).max(0.0), 4),
            request_count: ledger.request_count,
            cost_percentage: round_to(cost_percentage, 2),
        }
    }
}

impl std::fmt::Debug for CostTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostTracker")
            .field("daily_limit", &self.daily_limit)
            .field("ledger", &*self.ledger.lock().unwrap_or_else(PoisonError::into_inner))
            .finish()
    }
}

/// Budget held for one in-flight completion call.
#[must_use = "dropping a reservation releases it immediately"]
pub struct CostReservation<'a> {
    tracker: &'a CostTracker,
    amount: f64,
    settled: bool,
}

impl CostReservation<'_> {
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Replace the hold with the actual cost of the call.
    pub fn commit(mut self, actual_cost: f64) {
        self.settled = true;
        self.tracker.settle(self.amount, Some(actual_cost));
    }
}

impl Drop for CostReservation<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker.settle(self.amount, None);
        }
    }
}

/// Cost of a completion from its total token count.
///
/// Tokens are split by `pricing.input_share` into prompt and completion
/// tokens. A response without usage data is billed as 1000 tokens.
pub fn estimate_cost(total_tokens: Option<u32>, pricing: &PricingConfig) -> f64 {
    let tokens = f64::from(total_tokens.unwrap_or(1000));
    let input_tokens = (tokens * pricing.input_share).floor();
    let output_tokens = (tokens * (1.0 - pricing.input_share)).floor();

    let cost = input_tokens / 1000.0 * pricing.input_per_1k
        + output_tokens / 1000.0 * pricing.output_per_1k;
    round_to(cost, 6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use skillbridge_core::ManualClock;

    fn tracker_at_noon(limit: f64) -> (CostTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 10, 12, 0, 0).unwrap(),
        ));
        (CostTracker::with_clock(limit, clock.clone()), clock)
    }

    #[test]
    fn test_usage_stats_after_two_requests() {
        let (tracker, _clock) = tracker_at_noon(10.0);
        tracker.record_request(2.5);
        tracker.record_request(3.0);

        let stats = tracker.get_usage_stats();
        assert_eq!(stats.current_cost, 5.5);
        assert_eq!(stats.remaining_budget, 4.5);
        assert_eq!(stats.request_count, 2);
        assert_eq!(stats.cost_percentage, 55.0);
    }

    #[test]
    fn test_ledger_resets_on_new_day() {
        let (tracker, clock) = tracker_at_noon(10.0);
        tracker.record_request(2.5);
        tracker.record_request(3.0);

        clock.advance(ChronoDuration::hours(6));
        assert_eq!(tracker.get_usage_stats().current_cost, 5.5);

        clock.advance(ChronoDuration::hours(13));
        let stats = tracker.get_usage_stats();
        assert_eq!(stats.current_cost, 0.0);
        assert_eq!(stats.request_count, 0);
        assert_eq!(stats.remaining_budget, 10.0);
    }

    #[test]
    fn test_can_make_request_boundary() {
        let (tracker, _clock) = tracker_at_noon(1.0);
        tracker.record_request(0.9);
        assert!(tracker.can_make_request(0.1));
        assert!(!tracker.can_make_request(0.2));
    }

    #[test]
    fn test_negative_cost_never_reduces_ledger() {
        let (tracker, _clock) = tracker_at_noon(1.0);
        tracker.record_request(-5.0);
        assert_eq!(tracker.get_usage_stats().current_cost, 0.0);
    }

    #[test]
    fn test_reservation_blocks_concurrent_overspend() {
        let (tracker, _clock) = tracker_at_noon(1.0);
        let first = tracker.try_reserve(0.6).unwrap();
        assert!(matches!(
            tracker.try_reserve(0.6),
            Err(GenerationError::BudgetExceeded { .. })
        ));
        assert_eq!(first.amount(), 0.6);

        first.commit(0.2);
        assert!(tracker.try_reserve(0.6).is_ok());
        assert_eq!(tracker.get_usage_stats().current_cost, 0.2);
        assert_eq!(tracker.get_usage_stats().request_count, 1);
    }

    #[test]
    fn test_dropped_reservation_is_released() {
        let (tracker, _clock) = tracker_at_noon(1.0);
        {
            let _held = tracker.try_reserve(1.0).unwrap();
            assert!(!tracker.can_make_request(0.1));
        }
        assert!(tracker.can_make_request(0.1));
        assert_eq!(tracker.get_usage_stats().request_count, 0);
    }

    #[test]
    fn test_estimate_cost_default_pricing() {
        let pricing = PricingConfig::default();
        // 750 input tokens at 0.0015/1K + 250 output tokens at 0.002/1K
        assert!((estimate_cost(Some(1000), &pricing) - 0.001625).abs() < 1e-9);
        assert_eq!(estimate_cost(None, &pricing), estimate_cost(Some(1000), &pricing));
        assert_eq!(estimate_cost(Some(0), &pricing), 0.0);
    }
}
