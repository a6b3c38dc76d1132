// Request window state machine
//
// Phases in temporal order:
//
//   claimWindowStart       claimWindowEnd        windowStart                      executionWindowEnd
//         |---- claim window ----|---- freeze ----|---- reserved ----|---- ... ----|
//                                                  |<---------- execution window ---------->|
//
// Every interval is half-open except the execution window which also contains
// its end. The contracts accept an execution at exactly `executionWindowEnd`,
// so the client must too.

use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::{Bucket, BucketError, ScheduleData, TemporalUnit};
use crate::config::PAYMENT_MODIFIER_SCALE;

/// Phase of a request at a given `now`
/// The reserved window is reported instead of the execution window while it lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    BeforeClaimWindow,
    ClaimWindow,
    FreezePeriod,
    ReservedWindow,
    ExecutionWindow,
    AfterExecutionWindow,
}

/// Window boundaries of a request, derived from its schedule
/// This is a pure function of the schedule: phases are computed against a
/// caller provided `now` and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestWindow {
    pub temporal_unit: TemporalUnit,
    pub window_start: U256,
    pub window_size: U256,
    pub claim_window_size: U256,
    pub freeze_period: U256,
    pub reserved_window_size: U256,
}

impl RequestWindow {
    pub fn from_schedule(schedule: &ScheduleData) -> Self {
        Self {
            temporal_unit: schedule.temporal_unit,
            window_start: schedule.window_start,
            window_size: schedule.window_size,
            claim_window_size: schedule.claim_window_size,
            freeze_period: schedule.freeze_period,
            reserved_window_size: schedule.reserved_window_size,
        }
    }

    // Boundaries below zero are clamped to zero. Since `now` is never negative,
    // no predicate changes its answer because of it.

    pub fn claim_window_start(&self) -> U256 {
        self.claim_window_end()
            .saturating_sub(self.claim_window_size)
    }

    pub fn claim_window_end(&self) -> U256 {
        self.window_start.saturating_sub(self.freeze_period)
    }

    pub fn freeze_period_start(&self) -> U256 {
        self.claim_window_end()
    }

    pub fn freeze_period_end(&self) -> U256 {
        self.window_start
    }

    pub fn reserved_window_end(&self) -> U256 {
        self.window_start.saturating_add(self.reserved_window_size)
    }

    pub fn execution_window_end(&self) -> U256 {
        self.window_start.saturating_add(self.window_size)
    }

    pub fn before_claim_window(&self, now: U256) -> bool {
        now < self.claim_window_start()
    }

    pub fn in_claim_window(&self, now: U256) -> bool {
        self.claim_window_start() <= now && now < self.claim_window_end()
    }

    pub fn in_freeze_period(&self, now: U256) -> bool {
        self.claim_window_end() <= now && now < self.freeze_period_end()
    }

    // Closed on both ends
    pub fn in_execution_window(&self, now: U256) -> bool {
        self.window_start <= now && now <= self.execution_window_end()
    }

    pub fn in_reserved_window(&self, now: U256) -> bool {
        self.window_start <= now && now < self.reserved_window_end()
    }

    pub fn after_execution_window(&self, now: U256) -> bool {
        now > self.execution_window_end()
    }

    pub fn phase(&self, now: U256) -> Phase {
        if self.before_claim_window(now) {
            Phase::BeforeClaimWindow
        } else if self.in_claim_window(now) {
            Phase::ClaimWindow
        } else if self.in_freeze_period(now) {
            Phase::FreezePeriod
        } else if self.in_reserved_window(now) && self.in_execution_window(now) {
            Phase::ReservedWindow
        } else if self.in_execution_window(now) {
            Phase::ExecutionWindow
        } else {
            Phase::AfterExecutionWindow
        }
    }

    /// Modifier a claim at `now` would receive: `floor(100 * elapsed / claimWindowSize)`
    ///
    /// `elapsed` is measured from the unclamped claim window start
    /// `windowStart - freezePeriod - claimWindowSize` and clamped to the claim
    /// window, so the value is always in [0, 100) and never decreases.
    pub fn accrued_payment_modifier(&self, now: U256) -> u8 {
        if self.claim_window_size.is_zero() {
            return 0;
        }

        // U512 so that neither the sums nor the multiplication can overflow
        let claim_window_size = U512::from(self.claim_window_size);
        let last = claim_window_size - U512::one();
        let elapsed = (U512::from(now) + U512::from(self.freeze_period) + claim_window_size)
            .saturating_sub(U512::from(self.window_start))
            .min(last);

        let modifier = elapsed * U512::from(PAYMENT_MODIFIER_SCALE) / claim_window_size;
        modifier.low_u64() as u8
    }

    pub fn bucket(&self) -> Result<Bucket, BucketError> {
        Bucket::for_window(self.window_start, self.temporal_unit)
    }
}
