// Scheduling options
// What a caller provides to schedule a request, and the fully filled
// version of it that is validated and sent to a scheduler contract.

mod validation;

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    address::{Address, NULL_ADDRESS},
    config::*,
    economics::{calc_endowment, EconomicsError},
    request::TemporalUnit,
};

pub use validation::*;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("toAddress in SchedulingOptions needs to be present")]
    MissingToAddress,
    #[error("windowStart in SchedulingOptions needs to be present")]
    MissingWindowStart,
    #[error("No account available to send the scheduling transaction from")]
    NoAccountAvailable,
}

/// Options given by the caller, every field but `to_address` and
/// `window_start` has a default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingOptions {
    pub to_address: Option<Address>,
    pub window_start: Option<U256>,
    // Defaults to true
    pub timestamp_scheduling: Option<bool>,
    pub bounty: Option<U256>,
    // Defaults to the first account of the node
    pub from: Option<Address>,
    pub call_data: Option<Vec<u8>>,
    pub call_gas: Option<U256>,
    pub call_value: Option<U256>,
    // Defaults to twice the minimum window size of the temporal unit
    pub window_size: Option<U256>,
    pub gas_price: Option<U256>,
    pub fee: Option<U256>,
    pub required_deposit: Option<U256>,
}

impl SchedulingOptions {
    pub fn new(to_address: Address, window_start: U256) -> Self {
        Self {
            to_address: Some(to_address),
            window_start: Some(window_start),
            ..Default::default()
        }
    }

    /// Check the fields without default value are present
    pub fn assert_required_options_are_present(&self) -> Result<(), SchedulingError> {
        if self.to_address.is_none() {
            return Err(SchedulingError::MissingToAddress);
        }
        if self.window_start.is_none() {
            return Err(SchedulingError::MissingWindowStart);
        }
        Ok(())
    }

    /// Apply the defaults of every omitted field
    /// `default_from` is only used when no sender was given.
    pub fn fill_missing_options(
        self,
        default_from: Option<Address>,
    ) -> Result<ScheduleRequest, SchedulingError> {
        let to_address = self.to_address.ok_or(SchedulingError::MissingToAddress)?;
        let window_start = self
            .window_start
            .ok_or(SchedulingError::MissingWindowStart)?;
        let from = self
            .from
            .or(default_from)
            .ok_or(SchedulingError::NoAccountAvailable)?;

        let temporal_unit =
            TemporalUnit::from_timestamp_scheduling(self.timestamp_scheduling.unwrap_or(true));

        Ok(ScheduleRequest {
            to_address,
            window_start,
            temporal_unit,
            bounty: self.bounty.unwrap_or_else(|| U256::from(DEFAULT_BOUNTY)),
            from,
            call_data: self.call_data.unwrap_or_default(),
            call_gas: self
                .call_gas
                .unwrap_or_else(|| U256::from(DEFAULT_CALL_GAS)),
            call_value: self
                .call_value
                .unwrap_or_else(|| U256::from(DEFAULT_CALL_VALUE)),
            window_size: self
                .window_size
                .unwrap_or_else(|| U256::from(temporal_unit.default_window_size())),
            gas_price: self
                .gas_price
                .unwrap_or_else(|| U256::from(DEFAULT_GAS_PRICE)),
            fee: self.fee.unwrap_or_else(|| U256::from(DEFAULT_FEE)),
            required_deposit: self
                .required_deposit
                .unwrap_or_else(|| U256::from(DEFAULT_REQUIRED_DEPOSIT)),
        })
    }
}

/// Scheduling options with every default applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub to_address: Address,
    pub window_start: U256,
    pub temporal_unit: TemporalUnit,
    pub bounty: U256,
    pub from: Address,
    pub call_data: Vec<u8>,
    pub call_gas: U256,
    pub call_value: U256,
    pub window_size: U256,
    pub gas_price: U256,
    pub fee: U256,
    pub required_deposit: U256,
}

impl ScheduleRequest {
    pub fn timestamp_scheduling(&self) -> bool {
        self.temporal_unit == TemporalUnit::Time
    }

    pub fn claim_window_size(&self) -> U256 {
        U256::from(self.temporal_unit.claim_window_size())
    }

    pub fn freeze_period(&self) -> U256 {
        U256::from(self.temporal_unit.freeze_period())
    }

    pub fn reserved_window_size(&self) -> U256 {
        U256::from(self.temporal_unit.reserved_window_size())
    }

    /// Endowment computed locally, see [`calc_endowment`]
    pub fn endowment(&self) -> Result<U256, EconomicsError> {
        calc_endowment(
            self.call_gas,
            self.call_value,
            self.gas_price,
            self.fee,
            self.bounty,
        )
    }

    /// Address arguments of `validateRequestParams`: sender, fee recipient, destination
    pub fn address_args(&self) -> [Address; 3] {
        [self.from, NULL_ADDRESS, self.to_address]
    }

    /// Uint arguments of `validateRequestParams`
    pub fn uint_args(&self) -> [U256; 12] {
        [
            self.fee,
            self.bounty,
            self.claim_window_size(),
            self.freeze_period(),
            self.reserved_window_size(),
            U256::from(self.temporal_unit.id()),
            self.window_size,
            self.window_start,
            self.call_gas,
            self.call_value,
            self.gas_price,
            self.required_deposit,
        ]
    }

    /// Uint arguments of the `schedule` call of a scheduler contract
    pub fn schedule_args(&self) -> [U256; 8] {
        [
            self.call_gas,
            self.call_value,
            self.window_size,
            self.window_start,
            self.gas_price,
            self.fee,
            self.bounty,
            self.required_deposit,
        ]
    }

    pub fn request_params(&self) -> RequestParams {
        RequestParams::from_args(&self.address_args(), &self.uint_args())
    }
}
