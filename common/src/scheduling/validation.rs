use primitive_types::U256;
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumIter, IntoEnumIterator};
use thiserror::Error;

use crate::{
    address::{is_not_null_address, Address},
    config::EXECUTION_GAS_OVERHEAD,
    economics::calc_endowment,
    request::TemporalUnit,
};

/// Number of checks performed by `validateRequestParams`
pub const VALIDITY_CHECKS_COUNT: usize = 6;

/// Rules a request must satisfy to be accepted by a scheduler
/// Declared in the order of the booleans returned by the contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter)]
pub enum SchedulingParamsError {
    InsufficientEndowment,
    ReservedWindowBiggerThanExecutionWindow,
    InvalidTemporalUnit,
    ExecutionWindowTooSoon,
    CallGasTooHigh,
    EmptyToAddress,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Expected {} validity flags, got {}", VALIDITY_CHECKS_COUNT, got)]
pub struct ValidityShapeError {
    pub got: usize,
}

/// Every violated rule of a single validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Schedule params validation errors: {}", format_errors(.0))]
pub struct ValidationErrors(Vec<SchedulingParamsError>);

// One numbered line per error
fn format_errors(errors: &[SchedulingParamsError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, error)| format!("\n{}. {}", i + 1, error))
        .collect()
}

impl ValidationErrors {
    pub fn errors(&self) -> &[SchedulingParamsError] {
        &self.0
    }

    pub fn contains(&self, error: SchedulingParamsError) -> bool {
        self.0.contains(&error)
    }
}

/// Result of the six checks of a request validation, `true` when passing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamsValidity {
    pub endowment: bool,
    pub reserved_window: bool,
    pub temporal_unit: bool,
    pub execution_window: bool,
    pub call_gas: bool,
    pub to_address: bool,
}

impl ParamsValidity {
    fn flags(&self) -> [bool; VALIDITY_CHECKS_COUNT] {
        [
            self.endowment,
            self.reserved_window,
            self.temporal_unit,
            self.execution_window,
            self.call_gas,
            self.to_address,
        ]
    }

    pub fn is_valid(&self) -> bool {
        self.flags().iter().all(|valid| *valid)
    }

    /// Violated rules, in the contract order
    pub fn errors(&self) -> Vec<SchedulingParamsError> {
        SchedulingParamsError::iter()
            .zip(self.flags())
            .filter(|(_, valid)| !valid)
            .map(|(error, _)| error)
            .collect()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        let errors = self.errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

impl TryFrom<&[bool]> for ParamsValidity {
    type Error = ValidityShapeError;

    fn try_from(flags: &[bool]) -> Result<Self, Self::Error> {
        match *flags {
            [endowment, reserved_window, temporal_unit, execution_window, call_gas, to_address] => {
                Ok(Self {
                    endowment,
                    reserved_window,
                    temporal_unit,
                    execution_window,
                    call_gas,
                    to_address,
                })
            }
            _ => Err(ValidityShapeError { got: flags.len() }),
        }
    }
}

/// Arguments of `validateRequestParams` in a named form
/// The temporal unit is kept raw so an invalid value can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParams {
    pub from: Address,
    pub fee_recipient: Address,
    pub to_address: Address,
    pub fee: U256,
    pub bounty: U256,
    pub claim_window_size: U256,
    pub freeze_period: U256,
    pub reserved_window_size: U256,
    pub temporal_unit: U256,
    pub window_size: U256,
    pub window_start: U256,
    pub call_gas: U256,
    pub call_value: U256,
    pub gas_price: U256,
    pub required_deposit: U256,
}

impl RequestParams {
    pub fn from_args(addresses: &[Address; 3], uints: &[U256; 12]) -> Self {
        Self {
            from: addresses[0],
            fee_recipient: addresses[1],
            to_address: addresses[2],
            fee: uints[0],
            bounty: uints[1],
            claim_window_size: uints[2],
            freeze_period: uints[3],
            reserved_window_size: uints[4],
            temporal_unit: uints[5],
            window_size: uints[6],
            window_start: uints[7],
            call_gas: uints[8],
            call_value: uints[9],
            gas_price: uints[10],
            required_deposit: uints[11],
        }
    }
}

/// Same checks as the request library of the contracts, without a remote call
///
/// `now` must be expressed in the temporal unit of the request and
/// `block_gas_limit` is the gas limit of the latest block.
pub fn validate_request_params_locally(
    params: &RequestParams,
    endowment: U256,
    now: U256,
    block_gas_limit: U256,
) -> ParamsValidity {
    let required_endowment = calc_endowment(
        params.call_gas,
        params.call_value,
        params.gas_price,
        params.fee,
        params.bounty,
    );

    ParamsValidity {
        endowment: matches!(required_endowment, Ok(required) if endowment >= required),
        reserved_window: params.reserved_window_size <= params.window_size,
        temporal_unit: TemporalUnit::from_id(params.temporal_unit).is_some(),
        execution_window: now.saturating_add(params.freeze_period) <= params.window_start,
        call_gas: params
            .call_gas
            .checked_add(U256::from(EXECUTION_GAS_OVERHEAD))
            .is_some_and(|gas| gas < block_gas_limit),
        to_address: is_not_null_address(&params.to_address),
    }
}
