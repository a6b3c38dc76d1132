use primitive_types::U256;
use thiserror::Error;

use crate::config::EXECUTION_GAS_OVERHEAD;

// Share of the bounty a claimer is assumed to really earn: 0.85
pub const ARBITRARY_COEFFICIENT_PERCENT: u64 = 85;
// Payment modifier assumed at claim time: 0.9
pub const PAYMENT_MODIFIER_PERCENT: u64 = 90;
// Gas units spent by a claimer on the claim transaction
pub const CLAIMING_GAS_AMOUNT: u64 = 100_000;

// Both coefficients are percentages, their product is scaled by 100 * 100
const COEFFICIENTS_SCALE: u64 = 100 * 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EconomicsError {
    #[error("Negative value is not allowed for '{}'", _0)]
    NegativeInput(&'static str),
    #[error("Invalid numeric value for '{}': {}", _0, _1)]
    InvalidNumber(&'static str, String),
    #[error("Arithmetic overflow while computing {}", _0)]
    Overflow(&'static str),
    #[error("Bounty {bounty} does not cover the claiming cost {claiming_cost}")]
    BountyTooLow { bounty: U256, claiming_cost: U256 },
    #[error("Call gas must be greater than zero")]
    ZeroCallGas,
}

/// Parse a decimal amount given as text (CLI, config files)
/// Negative values are rejected instead of being wrapped around.
pub fn parse_amount(name: &'static str, value: &str) -> Result<U256, EconomicsError> {
    let value = value.trim();
    if value.starts_with('-') {
        return Err(EconomicsError::NegativeInput(name));
    }

    U256::from_dec_str(value).map_err(|_| EconomicsError::InvalidNumber(name, value.to_owned()))
}

/// Total value that must be sent along the scheduling transaction
///
/// `bounty + fee + callGas * gasPrice + EXECUTION_GAS_OVERHEAD * gasPrice + callValue`
///
/// This must stay equal to the `computeEndowment` of the scheduler contracts.
pub fn calc_endowment(
    call_gas: U256,
    call_value: U256,
    gas_price: U256,
    fee: U256,
    bounty: U256,
) -> Result<U256, EconomicsError> {
    let overflow = || EconomicsError::Overflow("endowment");

    let call_cost = call_gas.checked_mul(gas_price).ok_or_else(overflow)?;
    let overhead_cost = gas_price
        .checked_mul(U256::from(EXECUTION_GAS_OVERHEAD))
        .ok_or_else(overflow)?;

    bounty
        .checked_add(fee)
        .and_then(|v| v.checked_add(call_cost))
        .and_then(|v| v.checked_add(overhead_cost))
        .and_then(|v| v.checked_add(call_value))
        .ok_or_else(overflow)
}

fn claiming_cost(gas_price: U256) -> Result<U256, EconomicsError> {
    gas_price
        .checked_mul(U256::from(CLAIMING_GAS_AMOUNT))
        .ok_or(EconomicsError::Overflow("claiming cost"))
}

/// Highest gas price an executor can pay for the call and still profit from `bounty`
///
/// The part of the bounty expected to be earned (`bounty * 0.85 * 0.9`) first pays
/// the claim transaction at `gas_price`, the remainder is spread over `call_gas`.
pub fn estimate_max_execution_gas_price(
    bounty: U256,
    gas_price: U256,
    call_gas: U256,
) -> Result<U256, EconomicsError> {
    if call_gas.is_zero() {
        return Err(EconomicsError::ZeroCallGas);
    }

    let expected_bounty = bounty
        .checked_mul(U256::from(
            ARBITRARY_COEFFICIENT_PERCENT * PAYMENT_MODIFIER_PERCENT,
        ))
        .ok_or(EconomicsError::Overflow("expected bounty"))?
        / U256::from(COEFFICIENTS_SCALE);

    let claiming_cost = claiming_cost(gas_price)?;
    if expected_bounty < claiming_cost {
        return Err(EconomicsError::BountyTooLow {
            bounty,
            claiming_cost,
        });
    }

    let additional_gas_price = (expected_bounty - claiming_cost) / call_gas;
    gas_price
        .checked_add(additional_gas_price)
        .ok_or(EconomicsError::Overflow("execution gas price"))
}

/// Bounty needed so that an executor can pay `gas_price + additional_gas_price`
/// for the call. Rounded up, so feeding the result back into
/// [`estimate_max_execution_gas_price`] never gives less than requested.
///
/// Without additional gas price, only the claiming cost matters and `call_gas`
/// has no influence on the result.
pub fn estimate_bounty_for_execution_gas_price(
    gas_price: U256,
    call_gas: U256,
    additional_gas_price: U256,
) -> Result<U256, EconomicsError> {
    let overflow = || EconomicsError::Overflow("bounty");

    let execution_cost = additional_gas_price
        .checked_mul(call_gas)
        .ok_or_else(overflow)?;
    let cost = claiming_cost(gas_price)?
        .checked_add(execution_cost)
        .ok_or_else(overflow)?;

    let divisor = U256::from(ARBITRARY_COEFFICIENT_PERCENT * PAYMENT_MODIFIER_PERCENT);
    let scaled = cost
        .checked_mul(U256::from(COEFFICIENTS_SCALE))
        .ok_or_else(overflow)?;

    let (quotient, remainder) = scaled.div_mod(divisor);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::one()).ok_or_else(overflow)
    }
}
