use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{RequestWindow, TemporalUnit};
use crate::address::{Address, NULL_ADDRESS};

// Expected lengths of each part of the `requestData()` tuple
pub const RAW_ADDRESSES_LEN: usize = 6;
pub const RAW_BOOLS_LEN: usize = 3;
pub const RAW_UINTS_LEN: usize = 15;
pub const RAW_UINT8S_LEN: usize = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestDataError {
    #[error("Invalid request data: '{field}' has {got} entries, expected {expected}")]
    InvalidShape {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Invalid temporal unit in request data: {}", _0)]
    InvalidTemporalUnit(U256),
}

/// Fixed-shape tuple returned by the `requestData()` call of a request contract
///
/// Layout:
/// - addresses: claimedBy, createdBy, owner, feeRecipient, bountyBenefactor, toAddress
/// - bools: isCancelled, wasCalled, wasSuccessful
/// - uints: claimDeposit, fee, feeOwed, bounty, bountyOwed, claimWindowSize,
///   freezePeriod, reservedWindowSize, temporalUnit, windowSize, windowStart,
///   callGas, callValue, gasPrice, requiredDeposit
/// - uint8s: paymentModifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequestData {
    pub addresses: Vec<Address>,
    pub bools: Vec<bool>,
    pub uints: Vec<U256>,
    pub uint8s: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleData {
    pub claim_window_size: U256,
    pub freeze_period: U256,
    pub reserved_window_size: U256,
    pub temporal_unit: TemporalUnit,
    pub window_size: U256,
    pub window_start: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimData {
    pub claimed_by: Address,
    pub claim_deposit: U256,
    pub required_deposit: U256,
    // Percentage set when the request is claimed, 0 until then
    pub payment_modifier: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentData {
    pub fee_recipient: Address,
    pub bounty_benefactor: Address,
    pub fee: U256,
    pub fee_owed: U256,
    pub bounty: U256,
    pub bounty_owed: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferData {
    pub to_address: Address,
    pub call_gas: U256,
    pub call_value: U256,
    pub gas_price: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaData {
    pub owner: Address,
    pub created_by: Address,
    pub is_cancelled: bool,
    pub was_called: bool,
    pub was_successful: bool,
}

/// Typed snapshot of a request contract state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestData {
    pub schedule: ScheduleData,
    pub claim: ClaimData,
    pub payment: PaymentData,
    pub transfer: TransferData,
    pub meta: MetaData,
}

fn check_len<T>(field: &'static str, values: &[T], expected: usize) -> Result<(), RequestDataError> {
    if values.len() != expected {
        return Err(RequestDataError::InvalidShape {
            field,
            expected,
            got: values.len(),
        });
    }
    Ok(())
}

impl RequestData {
    /// Parse the raw tuple, failing on any shape mismatch
    pub fn parse(raw: &RawRequestData) -> Result<Self, RequestDataError> {
        check_len("addresses", &raw.addresses, RAW_ADDRESSES_LEN)?;
        check_len("bools", &raw.bools, RAW_BOOLS_LEN)?;
        check_len("uints", &raw.uints, RAW_UINTS_LEN)?;
        check_len("uint8s", &raw.uint8s, RAW_UINT8S_LEN)?;

        let a = &raw.addresses;
        let b = &raw.bools;
        let u = &raw.uints;

        let temporal_unit =
            TemporalUnit::from_id(u[8]).ok_or(RequestDataError::InvalidTemporalUnit(u[8]))?;

        Ok(Self {
            schedule: ScheduleData {
                claim_window_size: u[5],
                freeze_period: u[6],
                reserved_window_size: u[7],
                temporal_unit,
                window_size: u[9],
                window_start: u[10],
            },
            claim: ClaimData {
                claimed_by: a[0],
                claim_deposit: u[0],
                required_deposit: u[14],
                payment_modifier: raw.uint8s[0],
            },
            payment: PaymentData {
                fee_recipient: a[3],
                bounty_benefactor: a[4],
                fee: u[1],
                fee_owed: u[2],
                bounty: u[3],
                bounty_owed: u[4],
            },
            transfer: TransferData {
                to_address: a[5],
                call_gas: u[11],
                call_value: u[12],
                gas_price: u[13],
            },
            meta: MetaData {
                owner: a[2],
                created_by: a[1],
                is_cancelled: b[0],
                was_called: b[1],
                was_successful: b[2],
            },
        })
    }

    /// Re-parse in place from a fresh tuple
    /// On error, the previous snapshot is kept untouched
    pub fn fill(&mut self, raw: &RawRequestData) -> Result<(), RequestDataError> {
        *self = Self::parse(raw)?;
        Ok(())
    }

    /// Serialize back into the tuple shape returned by the contract
    pub fn to_raw(&self) -> RawRequestData {
        RawRequestData {
            addresses: vec![
                self.claim.claimed_by,
                self.meta.created_by,
                self.meta.owner,
                self.payment.fee_recipient,
                self.payment.bounty_benefactor,
                self.transfer.to_address,
            ],
            bools: vec![
                self.meta.is_cancelled,
                self.meta.was_called,
                self.meta.was_successful,
            ],
            uints: vec![
                self.claim.claim_deposit,
                self.payment.fee,
                self.payment.fee_owed,
                self.payment.bounty,
                self.payment.bounty_owed,
                self.schedule.claim_window_size,
                self.schedule.freeze_period,
                self.schedule.reserved_window_size,
                U256::from(self.schedule.temporal_unit.id()),
                self.schedule.window_size,
                self.schedule.window_start,
                self.transfer.call_gas,
                self.transfer.call_value,
                self.transfer.gas_price,
                self.claim.required_deposit,
            ],
            uint8s: vec![self.claim.payment_modifier],
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claim.claimed_by != NULL_ADDRESS
    }

    /// Window state machine for this snapshot
    pub fn window(&self) -> RequestWindow {
        RequestWindow::from_schedule(&self.schedule)
    }

    /// Payment modifier applied to the bounty of the claimer
    /// Claimed requests report the value fixed at claim time,
    /// unclaimed ones the value a claim at `now` would get
    pub fn claim_payment_modifier(&self, now: U256) -> u8 {
        if self.is_claimed() {
            return self.claim.payment_modifier;
        }
        self.window().accrued_payment_modifier(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::H160;

    fn sample_raw() -> RawRequestData {
        RawRequestData {
            addresses: vec![
                NULL_ADDRESS,
                H160::repeat_byte(0x11),
                H160::repeat_byte(0x22),
                H160::repeat_byte(0x33),
                H160::repeat_byte(0x44),
                H160::repeat_byte(0x55),
            ],
            bools: vec![false, true, true],
            uints: (0u64..15)
                .map(|i| if i == 8 { U256::from(2u8) } else { U256::from(1000 + i) })
                .collect(),
            uint8s: vec![0],
        }
    }

    #[test]
    fn test_parse_maps_every_field() {
        let data = RequestData::parse(&sample_raw()).unwrap();
        assert_eq!(data.claim.claim_deposit, U256::from(1000));
        assert_eq!(data.payment.fee, U256::from(1001));
        assert_eq!(data.payment.bounty, U256::from(1003));
        assert_eq!(data.schedule.claim_window_size, U256::from(1005));
        assert_eq!(data.schedule.temporal_unit, TemporalUnit::Time);
        assert_eq!(data.schedule.window_start, U256::from(1010));
        assert_eq!(data.transfer.gas_price, U256::from(1013));
        assert_eq!(data.claim.required_deposit, U256::from(1014));
        assert_eq!(data.meta.created_by, H160::repeat_byte(0x11));
        assert_eq!(data.meta.owner, H160::repeat_byte(0x22));
        assert_eq!(data.transfer.to_address, H160::repeat_byte(0x55));
        assert!(!data.meta.is_cancelled);
        assert!(data.meta.was_called);
        assert!(!data.is_claimed());
    }

    #[test]
    fn test_to_raw_reproduces_tuple() {
        let raw = sample_raw();
        let data = RequestData::parse(&raw).unwrap();
        assert_eq!(data.to_raw(), raw);
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let mut raw = sample_raw();
        raw.uints.pop();
        assert_eq!(
            RequestData::parse(&raw),
            Err(RequestDataError::InvalidShape {
                field: "uints",
                expected: RAW_UINTS_LEN,
                got: RAW_UINTS_LEN - 1
            })
        );

        let mut raw = sample_raw();
        raw.addresses.push(NULL_ADDRESS);
        assert!(matches!(
            RequestData::parse(&raw),
            Err(RequestDataError::InvalidShape { field: "addresses", .. })
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_temporal_unit() {
        let mut raw = sample_raw();
        raw.uints[8] = U256::zero();
        assert_eq!(
            RequestData::parse(&raw),
            Err(RequestDataError::InvalidTemporalUnit(U256::zero()))
        );
    }

    #[test]
    fn test_claimed_request_reports_stored_modifier() {
        let mut raw = sample_raw();
        raw.addresses[0] = H160::repeat_byte(0x99);
        raw.uint8s[0] = 73;
        let data = RequestData::parse(&raw).unwrap();
        assert_eq!(data.claim_payment_modifier(U256::zero()), 73);
        assert_eq!(data.claim_payment_modifier(U256::MAX), 73);
    }

    #[test]
    fn test_fill_keeps_snapshot_on_error() {
        let raw = sample_raw();
        let mut data = RequestData::parse(&raw).unwrap();

        let mut claimed = raw.clone();
        claimed.addresses[0] = H160::repeat_byte(0x99);
        claimed.uint8s[0] = 42;
        data.fill(&claimed).unwrap();
        assert!(data.is_claimed());
        assert_eq!(data.claim.payment_modifier, 42);

        let mut broken = claimed.clone();
        broken.bools.clear();
        assert!(data.fill(&broken).is_err());
        assert_eq!(data.to_raw(), claimed);
    }
}
