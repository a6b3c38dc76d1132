// Transaction request model
// A request is a call scheduled for a future window, identified by the address
// of its on-chain contract. This module contains the synchronous part of it:
// parsing of the raw contract data, window arithmetic and bucketing.

mod bucket;
mod data;
mod event;
mod window;

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::config::*;

pub use bucket::*;
pub use data::*;
pub use event::*;
pub use window::*;

/// Unit in which every window boundary of a request is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemporalUnit {
    /// Boundaries are block numbers
    Block,
    /// Boundaries are unix timestamps in seconds
    Time,
}

impl TemporalUnit {
    /// Value used by the contracts
    pub fn id(&self) -> u8 {
        match self {
            TemporalUnit::Block => 1,
            TemporalUnit::Time => 2,
        }
    }

    /// Decode the contract value, `None` for anything but 1 and 2
    pub fn from_id(value: U256) -> Option<Self> {
        if value == U256::from(1u8) {
            Some(TemporalUnit::Block)
        } else if value == U256::from(2u8) {
            Some(TemporalUnit::Time)
        } else {
            None
        }
    }

    pub fn from_timestamp_scheduling(timestamp_scheduling: bool) -> Self {
        if timestamp_scheduling {
            TemporalUnit::Time
        } else {
            TemporalUnit::Block
        }
    }

    pub fn minimum_window_size(&self) -> u64 {
        match self {
            TemporalUnit::Block => MINIMUM_WINDOW_SIZE_BLOCK,
            TemporalUnit::Time => MINIMUM_WINDOW_SIZE_TIMESTAMP,
        }
    }

    /// Window size used when the caller does not provide one
    pub fn default_window_size(&self) -> u64 {
        self.minimum_window_size() * 2
    }

    pub fn claim_window_size(&self) -> u64 {
        match self {
            TemporalUnit::Block => CLAIM_WINDOW_SIZE_BLOCK,
            TemporalUnit::Time => CLAIM_WINDOW_SIZE_TIMESTAMP,
        }
    }

    pub fn freeze_period(&self) -> u64 {
        match self {
            TemporalUnit::Block => FREEZE_PERIOD_BLOCK,
            TemporalUnit::Time => FREEZE_PERIOD_TIMESTAMP,
        }
    }

    pub fn reserved_window_size(&self) -> u64 {
        match self {
            TemporalUnit::Block => RESERVED_WINDOW_SIZE_BLOCK,
            TemporalUnit::Time => RESERVED_WINDOW_SIZE_TIMESTAMP,
        }
    }

    pub fn bucket_size(&self) -> u64 {
        match self {
            TemporalUnit::Block => BUCKET_SIZE_BLOCK,
            TemporalUnit::Time => BUCKET_SIZE_TIMESTAMP,
        }
    }

    /// Block buckets are negative so both units share one id space
    pub fn bucket_sign(&self) -> i128 {
        match self {
            TemporalUnit::Block => -1,
            TemporalUnit::Time => 1,
        }
    }
}
