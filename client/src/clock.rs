use anyhow::Result;
use eac_common::{request::TemporalUnit, U256};
use log::trace;

use crate::provider::ClockSource;

/// Current time of the remote ledger, in the given unit
///
/// In blocks, this is the next block number: a transaction sent now can be
/// included at the earliest in it. In seconds, the local wall clock is used
/// unless the latest block is already ahead of it.
pub async fn now<C: ClockSource + ?Sized>(clock: &C, unit: TemporalUnit) -> Result<U256> {
    trace!("now {}", unit);

    Ok(match unit {
        TemporalUnit::Block => U256::from(clock.current_block_number().await?) + U256::one(),
        TemporalUnit::Time => {
            let latest = clock.current_block_timestamp().await?;
            let local = clock.local_wall_clock_seconds();
            U256::from(local.max(latest))
        }
    })
}
