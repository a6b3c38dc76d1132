// Transaction request handle
//
// A handle is created unloaded from an address, then `fill_data` fetches the
// contract state and returns the loaded handle. Every accessor depending on
// the state only exists on the loaded handle.

use std::sync::Arc;

use eac_common::{
    address::{format_address, is_not_null_address, Address},
    request::{
        Bucket, BucketError, EventError, ExecutedEvent, Phase, RequestData, RequestDataError,
        RequestWindow, TemporalUnit, EXECUTED_TOPIC,
    },
    U256,
};
use log::{debug, trace};
use thiserror::Error;

use crate::{
    clock,
    provider::{BlockTag, Provider, RequestContract},
};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Attempted to instantiate a transaction request from a null address")]
    NullAddress,
    #[error("Request {} was called but its Executed event was not found", format_address(.0))]
    ExecutedEventNotFound(Address),
    #[error(transparent)]
    Data(#[from] RequestDataError),
    #[error(transparent)]
    Bucket(#[from] BucketError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

/// State of a handle whose data has not been fetched yet
#[derive(Debug, Clone, Copy)]
pub struct Unloaded;

/// State of a handle holding a snapshot of the contract data
#[derive(Debug, Clone)]
pub struct Loaded {
    data: RequestData,
}

pub struct Request<P: Provider, S = Unloaded> {
    provider: Arc<P>,
    contract: P::Request,
    state: S,
}

impl<P: Provider, S> Request<P, S> {
    pub fn address(&self) -> Address {
        self.contract.address()
    }

    // Encoded calls, to be sent by the caller

    pub fn claim_data(&self) -> Vec<u8> {
        self.contract.encode_claim()
    }

    pub fn execute_data(&self) -> Vec<u8> {
        self.contract.encode_execute()
    }

    pub fn cancel_data(&self) -> Vec<u8> {
        self.contract.encode_cancel()
    }

    /// Data of the scheduled call, read from the contract
    pub async fn call_data(&self) -> Result<Vec<u8>, RequestError> {
        trace!("call data of {}", format_address(&self.address()));
        Ok(self.contract.call_data().await?)
    }
}

impl<P: Provider> Request<P, Unloaded> {
    pub fn new(provider: Arc<P>, address: Address) -> Result<Self, RequestError> {
        if !is_not_null_address(&address) {
            return Err(RequestError::NullAddress);
        }

        let contract = provider.request_at(address);
        Ok(Self {
            provider,
            contract,
            state: Unloaded,
        })
    }

    /// Fetch the contract data and switch to the loaded state
    pub async fn fill_data(self) -> Result<Request<P, Loaded>, RequestError> {
        trace!("fill data of {}", format_address(&self.address()));

        let raw = self.contract.request_data().await?;
        let data = RequestData::parse(&raw)?;

        Ok(Request {
            provider: self.provider,
            contract: self.contract,
            state: Loaded { data },
        })
    }
}

impl<P: Provider> Request<P, Loaded> {
    pub fn data(&self) -> &RequestData {
        &self.state.data
    }

    /// Fetch the contract data again
    /// The current snapshot is kept if the new one cannot be parsed.
    pub async fn refresh_data(&mut self) -> Result<(), RequestError> {
        trace!("refresh data of {}", format_address(&self.address()));

        let raw = self.contract.request_data().await?;
        self.state.data.fill(&raw)?;
        Ok(())
    }

    pub fn window(&self) -> RequestWindow {
        self.state.data.window()
    }

    pub fn temporal_unit(&self) -> TemporalUnit {
        self.state.data.schedule.temporal_unit
    }

    pub fn window_start(&self) -> U256 {
        self.state.data.schedule.window_start
    }

    pub fn window_size(&self) -> U256 {
        self.state.data.schedule.window_size
    }

    pub fn claim_window_size(&self) -> U256 {
        self.state.data.schedule.claim_window_size
    }

    pub fn freeze_period(&self) -> U256 {
        self.state.data.schedule.freeze_period
    }

    pub fn reserved_window_size(&self) -> U256 {
        self.state.data.schedule.reserved_window_size
    }

    pub fn claim_window_start(&self) -> U256 {
        self.window().claim_window_start()
    }

    pub fn claim_window_end(&self) -> U256 {
        self.window().claim_window_end()
    }

    pub fn freeze_period_start(&self) -> U256 {
        self.window().freeze_period_start()
    }

    pub fn freeze_period_end(&self) -> U256 {
        self.window().freeze_period_end()
    }

    pub fn reserved_window_end(&self) -> U256 {
        self.window().reserved_window_end()
    }

    pub fn execution_window_end(&self) -> U256 {
        self.window().execution_window_end()
    }

    pub fn claimed_by(&self) -> Address {
        self.state.data.claim.claimed_by
    }

    pub fn is_claimed(&self) -> bool {
        self.state.data.is_claimed()
    }

    pub fn is_claimed_by(&self, address: &Address) -> bool {
        self.claimed_by() == *address
    }

    pub fn required_deposit(&self) -> U256 {
        self.state.data.claim.required_deposit
    }

    pub fn owner(&self) -> Address {
        self.state.data.meta.owner
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.data.meta.is_cancelled
    }

    pub fn was_called(&self) -> bool {
        self.state.data.meta.was_called
    }

    pub fn was_successful(&self) -> bool {
        self.state.data.meta.was_successful
    }

    pub fn to_address(&self) -> Address {
        self.state.data.transfer.to_address
    }

    pub fn call_gas(&self) -> U256 {
        self.state.data.transfer.call_gas
    }

    pub fn call_value(&self) -> U256 {
        self.state.data.transfer.call_value
    }

    pub fn gas_price(&self) -> U256 {
        self.state.data.transfer.gas_price
    }

    pub fn fee(&self) -> U256 {
        self.state.data.payment.fee
    }

    pub fn bounty(&self) -> U256 {
        self.state.data.payment.bounty
    }

    pub fn bucket(&self) -> Result<Bucket, RequestError> {
        Ok(self.window().bucket()?)
    }

    /// Current time of the ledger in the unit of this request
    pub async fn now(&self) -> Result<U256, RequestError> {
        Ok(clock::now(self.provider.as_ref(), self.temporal_unit()).await?)
    }

    pub async fn before_claim_window(&self) -> Result<bool, RequestError> {
        Ok(self.window().before_claim_window(self.now().await?))
    }

    pub async fn in_claim_window(&self) -> Result<bool, RequestError> {
        Ok(self.window().in_claim_window(self.now().await?))
    }

    pub async fn in_freeze_period(&self) -> Result<bool, RequestError> {
        Ok(self.window().in_freeze_period(self.now().await?))
    }

    pub async fn in_execution_window(&self) -> Result<bool, RequestError> {
        Ok(self.window().in_execution_window(self.now().await?))
    }

    pub async fn in_reserved_window(&self) -> Result<bool, RequestError> {
        Ok(self.window().in_reserved_window(self.now().await?))
    }

    pub async fn after_execution_window(&self) -> Result<bool, RequestError> {
        Ok(self.window().after_execution_window(self.now().await?))
    }

    pub async fn phase(&self) -> Result<Phase, RequestError> {
        Ok(self.window().phase(self.now().await?))
    }

    /// Payment modifier of the claimer, in percent
    pub async fn claim_payment_modifier(&self) -> Result<u8, RequestError> {
        if self.is_claimed() {
            return Ok(self.state.data.claim.payment_modifier);
        }
        let now = self.now().await?;
        Ok(self.state.data.claim_payment_modifier(now))
    }

    /// Execution details, `None` while the request was not called
    pub async fn executed_event(&self) -> Result<Option<ExecutedEvent>, RequestError> {
        trace!("executed event of {}", format_address(&self.address()));
        if !self.was_called() {
            return Ok(None);
        }

        let logs = self
            .contract
            .logs(BlockTag::Earliest, BlockTag::Latest)
            .await?;
        let log = logs
            .iter()
            .find(|log| log.has_topic(&EXECUTED_TOPIC))
            .ok_or(RequestError::ExecutedEventNotFound(self.address()))?;

        let event = ExecutedEvent::try_from(log)?;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Request {} executed at block {}",
                format_address(&self.address()),
                event.block_number
            );
        }
        Ok(Some(event))
    }

    /// Block of the execution, 0 while the request was not called
    pub async fn executed_at(&self) -> Result<u64, RequestError> {
        Ok(self
            .executed_event()
            .await?
            .map_or(0, |event| event.block_number))
    }
}
