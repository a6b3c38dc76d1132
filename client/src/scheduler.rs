// Scheduling of new requests
//
// Flow: check required options, fill the defaults, compute the endowment,
// validate against the request factory, build the call and submit it.

use std::sync::Arc;

use eac_common::{
    address::{format_address, Address},
    config::SCHEDULE_TRANSACTION_GAS,
    economics::EconomicsError,
    network::{AddressSet, Network, NetworkAddresses, NetworkError},
    request::request_address_from_logs,
    scheduling::{
        validate_request_params_locally, ParamsValidity, ScheduleRequest, SchedulingError,
        SchedulingOptions, ValidationErrors,
    },
    H256, U256,
};
use log::{debug, info, trace, warn};
use thiserror::Error;

use crate::{
    clock,
    provider::{BlockTag, Provider, SchedulerContract, TransactionCall, TransactionReceipt},
    request::{Request, RequestError, Unloaded},
    request_factory::{FactoryError, RequestFactory},
};

/// Transaction scheduling a new request
pub type ScheduleCall = TransactionCall;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Options(#[from] SchedulingError),
    #[error(transparent)]
    Economics(#[from] EconomicsError),
    #[error(transparent)]
    InvalidParams(#[from] ValidationErrors),
    #[error(transparent)]
    Factory(#[from] FactoryError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("No RequestCreated log in the receipt of transaction {:?}", _0)]
    RequestNotFoundInReceipt(H256),
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

pub struct Scheduler<P: Provider> {
    provider: Arc<P>,
    network: Network,
    addresses: AddressSet,
}

impl<P: Provider> Scheduler<P> {
    /// Connect to the network reported by the provider
    pub async fn connect(
        provider: Arc<P>,
        table: &NetworkAddresses,
    ) -> Result<Self, SchedulerError> {
        trace!("connect scheduler");

        let network_id = provider.network_id().await?;
        let (network, addresses) = table.resolve(network_id)?;
        if log::log_enabled!(log::Level::Info) {
            info!("Connected to network {} (id {})", network, network_id);
        }

        Ok(Self {
            provider,
            network,
            addresses: addresses.clone(),
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn addresses(&self) -> &AddressSet {
        &self.addresses
    }

    pub fn request_factory(&self) -> Result<RequestFactory<P>, FactoryError> {
        RequestFactory::for_network(
            Arc::clone(&self.provider),
            self.addresses.request_factory,
            self.network,
        )
    }

    pub fn transaction_request(&self, address: Address) -> Result<Request<P, Unloaded>, RequestError> {
        Request::new(Arc::clone(&self.provider), address)
    }

    /// Address of the request created by a scheduling transaction
    pub fn request_address_from_receipt(
        receipt: &TransactionReceipt,
    ) -> Result<Address, SchedulerError> {
        request_address_from_logs(&receipt.logs)
            .ok_or(SchedulerError::RequestNotFoundInReceipt(receipt.transaction_hash))
    }

    pub fn transaction_request_from_receipt(
        &self,
        receipt: &TransactionReceipt,
    ) -> Result<Request<P, Unloaded>, SchedulerError> {
        let address = Self::request_address_from_receipt(receipt)?;
        Ok(self.transaction_request(address)?)
    }

    fn scheduler_for(&self, request: &ScheduleRequest) -> P::Scheduler {
        let address = *self.addresses.scheduler(request.timestamp_scheduling());
        self.provider.scheduler_at(address)
    }

    /// Check the required options and apply the defaults
    /// The sender defaults to the first account of the provider.
    pub async fn fill_missing_options(
        &self,
        options: SchedulingOptions,
    ) -> Result<ScheduleRequest, SchedulerError> {
        options.assert_required_options_are_present()?;

        let default_from = if options.from.is_none() {
            let accounts = self.provider.accounts().await?;
            accounts.first().copied()
        } else {
            None
        };

        Ok(options.fill_missing_options(default_from)?)
    }

    /// Endowment required by the scheduler contract for these options
    pub async fn compute_endowment(&self, options: SchedulingOptions) -> Result<U256, SchedulerError> {
        let request = self.fill_missing_options(options).await?;
        self.compute_request_endowment(&request).await
    }

    async fn compute_request_endowment(
        &self,
        request: &ScheduleRequest,
    ) -> Result<U256, SchedulerError> {
        trace!("compute endowment");

        let endowment = self
            .scheduler_for(request)
            .compute_endowment(
                request.bounty,
                request.fee,
                request.call_gas,
                request.call_value,
                request.gas_price,
            )
            .await?;

        // Remote value wins
        match request.endowment() {
            Ok(local) if local != endowment => {
                if log::log_enabled!(log::Level::Warn) {
                    warn!(
                        "Endowment computed by the scheduler ({}) differs from the local one ({})",
                        endowment, local
                    );
                }
            }
            Err(e) => warn!("Cannot compute the endowment locally: {}", e),
            _ => {}
        }

        Ok(endowment)
    }

    /// Validate the request against the request factory
    /// Every failed check is reported at once.
    pub async fn validate_schedule_options(
        &self,
        request: &ScheduleRequest,
        endowment: U256,
    ) -> Result<(), SchedulerError> {
        trace!("validate schedule options");

        let validity = self
            .request_factory()?
            .validate_request_params(request.address_args(), request.uint_args(), endowment)
            .await?;

        if log::log_enabled!(log::Level::Debug) {
            debug!("Request params validity: {:?}", validity);
        }
        Ok(validity.into_result()?)
    }

    /// Same checks as [`Scheduler::validate_schedule_options`] computed
    /// locally from the current block
    pub async fn validate_schedule_options_locally(
        &self,
        request: &ScheduleRequest,
        endowment: U256,
    ) -> Result<ParamsValidity, SchedulerError> {
        trace!("validate schedule options locally");

        let now = clock::now(self.provider.as_ref(), request.temporal_unit).await?;
        let block = self.provider.get_block_by_number(BlockTag::Latest).await?;

        Ok(validate_request_params_locally(
            &request.request_params(),
            endowment,
            now,
            block.gas_limit,
        ))
    }

    /// Build the scheduling transaction, without sending it
    pub async fn schedule(&self, options: SchedulingOptions) -> Result<ScheduleCall, SchedulerError> {
        trace!("schedule");

        let request = self.fill_missing_options(options).await?;
        let endowment = self.compute_request_endowment(&request).await?;
        self.validate_schedule_options(&request, endowment).await?;

        let scheduler = self.scheduler_for(&request);
        let data = scheduler.encode_schedule(
            &request.to_address,
            &request.call_data,
            request.schedule_args(),
        );

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Scheduling call to {} at {} ({}) with endowment {}",
                format_address(&request.to_address),
                request.window_start,
                request.temporal_unit,
                endowment
            );
        }

        Ok(ScheduleCall {
            from: request.from,
            to: scheduler.address(),
            data,
            value: endowment,
            gas: U256::from(SCHEDULE_TRANSACTION_GAS),
        })
    }

    pub async fn submit(&self, call: &ScheduleCall) -> Result<TransactionReceipt, SchedulerError> {
        trace!("submit schedule call");

        let receipt = self.provider.send_transaction(call).await?;
        if log::log_enabled!(log::Level::Info) {
            info!(
                "Scheduling transaction {:?} included in block {}",
                receipt.transaction_hash, receipt.block_number
            );
        }
        Ok(receipt)
    }

    pub async fn schedule_and_submit(
        &self,
        options: SchedulingOptions,
    ) -> Result<TransactionReceipt, SchedulerError> {
        let call = self.schedule(options).await?;
        self.submit(&call).await
    }
}
