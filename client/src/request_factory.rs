// Request factory: registry of every request and index of their creations
//
// Requests are indexed by bucket in the `RequestCreated` events. Watchers use
// it to only follow the requests of the windows they care about.

use std::sync::Arc;

use eac_common::{
    address::{format_address, is_not_null_address, Address},
    network::{Network, NetworkError},
    request::{Bucket, BucketError, RequestCreatedLog, TemporalUnit},
    scheduling::{ParamsValidity, ValidityShapeError},
    U256,
};
use log::{debug, trace, warn};
use thiserror::Error;

use crate::{
    provider::{BlockTag, Provider, RequestCreatedFilter, RequestFactoryContract},
    subscription::Subscription,
};

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Attempted to instantiate a request factory from a null address")]
    NullAddress,
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Validity(#[from] ValidityShapeError),
    #[error(transparent)]
    Bucket(#[from] BucketError),
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

pub struct RequestFactory<P: Provider> {
    provider: Arc<P>,
    contract: P::Factory,
    // First block worth scanning for events
    start_block: u64,
}

impl<P: Provider> RequestFactory<P> {
    /// Factory deployed at `address` on the network the provider is connected to
    pub async fn new(provider: Arc<P>, address: Address) -> Result<Self, FactoryError> {
        if !is_not_null_address(&address) {
            return Err(FactoryError::NullAddress);
        }

        let network = Network::try_from(provider.network_id().await?)?;
        Self::for_network(provider, address, network)
    }

    /// Factory deployed at `address` on an already resolved network
    pub fn for_network(
        provider: Arc<P>,
        address: Address,
        network: Network,
    ) -> Result<Self, FactoryError> {
        if !is_not_null_address(&address) {
            return Err(FactoryError::NullAddress);
        }

        let start_block = network.request_factory_start_block();
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Request factory {} on {} scanned from block {}",
                format_address(&address),
                network,
                start_block
            );
        }

        let contract = provider.factory_at(address);
        Ok(Self {
            provider,
            contract,
            start_block,
        })
    }

    /// Override the block every default event scan starts at
    pub fn with_start_block(mut self, start_block: u64) -> Self {
        self.start_block = start_block;
        self
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub fn start_block(&self) -> u64 {
        self.start_block
    }

    pub async fn is_known_request(&self, address: &Address) -> Result<bool, FactoryError> {
        trace!("is known request {}", format_address(address));
        Ok(self.contract.is_known_request(address).await?)
    }

    /// Bucket under which the factory indexes a request
    pub fn calc_bucket(window_start: U256, unit: TemporalUnit) -> Result<Bucket, FactoryError> {
        Ok(Bucket::for_window(window_start, unit)?)
    }

    /// Run the checks of the request library against the given arguments
    pub async fn validate_request_params(
        &self,
        addresses: [Address; 3],
        uints: [U256; 12],
        endowment: U256,
    ) -> Result<ParamsValidity, FactoryError> {
        trace!("validate request params");
        let flags = self
            .contract
            .validate_request_params(addresses, uints, endowment)
            .await?;
        Ok(ParamsValidity::try_from(flags.as_slice())?)
    }

    /// Call `callback` for every matching `RequestCreated` event since `from`
    /// Events are also filtered locally, in case the remote filter is partial.
    pub async fn watch_request_created_logs<F>(
        &self,
        filter: RequestCreatedFilter,
        from: BlockTag,
        mut callback: F,
    ) -> Result<Subscription, FactoryError>
    where
        F: FnMut(RequestCreatedLog) + Send + 'static,
    {
        trace!("watch request created logs from {}", from);

        let mut receiver = self
            .contract
            .subscribe_request_created(&filter, from)
            .await?;

        Ok(Subscription::spawn("request-created", async move {
            while let Some(log) = receiver.recv().await {
                if !filter.matches(&log) {
                    if log::log_enabled!(log::Level::Debug) {
                        debug!(
                            "Ignoring request {} not matching the filter",
                            format_address(&log.request)
                        );
                    }
                    continue;
                }
                callback(log);
            }
            debug!("RequestCreated stream ended");
        }))
    }

    /// Watch the requests created in a bucket
    pub async fn watch_requests_by_bucket<F>(
        &self,
        bucket: Bucket,
        callback: F,
    ) -> Result<Subscription, FactoryError>
    where
        F: FnMut(RequestCreatedLog) + Send + 'static,
    {
        self.watch_request_created_logs(
            RequestCreatedFilter::by_bucket(bucket),
            BlockTag::Number(self.start_block),
            callback,
        )
        .await
    }

    /// Stop a watch, same as [`Subscription::unsubscribe`]
    pub fn stop_watch(&self, mut subscription: Subscription) -> bool {
        subscription.unsubscribe()
    }

    /// Past `RequestCreated` events
    /// `from` defaults to the factory deployment block and `to` to the latest block.
    pub async fn get_request_created_events(
        &self,
        filter: &RequestCreatedFilter,
        from: Option<BlockTag>,
        to: Option<BlockTag>,
    ) -> Result<Vec<RequestCreatedLog>, FactoryError> {
        let from = from.unwrap_or(BlockTag::Number(self.start_block));
        let to = to.unwrap_or(BlockTag::Latest);
        trace!("get request created events from {} to {}", from, to);

        let mut events = self
            .contract
            .get_request_created_logs(filter, from, to)
            .await?;

        let total = events.len();
        events.retain(|event| filter.matches(event));
        if events.len() != total && log::log_enabled!(log::Level::Warn) {
            warn!(
                "Remote node returned {} events not matching the filter",
                total - events.len()
            );
        }

        Ok(events)
    }

    pub async fn get_requests_by_owner(
        &self,
        owner: Address,
        from: Option<BlockTag>,
        to: Option<BlockTag>,
    ) -> Result<Vec<Address>, FactoryError> {
        let events = self
            .get_request_created_events(&RequestCreatedFilter::by_owner(owner), from, to)
            .await?;
        Ok(events.into_iter().map(|event| event.request).collect())
    }

    pub async fn get_requests_by_bucket(
        &self,
        bucket: Bucket,
        from: Option<BlockTag>,
        to: Option<BlockTag>,
    ) -> Result<Vec<Address>, FactoryError> {
        let events = self
            .get_request_created_events(&RequestCreatedFilter::by_bucket(bucket), from, to)
            .await?;
        Ok(events.into_iter().map(|event| event.request).collect())
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }
}
