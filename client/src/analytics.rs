// Aggregates over every request created by the factory

use std::sync::Arc;

use eac_common::{address::format_address, U256};
use log::{debug, info, trace};
use thiserror::Error;

use crate::{
    provider::Provider,
    request::{Request, RequestError},
    request_factory::{FactoryError, RequestFactory},
};

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Factory(#[from] FactoryError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("Total value transferred overflows 256 bits")]
    Overflow,
}

pub struct Analytics<P: Provider> {
    factory: RequestFactory<P>,
}

impl<P: Provider> Analytics<P> {
    pub fn new(factory: RequestFactory<P>) -> Self {
        Self { factory }
    }

    pub fn request_factory(&self) -> &RequestFactory<P> {
        &self.factory
    }

    /// Sum of the call values, in wei, of every request created since the
    /// factory deployment block, read from the request contracts themselves
    pub async fn total_value_transferred_natively(&self) -> Result<U256, AnalyticsError> {
        trace!("total value transferred natively");

        let events = self
            .factory
            .get_request_created_events(&Default::default(), None, None)
            .await?;

        let mut total = U256::zero();
        for event in &events {
            let request = Request::new(Arc::clone(self.factory.provider()), event.request)?
                .fill_data()
                .await?;

            if log::log_enabled!(log::Level::Debug) {
                debug!(
                    "Request {} transfers {} wei",
                    format_address(&event.request),
                    request.call_value()
                );
            }

            total = total
                .checked_add(request.call_value())
                .ok_or(AnalyticsError::Overflow)?;
        }

        if log::log_enabled!(log::Level::Info) {
            info!(
                "{} wei transferred by {} requests since block {}",
                total,
                events.len(),
                self.factory.start_block()
            );
        }

        Ok(total)
    }
}
