// Remote collaborators
//
// Everything that talks to the remote ledger goes through these traits.
// ABI encoding and signing belong to the implementations: the client only
// handles named arguments and opaque call data.

use std::fmt::{self, Display, Formatter};

use anyhow::Result;
use async_trait::async_trait;
use eac_common::{
    address::Address,
    request::{Bucket, Log, RawRequestData, RequestCreatedLog},
    time::get_current_time_in_seconds,
    H256, U256,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Block selector used by every ranged query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockTag {
    Earliest,
    Latest,
    Number(u64),
}

impl Display for BlockTag {
    // Format expected by JSON-RPC nodes
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Earliest => write!(f, "earliest"),
            BlockTag::Latest => write!(f, "latest"),
            BlockTag::Number(number) => write!(f, "0x{:x}", number),
        }
    }
}

impl From<u64> for BlockTag {
    fn from(number: u64) -> Self {
        BlockTag::Number(number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: H256,
    pub block_number: u64,
    // false when the transaction was reverted
    pub status: bool,
    pub logs: Vec<Log>,
}

/// Transaction ready to be signed and sent by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCall {
    pub from: Address,
    pub to: Address,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
    pub value: U256,
    pub gas: U256,
}

/// Filter on the indexed fields of `RequestCreated`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCreatedFilter {
    pub owner: Option<Address>,
    pub bucket: Option<Bucket>,
}

impl RequestCreatedFilter {
    pub fn by_owner(owner: Address) -> Self {
        Self {
            owner: Some(owner),
            bucket: None,
        }
    }

    pub fn by_bucket(bucket: Bucket) -> Self {
        Self {
            owner: None,
            bucket: Some(bucket),
        }
    }

    pub fn matches(&self, log: &RequestCreatedLog) -> bool {
        self.owner.map_or(true, |owner| owner == log.owner)
            && self.bucket.map_or(true, |bucket| bucket == log.bucket)
    }
}

/// Source of the current time of the remote ledger
#[async_trait]
pub trait ClockSource: Send + Sync {
    async fn current_block_number(&self) -> Result<u64>;

    async fn get_block_by_number(&self, tag: BlockTag) -> Result<Block>;

    async fn current_block_timestamp(&self) -> Result<u64> {
        Ok(self.get_block_by_number(BlockTag::Latest).await?.timestamp)
    }

    fn local_wall_clock_seconds(&self) -> u64 {
        get_current_time_in_seconds()
    }
}

/// Handle on a deployed transaction request
#[async_trait]
pub trait RequestContract: Send + Sync {
    fn address(&self) -> Address;

    // `requestData()` getter
    async fn request_data(&self) -> Result<RawRequestData>;

    async fn call_data(&self) -> Result<Vec<u8>>;

    /// Every log emitted by the request in the range
    async fn logs(&self, from: BlockTag, to: BlockTag) -> Result<Vec<Log>>;

    fn encode_claim(&self) -> Vec<u8>;

    fn encode_execute(&self) -> Vec<u8>;

    fn encode_cancel(&self) -> Vec<u8>;
}

#[async_trait]
pub trait RequestFactoryContract: Send + Sync {
    fn address(&self) -> Address;

    async fn is_known_request(&self, address: &Address) -> Result<bool>;

    /// Raw flags of `validateRequestParams`, one per check
    async fn validate_request_params(
        &self,
        addresses: [Address; 3],
        uints: [U256; 12],
        endowment: U256,
    ) -> Result<Vec<bool>>;

    async fn get_request_created_logs(
        &self,
        filter: &RequestCreatedFilter,
        from: BlockTag,
        to: BlockTag,
    ) -> Result<Vec<RequestCreatedLog>>;

    /// Stream of matching events, starting at `from`
    /// The stream ends when the receiver is dropped.
    async fn subscribe_request_created(
        &self,
        filter: &RequestCreatedFilter,
        from: BlockTag,
    ) -> Result<mpsc::Receiver<RequestCreatedLog>>;
}

#[async_trait]
pub trait SchedulerContract: Send + Sync {
    fn address(&self) -> Address;

    async fn compute_endowment(
        &self,
        bounty: U256,
        fee: U256,
        call_gas: U256,
        call_value: U256,
        gas_price: U256,
    ) -> Result<U256>;

    fn encode_schedule(&self, to_address: &Address, call_data: &[u8], uints: [U256; 8]) -> Vec<u8>;
}

/// Connection to the remote ledger
#[async_trait]
pub trait Provider: ClockSource + 'static {
    type Request: RequestContract + 'static;
    type Factory: RequestFactoryContract + 'static;
    type Scheduler: SchedulerContract + 'static;

    async fn network_id(&self) -> Result<u64>;

    // Accounts managed by the node, the first one is the default sender
    async fn accounts(&self) -> Result<Vec<Address>>;

    async fn get_transaction_receipt(&self, hash: &H256) -> Result<Option<TransactionReceipt>>;

    /// Sign, send and wait for the receipt of a transaction
    async fn send_transaction(&self, call: &TransactionCall) -> Result<TransactionReceipt>;

    fn request_at(&self, address: Address) -> Self::Request;

    fn factory_at(&self, address: Address) -> Self::Factory;

    fn scheduler_at(&self, address: Address) -> Self::Scheduler;
}

#[cfg(test)]
mod tests {
    use super::*;
    use eac_common::request::TemporalUnit;
    use primitive_types::H160;

    fn created(owner: Address, bucket: Bucket) -> RequestCreatedLog {
        RequestCreatedLog {
            request: H160::repeat_byte(0xaa),
            owner,
            bucket,
            params: [U256::zero(); 12],
            block_number: 1,
        }
    }

    #[test]
    fn test_block_tag_display() {
        assert_eq!(BlockTag::Latest.to_string(), "latest");
        assert_eq!(BlockTag::Earliest.to_string(), "earliest");
        assert_eq!(BlockTag::Number(6_204_104).to_string(), "0x5eaac8");
    }

    #[test]
    fn test_filter_matches() {
        let bucket = Bucket::for_window(U256::from(7_200), TemporalUnit::Time).unwrap();
        let log = created(H160::repeat_byte(1), bucket);

        assert!(RequestCreatedFilter::default().matches(&log));
        assert!(RequestCreatedFilter::by_owner(H160::repeat_byte(1)).matches(&log));
        assert!(!RequestCreatedFilter::by_owner(H160::repeat_byte(2)).matches(&log));
        assert!(RequestCreatedFilter::by_bucket(bucket).matches(&log));
        assert!(!RequestCreatedFilter::by_bucket(Bucket::from_id(-240)).matches(&log));
    }
}
