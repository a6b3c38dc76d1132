// Events emitted by the request factory and the requests
//
// Only the logs of the two events used by the client are decoded here, the
// rest of the ABI is handled by the contract handles.

use lazy_static::lazy_static;
use primitive_types::{H256, U256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use thiserror::Error;

use super::Bucket;
use crate::address::{address_from_word, Address};

const WORD_SIZE: usize = 32;

// keccak256("Executed(uint256,uint256,uint256)")
pub const EXECUTED_TOPIC: H256 = H256([
    0x3e, 0x50, 0x4b, 0xb8, 0xb2, 0x25, 0xad, 0x41, 0xf6, 0x13, 0xb0, 0xc3, 0xc4, 0x20, 0x5c, 0xdd,
    0x75, 0x2d, 0x16, 0x15, 0xb4, 0xd7, 0x7c, 0xd1, 0x77, 0x34, 0x17, 0x28, 0x2f, 0xcf, 0xb5, 0xd9,
]);

pub const REQUEST_CREATED_SIGNATURE: &str = "RequestCreated(address,address,int256,uint256[12])";

lazy_static! {
    pub static ref REQUEST_CREATED_TOPIC: H256 = event_topic(REQUEST_CREATED_SIGNATURE);
}

/// Topic identifying an event: keccak256 of its canonical signature
pub fn event_topic(signature: &str) -> H256 {
    H256::from_slice(&Keccak256::digest(signature.as_bytes()))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("Log is not a {} event", _0)]
    UnexpectedTopic(&'static str),
    #[error("Log of {} event is missing topic #{}", _0, _1)]
    MissingTopic(&'static str, usize),
    #[error("Log data of {} event has {} bytes, expected at least {}", event, got, expected)]
    DataTooShort {
        event: &'static str,
        expected: usize,
        got: usize,
    },
}

/// Raw log as returned by the remote node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
    pub block_number: u64,
    #[serde(default)]
    pub transaction_hash: Option<H256>,
}

impl Log {
    pub fn has_topic(&self, topic: &H256) -> bool {
        self.topics.first() == Some(topic)
    }

    fn word(&self, index: usize) -> Option<&[u8]> {
        self.data.get(index * WORD_SIZE..(index + 1) * WORD_SIZE)
    }

    fn ensure_words(&self, event: &'static str, count: usize) -> Result<(), EventError> {
        let expected = count * WORD_SIZE;
        if self.data.len() < expected {
            return Err(EventError::DataTooShort {
                event,
                expected,
                got: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Payout of an execution, logged by the request itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedEvent {
    pub block_number: u64,
    pub bounty: U256,
    pub fee: U256,
    pub estimated_gas: U256,
}

impl TryFrom<&Log> for ExecutedEvent {
    type Error = EventError;

    fn try_from(log: &Log) -> Result<Self, Self::Error> {
        if !log.has_topic(&EXECUTED_TOPIC) {
            return Err(EventError::UnexpectedTopic("Executed"));
        }
        log.ensure_words("Executed", 3)?;

        let word = |i| U256::from_big_endian(&log.data[i * WORD_SIZE..(i + 1) * WORD_SIZE]);
        Ok(Self {
            block_number: log.block_number,
            bounty: word(0),
            fee: word(1),
            estimated_gas: word(2),
        })
    }
}

/// `RequestCreated` event of the request factory
/// Owner and bucket are indexed, the request address and its params are in the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCreatedLog {
    pub request: Address,
    pub owner: Address,
    pub bucket: Bucket,
    pub params: [U256; 12],
    pub block_number: u64,
}

impl TryFrom<&Log> for RequestCreatedLog {
    type Error = EventError;

    fn try_from(log: &Log) -> Result<Self, Self::Error> {
        const EVENT: &str = "RequestCreated";

        if !log.has_topic(&REQUEST_CREATED_TOPIC) {
            return Err(EventError::UnexpectedTopic(EVENT));
        }
        let owner = log
            .topics
            .get(1)
            .and_then(|topic| address_from_word(topic.as_bytes()))
            .ok_or(EventError::MissingTopic(EVENT, 1))?;
        let bucket = log
            .topics
            .get(2)
            .map(|topic| Bucket::from_id(int256_to_i128(topic.as_bytes())))
            .ok_or(EventError::MissingTopic(EVENT, 2))?;

        log.ensure_words(EVENT, 13)?;
        let request = log
            .word(0)
            .and_then(address_from_word)
            .ok_or(EventError::DataTooShort {
                event: EVENT,
                expected: WORD_SIZE,
                got: log.data.len(),
            })?;

        let mut params = [U256::zero(); 12];
        for (i, param) in params.iter_mut().enumerate() {
            if let Some(word) = log.word(i + 1) {
                *param = U256::from_big_endian(word);
            }
        }

        Ok(Self {
            request,
            owner,
            bucket,
            params,
            block_number: log.block_number,
        })
    }
}

// Two's complement int256 to i128, buckets always fit in the low 16 bytes
fn int256_to_i128(word: &[u8]) -> i128 {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&word[16..32]);
    i128::from_be_bytes(bytes)
}

/// Address of the request created by a scheduling transaction
pub fn request_address_from_logs<'a, I>(logs: I) -> Option<Address>
where
    I: IntoIterator<Item = &'a Log>,
{
    logs.into_iter()
        .find(|log| log.has_topic(&REQUEST_CREATED_TOPIC))
        .and_then(|log| log.word(0))
        .and_then(address_from_word)
}
