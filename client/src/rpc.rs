// Clock source over the JSON-RPC API of a node
// Only the read calls needed to know the current time are implemented.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use eac_common::U256;
use log::trace;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::provider::{Block, BlockTag, ClockSource};

pub const JSON_RPC_VERSION: &str = "2.0";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    number: String,
    timestamp: String,
    gas_limit: String,
}

impl TryFrom<RpcBlock> for Block {
    type Error = anyhow::Error;

    fn try_from(block: RpcBlock) -> Result<Self> {
        Ok(Block {
            number: parse_quantity(&block.number)?,
            timestamp: parse_quantity(&block.timestamp)?,
            gas_limit: parse_big_quantity(&block.gas_limit)?,
        })
    }
}

fn strip_hex_prefix(value: &str) -> Result<&str> {
    value
        .strip_prefix("0x")
        .with_context(|| format!("Quantity '{}' is not 0x prefixed", value))
}

/// Decode a hex encoded JSON-RPC quantity
pub fn parse_quantity(value: &str) -> Result<u64> {
    let digits = strip_hex_prefix(value)?;
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid quantity '{}'", value))
}

pub fn parse_big_quantity(value: &str) -> Result<U256> {
    let digits = strip_hex_prefix(value)?;
    U256::from_str_radix(digits, 16).with_context(|| format!("Invalid quantity '{}'", value))
}

pub struct JsonRpcClock {
    client: reqwest::Client,
    rpc_address: String,
    request_id: AtomicU64,
}

impl JsonRpcClock {
    pub fn new<S: ToString>(rpc_address: S) -> Self {
        Self {
            client: reqwest::Client::new(),
            rpc_address: rpc_address.to_string(),
            request_id: AtomicU64::new(1),
        }
    }

    pub fn rpc_address(&self) -> &str {
        &self.rpc_address
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("call: {}", method);
        }

        let request = json!({
            "jsonrpc": JSON_RPC_VERSION,
            "id": self.next_id(),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.rpc_address)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?;

        let mut body: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", method))?;

        if let Some(error) = body.get("error") {
            bail!("RPC error on {}: {}", method, error);
        }

        match body.get_mut("result").map(Value::take) {
            Some(Value::Null) | None => bail!("No result in {} response", method),
            Some(result) => Ok(result),
        }
    }

    /// Network id of the node, as used to select the contract addresses
    pub async fn network_id(&self) -> Result<u64> {
        let result = self.call("net_version", json!([])).await?;
        let version = result.as_str().context("net_version result is not a string")?;
        version
            .parse()
            .with_context(|| format!("Invalid network id '{}'", version))
    }
}

#[async_trait]
impl ClockSource for JsonRpcClock {
    async fn current_block_number(&self) -> Result<u64> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(result.as_str().context("eth_blockNumber result is not a string")?)
    }

    async fn get_block_by_number(&self, tag: BlockTag) -> Result<Block> {
        let result = self
            .call("eth_getBlockByNumber", json!([tag.to_string(), false]))
            .await?;
        let block: RpcBlock = serde_json::from_value(result)?;
        block.try_into()
    }
}
