// In-memory ledger used by the integration tests
//
// Contract handles share the state of the provider that created them.
// Remote filters are not applied on purpose: the client must filter itself.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use eac_client::provider::{
    Block, BlockTag, ClockSource, Provider, RequestContract, RequestCreatedFilter,
    RequestFactoryContract, SchedulerContract, TransactionCall, TransactionReceipt,
};
use eac_common::{
    address::{Address, NULL_ADDRESS},
    economics::calc_endowment,
    network::{AddressSet, Network, NetworkAddresses},
    request::{
        Bucket, Log, RawRequestData, RequestCreatedLog, TemporalUnit, EXECUTED_TOPIC,
        REQUEST_CREATED_TOPIC,
    },
    scheduling::{validate_request_params_locally, RequestParams},
    H256, U256,
};
use indexmap::IndexMap;
use primitive_types::H160;
use tokio::sync::mpsc;

pub const BLOCK_SCHEDULER: Address = H160([0x11; 20]);
pub const TIMESTAMP_SCHEDULER: Address = H160([0x22; 20]);
pub const REQUEST_FACTORY: Address = H160([0x33; 20]);
pub const SENDER: Address = H160([0x44; 20]);
pub const DESTINATION: Address = H160([0x55; 20]);

pub const CLAIM_SELECTOR: [u8; 4] = [0x4e, 0x71, 0xd9, 0x2d];
pub const EXECUTE_SELECTOR: [u8; 4] = [0x61, 0x46, 0x19, 0x54];
pub const CANCEL_SELECTOR: [u8; 4] = [0xea, 0x8a, 0x1a, 0xf0];
const SCHEDULE_SELECTOR: [u8; 4] = [0x8b, 0x38, 0x7e, 0x64];

pub fn word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    for (i, byte) in word.iter_mut().rev().enumerate() {
        *byte = value.byte(i);
    }
    word
}

pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

pub fn bucket_topic(bucket: Bucket) -> H256 {
    let fill = if bucket.id() < 0 { 0xff } else { 0x00 };
    let mut topic = [fill; 32];
    topic[16..].copy_from_slice(&bucket.id().to_be_bytes());
    H256(topic)
}

/// Raw data of an unclaimed request with the default parameters of `unit`
pub fn raw_request(unit: TemporalUnit, window_start: u64) -> RawRequestData {
    let mut uints = vec![U256::zero(); 15];
    uints[1] = U256::from(1_000);
    uints[3] = U256::from(10_000_000_000_000_000u64);
    uints[5] = U256::from(unit.claim_window_size());
    uints[6] = U256::from(unit.freeze_period());
    uints[7] = U256::from(unit.reserved_window_size());
    uints[8] = U256::from(unit.id());
    uints[9] = U256::from(unit.default_window_size());
    uints[10] = U256::from(window_start);
    uints[11] = U256::from(21_000);
    uints[13] = U256::from(30_000_000_000u64);

    RawRequestData {
        addresses: vec![NULL_ADDRESS, SENDER, SENDER, NULL_ADDRESS, NULL_ADDRESS, DESTINATION],
        bools: vec![false, false, false],
        uints,
        uint8s: vec![0],
    }
}

pub fn executed_log(request: Address, block_number: u64) -> Log {
    let mut data = word(U256::from(9_000)).to_vec();
    data.extend_from_slice(&word(U256::from(100)));
    data.extend_from_slice(&word(U256::from(60_000)));
    Log {
        address: request,
        topics: vec![EXECUTED_TOPIC],
        data,
        block_number,
        transaction_hash: None,
    }
}

pub fn request_created(
    request: Address,
    owner: Address,
    unit: TemporalUnit,
    window_start: u64,
    block_number: u64,
) -> RequestCreatedLog {
    RequestCreatedLog {
        request,
        owner,
        bucket: Bucket::for_window(U256::from(window_start), unit).unwrap(),
        params: [U256::zero(); 12],
        block_number,
    }
}

pub fn network_addresses() -> NetworkAddresses {
    let mut networks = IndexMap::new();
    networks.insert(
        Network::Development,
        AddressSet {
            block_scheduler: BLOCK_SCHEDULER,
            timestamp_scheduler: TIMESTAMP_SCHEDULER,
            request_factory: REQUEST_FACTORY,
            transaction_request_core: None,
            libraries: IndexMap::new(),
        },
    );
    NetworkAddresses::new(networks).unwrap()
}

pub struct ChainState {
    pub network_id: u64,
    pub block_number: u64,
    pub timestamp: u64,
    pub local_time: u64,
    pub gas_limit: U256,
    pub accounts: Vec<Address>,
    pub requests: HashMap<Address, RawRequestData>,
    pub request_logs: HashMap<Address, Vec<Log>>,
    pub known_requests: HashSet<Address>,
    pub created_logs: Vec<RequestCreatedLog>,
    // Replaces the computed validity flags when set
    pub validity_override: Option<Vec<bool>>,
    pub endowment_offset: U256,
    pub sent: Vec<TransactionCall>,
    pub subscribers: Vec<mpsc::Sender<RequestCreatedLog>>,
    pub subscriptions: Vec<(RequestCreatedFilter, BlockTag)>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            network_id: Network::Development.id(),
            block_number: 7_000_000,
            timestamp: 1_700_000_000,
            local_time: 1_700_000_000,
            gas_limit: U256::from(8_000_000),
            accounts: vec![SENDER],
            requests: HashMap::new(),
            request_logs: HashMap::new(),
            known_requests: HashSet::new(),
            created_logs: Vec::new(),
            validity_override: None,
            endowment_offset: U256::zero(),
            sent: Vec::new(),
            subscribers: Vec::new(),
            subscriptions: Vec::new(),
        }
    }
}

impl ChainState {
    fn now(&self, unit: &U256) -> U256 {
        if *unit == U256::from(TemporalUnit::Block.id()) {
            U256::from(self.block_number + 1)
        } else {
            U256::from(self.local_time.max(self.timestamp))
        }
    }
}

pub type SharedState = Arc<Mutex<ChainState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, ChainState> {
    state.lock().unwrap()
}

pub struct MockProvider {
    state: SharedState,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Self::with_state(ChainState::default())
    }

    pub fn with_state(state: ChainState) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, ChainState> {
        lock(&self.state)
    }

    pub fn add_request(&self, address: Address, raw: RawRequestData) {
        let mut state = self.state();
        state.known_requests.insert(address);
        state.requests.insert(address, raw);
    }

    /// Push a new event to every live subscriber
    pub async fn emit(&self, log: RequestCreatedLog) {
        let subscribers = {
            let mut state = self.state();
            state.created_logs.push(log.clone());
            state.subscribers.clone()
        };
        for subscriber in subscribers {
            let _ = subscriber.send(log.clone()).await;
        }
    }

    pub fn live_subscribers(&self) -> usize {
        self.state()
            .subscribers
            .iter()
            .filter(|subscriber| !subscriber.is_closed())
            .count()
    }
}

#[async_trait]
impl ClockSource for MockProvider {
    async fn current_block_number(&self) -> Result<u64> {
        Ok(self.state().block_number)
    }

    async fn get_block_by_number(&self, tag: BlockTag) -> Result<Block> {
        let state = self.state();
        let number = match tag {
            BlockTag::Number(number) => number,
            BlockTag::Latest => state.block_number,
            BlockTag::Earliest => 0,
        };
        Ok(Block {
            number,
            timestamp: state.timestamp,
            gas_limit: state.gas_limit,
        })
    }

    fn local_wall_clock_seconds(&self) -> u64 {
        self.state().local_time
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Factory = MockFactory;
    type Scheduler = MockScheduler;

    async fn network_id(&self) -> Result<u64> {
        Ok(self.state().network_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.state().accounts.clone())
    }

    async fn get_transaction_receipt(&self, _: &H256) -> Result<Option<TransactionReceipt>> {
        Ok(None)
    }

    // Schedule calls create a request, anything else is only recorded
    async fn send_transaction(&self, call: &TransactionCall) -> Result<TransactionReceipt> {
        let mut state = self.state();
        state.sent.push(call.clone());
        state.block_number += 1;

        let block_number = state.block_number;
        let transaction_hash = H256::from_low_u64_be(state.sent.len() as u64);
        let mut logs = Vec::new();

        let unit = if call.to == BLOCK_SCHEDULER {
            Some(TemporalUnit::Block)
        } else if call.to == TIMESTAMP_SCHEDULER {
            Some(TemporalUnit::Time)
        } else {
            None
        };
        if let Some(unit) = unit {
            let window_start = U256::from_big_endian(&call.data[24 + 3 * 32..24 + 4 * 32]);
            let request = H160::from_low_u64_be(0xdead_0000 + state.sent.len() as u64);
            let created = RequestCreatedLog {
                request,
                owner: call.from,
                bucket: Bucket::for_window(window_start, unit)?,
                params: [U256::zero(); 12],
                block_number,
            };

            let mut data = address_word(&request).to_vec();
            for _ in 0..12 {
                data.extend_from_slice(&[0u8; 32]);
            }
            logs.push(Log {
                address: REQUEST_FACTORY,
                topics: vec![
                    *REQUEST_CREATED_TOPIC,
                    H256(address_word(&call.from)),
                    bucket_topic(created.bucket),
                ],
                data,
                block_number,
                transaction_hash: Some(transaction_hash),
            });

            let mut raw = raw_request(unit, window_start.low_u64());
            raw.addresses[1] = call.from;
            raw.addresses[2] = call.from;
            state.requests.insert(request, raw);
            state.known_requests.insert(request);
            state.created_logs.push(created);
        }

        Ok(TransactionReceipt {
            transaction_hash,
            block_number,
            status: true,
            logs,
        })
    }

    fn request_at(&self, address: Address) -> MockRequest {
        MockRequest {
            address,
            state: Arc::clone(&self.state),
        }
    }

    fn factory_at(&self, address: Address) -> MockFactory {
        MockFactory {
            address,
            state: Arc::clone(&self.state),
        }
    }

    fn scheduler_at(&self, address: Address) -> MockScheduler {
        MockScheduler {
            address,
            state: Arc::clone(&self.state),
        }
    }
}

pub struct MockRequest {
    address: Address,
    state: SharedState,
}

#[async_trait]
impl RequestContract for MockRequest {
    fn address(&self) -> Address {
        self.address
    }

    async fn request_data(&self) -> Result<RawRequestData> {
        lock(&self.state)
            .requests
            .get(&self.address)
            .cloned()
            .ok_or_else(|| anyhow!("No contract at {:?}", self.address))
    }

    async fn call_data(&self) -> Result<Vec<u8>> {
        Ok(vec![0xca, 0x11])
    }

    async fn logs(&self, _: BlockTag, _: BlockTag) -> Result<Vec<Log>> {
        Ok(lock(&self.state)
            .request_logs
            .get(&self.address)
            .cloned()
            .unwrap_or_default())
    }

    fn encode_claim(&self) -> Vec<u8> {
        CLAIM_SELECTOR.to_vec()
    }

    fn encode_execute(&self) -> Vec<u8> {
        EXECUTE_SELECTOR.to_vec()
    }

    fn encode_cancel(&self) -> Vec<u8> {
        CANCEL_SELECTOR.to_vec()
    }
}

pub struct MockFactory {
    address: Address,
    state: SharedState,
}

fn in_range(block_number: u64, from: BlockTag, to: BlockTag) -> bool {
    let after_from = match from {
        BlockTag::Number(from) => block_number >= from,
        _ => true,
    };
    let before_to = match to {
        BlockTag::Number(to) => block_number <= to,
        _ => true,
    };
    after_from && before_to
}

#[async_trait]
impl RequestFactoryContract for MockFactory {
    fn address(&self) -> Address {
        self.address
    }

    async fn is_known_request(&self, address: &Address) -> Result<bool> {
        Ok(lock(&self.state).known_requests.contains(address))
    }

    async fn validate_request_params(
        &self,
        addresses: [Address; 3],
        uints: [U256; 12],
        endowment: U256,
    ) -> Result<Vec<bool>> {
        let state = lock(&self.state);
        if let Some(flags) = state.validity_override.clone() {
            return Ok(flags);
        }

        let params = RequestParams::from_args(&addresses, &uints);
        let validity = validate_request_params_locally(
            &params,
            endowment,
            state.now(&params.temporal_unit),
            state.gas_limit,
        );
        Ok(vec![
            validity.endowment,
            validity.reserved_window,
            validity.temporal_unit,
            validity.execution_window,
            validity.call_gas,
            validity.to_address,
        ])
    }

    async fn get_request_created_logs(
        &self,
        _: &RequestCreatedFilter,
        from: BlockTag,
        to: BlockTag,
    ) -> Result<Vec<RequestCreatedLog>> {
        Ok(lock(&self.state)
            .created_logs
            .iter()
            .filter(|log| in_range(log.block_number, from, to))
            .cloned()
            .collect())
    }

    async fn subscribe_request_created(
        &self,
        filter: &RequestCreatedFilter,
        from: BlockTag,
    ) -> Result<mpsc::Receiver<RequestCreatedLog>> {
        let (sender, receiver) = mpsc::channel(16);
        let mut state = lock(&self.state);
        for log in state
            .created_logs
            .iter()
            .filter(|log| in_range(log.block_number, from, BlockTag::Latest))
        {
            sender.try_send(log.clone())?;
        }
        state.subscribers.push(sender);
        state.subscriptions.push((*filter, from));
        Ok(receiver)
    }
}

pub struct MockScheduler {
    address: Address,
    state: SharedState,
}

#[async_trait]
impl SchedulerContract for MockScheduler {
    fn address(&self) -> Address {
        self.address
    }

    async fn compute_endowment(
        &self,
        bounty: U256,
        fee: U256,
        call_gas: U256,
        call_value: U256,
        gas_price: U256,
    ) -> Result<U256> {
        let endowment = calc_endowment(call_gas, call_value, gas_price, fee, bounty)?;
        Ok(endowment + lock(&self.state).endowment_offset)
    }

    // selector, destination, 8 words, call data
    fn encode_schedule(&self, to_address: &Address, call_data: &[u8], uints: [U256; 8]) -> Vec<u8> {
        let mut data = SCHEDULE_SELECTOR.to_vec();
        data.extend_from_slice(to_address.as_bytes());
        for value in uints {
            data.extend_from_slice(&word(value));
        }
        data.extend_from_slice(call_data);
        data
    }
}
