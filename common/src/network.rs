use std::{fs, path::Path};

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use thiserror::Error;

use crate::address::{is_not_null_address, Address};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Network with id: \"{}\" is not supported", _0)]
    UnsupportedNetwork(u64),
    #[error("No contract addresses configured for network {}", _0)]
    MissingAddresses(Network),
    #[error("Contract '{contract}' has a null address on network {network}")]
    NullAddress {
        network: Network,
        contract: &'static str,
    },
    #[error("Invalid contract addresses configuration: {}", _0)]
    InvalidConfig(#[from] serde_json::Error),
    #[error("Cannot read contract addresses configuration: {}", _0)]
    Io(#[from] std::io::Error),
}

/// Networks on which the scheduler contracts are deployed
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Network {
    Mainnet,
    Ropsten,
    Rinkeby,
    Kovan,
    // Local dockerized chain
    Docker,
    // Local development chain
    Development,
    Tobalaba,
}

impl Network {
    pub fn id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Ropsten => 3,
            Network::Rinkeby => 4,
            Network::Kovan => 42,
            Network::Docker => 1001,
            Network::Development => 1002,
            Network::Tobalaba => 401697,
        }
    }

    /// Block at which the request factory was deployed
    /// Event scans start here instead of the genesis block.
    pub fn request_factory_start_block(&self) -> u64 {
        match self {
            Network::Mainnet => 6_204_104,
            Network::Ropsten => 2_594_245,
            Network::Kovan => 5_555_500,
            _ => 1,
        }
    }
}

impl TryFrom<u64> for Network {
    type Error = NetworkError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Ok(match id {
            1 => Network::Mainnet,
            3 => Network::Ropsten,
            4 => Network::Rinkeby,
            42 => Network::Kovan,
            1001 => Network::Docker,
            1002 => Network::Development,
            401697 => Network::Tobalaba,
            _ => return Err(NetworkError::UnsupportedNetwork(id)),
        })
    }
}

/// Contract addresses deployed on one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSet {
    pub block_scheduler: Address,
    pub timestamp_scheduler: Address,
    pub request_factory: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_request_core: Option<Address>,
    // Shared libraries (requestLib, claimLib, executionLib, ...)
    #[serde(flatten)]
    pub libraries: IndexMap<String, Address>,
}

impl AddressSet {
    /// Scheduler contract for the requested temporal unit
    pub fn scheduler(&self, timestamp_scheduling: bool) -> &Address {
        if timestamp_scheduling {
            &self.timestamp_scheduler
        } else {
            &self.block_scheduler
        }
    }

    pub fn library(&self, name: &str) -> Option<&Address> {
        self.libraries.get(name)
    }

    fn verify(&self, network: Network) -> Result<(), NetworkError> {
        for (contract, address) in [
            ("blockScheduler", &self.block_scheduler),
            ("timestampScheduler", &self.timestamp_scheduler),
            ("requestFactory", &self.request_factory),
        ] {
            if !is_not_null_address(address) {
                return Err(NetworkError::NullAddress { network, contract });
            }
        }
        Ok(())
    }
}

/// Contract addresses of every supported network
/// Loaded once at startup and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkAddresses {
    networks: IndexMap<Network, AddressSet>,
}

impl NetworkAddresses {
    pub fn new(networks: IndexMap<Network, AddressSet>) -> Result<Self, NetworkError> {
        for (network, addresses) in networks.iter() {
            addresses.verify(*network)?;
        }
        Ok(Self { networks })
    }

    pub fn from_json(json: &str) -> Result<Self, NetworkError> {
        let networks: IndexMap<Network, AddressSet> = serde_json::from_str(json)?;
        Self::new(networks)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NetworkError> {
        let path = path.as_ref();
        if log::log_enabled!(log::Level::Debug) {
            debug!("Loading contract addresses from {}", path.display());
        }
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn get(&self, network: Network) -> Result<&AddressSet, NetworkError> {
        self.networks
            .get(&network)
            .ok_or(NetworkError::MissingAddresses(network))
    }

    /// Resolve the addresses for a network id reported by the remote node
    pub fn resolve(&self, network_id: u64) -> Result<(Network, &AddressSet), NetworkError> {
        let network = Network::try_from(network_id)?;
        Ok((network, self.get(network)?))
    }

    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.networks.keys()
    }
}
