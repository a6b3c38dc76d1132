use clap::{Parser, Subcommand, ValueEnum};
use eac_common::{
    config::{
        DEFAULT_BOUNTY, DEFAULT_CALL_GAS, DEFAULT_CALL_VALUE, DEFAULT_FEE, DEFAULT_GAS_PRICE,
        VERSION,
    },
    network::Network,
    request::TemporalUnit,
};
use serde::{Deserialize, Serialize};
use strum::Display;

// JSON-RPC node used when none is specified
pub const DEFAULT_RPC_ADDRESS: &str = "http://127.0.0.1:8545";

// Functions Helpers
fn default_rpc_address() -> String {
    DEFAULT_RPC_ADDRESS.to_owned()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC address of the node
    #[clap(long, default_value_t = String::from(DEFAULT_RPC_ADDRESS))]
    #[serde(default = "default_rpc_address")]
    pub rpc_address: String,
    /// Network to use
    /// By default, it is detected from the node.
    #[clap(long, value_enum)]
    #[serde(default)]
    pub network: Option<Network>,
    /// JSON file with the contract addresses of each network
    #[clap(long)]
    #[serde(default)]
    pub contracts_config: Option<String>,
}

#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct LogConfig {
    /// Set log level
    /// RUST_LOG overrides it when set.
    #[clap(long, value_enum, default_value_t)]
    #[serde(default)]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Subcommand, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Endowment to send when scheduling a request
    Endowment {
        #[clap(long, default_value_t = DEFAULT_CALL_GAS.to_string())]
        call_gas: String,
        #[clap(long, default_value_t = DEFAULT_CALL_VALUE.to_string())]
        call_value: String,
        #[clap(long, default_value_t = DEFAULT_GAS_PRICE.to_string())]
        gas_price: String,
        #[clap(long, default_value_t = DEFAULT_FEE.to_string())]
        fee: String,
        #[clap(long, default_value_t = DEFAULT_BOUNTY.to_string())]
        bounty: String,
    },
    /// Highest gas price an executor can pay for a given bounty
    MaxGasPrice {
        #[clap(long, default_value_t = DEFAULT_BOUNTY.to_string())]
        bounty: String,
        #[clap(long, default_value_t = DEFAULT_GAS_PRICE.to_string())]
        gas_price: String,
        #[clap(long, default_value_t = DEFAULT_CALL_GAS.to_string())]
        call_gas: String,
    },
    /// Bounty needed to pay an additional gas price to the executor
    Bounty {
        #[clap(long, default_value_t = DEFAULT_GAS_PRICE.to_string())]
        gas_price: String,
        #[clap(long, default_value_t = DEFAULT_CALL_GAS.to_string())]
        call_gas: String,
        #[clap(long, default_value = "0")]
        additional_gas_price: String,
    },
    /// Bucket under which a request is indexed
    Bucket {
        window_start: String,
        #[clap(long, value_enum, default_value_t = TemporalUnit::Time)]
        unit: TemporalUnit,
    },
    /// Current time of the node
    Now {
        #[clap(long, value_enum, default_value_t = TemporalUnit::Time)]
        unit: TemporalUnit,
    },
    /// Phase of a window with the default parameters of its unit
    Phase {
        window_start: String,
        /// Defaults to twice the minimum window size
        #[clap(long)]
        window_size: Option<String>,
        #[clap(long, value_enum, default_value_t = TemporalUnit::Time)]
        unit: TemporalUnit,
        /// Time to evaluate the phase at, by default the current time of the node
        #[clap(long)]
        now: Option<String>,
    },
    /// Contract addresses of the network
    Addresses,
}

#[derive(Parser, Serialize, Deserialize, Clone)]
#[clap(
    version = VERSION,
    about = "Scheduled transaction requests: economics, buckets and windows from the command line"
)]
#[command(styles = eac_common::get_cli_styles())]
pub struct Config {
    /// Network Configuration
    #[clap(flatten)]
    pub network: NetworkConfig,
    /// Log configuration
    #[clap(flatten)]
    pub log: LogConfig,
    /// JSON File to load the configuration from
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub config_file: Option<String>,
    /// Generate the template at the `config_file` path
    #[clap(long)]
    #[serde(skip)]
    #[serde(default)]
    pub generate_config_template: bool,
    #[clap(subcommand)]
    #[serde(skip)]
    #[serde(default)]
    pub command: Option<Command>,
}

impl Config {
    /// Replace the options by the ones of the config file, keeping the command
    pub fn merge_file(self, file: Config) -> Config {
        Config {
            network: file.network,
            log: file.log,
            config_file: self.config_file,
            generate_config_template: false,
            command: self.command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["eac", "addresses"]);
        assert_eq!(config.network.rpc_address, DEFAULT_RPC_ADDRESS);
        assert_eq!(config.network.network, None);
        assert_eq!(config.log.log_level, LogLevel::Info);
        assert!(matches!(config.command, Some(Command::Addresses)));
    }

    // The level is handed to env_logger as its default filter
    #[test]
    fn test_log_level_is_a_filter() {
        for (level, filter) in [
            (LogLevel::Off, "off"),
            (LogLevel::Warn, "warn"),
            (LogLevel::Trace, "trace"),
        ] {
            assert_eq!(level.to_string(), filter);
            assert!(filter.parse::<log::LevelFilter>().is_ok());
        }
    }

    #[test]
    fn test_subcommand_defaults() {
        let config = Config::parse_from(["eac", "--network", "kovan", "endowment", "--fee", "7"]);
        assert_eq!(config.network.network, Some(Network::Kovan));
        match config.command {
            Some(Command::Endowment {
                call_gas,
                fee,
                bounty,
                ..
            }) => {
                assert_eq!(call_gas, "21000");
                assert_eq!(fee, "7");
                assert_eq!(bounty, "10000000000000000");
            }
            _ => panic!("expected endowment command"),
        }
    }

    #[test]
    fn test_config_file_round_trip() {
        let json = r#"{
            "network": { "rpc_address": "http://node:8545", "network": "rinkeby" },
            "log": { "log_level": "debug" }
        }"#;
        let file: Config = serde_json::from_str(json).unwrap();
        assert_eq!(file.network.network, Some(Network::Rinkeby));
        assert_eq!(file.network.contracts_config, None);

        let config = Config::parse_from(["eac", "now"]).merge_file(file);
        assert_eq!(config.network.rpc_address, "http://node:8545");
        assert_eq!(config.log.log_level, LogLevel::Debug);
        assert!(matches!(config.command, Some(Command::Now { .. })));
    }
}
