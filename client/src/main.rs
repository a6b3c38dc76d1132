use std::{fs::File, io::Write, path::Path};

use anyhow::{bail, Context, Result};
use clap::Parser;
use eac_client::{
    clock,
    config::{Command, Config},
    rpc::JsonRpcClock,
};
use eac_common::{
    address::format_address,
    economics::{
        calc_endowment, estimate_bounty_for_execution_gas_price, estimate_max_execution_gas_price,
        parse_amount,
    },
    network::{Network, NetworkAddresses},
    request::{Bucket, RequestWindow, TemporalUnit},
    U256,
};
use log::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let mut config: Config = Config::parse();
    if let Some(path) = config.config_file.as_ref() {
        if config.generate_config_template {
            if Path::new(path).exists() {
                eprintln!("Config file already exists at {}", path);
                return Ok(());
            }

            let mut file = File::create(path).context("Error while creating config file")?;
            let json = serde_json::to_string_pretty(&config)
                .context("Error while serializing config file")?;
            file.write_all(json.as_bytes())
                .context("Error while writing config file")?;
            println!("Config file template generated at {}", path);
            return Ok(());
        }

        let file = File::open(path).context("Error while opening config file")?;
        let file_config: Config =
            serde_json::from_reader(file).context("Error while reading config file")?;
        config = config.merge_file(file_config);
    } else if config.generate_config_template {
        eprintln!(
            "Provided config file path is required to generate the template with --config-file"
        );
        return Ok(());
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log.log_level.to_string()),
    )
    .init();

    let Some(command) = config.command.clone() else {
        bail!("No command provided, see --help");
    };

    run(&config, command).await
}

async fn run(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Endowment {
            call_gas,
            call_value,
            gas_price,
            fee,
            bounty,
        } => {
            let endowment = calc_endowment(
                parse_amount("call_gas", &call_gas)?,
                parse_amount("call_value", &call_value)?,
                parse_amount("gas_price", &gas_price)?,
                parse_amount("fee", &fee)?,
                parse_amount("bounty", &bounty)?,
            )?;
            println!("{}", endowment);
        }
        Command::MaxGasPrice {
            bounty,
            gas_price,
            call_gas,
        } => {
            let max = estimate_max_execution_gas_price(
                parse_amount("bounty", &bounty)?,
                parse_amount("gas_price", &gas_price)?,
                parse_amount("call_gas", &call_gas)?,
            )?;
            println!("{}", max);
        }
        Command::Bounty {
            gas_price,
            call_gas,
            additional_gas_price,
        } => {
            let bounty = estimate_bounty_for_execution_gas_price(
                parse_amount("gas_price", &gas_price)?,
                parse_amount("call_gas", &call_gas)?,
                parse_amount("additional_gas_price", &additional_gas_price)?,
            )?;
            println!("{}", bounty);
        }
        Command::Bucket { window_start, unit } => {
            let window_start = parse_amount("window_start", &window_start)?;
            println!("{}", Bucket::for_window(window_start, unit)?);
        }
        Command::Now { unit } => {
            let clock = JsonRpcClock::new(&config.network.rpc_address);
            println!("{}", clock::now(&clock, unit).await?);
        }
        Command::Phase {
            window_start,
            window_size,
            unit,
            now,
        } => {
            let window = default_window(
                parse_amount("window_start", &window_start)?,
                window_size
                    .map(|size| parse_amount("window_size", &size))
                    .transpose()?,
                unit,
            );

            let now = match now {
                Some(now) => parse_amount("now", &now)?,
                None => {
                    let clock = JsonRpcClock::new(&config.network.rpc_address);
                    clock::now(&clock, unit).await?
                }
            };
            debug!("Evaluating window {:?} at {}", window, now);

            println!("{}", window.phase(now));
            if window.in_claim_window(now) {
                println!(
                    "payment modifier: {}%",
                    window.accrued_payment_modifier(now)
                );
            }
        }
        Command::Addresses => {
            let path = config
                .network
                .contracts_config
                .as_ref()
                .context("--contracts-config is required to display the contract addresses")?;
            let table = NetworkAddresses::load(path)?;

            let network = match config.network.network {
                Some(network) => network,
                None => {
                    let clock = JsonRpcClock::new(&config.network.rpc_address);
                    let id = clock.network_id().await?;
                    info!("Detected network id {}", id);
                    Network::try_from(id)?
                }
            };

            let addresses = table.get(network)?;
            println!("network: {} (id {})", network, network.id());
            println!("blockScheduler: {}", format_address(&addresses.block_scheduler));
            println!(
                "timestampScheduler: {}",
                format_address(&addresses.timestamp_scheduler)
            );
            println!("requestFactory: {}", format_address(&addresses.request_factory));
            if let Some(core) = addresses.transaction_request_core.as_ref() {
                println!("transactionRequestCore: {}", format_address(core));
            }
            for (name, address) in addresses.libraries.iter() {
                println!("{}: {}", name, format_address(address));
            }
            println!(
                "requestFactory start block: {}",
                network.request_factory_start_block()
            );
        }
    }

    Ok(())
}

// Window using the default claim, freeze and reserved sizes of the unit
fn default_window(window_start: U256, window_size: Option<U256>, unit: TemporalUnit) -> RequestWindow {
    RequestWindow {
        temporal_unit: unit,
        window_start,
        window_size: window_size.unwrap_or_else(|| U256::from(unit.default_window_size())),
        claim_window_size: U256::from(unit.claim_window_size()),
        freeze_period: U256::from(unit.freeze_period()),
        reserved_window_size: U256::from(unit.reserved_window_size()),
    }
}
