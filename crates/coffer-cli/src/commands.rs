//! CLI command implementations.

use clap::{Parser, Subcommand};
use coffer_storage::StorageKey;
use coffer_vm::{Client, Kwargs};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::CliConfig;
use crate::demo::run_demo;
use crate::output::*;

/// Main CLI.
#[derive(Parser)]
#[command(name = "coffer")]
#[command(about = "Coffer - currency stub and safe contracts, run locally")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Config file (defaults to ~/.coffer/config.toml)
    #[arg(short, long, global = true, env = "COFFER_CONFIG")]
    pub config: Option<PathBuf>,

    /// State directory (overrides the config file)
    #[arg(long, global = true, env = "COFFER_STATE")]
    pub state: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Mint, approve, deposit and withdraw on fresh in-memory state
    Demo {
        /// Account to run the demo as
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Call a contract function against the persisted state
    Call {
        /// Contract name
        contract: String,
        /// Function name
        function: String,
        /// Keyword arguments as a JSON object
        #[arg(short, long)]
        kwargs: Option<String>,
        /// Signer (uses the configured default if not specified)
        #[arg(short, long)]
        signer: Option<String>,
    },

    /// Read a raw state variable
    GetVar {
        /// Contract name
        contract: String,
        /// Variable name
        variable: String,
        /// Hash keys
        keys: Vec<String>,
    },

    /// List persisted state, optionally for one contract
    State {
        /// Contract name
        contract: Option<String>,
    },

    /// Wipe the persisted state
    Flush,

    /// Configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Config commands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Write the default config file if none exists
    Init {
        /// Where to write it (defaults to ~/.coffer/config.toml)
        path: Option<PathBuf>,
    },
}

/// Execute a CLI command.
pub fn execute(cmd: Commands, config: &CliConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Demo { account } => execute_demo(account, config),
        Commands::Call {
            contract,
            function,
            kwargs,
            signer,
        } => execute_call(&contract, &function, kwargs.as_deref(), signer, config),
        Commands::GetVar {
            contract,
            variable,
            keys,
        } => execute_get_var(&contract, &variable, &keys, config),
        Commands::State { contract } => execute_state(contract.as_deref(), config),
        Commands::Flush => execute_flush(config),
        Commands::Config(cmd) => execute_config(cmd, config),
    }
}

/// Client over the persisted state with both contracts attached.
fn open_client(config: &CliConfig) -> anyhow::Result<Client> {
    let client = Client::open(&config.state_dir, config.client_config())?;
    coffer_contracts::install(&client, &config.currency_contract, &config.safe_contract)?;
    Ok(client)
}

fn execute_demo(account: Option<String>, config: &CliConfig) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(account) = account {
        config.demo.account = account;
    }
    config.validate()?;

    let client = Client::with_config(config.client_config());
    let report = run_demo(&client, &config, |line| println!("{}", line))?;

    print_success(&format!(
        "{} holds {} in {} and {} in the safe",
        report.account, report.wallet_after_withdraw, config.currency_contract, report.after_withdraw
    ));
    Ok(())
}

fn execute_call(
    contract: &str,
    function: &str,
    kwargs: Option<&str>,
    signer: Option<String>,
    config: &CliConfig,
) -> anyhow::Result<()> {
    let kwargs = match kwargs {
        Some(raw) => Kwargs::from_value(serde_json::from_str(raw)?)?,
        None => Kwargs::new(),
    };
    let signer = signer.unwrap_or_else(|| config.default_signer.clone());

    let client = open_client(config)?;
    let handle = client.get_contract(contract)?;
    let receipt = handle.transact(&signer, function, kwargs)?;
    print_receipt(&receipt);

    receipt.into_result()?;
    Ok(())
}

fn execute_get_var(
    contract: &str,
    variable: &str,
    keys: &[String],
    config: &CliConfig,
) -> anyhow::Result<()> {
    let client = open_client(config)?;
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    let value = client.get_var(contract, variable, &keys)?;
    match value {
        Some(value) => println!("{}", format_value(&value)),
        None => println!("{}", "None".dimmed()),
    }
    Ok(())
}

fn execute_state(contract: Option<&str>, config: &CliConfig) -> anyhow::Result<()> {
    let client = open_client(config)?;
    let prefix = contract.map(StorageKey::contract_prefix).unwrap_or_default();

    let rows: Vec<(String, serde_json::Value)> = client
        .driver()
        .keys_with_prefix(&prefix)
        .into_iter()
        .filter_map(|key| client.driver().get(&key).map(|value| (key, value)))
        .collect();

    if rows.is_empty() {
        print_info("No state");
    } else {
        println!("{}", state_table(&rows));
    }
    Ok(())
}

fn execute_flush(config: &CliConfig) -> anyhow::Result<()> {
    let client = Client::open(&config.state_dir, config.client_config())?;
    client.flush()?;
    print_success(&format!("Flushed state in {}", config.state_dir.display()));
    Ok(())
}

fn execute_config(cmd: ConfigCommands, config: &CliConfig) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            println!("{}", "CLI Configuration".bold());
            println!("{}", "=".repeat(50));
            println!("State dir:    {}", config.state_dir.display());
            println!("Signer:       {}", config.default_signer.bright_cyan());
            println!("Currency:     {}", config.currency_contract.bright_green());
            println!("Safe:         {}", config.safe_contract.bright_green());
            println!("Call depth:   {}", config.max_call_depth.to_string().bright_yellow());
            println!("Log level:    {}", config.log_level);
            println!(
                "Demo:         {} mints {}, approves {}, deposits {}, withdraws {}",
                config.demo.account,
                config.demo.mint,
                config.demo.approve,
                config.demo.deposit,
                config.demo.withdraw
            );
        }

        ConfigCommands::Init { path } => {
            let path = path.unwrap_or_else(CliConfig::config_path);
            if CliConfig::init_file(&path)? {
                print_success(&format!("Wrote {}", path.display()));
            } else {
                print_warning(&format!("{} already exists", path.display()));
            }
        }
    }

    Ok(())
}
