use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "vcpool",
    about = "Virtual-channel pool operator: admit miners and settle rewards",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the effective pool configuration as TOML
    Config(ConfigArgs),
    /// Admit miners and run a fixed number of settlements
    Run(RunArgs),
    /// Run the interval settlement driver for a while
    Drive(DriveArgs),
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct RunArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Miner to admit, as NAME:ADDRESS:RATE (repeatable)
    #[arg(long = "miner", value_parser = parse_miner, required = true)]
    pub miners: Vec<MinerSpec>,
    #[arg(long, default_value = "3")]
    pub rounds: u32,
    /// Remove this miner (by name) after the first round
    #[arg(long)]
    pub remove: Option<String>,
}

#[derive(Args)]
pub struct DriveArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long = "miner", value_parser = parse_miner, required = true)]
    pub miners: Vec<MinerSpec>,
    #[arg(long)]
    pub duration_secs: u64,
    /// Override the configured settlement interval, in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

/// A miner given on the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct MinerSpec {
    pub name: String,
    pub address: String,
    pub rate: f64,
}

/// Parse `NAME:ADDRESS:RATE`. The address may itself contain colons.
pub fn parse_miner(s: &str) -> Result<MinerSpec, String> {
    let (name, rest) = s
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:ADDRESS:RATE, got {s:?}"))?;
    let (address, rate) = rest
        .rsplit_once(':')
        .ok_or_else(|| format!("expected NAME:ADDRESS:RATE, got {s:?}"))?;
    if name.is_empty() || address.is_empty() {
        return Err(format!("name and address must be non-empty in {s:?}"));
    }
    let rate: f64 = rate
        .parse()
        .map_err(|_| format!("invalid rate {rate:?}"))?;
    Ok(MinerSpec {
        name: name.to_string(),
        address: address.to_string(),
        rate,
    })
}
