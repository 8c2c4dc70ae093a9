use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use tracing::info;

use vcp_pool::{BlockReward, Miner, PoolConfig, PoolLedger, PoolStats, SettlementDriver};
use vcp_types::MinerId;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Config(args) => cmd_config(args),
        Command::Run(args) => cmd_run(args, &cli.format),
        Command::Drive(args) => cmd_drive(args, &cli.format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PoolConfig> {
    match path {
        Some(path) => PoolConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(PoolConfig::default()),
    }
}

fn admit_all(pool: &PoolLedger, miners: &[MinerSpec]) -> anyhow::Result<Vec<Miner>> {
    miners
        .iter()
        .map(|spec| {
            pool.admit_miner(spec.name.clone(), spec.address.clone(), spec.rate)
                .with_context(|| format!("admitting miner {}", spec.name))
        })
        .collect()
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Outcome of a `run` invocation.
#[derive(Debug, Serialize)]
struct RunReport {
    receipts: Vec<BlockReward>,
    failures: Vec<String>,
    removed: Option<MinerId>,
    miners: Vec<Miner>,
    stats: PoolStats,
}

fn execute_run(config: PoolConfig, args: &RunArgs) -> anyhow::Result<RunReport> {
    let pool = PoolLedger::new(config)?;
    let admitted = admit_all(&pool, &args.miners)?;

    let to_remove = match &args.remove {
        Some(name) => Some(
            admitted
                .iter()
                .find(|m| &m.name == name)
                .map(|m| m.id)
                .with_context(|| format!("no miner named {name}"))?,
        ),
        None => None,
    };

    let mut receipts = Vec::new();
    let mut failures = Vec::new();
    let mut removed = None;
    for round in 1..=args.rounds {
        match pool.settle() {
            Ok(reward) => receipts.push(reward),
            Err(e) => failures.push(format!("round {round}: {e}")),
        }
        if round == 1 {
            if let Some(id) = to_remove {
                pool.remove_miner(&id)?;
                removed = Some(id);
            }
        }
    }

    Ok(RunReport {
        receipts,
        failures,
        removed,
        miners: pool.list_miners()?,
        stats: pool.stats()?,
    })
}

fn cmd_run(args: RunArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let report = execute_run(config, &args)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    let names: HashMap<MinerId, &str> = report
        .miners
        .iter()
        .map(|m| (m.id, m.name.as_str()))
        .collect();

    for reward in &report.receipts {
        println!(
            "{} Settlement at height {}: pot {}, remainder {}",
            "✓".green().bold(),
            reward.height.to_string().yellow(),
            reward.total_reward,
            reward.remainder,
        );
        for (id, amount) in &reward.distributions {
            let name = names.get(id).copied().unwrap_or("?");
            println!("  {} {:>12}  {}", name.bold(), amount, id.short_id().dimmed());
        }
    }
    for failure in &report.failures {
        println!("{} Settlement failed: {}", "✗".red().bold(), failure);
    }
    if let Some(id) = &report.removed {
        let name = names.get(id).copied().unwrap_or("?");
        println!("Removed miner {} ({})", name.bold(), id.short_id().dimmed());
    }

    println!("\nMiners:");
    for m in &report.miners {
        let state = if m.is_active { "active".green() } else { "removed".red() };
        println!(
            "  {:<12} rate {:<8} earned {:>12}  balance {:>12}  {}",
            m.name, m.rate, m.total_earned, m.current_balance, state
        );
    }

    let s = &report.stats;
    println!("\nPool: {}/{} miners active, total rate {}", s.active_miners, s.total_miners, s.total_rate);
    println!("  Total earned: {}", s.total_earned.to_string().bold());
    println!("  Active channels: {}", s.active_channel_count);
    println!("  Last reward: {}", s.last_reward_amount);
}

fn cmd_drive(args: DriveArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let period = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.settlement_interval());
    let pool = Arc::new(PoolLedger::new(config)?);
    admit_all(&pool, &args.miners)?;

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let settled = runtime.block_on(async {
        let handle = SettlementDriver::spawn(pool.clone(), period);
        info!(duration_secs = args.duration_secs, "driving settlements");
        tokio::time::sleep(Duration::from_secs(args.duration_secs)).await;
        handle.shutdown().await
    })?;

    let stats = pool.stats()?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "settled": settled, "stats": stats }))?
        ),
        OutputFormat::Text => {
            println!("{} {} settlements in {}s", "✓".green().bold(), settled.to_string().bold(), args.duration_secs);
            println!("  Height: {}", pool.height()?);
            println!("  Total earned: {}", stats.total_earned);
        }
    }
    Ok(())
}
