//! Resolve risk overrides for a set of accounts
//!
//! Usage: `risk-override [--config engine.toml] <snapshot.toml> <positions.json>`
//!
//! Balances are signed decimal strings; numeric JSON values are rejected.
//!
//! ```json
//! {
//!   "privileged": ["0x00000000000000000000000000000000000000aa"],
//!   "accounts": [
//!     {
//!       "owner": "0x00000000000000000000000000000000000000a1",
//!       "number": 0,
//!       "balances": [
//!         { "market": 0, "par": "1000" },
//!         { "market": 1, "par": "-500" }
//!       ]
//!     }
//!   ]
//! }
//! ```

use anyhow::{bail, Context};
use risk_override::{
    AccountId, EngineConfig, InMemoryLedger, MarketBalance, Owner, RiskConfigSnapshot,
    RiskOverrideEngine,
};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct PositionsFile {
    #[serde(default)]
    privileged: Vec<Owner>,
    accounts: Vec<AccountEntry>,
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    owner: Owner,
    number: u64,
    #[serde(default)]
    balances: Vec<MarketBalance>,
}

struct Args {
    config: Option<PathBuf>,
    snapshot: PathBuf,
    positions: PathBuf,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut config = None;
    let mut paths = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config = Some(PathBuf::from(
                args.next().context("--config requires a path")?,
            ));
        } else {
            paths.push(PathBuf::from(arg));
        }
    }

    match <[PathBuf; 2]>::try_from(paths) {
        Ok([snapshot, positions]) => Ok(Args {
            config,
            snapshot,
            positions,
        }),
        Err(_) => bail!("usage: risk-override [--config engine.toml] <snapshot.toml> <positions.json>"),
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?
            .with_env()?,
        None => EngineConfig::from_env()?,
    };
    tracing::info!(backend = ?config.category_backend, "Starting risk override resolution");

    let mut engine = RiskOverrideEngine::new(config);
    RiskConfigSnapshot::from_file(&args.snapshot)
        .with_context(|| format!("loading {}", args.snapshot.display()))?
        .apply(&mut engine)
        .context("applying risk configuration")?;

    let content = std::fs::read_to_string(&args.positions)
        .with_context(|| format!("reading {}", args.positions.display()))?;
    let positions: PositionsFile = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", args.positions.display()))?;

    let mut ledger = InMemoryLedger::new();
    for owner in &positions.privileged {
        ledger.add_privileged(*owner);
    }
    let mut accounts = Vec::with_capacity(positions.accounts.len());
    for entry in &positions.accounts {
        let account = AccountId::new(entry.owner, entry.number);
        ledger.open_account(account);
        for balance in &entry.balances {
            ledger.set_balance(account, balance.market, balance.par);
        }
        accounts.push(account);
    }

    for account in &accounts {
        let line = match engine.resolve(&ledger, account) {
            Ok(result) => serde_json::json!({
                "owner": account.owner,
                "number": account.number,
                "margin_ratio_override": result.margin_ratio_override,
                "liquidation_reward_override": result.liquidation_reward_override,
            }),
            Err(e) => serde_json::json!({
                "owner": account.owner,
                "number": account.number,
                "error": e.to_string(),
            }),
        };
        println!("{}", line);
    }

    tracing::info!(accounts = accounts.len(), "Resolution complete");
    Ok(())
}
