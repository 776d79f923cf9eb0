//! Questlog - headless driver for the quest log

mod config;
mod confirm;
mod render;

use clap::{Parser, Subcommand, ValueEnum};
use config::AppConfig;
use confirm::TerminalConfirm;
use questlog_core::{AdminOverride, MutationReceipt};
use questlog_engine::{ActionOutcome, AutoConfirm, Confirm, QuestLogService};
use questlog_networking::{DefinitionCache, QuestClient};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "questlog", version, about = "Quest and challenge progress from the terminal")]
struct Cli {
    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show quests and challenges, grouped for display
    List,
    /// Start a challenge
    Start { id: String },
    /// Claim the reward of a completed challenge
    Claim { id: String },
    /// Start a quest
    QuestStart { id: String },
    /// Redeem a scanned QR code
    Scan { code: String },
    /// Show the XP leaderboard
    Leaderboard {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Admin overrides on the signed-in player's records
    Admin {
        action: OverrideArg,
        target: TargetArg,
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OverrideArg {
    Complete,
    Uncomplete,
    Reset,
}

impl From<OverrideArg> for AdminOverride {
    fn from(arg: OverrideArg) -> Self {
        match arg {
            OverrideArg::Complete => AdminOverride::Complete,
            OverrideArg::Uncomplete => AdminOverride::Uncomplete,
            OverrideArg::Reset => AdminOverride::Reset,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetArg {
    Challenge,
    Quest,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "questlog=info,questlog_engine=debug,questlog_networking=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            // dialog-style message for the player
            match e.downcast_ref::<questlog_core::Error>() {
                Some(err) => {
                    let text = render::failure(err);
                    if !text.is_empty() {
                        eprintln!("{}", text);
                    }
                }
                None => eprintln!("{}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let client = QuestClient::new_with_cache(
        &config.client_config(),
        &config.token,
        Arc::new(DefinitionCache::default()),
    )?;

    let confirm: Arc<dyn Confirm> = if cli.yes || config.assume_yes {
        Arc::new(AutoConfirm::yes())
    } else {
        Arc::new(TerminalConfirm)
    };
    let service = QuestLogService::new(Arc::new(client), confirm);

    // every command works against a fresh view
    let state = service.refresh().await?;

    match cli.command {
        Command::List => {
            println!("{}", render::summary(&state));
            println!("\nChallenges");
            print!("{}", render::challenges(&state));
            println!("\nQuests");
            print!("{}", render::quests(&state));
        }
        Command::Start { id } => {
            service.start_challenge(&id).await?;
            println!("Started challenge {}", id);
        }
        Command::Claim { id } => {
            let outcome = service.claim_challenge(&id).await?;
            report(&format!("Claimed {}", id), outcome);
        }
        Command::QuestStart { id } => {
            service.start_quest(&id).await?;
            println!("Started quest {}", id);
        }
        Command::Scan { code } => {
            let result = service.redeem_scan_code(&code).await?;
            if result.completed {
                println!("Quest {} completed, {} awarded", result.quest_id, result.xp_awarded);
            } else {
                println!("Quest {} progress: {}", result.quest_id, result.progress);
            }
        }
        Command::Leaderboard { limit } => {
            let board = service.leaderboard(limit).await?;
            print!("{}", render::leaderboard(&board));
        }
        Command::Admin { action, target, id } => {
            let action = AdminOverride::from(action);
            let outcome = match target {
                TargetArg::Challenge => service.admin_override_challenge(&id, action).await?,
                TargetArg::Quest => service.admin_override_quest(&id, action).await?,
            };
            report(&format!("Admin {} {}", action, id), outcome);
        }
    }

    Ok(())
}

fn report(what: &str, outcome: ActionOutcome<MutationReceipt>) {
    match outcome {
        ActionOutcome::Applied(receipt) => {
            println!("{}: {}", what, receipt.xp_awarded);
            if let Some(card) = receipt.card {
                println!("Unlocked card {} ({})", card.name, card.id);
            }
        }
        ActionOutcome::Declined => println!("Cancelled"),
    }
}
