// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Coverage Engine CLI
//!
//! Inspects the built-in catalog and a user's stored selection. Output is
//! JSON on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use coverage_engine::{
    config::Config, models::CategoryId, services::IdentityEvent, CoverageContext,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coverage-engine")]
#[command(about = "Aggregate protection benefits across cards, plans and policies")]
struct Cli {
    /// Storage directory (overrides COVERAGE_STORAGE_DIR)
    #[arg(long, global = true)]
    storage_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every hydrated card and plan
    Catalog,
    /// Per-category coverage and yearly cost for a user
    Summary {
        #[arg(long)]
        user: String,
    },
    /// Categories with no coverage for a user
    Gaps {
        #[arg(long)]
        user: String,
    },
    /// Flattened selection as handed to the assistant
    Assistant {
        #[arg(long)]
        user: String,
    },
    /// Toggle cards and add or remove plans for a user
    Select {
        #[arg(long)]
        user: String,
        /// Card id to toggle (repeatable)
        #[arg(long = "card")]
        cards: Vec<String>,
        /// Plan id to add (repeatable)
        #[arg(long = "plan")]
        plans: Vec<String>,
        /// Plan id to remove (repeatable)
        #[arg(long = "remove-plan")]
        remove_plans: Vec<String>,
    },
    /// Remove stale and legacy records, then exit
    Sweep,
    /// Delete all stored data for a user
    Forget {
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.storage_dir {
        config.storage_dir = dir;
    }
    // The sweep subcommand reports its own result
    if matches!(cli.command, Command::Sweep) {
        config.sweep_on_start = false;
    }
    tracing::info!(
        backend = ?config.storage_backend,
        dir = %config.storage_dir.display(),
        "Starting coverage-engine"
    );

    let ctx = CoverageContext::open(config).await?;

    match cli.command {
        Command::Catalog => {
            print_json(&ctx.catalog.sources())?;
        }
        Command::Summary { user } => {
            sign_in(&ctx, &user).await?;
            let engine = ctx.store.engine(&ctx.catalog);
            print_json(&engine.aggregated_coverage())?;
        }
        Command::Gaps { user } => {
            sign_in(&ctx, &user).await?;
            let gaps: Vec<CategoryId> = ctx.store.engine(&ctx.catalog).coverage_gaps();
            print_json(&gaps)?;
        }
        Command::Assistant { user } => {
            sign_in(&ctx, &user).await?;
            print_json(&ctx.store.engine(&ctx.catalog).format_for_assistant())?;
        }
        Command::Select {
            user,
            cards,
            plans,
            remove_plans,
        } => {
            sign_in(&ctx, &user).await?;
            for card in &cards {
                if ctx.catalog.card(card).is_none() {
                    anyhow::bail!("unknown card: {}", card);
                }
                ctx.store.toggle_card(card)?;
            }
            for plan in &plans {
                if ctx.catalog.plan(plan).is_none() {
                    anyhow::bail!("unknown plan: {}", plan);
                }
                ctx.store.add_plan(plan)?;
            }
            for plan in &remove_plans {
                ctx.store.remove_plan(plan)?;
            }
            ctx.store.flush().await?;
            print_json(&ctx.store.snapshot())?;
        }
        Command::Sweep => {
            print_json(&ctx.store.startup_sweep().await?)?;
        }
        Command::Forget { user } => {
            sign_in(&ctx, &user).await?;
            ctx.store
                .handle_event(IdentityEvent::SignedOut {
                    delete_account: true,
                })
                .await?;
            tracing::info!(user_id = %user, "Stored selection removed");
        }
    }

    ctx.store.flush().await?;
    Ok(())
}

async fn sign_in(ctx: &CoverageContext, user: &str) -> anyhow::Result<()> {
    ctx.store
        .handle_event(IdentityEvent::SignedIn(user.to_string()))
        .await?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("coverage_engine=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
