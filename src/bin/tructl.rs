// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! tructl: batch actions against the TruStory store and chain.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use octopus::{
    actions::{self, campaigns::WaitlistApprovalCampaign},
    chain::ChainClient,
    config::Config,
    db::PgDatastore,
    logging,
    services::Postman,
};

/// Batch actions for TruStory
#[derive(Parser, Debug)]
#[command(name = "tructl", about = "Batch actions for TruStory")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply or revert database migrations
    #[command(subcommand)]
    Migrate(MigrateCommands),
    /// Export daily user metrics
    Metrics {
        /// Day to record (YYYY-MM-DD), defaults to today (UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Grant invites to active users who have none left
    Snowball {
        #[arg(long, default_value_t = 5)]
        invites: i32,
        #[arg(long, default_value_t = 3)]
        min_arguments: usize,
    },
    /// Send an email campaign
    #[command(subcommand)]
    Campaign(CampaignCommands),
    /// Feature a claim for a community
    ClaimOfTheDay {
        #[arg(long)]
        community: String,
        #[arg(long)]
        claim: i64,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommands {
    /// Apply all pending migrations
    Up,
    /// Revert migrations newer than the target version (0 reverts all)
    Down {
        #[arg(long, default_value_t = 0)]
        target: i64,
    },
}

#[derive(Subcommand, Debug)]
enum CampaignCommands {
    /// Tell waitlisted people they can sign up
    WaitlistApproval {
        /// Recipient email addresses
        #[arg(long, required = true, num_args = 1.., value_delimiter = ',')]
        to: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let db = PgDatastore::connect(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    let http = config
        .http
        .client()
        .context("Failed to build HTTP client")?;
    let chain = ChainClient::new(http.clone(), &config.chain);

    match cli.command {
        Commands::Migrate(MigrateCommands::Up) => {
            db.migrate_up().await?;
            tracing::info!("Migrations applied");
        }
        Commands::Migrate(MigrateCommands::Down { target }) => {
            db.migrate_down(target).await?;
            tracing::info!(target, "Migrations reverted");
        }
        Commands::Metrics { date } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            actions::metrics::export_daily_metrics(&db, &chain, date).await?;
        }
        Commands::Snowball {
            invites,
            min_arguments,
        } => {
            let granted =
                actions::snowball::grant_invites(&db, &chain, invites, min_arguments).await?;
            tracing::info!(users = granted.len(), "Snowball finished");
        }
        Commands::Campaign(CampaignCommands::WaitlistApproval { to }) => {
            let postman = Postman::new(http, &config.postman);
            let campaign = WaitlistApprovalCampaign {
                recipients: to,
                signup_link: config.postman.signup_link.clone(),
            };
            let report = actions::campaigns::run_campaign(&postman, &campaign).await;
            if report.failed > 0 {
                anyhow::bail!("{} of {} emails failed", report.failed, report.failed + report.sent);
            }
        }
        Commands::ClaimOfTheDay { community, claim } => {
            actions::set_claim_of_the_day(&db, &chain, &community, claim).await?;
        }
    }
    Ok(())
}
