//! Operator CLI for accrual and distribution batches.
//!
//! Usage:
//!   batchctl accrual print <BATCH> --user <USER>
//!   batchctl accrual post <BATCH> --user <USER> --post-account <ACCOUNT> [--voucher CV-1]
//!   batchctl distribution undo-print <BATCH> --user <USER>
//!   batchctl balance --org <ORG> --branch <BRANCH> --account <ACCOUNT> --as-of 2024-01-31
//!
//! Results are printed as JSON on stdout.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use ecoop_core::BatchEngine;
use ecoop_core::posting::PostParams;
use ecoop_db::{SeaStore, connect};
use ecoop_shared::AppConfig;
use ecoop_shared::types::{
    AccountId, AccrualBatchId, BranchId, DistributionBatchId, MemberProfileId, OrganizationId,
    UserId,
};

#[derive(Debug, Parser)]
#[command(name = "batchctl", version, about = "Print, post and inspect computation batches")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Savings-interest accrual batches.
    #[command(subcommand)]
    Accrual(BatchCommand),
    /// Mutual-fund distribution batches.
    #[command(subcommand)]
    Distribution(BatchCommand),
    /// Balance of an account or a member sub-ledger.
    Balance(BalanceArgs),
}

#[derive(Debug, Subcommand)]
enum BatchCommand {
    /// Draft → Printed.
    Print {
        /// Batch identifier.
        batch: Uuid,
        /// Operator performing the action.
        #[arg(long, env = "BATCHCTL_USER")]
        user: UserId,
    },
    /// Printed → Draft.
    UndoPrint {
        /// Batch identifier.
        batch: Uuid,
        /// Operator performing the action.
        #[arg(long, env = "BATCHCTL_USER")]
        user: UserId,
    },
    /// Printed → Posted, writing ledger rows.
    Post {
        /// Batch identifier.
        batch: Uuid,
        /// Operator performing the action.
        #[arg(long, env = "BATCHCTL_USER")]
        user: UserId,
        #[command(flatten)]
        post: PostArgs,
    },
    /// Header, entries and totals.
    View {
        /// Batch identifier.
        batch: Uuid,
    },
}

impl BatchCommand {
    const fn batch(&self) -> Uuid {
        match self {
            Self::Print { batch, .. }
            | Self::UndoPrint { batch, .. }
            | Self::Post { batch, .. }
            | Self::View { batch } => *batch,
        }
    }
}

#[derive(Debug, Args)]
struct PostArgs {
    /// Contra account for interest and payouts.
    #[arg(long)]
    post_account: AccountId,
    /// Account credited with withheld tax.
    #[arg(long)]
    tax_account: Option<AccountId>,
    /// Accounting date (YYYY-MM-DD); today when omitted.
    #[arg(long)]
    entry_date: Option<NaiveDate>,
    /// Check voucher number.
    #[arg(long)]
    voucher: Option<String>,
}

impl From<PostArgs> for PostParams {
    fn from(args: PostArgs) -> Self {
        Self {
            post_account_id: args.post_account,
            tax_account_id: args.tax_account,
            entry_date: args.entry_date,
            check_voucher_number: args.voucher,
        }
    }
}

#[derive(Debug, Args)]
struct BalanceArgs {
    #[arg(long)]
    org: OrganizationId,
    #[arg(long)]
    branch: BranchId,
    #[arg(long)]
    account: AccountId,
    /// Restrict to one member's sub-ledger.
    #[arg(long)]
    member: Option<MemberProfileId>,
    /// Inclusive cut-off date (YYYY-MM-DD).
    #[arg(long)]
    as_of: NaiveDate,
}

fn emit<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_accrual(
    engine: &BatchEngine<SeaStore>,
    command: BatchCommand,
) -> anyhow::Result<()> {
    let id = AccrualBatchId::from_uuid(command.batch());
    match command {
        BatchCommand::Print { user, .. } => emit(&engine.print_accrual(id, user).await?),
        BatchCommand::UndoPrint { user, .. } => emit(&engine.undo_print_accrual(id, user).await?),
        BatchCommand::Post { user, post, .. } => {
            emit(&engine.post_accrual(id, &post.into(), user).await?)
        }
        BatchCommand::View { .. } => emit(&engine.accrual_view(id).await?),
    }
}

async fn run_distribution(
    engine: &BatchEngine<SeaStore>,
    command: BatchCommand,
) -> anyhow::Result<()> {
    let id = DistributionBatchId::from_uuid(command.batch());
    match command {
        BatchCommand::Print { user, .. } => emit(&engine.print_distribution(id, user).await?),
        BatchCommand::UndoPrint { user, .. } => {
            emit(&engine.undo_print_distribution(id, user).await?)
        }
        BatchCommand::Post { user, post, .. } => {
            emit(&engine.post_distribution(id, &post.into(), user).await?)
        }
        BatchCommand::View { .. } => emit(&engine.distribution_view(id).await?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecoop=debug,sea_orm=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let db = connect(&config.database).await?;
    info!("Connected to database");
    let engine = BatchEngine::new(SeaStore::new(db), &config.engine);

    match cli.command {
        Command::Accrual(command) => run_accrual(&engine, command).await,
        Command::Distribution(command) => run_distribution(&engine, command).await,
        Command::Balance(args) => emit(
            &engine
                .account_balance(args.org, args.branch, args.account, args.member, args.as_of)
                .await?,
        ),
    }
}
