/// Rewrite stored daily menus under canonical ids and delete legacy duplicates.
/// Once a month has been migrated, load-time reconciliation has nothing left to resolve for it.
///
/// Usage: migrate-legacy-menus [--year YYYY] [--month M] [--dry-run]
///   --year, --month : Restrict to one year and/or month (all if not specified)
///   --dry-run       : Report the planned writes without committing them

use std::collections::BTreeMap;

use clap::Parser;

use vanganh_api::{
    db,
    models::menu::DailyMenuRecord,
    services::menu::{canonicalize_month, MENUS},
    store::{DocumentStore, PgDocumentStore, WriteOp},
};

#[derive(Parser)]
#[command(
    name = "migrate-legacy-menus",
    about = "Move daily menus to canonical ids and remove legacy duplicates"
)]
struct Args {
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    month: Option<u32>,
    /// Print what would change without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;
    let pool = db::create_pool(&database_url).await?;
    db::run_migrations(&pool).await?;
    let store = PgDocumentStore::new(pool);

    let docs = store.list(MENUS).await?;
    tracing::info!("Scanning {} menu documents", docs.len());

    let mut months: BTreeMap<(i32, u32), Vec<DailyMenuRecord>> = BTreeMap::new();
    for doc in docs {
        let id = doc.id.clone();
        match DailyMenuRecord::from_document(doc) {
            Ok(record) => months
                .entry((record.year, record.month))
                .or_default()
                .push(record),
            Err(e) => tracing::warn!("Skipping malformed menu document {}: {}", id, e),
        }
    }

    let mut migrated = 0usize;
    for ((year, month), records) in months {
        if args.year.is_some_and(|y| y != year) || args.month.is_some_and(|m| m != month) {
            continue;
        }

        let ops = canonicalize_month(year, month, records);
        if ops.is_empty() {
            continue;
        }

        let (writes, deletes) = ops
            .iter()
            .partition::<Vec<&WriteOp>, _>(|op| matches!(op, WriteOp::Set { .. }));
        tracing::info!(
            "{}/{}: {} canonical writes, {} legacy deletes",
            month,
            year,
            writes.len(),
            deletes.len()
        );
        for op in &ops {
            let action = match op {
                WriteOp::Set { .. } => "write",
                WriteOp::Delete { .. } => "delete",
            };
            tracing::info!("  {} {}", action, op.id());
        }

        if args.dry_run {
            continue;
        }
        // One batch per month: a failure leaves that month untouched.
        if let Err(e) = store.commit(ops).await {
            tracing::error!("Migration of {}/{} failed: {}", month, year, e);
            continue;
        }
        migrated += 1;
    }

    if args.dry_run {
        tracing::info!("Dry run complete, nothing written");
    } else {
        tracing::info!("Migrated {} months", migrated);
    }
    Ok(())
}
