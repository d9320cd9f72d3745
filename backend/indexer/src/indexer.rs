//! Long-running background task that polls the Soroban RPC, appends decoded
//! Funding Ledger events to the log and keeps the project mirror current.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db;
use crate::errors::Result;
use crate::rpc;

pub struct IndexerState {
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
}

/// Where polling picks up after a restart.
struct Resume {
    ledger: u32,
    cursor: Option<String>,
}

/// Spawn the indexer loop as a background [`tokio`] task.
pub async fn run(state: Arc<IndexerState>) {
    info!("Indexer starting, contract: {}", state.config.contract_id);

    let Resume {
        ledger: mut current_ledger,
        mut cursor,
    } = resume_point(&state.pool, state.config.start_ledger).await;

    info!("Resuming from ledger {current_ledger}");

    loop {
        match poll_once(
            &state.pool,
            &state.client,
            &state.config,
            current_ledger,
            cursor.as_deref(),
        )
        .await
        {
            Ok((next_ledger, next_cursor)) => {
                current_ledger = next_ledger;
                cursor = next_cursor;
            }
            Err(e) => {
                error!("Indexer poll error: {e}");
            }
        }

        tokio::time::sleep(Duration::from_secs(state.config.poll_interval_secs)).await;
    }
}

/// The persisted cursor, or `start_ledger` on a fresh database.
async fn resume_point(pool: &SqlitePool, start_ledger: u32) -> Resume {
    let last_ledger = db::get_last_ledger(pool).await.unwrap_or_else(|e| {
        warn!("Could not read saved ledger, starting from {start_ledger}: {e}");
        0
    });
    let cursor = db::get_cursor_string(pool).await.unwrap_or(None);

    let ledger = u32::try_from(last_ledger)
        .ok()
        .filter(|l| *l > 0)
        .unwrap_or(start_ledger);
    Resume { ledger, cursor }
}

/// Perform a single poll iteration.
///
/// Returns `(next_start_ledger, next_cursor)`.
async fn poll_once(
    pool: &SqlitePool,
    client: &Client,
    config: &Config,
    start_ledger: u32,
    cursor: Option<&str>,
) -> Result<(u32, Option<String>)> {
    let (raw_events, next_cursor, latest_ledger) = rpc::fetch_events(
        client,
        &config.rpc_url,
        &config.contract_id,
        start_ledger,
        cursor,
        config.events_per_page,
    )
    .await?;

    if !raw_events.is_empty() {
        let decoded = rpc::decode_events(&raw_events, &config.contract_id);
        let inserted = db::insert_and_project(pool, &decoded).await?;
        info!(
            "Polled {} raw events → {} decoded, {} new records stored",
            raw_events.len(),
            decoded.len(),
            inserted
        );
    }

    // A cursor keeps paginating the same range; the ledger only moves forward.
    let next_ledger = latest_ledger
        .and_then(|l| u32::try_from(l).ok())
        .map(|l| l.max(start_ledger))
        .unwrap_or(start_ledger);

    db::save_cursor(pool, i64::from(next_ledger), next_cursor.as_deref()).await?;

    Ok((next_ledger, next_cursor))
}
