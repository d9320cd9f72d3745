//! Database layer: migrations, the event log, its projections, and cursor management.

use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqliteConnection, SqlitePool,
};
use tracing::{info, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{ContributionRecord, EventKind, EventRecord, LedgerEvent, ProjectRecord};
use crate::rpc::field;

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    connect(&url, 5).await
}

/// Open a pool with `max_connections` and bring the schema up to date.
///
/// In-memory databases are per-connection, so callers using
/// `sqlite::memory:` must pass `1`.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

// ─────────────────────────────────────────────────────────
// Cursor helpers
// ─────────────────────────────────────────────────────────

/// Read the last-seen ledger from the cursor row.
/// Returns `0` when no cursor has been persisted yet.
pub async fn get_last_ledger(pool: &SqlitePool) -> Result<i64> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT last_ledger FROM indexer_cursor WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Persist the last-seen ledger (and optionally a pagination cursor string).
pub async fn save_cursor(
    pool: &SqlitePool,
    last_ledger: i64,
    last_cursor: Option<&str>,
) -> Result<()> {
    sqlx::query("UPDATE indexer_cursor SET last_ledger = ?1, last_cursor = ?2 WHERE id = 1")
        .bind(last_ledger)
        .bind(last_cursor)
        .execute(pool)
        .await?;
    Ok(())
}

/// Read back the raw cursor string (used to resume pagination mid-ledger).
pub async fn get_cursor_string(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(Option<String>,)> =
        sqlx::query_as("SELECT last_cursor FROM indexer_cursor WHERE id = 1")
            .fetch_optional(pool)
            .await?;
    Ok(row.and_then(|(v,)| v))
}

// ─────────────────────────────────────────────────────────
// Event writes
// ─────────────────────────────────────────────────────────

/// Persist a batch of decoded events and fold each new one into the
/// projections.
///
/// Each event gets its own transaction: the log insert and the projection
/// update commit together. A redelivered `event_id` is ignored and leaves
/// the projections untouched. Returns the number of newly stored events.
pub async fn insert_and_project(pool: &SqlitePool, events: &[LedgerEvent]) -> Result<usize> {
    let mut count = 0usize;
    for ev in events {
        let mut tx = pool.begin().await?;

        let rows_affected = sqlx::query(
            r#"
            INSERT OR IGNORE INTO events
                (event_id, event_type, project_id, actor, amount, payload,
                 ledger, timestamp, contract_id, tx_hash)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&ev.event_id)
        .bind(ev.kind.as_str())
        .bind(ev.project_id)
        .bind(&ev.actor)
        .bind(&ev.amount)
        .bind(ev.payload.to_string())
        .bind(ev.ledger)
        .bind(ev.timestamp)
        .bind(&ev.contract_id)
        .bind(&ev.tx_hash)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows_affected == 1 {
            project_or_skip(&mut *tx, ev).await?;
            count += 1;
        }

        tx.commit().await?;
    }
    Ok(count)
}

/// Drop both projection tables and replay the stored event log from genesis.
///
/// Returns the number of events replayed.
pub async fn rebuild_projections(pool: &SqlitePool) -> Result<usize> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM contributions")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM projects").execute(&mut *tx).await?;

    let records = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, event_id, event_type, project_id, actor, amount, payload,
               ledger, timestamp, contract_id, tx_hash, created_at
        FROM   events
        ORDER  BY ledger ASC, id ASC
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    for record in &records {
        let ev = record.to_event()?;
        project_or_skip(&mut *tx, &ev).await?;
    }

    tx.commit().await?;
    info!("Rebuilt projections from {} stored events", records.len());
    Ok(records.len())
}

/// Apply one event, logging instead of failing when the event itself is
/// unusable. Such an event stays in the log, so a later rebuild sees it again.
async fn project_or_skip(conn: &mut SqliteConnection, ev: &LedgerEvent) -> Result<()> {
    match apply_projection(conn, ev).await {
        Err(IndexerError::Projection(reason)) => {
            warn!("Skipping projection of {}: {reason}", ev.event_id);
            Ok(())
        }
        other => other,
    }
}

/// Fold a single event into `projects` / `contributions`.
///
/// All validation happens before the first write, so a `Projection` error
/// never leaves a half-applied event behind.
async fn apply_projection(conn: &mut SqliteConnection, ev: &LedgerEvent) -> Result<()> {
    let project_id = match (ev.kind.is_project_scoped(), ev.project_id) {
        (false, _) => return Ok(()),
        (true, Some(id)) => id,
        (true, None) => {
            return Err(IndexerError::Projection(format!(
                "{} event without a project id",
                ev.kind.as_str()
            )))
        }
    };

    match ev.kind {
        EventKind::ProjectCreated => {
            let owner = required(ev, "owner")?;
            let name = required(ev, "name")?;
            let url = required(ev, "url")?;
            let funding_goal = parse_amount(&required(ev, "funding_goal")?)?;
            let deadline: i64 = required(ev, "deadline")?
                .parse()
                .map_err(|_| IndexerError::Projection("invalid deadline".to_string()))?;

            sqlx::query(
                r#"
                INSERT OR IGNORE INTO projects
                    (project_id, owner, name, url, funding_goal, deadline, created_ledger)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(project_id)
            .bind(owner)
            .bind(name)
            .bind(url)
            .bind(funding_goal.to_string())
            .bind(deadline)
            .bind(ev.ledger)
            .execute(&mut *conn)
            .await?;
        }
        EventKind::ProjectContributed => {
            let contributor = required(ev, "contributor")?;
            let net_amount = parse_amount(&required(ev, "net_amount")?)?;
            let new_total = next_total(conn, project_id, net_amount).await?;

            let inserted = sqlx::query(
                r#"
                INSERT OR IGNORE INTO contributions
                    (event_id, project_id, contributor, net_amount, ledger, timestamp, tx_hash)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&ev.event_id)
            .bind(project_id)
            .bind(contributor)
            .bind(net_amount.to_string())
            .bind(ev.ledger)
            .bind(ev.timestamp)
            .bind(&ev.tx_hash)
            .execute(&mut *conn)
            .await?
            .rows_affected();

            if let (1, Some(total)) = (inserted, new_total) {
                sqlx::query("UPDATE projects SET total_funds = ?1 WHERE project_id = ?2")
                    .bind(total.to_string())
                    .bind(project_id)
                    .execute(&mut *conn)
                    .await?;
            }
        }
        EventKind::ProjectCompleted => set_flag(conn, project_id, "is_completed").await?,
        EventKind::ProjectWithdrawn => set_flag(conn, project_id, "is_withdrawn").await?,
        EventKind::ProjectExpired => set_flag(conn, project_id, "is_expired").await?,
        EventKind::FundsClaimed => set_flag(conn, project_id, "is_claimed").await?,
        _ => {}
    }
    Ok(())
}

/// The project's running total after adding `net`, or `None` when the
/// project was created before the mirror's first ledger.
async fn next_total(
    conn: &mut SqliteConnection,
    project_id: i64,
    net: i128,
) -> Result<Option<i128>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT total_funds FROM projects WHERE project_id = ?1")
            .bind(project_id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some((current,)) = row else {
        warn!("Contribution to unmirrored project {project_id}; total not tracked");
        return Ok(None);
    };

    parse_amount(&current)?
        .checked_add(net)
        .map(Some)
        .ok_or_else(|| IndexerError::Projection(format!("total overflow on {project_id}")))
}

/// Flip a terminal flag, only where it is still unset.
async fn set_flag(
    conn: &mut SqliteConnection,
    project_id: i64,
    column: &'static str,
) -> Result<()> {
    let sql = format!("UPDATE projects SET {column} = 1 WHERE project_id = ?1 AND {column} = 0");
    sqlx::query(&sql)
        .bind(project_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn required(ev: &LedgerEvent, key: &str) -> Result<String> {
    field(&ev.payload, &[key])
        .ok_or_else(|| IndexerError::Projection(format!("missing field `{key}`")))
}

fn parse_amount(raw: &str) -> Result<i128> {
    raw.parse()
        .map_err(|_| IndexerError::Projection(format!("invalid amount `{raw}`")))
}

// ─────────────────────────────────────────────────────────
// Reads
// ─────────────────────────────────────────────────────────

/// Fetch all events for a given project, ordered by ledger ascending.
pub async fn get_events_for_project(
    pool: &SqlitePool,
    project_id: i64,
) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, event_id, event_type, project_id, actor, amount, payload,
               ledger, timestamp, contract_id, tx_hash, created_at
        FROM   events
        WHERE  project_id = ?1
        ORDER  BY ledger ASC, id ASC
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Fetch all events, ordered by ledger ascending.
pub async fn get_all_events(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let rows = sqlx::query_as::<_, EventRecord>(
        r#"
        SELECT id, event_id, event_type, project_id, actor, amount, payload,
               ledger, timestamp, contract_id, tx_hash, created_at
        FROM   events
        ORDER  BY ledger ASC, id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

const PROJECT_COLUMNS: &str = "project_id, owner, name, url, funding_goal, total_funds, deadline, \
     is_completed, is_expired, is_withdrawn, is_claimed, created_ledger";

/// Every mirrored project, by id.
pub async fn list_projects(pool: &SqlitePool) -> Result<Vec<ProjectRecord>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY project_id ASC");
    let rows = sqlx::query_as::<_, ProjectRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_project(pool: &SqlitePool, project_id: i64) -> Result<Option<ProjectRecord>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1");
    let row = sqlx::query_as::<_, ProjectRecord>(&sql)
        .bind(project_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Contributions to a project in the order they were recorded.
pub async fn get_contributions(
    pool: &SqlitePool,
    project_id: i64,
) -> Result<Vec<ContributionRecord>> {
    let rows = sqlx::query_as::<_, ContributionRecord>(
        r#"
        SELECT id, event_id, project_id, contributor, net_amount, ledger, timestamp, tx_hash
        FROM   contributions
        WHERE  project_id = ?1
        ORDER  BY ledger ASC, id ASC
        "#,
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
