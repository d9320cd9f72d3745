//! Soroban RPC client that polls `getEvents` and decodes Funding Ledger events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, LedgerEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

/// One entry of `getEvents`, requested with `xdrFormat: "json"` so topics
/// and data arrive as ScVal JSON (`{"symbol":"created"}`, `{"u64":"0"}`).
#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    #[serde(rename = "topicJson", default)]
    pub topic_json: Vec<Value>,
    #[serde(rename = "valueJson", default)]
    pub value_json: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`: optional opaque pagination cursor from a previous response.
/// * `limit`: maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
    let mut backoff = INITIAL_BACKOFF_SECS;

    loop {
        let params = build_params(contract_id, start_ledger, cursor, limit);

        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        match response {
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                continue;
            }
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    warn!("Rate-limited by RPC (will retry in {backoff}s)");
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                let body: RpcResponse = resp.json().await?;

                if let Some(err) = body.error {
                    // Invalid request / unknown method will never succeed on retry.
                    if err.code == -32600 || err.code == -32601 {
                        return Err(IndexerError::EventParse(format!(
                            "RPC hard error {}: {}",
                            err.code, err.message
                        )));
                    }
                    warn!(
                        "RPC soft error (will retry in {backoff}s): {} {}",
                        err.code, err.message
                    );
                    tokio::time::sleep(Duration::from_secs(backoff)).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF_SECS);
                    continue;
                }

                let result = body.result.ok_or_else(|| {
                    IndexerError::EventParse("Empty result from getEvents".to_string())
                })?;

                debug!(
                    "Fetched {} events (latest_ledger={:?})",
                    result.events.len(),
                    result.latest_ledger
                );

                return Ok((result.events, result.cursor, result.latest_ledger));
            }
        }
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        },
        "xdrFormat": "json"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`LedgerEvent`]s.
///
/// Events raised by a failed contract call are dropped: the ledger rolled
/// their effects back.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<LedgerEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<LedgerEvent> {
    let Some(first_topic) = raw.topic_json.first() else {
        warn!("Event {:?} has no topicJson; the RPC ignored xdrFormat=json", raw.id);
        return None;
    };
    let kind = EventKind::from_topic(&scalar(first_topic)?);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let mut payload = match from_scval(&raw.value_json) {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    // `fee_set` carries which fee changed as its second topic.
    if kind == EventKind::FeeUpdated {
        if let Some(which) = raw.topic_json.get(1).and_then(scalar) {
            payload.insert("fee".to_string(), Value::String(which));
        }
    }
    let payload = Value::Object(payload);

    let project_id: Option<i64> = if kind.is_project_scoped() {
        raw.topic_json
            .get(1)
            .and_then(scalar)
            .or_else(|| field(&payload, &["project_id"]))
            .and_then(|s| s.parse().ok())
    } else {
        None
    };

    let (actor, amount) = decode_data(&payload, kind);
    let tx_hash = raw.tx_hash.clone();

    let event_id = raw
        .id
        .clone()
        .or_else(|| raw.paging_token.clone())
        .unwrap_or_else(|| {
            format!(
                "{ledger}-{}-{}-{}",
                tx_hash.as_deref().unwrap_or("none"),
                kind.as_str(),
                project_id.map(|p| p.to_string()).unwrap_or_default()
            )
        });

    Some(LedgerEvent {
        event_id,
        kind,
        project_id,
        actor,
        amount,
        payload,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash,
    })
}

/// Pick the acting address and headline amount out of a flattened payload.
fn decode_data(payload: &Value, kind: EventKind) -> (Option<String>, Option<String>) {
    match kind {
        EventKind::ProjectCreated => (
            field(payload, &["owner"]),
            field(payload, &["funding_goal"]),
        ),
        EventKind::ProjectContributed => (
            field(payload, &["contributor"]),
            field(payload, &["net_amount"]),
        ),
        EventKind::ProjectCompleted => (None, field(payload, &["total_funds"])),
        EventKind::ProjectWithdrawn | EventKind::FundsClaimed => {
            (field(payload, &["owner"]), field(payload, &["amount"]))
        }
        EventKind::FeeUpdated => (None, field(payload, &["value"])),
        EventKind::FeesWithdrawn => (field(payload, &["to"]), field(payload, &["amount"])),
        EventKind::AdminChanged => (field(payload, &["new_admin"]), None),
        EventKind::ProjectExpired | EventKind::Unknown => (None, None),
    }
}

/// Read a string field from a flattened payload.
pub fn field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(String::from))
}

/// Flatten ScVal JSON into plain JSON.
///
/// Scalars (`{"symbol":..}`, `{"u64":..}`, `{"address":..}`, ...) become
/// strings so that `i128` amounts survive untouched. A `map` becomes an
/// object keyed by its flattened keys, which is how `#[contracttype]`
/// structs arrive.
fn from_scval(value: &Value) -> Value {
    let Value::Object(obj) = value else {
        return match value {
            Value::String(s) if s == "void" => Value::Null,
            other => other.clone(),
        };
    };
    let Some((tag, inner)) = obj.iter().next().filter(|_| obj.len() == 1) else {
        return Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), from_scval(v)))
                .collect(),
        );
    };

    match tag.as_str() {
        "map" => {
            let mut out = Map::new();
            for entry in inner.as_array().into_iter().flatten() {
                let key = entry.get("key").and_then(scalar);
                if let (Some(key), Some(val)) = (key, entry.get("val")) {
                    out.insert(key, from_scval(val));
                }
            }
            Value::Object(out)
        }
        "vec" => Value::Array(
            inner
                .as_array()
                .into_iter()
                .flatten()
                .map(from_scval)
                .collect(),
        ),
        "i128" | "u128" => int128(inner).map(Value::String).unwrap_or(Value::Null),
        _ => plain(inner).map(Value::String).unwrap_or(Value::Null),
    }
}

/// A single ScVal as a string, if it is a scalar.
fn scalar(value: &Value) -> Option<String> {
    match from_scval(value) {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn plain(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 128-bit integers come either as a decimal string or as `{"hi":..,"lo":..}`
/// parts, depending on the RPC's XDR library version.
fn int128(value: &Value) -> Option<String> {
    if let Some(s) = plain(value) {
        return Some(s);
    }
    let hi: i128 = plain(value.get("hi")?)?.parse().ok()?;
    let lo: u64 = plain(value.get("lo")?)?.parse().ok()?;
    hi.checked_mul(1i128 << 64)?
        .checked_add(i128::from(lo))
        .map(|n| n.to_string())
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    use chrono::DateTime;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
