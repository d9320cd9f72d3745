//! Event and record types of the Funding Ledger mirror.
//!
//! [`EventKind`] mirrors the topics published by
//! `contracts/funding_ledger/src/events.rs`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// All recognised event kinds from the Funding Ledger contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new project was registered (`created` topic).
    ProjectCreated,
    /// A contribution was credited (`contrib` topic).
    ProjectContributed,
    /// A contribution reached the funding goal (`completed` topic).
    ProjectCompleted,
    /// The owner withdrew before the deadline (`withdrawn` topic).
    ProjectWithdrawn,
    /// The expiry sweep marked the project expired (`expired` topic).
    ProjectExpired,
    /// The owner collected a completed project's funds (`claimed` topic).
    FundsClaimed,
    /// A fee in the schedule changed (`fee_set` topic).
    FeeUpdated,
    /// The administrator paid out of the fee pool (`fees_out` topic).
    FeesWithdrawn,
    /// The administrator role moved (`admin_set` topic).
    AdminChanged,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::ProjectCreated,
            "contrib" => Self::ProjectContributed,
            "completed" => Self::ProjectCompleted,
            "withdrawn" => Self::ProjectWithdrawn,
            "expired" => Self::ProjectExpired,
            "claimed" => Self::FundsClaimed,
            "fee_set" => Self::FeeUpdated,
            "fees_out" => Self::FeesWithdrawn,
            "admin_set" => Self::AdminChanged,
            _ => Self::Unknown,
        }
    }

    /// Inverse of [`EventKind::as_str`], used when replaying stored events.
    pub fn from_stored(s: &str) -> Self {
        match s {
            "project_created" => Self::ProjectCreated,
            "project_contributed" => Self::ProjectContributed,
            "project_completed" => Self::ProjectCompleted,
            "project_withdrawn" => Self::ProjectWithdrawn,
            "project_expired" => Self::ProjectExpired,
            "funds_claimed" => Self::FundsClaimed,
            "fee_updated" => Self::FeeUpdated,
            "fees_withdrawn" => Self::FeesWithdrawn,
            "admin_changed" => Self::AdminChanged,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectCreated => "project_created",
            Self::ProjectContributed => "project_contributed",
            Self::ProjectCompleted => "project_completed",
            Self::ProjectWithdrawn => "project_withdrawn",
            Self::ProjectExpired => "project_expired",
            Self::FundsClaimed => "funds_claimed",
            Self::FeeUpdated => "fee_updated",
            Self::FeesWithdrawn => "fees_withdrawn",
            Self::AdminChanged => "admin_changed",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the topic's second entry is a project id.
    pub fn is_project_scoped(&self) -> bool {
        matches!(
            self,
            Self::ProjectCreated
                | Self::ProjectContributed
                | Self::ProjectCompleted
                | Self::ProjectWithdrawn
                | Self::ProjectExpired
                | Self::FundsClaimed
        )
    }
}

/// A fully decoded ledger event, ready to be stored and projected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// RPC event id; the deduplication key.
    pub event_id: String,
    pub kind: EventKind,
    pub project_id: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    /// Decoded event data, kept whole so projections can be replayed.
    pub payload: Value,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub project_id: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub payload: String,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

impl EventRecord {
    /// Rebuild the decoded form of a stored event for replay.
    pub fn to_event(&self) -> crate::errors::Result<LedgerEvent> {
        Ok(LedgerEvent {
            event_id: self.event_id.clone(),
            kind: EventKind::from_stored(&self.event_type),
            project_id: self.project_id,
            actor: self.actor.clone(),
            amount: self.amount.clone(),
            payload: serde_json::from_str(&self.payload)?,
            ledger: self.ledger,
            timestamp: self.timestamp,
            contract_id: self.contract_id.clone(),
            tx_hash: self.tx_hash.clone(),
        })
    }
}

/// Mirrored project row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectRecord {
    pub project_id: i64,
    pub owner: String,
    pub name: String,
    pub url: String,
    pub funding_goal: String,
    pub total_funds: String,
    pub deadline: i64,
    pub is_completed: bool,
    pub is_expired: bool,
    pub is_withdrawn: bool,
    pub is_claimed: bool,
    pub created_ledger: i64,
}

/// Mirrored contribution row, one per `contrib` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContributionRecord {
    pub id: i64,
    pub event_id: String,
    pub project_id: i64,
    pub contributor: String,
    pub net_amount: String,
    pub ledger: i64,
    pub timestamp: i64,
    pub tx_hash: Option<String>,
}
