//! # Types
//!
//! Shared data structures used across all modules of the Funding Ledger.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! A `Project` is internally stored as two separate ledger entries:
//!
//! - [`ProjectConfig`]: written once at creation; never mutated.
//! - [`ProjectState`]: written on every contribution, withdrawal, claim and sweep.
//!
//! The public API exposes the reconstructed [`Project`] struct for convenience.
//!
//! ### Terminal flags
//!
//! ```text
//! open ──► completed ──► claimed
//!   ├────► expired
//!   └────► withdrawn
//! ```
//!
//! Exactly one of `is_completed`, `is_expired`, `is_withdrawn` can ever be set
//! on a project, and once set it stays set.

use soroban_sdk::{contracttype, Address, String};

/// Fees charged by the ledger. Percentages are whole percents in `0..=100`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeSchedule {
    /// Flat amount required to register a project.
    pub creation_fee: i128,
    /// Share of every contribution routed to the fee pool.
    pub contribution_fee_pct: u32,
    /// Share of `total_funds` owed by an owner withdrawing before the deadline.
    pub early_withdrawal_fee_pct: u32,
}

/// Immutable project configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectConfig {
    pub id: u64,
    pub owner: Address,
    pub name: String,
    pub description: String,
    pub url: String,
    pub funding_goal: i128,
    pub created_at: u64,
    pub deadline: u64,
}

/// Mutable project state. A fresh project starts from `ProjectState::default()`.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProjectState {
    pub total_funds: i128,
    pub contribution_count: u32,
    pub is_completed: bool,
    pub is_expired: bool,
    pub is_withdrawn: bool,
    pub is_claimed: bool,
}

impl ProjectState {
    /// True once the project has reached any of its terminal conditions.
    pub fn is_terminal(&self) -> bool {
        self.is_completed || self.is_expired || self.is_withdrawn
    }
}

/// Full on-chain representation of a crowdfunding project.
///
/// Used as the public API return type; reconstructed internally from
/// the split `ProjectConfig` + `ProjectState` storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    /// Sequential identifier, never reused.
    pub id: u64,
    /// Address that created the project and receives its funds.
    pub owner: Address,
    pub name: String,
    pub description: String,
    pub url: String,
    /// Target amount; reaching it completes the project.
    pub funding_goal: i128,
    /// Sum of net contributions (after the contribution fee).
    pub total_funds: i128,
    /// Ledger timestamp at creation.
    pub created_at: u64,
    /// Ledger timestamp at which the project stops accepting funds.
    pub deadline: u64,
    /// Number of contributions recorded.
    pub contribution_count: u32,
    pub is_completed: bool,
    pub is_expired: bool,
    pub is_withdrawn: bool,
    /// Owner has collected the funds of a completed project.
    pub is_claimed: bool,
}

/// A single contribution, recorded after the contribution fee was withheld.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Contribution {
    pub contributor: Address,
    pub net_amount: i128,
    pub timestamp: u64,
}
