//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the ledger:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key              | Type          | Description                           |
//! |------------------|---------------|---------------------------------------|
//! | `Admin`          | `Address`     | Fee administrator                     |
//! | `Token`          | `Address`     | Funding asset (SAC token contract)    |
//! | `Fees`           | `FeeSchedule` | Current fee schedule                  |
//! | `ProjectCount`   | `u64`         | Auto-increment project ID counter     |
//! | `FeePool`        | `i128`        | Collected fees not yet withdrawn      |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                     | Type            | Description                      |
//! |-------------------------|-----------------|----------------------------------|
//! | `ProjConfig(id)`        | `ProjectConfig` | Immutable project configuration  |
//! | `ProjState(id)`         | `ProjectState`  | Mutable project state            |
//! | `Contrib(id, index)`    | `Contribution`  | Append-only contribution record  |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Contributions are the high-frequency write. Only the small `ProjectState`
//! entry and one new `Contrib` entry are written per contribution; the config
//! with its three strings is never rewritten.

use soroban_sdk::{contracttype, Address, Env};

use crate::types::{Contribution, FeeSchedule, Project, ProjectConfig, ProjectState};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Fee administrator (Instance).
    Admin,
    /// Funding token contract (Instance).
    Token,
    /// Current fee schedule (Instance).
    Fees,
    /// Global auto-increment counter for project IDs (Instance).
    ProjectCount,
    /// Fees collected and not yet withdrawn (Instance).
    FeePool,
    /// Immutable project configuration keyed by ID (Persistent).
    ProjConfig(u64),
    /// Mutable project state keyed by ID (Persistent).
    ProjState(u64),
    /// Contribution record keyed by (project ID, index) (Persistent).
    Contrib(u64, u32),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    bump_instance(env);
}

pub fn get_admin(env: &Env) -> Result<Address, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

pub fn set_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::Token, token);
    bump_instance(env);
}

pub fn get_token(env: &Env) -> Result<Address, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(Error::NotInitialized)
}

pub fn set_fee_schedule(env: &Env, fees: &FeeSchedule) {
    env.storage().instance().set(&DataKey::Fees, fees);
    bump_instance(env);
}

pub fn get_fee_schedule(env: &Env) -> Result<FeeSchedule, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Fees)
        .ok_or(Error::NotInitialized)
}

/// Number of projects ever created; also the next project ID.
pub fn get_project_count(env: &Env) -> u64 {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::ProjectCount)
        .unwrap_or(0)
}

/// Atomically reads, increments, and stores the project counter.
/// Returns the ID to use for the *current* project (pre-increment value).
pub fn get_and_increment_project_id(env: &Env) -> Result<u64, Error> {
    let current = get_project_count(env);
    let next = current.checked_add(1).ok_or(Error::Overflow)?;
    env.storage()
        .instance()
        .set(&DataKey::ProjectCount, &next);
    Ok(current)
}

pub fn get_fee_pool(env: &Env) -> i128 {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::FeePool)
        .unwrap_or(0)
}

pub fn set_fee_pool(env: &Env, amount: i128) {
    env.storage().instance().set(&DataKey::FeePool, &amount);
    bump_instance(env);
}

/// Credit collected fees to the pool. Zero amounts are a no-op.
pub fn add_to_fee_pool(env: &Env, amount: i128) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    let pool = get_fee_pool(env)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    set_fee_pool(env, pool);
    Ok(())
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Save the immutable config and the initial (empty) state of a new project.
pub fn save_project(env: &Env, config: &ProjectConfig) {
    let config_key = DataKey::ProjConfig(config.id);
    let state_key = DataKey::ProjState(config.id);

    env.storage().persistent().set(&config_key, config);
    env.storage()
        .persistent()
        .set(&state_key, &ProjectState::default());
    bump_persistent(env, &config_key);
    bump_persistent(env, &state_key);
}

/// Load the full `Project` by combining config and state.
pub fn load_project(env: &Env, id: u64) -> Result<Project, Error> {
    let (config, state) = load_project_pair(env, id)?;
    Ok(Project {
        id: config.id,
        owner: config.owner,
        name: config.name,
        description: config.description,
        url: config.url,
        funding_goal: config.funding_goal,
        total_funds: state.total_funds,
        created_at: config.created_at,
        deadline: config.deadline,
        contribution_count: state.contribution_count,
        is_completed: state.is_completed,
        is_expired: state.is_expired,
        is_withdrawn: state.is_withdrawn,
        is_claimed: state.is_claimed,
    })
}

/// Load config and state together; the usual read for any state transition.
pub fn load_project_pair(env: &Env, id: u64) -> Result<(ProjectConfig, ProjectState), Error> {
    Ok((load_project_config(env, id)?, load_project_state(env, id)?))
}

/// Load only the immutable project configuration.
pub fn load_project_config(env: &Env, id: u64) -> Result<ProjectConfig, Error> {
    let key = DataKey::ProjConfig(id);
    let config: ProjectConfig = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::ProjectNotFound)?;
    bump_persistent(env, &key);
    Ok(config)
}

/// Load only the mutable project state.
pub fn load_project_state(env: &Env, id: u64) -> Result<ProjectState, Error> {
    let key = DataKey::ProjState(id);
    let state: ProjectState = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::ProjectNotFound)?;
    bump_persistent(env, &key);
    Ok(state)
}

/// Save only the mutable project state.
pub fn save_project_state(env: &Env, id: u64, state: &ProjectState) {
    let key = DataKey::ProjState(id);
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

/// Write contribution number `index` of project `project_id`.
pub fn save_contribution(env: &Env, project_id: u64, index: u32, contribution: &Contribution) {
    let key = DataKey::Contrib(project_id, index);
    env.storage().persistent().set(&key, contribution);
    bump_persistent(env, &key);
}

pub fn load_contribution(env: &Env, project_id: u64, index: u32) -> Result<Contribution, Error> {
    let key = DataKey::Contrib(project_id, index);
    let contribution: Contribution = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::ContributionNotFound)?;
    bump_persistent(env, &key);
    Ok(contribution)
}
