//! # Events
//!
//! Every lifecycle transition publishes exactly one event. Topics are
//! `(symbol, project_id)` for project events so that an off-chain indexer can
//! filter by project; data is one of the structs below or a scalar.
//!
//! | Topic                | Data                   |
//! |----------------------|------------------------|
//! | `created`, id        | [`ProjectCreated`]     |
//! | `contrib`, id        | [`ProjectContributed`] |
//! | `completed`, id      | [`ProjectCompleted`]   |
//! | `withdrawn`, id      | [`ProjectWithdrawn`]   |
//! | `expired`, id        | `u64` project id       |
//! | `claimed`, id        | [`FundsClaimed`]       |
//! | `fee_set`, kind      | new value              |
//! | `fees_out`           | [`FeesWithdrawn`]      |
//! | `admin_set`          | [`AdminChanged`]       |

use soroban_sdk::{contracttype, symbol_short, Address, Env, String, Symbol};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectCreated {
    pub project_id: u64,
    pub owner: Address,
    pub name: String,
    pub funding_goal: i128,
    pub url: String,
    pub deadline: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectContributed {
    pub project_id: u64,
    pub contributor: Address,
    pub net_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectCompleted {
    pub project_id: u64,
    pub total_funds: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectWithdrawn {
    pub project_id: u64,
    pub owner: Address,
    /// Funds released to the owner.
    pub amount: i128,
    /// Early withdrawal fee paid into the fee pool.
    pub fee: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsClaimed {
    pub project_id: u64,
    pub owner: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeesWithdrawn {
    pub to: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminChanged {
    pub old_admin: Address,
    pub new_admin: Address,
}

pub fn emit_project_created(env: &Env, data: ProjectCreated) {
    env.events()
        .publish((symbol_short!("created"), data.project_id), data);
}

pub fn emit_project_contributed(
    env: &Env,
    project_id: u64,
    contributor: Address,
    net_amount: i128,
) {
    let data = ProjectContributed {
        project_id,
        contributor,
        net_amount,
    };
    env.events()
        .publish((symbol_short!("contrib"), project_id), data);
}

pub fn emit_project_completed(env: &Env, project_id: u64, total_funds: i128) {
    let data = ProjectCompleted {
        project_id,
        total_funds,
    };
    env.events()
        .publish((symbol_short!("completed"), project_id), data);
}

pub fn emit_project_withdrawn(
    env: &Env,
    project_id: u64,
    owner: Address,
    amount: i128,
    fee: i128,
) {
    let data = ProjectWithdrawn {
        project_id,
        owner,
        amount,
        fee,
    };
    env.events()
        .publish((symbol_short!("withdrawn"), project_id), data);
}

pub fn emit_project_expired(env: &Env, project_id: u64) {
    env.events()
        .publish((symbol_short!("expired"), project_id), project_id);
}

pub fn emit_funds_claimed(env: &Env, project_id: u64, owner: Address, amount: i128) {
    let data = FundsClaimed {
        project_id,
        owner,
        amount,
    };
    env.events()
        .publish((symbol_short!("claimed"), project_id), data);
}

pub fn emit_creation_fee_set(env: &Env, fee: i128) {
    env.events()
        .publish((symbol_short!("fee_set"), symbol_short!("creation")), fee);
}

/// `kind` is `contrib` or `early_wd`.
pub fn emit_fee_pct_set(env: &Env, kind: Symbol, pct: u32) {
    env.events().publish((symbol_short!("fee_set"), kind), pct);
}

pub fn emit_fees_withdrawn(env: &Env, to: Address, amount: i128) {
    env.events()
        .publish((symbol_short!("fees_out"),), FeesWithdrawn { to, amount });
}

pub fn emit_admin_changed(env: &Env, old_admin: Address, new_admin: Address) {
    env.events().publish(
        (symbol_short!("admin_set"),),
        AdminChanged {
            old_admin,
            new_admin,
        },
    );
}
