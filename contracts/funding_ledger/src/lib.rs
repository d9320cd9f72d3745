//! # Funding Ledger Contract
//!
//! Authoritative registry of crowdfunding projects. It exposes the single
//! Soroban contract `FundingLedger` whose entry points cover the full project
//! lifecycle:
//!
//! | Phase        | Entry Point(s)                                                    |
//! |--------------|-------------------------------------------------------------------|
//! | Bootstrap    | [`FundingLedger::init`]                                           |
//! | Registration | [`FundingLedger::create_project`]                                 |
//! | Funding      | [`FundingLedger::contribute`]                                     |
//! | Exit         | `withdraw_early`, `claim_funds`                                   |
//! | Maintenance  | `update_project_status`, `update_project_status_range`            |
//! | Fee admin    | `set_creation_fee`, `set_contribution_fee`, `set_early_withdrawal_fee`, `withdraw_fees`, `transfer_admin` |
//! | Queries      | `get_project`, `get_project_count`, `get_contributions`, `get_early_withdrawal_fee`, fee getters |
//!
//! ## Architecture
//!
//! Storage access is delegated to [`storage`], fee arithmetic to [`fees`] and
//! event publishing to [`events`]. Every entry point returns
//! `Result<_, Error>`; an `Err` aborts the invocation, so the host discards
//! all storage writes, token transfers and events of a failed call.
//!
//! Expiry is materialised lazily by [`FundingLedger::update_project_status`],
//! which anyone may call. `contribute` and `withdraw_early` compare the
//! deadline against the ledger clock themselves and never rely on the sweep
//! having run.

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, symbol_short, token, Address, Env, String, Vec,
};

pub mod events;
pub mod fees;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use types::{Contribution, FeeSchedule, Project, ProjectConfig, ProjectState};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    ProjectNotFound = 1,
    ContributionNotFound = 2,
    Unauthorized = 3,
    InsufficientFee = 4,
    SelfContributionForbidden = 5,
    AlreadyCompleted = 6,
    DeadlinePassed = 7,
    AlreadyWithdrawn = 8,

    // Invalid input, one code per offending argument.
    EmptyName = 9,
    EmptyDescription = 10,
    EmptyUrl = 11,
    InvalidFundingGoal = 12,
    InvalidDuration = 13,
    InvalidFeePercentage = 14,
    InvalidAmount = 15,

    AlreadyInitialized = 16,
    NotInitialized = 17,
    Overflow = 18,
    InsufficientFeePool = 19,
    NotCompleted = 20,
    AlreadyClaimed = 21,
}

#[contract]
pub struct FundingLedger;

#[contractimpl]
impl FundingLedger {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the ledger with its administrator, funding token and fee schedule.
    ///
    /// Must be called exactly once immediately after deployment.
    /// Subsequent calls fail with `Error::AlreadyInitialized`.
    pub fn init(
        env: Env,
        admin: Address,
        token: Address,
        creation_fee: i128,
        contribution_fee_pct: u32,
        early_withdrawal_fee_pct: u32,
    ) -> Result<(), Error> {
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();

        if creation_fee < 0 {
            return Err(Error::InvalidAmount);
        }
        fees::validate_pct(contribution_fee_pct)?;
        fees::validate_pct(early_withdrawal_fee_pct)?;

        storage::set_admin(&env, &admin);
        storage::set_token(&env, &token);
        storage::set_fee_schedule(
            &env,
            &FeeSchedule {
                creation_fee,
                contribution_fee_pct,
                early_withdrawal_fee_pct,
            },
        );
        storage::set_fee_pool(&env, 0);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Project lifecycle
    // ─────────────────────────────────────────────────────────

    /// Register a new project and pay the creation fee.
    ///
    /// Arguments are validated in order and the first violation is returned.
    /// The whole of `paid_fee` is moved into the fee pool, even when it
    /// exceeds the current creation fee.
    #[allow(clippy::too_many_arguments)]
    pub fn create_project(
        env: Env,
        owner: Address,
        name: String,
        description: String,
        url: String,
        funding_goal: i128,
        duration_secs: u64,
        paid_fee: i128,
    ) -> Result<u64, Error> {
        let schedule = storage::get_fee_schedule(&env)?;
        owner.require_auth();

        if name.len() == 0 {
            return Err(Error::EmptyName);
        }
        if description.len() == 0 {
            return Err(Error::EmptyDescription);
        }
        if url.len() == 0 {
            return Err(Error::EmptyUrl);
        }
        if funding_goal <= 0 {
            return Err(Error::InvalidFundingGoal);
        }
        if duration_secs == 0 {
            return Err(Error::InvalidDuration);
        }
        if paid_fee < schedule.creation_fee {
            return Err(Error::InsufficientFee);
        }

        let now = env.ledger().timestamp();
        let deadline = now
            .checked_add(duration_secs)
            .ok_or(Error::InvalidDuration)?;

        collect(&env, &owner, paid_fee)?;

        let id = storage::get_and_increment_project_id(&env)?;
        let config = ProjectConfig {
            id,
            owner: owner.clone(),
            name: name.clone(),
            description,
            url: url.clone(),
            funding_goal,
            created_at: now,
            deadline,
        };
        storage::save_project(&env, &config);

        events::emit_project_created(
            &env,
            events::ProjectCreated {
                project_id: id,
                owner,
                name,
                funding_goal,
                url,
                deadline,
            },
        );
        Ok(id)
    }

    /// Contribute `paid_amount` to a project and return the net amount credited.
    ///
    /// The contribution fee is withheld into the fee pool. The contribution
    /// that brings `total_funds` to or past the goal completes the project.
    pub fn contribute(
        env: Env,
        contributor: Address,
        project_id: u64,
        paid_amount: i128,
    ) -> Result<i128, Error> {
        let schedule = storage::get_fee_schedule(&env)?;
        contributor.require_auth();

        let (config, mut state) = storage::load_project_pair(&env, project_id)?;
        let now = env.ledger().timestamp();

        if contributor == config.owner {
            return Err(Error::SelfContributionForbidden);
        }
        if state.is_completed {
            return Err(Error::AlreadyCompleted);
        }
        if state.is_expired || now >= config.deadline {
            return Err(Error::DeadlinePassed);
        }
        if state.is_withdrawn {
            return Err(Error::AlreadyWithdrawn);
        }
        if paid_amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let (fee, net) = fees::split_contribution(paid_amount, schedule.contribution_fee_pct)?;

        token_client(&env)?.transfer(&contributor, &env.current_contract_address(), &paid_amount);
        storage::add_to_fee_pool(&env, fee)?;

        let index = state.contribution_count;
        state.total_funds = state.total_funds.checked_add(net).ok_or(Error::Overflow)?;
        state.contribution_count = index.checked_add(1).ok_or(Error::Overflow)?;
        storage::save_contribution(
            &env,
            project_id,
            index,
            &Contribution {
                contributor: contributor.clone(),
                net_amount: net,
                timestamp: now,
            },
        );

        let completed = state.total_funds >= config.funding_goal;
        if completed {
            state.is_completed = true;
        }
        storage::save_project_state(&env, project_id, &state);

        events::emit_project_contributed(&env, project_id, contributor, net);
        if completed {
            events::emit_project_completed(&env, project_id, state.total_funds);
        }
        Ok(net)
    }

    /// Fee the owner must pay to withdraw a project's funds before its deadline.
    pub fn get_early_withdrawal_fee(env: Env, project_id: u64) -> Result<i128, Error> {
        let state = storage::load_project_state(&env, project_id)?;
        let schedule = storage::get_fee_schedule(&env)?;
        fees::percentage_of(state.total_funds, schedule.early_withdrawal_fee_pct)
    }

    /// Give up on a project before its deadline and take the funds raised so far.
    ///
    /// The owner pays `paid_fee` (at least [`Self::get_early_withdrawal_fee`])
    /// into the fee pool and receives `total_funds`; the returned value is the
    /// amount released. Completed projects are settled with
    /// [`Self::claim_funds`] instead.
    pub fn withdraw_early(
        env: Env,
        owner: Address,
        project_id: u64,
        paid_fee: i128,
    ) -> Result<i128, Error> {
        let schedule = storage::get_fee_schedule(&env)?;
        owner.require_auth();

        let (config, mut state) = storage::load_project_pair(&env, project_id)?;

        if owner != config.owner {
            return Err(Error::Unauthorized);
        }
        if state.is_withdrawn {
            return Err(Error::AlreadyWithdrawn);
        }
        if state.is_completed {
            return Err(Error::AlreadyCompleted);
        }
        if state.is_expired || env.ledger().timestamp() >= config.deadline {
            return Err(Error::DeadlinePassed);
        }
        let required = fees::percentage_of(state.total_funds, schedule.early_withdrawal_fee_pct)?;
        if paid_fee < required {
            return Err(Error::InsufficientFee);
        }

        collect(&env, &owner, paid_fee)?;

        state.is_withdrawn = true;
        storage::save_project_state(&env, project_id, &state);

        let released = state.total_funds;
        release(&env, &owner, released)?;

        events::emit_project_withdrawn(&env, project_id, owner, released, paid_fee);
        Ok(released)
    }

    /// Collect the funds of a completed project. Allowed once, owner only.
    pub fn claim_funds(env: Env, owner: Address, project_id: u64) -> Result<i128, Error> {
        owner.require_auth();

        let (config, mut state) = storage::load_project_pair(&env, project_id)?;

        if owner != config.owner {
            return Err(Error::Unauthorized);
        }
        if !state.is_completed {
            return Err(Error::NotCompleted);
        }
        if state.is_claimed {
            return Err(Error::AlreadyClaimed);
        }

        state.is_claimed = true;
        storage::save_project_state(&env, project_id, &state);

        let amount = state.total_funds;
        release(&env, &owner, amount)?;

        events::emit_funds_claimed(&env, project_id, owner, amount);
        Ok(amount)
    }

    /// Expiry sweep: mark every open project whose deadline has passed as expired.
    ///
    /// Anyone may call this. Returns the number of projects expired by this
    /// call, so a second call with nothing new to expire returns `0` and
    /// changes nothing. Every project costs at least one ledger read, so once
    /// the registry outgrows a transaction's read limit, sweep it in pages
    /// with [`Self::update_project_status_range`].
    pub fn update_project_status(env: Env) -> Result<u32, Error> {
        let count = storage::get_project_count(&env);
        sweep(&env, 0, count)
    }

    /// Expiry sweep over at most `limit` project ids starting at `start`.
    ///
    /// Ids past the last project are ignored, so a page beyond the end
    /// expires nothing and returns `0`.
    pub fn update_project_status_range(env: Env, start: u64, limit: u32) -> Result<u32, Error> {
        let count = storage::get_project_count(&env);
        let end = start.saturating_add(u64::from(limit)).min(count);
        sweep(&env, start, end)
    }

    // ─────────────────────────────────────────────────────────
    // Fee administration
    // ─────────────────────────────────────────────────────────

    pub fn set_creation_fee(env: Env, admin: Address, fee: i128) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        if fee < 0 {
            return Err(Error::InvalidAmount);
        }
        let mut schedule = storage::get_fee_schedule(&env)?;
        schedule.creation_fee = fee;
        storage::set_fee_schedule(&env, &schedule);
        events::emit_creation_fee_set(&env, fee);
        Ok(())
    }

    pub fn set_contribution_fee(env: Env, admin: Address, pct: u32) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        fees::validate_pct(pct)?;
        let mut schedule = storage::get_fee_schedule(&env)?;
        schedule.contribution_fee_pct = pct;
        storage::set_fee_schedule(&env, &schedule);
        events::emit_fee_pct_set(&env, symbol_short!("contrib"), pct);
        Ok(())
    }

    pub fn set_early_withdrawal_fee(env: Env, admin: Address, pct: u32) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        fees::validate_pct(pct)?;
        let mut schedule = storage::get_fee_schedule(&env)?;
        schedule.early_withdrawal_fee_pct = pct;
        storage::set_fee_schedule(&env, &schedule);
        events::emit_fee_pct_set(&env, symbol_short!("early_wd"), pct);
        Ok(())
    }

    /// Pay `amount` out of the fee pool to `to`.
    pub fn withdraw_fees(env: Env, admin: Address, to: Address, amount: i128) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        let pool = storage::get_fee_pool(&env);
        if amount > pool {
            return Err(Error::InsufficientFeePool);
        }
        storage::set_fee_pool(&env, pool - amount);
        release(&env, &to, amount)?;
        events::emit_fees_withdrawn(&env, to, amount);
        Ok(())
    }

    /// Hand the administrator role to `new_admin`. The old admin loses it immediately.
    pub fn transfer_admin(env: Env, admin: Address, new_admin: Address) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        storage::set_admin(&env, &new_admin);
        events::emit_admin_changed(&env, admin, new_admin);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_project(env: Env, id: u64) -> Result<Project, Error> {
        storage::load_project(&env, id)
    }

    pub fn get_project_count(env: Env) -> u64 {
        storage::get_project_count(&env)
    }

    pub fn get_contribution(env: Env, project_id: u64, index: u32) -> Result<Contribution, Error> {
        storage::load_contribution(&env, project_id, index)
    }

    /// All contributions of a project in the order they were made.
    pub fn get_contributions(env: Env, project_id: u64) -> Result<Vec<Contribution>, Error> {
        let state = storage::load_project_state(&env, project_id)?;
        let mut out = Vec::new(&env);
        for index in 0..state.contribution_count {
            out.push_back(storage::load_contribution(&env, project_id, index)?);
        }
        Ok(out)
    }

    pub fn get_fee_schedule(env: Env) -> Result<FeeSchedule, Error> {
        storage::get_fee_schedule(&env)
    }

    pub fn creation_fee(env: Env) -> Result<i128, Error> {
        Ok(storage::get_fee_schedule(&env)?.creation_fee)
    }

    pub fn contribution_fee(env: Env) -> Result<u32, Error> {
        Ok(storage::get_fee_schedule(&env)?.contribution_fee_pct)
    }

    pub fn early_withdrawal_fee(env: Env) -> Result<u32, Error> {
        Ok(storage::get_fee_schedule(&env)?.early_withdrawal_fee_pct)
    }

    /// Fees collected and not yet paid out by the administrator.
    pub fn get_fee_pool(env: Env) -> i128 {
        storage::get_fee_pool(&env)
    }

    pub fn get_admin(env: Env) -> Result<Address, Error> {
        storage::get_admin(&env)
    }

    pub fn get_token(env: Env) -> Result<Address, Error> {
        storage::get_token(&env)
    }
}

// ─────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────

fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    let admin = storage::get_admin(env)?;
    if *caller != admin {
        return Err(Error::Unauthorized);
    }
    caller.require_auth();
    Ok(())
}

/// Expire the open, past-deadline projects among ids `start..end`.
///
/// The state entry is read first; finished projects are skipped without
/// touching their configuration.
fn sweep(env: &Env, start: u64, end: u64) -> Result<u32, Error> {
    let now = env.ledger().timestamp();
    let mut expired: u32 = 0;

    for id in start..end {
        let mut state = storage::load_project_state(env, id)?;
        if state.is_terminal() {
            continue;
        }
        if storage::load_project_config(env, id)?.deadline > now {
            continue;
        }
        state.is_expired = true;
        storage::save_project_state(env, id, &state);
        events::emit_project_expired(env, id);
        expired = expired.checked_add(1).ok_or(Error::Overflow)?;
    }

    Ok(expired)
}

fn token_client(env: &Env) -> Result<token::Client<'_>, Error> {
    Ok(token::Client::new(env, &storage::get_token(env)?))
}

/// Move a fee payment from `from` into the contract and credit the fee pool.
fn collect(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
    if amount > 0 {
        token_client(env)?.transfer(from, &env.current_contract_address(), &amount);
    }
    storage::add_to_fee_pool(env, amount)
}

/// Pay `amount` held by the contract out to `to`.
fn release(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
    if amount > 0 {
        token_client(env)?.transfer(&env.current_contract_address(), to, &amount);
    }
    Ok(())
}
