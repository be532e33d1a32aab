//! Staking ledger for the portfolio manager
//! Custody-held governance-token stakes earning 1% per completed 30-day
//! period.

use crate::{ProtocolError, ProtocolEvent};
use soroban_sdk::{contracterror, contracttype, token, Address, Env, Symbol};

/// Staking-specific errors
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum StakingError {
    InvalidAmount = 2001,
    InsufficientStake = 2002,
}

impl From<StakingError> for ProtocolError {
    fn from(err: StakingError) -> Self {
        match err {
            StakingError::InvalidAmount => ProtocolError::InvalidArgument,
            StakingError::InsufficientStake => ProtocolError::InsufficientStake,
        }
    }
}

/// A user's stake record. Created on first stake, zeroed on full unstake,
/// never deleted.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct StakeInfo {
    pub amount: i128,
    pub last_stake_time: u64,
}

/// Storage helper for stakes
pub struct StakingStorage;

impl StakingStorage {
    fn stake_key(account: &Address) -> (Symbol, Address) {
        (Symbol::short("stake"), account.clone())
    }
    fn total_key() -> Symbol {
        Symbol::short("tot_stake")
    }

    pub fn save(env: &Env, account: &Address, info: &StakeInfo) {
        env.storage().persistent().set(&Self::stake_key(account), info);
    }

    pub fn get(env: &Env, account: &Address) -> Option<StakeInfo> {
        env.storage().persistent().get(&Self::stake_key(account))
    }

    pub fn get_total_staked(env: &Env) -> i128 {
        env.storage()
            .instance()
            .get(&Self::total_key())
            .unwrap_or(0)
    }

    pub fn set_total_staked(env: &Env, total: i128) {
        env.storage().instance().set(&Self::total_key(), &total);
    }
}

/// Staking ledger implementation
pub struct StakingModule;

impl StakingModule {
    /// One reward period: 30 days
    pub const REWARD_PERIOD_SECS: u64 = 30 * 24 * 60 * 60;
    /// 1% of the stake per completed period
    pub const REWARD_RATE_PERCENT: i128 = 1;

    /// Pull `amount` from the caller into contract custody and restart the
    /// reward clock.
    pub fn stake(
        env: &Env,
        caller: &Address,
        token: &Address,
        amount: i128,
    ) -> Result<(), ProtocolError> {
        if amount <= 0 {
            return Err(StakingError::InvalidAmount.into());
        }

        let client = token::TokenClient::new(env, token);
        client.transfer(caller, &env.current_contract_address(), &amount);

        let mut info = StakingStorage::get(env, caller).unwrap_or(StakeInfo {
            amount: 0,
            last_stake_time: 0,
        });
        info.amount += amount;
        info.last_stake_time = env.ledger().timestamp();
        StakingStorage::save(env, caller, &info);

        StakingStorage::set_total_staked(env, StakingStorage::get_total_staked(env) + amount);

        ProtocolEvent::Staked(caller.clone(), amount).emit(env);
        Ok(())
    }

    /// Push `amount` back to the caller. The record is zeroed on a full
    /// withdrawal, not removed.
    pub fn unstake(
        env: &Env,
        caller: &Address,
        token: &Address,
        amount: i128,
    ) -> Result<(), ProtocolError> {
        if amount <= 0 {
            return Err(StakingError::InvalidAmount.into());
        }
        let mut info = match StakingStorage::get(env, caller) {
            Some(info) if info.amount >= amount => info,
            _ => return Err(StakingError::InsufficientStake.into()),
        };

        info.amount -= amount;
        StakingStorage::save(env, caller, &info);
        StakingStorage::set_total_staked(env, StakingStorage::get_total_staked(env) - amount);

        let client = token::TokenClient::new(env, token);
        client.transfer(&env.current_contract_address(), caller, &amount);

        ProtocolEvent::Unstaked(caller.clone(), amount).emit(env);
        Ok(())
    }

    /// Pay 1% of the stake per completed 30-day period since the last stake.
    /// Partial periods pay nothing. `last_stake_time` is deliberately left
    /// untouched: repeated claims recompute the same elapsed duration.
    pub fn claim_rewards(
        env: &Env,
        caller: &Address,
        token: &Address,
    ) -> Result<i128, ProtocolError> {
        let info = match StakingStorage::get(env, caller) {
            Some(info) if info.amount > 0 => info,
            _ => return Err(StakingError::InsufficientStake.into()),
        };

        let elapsed = env.ledger().timestamp() - info.last_stake_time;
        let periods = (elapsed / Self::REWARD_PERIOD_SECS) as i128;
        let reward = info.amount * periods * Self::REWARD_RATE_PERCENT / 100;

        if reward > 0 {
            let client = token::TokenClient::new(env, token);
            client.transfer(&env.current_contract_address(), caller, &reward);
        }

        ProtocolEvent::RewardClaimed(caller.clone(), reward).emit(env);
        Ok(reward)
    }

    /// Reduce an account's stake, clamped so it never goes below zero.
    /// No external entry point reaches this; it is the hook a future
    /// misbehavior path would call.
    pub(crate) fn slash(env: &Env, account: &Address, amount: i128) -> i128 {
        let mut info = match StakingStorage::get(env, account) {
            Some(info) => info,
            None => return 0,
        };
        let slashed = amount.min(info.amount).max(0);
        if slashed == 0 {
            return 0;
        }
        info.amount -= slashed;
        StakingStorage::save(env, account, &info);
        StakingStorage::set_total_staked(env, StakingStorage::get_total_staked(env) - slashed);

        ProtocolEvent::Slashed(account.clone(), slashed).emit(env);
        slashed
    }
}
