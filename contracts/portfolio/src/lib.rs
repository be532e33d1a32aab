//! Portfolio Manager Soroban Smart Contract
//
//! An account-keyed ledger of investment portfolios with oracle-priced
//! valuation, plus staking, flash-loan, governance, insurance and referral
//! subsystems layered on the same storage.

#![no_std]
use soroban_sdk::{
    contract, contracterror, contractimpl, Address, Env, String, Symbol, Vec,
};

mod flash_loan;
mod governance;
mod insurance;
mod oracle;
mod portfolio;
mod referral;
mod staking;

pub use flash_loan::FlashLoanModule;
pub use governance::{GovernanceModule, Proposal};
pub use insurance::{InsuranceModule, InsurancePolicy};
pub use oracle::{PriceFeedStorage, PriceFeeds};
pub use portfolio::{Asset, Portfolio, PortfolioModule, PortfolioStorage};
pub use referral::ReferralModule;
pub use staking::{StakeInfo, StakingModule, StakingStorage};

/// The main contract struct for the portfolio manager
#[contract]
pub struct PortfolioManager;

/// Custom error type for protocol errors
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ProtocolError {
    AlreadyInitialized = 1,
    NotInitialized = 2,
    NotAdmin = 3,
    NotOwner = 4,
    AlreadyExists = 5,
    AlreadyBound = 6,
    AssetNotFound = 7,
    NoOracle = 8,
    InvalidPrice = 9,
    InsufficientBalance = 10,
    InsufficientStake = 11,
    NothingToWithdraw = 12,
    RepaymentFailed = 13,
    ProposalNotFound = 14,
    VotingClosed = 15,
    AlreadyExecuted = 16,
    PolicyNotActive = 17,
    InvalidArgument = 18,
}

/// Protocol configuration and admin management
pub struct ProtocolConfig;

impl ProtocolConfig {
    /// Storage key for admin address
    fn admin_key() -> Symbol {
        Symbol::short("admin")
    }
    /// Storage key for the flash-loan fee (basis points)
    fn flash_fee_key() -> Symbol {
        Symbol::short("flash_bps")
    }

    /// Default flash-loan fee: 5% of the borrowed amount
    pub const DEFAULT_FLASH_LOAN_FEE_BPS: i128 = 500;

    pub fn is_initialized(env: &Env) -> bool {
        env.storage().instance().has(&Self::admin_key())
    }

    /// Set the admin address (only callable once)
    pub fn set_admin(env: &Env, admin: &Address) -> Result<(), ProtocolError> {
        if Self::is_initialized(env) {
            return Err(ProtocolError::AlreadyInitialized);
        }
        env.storage().instance().set(&Self::admin_key(), admin);
        Ok(())
    }

    /// Get the admin address
    pub fn get_admin(env: &Env) -> Result<Address, ProtocolError> {
        env.storage()
            .instance()
            .get::<Symbol, Address>(&Self::admin_key())
            .ok_or(ProtocolError::NotInitialized)
    }

    /// Require that the caller is admin
    pub fn require_admin(env: &Env, caller: &Address) -> Result<(), ProtocolError> {
        let admin = Self::get_admin(env)?;
        if &admin != caller {
            return Err(ProtocolError::NotAdmin);
        }
        Ok(())
    }

    /// Set the flash-loan fee. Only called during initialization; there is no
    /// later setter, the fee is fixed at construction.
    pub fn set_flash_loan_fee_bps(env: &Env, fee_bps: i128) {
        env.storage().instance().set(&Self::flash_fee_key(), &fee_bps);
    }

    pub fn get_flash_loan_fee_bps(env: &Env) -> i128 {
        env.storage()
            .instance()
            .get::<Symbol, i128>(&Self::flash_fee_key())
            .unwrap_or(Self::DEFAULT_FLASH_LOAN_FEE_BPS)
    }
}

/// Event types for protocol actions
pub enum ProtocolEvent {
    /// (owner, symbol, old_value, new_value)
    AssetValueUpdated(Address, Symbol, i128, i128),
    /// (owner, management_fee, performance_fee)
    FeesApplied(Address, i128, i128),
    /// (owner, symbol, amount, value_reduction)
    Withdrawal(Address, Symbol, i128, i128),
    /// (owner, asset_index, amount)
    EmergencyWithdrawal(Address, u32, i128),
    /// (owner, assets_rebalanced)
    Rebalanced(Address, u32),
    /// (staker, amount)
    Staked(Address, i128),
    /// (staker, amount)
    Unstaked(Address, i128),
    /// (staker, reward)
    RewardClaimed(Address, i128),
    /// (account, amount)
    Slashed(Address, i128),
    /// (borrower, amount, fee)
    FlashLoan(Address, i128, i128),
    /// (proposal_id, proposer, voting_deadline)
    ProposalCreated(u32, Address, u64),
    /// (voter, proposal_id, votes)
    VoteCast(Address, u32, i128),
    /// (holder, coverage_amount, premium_paid)
    InsurancePurchased(Address, i128, i128),
    /// (holder, coverage_amount)
    InsuranceClaimed(Address, i128),
    /// (referrer, referred)
    ReferralRecorded(Address, Address),
}

impl ProtocolEvent {
    /// Emit the event using Soroban's event system
    pub fn emit(&self, env: &Env) {
        match self {
            ProtocolEvent::AssetValueUpdated(owner, symbol, old_value, new_value) => {
                env.events().publish(
                    (Symbol::short("val_upd"), owner.clone()),
                    (symbol.clone(), *old_value, *new_value),
                );
            }
            ProtocolEvent::FeesApplied(owner, management, performance) => {
                env.events().publish(
                    (Symbol::short("fees"), owner.clone()),
                    (*management, *performance),
                );
            }
            ProtocolEvent::Withdrawal(owner, symbol, amount, reduction) => {
                env.events().publish(
                    (Symbol::short("withdraw"), owner.clone()),
                    (symbol.clone(), *amount, *reduction),
                );
            }
            ProtocolEvent::EmergencyWithdrawal(owner, index, amount) => {
                env.events().publish(
                    (Symbol::short("emergency"), owner.clone()),
                    (*index, *amount),
                );
            }
            ProtocolEvent::Rebalanced(owner, count) => {
                env.events()
                    .publish((Symbol::short("rebalance"), owner.clone()), *count);
            }
            ProtocolEvent::Staked(staker, amount) => {
                env.events()
                    .publish((Symbol::short("staked"), staker.clone()), *amount);
            }
            ProtocolEvent::Unstaked(staker, amount) => {
                env.events()
                    .publish((Symbol::short("unstaked"), staker.clone()), *amount);
            }
            ProtocolEvent::RewardClaimed(staker, reward) => {
                env.events()
                    .publish((Symbol::short("reward"), staker.clone()), *reward);
            }
            ProtocolEvent::Slashed(account, amount) => {
                env.events()
                    .publish((Symbol::short("slashed"), account.clone()), *amount);
            }
            ProtocolEvent::FlashLoan(borrower, amount, fee) => {
                env.events().publish(
                    (Symbol::short("flash"), borrower.clone()),
                    (*amount, *fee),
                );
            }
            ProtocolEvent::ProposalCreated(id, proposer, deadline) => {
                env.events().publish(
                    (Symbol::short("proposal"), proposer.clone()),
                    (*id, *deadline),
                );
            }
            ProtocolEvent::VoteCast(voter, id, votes) => {
                env.events()
                    .publish((Symbol::short("vote"), voter.clone()), (*id, *votes));
            }
            ProtocolEvent::InsurancePurchased(holder, coverage, premium) => {
                env.events().publish(
                    (Symbol::short("ins_buy"), holder.clone()),
                    (*coverage, *premium),
                );
            }
            ProtocolEvent::InsuranceClaimed(holder, coverage) => {
                env.events()
                    .publish((Symbol::short("ins_claim"), holder.clone()), *coverage);
            }
            ProtocolEvent::ReferralRecorded(referrer, referred) => {
                env.events().publish(
                    (Symbol::short("referral"), referrer.clone()),
                    referred.clone(),
                );
            }
        }
    }
}

#[contractimpl]
impl PortfolioManager {
    /// Initializes the contract, sets the admin and the flash-loan fee.
    /// The fee is fixed here; no later entry point changes it.
    pub fn initialize(
        env: Env,
        admin: Address,
        flash_loan_fee_bps: i128,
    ) -> Result<(), ProtocolError> {
        if flash_loan_fee_bps < 0 {
            return Err(ProtocolError::InvalidArgument);
        }
        ProtocolConfig::set_admin(&env, &admin)?;
        ProtocolConfig::set_flash_loan_fee_bps(&env, flash_loan_fee_bps);
        Ok(())
    }

    // --- Portfolio registry ---

    /// Create the caller's portfolio (one per account, never deleted)
    pub fn create_portfolio(env: Env, owner: Address) -> Result<(), ProtocolError> {
        owner.require_auth();
        PortfolioModule::create_portfolio(&env, &owner)
    }

    /// Append an asset to the caller's portfolio
    pub fn add_asset(
        env: Env,
        owner: Address,
        symbol: Symbol,
        amount: i128,
        value: i128,
    ) -> Result<(), ProtocolError> {
        owner.require_auth();
        PortfolioModule::add_asset(&env, &owner, symbol, amount, value)
    }

    /// Bind a symbol to a price-oracle contract (admin only, one-time)
    pub fn set_price_feed(
        env: Env,
        caller: Address,
        symbol: Symbol,
        oracle: Address,
    ) -> Result<(), ProtocolError> {
        caller.require_auth();
        PriceFeeds::set_price_feed(&env, &caller, symbol, oracle)
    }

    /// Revalue an asset from its bound oracle; returns the new value
    pub fn refresh_asset_value(
        env: Env,
        owner: Address,
        symbol: Symbol,
    ) -> Result<i128, ProtocolError> {
        owner.require_auth();
        PortfolioModule::refresh_asset_value(&env, &owner, symbol)
    }

    /// Withdraw part of an asset, reducing its valuation proportionally
    pub fn withdraw(
        env: Env,
        owner: Address,
        token: Address,
        to: Address,
        symbol: Symbol,
        amount: i128,
    ) -> Result<(), ProtocolError> {
        owner.require_auth();
        PortfolioModule::withdraw(&env, &owner, &token, &to, symbol, amount)
    }

    /// Withdraw every asset in full, positionally paired with `asset_tokens`
    pub fn emergency_withdraw_all(
        env: Env,
        owner: Address,
        asset_tokens: Vec<Address>,
    ) -> Result<(), ProtocolError> {
        owner.require_auth();
        PortfolioModule::emergency_withdraw_all(&env, &owner, &asset_tokens)
    }

    /// Reset asset valuations to target ratios of the current total value
    pub fn rebalance(
        env: Env,
        owner: Address,
        symbols: Vec<Symbol>,
        target_ratios: Vec<i128>,
    ) -> Result<(), ProtocolError> {
        owner.require_auth();
        PortfolioModule::rebalance(&env, &owner, &symbols, &target_ratios)
    }

    /// Whether the portfolio value sits inside its risk band
    pub fn check_risk(env: Env, owner: Address) -> Result<bool, ProtocolError> {
        PortfolioModule::check_risk(&env, &owner)
    }

    /// Deduct management and performance fees from the recorded valuation
    pub fn apply_dynamic_fees(
        env: Env,
        owner: Address,
        bonus_threshold: i128,
    ) -> Result<(), ProtocolError> {
        owner.require_auth();
        PortfolioModule::apply_dynamic_fees(&env, &owner, bonus_threshold)
    }

    /// Configure the portfolio's fee rates (percent of 100)
    pub fn set_fee_rates(
        env: Env,
        owner: Address,
        management: i128,
        performance: i128,
    ) -> Result<(), ProtocolError> {
        owner.require_auth();
        PortfolioModule::set_fee_rates(&env, &owner, management, performance)
    }

    /// Configure the portfolio's risk band
    pub fn set_risk_thresholds(
        env: Env,
        owner: Address,
        min: i128,
        max: i128,
    ) -> Result<(), ProtocolError> {
        owner.require_auth();
        PortfolioModule::set_risk_thresholds(&env, &owner, min, max)
    }

    // --- Staking ledger ---

    /// Stake governance tokens into contract custody
    pub fn stake(
        env: Env,
        caller: Address,
        token: Address,
        amount: i128,
    ) -> Result<(), ProtocolError> {
        caller.require_auth();
        StakingModule::stake(&env, &caller, &token, amount)
    }

    /// Withdraw staked tokens back to the caller
    pub fn unstake(
        env: Env,
        caller: Address,
        token: Address,
        amount: i128,
    ) -> Result<(), ProtocolError> {
        caller.require_auth();
        StakingModule::unstake(&env, &caller, &token, amount)
    }

    /// Pay out 1% of the stake per completed 30-day period; returns the reward
    pub fn claim_rewards(
        env: Env,
        caller: Address,
        token: Address,
    ) -> Result<i128, ProtocolError> {
        caller.require_auth();
        StakingModule::claim_rewards(&env, &caller, &token)
    }

    // --- Flash-loan engine ---

    /// Borrow from contract custody; the whole call aborts unless the
    /// borrower's post-disbursement balance covers amount plus fee.
    /// Returns the fee charged.
    pub fn flash_loan(
        env: Env,
        caller: Address,
        token: Address,
        amount: i128,
    ) -> Result<i128, ProtocolError> {
        caller.require_auth();
        FlashLoanModule::flash_loan(&env, &caller, &token, amount)
    }

    // --- Governance ---

    /// Create a time-boxed proposal; any caller may propose
    pub fn create_proposal(
        env: Env,
        proposer: Address,
        description: String,
        voting_period: u64,
    ) -> Result<u32, ProtocolError> {
        proposer.require_auth();
        GovernanceModule::create_proposal(&env, &proposer, description, voting_period)
    }

    /// Add caller-supplied voting weight to an open proposal
    pub fn vote(
        env: Env,
        voter: Address,
        proposal_id: u32,
        votes: i128,
    ) -> Result<(), ProtocolError> {
        voter.require_auth();
        GovernanceModule::vote(&env, &voter, proposal_id, votes)
    }

    // --- Insurance ---

    /// Purchase a policy; the premium must equal coverage / 100 exactly
    pub fn buy_insurance(
        env: Env,
        caller: Address,
        coverage_amount: i128,
        premium: i128,
    ) -> Result<(), ProtocolError> {
        caller.require_auth();
        InsuranceModule::buy_insurance(&env, &caller, coverage_amount, premium)
    }

    /// Claim an active policy's full coverage from contract custody
    pub fn claim_insurance(
        env: Env,
        caller: Address,
        token: Address,
    ) -> Result<(), ProtocolError> {
        caller.require_auth();
        InsuranceModule::claim_insurance(&env, &caller, &token)
    }

    // --- Referral registry ---

    /// Record the caller as `new_user`'s referrer (write-once)
    pub fn refer(env: Env, caller: Address, new_user: Address) -> Result<(), ProtocolError> {
        caller.require_auth();
        ReferralModule::refer(&env, &caller, &new_user)
    }

    // --- Queries ---

    pub fn get_portfolio(env: Env, owner: Address) -> Option<Portfolio> {
        PortfolioStorage::get(&env, &owner)
    }

    pub fn get_stake(env: Env, account: Address) -> Option<StakeInfo> {
        StakingStorage::get(&env, &account)
    }

    pub fn get_total_staked(env: Env) -> i128 {
        StakingStorage::get_total_staked(&env)
    }

    pub fn get_insurance_policy(env: Env, account: Address) -> Option<InsurancePolicy> {
        InsuranceModule::get_policy(&env, &account)
    }

    pub fn get_price_feed(env: Env, symbol: Symbol) -> Option<Address> {
        PriceFeedStorage::get(&env, &symbol)
    }

    pub fn get_referrer(env: Env, account: Address) -> Option<Address> {
        ReferralModule::get_referrer(&env, &account)
    }

    pub fn get_proposal(env: Env, proposal_id: u32) -> Option<Proposal> {
        GovernanceModule::get_proposal(&env, proposal_id)
    }

    pub fn get_total_votes(env: Env) -> i128 {
        GovernanceModule::get_total_votes(&env)
    }

    pub fn get_flash_loan_fee_bps(env: Env) -> i128 {
        ProtocolConfig::get_flash_loan_fee_bps(&env)
    }
}
