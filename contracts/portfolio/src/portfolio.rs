//! Portfolio registry for the portfolio manager
//! Owns per-account portfolios and their asset sequences: valuation,
//! rebalancing, risk checks, fee application and withdrawal.

use crate::oracle::PriceFeeds;
use crate::{ProtocolError, ProtocolEvent};
use soroban_sdk::{contracterror, contracttype, token, Address, Env, Symbol, Vec};

/// Portfolio-specific errors
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum PortfolioError {
    PortfolioExists = 1001,
    NotOwner = 1002,
    AssetNotFound = 1003,
    InsufficientBalance = 1004,
    NothingToWithdraw = 1005,
    LengthMismatch = 1006,
    InvalidConfig = 1007,
}

impl From<PortfolioError> for ProtocolError {
    fn from(err: PortfolioError) -> Self {
        match err {
            PortfolioError::PortfolioExists => ProtocolError::AlreadyExists,
            PortfolioError::NotOwner => ProtocolError::NotOwner,
            PortfolioError::AssetNotFound => ProtocolError::AssetNotFound,
            PortfolioError::InsufficientBalance => ProtocolError::InsufficientBalance,
            PortfolioError::NothingToWithdraw => ProtocolError::NothingToWithdraw,
            PortfolioError::LengthMismatch => ProtocolError::InvalidArgument,
            PortfolioError::InvalidConfig => ProtocolError::InvalidArgument,
        }
    }
}

/// A named holding inside a portfolio. `value` is tracked independently of
/// `amount`; only oracle refreshes tie the two together.
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Asset {
    pub symbol: Symbol,
    pub amount: i128,
    pub value: i128,
}

/// A user's portfolio record
#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Portfolio {
    /// The owner, set at creation and immutable afterward
    pub owner: Address,
    /// Sum of asset values, maintained by every asset and fee operation
    pub total_value: i128,
    /// Fixed share supply minted at creation
    pub total_shares: i128,
    /// Append-only asset sequence; entries are edited in place, never removed
    pub assets: Vec<Asset>,
    /// Durable valuation log; no current operation reads it
    pub historical_values: Vec<i128>,
    pub last_update: u64,
    /// Risk band, defaults to the full range
    pub min_value_threshold: i128,
    pub max_value_threshold: i128,
    /// Fee rates as percent of 100
    pub management_fee_rate: i128,
    pub performance_fee_rate: i128,
    pub risk_score: u32,
}

impl Portfolio {
    /// Share supply fixed for every portfolio at creation
    pub const TOTAL_SHARES: i128 = 1_000_000;

    pub fn new(env: &Env, owner: Address) -> Self {
        Self {
            owner,
            total_value: 0,
            total_shares: Self::TOTAL_SHARES,
            assets: Vec::new(env),
            historical_values: Vec::new(env),
            last_update: env.ledger().timestamp(),
            min_value_threshold: 0,
            max_value_threshold: i128::MAX,
            management_fee_rate: 0,
            performance_fee_rate: 0,
            risk_score: 0,
        }
    }
}

/// Storage helper for portfolios
pub struct PortfolioStorage;

impl PortfolioStorage {
    fn key(owner: &Address) -> (Symbol, Address) {
        (Symbol::short("portfolio"), owner.clone())
    }

    pub fn save(env: &Env, portfolio: &Portfolio) {
        env.storage()
            .persistent()
            .set(&Self::key(&portfolio.owner), portfolio);
    }

    pub fn get(env: &Env, owner: &Address) -> Option<Portfolio> {
        env.storage().persistent().get(&Self::key(owner))
    }
}

/// Portfolio registry implementation
pub struct PortfolioModule;

impl PortfolioModule {
    /// Create a portfolio for `owner`. One per account, never deleted.
    pub fn create_portfolio(env: &Env, owner: &Address) -> Result<(), ProtocolError> {
        if PortfolioStorage::get(env, owner).is_some() {
            return Err(PortfolioError::PortfolioExists.into());
        }
        let portfolio = Portfolio::new(env, owner.clone());
        PortfolioStorage::save(env, &portfolio);
        Ok(())
    }

    /// Load the caller's portfolio. A missing portfolio fails the same way a
    /// foreign one does.
    fn load_owned(env: &Env, owner: &Address) -> Result<Portfolio, ProtocolError> {
        let portfolio =
            PortfolioStorage::get(env, owner).ok_or(PortfolioError::NotOwner)?;
        if &portfolio.owner != owner {
            return Err(PortfolioError::NotOwner.into());
        }
        Ok(portfolio)
    }

    /// First asset whose symbol matches; duplicates are shadowed.
    fn find_asset(portfolio: &Portfolio, symbol: &Symbol) -> Option<u32> {
        for (i, asset) in portfolio.assets.iter().enumerate() {
            if &asset.symbol == symbol {
                return Some(i as u32);
            }
        }
        None
    }

    /// Append an asset and fold its value into the total. Duplicate symbols
    /// are not rejected; later lookups return the first match.
    pub fn add_asset(
        env: &Env,
        owner: &Address,
        symbol: Symbol,
        amount: i128,
        value: i128,
    ) -> Result<(), ProtocolError> {
        if amount < 0 || value < 0 {
            return Err(ProtocolError::InvalidArgument);
        }
        let mut portfolio = Self::load_owned(env, owner)?;
        portfolio.assets.push_back(Asset {
            symbol,
            amount,
            value,
        });
        portfolio.total_value += value;
        portfolio.last_update = env.ledger().timestamp();
        PortfolioStorage::save(env, &portfolio);
        Ok(())
    }

    /// Revalue one asset from its bound oracle and fold the delta into the
    /// total. Returns the new value.
    pub fn refresh_asset_value(
        env: &Env,
        owner: &Address,
        symbol: Symbol,
    ) -> Result<i128, ProtocolError> {
        let mut portfolio = Self::load_owned(env, owner)?;
        let index =
            Self::find_asset(&portfolio, &symbol).ok_or(PortfolioError::AssetNotFound)?;
        let mut asset = portfolio.assets.get_unchecked(index);

        let price = PriceFeeds::latest_price(env, &symbol)?;
        let old_value = asset.value;
        let new_value = price * asset.amount;

        asset.value = new_value;
        portfolio.assets.set(index, asset);
        portfolio.total_value += new_value - old_value;
        portfolio.last_update = env.ledger().timestamp();
        PortfolioStorage::save(env, &portfolio);

        ProtocolEvent::AssetValueUpdated(owner.clone(), symbol, old_value, new_value).emit(env);
        Ok(new_value)
    }

    /// Shared withdrawal accounting: reduce the asset at `index` by `amount`
    /// and take the proportional slice of its value out of the asset and the
    /// total. The proportion uses the pre-decrement amount, so withdrawing
    /// the full amount removes the full value.
    fn withdraw_at(portfolio: &mut Portfolio, index: u32, amount: i128) -> i128 {
        let mut asset = portfolio.assets.get_unchecked(index);
        let value_reduction = asset.value * amount / asset.amount;
        asset.amount -= amount;
        asset.value -= value_reduction;
        portfolio.assets.set(index, asset);
        portfolio.total_value -= value_reduction;
        value_reduction
    }

    /// Withdraw `amount` units of the asset named `symbol`, moving the
    /// underlying token from contract custody to `to`.
    pub fn withdraw(
        env: &Env,
        owner: &Address,
        token: &Address,
        to: &Address,
        symbol: Symbol,
        amount: i128,
    ) -> Result<(), ProtocolError> {
        if amount <= 0 {
            return Err(ProtocolError::InvalidArgument);
        }
        let mut portfolio = Self::load_owned(env, owner)?;
        let index =
            Self::find_asset(&portfolio, &symbol).ok_or(PortfolioError::AssetNotFound)?;
        let asset = portfolio.assets.get_unchecked(index);
        if asset.amount < amount {
            return Err(PortfolioError::InsufficientBalance.into());
        }

        let value_reduction = Self::withdraw_at(&mut portfolio, index, amount);
        portfolio.last_update = env.ledger().timestamp();
        PortfolioStorage::save(env, &portfolio);

        let client = token::TokenClient::new(env, token);
        client.transfer(&env.current_contract_address(), to, &amount);

        ProtocolEvent::Withdrawal(owner.clone(), symbol, amount, value_reduction).emit(env);
        Ok(())
    }

    /// Withdraw every listed position in full, back to the owner. The asset
    /// at index `i` is paired with `asset_tokens[i]`; keeping that pairing
    /// correct is the caller's responsibility. Each position goes through the
    /// same proportional accounting as `withdraw`, so the asset's value is
    /// removed from the total as well.
    pub fn emergency_withdraw_all(
        env: &Env,
        owner: &Address,
        asset_tokens: &Vec<Address>,
    ) -> Result<(), ProtocolError> {
        let mut portfolio = Self::load_owned(env, owner)?;
        if asset_tokens.len() > portfolio.assets.len() {
            return Err(PortfolioError::LengthMismatch.into());
        }

        let client_from = env.current_contract_address();
        for (i, token_addr) in asset_tokens.iter().enumerate() {
            let index = i as u32;
            let asset = portfolio.assets.get_unchecked(index);
            let amount = asset.amount;
            if amount == 0 {
                return Err(PortfolioError::NothingToWithdraw.into());
            }

            Self::withdraw_at(&mut portfolio, index, amount);

            let client = token::TokenClient::new(env, &token_addr);
            client.transfer(&client_from, owner, &amount);

            ProtocolEvent::EmergencyWithdrawal(owner.clone(), index, amount).emit(env);
        }

        portfolio.last_update = env.ledger().timestamp();
        PortfolioStorage::save(env, &portfolio);
        Ok(())
    }

    /// Reset each listed asset's value to `ratio` percent of the total value
    /// captured once at entry. Ratios are not validated to sum to 100, and
    /// assets left out of the call make the stored total diverge from the
    /// sum of asset values until the next refresh.
    pub fn rebalance(
        env: &Env,
        owner: &Address,
        symbols: &Vec<Symbol>,
        target_ratios: &Vec<i128>,
    ) -> Result<(), ProtocolError> {
        if symbols.len() != target_ratios.len() {
            return Err(PortfolioError::LengthMismatch.into());
        }
        let mut portfolio = Self::load_owned(env, owner)?;
        let snapshot = portfolio.total_value;

        for (symbol, ratio) in symbols.iter().zip(target_ratios.iter()) {
            let index = Self::find_asset(&portfolio, &symbol)
                .ok_or(PortfolioError::AssetNotFound)?;
            let mut asset = portfolio.assets.get_unchecked(index);
            asset.value = snapshot * ratio / 100;
            portfolio.assets.set(index, asset);
        }

        portfolio.last_update = env.ledger().timestamp();
        PortfolioStorage::save(env, &portfolio);

        ProtocolEvent::Rebalanced(owner.clone(), symbols.len()).emit(env);
        Ok(())
    }

    /// Whether the total value lies inside the configured risk band
    pub fn check_risk(env: &Env, owner: &Address) -> Result<bool, ProtocolError> {
        let portfolio = Self::load_owned(env, owner)?;
        Ok(portfolio.min_value_threshold <= portfolio.total_value
            && portfolio.total_value <= portfolio.max_value_threshold)
    }

    /// Deduct management and performance fees from the recorded valuation.
    /// Crossing `bonus_threshold` adds a flat 5% of the total to the
    /// performance fee. The collected amounts are not transferred anywhere;
    /// they only reduce the recorded total.
    pub fn apply_dynamic_fees(
        env: &Env,
        owner: &Address,
        bonus_threshold: i128,
    ) -> Result<(), ProtocolError> {
        let mut portfolio = Self::load_owned(env, owner)?;

        let management_fee = portfolio.total_value * portfolio.management_fee_rate / 100;
        let mut performance_fee = portfolio.total_value * portfolio.performance_fee_rate / 100;
        if portfolio.total_value > bonus_threshold {
            performance_fee += portfolio.total_value * 5 / 100;
        }

        portfolio.total_value -= management_fee + performance_fee;
        portfolio.last_update = env.ledger().timestamp();
        PortfolioStorage::save(env, &portfolio);

        ProtocolEvent::FeesApplied(owner.clone(), management_fee, performance_fee).emit(env);
        Ok(())
    }

    /// Set the portfolio's fee rates, percent of 100
    pub fn set_fee_rates(
        env: &Env,
        owner: &Address,
        management: i128,
        performance: i128,
    ) -> Result<(), ProtocolError> {
        if !(0..=100).contains(&management) || !(0..=100).contains(&performance) {
            return Err(PortfolioError::InvalidConfig.into());
        }
        let mut portfolio = Self::load_owned(env, owner)?;
        portfolio.management_fee_rate = management;
        portfolio.performance_fee_rate = performance;
        PortfolioStorage::save(env, &portfolio);
        Ok(())
    }

    /// Set the portfolio's risk band
    pub fn set_risk_thresholds(
        env: &Env,
        owner: &Address,
        min: i128,
        max: i128,
    ) -> Result<(), ProtocolError> {
        if min < 0 || min > max {
            return Err(PortfolioError::InvalidConfig.into());
        }
        let mut portfolio = Self::load_owned(env, owner)?;
        portfolio.min_value_threshold = min;
        portfolio.max_value_threshold = max;
        PortfolioStorage::save(env, &portfolio);
        Ok(())
    }
}
