//! Price-feed bindings and oracle lookups.
//! The oracle itself is an external contract exposing
//! `latest_price(symbol) -> (i128, bool)`; this module only stores the
//! symbol-to-oracle binding and validates what comes back.

use crate::{ProtocolConfig, ProtocolError};
use soroban_sdk::{vec, Address, Env, IntoVal, Symbol};

pub struct PriceFeedStorage;

impl PriceFeedStorage {
    fn key(symbol: &Symbol) -> (Symbol, Symbol) {
        (Symbol::short("feed"), symbol.clone())
    }

    pub fn has(env: &Env, symbol: &Symbol) -> bool {
        env.storage().instance().has(&Self::key(symbol))
    }

    pub fn set(env: &Env, symbol: &Symbol, oracle: &Address) {
        env.storage().instance().set(&Self::key(symbol), oracle);
    }

    pub fn get(env: &Env, symbol: &Symbol) -> Option<Address> {
        env.storage().instance().get(&Self::key(symbol))
    }
}

pub struct PriceFeeds;

impl PriceFeeds {
    /// Bind `symbol` to an oracle contract. Admin-gated and one-time; a bound
    /// symbol stays bound.
    pub fn set_price_feed(
        env: &Env,
        caller: &Address,
        symbol: Symbol,
        oracle: Address,
    ) -> Result<(), ProtocolError> {
        ProtocolConfig::require_admin(env, caller)?;
        if PriceFeedStorage::has(env, &symbol) {
            return Err(ProtocolError::AlreadyBound);
        }
        PriceFeedStorage::set(env, &symbol, &oracle);
        Ok(())
    }

    /// Fetch the latest price for `symbol` from its bound oracle.
    /// Rejects unbound symbols, invalid readings and non-positive prices.
    pub fn latest_price(env: &Env, symbol: &Symbol) -> Result<i128, ProtocolError> {
        let oracle = PriceFeedStorage::get(env, symbol).ok_or(ProtocolError::NoOracle)?;
        let args = vec![env, symbol.clone().into_val(env)];
        let (price, is_valid): (i128, bool) =
            env.invoke_contract(&oracle, &Symbol::new(env, "latest_price"), args);
        if !is_valid || price <= 0 {
            return Err(ProtocolError::InvalidPrice);
        }
        Ok(price)
    }
}
