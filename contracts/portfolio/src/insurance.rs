//! Insurance pool: one policy per account, replaced wholesale on purchase,
//! deactivated (not deleted) on claim. The only claim eligibility check is
//! that the policy is active; any active policy pays full coverage
//! immediately.

use crate::portfolio::PortfolioStorage;
use crate::{ProtocolError, ProtocolEvent};
use soroban_sdk::{contracttype, token, Address, Env, Symbol};

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct InsurancePolicy {
    pub is_active: bool,
    pub coverage_amount: i128,
    pub premium_paid: i128,
    pub start_date: u64,
}

pub struct InsuranceStorage;

impl InsuranceStorage {
    fn key(account: &Address) -> (Symbol, Address) {
        (Symbol::short("policy"), account.clone())
    }

    pub fn save(env: &Env, account: &Address, policy: &InsurancePolicy) {
        env.storage().persistent().set(&Self::key(account), policy);
    }

    pub fn get(env: &Env, account: &Address) -> Option<InsurancePolicy> {
        env.storage().persistent().get(&Self::key(account))
    }
}

pub struct InsuranceModule;

impl InsuranceModule {
    /// Coverage-to-premium ratio: premium must equal coverage / 100 exactly
    pub const PREMIUM_DIVISOR: i128 = 100;

    /// Purchase a policy, overwriting any existing one. Requires an
    /// initialized portfolio and an exact premium. The premium is recorded
    /// but not transferred; the purchase signature carries no ledger.
    pub fn buy_insurance(
        env: &Env,
        caller: &Address,
        coverage_amount: i128,
        premium: i128,
    ) -> Result<(), ProtocolError> {
        if PortfolioStorage::get(env, caller).is_none() {
            return Err(ProtocolError::NotOwner);
        }
        if coverage_amount <= 0 || premium != coverage_amount / Self::PREMIUM_DIVISOR {
            return Err(ProtocolError::InvalidArgument);
        }

        let policy = InsurancePolicy {
            is_active: true,
            coverage_amount,
            premium_paid: premium,
            start_date: env.ledger().timestamp(),
        };
        InsuranceStorage::save(env, caller, &policy);

        ProtocolEvent::InsurancePurchased(caller.clone(), coverage_amount, premium).emit(env);
        Ok(())
    }

    /// Deactivate the caller's policy and pay its full coverage from
    /// contract custody.
    pub fn claim_insurance(
        env: &Env,
        caller: &Address,
        token: &Address,
    ) -> Result<(), ProtocolError> {
        let mut policy = match InsuranceStorage::get(env, caller) {
            Some(policy) if policy.is_active => policy,
            _ => return Err(ProtocolError::PolicyNotActive),
        };

        policy.is_active = false;
        InsuranceStorage::save(env, caller, &policy);

        let client = token::TokenClient::new(env, token);
        client.transfer(
            &env.current_contract_address(),
            caller,
            &policy.coverage_amount,
        );

        ProtocolEvent::InsuranceClaimed(caller.clone(), policy.coverage_amount).emit(env);
        Ok(())
    }

    pub fn get_policy(env: &Env, account: &Address) -> Option<InsurancePolicy> {
        InsuranceStorage::get(env, account)
    }
}
