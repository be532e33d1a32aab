//! One-directional, write-once referral edges. No reward issuance is wired
//! to a referral in this contract.

use crate::{ProtocolError, ProtocolEvent};
use soroban_sdk::{Address, Env, Symbol};

pub struct ReferralStorage;

impl ReferralStorage {
    fn key(account: &Address) -> (Symbol, Address) {
        (Symbol::short("referrer"), account.clone())
    }

    pub fn has(env: &Env, account: &Address) -> bool {
        env.storage().persistent().has(&Self::key(account))
    }

    pub fn set(env: &Env, account: &Address, referrer: &Address) {
        env.storage().persistent().set(&Self::key(account), referrer);
    }

    pub fn get(env: &Env, account: &Address) -> Option<Address> {
        env.storage().persistent().get(&Self::key(account))
    }
}

pub struct ReferralModule;

impl ReferralModule {
    /// Record `caller` as the referrer of `new_user`, once
    pub fn refer(env: &Env, caller: &Address, new_user: &Address) -> Result<(), ProtocolError> {
        if ReferralStorage::has(env, new_user) {
            return Err(ProtocolError::AlreadyExists);
        }
        ReferralStorage::set(env, new_user, caller);

        ProtocolEvent::ReferralRecorded(caller.clone(), new_user.clone()).emit(env);
        Ok(())
    }

    pub fn get_referrer(env: &Env, account: &Address) -> Option<Address> {
        ReferralStorage::get(env, account)
    }
}
