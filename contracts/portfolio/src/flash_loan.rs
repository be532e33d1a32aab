//! Single-call flash loans against contract custody.
//!
//! Repayment is verified as a balance snapshot, not a pulled transfer: after
//! disbursement the borrower's balance must cover amount plus fee, but
//! nothing forces the funds back into custody. A failing check aborts the
//! whole transition, disbursement included (host rollback).

use crate::{ProtocolConfig, ProtocolError, ProtocolEvent};
use soroban_sdk::{token, Address, Env};

pub struct FlashLoanModule;

impl FlashLoanModule {
    /// Disburse `amount`, then require the borrower's balance to cover
    /// amount plus fee. Returns the fee.
    pub fn flash_loan(
        env: &Env,
        caller: &Address,
        token: &Address,
        amount: i128,
    ) -> Result<i128, ProtocolError> {
        if amount <= 0 {
            return Err(ProtocolError::InvalidArgument);
        }

        let client = token::TokenClient::new(env, token);
        let custody = env.current_contract_address();
        if client.balance(&custody) < amount {
            return Err(ProtocolError::InsufficientBalance);
        }

        let fee = amount * ProtocolConfig::get_flash_loan_fee_bps(env) / 10_000;

        // Phase 1: disburse
        client.transfer(&custody, caller, &amount);

        // Phase 2: verify repayment by balance snapshot
        if client.balance(caller) < amount + fee {
            return Err(ProtocolError::RepaymentFailed);
        }

        ProtocolEvent::FlashLoan(caller.clone(), amount, fee).emit(env);
        Ok(fee)
    }
}
