//! Token-weighted governance with time-boxed voting.
//! Proposals are append-only and indexed by creation order. Voting weight is
//! caller-supplied, not derived from any balance, and no entry point
//! transitions a proposal to executed.

use crate::{ProtocolError, ProtocolEvent};
use soroban_sdk::{contracttype, Address, Env, Map, String, Symbol};

#[derive(Clone, Debug, Eq, PartialEq)]
#[contracttype]
pub struct Proposal {
    pub description: String,
    pub vote_count: i128,
    pub executed: bool,
    pub created_at: u64,
    pub voting_deadline: u64,
}

pub struct GovStorage;

impl GovStorage {
    fn proposals_key() -> Symbol {
        Symbol::short("proposals")
    }
    fn count_key() -> Symbol {
        Symbol::short("prop_cnt")
    }
    fn total_votes_key() -> Symbol {
        Symbol::short("tot_votes")
    }

    fn proposals(env: &Env) -> Map<u32, Proposal> {
        env.storage()
            .instance()
            .get(&Self::proposals_key())
            .unwrap_or_else(|| Map::new(env))
    }

    /// Reserve the next id in creation order, starting at 0
    pub fn next_id(env: &Env) -> u32 {
        let id: u32 = env.storage().instance().get(&Self::count_key()).unwrap_or(0);
        env.storage().instance().set(&Self::count_key(), &(id + 1));
        id
    }

    pub fn save_proposal(env: &Env, id: u32, proposal: &Proposal) {
        let mut map = Self::proposals(env);
        map.set(id, proposal.clone());
        env.storage().instance().set(&Self::proposals_key(), &map);
    }

    pub fn get_proposal(env: &Env, id: u32) -> Option<Proposal> {
        Self::proposals(env).get(id)
    }

    pub fn get_total_votes(env: &Env) -> i128 {
        env.storage()
            .instance()
            .get(&Self::total_votes_key())
            .unwrap_or(0)
    }

    pub fn set_total_votes(env: &Env, total: i128) {
        env.storage().instance().set(&Self::total_votes_key(), &total);
    }
}

pub struct GovernanceModule;

impl GovernanceModule {
    /// Append a proposal open for `voting_period` seconds. Any caller may
    /// propose.
    pub fn create_proposal(
        env: &Env,
        proposer: &Address,
        description: String,
        voting_period: u64,
    ) -> Result<u32, ProtocolError> {
        if voting_period == 0 {
            return Err(ProtocolError::InvalidArgument);
        }
        let now = env.ledger().timestamp();
        let id = GovStorage::next_id(env);
        let proposal = Proposal {
            description,
            vote_count: 0,
            executed: false,
            created_at: now,
            voting_deadline: now + voting_period,
        };
        GovStorage::save_proposal(env, id, &proposal);

        ProtocolEvent::ProposalCreated(id, proposer.clone(), proposal.voting_deadline).emit(env);
        Ok(id)
    }

    /// Add `votes` to an open proposal. Closed the instant the deadline is
    /// reached: a vote at exactly the deadline fails.
    pub fn vote(
        env: &Env,
        voter: &Address,
        proposal_id: u32,
        votes: i128,
    ) -> Result<(), ProtocolError> {
        let mut proposal =
            GovStorage::get_proposal(env, proposal_id).ok_or(ProtocolError::ProposalNotFound)?;
        if proposal.executed {
            return Err(ProtocolError::AlreadyExecuted);
        }
        if env.ledger().timestamp() >= proposal.voting_deadline {
            return Err(ProtocolError::VotingClosed);
        }
        if votes <= 0 {
            return Err(ProtocolError::InvalidArgument);
        }

        proposal.vote_count += votes;
        GovStorage::save_proposal(env, proposal_id, &proposal);
        GovStorage::set_total_votes(env, GovStorage::get_total_votes(env) + votes);

        ProtocolEvent::VoteCast(voter.clone(), proposal_id, votes).emit(env);
        Ok(())
    }

    pub fn get_proposal(env: &Env, proposal_id: u32) -> Option<Proposal> {
        GovStorage::get_proposal(env, proposal_id)
    }

    pub fn get_total_votes(env: &Env) -> i128 {
        GovStorage::get_total_votes(env)
    }
}
