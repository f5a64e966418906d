use anyhow::Result;
use radar_db::Database;
use radar_db::models::InvestmentRow;
use radar_types::models::VoterMembership;
use thiserror::Error;

/// Server-side half of the like protocol: a per-entry counter that only
/// moves through atomic increment/decrement.
pub trait CounterStore {
    type Entry;

    fn increment(&self, entry_id: i64) -> Result<Option<Self::Entry>>;
    fn decrement(&self, entry_id: i64) -> Result<Option<Self::Entry>>;
    fn current(&self, entry_id: i64) -> Result<Option<Self::Entry>>;
}

impl CounterStore for Database {
    type Entry = InvestmentRow;

    fn increment(&self, entry_id: i64) -> Result<Option<InvestmentRow>> {
        self.increment_likes(entry_id)
    }

    fn decrement(&self, entry_id: i64) -> Result<Option<InvestmentRow>> {
        self.decrement_likes(entry_id)
    }

    fn current(&self, entry_id: i64) -> Result<Option<InvestmentRow>> {
        self.get_investment(entry_id)
    }
}

#[derive(Debug, Error)]
pub enum VoteError {
    #[error("voter already likes investment {0}")]
    AlreadyVoted(i64),

    #[error("voter does not like investment {0}")]
    NotVoted(i64),

    #[error("investment {0} not found")]
    NotFound(i64),

    #[error("storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Applies like/unlike against a counter store using the voter's own
/// membership set.
///
/// The membership is owned by the client, so at-most-one-like per voter is
/// only as strong as the client's honesty: clearing the set allows voting
/// again. The membership is updated only after the counter update succeeded,
/// so a failed call leaves both sides untouched.
pub struct VoteLedger<'a, S> {
    store: &'a S,
}

impl<'a, S: CounterStore> VoteLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn has_voted(&self, membership: &VoterMembership, entry_id: i64) -> bool {
        membership.has_voted(entry_id)
    }

    pub fn cast(&self, membership: &mut VoterMembership, entry_id: i64) -> Result<S::Entry, VoteError> {
        if membership.has_voted(entry_id) {
            return Err(VoteError::AlreadyVoted(entry_id));
        }

        let entry = self
            .store
            .increment(entry_id)?
            .ok_or(VoteError::NotFound(entry_id))?;
        membership.remember(entry_id);
        Ok(entry)
    }

    pub fn retract(&self, membership: &mut VoterMembership, entry_id: i64) -> Result<S::Entry, VoteError> {
        if !membership.has_voted(entry_id) {
            return Err(VoteError::NotVoted(entry_id));
        }

        let entry = self
            .store
            .decrement(entry_id)?
            .ok_or(VoteError::NotFound(entry_id))?;
        membership.forget(entry_id);
        Ok(entry)
    }

    /// Cast or retract depending on current membership.
    /// Returns the updated entry and whether the voter now likes it.
    pub fn toggle(&self, membership: &mut VoterMembership, entry_id: i64) -> Result<(S::Entry, bool), VoteError> {
        if membership.has_voted(entry_id) {
            Ok((self.retract(membership, entry_id)?, false))
        } else {
            Ok((self.cast(membership, entry_id)?, true))
        }
    }

    /// Entry as currently stored, for answering a request whose precondition
    /// was already satisfied.
    pub fn current(&self, entry_id: i64) -> Result<S::Entry, VoteError> {
        self.store
            .current(entry_id)?
            .ok_or(VoteError::NotFound(entry_id))
    }

    /// `cast`, treating an existing like as already-consistent state.
    pub fn cast_idempotent(&self, membership: &mut VoterMembership, entry_id: i64) -> Result<S::Entry, VoteError> {
        match self.cast(membership, entry_id) {
            Err(VoteError::AlreadyVoted(_)) => self.current(entry_id),
            other => other,
        }
    }

    /// `retract`, treating a missing like as already-consistent state.
    pub fn retract_idempotent(&self, membership: &mut VoterMembership, entry_id: i64) -> Result<S::Entry, VoteError> {
        match self.retract(membership, entry_id) {
            Err(VoteError::NotVoted(_)) => self.current(entry_id),
            other => other,
        }
    }
}
