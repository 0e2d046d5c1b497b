use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::LotteryError;
use crate::state::RoundPhase;

/// Ordered entries of the current round. A participant entering twice holds two entries.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryLedger {
    entries: Vec<Pubkey>,
}

impl EntryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry; only an `Open` round accepts them.
    pub fn append(&mut self, phase: RoundPhase, participant: Pubkey) -> Result<(), LotteryError> {
        if phase != RoundPhase::Open {
            return Err(LotteryError::WrongPhase);
        }
        self.entries.push(participant);
        Ok(())
    }

    pub fn snapshot(&self) -> EntrySnapshot {
        EntrySnapshot {
            entries: self.entries.clone(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn at(&self, index: usize) -> Result<Pubkey, LotteryError> {
        self.entries
            .get(index)
            .copied()
            .ok_or(LotteryError::IndexOutOfRange)
    }

    pub fn entries(&self) -> &[Pubkey] {
        &self.entries
    }
}

/// Frozen copy of the ledger taken when randomness is requested
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntrySnapshot {
    entries: Vec<Pubkey>,
}

impl EntrySnapshot {
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn at(&self, index: usize) -> Result<Pubkey, LotteryError> {
        self.entries
            .get(index)
            .copied()
            .ok_or(LotteryError::IndexOutOfRange)
    }

    pub fn entries(&self) -> &[Pubkey] {
        &self.entries
    }
}
