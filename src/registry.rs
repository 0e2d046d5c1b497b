use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::LotteryError;
use crate::ledger::EntrySnapshot;
use crate::state::RequestId;

/// A randomness request awaiting its fulfillment
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub request_id: RequestId,
    pub snapshot: EntrySnapshot,
}

/// A consumed request together with the value the oracle delivered
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FulfilledRequest {
    pub request_id: RequestId,
    pub snapshot: EntrySnapshot,
    pub random_value: u64,
}

/// Single-slot registry of the outstanding randomness request.
///
/// At most one request is ever registered. A fulfillment empties the slot, so
/// replaying it afterwards finds nothing to match.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RandomnessRequestRegistry {
    pending: Option<PendingRequest>,
}

impl RandomnessRequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pending(
        &mut self,
        request_id: RequestId,
        snapshot: EntrySnapshot,
    ) -> Result<(), LotteryError> {
        if self.pending.is_some() {
            return Err(LotteryError::RequestAlreadyOutstanding);
        }
        self.pending = Some(PendingRequest {
            request_id,
            snapshot,
        });
        Ok(())
    }

    /// Consumes the pending request if `request_id` matches it.
    pub fn fulfill(
        &mut self,
        request_id: RequestId,
        random_value: u64,
    ) -> Result<FulfilledRequest, LotteryError> {
        match self.pending.take() {
            Some(pending) if pending.request_id == request_id => Ok(FulfilledRequest {
                request_id: pending.request_id,
                snapshot: pending.snapshot,
                random_value,
            }),
            other => {
                self.pending = other;
                Err(LotteryError::UnknownRequestId)
            }
        }
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub fn is_outstanding(&self) -> bool {
        self.pending.is_some()
    }
}
