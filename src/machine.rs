use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

use crate::error::LotteryError;
use crate::funding::has_sufficient_funding;
use crate::interfaces::{PriceSource, RandomnessOracle};
use crate::ledger::EntryLedger;
use crate::price::{convert_fee_to_native, Price};
use crate::registry::{PendingRequest, RandomnessRequestRegistry};
use crate::state::{RequestId, RoundPhase, WinnerReceipt};

/// Round lifecycle: `Closed -> Open -> Calculating -> Closed`.
///
/// Every operation either succeeds or leaves the state untouched. The only
/// exception is a failed payout during settlement, see
/// [`SettlementEngine`](crate::settlement::SettlementEngine).
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct LotteryStateMachine {
    pub(crate) round_id: u64,
    pub(crate) phase: RoundPhase,
    pub(crate) entry_fee: u64,
    pub(crate) pot: u64,
    pub(crate) ledger: EntryLedger,
    pub(crate) registry: RandomnessRequestRegistry,
    pub(crate) recent_winner: Option<WinnerReceipt>,
}

/// What a stalled round held when it was reset, for manual refunds
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StalledRound {
    pub round_id: u64,
    pub entries: Vec<Pubkey>,
    pub pot: u64,
}

impl LotteryStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialized size when the ledger holds `max_entries`
    pub fn space(max_entries: usize) -> usize {
        let entries = 4 + 32 * max_entries;
        // round_id, phase, entry_fee, pot
        8 + 1 + 8 + 8
            + entries
            + (1 + RequestId::LEN + entries)
            + (1 + WinnerReceipt::LEN)
    }

    /// Opens a new round with the fee fixed at the given price. Returns the fee in lamports.
    pub fn open_round(&mut self, usd_fee: u64, price: Price) -> Result<u64, LotteryError> {
        if self.phase != RoundPhase::Closed {
            msg!("Round can only be opened from Closed");
            return Err(LotteryError::WrongPhase);
        }

        let entry_fee = convert_fee_to_native(usd_fee, price)?;
        let round_id = self
            .round_id
            .checked_add(1)
            .ok_or(LotteryError::ArithmeticOverflow)?;

        self.round_id = round_id;
        self.entry_fee = entry_fee;
        self.pot = 0;
        self.phase = RoundPhase::Open;

        msg!(
            "Round {} opened: entry fee {} lamports ({} USD)",
            round_id,
            entry_fee,
            usd_fee
        );
        Ok(entry_fee)
    }

    /// Like [`open_round`](Self::open_round), reading the price from `source`.
    pub fn open_round_with_source<S: PriceSource + ?Sized>(
        &mut self,
        usd_fee: u64,
        source: &S,
    ) -> Result<u64, LotteryError> {
        if self.phase != RoundPhase::Closed {
            return Err(LotteryError::WrongPhase);
        }
        let price = source
            .current_price()
            .map_err(|_| LotteryError::PriceUnavailable)?;
        self.open_round(usd_fee, price)
    }

    /// Records an entry paid with exactly the round's fee.
    pub fn enter(&mut self, participant: Pubkey, paid_amount: u64) -> Result<(), LotteryError> {
        if self.phase != RoundPhase::Open {
            return Err(LotteryError::WrongPhase);
        }
        if paid_amount != self.entry_fee {
            msg!(
                "Incorrect fee: paid {} lamports, expected {} lamports",
                paid_amount,
                self.entry_fee
            );
            return Err(LotteryError::IncorrectFee);
        }

        let pot = self
            .pot
            .checked_add(paid_amount)
            .ok_or(LotteryError::ArithmeticOverflow)?;
        self.ledger.append(self.phase, participant)?;
        self.pot = pot;

        msg!("Entry #{} by {}", self.ledger.count(), participant);
        Ok(())
    }

    /// Closes entries and registers a fresh randomness request.
    ///
    /// Checks run before anything is mutated: an outstanding request, the
    /// phase, funding, and a non-empty ledger. The request id comes from
    /// `oracle` and is registered together with a snapshot of the ledger.
    pub fn close_and_request_randomness<O: RandomnessOracle + ?Sized>(
        &mut self,
        oracle: &mut O,
        funding_balance: u64,
        minimum_threshold: u64,
    ) -> Result<RequestId, LotteryError> {
        if self.registry.is_outstanding() {
            return Err(LotteryError::RequestAlreadyOutstanding);
        }
        if self.phase != RoundPhase::Open {
            return Err(LotteryError::WrongPhase);
        }
        if !has_sufficient_funding(funding_balance, minimum_threshold) {
            msg!(
                "Insufficient funding: balance {}, minimum {}",
                funding_balance,
                minimum_threshold
            );
            return Err(LotteryError::InsufficientFunding);
        }
        if self.ledger.count() == 0 {
            msg!("No entries, round cannot be drawn");
            return Err(LotteryError::EmptyRound);
        }

        let request_id = oracle.request_randomness()?;
        self.registry
            .register_pending(request_id, self.ledger.snapshot())?;
        self.phase = RoundPhase::Calculating;

        msg!(
            "Round {} closed with {} entries, randomness requested: {}",
            self.round_id,
            self.ledger.count(),
            request_id
        );
        Ok(request_id)
    }

    /// Administrative recovery after a failed payout left the round
    /// `Calculating` with no request to wait for.
    pub fn reset_stalled_round(&mut self) -> Result<StalledRound, LotteryError> {
        if self.phase != RoundPhase::Calculating {
            return Err(LotteryError::WrongPhase);
        }
        if !self.is_stalled() {
            return Err(LotteryError::RoundNotStalled);
        }

        let stalled = StalledRound {
            round_id: self.round_id,
            entries: self.ledger.entries().to_vec(),
            pot: self.pot,
        };
        self.reset();

        msg!(
            "Stalled round {} reset, {} lamports held for refund",
            stalled.round_id,
            stalled.pot
        );
        Ok(stalled)
    }

    pub(crate) fn reset(&mut self) {
        self.pot = 0;
        self.entry_fee = 0;
        self.ledger.clear();
        self.phase = RoundPhase::Closed;
    }

    pub fn current_phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn current_pot(&self) -> u64 {
        self.pot
    }

    pub fn entry_fee(&self) -> u64 {
        self.entry_fee
    }

    pub fn round_id(&self) -> u64 {
        self.round_id
    }

    pub fn ledger(&self) -> &EntryLedger {
        &self.ledger
    }

    pub fn pending_request(&self) -> Option<&PendingRequest> {
        self.registry.pending()
    }

    pub fn recent_winner(&self) -> Option<&WinnerReceipt> {
        self.recent_winner.as_ref()
    }

    /// `Calculating` with nothing outstanding: a payout failed mid-settlement.
    pub fn is_stalled(&self) -> bool {
        self.phase == RoundPhase::Calculating && !self.registry.is_outstanding()
    }
}
