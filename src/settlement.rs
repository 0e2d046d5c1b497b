use solana_program::msg;

use crate::error::LotteryError;
use crate::interfaces::PayoutSink;
use crate::machine::LotteryStateMachine;
use crate::state::{RequestId, RoundPhase, WinnerReceipt};

/// Index of the winning entry for `random_value` among `entry_count` entries
pub fn select_winner_index(random_value: u64, entry_count: usize) -> Result<usize, LotteryError> {
    if entry_count == 0 {
        return Err(LotteryError::EmptyRound);
    }
    Ok((random_value % entry_count as u64) as usize)
}

/// Turns a randomness fulfillment into a payout.
pub struct SettlementEngine;

impl SettlementEngine {
    /// Settles the calculating round with the oracle's `random_value`.
    ///
    /// The request is consumed before any payout so a stale or replayed
    /// fulfillment fails with `UnknownRequestId` and pays nothing. Outside
    /// `Calculating` the call fails with `WrongPhase`, except a replay of the
    /// request that settled the last round, which is `UnknownRequestId`. `payout`
    /// is invoked exactly once. If it fails the pot and ledger are kept and
    /// the round stays `Calculating` with no pending request until
    /// [`reset_stalled_round`](LotteryStateMachine::reset_stalled_round).
    pub fn handle_fulfillment<P: PayoutSink + ?Sized>(
        lottery: &mut LotteryStateMachine,
        request_id: RequestId,
        random_value: u64,
        payout: &mut P,
    ) -> Result<WinnerReceipt, LotteryError> {
        if lottery.phase != RoundPhase::Calculating {
            let already_settled = lottery
                .recent_winner
                .map_or(false, |receipt| receipt.request_id == request_id);
            if already_settled {
                msg!("Fulfillment {} was already settled", request_id);
                return Err(LotteryError::UnknownRequestId);
            }
            msg!("Fulfillment {} received outside Calculating", request_id);
            return Err(LotteryError::WrongPhase);
        }

        let fulfilled = lottery.registry.fulfill(request_id, random_value)?;

        let winner_index = match select_winner_index(random_value, fulfilled.snapshot.count()) {
            Ok(index) => index,
            Err(err) => {
                // nothing to pay out
                lottery.reset();
                return Err(err);
            }
        };
        let winner = fulfilled.snapshot.at(winner_index)?;
        let amount = lottery.current_pot();

        msg!(
            "Random value {} selects entry {} of {}: {}",
            random_value,
            winner_index,
            fulfilled.snapshot.count(),
            winner
        );

        if let Err(err) = payout.transfer(&winner, amount) {
            msg!("Payout of {} lamports to {} failed: {}", amount, winner, err);
            return Err(LotteryError::PayoutFailed);
        }

        let receipt = WinnerReceipt {
            winner,
            amount_paid: amount,
            request_id,
            round_id: lottery.round_id,
            random_value,
        };
        lottery.recent_winner = Some(receipt);
        lottery.reset();

        msg!(
            "Round {} settled: {} won {} lamports",
            receipt.round_id,
            winner,
            amount
        );
        Ok(receipt)
    }
}
