// Boundary calls the lottery makes to the outside world
use solana_program::pubkey::Pubkey;

use crate::error::LotteryError;
use crate::price::Price;
use crate::state::RequestId;

/// Current native/USD price
pub trait PriceSource {
    fn current_price(&self) -> Result<Price, LotteryError>;
}

/// Accepts randomness requests; the fulfillment arrives later as a separate call
pub trait RandomnessOracle {
    fn request_randomness(&mut self) -> Result<RequestId, LotteryError>;
}

/// Balance of the token that pays for randomness requests
pub trait FundingSource {
    fn funding_balance(&self) -> Result<u64, LotteryError>;
}

/// Moves the pot to the winner
pub trait PayoutSink {
    fn transfer(&mut self, to: &Pubkey, amount: u64) -> Result<(), LotteryError>;
}

impl<F> RandomnessOracle for F
where
    F: FnMut() -> Result<RequestId, LotteryError>,
{
    fn request_randomness(&mut self) -> Result<RequestId, LotteryError> {
        self()
    }
}

impl<F> PayoutSink for F
where
    F: FnMut(&Pubkey, u64) -> Result<(), LotteryError>,
{
    fn transfer(&mut self, to: &Pubkey, amount: u64) -> Result<(), LotteryError> {
        self(to, amount)
    }
}
