use solana_program::{decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError};
use thiserror::Error;

/// Errors that may be returned by the lottery
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LotteryError {
    /// Operation is not valid in the current round phase
    #[error("Operation not allowed in the current round phase")]
    WrongPhase,

    /// Paid amount differs from the round's entry fee
    #[error("Paid amount does not match the entry fee")]
    IncorrectFee,

    /// Price is zero, negative, or too large to express the fee
    #[error("Invalid price")]
    InvalidPrice,

    /// Price source could not be read
    #[error("Price unavailable")]
    PriceUnavailable,

    /// Funding balance below the minimum threshold
    #[error("Insufficient funding for a randomness request")]
    InsufficientFunding,

    /// A randomness request is already awaiting fulfillment
    #[error("A randomness request is already outstanding")]
    RequestAlreadyOutstanding,

    /// Fulfillment does not match the outstanding request
    #[error("Unknown randomness request id")]
    UnknownRequestId,

    /// Round has no entries to draw from
    #[error("Round has no entries")]
    EmptyRound,

    /// Transfer of the pot to the winner failed
    #[error("Payout failed")]
    PayoutFailed,

    /// Entry index past the end of the ledger
    #[error("Entry index out of range")]
    IndexOutOfRange,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// Randomness oracle refused the request
    #[error("Randomness request could not be issued")]
    RandomnessUnavailable,

    /// Ledger is at capacity
    #[error("Round is full")]
    RoundFull,

    /// Signer is not the configured admin or oracle authority
    #[error("Not authorized")]
    NotAuthorized,

    /// Reset requested for a round that is not stalled
    #[error("Round is not stalled")]
    RoundNotStalled,

    /// No address configured for a contract on a non-local network
    #[error("Unknown contract")]
    UnknownContract,

    /// Lottery service mailbox is closed
    #[error("Lottery service stopped")]
    ServiceStopped,
}

impl From<LotteryError> for ProgramError {
    fn from(e: LotteryError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for LotteryError {
    fn type_of() -> &'static str {
        "Lottery Error"
    }
}

impl PrintProgramError for LotteryError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
