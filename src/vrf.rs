// Randomness request ids and VRF output handling for the on-chain program
use solana_program::{hash::hashv, pubkey::Pubkey};

use crate::constants::REQUEST_SEED;
use crate::error::LotteryError;
use crate::interfaces::RandomnessOracle;
use crate::state::RequestId;

/// Reduces a 32-byte VRF output to the random value used for the draw
pub fn random_value_from_vrf_output(randomness: &[u8; 32]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&randomness[0..8]);
    u64::from_le_bytes(bytes)
}

/// Request ids derived from the lottery account and the round being closed.
///
/// The off-chain oracle picks the id up from the lottery account (or the
/// program log) and echoes it back with `FulfillRandomness`.
pub struct ProgramRequestIds {
    lottery: Pubkey,
    round_id: u64,
    nonce: u64,
}

impl ProgramRequestIds {
    pub fn new(lottery: Pubkey, round_id: u64) -> Self {
        Self {
            lottery,
            round_id,
            nonce: 0,
        }
    }
}

impl RandomnessOracle for ProgramRequestIds {
    fn request_randomness(&mut self) -> Result<RequestId, LotteryError> {
        let hash = hashv(&[
            REQUEST_SEED,
            self.lottery.as_ref(),
            &self.round_id.to_le_bytes(),
            &self.nonce.to_le_bytes(),
        ]);
        self.nonce = self
            .nonce
            .checked_add(1)
            .ok_or(LotteryError::ArithmeticOverflow)?;
        Ok(RequestId::new_from_array(hash.to_bytes()))
    }
}
