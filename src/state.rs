use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    hash::Hash,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::fmt;

/// Phase of the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundPhase {
    /// No round running; a new one may be opened
    Closed,
    /// Accepting entries
    Open,
    /// Waiting for the randomness fulfillment
    Calculating,
}

impl Default for RoundPhase {
    fn default() -> Self {
        RoundPhase::Closed
    }
}

/// Opaque identifier of a randomness request, echoed back on fulfillment
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RequestId(pub [u8; 32]);

impl RequestId {
    pub const LEN: usize = 32;

    pub fn new_from_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Hash::new_from_array(self.0))
    }
}

/// Result of a completed settlement
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WinnerReceipt {
    pub winner: Pubkey,
    pub amount_paid: u64,
    pub request_id: RequestId,
    pub round_id: u64,
    pub random_value: u64,
}

impl WinnerReceipt {
    pub const LEN: usize = 32 + 8 + RequestId::LEN + 8 + 8;
}

/// Program configuration account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotteryConfig {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Opens and closes rounds
    pub admin: Pubkey,
    /// Only signer allowed to deliver randomness
    pub oracle_authority: Pubkey,
    /// Price feed consulted when a round opens
    pub price_feed: Pubkey,
    /// Token account paying for randomness requests
    pub funding_token_account: Pubkey,
    /// Entry fee in whole USD
    pub usd_entry_fee: u64,
    /// Funding token balance required to close a round
    pub minimum_funding: u64,
    /// Bump of the lottery PDA
    pub lottery_bump: u8,
}

impl Sealed for LotteryConfig {}

impl IsInitialized for LotteryConfig {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for LotteryConfig {
    const LEN: usize = 1 + 32 + 32 + 32 + 32 + 8 + 8 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, LotteryConfig::LEN];
        let (
            is_initialized,
            admin,
            oracle_authority,
            price_feed,
            funding_token_account,
            usd_entry_fee,
            minimum_funding,
            lottery_bump,
        ) = array_refs![src, 1, 32, 32, 32, 32, 8, 8, 1];

        let is_initialized = match is_initialized[0] {
            0 => false,
            1 => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        Ok(LotteryConfig {
            is_initialized,
            admin: Pubkey::new_from_array(*admin),
            oracle_authority: Pubkey::new_from_array(*oracle_authority),
            price_feed: Pubkey::new_from_array(*price_feed),
            funding_token_account: Pubkey::new_from_array(*funding_token_account),
            usd_entry_fee: u64::from_le_bytes(*usd_entry_fee),
            minimum_funding: u64::from_le_bytes(*minimum_funding),
            lottery_bump: lottery_bump[0],
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, LotteryConfig::LEN];
        let (
            is_initialized_dst,
            admin_dst,
            oracle_authority_dst,
            price_feed_dst,
            funding_token_account_dst,
            usd_entry_fee_dst,
            minimum_funding_dst,
            lottery_bump_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 32, 32, 8, 8, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        admin_dst.copy_from_slice(self.admin.as_ref());
        oracle_authority_dst.copy_from_slice(self.oracle_authority.as_ref());
        price_feed_dst.copy_from_slice(self.price_feed.as_ref());
        funding_token_account_dst.copy_from_slice(self.funding_token_account.as_ref());
        *usd_entry_fee_dst = self.usd_entry_fee.to_le_bytes();
        *minimum_funding_dst = self.minimum_funding.to_le_bytes();
        lottery_bump_dst[0] = self.lottery_bump;
    }
}
