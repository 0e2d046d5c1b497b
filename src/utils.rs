// Lottery Program - Utility Functions
use solana_program::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;

use crate::constants::{CONFIG_SEED, LOTTERY_SEED};

/// Find the program derived address of the config account
pub fn find_config_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CONFIG_SEED], program_id)
}

/// Find the program derived address of the lottery account (holds state and pot)
pub fn find_lottery_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[LOTTERY_SEED], program_id)
}

/// Associated token account of the lottery PDA for the funding mint
pub fn find_funding_token_address(program_id: &Pubkey, funding_mint: &Pubkey) -> Pubkey {
    let (lottery, _) = find_lottery_address(program_id);
    get_associated_token_address(&lottery, funding_mint)
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}
