// Lottery settlement program
// Round lifecycle, entry ledger, randomness requests and payout

// Core modules
pub mod constants;
pub mod error;
pub mod funding;
pub mod interfaces;
pub mod ledger;
pub mod machine;
pub mod price;
pub mod registry;
pub mod settlement;
pub mod state;

// Program modules
pub mod instruction;
pub mod processor;
pub mod utils;
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

// Off-chain modules
#[cfg(not(target_os = "solana"))]
pub mod deploy;
#[cfg(not(target_os = "solana"))]
pub mod service;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
