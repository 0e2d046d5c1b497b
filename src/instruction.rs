use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;
use std::mem::size_of;

use crate::utils::{find_config_address, find_lottery_address};

#[derive(Clone, Debug, PartialEq)]
pub enum LotteryInstruction {
    /// Create the config and lottery accounts
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The admin, pays for both accounts
    /// 1. `[writable]` The config account (PDA)
    /// 2. `[writable]` The lottery account (PDA)
    /// 3. `[]` Oracle authority allowed to deliver randomness
    /// 4. `[]` Price feed account
    /// 5. `[]` Funding token account held by the lottery PDA
    /// 6. `[]` The system program
    Initialize {
        /// Entry fee in whole USD
        usd_entry_fee: u64,
        /// Funding token balance required to close a round
        minimum_funding: u64,
    },

    /// Open a round, fixing the entry fee from the price feed
    ///
    /// Accounts expected:
    /// 0. `[signer]` The admin
    /// 1. `[]` Config account
    /// 2. `[writable]` Lottery account
    /// 3. `[]` Price feed account
    OpenRound {},

    /// Enter the open round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The participant, pays the entry fee
    /// 1. `[writable]` Lottery account
    /// 2. `[]` The system program
    Enter {
        /// Lamports paid, must equal the round's entry fee
        paid_amount: u64,
    },

    /// Close entries and request randomness
    ///
    /// Accounts expected:
    /// 0. `[signer]` The admin
    /// 1. `[]` Config account
    /// 2. `[writable]` Lottery account
    /// 3. `[]` Funding token account
    CloseRound {},

    /// Oracle callback delivering the randomness for a request
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle authority
    /// 1. `[]` Config account
    /// 2. `[writable]` Lottery account
    /// 3. `[writable]` The winner selected by the randomness
    FulfillRandomness {
        request_id: [u8; 32],
        randomness: [u8; 32],
    },

    /// Update the USD entry fee used by the next round (admin only)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The admin
    /// 1. `[writable]` Config account
    UpdateEntryFee {
        usd_entry_fee: u64,
    },
}

impl LotteryInstruction {
    /// Unpacks a byte buffer into a LotteryInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input.split_first().ok_or(ProgramError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (usd_entry_fee, rest) = Self::unpack_u64(rest)?;
                let (minimum_funding, _) = Self::unpack_u64(rest)?;
                Self::Initialize {
                    usd_entry_fee,
                    minimum_funding,
                }
            }
            1 => Self::OpenRound {},
            2 => {
                let (paid_amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { paid_amount }
            }
            3 => Self::CloseRound {},
            4 => {
                let (request_id, rest) = Self::unpack_bytes32(rest)?;
                let (randomness, _) = Self::unpack_bytes32(rest)?;
                Self::FulfillRandomness {
                    request_id,
                    randomness,
                }
            }
            5 => {
                let (usd_entry_fee, _) = Self::unpack_u64(rest)?;
                Self::UpdateEntryFee { usd_entry_fee }
            }
            _ => return Err(ProgramError::InvalidInstructionData),
        })
    }

    /// Packs a LotteryInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match *self {
            Self::Initialize {
                usd_entry_fee,
                minimum_funding,
            } => {
                buf.push(0);
                buf.extend_from_slice(&usd_entry_fee.to_le_bytes());
                buf.extend_from_slice(&minimum_funding.to_le_bytes());
            }
            Self::OpenRound {} => buf.push(1),
            Self::Enter { paid_amount } => {
                buf.push(2);
                buf.extend_from_slice(&paid_amount.to_le_bytes());
            }
            Self::CloseRound {} => buf.push(3),
            Self::FulfillRandomness {
                ref request_id,
                ref randomness,
            } => {
                buf.push(4);
                buf.extend_from_slice(request_id);
                buf.extend_from_slice(randomness);
            }
            Self::UpdateEntryFee { usd_entry_fee } => {
                buf.push(5);
                buf.extend_from_slice(&usd_entry_fee.to_le_bytes());
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((value, &input[8..]))
    }

    fn unpack_bytes32(input: &[u8]) -> Result<([u8; 32], &[u8]), ProgramError> {
        let value: [u8; 32] = input
            .get(..32)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(ProgramError::InvalidInstructionData)?;
        Ok((value, &input[32..]))
    }
}

/// Create initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    admin: &Pubkey,
    oracle_authority: &Pubkey,
    price_feed: &Pubkey,
    funding_token_account: &Pubkey,
    usd_entry_fee: u64,
    minimum_funding: u64,
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (lottery, _) = find_lottery_address(program_id);
    let data = LotteryInstruction::Initialize {
        usd_entry_fee,
        minimum_funding,
    }
    .pack();

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*admin, true),
            AccountMeta::new(config, false),
            AccountMeta::new(lottery, false),
            AccountMeta::new_readonly(*oracle_authority, false),
            AccountMeta::new_readonly(*price_feed, false),
            AccountMeta::new_readonly(*funding_token_account, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    }
}

/// Create open_round instruction
pub fn open_round(program_id: &Pubkey, admin: &Pubkey, price_feed: &Pubkey) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (lottery, _) = find_lottery_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*admin, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(lottery, false),
            AccountMeta::new_readonly(*price_feed, false),
        ],
        data: LotteryInstruction::OpenRound {}.pack(),
    }
}

/// Create enter instruction
pub fn enter(program_id: &Pubkey, participant: &Pubkey, paid_amount: u64) -> Instruction {
    let (lottery, _) = find_lottery_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*participant, true),
            AccountMeta::new(lottery, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: LotteryInstruction::Enter { paid_amount }.pack(),
    }
}

/// Create close_round instruction
pub fn close_round(
    program_id: &Pubkey,
    admin: &Pubkey,
    funding_token_account: &Pubkey,
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (lottery, _) = find_lottery_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*admin, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(lottery, false),
            AccountMeta::new_readonly(*funding_token_account, false),
        ],
        data: LotteryInstruction::CloseRound {}.pack(),
    }
}

/// Create fulfill_randomness instruction
pub fn fulfill_randomness(
    program_id: &Pubkey,
    oracle_authority: &Pubkey,
    winner: &Pubkey,
    request_id: [u8; 32],
    randomness: [u8; 32],
) -> Instruction {
    let (config, _) = find_config_address(program_id);
    let (lottery, _) = find_lottery_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*oracle_authority, true),
            AccountMeta::new_readonly(config, false),
            AccountMeta::new(lottery, false),
            AccountMeta::new(*winner, false),
        ],
        data: LotteryInstruction::FulfillRandomness {
            request_id,
            randomness,
        }
        .pack(),
    }
}

/// Create update_entry_fee instruction
pub fn update_entry_fee(program_id: &Pubkey, admin: &Pubkey, usd_entry_fee: u64) -> Instruction {
    let (config, _) = find_config_address(program_id);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*admin, true),
            AccountMeta::new(config, false),
        ],
        data: LotteryInstruction::UpdateEntryFee { usd_entry_fee }.pack(),
    }
}
