use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    borsh::try_from_slice_unchecked,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{rent::Rent, Sysvar},
};

use crate::constants::{CONFIG_SEED, LOTTERY_SEED, MAX_ENTRIES};
use crate::error::LotteryError;
use crate::funding::read_funding_balance;
use crate::instruction::LotteryInstruction;
use crate::machine::LotteryStateMachine;
use crate::price::PriceFeed;
use crate::settlement::SettlementEngine;
use crate::state::{LotteryConfig, RequestId, RoundPhase};
use crate::utils::{find_config_address, find_lottery_address, lamports_to_sol};
use crate::vrf::{random_value_from_vrf_output, ProgramRequestIds};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = LotteryInstruction::unpack(instruction_data)?;

        match instruction {
            LotteryInstruction::Initialize {
                usd_entry_fee,
                minimum_funding,
            } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(accounts, usd_entry_fee, minimum_funding, program_id)
            }
            LotteryInstruction::OpenRound {} => {
                msg!("Instruction: Open Round");
                Self::process_open_round(accounts, program_id)
            }
            LotteryInstruction::Enter { paid_amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(accounts, paid_amount, program_id)
            }
            LotteryInstruction::CloseRound {} => {
                msg!("Instruction: Close Round");
                Self::process_close_round(accounts, program_id)
            }
            LotteryInstruction::FulfillRandomness {
                request_id,
                randomness,
            } => {
                msg!("Instruction: Fulfill Randomness");
                Self::process_fulfill_randomness(accounts, request_id, randomness, program_id)
            }
            LotteryInstruction::UpdateEntryFee { usd_entry_fee } => {
                msg!("Instruction: Update Entry Fee");
                Self::process_update_entry_fee(accounts, usd_entry_fee, program_id)
            }
        }
    }

    fn process_initialize(
        accounts: &[AccountInfo],
        usd_entry_fee: u64,
        minimum_funding: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let oracle_authority_info = next_account_info(account_info_iter)?;
        let price_feed_info = next_account_info(account_info_iter)?;
        let funding_token_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !admin_info.is_signer {
            msg!("Admin must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_config, config_bump) = find_config_address(program_id);
        if *config_info.key != expected_config {
            msg!("Invalid config account address");
            return Err(ProgramError::InvalidArgument);
        }
        let (expected_lottery, lottery_bump) = find_lottery_address(program_id);
        if *lottery_info.key != expected_lottery {
            msg!("Invalid lottery account address");
            return Err(ProgramError::InvalidArgument);
        }

        if config_info.owner == program_id || lottery_info.owner == program_id {
            msg!("Lottery is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        if usd_entry_fee == 0 {
            msg!("USD entry fee must be greater than zero");
            return Err(ProgramError::InvalidArgument);
        }

        if PriceFeed::unpack(&price_feed_info.data.borrow()).is_err() {
            msg!("Price feed account is not a valid price feed");
            return Err(ProgramError::InvalidArgument);
        }

        let rent = Rent::get()?;

        invoke_signed(
            &system_instruction::create_account(
                admin_info.key,
                config_info.key,
                rent.minimum_balance(LotteryConfig::LEN),
                LotteryConfig::LEN as u64,
                program_id,
            ),
            &[admin_info.clone(), config_info.clone(), system_program_info.clone()],
            &[&[CONFIG_SEED, &[config_bump]]],
        )?;

        let lottery_space = LotteryStateMachine::space(MAX_ENTRIES);
        invoke_signed(
            &system_instruction::create_account(
                admin_info.key,
                lottery_info.key,
                rent.minimum_balance(lottery_space),
                lottery_space as u64,
                program_id,
            ),
            &[admin_info.clone(), lottery_info.clone(), system_program_info.clone()],
            &[&[LOTTERY_SEED, &[lottery_bump]]],
        )?;

        let config = LotteryConfig {
            is_initialized: true,
            admin: *admin_info.key,
            oracle_authority: *oracle_authority_info.key,
            price_feed: *price_feed_info.key,
            funding_token_account: *funding_token_info.key,
            usd_entry_fee,
            minimum_funding,
            lottery_bump,
        };
        LotteryConfig::pack(config, &mut config_info.data.borrow_mut())?;
        LotteryStateMachine::new().serialize(&mut *lottery_info.data.borrow_mut())?;

        msg!(
            "Lottery initialized: Admin={}, Oracle={}, EntryFee={} USD, MinimumFunding={}",
            admin_info.key,
            oracle_authority_info.key,
            usd_entry_fee,
            minimum_funding
        );
        Ok(())
    }

    fn process_open_round(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let price_feed_info = next_account_info(account_info_iter)?;

        let config = Self::load_config(config_info, program_id)?;
        Self::check_signer(admin_info, &config.admin)?;

        if *price_feed_info.key != config.price_feed {
            msg!("Price feed does not match config");
            return Err(LotteryError::PriceUnavailable.into());
        }
        let feed = PriceFeed::unpack(&price_feed_info.data.borrow()).map_err(|_| {
            msg!("Price feed could not be read");
            LotteryError::PriceUnavailable
        })?;

        let mut lottery = Self::load_lottery(lottery_info, program_id)?;
        let entry_fee = lottery.open_round(config.usd_entry_fee, feed.price())?;
        Self::save_lottery(&lottery, lottery_info)?;

        msg!("Entry fee: {} SOL", lamports_to_sol(entry_fee));
        Ok(())
    }

    fn process_enter(
        accounts: &[AccountInfo],
        paid_amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let participant_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !participant_info.is_signer {
            msg!("Participant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut lottery = Self::load_lottery(lottery_info, program_id)?;
        if lottery.current_phase() == RoundPhase::Open && lottery.ledger().count() >= MAX_ENTRIES {
            msg!("Round already holds {} entries", MAX_ENTRIES);
            return Err(LotteryError::RoundFull.into());
        }
        lottery.enter(*participant_info.key, paid_amount)?;

        invoke(
            &system_instruction::transfer(participant_info.key, lottery_info.key, paid_amount),
            &[
                participant_info.clone(),
                lottery_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        Self::save_lottery(&lottery, lottery_info)?;

        msg!("Pot: {} lamports", lottery.current_pot());
        Ok(())
    }

    fn process_close_round(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let funding_info = next_account_info(account_info_iter)?;

        let config = Self::load_config(config_info, program_id)?;
        Self::check_signer(admin_info, &config.admin)?;

        let balance =
            read_funding_balance(funding_info, &config.funding_token_account, lottery_info.key)?;

        let mut lottery = Self::load_lottery(lottery_info, program_id)?;
        let mut request_ids = ProgramRequestIds::new(*lottery_info.key, lottery.round_id());
        let request_id =
            lottery.close_and_request_randomness(&mut request_ids, balance, config.minimum_funding)?;
        Self::save_lottery(&lottery, lottery_info)?;

        msg!("Randomness requested: {}", request_id);
        Ok(())
    }

    fn process_fulfill_randomness(
        accounts: &[AccountInfo],
        request_id: [u8; 32],
        randomness: [u8; 32],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;
        let lottery_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let config = Self::load_config(config_info, program_id)?;
        Self::check_signer(oracle_info, &config.oracle_authority)?;

        let mut lottery = Self::load_lottery(lottery_info, program_id)?;
        let random_value = random_value_from_vrf_output(&randomness);

        let mut payout = |winner: &Pubkey, amount: u64| -> Result<(), LotteryError> {
            if winner != winner_info.key {
                msg!("Winner account {} does not match selected winner {}", winner_info.key, winner);
                return Err(LotteryError::PayoutFailed);
            }
            Self::transfer_lamports(lottery_info, winner_info, amount)
                .map_err(|_| LotteryError::PayoutFailed)
        };
        let receipt = SettlementEngine::handle_fulfillment(
            &mut lottery,
            RequestId::new_from_array(request_id),
            random_value,
            &mut payout,
        )?;
        Self::save_lottery(&lottery, lottery_info)?;

        msg!(
            "Winner {} paid {} SOL",
            receipt.winner,
            lamports_to_sol(receipt.amount_paid)
        );
        Ok(())
    }

    fn process_update_entry_fee(
        accounts: &[AccountInfo],
        usd_entry_fee: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let config_info = next_account_info(account_info_iter)?;

        let mut config = Self::load_config(config_info, program_id)?;
        Self::check_signer(admin_info, &config.admin)?;

        if usd_entry_fee == 0 {
            msg!("USD entry fee must be greater than zero");
            return Err(ProgramError::InvalidArgument);
        }

        config.usd_entry_fee = usd_entry_fee;
        LotteryConfig::pack(config, &mut config_info.data.borrow_mut())?;

        msg!("Entry fee updated to {} USD from the next round", usd_entry_fee);
        Ok(())
    }

    fn check_signer(signer_info: &AccountInfo, expected: &Pubkey) -> ProgramResult {
        if !signer_info.is_signer {
            msg!("{} must sign the transaction", expected);
            return Err(ProgramError::MissingRequiredSignature);
        }
        if signer_info.key != expected {
            msg!("Signer {} is not {}", signer_info.key, expected);
            return Err(LotteryError::NotAuthorized.into());
        }
        Ok(())
    }

    fn load_config(config_info: &AccountInfo, program_id: &Pubkey) -> Result<LotteryConfig, ProgramError> {
        if config_info.owner != program_id {
            msg!("Config account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let (expected_config, _) = find_config_address(program_id);
        if *config_info.key != expected_config {
            msg!("Invalid config account address");
            return Err(ProgramError::InvalidArgument);
        }
        LotteryConfig::unpack(&config_info.data.borrow())
    }

    fn load_lottery(
        lottery_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> Result<LotteryStateMachine, ProgramError> {
        if lottery_info.owner != program_id {
            msg!("Lottery account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let (expected_lottery, _) = find_lottery_address(program_id);
        if *lottery_info.key != expected_lottery {
            msg!("Invalid lottery account address");
            return Err(ProgramError::InvalidArgument);
        }
        let lottery = try_from_slice_unchecked::<LotteryStateMachine>(&lottery_info.data.borrow())?;
        Ok(lottery)
    }

    fn save_lottery(lottery: &LotteryStateMachine, lottery_info: &AccountInfo) -> ProgramResult {
        lottery.serialize(&mut *lottery_info.data.borrow_mut())?;
        Ok(())
    }

    fn transfer_lamports(from: &AccountInfo, to: &AccountInfo, amount: u64) -> ProgramResult {
        let from_balance = from
            .lamports()
            .checked_sub(amount)
            .ok_or(ProgramError::InsufficientFunds)?;
        let to_balance = to
            .lamports()
            .checked_add(amount)
            .ok_or(ProgramError::InvalidArgument)?;
        **from.try_borrow_mut_lamports()? = from_balance;
        **to.try_borrow_mut_lamports()? = to_balance;
        Ok(())
    }
}
