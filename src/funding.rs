use solana_program::{
    account_info::AccountInfo, msg, program_error::ProgramError, program_pack::Pack,
    pubkey::Pubkey,
};
use spl_token::state::Account as TokenAccount;

/// True when the funding balance covers a randomness request
pub fn has_sufficient_funding(balance: u64, minimum_threshold: u64) -> bool {
    balance >= minimum_threshold
}

/// Reads the funding token balance held by the lottery.
///
/// The token account must be an initialized spl-token account owned by the lottery PDA.
pub fn read_funding_balance(
    funding_info: &AccountInfo,
    expected_key: &Pubkey,
    lottery_key: &Pubkey,
) -> Result<u64, ProgramError> {
    if funding_info.key != expected_key {
        msg!("Funding token account does not match config");
        return Err(ProgramError::InvalidArgument);
    }

    if funding_info.owner != &spl_token::id() {
        msg!("Funding token account must be owned by the token program");
        return Err(ProgramError::IncorrectProgramId);
    }

    let token_account = TokenAccount::unpack(&funding_info.data.borrow())?;
    if token_account.owner != *lottery_key {
        msg!("Funding token account is not held by the lottery");
        return Err(ProgramError::InvalidAccountData);
    }

    Ok(token_account.amount)
}
