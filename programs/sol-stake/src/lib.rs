// Sol Stake: Token Staking Program
// Single-asset staking pool paying a fixed per-second reward rate from a
// separately funded reward vault.

use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, program_error::ProgramError,
    pubkey::Pubkey,
};

pub mod accrual;
pub mod authority;
pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod vault;

pub use error::StakeError;
pub use state::{Pool, UserStake};

// ---------------------------------------------------------------------------
// Program ID
// ---------------------------------------------------------------------------

solana_program::declare_id!("SoLStake11111111111111111111111111111111111");

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let (&disc, rest) = instruction_data
        .split_first()
        .ok_or(ProgramError::InvalidInstructionData)?;

    match disc {
        instruction::IX_INITIALIZE => processor::process_initialize(program_id, accounts, rest),
        instruction::IX_STAKE => processor::process_stake(program_id, accounts, rest),
        instruction::IX_UNSTAKE => processor::process_unstake(program_id, accounts, rest),
        instruction::IX_CLAIM => processor::process_claim(program_id, accounts),
        instruction::IX_FUND_REWARDS => processor::process_fund_rewards(program_id, accounts, rest),
        instruction::IX_CLOSE_USER_STAKE => processor::process_close_user_stake(program_id, accounts),
        _ => Err(StakeError::InvalidInstruction.into()),
    }
}
