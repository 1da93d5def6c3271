//! Custody vaults: SPL token accounts owned by the pool authority.

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
};
use spl_token::state::{Account as TokenAccount, Mint};

use crate::{
    authority::{create_pda_account, PoolAuthority},
    error::StakeError,
};

/// Unpack an SPL token account after checking it belongs to the token program.
pub fn load_token_account(info: &AccountInfo) -> Result<TokenAccount, ProgramError> {
    if info.owner != &spl_token::id() {
        return Err(StakeError::InvalidOwner.into());
    }
    TokenAccount::unpack(&info.try_borrow_data()?)
}

/// Unpack an SPL mint after checking it belongs to the token program.
pub fn load_mint(info: &AccountInfo) -> Result<Mint, ProgramError> {
    if info.owner != &spl_token::id() {
        return Err(StakeError::InvalidOwner.into());
    }
    Mint::unpack(&info.try_borrow_data()?)
}

/// Allocate `vault` at its derived address and initialize it as a token
/// account for `mint`, owned by `authority`.
pub fn create_vault<'a>(
    payer: &AccountInfo<'a>,
    vault: &AccountInfo<'a>,
    mint: &AccountInfo<'a>,
    authority: &PoolAuthority,
    vault_seeds: &[&[u8]],
    token_program: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
) -> ProgramResult {
    create_pda_account(
        payer,
        TokenAccount::LEN,
        &spl_token::id(),
        system_program,
        vault,
        vault_seeds,
    )?;

    invoke(
        &spl_token::instruction::initialize_account3(
            token_program.key,
            vault.key,
            mint.key,
            authority.address(),
        )?,
        &[vault.clone(), mint.clone(), token_program.clone()],
    )
}

/// Move `amount` from a depositor-owned token account into a vault. The
/// depositor must have signed the outer transaction.
pub fn deposit<'a>(
    token_program: &AccountInfo<'a>,
    source: &AccountInfo<'a>,
    vault: &AccountInfo<'a>,
    depositor: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    let ix = spl_token::instruction::transfer(
        token_program.key,
        source.key,
        vault.key,
        depositor.key,
        &[],
        amount,
    )?;

    invoke(
        &ix,
        &[
            source.clone(),
            vault.clone(),
            depositor.clone(),
            token_program.clone(),
        ],
    )
}

/// Move `amount` out of a vault, signing as the pool authority.
///
/// The vault balance is checked here independently of the ledger so that a
/// bookkeeping error can never be papered over by a partial transfer.
pub fn withdraw<'a>(
    authority: &PoolAuthority,
    token_program: &AccountInfo<'a>,
    vault: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    authority_info: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    if authority_info.key != authority.address() {
        return Err(StakeError::Unauthorized.into());
    }

    let vault_state = load_token_account(vault)?;
    if vault_state.owner != *authority.address() {
        return Err(StakeError::Unauthorized.into());
    }
    if vault_state.amount < amount {
        return Err(StakeError::InsufficientVaultBalance.into());
    }

    let ix = spl_token::instruction::transfer(
        token_program.key,
        vault.key,
        destination.key,
        authority.address(),
        &[],
        amount,
    )?;

    let seeds = authority.signer_seeds();
    invoke_signed(
        &ix,
        &[
            vault.clone(),
            destination.clone(),
            authority_info.clone(),
            token_program.clone(),
        ],
        &[&seeds[..]],
    )
}

/// Current token balance of a vault, for log output.
pub fn balance(vault: &AccountInfo) -> Result<u64, ProgramError> {
    Ok(load_token_account(vault)?.amount)
}

/// Require `vault` to be a token account for `mint` owned by `owner`.
pub fn assert_vault(vault: &AccountInfo, mint: &Pubkey, owner: &Pubkey) -> ProgramResult {
    let state = load_token_account(vault)?;
    if state.mint != *mint {
        return Err(StakeError::MintMismatch.into());
    }
    if state.owner != *owner {
        return Err(StakeError::Unauthorized.into());
    }
    Ok(())
}
