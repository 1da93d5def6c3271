//! Program-derived addresses.
//!
//! Every account the program owns or controls lives at an address derived from
//! fixed seeds. The pool authority is the only one that signs token transfers:
//! it owns both custody vaults and has no private key.

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    program::{invoke, invoke_signed},
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::error::StakeError;

// ---------------------------------------------------------------------------
// Seeds
// ---------------------------------------------------------------------------

pub const POOL_SEED: &[u8] = b"stake_pool";
pub const STAKE_VAULT_SEED: &[u8] = b"stake_vault";
pub const REWARD_VAULT_SEED: &[u8] = b"reward_vault";
pub const POOL_AUTHORITY_SEED: &[u8] = b"pool_authority";
pub const USER_STAKE_SEED: &[u8] = b"user_stake";

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// Pool record, one per (creator, stake mint).
pub fn find_pool_address(program_id: &Pubkey, creator: &Pubkey, stake_mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[POOL_SEED, creator.as_ref(), stake_mint.as_ref()],
        program_id,
    )
}

pub fn find_stake_vault_address(program_id: &Pubkey, pool: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[STAKE_VAULT_SEED, pool.as_ref()], program_id)
}

pub fn find_reward_vault_address(program_id: &Pubkey, pool: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[REWARD_VAULT_SEED, pool.as_ref()], program_id)
}

/// User stake record, one per (pool, user).
pub fn find_user_stake_address(program_id: &Pubkey, pool: &Pubkey, user: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[USER_STAKE_SEED, pool.as_ref(), user.as_ref()],
        program_id,
    )
}

/// Re-derive `expected` from `seeds` and the stored `bump`.
pub fn verify_address(
    program_id: &Pubkey,
    seeds: &[&[u8]],
    bump: u8,
    expected: &Pubkey,
) -> Result<(), StakeError> {
    let bump_seed = [bump];
    let mut full: Vec<&[u8]> = seeds.to_vec();
    full.push(&bump_seed);

    match Pubkey::create_program_address(&full, program_id) {
        Ok(derived) if derived == *expected => Ok(()),
        _ => Err(StakeError::Unauthorized),
    }
}

// ---------------------------------------------------------------------------
// Pool authority
// ---------------------------------------------------------------------------

/// Signing capability for one pool's vaults.
///
/// Holding a `PoolAuthority` is the only way to obtain the seeds that make the
/// runtime accept the authority as a signer, and those seeds are not exposed
/// outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAuthority {
    pool: Pubkey,
    address: Pubkey,
    bump: [u8; 1],
}

impl PoolAuthority {
    pub fn derive(program_id: &Pubkey, pool: &Pubkey) -> Self {
        let (address, bump) =
            Pubkey::find_program_address(&[POOL_AUTHORITY_SEED, pool.as_ref()], program_id);
        Self {
            pool: *pool,
            address,
            bump: [bump],
        }
    }

    /// Rebuild the authority for `pool` from a stored bump.
    pub fn from_bump(program_id: &Pubkey, pool: &Pubkey, bump: u8) -> Result<Self, StakeError> {
        let address = Pubkey::create_program_address(
            &[POOL_AUTHORITY_SEED, pool.as_ref(), &[bump]],
            program_id,
        )
        .map_err(|_| StakeError::Unauthorized)?;
        Ok(Self {
            pool: *pool,
            address,
            bump: [bump],
        })
    }

    /// Derive the authority for `pool` and require it to equal `claimed`.
    pub fn verify(program_id: &Pubkey, pool: &Pubkey, claimed: &Pubkey) -> Result<Self, StakeError> {
        let authority = Self::derive(program_id, pool);
        if authority.address != *claimed {
            return Err(StakeError::Unauthorized);
        }
        Ok(authority)
    }

    pub fn address(&self) -> &Pubkey {
        &self.address
    }

    pub fn pool(&self) -> &Pubkey {
        &self.pool
    }

    pub fn bump(&self) -> u8 {
        self.bump[0]
    }

    pub(crate) fn signer_seeds(&self) -> [&[u8]; 3] {
        [POOL_AUTHORITY_SEED, self.pool.as_ref(), &self.bump]
    }
}

// ---------------------------------------------------------------------------
// Account creation
// ---------------------------------------------------------------------------

/// Create a rent-exempt account at a derived address, signing with `seeds`.
///
/// Anyone can send lamports to a derived address before it is created, so an
/// address that already holds lamports is topped up to the rent minimum and
/// then allocated and assigned in place.
pub fn create_pda_account<'a>(
    payer: &AccountInfo<'a>,
    space: usize,
    owner: &Pubkey,
    system_program: &AccountInfo<'a>,
    new_account: &AccountInfo<'a>,
    seeds: &[&[u8]],
) -> ProgramResult {
    let rent = Rent::get()?;
    let required = rent.minimum_balance(space);
    let current = new_account.lamports();

    if current == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                payer.key,
                new_account.key,
                required,
                space as u64,
                owner,
            ),
            &[payer.clone(), new_account.clone(), system_program.clone()],
            &[seeds],
        );
    }

    let shortfall = required.saturating_sub(current);
    if shortfall > 0 {
        invoke(
            &system_instruction::transfer(payer.key, new_account.key, shortfall),
            &[payer.clone(), new_account.clone(), system_program.clone()],
        )?;
    }

    invoke_signed(
        &system_instruction::allocate(new_account.key, space as u64),
        &[new_account.clone(), system_program.clone()],
        &[seeds],
    )?;

    invoke_signed(
        &system_instruction::assign(new_account.key, owner),
        &[new_account.clone(), system_program.clone()],
        &[seeds],
    )
}
