//! Wire format and instruction builders.
//!
//! Instruction data is a one-byte discriminator followed by the Borsh-encoded
//! argument struct, if any.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::authority::{
    find_pool_address, find_reward_vault_address, find_stake_vault_address,
    find_user_stake_address, PoolAuthority,
};

// ── Instruction Discriminators ──────────────────────────────────────────────

pub const IX_INITIALIZE: u8 = 0;
pub const IX_STAKE: u8 = 1;
pub const IX_UNSTAKE: u8 = 2;
pub const IX_CLAIM: u8 = 3;
pub const IX_FUND_REWARDS: u8 = 4;
pub const IX_CLOSE_USER_STAKE: u8 = 5;

// ── Instruction Payloads ────────────────────────────────────────────────────

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct InitializeArgs {
    pub reward_rate: u64,
    /// Maximum `total_staked`; zero means uncapped.
    pub stake_cap: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct AmountArgs {
    pub amount: u64,
}

impl InitializeArgs {
    fn data(&self) -> Vec<u8> {
        let mut data = vec![IX_INITIALIZE];
        data.extend_from_slice(&self.reward_rate.to_le_bytes());
        data.extend_from_slice(&self.stake_cap.to_le_bytes());
        data
    }
}

impl AmountArgs {
    fn data(&self, discriminator: u8) -> Vec<u8> {
        let mut data = vec![discriminator];
        data.extend_from_slice(&self.amount.to_le_bytes());
        data
    }
}

// ── Builders ────────────────────────────────────────────────────────────────

/// Accounts:
///   0. [signer, writable] creator (payer)
///   1. [writable] pool PDA
///   2. []         stake mint
///   3. []         reward mint
///   4. [writable] stake vault PDA
///   5. [writable] reward vault PDA
///   6. []         pool authority PDA
///   7. []         token program
///   8. []         system program
pub fn initialize(
    program_id: &Pubkey,
    creator: &Pubkey,
    stake_mint: &Pubkey,
    reward_mint: &Pubkey,
    reward_rate: u64,
    stake_cap: u64,
) -> Instruction {
    let (pool, _) = find_pool_address(program_id, creator, stake_mint);
    let (stake_vault, _) = find_stake_vault_address(program_id, &pool);
    let (reward_vault, _) = find_reward_vault_address(program_id, &pool);
    let authority = PoolAuthority::derive(program_id, &pool);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*creator, true),
            AccountMeta::new(pool, false),
            AccountMeta::new_readonly(*stake_mint, false),
            AccountMeta::new_readonly(*reward_mint, false),
            AccountMeta::new(stake_vault, false),
            AccountMeta::new(reward_vault, false),
            AccountMeta::new_readonly(*authority.address(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: InitializeArgs { reward_rate, stake_cap }.data(),
    }
}

/// Accounts:
///   0. [signer, writable] user (payer for the user stake record)
///   1. [writable] pool
///   2. [writable] user stake PDA
///   3. [writable] user stake-token account (source)
///   4. []         user reward-token account
///   5. [writable] stake vault
///   6. []         reward vault
///   7. []         pool authority PDA
///   8. []         token program
///   9. []         system program
pub fn stake(
    program_id: &Pubkey,
    user: &Pubkey,
    pool: &Pubkey,
    user_stake_token: &Pubkey,
    user_reward_token: &Pubkey,
    amount: u64,
) -> Instruction {
    let (user_stake, _) = find_user_stake_address(program_id, pool, user);
    let (stake_vault, _) = find_stake_vault_address(program_id, pool);
    let (reward_vault, _) = find_reward_vault_address(program_id, pool);
    let authority = PoolAuthority::derive(program_id, pool);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*user, true),
            AccountMeta::new(*pool, false),
            AccountMeta::new(user_stake, false),
            AccountMeta::new(*user_stake_token, false),
            AccountMeta::new_readonly(*user_reward_token, false),
            AccountMeta::new(stake_vault, false),
            AccountMeta::new_readonly(reward_vault, false),
            AccountMeta::new_readonly(*authority.address(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: AmountArgs { amount }.data(IX_STAKE),
    }
}

/// Accounts:
///   0. [signer]   user
///   1. [writable] pool
///   2. [writable] user stake PDA
///   3. [writable] user stake-token account (destination)
///   4. [writable] stake vault
///   5. []         pool authority PDA
///   6. []         token program
pub fn unstake(
    program_id: &Pubkey,
    user: &Pubkey,
    pool: &Pubkey,
    user_stake_token: &Pubkey,
    amount: u64,
) -> Instruction {
    let (user_stake, _) = find_user_stake_address(program_id, pool, user);
    let (stake_vault, _) = find_stake_vault_address(program_id, pool);
    let authority = PoolAuthority::derive(program_id, pool);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*user, true),
            AccountMeta::new(*pool, false),
            AccountMeta::new(user_stake, false),
            AccountMeta::new(*user_stake_token, false),
            AccountMeta::new(stake_vault, false),
            AccountMeta::new_readonly(*authority.address(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: AmountArgs { amount }.data(IX_UNSTAKE),
    }
}

/// Accounts:
///   0. [signer]   user
///   1. [writable] pool
///   2. [writable] user stake PDA
///   3. [writable] user reward-token account (destination)
///   4. [writable] reward vault
///   5. []         pool authority PDA
///   6. []         token program
pub fn claim(
    program_id: &Pubkey,
    user: &Pubkey,
    pool: &Pubkey,
    user_reward_token: &Pubkey,
) -> Instruction {
    let (user_stake, _) = find_user_stake_address(program_id, pool, user);
    let (reward_vault, _) = find_reward_vault_address(program_id, pool);
    let authority = PoolAuthority::derive(program_id, pool);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*user, true),
            AccountMeta::new(*pool, false),
            AccountMeta::new(user_stake, false),
            AccountMeta::new(*user_reward_token, false),
            AccountMeta::new(reward_vault, false),
            AccountMeta::new_readonly(*authority.address(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: vec![IX_CLAIM],
    }
}

/// Accounts:
///   0. [signer]   funder
///   1. [writable] pool
///   2. [writable] funder reward-token account (source)
///   3. [writable] reward vault
///   4. []         token program
pub fn fund_rewards(
    program_id: &Pubkey,
    funder: &Pubkey,
    pool: &Pubkey,
    funder_reward_token: &Pubkey,
    amount: u64,
) -> Instruction {
    let (reward_vault, _) = find_reward_vault_address(program_id, pool);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*funder, true),
            AccountMeta::new(*pool, false),
            AccountMeta::new(*funder_reward_token, false),
            AccountMeta::new(reward_vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: AmountArgs { amount }.data(IX_FUND_REWARDS),
    }
}

/// Accounts:
///   0. [signer, writable] user (receives the rent lamports)
///   1. []         pool
///   2. [writable] user stake PDA
pub fn close_user_stake(program_id: &Pubkey, user: &Pubkey, pool: &Pubkey) -> Instruction {
    let (user_stake, _) = find_user_stake_address(program_id, pool, user);

    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*user, true),
            AccountMeta::new_readonly(*pool, false),
            AccountMeta::new(user_stake, false),
        ],
        data: vec![IX_CLOSE_USER_STAKE],
    }
}
