use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
    sysvar::Sysvar,
};

use crate::{
    authority::{
        create_pda_account, find_pool_address, find_reward_vault_address,
        find_stake_vault_address, find_user_stake_address, PoolAuthority, POOL_SEED,
        REWARD_VAULT_SEED, STAKE_VAULT_SEED, USER_STAKE_SEED,
    },
    error::StakeError,
    instruction::{AmountArgs, InitializeArgs},
    state::{Pool, UserStake},
    vault,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn assert_signer(account: &AccountInfo) -> ProgramResult {
    if !account.is_signer {
        return Err(StakeError::Unauthorized.into());
    }
    Ok(())
}

fn assert_writable(account: &AccountInfo) -> ProgramResult {
    if !account.is_writable {
        return Err(StakeError::AccountNotWritable.into());
    }
    Ok(())
}

fn assert_owned_by(account: &AccountInfo, owner: &Pubkey) -> ProgramResult {
    if account.owner != owner {
        return Err(StakeError::InvalidOwner.into());
    }
    Ok(())
}

fn assert_token_program(account: &AccountInfo) -> ProgramResult {
    if *account.key != spl_token::id() {
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

fn assert_system_program(account: &AccountInfo) -> ProgramResult {
    if *account.key != system_program::id() {
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

/// Deserialize the pool and check it is the program-owned record living at
/// its own derived address.
fn load_pool(program_id: &Pubkey, pool_account: &AccountInfo) -> Result<Pool, ProgramError> {
    assert_owned_by(pool_account, program_id)?;
    if pool_account.data_is_empty() {
        return Err(StakeError::NotInitialized.into());
    }
    let pool = Pool::try_from_slice(&pool_account.data.borrow())?;
    if !pool.is_initialized {
        return Err(StakeError::NotInitialized.into());
    }
    pool.verify_address(program_id, pool_account.key)?;
    Ok(pool)
}

/// Deserialize an existing user stake and check it belongs to `user` and `pool`.
fn load_user_stake(
    program_id: &Pubkey,
    stake_account: &AccountInfo,
    pool: &Pubkey,
    user: &Pubkey,
) -> Result<UserStake, ProgramError> {
    assert_owned_by(stake_account, program_id)?;
    let stake = UserStake::try_from_slice(&stake_account.data.borrow())?;
    if !stake.is_initialized {
        return Err(StakeError::NotInitialized.into());
    }
    if stake.owner != *user || stake.pool != *pool {
        return Err(StakeError::Unauthorized.into());
    }
    stake.verify_address(program_id, stake_account.key)?;
    Ok(stake)
}

/// Rebuild the pool authority from its stored bump and require both the
/// supplied account and the stored pool field to match it.
fn verify_authority(
    program_id: &Pubkey,
    pool_key: &Pubkey,
    pool: &Pool,
    authority_account: &AccountInfo,
) -> Result<PoolAuthority, ProgramError> {
    let authority = PoolAuthority::from_bump(program_id, pool_key, pool.authority_bump)?;
    if authority.address() != authority_account.key {
        return Err(StakeError::Unauthorized.into());
    }
    if pool.authority != *authority.address() {
        return Err(StakeError::Unauthorized.into());
    }
    Ok(authority)
}

fn current_time() -> Result<i64, ProgramError> {
    Ok(Clock::get()?.unix_timestamp)
}

// ---------------------------------------------------------------------------
// Instruction: Initialize (discriminator 0)
// ---------------------------------------------------------------------------
// Accounts:
//   0. [signer, writable] creator (payer)
//   1. [writable] pool PDA
//   2. []         stake mint
//   3. []         reward mint
//   4. [writable] stake vault PDA
//   5. [writable] reward vault PDA
//   6. []         pool authority PDA
//   7. []         token program
//   8. []         system program

pub fn process_initialize(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let args = InitializeArgs::try_from_slice(data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;

    if args.reward_rate == 0 {
        return Err(StakeError::InvalidAmount.into());
    }

    let account_iter = &mut accounts.iter();
    let creator = next_account_info(account_iter)?;
    let pool_account = next_account_info(account_iter)?;
    let stake_mint = next_account_info(account_iter)?;
    let reward_mint = next_account_info(account_iter)?;
    let stake_vault = next_account_info(account_iter)?;
    let reward_vault = next_account_info(account_iter)?;
    let authority_account = next_account_info(account_iter)?;
    let token_program = next_account_info(account_iter)?;
    let system_program = next_account_info(account_iter)?;

    assert_signer(creator)?;
    assert_writable(creator)?;
    assert_writable(pool_account)?;
    assert_writable(stake_vault)?;
    assert_writable(reward_vault)?;
    assert_token_program(token_program)?;
    assert_system_program(system_program)?;

    let (pool_pda, pool_bump) = find_pool_address(program_id, creator.key, stake_mint.key);
    if pool_account.key != &pool_pda {
        return Err(StakeError::Unauthorized.into());
    }

    if !pool_account.data_is_empty() {
        return Err(StakeError::AlreadyInitialized.into());
    }

    let (stake_vault_pda, stake_vault_bump) = find_stake_vault_address(program_id, &pool_pda);
    if stake_vault.key != &stake_vault_pda {
        return Err(StakeError::Unauthorized.into());
    }

    let (reward_vault_pda, reward_vault_bump) = find_reward_vault_address(program_id, &pool_pda);
    if reward_vault.key != &reward_vault_pda {
        return Err(StakeError::Unauthorized.into());
    }

    let authority = PoolAuthority::verify(program_id, &pool_pda, authority_account.key)?;

    // Both must be real SPL mints before any vault is bound to them.
    vault::load_mint(stake_mint)?;
    vault::load_mint(reward_mint)?;

    let now = current_time()?;

    create_pda_account(
        creator,
        Pool::SIZE,
        program_id,
        system_program,
        pool_account,
        &[POOL_SEED, creator.key.as_ref(), stake_mint.key.as_ref(), &[pool_bump]],
    )?;

    vault::create_vault(
        creator,
        stake_vault,
        stake_mint,
        &authority,
        &[STAKE_VAULT_SEED, pool_pda.as_ref(), &[stake_vault_bump]],
        token_program,
        system_program,
    )?;

    vault::create_vault(
        creator,
        reward_vault,
        reward_mint,
        &authority,
        &[REWARD_VAULT_SEED, pool_pda.as_ref(), &[reward_vault_bump]],
        token_program,
        system_program,
    )?;

    let pool = Pool {
        is_initialized: true,
        owner: *creator.key,
        stake_mint: *stake_mint.key,
        reward_mint: *reward_mint.key,
        stake_vault: stake_vault_pda,
        reward_vault: reward_vault_pda,
        authority: *authority.address(),
        reward_rate: args.reward_rate,
        stake_cap: args.stake_cap,
        total_staked: 0,
        total_rewards_funded: 0,
        total_rewards_claimed: 0,
        last_update_time: now,
        created_at: now,
        bump: pool_bump,
        authority_bump: authority.bump(),
    };

    pool.serialize(&mut &mut pool_account.data.borrow_mut()[..])?;

    msg!(
        "EVENT:PoolInitialized:{{\"pool\":\"{}\",\"owner\":\"{}\",\"stake_mint\":\"{}\",\"reward_mint\":\"{}\",\"reward_rate\":{},\"stake_cap\":{}}}",
        pool_account.key,
        creator.key,
        stake_mint.key,
        reward_mint.key,
        args.reward_rate,
        args.stake_cap,
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Instruction: Stake (discriminator 1)
// ---------------------------------------------------------------------------
// Accounts:
//   0. [signer, writable] user (payer)
//   1. [writable] pool
//   2. [writable] user stake PDA
//   3. [writable] user stake-token account (source)
//   4. []         user reward-token account
//   5. [writable] stake vault
//   6. []         reward vault
//   7. []         pool authority PDA
//   8. []         token program
//   9. []         system program

pub fn process_stake(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let args = AmountArgs::try_from_slice(data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;

    if args.amount == 0 {
        return Err(StakeError::InvalidAmount.into());
    }

    let account_iter = &mut accounts.iter();
    let user = next_account_info(account_iter)?;
    let pool_account = next_account_info(account_iter)?;
    let stake_account = next_account_info(account_iter)?;
    let user_stake_token = next_account_info(account_iter)?;
    let user_reward_token = next_account_info(account_iter)?;
    let stake_vault = next_account_info(account_iter)?;
    let reward_vault = next_account_info(account_iter)?;
    let authority_account = next_account_info(account_iter)?;
    let token_program = next_account_info(account_iter)?;
    let system_program = next_account_info(account_iter)?;

    assert_signer(user)?;
    assert_writable(user)?;
    assert_writable(pool_account)?;
    assert_writable(stake_account)?;
    assert_writable(user_stake_token)?;
    assert_writable(stake_vault)?;
    assert_token_program(token_program)?;
    assert_system_program(system_program)?;

    let mut pool = load_pool(program_id, pool_account)?;
    verify_authority(program_id, pool_account.key, &pool, authority_account)?;

    if *stake_vault.key != pool.stake_vault || *reward_vault.key != pool.reward_vault {
        return Err(StakeError::Unauthorized.into());
    }
    vault::assert_vault(stake_vault, &pool.stake_mint, &pool.authority)?;

    let source = vault::load_token_account(user_stake_token)?;
    if source.mint != pool.stake_mint {
        return Err(StakeError::MintMismatch.into());
    }
    if source.owner != *user.key {
        return Err(StakeError::Unauthorized.into());
    }
    if source.amount < args.amount {
        return Err(StakeError::InsufficientUserBalance.into());
    }

    let reward_destination = vault::load_token_account(user_reward_token)?;
    if reward_destination.mint != pool.reward_mint {
        return Err(StakeError::MintMismatch.into());
    }
    if reward_destination.owner != *user.key {
        return Err(StakeError::Unauthorized.into());
    }

    let (stake_pda, stake_bump) = find_user_stake_address(program_id, pool_account.key, user.key);
    if stake_account.key != &stake_pda {
        return Err(StakeError::Unauthorized.into());
    }

    let now = current_time()?;
    let is_new = stake_account.data_is_empty();

    let mut stake = if is_new {
        UserStake::new(*user.key, *pool_account.key, now, stake_bump)
    } else {
        load_user_stake(program_id, stake_account, pool_account.key, user.key)?
    };

    pool.touch(now)?;
    stake.settle(pool.reward_rate, now)?;
    pool.record_stake(&mut stake, args.amount)?;

    if is_new {
        create_pda_account(
            user,
            UserStake::SIZE,
            program_id,
            system_program,
            stake_account,
            &[USER_STAKE_SEED, pool_account.key.as_ref(), user.key.as_ref(), &[stake_bump]],
        )?;
    }

    vault::deposit(token_program, user_stake_token, stake_vault, user, args.amount)?;

    stake.serialize(&mut &mut stake_account.data.borrow_mut()[..])?;
    pool.serialize(&mut &mut pool_account.data.borrow_mut()[..])?;

    msg!(
        "EVENT:Staked:{{\"pool\":\"{}\",\"user\":\"{}\",\"amount\":{},\"staked_amount\":{},\"total_staked\":{},\"unclaimed_reward\":{}}}",
        pool_account.key,
        user.key,
        args.amount,
        stake.staked_amount,
        pool.total_staked,
        stake.unclaimed_reward,
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Instruction: Unstake (discriminator 2)
// ---------------------------------------------------------------------------
// Accounts:
//   0. [signer]   user
//   1. [writable] pool
//   2. [writable] user stake PDA
//   3. [writable] user stake-token account (destination)
//   4. [writable] stake vault
//   5. []         pool authority PDA
//   6. []         token program

pub fn process_unstake(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let args = AmountArgs::try_from_slice(data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;

    if args.amount == 0 {
        return Err(StakeError::InvalidAmount.into());
    }

    let account_iter = &mut accounts.iter();
    let user = next_account_info(account_iter)?;
    let pool_account = next_account_info(account_iter)?;
    let stake_account = next_account_info(account_iter)?;
    let user_stake_token = next_account_info(account_iter)?;
    let stake_vault = next_account_info(account_iter)?;
    let authority_account = next_account_info(account_iter)?;
    let token_program = next_account_info(account_iter)?;

    assert_signer(user)?;
    assert_writable(pool_account)?;
    assert_writable(stake_account)?;
    assert_writable(user_stake_token)?;
    assert_writable(stake_vault)?;
    assert_token_program(token_program)?;

    let mut pool = load_pool(program_id, pool_account)?;
    let authority = verify_authority(program_id, pool_account.key, &pool, authority_account)?;

    if *stake_vault.key != pool.stake_vault {
        return Err(StakeError::Unauthorized.into());
    }

    let destination = vault::load_token_account(user_stake_token)?;
    if destination.mint != pool.stake_mint {
        return Err(StakeError::MintMismatch.into());
    }
    if destination.owner != *user.key {
        return Err(StakeError::Unauthorized.into());
    }

    let (stake_pda, _) = find_user_stake_address(program_id, pool_account.key, user.key);
    if stake_account.key != &stake_pda {
        return Err(StakeError::Unauthorized.into());
    }
    let mut stake = load_user_stake(program_id, stake_account, pool_account.key, user.key)?;

    let now = current_time()?;
    pool.touch(now)?;
    stake.settle(pool.reward_rate, now)?;
    pool.record_unstake(&mut stake, args.amount)?;

    vault::withdraw(
        &authority,
        token_program,
        stake_vault,
        user_stake_token,
        authority_account,
        args.amount,
    )?;

    stake.serialize(&mut &mut stake_account.data.borrow_mut()[..])?;
    pool.serialize(&mut &mut pool_account.data.borrow_mut()[..])?;

    msg!(
        "EVENT:Unstaked:{{\"pool\":\"{}\",\"user\":\"{}\",\"amount\":{},\"staked_amount\":{},\"total_staked\":{},\"unclaimed_reward\":{}}}",
        pool_account.key,
        user.key,
        args.amount,
        stake.staked_amount,
        pool.total_staked,
        stake.unclaimed_reward,
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Instruction: Claim (discriminator 3)
// ---------------------------------------------------------------------------
// Accounts:
//   0. [signer]   user
//   1. [writable] pool
//   2. [writable] user stake PDA
//   3. [writable] user reward-token account (destination)
//   4. [writable] reward vault
//   5. []         pool authority PDA
//   6. []         token program

pub fn process_claim(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_iter = &mut accounts.iter();
    let user = next_account_info(account_iter)?;
    let pool_account = next_account_info(account_iter)?;
    let stake_account = next_account_info(account_iter)?;
    let user_reward_token = next_account_info(account_iter)?;
    let reward_vault = next_account_info(account_iter)?;
    let authority_account = next_account_info(account_iter)?;
    let token_program = next_account_info(account_iter)?;

    assert_signer(user)?;
    assert_writable(pool_account)?;
    assert_writable(stake_account)?;
    assert_writable(user_reward_token)?;
    assert_writable(reward_vault)?;
    assert_token_program(token_program)?;

    let mut pool = load_pool(program_id, pool_account)?;
    let authority = verify_authority(program_id, pool_account.key, &pool, authority_account)?;

    if *reward_vault.key != pool.reward_vault {
        return Err(StakeError::Unauthorized.into());
    }

    let destination = vault::load_token_account(user_reward_token)?;
    if destination.mint != pool.reward_mint {
        return Err(StakeError::MintMismatch.into());
    }
    if destination.owner != *user.key {
        return Err(StakeError::Unauthorized.into());
    }

    let (stake_pda, _) = find_user_stake_address(program_id, pool_account.key, user.key);
    if stake_account.key != &stake_pda {
        return Err(StakeError::Unauthorized.into());
    }
    let mut stake = load_user_stake(program_id, stake_account, pool_account.key, user.key)?;

    let now = current_time()?;
    pool.touch(now)?;
    stake.settle(pool.reward_rate, now)?;
    let amount = pool.record_claim(&mut stake)?;

    if amount > 0 {
        vault::withdraw(
            &authority,
            token_program,
            reward_vault,
            user_reward_token,
            authority_account,
            amount,
        )?;
    } else {
        msg!("No reward accrued since last claim");
    }

    stake.serialize(&mut &mut stake_account.data.borrow_mut()[..])?;
    pool.serialize(&mut &mut pool_account.data.borrow_mut()[..])?;

    msg!(
        "EVENT:RewardsClaimed:{{\"pool\":\"{}\",\"user\":\"{}\",\"amount\":{},\"total_claimed\":{}}}",
        pool_account.key,
        user.key,
        amount,
        stake.total_claimed,
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Instruction: FundRewards (discriminator 4)
// ---------------------------------------------------------------------------
// Accounts:
//   0. [signer]   funder
//   1. [writable] pool
//   2. [writable] funder reward-token account (source)
//   3. [writable] reward vault
//   4. []         token program

pub fn process_fund_rewards(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8],
) -> ProgramResult {
    let args = AmountArgs::try_from_slice(data)
        .map_err(|_| ProgramError::InvalidInstructionData)?;

    if args.amount == 0 {
        return Err(StakeError::InvalidAmount.into());
    }

    let account_iter = &mut accounts.iter();
    let funder = next_account_info(account_iter)?;
    let pool_account = next_account_info(account_iter)?;
    let funder_reward_token = next_account_info(account_iter)?;
    let reward_vault = next_account_info(account_iter)?;
    let token_program = next_account_info(account_iter)?;

    assert_signer(funder)?;
    assert_writable(pool_account)?;
    assert_writable(funder_reward_token)?;
    assert_writable(reward_vault)?;
    assert_token_program(token_program)?;

    let mut pool = load_pool(program_id, pool_account)?;

    if *reward_vault.key != pool.reward_vault {
        return Err(StakeError::Unauthorized.into());
    }
    vault::assert_vault(reward_vault, &pool.reward_mint, &pool.authority)?;

    let source = vault::load_token_account(funder_reward_token)?;
    if source.mint != pool.reward_mint {
        return Err(StakeError::MintMismatch.into());
    }
    if source.owner != *funder.key {
        return Err(StakeError::Unauthorized.into());
    }
    if source.amount < args.amount {
        return Err(StakeError::InsufficientUserBalance.into());
    }

    pool.record_funding(args.amount)?;

    vault::deposit(token_program, funder_reward_token, reward_vault, funder, args.amount)?;

    pool.serialize(&mut &mut pool_account.data.borrow_mut()[..])?;

    msg!(
        "EVENT:RewardsFunded:{{\"pool\":\"{}\",\"funder\":\"{}\",\"amount\":{},\"reward_vault_balance\":{}}}",
        pool_account.key,
        funder.key,
        args.amount,
        vault::balance(reward_vault)?,
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Instruction: CloseUserStake (discriminator 5)
// ---------------------------------------------------------------------------
// Accounts:
//   0. [signer, writable] user (rent recipient)
//   1. []         pool
//   2. [writable] user stake PDA

pub fn process_close_user_stake(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_iter = &mut accounts.iter();
    let user = next_account_info(account_iter)?;
    let pool_account = next_account_info(account_iter)?;
    let stake_account = next_account_info(account_iter)?;

    assert_signer(user)?;
    assert_writable(user)?;
    assert_writable(stake_account)?;

    let pool = load_pool(program_id, pool_account)?;

    let (stake_pda, _) = find_user_stake_address(program_id, pool_account.key, user.key);
    if stake_account.key != &stake_pda {
        return Err(StakeError::Unauthorized.into());
    }
    let mut stake = load_user_stake(program_id, stake_account, pool_account.key, user.key)?;

    // Settling first makes sure nothing accrued since the last checkpoint is lost.
    let now = current_time()?;
    stake.settle(pool.reward_rate, now)?;
    if !stake.is_empty() {
        return Err(StakeError::StakeAccountNotEmpty.into());
    }

    let lamports = stake_account.lamports();
    **user.try_borrow_mut_lamports()? = user
        .lamports()
        .checked_add(lamports)
        .ok_or(StakeError::ArithmeticOverflow)?;
    **stake_account.try_borrow_mut_lamports()? = 0;
    stake_account.try_borrow_mut_data()?.fill(0);

    msg!(
        "EVENT:UserStakeClosed:{{\"pool\":\"{}\",\"user\":\"{}\",\"lamports\":{}}}",
        pool_account.key,
        user.key,
        lamports,
    );

    Ok(())
}
