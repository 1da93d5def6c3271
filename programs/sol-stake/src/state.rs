use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::{
    accrual::{accrue, elapsed_seconds},
    authority::{POOL_SEED, USER_STAKE_SEED},
    error::StakeError,
};

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub is_initialized: bool,
    /// Creator of the pool. Carries no runtime privileges.
    pub owner: Pubkey,
    pub stake_mint: Pubkey,
    pub reward_mint: Pubkey,
    pub stake_vault: Pubkey,
    pub reward_vault: Pubkey,
    /// PDA that owns both vaults.
    pub authority: Pubkey,
    /// Reward units per staked unit per second, scaled by `REWARD_RATE_SCALE`.
    pub reward_rate: u64,
    /// Upper bound on `total_staked`; zero leaves the pool uncapped.
    pub stake_cap: u64,
    /// Always equal to the stake vault balance once an instruction completes.
    pub total_staked: u64,
    pub total_rewards_funded: u64,
    pub total_rewards_claimed: u64,
    pub last_update_time: i64,
    pub created_at: i64,
    pub bump: u8,
    pub authority_bump: u8,
}

impl Pool {
    // 1 + 32*6 + 8*5 + 8*2 + 1*2 = 251
    pub const SIZE: usize = 251;

    /// Check that `key` is this pool's derived address.
    pub fn verify_address(&self, program_id: &Pubkey, key: &Pubkey) -> Result<(), StakeError> {
        crate::authority::verify_address(
            program_id,
            &[POOL_SEED, self.owner.as_ref(), self.stake_mint.as_ref()],
            self.bump,
            key,
        )
    }

    /// Advance the pool-level settlement timestamp.
    pub fn touch(&mut self, now: i64) -> Result<(), StakeError> {
        if now < self.last_update_time {
            return Err(StakeError::ClockRegression);
        }
        self.last_update_time = now;
        Ok(())
    }

    /// Credit `amount` of freshly deposited stake to `user`.
    /// `user` must already be settled up to now.
    pub fn record_stake(&mut self, user: &mut UserStake, amount: u64) -> Result<(), StakeError> {
        if amount == 0 {
            return Err(StakeError::InvalidAmount);
        }
        let staked_amount = user
            .staked_amount
            .checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;
        let total_staked = self
            .total_staked
            .checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;
        if self.stake_cap != 0 && total_staked > self.stake_cap {
            return Err(StakeError::StakeCapExceeded);
        }

        user.staked_amount = staked_amount;
        self.total_staked = total_staked;
        Ok(())
    }

    /// Debit `amount` of stake from `user`.
    /// `user` must already be settled up to now.
    pub fn record_unstake(&mut self, user: &mut UserStake, amount: u64) -> Result<(), StakeError> {
        if amount == 0 {
            return Err(StakeError::InvalidAmount);
        }
        let staked_amount = user
            .staked_amount
            .checked_sub(amount)
            .ok_or(StakeError::InsufficientStakedBalance)?;
        // Only reachable if the per-user ledgers and the pool total diverged.
        let total_staked = self
            .total_staked
            .checked_sub(amount)
            .ok_or(StakeError::InsufficientStakedBalance)?;

        user.staked_amount = staked_amount;
        self.total_staked = total_staked;
        Ok(())
    }

    /// Move the user's entire unclaimed reward out of the ledger. Returns the
    /// amount the caller must transfer out of the reward vault.
    pub fn record_claim(&mut self, user: &mut UserStake) -> Result<u64, StakeError> {
        let amount = user.unclaimed_reward;
        let user_total = user
            .total_claimed
            .checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;
        let pool_total = self
            .total_rewards_claimed
            .checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;

        user.unclaimed_reward = 0;
        user.total_claimed = user_total;
        self.total_rewards_claimed = pool_total;
        Ok(amount)
    }

    pub fn record_funding(&mut self, amount: u64) -> Result<(), StakeError> {
        if amount == 0 {
            return Err(StakeError::InvalidAmount);
        }
        self.total_rewards_funded = self
            .total_rewards_funded
            .checked_add(amount)
            .ok_or(StakeError::ArithmeticOverflow)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UserStake
// ---------------------------------------------------------------------------

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserStake {
    pub is_initialized: bool,
    pub owner: Pubkey,
    pub pool: Pubkey,
    pub staked_amount: u64,
    pub reward_checkpoint_time: i64,
    pub unclaimed_reward: u64,
    /// Accrued fraction of a reward unit, scaled by `REWARD_RATE_SCALE`.
    pub reward_carry: u128,
    pub total_claimed: u64,
    pub bump: u8,
}

impl UserStake {
    // 1 + 32 + 32 + 8 + 8 + 8 + 16 + 8 + 1 = 114
    pub const SIZE: usize = 114;

    pub fn new(owner: Pubkey, pool: Pubkey, now: i64, bump: u8) -> Self {
        Self {
            is_initialized: true,
            owner,
            pool,
            staked_amount: 0,
            reward_checkpoint_time: now,
            unclaimed_reward: 0,
            reward_carry: 0,
            total_claimed: 0,
            bump,
        }
    }

    pub fn verify_address(&self, program_id: &Pubkey, key: &Pubkey) -> Result<(), StakeError> {
        crate::authority::verify_address(
            program_id,
            &[USER_STAKE_SEED, self.pool.as_ref(), self.owner.as_ref()],
            self.bump,
            key,
        )
    }

    /// Accrue reward from the last checkpoint up to `now` and move the
    /// checkpoint forward. Returns the amount added to `unclaimed_reward`.
    pub fn settle(&mut self, reward_rate: u64, now: i64) -> Result<u64, StakeError> {
        let elapsed = elapsed_seconds(self.reward_checkpoint_time, now)?;
        let accrual = accrue(self.staked_amount, reward_rate, elapsed, self.reward_carry)?;
        let unclaimed = self
            .unclaimed_reward
            .checked_add(accrual.earned)
            .ok_or(StakeError::ArithmeticOverflow)?;

        self.unclaimed_reward = unclaimed;
        self.reward_carry = accrual.carry;
        self.reward_checkpoint_time = now;
        Ok(accrual.earned)
    }

    pub fn is_empty(&self) -> bool {
        self.staked_amount == 0 && self.unclaimed_reward == 0
    }
}
