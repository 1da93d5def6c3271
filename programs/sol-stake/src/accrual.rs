//! Time-based reward accrual.
//!
//! A pool's `reward_rate` is the number of reward-token base units paid per
//! staked base unit per second, scaled by [`REWARD_RATE_SCALE`]. A rate of
//! `1_000_000` therefore pays 0.001 reward units per staked unit per second.

use crate::error::StakeError;

/// Fixed-point scale applied to `reward_rate` (1e9).
pub const REWARD_RATE_SCALE: u128 = 1_000_000_000;

/// Result of settling one accrual interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    /// Whole reward units earned over the interval.
    pub earned: u64,
    /// Remainder below one reward unit, scaled by `REWARD_RATE_SCALE`.
    pub carry: u128,
}

/// Seconds between `checkpoint` and `now`.
pub fn elapsed_seconds(checkpoint: i64, now: i64) -> Result<u64, StakeError> {
    if now < checkpoint {
        return Err(StakeError::ClockRegression);
    }
    let elapsed = now
        .checked_sub(checkpoint)
        .ok_or(StakeError::ArithmeticOverflow)?;
    u64::try_from(elapsed).map_err(|_| StakeError::ArithmeticOverflow)
}

/// Reward owed for holding `staked` for `elapsed` seconds at `reward_rate`.
///
/// `carry` is the sub-unit remainder left over from the previous interval;
/// feeding it back in makes the total independent of how an interval is split.
pub fn accrue(
    staked: u64,
    reward_rate: u64,
    elapsed: u64,
    carry: u128,
) -> Result<Accrual, StakeError> {
    debug_assert!(carry < REWARD_RATE_SCALE);

    let scaled = (staked as u128)
        .checked_mul(reward_rate as u128)
        .ok_or(StakeError::ArithmeticOverflow)?
        .checked_mul(elapsed as u128)
        .ok_or(StakeError::ArithmeticOverflow)?
        .checked_add(carry)
        .ok_or(StakeError::ArithmeticOverflow)?;

    let earned = u64::try_from(scaled / REWARD_RATE_SCALE)
        .map_err(|_| StakeError::ArithmeticOverflow)?;

    Ok(Accrual {
        earned,
        carry: scaled % REWARD_RATE_SCALE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accrue_basic() {
        // 1_000 staked * 1_000_000 rate * 100s / 1e9 = 100
        let a = accrue(1_000, 1_000_000, 100, 0).unwrap();
        assert_eq!(a.earned, 100);
        assert_eq!(a.carry, 0);
    }

    #[test]
    fn test_accrue_keeps_remainder() {
        // 1 * 1_000_000 * 1 = 1e6, below one unit
        let a = accrue(1, 1_000_000, 1, 0).unwrap();
        assert_eq!(a.earned, 0);
        assert_eq!(a.carry, 1_000_000);
    }

    #[test]
    fn test_accrue_split_interval_matches_single() {
        let whole = accrue(7, 333_333_333, 1_000, 0).unwrap();

        let mut earned = 0u64;
        let mut carry = 0u128;
        for _ in 0..1_000 {
            let step = accrue(7, 333_333_333, 1, carry).unwrap();
            earned += step.earned;
            carry = step.carry;
        }

        assert_eq!(earned, whole.earned);
        assert_eq!(carry, whole.carry);
    }

    #[test]
    fn test_accrue_zero_stake_or_time() {
        assert_eq!(accrue(0, 1_000_000, 500, 0).unwrap().earned, 0);
        assert_eq!(accrue(500, 1_000_000, 0, 0).unwrap().earned, 0);
    }

    #[test]
    fn test_accrue_overflow() {
        // u64::MAX * u64::MAX fits in u128, the extra factor does not
        assert_eq!(
            accrue(u64::MAX, u64::MAX, 2, 0),
            Err(StakeError::ArithmeticOverflow)
        );
        // Fits in u128 but the earned amount exceeds u64
        assert_eq!(
            accrue(u64::MAX, 1_000_000_000_000, 1, 0),
            Err(StakeError::ArithmeticOverflow)
        );
    }

    #[test]
    fn test_elapsed_seconds() {
        assert_eq!(elapsed_seconds(100, 160), Ok(60));
        assert_eq!(elapsed_seconds(100, 100), Ok(0));
        assert_eq!(elapsed_seconds(100, 99), Err(StakeError::ClockRegression));
    }
}
