//! Display-side pending reward accrual. The authoritative ledger lives on
//! chain; this recomputes what the program would credit if it updated now.

use crate::accounts::{StakeProject, UserStake};
use num_bigint::BigUint;
use num_traits::ToPrimitive;

/// Pending rewards in base units at `now` (unix seconds).
///
/// Newly earned = (stake.amount * reward_rate_per_second * elapsed) /
/// total_staked, with elapsed clamped to the pool end time. All arithmetic is
/// big-integer; nothing here touches f64.
pub fn pending_rewards(project: &StakeProject, stake: &UserStake, now: i64) -> u128 {
    if stake.amount == 0 {
        return 0;
    }
    if now <= project.last_update_time || project.total_staked == 0 {
        return stake.rewards_pending as u128;
    }

    let effective_until = now.min(project.pool_end_time);
    let elapsed = effective_until - project.last_update_time;
    if elapsed <= 0 {
        return stake.rewards_pending as u128;
    }

    let earned = BigUint::from(stake.amount)
        * BigUint::from(project.reward_rate_per_second)
        * BigUint::from(elapsed as u64)
        / BigUint::from(project.total_staked);

    stake.rewards_pending as u128 + earned.to_u128().unwrap_or(u128::MAX)
}

/// Base units to a display amount. Only the final step leaves integers.
pub fn to_ui_amount(base_units: u128, decimals: u8) -> f64 {
    base_units as f64 / 10f64.powi(decimals as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::RateMode;

    fn project(rate: u64, staked: u64, last_update: i64, end: i64) -> StakeProject {
        StakeProject {
            rate_mode: RateMode::Variable,
            rate_bps_per_year: 0,
            reward_rate_per_second: rate,
            total_staked: staked,
            last_update_time: last_update,
            pool_end_time: end,
        }
    }

    #[test]
    fn zero_elapsed_returns_stored_pending() {
        let p = project(1_000, 10_000, 1_000, 2_000);
        let s = UserStake {
            amount: 5_000,
            rewards_pending: 77,
        };
        assert_eq!(pending_rewards(&p, &s, 1_000), 77);
        assert_eq!(pending_rewards(&p, &s, 999), 77);
    }

    #[test]
    fn no_stake_means_no_rewards() {
        let p = project(1_000, 10_000, 1_000, 2_000);
        let s = UserStake {
            amount: 0,
            rewards_pending: 77,
        };
        assert_eq!(pending_rewards(&p, &s, 1_500), 0);
    }

    #[test]
    fn proportional_share_accrues() {
        // Half the pool staked for 100 seconds at 1000/sec = 50_000 earned.
        let p = project(1_000, 10_000, 1_000, 10_000);
        let s = UserStake {
            amount: 5_000,
            rewards_pending: 10,
        };
        assert_eq!(pending_rewards(&p, &s, 1_100), 10 + 50_000);
    }

    #[test]
    fn accrual_clamps_at_pool_end() {
        let p = project(1_000, 10_000, 1_000, 1_200);
        let s = UserStake {
            amount: 10_000,
            rewards_pending: 0,
        };
        let at_end = pending_rewards(&p, &s, 1_200);
        // Any time past the end earns nothing further.
        assert_eq!(pending_rewards(&p, &s, 1_201), at_end);
        assert_eq!(pending_rewards(&p, &s, 5_000_000), at_end);
        assert_eq!(at_end, 200 * 1_000);
    }

    #[test]
    fn ended_before_last_update_earns_nothing_more() {
        let p = project(1_000, 10_000, 1_500, 1_200);
        let s = UserStake {
            amount: 10_000,
            rewards_pending: 42,
        };
        assert_eq!(pending_rewards(&p, &s, 2_000), 42);
    }

    #[test]
    fn survives_values_past_f64_precision() {
        let amount = 1u64 << 62;
        let p = project(1u64 << 40, amount, 0, i64::MAX);
        let s = UserStake {
            amount,
            rewards_pending: 0,
        };
        // Full pool share: earned = rate * elapsed exactly.
        assert_eq!(pending_rewards(&p, &s, 1_000), (1u128 << 40) * 1_000);
    }

    #[test]
    fn ui_amount_scales_by_decimals() {
        assert_eq!(to_ui_amount(1_500_000_000, 9), 1.5);
        assert_eq!(to_ui_amount(0, 9), 0.0);
    }
}
