//! Live APR/APY derivation from on-chain pool state, with a short TTL cache
//! keyed by (token mint, pool id) to bound RPC volume.

use crate::accounts::{self, RateMode, StakeProject};
use crate::error::Error;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const SECONDS_PER_YEAR: u64 = 31_536_000;
pub const RATE_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateKind {
    Apr,
    Apy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveRate {
    /// Annual rate in percent.
    pub rate: f64,
    pub kind: RateKind,
}

/// Derives the annual rate from a project snapshot.
///
/// Fixed pools report their configured bps as an APY. Variable pools derive
/// APR as (reward_rate_per_second * seconds_per_year * 10000) / total_staked,
/// kept in big integers until the final percent conversion so staked amounts
/// past 2^53 lose nothing.
pub fn derive_rate(project: &StakeProject) -> LiveRate {
    match project.rate_mode {
        RateMode::Fixed => LiveRate {
            rate: project.rate_bps_per_year as f64 / 100.0,
            kind: RateKind::Apy,
        },
        RateMode::Variable => {
            if project.total_staked == 0 || project.reward_rate_per_second == 0 {
                return LiveRate {
                    rate: 0.0,
                    kind: RateKind::Apr,
                };
            }
            let annual_bps = BigUint::from(project.reward_rate_per_second)
                * BigUint::from(SECONDS_PER_YEAR)
                * BigUint::from(10_000u32)
                / BigUint::from(project.total_staked);
            LiveRate {
                rate: annual_bps.to_f64().unwrap_or(f64::MAX) / 100.0,
                kind: RateKind::Apr,
            }
        }
    }
}

struct CacheEntry {
    rate: LiveRate,
    cached_at: Instant,
}

/// Best-effort rate cache. Two concurrent misses may both fetch; that is
/// accepted rather than guarded.
pub struct RateCache {
    ttl: Duration,
    entries: Mutex<HashMap<(String, u32), CacheEntry>>,
}

impl RateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, token_mint: &str, pool_id: u32, now: Instant) -> Option<LiveRate> {
        let entries = self.entries.lock().expect("rate cache poisoned");
        let entry = entries.get(&(token_mint.to_string(), pool_id))?;
        if now.duration_since(entry.cached_at) < self.ttl {
            Some(entry.rate)
        } else {
            None
        }
    }

    pub fn insert(&self, token_mint: &str, pool_id: u32, rate: LiveRate, now: Instant) {
        let mut entries = self.entries.lock().expect("rate cache poisoned");
        entries.insert(
            (token_mint.to_string(), pool_id),
            CacheEntry {
                rate,
                cached_at: now,
            },
        );
    }
}

pub struct RateService {
    rpc: Arc<RpcClient>,
    program_id: Pubkey,
    cache: RateCache,
}

impl RateService {
    pub fn new(rpc: Arc<RpcClient>, program_id: Pubkey) -> Self {
        Self {
            rpc,
            program_id,
            cache: RateCache::new(RATE_CACHE_TTL),
        }
    }

    /// Cached live rate for a pool. Errors bubble up so callers can fall
    /// back to their stored static rate.
    pub async fn live_rate(&self, token_mint: &str, pool_id: u32) -> Result<LiveRate, Error> {
        if let Some(rate) = self.cache.get(token_mint, pool_id, Instant::now()) {
            return Ok(rate);
        }

        let mint = Pubkey::from_str(token_mint)
            .map_err(|_| Error::InvalidPubkey(token_mint.to_string()))?;
        let project_address = accounts::find_project_address(&self.program_id, &mint, pool_id);
        let account = self.rpc.get_account(&project_address).await?;
        let project = StakeProject::unpack(&account.data)?;

        let rate = derive_rate(&project);
        self.cache.insert(token_mint, pool_id, rate, Instant::now());
        Ok(rate)
    }

    pub async fn fetch_project(&self, token_mint: &Pubkey, pool_id: u32) -> Result<StakeProject, Error> {
        let project_address = accounts::find_project_address(&self.program_id, token_mint, pool_id);
        let account = self.rpc.get_account(&project_address).await?;
        StakeProject::unpack(&account.data)
    }

    pub async fn fetch_stake(
        &self,
        token_mint: &Pubkey,
        pool_id: u32,
        owner: &Pubkey,
    ) -> Result<crate::accounts::UserStake, Error> {
        let stake_address =
            accounts::find_stake_address(&self.program_id, token_mint, pool_id, owner);
        let account = self.rpc.get_account(&stake_address).await?;
        crate::accounts::UserStake::unpack(&account.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable_project(rate: u64, staked: u64) -> StakeProject {
        StakeProject {
            rate_mode: RateMode::Variable,
            rate_bps_per_year: 0,
            reward_rate_per_second: rate,
            total_staked: staked,
            last_update_time: 0,
            pool_end_time: 0,
        }
    }

    #[test]
    fn fixed_rate_is_bps_over_100() {
        for bps in [0u16, 1, 850, 10_000, u16::MAX] {
            let project = StakeProject {
                rate_mode: RateMode::Fixed,
                rate_bps_per_year: bps,
                reward_rate_per_second: 999,
                total_staked: 999,
                last_update_time: 0,
                pool_end_time: 0,
            };
            let live = derive_rate(&project);
            assert_eq!(live.kind, RateKind::Apy);
            assert_eq!(live.rate, bps as f64 / 100.0);
        }
    }

    #[test]
    fn zero_staked_or_zero_rate_is_zero() {
        assert_eq!(derive_rate(&variable_project(0, 1_000_000)).rate, 0.0);
        assert_eq!(derive_rate(&variable_project(1_000_000, 0)).rate, 0.0);
    }

    #[test]
    fn variable_rate_matches_formula() {
        // 1 token/sec distributed over 31.536M staked = 100% APR.
        let live = derive_rate(&variable_project(1_000_000_000, SECONDS_PER_YEAR * 1_000_000_000));
        assert_eq!(live.kind, RateKind::Apr);
        assert!((live.rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn variable_rate_survives_large_totals() {
        // Values past 2^53 would lose precision in f64 intermediates.
        let live = derive_rate(&variable_project(u64::MAX / SECONDS_PER_YEAR, u64::MAX));
        assert!(live.rate > 0.0);
        assert!(live.rate.is_finite());
    }

    #[test]
    fn cache_serves_fresh_and_expires_stale() {
        let cache = RateCache::new(Duration::from_secs(30));
        let now = Instant::now();
        let rate = LiveRate {
            rate: 12.5,
            kind: RateKind::Apr,
        };

        cache.insert("mint", 0, rate, now);
        assert_eq!(cache.get("mint", 0, now + Duration::from_secs(29)), Some(rate));
        assert_eq!(cache.get("mint", 0, now + Duration::from_secs(31)), None);
        assert_eq!(cache.get("mint", 1, now), None);
    }
}
