//! Raw decoding of the staking program's on-chain accounts.
//!
//! Accounts carry an 8-byte discriminator followed by little-endian fields;
//! only the fields the rate and reward calculators need are decoded here.

use crate::error::Error;
use solana_sdk::pubkey::Pubkey;

pub const PROJECT_SEED: &[u8] = b"project";
pub const STAKE_SEED: &[u8] = b"stake";

const DISCRIMINATOR_LEN: usize = 8;

/// SPL token account amount field, past mint (32) and owner (32). The same
/// offset holds for token-2022 accounts regardless of trailing extensions.
const TOKEN_AMOUNT_OFFSET: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateMode {
    /// Locked pool, pays the fixed annual bps rate.
    Fixed,
    /// Variable pool, rate derived from utilization.
    Variable,
}

impl From<u8> for RateMode {
    fn from(raw: u8) -> Self {
        if raw == 0 {
            RateMode::Fixed
        } else {
            RateMode::Variable
        }
    }
}

/// Snapshot of a staking pool's project account.
#[derive(Debug, Clone, Copy)]
pub struct StakeProject {
    pub rate_mode: RateMode,
    pub rate_bps_per_year: u16,
    pub reward_rate_per_second: u64,
    pub total_staked: u64,
    pub last_update_time: i64,
    pub pool_end_time: i64,
}

/// Snapshot of a user's stake account within a project.
#[derive(Debug, Clone, Copy)]
pub struct UserStake {
    pub amount: u64,
    pub rewards_pending: u64,
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let end = self.offset + N;
        let slice = self
            .data
            .get(self.offset..end)
            .ok_or(Error::AccountTooShort(self.data.len()))?;
        self.offset = end;
        Ok(slice.try_into().expect("slice length checked"))
    }

    fn u8(&mut self) -> Result<u8, Error> {
        Ok(self.take::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16, Error> {
        Ok(u16::from_le_bytes(self.take::<2>()?))
    }

    fn u64(&mut self) -> Result<u64, Error> {
        Ok(u64::from_le_bytes(self.take::<8>()?))
    }

    fn i64(&mut self) -> Result<i64, Error> {
        Ok(i64::from_le_bytes(self.take::<8>()?))
    }
}

impl StakeProject {
    pub fn unpack(data: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(data, DISCRIMINATOR_LEN);
        Ok(Self {
            rate_mode: RateMode::from(reader.u8()?),
            rate_bps_per_year: reader.u16()?,
            reward_rate_per_second: reader.u64()?,
            total_staked: reader.u64()?,
            last_update_time: reader.i64()?,
            pool_end_time: reader.i64()?,
        })
    }
}

impl UserStake {
    pub fn unpack(data: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(data, DISCRIMINATOR_LEN);
        Ok(Self {
            amount: reader.u64()?,
            rewards_pending: reader.u64()?,
        })
    }
}

pub fn find_project_address(program_id: &Pubkey, token_mint: &Pubkey, pool_id: u32) -> Pubkey {
    Pubkey::find_program_address(
        &[PROJECT_SEED, token_mint.as_ref(), &pool_id.to_le_bytes()],
        program_id,
    )
    .0
}

pub fn find_stake_address(
    program_id: &Pubkey,
    token_mint: &Pubkey,
    pool_id: u32,
    owner: &Pubkey,
) -> Pubkey {
    Pubkey::find_program_address(
        &[
            STAKE_SEED,
            token_mint.as_ref(),
            &pool_id.to_le_bytes(),
            owner.as_ref(),
        ],
        program_id,
    )
    .0
}

/// Pulls the raw token amount out of an SPL token account without a full
/// layout unpack, so token-2022 accounts with extensions decode the same way.
pub fn token_account_amount(data: &[u8]) -> Result<u64, Error> {
    let mut reader = Reader::new(data, TOKEN_AMOUNT_OFFSET);
    reader.u64()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_bytes(
        rate_mode: u8,
        bps: u16,
        rate: u64,
        staked: u64,
        last_update: i64,
        end: i64,
    ) -> Vec<u8> {
        let mut data = vec![0u8; DISCRIMINATOR_LEN];
        data.push(rate_mode);
        data.extend_from_slice(&bps.to_le_bytes());
        data.extend_from_slice(&rate.to_le_bytes());
        data.extend_from_slice(&staked.to_le_bytes());
        data.extend_from_slice(&last_update.to_le_bytes());
        data.extend_from_slice(&end.to_le_bytes());
        data
    }

    #[test]
    fn unpacks_project_fields() {
        let data = project_bytes(1, 850, 123_456, 9_000_000_000, 1_700_000_000, 1_750_000_000);
        let project = StakeProject::unpack(&data).unwrap();
        assert_eq!(project.rate_mode, RateMode::Variable);
        assert_eq!(project.rate_bps_per_year, 850);
        assert_eq!(project.reward_rate_per_second, 123_456);
        assert_eq!(project.total_staked, 9_000_000_000);
        assert_eq!(project.last_update_time, 1_700_000_000);
        assert_eq!(project.pool_end_time, 1_750_000_000);
    }

    #[test]
    fn short_account_is_rejected() {
        let data = vec![0u8; 12];
        assert!(matches!(
            StakeProject::unpack(&data),
            Err(Error::AccountTooShort(12))
        ));
    }

    #[test]
    fn token_amount_reads_offset_64() {
        let mut data = vec![0u8; 165];
        data[64..72].copy_from_slice(&42_000_000_000u64.to_le_bytes());
        assert_eq!(token_account_amount(&data).unwrap(), 42_000_000_000);
    }

    #[test]
    fn token_amount_holds_with_extensions() {
        // Token-2022 accounts append extension bytes past the base layout.
        let mut data = vec![0u8; 300];
        data[64..72].copy_from_slice(&7u64.to_le_bytes());
        assert_eq!(token_account_amount(&data).unwrap(), 7);
    }
}
