use crate::models::Lock;
use crate::{Store, StoreError};
use chrono::{DateTime, Utc};

#[derive(Debug)]
pub struct UpsertLock {
    pub lock_id: i64,
    pub token_mint: String,
    pub name: String,
    pub symbol: String,
    pub amount: f64,
    pub lock_duration: i64,
    pub unlock_time: DateTime<Utc>,
    pub creator_wallet: String,
    pub pool_address: Option<String>,
    pub stake_pda: Option<String>,
    pub pool_id: Option<i32>,
    pub logo: Option<String>,
}

const LOCK_COLUMNS: &str = r#"
    id, lock_id, token_mint, name, symbol, amount, lock_duration, unlock_time,
    creator_wallet, pool_address, stake_pda, pool_id, logo, is_active,
    is_unlocked, created_at, updated_at
"#;

impl Store {
    pub async fn list_locks(
        &self,
        wallet: Option<&str>,
        active_only: bool,
    ) -> Result<Vec<Lock>, StoreError> {
        let locks = sqlx::query_as::<_, Lock>(&format!(
            r#"
            SELECT {LOCK_COLUMNS}
            FROM locks
            WHERE ($1::TEXT IS NULL OR creator_wallet = $1)
              AND (NOT $2 OR (is_active = TRUE AND is_unlocked = FALSE))
            ORDER BY created_at DESC
            "#
        ))
        .bind(wallet)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(locks)
    }

    /// Locks are keyed by (token_mint, lock_id); a replayed create refreshes
    /// the amount and unlock time instead of conflicting.
    pub async fn upsert_lock(&self, req: UpsertLock) -> Result<Lock, StoreError> {
        let lock = sqlx::query_as::<_, Lock>(&format!(
            r#"
            INSERT INTO locks
                (lock_id, token_mint, name, symbol, amount, lock_duration,
                 unlock_time, creator_wallet, pool_address, stake_pda, pool_id,
                 logo, is_active, is_unlocked)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, TRUE, FALSE)
            ON CONFLICT (token_mint, lock_id) DO UPDATE
                SET amount = $5, unlock_time = $7, updated_at = NOW()
            RETURNING {LOCK_COLUMNS}
            "#
        ))
        .bind(req.lock_id)
        .bind(&req.token_mint)
        .bind(&req.name)
        .bind(&req.symbol)
        .bind(req.amount)
        .bind(req.lock_duration)
        .bind(req.unlock_time)
        .bind(&req.creator_wallet)
        .bind(&req.pool_address)
        .bind(&req.stake_pda)
        .bind(req.pool_id)
        .bind(&req.logo)
        .fetch_one(&self.pool)
        .await?;

        Ok(lock)
    }
}
