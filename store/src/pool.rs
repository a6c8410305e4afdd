use crate::models::Pool;
use crate::{Store, StoreError};
use uuid::Uuid;

/// How an update/delete addresses a pool: by row id, or by the
/// (token_mint, pool_id) pair the chain program keys on.
#[derive(Debug, Clone)]
pub enum PoolKey {
    Id(Uuid),
    Mint { token_mint: String, pool_id: i32 },
}

#[derive(Debug, Default)]
pub struct CreatePool {
    pub token_mint: String,
    pub pool_id: i32,
    pub name: String,
    pub symbol: String,
    pub pool_type: String,
    pub apr: Option<f64>,
    pub apy: Option<f64>,
    pub lock_period: Option<i32>,
    pub rewards: Option<String>,
    pub logo: Option<String>,
    pub pair_address: Option<String>,
    pub featured: bool,
    pub hidden: bool,
    pub transfer_tax_bps: i32,
}

#[derive(Debug, Default)]
pub struct UpdatePool {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub pool_type: Option<String>,
    pub apr: Option<f64>,
    pub apy: Option<f64>,
    pub lock_period: Option<i32>,
    pub rewards: Option<String>,
    pub logo: Option<String>,
    pub pair_address: Option<String>,
    pub featured: Option<bool>,
    pub hidden: Option<bool>,
    pub is_paused: Option<bool>,
    pub is_initialized: Option<bool>,
    pub is_emergency_unlocked: Option<bool>,
    pub platform_fee_percent: Option<f64>,
    pub flat_sol_fee: Option<f64>,
    pub transfer_tax_bps: Option<i32>,
}

const POOL_COLUMNS: &str = r#"
    id, token_mint, pool_id, name, symbol, pool_type, apr, apy, lock_period,
    rewards, logo, pair_address, featured, hidden, is_paused, is_initialized,
    is_emergency_unlocked, platform_fee_percent, flat_sol_fee,
    transfer_tax_bps, views, created_at, updated_at
"#;

impl Store {
    /// Pools shown to users: not hidden, not paused, featured first.
    pub async fn list_visible_pools(&self) -> Result<Vec<Pool>, StoreError> {
        let pools = sqlx::query_as::<_, Pool>(&format!(
            r#"
            SELECT {POOL_COLUMNS}
            FROM pools
            WHERE hidden = FALSE AND is_paused = FALSE
            ORDER BY featured DESC, token_mint ASC, pool_id ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(pools)
    }

    pub async fn create_pool(&self, req: CreatePool) -> Result<Pool, StoreError> {
        let pool = sqlx::query_as::<_, Pool>(&format!(
            r#"
            INSERT INTO pools
                (token_mint, pool_id, name, symbol, pool_type, apr, apy,
                 lock_period, rewards, logo, pair_address, featured, hidden,
                 transfer_tax_bps)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {POOL_COLUMNS}
            "#
        ))
        .bind(&req.token_mint)
        .bind(req.pool_id)
        .bind(&req.name)
        .bind(&req.symbol)
        .bind(&req.pool_type)
        .bind(req.apr)
        .bind(req.apy)
        .bind(req.lock_period)
        .bind(&req.rewards)
        .bind(&req.logo)
        .bind(&req.pair_address)
        .bind(req.featured)
        .bind(req.hidden)
        .bind(req.transfer_tax_bps)
        .fetch_one(&self.pool)
        .await?;

        Ok(pool)
    }

    pub async fn update_pool(&self, key: PoolKey, req: UpdatePool) -> Result<Pool, StoreError> {
        let set_clause = r#"
            name = COALESCE($1, name),
            symbol = COALESCE($2, symbol),
            pool_type = COALESCE($3, pool_type),
            apr = COALESCE($4, apr),
            apy = COALESCE($5, apy),
            lock_period = COALESCE($6, lock_period),
            rewards = COALESCE($7, rewards),
            logo = COALESCE($8, logo),
            pair_address = COALESCE($9, pair_address),
            featured = COALESCE($10, featured),
            hidden = COALESCE($11, hidden),
            is_paused = COALESCE($12, is_paused),
            is_initialized = COALESCE($13, is_initialized),
            is_emergency_unlocked = COALESCE($14, is_emergency_unlocked),
            platform_fee_percent = COALESCE($15, platform_fee_percent),
            flat_sol_fee = COALESCE($16, flat_sol_fee),
            transfer_tax_bps = COALESCE($17, transfer_tax_bps),
            updated_at = NOW()
        "#;

        let sql = match &key {
            PoolKey::Id(_) => format!(
                "UPDATE pools SET {set_clause} WHERE id = $18 RETURNING {POOL_COLUMNS}"
            ),
            PoolKey::Mint { .. } => format!(
                "UPDATE pools SET {set_clause} WHERE token_mint = $18 AND pool_id = $19 RETURNING {POOL_COLUMNS}"
            ),
        };

        let query = sqlx::query_as::<_, Pool>(&sql)
            .bind(req.name)
            .bind(req.symbol)
            .bind(req.pool_type)
            .bind(req.apr)
            .bind(req.apy)
            .bind(req.lock_period)
            .bind(req.rewards)
            .bind(req.logo)
            .bind(req.pair_address)
            .bind(req.featured)
            .bind(req.hidden)
            .bind(req.is_paused)
            .bind(req.is_initialized)
            .bind(req.is_emergency_unlocked)
            .bind(req.platform_fee_percent)
            .bind(req.flat_sol_fee)
            .bind(req.transfer_tax_bps);

        let query = match key {
            PoolKey::Id(id) => query.bind(id),
            PoolKey::Mint {
                token_mint,
                pool_id,
            } => query.bind(token_mint).bind(pool_id),
        };

        let pool = query.fetch_optional(&self.pool).await?;
        pool.ok_or(StoreError::NotFound)
    }

    pub async fn delete_pool(&self, key: PoolKey) -> Result<Pool, StoreError> {
        let pool = match key {
            PoolKey::Id(id) => {
                sqlx::query_as::<_, Pool>(&format!(
                    "DELETE FROM pools WHERE id = $1 RETURNING {POOL_COLUMNS}"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            PoolKey::Mint {
                token_mint,
                pool_id,
            } => {
                sqlx::query_as::<_, Pool>(&format!(
                    "DELETE FROM pools WHERE token_mint = $1 AND pool_id = $2 RETURNING {POOL_COLUMNS}"
                ))
                .bind(token_mint)
                .bind(pool_id)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        pool.ok_or(StoreError::NotFound)
    }
}
