use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: Uuid,
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
    pub is_paused: bool,
    pub is_initialized: bool,
    pub is_emergency_unlocked: bool,
    pub platform_fee_percent: Option<f64>,
    pub flat_sol_fee: Option<f64>,
    pub transfer_tax_bps: i32,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
