use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lock {
    pub id: Uuid,
    // Serialized as a string: lock ids are wallet-generated millisecond
    // timestamps that overflow JSON number consumers.
    #[serde(serialize_with = "stringify_i64")]
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
    pub is_active: bool,
    pub is_unlocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn stringify_i64<S: serde::Serializer>(v: &i64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&v.to_string())
}
