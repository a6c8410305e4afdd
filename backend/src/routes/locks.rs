use crate::routes::{bad_request, store_error};
use crate::AppState;
use actix_web::{web, HttpResponse, Result};
use chrono::{Duration, Utc};
use serde::Deserialize;
use store::lock::UpsertLock;

#[derive(Deserialize)]
pub struct ListLocksQuery {
    pub wallet: Option<String>,
    pub active: Option<String>,
}

#[actix_web::get("/locks")]
pub async fn list_locks(
    state: web::Data<AppState>,
    query: web::Query<ListLocksQuery>,
) -> Result<HttpResponse> {
    let active_only = query.active.as_deref() == Some("true");

    match state
        .store
        .list_locks(query.wallet.as_deref(), active_only)
        .await
    {
        Ok(locks) => Ok(HttpResponse::Ok().json(locks)),
        Err(e) => Ok(store_error("Failed to fetch locks", e)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLockRequest {
    pub lock_id: Option<i64>,
    pub token_mint: String,
    pub name: String,
    pub symbol: String,
    pub amount: f64,
    /// Seconds until unlock.
    pub lock_duration: i64,
    pub creator_wallet: String,
    pub pool_address: Option<String>,
    pub stake_pda: Option<String>,
    pub pool_id: Option<i32>,
    pub logo: Option<String>,
}

#[actix_web::post("/locks")]
pub async fn create_lock(
    state: web::Data<AppState>,
    req: web::Json<CreateLockRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    if req.token_mint.trim().is_empty()
        || req.name.trim().is_empty()
        || req.symbol.trim().is_empty()
        || req.creator_wallet.trim().is_empty()
    {
        return Ok(bad_request("Missing required fields"));
    }
    if req.amount <= 0.0 || req.lock_duration <= 0 {
        return Ok(bad_request("amount and lockDuration must be positive"));
    }

    let now = Utc::now();
    let upsert = UpsertLock {
        // Wallet-side lock ids are creation timestamps; mirror that default.
        lock_id: req.lock_id.unwrap_or_else(|| now.timestamp_millis()),
        token_mint: req.token_mint,
        name: req.name,
        symbol: req.symbol,
        amount: req.amount,
        lock_duration: req.lock_duration,
        unlock_time: now + Duration::seconds(req.lock_duration),
        creator_wallet: req.creator_wallet,
        pool_address: req.pool_address,
        stake_pda: req.stake_pda,
        pool_id: req.pool_id,
        logo: req.logo,
    };

    match state.store.upsert_lock(upsert).await {
        Ok(lock) => Ok(HttpResponse::Created().json(lock)),
        Err(e) => Ok(store_error("Failed to create lock", e)),
    }
}
