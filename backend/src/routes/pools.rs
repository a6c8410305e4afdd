use crate::routes::{bad_request, store_error, ErrorBody};
use crate::AppState;
use actix_web::{web, HttpResponse, Result};
use chain::rates::RateKind;
use chain::rewards;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use store::models::Pool;
use store::pool::{CreatePool, PoolKey, UpdatePool};
use uuid::Uuid;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolWithRate {
    #[serde(flatten)]
    pub pool: Pool,
    pub live_rate: f64,
    pub live_rate_type: RateKind,
}

#[actix_web::get("/pools")]
pub async fn list_pools(state: web::Data<AppState>) -> Result<HttpResponse> {
    let pools = match state.store.list_visible_pools().await {
        Ok(pools) => pools,
        Err(e) => return Ok(store_error("Failed to fetch pools", e)),
    };

    let mut response = Vec::with_capacity(pools.len());
    for mut pool in pools {
        let live = if pool.is_initialized {
            match state
                .rates
                .live_rate(&pool.token_mint, pool.pool_id as u32)
                .await
            {
                Ok(live) => Some(live),
                Err(e) => {
                    // Stored apr/apy keeps serving when the chain is unreachable.
                    log::warn!(
                        "no live rate for {}:{}: {e}",
                        pool.token_mint,
                        pool.pool_id
                    );
                    None
                }
            }
        } else {
            None
        };

        let (live_rate, live_rate_type) = match live {
            Some(live) => {
                match live.kind {
                    RateKind::Apr => pool.apr = Some(live.rate),
                    RateKind::Apy => pool.apy = Some(live.rate),
                }
                (live.rate, live.kind)
            }
            None => match (pool.apy, pool.apr) {
                (Some(apy), _) => (apy, RateKind::Apy),
                (None, apr) => (apr.unwrap_or(0.0), RateKind::Apr),
            },
        };

        response.push(PoolWithRate {
            pool,
            live_rate,
            live_rate_type,
        });
    }

    Ok(HttpResponse::Ok().json(response))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePoolRequest {
    pub token_mint: String,
    #[serde(default)]
    pub pool_id: i32,
    pub name: Option<String>,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub pool_type: Option<String>,
    pub apr: Option<f64>,
    pub apy: Option<f64>,
    pub lock_period: Option<i32>,
    pub rewards: Option<String>,
    pub logo: Option<String>,
    pub pair_address: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub transfer_tax_bps: i32,
}

#[actix_web::post("/pools")]
pub async fn create_pool(
    state: web::Data<AppState>,
    req: web::Json<CreatePoolRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    if req.token_mint.trim().is_empty() {
        return Ok(bad_request("tokenMint is required"));
    }
    let name = match req.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Ok(bad_request("name is required")),
    };
    let pool_type = match req.pool_type.as_deref() {
        Some(t @ ("locked" | "unlocked")) => t.to_string(),
        _ => return Ok(bad_request("type must be \"locked\" or \"unlocked\"")),
    };

    let create = CreatePool {
        token_mint: req.token_mint,
        pool_id: req.pool_id,
        symbol: req.symbol.unwrap_or_else(|| name.to_uppercase()),
        name,
        pool_type,
        apr: req.apr,
        apy: req.apy,
        lock_period: req.lock_period,
        rewards: req.rewards,
        logo: req.logo,
        pair_address: req.pair_address,
        featured: req.featured,
        hidden: req.hidden,
        transfer_tax_bps: req.transfer_tax_bps.clamp(0, 10_000),
    };

    match state.store.create_pool(create).await {
        Ok(pool) => Ok(HttpResponse::Created().json(pool)),
        Err(e) => Ok(store_error("Failed to create pool", e)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePoolRequest {
    pub id: Option<Uuid>,
    pub token_mint: Option<String>,
    pub pool_id: Option<i32>,
    pub name: Option<String>,
    pub symbol: Option<String>,
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

fn pool_key(
    id: Option<Uuid>,
    token_mint: Option<String>,
    pool_id: Option<i32>,
) -> Option<PoolKey> {
    if let Some(id) = id {
        return Some(PoolKey::Id(id));
    }
    match (token_mint, pool_id) {
        (Some(token_mint), Some(pool_id)) => Some(PoolKey::Mint {
            token_mint,
            pool_id,
        }),
        _ => None,
    }
}

#[actix_web::patch("/pools")]
pub async fn update_pool(
    state: web::Data<AppState>,
    req: web::Json<UpdatePoolRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    let Some(key) = pool_key(req.id, req.token_mint, req.pool_id) else {
        return Ok(bad_request("Either id OR (tokenMint + poolId) is required"));
    };

    // Lock period drives the pool type: 0 or absent means unlocked.
    let pool_type = req.lock_period.map(|period| {
        if period == 0 { "unlocked" } else { "locked" }.to_string()
    });

    let update = UpdatePool {
        name: req.name,
        symbol: req.symbol,
        pool_type,
        apr: req.apr,
        apy: req.apy,
        lock_period: req.lock_period,
        rewards: req.rewards,
        logo: req.logo,
        pair_address: req.pair_address,
        featured: req.featured,
        hidden: req.hidden,
        is_paused: req.is_paused,
        is_initialized: req.is_initialized,
        is_emergency_unlocked: req.is_emergency_unlocked,
        platform_fee_percent: req.platform_fee_percent,
        flat_sol_fee: req.flat_sol_fee,
        transfer_tax_bps: req.transfer_tax_bps.map(|bps| bps.clamp(0, 10_000)),
    };

    match state.store.update_pool(key, update).await {
        Ok(pool) => Ok(HttpResponse::Ok().json(pool)),
        Err(e) => Ok(store_error("Failed to update pool", e)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePoolQuery {
    pub id: Option<Uuid>,
    pub token_mint: Option<String>,
    pub pool_id: Option<i32>,
}

#[derive(Serialize)]
pub struct DeletePoolResponse {
    pub success: bool,
    pub pool: Pool,
}

#[actix_web::delete("/pools")]
pub async fn delete_pool(
    state: web::Data<AppState>,
    query: web::Query<DeletePoolQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();

    let Some(key) = pool_key(query.id, query.token_mint, query.pool_id) else {
        return Ok(bad_request("Either id OR (tokenMint + poolId) is required"));
    };

    match state.store.delete_pool(key).await {
        Ok(pool) => Ok(HttpResponse::Ok().json(DeletePoolResponse {
            success: true,
            pool,
        })),
        Err(e) => Ok(store_error("Failed to delete pool", e)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsQuery {
    pub wallet: String,
    pub token_mint: String,
    pub pool_id: u32,
    pub decimals: Option<u8>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsResponse {
    pub pending_rewards: f64,
    /// Exact value in base units; the float above is display-only.
    pub pending_base_units: String,
}

#[actix_web::get("/rewards")]
pub async fn pending_rewards(
    state: web::Data<AppState>,
    query: web::Query<RewardsQuery>,
) -> Result<HttpResponse> {
    let Ok(wallet) = Pubkey::from_str(&query.wallet) else {
        return Ok(bad_request("Invalid wallet address"));
    };
    let Ok(token_mint) = Pubkey::from_str(&query.token_mint) else {
        return Ok(bad_request("Invalid token mint"));
    };

    let project = match state.rates.fetch_project(&token_mint, query.pool_id).await {
        Ok(project) => project,
        Err(e) => {
            log::error!("project fetch failed: {e}");
            return Ok(HttpResponse::NotFound().json(ErrorBody::new("Pool not found on chain")));
        }
    };
    let stake = match state
        .rates
        .fetch_stake(&token_mint, query.pool_id, &wallet)
        .await
    {
        Ok(stake) => stake,
        Err(e) => {
            log::error!("stake fetch failed: {e}");
            return Ok(HttpResponse::NotFound().json(ErrorBody::new("No stake for this wallet")));
        }
    };

    let now = chrono::Utc::now().timestamp();
    let pending = rewards::pending_rewards(&project, &stake, now);
    let decimals = query.decimals.unwrap_or(9);

    Ok(HttpResponse::Ok().json(RewardsResponse {
        pending_rewards: rewards::to_ui_amount(pending, decimals),
        pending_base_units: pending.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_wins_over_mint_pair() {
        let id = Uuid::new_v4();
        let key = pool_key(Some(id), Some("mint".into()), Some(3));
        assert!(matches!(key, Some(PoolKey::Id(found)) if found == id));
    }

    #[test]
    fn mint_pair_requires_both_halves() {
        assert!(pool_key(None, Some("mint".into()), None).is_none());
        assert!(pool_key(None, None, Some(3)).is_none());
        assert!(matches!(
            pool_key(None, Some("mint".into()), Some(3)),
            Some(PoolKey::Mint { pool_id: 3, .. })
        ));
    }
}
