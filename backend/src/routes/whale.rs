use crate::routes::{bad_request, store_error, unauthorized, ErrorBody};
use crate::twitter::TwitterError;
use crate::AppState;
use actix_web::{web, HttpResponse, Result};
use chain::accounts::token_account_amount;
use chain::airdrop::derive_token_account;
use chain::auth;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::str::FromStr;
use store::models::whale::LeaderboardEntry;

const LEADERBOARD_SIZE: i64 = 20;
const CHAT_DEFAULT_LIMIT: i64 = 50;
const CHAT_MAX_MESSAGE_CHARS: usize = 500;

/// Wallet + signed message, the shape every gated whale-club call carries.
#[derive(Deserialize)]
pub struct SignedRequest {
    pub wallet: String,
    pub message: String,
    pub signature: String,
}

fn verify_signed(req: &SignedRequest) -> Result<(), HttpResponse> {
    auth::verify_signed_message(
        &req.wallet,
        &req.message,
        &req.signature,
        Utc::now().timestamp_millis(),
    )
    .map_err(|e| match e {
        chain::Error::StaleTimestamp => unauthorized("Verification expired"),
        chain::Error::MissingTimestamp => bad_request("Message must embed a timestamp"),
        _ => unauthorized("Invalid signature"),
    })
}

async fn wallet_token_balance(state: &AppState, wallet: &Pubkey) -> u64 {
    let token_account = derive_token_account(
        wallet,
        &state.config.membership_mint,
        &state.config.membership_token_program,
    );
    // A missing account is simply a zero balance.
    match state.rpc.get_account(&token_account).await {
        Ok(account) => token_account_amount(&account.data).unwrap_or(0),
        Err(_) => 0,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyWalletResponse {
    pub success: bool,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

#[actix_web::post("/whale-club/verify-wallet")]
pub async fn verify_wallet(
    state: web::Data<AppState>,
    req: web::Json<SignedRequest>,
) -> Result<HttpResponse> {
    if let Err(resp) = verify_signed(&req) {
        return Ok(resp);
    }
    let Ok(wallet) = Pubkey::from_str(&req.wallet) else {
        return Ok(bad_request("Invalid wallet address"));
    };

    let wallet_base_units = wallet_token_balance(&state, &wallet).await;
    let staked_base_units = match state
        .store
        .staked_amount(&req.wallet, &state.config.membership_mint.to_string())
        .await
    {
        Ok(amount) => amount.max(0) as u64,
        Err(e) => return Ok(store_error("Failed to check staked balance", e)),
    };

    let scale = 10u64.pow(state.config.membership_decimals as u32);
    let total_tokens = (wallet_base_units as u128 + staked_base_units as u128) / scale as u128;

    if total_tokens < state.config.min_membership_tokens as u128 {
        return Ok(HttpResponse::Forbidden().json(ErrorBody::new(format!(
            "Insufficient holdings. You have {total_tokens}, need {}",
            state.config.min_membership_tokens
        ))));
    }

    let session_token = auth::new_session_token();
    let expires_at = Utc::now() + Duration::hours(auth::SESSION_TTL_HOURS);

    if let Err(e) = state
        .store
        .upsert_chat_session(&req.wallet, &session_token, expires_at)
        .await
    {
        return Ok(store_error("Failed to create session", e));
    }

    Ok(HttpResponse::Ok().json(VerifyWalletResponse {
        success: true,
        session_token,
        expires_at,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub wallet_address: String,
    pub twitter_id: Option<String>,
    pub twitter_username: Option<String>,
    pub nickname: Option<String>,
    pub total_points: i32,
    pub likes_count: i32,
    pub retweets_count: i32,
    pub quotes_count: i32,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[actix_web::get("/whale-club/user/{wallet}")]
pub async fn get_whale_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let wallet = path.into_inner();

    match state.store.get_whale_user(&wallet).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(UserProfile {
            wallet_address: user.wallet_address,
            twitter_id: user.twitter_id,
            twitter_username: user.twitter_username,
            nickname: user.nickname,
            total_points: user.total_points,
            likes_count: user.likes_count,
            retweets_count: user.retweets_count,
            quotes_count: user.quotes_count,
            last_synced_at: user.last_synced_at,
            created_at: user.created_at,
        })),
        Ok(None) => Ok(HttpResponse::NotFound().json(ErrorBody::new("User not found"))),
        Err(e) => Ok(store_error("Failed to fetch user", e)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTwitterRequest {
    pub wallet: String,
    pub twitter_username: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTwitterResponse {
    pub success: bool,
    pub twitter_username: String,
}

#[actix_web::post("/whale-club/register-twitter")]
pub async fn register_twitter(
    state: web::Data<AppState>,
    req: web::Json<RegisterTwitterRequest>,
) -> Result<HttpResponse> {
    if req.wallet.trim().is_empty() {
        return Ok(bad_request("Wallet and Twitter username required"));
    }

    let username = req
        .twitter_username
        .trim()
        .trim_start_matches('@')
        .to_lowercase();
    if username.is_empty() || username.len() > 15 {
        return Ok(bad_request("Invalid Twitter username"));
    }

    match state
        .store
        .twitter_username_taken(&username, &req.wallet)
        .await
    {
        Ok(true) => {
            return Ok(bad_request("Username already registered to another wallet"));
        }
        Ok(false) => {}
        Err(e) => return Ok(store_error("Failed to register", e)),
    }

    match state
        .store
        .register_twitter_username(&req.wallet, &username)
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(RegisterTwitterResponse {
            success: true,
            twitter_username: username,
        })),
        Err(e) => Ok(store_error("Failed to register", e)),
    }
}

#[actix_web::get("/whale-club/leaderboard")]
pub async fn leaderboard(state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.store.leaderboard(LEADERBOARD_SIZE).await {
        Ok(entries) => Ok(HttpResponse::Ok()
            .insert_header(("Cache-Control", "no-store, no-cache, must-revalidate"))
            .json(entries)),
        Err(e) => Ok(store_error("Failed to fetch leaderboard", e)),
    }
}

#[derive(Deserialize)]
pub struct ChatQuery {
    pub wallet: String,
    pub session: String,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ChatHistory {
    pub messages: Vec<store::models::WhaleClubMessage>,
}

async fn require_session(state: &AppState, wallet: &str, session: &str) -> Option<HttpResponse> {
    match state.store.verify_chat_session(wallet, session).await {
        Ok(true) => None,
        Ok(false) => Some(unauthorized("Invalid or expired session")),
        Err(e) => Some(store_error("Failed to verify session", e)),
    }
}

#[actix_web::get("/whale-club/chat")]
pub async fn chat_history(
    state: web::Data<AppState>,
    query: web::Query<ChatQuery>,
) -> Result<HttpResponse> {
    if let Some(resp) = require_session(&state, &query.wallet, &query.session).await {
        return Ok(resp);
    }

    let limit = query.limit.unwrap_or(CHAT_DEFAULT_LIMIT).clamp(1, 200);
    match state.store.recent_messages(limit).await {
        Ok(messages) => Ok(HttpResponse::Ok().json(ChatHistory { messages })),
        Err(e) => Ok(store_error("Failed to fetch messages", e)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub wallet: String,
    pub nickname: Option<String>,
    pub message: String,
    pub session_token: String,
}

#[derive(Serialize)]
pub struct PostMessageResponse {
    pub success: bool,
    pub message: store::models::WhaleClubMessage,
}

#[actix_web::post("/whale-club/chat")]
pub async fn post_message(
    state: web::Data<AppState>,
    req: web::Json<PostMessageRequest>,
) -> Result<HttpResponse> {
    let text = req.message.trim();
    if req.wallet.is_empty() || text.is_empty() || req.session_token.is_empty() {
        return Ok(bad_request("Missing required fields"));
    }
    if let Some(resp) = require_session(&state, &req.wallet, &req.session_token).await {
        return Ok(resp);
    }

    let text: String = text.chars().take(CHAT_MAX_MESSAGE_CHARS).collect();

    let message = match state
        .store
        .insert_message(&req.wallet, req.nickname.as_deref(), &text)
        .await
    {
        Ok(message) => message,
        Err(e) => return Ok(store_error("Failed to post message", e)),
    };

    if let Err(e) = state.store.prune_messages().await {
        // History trimming is best effort; the message itself landed.
        log::warn!("chat prune failed: {e}");
    }

    Ok(HttpResponse::Ok().json(PostMessageResponse {
        success: true,
        message,
    }))
}

#[derive(Deserialize)]
pub struct AdminActionRequest {
    #[serde(flatten)]
    pub signed: SignedRequest,
    pub action: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
    pub share_percent: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub success: bool,
    pub total_points: i64,
    pub user_count: usize,
    pub distribution: Vec<SnapshotEntry>,
}

fn check_admin(state: &AppState, req: &SignedRequest) -> Option<HttpResponse> {
    if req.wallet != state.config.admin_wallet {
        return Some(unauthorized("Unauthorized"));
    }
    verify_signed(req).err()
}

#[actix_web::post("/whale-club/admin")]
pub async fn admin_action(
    state: web::Data<AppState>,
    req: web::Json<AdminActionRequest>,
) -> Result<HttpResponse> {
    if let Some(resp) = check_admin(&state, &req.signed) {
        return Ok(resp);
    }

    match req.action.as_str() {
        "snapshot" => {
            let standings = match state.store.standings().await {
                Ok(standings) => standings,
                Err(e) => return Ok(store_error("Snapshot failed", e)),
            };
            let total_points: i64 = standings.iter().map(|u| u.total_points as i64).sum();
            let distribution = standings
                .into_iter()
                .map(|entry| SnapshotEntry {
                    share_percent: if total_points > 0 {
                        format!(
                            "{:.2}",
                            entry.total_points as f64 / total_points as f64 * 100.0
                        )
                    } else {
                        "0".to_string()
                    },
                    entry,
                })
                .collect::<Vec<_>>();

            Ok(HttpResponse::Ok().json(SnapshotResponse {
                success: true,
                total_points,
                user_count: distribution.len(),
                distribution,
            }))
        }
        "reset" => match state.store.reset_points().await {
            Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "All points have been reset to zero",
            }))),
            Err(e) => Ok(store_error("Reset failed", e)),
        },
        _ => Ok(bad_request("Invalid action")),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEngagementRequest {
    #[serde(flatten)]
    pub signed: SignedRequest,
    pub tweet_ids: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementUpdate {
    pub wallet: String,
    pub username: Option<String>,
    pub added_likes: i32,
    pub added_retweets: i32,
    pub total_points: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEngagementResponse {
    pub success: bool,
    pub tweets_processed: usize,
    pub users_updated: usize,
    pub updates: Vec<EngagementUpdate>,
}

#[actix_web::post("/whale-club/admin/sync-engagement")]
pub async fn sync_engagement(
    state: web::Data<AppState>,
    req: web::Json<SyncEngagementRequest>,
) -> Result<HttpResponse> {
    if let Some(resp) = check_admin(&state, &req.signed) {
        return Ok(resp);
    }
    if req.tweet_ids.is_empty() {
        return Ok(bad_request("Tweet IDs required"));
    }

    // The club's shared OAuth token pair lives on a sentinel user row.
    let holder = match state.store.get_oauth_holder().await {
        Ok(holder) => holder,
        Err(e) => return Ok(store_error("Sync failed", e)),
    };
    let mut access_token = holder.as_ref().and_then(|h| h.twitter_access_token.clone());
    let refresh_token = holder.as_ref().and_then(|h| h.twitter_refresh_token.clone());
    let token_expiry = holder.as_ref().and_then(|h| h.twitter_token_expiry);

    let expiring_soon = token_expiry
        .map(|expiry| expiry < Utc::now() + Duration::minutes(5))
        .unwrap_or(false);
    if expiring_soon {
        if let Some(refresh) = refresh_token.as_deref() {
            match refresh_holder_token(&state, refresh).await {
                Ok(token) => access_token = Some(token),
                Err(e) => log::error!("token refresh failed: {e}"),
            }
        }
    }

    let username_to_wallet: HashMap<String, String> =
        match state.store.registered_twitter_usernames().await {
            Ok(rows) => rows.into_iter().collect(),
            Err(e) => return Ok(store_error("Sync failed", e)),
        };
    if username_to_wallet.is_empty() {
        return Ok(bad_request("No users with Twitter registered"));
    }

    let mut engagement: HashMap<String, (i32, i32)> = HashMap::new();

    for tweet_id in &req.tweet_ids {
        if let Some(token) = access_token.clone() {
            let likers = match state.twitter.liking_users(tweet_id, &token).await {
                Ok(likers) => Some(likers),
                Err(TwitterError::Unauthorized) => {
                    // One refresh-and-retry, then give up on likes.
                    match refresh_token.as_deref() {
                        Some(refresh) => match refresh_holder_token(&state, refresh).await {
                            Ok(new_token) => {
                                access_token = Some(new_token.clone());
                                state.twitter.liking_users(tweet_id, &new_token).await.ok()
                            }
                            Err(e) => {
                                log::error!("token refresh failed: {e}");
                                None
                            }
                        },
                        None => None,
                    }
                }
                Err(e) => {
                    log::error!("likes fetch failed for {tweet_id}: {e}");
                    None
                }
            };
            for username in likers.unwrap_or_default() {
                if let Some(wallet) = username_to_wallet.get(&username) {
                    engagement.entry(wallet.clone()).or_default().0 += 1;
                }
            }
        }

        match state.twitter.retweeters(tweet_id).await {
            Ok(retweeters) => {
                for username in retweeters {
                    if let Some(wallet) = username_to_wallet.get(&username) {
                        engagement.entry(wallet.clone()).or_default().1 += 1;
                    }
                }
            }
            Err(e) => log::error!("retweets fetch failed for {tweet_id}: {e}"),
        }

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    let mut updates = Vec::new();
    for (wallet, (likes, retweets)) in engagement {
        match state.store.apply_engagement(&wallet, likes, retweets).await {
            Ok(user) => updates.push(EngagementUpdate {
                wallet,
                username: user.twitter_username,
                added_likes: likes,
                added_retweets: retweets,
                total_points: user.total_points,
            }),
            Err(e) => log::error!("engagement update failed for {wallet}: {e}"),
        }
    }

    Ok(HttpResponse::Ok().json(SyncEngagementResponse {
        success: true,
        tweets_processed: req.tweet_ids.len(),
        users_updated: updates.len(),
        updates,
    }))
}

async fn refresh_holder_token(state: &AppState, refresh_token: &str) -> Result<String, TwitterError> {
    let tokens = state.twitter.refresh_tokens(refresh_token).await?;
    let expiry = Utc::now() + Duration::seconds(tokens.expires_in);
    if let Err(e) = state
        .store
        .update_oauth_holder_tokens(
            &tokens.access_token,
            tokens.refresh_token.as_deref().unwrap_or(refresh_token),
            expiry,
        )
        .await
    {
        log::error!("failed to persist refreshed tokens: {e}");
    }
    Ok(tokens.access_token)
}
