use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct WhaleClubUser {
    pub wallet_address: String,
    pub twitter_id: Option<String>,
    pub twitter_username: Option<String>,
    pub nickname: Option<String>,
    pub twitter_access_token: Option<String>,
    pub twitter_refresh_token: Option<String>,
    pub twitter_token_expiry: Option<DateTime<Utc>>,
    pub total_points: i32,
    pub likes_count: i32,
    pub retweets_count: i32,
    pub quotes_count: i32,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub chat_session_token: Option<String>,
    pub chat_session_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleClubMessage {
    pub id: Uuid,
    pub wallet_address: String,
    pub nickname: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Leaderboard projection, never exposes token columns.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub wallet_address: String,
    pub twitter_username: Option<String>,
    pub nickname: Option<String>,
    pub total_points: i32,
    pub likes_count: i32,
    pub retweets_count: i32,
    pub quotes_count: i32,
}
