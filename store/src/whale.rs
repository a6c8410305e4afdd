use crate::models::whale::{LeaderboardEntry, WhaleClubMessage, WhaleClubUser};
use crate::{Store, StoreError};
use chrono::{DateTime, Utc};

/// Sentinel row holding the shared Twitter OAuth token pair. Kept out of the
/// leaderboard and the username-uniqueness check.
pub const OAUTH_HOLDER: &str = "_oauth_holder";

/// How many chat messages are retained; older rows are pruned after insert.
pub const CHAT_HISTORY_LIMIT: i64 = 500;

const USER_COLUMNS: &str = r#"
    wallet_address, twitter_id, twitter_username, nickname,
    twitter_access_token, twitter_refresh_token, twitter_token_expiry,
    total_points, likes_count, retweets_count, quotes_count, last_synced_at,
    chat_session_token, chat_session_expiry, created_at, updated_at
"#;

impl Store {
    pub async fn get_whale_user(&self, wallet: &str) -> Result<Option<WhaleClubUser>, StoreError> {
        let user = sqlx::query_as::<_, WhaleClubUser>(&format!(
            "SELECT {USER_COLUMNS} FROM whale_club_users WHERE wallet_address = $1"
        ))
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn upsert_chat_session(
        &self,
        wallet: &str,
        session_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO whale_club_users (wallet_address, chat_session_token, chat_session_expiry)
            VALUES ($1, $2, $3)
            ON CONFLICT (wallet_address) DO UPDATE
                SET chat_session_token = $2, chat_session_expiry = $3, updated_at = NOW()
            "#,
        )
        .bind(wallet)
        .bind(session_token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn verify_chat_session(
        &self,
        wallet: &str,
        session_token: &str,
    ) -> Result<bool, StoreError> {
        let user = match self.get_whale_user(wallet).await? {
            Some(user) => user,
            None => return Ok(false),
        };

        let Some(stored) = user.chat_session_token else {
            return Ok(false);
        };
        if stored != session_token {
            return Ok(false);
        }
        match user.chat_session_expiry {
            Some(expiry) => Ok(expiry > Utc::now()),
            None => Ok(false),
        }
    }

    /// True when the username is already registered to a different wallet.
    pub async fn twitter_username_taken(
        &self,
        username: &str,
        wallet: &str,
    ) -> Result<bool, StoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT wallet_address FROM whale_club_users
            WHERE LOWER(twitter_username) = LOWER($1) AND wallet_address <> $2
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(wallet)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    pub async fn register_twitter_username(
        &self,
        wallet: &str,
        username: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO whale_club_users (wallet_address, twitter_username)
            VALUES ($1, $2)
            ON CONFLICT (wallet_address) DO UPDATE
                SET twitter_username = $2, updated_at = NOW()
            "#,
        )
        .bind(wallet)
        .bind(username)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn upsert_twitter_tokens(
        &self,
        wallet: &str,
        twitter_id: &str,
        twitter_username: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO whale_club_users
                (wallet_address, twitter_id, twitter_username,
                 twitter_access_token, twitter_refresh_token, twitter_token_expiry)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (wallet_address) DO UPDATE
                SET twitter_id = $2,
                    twitter_username = $3,
                    twitter_access_token = $4,
                    twitter_refresh_token = $5,
                    twitter_token_expiry = $6,
                    updated_at = NOW()
            "#,
        )
        .bind(wallet)
        .bind(twitter_id)
        .bind(twitter_username)
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expiry)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_oauth_holder(&self) -> Result<Option<WhaleClubUser>, StoreError> {
        let user = sqlx::query_as::<_, WhaleClubUser>(&format!(
            "SELECT {USER_COLUMNS} FROM whale_club_users WHERE twitter_username = $1"
        ))
        .bind(OAUTH_HOLDER)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_oauth_holder_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
        token_expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE whale_club_users
            SET twitter_access_token = $1,
                twitter_refresh_token = $2,
                twitter_token_expiry = $3,
                updated_at = NOW()
            WHERE twitter_username = $4
            "#,
        )
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expiry)
        .bind(OAUTH_HOLDER)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// (lowercased twitter username, wallet) for every registered member.
    pub async fn registered_twitter_usernames(&self) -> Result<Vec<(String, String)>, StoreError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT LOWER(twitter_username), wallet_address
            FROM whale_club_users
            WHERE twitter_username IS NOT NULL AND twitter_username <> $1
            "#,
        )
        .bind(OAUTH_HOLDER)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT wallet_address, twitter_username, nickname, total_points,
                   likes_count, retweets_count, quotes_count
            FROM whale_club_users
            WHERE twitter_username IS DISTINCT FROM $1
            ORDER BY total_points DESC
            LIMIT $2
            "#,
        )
        .bind(OAUTH_HOLDER)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Everyone with points, best first. Used for reward snapshots.
    pub async fn standings(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let entries = sqlx::query_as::<_, LeaderboardEntry>(
            r#"
            SELECT wallet_address, twitter_username, nickname, total_points,
                   likes_count, retweets_count, quotes_count
            FROM whale_club_users
            WHERE total_points > 0
            ORDER BY total_points DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Accumulates engagement counters and recomputes points:
    /// likes x1, retweets x3, quotes x5.
    pub async fn apply_engagement(
        &self,
        wallet: &str,
        likes: i32,
        retweets: i32,
    ) -> Result<WhaleClubUser, StoreError> {
        let user = sqlx::query_as::<_, WhaleClubUser>(&format!(
            r#"
            UPDATE whale_club_users
            SET likes_count = likes_count + $2,
                retweets_count = retweets_count + $3,
                total_points = (likes_count + $2) * 1
                             + (retweets_count + $3) * 3
                             + quotes_count * 5,
                last_synced_at = NOW(),
                updated_at = NOW()
            WHERE wallet_address = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(wallet)
        .bind(likes)
        .bind(retweets)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or(StoreError::NotFound)
    }

    pub async fn reset_points(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE whale_club_users
            SET total_points = 0,
                likes_count = 0,
                retweets_count = 0,
                quotes_count = 0,
                last_synced_at = NULL,
                updated_at = NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn recent_messages(&self, limit: i64) -> Result<Vec<WhaleClubMessage>, StoreError> {
        // Fetched newest-first, returned oldest-first for display.
        let mut messages = sqlx::query_as::<_, WhaleClubMessage>(
            r#"
            SELECT id, wallet_address, nickname, message, created_at
            FROM whale_club_messages
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }

    pub async fn insert_message(
        &self,
        wallet: &str,
        nickname: Option<&str>,
        message: &str,
    ) -> Result<WhaleClubMessage, StoreError> {
        let message = sqlx::query_as::<_, WhaleClubMessage>(
            r#"
            INSERT INTO whale_club_messages (wallet_address, nickname, message)
            VALUES ($1, $2, $3)
            RETURNING id, wallet_address, nickname, message, created_at
            "#,
        )
        .bind(wallet)
        .bind(nickname)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    pub async fn prune_messages(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM whale_club_messages
            WHERE id NOT IN (
                SELECT id FROM whale_club_messages
                ORDER BY created_at DESC
                LIMIT $1
            )
            "#,
        )
        .bind(CHAT_HISTORY_LIMIT)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Total base units the wallet has staked in pools of the given mint.
    pub async fn staked_amount(&self, wallet: &str, token_mint: &str) -> Result<i64, StoreError> {
        let row: Option<(Option<i64>,)> = sqlx::query_as(
            r#"
            SELECT SUM(staked_amount)::BIGINT
            FROM user_stakes
            WHERE wallet_address = $1 AND token_mint = $2
            "#,
        )
        .bind(wallet)
        .bind(token_mint)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(sum,)| sum).unwrap_or(0))
    }
}
