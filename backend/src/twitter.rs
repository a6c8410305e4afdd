//! Minimal Twitter v2 API client: OAuth2 token exchange/refresh and the two
//! engagement lookups the club sync needs.

use serde::Deserialize;

const TWITTER_API: &str = "https://api.twitter.com/2";

#[derive(Debug, thiserror::Error)]
pub enum TwitterError {
    /// Token rejected; caller may refresh once and retry.
    #[error("twitter rejected the access token")]
    Unauthorized,

    #[error("twitter API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct TwitterUser {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    data: TwitterUser,
}

#[derive(Debug, Deserialize)]
struct EngagingUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct EngagementEnvelope {
    data: Option<Vec<EngagingUser>>,
}

#[derive(Clone)]
pub struct TwitterClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    bearer_token: String,
    redirect_uri: String,
}

impl TwitterClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        bearer_token: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id,
            client_secret,
            bearer_token,
            redirect_uri,
        }
    }

    /// OAuth2 PKCE authorization-code exchange.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<OAuthTokens, TwitterError> {
        let params = [
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(format!("{TWITTER_API}/oauth2/token"))
            .form(&params)
            .send()
            .await?;

        Self::parse(response).await
    }

    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<OAuthTokens, TwitterError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .http
            .post(format!("{TWITTER_API}/oauth2/token"))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&params)
            .send()
            .await?;

        Self::parse(response).await
    }

    pub async fn me(&self, access_token: &str) -> Result<TwitterUser, TwitterError> {
        let response = self
            .http
            .get(format!("{TWITTER_API}/users/me"))
            .bearer_auth(access_token)
            .send()
            .await?;

        Ok(Self::parse::<UserEnvelope>(response).await?.data)
    }

    /// Usernames that liked a tweet. Requires a user-context token.
    pub async fn liking_users(
        &self,
        tweet_id: &str,
        access_token: &str,
    ) -> Result<Vec<String>, TwitterError> {
        self.engagement(tweet_id, "liking_users", access_token).await
    }

    /// Usernames that retweeted a tweet. Works with the app bearer token.
    pub async fn retweeters(&self, tweet_id: &str) -> Result<Vec<String>, TwitterError> {
        self.engagement(tweet_id, "retweeted_by", &self.bearer_token.clone())
            .await
    }

    async fn engagement(
        &self,
        tweet_id: &str,
        endpoint: &str,
        token: &str,
    ) -> Result<Vec<String>, TwitterError> {
        let response = self
            .http
            .get(format!(
                "{TWITTER_API}/tweets/{tweet_id}/{endpoint}?user.fields=username"
            ))
            .bearer_auth(token)
            .send()
            .await?;

        let envelope: EngagementEnvelope = Self::parse(response).await?;
        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|u| u.username.to_lowercase())
            .collect())
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TwitterError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(TwitterError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TwitterError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}
