use crate::AppState;
use actix_web::{web, HttpResponse, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// The `state` parameter round-trips through Twitter as base64url JSON.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OAuthState {
    wallet: String,
    code_verifier: String,
}

fn redirect(state: &AppState, suffix: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((
            "Location",
            format!("{}/whale-club{suffix}", state.config.app_url),
        ))
        .finish()
}

#[actix_web::get("/twitter/callback")]
pub async fn twitter_callback(
    state: web::Data<AppState>,
    query: web::Query<CallbackQuery>,
) -> Result<HttpResponse> {
    if let Some(error) = &query.error {
        return Ok(redirect(&state, &format!("?error={error}")));
    }
    let (Some(code), Some(raw_state)) = (&query.code, &query.state) else {
        return Ok(redirect(&state, "?error=missing_params"));
    };

    let oauth_state: OAuthState = match URL_SAFE_NO_PAD
        .decode(raw_state)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    {
        Some(parsed) => parsed,
        None => return Ok(redirect(&state, "?error=bad_state")),
    };

    let tokens = match state
        .twitter
        .exchange_code(code, &oauth_state.code_verifier)
        .await
    {
        Ok(tokens) => tokens,
        Err(e) => {
            log::error!("code exchange failed: {e}");
            return Ok(redirect(&state, "?error=token_exchange_failed"));
        }
    };

    let profile = match state.twitter.me(&tokens.access_token).await {
        Ok(profile) => profile,
        Err(e) => {
            log::error!("profile fetch failed: {e}");
            return Ok(redirect(&state, "?error=profile_fetch_failed"));
        }
    };

    let expiry = Utc::now() + Duration::seconds(tokens.expires_in);
    if let Err(e) = state
        .store
        .upsert_twitter_tokens(
            &oauth_state.wallet,
            &profile.id,
            &profile.username.to_lowercase(),
            &tokens.access_token,
            tokens.refresh_token.as_deref(),
            expiry,
        )
        .await
    {
        log::error!("token persistence failed: {e}");
        return Ok(redirect(&state, "?error=storage_failed"));
    }

    Ok(redirect(&state, "?success=true"))
}
