use chain::airdrop::TOKEN_2022_PROGRAM_ID;
use solana_sdk::pubkey::Pubkey;
use std::env;
use std::str::FromStr;

/// Process configuration, read once at startup. Required variables abort
/// startup; optional ones fall back to mainnet defaults.
#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub app_url: String,
    pub rpc_url: String,
    pub admin_wallet: String,
    pub staking_program_id: Pubkey,
    pub membership_mint: Pubkey,
    pub membership_token_program: Pubkey,
    pub membership_decimals: u8,
    /// Whole tokens (wallet + staked) required for Whale Club access.
    pub min_membership_tokens: u64,
    pub twitter_client_id: String,
    pub twitter_client_secret: String,
    pub twitter_bearer_token: String,
    pub twitter_redirect_uri: String,
}

impl Config {
    pub fn from_env() -> Self {
        let app_url =
            env::var("APP_URL").unwrap_or_else(|_| "https://stakepoint.app".to_string());
        let twitter_redirect_uri = env::var("TWITTER_REDIRECT_URI")
            .unwrap_or_else(|_| format!("{app_url}/api/twitter/callback"));

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            app_url,
            rpc_url: env::var("RPC_URL")
                .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_string()),
            admin_wallet: env::var("ADMIN_WALLET").expect("ADMIN_WALLET must be set"),
            staking_program_id: required_pubkey("STAKING_PROGRAM_ID"),
            membership_mint: required_pubkey("MEMBERSHIP_MINT"),
            membership_token_program: optional_pubkey(
                "MEMBERSHIP_TOKEN_PROGRAM",
                TOKEN_2022_PROGRAM_ID,
            ),
            membership_decimals: env::var("MEMBERSHIP_DECIMALS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9),
            min_membership_tokens: env::var("MIN_MEMBERSHIP_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000_000),
            twitter_client_id: env::var("TWITTER_CLIENT_ID")
                .expect("TWITTER_CLIENT_ID must be set"),
            twitter_client_secret: env::var("TWITTER_CLIENT_SECRET")
                .expect("TWITTER_CLIENT_SECRET must be set"),
            twitter_bearer_token: env::var("TWITTER_BEARER_TOKEN")
                .expect("TWITTER_BEARER_TOKEN must be set"),
            twitter_redirect_uri,
        }
    }
}

fn required_pubkey(var: &str) -> Pubkey {
    let value = env::var(var).unwrap_or_else(|_| panic!("{var} must be set"));
    Pubkey::from_str(&value).unwrap_or_else(|_| panic!("{var} is not a valid pubkey"))
}

fn optional_pubkey(var: &str, default: Pubkey) -> Pubkey {
    match env::var(var) {
        Ok(value) => Pubkey::from_str(&value).unwrap_or_else(|_| panic!("{var} is not a valid pubkey")),
        Err(_) => default,
    }
}
