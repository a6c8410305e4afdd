use actix_web::{web, App, HttpServer};
use chain::rates::RateService;
use dotenv::dotenv;
use solana_client::nonblocking::rpc_client::RpcClient;
use sqlx::PgPool;
use std::env;
use std::sync::Arc;
use store::Store;

mod config;
mod routes;
mod twitter;

use config::Config;
use routes::*;
use twitter::TwitterClient;

pub struct AppState {
    pub store: Store,
    pub rates: RateService,
    pub twitter: TwitterClient,
    pub rpc: Arc<RpcClient>,
    pub config: Config,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to create pool.");
    let store = Store::new(pool);

    let rpc = Arc::new(RpcClient::new(config.rpc_url.clone()));
    let rates = RateService::new(rpc.clone(), config.staking_program_id);
    let twitter = TwitterClient::new(
        config.twitter_client_id.clone(),
        config.twitter_client_secret.clone(),
        config.twitter_bearer_token.clone(),
        config.twitter_redirect_uri.clone(),
    );

    let bind_addr = config.bind_addr.clone();
    let state = web::Data::new(AppState {
        store,
        rates,
        twitter,
        rpc,
        config,
    });

    log::info!("listening on {bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .service(list_pools)
                    .service(create_pool)
                    .service(update_pool)
                    .service(delete_pool)
                    .service(pending_rewards)
                    .service(list_locks)
                    .service(create_lock)
                    .service(verify_wallet)
                    .service(get_whale_user)
                    .service(register_twitter)
                    .service(leaderboard)
                    .service(chat_history)
                    .service(post_message)
                    .service(admin_action)
                    .service(sync_engagement)
                    .service(twitter_callback)
                    .service(prepare_airdrop)
                    .service(submit_airdrop_batch),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
