use crate::routes::{bad_request, ErrorBody};
use crate::AppState;
use actix_web::{web, HttpResponse, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chain::airdrop::{self, Recipient, TOKEN_PROGRAM_ID};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::Transaction;
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientInput {
    pub wallet: String,
    /// Whole tokens; converted to base units with the request's decimals.
    pub amount: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareAirdropRequest {
    pub sender: String,
    pub token_mint: String,
    pub token_program: Option<String>,
    pub decimals: u8,
    pub recipients: Vec<RecipientInput>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedBatch {
    /// Unsigned transaction, bincode then base64. The sender's wallet signs
    /// and returns it through the submit endpoint.
    pub transaction: String,
    pub recipient_count: usize,
    pub creates_accounts: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareAirdropResponse {
    pub batches: Vec<PreparedBatch>,
    pub invalid_recipients: Vec<String>,
    pub total_recipients: usize,
    pub accounts_to_create: usize,
}

#[actix_web::post("/airdrop/prepare")]
pub async fn prepare_airdrop(
    state: web::Data<AppState>,
    req: web::Json<PrepareAirdropRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    let Ok(sender) = Pubkey::from_str(&req.sender) else {
        return Ok(bad_request("Invalid sender address"));
    };
    let Ok(mint) = Pubkey::from_str(&req.token_mint) else {
        return Ok(bad_request("Invalid token mint"));
    };
    let token_program = match req.token_program.as_deref() {
        Some(program) => match Pubkey::from_str(program) {
            Ok(program) => program,
            Err(_) => return Ok(bad_request("Invalid token program")),
        },
        None => TOKEN_PROGRAM_ID,
    };

    let scale = 10f64.powi(req.decimals as i32);
    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for input in &req.recipients {
        match Pubkey::from_str(input.wallet.trim()) {
            Ok(wallet) if input.amount > 0.0 => valid.push(Recipient {
                wallet,
                amount: (input.amount * scale).floor() as u64,
            }),
            _ => invalid.push(input.wallet.clone()),
        }
    }
    if valid.is_empty() {
        return Ok(bad_request("No valid recipients"));
    }

    let (existing, missing) =
        match airdrop::partition_recipients(&state.rpc, &mint, &token_program, valid).await {
            Ok(split) => split,
            Err(e) => {
                log::error!("recipient partition failed: {e}");
                return Ok(HttpResponse::InternalServerError()
                    .json(ErrorBody::new("Failed to inspect recipient accounts")));
            }
        };
    let accounts_to_create = missing.len();
    let total_recipients = existing.len() + missing.len();

    let blockhash = match state.rpc.get_latest_blockhash().await {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("blockhash fetch failed: {e}");
            return Ok(HttpResponse::InternalServerError()
                .json(ErrorBody::new("Failed to fetch recent blockhash")));
        }
    };

    let mut batches = Vec::new();
    for batch in airdrop::plan_batches(&existing, &missing) {
        let tx = airdrop::build_batch_transaction(&sender, &mint, &token_program, &batch, blockhash);
        let bytes = match bincode::serialize(&tx) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("transaction serialization failed: {e}");
                return Ok(HttpResponse::InternalServerError()
                    .json(ErrorBody::new("Failed to serialize transaction")));
            }
        };
        batches.push(PreparedBatch {
            transaction: BASE64.encode(bytes),
            recipient_count: batch.recipients.len(),
            creates_accounts: batch.creates_accounts,
        });
    }

    Ok(HttpResponse::Ok().json(PrepareAirdropResponse {
        batches,
        invalid_recipients: invalid,
        total_recipients,
        accounts_to_create,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBatchRequest {
    /// Signed transaction, bincode then base64.
    pub transaction: String,
}

#[derive(Serialize)]
pub struct SubmitBatchResponse {
    pub signature: String,
}

#[actix_web::post("/airdrop/submit")]
pub async fn submit_airdrop_batch(
    state: web::Data<AppState>,
    req: web::Json<SubmitBatchRequest>,
) -> Result<HttpResponse> {
    let Ok(bytes) = BASE64.decode(&req.transaction) else {
        return Ok(bad_request("Transaction is not valid base64"));
    };
    let Ok(transaction) = bincode::deserialize::<Transaction>(&bytes) else {
        return Ok(bad_request("Malformed transaction"));
    };

    match airdrop::submit_batch(&state.rpc, &transaction).await {
        Ok(signature) => Ok(HttpResponse::Ok().json(SubmitBatchResponse {
            signature: signature.to_string(),
        })),
        Err(e) => {
            log::error!("batch submission failed: {e}");
            Ok(HttpResponse::InternalServerError()
                .json(ErrorBody::with_details("Batch submission failed", e.to_string())))
        }
    }
}
