pub mod airdrop;
pub mod locks;
pub mod pools;
pub mod twitter_callback;
pub mod whale;

pub use airdrop::*;
pub use locks::*;
pub use pools::*;
pub use twitter_callback::*;
pub use whale::*;

use actix_web::HttpResponse;
use serde::Serialize;
use store::StoreError;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

pub fn bad_request(error: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorBody::new(error))
}

pub fn unauthorized(error: impl Into<String>) -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorBody::new(error))
}

/// Conventional mapping: conflict 409, missing 404, bad input 400, rest 500.
pub fn store_error(context: &str, e: StoreError) -> HttpResponse {
    log::error!("{context}: {e}");
    match e {
        StoreError::Conflict => {
            HttpResponse::Conflict().json(ErrorBody::with_details(context, e.to_string()))
        }
        StoreError::NotFound => HttpResponse::NotFound().json(ErrorBody::new(context)),
        StoreError::InvalidInput(msg) => {
            HttpResponse::BadRequest().json(ErrorBody::with_details(context, msg))
        }
        StoreError::Database(err) => {
            HttpResponse::InternalServerError().json(ErrorBody::with_details(context, err.to_string()))
        }
    }
}
