pub mod accounts;
pub mod airdrop;
pub mod auth;
pub mod error;
pub mod rates;
pub mod rewards;

pub use error::Error;
