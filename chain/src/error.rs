use solana_client::client_error;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid pubkey `{0}`")]
    InvalidPubkey(String),

    #[error("invalid signature encoding")]
    MalformedSignature,

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("signed message has no embedded timestamp")]
    MissingTimestamp,

    #[error("signed message timestamp outside freshness window")]
    StaleTimestamp,

    #[error("account data too short: {0} bytes")]
    AccountTooShort(usize),

    #[error("Solana client error: {0}")]
    SolanaClient(#[from] client_error::ClientError),
}
