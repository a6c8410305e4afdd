//! Wallet-signature session authentication.
//!
//! A client proves wallet ownership by signing a message whose tail embeds a
//! millisecond timestamp ("... at 1724800000000"). The signature must verify
//! against the wallet's ed25519 key over the exact message bytes, and the
//! timestamp must sit inside a short freshness window so captured signatures
//! cannot be replayed later.

use crate::error::Error;
use rand::RngCore;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::str::FromStr;

/// Accepted clock skew between the signed timestamp and the server, in ms.
pub const FRESHNESS_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Lifetime of an issued chat session token.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Pulls the trailing `at <millis>` timestamp out of a signed message.
pub fn parse_message_timestamp(message: &str) -> Option<i64> {
    let (_, tail) = message.trim_end().rsplit_once(" at ")?;
    let tail = tail.trim();
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

pub fn check_freshness(timestamp_ms: i64, now_ms: i64) -> Result<(), Error> {
    if (now_ms - timestamp_ms).abs() > FRESHNESS_WINDOW_MS {
        return Err(Error::StaleTimestamp);
    }
    Ok(())
}

/// Verifies `signature` (base58) was produced by `wallet` over `message`.
pub fn verify_wallet_signature(wallet: &str, message: &str, signature: &str) -> Result<(), Error> {
    let pubkey = Pubkey::from_str(wallet).map_err(|_| Error::InvalidPubkey(wallet.to_string()))?;
    let signature_bytes = bs58::decode(signature)
        .into_vec()
        .map_err(|_| Error::MalformedSignature)?;
    let signature =
        Signature::try_from(signature_bytes.as_slice()).map_err(|_| Error::MalformedSignature)?;

    if !signature.verify(pubkey.as_ref(), message.as_bytes()) {
        return Err(Error::InvalidSignature);
    }
    Ok(())
}

/// Full check used by session-issuing endpoints: timestamp present, fresh,
/// and signature valid. Freshness is checked first so an expired message is
/// rejected even when its signature is sound.
pub fn verify_signed_message(
    wallet: &str,
    message: &str,
    signature: &str,
    now_ms: i64,
) -> Result<(), Error> {
    let timestamp = parse_message_timestamp(message).ok_or(Error::MissingTimestamp)?;
    check_freshness(timestamp, now_ms)?;
    verify_wallet_signature(wallet, message, signature)
}

/// Opaque 32-byte session token, hex encoded.
pub fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Keypair;
    use solana_sdk::signer::Signer;

    fn signed(keypair: &Keypair, message: &str) -> String {
        keypair.sign_message(message.as_bytes()).to_string()
    }

    #[test]
    fn parses_trailing_timestamp() {
        assert_eq!(
            parse_message_timestamp("Whale Club Admin: reset at 1724800000000"),
            Some(1_724_800_000_000)
        );
        assert_eq!(parse_message_timestamp("no timestamp here"), None);
        assert_eq!(parse_message_timestamp("ends at soon"), None);
    }

    #[test]
    fn valid_signature_verifies() {
        let keypair = Keypair::new();
        let wallet = keypair.pubkey().to_string();
        let message = format!("Whale Club: verify {} at 1000", wallet);
        let signature = signed(&keypair, &message);

        assert!(verify_wallet_signature(&wallet, &message, &signature).is_ok());
    }

    #[test]
    fn signature_fails_for_other_wallet() {
        let signer = Keypair::new();
        let other = Keypair::new();
        let message = "Whale Club: verify at 1000";
        let signature = signed(&signer, message);

        assert!(matches!(
            verify_wallet_signature(&other.pubkey().to_string(), message, &signature),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn tampered_message_fails() {
        let keypair = Keypair::new();
        let wallet = keypair.pubkey().to_string();
        let signature = signed(&keypair, "action: snapshot at 1000");

        assert!(matches!(
            verify_wallet_signature(&wallet, "action: reset at 1000", &signature),
            Err(Error::InvalidSignature)
        ));
    }

    #[test]
    fn stale_timestamp_rejected_despite_valid_signature() {
        let keypair = Keypair::new();
        let wallet = keypair.pubkey().to_string();
        let signed_at: i64 = 1_000_000;
        let message = format!("admin: reset at {signed_at}");
        let signature = signed(&keypair, &message);

        let now = signed_at + FRESHNESS_WINDOW_MS + 1;
        assert!(matches!(
            verify_signed_message(&wallet, &message, &signature, now),
            Err(Error::StaleTimestamp)
        ));

        let now = signed_at + FRESHNESS_WINDOW_MS - 1;
        assert!(verify_signed_message(&wallet, &message, &signature, now).is_ok());
    }

    #[test]
    fn session_tokens_are_unique_hex() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit()));
    }
}
