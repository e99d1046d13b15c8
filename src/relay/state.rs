use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// How long a signed `state` stays acceptable after `/login` issued it.
pub const STATE_MAX_AGE_SECS: i64 = 10 * 60;

/// Produce a stateless OAuth `state` value: `<unix-seconds>.<hex hmac>`.
///
/// The relay keeps no session, so the timestamp is signed instead of stored.
pub fn sign_state(secret: &str, issued_at: i64) -> Result<String> {
    let mac = mac_for(secret, issued_at)?;
    Ok(format!(
        "{issued_at}.{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verify a `state` value produced by [`sign_state`] at most
/// [`STATE_MAX_AGE_SECS`] before `now`.
pub fn verify_state(secret: &str, state: &str, now: i64) -> Result<()> {
    let (issued_at, signature_hex) = state
        .split_once('.')
        .ok_or_else(|| AppError::InvalidState("Malformed state".to_string()))?;

    let issued_at: i64 = issued_at
        .parse()
        .map_err(|_| AppError::InvalidState("Malformed timestamp".to_string()))?;

    let signature_bytes = hex::decode(signature_hex)
        .map_err(|e| AppError::InvalidState(format!("Invalid hex in state: {e}")))?;

    mac_for(secret, issued_at)?
        .verify_slice(&signature_bytes)
        .map_err(|_| AppError::InvalidState("Signature mismatch".to_string()))?;

    let age = now - issued_at;
    if !(0..=STATE_MAX_AGE_SECS).contains(&age) {
        return Err(AppError::InvalidState(format!("State expired ({age}s old)")));
    }

    Ok(())
}

fn mac_for(secret: &str, issued_at: i64) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid HMAC key: {e}")))?;
    mac.update(issued_at.to_string().as_bytes());
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_state() {
        let state = sign_state("test-secret", 1_700_000_000).unwrap();
        assert!(verify_state("test-secret", &state, 1_700_000_030).is_ok());
    }

    #[test]
    fn test_wrong_secret() {
        let state = sign_state("test-secret", 1_700_000_000).unwrap();
        assert!(verify_state("other-secret", &state, 1_700_000_030).is_err());
    }

    #[test]
    fn test_expired_state() {
        let state = sign_state("test-secret", 1_700_000_000).unwrap();
        let later = 1_700_000_000 + STATE_MAX_AGE_SECS + 1;
        assert!(matches!(
            verify_state("test-secret", &state, later),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn test_tampered_timestamp() {
        let state = sign_state("test-secret", 1_700_000_000).unwrap();
        let (_, sig) = state.split_once('.').unwrap();
        let forged = format!("1700000500.{sig}");
        assert!(verify_state("test-secret", &forged, 1_700_000_600).is_err());
    }

    #[test]
    fn test_missing_separator() {
        assert!(verify_state("test-secret", "abcdef1234567890", 0).is_err());
    }
}
