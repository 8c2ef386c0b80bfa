//! Email verification codes.
//!
//! A code is six random digits. Only its HMAC-SHA256 (keyed with the server's
//! verification secret, hex encoded) is stored, next to an expiry and a
//! failed-attempt counter.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use tracing::{debug, info};

pub const CODE_TTL_MINUTES: i64 = 15;
pub const MAX_ATTEMPTS: i64 = 5;

type HmacSha256 = Hmac<Sha256>;

/// Delivers a freshly issued code to its owner.
pub trait VerificationSender: Send + Sync {
    fn send(&self, email: &str, code: &str) -> Result<()>;
}

/// Default sender: no outbound mail, the code only reaches the debug log.
pub struct LogSender;

impl VerificationSender for LogSender {
    fn send(&self, email: &str, code: &str) -> Result<()> {
        info!("Verification code issued for {}", email);
        debug!("Verification code for {}: {}", email, code);
        Ok(())
    }
}

pub struct IssuedCode {
    pub code: String,
    pub digest: String,
    pub expires_at: String,
}

pub fn issue_code(secret: &str) -> Result<IssuedCode> {
    let code = format!("{:06}", rand::rng().random_range(0..1_000_000u32));
    let digest = digest_code(secret, &code)?;
    let expires_at = (Utc::now() + Duration::minutes(CODE_TTL_MINUTES))
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    Ok(IssuedCode {
        code,
        digest,
        expires_at,
    })
}

pub fn digest_code(secret: &str, code: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow!("invalid verification key: {}", e))?;
    mac.update(code.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time comparison of `code` against a stored hex digest.
pub fn code_matches(secret: &str, code: &str, stored_digest: &str) -> Result<bool> {
    let Ok(expected) = hex::decode(stored_digest) else {
        return Ok(false);
    };
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow!("invalid verification key: {}", e))?;
    mac.update(code.trim().as_bytes());
    Ok(mac.verify_slice(&expected).is_ok())
}

pub fn is_expired(expires_at: &str, now: DateTime<Utc>) -> bool {
    match DateTime::parse_from_rfc3339(expires_at) {
        Ok(t) => t.with_timezone(&Utc) < now,
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_code_is_six_digits_and_verifies() {
        let issued = issue_code("secret").unwrap();
        assert_eq!(issued.code.len(), 6);
        assert!(issued.code.chars().all(|c| c.is_ascii_digit()));
        assert!(code_matches("secret", &issued.code, &issued.digest).unwrap());
        assert!(!is_expired(&issued.expires_at, Utc::now()));
    }

    #[test]
    fn wrong_code_or_key_fails() {
        let digest = digest_code("secret", "123456").unwrap();
        assert!(!code_matches("secret", "654321", &digest).unwrap());
        assert!(!code_matches("other", "123456", &digest).unwrap());
        assert!(!code_matches("secret", "123456", "not-hex").unwrap());
    }

    #[test]
    fn expiry_is_checked_against_now() {
        let past = (Utc::now() - Duration::minutes(1)).to_rfc3339();
        assert!(is_expired(&past, Utc::now()));
        assert!(is_expired("garbage", Utc::now()));
    }
}
