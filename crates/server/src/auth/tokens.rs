//! Opaque refresh tokens. Only the SHA-256 hash is stored.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub struct RefreshToken {
    /// Handed to the client once, never stored.
    pub token: String,
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

pub fn issue_refresh_token(now: DateTime<Utc>) -> RefreshToken {
    let mut bytes = [0u8; 64];
    rand::rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let hash = hash_token(&token);
    RefreshToken {
        token,
        hash,
        created_at: now,
    }
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn refresh_expires_at(created_at: DateTime<Utc>, ttl_days: i64) -> DateTime<Utc> {
    created_at + Duration::days(ttl_days)
}

pub fn is_expired(created_at: DateTime<Utc>, ttl_days: i64, now: DateTime<Utc>) -> bool {
    now > refresh_expires_at(created_at, ttl_days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_refresh_token() {
        let now = Utc::now();
        let a = issue_refresh_token(now);
        let b = issue_refresh_token(now);

        assert_eq!(a.token.len(), 128);
        assert_ne!(a.token, b.token);
        assert_eq!(a.hash, hash_token(&a.token));
        assert_eq!(a.hash.len(), 64);
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_expiry() {
        let created: DateTime<Utc> = "2025-01-01T00:00:00Z".parse().unwrap();
        assert!(!is_expired(created, 30, "2025-01-31T00:00:00Z".parse().unwrap()));
        assert!(is_expired(created, 30, "2025-01-31T00:00:01Z".parse().unwrap()));
    }
}
